// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Terminal output and user prompts.
//!
//! Every per-repository result is rendered into one self-contained block of
//! text, and written to the output sink in one go. Workers running in
//! parallel may interleave whole blocks, but never tear one apart.

use indicatif::{ProgressBar, ProgressStyle};
use inquire::{Confirm, Select};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    io::{stdout, IsTerminal, Write},
    sync::{Arc, Mutex},
    time::Duration,
};
use tracing::warn;

/// Rendering configuration.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Render {
    /// Use ANSI colours.
    pub color: bool,

    /// Show captured command output for successful operations too.
    pub verbose: bool,
}

impl Render {
    pub fn new(color: bool, verbose: bool) -> Self {
        Self { color, verbose }
    }

    pub fn green(&self, text: impl Display) -> String {
        self.paint("32", text)
    }

    pub fn red(&self, text: impl Display) -> String {
        self.paint("31", text)
    }

    pub fn yellow(&self, text: impl Display) -> String {
        self.paint("33", text)
    }

    fn paint(&self, code: &str, text: impl Display) -> String {
        if self.color {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }
}

/// Result of one operation on one repository.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Report {
    /// Directory name of repository.
    pub name: String,

    /// Operation performed, e.g., `fetch` or `clone <url>`.
    pub command: String,

    pub success: bool,

    /// Captured output lines.
    pub lines: Vec<String>,
}

impl Report {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            ..Default::default()
        }
    }

    pub fn succeeded(mut self, lines: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.success = true;
        self.lines.extend(lines.into_iter().map(Into::into));
        self
    }

    pub fn failed(mut self, lines: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.success = false;
        self.lines.extend(lines.into_iter().map(Into::into));
        self
    }

    /// Render report as block of text ending in a newline.
    ///
    /// Layout is `<name>: <command> <OK|Error>`, followed by the captured
    /// output indented by two spaces. Output of successful operations is
    /// only shown when rendering verbosely.
    pub fn render(&self, render: &Render) -> String {
        let status = if self.success {
            render.green("OK")
        } else {
            render.red("Error")
        };

        let mut block = format!("{}: {} {status}\n", self.name, self.command);
        if render.verbose || !self.success {
            for line in &self.lines {
                block.push_str("  ");
                block.push_str(line);
                block.push('\n');
            }
        }

        block
    }
}

/// Aggregate of every report of one fleet operation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Summary {
    pub reports: Vec<Report>,
}

impl Summary {
    pub fn new(mut reports: Vec<Report>) -> Self {
        // INVARIANT: Workers finish in any order, summaries are sorted by name.
        reports.sort_by(|a, b| a.name.cmp(&b.name));
        Self { reports }
    }

    pub fn succeeded(&self) -> usize {
        self.reports.iter().filter(|report| report.success).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &Report> {
        self.reports.iter().filter(|report| !report.success)
    }

    pub fn is_success(&self) -> bool {
        self.reports.iter().all(|report| report.success)
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&Report> {
        self.reports.iter().find(|report| report.name == name)
    }
}

impl Display for Summary {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        let failed = self.reports.len() - self.succeeded();
        write!(fmt, "{} ok, {failed} failed", self.succeeded())?;
        let names = self
            .failures()
            .map(|report| report.name.as_str())
            .collect::<Vec<_>>();
        if !names.is_empty() {
            write!(fmt, ": {}", names.join(", "))?;
        }

        Ok(())
    }
}

/// Output sink shared by every worker.
#[derive(Clone)]
pub struct Console {
    render: Render,
    out: Arc<Mutex<Box<dyn Write + Send>>>,
    interactive: bool,
}

impl std::fmt::Debug for Console {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.debug_struct("Console")
            .field("render", &self.render)
            .field("interactive", &self.interactive)
            .finish_non_exhaustive()
    }
}

impl Console {
    /// Console writing to standard output.
    ///
    /// Colours and progress bars are only used if standard output is a
    /// terminal.
    pub fn stdout(color: bool, verbose: bool) -> Self {
        let interactive = stdout().is_terminal();
        Self {
            render: Render::new(color && interactive, verbose),
            out: Arc::new(Mutex::new(Box::new(stdout()))),
            interactive,
        }
    }

    /// Console writing to arbitrary sink, never showing progress bars.
    pub fn with_writer(render: Render, writer: impl Write + Send + 'static) -> Self {
        Self {
            render,
            out: Arc::new(Mutex::new(Box::new(writer))),
            interactive: false,
        }
    }

    pub fn render(&self) -> &Render {
        &self.render
    }

    /// Write one block of text with a single write.
    pub fn emit(&self, block: impl AsRef<str>) {
        let mut out = self
            .out
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Err(error) = out.write_all(block.as_ref().as_bytes()).and_then(|_| out.flush()) {
            warn!("failed to write output: {error}");
        }
    }

    /// Render and write report.
    pub fn report(&self, report: &Report) {
        self.emit(report.render(&self.render));
    }

    /// Progress bar for batch of `len` repositories.
    ///
    /// Hidden when the console is not interactive.
    pub fn progress(&self, len: usize, message: impl Into<String>) -> ProgressBar {
        if !self.interactive {
            return ProgressBar::hidden();
        }

        let bar = ProgressBar::new(len as u64);
        let template =
            "{elapsed_precise:.green}  {msg:<20}  [{wide_bar:.yellow/blue}] {pos}/{len}";
        match ProgressStyle::with_template(template) {
            Ok(style) => bar.set_style(style.progress_chars("-Cco.")),
            Err(error) => warn!("invalid progress style: {error}"),
        }
        bar.set_message(message.into());
        bar.enable_steady_tick(Duration::from_millis(100));
        bar
    }
}

/// Answer to the deletion prompt of an undeclared directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteChoice {
    Delete,
    Skip,
    /// Stop processing any further directories.
    Abort,
}

impl Display for DeleteChoice {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Delete => fmt.write_str("delete"),
            Self::Skip => fmt.write_str("skip"),
            Self::Abort => fmt.write_str("abort"),
        }
    }
}

/// Ask user for decisions.
pub trait Prompter {
    /// Ask what to do with undeclared directory `name`.
    fn delete_choice(&mut self, name: &str, detail: &str) -> Result<DeleteChoice>;

    /// Ask yes or no question.
    fn confirm(&mut self, message: &str) -> Result<bool>;
}

/// Prompt user on the terminal through [`inquire`].
#[derive(Debug, Default, Clone, Copy)]
pub struct InquirePrompter;

impl Prompter for InquirePrompter {
    fn delete_choice(&mut self, name: &str, detail: &str) -> Result<DeleteChoice> {
        let choices = vec![DeleteChoice::Skip, DeleteChoice::Delete, DeleteChoice::Abort];
        Ok(Select::new(&format!("{name} ({detail})"), choices).prompt()?)
    }

    fn confirm(&mut self, message: &str) -> Result<bool> {
        Ok(Confirm::new(message).with_default(false).prompt()?)
    }
}

/// Prompting error types.
#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    /// Terminal prompt failed or was cancelled.
    #[error(transparent)]
    Inquire(#[from] inquire::InquireError),
}

/// Friendly result alias :3
pub type Result<T, E = PromptError> = std::result::Result<T, E>;
