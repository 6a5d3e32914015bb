// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! External command boundary.
//!
//! Everything grove knows about a checkout comes from running external
//! programs inside of it, mostly Git. This module models that boundary as a
//! single trait so the rest of the crate never spawns processes directly.

use std::{
    ffi::{OsStr, OsString},
    fmt::{Display, Formatter, Result as FmtResult},
    path::Path,
    process::{Command, Stdio},
};
use tracing::{debug, instrument};

/// Captured result of an external command.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Command exited with a zero status.
    pub success: bool,

    /// Captured stdout followed by stderr, trimmed.
    pub text: String,
}

impl CommandOutput {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            success: true,
            text: text.into(),
        }
    }

    pub fn failed(text: impl Into<String>) -> Self {
        Self {
            success: false,
            text: text.into(),
        }
    }

    /// Non-empty output lines.
    pub fn lines(&self) -> Vec<String> {
        self.text
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .map(ToString::to_string)
            .collect()
    }
}

impl Display for CommandOutput {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(&self.text)
    }
}

/// Run external programs.
pub trait Syscall: Send + Sync + 'static {
    /// Run `program` with `args` inside `cwd`, capturing its output.
    ///
    /// Never fails. Spawn failures are reported as an unsuccessful
    /// [`CommandOutput`] carrying the reason.
    fn call(&self, cwd: &Path, program: &OsStr, args: &[OsString]) -> CommandOutput;
}

/// Run external programs through [`std::process::Command`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCall;

impl Syscall for SystemCall {
    #[instrument(skip(self, args), level = "debug")]
    fn call(&self, cwd: &Path, program: &OsStr, args: &[OsString]) -> CommandOutput {
        let output = match Command::new(program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .output()
        {
            Ok(output) => output,
            Err(error) => {
                debug!("failed to spawn {program:?}: {error}");
                return CommandOutput::failed(format!("failed to run {program:?}: {error}"));
            }
        };

        let stdout = String::from_utf8_lossy(output.stdout.as_slice());
        let stderr = String::from_utf8_lossy(output.stderr.as_slice());
        let mut message = String::new();
        message.push_str(stdout.trim_end());
        if !stderr.trim().is_empty() {
            if !message.is_empty() {
                message.push('\n');
            }
            message.push_str(stderr.trim_end());
        }

        CommandOutput {
            success: output.status.success(),
            text: message.trim().to_string(),
        }
    }
}
