// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Shared hook installation.
//!
//! Every file in the shared hook source directory is a candidate hook. For
//! each checkout, `<repo>/.git/hooks/<name>` is made a symlink to the shared
//! file, unless the repository opts out of shared hooks.
//!
//! # Idempotence
//!
//! Existing entries are never overwritten. A symlink that is already in place
//! makes linking a no-op, and a plain file that the user dropped in as a
//! custom hook is left untouched. Only an opt-out removes anything, and then
//! only plain files: a symlink at the hook path is assumed to have been left
//! there deliberately.

use crate::{config::RepoEntry, syscall::Syscall};

use std::{
    ffi::OsString,
    fs::{create_dir_all, read_dir, remove_file, symlink_metadata},
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{debug, instrument, warn};

/// What happened to a single hook path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookAction {
    /// Symlink to shared hook created.
    Linked(String),

    /// Symlink already present.
    AlreadyLinked(String),

    /// Plain file left in place.
    Custom(String),

    /// Plain file removed because the repository ignores hooks.
    Removed(String),
}

/// Captured result of one init command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitRun {
    pub command: String,
    pub success: bool,
    pub lines: Vec<String>,
}

/// Everything [`HookLinker::link`] did to one checkout.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HookOutcome {
    pub actions: Vec<HookAction>,
    pub init: Vec<InitRun>,
}

impl HookOutcome {
    /// Human readable summary lines.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for action in &self.actions {
            match action {
                HookAction::Linked(name) => lines.push(format!("hook {name} linked")),
                HookAction::Removed(name) => lines.push(format!("hook {name} removed")),
                HookAction::Custom(name) => lines.push(format!("hook {name} kept (custom)")),
                HookAction::AlreadyLinked(_) => {}
            }
        }

        for run in &self.init {
            let status = if run.success { "OK" } else { "Error" };
            lines.push(format!("init {} {status}", run.command));
            lines.extend(run.lines.iter().map(|line| format!("  {line}")));
        }

        lines
    }
}

/// Install shared hooks and run init commands.
#[derive(Debug)]
pub struct HookLinker<S>
where
    S: Syscall,
{
    hooks_dir: PathBuf,
    syscall: Arc<S>,
}

impl<S> Clone for HookLinker<S>
where
    S: Syscall,
{
    fn clone(&self) -> Self {
        Self {
            hooks_dir: self.hooks_dir.clone(),
            syscall: Arc::clone(&self.syscall),
        }
    }
}

impl<S> HookLinker<S>
where
    S: Syscall,
{
    /// Construct new linker sourcing hooks from `hooks_dir`.
    pub fn new(hooks_dir: impl Into<PathBuf>, syscall: Arc<S>) -> Self {
        Self {
            hooks_dir: hooks_dir.into(),
            syscall,
        }
    }

    /// Install hooks, then run every init command of `entry`.
    ///
    /// # Errors
    ///
    /// - Return [`HookError`] if hook installation fails. Init commands are
    ///   not run in that case.
    #[instrument(skip(self, entry), level = "debug")]
    pub fn link(&self, repo_dir: &Path, entry: &RepoEntry) -> Result<HookOutcome> {
        let actions = self.install_hooks(repo_dir, entry)?;
        let init = self.run_init_commands(repo_dir, entry);

        Ok(HookOutcome { actions, init })
    }

    /// Make hook directory of checkout match the shared hook source.
    ///
    /// # Errors
    ///
    /// - Return [`HookError::ReadSource`] if shared hook directory exists
    ///   but cannot be listed.
    /// - Return [`HookError::Install`] if a hook path cannot be inspected,
    ///   linked, or removed.
    #[instrument(skip(self, entry), level = "debug")]
    pub fn install_hooks(&self, repo_dir: &Path, entry: &RepoEntry) -> Result<Vec<HookAction>> {
        let sources = self.sources()?;
        if sources.is_empty() {
            debug!("no shared hooks in {:?}", self.hooks_dir.display());
            return Ok(Vec::new());
        }

        let target_dir = repo_dir.join(".git").join("hooks");
        if !entry.ignore_hooks {
            create_dir_all(&target_dir).map_err(|err| HookError::Install {
                source: err,
                path: target_dir.clone(),
            })?;
        }

        let mut actions = Vec::new();
        for (name, source) in sources {
            let hook = target_dir.join(&name);
            let install_error = |err| HookError::Install {
                source: err,
                path: hook.clone(),
            };

            let existing = match symlink_metadata(&hook) {
                Ok(metadata) => Some(metadata.file_type()),
                Err(err) if err.kind() == ErrorKind::NotFound => None,
                Err(err) => return Err(install_error(err)),
            };

            match (entry.ignore_hooks, existing) {
                (true, Some(kind)) if !kind.is_symlink() => {
                    debug!("remove stray hook {:?}", hook.display());
                    remove_file(&hook).map_err(install_error)?;
                    actions.push(HookAction::Removed(name));
                }
                (true, _) => {}
                (false, None) => {
                    debug!("link {:?} -> {:?}", hook.display(), source.display());
                    symlink(&source, &hook).map_err(install_error)?;
                    actions.push(HookAction::Linked(name));
                }
                (false, Some(kind)) if kind.is_symlink() => {
                    actions.push(HookAction::AlreadyLinked(name));
                }
                (false, Some(_)) => {
                    warn!("keep custom hook {:?}", hook.display());
                    actions.push(HookAction::Custom(name));
                }
            }
        }

        Ok(actions)
    }

    /// Run init commands of `entry` inside `repo_dir` in declaration order.
    ///
    /// Every command runs regardless of whether earlier ones failed. Empty
    /// commands are skipped.
    pub fn run_init_commands(&self, repo_dir: &Path, entry: &RepoEntry) -> Vec<InitRun> {
        let mut runs = Vec::new();
        for command in &entry.init_commands {
            let argv = command.argv();
            let Some((program, args)) = argv.split_first() else {
                continue;
            };

            let args = args.iter().map(OsString::from).collect::<Vec<_>>();
            let output = self.syscall.call(repo_dir, program.as_ref(), &args);
            if !output.success {
                warn!("init command {:?} failed in {:?}", argv.join(" "), repo_dir.display());
            }

            runs.push(InitRun {
                command: argv.join(" "),
                success: output.success,
                lines: output.lines(),
            });
        }

        runs
    }

    /// Shared hook files sorted by name, paired with their absolute path.
    fn sources(&self) -> Result<Vec<(String, PathBuf)>> {
        let read_error = |err| HookError::ReadSource {
            source: err,
            path: self.hooks_dir.clone(),
        };

        let entries = match read_dir(&self.hooks_dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(read_error(err)),
        };

        let mut sources = Vec::new();
        for entry in entries {
            let entry = entry.map_err(read_error)?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            // INVARIANT: Symlinks must point at an absolute source path.
            let path = path.canonicalize().map_err(read_error)?;
            sources.push((entry.file_name().to_string_lossy().into_owned(), path));
        }
        sources.sort();

        Ok(sources)
    }
}

#[cfg(unix)]
fn symlink(source: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(source, link)
}

#[cfg(windows)]
fn symlink(source: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(source, link)
}

/// Hook installation error types.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    /// Shared hook directory cannot be listed.
    #[error("failed to read shared hooks at {:?}", path.display())]
    ReadSource {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Hook path of a checkout cannot be manipulated.
    #[error("failed to install hook at {:?}", path.display())]
    Install {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = HookError> = std::result::Result<T, E>;
