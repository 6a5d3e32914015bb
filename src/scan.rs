// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Workspace drift analysis.
//!
//! Compares the repositories a project declares against the directories that
//! actually exist in its workspace. A directory is __missing__ when declared
//! but absent, and __undeclared__ when present but not declared. Directories
//! listed in the ignore set never count as present.

use crate::{
    console::{DeleteChoice, PromptError, Prompter},
    remote::{RemoteError, RemoteSet},
    syscall::Syscall,
};

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::{Display, Formatter, Result as FmtResult},
    fs::{read_dir, remove_dir_all},
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tracing::{info, instrument, warn};

/// What could be learned about the remote of an undeclared directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteProbe {
    /// Fetch URL of `origin`.
    Url(String),

    /// Checkout without an `origin` remote.
    NoOrigin,

    /// Directory is not a checkout.
    NotARepo,

    /// Remotes listed, but the listing made no sense.
    Unreadable(String),
}

impl Display for RemoteProbe {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Url(url) => fmt.write_str(url),
            Self::NoOrigin => fmt.write_str("No origin remote"),
            Self::NotARepo => fmt.write_str("Not a git repo"),
            Self::Unreadable(reason) => write!(fmt, "Unreadable remotes: {reason}"),
        }
    }
}

/// Difference between declared and actual repository directories.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Drift {
    /// Declared but absent.
    pub missing: BTreeSet<String>,

    /// Present but not declared, with their probed remote.
    pub undeclared: BTreeMap<String, RemoteProbe>,
}

impl Drift {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.undeclared.is_empty()
    }
}

impl Display for Drift {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        if self.is_clean() {
            return writeln!(fmt, "No drift");
        }

        if !self.missing.is_empty() {
            writeln!(fmt, "Missing:")?;
            for name in &self.missing {
                writeln!(fmt, "  {name}")?;
            }
        }

        if !self.undeclared.is_empty() {
            writeln!(fmt, "Undeclared:")?;
            for (name, probe) in &self.undeclared {
                writeln!(fmt, "  {name}: {probe}")?;
            }
        }

        Ok(())
    }
}

/// Result of interactive deletion of undeclared directories.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PruneOutcome {
    pub deleted: Vec<String>,
    pub skipped: Vec<String>,

    /// User stopped before every directory was visited.
    pub aborted: bool,
}

/// Immediate subdirectories of `workspace` not named in `ignore`.
///
/// A workspace that does not exist yet has no directories.
///
/// # Errors
///
/// - Return [`ScanError::ReadWorkspace`] if workspace cannot be listed.
pub fn actual_dirs(workspace: &Path, ignore: &BTreeSet<String>) -> Result<BTreeSet<String>> {
    let read_error = |err| ScanError::ReadWorkspace {
        source: err,
        path: workspace.to_path_buf(),
    };

    let entries = match read_dir(workspace) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            warn!("workspace {:?} does not exist", workspace.display());
            return Ok(BTreeSet::new());
        }
        Err(err) => return Err(read_error(err)),
    };

    let mut dirs = BTreeSet::new();
    for entry in entries {
        let entry = entry.map_err(read_error)?;
        if !entry.path().is_dir() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        if !ignore.contains(&name) {
            dirs.insert(name);
        }
    }

    Ok(dirs)
}

/// Read-only drift analysis of one workspace.
#[derive(Debug)]
pub struct FleetScanner<'a, S>
where
    S: Syscall,
{
    remotes: &'a RemoteSet<S>,
}

impl<'a, S> FleetScanner<'a, S>
where
    S: Syscall,
{
    pub fn new(remotes: &'a RemoteSet<S>) -> Self {
        Self { remotes }
    }

    /// Compute drift of `workspace` against `declared` directory names.
    ///
    /// Never mutates anything. Undeclared directories that are not checkouts
    /// are labeled, not treated as errors.
    ///
    /// # Errors
    ///
    /// - Return [`ScanError::ReadWorkspace`] if workspace cannot be listed.
    #[instrument(skip(self, declared, ignore), level = "debug")]
    pub fn analyze(
        &self,
        workspace: &Path,
        declared: &BTreeSet<String>,
        ignore: &BTreeSet<String>,
    ) -> Result<Drift> {
        let actual = actual_dirs(workspace, ignore)?;
        let missing = declared.difference(&actual).cloned().collect();
        let undeclared = actual
            .difference(declared)
            .map(|name| (name.clone(), self.probe(&workspace.join(name))))
            .collect();

        Ok(Drift {
            missing,
            undeclared,
        })
    }

    fn probe(&self, dir: &Path) -> RemoteProbe {
        match self.remotes.read(dir) {
            Ok(table) => match table.origin() {
                Some(url) => RemoteProbe::Url(url.to_string()),
                None => RemoteProbe::NoOrigin,
            },
            Err(RemoteError::Command { .. } | RemoteError::Enclosed { .. }) => {
                RemoteProbe::NotARepo
            }
            Err(error @ RemoteError::Malformed { .. }) => {
                RemoteProbe::Unreadable(error.to_string())
            }
        }
    }

    /// Offer deletion of every undeclared directory of `drift`.
    ///
    /// Directories are visited in name order. Answering abort stops right
    /// away, leaving every remaining directory untouched.
    ///
    /// # Errors
    ///
    /// - Return [`ScanError::Prompt`] if prompting fails.
    /// - Return [`ScanError::Delete`] if a directory cannot be removed.
    pub fn prune(
        &self,
        workspace: &Path,
        drift: &Drift,
        prompter: &mut dyn Prompter,
    ) -> Result<PruneOutcome> {
        let mut outcome = PruneOutcome::default();
        for (name, probe) in &drift.undeclared {
            match prompter.delete_choice(name, &probe.to_string())? {
                DeleteChoice::Delete => {
                    let path = workspace.join(name);
                    info!("delete {:?}", path.display());
                    remove_dir_all(&path).map_err(|err| ScanError::Delete { source: err, path })?;
                    outcome.deleted.push(name.clone());
                }
                DeleteChoice::Skip => outcome.skipped.push(name.clone()),
                DeleteChoice::Abort => {
                    outcome.aborted = true;
                    break;
                }
            }
        }

        Ok(outcome)
    }
}

/// Drift analysis error types.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// Workspace cannot be listed.
    #[error("failed to read workspace at {:?}", path.display())]
    ReadWorkspace {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Undeclared directory cannot be deleted.
    #[error("failed to delete {:?}", path.display())]
    Delete {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    #[error(transparent)]
    Prompt(#[from] PromptError),
}

/// Friendly result alias :3
pub type Result<T, E = ScanError> = std::result::Result<T, E>;
