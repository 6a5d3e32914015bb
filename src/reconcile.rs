// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Reversible remote URL rewrites.
//!
//! Rewriting the URL of a checkout is done in two phases through a pair of
//! remotes: `origin` holds the active URL, and `old` holds the URL `origin`
//! had before the most recent rewrite. A checkout is __settled__ when it has
//! no `old` remote, and __rewritten__ when it does.
//!
//! # Ordering
//!
//! Both transitions order their steps so that an interruption at any point
//! leaves at least one usable remote behind:
//!
//! - Reconfigure records the preimage in `old` before touching `origin`. An
//!   interruption in between leaves `origin` untouched, plus a redundant `old`
//!   pointing at the same URL.
//! - Revert copies the URL of `old` back into `origin` before removing `old`.
//!   An interruption in between leaves `origin` restored with `old` still
//!   present, so running revert again finishes the job.
//!
//! Only one level of rollback is kept. Reconfiguring an already rewritten
//! checkout replaces its `old` remote with the immediately prior URL.

use crate::{
    git::Git,
    remote::{RemoteError, RemoteSet, RemoteTable, OLD, ORIGIN},
    syscall::{CommandOutput, Syscall},
};

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::Path,
};
use tracing::{debug, instrument};

/// Rewrite state of a checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteState {
    /// No `old` remote.
    Settled,

    /// `old` remote holds the preimage of the latest rewrite.
    Rewritten { preimage: String },
}

impl From<&RemoteTable> for RemoteState {
    fn from(table: &RemoteTable) -> Self {
        match table.old() {
            Some(preimage) => Self::Rewritten {
                preimage: preimage.to_string(),
            },
            None => Self::Settled,
        }
    }
}

/// Effect of a reconciler transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// `origin` moved from `from` to `to`, `from` kept in `old`.
    Rewritten { from: String, to: String },

    /// `origin` restored to `to`, `old` removed.
    Reverted { to: String },

    /// Nothing to do.
    Unchanged,
}

impl Display for Transition {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Rewritten { from, to } => write!(fmt, "{from} -> {to}"),
            Self::Reverted { to } => write!(fmt, "restored {to}"),
            Self::Unchanged => fmt.write_str("unchanged"),
        }
    }
}

/// Drive the reconfigure and revert transitions of checkouts.
#[derive(Debug)]
pub struct RemoteReconciler<'a, S>
where
    S: Syscall,
{
    git: &'a Git<S>,
    remotes: &'a RemoteSet<S>,
}

impl<'a, S> RemoteReconciler<'a, S>
where
    S: Syscall,
{
    pub fn new(git: &'a Git<S>, remotes: &'a RemoteSet<S>) -> Self {
        Self { git, remotes }
    }

    /// Current state of checkout at `dir`.
    ///
    /// # Errors
    ///
    /// - Return [`ReconcileError::Remote`] if remotes cannot be read.
    #[cfg(test)]
    pub fn state(&self, dir: &Path) -> Result<RemoteState> {
        Ok(RemoteState::from(&self.remotes.read(dir)?))
    }

    /// Does `origin` of `dir` disagree with `target`?
    ///
    /// # Errors
    ///
    /// - Return [`ReconcileError::Remote`] if remotes cannot be read.
    /// - Return [`ReconcileError::NoOrigin`] if `dir` has no `origin`.
    pub fn needs_reconfigure(&self, dir: &Path, target: &str) -> Result<Option<String>> {
        let table = self.remotes.read(dir)?;
        let current = table.origin().ok_or(ReconcileError::NoOrigin)?;
        Ok((current != target).then(|| current.to_string()))
    }

    /// Point `origin` of `dir` at `target`, keeping the current URL in `old`.
    ///
    /// Does nothing if `origin` already equals `target`.
    ///
    /// # Errors
    ///
    /// - Return [`ReconcileError::Remote`] if remotes cannot be read.
    /// - Return [`ReconcileError::NoOrigin`] if `dir` has no `origin`.
    /// - Return [`ReconcileError::Step`] if a Git step fails. Earlier steps
    ///   are not rolled back.
    #[instrument(skip(self), level = "debug")]
    pub fn reconfigure(&self, dir: &Path, target: &str) -> Result<Transition> {
        let table = self.remotes.read(dir)?;
        let preimage = table.origin().ok_or(ReconcileError::NoOrigin)?.to_string();
        if preimage == target {
            return Ok(Transition::Unchanged);
        }

        let result = self.rewrite(dir, &table, &preimage, target);
        self.remotes.invalidate(dir);
        result?;

        Ok(Transition::Rewritten {
            from: preimage,
            to: target.to_string(),
        })
    }

    fn rewrite(&self, dir: &Path, table: &RemoteTable, preimage: &str, target: &str) -> Result<()> {
        // INVARIANT: Keep at most one level of rollback.
        if table.old().is_some() {
            debug!("discard previous preimage of {:?}", dir.display());
            step("remove old", self.git.remote_remove(dir, OLD))?;
        }

        // INVARIANT: Record preimage before mutating origin.
        step("add old", self.git.remote_add(dir, OLD, preimage))?;
        step("set origin", self.git.remote_set_url(dir, ORIGIN, target))?;

        Ok(())
    }

    /// Restore `origin` of `dir` from `old`, then drop `old`.
    ///
    /// Does nothing if `dir` is settled. Safe to re-run after an interrupted
    /// revert.
    ///
    /// # Errors
    ///
    /// - Return [`ReconcileError::Remote`] if remotes cannot be read.
    /// - Return [`ReconcileError::Step`] if a Git step fails.
    #[instrument(skip(self), level = "debug")]
    pub fn revert(&self, dir: &Path) -> Result<Transition> {
        let table = self.remotes.read(dir)?;
        let Some(preimage) = table.old().map(ToString::to_string) else {
            return Ok(Transition::Unchanged);
        };

        let result = self.restore(dir, &table, &preimage);
        self.remotes.invalidate(dir);
        result?;

        Ok(Transition::Reverted { to: preimage })
    }

    fn restore(&self, dir: &Path, table: &RemoteTable, preimage: &str) -> Result<()> {
        // INVARIANT: Copy URL back before deleting old.
        if table.origin().is_some() {
            step("set origin", self.git.remote_set_url(dir, ORIGIN, preimage))?;
        } else {
            step("add origin", self.git.remote_add(dir, ORIGIN, preimage))?;
        }
        step("remove old", self.git.remote_remove(dir, OLD))?;

        Ok(())
    }
}

fn step(name: &'static str, output: CommandOutput) -> Result<()> {
    if output.success {
        return Ok(());
    }

    Err(ReconcileError::Step {
        step: name,
        output: output.text,
    })
}

/// Remote reconciliation error types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Checkout has no `origin` remote to rewrite.
    #[error("no origin remote")]
    NoOrigin,

    /// Git step of a transition failed.
    #[error("{step} failed: {output}")]
    Step { step: &'static str, output: String },
}

/// Friendly result alias :3
pub type Result<T, E = ReconcileError> = std::result::Result<T, E>;
