// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Remote tables of checkouts.
//!
//! Reads the remotes configured in a checkout through `git remote -v`, and
//! keeps them in a per-run cache. The output of `git remote -v` consists of
//! one line per remote and direction:
//!
//! ```text
//! origin	git@github.com:org/api.git (fetch)
//! origin	git@github.com:org/api.git (push)
//! ```
//!
//! Only fetch URLs make it into a [`RemoteTable`]. URLs may contain spaces,
//! e.g., local paths, so the name ends at the tab and the direction is the
//! last space separated word.
//!
//! Git looks for a repository in parent directories too. A directory only
//! counts as a checkout if it is the top level of its own work tree, so a
//! plain directory inside some enclosing repository never reports the remotes
//! of that repository.

use crate::{git::Git, syscall::Syscall};

use std::{
    collections::{BTreeMap, HashMap},
    path::{Path, PathBuf},
    str::FromStr,
    sync::Mutex,
};
use tracing::{debug, instrument};

/// Name of the active remote.
pub const ORIGIN: &str = "origin";

/// Name of the remote holding the preimage of a rewrite.
pub const OLD: &str = "old";

/// Direction of a remote URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Fetch,
    Push,
}

impl FromStr for Direction {
    type Err = RemoteError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        match data {
            "(fetch)" => Ok(Self::Fetch),
            "(push)" => Ok(Self::Push),
            _ => Err(RemoteError::Malformed { line: data.into() }),
        }
    }
}

/// One line of `git remote -v` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteLine {
    pub name: String,
    pub url: String,
    pub direction: Direction,
}

impl FromStr for RemoteLine {
    type Err = RemoteError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let malformed = || RemoteError::Malformed { line: line.into() };

        let (name, rest) = line.split_once('\t').ok_or_else(malformed)?;
        let (url, direction) = rest.rsplit_once(' ').ok_or_else(malformed)?;
        if name.is_empty() || name.contains(char::is_whitespace) || url.trim().is_empty() {
            return Err(malformed());
        }

        Ok(Self {
            name: name.to_string(),
            url: url.trim().to_string(),
            direction: direction.parse().map_err(|_| malformed())?,
        })
    }
}

/// Fetch URLs of a checkout keyed by remote name.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RemoteTable(BTreeMap<String, String>);

impl RemoteTable {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// URL of the active remote.
    pub fn origin(&self) -> Option<&str> {
        self.get(ORIGIN)
    }

    /// URL of the rewrite preimage, if a rewrite is pending.
    pub fn old(&self) -> Option<&str> {
        self.get(OLD)
    }
}

impl FromStr for RemoteTable {
    type Err = RemoteError;

    /// Parse `git remote -v` output.
    ///
    /// Blank lines are skipped. Any other line must parse as a
    /// [`RemoteLine`], malformed lines fail the whole table.
    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut table = BTreeMap::new();
        for line in data.lines().filter(|line| !line.trim().is_empty()) {
            let remote: RemoteLine = line.parse()?;
            if remote.direction == Direction::Fetch {
                table.insert(remote.name, remote.url);
            }
        }

        Ok(Self(table))
    }
}

impl<const N: usize> From<[(&str, &str); N]> for RemoteTable {
    fn from(remotes: [(&str, &str); N]) -> Self {
        Self(
            remotes
                .into_iter()
                .map(|(name, url)| (name.to_string(), url.to_string()))
                .collect(),
        )
    }
}

/// Per-run cache of remote tables.
///
/// Tables are read lazily on first access of a directory. Nothing outlives
/// the process. Callers that mutate remotes must [`invalidate`] the
/// directory afterwards.
///
/// [`invalidate`]: RemoteSet::invalidate
#[derive(Debug)]
pub struct RemoteSet<S>
where
    S: Syscall,
{
    git: Git<S>,
    tables: Mutex<HashMap<PathBuf, RemoteTable>>,
}

impl<S> RemoteSet<S>
where
    S: Syscall,
{
    /// Construct new empty cache.
    pub fn new(git: Git<S>) -> Self {
        Self {
            git,
            tables: Mutex::new(HashMap::new()),
        }
    }

    /// Remote table of checkout at `dir`.
    ///
    /// # Errors
    ///
    /// - Return [`RemoteError::Command`] if Git fails, e.g., `dir` is not
    ///   inside any checkout.
    /// - Return [`RemoteError::Enclosed`] if `dir` is not the top level of
    ///   its checkout.
    /// - Return [`RemoteError::Malformed`] if `git remote -v` output cannot
    ///   be parsed.
    #[instrument(skip(self), level = "debug")]
    pub fn read(&self, dir: &Path) -> Result<RemoteTable> {
        if let Some(table) = self.lock().get(dir) {
            return Ok(table.clone());
        }

        let output = self.git.toplevel(dir);
        if !output.success {
            return Err(RemoteError::Command { output: output.text });
        }

        // INVARIANT: Never read remotes of a repository enclosing `dir`.
        let toplevel = PathBuf::from(output.text.trim());
        if canonical(&toplevel) != canonical(dir) {
            return Err(RemoteError::Enclosed {
                dir: dir.to_path_buf(),
                toplevel,
            });
        }

        let output = self.git.remote_verbose(dir);
        if !output.success {
            return Err(RemoteError::Command { output: output.text });
        }

        let table: RemoteTable = output.text.parse()?;
        debug!("cache {} remotes for {:?}", table.0.len(), dir.display());
        self.lock().insert(dir.to_path_buf(), table.clone());

        Ok(table)
    }

    /// Forget cached table of `dir`.
    pub fn invalidate(&self, dir: &Path) {
        self.lock().remove(dir);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, RemoteTable>> {
        // INVARIANT: A poisoned cache only ever holds complete tables.
        self.tables
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Remote table error types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// Listing remotes failed.
    #[error("failed to list remotes: {output}")]
    Command { output: String },

    /// Directory lies inside a checkout rooted elsewhere.
    #[error("{:?} is not a checkout, it lies inside {:?}", dir.display(), toplevel.display())]
    Enclosed { dir: PathBuf, toplevel: PathBuf },

    /// Line of `git remote -v` output does not have the expected columns.
    #[error("malformed remote line {line:?}")]
    Malformed { line: String },
}

/// Friendly result alias :3
type Result<T, E = RemoteError> = std::result::Result<T, E>;
