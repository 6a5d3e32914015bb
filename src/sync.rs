// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Clone-or-update of a single repository.

use crate::{
    config::RepoEntry,
    console::Report,
    git::Git,
    hook::HookLinker,
    substitute::Substitutions,
    syscall::Syscall,
};

use std::{fs::create_dir_all, path::Path};
use tracing::{debug, instrument};

/// How existing checkouts get refreshed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    #[default]
    Fetch,
    Pull,
}

impl SyncMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Pull => "pull",
        }
    }
}

/// Bring one repository directory in line with its declaration.
///
/// Existing directories are fetched or pulled. Missing directories are
/// cloned from the substituted URL, and get their hooks installed. Failures
/// are never propagated, they only show up in the returned [`Report`].
#[derive(Debug)]
pub struct RepoSync<S>
where
    S: Syscall,
{
    git: Git<S>,
    linker: HookLinker<S>,
    substitutions: Substitutions,
    mode: SyncMode,
}

impl<S> Clone for RepoSync<S>
where
    S: Syscall,
{
    fn clone(&self) -> Self {
        Self {
            git: self.git.clone(),
            linker: self.linker.clone(),
            substitutions: self.substitutions.clone(),
            mode: self.mode,
        }
    }
}

impl<S> RepoSync<S>
where
    S: Syscall,
{
    pub fn new(
        git: Git<S>,
        linker: HookLinker<S>,
        substitutions: Substitutions,
        mode: SyncMode,
    ) -> Self {
        Self {
            git,
            linker,
            substitutions,
            mode,
        }
    }

    #[instrument(skip(self, entry), level = "debug")]
    pub fn process(&self, repo_dir: &Path, entry: &RepoEntry) -> Report {
        if repo_dir.exists() {
            return self.update(repo_dir, entry);
        }

        self.clone_fresh(repo_dir, entry)
    }

    fn update(&self, repo_dir: &Path, entry: &RepoEntry) -> Report {
        debug!("{} {:?}", self.mode.as_str(), repo_dir.display());
        let output = match self.mode {
            SyncMode::Fetch => self.git.fetch(repo_dir),
            SyncMode::Pull => self.git.pull(repo_dir),
        };

        let report = Report::new(&entry.name, self.mode.as_str());
        if output.success {
            report.succeeded(output.lines())
        } else {
            report.failed(output.lines())
        }
    }

    fn clone_fresh(&self, repo_dir: &Path, entry: &RepoEntry) -> Report {
        let url = self.substitutions.apply(&entry.url);
        let report = Report::new(&entry.name, format!("clone {url}"));

        // INVARIANT: Parent directories always exist before cloning.
        let parent = repo_dir.parent().unwrap_or(Path::new("."));
        if let Err(error) = create_dir_all(parent) {
            return report.failed([format!("failed to create {:?}: {error}", parent.display())]);
        }

        debug!("clone {url} into {:?}", repo_dir.display());
        let output = self.git.clone_into(parent, &url, repo_dir);
        if !output.success {
            return report.failed(output.lines());
        }

        let mut lines = output.lines();
        match self.linker.link(repo_dir, entry) {
            Ok(outcome) => {
                lines.extend(outcome.lines());
                report.succeeded(lines)
            }
            Err(error) => {
                lines.push(format!("{error}"));
                report.failed(lines)
            }
        }
    }
}
