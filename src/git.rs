// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Typed Git invocations.
//!
//! Git is treated as an opaque external command. Each method below maps to
//! exactly one Git invocation, and reports its exit status and combined
//! output without interpreting it further.

use crate::syscall::{CommandOutput, Syscall, SystemCall};

use std::{
    ffi::{OsStr, OsString},
    path::Path,
    sync::Arc,
};

/// Git binary driven through a [`Syscall`].
#[derive(Debug)]
pub struct Git<S = SystemCall>
where
    S: Syscall,
{
    syscall: Arc<S>,
    program: OsString,
}

impl<S> Clone for Git<S>
where
    S: Syscall,
{
    fn clone(&self) -> Self {
        Self {
            syscall: Arc::clone(&self.syscall),
            program: self.program.clone(),
        }
    }
}

impl<S> Git<S>
where
    S: Syscall,
{
    /// Construct new Git driver using the `git` binary on `PATH`.
    pub fn new(syscall: S) -> Self {
        Self::with_shared(Arc::new(syscall))
    }

    pub fn with_shared(syscall: Arc<S>) -> Self {
        Self {
            syscall,
            program: "git".into(),
        }
    }

    /// Clone `url` into `dir`, running from `parent`.
    pub fn clone_into(&self, parent: &Path, url: &str, dir: &Path) -> CommandOutput {
        self.call(
            parent,
            [OsStr::new("clone"), OsStr::new(url), dir.as_os_str()],
        )
    }

    pub fn fetch(&self, dir: &Path) -> CommandOutput {
        self.call(dir, ["fetch"])
    }

    pub fn pull(&self, dir: &Path) -> CommandOutput {
        self.call(dir, ["pull"])
    }

    /// Top level directory of the work tree containing `dir`.
    pub fn toplevel(&self, dir: &Path) -> CommandOutput {
        self.call(dir, ["rev-parse", "--show-toplevel"])
    }

    /// List remotes with their URLs.
    pub fn remote_verbose(&self, dir: &Path) -> CommandOutput {
        self.call(dir, ["remote", "-v"])
    }

    pub fn remote_add(&self, dir: &Path, name: &str, url: &str) -> CommandOutput {
        self.call(dir, ["remote", "add", name, url])
    }

    pub fn remote_set_url(&self, dir: &Path, name: &str, url: &str) -> CommandOutput {
        self.call(dir, ["remote", "set-url", name, url])
    }

    pub fn remote_remove(&self, dir: &Path, name: &str) -> CommandOutput {
        self.call(dir, ["remote", "remove", name])
    }

    /// Short branch and working tree status.
    pub fn status(&self, dir: &Path) -> CommandOutput {
        self.call(dir, ["status", "--short", "--branch"])
    }

    fn call(
        &self,
        cwd: &Path,
        args: impl IntoIterator<Item = impl AsRef<OsStr>>,
    ) -> CommandOutput {
        let args = args
            .into_iter()
            .map(|arg| arg.as_ref().to_os_string())
            .collect::<Vec<_>>();
        self.syscall.call(cwd, &self.program, &args)
    }
}
