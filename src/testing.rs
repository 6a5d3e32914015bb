// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! In-memory Git double for unit tests.

use crate::syscall::{CommandOutput, Syscall};

use std::{
    collections::{BTreeMap, HashMap},
    ffi::{OsStr, OsString},
    fs::create_dir_all,
    path::{Path, PathBuf},
    sync::Mutex,
};

/// Scripted Git that keeps remote tables in memory.
///
/// Only understands the handful of Git invocations grove issues. A clone
/// creates `<dir>/.git/hooks` on disk so hook installation has somewhere to
/// write. Like Git, a directory without a repository of its own resolves to
/// the closest seeded ancestor. Any command line starting with a prefix
/// registered through [`FakeGit::fail_on`] fails without side effects, and
/// one registered through [`FakeGit::reply_on`] succeeds with canned output.
#[derive(Debug, Default)]
pub(crate) struct FakeGit {
    repos: Mutex<HashMap<PathBuf, BTreeMap<String, String>>>,
    calls: Mutex<Vec<(PathBuf, String)>>,
    failing: Mutex<Vec<String>>,
    replies: Mutex<Vec<(String, String)>>,
}

impl FakeGit {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn seed<'a>(
        &self,
        dir: impl AsRef<Path>,
        remotes: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) {
        let remotes = remotes
            .into_iter()
            .map(|(name, url)| (name.to_string(), url.to_string()))
            .collect();
        self.repos
            .lock()
            .unwrap()
            .insert(dir.as_ref().to_path_buf(), remotes);
    }

    pub(crate) fn fail_on(&self, prefix: impl Into<String>) {
        self.failing.lock().unwrap().push(prefix.into());
    }

    /// Stop failing any command registered through [`FakeGit::fail_on`].
    pub(crate) fn recover(&self) {
        self.failing.lock().unwrap().clear();
    }

    pub(crate) fn reply_on(&self, prefix: impl Into<String>, output: impl Into<String>) {
        self.replies
            .lock()
            .unwrap()
            .push((prefix.into(), output.into()));
    }

    pub(crate) fn remotes(&self, dir: impl AsRef<Path>) -> Option<BTreeMap<String, String>> {
        self.repos.lock().unwrap().get(dir.as_ref()).cloned()
    }

    pub(crate) fn calls_in(&self, dir: impl AsRef<Path>) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(cwd, _)| cwd == dir.as_ref())
            .map(|(_, line)| line.clone())
            .collect()
    }

    fn git(&self, cwd: &Path, args: &[String]) -> CommandOutput {
        let mut repos = self.repos.lock().unwrap();
        let args = args.iter().map(String::as_str).collect::<Vec<_>>();

        if let ["clone", url, dir] = args.as_slice() {
            let target = cwd.join(dir);
            if repos.contains_key(&target) {
                return CommandOutput::failed(format!(
                    "fatal: destination path '{dir}' already exists and is not an empty directory."
                ));
            }
            if let Err(error) = create_dir_all(target.join(".git").join("hooks")) {
                return CommandOutput::failed(error.to_string());
            }
            repos.insert(
                target,
                BTreeMap::from([("origin".to_string(), url.to_string())]),
            );
            return CommandOutput::ok(format!("Cloning into '{dir}'..."));
        }

        let Some(toplevel) = cwd
            .ancestors()
            .find(|dir| repos.contains_key(*dir))
            .map(Path::to_path_buf)
        else {
            return CommandOutput::failed(
                "fatal: not a git repository (or any of the parent directories): .git",
            );
        };
        let Some(remotes) = repos.get_mut(&toplevel) else {
            return CommandOutput::failed("fatal: repository vanished");
        };

        match args.as_slice() {
            ["rev-parse", "--show-toplevel"] => {
                CommandOutput::ok(toplevel.to_string_lossy().into_owned())
            }
            ["fetch"] | ["status", ..] => CommandOutput::ok(""),
            ["pull"] => CommandOutput::ok("Already up to date."),
            ["remote", "-v"] => CommandOutput::ok(
                remotes
                    .iter()
                    .flat_map(|(name, url)| {
                        [
                            format!("{name}\t{url} (fetch)"),
                            format!("{name}\t{url} (push)"),
                        ]
                    })
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            ["remote", "add", name, url] => {
                if remotes.contains_key(*name) {
                    return CommandOutput::failed(format!("error: remote {name} already exists."));
                }
                remotes.insert(name.to_string(), url.to_string());
                CommandOutput::ok("")
            }
            ["remote", "set-url", name, url] => match remotes.get_mut(*name) {
                Some(current) => {
                    *current = url.to_string();
                    CommandOutput::ok("")
                }
                None => CommandOutput::failed(format!("error: No such remote '{name}'")),
            },
            ["remote", "remove", name] => match remotes.remove(*name) {
                Some(_) => CommandOutput::ok(""),
                None => CommandOutput::failed(format!("error: No such remote: '{name}'")),
            },
            _ => CommandOutput::failed(format!("fake git does not understand {args:?}")),
        }
    }
}

impl Syscall for FakeGit {
    fn call(&self, cwd: &Path, program: &OsStr, args: &[OsString]) -> CommandOutput {
        let program = program.to_string_lossy().into_owned();
        let args = args
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect::<Vec<_>>();
        let line = std::iter::once(program.clone())
            .chain(args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ");
        self.calls
            .lock()
            .unwrap()
            .push((cwd.to_path_buf(), line.clone()));

        if self
            .failing
            .lock()
            .unwrap()
            .iter()
            .any(|prefix| line.starts_with(prefix.as_str()))
        {
            return CommandOutput::failed(format!("simulated failure: {line}"));
        }

        if let Some((_, output)) = self
            .replies
            .lock()
            .unwrap()
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
        {
            return CommandOutput::ok(output.clone());
        }

        match program.as_str() {
            "git" => self.git(cwd, &args),
            _ => CommandOutput::ok(args.join(" ")),
        }
    }
}
