// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Fleet orchestration.
//!
//! A [`Fleet`] drives one operation over every repository of a project.
//! Operations that only touch one checkout at a time (sync, hook
//! installation, ad-hoc commands) fan out over a bounded pool of blocking
//! workers. Operations that need ordered answers from the user (analysis,
//! pruning, reconfigure, revert, status) run sequentially.
//!
//! No repository ever aborts the batch. Each one ends up as a [`Report`] in
//! the returned [`Summary`], and its rendered block is written to the
//! [`Console`] as soon as it is done.

use crate::{
    config::{FleetSpec, RepoEntry},
    console::{Console, PromptError, Prompter, Render, Report, Summary},
    git::Git,
    hook::{HookLinker, HookOutcome},
    reconcile::{RemoteReconciler, RemoteState},
    remote::{RemoteError, RemoteSet},
    scan::{actual_dirs, Drift, FleetScanner, PruneOutcome, ScanError},
    sync::{RepoSync, SyncMode},
    syscall::{Syscall, SystemCall},
};

use futures::stream::{self, StreamExt};
use std::{
    ffi::OsString,
    num::NonZeroUsize,
    path::PathBuf,
    sync::Arc,
    thread::available_parallelism,
};
use tracing::{debug, info, instrument, warn};

/// Default size of the worker pool.
///
/// One less than the available parallelism, but at least one.
pub fn default_workers() -> usize {
    available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
        .saturating_sub(1)
        .max(1)
}

/// How reconfigure treats its candidates once listed.
pub enum Review<'a> {
    /// Rewrite every candidate.
    Apply,

    /// Only list candidates.
    DryRun,

    /// Ask before rewriting each candidate.
    Interactive(&'a mut dyn Prompter),
}

/// Orchestrator of one project.
#[derive(Debug)]
pub struct Fleet<S = SystemCall>
where
    S: Syscall,
{
    spec: Arc<FleetSpec>,
    syscall: Arc<S>,
    git: Git<S>,
    remotes: RemoteSet<S>,
    console: Console,
    workers: usize,
}

impl<S> Fleet<S>
where
    S: Syscall,
{
    /// Construct new orchestrator for `spec`.
    pub fn new(spec: FleetSpec, syscall: S, console: Console) -> Self {
        Self::with_shared(spec, Arc::new(syscall), console)
    }

    pub fn with_shared(spec: FleetSpec, syscall: Arc<S>, console: Console) -> Self {
        let git = Git::with_shared(Arc::clone(&syscall));
        Self {
            spec: Arc::new(spec),
            remotes: RemoteSet::new(git.clone()),
            syscall,
            git,
            console,
            workers: default_workers(),
        }
    }

    /// Use worker pool of different size.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Clone missing repositories, fetch or pull existing ones.
    pub async fn sync(&self, mode: SyncMode) -> Summary {
        let sync = RepoSync::new(
            self.git.clone(),
            self.linker(),
            self.spec.substitutions.clone(),
            mode,
        );
        let jobs: Vec<(PathBuf, RepoEntry)> = self
            .spec
            .repos
            .values()
            .map(|entry| (self.spec.repo_dir(&entry.name), entry.clone()))
            .collect();

        self.fan_out(mode.as_str(), jobs, move |dir, entry| sync.process(&dir, &entry))
            .await
    }

    /// Install shared hooks into every existing declared checkout.
    pub async fn install_hooks(&self) -> Summary {
        let linker = self.linker();
        self.fan_out("hooks", self.present(), move |dir, entry| {
            let report = Report::new(&entry.name, "hooks");
            match linker.install_hooks(&dir, &entry) {
                Ok(actions) => {
                    let outcome = HookOutcome {
                        actions,
                        init: Vec::new(),
                    };
                    report.succeeded(outcome.lines())
                }
                Err(error) => report.failed([error.to_string()]),
            }
        })
        .await
    }

    /// Run `argv` inside every existing declared checkout.
    ///
    /// # Errors
    ///
    /// - Return [`FleetError::EmptyCommand`] if `argv` is empty.
    pub async fn run_command(&self, argv: Vec<String>) -> Result<Summary> {
        let Some((program, args)) = argv.split_first() else {
            return Err(FleetError::EmptyCommand);
        };

        let command = argv.join(" ");
        let program = OsString::from(program);
        let args = args.iter().map(OsString::from).collect::<Vec<_>>();
        let syscall = Arc::clone(&self.syscall);
        let summary = self
            .fan_out("run", self.present(), move |dir, entry| {
                let output = syscall.call(&dir, &program, &args);
                let report = Report::new(&entry.name, command.as_str());
                if output.success {
                    report.succeeded(output.lines())
                } else {
                    report.failed(output.lines())
                }
            })
            .await;

        Ok(summary)
    }

    /// Compare declared repositories against the workspace.
    ///
    /// # Errors
    ///
    /// - Return [`FleetError::Scan`] if the workspace cannot be listed.
    pub fn analyze(&self) -> Result<Drift> {
        let drift = FleetScanner::new(&self.remotes).analyze(
            &self.spec.workspace,
            &self.spec.declared(),
            &self.spec.ignore,
        )?;
        self.console.emit(drift.to_string());

        Ok(drift)
    }

    /// Interactively delete undeclared directories found by [`analyze`].
    ///
    /// [`analyze`]: Fleet::analyze
    ///
    /// # Errors
    ///
    /// - Return [`FleetError::Scan`] if prompting or deletion fails.
    pub fn prune(&self, drift: &Drift, prompter: &mut dyn Prompter) -> Result<PruneOutcome> {
        Ok(FleetScanner::new(&self.remotes).prune(&self.spec.workspace, drift, prompter)?)
    }

    /// Rewrite `origin` of every present declared checkout that disagrees
    /// with its substituted declared URL.
    ///
    /// Candidates are listed before anything is mutated.
    ///
    /// # Errors
    ///
    /// - Return [`FleetError::Scan`] if the workspace cannot be listed.
    /// - Return [`FleetError::Prompt`] if an interactive review fails.
    #[instrument(skip(self, review), level = "debug")]
    pub fn reconfigure(&self, review: Review<'_>) -> Result<Summary> {
        let reconciler = RemoteReconciler::new(&self.git, &self.remotes);
        let actual = actual_dirs(&self.spec.workspace, &self.spec.ignore)?;

        let mut reports = Vec::new();
        let mut candidates = Vec::new();
        for entry in self.spec.repos.values().filter(|entry| actual.contains(&entry.name)) {
            let dir = self.spec.repo_dir(&entry.name);
            let target = self.spec.target_url(entry);
            match reconciler.needs_reconfigure(&dir, &target) {
                Ok(Some(current)) => candidates.push((entry.name.clone(), dir, current, target)),
                Ok(None) => debug!("{} already points at {target}", entry.name),
                Err(error) => {
                    let report =
                        Report::new(&entry.name, "reconfigure").failed([error.to_string()]);
                    self.console.report(&report);
                    reports.push(report);
                }
            }
        }

        self.list_candidates(
            "reconfigure",
            candidates.iter().map(|(name, _, current, target)| {
                (name.as_str(), current.as_str(), target.as_str())
            }),
        );

        let mut prompter = match review {
            Review::DryRun => return Ok(Summary::new(reports)),
            Review::Apply => None,
            Review::Interactive(prompter) => Some(prompter),
        };

        for (name, dir, current, target) in candidates {
            let report = Report::new(&name, "reconfigure");
            if let Some(prompter) = prompter.as_mut() {
                if !prompter.confirm(&format!("Reconfigure {name}: {current} -> {target}?"))? {
                    debug!("skip reconfigure of {name}");
                    continue;
                }
            }

            let report = match reconciler.reconfigure(&dir, &target) {
                Ok(transition) => report.succeeded([transition.to_string()]),
                Err(error) => report.failed([error.to_string()]),
            };
            self.console.report(&report);
            reports.push(report);
        }

        Ok(Summary::new(reports))
    }

    /// Restore `origin` from `old` in every present checkout carrying an
    /// `old` remote, declared or not.
    ///
    /// Directories that are not checkouts of their own are skipped. A
    /// checkout whose remotes cannot be parsed fails, even on a dry run.
    ///
    /// # Errors
    ///
    /// - Return [`FleetError::Scan`] if the workspace cannot be listed.
    #[instrument(skip(self), level = "debug")]
    pub fn revert(&self, dry_run: bool) -> Result<Summary> {
        let reconciler = RemoteReconciler::new(&self.git, &self.remotes);
        let actual = actual_dirs(&self.spec.workspace, &self.spec.ignore)?;

        let mut reports = Vec::new();
        let mut candidates = Vec::new();
        for name in actual {
            let dir = self.spec.workspace.join(&name);
            let table = match self.remotes.read(&dir) {
                Ok(table) => table,
                Err(error @ RemoteError::Malformed { .. }) => {
                    let report = Report::new(&name, "revert").failed([error.to_string()]);
                    self.console.report(&report);
                    reports.push(report);
                    continue;
                }
                Err(error) => {
                    debug!("skip {name}: {error}");
                    continue;
                }
            };

            if let RemoteState::Rewritten { preimage } = RemoteState::from(&table) {
                let current = table.origin().unwrap_or("<none>").to_string();
                candidates.push((name, dir, current, preimage));
            }
        }

        self.list_candidates(
            "revert",
            candidates.iter().map(|(name, _, current, preimage)| {
                (name.as_str(), current.as_str(), preimage.as_str())
            }),
        );
        if dry_run {
            return Ok(Summary::new(reports));
        }

        for (name, dir, _, _) in candidates {
            let report = Report::new(&name, "revert");
            let report = match reconciler.revert(&dir) {
                Ok(transition) => report.succeeded([transition.to_string()]),
                Err(error) => report.failed([error.to_string()]),
            };
            self.console.report(&report);
            reports.push(report);
        }

        Ok(Summary::new(reports))
    }

    /// Show short status of every declared checkout.
    pub fn status(&self) -> Result<Summary> {
        let render = Render {
            verbose: true,
            ..*self.console.render()
        };

        let mut reports = Vec::new();
        for entry in self.spec.repos.values() {
            let dir = self.spec.repo_dir(&entry.name);
            let report = Report::new(&entry.name, "status");
            let report = if !dir.exists() {
                report.failed(["missing"])
            } else {
                let output = self.git.status(&dir);
                if output.success {
                    report.succeeded(output.lines())
                } else {
                    report.failed(output.lines())
                }
            };
            self.console.emit(report.render(&render));
            reports.push(report);
        }

        Ok(Summary::new(reports))
    }

    fn linker(&self) -> HookLinker<S> {
        HookLinker::new(&self.spec.hooks_dir, Arc::clone(&self.syscall))
    }

    /// Declared repositories whose directory exists.
    fn present(&self) -> Vec<(PathBuf, RepoEntry)> {
        self.spec
            .repos
            .values()
            .map(|entry| (self.spec.repo_dir(&entry.name), entry.clone()))
            .filter(|(dir, entry)| {
                let exists = dir.exists();
                if !exists {
                    debug!("skip missing repository {}", entry.name);
                }
                exists
            })
            .collect()
    }

    fn list_candidates<'c>(
        &self,
        operation: &str,
        candidates: impl ExactSizeIterator<Item = (&'c str, &'c str, &'c str)>,
    ) {
        if candidates.len() == 0 {
            self.console.emit(format!("Nothing to {operation}\n"));
            return;
        }

        let mut block = format!("Will {operation} {} repositories:\n", candidates.len());
        for (name, from, to) in candidates {
            block.push_str(&format!("  {name}: {from} -> {to}\n"));
        }
        self.console.emit(block);
    }

    /// Run `job` over every repository of `jobs` on the worker pool.
    ///
    /// A panicking job becomes a failed report of its repository, the rest
    /// of the batch keeps going.
    async fn fan_out<F>(&self, label: &str, jobs: Vec<(PathBuf, RepoEntry)>, job: F) -> Summary
    where
        F: Fn(PathBuf, RepoEntry) -> Report + Send + Sync + 'static,
    {
        info!(
            "{label} {} repositories of {:?} with {} workers",
            jobs.len(),
            self.spec.name,
            self.workers
        );

        let bar = self.console.progress(jobs.len(), label);
        let job = Arc::new(job);
        let mut results = stream::iter(jobs)
            .map(|(dir, entry)| {
                let job = Arc::clone(&job);
                let fallback = Report::new(&entry.name, label);
                async move {
                    match tokio::task::spawn_blocking(move || (*job)(dir, entry)).await {
                        Ok(report) => report,
                        Err(error) => {
                            warn!("worker of {} failed: {error}", fallback.name);
                            fallback.failed([format!("worker failed: {error}")])
                        }
                    }
                }
            })
            .buffer_unordered(self.workers);

        let mut reports = Vec::new();
        while let Some(report) = results.next().await {
            bar.suspend(|| self.console.report(&report));
            bar.inc(1);
            reports.push(report);
        }
        bar.finish_and_clear();

        Summary::new(reports)
    }
}

/// Fleet orchestration error types.
#[derive(Debug, thiserror::Error)]
pub enum FleetError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Prompt(#[from] PromptError),

    /// Ad-hoc command has no program.
    #[error("no command given")]
    EmptyCommand,
}

/// Friendly result alias :3
pub type Result<T, E = FleetError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        console::tests::{Buffer, Scripted},
        substitute::{Substitution, Substitutions},
        syscall::CommandOutput,
        testing::FakeGit,
    };
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;
    use std::{
        collections::{BTreeMap, BTreeSet},
        ffi::{OsStr, OsString},
        fs::create_dir_all,
        path::Path,
        sync::atomic::{AtomicUsize, Ordering},
        thread::sleep,
        time::Duration,
    };

    /// Tracks how many calls run at the same time.
    #[derive(Debug, Default)]
    struct Gauge {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl Syscall for Gauge {
        fn call(&self, cwd: &Path, _: &OsStr, _: &[OsString]) -> CommandOutput {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            sleep(Duration::from_millis(50));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let name = cwd.file_name().unwrap_or_default().to_string_lossy();
            CommandOutput::ok(format!("{name} one\n{name} two"))
        }
    }

    /// Panics inside any directory named "boom".
    #[derive(Debug, Default)]
    struct Panicky;

    impl Syscall for Panicky {
        fn call(&self, cwd: &Path, program: &OsStr, _: &[OsString]) -> CommandOutput {
            if cwd.ends_with("boom") {
                panic!("{} blew up", program.to_string_lossy());
            }
            CommandOutput::ok("fine")
        }
    }

    fn spec(workspace: &Path, repos: &[(&str, &str)]) -> FleetSpec {
        FleetSpec {
            name: "work".into(),
            workspace: workspace.to_path_buf(),
            repos: repos
                .iter()
                .map(|(name, url)| (name.to_string(), RepoEntry::new(*name, *url)))
                .collect(),
            substitutions: Substitutions::new([Substitution::new("github.com", "gh-work")]),
            ignore: BTreeSet::from(["scratch".to_string()]),
            hooks_dir: workspace.join(".hooks"),
        }
    }

    fn fleet(spec: FleetSpec, fake: &Arc<FakeGit>) -> (Fleet<FakeGit>, Buffer) {
        let buffer = Buffer::default();
        let console = Console::with_writer(Render::default(), buffer.clone());
        let fleet = Fleet::with_shared(spec, Arc::clone(fake), console).with_workers(2);
        (fleet, buffer)
    }

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap()
            .block_on(future)
    }

    #[test]
    fn default_workers_is_at_least_one() {
        assert!(default_workers() >= 1);
    }

    #[sealed_test]
    fn sync_isolates_partial_failure() -> anyhow::Result<()> {
        let workspace = std::env::current_dir()?.join("work");
        let fake = Arc::new(FakeGit::new());
        fake.fail_on("git clone git@gh-work:org/b.git");
        let (fleet, buffer) = fleet(
            spec(
                &workspace,
                &[
                    ("a", "git@github.com:org/a.git"),
                    ("b", "git@github.com:org/b.git"),
                    ("c", "git@github.com:org/c.git"),
                ],
            ),
            &fake,
        );

        let summary = block_on(fleet.sync(SyncMode::Fetch));

        assert_eq!(
            summary
                .reports
                .iter()
                .map(|report| (report.name.as_str(), report.success))
                .collect::<Vec<_>>(),
            vec![("a", true), ("b", false), ("c", true)]
        );
        assert!(workspace.join("a").is_dir());
        assert!(workspace.join("c").is_dir());

        let output = buffer.contents();
        assert!(output.contains("a: clone git@gh-work:org/a.git OK\n"));
        assert!(output.contains("b: clone git@gh-work:org/b.git Error\n  simulated failure"));

        Ok(())
    }

    #[sealed_test]
    fn sync_twice_fetches_second_time() -> anyhow::Result<()> {
        let workspace = std::env::current_dir()?.join("work");
        let fake = Arc::new(FakeGit::new());
        let (fleet, _) = fleet(spec(&workspace, &[("a", "git@github.com:org/a.git")]), &fake);

        let first = block_on(fleet.sync(SyncMode::Fetch));
        let second = block_on(fleet.sync(SyncMode::Fetch));

        assert!(first.is_success() && second.is_success());
        assert_eq!(second.reports[0].command, "fetch");

        Ok(())
    }

    #[sealed_test]
    fn run_command_targets_present_repositories() -> anyhow::Result<()> {
        let workspace = std::env::current_dir()?;
        create_dir_all(workspace.join("a"))?;
        let fake = Arc::new(FakeGit::new());
        let (fleet, _) = fleet(spec(&workspace, &[("a", "ua"), ("b", "ub")]), &fake);

        let summary = block_on(fleet.run_command(vec!["make".into(), "lint".into()]))?;

        assert_eq!(summary.reports.len(), 1);
        assert_eq!(summary.reports[0].command, "make lint");
        assert_eq!(fake.calls_in(workspace.join("a")), vec!["make lint".to_string()]);
        assert!(matches!(
            block_on(fleet.run_command(Vec::new())),
            Err(FleetError::EmptyCommand)
        ));

        Ok(())
    }

    #[sealed_test]
    fn worker_pool_is_bounded_and_blocks_stay_whole() -> anyhow::Result<()> {
        let workspace = std::env::current_dir()?;
        let names = ["a", "b", "c", "d", "e", "f"];
        for name in names {
            create_dir_all(workspace.join(name))?;
        }
        let gauge = Arc::new(Gauge::default());
        let buffer = Buffer::default();
        let console = Console::with_writer(Render::new(false, true), buffer.clone());
        let repos = names.map(|name| (name, name));
        let fleet = Fleet::with_shared(spec(&workspace, &repos), Arc::clone(&gauge), console)
            .with_workers(2);

        let summary = block_on(fleet.run_command(vec!["check".into()]))?;

        assert!(summary.is_success(), "{summary}");
        assert_eq!(summary.reports.len(), names.len());
        let peak = gauge.peak.load(Ordering::SeqCst);
        assert!(peak >= 1 && peak <= fleet.workers(), "peak of {peak} workers");

        let output = buffer.contents();
        let mut written = 0;
        for name in names {
            let block = format!("{name}: check OK\n  {name} one\n  {name} two\n");
            assert!(output.contains(&block), "{block:?} torn in {output:?}");
            written += block.len();
        }
        assert_eq!(output.len(), written);

        Ok(())
    }

    #[sealed_test]
    fn panicking_worker_fails_only_its_repository() -> anyhow::Result<()> {
        let workspace = std::env::current_dir()?;
        for name in ["a", "boom", "c"] {
            create_dir_all(workspace.join(name))?;
        }
        let buffer = Buffer::default();
        let console = Console::with_writer(Render::default(), buffer.clone());
        let fleet = Fleet::new(
            spec(&workspace, &[("a", "ua"), ("boom", "ub"), ("c", "uc")]),
            Panicky,
            console,
        )
        .with_workers(2);

        let summary = block_on(fleet.run_command(vec!["make".into()]))?;

        assert_eq!(summary.reports.len(), 3);
        assert!(summary.get("a").is_some_and(|report| report.success));
        assert!(summary.get("c").is_some_and(|report| report.success));
        let boom = summary.get("boom").expect("report of panicking repository");
        assert!(!boom.success);
        assert_eq!(boom.command, "run");
        assert!(boom.lines[0].starts_with("worker failed"), "{:?}", boom.lines);
        assert!(buffer.contents().contains("boom: run Error\n  worker failed"));

        Ok(())
    }

    #[sealed_test]
    fn install_hooks_skips_missing_repositories() -> anyhow::Result<()> {
        let workspace = std::env::current_dir()?;
        create_dir_all(workspace.join(".hooks"))?;
        std::fs::write(workspace.join(".hooks/commit-msg"), "#!/bin/sh\n")?;
        create_dir_all(workspace.join("a/.git/hooks"))?;
        let fake = Arc::new(FakeGit::new());
        let (fleet, _) = fleet(spec(&workspace, &[("a", "ua"), ("b", "ub")]), &fake);

        let summary = block_on(fleet.install_hooks());

        assert_eq!(summary.reports.len(), 1);
        assert_eq!(summary.reports[0].lines, vec!["hook commit-msg linked".to_string()]);
        assert!(std::fs::symlink_metadata(workspace.join("a/.git/hooks/commit-msg"))?
            .file_type()
            .is_symlink());

        let again = block_on(fleet.install_hooks());
        assert!(again.is_success());
        assert!(again.reports[0].lines.is_empty());

        Ok(())
    }

    #[sealed_test]
    fn analyze_emits_drift() -> anyhow::Result<()> {
        let workspace = std::env::current_dir()?;
        create_dir_all(workspace.join("a"))?;
        create_dir_all(workspace.join("c"))?;
        let fake = Arc::new(FakeGit::new());
        let (fleet, buffer) = fleet(spec(&workspace, &[("a", "ua"), ("b", "ub")]), &fake);

        let drift = fleet.analyze()?;

        assert_eq!(drift.missing, BTreeSet::from(["b".to_string()]));
        assert_eq!(drift.undeclared.keys().collect::<Vec<_>>(), vec!["c"]);
        assert_eq!(
            buffer.contents(),
            indoc::indoc! {"
                Missing:
                  b
                Undeclared:
                  c: Not a git repo
            "}
        );

        Ok(())
    }

    #[sealed_test]
    fn reconfigure_only_touches_disagreeing_declared_repositories() -> anyhow::Result<()> {
        let workspace = std::env::current_dir()?;
        for name in ["settled", "stale", "stray"] {
            create_dir_all(workspace.join(name))?;
        }
        let fake = Arc::new(FakeGit::new());
        fake.seed(workspace.join("settled"), [("origin", "git@gh-work:org/settled.git")]);
        fake.seed(workspace.join("stale"), [("origin", "https://github.com/org/stale.git")]);
        fake.seed(workspace.join("stray"), [("origin", "https://elsewhere/stray.git")]);
        let (fleet, buffer) = fleet(
            spec(
                &workspace,
                &[
                    ("settled", "git@github.com:org/settled.git"),
                    ("stale", "git@github.com:org/stale.git"),
                    ("absent", "git@github.com:org/absent.git"),
                ],
            ),
            &fake,
        );

        let summary = fleet.reconfigure(Review::Apply)?;

        assert_eq!(summary.reports.len(), 1);
        assert!(summary.reports[0].success);
        assert_eq!(
            fake.remotes(workspace.join("stale")),
            Some(BTreeMap::from([
                ("old".to_string(), "https://github.com/org/stale.git".to_string()),
                ("origin".to_string(), "git@gh-work:org/stale.git".to_string()),
            ]))
        );
        assert_eq!(
            fake.remotes(workspace.join("settled")),
            Some(BTreeMap::from([(
                "origin".to_string(),
                "git@gh-work:org/settled.git".to_string()
            )]))
        );
        assert!(buffer.contents().starts_with(indoc::indoc! {"
            Will reconfigure 1 repositories:
              stale: https://github.com/org/stale.git -> git@gh-work:org/stale.git
        "}));

        Ok(())
    }

    #[sealed_test]
    fn reconfigure_dry_run_and_interactive_review() -> anyhow::Result<()> {
        let workspace = std::env::current_dir()?;
        create_dir_all(workspace.join("a"))?;
        create_dir_all(workspace.join("b"))?;
        let fake = Arc::new(FakeGit::new());
        fake.seed(workspace.join("a"), [("origin", "old-a")]);
        fake.seed(workspace.join("b"), [("origin", "old-b")]);
        let (fleet, _) = fleet(spec(&workspace, &[("a", "new-a"), ("b", "new-b")]), &fake);

        let dry = fleet.reconfigure(Review::DryRun)?;
        assert!(dry.reports.is_empty());
        assert_eq!(fake.remotes(workspace.join("a")).map(|r| r.len()), Some(1));

        let mut prompter = Scripted {
            confirms: vec![false, true],
            ..Default::default()
        };
        let summary = fleet.reconfigure(Review::Interactive(&mut prompter))?;

        assert_eq!(summary.reports.len(), 1);
        assert_eq!(summary.reports[0].name, "b");
        assert_eq!(
            fake.remotes(workspace.join("a")),
            Some(BTreeMap::from([("origin".to_string(), "old-a".to_string())]))
        );
        assert_eq!(
            fake.remotes(workspace.join("b")).and_then(|r| r.get("origin").cloned()),
            Some("new-b".to_string())
        );

        Ok(())
    }

    #[sealed_test]
    fn revert_targets_every_rewritten_directory() -> anyhow::Result<()> {
        let workspace = std::env::current_dir()?;
        for name in ["declared", "stray", "settled", "photos"] {
            create_dir_all(workspace.join(name))?;
        }
        let fake = Arc::new(FakeGit::new());
        fake.seed(workspace.join("declared"), [("origin", "u2"), ("old", "u1")]);
        fake.seed(workspace.join("stray"), [("origin", "s2"), ("old", "s1")]);
        fake.seed(workspace.join("settled"), [("origin", "t1")]);
        let (fleet, _) = fleet(spec(&workspace, &[("declared", "u2")]), &fake);

        let summary = fleet.revert(false)?;

        assert_eq!(
            summary
                .reports
                .iter()
                .map(|report| (report.name.as_str(), report.success))
                .collect::<Vec<_>>(),
            vec![("declared", true), ("stray", true)]
        );
        assert_eq!(
            fake.remotes(workspace.join("declared")),
            Some(BTreeMap::from([("origin".to_string(), "u1".to_string())]))
        );
        assert_eq!(
            fake.remotes(workspace.join("stray")),
            Some(BTreeMap::from([("origin".to_string(), "s1".to_string())]))
        );

        Ok(())
    }

    #[sealed_test]
    fn revert_restores_url_with_spaces() -> anyhow::Result<()> {
        let workspace = std::env::current_dir()?;
        create_dir_all(workspace.join("api"))?;
        let fake = Arc::new(FakeGit::new());
        fake.seed(workspace.join("api"), [("origin", "u2"), ("old", "/srv/My Repos/api")]);
        let (fleet, _) = fleet(spec(&workspace, &[("api", "u2")]), &fake);

        let summary = fleet.revert(false)?;

        assert!(summary.is_success(), "{summary}");
        assert_eq!(summary.reports.len(), 1);
        assert_eq!(
            fake.remotes(workspace.join("api")),
            Some(BTreeMap::from([("origin".to_string(), "/srv/My Repos/api".to_string())]))
        );

        Ok(())
    }

    #[sealed_test]
    fn revert_fails_checkout_with_unparsable_remotes() -> anyhow::Result<()> {
        let workspace = std::env::current_dir()?;
        create_dir_all(workspace.join("broken"))?;
        let fake = Arc::new(FakeGit::new());
        fake.seed(workspace.join("broken"), [("origin", "u2"), ("old", "u1")]);
        fake.reply_on("git remote -v", "garbage");
        let (fleet, buffer) = fleet(spec(&workspace, &[]), &fake);

        for dry_run in [true, false] {
            let summary = fleet.revert(dry_run)?;
            assert!(!summary.is_success());
            assert_eq!(summary.reports.len(), 1);
            assert_eq!(summary.reports[0].name, "broken");
            assert_eq!(summary.reports[0].command, "revert");
        }
        assert!(buffer.contents().contains("broken: revert Error\n"));
        assert_eq!(fake.remotes(workspace.join("broken")).map(|r| r.len()), Some(2));

        Ok(())
    }

    #[sealed_test]
    fn revert_leaves_enclosing_repository_alone() -> anyhow::Result<()> {
        let workspace = std::env::current_dir()?;
        create_dir_all(workspace.join("photos"))?;
        create_dir_all(workspace.join("api"))?;
        let fake = Arc::new(FakeGit::new());
        fake.seed(&workspace, [("origin", "dotfiles-new"), ("old", "dotfiles-old")]);
        fake.seed(workspace.join("api"), [("origin", "ua")]);
        let (fleet, buffer) = fleet(spec(&workspace, &[("api", "ua")]), &fake);

        let summary = fleet.revert(false)?;

        assert!(summary.reports.is_empty(), "{summary}");
        assert_eq!(buffer.contents(), "Nothing to revert\n");
        assert_eq!(
            fake.remotes(&workspace),
            Some(BTreeMap::from([
                ("old".to_string(), "dotfiles-old".to_string()),
                ("origin".to_string(), "dotfiles-new".to_string()),
            ]))
        );

        Ok(())
    }

    #[sealed_test]
    fn substituted_clone_is_settled() -> anyhow::Result<()> {
        let workspace = std::env::current_dir()?.join("work");
        let fake = Arc::new(FakeGit::new());
        let (fleet, buffer) = fleet(spec(&workspace, &[("a", "git@github.com:org/a.git")]), &fake);

        block_on(fleet.sync(SyncMode::Fetch));
        let summary = fleet.reconfigure(Review::Apply)?;

        assert!(summary.reports.is_empty());
        assert!(buffer.contents().contains("Nothing to reconfigure\n"));

        Ok(())
    }

    #[sealed_test]
    fn status_reports_missing_repositories() -> anyhow::Result<()> {
        let workspace = std::env::current_dir()?;
        create_dir_all(workspace.join("a"))?;
        let fake = Arc::new(FakeGit::new());
        fake.seed(workspace.join("a"), [("origin", "ua")]);
        let (fleet, buffer) = fleet(spec(&workspace, &[("a", "ua"), ("b", "ub")]), &fake);

        let summary = fleet.status()?;

        assert!(summary.get("a").is_some_and(|report| report.success));
        assert!(summary.get("b").is_some_and(|report| !report.success));
        assert!(buffer.contents().contains("b: status Error\n  missing\n"));

        Ok(())
    }
}
