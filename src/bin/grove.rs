// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use grove::{
    config::{Config, FleetSpec},
    console::{Console, InquirePrompter},
    fleet::{Fleet, Review},
    path::default_config_path,
    sync::SyncMode,
    syscall::SystemCall,
    Summary,
};

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::{path::PathBuf, process::exit};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "grove [options] <grove-command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    /// Path to fleet configuration file.
    #[arg(short, long, global = true, env = "GROVE_CONFIG", value_name = "path")]
    pub config: Option<PathBuf>,

    /// Only operate on these projects, every project by default.
    #[arg(short = 'p', long = "project", global = true, value_name = "name")]
    pub projects: Vec<String>,

    /// Show command output of successful repositories too.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Never colour output.
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Run selected command over every selected project.
    ///
    /// Returns false if any repository failed.
    async fn run(self) -> Result<bool> {
        let path = match self.config {
            Some(path) => path,
            None => default_config_path()?,
        };
        let config = Config::load(&path)?;
        let specs = config.select(&self.projects)?;

        let console = Console::stdout(!self.no_color, self.verbose);
        let mut healthy = true;
        for spec in specs {
            console.emit(format!("{}\n", console.render().yellow(format!("[{}]", spec.name))));
            let Some(summary) = self.command.run(spec, &console).await? else {
                continue;
            };

            info!("{}: {summary}", spec.name);
            healthy &= summary.is_success();
        }

        Ok(healthy)
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Clone missing repositories, and fetch or pull existing ones.
    #[command(override_usage = "grove sync [options]")]
    Sync(SyncOptions),

    /// Compare declared repositories against workspace contents.
    #[command(override_usage = "grove analyze [options]")]
    Analyze(AnalyzeOptions),

    /// Point origin of checkouts at their declared URL.
    #[command(override_usage = "grove reconfigure [options]")]
    Reconfigure(ReconfigureOptions),

    /// Restore origin of checkouts from their previous URL.
    #[command(override_usage = "grove revert [options]")]
    Revert(RevertOptions),

    /// Show short status of every declared repository.
    #[command(override_usage = "grove status [options]")]
    Status,

    /// Install shared hooks into existing checkouts.
    #[command(override_usage = "grove hooks [options]")]
    Hooks,

    /// Run command inside every existing checkout.
    #[command(override_usage = "grove run [options] -- <command>...")]
    Run(RunOptions),
}

impl Command {
    async fn run(&self, spec: &FleetSpec, console: &Console) -> Result<Option<Summary>> {
        let fleet = Fleet::new(spec.clone(), SystemCall, console.clone());
        let summary = match self {
            Self::Sync(opts) => {
                let mode = if opts.pull {
                    SyncMode::Pull
                } else {
                    SyncMode::Fetch
                };
                fleet.sync(mode).await
            }
            Self::Analyze(opts) => {
                let drift = fleet.analyze()?;
                if opts.delete && !drift.undeclared.is_empty() {
                    let outcome = fleet.prune(&drift, &mut InquirePrompter)?;
                    info!(
                        "deleted {}, skipped {}{}",
                        outcome.deleted.len(),
                        outcome.skipped.len(),
                        if outcome.aborted { ", aborted" } else { "" }
                    );
                }

                return Ok(None);
            }
            Self::Reconfigure(opts) => {
                let mut prompter = InquirePrompter;
                let review = if opts.dry_run {
                    Review::DryRun
                } else if opts.interactive {
                    Review::Interactive(&mut prompter)
                } else {
                    Review::Apply
                };
                fleet.reconfigure(review)?
            }
            Self::Revert(opts) => fleet.revert(opts.dry_run)?,
            Self::Status => fleet.status()?,
            Self::Hooks => fleet.install_hooks().await,
            Self::Run(opts) => fleet.run_command(opts.command.clone()).await?,
        };

        Ok(Some(summary))
    }
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct SyncOptions {
    /// Pull existing checkouts instead of only fetching them.
    #[arg(long)]
    pub pull: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct AnalyzeOptions {
    /// Offer to delete every undeclared directory.
    #[arg(short, long)]
    pub delete: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ReconfigureOptions {
    /// Only list repositories that would be reconfigured.
    #[arg(short = 'n', long, group = "review")]
    pub dry_run: bool,

    /// Confirm each repository before reconfiguring it.
    #[arg(short, long, group = "review")]
    pub interactive: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct RevertOptions {
    /// Only list repositories that would be reverted.
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct RunOptions {
    /// Program and arguments to run.
    #[arg(
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "command"
    )]
    pub command: Vec<String>,
}

#[tokio::main]
async fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    match run().await {
        Ok(true) => exit(0),
        Ok(false) => exit(1),
        Err(error) => {
            error!("{error:?}");
            exit(1);
        }
    }
}

async fn run() -> Result<bool> {
    Cli::parse().run().await
}
