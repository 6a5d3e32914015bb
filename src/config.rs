// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout of the fleet configuration file. A fleet is made of one
//! or more named __projects__. Each project maps a workspace directory to the
//! set of repositories that should be checked out inside of it.
//!
//! # General Layout
//!
//! ```toml
//! [projects.work]
//! workspace = "~/src/work"
//! ignore = ["scratch"]
//!
//! [[projects.work.substitutions]]
//! from = "github.com"
//! to = "gh-work"
//!
//! [projects.work.repos.api]
//! url = "git@github.com:org/api.git"
//! init_commands = [["make", "setup"], "bootstrap"]
//! ignore_hooks = false
//! ```
//!
//! The configuration is parsed once and stays immutable for the rest of the
//! run.

use crate::{path::default_hooks_dir, substitute::Substitutions};

use serde::Deserialize;
use std::{
    collections::{BTreeMap, BTreeSet},
    fs::read_to_string,
    path::{Component, Path, PathBuf},
    str::FromStr,
};

/// Whole fleet configuration.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Every project of the fleet keyed by project name.
    #[serde(default)]
    pub projects: BTreeMap<String, FleetSpec>,
}

impl Config {
    /// Read and parse configuration file at `path`.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Read`] if the file cannot be read.
    /// - Return any error of [`Config::from_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        read_to_string(path.as_ref())
            .map_err(|err| ConfigError::Read {
                source: err,
                path: path.as_ref().to_path_buf(),
            })?
            .parse()
    }

    /// Get project by name.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::UnknownProject`] if `name` is not configured.
    pub fn project(&self, name: &str) -> Result<&FleetSpec> {
        self.projects
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProject { name: name.into() })
    }

    /// Select projects by name.
    ///
    /// An empty selection means every project in the fleet.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::UnknownProject`] if a name is not configured.
    pub fn select(&self, names: &[String]) -> Result<Vec<&FleetSpec>> {
        if names.is_empty() {
            return Ok(self.projects.values().collect());
        }

        names.iter().map(|name| self.project(name)).collect()
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut config: Config = toml::de::from_str(data).map_err(ConfigError::Deserialize)?;

        for (project, spec) in config.projects.iter_mut() {
            spec.name = project.clone();

            // INVARIANT: Perform shell expansion on every path setting.
            spec.workspace = expand(&spec.workspace)?;
            spec.hooks_dir = if spec.hooks_dir.as_os_str().is_empty() {
                default_hooks_dir()?
            } else {
                expand(&spec.hooks_dir)?
            };

            // INVARIANT: Every repository maps to exactly one directory right
            // under the workspace.
            for (name, entry) in spec.repos.iter_mut() {
                if !is_dir_name(name) {
                    return Err(ConfigError::InvalidRepoName {
                        project: project.clone(),
                        name: name.clone(),
                    });
                }
                entry.name = name.clone();
            }
        }

        Ok(config)
    }
}

/// Single project of the fleet.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FleetSpec {
    /// Name of the project.
    #[serde(skip)]
    pub name: String,

    /// Directory that hosts every repository of the project.
    pub workspace: PathBuf,

    /// Declared repositories keyed by directory name.
    #[serde(default)]
    pub repos: BTreeMap<String, RepoEntry>,

    /// Ordered literal substitutions applied to declared URLs.
    #[serde(default)]
    pub substitutions: Substitutions,

    /// Directory names in the workspace that drift analysis skips.
    #[serde(default)]
    pub ignore: BTreeSet<String>,

    /// Shared hook source directory.
    #[serde(default)]
    pub hooks_dir: PathBuf,
}

impl FleetSpec {
    /// Target directory of declared repository.
    pub fn repo_dir(&self, name: impl AsRef<str>) -> PathBuf {
        self.workspace.join(name.as_ref())
    }

    /// Declared URL of repository after substitution.
    pub fn target_url(&self, entry: &RepoEntry) -> String {
        self.substitutions.apply(&entry.url)
    }

    /// Names of every declared repository.
    pub fn declared(&self) -> BTreeSet<String> {
        self.repos.keys().cloned().collect()
    }
}

/// Declared repository.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepoEntry {
    /// Directory name of the repository.
    #[serde(skip)]
    pub name: String,

    /// Canonical remote URL, before substitution.
    pub url: String,

    /// One-time commands to run after a fresh clone.
    #[serde(default, alias = "init-commands")]
    pub init_commands: Vec<InitCommand>,

    /// Do not install shared hooks into this repository.
    #[serde(default)]
    pub ignore_hooks: bool,
}

impl RepoEntry {
    /// Construct new repository entry.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            ..Default::default()
        }
    }
}

/// Initialization command.
///
/// A plain string is treated as the program name alone, it is __not__ split
/// on whitespace.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize)]
#[serde(untagged)]
pub enum InitCommand {
    Program(String),
    Args(Vec<String>),
}

impl InitCommand {
    /// Argument list of command, program name first.
    pub fn argv(&self) -> Vec<String> {
        match self {
            Self::Program(program) => vec![program.clone()],
            Self::Args(args) => args.clone(),
        }
    }
}

fn expand(path: &Path) -> Result<PathBuf> {
    Ok(PathBuf::from(
        shellexpand::full(path.to_string_lossy().as_ref())
            .map_err(ConfigError::ShellExpansion)?
            .into_owned(),
    ))
}

fn is_dir_name(name: &str) -> bool {
    if name.contains(['/', '\\']) {
        return false;
    }

    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read configuration file at {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),

    /// Failed to determine default hook directory.
    #[error(transparent)]
    NoWayHome(#[from] crate::path::NoWayHome),

    /// Repository name is not a plain directory name.
    #[error("project {project:?} declares invalid repository name {name:?}")]
    InvalidRepoName { project: String, name: String },

    /// Selected project does not exist.
    #[error("project {name:?} is not configured")]
    UnknownProject { name: String },
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;
