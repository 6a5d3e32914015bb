// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine default locations of the files grove reads when the user does
//! not point at them explicitly.

use std::path::PathBuf;

/// Determine default absolute path to the fleet configuration file.
///
/// Uses XDG Base Directory path `$XDG_CONFIG_HOME/grove/fleet.toml`. Does not
/// check if the path returned actually exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if configuration directory cannot be determined.
///
/// # See Also
///
/// - [XDG Base Directory](https://wiki.archlinux.org/title/XDG_Base_Directory)
pub fn default_config_path() -> Result<PathBuf> {
    config_dir().map(|path| path.join("fleet.toml"))
}

/// Determine default absolute path to the shared hook source directory.
///
/// Uses `$XDG_CONFIG_HOME/grove/hooks`. Projects may override it through
/// their `hooks_dir` setting.
///
/// # Errors
///
/// - Return [`NoWayHome`] if configuration directory cannot be determined.
pub fn default_hooks_dir() -> Result<PathBuf> {
    config_dir().map(|path| path.join("hooks"))
}

fn config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|path| path.join("grove"))
        .ok_or(NoWayHome)
}

/// No way to determine user's configuration directory.
///
/// # See Also
///
/// - [`dirs::config_dir`](https://docs.rs/dirs/latest/dirs/fn.config_dir.html)
#[derive(Clone, Debug, thiserror::Error)]
#[error("cannot determine absolute path to user's configuration directory")]
pub struct NoWayHome;

/// Friendly result alias :3
pub type Result<T, E = NoWayHome> = std::result::Result<T, E>;
