// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Declarative fleet manager for Git checkouts.
//!
//! A __fleet__ is every repository declared across the projects of a
//! configuration file. Each project maps a workspace directory to the set of
//! repositories that should live inside of it. Grove reconciles the state of
//! each workspace against its declaration:
//!
//! - Clone missing repositories, and fetch or pull existing ones.
//! - Install shared hooks into checkouts via symlinks.
//! - Detect drift, i.e., directories that are declared but missing, or
//!   present but undeclared.
//! - Rewrite the remote URL of checkouts in a reversible way, and revert
//!   such rewrites.
//!
//! Git itself is treated as an opaque external command. Grove only looks at
//! its exit status and output.

pub mod config;
pub mod console;
pub mod fleet;
pub mod git;
pub mod hook;
pub mod path;
pub mod reconcile;
pub mod remote;
pub mod scan;
pub mod substitute;
pub mod sync;
pub mod syscall;

#[cfg(test)]
mod testing;

#[doc(inline)]
pub use crate::{
    config::{Config, FleetSpec, RepoEntry},
    console::{Console, Report, Summary},
    fleet::{Fleet, Review},
    sync::SyncMode,
};
