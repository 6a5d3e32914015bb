// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Remote URL substitution.
//!
//! Projects may declare an ordered list of literal replacements that are
//! applied to every declared remote URL before it is used, e.g., rewriting
//! `github.com` into an SSH configuration alias like `gh-work`. Declared URLs
//! therefore stay canonical in the configuration file, while the URL that
//! actually lands in a checkout is the substituted one.

use serde::{Deserialize, Serialize};

/// A single literal replacement.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct Substitution {
    /// Literal text to look for.
    pub from: String,

    /// Literal text to put in its place.
    pub to: String,
}

impl Substitution {
    /// Construct new substitution.
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Ordered set of literal URL substitutions.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Substitutions(Vec<Substitution>);

impl Substitutions {
    /// Construct new substitution set from ordered listing.
    pub fn new(substitutions: impl IntoIterator<Item = Substitution>) -> Self {
        Self(substitutions.into_iter().collect())
    }

    /// Apply every substitution to `url` in declaration order.
    ///
    /// Later substitutions see the output of earlier ones. Empty `from`
    /// literals are skipped.
    pub fn apply(&self, url: impl AsRef<str>) -> String {
        self.0
            .iter()
            .filter(|sub| !sub.from.is_empty())
            .fold(url.as_ref().to_string(), |url, sub| {
                url.replace(sub.from.as_str(), sub.to.as_str())
            })
    }
}
