//! Prelude and spec data model, and provider-URI parsing.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single file or subtree within a prelude.
///
/// `requires` are processed recursively by the resolver: a required spec is
/// flattened alongside its parent's siblings before repositories are grouped
/// for fetching, so a chain of `requires` still gets the single-download
/// guarantee.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PreludeSpec {
    pub uri: String,
    pub name: String,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub requires: Vec<PreludeSpec>,
}

/// A prelude's specs, either a flat list or grouped by name.
#[derive(Debug, Clone)]
pub enum PreludeSpecs {
    Flat(Vec<PreludeSpec>),
    Grouped(HashMap<String, Vec<PreludeSpec>>),
}

/// A named, ordered bundle of Pact source specs.
///
/// Only the data-bearing fields are in scope: `shouldDeploy`/`deploy`/`repl`
/// are runtime capabilities supplied by the caller, not modeled here.
#[derive(Debug, Clone)]
pub struct Prelude {
    pub name: String,
    pub specs: PreludeSpecs,
}

impl Prelude {
    /// Flatten `specs` (and transitively, every spec's `requires`) into a
    /// list of `(resolved_group, spec)` pairs. A spec's own `group`, if set,
    /// overrides its container's; otherwise it inherits its parent's group
    /// (the prelude's name at the top level).
    #[must_use]
    pub fn flatten(&self) -> Vec<(String, PreludeSpec)> {
        let mut out = Vec::new();
        match &self.specs {
            PreludeSpecs::Flat(specs) => {
                for spec in specs {
                    flatten_spec(spec, &self.name, &mut out);
                }
            }
            PreludeSpecs::Grouped(groups) => {
                for (group, specs) in groups {
                    for spec in specs {
                        flatten_spec(spec, group, &mut out);
                    }
                }
            }
        }
        out
    }
}

fn flatten_spec(spec: &PreludeSpec, default_group: &str, out: &mut Vec<(String, PreludeSpec)>) {
    let group = spec.group.clone().unwrap_or_else(|| default_group.to_string());
    out.push((group.clone(), spec.clone()));
    for required in &spec.requires {
        flatten_spec(required, &group, out);
    }
}

/// A parsed `<provider>:<owner>/<repo>[/<subpath>][#<ref>]` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUri {
    pub provider: String,
    pub owner: String,
    pub repo: String,
    pub subpath: Option<String>,
    pub reference: Option<String>,
}

impl ParsedUri {
    /// Parse a prelude spec's `uri` field.
    pub fn parse(uri: &str) -> Result<Self, Error> {
        let (without_ref, reference) = match uri.split_once('#') {
            Some((left, right)) => (left, Some(right.to_string())),
            None => (uri, None),
        };

        let (provider, rest) = without_ref
            .split_once(':')
            .ok_or_else(|| Error::InvalidSpecUri(uri.to_string()))?;
        if provider.is_empty() {
            return Err(Error::InvalidSpecUri(uri.to_string()));
        }

        let mut segments = rest.splitn(3, '/');
        let owner = segments
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::InvalidSpecUri(uri.to_string()))?;
        let repo = segments
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::InvalidSpecUri(uri.to_string()))?;
        let subpath = segments.next().filter(|s| !s.is_empty()).map(String::from);

        Ok(Self {
            provider: provider.to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            subpath,
            reference,
        })
    }

    /// The key used to deduplicate repository fetches: provider, owner,
    /// repo and ref, WITHOUT the subpath.
    #[must_use]
    pub fn base_repo_key(&self) -> String {
        format!(
            "{}:{}/{}#{}",
            self.provider,
            self.owner,
            self.repo,
            self.reference.as_deref().unwrap_or("HEAD")
        )
    }

    /// Whether `subpath` names a single `.pact` file rather than a directory.
    #[must_use]
    pub fn subpath_is_single_file(&self) -> bool {
        self.subpath
            .as_deref()
            .is_some_and(|s| s.ends_with(".pact"))
    }
}
