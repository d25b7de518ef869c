//! Prelude resolver: groups specs by repository, fetches each repository at
//! most once, materialises files into the prelude layout, and updates the
//! cache.

use crate::cache::{CacheStore, CachedSpec};
use crate::error::Error;
use crate::fetcher::GitArchiveFetcher;
use crate::spec::{ParsedUri, Prelude, PreludeSpec};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Resolves and materialises a list of preludes under one directory.
pub struct PreludeResolver<F: GitArchiveFetcher> {
    fetcher: F,
    preludes_dir: PathBuf,
    scratch_dir: PathBuf,
}

impl<F: GitArchiveFetcher> PreludeResolver<F> {
    /// Build a resolver materialising into `preludes_dir`, using `scratch`
    /// repo checkouts under `preludes_dir/.pact-toolbox/tmp`.
    pub fn new(fetcher: F, preludes_dir: impl Into<PathBuf>) -> Self {
        let preludes_dir = preludes_dir.into();
        let scratch_dir = preludes_dir.join(".pact-toolbox").join("tmp");
        Self {
            fetcher,
            preludes_dir,
            scratch_dir,
        }
    }

    /// The cache store this resolver updates.
    #[must_use]
    pub fn cache(&self) -> CacheStore {
        CacheStore::new(&self.preludes_dir)
    }

    /// Download and materialise every prelude in order. A repository shared
    /// by two specs (by base repo key) is fetched at most once across this
    /// entire call, not just within one prelude.
    pub fn download_all_preludes(&self, preludes: &[Prelude]) -> Result<(), Error> {
        let mut fetched: HashSet<String> = HashSet::new();
        for prelude in preludes {
            self.download_prelude(prelude, &mut fetched)?;
        }
        Ok(())
    }

    fn download_prelude(
        &self,
        prelude: &Prelude,
        fetched: &mut HashSet<String>,
    ) -> Result<(), Error> {
        let flattened = prelude.flatten();

        let mut by_repo: HashMap<String, Vec<(String, PreludeSpec, ParsedUri)>> = HashMap::new();
        for (group, spec) in flattened {
            let parsed = ParsedUri::parse(&spec.uri).map_err(|e| Error::PreludeDownloadFailed {
                prelude_name: prelude.name.clone(),
                uri: spec.uri.clone(),
                cause: e.to_string(),
            })?;
            by_repo
                .entry(parsed.base_repo_key())
                .or_default()
                .push((group, spec, parsed));
        }

        let mut materialised_specs = Vec::new();

        for (base_key, group_specs) in &by_repo {
            let scratch = self.scratch_dir.join(sanitize_key(base_key));

            if !fetched.contains(base_key) {
                let (_, first_spec, first_parsed) = &group_specs[0];
                self.fetcher
                    .fetch(first_parsed, &scratch, true)
                    .map_err(|e| Error::PreludeDownloadFailed {
                        prelude_name: prelude.name.clone(),
                        uri: first_spec.uri.clone(),
                        cause: e.to_string(),
                    })?;
                fetched.insert(base_key.clone());
            }

            for (group, spec, parsed) in group_specs {
                let dest = self
                    .preludes_dir
                    .join(&prelude.name)
                    .join(group)
                    .join(&spec.name);

                materialize(&scratch, parsed.subpath.as_deref(), &dest).map_err(|e| {
                    Error::PreludeDownloadFailed {
                        prelude_name: prelude.name.clone(),
                        uri: spec.uri.clone(),
                        cause: e.to_string(),
                    }
                })?;

                materialised_specs.push(CachedSpec {
                    name: spec.name.clone(),
                    uri: spec.uri.clone(),
                    checksum: String::new(),
                    local_path: dest,
                });
            }
        }

        self.cache()
            .update_prelude(&prelude.name, None, &materialised_specs);

        Ok(())
    }
}

fn materialize(scratch_root: &Path, subpath: Option<&str>, dest: &Path) -> Result<(), Error> {
    let source = match subpath {
        Some(p) => scratch_root.join(p),
        None => scratch_root.to_path_buf(),
    };
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if source.is_dir() {
        copy_dir_recursive(&source, dest)?;
    } else {
        std::fs::copy(&source, dest)?;
    }
    Ok(())
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dst)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let dest_path = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&entry.path(), &dest_path)?;
        } else {
            std::fs::copy(entry.path(), &dest_path)?;
        }
    }
    Ok(())
}

fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}
