//! Git-Archive Fetcher: resolves a parsed provider URI to a local directory
//! tree by cloning the repository and checking out its ref.

use crate::error::Error;
use crate::spec::ParsedUri;
use std::path::Path;

/// Capability interface for materialising a repository locally. A trait,
/// not a base class, so resolver tests can substitute an in-memory fake
/// rather than clone real repositories.
pub trait GitArchiveFetcher: Send + Sync {
    /// Materialise `parsed`'s repository (ignoring its subpath) into `dest`.
    /// If `dest` already exists and `force` is true, it is replaced;
    /// otherwise an existing `dest` is left untouched.
    fn fetch(&self, parsed: &ParsedUri, dest: &Path, force: bool) -> Result<(), Error>;
}

/// `git2`-backed fetcher. Supports `github`, `gitlab` and `bitbucket`
/// providers over HTTPS; any other provider name is rejected rather than
/// guessed at.
pub struct Git2Fetcher;

impl Git2Fetcher {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn clone_url(parsed: &ParsedUri) -> Result<String, Error> {
        let host = match parsed.provider.as_str() {
            "github" => "github.com",
            "gitlab" => "gitlab.com",
            "bitbucket" => "bitbucket.org",
            other => return Err(Error::UnsupportedProvider(other.to_string())),
        };
        Ok(format!("https://{host}/{}/{}.git", parsed.owner, parsed.repo))
    }
}

impl Default for Git2Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl GitArchiveFetcher for Git2Fetcher {
    fn fetch(&self, parsed: &ParsedUri, dest: &Path, force: bool) -> Result<(), Error> {
        if dest.exists() {
            if !force {
                return Ok(());
            }
            std::fs::remove_dir_all(dest)?;
        }
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let url = Self::clone_url(parsed)?;
        let repo = git2::Repository::clone(&url, dest)?;

        if let Some(reference) = &parsed.reference {
            checkout_reference(&repo, reference)?;
        }

        Ok(())
    }
}

fn checkout_reference(repo: &git2::Repository, reference: &str) -> Result<(), git2::Error> {
    let object = repo
        .revparse_single(reference)
        .or_else(|_| repo.revparse_single(&format!("origin/{reference}")))?;
    repo.checkout_tree(&object, None)?;
    repo.set_head_detached(object.id())?;
    Ok(())
}
