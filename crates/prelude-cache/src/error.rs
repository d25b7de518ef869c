//! Prelude cache and resolver error types.

use thiserror::Error;

/// Errors from parsing prelude URIs, fetching repositories, and
/// materialising specs.
#[derive(Debug, Error)]
pub enum Error {
    /// A prelude spec's `uri` field doesn't match `<provider>:<owner>/<repo>[/<subpath>][#<ref>]`.
    #[error("invalid prelude spec uri '{0}'")]
    InvalidSpecUri(String),

    /// No fetcher implementation recognizes this provider name.
    #[error("unsupported git provider '{0}'")]
    UnsupportedProvider(String),

    /// Fetching a repository through `git2` failed.
    #[error("git operation failed: {0}")]
    Git(#[from] git2::Error),

    /// Fatal: the fetch or materialisation of one spec failed, aborting the
    /// enclosing prelude's download. Preludes already fully materialised
    /// before this one are left intact.
    #[error("prelude '{prelude_name}' failed to download '{uri}': {cause}")]
    PreludeDownloadFailed {
        prelude_name: String,
        uri: String,
        cause: String,
    },

    /// Filesystem I/O failure while materialising or caching.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
