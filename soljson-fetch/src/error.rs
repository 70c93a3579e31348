use reqwest::StatusCode;
use std::{io, path::PathBuf};
use thiserror::Error;
use url::Url;

/// The ways fetching `soljson.js` can fail.
#[derive(Debug, Error)]
#[allow(clippy::module_name_repetitions)]
pub enum FetchError {
    /// A connection-level failure, or a failure while reading a response body.
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to get version list from {url}: {status}")]
    ListStatus { url: Url, status: StatusCode },

    #[error("failed to parse the version list: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("no releases")]
    NoReleases,

    #[error("version `{version}` does not look like major.minor.patch")]
    Pattern { version: String },

    #[error("could not read package manifest at {}: {source}", path.display())]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not parse package manifest at {}: {source}", path.display())]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("release `{tag}` has no asset named `{name}`")]
    AssetNotFound { tag: String, name: String },

    #[error("failed to download file from {url}: {status}")]
    DownloadStatus { url: Url, status: StatusCode },

    #[error("got a {status} redirect from {url} without a usable location header")]
    MissingLocation { url: Url, status: StatusCode },

    #[error("redirect location `{location}` from {url} is not a valid URL: {source}")]
    InvalidLocation {
        url: Url,
        location: String,
        #[source]
        source: url::ParseError,
    },

    #[error("gave up after following {max} redirects, last one pointed at {url}")]
    RedirectLoop { max: usize, url: Url },

    #[error("filesystem error on {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FetchError {
    pub(crate) fn filesystem(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> FetchError {
        let path = path.into();
        move |source| FetchError::Filesystem { path, source }
    }
}
