use crate::error::FetchError;
use lazy_regex::{regex, Lazy};
use log::debug;
use regex::Regex;
use serde::Deserialize;
use std::{fmt, fs, path::Path, str::FromStr};

/// The `major.minor.patch` version of the local package. This is compared verbatim against release
/// tags, so prerelease and build suffixes are rejected rather than stripped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct LocalVersion(String);

#[derive(Debug, Deserialize)]
struct PackageManifest {
    version: String,
}

fn version_re() -> &'static Lazy<Regex> {
    regex!(r"^(\d+\.\d+\.\d+)$")
}

impl LocalVersion {
    /// Reads the `version` field from a `package.json` style manifest.
    pub(crate) fn from_manifest(path: &Path) -> Result<Self, FetchError> {
        debug!("reading package version from {}", path.display());
        let content = fs::read_to_string(path).map_err(|source| FetchError::ManifestRead {
            path: path.to_path_buf(),
            source,
        })?;
        let manifest: PackageManifest =
            serde_json::from_str(&content).map_err(|source| FetchError::ManifestParse {
                path: path.to_path_buf(),
                source,
            })?;
        manifest.version.parse()
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for LocalVersion {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some(caps) = version_re().captures(s) else {
            return Err(FetchError::Pattern {
                version: s.to_string(),
            });
        };
        Ok(LocalVersion(caps[1].to_string()))
    }
}

impl fmt::Display for LocalVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
