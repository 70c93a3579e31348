//! The `builder` module contains the `FetcherBuilder` struct which is used to create a `Fetcher`
//! instance.
use crate::{
    downloader::{Downloader, DEFAULT_MAX_REDIRECTS},
    fetcher::Fetcher,
    lister::ReleaseLister,
    version::LocalVersion,
};
use anyhow::{anyhow, Context, Result};
use log::debug;
use reqwest::{
    header::{HeaderMap, HeaderValue, USER_AGENT},
    redirect::Policy,
    Client,
};
use std::{
    env,
    path::{Path, PathBuf},
};
use url::Url;

const DEFAULT_PROJECT: &str = "vitelabs/soliditypp";
const DEFAULT_API_BASE_URL: &str = "https://api.github.com";
const DEFAULT_USER_AGENT: &str = "solcjs";
const DEFAULT_ASSET_NAME: &str = "soljson.js";
const DEFAULT_PACKAGE_MANIFEST: &str = "package.json";

const PROJECT_BASE_URL: &str = "https://github.com";
const TOKEN_ENV_VAR: &str = "GITHUB_TOKEN";

/// `FetcherBuilder` is used to create a [`Fetcher`] instance. Every setting has a default, so
/// `FetcherBuilder::new().build()` fetches `soljson.js` for the version in `./package.json` from
/// the `vitelabs/soliditypp` releases on GitHub.
#[derive(Debug, Default)]
#[allow(clippy::module_name_repetitions)]
pub struct FetcherBuilder<'a> {
    project: Option<&'a str>,
    api_base_url: Option<&'a str>,
    user_agent: Option<&'a str>,
    token: Option<&'a str>,
    package_manifest: Option<PathBuf>,
    version: Option<&'a str>,
    asset_name: Option<&'a str>,
    target: Option<PathBuf>,
    max_redirects: Option<usize>,
}

impl<'a> FetcherBuilder<'a> {
    /// Returns a new empty `FetcherBuilder`.
    #[must_use]
    pub fn new() -> Self {
        FetcherBuilder::default()
    }

    /// Set the project whose releases are listed. This can either be just the owner/name, like
    /// `vitelabs/soliditypp`, or a URL to any page in the project, like
    /// `https://github.com/vitelabs/soliditypp/releases`.
    #[must_use]
    pub fn project(mut self, project: &'a str) -> Self {
        self.project = Some(project);
        self
    }

    /// Set the base URL for the forge site's API. This is useful for testing or for a GitHub
    /// Enterprise install. Defaults to `https://api.github.com`.
    #[must_use]
    pub fn api_base_url(mut self, api_base_url: &'a str) -> Self {
        self.api_base_url = Some(api_base_url);
        self
    }

    /// Set the `User-Agent` header sent with every request. Defaults to `solcjs`.
    #[must_use]
    pub fn user_agent(mut self, user_agent: &'a str) -> Self {
        self.user_agent = Some(user_agent);
        self
    }

    /// Set a token to use when listing releases. If this is not set, then the `GITHUB_TOKEN` env
    /// var is used if it is set.
    #[must_use]
    pub fn token(mut self, token: &'a str) -> Self {
        self.token = Some(token);
        self
    }

    /// Set the path of the `package.json` file the wanted version is read from. Defaults to
    /// `./package.json`. This is ignored when [`FetcherBuilder::version`] is called.
    #[must_use]
    pub fn package_manifest<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.package_manifest = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the wanted version directly instead of reading it from the package manifest. It must
    /// still look like `major.minor.patch`.
    #[must_use]
    pub fn version(mut self, version: &'a str) -> Self {
        self.version = Some(version);
        self
    }

    /// Set the name of the release asset to download. Defaults to `soljson.js`.
    #[must_use]
    pub fn asset_name(mut self, name: &'a str) -> Self {
        self.asset_name = Some(name);
        self
    }

    /// Set the file the asset is written to. Any existing file at this path is deleted before the
    /// download starts. Defaults to the asset name in the current directory.
    #[must_use]
    pub fn target<P: AsRef<Path>>(mut self, target: P) -> Self {
        self.target = Some(target.as_ref().to_path_buf());
        self
    }

    /// Set the number of redirects that will be followed when downloading the asset. Defaults
    /// to 10.
    #[must_use]
    pub fn max_redirects(mut self, max: usize) -> Self {
        self.max_redirects = Some(max);
        self
    }

    /// Builds a new [`Fetcher`] instance and returns it.
    ///
    /// # Errors
    ///
    /// This returns an error if the project or API base URL cannot be parsed, if the package
    /// manifest cannot be read, or if the wanted version does not look like `major.minor.patch`.
    pub fn build(self) -> Result<Fetcher> {
        let project_name = parse_project_name(self.project.unwrap_or(DEFAULT_PROJECT))?;
        let api_base_url = self.api_base_url.unwrap_or(DEFAULT_API_BASE_URL);
        let api_base_url = Url::parse(api_base_url)
            .with_context(|| format!("could not parse API base URL `{api_base_url}`"))?;

        let token = self.token.map(String::from).or_else(|| {
            let token = env::var(TOKEN_ENV_VAR).ok();
            if token.is_some() {
                debug!("Using GitHub token from the {TOKEN_ENV_VAR} environment variable.");
            }
            token
        });
        let lister = ReleaseLister::new(&api_base_url, &project_name, token.as_deref())?;

        let version = self.wanted_version()?;
        debug!("wanted version = {version}");

        let asset_name = self.asset_name.unwrap_or(DEFAULT_ASSET_NAME);
        let target = match self.target {
            Some(target) => target,
            None => env::current_dir()?.join(asset_name),
        };
        debug!("target path = {}", target.display());

        Ok(Fetcher::new(
            lister,
            version,
            asset_name.to_string(),
            target,
            Downloader::new(self.max_redirects.unwrap_or(DEFAULT_MAX_REDIRECTS)),
            reqwest_client(self.user_agent.unwrap_or(DEFAULT_USER_AGENT))?,
        ))
    }

    fn wanted_version(&self) -> Result<LocalVersion> {
        if let Some(v) = self.version {
            return Ok(v.parse()?);
        }

        let manifest = match &self.package_manifest {
            Some(path) => path.clone(),
            None => env::current_dir()?.join(DEFAULT_PACKAGE_MANIFEST),
        };
        Ok(LocalVersion::from_manifest(&manifest)?)
    }
}

fn parse_project_name(project: &str) -> Result<String> {
    let parsed = if project.starts_with("http") {
        Url::parse(project)?
    } else {
        Url::parse(PROJECT_BASE_URL)?.join(project)?
    };

    let parts = parsed.path().split('/').collect::<Vec<_>>();
    if parts.len() < 3 || parts[1].is_empty() || parts[2].is_empty() {
        return Err(anyhow!("could not parse owner and repo name from `{project}`"));
    }

    // The first part is an empty string for the leading '/' in the path.
    let (owner, repo) = (parts[1], parts[2]);
    debug!("Parsed project `{project}` = {owner} / {repo}");

    Ok(format!("{owner}/{repo}"))
}

/// The client never follows redirects itself. The downloader does that so it can bound and log
/// each hop.
pub(crate) fn reqwest_client(user_agent: &str) -> Result<Client> {
    let builder = Client::builder().gzip(true).redirect(Policy::none());

    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_str(user_agent)?);
    Ok(builder.default_headers(headers).build()?)
}
