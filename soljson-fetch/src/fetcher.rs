use crate::{
    downloader::Downloader,
    lister::ReleaseLister,
    release::Asset,
    selector::VersionSelector,
    version::LocalVersion,
};
use anyhow::{Context, Result};
use log::debug;
use reqwest::Client;
use std::path::{Path, PathBuf};

/// `Fetcher` lists the project's releases, picks the one matching the wanted version, and
/// downloads its asset. Use the [`FetcherBuilder`](crate::FetcherBuilder) struct to create a new
/// `Fetcher` instance.
#[derive(Debug)]
pub struct Fetcher {
    lister: ReleaseLister,
    version: LocalVersion,
    asset_name: String,
    target: PathBuf,
    downloader: Downloader,
    reqwest_client: Client,
}

impl Fetcher {
    pub(crate) fn new(
        lister: ReleaseLister,
        version: LocalVersion,
        asset_name: String,
        target: PathBuf,
        downloader: Downloader,
        reqwest_client: Client,
    ) -> Fetcher {
        Fetcher {
            lister,
            version,
            asset_name,
            target,
            downloader,
            reqwest_client,
        }
    }

    /// Fetch the asset and write it to the target path, which is returned on success.
    ///
    /// # Errors
    ///
    /// Every failure is returned as an error wrapping a [`FetchError`](crate::FetchError):
    ///
    /// * Network errors, or a non-200 response when listing releases.
    /// * A release list that is not valid JSON.
    /// * An empty release list.
    /// * A selected release that has no asset with the expected name. The target file is not
    ///   touched in this case.
    /// * A non-200, non-redirect response when downloading, or too many redirects.
    /// * Unable to delete or write the target file.
    pub async fn fetch(&self) -> Result<PathBuf> {
        let asset = self.asset().await?;
        self.downloader
            .download(&self.reqwest_client, &asset.url, &self.target)
            .await
            .with_context(|| format!("failed to download {} from {}", asset.name, asset.url))?;
        Ok(self.target.clone())
    }

    pub(crate) async fn asset(&self) -> Result<Asset> {
        let releases = self
            .lister
            .fetch_releases(&self.reqwest_client)
            .await
            .context("failed to get version list")?;

        let selector = VersionSelector::new(&self.version, &self.asset_name);
        let selection = selector.pick_release(&releases)?;
        debug!(
            "picked release {} by {}",
            selection.release.tag_name, selection.kind
        );

        let asset = selector.pick_asset(selection.release)?;
        debug!("picked asset named {} at {}", asset.name, asset.url);
        Ok(asset.clone())
    }

    /// The wanted version, as read from the package manifest or set on the builder.
    #[must_use]
    pub fn version(&self) -> &str {
        self.version.as_str()
    }

    /// The path the asset is written to.
    #[must_use]
    pub fn target(&self) -> &Path {
        &self.target
    }
}
