use crate::error::FetchError;
use log::{debug, info, warn};
use reqwest::{header::LOCATION, Client, Response, StatusCode};
use std::{
    fs::{self, File},
    io::{self, Write},
    path::Path,
};
use url::Url;

pub(crate) const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Streams a URL into a local file, following redirects itself so that the hop count is bounded
/// and every hop is logged. The client it is given must not follow redirects on its own.
#[derive(Debug)]
pub(crate) struct Downloader {
    max_redirects: usize,
}

impl Downloader {
    pub(crate) fn new(max_redirects: usize) -> Self {
        Self { max_redirects }
    }

    /// Any existing file at `target` is deleted before the first request is made. If the body
    /// can't be read or written in full, the partial file is removed too, so a failed download
    /// leaves nothing behind at all.
    pub(crate) async fn download(
        &self,
        client: &Client,
        url: &Url,
        target: &Path,
    ) -> Result<(), FetchError> {
        remove_existing(target)?;

        let resp = self.follow_redirects(client, url.clone()).await?;
        write_body(resp, target).await?;
        info!("done.");

        Ok(())
    }

    async fn follow_redirects(&self, client: &Client, mut url: Url) -> Result<Response, FetchError> {
        let mut hops = 0;
        loop {
            debug!("downloading asset from {url}");
            let resp = client.get(url.clone()).send().await?;
            let status = resp.status();

            if status.is_redirection() {
                if hops == self.max_redirects {
                    return Err(FetchError::RedirectLoop {
                        max: self.max_redirects,
                        url,
                    });
                }
                hops += 1;
                url = redirect_target(&url, &resp)?;
                info!("redirect to {url}");
                continue;
            }

            if status != StatusCode::OK {
                return Err(FetchError::DownloadStatus { url, status });
            }

            return Ok(resp);
        }
    }
}

// A relative location is resolved against the URL that was just requested.
fn redirect_target(url: &Url, resp: &Response) -> Result<Url, FetchError> {
    let missing = || FetchError::MissingLocation {
        url: url.clone(),
        status: resp.status(),
    };
    let location = resp
        .headers()
        .get(LOCATION)
        .ok_or_else(missing)?
        .to_str()
        .map_err(|_| missing())?;

    url.join(location)
        .map_err(|source| FetchError::InvalidLocation {
            url: url.clone(),
            location: location.to_string(),
            source,
        })
}

fn remove_existing(target: &Path) -> Result<(), FetchError> {
    match fs::remove_file(target) {
        Ok(()) => {
            debug!("removed existing file at {}", target.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(FetchError::filesystem(target)(e)),
    }
}

async fn write_body(resp: Response, target: &Path) -> Result<(), FetchError> {
    debug!("writing download to {}", target.display());

    let res = stream_to_file(resp, target).await;
    if res.is_err() {
        if let Err(e) = fs::remove_file(target) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(
                    "could not remove partial download at {}: {e}",
                    target.display()
                );
            }
        }
    }

    res
}

async fn stream_to_file(mut resp: Response, target: &Path) -> Result<(), FetchError> {
    let mut file = File::create(target).map_err(FetchError::filesystem(target))?;
    while let Some(chunk) = resp.chunk().await? {
        file.write_all(&chunk)
            .map_err(FetchError::filesystem(target))?;
    }
    file.flush().map_err(FetchError::filesystem(target))?;

    Ok(())
}
