use crate::{error::FetchError, release::Release};
use anyhow::{anyhow, Result};
use itertools::Itertools;
use log::{debug, info};
use reqwest::{
    header::{HeaderValue, ACCEPT, AUTHORIZATION},
    Client, RequestBuilder, StatusCode,
};
use url::Url;

/// Fetches the list of releases for one project from a GitHub-compatible API.
#[derive(Debug)]
pub(crate) struct ReleaseLister {
    releases_url: Url,
    auth_header: Option<HeaderValue>,
}

impl ReleaseLister {
    pub(crate) fn new(api_base_url: &Url, project_name: &str, token: Option<&str>) -> Result<Self> {
        let (owner, repo) = project_name
            .split_once('/')
            .ok_or_else(|| anyhow!("project name `{project_name}` is not in owner/repo form"))?;

        let mut releases_url = api_base_url.clone();
        releases_url
            .path_segments_mut()
            .map_err(|()| anyhow!("the API base URL `{api_base_url}` cannot be used as a base"))?
            .pop_if_empty()
            .push("repos")
            .push(owner)
            .push(repo)
            .push("releases");

        let auth_header = match token {
            Some(token) => {
                let mut val = HeaderValue::from_str(&format!("Bearer {token}"))?;
                val.set_sensitive(true);
                Some(val)
            }
            None => {
                debug!("No token given.");
                None
            }
        };

        Ok(Self {
            releases_url,
            auth_header,
        })
    }

    pub(crate) async fn fetch_releases(&self, client: &Client) -> Result<Vec<Release>, FetchError> {
        info!("fetch available version list...");
        debug!("Getting release list from `{}`", self.releases_url);

        let req_builder = client
            .get(self.releases_url.clone())
            .header(ACCEPT, HeaderValue::from_static("application/json"));
        let resp = self.maybe_add_token_header(req_builder).send().await?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(FetchError::ListStatus {
                url: self.releases_url.clone(),
                status,
            });
        }

        let body = resp.bytes().await?;
        let releases: Vec<Release> = serde_json::from_slice(&body).map_err(FetchError::Parse)?;
        debug!(
            "got {} releases: {}",
            releases.len(),
            releases.iter().map(|r| r.tag_name.as_str()).join(", "),
        );

        Ok(releases)
    }

    fn maybe_add_token_header(&self, req_builder: RequestBuilder) -> RequestBuilder {
        match &self.auth_header {
            Some(val) => {
                debug!("Adding token to release list request.");
                req_builder.header(AUTHORIZATION, val.clone())
            }
            None => req_builder,
        }
    }

    #[cfg(test)]
    pub(crate) fn releases_url(&self) -> &Url {
        &self.releases_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{builder::reqwest_client, release::Asset};
    use mockito::{Matcher, Server};
    use reqwest::header::USER_AGENT;
    use rstest::rstest;

    #[rstest]
    #[case::bare_host("https://api.github.com")]
    #[case::bare_host_with_slash("https://api.github.com/")]
    fn releases_url_for_default_api(#[case] base: &str) -> Result<()> {
        let lister = ReleaseLister::new(&Url::parse(base)?, "vitelabs/soliditypp", None)?;
        assert_eq!(
            lister.releases_url().as_str(),
            "https://api.github.com/repos/vitelabs/soliditypp/releases",
        );
        Ok(())
    }

    #[test]
    fn releases_url_keeps_api_base_path() -> Result<()> {
        let lister = ReleaseLister::new(
            &Url::parse("https://github.example.com/api/v3")?,
            "vitelabs/soliditypp",
            None,
        )?;
        assert_eq!(
            lister.releases_url().as_str(),
            "https://github.example.com/api/v3/repos/vitelabs/soliditypp/releases",
        );
        Ok(())
    }

    #[test]
    fn project_name_needs_an_owner() -> Result<()> {
        let res = ReleaseLister::new(&Url::parse("https://api.github.com")?, "soliditypp", None);
        assert!(res.is_err());
        Ok(())
    }

    #[rstest]
    #[case::without_token(None)]
    #[case::with_token(Some("ghp_fakeToken"))]
    #[tokio::test]
    async fn fetch_releases(#[case] token: Option<&str>) -> Result<()> {
        let asset_url = Url::parse(
            "https://github.com/vitelabs/soliditypp/releases/download/2.3.0/soljson.js",
        )?;
        let releases = vec![
            Release {
                tag_name: "2.3.0".to_string(),
                assets: vec![Asset {
                    name: "soljson.js".to_string(),
                    url: asset_url,
                }],
            },
            Release {
                tag_name: "latest".to_string(),
                assets: vec![],
            },
        ];

        let authorization_header_matcher = match token {
            Some(token) => Matcher::Exact(format!("Bearer {token}")),
            None => Matcher::Missing,
        };
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/repos/vitelabs/soliditypp/releases")
            .match_header(USER_AGENT.as_str(), "solcjs")
            .match_header(ACCEPT.as_str(), "application/json")
            .match_header(AUTHORIZATION.as_str(), authorization_header_matcher)
            .with_status(200)
            .with_body(serde_json::to_string(&releases)?)
            .create_async()
            .await;

        let lister = ReleaseLister::new(&Url::parse(&server.url())?, "vitelabs/soliditypp", token)?;
        let got = lister.fetch_releases(&reqwest_client("solcjs")?).await?;
        assert_eq!(got, releases);

        m.assert_async().await;

        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn empty_release_list_is_not_an_error() -> Result<()> {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/repos/vitelabs/soliditypp/releases")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let lister = ReleaseLister::new(&Url::parse(&server.url())?, "vitelabs/soliditypp", None)?;
        let got = lister.fetch_releases(&reqwest_client("solcjs")?).await?;
        assert!(got.is_empty());

        m.assert_async().await;

        Ok(())
    }

    #[rstest]
    #[case::not_found(404)]
    #[case::rate_limited(403)]
    #[case::server_error(500)]
    #[case::redirect_is_not_followed(301)]
    #[tokio::test]
    async fn non_200_status_is_an_error(#[case] status: usize) -> Result<()> {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/repos/vitelabs/soliditypp/releases")
            .with_status(status)
            .with_header("location", "https://example.com/elsewhere")
            .with_body("[]")
            .create_async()
            .await;

        let lister = ReleaseLister::new(&Url::parse(&server.url())?, "vitelabs/soliditypp", None)?;
        match lister.fetch_releases(&reqwest_client("solcjs")?).await {
            Err(FetchError::ListStatus { status: got, .. }) => {
                assert_eq!(usize::from(got.as_u16()), status);
            }
            other => panic!("expected a ListStatus error, got {other:?}"),
        }

        m.assert_async().await;

        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn malformed_json_is_a_parse_error() -> Result<()> {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/repos/vitelabs/soliditypp/releases")
            .with_status(200)
            .with_body(r#"{"message": "this is an object, not a list"}"#)
            .create_async()
            .await;

        let lister = ReleaseLister::new(&Url::parse(&server.url())?, "vitelabs/soliditypp", None)?;
        let res = lister.fetch_releases(&reqwest_client("solcjs")?).await;
        assert!(matches!(res, Err(FetchError::Parse(_))), "got {res:?}");

        m.assert_async().await;

        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn connection_failure_is_a_transport_error() -> Result<()> {
        let addr = std::net::TcpListener::bind("127.0.0.1:0")?.local_addr()?;
        let lister =
            ReleaseLister::new(&Url::parse(&format!("http://{addr}"))?, "vitelabs/soliditypp", None)?;
        let res = lister.fetch_releases(&reqwest_client("solcjs")?).await;
        assert!(matches!(res, Err(FetchError::Transport(_))), "got {res:?}");

        Ok(())
    }
}
