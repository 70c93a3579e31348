use crate::{
    error::FetchError,
    release::{Asset, Release},
    version::LocalVersion,
};
use itertools::Itertools;
use log::{debug, warn};

/// The tag that is tried when no release matches the local version exactly.
pub(crate) const FALLBACK_TAG: &str = "latest";

/// How the release in a [`Selection`] was found.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::AsRefStr, strum::Display)]
pub(crate) enum MatchKind {
    #[strum(serialize = "exact match")]
    Exact,
    #[strum(serialize = "`latest` tag")]
    Latest,
    #[strum(serialize = "first listed release")]
    First,
}

#[derive(Debug)]
pub(crate) struct Selection<'r> {
    pub(crate) release: &'r Release,
    pub(crate) kind: MatchKind,
}

#[derive(Debug)]
pub(crate) struct VersionSelector<'a> {
    wanted: &'a LocalVersion,
    asset_name: &'a str,
}

impl<'a> VersionSelector<'a> {
    pub(crate) fn new(wanted: &'a LocalVersion, asset_name: &'a str) -> Self {
        Self { wanted, asset_name }
    }

    /// Picks the release tagged with the wanted version. When there is none, this falls back to the
    /// release tagged `latest`, and then to whatever release the forge listed first. The forge's
    /// ordering is not guaranteed to be chronological.
    pub(crate) fn pick_release<'r>(
        &self,
        releases: &'r [Release],
    ) -> Result<Selection<'r>, FetchError> {
        if releases.is_empty() {
            return Err(FetchError::NoReleases);
        }
        debug!(
            "looking for {} among tags {}",
            self.wanted,
            releases.iter().map(|r| r.tag_name.as_str()).join(", "),
        );

        if let Some(release) = find_tag(releases, self.wanted.as_str()) {
            debug!("found release tagged {}", release.tag_name);
            return Ok(Selection {
                release,
                kind: MatchKind::Exact,
            });
        }

        let (release, kind) = match find_tag(releases, FALLBACK_TAG) {
            Some(release) => (release, MatchKind::Latest),
            // We checked for an empty list above.
            None => (&releases[0], MatchKind::First),
        };
        warn!(
            "failed to find version {}, fallback to {} ({kind})",
            self.wanted, release.tag_name,
        );

        Ok(Selection { release, kind })
    }

    pub(crate) fn pick_asset<'r>(&self, release: &'r Release) -> Result<&'r Asset, FetchError> {
        release
            .assets
            .iter()
            .find(|a| a.name == self.asset_name)
            .ok_or_else(|| {
                debug!(
                    "release {} has assets {}",
                    release.tag_name,
                    release.assets.iter().map(|a| a.name.as_str()).join(", "),
                );
                FetchError::AssetNotFound {
                    tag: release.tag_name.clone(),
                    name: self.asset_name.to_string(),
                }
            })
    }
}

fn find_tag<'r>(releases: &'r [Release], tag: &str) -> Option<&'r Release> {
    releases.iter().find(|r| r.tag_name == tag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use rstest::rstest;
    use url::Url;

    fn release(tag: &str, asset_names: &[&str]) -> Release {
        Release {
            tag_name: tag.to_string(),
            assets: asset_names
                .iter()
                .map(|name| Asset {
                    name: (*name).to_string(),
                    url: Url::parse(&format!("https://example.com/{tag}/{name}")).unwrap(),
                })
                .collect(),
        }
    }

    fn releases(tags: &[&str]) -> Vec<Release> {
        tags.iter().map(|t| release(t, &["soljson.js"])).collect()
    }

    #[rstest]
    #[case::exact_only(&["2.3.0"], "2.3.0", MatchKind::Exact)]
    #[case::exact_beats_latest(&["latest", "2.3.0"], "2.3.0", MatchKind::Exact)]
    #[case::exact_beats_first(&["2.4.0", "2.2.0", "2.3.0"], "2.3.0", MatchKind::Exact)]
    #[case::latest_when_no_exact(&["2.4.0", "latest", "2.2.0"], "latest", MatchKind::Latest)]
    #[case::first_when_no_exact_or_latest(&["2.4.0", "2.2.0"], "2.4.0", MatchKind::First)]
    #[case::first_is_list_order_not_version_order(&["1.0.0", "9.9.9"], "1.0.0", MatchKind::First)]
    #[case::tags_compare_verbatim(&["v2.3.0", "2.3.0-rc1"], "v2.3.0", MatchKind::First)]
    fn pick_release(
        #[case] tags: &[&str],
        #[case] expect_tag: &str,
        #[case] expect_kind: MatchKind,
    ) -> Result<()> {
        let wanted: LocalVersion = "2.3.0".parse()?;
        let selector = VersionSelector::new(&wanted, "soljson.js");
        let list = releases(tags);

        let selection = selector.pick_release(&list)?;
        assert_eq!(selection.release.tag_name, expect_tag);
        assert_eq!(selection.kind, expect_kind);

        Ok(())
    }

    #[test]
    fn empty_release_list_is_an_error() -> Result<()> {
        let wanted: LocalVersion = "2.3.0".parse()?;
        let selector = VersionSelector::new(&wanted, "soljson.js");

        assert!(matches!(
            selector.pick_release(&[]),
            Err(FetchError::NoReleases)
        ));

        Ok(())
    }

    #[test]
    fn pick_asset_by_exact_name() -> Result<()> {
        let wanted: LocalVersion = "2.3.0".parse()?;
        let selector = VersionSelector::new(&wanted, "soljson.js");
        let r = release("2.3.0", &["soljson.js.map", "soljson.js", "SOLJSON.JS"]);

        let asset = selector.pick_asset(&r)?;
        assert_eq!(asset.name, "soljson.js");
        assert_eq!(asset.url.as_str(), "https://example.com/2.3.0/soljson.js");

        Ok(())
    }

    #[rstest]
    #[case::no_assets(&[])]
    #[case::only_similar_names(&["soljson.min.js", "Soljson.js", "soljson.js.gz"])]
    fn missing_asset_is_an_error(#[case] asset_names: &[&str]) -> Result<()> {
        let wanted: LocalVersion = "2.3.0".parse()?;
        let selector = VersionSelector::new(&wanted, "soljson.js");
        let r = release("2.3.0", asset_names);

        match selector.pick_asset(&r) {
            Err(FetchError::AssetNotFound { tag, name }) => {
                assert_eq!(tag, "2.3.0");
                assert_eq!(name, "soljson.js");
            }
            other => panic!("expected an AssetNotFound error, got {other:?}"),
        }

        Ok(())
    }

    #[test]
    fn match_kind_display() {
        assert_eq!(MatchKind::Exact.to_string(), "exact match");
        assert_eq!(MatchKind::Latest.as_ref(), "`latest` tag");
        assert_eq!(MatchKind::First.to_string(), "first listed release");
    }
}
