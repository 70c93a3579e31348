//! A library for downloading the `soljson.js` release asset that matches a package's version.
//!
//! This is meant to run as part of a package's pre-publish step. It lists the releases of an
//! upstream project on GitHub (by default `vitelabs/soliditypp`), picks the release matching the
//! version in the local `package.json`, and downloads that release's `soljson.js` asset into the
//! current directory.
//!
//! This project also ships a CLI tool named `soljson-fetch`.
//!
//! The main entry point for programmatic use is the [`FetcherBuilder`] struct. Here is an example
//! of its usage:
//!
//! ```ignore
//! use soljson_fetch::FetcherBuilder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let fetcher = FetcherBuilder::new()
//!         .package_manifest("./package.json")
//!         .target("./soljson.js")
//!         .build()?;
//!
//!     fetcher.fetch().await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## How the Release Is Picked
//!
//! The release list is fetched once and searched in the order the API returned it:
//!
//! - A release whose tag is exactly the local version (`2.3.0`, not `v2.3.0`) wins.
//! - Otherwise the release tagged `latest` is used.
//! - Otherwise the first release in the list is used. GitHub usually lists the newest release
//!   first, but this is not guaranteed.
//!
//! Either fallback is logged as a warning. The chosen release must have an asset named exactly
//! `soljson.js`, or nothing is downloaded and the existing file, if any, is left alone.
//!
//! ## Downloading
//!
//! Any existing target file is deleted before the download starts. Redirects are followed up to a
//! fixed number of hops (10 by default), and the body of the final response is streamed to the
//! target file.
//!
//! ## Features
//!
//! This crate offers several features to control the TLS dependency used by `reqwest`:
//!
#![doc = document_features::document_features!()]

mod builder;
mod downloader;
mod error;
mod fetcher;
mod lister;
mod release;
mod selector;
mod version;

pub use crate::{builder::FetcherBuilder, error::FetchError, fetcher::Fetcher};

/// The version of the `soljson-fetch` crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(feature = "logging")]
use fern::{
    colors::{Color, ColoredLevelConfig},
    Dispatch,
};

/// This function initializes logging for the application. It's public for the sake of the
/// `soljson-fetch` binary, but it lives in the library crate so that test code can also enable
/// logging.
///
/// Progress messages are logged at `info`, version fallbacks at `warn`, and failures at `error`.
///
/// # Errors
///
/// This can return a `log::SetLoggerError` error.
#[cfg(feature = "logging")]
pub fn init_logger(level: log::LevelFilter) -> Result<(), log::SetLoggerError> {
    let line_colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::White)
        .debug(Color::BrightBlack)
        .trace(Color::BrightBlack);

    Dispatch::new()
        .format(move |out, message, record| {
            // Progress lines are printed bare.
            if record.level() == log::Level::Info {
                out.finish(format_args!(
                    "\x1B[{}m{message}\x1B[0m",
                    line_colors.get_color(&record.level()).to_fg_str(),
                ));
            } else {
                out.finish(format_args!(
                    "\x1B[{}m[{}][{}] {message}\x1B[0m",
                    line_colors.get_color(&record.level()).to_fg_str(),
                    record.target(),
                    record.level(),
                ));
            }
        })
        .level(level)
        // These are very noisy.
        .level_for("hyper", log::LevelFilter::Error)
        .level_for("hyper_util", log::LevelFilter::Error)
        .level_for("reqwest", log::LevelFilter::Warn)
        .chain(std::io::stderr())
        .apply()
}
