use anyhow::{Error, Result};
use clap::{value_parser, Arg, ArgAction, ArgGroup, ArgMatches, Command};
use log::error;
use soljson_fetch::{Fetcher, FetcherBuilder};
use thiserror::Error;

#[derive(Debug, Error)]
enum CliError {
    #[error("{0:}")]
    InvalidArgsError(String),
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cmd = cmd();
    let matches = cmd.get_matches();
    let res = init_logger_from_matches(&matches);
    if let Err(e) = res {
        eprintln!("Error creating logger: {e}");
        std::process::exit(126);
    }

    let status = match make_fetcher(&matches) {
        Ok(f) => match f.fetch().await {
            Ok(_) => 0,
            Err(e) => {
                print_err(&e);
                1
            }
        },
        Err(e) => {
            print_err(&e);
            127
        }
    };
    std::process::exit(status);
}

const MAX_TERM_WIDTH: usize = 100;

fn cmd() -> Command {
    Command::new("soljson-fetch")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Downloads the soljson.js release asset matching this package's version")
        .arg(Arg::new("project").long("project").short('p').help(concat!(
            "The project whose releases are listed, like vitelabs/soliditypp or",
            " https://github.com/vitelabs/soliditypp. Defaults to vitelabs/soliditypp.",
        )))
        .arg(Arg::new("api-base-url").long("api-base-url").help(concat!(
            "The base URL for the GitHub API. This is useful for testing or if you want to",
            " operate against GitHub Enterprise. Defaults to https://api.github.com.",
        )))
        .arg(
            Arg::new("package")
                .long("package")
                .help("The package.json file to read the version from. Defaults to ./package.json."),
        )
        .arg(
            Arg::new("wanted-version")
                .long("wanted-version")
                .short('w')
                .help(concat!(
                    "The version to look for instead of the one in package.json. This must look",
                    " like major.minor.patch.",
                )),
        )
        .arg(
            Arg::new("asset")
                .long("asset")
                .short('a')
                .help("The name of the release asset to download. Defaults to soljson.js."),
        )
        .arg(Arg::new("output").long("output").short('o').help(concat!(
            "The file to write the asset to. Any existing file at this path is deleted first.",
            " Defaults to the asset name in the current directory.",
        )))
        .arg(
            Arg::new("max-redirects")
                .long("max-redirects")
                .value_parser(value_parser!(usize))
                .help("The number of redirects to follow when downloading. Defaults to 10."),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Enable verbose output."),
        )
        .arg(
            Arg::new("debug")
                .short('d')
                .long("debug")
                .action(ArgAction::SetTrue)
                .help("Enable debugging output."),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .action(ArgAction::SetTrue)
                .help("Suppresses most output."),
        )
        .group(ArgGroup::new("log-level").args(["verbose", "debug", "quiet"]))
        .max_term_width(MAX_TERM_WIDTH)
}

pub(crate) fn init_logger_from_matches(matches: &ArgMatches) -> Result<(), log::SetLoggerError> {
    soljson_fetch::init_logger(log_level(matches))
}

fn log_level(matches: &ArgMatches) -> log::LevelFilter {
    if matches.get_flag("debug") {
        log::LevelFilter::Trace
    } else if matches.get_flag("verbose") {
        log::LevelFilter::Debug
    } else if matches.get_flag("quiet") {
        log::LevelFilter::Error
    } else {
        log::LevelFilter::Info
    }
}

fn make_fetcher(matches: &ArgMatches) -> Result<Fetcher> {
    validate_args(matches)?;

    let mut builder = FetcherBuilder::new();
    if let Some(p) = matches.get_one::<String>("project") {
        builder = builder.project(p);
    }
    if let Some(url) = matches.get_one::<String>("api-base-url") {
        builder = builder.api_base_url(url);
    }
    if let Some(p) = matches.get_one::<String>("package") {
        builder = builder.package_manifest(p);
    }
    if let Some(v) = matches.get_one::<String>("wanted-version") {
        builder = builder.version(v);
    }
    if let Some(a) = matches.get_one::<String>("asset") {
        builder = builder.asset_name(a);
    }
    if let Some(o) = matches.get_one::<String>("output") {
        builder = builder.target(o);
    }
    if let Some(m) = matches.get_one::<usize>("max-redirects") {
        builder = builder.max_redirects(*m);
    }

    builder.build()
}

fn validate_args(matches: &ArgMatches) -> Result<()> {
    if matches.contains_id("package") && matches.contains_id("wanted-version") {
        return Err(CliError::InvalidArgsError(
            "You cannot combine the --package and --wanted-version options".to_string(),
        )
        .into());
    }

    for a in ["asset", "output"] {
        if matches
            .get_one::<String>(a)
            .is_some_and(|v| v.trim().is_empty())
        {
            return Err(CliError::InvalidArgsError(format!("--{a} cannot be empty")).into());
        }
    }

    Ok(())
}

fn print_err(e: &Error) {
    error!("{e:#}");
    if let Some(ce) = e.downcast_ref::<CliError>() {
        match ce {
            CliError::InvalidArgsError(_) => {
                println!();
                if let Err(e) = cmd().print_help() {
                    eprintln!("Error printing help: {e}");
                }
            }
        }
    }
}
