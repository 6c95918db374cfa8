extern crate chrono;
extern crate env_logger;
extern crate failure;
#[macro_use]
extern crate log;
extern crate repo_cite;
extern crate shellexpand;
extern crate structopt;
#[macro_use]
extern crate structopt_derive;

use std::env;
use std::io::Write;
use std::process;

use chrono::Local;
use env_logger::Builder;
use failure::{Error, ResultExt};
use log::LevelFilter;
use structopt::StructOpt;

use repo_cite::{cite_url, Config, GitHub};

fn main() {
    let args = Args::from_args();

    if args.example_config {
        if let Err(e) = generate_example() {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
        return;
    }

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);

        for cause in e.causes().skip(1) {
            eprintln!("\tCaused By: {}", cause);
        }

        eprintln!("{}", e.backtrace());
        process::exit(1);
    }
}

fn generate_example() -> Result<(), Error> {
    let example = Config::example();

    println!("{}", example.as_toml()?);
    Ok(())
}

fn run(args: &Args) -> Result<(), Error> {
    initialize_logging(args)?;

    let url = match args.url {
        Some(ref url) => url,
        None => {
            eprintln!("Usage: repo-cite <URL> [TOKEN]");
            process::exit(1);
        }
    };

    let cfg = args.config()?;

    if log_enabled!(log::Level::Debug) {
        for line in format!("{:#?}", cfg).lines() {
            debug!("{}", line);
        }
    }

    let provider = GitHub::with_token(args.token(&cfg));
    let today = Local::now().naive_local().date();

    let entry = cite_url(&provider, url, today)?;

    println!("{}", entry);
    Ok(())
}

#[derive(Debug, Clone, PartialEq, StructOpt)]
struct Args {
    #[structopt(help = "The GitHub URL of the file to cite.")]
    url: Option<String>,
    #[structopt(help = "A GitHub API token (defaults to $GITHUB_TOKEN, then the config file).")]
    token: Option<String>,
    #[structopt(short = "c", long = "config", default_value = "~/.repo-cite.toml",
                help = "The configuration file to use.")]
    config_file: String,
    #[structopt(short = "v", long = "verbose",
                help = "Verbose output (repeat for more verbosity)")]
    verbosity: u64,
    #[structopt(long = "example-config",
                help = "Generate an example config and immediately exit.")]
    example_config: bool,
}

impl Args {
    fn config(&self) -> Result<Config, Error> {
        let config_file =
            shellexpand::full(&self.config_file).context("Unable to expand wildcards")?;

        Config::from_file(&*config_file)
            .context("Couldn't load the config")
            .map_err(Into::into)
    }

    /// The token to authenticate with, checking the command line first, then
    /// the `GITHUB_TOKEN` environment variable, then the config file.
    fn token(&self, cfg: &Config) -> Option<String> {
        if let Some(ref token) = self.token {
            return Some(token.clone());
        }

        if let Ok(token) = env::var("GITHUB_TOKEN") {
            return Some(token);
        }

        cfg.github.as_ref().and_then(|gh| gh.token.clone())
    }
}

fn initialize_logging(args: &Args) -> Result<(), Error> {
    let mut builder = Builder::new();

    let level = match args.verbosity {
        0 => None,
        1 => Some(LevelFilter::Info),
        2 => Some(LevelFilter::Debug),
        _ => Some(LevelFilter::Trace),
    };

    if let Some(lvl) = level {
        builder.filter(Some("repo_cite"), lvl);
    }

    if let Ok(filter) = env::var("RUST_LOG") {
        builder.parse(&filter);
    }

    builder.format(|out, record| match record.line() {
        Some(line) => writeln!(
            out,
            "{} [{:5}] ({}#{}): {}",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            record.level(),
            record.target(),
            line,
            record.args()
        ),
        None => writeln!(
            out,
            "{} [{:5}] ({}): {}",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            record.level(),
            record.target(),
            record.args()
        ),
    });

    builder.try_init()?;

    Ok(())
}
