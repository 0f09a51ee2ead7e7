//! Command line tool to validate and correct RINEX observation headers
//! against the GNSS station registry.
//! Use --help for command line arguments.

mod batch; // multi file processing
mod cli; // command line interface
mod registry; // JSON registry
mod report; // renditions

use batch::{Mode, Status};
use cli::Cli;
use registry::JsonRegistry;

use gnss_metadata::timeline;

use env_logger::{Builder, Target};

#[macro_use]
extern crate log;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("i/o error: {0}")]
    StdioError(#[from] std::io::Error),
    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error(transparent)]
    MetadataError(#[from] gnss_metadata::Error),
}

fn run(cli: &Cli) -> Result<Status, Error> {
    let cfg = cli.config()?;
    let station = cli.station();
    let registry = JsonRegistry::from_path(cli.registry_path())?;

    let mode = match cli.matches.subcommand() {
        Some(("validate", _)) => Mode::Validate,
        Some(("correct", submatches)) => Mode::Correct {
            backup: !submatches.get_flag("no-backup"),
        },
        Some(("sessions", _)) => {
            let timeline = timeline(&registry, station)?;
            if cli.json() {
                println!("{}", report::timeline_json(station, &timeline, &cfg)?);
            } else {
                print!("{}", report::timeline(station, &timeline, &cfg));
            }
            return Ok(Status::Valid);
        },
        _ => return Ok(Status::Fatal),
    };

    let outcomes = batch::run(&registry, station, &cli.files(), &cfg, mode);
    if cli.json() {
        println!("{}", report::batch_json(&outcomes)?);
    } else {
        print!("{}", report::batch(&outcomes));
    }
    Ok(batch::status(&outcomes))
}

pub fn main() {
    let mut builder = Builder::from_default_env();
    builder
        .target(Target::Stdout)
        .format_timestamp_secs()
        .format_module_path(false)
        .init();

    let cli = Cli::new();
    let status = match run(&cli) {
        Ok(status) => status,
        Err(e) => {
            error!("{}", e);
            eprintln!("{}", e);
            Status::Fatal
        },
    };
    std::process::exit(status as i32);
}
