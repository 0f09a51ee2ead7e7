use std::path::{Path, PathBuf};

use clap::{value_parser, Arg, ArgAction, ArgMatches, ColorChoice, Command};
use gnss_metadata::prelude::Config;

use crate::Error;

pub struct Cli {
    /// Arguments passed by user
    pub matches: ArgMatches,
}

impl Default for Cli {
    fn default() -> Self {
        Self::new()
    }
}

fn file_arg() -> Arg {
    Arg::new("filepath")
        .value_name("FILE")
        .value_parser(value_parser!(PathBuf))
        .num_args(1..)
        .required(true)
        .help("RINEX observation file(s), plain or .gz. Every file is processed, even if a previous one failed.")
}

impl Cli {
    /// Build new command line interface
    pub fn new() -> Self {
        Self {
            matches: Self::command().get_matches(),
        }
    }
    /// Command line definition
    pub fn command() -> Command {
        Command::new("gnss-metadata")
            .author("Benedikt G. Ofeigsson <bgo@vedur.is>")
            .version(env!("CARGO_PKG_VERSION"))
            .about("GNSS station metadata toolkit")
            .long_about("gnss-metadata cross checks the header of RINEX observation files
against the station registry, and corrects mismatched fields in place.

Exit codes:
0: header matches the registry
1: discrepancies found
2: fatal error (invalid header, inconsistent registry, I/O)")
            .arg_required_else_help(true)
            .subcommand_required(true)
            .color(ColorChoice::Always)
            .next_help_heading("Registry")
            .arg(
                Arg::new("registry")
                    .short('r')
                    .long("registry")
                    .value_name("FILE")
                    .value_parser(value_parser!(PathBuf))
                    .required(true)
                    .help("Station registry (JSON document). See --help for more information.")
                    .long_help("Station registry, as a JSON document:
{
  \"stations\": [
    {
      \"marker\": \"REYK\",
      \"domes\": \"10202M006\",
      \"position\": { \"lat\": 64.138778, \"lon\": -21.955468, \"altitude\": 93.0 },
      \"operator\": { \"observer\": \"IMO\", \"agency\": \"Icelandic Met Office\" },
      \"equipment\": [
        {
          \"device_kind\": \"antenna\",
          \"serial_number\": \"A1\",
          \"attribute_name\": \"model\",
          \"attribute_value\": \"TRM29659.00\",
          \"valid_from\": \"2000-01-01T00:00:00Z\",
          \"valid_to\": \"2010-06-15T00:00:00Z\"
        }
      ]
    }
  ]
}"),
            )
            .arg(
                Arg::new("station")
                    .short('s')
                    .long("station")
                    .value_name("ID")
                    .required(true)
                    .help("Station identifier (marker)"),
            )
            .next_help_heading("Settings")
            .arg(
                Arg::new("cfg")
                    .short('c')
                    .long("cfg")
                    .value_name("FILE")
                    .value_parser(value_parser!(PathBuf))
                    .global(true)
                    .help("Custom configuration (JSON). See --help for more information.")
                    .long_help("Omitted fields use their default value:
{
  \"offset_tolerance\": 0.0001,
  \"position_tolerance\": 60.0,
  \"required_devices\": [\"receiver\", \"antenna\"],
  \"backup_suffix\": \".backup\"
}"),
            )
            .arg(
                Arg::new("offset-tolerance")
                    .long("offset-tolerance")
                    .value_name("METERS")
                    .value_parser(value_parser!(f64))
                    .global(true)
                    .help("Antenna offsets (H/E/N) tolerance. Overrides the configuration."),
            )
            .arg(
                Arg::new("position-tolerance")
                    .long("position-tolerance")
                    .value_name("METERS")
                    .value_parser(value_parser!(f64))
                    .global(true)
                    .help("APPROX POSITION XYZ tolerance. Overrides the configuration."),
            )
            .arg(
                Arg::new("json")
                    .short('j')
                    .long("json")
                    .action(ArgAction::SetTrue)
                    .global(true)
                    .help("Report in JSON format, rather than text"),
            )
            .subcommand(
                Command::new("validate")
                    .about("Compare the header against the station timeline")
                    .arg(file_arg()),
            )
            .subcommand(
                Command::new("correct")
                    .about("Validate, then rewrite mismatched header fields in place")
                    .arg(file_arg())
                    .arg(
                        Arg::new("no-backup")
                            .long("no-backup")
                            .action(ArgAction::SetTrue)
                            .help("Do not keep a copy of the original file"),
                    ),
            )
            .subcommand(
                Command::new("sessions")
                    .about("Print the equipment sessions reconstructed from the registry"),
            )
    }
    /// Registry document
    pub fn registry_path(&self) -> &Path {
        self.matches
            .get_one::<PathBuf>("registry")
            .map(|p| p.as_path())
            .unwrap_or(Path::new("stations.json"))
    }
    /// Station identifier
    pub fn station(&self) -> &str {
        self.matches
            .get_one::<String>("station")
            .map(|s| s.as_str())
            .unwrap_or_default()
    }
    /*
     * Global options may be passed after the subcommand
     */
    fn global_matches(&self) -> &ArgMatches {
        match self.matches.subcommand() {
            Some((_, submatches)) => submatches,
            None => &self.matches,
        }
    }
    /// JSON output
    pub fn json(&self) -> bool {
        self.global_matches().get_flag("json")
    }
    /// Files to process
    pub fn files(&self) -> Vec<PathBuf> {
        // "sessions" does not define any file
        self.global_matches()
            .try_get_many::<PathBuf>("filepath")
            .ok()
            .flatten()
            .map(|files| files.cloned().collect())
            .unwrap_or_default()
    }
    /// Configuration, either custom or default, then command line overrides
    pub fn config(&self) -> Result<Config, Error> {
        let matches = self.global_matches();
        let mut cfg = match matches.get_one::<PathBuf>("cfg") {
            Some(path) => {
                let content = std::fs::read_to_string(path)?;
                let cfg: Config = serde_json::from_str(&content)?;
                info!("using custom configuration \"{}\"", path.display());
                cfg
            },
            None => Config::default(),
        };
        if let Some(tolerance) = matches.get_one::<f64>("offset-tolerance") {
            cfg = cfg.with_offset_tolerance(*tolerance);
        }
        if let Some(tolerance) = matches.get_one::<f64>("position-tolerance") {
            cfg = cfg.with_position_tolerance(*tolerance);
        }
        Ok(cfg)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn command_definition() {
        Cli::command().debug_assert();
    }
    #[test]
    fn correct_subcommand() {
        let matches = Cli::command()
            .try_get_matches_from([
                "gnss-metadata",
                "--registry",
                "stations.json",
                "--station",
                "REYK",
                "correct",
                "--no-backup",
                "REYK0010.12o",
                "REYK0020.12o",
            ])
            .unwrap();
        let cli = Cli { matches };
        assert_eq!(cli.station(), "REYK");
        assert_eq!(cli.registry_path(), Path::new("stations.json"));
        assert!(!cli.json());
        assert!(cli.config().unwrap().backup_suffix.eq(".backup"));
        let (name, sub) = cli.matches.subcommand().unwrap();
        assert_eq!(name, "correct");
        assert!(sub.get_flag("no-backup"));
        assert_eq!(
            cli.files(),
            vec![PathBuf::from("REYK0010.12o"), PathBuf::from("REYK0020.12o")]
        );
    }
    #[test]
    fn global_options() {
        let matches = Cli::command()
            .try_get_matches_from([
                "gnss-metadata",
                "-r",
                "stations.json",
                "-s",
                "REYK",
                "sessions",
                "--json",
                "--offset-tolerance",
                "0.001",
            ])
            .unwrap();
        let cli = Cli { matches };
        assert!(cli.json());
        assert!(cli.files().is_empty());
        let cfg = cli.config().unwrap();
        assert_eq!(cfg.offset_tolerance, 0.001);
        assert_eq!(cfg.position_tolerance, 60.0);
    }
    #[test]
    fn missing_station() {
        let matches = Cli::command().try_get_matches_from([
            "gnss-metadata",
            "--registry",
            "stations.json",
            "sessions",
        ]);
        assert!(matches.is_err());
    }
}
