//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{ArgGroup, Parser, Subcommand};

use spacefetch_core::endpoint::epic::EpicCollection;
use spacefetch_core::endpoint::parse_date;
use spacefetch_core::output::OutputFormat;

/// Query public space-agency data APIs.
///
/// Each command fetches one endpoint, prints its records as a table, JSON or
/// CSV, and can save the referenced images.
#[derive(Parser, Debug)]
#[command(name = "spacefetch")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// API key (overrides SPACEFETCH_API_KEY and the config file)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Output format for records
    #[arg(long, global = true, default_value = "table")]
    pub format: OutputFormat,

    /// Root folder for saved images (defaults to config, then current directory)
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Astronomy picture of the day
    #[command(group(ArgGroup::new("selection").required(true).args(["start", "count"])))]
    Apod {
        /// First date (YYYY-MM-DD)
        #[arg(long, value_parser = cli_date)]
        start: Option<NaiveDate>,

        /// Last date, inclusive (defaults to --start)
        #[arg(long, value_parser = cli_date, requires = "start")]
        end: Option<NaiveDate>,

        /// Number of random pictures (1-100)
        #[arg(long, conflicts_with_all = ["start", "end"])]
        count: Option<u32>,

        /// Save images into this folder under the output directory
        #[arg(long, value_name = "FOLDER")]
        save: Option<PathBuf>,
    },

    /// Mars rover photos
    #[command(group(ArgGroup::new("day").required(true).args(["earth_date", "sol"])))]
    Mars {
        /// Rover name: curiosity, opportunity, spirit or perseverance
        #[arg(long)]
        rover: String,

        /// Earth date of the photos (YYYY-MM-DD)
        #[arg(long, value_parser = cli_date)]
        earth_date: Option<NaiveDate>,

        /// Martian sol of the photos
        #[arg(long)]
        sol: Option<u32>,

        /// Camera abbreviation (e.g. FHAZ, NAVCAM)
        #[arg(long)]
        camera: Option<String>,

        /// Save images into this folder under the output directory
        #[arg(long, value_name = "FOLDER")]
        save: Option<PathBuf>,
    },

    /// EPIC Earth imagery
    Epic {
        /// Capture date (YYYY-MM-DD)
        #[arg(long, value_parser = cli_date)]
        date: NaiveDate,

        /// Image collection: natural or enhanced
        #[arg(long, default_value = "natural")]
        collection: EpicCollection,

        /// Save images into this folder under the output directory
        #[arg(long, value_name = "FOLDER")]
        save: Option<PathBuf>,
    },

    /// Near-Earth object close approaches (at most 7 days)
    Neo {
        /// First date (YYYY-MM-DD)
        #[arg(long, value_parser = cli_date)]
        start: NaiveDate,

        /// Last date, inclusive (defaults to --start)
        #[arg(long, value_parser = cli_date)]
        end: Option<NaiveDate>,
    },

    /// Dataset collection search
    Search {
        /// Search keyword
        #[arg(long)]
        keyword: String,

        /// Maximum number of results
        #[arg(long, default_value_t = 10)]
        count: usize,

        /// Temporal filter start (YYYY-MM-DD, requires --end)
        #[arg(long, value_parser = cli_date)]
        start: Option<NaiveDate>,

        /// Temporal filter end (YYYY-MM-DD, requires --start)
        #[arg(long, value_parser = cli_date)]
        end: Option<NaiveDate>,
    },
}

fn cli_date(value: &str) -> Result<NaiveDate, String> {
    parse_date("date", value).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_apod_range_parses() {
        let args =
            Args::try_parse_from(["spacefetch", "apod", "--start", "2024-04-01", "--end", "2024-04-03"])
                .unwrap();
        assert_eq!(args.format, OutputFormat::Table);
        match args.command {
            Command::Apod { start, end, count, save } => {
                assert_eq!(start, NaiveDate::from_ymd_opt(2024, 4, 1));
                assert_eq!(end, NaiveDate::from_ymd_opt(2024, 4, 3));
                assert!(count.is_none());
                assert!(save.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_apod_requires_start_or_count_but_not_both() {
        assert!(Args::try_parse_from(["spacefetch", "apod"]).is_err());
        assert!(
            Args::try_parse_from(["spacefetch", "apod", "--start", "2024-04-01", "--count", "3"])
                .is_err()
        );
        assert!(Args::try_parse_from(["spacefetch", "apod", "--count", "3"]).is_ok());
    }

    #[test]
    fn test_cli_rejects_bad_date() {
        let err = Args::try_parse_from(["spacefetch", "neo", "--start", "04/01/2024"]).unwrap_err();
        assert!(err.to_string().contains("YYYY-MM-DD"));
    }

    #[test]
    fn test_cli_mars_requires_one_day_selector() {
        assert!(Args::try_parse_from(["spacefetch", "mars", "--rover", "spirit"]).is_err());
        assert!(
            Args::try_parse_from([
                "spacefetch", "mars", "--rover", "spirit", "--sol", "1", "--earth-date", "2004-01-05"
            ])
            .is_err()
        );
        let args =
            Args::try_parse_from(["spacefetch", "mars", "--rover", "Spirit", "--sol", "1"]).unwrap();
        // Rover names are checked by the library, not by clap.
        assert!(matches!(args.command, Command::Mars { ref rover, .. } if rover == "Spirit"));
    }

    #[test]
    fn test_cli_epic_collection_default_and_parse() {
        let args = Args::try_parse_from(["spacefetch", "epic", "--date", "2024-04-01"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Epic { collection: EpicCollection::Natural, .. }
        ));
        assert!(
            Args::try_parse_from([
                "spacefetch", "epic", "--date", "2024-04-01", "--collection", "infrared"
            ])
            .is_err()
        );
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let args = Args::try_parse_from([
            "spacefetch", "search", "--keyword", "sea ice", "--format", "csv", "-vv", "--api-key", "k",
        ])
        .unwrap();
        assert_eq!(args.format, OutputFormat::Csv);
        assert_eq!(args.verbose, 2);
        assert_eq!(args.api_key.as_deref(), Some("k"));
        assert!(matches!(args.command, Command::Search { count: 10, .. }));
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Args::try_parse_from(["spacefetch", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_version_flag_shows_version() {
        let err = Args::try_parse_from(["spacefetch", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }
}
