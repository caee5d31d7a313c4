use clap::Parser;
use clap::builder::styling::{AnsiColor, Effects, Styles};

use crate::error::AppError;
use crate::schedule::Convention;

fn get_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
        .usage(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Yellow.on_default())
        .error(AnsiColor::Red.on_default().effects(Effects::BOLD))
        .valid(AnsiColor::Green.on_default())
        .invalid(AnsiColor::Red.on_default())
}

/// Quarterly broadcast calendar
///
/// Resolves an instant to its (year, season, week) under the episode or
/// post convention, looks up the window of a given week, and manages the
/// on-disk schedule cache.
///
/// Without options, resolves the current time under the episode convention.
#[derive(Parser, Debug)]
#[command(about, long_about = None)]
#[command(styles = get_styles())]
pub struct Args {
    /// Instant to resolve, RFC 3339 (e.g. 2025-06-27T14:00:00Z). Defaults to now.
    #[arg(long = "at", short = 'a', help_heading = "Lookup")]
    pub at: Option<String>,

    /// Weekly convention: "episodes" (Friday broadcast weeks) or "post"
    /// (Sunday 03:00 America/New_York ranking cutoffs).
    #[arg(long = "convention", short = 'c', default_value = "episodes", help_heading = "Lookup")]
    pub convention: String,

    /// Nominal year for a reverse lookup (with --season and --week) or for --clear-cache
    #[arg(long = "year", short = 'y', help_heading = "Lookup")]
    pub year: Option<i32>,

    /// Season for a reverse lookup: 1=winter, 2=spring, 3=summer, 4=fall
    #[arg(long = "season", short = 's', allow_negative_numbers = true, help_heading = "Lookup")]
    pub season: Option<i64>,

    /// Week for a reverse lookup (1-13)
    #[arg(long = "week", short = 'w', allow_negative_numbers = true, help_heading = "Lookup")]
    pub week: Option<i64>,

    /// Print all 52 windows of a nominal year
    #[arg(long = "dump-year", value_name = "YEAR", help_heading = "Lookup")]
    pub dump_year: Option<i32>,

    /// Print results as JSON
    #[arg(long = "json", short = 'j', help_heading = "Output")]
    pub json: bool,

    /// Delete cached windows (all years, or only --year)
    #[arg(long = "clear-cache", help_heading = "Cache")]
    pub clear_cache: bool,

    /// Show cached years and store statistics
    #[arg(long = "cache-info", help_heading = "Cache")]
    pub cache_info: bool,

    /// Update the schedule database path in config
    #[arg(long = "set-database-path", value_name = "PATH", help_heading = "Configuration")]
    pub new_database_path: Option<String>,

    /// Update log file path in config. This sets a persistent custom log file location.
    #[arg(long = "set-log-file", value_name = "PATH", help_heading = "Configuration")]
    pub new_log_file_path: Option<String>,

    /// Clear the custom log file path from config. This reverts to using the default log location.
    #[arg(long = "clear-log-file", help_heading = "Configuration")]
    pub clear_log_file_path: bool,

    /// List current configuration settings
    #[arg(long = "list-config", short = 'l', help_heading = "Configuration")]
    pub list_config: bool,

    /// Also write logs to the terminal
    #[arg(long = "debug", help_heading = "Debug")]
    pub debug: bool,

    /// Specify a custom log file path. If not provided, logs will be written to the default location.
    #[arg(long = "log-file", value_name = "PATH", help_heading = "Debug")]
    pub log_file: Option<String>,
}

/// What a single invocation should do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Resolve {
        at: Option<String>,
        convention: Convention,
    },
    WindowFor {
        year: i32,
        season: i64,
        week: i64,
        convention: Convention,
    },
    DumpYear {
        year: i32,
        convention: Convention,
    },
    ClearCache {
        year: Option<i32>,
    },
    CacheInfo,
    ListConfig,
    UpdateConfig,
}

impl Args {
    /// Validates argument combinations and picks the command to run.
    pub fn command(&self) -> Result<Command, AppError> {
        if self.list_config {
            return Ok(Command::ListConfig);
        }
        if self.new_database_path.is_some()
            || self.new_log_file_path.is_some()
            || self.clear_log_file_path
        {
            return Ok(Command::UpdateConfig);
        }
        if self.cache_info {
            return Ok(Command::CacheInfo);
        }
        if self.clear_cache {
            return Ok(Command::ClearCache { year: self.year });
        }

        let convention: Convention = self.convention.parse()?;

        if let Some(year) = self.dump_year {
            return Ok(Command::DumpYear { year, convention });
        }

        match (self.year, self.season, self.week) {
            (Some(year), Some(season), Some(week)) => {
                if self.at.is_some() {
                    return Err(AppError::config_error(
                        "Cannot combine --at with --year/--season/--week",
                    ));
                }
                Ok(Command::WindowFor {
                    year,
                    season,
                    week,
                    convention,
                })
            }
            (None, None, None) => Ok(Command::Resolve {
                at: self.at.clone(),
                convention,
            }),
            _ => Err(AppError::config_error(
                "--year, --season and --week must be given together",
            )),
        }
    }
}
