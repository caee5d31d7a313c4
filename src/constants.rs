//! Application-wide constants and configuration values
//!
//! Calendar shape, cutoff rules and storage defaults live here so the
//! generator, store and CLI agree on them.

/// Number of seasons in one nominal year
pub const SEASONS_PER_YEAR: u8 = 4;

/// Number of weeks in every season
pub const WEEKS_PER_SEASON: u8 = 13;

/// Windows generated for one (year, convention)
pub const WINDOWS_PER_YEAR: usize = (SEASONS_PER_YEAR as usize) * (WEEKS_PER_SEASON as usize);

/// Episode convention anchoring
pub mod episode {
    use chrono::Weekday;

    /// Seasons start on the last occurrence of this weekday in the anchor month
    pub const ANCHOR_WEEKDAY: Weekday = Weekday::Fri;
}

/// Post convention anchoring
pub mod post {
    use chrono_tz::Tz;

    /// Time zone in which the weekly ranking cutoff is defined
    pub const CUTOFF_TIME_ZONE: Tz = chrono_tz::America::New_York;

    /// Local wall-clock hour of the cutoff
    pub const CUTOFF_HOUR: u32 = 3;

    /// First cutoff is this many days after the episode anchor (Friday -> Sunday)
    pub const DAYS_AFTER_EPISODE_ANCHOR: i64 = 2;
}

/// Storage defaults
pub mod storage {
    /// SQLite file name used when no database path is configured
    pub const DEFAULT_DATABASE_FILE: &str = "schedules.sqlite";

    /// Default time a writer waits on a locked database, in milliseconds
    pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;
}

/// Application directory and file names
pub const APP_DIR_NAME: &str = "season_calendar";

pub const CONFIG_FILE_NAME: &str = "config.toml";

pub const LOG_FILE_NAME: &str = "season_calendar.log";

/// Default tracing directive when RUST_LOG is not set
pub const DEFAULT_LOG_DIRECTIVE: &str = "season_calendar=info";

/// Environment variable names
pub mod env_vars {
    /// Override database path
    pub const DATABASE: &str = "SEASON_CALENDAR_DATABASE";

    /// Override log file path
    pub const LOG_FILE: &str = "SEASON_CALENDAR_LOG_FILE";

    /// Override busy timeout in milliseconds
    pub const BUSY_TIMEOUT_MS: &str = "SEASON_CALENDAR_BUSY_TIMEOUT_MS";
}
