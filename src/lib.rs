//! Quarterly broadcast calendar
//!
//! Maps instants to a (year, season, week) identity under two weekly
//! conventions and back again. Each nominal year has four 13-week seasons
//! anchored on the last Friday of December (previous year), March, June and
//! September. The episode convention runs Friday to Thursday from that
//! anchor; the post convention runs from Sunday 03:00 America/New_York.
//!
//! Generated windows are cached in SQLite so a year is computed once and
//! shared between processes.
//!
//! # Examples
//!
//! ```rust,no_run
//! use chrono::{TimeZone, Utc};
//! use season_calendar::{AppError, Convention, Resolver, WindowStore};
//!
//! fn main() -> Result<(), AppError> {
//!     let store = WindowStore::open("/tmp/schedules.sqlite", 5000)?;
//!     let resolver = Resolver::with_system_clock(store);
//!
//!     let instant = Utc.with_ymd_and_hms(2025, 6, 27, 14, 0, 0).unwrap();
//!     let identity = resolver.resolve(instant, Convention::Episode)?;
//!     println!("{} {} week {}", identity.year, identity.season_name(), identity.week);
//!     println!("{}", identity.airing_period());
//!
//!     let window = resolver.window_for(2025, 3, 1, Convention::Post)?;
//!     println!("{} .. {}", window.start, window.end);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod schedule;
pub mod testing_utils;

// Re-export commonly used types for convenience
pub use config::Config;
pub use error::AppError;
pub use schedule::{
    CacheInfo, CacheStats, Clock, Convention, FixedClock, Resolver, ScheduleIdentity,
    ScheduleWindow, Season, SystemClock, WindowStore, format_airing_period,
    format_period_or_unavailable,
};

/// Current version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
