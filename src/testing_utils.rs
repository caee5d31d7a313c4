use crate::error::AppError;
use crate::schedule::{Convention, FixedClock, Resolver, Season, WindowStore};
use chrono::{DateTime, TimeZone, Utc};
use std::path::{Path, PathBuf};

/// Builds a UTC instant from calendar parts.
///
/// # Panics
/// Panics on an impossible date, which is always a typo in a test.
pub fn utc(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, second)
        .single()
        .unwrap_or_else(|| panic!("invalid test instant {year}-{month}-{day} {hour}:{minute}:{second}"))
}

/// Builds a resolver on a throwaway database with a pinned clock
pub struct TestResolverBuilder {
    database_path: PathBuf,
    now: DateTime<Utc>,
    busy_timeout_ms: u64,
}

impl TestResolverBuilder {
    pub fn new(database_path: impl AsRef<Path>) -> Self {
        Self {
            database_path: database_path.as_ref().to_path_buf(),
            now: utc(2025, 6, 27, 14, 0, 0),
            busy_timeout_ms: 2000,
        }
    }

    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn busy_timeout_ms(mut self, busy_timeout_ms: u64) -> Self {
        self.busy_timeout_ms = busy_timeout_ms;
        self
    }

    pub fn build(self) -> Result<Resolver<FixedClock>, AppError> {
        let store = WindowStore::open(&self.database_path, self.busy_timeout_ms)?;
        Ok(Resolver::new(store, FixedClock(self.now)))
    }
}

/// A known instant and the identity it must resolve to
#[derive(Debug, Clone, Copy)]
pub struct KnownResolution {
    pub instant: DateTime<Utc>,
    pub convention: Convention,
    pub year: i32,
    pub season: Season,
    pub week: u8,
}

/// Resolutions around the 2025 spring/summer boundary and the 2025/2026 rollover
pub fn known_resolutions() -> Vec<KnownResolution> {
    let case = |instant, convention, year, season, week| KnownResolution {
        instant,
        convention,
        year,
        season,
        week,
    };
    vec![
        case(utc(2025, 6, 26, 14, 0, 0), Convention::Episode, 2025, Season::Spring, 13),
        case(utc(2025, 6, 27, 14, 0, 0), Convention::Episode, 2025, Season::Summer, 1),
        case(utc(2025, 6, 27, 14, 0, 0), Convention::Post, 2025, Season::Spring, 13),
        case(utc(2025, 6, 29, 13, 0, 0), Convention::Post, 2025, Season::Summer, 1),
        case(utc(2025, 12, 25, 23, 59, 59), Convention::Episode, 2025, Season::Fall, 13),
        case(utc(2025, 12, 26, 0, 0, 0), Convention::Episode, 2026, Season::Winter, 1),
        case(utc(2024, 12, 27, 0, 0, 0), Convention::Episode, 2025, Season::Winter, 1),
        case(utc(2024, 12, 29, 8, 0, 0), Convention::Post, 2025, Season::Winter, 1),
        case(utc(2024, 12, 29, 7, 59, 59), Convention::Post, 2024, Season::Fall, 13),
    ]
}
