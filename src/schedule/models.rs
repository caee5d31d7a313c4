//! Calendar data model: conventions, seasons and weekly windows

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::{SEASONS_PER_YEAR, WEEKS_PER_SEASON};
use crate::error::AppError;

/// Weekly attribution convention.
///
/// `Episode` buckets broadcast weeks at day granularity (Friday anchored).
/// `Post` buckets ranking posts at second granularity, cut at Sunday 03:00
/// America/New_York.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Convention {
    #[serde(rename = "episodes")]
    Episode,
    Post,
}

impl Convention {
    pub const ALL: [Convention; 2] = [Convention::Episode, Convention::Post];

    /// Stable name used in storage and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            Convention::Episode => "episodes",
            Convention::Post => "post",
        }
    }

    /// Smallest distinguishable step between two windows of this convention.
    /// Consecutive windows satisfy `end + tick == next.start`.
    pub fn tick(&self) -> Duration {
        match self {
            Convention::Episode => Duration::microseconds(1),
            Convention::Post => Duration::seconds(1),
        }
    }
}

impl fmt::Display for Convention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Convention {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "episode" | "episodes" => Ok(Convention::Episode),
            "post" | "posts" => Ok(Convention::Post),
            _ => Err(AppError::invalid_convention(s)),
        }
    }
}

/// Quarter of a nominal year. Winter starts in December of the previous
/// calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Winter = 1,
    Spring = 2,
    Summer = 3,
    Fall = 4,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Winter, Season::Spring, Season::Summer, Season::Fall];

    pub fn index(&self) -> u8 {
        *self as u8
    }

    pub fn from_index(index: u8) -> Option<Season> {
        match index {
            1 => Some(Season::Winter),
            2 => Some(Season::Spring),
            3 => Some(Season::Summer),
            4 => Some(Season::Fall),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Season::Winter => "winter",
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Fall => "fall",
        }
    }

    /// Calendar (year, month) whose last Friday opens this season of
    /// `schedule_year`. `None` when winter's previous year is not an `i32`.
    pub fn anchor_month(&self, schedule_year: i32) -> Option<(i32, u32)> {
        match self {
            Season::Winter => schedule_year.checked_sub(1).map(|year| (year, 12)),
            Season::Spring => Some((schedule_year, 3)),
            Season::Summer => Some((schedule_year, 6)),
            Season::Fall => Some((schedule_year, 9)),
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Validates a raw (season, week) pair from a caller
pub fn validate_season_week(season: i64, week: i64) -> Result<(Season, u8), AppError> {
    let season_ok = (1..=i64::from(SEASONS_PER_YEAR)).contains(&season);
    let week_ok = (1..=i64::from(WEEKS_PER_SEASON)).contains(&week);
    if !season_ok || !week_ok {
        return Err(AppError::invalid_week_or_season(season, week));
    }
    // Both values fit in u8 after the range check
    let season = Season::from_index(season as u8)
        .ok_or_else(|| AppError::invalid_week_or_season(season, week))?;
    Ok((season, week as u8))
}

/// One (season, week) bucket of a nominal year under one convention.
/// Both `start` and `end` are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScheduleWindow {
    pub year: i32,
    pub convention: Convention,
    pub season: Season,
    pub week: u8,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ScheduleWindow {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }

    /// Elapsed UTC time from start to end
    pub fn span(&self) -> Duration {
        self.end - self.start
    }
}

/// Result of resolving an instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScheduleIdentity {
    pub year: i32,
    pub season: Season,
    pub week: u8,
    pub window: ScheduleWindow,
}

impl ScheduleIdentity {
    pub fn from_window(window: ScheduleWindow) -> Self {
        Self {
            year: window.year,
            season: window.season,
            week: window.week,
            window,
        }
    }

    pub fn season_name(&self) -> &'static str {
        self.season.name()
    }

    pub fn airing_period(&self) -> String {
        super::formatting::format_airing_period(&self.window)
    }
}
