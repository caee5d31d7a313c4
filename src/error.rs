use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::schedule::Convention;

#[derive(Debug, Error)]
pub enum AppError {
    // Caller errors, returned synchronously and never retried
    #[error("Invalid schedule convention: '{value}' (expected 'episodes' or 'post')")]
    InvalidConvention { value: String },

    #[error("Invalid season/week: season={season}, week={week} (season must be 1-4, week 1-13)")]
    InvalidWeekOrSeason { season: i64, week: i64 },

    // Resolution failures
    #[error("No {convention} schedule window contains {instant}")]
    ScheduleNotFound {
        instant: DateTime<Utc>,
        convention: Convention,
    },

    #[error("Schedule window not found: year={year}, convention={convention}, season={season}, week={week}")]
    WindowNotFound {
        year: i32,
        convention: Convention,
        season: u8,
        week: u8,
    },

    // Storage
    #[error("Schedule storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Schedule storage error: {0}")]
    StorageMessage(String),

    #[error("Corrupt cached schedule for year={year}, convention={convention}: {reason}")]
    DataCorruption {
        year: i32,
        convention: Convention,
        reason: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDeserialize(#[from] toml::de::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Date/time error: {0}")]
    DateTimeParse(String),

    #[error("Log setup error: {0}")]
    LogSetup(String),
}

impl AppError {
    /// Create an invalid convention error
    pub fn invalid_convention(value: impl Into<String>) -> Self {
        Self::InvalidConvention {
            value: value.into(),
        }
    }

    /// Create an out-of-range season/week error
    pub fn invalid_week_or_season(season: i64, week: i64) -> Self {
        Self::InvalidWeekOrSeason { season, week }
    }

    /// Create a schedule not found error for a forward lookup
    pub fn schedule_not_found(instant: DateTime<Utc>, convention: Convention) -> Self {
        Self::ScheduleNotFound {
            instant,
            convention,
        }
    }

    /// Create a window not found error for a reverse lookup
    pub fn window_not_found(year: i32, convention: Convention, season: u8, week: u8) -> Self {
        Self::WindowNotFound {
            year,
            convention,
            season,
            week,
        }
    }

    /// Create a storage error with context
    pub fn storage_error(msg: impl Into<String>) -> Self {
        Self::StorageMessage(msg.into())
    }

    /// Create a data corruption error for a cached (year, convention)
    pub fn data_corruption(year: i32, convention: Convention, reason: impl Into<String>) -> Self {
        Self::DataCorruption {
            year,
            convention,
            reason: reason.into(),
        }
    }

    /// Create a configuration error with context
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a date/time error with context
    pub fn datetime_parse_error(msg: impl Into<String>) -> Self {
        Self::DateTimeParse(msg.into())
    }

    /// Create a log setup error with context
    pub fn log_setup_error(msg: impl Into<String>) -> Self {
        Self::LogSetup(msg.into())
    }

    /// Errors caused by bad caller input. These are never retried.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            AppError::InvalidConvention { .. } | AppError::InvalidWeekOrSeason { .. }
        )
    }

    /// Only transient storage contention is worth retrying by the caller.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Storage(rusqlite::Error::SqliteFailure(err, _)) => matches!(
                err.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }

    pub fn is_corruption(&self) -> bool {
        matches!(self, AppError::DataCorruption { .. })
    }

    /// True for storage failures, including corruption that survived regeneration
    pub fn is_storage_error(&self) -> bool {
        matches!(self, AppError::Storage(_) | AppError::StorageMessage(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AppError::ScheduleNotFound { .. } | AppError::WindowNotFound { .. }
        )
    }
}
