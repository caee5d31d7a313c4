//! Instant to (year, season, week) resolution and the reverse lookup

use chrono::{DateTime, Datelike, Utc};
use tracing::{debug, error, info, instrument};

use super::clock::{Clock, SystemClock};
use super::generator::next_winter_anchor;
use super::models::{Convention, ScheduleIdentity, ScheduleWindow, validate_season_week};
use super::store::WindowStore;
use crate::error::AppError;

/// Public facade over the window store.
///
/// Construct one per process (or per test) and pass it to whatever needs
/// schedule lookups; it holds no global state.
#[derive(Debug, Clone)]
pub struct Resolver<C: Clock = SystemClock> {
    store: WindowStore,
    clock: C,
}

impl Resolver<SystemClock> {
    pub fn with_system_clock(store: WindowStore) -> Self {
        Self::new(store, SystemClock)
    }
}

impl<C: Clock> Resolver<C> {
    pub fn new(store: WindowStore, clock: C) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &WindowStore {
        &self.store
    }

    /// Nominal year an instant is attributed to.
    ///
    /// Normally the calendar year, except from the last Friday of December
    /// (00:00 UTC) onwards, which already belongs to next year's winter.
    /// Both conventions use this episode rule so they agree on the year of
    /// a physical week.
    pub fn infer_schedule_year(instant: DateTime<Utc>) -> Result<i32, AppError> {
        let year = instant.year();
        if instant >= next_winter_anchor(year)? {
            Ok(year + 1)
        } else {
            Ok(year)
        }
    }

    /// Resolves `instant` to its schedule identity under `convention`.
    ///
    /// Tries the inferred year first and then the years on either side.
    /// Fails with `ScheduleNotFound` rather than guessing a neighbouring week.
    #[instrument(skip(self))]
    pub fn resolve(
        &self,
        instant: DateTime<Utc>,
        convention: Convention,
    ) -> Result<ScheduleIdentity, AppError> {
        let inferred = Self::infer_schedule_year(instant)?;

        for year in [inferred, inferred - 1, inferred + 1] {
            self.store.ensure(year, convention)?;
            if let Some(window) = self.store.query_by_instant(year, convention, instant)? {
                if year != inferred {
                    info!(
                        "Resolved {} via adjacent year {} (inferred {})",
                        instant, year, inferred
                    );
                }
                debug!(
                    "Resolved {} ({}) to year={} season={} week={}",
                    instant, convention, year, window.season, window.week
                );
                return Ok(ScheduleIdentity::from_window(window));
            }
        }

        error!(
            "No schedule match for convention={} instant={}",
            convention,
            instant.to_rfc3339()
        );
        Err(AppError::schedule_not_found(instant, convention))
    }

    /// Resolves the clock's current instant
    pub fn current(&self, convention: Convention) -> Result<ScheduleIdentity, AppError> {
        self.resolve(self.clock.now(), convention)
    }

    /// Window of an explicit (year, season, week). Season and week are raw
    /// caller values and are range checked here.
    #[instrument(skip(self))]
    pub fn window_for(
        &self,
        year: i32,
        season: i64,
        week: i64,
        convention: Convention,
    ) -> Result<ScheduleWindow, AppError> {
        let (season, week) = validate_season_week(season, week)?;
        self.store.ensure(year, convention)?;
        self.store
            .query_by_key(year, convention, season, week)?
            .ok_or_else(|| AppError::window_not_found(year, convention, season.index(), week))
    }

    /// All windows of a nominal year in start order
    pub fn windows_for_year(
        &self,
        year: i32,
        convention: Convention,
    ) -> Result<Vec<ScheduleWindow>, AppError> {
        self.store.ensure(year, convention)?;
        self.store.windows(year, convention)
    }
}
