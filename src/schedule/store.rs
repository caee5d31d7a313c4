//! Durable SQLite cache of generated schedule windows
//!
//! Windows are materialized once per (year, convention) by [`WindowStore::ensure`]
//! and served by range-indexed lookups afterwards. Every operation opens its
//! own connection; the database runs in WAL mode so readers never wait on
//! each other, and the only writer is the all-or-nothing upsert in `ensure`.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::generator::generate;
use super::models::{Convention, Season, ScheduleWindow};
use crate::constants::{SEASONS_PER_YEAR, WEEKS_PER_SEASON, WINDOWS_PER_YEAR};
use crate::error::AppError;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS schedule_windows (
    schedule_year INTEGER NOT NULL,
    convention    TEXT    NOT NULL,
    season        INTEGER NOT NULL,
    week          INTEGER NOT NULL,
    start_us      INTEGER NOT NULL,
    end_us        INTEGER NOT NULL,
    start_iso     TEXT    NOT NULL,
    end_iso       TEXT    NOT NULL,
    PRIMARY KEY (schedule_year, convention, season, week)
);
CREATE INDEX IF NOT EXISTS idx_schedule_windows_range
    ON schedule_windows (schedule_year, convention, start_us, end_us);
";

const WINDOW_COLUMNS: &str = "schedule_year, convention, season, week, start_us, end_us";

/// Snapshot of store activity counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub lookups: u64,
    pub hits: u64,
    pub misses: u64,
    pub builds: u64,
    pub regenerations: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        if self.lookups == 0 {
            0.0
        } else {
            self.hits as f64 / self.lookups as f64
        }
    }
}

/// Per (year, convention) summary of the cached rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheInfo {
    pub year: i32,
    pub convention: String,
    pub rows: usize,
    pub first_start: Option<DateTime<Utc>>,
    pub last_end: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct Counters {
    lookups: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    builds: AtomicU64,
    regenerations: AtomicU64,
}

/// Row as read from disk, before sanity checks
struct StoredRow {
    year: i32,
    convention: String,
    season: i64,
    week: i64,
    start_us: i64,
    end_us: i64,
}

impl StoredRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            year: row.get(0)?,
            convention: row.get(1)?,
            season: row.get(2)?,
            week: row.get(3)?,
            start_us: row.get(4)?,
            end_us: row.get(5)?,
        })
    }

    /// Converts into a window, rejecting rows that could not have come from
    /// the generator.
    fn into_window(self, year: i32, convention: Convention) -> Result<ScheduleWindow, AppError> {
        let corrupt = |reason: String| AppError::data_corruption(year, convention, reason);

        if self.year != year || self.convention != convention.as_str() {
            return Err(corrupt(format!(
                "row keyed {}/{} returned for {year}/{convention}",
                self.year, self.convention
            )));
        }
        let season = u8::try_from(self.season)
            .ok()
            .filter(|s| (1..=SEASONS_PER_YEAR).contains(s))
            .and_then(Season::from_index)
            .ok_or_else(|| corrupt(format!("season {} out of range", self.season)))?;
        let week = u8::try_from(self.week)
            .ok()
            .filter(|w| (1..=WEEKS_PER_SEASON).contains(w))
            .ok_or_else(|| corrupt(format!("week {} out of range", self.week)))?;
        if self.end_us < self.start_us {
            return Err(corrupt(format!(
                "{season} week {week} ends before it starts ({} < {})",
                self.end_us, self.start_us
            )));
        }
        let start = DateTime::from_timestamp_micros(self.start_us)
            .ok_or_else(|| corrupt(format!("start {} not representable", self.start_us)))?;
        let end = DateTime::from_timestamp_micros(self.end_us)
            .ok_or_else(|| corrupt(format!("end {} not representable", self.end_us)))?;

        Ok(ScheduleWindow {
            year,
            convention,
            season,
            week,
            start,
            end,
        })
    }
}

/// Handle to the on-disk window cache. Cloning is cheap; clones share
/// statistics.
#[derive(Debug, Clone)]
pub struct WindowStore {
    path: PathBuf,
    busy_timeout: Duration,
    counters: Arc<Counters>,
}

impl WindowStore {
    /// Opens (creating if needed) the cache database at `path`.
    pub fn open(path: impl AsRef<Path>, busy_timeout_ms: u64) -> Result<Self, AppError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        let store = Self {
            path,
            busy_timeout: Duration::from_millis(busy_timeout_ms),
            counters: Arc::new(Counters::default()),
        };

        let conn = store.connect()?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        conn.execute_batch(SCHEMA)?;
        debug!(
            "Opened schedule store at {} (journal_mode={})",
            store.path.display(),
            mode
        );

        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection, AppError> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(self.busy_timeout)?;
        Ok(conn)
    }

    /// Makes sure all windows of (year, convention) are cached.
    ///
    /// Returns `true` when this call wrote the calendar. Safe to call
    /// concurrently: the count is re-checked inside an immediate transaction
    /// and rows are upserted by key, so racing callers at worst rewrite
    /// identical rows.
    #[instrument(skip(self))]
    pub fn ensure(&self, year: i32, convention: Convention) -> Result<bool, AppError> {
        let conn = self.connect()?;
        match count_rows(&conn, year, convention)? {
            WINDOWS_PER_YEAR => return Ok(false),
            0 => {}
            partial => {
                warn!(
                    "Cached schedule for year={} convention={} has {} rows, regenerating",
                    year, convention, partial
                );
                drop(conn);
                self.regenerate(year, convention)?;
                return Ok(true);
            }
        }

        let windows = generate(year, convention)?;
        let mut conn = conn;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        // Another caller may have finished while we waited for the lock
        if count_rows(&tx, year, convention)? == WINDOWS_PER_YEAR {
            debug!(
                "Schedule for year={} convention={} built concurrently",
                year, convention
            );
            return Ok(false);
        }

        upsert_windows(&tx, &windows)?;
        tx.commit()?;

        self.counters.builds.fetch_add(1, Ordering::Relaxed);
        info!(
            "Built schedule cache for year={} convention={} ({} windows)",
            year,
            convention,
            windows.len()
        );
        Ok(true)
    }

    /// Replaces every cached row of (year, convention) with a fresh
    /// generation in a single transaction.
    #[instrument(skip(self))]
    pub fn regenerate(&self, year: i32, convention: Convention) -> Result<(), AppError> {
        let windows = generate(year, convention)?;
        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "DELETE FROM schedule_windows WHERE schedule_year = ?1 AND convention = ?2",
            params![year, convention.as_str()],
        )?;
        upsert_windows(&tx, &windows)?;
        tx.commit()?;

        self.counters.regenerations.fetch_add(1, Ordering::Relaxed);
        info!(
            "Regenerated schedule cache for year={} convention={}",
            year, convention
        );
        Ok(())
    }

    /// Window of (year, convention) whose closed interval contains `instant`.
    ///
    /// Where two windows overlap, the one with the later start wins; for
    /// equal starts the later season wins.
    #[instrument(skip(self))]
    pub fn query_by_instant(
        &self,
        year: i32,
        convention: Convention,
        instant: DateTime<Utc>,
    ) -> Result<Option<ScheduleWindow>, AppError> {
        let found = self.with_regeneration(year, convention, |store| {
            let conn = store.connect()?;
            let ts = instant.timestamp_micros();
            let row = conn
                .prepare_cached(&format!(
                    "SELECT {WINDOW_COLUMNS} FROM schedule_windows
                      WHERE schedule_year = ?1 AND convention = ?2 AND start_us <= ?3
                      ORDER BY start_us DESC, season DESC
                      LIMIT 1"
                ))?
                .query_row(params![year, convention.as_str(), ts], StoredRow::from_row)
                .optional()?;

            match row {
                Some(row) => {
                    let window = row.into_window(year, convention)?;
                    Ok(window.contains(instant).then_some(window))
                }
                None => Ok(None),
            }
        })?;

        self.record_lookup(found.is_some());
        debug!(
            "Instant lookup year={} convention={} instant={} -> {:?}",
            year,
            convention,
            instant,
            found.map(|w| (w.season, w.week))
        );
        Ok(found)
    }

    /// Window of (year, convention) for an exact season and week.
    #[instrument(skip(self))]
    pub fn query_by_key(
        &self,
        year: i32,
        convention: Convention,
        season: Season,
        week: u8,
    ) -> Result<Option<ScheduleWindow>, AppError> {
        let found = self.with_regeneration(year, convention, |store| {
            let conn = store.connect()?;
            let row = conn
                .prepare_cached(&format!(
                    "SELECT {WINDOW_COLUMNS} FROM schedule_windows
                      WHERE schedule_year = ?1 AND convention = ?2 AND season = ?3 AND week = ?4"
                ))?
                .query_row(
                    params![year, convention.as_str(), season.index(), week],
                    StoredRow::from_row,
                )
                .optional()?;
            row.map(|row| row.into_window(year, convention)).transpose()
        })?;

        self.record_lookup(found.is_some());
        Ok(found)
    }

    /// All cached windows of (year, convention) in start order.
    pub fn windows(&self, year: i32, convention: Convention) -> Result<Vec<ScheduleWindow>, AppError> {
        self.with_regeneration(year, convention, |store| {
            let conn = store.connect()?;
            let mut stmt = conn.prepare_cached(&format!(
                "SELECT {WINDOW_COLUMNS} FROM schedule_windows
                  WHERE schedule_year = ?1 AND convention = ?2
                  ORDER BY start_us, season, week"
            ))?;
            let rows = stmt
                .query_map(params![year, convention.as_str()], StoredRow::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows.into_iter()
                .map(|row| row.into_window(year, convention))
                .collect()
        })
    }

    /// Deletes cached rows, optionally limited to one year and/or convention.
    /// Returns the number of rows removed.
    #[instrument(skip(self))]
    pub fn clear(&self, year: Option<i32>, convention: Option<Convention>) -> Result<usize, AppError> {
        let conn = self.connect()?;
        let removed = conn.execute(
            "DELETE FROM schedule_windows
              WHERE (?1 IS NULL OR schedule_year = ?1)
                AND (?2 IS NULL OR convention = ?2)",
            params![year, convention.map(|c| c.as_str())],
        )?;
        info!(
            "Cleared {} cached schedule rows (year={:?}, convention={:?})",
            removed, year, convention
        );
        Ok(removed)
    }

    /// Row counts and bounds of every cached (year, convention)
    pub fn cache_info(&self) -> Result<Vec<CacheInfo>, AppError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT schedule_year, convention, COUNT(*), MIN(start_us), MAX(end_us)
               FROM schedule_windows
              GROUP BY schedule_year, convention
              ORDER BY schedule_year, convention",
        )?;
        let info = stmt
            .query_map([], |row| {
                let rows: i64 = row.get(2)?;
                let first: Option<i64> = row.get(3)?;
                let last: Option<i64> = row.get(4)?;
                Ok(CacheInfo {
                    year: row.get(0)?,
                    convention: row.get(1)?,
                    rows: usize::try_from(rows).unwrap_or_default(),
                    first_start: first.and_then(DateTime::from_timestamp_micros),
                    last_end: last.and_then(DateTime::from_timestamp_micros),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(info)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            lookups: self.counters.lookups.load(Ordering::Relaxed),
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            builds: self.counters.builds.load(Ordering::Relaxed),
            regenerations: self.counters.regenerations.load(Ordering::Relaxed),
        }
    }

    fn record_lookup(&self, hit: bool) {
        self.counters.lookups.fetch_add(1, Ordering::Relaxed);
        if hit {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.counters.misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Runs a read; on corrupt data regenerates (year, convention) once and
    /// retries. Corruption that survives regeneration becomes a storage error.
    fn with_regeneration<T>(
        &self,
        year: i32,
        convention: Convention,
        read: impl Fn(&Self) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        match read(self) {
            Err(err) if err.is_corruption() => {
                warn!("{}; regenerating", err);
                self.regenerate(year, convention)?;
                read(self).map_err(|err| {
                    if err.is_corruption() {
                        AppError::storage_error(format!("still corrupt after regeneration: {err}"))
                    } else {
                        err
                    }
                })
            }
            other => other,
        }
    }
}

fn count_rows(conn: &Connection, year: i32, convention: Convention) -> Result<usize, AppError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM schedule_windows WHERE schedule_year = ?1 AND convention = ?2",
        params![year, convention.as_str()],
        |row| row.get(0),
    )?;
    Ok(usize::try_from(count).unwrap_or_default())
}

fn upsert_windows(conn: &Connection, windows: &[ScheduleWindow]) -> Result<(), AppError> {
    let mut stmt = conn.prepare_cached(
        "INSERT OR REPLACE INTO schedule_windows
            (schedule_year, convention, season, week, start_us, end_us, start_iso, end_iso)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;
    for w in windows {
        stmt.execute(params![
            w.year,
            w.convention.as_str(),
            w.season.index(),
            w.week,
            w.start.timestamp_micros(),
            w.end.timestamp_micros(),
            w.start.to_rfc3339(),
            w.end.to_rfc3339(),
        ])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn open_store(dir: &tempfile::TempDir) -> WindowStore {
        WindowStore::open(dir.path().join("schedules.sqlite"), 5000).unwrap()
    }

    #[test]
    fn test_open_creates_parent_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("cache").join("schedules.sqlite");
        let store = WindowStore::open(&path, 1000).unwrap();
        assert!(path.exists());
        assert_eq!(store.path(), path.as_path());
    }

    #[test]
    fn test_ensure_builds_once() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);

        assert!(store.ensure(2025, Convention::Episode).unwrap());
        for _ in 0..5 {
            assert!(!store.ensure(2025, Convention::Episode).unwrap());
        }
        assert_eq!(store.stats().builds, 1);
        assert_eq!(store.windows(2025, Convention::Episode).unwrap().len(), 52);
    }

    #[test]
    fn test_conventions_are_cached_separately() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);
        store.ensure(2025, Convention::Episode).unwrap();
        assert!(store.windows(2025, Convention::Post).unwrap().is_empty());

        store.ensure(2025, Convention::Post).unwrap();
        let info = store.cache_info().unwrap();
        assert_eq!(info.len(), 2);
        assert!(info.iter().all(|i| i.year == 2025 && i.rows == 52));
    }

    #[test]
    fn test_cached_windows_match_generator() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);
        for convention in Convention::ALL {
            store.ensure(2025, convention).unwrap();
            let mut expected = generate(2025, convention).unwrap();
            expected.sort_by_key(|w| (w.start, w.season));
            assert_eq!(store.windows(2025, convention).unwrap(), expected);
        }
    }

    #[test]
    fn test_query_by_instant_hits_and_misses() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);
        store.ensure(2025, Convention::Episode).unwrap();

        let inside = Utc.with_ymd_and_hms(2025, 6, 26, 14, 0, 0).unwrap();
        let window = store
            .query_by_instant(2025, Convention::Episode, inside)
            .unwrap()
            .unwrap();
        assert_eq!((window.season, window.week), (Season::Spring, 13));

        let before_year = Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap();
        assert!(
            store
                .query_by_instant(2025, Convention::Episode, before_year)
                .unwrap()
                .is_none()
        );

        let after_year = Utc.with_ymd_and_hms(2026, 1, 15, 0, 0, 0).unwrap();
        assert!(
            store
                .query_by_instant(2025, Convention::Episode, after_year)
                .unwrap()
                .is_none()
        );

        let stats = store.stats();
        assert_eq!((stats.lookups, stats.hits, stats.misses), (3, 1, 2));
    }

    #[test]
    fn test_query_by_key() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);
        store.ensure(2025, Convention::Post).unwrap();

        let window = store
            .query_by_key(2025, Convention::Post, Season::Summer, 1)
            .unwrap()
            .unwrap();
        assert_eq!(window.start, Utc.with_ymd_and_hms(2025, 6, 29, 7, 0, 0).unwrap());
        assert!(
            store
                .query_by_key(2024, Convention::Post, Season::Summer, 1)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_partial_calendar_is_regenerated() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);
        store.ensure(2025, Convention::Episode).unwrap();

        let conn = Connection::open(store.path()).unwrap();
        conn.execute(
            "DELETE FROM schedule_windows WHERE season = 3 AND week > 10",
            [],
        )
        .unwrap();
        drop(conn);

        assert!(store.ensure(2025, Convention::Episode).unwrap());
        assert_eq!(store.windows(2025, Convention::Episode).unwrap().len(), 52);
        assert_eq!(store.stats().regenerations, 1);
    }

    #[test]
    fn test_corrupt_row_triggers_single_regeneration() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);
        store.ensure(2025, Convention::Episode).unwrap();

        let conn = Connection::open(store.path()).unwrap();
        conn.execute(
            "UPDATE schedule_windows SET end_us = start_us - 1
              WHERE schedule_year = 2025 AND season = 2 AND week = 13",
            [],
        )
        .unwrap();
        drop(conn);

        let instant = Utc.with_ymd_and_hms(2025, 6, 26, 14, 0, 0).unwrap();
        let window = store
            .query_by_instant(2025, Convention::Episode, instant)
            .unwrap()
            .unwrap();
        assert_eq!((window.season, window.week), (Season::Spring, 13));
        assert!(window.start <= window.end);
        assert_eq!(store.stats().regenerations, 1);
    }

    #[test]
    fn test_persistent_corruption_escalates_to_storage_error() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);

        let err = store
            .with_regeneration(2025, Convention::Episode, |_| {
                Err::<(), _>(AppError::data_corruption(2025, Convention::Episode, "bad row"))
            })
            .unwrap_err();
        assert!(err.is_storage_error());
        assert!(!err.is_corruption());
        assert!(err.to_string().contains("still corrupt after regeneration"));
        assert_eq!(store.stats().regenerations, 1);
    }

    #[test]
    fn test_other_errors_skip_regeneration() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);

        let err = store
            .with_regeneration(2025, Convention::Post, |_| {
                Err::<(), _>(AppError::storage_error("disk went away"))
            })
            .unwrap_err();
        assert!(matches!(err, AppError::StorageMessage(_)));
        assert_eq!(store.stats().regenerations, 0);
    }

    #[test]
    fn test_out_of_range_week_is_corruption() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);
        store.ensure(2025, Convention::Post).unwrap();

        let conn = Connection::open(store.path()).unwrap();
        conn.execute(
            "UPDATE schedule_windows SET week = 14
              WHERE schedule_year = 2025 AND convention = 'post' AND season = 1 AND week = 1",
            [],
        )
        .unwrap();
        drop(conn);

        let windows = store.windows(2025, Convention::Post).unwrap();
        assert_eq!(windows.len(), 52);
        assert!(windows.iter().all(|w| (1..=13).contains(&w.week)));
        assert_eq!(store.stats().regenerations, 1);
    }

    #[test]
    fn test_clear_by_year_and_convention() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);
        for year in [2024, 2025] {
            for convention in Convention::ALL {
                store.ensure(year, convention).unwrap();
            }
        }

        assert_eq!(store.clear(Some(2024), Some(Convention::Post)).unwrap(), 52);
        assert_eq!(store.clear(Some(2024), None).unwrap(), 52);
        assert_eq!(store.clear(None, None).unwrap(), 104);
        assert!(store.cache_info().unwrap().is_empty());

        // A cleared calendar is rebuilt on the next ensure
        assert!(store.ensure(2025, Convention::Episode).unwrap());
    }

    #[test]
    fn test_clones_share_statistics() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);
        let clone = store.clone();
        clone.ensure(2025, Convention::Episode).unwrap();
        assert_eq!(store.stats().builds, 1);
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }
}
