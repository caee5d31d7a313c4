//! Calendar generation for one (nominal year, convention) pair
//!
//! Every season is anchored on the last Friday of its anchor month at
//! 00:00 UTC. Episode weeks run Friday to Thursday from that anchor. Post
//! weeks start at the Sunday 03:00 America/New_York cutoff following the
//! anchor, each week converted to UTC with the offset in force on its own
//! Sunday, and always span 7 days minus 1 second of UTC time.

use chrono::{
    DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday,
};
use tracing::trace;

use super::models::{Convention, Season, ScheduleWindow};
use crate::constants::{WEEKS_PER_SEASON, WINDOWS_PER_YEAR, episode, post};
use crate::error::AppError;

/// Returns the last `weekday` of the given month, or `None` when the month
/// is outside chrono's representable range.
pub fn last_weekday_of_month(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year.checked_add(1)?, 1)
    } else {
        (year, month + 1)
    };
    let last_day = NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()?;
    let back = (7 + last_day.weekday().num_days_from_monday()
        - weekday.num_days_from_monday())
        % 7;
    last_day.checked_sub_signed(Duration::days(i64::from(back)))
}

/// Start of `season` in `schedule_year` under the episode convention:
/// the last Friday of the anchor month at 00:00 UTC.
pub fn episode_season_anchor(schedule_year: i32, season: Season) -> Result<DateTime<Utc>, AppError> {
    let (year, month) = season
        .anchor_month(schedule_year)
        .ok_or_else(|| overflow(schedule_year))?;
    let day = last_weekday_of_month(year, month, episode::ANCHOR_WEEKDAY).ok_or_else(|| {
        AppError::datetime_parse_error(format!(
            "no anchor date for {season} {schedule_year} (month {year}-{month:02})"
        ))
    })?;
    Ok(day.and_time(NaiveTime::MIN).and_utc())
}

/// First instant attributed to nominal year `schedule_year + 1`, i.e. the
/// last Friday of December of `schedule_year`.
pub fn next_winter_anchor(calendar_year: i32) -> Result<DateTime<Utc>, AppError> {
    let schedule_year = calendar_year
        .checked_add(1)
        .ok_or_else(|| overflow(calendar_year))?;
    episode_season_anchor(schedule_year, Season::Winter)
}

/// The post cutoff for a Sunday, converted to UTC with the offset in force
/// on that date.
pub fn post_cutoff(sunday: NaiveDate) -> Result<DateTime<Utc>, AppError> {
    let local = sunday
        .and_hms_opt(post::CUTOFF_HOUR, 0, 0)
        .ok_or_else(|| AppError::datetime_parse_error(format!("invalid cutoff on {sunday}")))?;

    // US transitions happen at 02:00, so 03:00 is never skipped or repeated;
    // earliest() still gives a defined answer if the rules ever change.
    post::CUTOFF_TIME_ZONE
        .from_local_datetime(&local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| {
            AppError::datetime_parse_error(format!(
                "{local} does not exist in {}",
                post::CUTOFF_TIME_ZONE.name()
            ))
        })
}

/// Generates the 52 windows of `schedule_year` under `convention`, ordered
/// by season then week.
pub fn generate(schedule_year: i32, convention: Convention) -> Result<Vec<ScheduleWindow>, AppError> {
    let mut windows = Vec::with_capacity(WINDOWS_PER_YEAR);

    for season in Season::ALL {
        let anchor = episode_season_anchor(schedule_year, season)?;
        for week in 1..=WEEKS_PER_SEASON {
            let offset = days(7 * i64::from(week - 1));
            let (start, end) = match convention {
                Convention::Episode => {
                    let start = add(anchor, offset)?;
                    // Push the end to the last tick of the seventh day
                    (start, add(start, days(7) - convention.tick())?)
                }
                Convention::Post => {
                    let sunday = anchor
                        .date_naive()
                        .checked_add_signed(days(post::DAYS_AFTER_EPISODE_ANCHOR))
                        .and_then(|first_sunday| first_sunday.checked_add_signed(offset))
                        .ok_or_else(|| overflow(schedule_year))?;
                    let start = post_cutoff(sunday)?;
                    (start, add(start, days(7) - convention.tick())?)
                }
            };

            windows.push(ScheduleWindow {
                year: schedule_year,
                convention,
                season,
                week,
                start,
                end,
            });
        }
    }

    trace!(
        "Generated {} {} windows for {}",
        windows.len(),
        convention,
        schedule_year
    );
    Ok(windows)
}

fn days(n: i64) -> Duration {
    Duration::days(n)
}

fn add(instant: DateTime<Utc>, delta: Duration) -> Result<DateTime<Utc>, AppError> {
    instant
        .checked_add_signed(delta)
        .ok_or_else(|| overflow(instant.year()))
}

fn overflow(year: i32) -> AppError {
    AppError::datetime_parse_error(format!("calendar arithmetic overflow near year {year}"))
}
