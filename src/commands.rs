use crate::cli::Args;
use crate::config::Config;
use crate::error::AppError;
use crate::schedule::{
    Clock, Convention, Resolver, ScheduleIdentity, ScheduleWindow, WindowStore,
    format_airing_period, format_period_or_unavailable,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

/// Opens the schedule store named by the config and wraps it in a resolver.
pub fn open_resolver(config: &Config) -> Result<Resolver, AppError> {
    let store = WindowStore::open(config.resolved_database_path(), config.busy_timeout_ms)?;
    Ok(Resolver::with_system_clock(store))
}

/// Parses an RFC 3339 instant into UTC
pub fn parse_instant(value: &str) -> Result<DateTime<Utc>, AppError> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::datetime_parse_error(format!("'{value}' is not RFC 3339: {e}")))
}

#[derive(Debug, Serialize)]
struct IdentityOutput<'a> {
    year: i32,
    season: u8,
    season_name: &'a str,
    week: u8,
    convention: Convention,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    airing_period: String,
}

impl<'a> From<&'a ScheduleIdentity> for IdentityOutput<'a> {
    fn from(identity: &'a ScheduleIdentity) -> Self {
        Self {
            year: identity.year,
            season: identity.season.index(),
            season_name: identity.season_name(),
            week: identity.week,
            convention: identity.window.convention,
            start: identity.window.start,
            end: identity.window.end,
            airing_period: identity.airing_period(),
        }
    }
}

/// Text or JSON rendering of a resolved identity
pub fn render_identity(identity: &ScheduleIdentity, json: bool) -> Result<String, AppError> {
    if json {
        return Ok(serde_json::to_string_pretty(&IdentityOutput::from(identity))?);
    }
    Ok(format!(
        "Year: {}\nSeason: {} ({})\nWeek: {}\nConvention: {}\nWindow: {} .. {}\n{}",
        identity.year,
        identity.season.index(),
        identity.season_name(),
        identity.week,
        identity.window.convention,
        identity.window.start.to_rfc3339(),
        identity.window.end.to_rfc3339(),
        identity.airing_period()
    ))
}

/// One line per window, or a JSON array
pub fn render_windows(windows: &[ScheduleWindow], json: bool) -> Result<String, AppError> {
    if json {
        return Ok(serde_json::to_string_pretty(windows)?);
    }
    Ok(windows
        .iter()
        .map(|w| {
            format!(
                "{} {:<6} week {:>2}  {} .. {}  {}",
                w.year,
                w.season.name(),
                w.week,
                w.start.to_rfc3339(),
                w.end.to_rfc3339(),
                format_airing_period(w)
            )
        })
        .collect::<Vec<_>>()
        .join("\n"))
}

/// Extra guidance shown after a failed command
pub fn failure_hint(err: &AppError) -> Option<&'static str> {
    if err.is_retryable() {
        Some("The schedule database is busy. Try again shortly.")
    } else if err.is_corruption() || err.is_storage_error() {
        Some("The schedule cache may be damaged. Run with --clear-cache to rebuild it.")
    } else {
        None
    }
}

/// Handles a forward lookup (`--at`, or now).
///
/// On failure prints the explicit unavailable period before returning the error.
pub fn handle_resolve_command<C: Clock>(
    resolver: &Resolver<C>,
    at: Option<&str>,
    convention: Convention,
    json: bool,
) -> Result<(), AppError> {
    let result = match at {
        Some(value) => resolver.resolve(parse_instant(value)?, convention),
        None => resolver.current(convention),
    };

    match result {
        Ok(identity) => {
            println!("{}", render_identity(&identity, json)?);
            Ok(())
        }
        Err(err) => {
            warn!("Resolution failed: {err}");
            println!("{}", format_period_or_unavailable(None));
            Err(err)
        }
    }
}

/// Handles a reverse lookup (`--year --season --week`).
pub fn handle_window_for_command<C: Clock>(
    resolver: &Resolver<C>,
    year: i32,
    season: i64,
    week: i64,
    convention: Convention,
    json: bool,
) -> Result<(), AppError> {
    let window = resolver.window_for(year, season, week, convention)?;
    println!("{}", render_identity(&ScheduleIdentity::from_window(window), json)?);
    Ok(())
}

/// Handles `--dump-year`.
pub fn handle_dump_year_command<C: Clock>(
    resolver: &Resolver<C>,
    year: i32,
    convention: Convention,
    json: bool,
) -> Result<(), AppError> {
    let windows = resolver.windows_for_year(year, convention)?;
    println!("{}", render_windows(&windows, json)?);
    Ok(())
}

/// Handles `--clear-cache`.
pub fn handle_clear_cache_command(store: &WindowStore, year: Option<i32>) -> Result<(), AppError> {
    let removed = store.clear(year, None)?;
    match year {
        Some(year) => println!("Removed {removed} cached windows for {year}."),
        None => println!("Removed {removed} cached windows."),
    }
    Ok(())
}

/// Handles `--cache-info`.
pub fn handle_cache_info_command(store: &WindowStore, json: bool) -> Result<(), AppError> {
    let info = store.cache_info()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("\nSchedule Cache");
    println!("────────────────────────────────────");
    println!("Database:");
    println!("{}", store.path().display());
    println!("────────────────────────────────────");
    if info.is_empty() {
        println!("No cached calendars.");
    }
    for entry in &info {
        let bounds = match (entry.first_start, entry.last_end) {
            (Some(first), Some(last)) => format!("{} .. {}", first.to_rfc3339(), last.to_rfc3339()),
            _ => "-".to_string(),
        };
        println!(
            "{} {:<8} {:>2} windows  {}",
            entry.year, entry.convention, entry.rows, bounds
        );
    }

    let stats = store.stats();
    println!("────────────────────────────────────");
    println!(
        "This run: {} lookups, {} hits, {} misses ({:.1}% hit rate), {} builds, {} regenerations",
        stats.lookups,
        stats.hits,
        stats.misses,
        stats.hit_rate() * 100.0,
        stats.builds,
        stats.regenerations
    );
    Ok(())
}

/// Handles the --list-config command.
pub async fn handle_list_config_command() -> Result<(), AppError> {
    Config::display().await
}

/// Handles configuration update commands (--set-database-path, --set-log-file, --clear-log-file).
pub async fn handle_config_update_command(args: &Args) -> Result<(), AppError> {
    let config_path = Config::get_config_path();
    let mut config = if std::path::Path::new(&config_path).exists() {
        Config::load_from_path(&config_path).await?
    } else {
        Config::default()
    };

    if let Some(new_database_path) = &args.new_database_path {
        config.database_path = Some(new_database_path.clone());
    }

    if let Some(new_log_path) = &args.new_log_file_path {
        config.log_file_path = Some(new_log_path.clone());
    } else if args.clear_log_file_path {
        config.log_file_path = None;
        println!("Custom log file path cleared. Using default location.");
    }

    config.validate()?;
    config.save().await?;
    info!("Configuration saved to {config_path}");
    println!("Config updated successfully!");

    Ok(())
}
