// src/main.rs
use clap::Parser;
use season_calendar::cli::{Args, Command};
use season_calendar::commands::{
    failure_hint, handle_cache_info_command, handle_clear_cache_command,
    handle_config_update_command, handle_dump_year_command, handle_list_config_command,
    handle_resolve_command, handle_window_for_command, open_resolver,
};
use season_calendar::config::Config;
use season_calendar::error::AppError;
use season_calendar::logging::setup_logging;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let args = Args::parse();

    // Validate argument combinations before touching config or logs
    let command = args.command()?;

    // Config commands run before logging so a broken config can still be fixed
    match command {
        Command::ListConfig => return handle_list_config_command().await,
        Command::UpdateConfig => return handle_config_update_command(&args).await,
        _ => {}
    }

    let config = Config::load().await?;

    // The guard must be kept alive for the duration of the program
    let (log_file_path, _guard) = setup_logging(&args, &config).await?;
    info!("Logs are being written to: {log_file_path}");

    let resolver = open_resolver(&config)?;

    let result = match command {
        Command::Resolve { at, convention } => {
            handle_resolve_command(&resolver, at.as_deref(), convention, args.json)
        }
        Command::WindowFor {
            year,
            season,
            week,
            convention,
        } => handle_window_for_command(&resolver, year, season, week, convention, args.json),
        Command::DumpYear { year, convention } => {
            handle_dump_year_command(&resolver, year, convention, args.json)
        }
        Command::ClearCache { year } => handle_clear_cache_command(resolver.store(), year),
        Command::CacheInfo => handle_cache_info_command(resolver.store(), args.json),
        Command::ListConfig | Command::UpdateConfig => Ok(()),
    };

    if let Err(e) = &result {
        error!("Command failed: {e}");
        if let Some(hint) = failure_hint(e) {
            eprintln!("{hint}");
        }
    }
    result
}
