use crate::error::AppError;
use std::path::Path;

/// Validates the configuration settings
///
/// # Validation Rules
/// - A configured database path cannot be empty or point at a directory
/// - A configured log file path cannot be empty
/// - Log file path parent directory must exist or be creatable
/// - Busy timeout must be greater than zero
pub fn validate_config(
    database_path: &Option<String>,
    log_file_path: &Option<String>,
    busy_timeout_ms: u64,
) -> Result<(), AppError> {
    if let Some(db_path) = database_path {
        if db_path.trim().is_empty() {
            return Err(AppError::config_error("Database path cannot be empty"));
        }
        if Path::new(db_path).is_dir() {
            return Err(AppError::config_error(format!(
                "Database path '{db_path}' is a directory"
            )));
        }
    }

    if let Some(log_path) = log_file_path {
        if log_path.is_empty() {
            return Err(AppError::config_error("Log file path cannot be empty"));
        }

        // Check if parent directory exists or can be created
        if let Some(parent) = Path::new(log_path).parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::config_error(format!(
                    "Cannot create log directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    if busy_timeout_ms == 0 {
        return Err(AppError::config_error(
            "Busy timeout must be greater than zero",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_config(&None, &None, 5000).is_ok());
    }

    #[test]
    fn test_rejects_empty_database_path() {
        let err = validate_config(&Some("  ".to_string()), &None, 5000).unwrap_err();
        assert!(err.to_string().contains("Database path cannot be empty"));
    }

    #[test]
    fn test_rejects_directory_as_database_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().to_string_lossy().to_string();
        assert!(validate_config(&Some(path), &None, 5000).is_err());
    }

    #[test]
    fn test_rejects_zero_busy_timeout() {
        let err = validate_config(&None, &None, 0).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_creates_missing_log_directory() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("logs").join("calendar.log");
        validate_config(&None, &Some(log_path.to_string_lossy().to_string()), 5000).unwrap();
        assert!(dir.path().join("logs").is_dir());
    }
}
