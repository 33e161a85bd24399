use std::net::SocketAddr;
use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(content)?;

    validate_config(&config)?;

    Ok(config)
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.database_path.trim().is_empty() {
        return Err(ConfigError::Validation {
            message: "database_path must not be empty".to_string(),
        });
    }
    if config.upload_directory.trim().is_empty() {
        return Err(ConfigError::Validation {
            message: "upload_directory must not be empty".to_string(),
        });
    }

    if let Err(e) = config.listen_address.parse::<SocketAddr>() {
        return Err(ConfigError::Validation {
            message: format!("Invalid listen_address '{}': {}", config.listen_address, e),
        });
    }

    if config.ingest.batch_size == 0 {
        return Err(ConfigError::Validation {
            message: "ingest.batch_size must be greater than zero".to_string(),
        });
    }
    if config.ingest.progress_interval == 0 {
        return Err(ConfigError::Validation {
            message: "ingest.progress_interval must be greater than zero".to_string(),
        });
    }
    if config.uploads.max_file_bytes == 0 {
        return Err(ConfigError::Validation {
            message: "uploads.max_file_bytes must be greater than zero".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_minimal_config_uses_defaults() {
        let config = load_config_from_str(r#"{ "version": "1.0" }"#).unwrap();
        assert_eq!(config.listen_address, "127.0.0.1:3000");
        assert_eq!(config.ingest.batch_size, 1000);
        assert_eq!(config.ingest.progress_interval, 100);
        assert!(config.ingest.normalize_phones);
        assert_eq!(config.uploads.preview_rows, 5);
        assert_eq!(config.uploads.max_file_bytes, 10 * 1024 * 1024);
        assert!(config.database_path.ends_with("leadbook.db"));
    }

    #[test]
    fn test_load_full_config() {
        let config_json = r#"
        {
            "version": "1.0",
            "database_path": "/var/lib/leadbook/leadbook.db",
            "upload_directory": "/var/lib/leadbook/uploads",
            "listen_address": "0.0.0.0:8080",
            "ingest": {
                "batch_size": 250,
                "progress_interval": 50,
                "normalize_phones": false
            },
            "uploads": {
                "preview_rows": 10,
                "max_file_bytes": 1048576
            }
        }
        "#;

        let config = load_config_from_str(config_json).unwrap();
        assert_eq!(config.database_path, "/var/lib/leadbook/leadbook.db");
        assert_eq!(config.upload_directory, "/var/lib/leadbook/uploads");
        assert_eq!(config.listen_address, "0.0.0.0:8080");
        assert_eq!(config.ingest.batch_size, 250);
        assert_eq!(config.ingest.progress_interval, 50);
        assert!(!config.ingest.normalize_phones);
        assert_eq!(config.uploads.preview_rows, 10);
        assert_eq!(config.uploads.max_file_bytes, 1048576);
    }

    #[test]
    fn test_invalid_version() {
        let result = load_config_from_str(r#"{ "version": "2.0" }"#);
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let result = load_config_from_str(r#"{ "ingest": { "batch_size": 0 } }"#);
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_zero_progress_interval_rejected() {
        let result = load_config_from_str(r#"{ "ingest": { "progress_interval": 0 } }"#);
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_bad_listen_address_rejected() {
        let result = load_config_from_str(r#"{ "listen_address": "localhost" }"#);
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_malformed_json() {
        let result = load_config_from_str("{ not json");
        assert!(matches!(result, Err(ConfigError::ParseJson(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = load_config("/definitely/not/here.json");
        assert!(matches!(result, Err(ConfigError::ReadFile { .. })));
    }

    #[test]
    fn test_default_config_is_valid() {
        validate_config(&Config::default()).unwrap();
    }
}
