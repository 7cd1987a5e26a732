use super::{types::Config, ConfigError};

const MAX_PAGE_SIZE: u32 = 1000;

/// Validate configuration
/// Currently validates:
/// - Both remote keys are present
/// - Remote URLs are non-empty http(s) URLs
/// - Page size is within 1..=1000
/// - Staleness window is at least one day
/// - Server port is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let remote = &config.remote;

    if remote.engine_key.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "remote.engine_key cannot be empty".to_string(),
        ));
    }
    if remote.consumer_key.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "remote.consumer_key cannot be empty".to_string(),
        ));
    }

    for (name, url) in [
        ("remote.search_url", &remote.search_url),
        ("remote.detail_base_url", &remote.detail_base_url),
        ("remote.site_base_url", &remote.site_base_url),
    ] {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "{} must be an http(s) URL, got '{}'",
                name, url
            )));
        }
    }

    if remote.page_size == 0 || remote.page_size > MAX_PAGE_SIZE {
        return Err(ConfigError::ValidationError(format!(
            "remote.page_size must be between 1 and {}",
            MAX_PAGE_SIZE
        )));
    }

    if config.sync.staleness_days == 0 {
        return Err(ConfigError::ValidationError(
            "sync.staleness_days cannot be 0".to_string(),
        ));
    }

    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        DatabaseConfig, LoggingConfig, RemoteConfig, ServerConfig, SyncConfig,
    };

    fn valid_config() -> Config {
        Config {
            remote: RemoteConfig::with_keys("engine", "consumer"),
            sync: SyncConfig::default(),
            database: DatabaseConfig::default(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_validate_empty_engine_key_fails() {
        let mut config = valid_config();
        config.remote.engine_key = "  ".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_empty_consumer_key_fails() {
        let mut config = valid_config();
        config.remote.consumer_key = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_bad_url_fails() {
        let mut config = valid_config();
        config.remote.search_url = "search.example.com".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("remote.search_url"));
    }

    #[test]
    fn test_validate_page_size_bounds() {
        let mut config = valid_config();
        config.remote.page_size = 0;
        assert!(validate_config(&config).is_err());

        config.remote.page_size = 1001;
        assert!(validate_config(&config).is_err());

        config.remote.page_size = 1000;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_zero_staleness_fails() {
        let mut config = valid_config();
        config.sync.staleness_days = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = valid_config();
        config.server.port = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }
}
