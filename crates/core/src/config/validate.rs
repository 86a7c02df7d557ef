use super::{types::Config, ConfigError};
use crate::competitor::MAX_COMPETITORS;
use crate::ledger::MAX_ITEMS_PER_COMPETITOR;

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Bench defaults describe a runnable benchmark
/// - HTTP timeout is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.bench.items_per_competitor == 0
        || config.bench.items_per_competitor > MAX_ITEMS_PER_COMPETITOR
    {
        return Err(ConfigError::ValidationError(format!(
            "bench.items_per_competitor must be between 1 and {}",
            MAX_ITEMS_PER_COMPETITOR
        )));
    }

    if config.bench.competitor_count == 0 || config.bench.competitor_count > MAX_COMPETITORS {
        return Err(ConfigError::ValidationError(format!(
            "bench.competitor_count must be between 1 and {}",
            MAX_COMPETITORS
        )));
    }

    if config.bench.requests_per_minute == 0 {
        return Err(ConfigError::ValidationError(
            "bench.requests_per_minute cannot be 0".to_string(),
        ));
    }

    if config.http.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "http.timeout_secs cannot be 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BenchConfig, ServerConfig};
    use std::net::IpAddr;

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let config = Config {
            server: ServerConfig {
                host: "0.0.0.0".parse::<IpAddr>().unwrap(),
                port: 0,
            },
            ..Default::default()
        };
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_too_many_competitors_fails() {
        let config = Config {
            bench: BenchConfig {
                competitor_count: 11,
                ..Default::default()
            },
            ..Default::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("competitor_count"));
    }

    #[test]
    fn test_validate_zero_rate_fails() {
        let config = Config {
            bench: BenchConfig {
                requests_per_minute: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_oversized_ring_fails() {
        let config = Config {
            bench: BenchConfig {
                items_per_competitor: MAX_ITEMS_PER_COMPETITOR + 1,
                ..Default::default()
            },
            ..Default::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("items_per_competitor"));

        let config = Config {
            bench: BenchConfig {
                items_per_competitor: MAX_ITEMS_PER_COMPETITOR,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(validate_config(&config).is_ok());
    }
}
