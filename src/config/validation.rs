use crate::config::types::{Config, ProxyConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_timeout(config.timeout_secs)?;
    validate_user_agent(&config.ua)?;
    if config.proxy {
        validate_proxies(&config.proxies)?;
    }
    Ok(())
}

fn validate_timeout(timeout_secs: u64) -> Result<(), ConfigError> {
    if !(1..=60).contains(&timeout_secs) {
        return Err(ConfigError::Validation(format!(
            "timeoutSecs must be between 1 and 60, got {}",
            timeout_secs
        )));
    }
    Ok(())
}

fn validate_user_agent(ua: &str) -> Result<(), ConfigError> {
    if ua.trim().is_empty() {
        return Err(ConfigError::Validation("ua cannot be empty".to_string()));
    }
    Ok(())
}

/// Validates proxy URLs
///
/// An enabled proxy with no URLs is left to the request layer, which reports
/// it as a proxy misconfiguration on the first call.
fn validate_proxies(proxies: &ProxyConfig) -> Result<(), ConfigError> {
    for (scheme, value) in [("http", &proxies.http), ("https", &proxies.https)] {
        if value.is_empty() {
            continue;
        }
        Url::parse(value).map_err(|e| {
            ConfigError::Validation(format!("Invalid {} proxy '{}': {}", scheme, value, e))
        })?;
    }
    Ok(())
}
