//! Configuration validation.
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: BalancerConfig → Result<(), Vec<ValidationError>>
//! - Runs before the config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::balance::registry::parse_backend_url;
use crate::balance::Algorithm;
use crate::config::schema::BalancerConfig;

/// A single semantic violation in the configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} is not a socket address")]
    BindAddress(String),

    #[error("listener.request_timeout_secs must be greater than zero")]
    RequestTimeout,

    #[error("backends[{index}] {url:?} is not a valid backend URL")]
    BackendUrl { index: usize, url: String },

    #[error("algorithm {0:?} is not recognized")]
    Algorithm(String),

    #[error("health_check.interval_secs must be greater than zero")]
    ProbeInterval,

    #[error("health_check.timeout_secs must be greater than zero")]
    ProbeTimeout,

    #[error("observability.metrics_address {0:?} is not a socket address")]
    MetricsAddress(String),
}

/// Check everything serde cannot. Collects every violation.
pub fn validate_config(config: &BalancerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::RequestTimeout);
    }

    for (index, url) in config.backends.iter().enumerate() {
        if parse_backend_url(url).is_err() {
            errors.push(ValidationError::BackendUrl {
                index,
                url: url.clone(),
            });
        }
    }

    if config.algorithm.parse::<Algorithm>().is_err() {
        errors.push(ValidationError::Algorithm(config.algorithm.clone()));
    }

    if config.health_check.interval_secs == 0 {
        errors.push(ValidationError::ProbeInterval);
    }
    if config.health_check.timeout_secs == 0 {
        errors.push(ValidationError::ProbeTimeout);
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&BalancerConfig::default()).is_ok());
    }

    #[test]
    fn collects_every_violation() {
        let mut config = BalancerConfig::default();
        config.listener.bind_address = "not-an-addr".into();
        config.algorithm = "weighted".into();
        config.backends = vec!["http://ok:8081".into(), "nope".into()];
        config.health_check.interval_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn rejects_malformed_backend_urls() {
        let mut config = BalancerConfig::default();
        config.backends = vec!["127.0.0.1:8081".into()];

        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(
            errors.as_slice(),
            [ValidationError::BackendUrl { index: 0, .. }]
        ));
    }
}
