use std::path::PathBuf;
use std::time::Duration;

use crate::game::constants::{animation, location, wheel};
use crate::location::LocationSample;

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the backend REST API
    pub api_base_url: String,
    /// Where tokens are persisted (in-memory store when unset)
    pub token_file: Option<PathBuf>,
    /// Period between location samples
    pub poll_interval: Duration,
    /// Gate threshold in decimal degrees, applied to each axis independently
    pub location_threshold: f64,
    /// Duration of the wheel animation
    pub spin_duration: Duration,
    /// Period between animation frames
    pub frame_interval: Duration,
    /// Minimum number of full wheel turns per spin
    pub min_full_turns: u32,
    /// Fixed device location (no geolocation hardware on a terminal)
    pub fixed_location: Option<LocationSample>,
    /// Login credentials
    pub username: Option<String>,
    pub password: Option<String>,
    /// Play without talking to the backend
    pub offline: bool,
    /// Serve Prometheus metrics on this port when set
    pub metrics_port: Option<u16>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000".to_string(),
            token_file: None,
            poll_interval: location::POLL_INTERVAL,
            location_threshold: location::THRESHOLD_DEGREES,
            spin_duration: animation::DURATION,
            frame_interval: animation::FRAME_INTERVAL,
            min_full_turns: wheel::MIN_FULL_TURNS,
            fixed_location: None,
            username: None,
            password: None,
            offline: false,
            metrics_port: None,
        }
    }
}

impl ClientConfig {
    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("CLIMATE_API_URL") {
            let trimmed = url.trim_end_matches('/');
            if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
                config.api_base_url = trimmed.to_string();
            } else {
                tracing::warn!("Invalid CLIMATE_API_URL '{}', using default", url);
            }
        }

        if let Ok(path) = std::env::var("CLIMATE_TOKEN_FILE") {
            config.token_file = Some(PathBuf::from(path));
        }

        if let Some(ms) = parse_var::<u64>("CLIMATE_POLL_INTERVAL_MS") {
            if ms > 0 {
                config.poll_interval = Duration::from_millis(ms);
            } else {
                tracing::warn!("CLIMATE_POLL_INTERVAL_MS must be > 0, using default");
            }
        }

        if let Some(threshold) = parse_var::<f64>("CLIMATE_LOCATION_THRESHOLD") {
            if threshold > 0.0 && threshold <= 1.0 {
                config.location_threshold = threshold;
            } else {
                tracing::warn!("CLIMATE_LOCATION_THRESHOLD must be in (0, 1], using default");
            }
        }

        if let Some(ms) = parse_var::<u64>("CLIMATE_SPIN_DURATION_MS") {
            if ms > 0 {
                config.spin_duration = Duration::from_millis(ms);
            } else {
                tracing::warn!("CLIMATE_SPIN_DURATION_MS must be > 0, using default");
            }
        }

        if let Some(ms) = parse_var::<u64>("CLIMATE_FRAME_INTERVAL_MS") {
            if ms > 0 {
                config.frame_interval = Duration::from_millis(ms);
            } else {
                tracing::warn!("CLIMATE_FRAME_INTERVAL_MS must be > 0, using default");
            }
        }

        if let Some(turns) = parse_var::<u32>("CLIMATE_MIN_FULL_TURNS") {
            if turns >= wheel::MIN_FULL_TURNS {
                config.min_full_turns = turns;
            } else {
                tracing::warn!(
                    "CLIMATE_MIN_FULL_TURNS must be >= {}, using default",
                    wheel::MIN_FULL_TURNS
                );
            }
        }

        match (
            parse_var::<f64>("CLIMATE_LATITUDE"),
            parse_var::<f64>("CLIMATE_LONGITUDE"),
        ) {
            (Some(latitude), Some(longitude)) => {
                config.fixed_location = Some(LocationSample::new(latitude, longitude));
            }
            (None, None) => {}
            _ => tracing::warn!("CLIMATE_LATITUDE and CLIMATE_LONGITUDE must be set together"),
        }

        config.username = std::env::var("CLIMATE_USERNAME").ok();
        config.password = std::env::var("CLIMATE_PASSWORD").ok();

        if let Ok(offline) = std::env::var("CLIMATE_OFFLINE") {
            config.offline = matches!(offline.as_str(), "1" | "true" | "yes");
        }

        if let Some(port) = parse_var::<u16>("CLIMATE_METRICS_PORT") {
            if port > 0 {
                config.metrics_port = Some(port);
            } else {
                tracing::warn!("CLIMATE_METRICS_PORT must be > 0, metrics server disabled");
            }
        }

        config
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), String> {
        if self.api_base_url.is_empty() {
            return Err("api_base_url cannot be empty".to_string());
        }
        if self.poll_interval.is_zero() {
            return Err("poll_interval must be positive".to_string());
        }
        if !(self.location_threshold > 0.0 && self.location_threshold <= 1.0) {
            return Err("location_threshold must be in (0, 1]".to_string());
        }
        if self.spin_duration.is_zero() {
            return Err("spin_duration must be positive".to_string());
        }
        if self.frame_interval.is_zero() || self.frame_interval > self.spin_duration {
            return Err("frame_interval must be positive and shorter than spin_duration".to_string());
        }
        if self.min_full_turns < wheel::MIN_FULL_TURNS {
            return Err(format!("min_full_turns must be at least {}", wheel::MIN_FULL_TURNS));
        }
        if let Some(sample) = &self.fixed_location {
            if !sample.is_valid() {
                return Err("fixed location is out of range".to_string());
            }
        }
        Ok(())
    }

    /// Whether credentials for a fresh login are available
    pub fn has_credentials(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Invalid {} '{}', using default", key, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.api_base_url, "http://127.0.0.1:8000");
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.location_threshold, 0.1);
        assert_eq!(config.spin_duration, Duration::from_millis(4000));
        assert_eq!(config.min_full_turns, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = ClientConfig::default();
        config.location_threshold = 0.0;
        assert!(config.validate().is_err());

        let mut config = ClientConfig::default();
        config.min_full_turns = 2;
        assert!(config.validate().is_err());

        let mut config = ClientConfig::default();
        config.frame_interval = Duration::from_secs(10);
        assert!(config.validate().is_err());

        let mut config = ClientConfig::default();
        config.fixed_location = Some(LocationSample::new(95.0, 0.0));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_or_default() {
        let config = ClientConfig::load_or_default();
        assert!(!config.poll_interval.is_zero());
    }
}
