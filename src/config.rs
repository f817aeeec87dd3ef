//! Configuration module

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::classifier::LoadOptions;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the serialized model artifact
    pub model_path: PathBuf,

    /// Listen address
    pub host: IpAddr,

    /// Server port
    pub port: u16,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Maximum accepted request body
    pub max_body_bytes: usize,

    /// Reject feature keys the model does not know
    pub strict_features: bool,

    /// Environment (development, production)
    pub environment: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("mental_health_model.json"),
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 5000,
            request_timeout_secs: 30,
            max_body_bytes: 64 * 1024,
            strict_features: false,
            environment: "development".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            model_path: env::var("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),

            host: env::var("HOST")
                .ok()
                .and_then(|h| h.parse().ok())
                .unwrap_or(defaults.host),

            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),

            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|t| t.parse().ok())
                .filter(|t| *t > 0)
                .unwrap_or(defaults.request_timeout_secs),

            max_body_bytes: env::var("MAX_BODY_BYTES")
                .ok()
                .and_then(|b| b.parse().ok())
                .unwrap_or(defaults.max_body_bytes),

            strict_features: env::var("STRICT_FEATURES")
                .ok()
                .and_then(|s| parse_flag(&s))
                .unwrap_or(defaults.strict_features),

            environment: env::var("ENVIRONMENT")
                .unwrap_or(defaults.environment),
        }
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions { strict_features: self.strict_features }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
