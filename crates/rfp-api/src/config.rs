//! API configuration.

use std::time::Duration;

/// Which persistence backend the server runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    Firestore,
    /// Process-local store; data is lost on restart.
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(StoreBackend::Firestore),
            "memory" => Ok(StoreBackend::Memory),
            other => anyhow::bail!("unknown STORE_BACKEND {:?}, expected firestore or memory", other),
        }
    }
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Rate limit requests per second (authenticated API)
    pub rate_limit_rps: u32,
    /// Rate limit burst
    pub rate_limit_burst: u32,
    /// Rate limit for the anonymous browse/view routes
    pub public_rate_limit_rps: u32,
    /// Request timeout
    pub request_timeout: Duration,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// Expose `/metrics`
    pub metrics_enabled: bool,
    pub store_backend: StoreBackend,
    /// Proxies in front of the server that append to `X-Forwarded-For`.
    /// Zero ignores forwarding headers entirely.
    pub trusted_proxy_hops: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            rate_limit_rps: 10,
            rate_limit_burst: 20,
            public_rate_limit_rps: 5,
            request_timeout: Duration::from_secs(30),
            max_body_size: 1024 * 1024, // 1MiB
            environment: "development".to_string(),
            metrics_enabled: true,
            store_backend: StoreBackend::Firestore,
            trusted_proxy_hops: 1,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

impl ApiConfig {
    /// Create config from environment variables.
    ///
    /// Malformed numbers fall back to defaults; an unknown store backend is
    /// an error.
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();
        let store_backend = match std::env::var("STORE_BACKEND") {
            Ok(v) => v.parse()?,
            Err(_) => defaults.store_backend,
        };
        Ok(Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: env_parse("API_PORT").unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| {
                    s.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.cors_origins),
            rate_limit_rps: env_parse("RATE_LIMIT_RPS").unwrap_or(defaults.rate_limit_rps),
            rate_limit_burst: env_parse("RATE_LIMIT_BURST").unwrap_or(defaults.rate_limit_burst),
            public_rate_limit_rps: env_parse("PUBLIC_RATE_LIMIT_RPS")
                .unwrap_or(defaults.public_rate_limit_rps),
            request_timeout: env_parse("REQUEST_TIMEOUT")
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            max_body_size: env_parse("MAX_BODY_SIZE").unwrap_or(defaults.max_body_size),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.metrics_enabled),
            store_backend,
            trusted_proxy_hops: env_parse("TRUSTED_PROXY_HOPS").unwrap_or(defaults.trusted_proxy_hops),
        })
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: [&str; 9] = [
        "API_PORT",
        "CORS_ORIGINS",
        "RATE_LIMIT_RPS",
        "PUBLIC_RATE_LIMIT_RPS",
        "MAX_BODY_SIZE",
        "METRICS_ENABLED",
        "STORE_BACKEND",
        "ENVIRONMENT",
        "TRUSTED_PROXY_HOPS",
    ];

    fn clear_env() {
        for key in KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = ApiConfig::from_env().unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.cors_origins, vec!["*".to_string()]);
        assert_eq!(config.public_rate_limit_rps, 5);
        assert_eq!(config.max_body_size, 1024 * 1024);
        assert!(config.metrics_enabled);
        assert_eq!(config.store_backend, StoreBackend::Firestore);
        assert!(!config.is_production());
        assert_eq!(config.trusted_proxy_hops, 1);
    }

    #[test]
    #[serial]
    fn test_overrides() {
        clear_env();
        std::env::set_var("API_PORT", "9001");
        std::env::set_var("CORS_ORIGINS", "https://a.example, https://b.example,");
        std::env::set_var("METRICS_ENABLED", "false");
        std::env::set_var("STORE_BACKEND", "Memory");
        std::env::set_var("ENVIRONMENT", "Production");
        std::env::set_var("RATE_LIMIT_RPS", "not-a-number");

        let config = ApiConfig::from_env().unwrap();
        assert_eq!(config.port, 9001);
        assert_eq!(config.cors_origins.len(), 2);
        assert!(!config.metrics_enabled);
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert!(config.is_production());
        assert_eq!(config.rate_limit_rps, 10);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_unknown_store_backend_rejected() {
        clear_env();
        std::env::set_var("STORE_BACKEND", "memroy");
        let err = ApiConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("memroy"));

        std::env::set_var("STORE_BACKEND", " firestore ");
        assert_eq!(ApiConfig::from_env().unwrap().store_backend, StoreBackend::Firestore);
        clear_env();
    }
}
