//! API configuration.

use std::time::Duration;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Rate limit requests per second
    pub rate_limit_rps: u32,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            rate_limit_rps: 10,
            max_body_size: 1024 * 1024, // 1MB: prompts are small
            environment: "development".to_string(),
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8000),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|_| vec!["*".to_string()]),
            rate_limit_rps: std::env::var("RATE_LIMIT_RPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1024 * 1024),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}

/// Fallback policy for the generation lifecycle.
#[derive(Debug, Clone)]
pub struct FallbackPolicy {
    /// Demo clip substituted when no provider is configured or it fails
    pub demo_video_url: String,
    /// Simulated processing delay on the credential-less demo path
    pub demo_delay: Duration,
    /// Hard deadline on a provider call; on expiry the fallback is taken
    pub provider_timeout: Duration,
}

/// The constant demo clip used by the fallback path.
pub const DEMO_VIDEO_URL: &str =
    "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/BigBuckBunny.mp4";

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            demo_video_url: DEMO_VIDEO_URL.to_string(),
            demo_delay: Duration::from_secs(2),
            provider_timeout: Duration::from_secs(300),
        }
    }
}

impl FallbackPolicy {
    /// Create policy from environment variables.
    pub fn from_env() -> Self {
        Self {
            demo_video_url: std::env::var("DEMO_VIDEO_URL")
                .unwrap_or_else(|_| DEMO_VIDEO_URL.to_string()),
            demo_delay: Duration::from_secs(
                std::env::var("DEMO_PROCESSING_DELAY_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2),
            ),
            provider_timeout: Duration::from_secs(
                std::env::var("VIDEO_PROVIDER_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.port, 8000);
        assert!(!config.is_production());
    }

    #[test]
    fn test_fallback_policy_defaults() {
        let policy = FallbackPolicy::default();
        assert_eq!(policy.demo_video_url, DEMO_VIDEO_URL);
        assert_eq!(policy.demo_delay, Duration::from_secs(2));
        assert_eq!(policy.provider_timeout, Duration::from_secs(300));
    }
}
