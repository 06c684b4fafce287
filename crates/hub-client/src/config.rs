//! Forge client configuration and builder pattern.

use crate::error::{ForgeError, Result};
use std::time::Duration;

/// Configuration for the forge client.
///
/// Two base URLs are configured: the structured REST API base (tree and
/// content endpoints) and the raw-content base (streaming endpoint).
/// Trailing slashes are trimmed so paths can be appended directly.
#[derive(Debug, Clone)]
pub struct ForgeConfig {
    /// Base URL of the forge REST API (e.g. "http://gitea:3000/api/v1")
    pub api_base: String,
    /// Base URL for raw file content (e.g. "http://gitea:3000")
    pub raw_base: String,
    /// Timeout for tree and content fetches (default: 30 seconds)
    pub timeout: Duration,
    /// Timeout for the streaming fetch to connect and deliver headers
    /// (default: 60 seconds). No timeout applies to an open body relay.
    pub stream_timeout: Duration,
    /// User-Agent header value
    pub user_agent: String,
}

impl Default for ForgeConfig {
    fn default() -> Self {
        Self {
            api_base: "http://gitea:3000/api/v1".to_string(),
            raw_base: "http://gitea:3000".to_string(),
            timeout: Duration::from_secs(30),
            stream_timeout: Duration::from_secs(60),
            user_agent: format!("forgehub-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ForgeConfig {
    /// Create a new configuration builder with the given base URLs.
    pub fn builder(api_base: impl Into<String>, raw_base: impl Into<String>) -> ForgeConfigBuilder {
        ForgeConfigBuilder::new(api_base, raw_base)
    }

    /// Minimum allowed timeout value.
    pub const MIN_TIMEOUT: Duration = Duration::from_millis(100);

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        for (name, base) in [("api_base", &self.api_base), ("raw_base", &self.raw_base)] {
            if base.is_empty() {
                return Err(ForgeError::Config(format!("{} cannot be empty", name)));
            }
            url::Url::parse(base)
                .map_err(|e| ForgeError::Config(format!("invalid {}: {}", name, e)))?;
        }

        if self.timeout < Self::MIN_TIMEOUT || self.stream_timeout < Self::MIN_TIMEOUT {
            return Err(ForgeError::Config(format!(
                "timeouts must be >= {:?}",
                Self::MIN_TIMEOUT
            )));
        }

        Ok(())
    }
}

/// Builder for forge client configuration.
#[derive(Debug)]
pub struct ForgeConfigBuilder {
    config: ForgeConfig,
}

impl ForgeConfigBuilder {
    /// Create a new builder with the given base URLs.
    pub fn new(api_base: impl Into<String>, raw_base: impl Into<String>) -> Self {
        Self {
            config: ForgeConfig {
                api_base: api_base.into().trim_end_matches('/').to_string(),
                raw_base: raw_base.into().trim_end_matches('/').to_string(),
                ..Default::default()
            },
        }
    }

    /// Set the timeout for tree and content fetches.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the timeout for the streaming fetch's connect/header phase.
    pub fn stream_timeout(mut self, timeout: Duration) -> Self {
        self.config.stream_timeout = timeout;
        self
    }

    /// Set a custom User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Build the configuration, validating all settings.
    pub fn build(self) -> Result<ForgeConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ForgeConfig::default();
        assert_eq!(config.api_base, "http://gitea:3000/api/v1");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.stream_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_builder_trims_trailing_slashes() {
        let config = ForgeConfig::builder("http://forge.local/api/v1/", "http://forge.local/")
            .build()
            .unwrap();
        assert_eq!(config.api_base, "http://forge.local/api/v1");
        assert_eq!(config.raw_base, "http://forge.local");
    }

    #[test]
    fn test_invalid_base_url() {
        let result = ForgeConfig::builder("not a valid url", "http://forge.local").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_base_url() {
        let result = ForgeConfig::builder("", "http://forge.local").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_timeout_too_small() {
        let result = ForgeConfig::builder("http://forge.local/api/v1", "http://forge.local")
            .timeout(Duration::from_millis(10))
            .build();
        assert!(result.is_err());
    }
}
