//! Shared configuration types for the MindLoom services
//!
//! Defaults here describe the hosted endpoints the services talk to. Each
//! service layers its own environment handling on top of these structures.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Server configuration for HTTP services
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Request timeout duration in seconds
    pub timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            timeout_seconds: 30,
        }
    }
}

/// Connection settings for a hosted completion API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key; `None` leaves the provider unconfigured
    pub api_key: Option<String>,
    /// Base URL the request paths are appended to
    pub api_url: String,
    /// Model identifier sent with each request
    pub model: String,
    /// Per-request timeout in seconds
    pub timeout_seconds: u64,
}

impl ProviderConfig {
    pub const GEMINI_API_URL: &'static str = "https://generativelanguage.googleapis.com/v1beta";
    pub const GEMINI_MODEL: &'static str = "gemini-1.5-flash";
    pub const PERPLEXITY_API_URL: &'static str = "https://api.perplexity.ai";
    pub const PERPLEXITY_MODEL: &'static str = "llama-3.1-sonar-small-128k-online";

    /// Gemini defaults with no key
    pub fn gemini() -> Self {
        Self {
            api_key: None,
            api_url: Self::GEMINI_API_URL.to_string(),
            model: Self::GEMINI_MODEL.to_string(),
            timeout_seconds: 60,
        }
    }

    /// Perplexity defaults with no key
    pub fn perplexity() -> Self {
        Self {
            api_key: None,
            api_url: Self::PERPLEXITY_API_URL.to_string(),
            model: Self::PERPLEXITY_MODEL.to_string(),
            timeout_seconds: 60,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// A provider counts as configured once it has a non-empty key
    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|key| !key.trim().is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Backend-as-a-service project settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://<ref>.supabase.co`
    pub url: Option<String>,
    /// Public anon key sent as `apikey` on every request
    pub anon_key: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_seconds: u64,
}

impl SupabaseConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            anon_key: Some(anon_key.into()),
            timeout_seconds: 30,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.url.as_deref().is_some_and(|u| !u.is_empty())
            && self.anon_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.max(1))
    }
}

/// Configuration utilities
impl ServerConfig {
    /// Get the full server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8000);
        assert_eq!(config.address(), "127.0.0.1:8000");
    }

    #[test]
    fn test_provider_defaults_are_unconfigured() {
        let gemini = ProviderConfig::gemini();
        assert!(!gemini.is_configured());
        assert_eq!(gemini.model, "gemini-1.5-flash");

        let perplexity = ProviderConfig::perplexity().with_api_key("   ");
        assert!(!perplexity.is_configured());
        assert!(perplexity.with_api_key("pplx-key").is_configured());
    }

    #[test]
    fn test_supabase_config() {
        assert!(!SupabaseConfig::default().is_configured());
        let config = SupabaseConfig::new("https://demo.supabase.co", "anon");
        assert!(config.is_configured());
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_serde_serialization() {
        let config = ServerConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: ServerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.host, deserialized.host);
        assert_eq!(config.port, deserialized.port);
    }
}
