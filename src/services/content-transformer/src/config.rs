use crate::error::{AppError, Result};
use crate::usage::DAILY_LIMIT;
use mindloom_shared::{ProviderConfig, ServerConfig, SupabaseConfig};

use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub environment: String,
    pub log_level: String,
    pub gemini: ProviderConfig,
    pub perplexity: ProviderConfig,
    pub supabase: SupabaseConfig,
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone)]
pub struct LimitsConfig {
    pub max_upload_bytes: u64,
    pub max_files_per_batch: usize,
    pub local_history_capacity: usize,
    pub max_anonymous_sessions: usize,
    /// Lets the scraper fetch loopback and private addresses
    pub allow_private_scrape_targets: bool,
    pub daily_transformations: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: 15 * 1024 * 1024,
            max_files_per_batch: 5,
            local_history_capacity: 50,
            max_anonymous_sessions: 10_000,
            allow_private_scrape_targets: false,
            daily_transformations: DAILY_LIMIT,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            environment: "development".to_string(),
            log_level: "debug".to_string(),
            gemini: ProviderConfig::gemini(),
            perplexity: ProviderConfig::perplexity(),
            supabase: SupabaseConfig::default(),
            limits: LimitsConfig::default(),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        // Load environment-specific defaults
        let (default_host, default_port, default_log_level) = match environment.as_str() {
            "production" => ("0.0.0.0", 8000, "info"),
            "staging" => ("0.0.0.0", 8000, "debug"),
            _ => ("127.0.0.1", 8000, "debug"),
        };

        let timeout_seconds: u64 = env::var("REQUEST_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .map_err(|e| {
                AppError::ConfigurationError(format!("Invalid REQUEST_TIMEOUT_SECONDS: {}", e))
            })?;

        let server = ServerConfig {
            host: env::var("CONTENT_TRANSFORMER_HOST").unwrap_or_else(|_| default_host.to_string()),
            port: env::var("CONTENT_TRANSFORMER_PORT")
                .unwrap_or_else(|_| default_port.to_string())
                .parse()
                .map_err(|e| AppError::ConfigurationError(format!("Invalid port: {}", e)))?,
            timeout_seconds,
        };

        let mut gemini = ProviderConfig::gemini();
        gemini.api_key = non_empty_var("GEMINI_API_KEY");
        gemini.timeout_seconds = timeout_seconds;
        if let Ok(url) = env::var("GEMINI_API_URL") {
            gemini.api_url = url;
        }
        if let Ok(model) = env::var("GEMINI_MODEL") {
            gemini.model = model;
        }

        let mut perplexity = ProviderConfig::perplexity();
        perplexity.api_key = non_empty_var("PERPLEXITY_API_KEY");
        perplexity.timeout_seconds = timeout_seconds;
        if let Ok(url) = env::var("PERPLEXITY_API_URL") {
            perplexity.api_url = url;
        }

        let supabase = SupabaseConfig {
            url: non_empty_var("SUPABASE_URL"),
            anon_key: non_empty_var("SUPABASE_ANON_KEY"),
            timeout_seconds,
        };

        let max_upload_mb: u64 = env::var("MAX_UPLOAD_MB")
            .unwrap_or_else(|_| "15".to_string())
            .parse()
            .map_err(|e| AppError::ConfigurationError(format!("Invalid MAX_UPLOAD_MB: {}", e)))?;

        let max_anonymous_sessions: usize = env::var("MAX_ANONYMOUS_SESSIONS")
            .unwrap_or_else(|_| "10000".to_string())
            .parse()
            .map_err(|e| {
                AppError::ConfigurationError(format!("Invalid MAX_ANONYMOUS_SESSIONS: {}", e))
            })?;

        let allow_private_scrape_targets = env::var("ALLOW_PRIVATE_SCRAPE_TARGETS")
            .map(|value| matches!(value.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Config {
            server,
            environment,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| default_log_level.to_string()),
            gemini,
            perplexity,
            supabase,
            limits: LimitsConfig {
                max_upload_bytes: max_upload_mb * 1024 * 1024,
                max_anonymous_sessions,
                allow_private_scrape_targets,
                ..LimitsConfig::default()
            },
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            return Err(AppError::ConfigurationError(
                "Host cannot be empty".to_string(),
            ));
        }

        if self.server.timeout_seconds == 0 {
            return Err(AppError::ConfigurationError(
                "Request timeout must be at least one second".to_string(),
            ));
        }

        for (name, provider) in [("Gemini", &self.gemini), ("Perplexity", &self.perplexity)] {
            url::Url::parse(&provider.api_url).map_err(|e| {
                AppError::ConfigurationError(format!("Invalid {} API URL: {}", name, e))
            })?;
        }

        if let Some(url) = &self.supabase.url {
            url::Url::parse(url).map_err(|e| {
                AppError::ConfigurationError(format!("Invalid SUPABASE_URL: {}", e))
            })?;
        }

        if self.limits.max_upload_bytes == 0 {
            return Err(AppError::ConfigurationError(
                "MAX_UPLOAD_MB must be greater than zero".to_string(),
            ));
        }

        if self.limits.max_anonymous_sessions == 0 {
            return Err(AppError::ConfigurationError(
                "MAX_ANONYMOUS_SESSIONS must be greater than zero".to_string(),
            ));
        }

        if self.is_production() && !self.gemini.is_configured() {
            tracing::warn!("GEMINI_API_KEY is not set; transformations will fail");
        }

        Ok(())
    }
}
