//! Shared application state
//!
//! Holds the configured clients and services plus the per-browser stores
//! backing anonymous sessions.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::acquisition::ContentScraper;
use crate::chat::QaService;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::file_processor::FileProcessor;
use crate::files::FileIntake;
use crate::history::{HistoryStore, RemoteHistory};
use crate::llm::{CompletionProvider, GeminiClient, PerplexityClient};
use crate::middleware_auth::Caller;
use crate::sessions::AnonymousSessions;
use crate::supabase::SupabaseClient;
use crate::transformer::ContentTransformer;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub gemini: Arc<dyn CompletionProvider>,
    pub perplexity: Arc<dyn CompletionProvider>,
    pub supabase: Option<Arc<SupabaseClient>>,
    pub transformer: Arc<ContentTransformer>,
    pub qa: Arc<QaService>,
    pub file_processor: Arc<FileProcessor>,
    pub file_intake: Arc<FileIntake>,
    pub scraper: Arc<ContentScraper>,
    pub anonymous: Arc<AnonymousSessions>,
    pub started_at: Instant,
}

impl AppState {
    /// Builds every client from configuration
    pub fn new(config: Config) -> Result<Self> {
        info!("Initializing application state...");

        let gemini: Arc<dyn CompletionProvider> =
            Arc::new(GeminiClient::new(config.gemini.clone())?);
        let perplexity: Arc<dyn CompletionProvider> =
            Arc::new(PerplexityClient::new(config.perplexity.clone())?);
        info!(
            gemini = gemini.is_configured(),
            perplexity = perplexity.is_configured(),
            "Completion providers initialized"
        );

        let supabase = SupabaseClient::from_config(&config.supabase)?.map(Arc::new);
        if supabase.is_none() {
            warn!("Supabase is not configured; history stays local and file processing is disabled");
        }

        let scraper = ContentScraper::new(
            config.server.timeout(),
            config.limits.allow_private_scrape_targets,
        )?;

        Ok(Self::with_providers(config, gemini, perplexity, supabase, scraper))
    }

    /// Assembles state around already constructed providers
    pub fn with_providers(
        config: Config,
        gemini: Arc<dyn CompletionProvider>,
        perplexity: Arc<dyn CompletionProvider>,
        supabase: Option<Arc<SupabaseClient>>,
        scraper: ContentScraper,
    ) -> Self {
        let transformer = Arc::new(ContentTransformer::new(gemini.clone()));
        let qa = Arc::new(QaService::new(perplexity.clone(), gemini.clone()));
        let file_processor = Arc::new(FileProcessor::new(supabase.clone(), gemini.clone()));
        let file_intake = Arc::new(FileIntake::new(&config.limits, supabase.clone()));
        let anonymous = Arc::new(AnonymousSessions::new(
            config.limits.local_history_capacity,
            config.limits.max_anonymous_sessions,
        ));

        Self {
            config: Arc::new(config),
            gemini,
            perplexity,
            supabase,
            transformer,
            qa,
            file_processor,
            file_intake,
            scraper: Arc::new(scraper),
            anonymous,
            started_at: Instant::now(),
        }
    }

    /// The signed-in user's remote history, or the anonymous session's own
    pub fn history_for(&self, caller: &Caller) -> Result<Arc<dyn HistoryStore>> {
        match caller {
            Caller::User(session) => {
                let client = self.supabase.clone().ok_or_else(|| {
                    AppError::ServiceUnavailable("Supabase is not configured".to_string())
                })?;
                Ok(Arc::new(RemoteHistory::new(client, session.clone())))
            }
            Caller::Anonymous(browser) => Ok(browser.history.clone()),
        }
    }
}
