use std::sync::Arc;

use crate::app::error::Result;
use crate::config::AppConfig;
use crate::delivery::{TelegramTransport, Transport};
use crate::fetcher::{Fetcher, HttpFetcher};
use crate::normalizer::{AmmoniaSanitizer, Sanitizer};
use crate::store::{JsonStateStore, StateStore};

/// Everything a cycle needs, wired once at startup.
pub struct AppContext {
    pub config: AppConfig,
    pub store: Arc<dyn StateStore>,
    pub fetcher: Arc<dyn Fetcher>,
    pub transport: Arc<dyn Transport>,
    pub sanitizer: Arc<dyn Sanitizer>,
}

impl AppContext {
    pub fn new(config: AppConfig) -> Result<Self> {
        let store: Arc<dyn StateStore> = Arc::new(JsonStateStore::new(&config.state_file));
        let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(config.fetch_timeout)?);
        let transport: Arc<dyn Transport> = Arc::new(TelegramTransport::new(
            &config.bot_token,
            &config.telegram_api_base,
            config.send_timeout,
        )?);
        let sanitizer: Arc<dyn Sanitizer> = Arc::new(AmmoniaSanitizer::new());

        Ok(Self::with_components(config, store, fetcher, transport, sanitizer))
    }

    pub fn with_components(
        config: AppConfig,
        store: Arc<dyn StateStore>,
        fetcher: Arc<dyn Fetcher>,
        transport: Arc<dyn Transport>,
        sanitizer: Arc<dyn Sanitizer>,
    ) -> Self {
        Self {
            config,
            store,
            fetcher,
            transport,
            sanitizer,
        }
    }
}
