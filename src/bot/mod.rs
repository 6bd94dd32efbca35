//! Bot runtime: application context, update handlers, and service clients.

pub mod download;
pub mod extract;
pub mod handlers;
pub mod ocr;
pub mod search;
pub mod store;

use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::gemini::GeminiClient;
use ocr::OcrEngine;
use search::SearchClient;
use store::Store;

/// What the next free-text message from a chat should be treated as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingAction {
    AwaitingSearchQuery,
}

/// Process-wide application context, built once at startup and injected
/// into every handler through the dispatcher's dependency map.
pub struct AppContext {
    pub store: Store,
    pub gemini: GeminiClient,
    pub search: SearchClient,
    pub ocr: OcrEngine,
    pub download_dir: PathBuf,
    pub search_enabled: bool,
    pending: Mutex<HashMap<i64, PendingAction>>,
}

impl AppContext {
    pub fn new(config: &Config, store: Store) -> Self {
        Self {
            store,
            gemini: GeminiClient::new(config.gemini_api_key.clone()),
            search: SearchClient::new(
                config.search_api_key.clone(),
                config.search_engine_id.clone(),
            ),
            ocr: OcrEngine::new(config.tessdata_dir.clone()),
            download_dir: config.download_dir.clone(),
            search_enabled: config.search_enabled(),
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Mark how the next free-text message from this chat is routed.
    pub async fn set_pending(&self, chat_id: i64, action: PendingAction) {
        self.pending.lock().await.insert(chat_id, action);
    }

    /// Consume the pending action for this chat, if any.
    pub async fn take_pending(&self, chat_id: i64) -> Option<PendingAction> {
        self.pending.lock().await.remove(&chat_id)
    }
}
