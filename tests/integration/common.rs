use anyhow::Result;
use assert_fs::TempDir;
use async_trait::async_trait;
use contact_assist::assistant::AssistantBox;
use contact_assist::config::{ApiConfig, API_TOKEN_ENV, API_URL_ENV};
use contact_assist::input::Key;
use contact_assist::overlay::AnchoredOverlay;
use contact_assist::search::{
    Candidate, EntitySearchProvider, InMemoryDirectory, SearchCoordinator, SearchUpdates,
};
use std::env;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Isolated config and data directories for tests that touch the filesystem
pub struct TestEnvironment {
    pub config_dir: TempDir,
    pub data_dir: TempDir,
}

impl TestEnvironment {
    /// Point the XDG dirs at fresh temp dirs and clear env overrides.
    /// Callers must be `#[serial]`.
    pub fn new() -> Result<Self> {
        let config_dir = TempDir::new()?;
        let data_dir = TempDir::new()?;

        env::set_var("XDG_CONFIG_HOME", config_dir.path());
        env::set_var("XDG_DATA_HOME", data_dir.path());
        env::remove_var(API_URL_ENV);
        env::remove_var(API_TOKEN_ENV);

        Ok(Self {
            config_dir,
            data_dir,
        })
    }
}

/// API settings pointing at a mock server
pub fn api_config(base_url: &str, token: Option<&str>) -> ApiConfig {
    ApiConfig {
        base_url: base_url.to_string(),
        token: token.map(str::to_string),
        timeout_secs: 5,
    }
}

/// Assistant box over `provider` with no debounce, plus its result channel
pub fn assistant_with(
    provider: Arc<dyn EntitySearchProvider>,
) -> (AssistantBox<AnchoredOverlay>, SearchUpdates) {
    let (search, rx) = SearchCoordinator::new(provider, Duration::ZERO, 10);
    (AssistantBox::new('@', search, AnchoredOverlay::default()), rx)
}

pub fn demo_assistant() -> (AssistantBox<AnchoredOverlay>, SearchUpdates) {
    assistant_with(Arc::new(InMemoryDirectory::sample()))
}

pub fn type_str(assistant: &mut AssistantBox<AnchoredOverlay>, text: &str) {
    for c in text.chars() {
        assistant.handle_key(Key::Char(c));
    }
}

/// Feed search results into the box until one is accepted
pub async fn settle(assistant: &mut AssistantBox<AnchoredOverlay>, rx: &mut SearchUpdates) {
    while let Some(update) = rx.recv().await {
        if assistant.apply_search_update(update) {
            return;
        }
    }
}

/// Serves a canned list and records every query it was asked
#[derive(Default)]
pub struct RecordingProvider {
    pub queries: Mutex<Vec<String>>,
    pub calls: AtomicUsize,
    pub results: Vec<Candidate>,
}

impl RecordingProvider {
    pub fn with_results(results: Vec<Candidate>) -> Self {
        Self {
            results,
            ..Default::default()
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl EntitySearchProvider for RecordingProvider {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Candidate>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.to_string());
        Ok(self.results.iter().take(limit).cloned().collect())
    }
}

/// A contact record as the backend serializes it
pub fn contact_json(id: &str, display_name: &str, email: Option<&str>) -> serde_json::Value {
    let emails: Vec<&str> = email.into_iter().collect();
    serde_json::json!({
        "id": id,
        "givenName": display_name.split_whitespace().next().unwrap_or(""),
        "displayName": display_name,
        "emailAddresses": emails,
        "phoneNumbers": [],
        "tags": [],
    })
}
