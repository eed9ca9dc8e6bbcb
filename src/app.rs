//! Root Dioxus application component
//!
//! [`AppServices`] is built once in `main` before the window opens; [`App`]
//! wraps it with the reactive UI state every page shares.

use crate::inference::engine::{InferenceError, LlamaCppBackend};
use crate::inference::{LoadedModel, ModelCache, ModelRegistry};
use crate::navigation::Navigation;
use crate::report::{Notice, NoticeLevel, Reporter};
use crate::storage::database::HistoryStore;
use crate::storage::seed::ensure_initial_data;
use crate::storage::settings::AppSettings;
use crate::storage::StorageError;
use crate::ui::chat::{ChatSession, PendingAnswer};
use crate::ui::Layout;
use dioxus::prelude::*;
use std::sync::Arc;

/// Long-lived, thread-safe services created at startup
#[derive(Clone)]
pub struct AppServices {
    pub settings: AppSettings,
    pub registry: Arc<ModelRegistry>,
    pub models: Arc<ModelCache>,
    pub store: Arc<HistoryStore>,
}

impl AppServices {
    /// Open the history database (creating and seeding it when needed) and
    /// set up the model cache. Runs once per process.
    pub fn init(settings: AppSettings) -> Result<Self, StorageError> {
        let registry = ModelRegistry::with_overrides(&settings.model_overrides);

        let store = HistoryStore::open(&settings.database_path)?;
        if ensure_initial_data(&store)? {
            tracing::info!("Seeded chat history at {:?}", settings.database_path);
        }

        let backend = LlamaCppBackend::new(
            registry.clone(),
            settings.models_directory.clone(),
            settings.gpu_layers,
        );

        tracing::info!("AppServices initialized");
        Ok(Self {
            registry: Arc::new(registry),
            models: Arc::new(ModelCache::new(backend)),
            store: Arc::new(store),
            settings,
        })
    }
}

/// Represents the current state of the selected model
#[derive(Clone, PartialEq, Debug)]
pub enum ModelState {
    Loading,
    Loaded(Arc<LoadedModel>),
    Failed,
}

impl ModelState {
    pub fn model(&self) -> Option<Arc<LoadedModel>> {
        match self {
            ModelState::Loaded(model) => Some(Arc::clone(model)),
            ModelState::Loading | ModelState::Failed => None,
        }
    }
}

/// Registry label picked in the sidebar, plus a counter bumped to reload it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelection {
    label: String,
    attempt: u64,
}

impl ModelSelection {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            attempt: 0,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Switch to `label`; false (and no change) when it is already selected
    pub fn select(&mut self, label: &str) -> bool {
        if self.label == label {
            return false;
        }
        self.label = label.to_string();
        self.attempt = 0;
        true
    }

    /// Ask for another load of the same model after a failure
    pub fn retry(&mut self) {
        self.attempt += 1;
    }
}

/// Global application state shared across components
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ModelRegistry>,
    pub models: Arc<ModelCache>,
    pub store: Arc<HistoryStore>,
    pub settings: Signal<AppSettings>,
    pub navigation: Signal<Navigation>,
    pub selected_model: Signal<ModelSelection>,
    pub notices: Signal<Vec<Notice>>,
    /// Bumped after every write to the history store
    pub history_version: Signal<u64>,
    /// Global generation state - generation continues even when navigating away
    pub chat: Signal<ChatSession>,
}

impl AppState {
    pub fn new(services: AppServices) -> Self {
        let default_label = if services
            .registry
            .try_resolve(&services.settings.default_model)
            .is_some()
        {
            services.settings.default_model.clone()
        } else {
            tracing::warn!(
                "Default model '{}' is not offered, falling back to '{}'",
                services.settings.default_model,
                services.registry.default_label()
            );
            services.registry.default_label().to_string()
        };

        Self {
            registry: services.registry,
            models: services.models,
            store: services.store,
            settings: Signal::new(services.settings),
            navigation: Signal::new(Navigation::new()),
            selected_model: Signal::new(ModelSelection::new(default_label)),
            notices: Signal::new(Vec::new()),
            history_version: Signal::new(0),
            chat: Signal::new(ChatSession::default()),
        }
    }

    /// Reporter that turns messages into notices
    pub fn reporter(&self) -> NoticeBoard {
        NoticeBoard(self.notices)
    }

    /// Answer `question` with `model` on a blocking thread. The task is not
    /// tied to the chat page, so it finishes even if the page is left.
    pub fn ask(&self, model: Arc<LoadedModel>, question: String) {
        let mut chat = self.chat;
        if !chat.write().begin() {
            tracing::warn!("Ignoring question while a generation is running");
            return;
        }
        let params = self.settings.peek().generation_params();

        spawn_forever(async move {
            let prompt = question.clone();
            let worker = Arc::clone(&model);
            let result = tokio::task::spawn_blocking(move || worker.generate(&prompt, &params))
                .await
                .map_err(|e| InferenceError::Join(e.to_string()))
                .and_then(|generated| generated);

            let outcome = match result {
                Ok(generation) => Ok(PendingAnswer {
                    model: model.identifier().to_string(),
                    question,
                    answer: generation.text,
                    response_time: generation.response_time.as_secs_f64(),
                }),
                Err(e) => {
                    tracing::error!("Generation failed: {}", e);
                    Err(e.to_string())
                }
            };
            chat.write().finish(outcome);
        });
    }

    /// Tell every history view to re-query
    pub fn history_changed(&self) {
        let mut version = self.history_version;
        *version.write() += 1;
    }
}

/// [`Reporter`] writing into the notice list rendered above each page
#[derive(Clone, Copy)]
pub struct NoticeBoard(Signal<Vec<Notice>>);

impl NoticeBoard {
    fn push(&self, level: NoticeLevel, message: &str) {
        let mut notices = self.0;
        notices.write().push(Notice {
            level,
            message: message.to_string(),
        });
    }
}

impl Reporter for NoticeBoard {
    fn info(&self, message: &str) {
        tracing::info!("{}", message);
        self.push(NoticeLevel::Info, message);
    }

    fn success(&self, message: &str) {
        tracing::info!("{}", message);
        self.push(NoticeLevel::Success, message);
    }

    fn error(&self, message: &str) {
        tracing::error!("{}", message);
        self.push(NoticeLevel::Error, message);
    }
}

#[component]
pub fn App() -> Element {
    let services = use_context::<AppServices>();
    let app_state = use_context_provider(|| AppState::new(services));

    // Reload whenever the sidebar selection changes or a retry is requested;
    // the cache makes repeat selections instant.
    let loader = {
        let app_state = app_state.clone();
        use_resource(move || {
            let label = app_state.selected_model.read().label().to_string();
            let models = Arc::clone(&app_state.models);
            let id = app_state.registry.resolve(&label).clone();
            let reporter = app_state.reporter();
            async move { models.load(&id, &reporter).await }
        })
    };

    let model_state = match &*loader.read() {
        None => ModelState::Loading,
        Some(Some(model)) => ModelState::Loaded(Arc::clone(model)),
        Some(None) => ModelState::Failed,
    };

    rsx! {
        Layout { model_state }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selecting_the_current_label_is_a_no_op() {
        let mut selection = ModelSelection::new("Gemma 2 2B JPN");
        let before = selection.clone();
        assert!(!selection.select("Gemma 2 2B JPN"));
        assert_eq!(selection, before);
    }

    #[test]
    fn test_retry_changes_the_selection_without_changing_the_label() {
        let mut selection = ModelSelection::new("Sarashina 2.2 3B");
        let before = selection.clone();
        selection.retry();
        assert_ne!(selection, before);
        assert_eq!(selection.label(), "Sarashina 2.2 3B");
    }

    #[test]
    fn test_select_switches_label_and_resets_attempts() {
        let mut selection = ModelSelection::new("Gemma 2 2B JPN");
        selection.retry();
        assert!(selection.select("Sarashina 2.2 3B"));
        assert_eq!(selection, ModelSelection::new("Sarashina 2.2 3B"));
    }
}
