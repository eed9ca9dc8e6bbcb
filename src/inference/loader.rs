//! Memoizing model loader
//!
//! Loading a model is expensive, so [`ModelCache`] constructs each identifier at
//! most once for the life of the process and hands out the same instance on
//! every later request. Failed loads are reported and not cached.

use crate::inference::engine::{InferenceError, TextGenerator};
use crate::report::Reporter;
use crate::storage::huggingface::DownloadError;
use crate::types::config::GenerationParams;
use crate::types::message::Message;
use crate::types::model::{Device, ModelId};
use async_trait::async_trait;
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::OnceCell;

/// Hint appended to every load failure notice
pub const LOAD_FAILURE_HINT: &str = "The accelerator may be out of memory. \
    Close other processes using it or consider a smaller model.";

/// Errors raised while constructing a model
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("llama.cpp backend unavailable: {0}")]
    Backend(String),
    #[error("Unknown model: {0}")]
    UnknownModel(String),
    #[error("Model download failed: {0}")]
    Download(#[from] DownloadError),
    #[error("Failed to load model weights: {0}")]
    Model(String),
    #[error("Model loading task failed: {0}")]
    Join(String),
}

/// Builds generation capabilities for model identifiers
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Device the next model should be placed on
    fn select_device(&self) -> Device;

    /// Human-readable device description for status messages
    fn describe_device(&self, device: Device) -> String {
        device.to_string()
    }

    async fn construct(
        &self,
        id: &ModelId,
        device: Device,
    ) -> Result<Box<dyn TextGenerator>, LoadError>;
}

/// Output of one generation call
#[derive(Debug, Clone)]
pub struct Generation {
    pub text: String,
    pub response_time: Duration,
}

/// A ready generation capability bound to one identifier
pub struct LoadedModel {
    identifier: ModelId,
    device: Device,
    generator: Box<dyn TextGenerator>,
}

impl LoadedModel {
    pub fn new(identifier: ModelId, device: Device, generator: Box<dyn TextGenerator>) -> Self {
        Self {
            identifier,
            device,
            generator,
        }
    }

    pub fn identifier(&self) -> &ModelId {
        &self.identifier
    }

    pub fn device(&self) -> Device {
        self.device
    }

    /// Answer a single user prompt. Blocks while the model runs.
    pub fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<Generation, InferenceError> {
        let started = Instant::now();
        let text = self.generator.generate(&[Message::user(prompt)], params)?;
        let response_time = started.elapsed();
        tracing::debug!(
            "{} answered in {:.2}s ({} chars)",
            self.identifier,
            response_time.as_secs_f64(),
            text.len()
        );
        Ok(Generation {
            text,
            response_time,
        })
    }
}

impl fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedModel")
            .field("identifier", &self.identifier)
            .field("device", &self.device)
            .finish_non_exhaustive()
    }
}

impl PartialEq for LoadedModel {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier && self.device == other.device
    }
}

/// Never-shrinking cache of loaded models keyed by identifier
pub struct ModelCache {
    backend: Arc<dyn ModelBackend>,
    entries: DashMap<ModelId, Arc<OnceCell<Arc<LoadedModel>>>>,
}

impl ModelCache {
    pub fn new(backend: impl ModelBackend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
            entries: DashMap::new(),
        }
    }

    /// Return the model for `id`, constructing it on first use.
    ///
    /// Concurrent calls for one identifier share a single construction. A
    /// failed construction is reported through `reporter` and yields `None`;
    /// the next call tries again.
    pub async fn load(&self, id: &ModelId, reporter: &dyn Reporter) -> Option<Arc<LoadedModel>> {
        let cell = Arc::clone(&self.entries.entry(id.clone()).or_default());

        let result = cell
            .get_or_try_init(|| async {
                let device = self.backend.select_device();
                reporter.info(&format!(
                    "Using device: {}",
                    self.backend.describe_device(device)
                ));

                let generator = self.backend.construct(id, device).await?;
                reporter.success(&format!("Model '{}' loaded successfully.", id));
                Ok::<_, LoadError>(Arc::new(LoadedModel::new(id.clone(), device, generator)))
            })
            .await;

        match result {
            Ok(model) => Some(Arc::clone(model)),
            Err(e) => {
                tracing::error!("Failed to load model {}: {}", id, e);
                reporter.error(&format!(
                    "Failed to load model '{}': {}. {}",
                    id, e, LOAD_FAILURE_HINT
                ));
                None
            }
        }
    }

    /// Already-loaded model for `id`, without triggering a load
    pub fn get(&self, id: &ModelId) -> Option<Arc<LoadedModel>> {
        self.entries
            .get(id)
            .and_then(|cell| cell.get().map(Arc::clone))
    }

    /// Number of successfully loaded models
    pub fn loaded_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.value().initialized())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{NoticeLevel, NoticeLog};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct EchoGenerator {
        name: String,
    }

    impl TextGenerator for EchoGenerator {
        fn generate(
            &self,
            messages: &[Message],
            _params: &GenerationParams,
        ) -> Result<String, InferenceError> {
            Ok(format!("{}: {}", self.name, messages[0].content))
        }
    }

    /// Counts constructions and fails for identifiers listed in `failing`
    #[derive(Default)]
    struct CountingBackend {
        constructions: Arc<AtomicUsize>,
        failing: Mutex<HashSet<String>>,
    }

    impl CountingBackend {
        fn failing_for(id: &str) -> Self {
            let backend = Self::default();
            backend.failing.lock().unwrap().insert(id.to_string());
            backend
        }
    }

    #[async_trait]
    impl ModelBackend for CountingBackend {
        fn select_device(&self) -> Device {
            Device::Cpu
        }

        async fn construct(
            &self,
            id: &ModelId,
            _device: Device,
        ) -> Result<Box<dyn TextGenerator>, LoadError> {
            self.constructions.fetch_add(1, Ordering::SeqCst);
            if self.failing.lock().unwrap().contains(id.as_str()) {
                return Err(LoadError::Model("CUDA out of memory".to_string()));
            }
            Ok(Box::new(EchoGenerator {
                name: id.to_string(),
            }))
        }
    }

    #[tokio::test]
    async fn test_load_is_memoized() {
        let backend = CountingBackend::default();
        let constructions = Arc::clone(&backend.constructions);
        let cache = ModelCache::new(backend);
        let log = NoticeLog::new();
        let id = ModelId::new("id-A");

        let first = cache.load(&id, &log).await.expect("first load");
        let second = cache.load(&id, &log).await.expect("second load");

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(constructions.load(Ordering::SeqCst), 1);
        // The cached hit reports nothing
        assert_eq!(log.count(NoticeLevel::Info), 1);
        assert_eq!(log.count(NoticeLevel::Success), 1);
    }

    #[tokio::test]
    async fn test_distinct_identifiers_are_independent() {
        let backend = CountingBackend::default();
        let constructions = Arc::clone(&backend.constructions);
        let cache = ModelCache::new(backend);
        let log = NoticeLog::new();

        let a = cache.load(&ModelId::new("id-A"), &log).await.unwrap();
        let b = cache.load(&ModelId::new("id-B"), &log).await.unwrap();

        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(a.identifier().as_str(), "id-A");
        assert_eq!(b.identifier().as_str(), "id-B");
        assert_eq!(constructions.load(Ordering::SeqCst), 2);
        assert_eq!(cache.loaded_count(), 2);

        // Loading B left A in place
        let again = cache.get(&ModelId::new("id-A")).unwrap();
        assert!(Arc::ptr_eq(&a, &again));
    }

    #[tokio::test]
    async fn test_failure_is_contained_and_retried() {
        let backend = CountingBackend::failing_for("id-bad");
        let constructions = Arc::clone(&backend.constructions);
        let cache = ModelCache::new(backend);
        let log = NoticeLog::new();
        let id = ModelId::new("id-bad");

        assert!(cache.load(&id, &log).await.is_none());
        assert_eq!(log.count(NoticeLevel::Error), 1);
        assert!(log
            .notices()
            .iter()
            .any(|n| n.level == NoticeLevel::Error && n.message.contains(LOAD_FAILURE_HINT)));

        assert!(cache.load(&id, &log).await.is_none());
        assert_eq!(constructions.load(Ordering::SeqCst), 2);
        assert_eq!(cache.loaded_count(), 0);
        assert!(cache.get(&id).is_none());
    }

    #[tokio::test]
    async fn test_concurrent_loads_construct_once() {
        let backend = CountingBackend::default();
        let constructions = Arc::clone(&backend.constructions);
        let cache = ModelCache::new(backend);
        let log = NoticeLog::new();
        let id = ModelId::new("id-A");

        let (a, b) = tokio::join!(cache.load(&id, &log), cache.load(&id, &log));

        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
        assert_eq!(constructions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_two_model_scenario() {
        let backend = CountingBackend::default();
        let constructions = Arc::clone(&backend.constructions);
        let cache = ModelCache::new(backend);
        let log = NoticeLog::new();

        let labels = [("gemma", ModelId::new("id-A")), ("sb", ModelId::new("id-B"))];
        let c1 = cache.load(&labels[0].1, &log).await.unwrap();
        let c1_again = cache.load(&labels[0].1, &log).await.unwrap();
        assert!(Arc::ptr_eq(&c1, &c1_again));
        assert_eq!(constructions.load(Ordering::SeqCst), 1);

        let c2 = cache.load(&labels[1].1, &log).await.unwrap();
        assert!(!Arc::ptr_eq(&c1, &c2));
        assert_eq!(constructions.load(Ordering::SeqCst), 2);

        let answer = c2
            .generate("こんにちは", &GenerationParams::default())
            .unwrap();
        assert_eq!(answer.text, "id-B: こんにちは");
        assert_eq!(c2.device(), Device::Cpu);
    }
}
