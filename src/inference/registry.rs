//! Model registry
//!
//! Static mapping from the labels offered in the model picker to canonical
//! model identifiers and the GGUF conversions llama.cpp loads for them.

use crate::storage::huggingface::HuggingFaceUrl;
use crate::types::model::{GgufSource, ModelId};
use std::collections::HashMap;

pub const GEMMA_LABEL: &str = "google/gemma-2-2b-jpn-it";
pub const SARASHINA_LABEL: &str = "sbintuitions/sarashina2.2-1b-instruct-v0.1";

/// One selectable model
#[derive(Debug, Clone, PartialEq)]
pub struct ModelEntry {
    /// Text shown in the model picker
    pub label: String,
    pub id: ModelId,
    pub source: GgufSource,
}

#[derive(Debug, Clone)]
pub struct ModelRegistry {
    entries: Vec<ModelEntry>,
}

impl ModelRegistry {
    pub fn new(entries: Vec<ModelEntry>) -> Self {
        Self { entries }
    }

    /// The two models the application ships with
    pub fn builtin() -> Self {
        Self::new(vec![
            ModelEntry {
                label: GEMMA_LABEL.to_string(),
                id: ModelId::new("google/gemma-2-2b-jpn-it"),
                source: GgufSource::new(
                    "bartowski/gemma-2-2b-jpn-it-GGUF",
                    "gemma-2-2b-jpn-it-Q4_K_M.gguf",
                ),
            },
            ModelEntry {
                label: SARASHINA_LABEL.to_string(),
                id: ModelId::new("sbintuitions/sarashina2.2-1b-instruct-v0.1"),
                source: GgufSource::new(
                    "mmnga/sarashina2.2-1b-instruct-v0.1-gguf",
                    "sarashina2.2-1b-instruct-v0.1-Q4_K_M.gguf",
                ),
            },
        ])
    }

    /// Builtin registry with GGUF sources replaced from settings.
    ///
    /// `overrides` maps a model identifier to a Hugging Face file URL or an
    /// `owner/repo/file.gguf` short form. Unparseable overrides are ignored.
    pub fn with_overrides(overrides: &HashMap<String, String>) -> Self {
        let mut registry = Self::builtin();
        for entry in &mut registry.entries {
            let Some(url) = overrides.get(entry.id.as_str()) else {
                continue;
            };
            match HuggingFaceUrl::parse(url) {
                Ok(parsed) if !parsed.filename.is_empty() => {
                    tracing::info!("Using GGUF override for {}: {}", entry.id, url);
                    entry.source = GgufSource {
                        repo_id: parsed.repo_id,
                        filename: parsed.filename,
                        revision: parsed.revision,
                    };
                }
                Ok(_) => tracing::warn!("GGUF override for {} names no file: {}", entry.id, url),
                Err(e) => tracing::warn!("Ignoring GGUF override for {}: {}", entry.id, e),
            }
        }
        registry
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.label.as_str())
    }

    /// Label preselected in the picker
    pub fn default_label(&self) -> &str {
        self.entries.first().map(|e| e.label.as_str()).unwrap_or("")
    }

    pub fn try_resolve(&self, label: &str) -> Option<&ModelId> {
        self.entries.iter().find(|e| e.label == label).map(|e| &e.id)
    }

    /// Resolve a picker label to its identifier.
    ///
    /// # Panics
    ///
    /// Panics when `label` is not one of the registry's labels. The picker
    /// only offers registry labels, so this is a caller bug.
    pub fn resolve(&self, label: &str) -> &ModelId {
        match self.try_resolve(label) {
            Some(id) => id,
            None => panic!("unknown model label: {label}"),
        }
    }

    pub fn source(&self, id: &ModelId) -> Option<&GgufSource> {
        self.entries.iter().find(|e| &e.id == id).map(|e| &e.source)
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_builtin_labels() {
        let registry = ModelRegistry::builtin();
        assert_eq!(
            registry.resolve(GEMMA_LABEL).as_str(),
            "google/gemma-2-2b-jpn-it"
        );
        assert_eq!(
            registry.resolve(SARASHINA_LABEL).as_str(),
            "sbintuitions/sarashina2.2-1b-instruct-v0.1"
        );
        assert_eq!(registry.labels().count(), 2);
        assert_eq!(registry.default_label(), GEMMA_LABEL);
    }

    #[test]
    fn test_try_resolve_unknown() {
        let registry = ModelRegistry::builtin();
        assert!(registry.try_resolve("gpt-5").is_none());
    }

    #[test]
    #[should_panic(expected = "unknown model label")]
    fn test_resolve_unknown_panics() {
        ModelRegistry::builtin().resolve("gpt-5");
    }

    #[test]
    fn test_overrides_replace_source() {
        let mut overrides = HashMap::new();
        overrides.insert(
            "google/gemma-2-2b-jpn-it".to_string(),
            "https://huggingface.co/someone/gemma-GGUF/blob/dev/gemma-Q8_0.gguf".to_string(),
        );
        overrides.insert(
            "sbintuitions/sarashina2.2-1b-instruct-v0.1".to_string(),
            "someone/repo-only".to_string(),
        );

        let registry = ModelRegistry::with_overrides(&overrides);
        let gemma = registry
            .source(&ModelId::new("google/gemma-2-2b-jpn-it"))
            .unwrap();
        assert_eq!(gemma.repo_id, "someone/gemma-GGUF");
        assert_eq!(gemma.filename, "gemma-Q8_0.gguf");
        assert_eq!(gemma.revision, "dev");

        // Repo-only override carries no file, builtin source is kept
        let sarashina = registry
            .source(&ModelId::new("sbintuitions/sarashina2.2-1b-instruct-v0.1"))
            .unwrap();
        assert_eq!(sarashina.repo_id, "mmnga/sarashina2.2-1b-instruct-v0.1-gguf");
    }
}
