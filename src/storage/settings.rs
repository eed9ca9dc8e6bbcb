//! Settings storage
//!
//! Manages persistence of user preferences and application settings.

use crate::inference::registry::GEMMA_LABEL;
use crate::storage::{get_data_dir, StorageError};
use crate::types::config::GenerationParams;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    /// Temperature parameter for text generation (0.0 - 2.0)
    pub temperature: f32,
    /// Top-p (nucleus sampling) parameter (0.0 - 1.0)
    pub top_p: f32,
    /// Top-k sampling parameter
    pub top_k: u32,
    /// Maximum number of tokens to generate per answer
    pub max_new_tokens: u32,
    /// Context window size
    pub context_size: u32,
    /// Sampling seed
    #[serde(default = "default_seed")]
    pub seed: u32,
    /// Number of GPU layers to offload (0 = CPU only)
    pub gpu_layers: u32,
    /// Directory where GGUF files are downloaded to
    pub models_directory: PathBuf,
    /// SQLite file holding the chat history
    pub database_path: PathBuf,
    /// Model label preselected at startup
    #[serde(default = "default_model")]
    pub default_model: String,
    /// GGUF source overrides: model identifier -> HuggingFace URL
    #[serde(default)]
    pub model_overrides: HashMap<String, String>,
}

fn default_seed() -> u32 {
    GenerationParams::default().seed
}

fn default_model() -> String {
    GEMMA_LABEL.to_string()
}

impl Default for AppSettings {
    fn default() -> Self {
        let params = GenerationParams::default();
        let data_dir = get_data_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            temperature: params.temperature,
            top_p: params.top_p,
            top_k: params.top_k,
            max_new_tokens: params.max_new_tokens,
            context_size: params.context_size,
            seed: params.seed,
            gpu_layers: 99, // Offload all layers when an accelerator is present
            models_directory: data_dir.join("models"),
            database_path: data_dir.join("chat_history.db"),
            default_model: default_model(),
            model_overrides: HashMap::new(),
        }
    }
}

impl AppSettings {
    /// Validate settings values
    ///
    /// Ensures all parameters are within acceptable ranges.
    /// Also caps context size based on available VRAM to prevent KV cache overflow.
    pub fn validate(&mut self) {
        self.temperature = self.temperature.clamp(0.0, 2.0);
        self.top_p = self.top_p.clamp(0.0, 1.0);

        if self.top_k == 0 {
            self.top_k = 40;
        }

        let valid_context_sizes = [2048, 4096, 8192, 16384, 32768];
        if !valid_context_sizes.contains(&self.context_size) {
            self.context_size = *valid_context_sizes
                .iter()
                .min_by_key(|&&size| (size as i64 - self.context_size as i64).abs())
                .unwrap_or(&4096);
        }

        let max_safe_context = get_vram_safe_context_size();
        if self.context_size > max_safe_context {
            tracing::warn!(
                "Context size {} too large for available VRAM, capping to {}",
                self.context_size,
                max_safe_context
            );
            self.context_size = max_safe_context;
        }

        // Prompt and answer share the context
        self.max_new_tokens = self.max_new_tokens.clamp(1, self.context_size / 2);
    }

    /// Defaults adjusted to this machine
    pub fn validated_defaults() -> Self {
        let mut settings = Self::default();
        settings.validate();
        settings
    }

    pub fn generation_params(&self) -> GenerationParams {
        GenerationParams {
            max_new_tokens: self.max_new_tokens,
            temperature: self.temperature,
            top_p: self.top_p,
            top_k: self.top_k,
            seed: self.seed,
            context_size: self.context_size,
        }
    }
}

/// Estimate the maximum safe context size based on available VRAM.
/// The two selectable models are small (1B-2B), so the cap only bites on
/// accelerators with very little memory.
fn get_vram_safe_context_size() -> u32 {
    let vram_gb = crate::system::gpu::get_total_vram_gb().unwrap_or(0.0);

    if vram_gb <= 0.0 {
        return 32768; // VRAM unknown: CPU inference, RAM bound
    }

    // Half the VRAM for the KV cache; a 2B model needs roughly 64 MB per 1K tokens.
    let vram_for_kv = vram_gb * 0.5;
    let max_ctx = (vram_for_kv * 1024.0 / 64.0) as u32 * 1024;

    let sizes = [32768, 16384, 8192, 4096, 2048];
    for &s in &sizes {
        if s <= max_ctx {
            tracing::info!("VRAM: {:.1} GB -> max safe context: {}K", vram_gb, s / 1024);
            return s;
        }
    }

    2048
}

/// Get the settings file path
fn get_settings_path() -> Result<PathBuf, StorageError> {
    Ok(get_data_dir()?.join("settings.json"))
}

/// Load settings from disk
///
/// Returns default settings if the file doesn't exist or is corrupted
pub fn load_settings() -> AppSettings {
    match get_settings_path().and_then(|path| load_settings_from(&path)) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!("Failed to load settings, using defaults: {}", e);
            AppSettings::validated_defaults()
        }
    }
}

/// Load and validate settings from `path`; a missing file yields defaults
pub fn load_settings_from(path: &Path) -> Result<AppSettings, StorageError> {
    if !path.exists() {
        tracing::info!("Settings file not found, using defaults");
        return Ok(AppSettings::validated_defaults());
    }

    let json = fs::read_to_string(path)?;
    let mut settings: AppSettings = serde_json::from_str(&json)?;
    settings.validate();

    tracing::debug!("Loaded settings from {:?}", path);
    Ok(settings)
}

/// Save settings to disk
pub fn save_settings(settings: &AppSettings) -> Result<(), StorageError> {
    save_settings_to(settings, &get_settings_path()?)
}

pub fn save_settings_to(settings: &AppSettings, path: &Path) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(settings)?;
    fs::write(path, json)?;

    tracing::debug!("Saved settings to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = AppSettings::default();
        assert_eq!(settings.temperature, 0.7);
        assert_eq!(settings.top_p, 0.9);
        assert_eq!(settings.top_k, 40);
        assert_eq!(settings.max_new_tokens, 512);
        assert_eq!(settings.default_model, GEMMA_LABEL);
        assert!(settings.model_overrides.is_empty());
    }

    #[test]
    fn test_settings_validation() {
        let mut settings = AppSettings::default();

        settings.temperature = 5.0;
        settings.validate();
        assert_eq!(settings.temperature, 2.0);

        settings.temperature = -1.0;
        settings.validate();
        assert_eq!(settings.temperature, 0.0);

        settings.top_p = 2.0;
        settings.validate();
        assert_eq!(settings.top_p, 1.0);

        settings.top_k = 0;
        settings.validate();
        assert_eq!(settings.top_k, 40);

        settings.context_size = 3000;
        settings.max_new_tokens = 100_000;
        settings.validate();
        assert!([2048, 4096].contains(&settings.context_size));
        assert!(settings.max_new_tokens <= settings.context_size / 2);
    }

    #[test]
    fn test_generation_params_follow_settings() {
        let mut settings = AppSettings::default();
        settings.temperature = 0.2;
        settings.max_new_tokens = 128;
        let params = settings.generation_params();
        assert_eq!(params.temperature, 0.2);
        assert_eq!(params.max_new_tokens, 128);
        assert_eq!(params.context_size, settings.context_size);
    }

    #[test]
    fn test_settings_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut settings = AppSettings::default();
        settings.top_k = 20;
        settings.model_overrides.insert(
            "google/gemma-2-2b-jpn-it".to_string(),
            "owner/repo/model.gguf".to_string(),
        );
        save_settings_to(&settings, &path).unwrap();

        let loaded = load_settings_from(&path).unwrap();
        assert_eq!(loaded.top_k, 20);
        assert_eq!(loaded.model_overrides, settings.model_overrides);
    }

    #[test]
    fn test_missing_settings_file_gives_validated_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_settings_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(loaded, AppSettings::validated_defaults());
        assert!(loaded.context_size <= get_vram_safe_context_size());
        assert!(loaded.max_new_tokens <= loaded.context_size / 2);
    }

    #[test]
    fn test_corrupt_settings_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            load_settings_from(&path),
            Err(StorageError::Json(_))
        ));
    }
}
