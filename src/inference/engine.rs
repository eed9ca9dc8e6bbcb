//! llama.cpp text generation
//!
//! Wraps `llama-cpp-2` behind the [`TextGenerator`] capability and provides the
//! [`ModelBackend`] that fetches GGUF files and loads them.

use crate::inference::loader::{LoadError, ModelBackend};
use crate::inference::registry::ModelRegistry;
use crate::storage::huggingface::download_model;
use crate::system::gpu::detect_gpu;
use crate::types::config::GenerationParams;
use crate::types::message::Message;
use crate::types::model::{Device, ModelId};
use async_trait::async_trait;
use llama_cpp_2::context::params::LlamaContextParams;
use llama_cpp_2::llama_backend::LlamaBackend;
use llama_cpp_2::llama_batch::LlamaBatch;
use llama_cpp_2::model::params::LlamaModelParams;
use llama_cpp_2::model::{AddBos, LlamaChatMessage, LlamaModel, Special};
use llama_cpp_2::sampling::LlamaSampler;
use once_cell::sync::OnceCell;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while generating text
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Chat template error: {0}")]
    Template(String),
    #[error("Tokenization failed: {0}")]
    Tokenize(String),
    #[error("Prompt too long: {tokens} tokens do not fit a {context} token context")]
    PromptTooLong { tokens: usize, context: u32 },
    #[error("Context creation failed: {0}")]
    Context(String),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Generation task failed: {0}")]
    Join(String),
}

/// Text generation capability of a loaded model
pub trait TextGenerator: Send + Sync {
    fn generate(
        &self,
        messages: &[Message],
        params: &GenerationParams,
    ) -> Result<String, InferenceError>;
}

/// A GGUF model loaded into llama.cpp
pub struct LlamaGenerator {
    backend: Arc<LlamaBackend>,
    model: LlamaModel,
}

impl LlamaGenerator {
    /// Load weights from `path`, offloading `gpu_layers` layers (0 = CPU only)
    pub fn load(backend: Arc<LlamaBackend>, path: &Path, gpu_layers: u32) -> Result<Self, LoadError> {
        let params = LlamaModelParams::default().with_n_gpu_layers(gpu_layers);
        let model = LlamaModel::load_from_file(&backend, path, &params)
            .map_err(|e| LoadError::Model(format!("{}: {}", path.display(), e)))?;
        tracing::info!("Loaded GGUF weights from {:?} ({} GPU layers)", path, gpu_layers);
        Ok(Self { backend, model })
    }

    /// Render messages through the model's own chat template.
    ///
    /// Falls back to a plain `role: content` transcript when the GGUF carries
    /// no template llama.cpp understands.
    fn render_prompt(&self, messages: &[Message]) -> Result<String, InferenceError> {
        let chat = messages
            .iter()
            .map(|m| LlamaChatMessage::new(m.role.as_str().to_string(), m.content.clone()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| InferenceError::Template(e.to_string()))?;

        let templated = self
            .model
            .chat_template(None)
            .map_err(|e| e.to_string())
            .and_then(|template| {
                self.model
                    .apply_chat_template(&template, &chat, true)
                    .map_err(|e| e.to_string())
            });

        match templated {
            Ok(prompt) => Ok(prompt),
            Err(e) => {
                tracing::warn!("Chat template unavailable, using plain prompt: {}", e);
                Ok(plain_prompt(messages))
            }
        }
    }
}

fn plain_prompt(messages: &[Message]) -> String {
    let mut prompt = String::new();
    for message in messages {
        prompt.push_str(message.role.as_str());
        prompt.push_str(": ");
        prompt.push_str(message.content.trim());
        prompt.push('\n');
    }
    prompt.push_str("assistant: ");
    prompt
}

impl TextGenerator for LlamaGenerator {
    fn generate(
        &self,
        messages: &[Message],
        params: &GenerationParams,
    ) -> Result<String, InferenceError> {
        let prompt = self.render_prompt(messages)?;
        let tokens = self
            .model
            .str_to_token(&prompt, AddBos::Always)
            .map_err(|e| InferenceError::Tokenize(e.to_string()))?;

        let context = params.context_size.max(512);
        if tokens.is_empty() || tokens.len() + params.max_new_tokens as usize >= context as usize {
            return Err(InferenceError::PromptTooLong {
                tokens: tokens.len(),
                context,
            });
        }

        let ctx_params = LlamaContextParams::default().with_n_ctx(NonZeroU32::new(context));
        let mut ctx = self
            .model
            .new_context(&self.backend, ctx_params)
            .map_err(|e| InferenceError::Context(e.to_string()))?;

        let mut batch = LlamaBatch::new(tokens.len().max(512), 1);
        let last_index = (tokens.len() - 1) as i32;
        for (i, token) in (0_i32..).zip(tokens.into_iter()) {
            batch
                .add(token, i, &[0], i == last_index)
                .map_err(|e| InferenceError::Decode(e.to_string()))?;
        }
        ctx.decode(&mut batch)
            .map_err(|e| InferenceError::Decode(e.to_string()))?;

        let mut sampler = LlamaSampler::chain_simple([
            LlamaSampler::top_k(params.top_k as i32),
            LlamaSampler::top_p(params.top_p, 1),
            LlamaSampler::temp(params.temperature),
            LlamaSampler::dist(params.seed),
        ]);

        let mut n_cur = batch.n_tokens();
        let mut output = Vec::new();
        for _ in 0..params.max_new_tokens {
            let token = sampler.sample(&ctx, batch.n_tokens() - 1);
            if self.model.is_eog_token(token) {
                break;
            }

            let bytes = self
                .model
                .token_to_bytes(token, Special::Tokenize)
                .map_err(|e| InferenceError::Decode(e.to_string()))?;
            output.extend_from_slice(&bytes);

            batch.clear();
            batch
                .add(token, n_cur, &[0], true)
                .map_err(|e| InferenceError::Decode(e.to_string()))?;
            n_cur += 1;
            ctx.decode(&mut batch)
                .map_err(|e| InferenceError::Decode(e.to_string()))?;
        }

        Ok(String::from_utf8_lossy(&output).trim().to_string())
    }
}

/// Loads registry models through llama.cpp, downloading GGUF files on demand
pub struct LlamaCppBackend {
    registry: ModelRegistry,
    models_dir: PathBuf,
    gpu_layers: u32,
    backend: OnceCell<Arc<LlamaBackend>>,
}

impl LlamaCppBackend {
    pub fn new(registry: ModelRegistry, models_dir: PathBuf, gpu_layers: u32) -> Self {
        Self {
            registry,
            models_dir,
            gpu_layers,
            backend: OnceCell::new(),
        }
    }

    /// llama.cpp may only be initialised once per process
    fn backend(&self) -> Result<Arc<LlamaBackend>, LoadError> {
        self.backend
            .get_or_try_init(|| {
                let mut backend =
                    LlamaBackend::init().map_err(|e| LoadError::Backend(e.to_string()))?;
                backend.void_logs();
                Ok(Arc::new(backend))
            })
            .cloned()
    }
}

#[async_trait]
impl ModelBackend for LlamaCppBackend {
    fn select_device(&self) -> Device {
        match self.backend() {
            Ok(backend) if self.gpu_layers > 0 && backend.supports_gpu_offload() => {
                Device::Accelerator
            }
            Ok(_) => Device::Cpu,
            Err(e) => {
                tracing::warn!("Could not query llama.cpp backend: {}", e);
                Device::Cpu
            }
        }
    }

    fn describe_device(&self, device: Device) -> String {
        match (device, detect_gpu()) {
            (Device::Accelerator, Some(gpu)) => format!("{} ({})", device, gpu.name),
            _ => device.to_string(),
        }
    }

    async fn construct(
        &self,
        id: &ModelId,
        device: Device,
    ) -> Result<Box<dyn TextGenerator>, LoadError> {
        let source = self
            .registry
            .source(id)
            .cloned()
            .ok_or_else(|| LoadError::UnknownModel(id.to_string()))?;

        let path = download_model(&source, &self.models_dir, |downloaded, total| {
            tracing::trace!("Downloaded {} / {} bytes", downloaded, total);
        })
        .await?;

        let backend = self.backend()?;
        let gpu_layers = match device {
            Device::Accelerator => self.gpu_layers,
            Device::Cpu => 0,
        };

        let generator =
            tokio::task::spawn_blocking(move || LlamaGenerator::load(backend, &path, gpu_layers))
                .await
                .map_err(|e| LoadError::Join(e.to_string()))??;

        Ok(Box::new(generator))
    }
}
