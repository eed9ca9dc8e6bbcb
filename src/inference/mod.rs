//! LLM inference
//!
//! Model registry, the memoizing model loader and the llama.cpp engine behind it.

pub mod engine;
pub mod loader;
pub mod registry;

pub use loader::{LoadError, LoadedModel, ModelBackend, ModelCache};
pub use registry::ModelRegistry;
