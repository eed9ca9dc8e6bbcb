//! Model types
//!
//! Identifiers, devices and GGUF sources for the selectable models.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical identifier of a loadable model (a Hugging Face repo id)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelId(String);

impl ModelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute device a model was loaded onto
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Device {
    /// General-purpose compute
    Cpu,
    /// Hardware accelerator (CUDA, Metal or Vulkan offload)
    Accelerator,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => f.write_str("cpu"),
            Device::Accelerator => f.write_str("gpu"),
        }
    }
}

/// Location of a GGUF file on the Hugging Face Hub
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GgufSource {
    pub repo_id: String,
    pub filename: String,
    pub revision: String,
}

impl GgufSource {
    pub fn new(repo_id: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            repo_id: repo_id.into(),
            filename: filename.into(),
            revision: "main".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_id_display() {
        let id = ModelId::new("google/gemma-2-2b-jpn-it");
        assert_eq!(id.to_string(), "google/gemma-2-2b-jpn-it");
        assert_eq!(id.as_str(), "google/gemma-2-2b-jpn-it");
    }

    #[test]
    fn test_device_display() {
        assert_eq!(Device::Cpu.to_string(), "cpu");
        assert_eq!(Device::Accelerator.to_string(), "gpu");
    }
}
