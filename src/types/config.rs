//! Configuration types
//!
//! Text generation parameters shared by the settings and the inference engine.

use serde::{Deserialize, Serialize};

/// Sampling parameters for a single generation call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Maximum number of new tokens
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub seed: u32,
    /// Context window size in tokens
    pub context_size: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_new_tokens: 512,
            temperature: 0.7,
            top_p: 0.9,
            top_k: 40,
            seed: 1234,
            context_size: 4096,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params() {
        let params = GenerationParams::default();
        assert_eq!(params.max_new_tokens, 512);
        assert_eq!(params.temperature, 0.7);
        assert_eq!(params.top_p, 0.9);
        assert_eq!(params.context_size, 4096);
    }

    #[test]
    fn test_params_serialization() {
        let params = GenerationParams::default();
        let json = serde_json::to_string(&params).expect("Failed to serialize");
        let deserialized: GenerationParams =
            serde_json::from_str(&json).expect("Failed to deserialize");
        assert_eq!(params, deserialized);
    }
}
