use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A single generation call as seen by a model client.
///
/// Real clients only look at `prompt`; the case id and strategy are carried
/// so that deterministic stubs can answer without inspecting prompt text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationRequest {
    pub case_id: String,
    pub strategy: String,
    pub prompt: String,
}

impl GenerationRequest {
    pub fn new(
        case_id: impl Into<String>,
        strategy: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            case_id: case_id.into(),
            strategy: strategy.into(),
            prompt: prompt.into(),
        }
    }
}

#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Generate a completion for the request. Implementations own their
    /// retry policy and surface `LabError::ModelGeneration` once it is spent.
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;

    fn name(&self) -> &str;
}

/// Scores a model response against an expected output.
///
/// Scorers never fail: unscorable input degrades to `0.0`.
pub trait ResponseScorer: Send + Sync {
    fn score(&self, expected: &str, actual: &str) -> f64;
}
