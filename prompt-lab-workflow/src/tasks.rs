pub mod mathematical_reasoning;
pub mod text_classification;

pub use mathematical_reasoning::*;
pub use text_classification::*;

use prompt_lab_core::{LabError, Result, TestCase};
use serde::{Deserialize, Serialize};

/// Every strategy label any built-in task understands, in comparison order.
pub const ALL_STRATEGIES: [&str; 6] = [
    "vanilla",
    "zero_shot",
    "one_shot",
    "few_shot",
    "zero_shot_cot",
    "few_shot_cot",
];

/// An experiment task: fixed test data, one prompt per strategy, and a
/// scoring rule for model responses.
pub trait Task: Send + Sync {
    /// Stable display identifier, used as the `Task` column of results.
    fn name(&self) -> &str;

    /// Test cases in a fixed order; identical on every call.
    fn test_data(&self) -> Vec<TestCase>;

    /// The closed set of strategy labels `generate_prompt` accepts.
    fn strategies(&self) -> &[&'static str];

    fn default_strategies(&self) -> Vec<String> {
        self.strategies().iter().map(|s| s.to_string()).collect()
    }

    fn generate_prompt(&self, strategy: &str, case: &TestCase) -> Result<String>;

    /// Score a response in `[0, 1]`. Never fails.
    fn evaluate_response(&self, expected: &str, actual: &str) -> f64;

    fn prompt_format_name(&self, strategy: &str) -> String {
        prompt_format_name(strategy)
    }

    fn supports(&self, strategy: &str) -> bool {
        self.strategies().contains(&strategy)
    }

    fn unsupported(&self, strategy: &str) -> LabError {
        LabError::UnsupportedStrategy {
            task: self.name().to_string(),
            strategy: strategy.to_string(),
        }
    }
}

/// Display name for a strategy label; unknown labels pass through.
pub fn prompt_format_name(strategy: &str) -> String {
    match strategy {
        "zero_shot" => "Zero-shot",
        "one_shot" => "One-shot",
        "few_shot" => "Few-shot",
        "vanilla" => "Vanilla",
        "zero_shot_cot" => "Zero-shot CoT",
        "few_shot_cot" => "Few-shot CoT",
        other => other,
    }
    .to_string()
}

/// Summary of a task for listings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskInfo {
    pub key: String,
    pub name: String,
    pub test_data_count: usize,
    pub available_strategies: Vec<String>,
}

impl TaskInfo {
    pub fn of(key: &str, task: &dyn Task) -> Self {
        Self {
            key: key.to_string(),
            name: task.name().to_string(),
            test_data_count: task.test_data().len(),
            available_strategies: task.default_strategies(),
        }
    }
}
