use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A fixed input/expected-output pair used to exercise a task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestCase {
    /// Stable identifier, unique within a task.
    pub id: String,
    pub input_text: String,
    pub expected_output: Option<String>,
    pub expected_numbers: Option<Vec<i64>>,
    pub problem_type: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl TestCase {
    pub fn new(id: impl Into<String>, input_text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            input_text: input_text.into(),
            expected_output: None,
            expected_numbers: None,
            problem_type: None,
            metadata: HashMap::new(),
        }
    }

    pub fn with_expected(mut self, expected: impl Into<String>) -> Self {
        self.expected_output = Some(expected.into());
        self
    }

    pub fn with_expected_numbers(mut self, numbers: Vec<i64>) -> Self {
        self.expected_numbers = Some(numbers);
        self
    }

    pub fn with_problem_type(mut self, problem_type: impl Into<String>) -> Self {
        self.problem_type = Some(problem_type.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}
