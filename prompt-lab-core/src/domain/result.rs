use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Column headers of a result table, in output order.
pub const RESULT_COLUMNS: [&str; 7] = [
    "Task",
    "Prompt Type",
    "Prompt Format",
    "Input",
    "Response",
    "Expected",
    "Accuracy",
];

/// Outcome of one trial: a single strategy applied to a single test case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskResult {
    pub task_name: String,
    pub prompt_type: String,
    pub prompt_format: String,
    pub input_text: String,
    pub model_response: String,
    pub expected_output: Option<String>,
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

/// One row of a result table, serialized with the display column names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultRow {
    #[serde(rename = "Task")]
    pub task: String,
    #[serde(rename = "Prompt Type")]
    pub prompt_type: String,
    #[serde(rename = "Prompt Format")]
    pub prompt_format: String,
    #[serde(rename = "Input")]
    pub input: String,
    #[serde(rename = "Response")]
    pub response: String,
    #[serde(rename = "Expected")]
    pub expected: Option<String>,
    #[serde(rename = "Accuracy")]
    pub accuracy: Option<f64>,
}

impl From<&TaskResult> for ResultRow {
    fn from(result: &TaskResult) -> Self {
        Self {
            task: result.task_name.clone(),
            prompt_type: result.prompt_type.clone(),
            prompt_format: result.prompt_format.clone(),
            input: result.input_text.clone(),
            response: result.model_response.clone(),
            expected: result.expected_output.clone(),
            accuracy: result.accuracy,
        }
    }
}

impl ResultRow {
    /// Cell values in `RESULT_COLUMNS` order; missing values render empty.
    pub fn cells(&self) -> [String; 7] {
        [
            self.task.clone(),
            self.prompt_type.clone(),
            self.prompt_format.clone(),
            self.input.clone(),
            self.response.clone(),
            self.expected.clone().unwrap_or_default(),
            self.accuracy.map(|a| a.to_string()).unwrap_or_default(),
        ]
    }
}

/// Ordered results of one experiment run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResultTable {
    results: Vec<TaskResult>,
}

impl ResultTable {
    pub fn new(results: Vec<TaskResult>) -> Self {
        Self { results }
    }

    pub fn results(&self) -> &[TaskResult] {
        &self.results
    }

    pub fn rows(&self) -> Vec<ResultRow> {
        self.results.iter().map(ResultRow::from).collect()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Accuracy values that are present, in row order.
    pub fn accuracies(&self) -> Vec<f64> {
        self.results.iter().filter_map(|r| r.accuracy).collect()
    }

    pub fn mean_accuracy(&self) -> Option<f64> {
        let values = self.accuracies();
        if values.is_empty() {
            return None;
        }
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }

    /// Distinct prompt types in first-seen order.
    pub fn prompt_types(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for result in &self.results {
            if !seen.contains(&result.prompt_type.as_str()) {
                seen.push(&result.prompt_type);
            }
        }
        seen
    }

    pub fn for_prompt_type<'a>(&'a self, prompt_type: &'a str) -> impl Iterator<Item = &'a TaskResult> + 'a {
        self.results.iter().filter(move |r| r.prompt_type == prompt_type)
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(&self.rows())?)
    }
}

impl IntoIterator for ResultTable {
    type Item = TaskResult;
    type IntoIter = std::vec::IntoIter<TaskResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}
