use prompt_lab_core::ResponseScorer;

pub const SENTIMENT_LABELS: [&str; 3] = ["Olumlu", "Olumsuz", "Nötr"];

/// Exact-label accuracy for classification responses.
///
/// The first known label whose lower-case form occurs anywhere in the
/// response wins, so label order matters when one label is a substring of
/// another.
#[derive(Debug, Clone)]
pub struct LabelMatcher {
    labels: Vec<String>,
}

impl LabelMatcher {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn sentiment() -> Self {
        Self::new(SENTIMENT_LABELS)
    }

    pub fn extract_label(&self, response: &str) -> Option<&str> {
        let response = response.trim().to_lowercase();
        self.labels
            .iter()
            .find(|label| response.contains(&label.to_lowercase()))
            .map(String::as_str)
    }
}

impl Default for LabelMatcher {
    fn default() -> Self {
        Self::sentiment()
    }
}

impl ResponseScorer for LabelMatcher {
    fn score(&self, expected: &str, actual: &str) -> f64 {
        match self.extract_label(actual) {
            Some(label) if label.to_lowercase() == expected.trim().to_lowercase() => 1.0,
            _ => 0.0,
        }
    }
}
