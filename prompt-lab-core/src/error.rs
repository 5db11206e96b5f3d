use thiserror::Error;

#[derive(Error, Debug)]
pub enum LabError {
    #[error("Unsupported strategy '{strategy}' for task '{task}'")]
    UnsupportedStrategy { task: String, strategy: String },

    #[error("Template not found: {category}.{name}")]
    TemplateNotFound { category: String, name: String },

    #[error("Missing placeholder '{placeholder}' for template {template}")]
    MissingPlaceholder { template: String, placeholder: String },

    #[error("Model generation failed: {0}")]
    ModelGeneration(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Task '{0}' not found")]
    TaskNotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl LabError {
    /// Errors that only invalidate a single trial, as opposed to ones that
    /// point at a broken environment (configuration, IO).
    pub fn is_trial_scoped(&self) -> bool {
        matches!(
            self,
            LabError::UnsupportedStrategy { .. }
                | LabError::TemplateNotFound { .. }
                | LabError::MissingPlaceholder { .. }
                | LabError::ModelGeneration(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, LabError>;

// Implement From for common error types
impl From<serde_json::Error> for LabError {
    fn from(err: serde_json::Error) -> Self {
        LabError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for LabError {
    fn from(err: std::io::Error) -> Self {
        LabError::Io(err.to_string())
    }
}

impl From<config::ConfigError> for LabError {
    fn from(err: config::ConfigError) -> Self {
        LabError::Configuration(err.to_string())
    }
}

impl From<validator::ValidationErrors> for LabError {
    fn from(err: validator::ValidationErrors) -> Self {
        LabError::Validation(err.to_string())
    }
}
