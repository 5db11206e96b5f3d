//! CLI execution context

use anyhow::{Context as _, Result};
use prompt_lab_core::{parse_override, LabConfig};
use prompt_lab_workflow::ExperimentRunner;

use crate::cli::Cli;
use crate::output::{OutputFormat, OutputWriter};

/// Execution context for CLI commands
pub struct Context {
    /// Effective configuration (file, environment, then `--set` overrides)
    pub config: LabConfig,

    /// Output format
    pub output_format: OutputFormat,

    /// Output writer
    pub output: OutputWriter,
}

impl Context {
    /// Create a new context from CLI arguments
    pub fn new(cli: &Cli) -> Result<Self> {
        let mut overrides = cli
            .overrides
            .iter()
            .map(|raw| parse_override(raw))
            .collect::<prompt_lab_core::Result<Vec<_>>>()?;
        if cli.mock {
            overrides.push(("model.mock_mode".to_string(), "true".to_string()));
        }

        let config = LabConfig::load(&cli.config, &overrides).with_context(|| {
            format!("Failed to load configuration from {}", cli.config.display())
        })?;

        Ok(Self {
            config,
            output_format: cli.output_format,
            output: OutputWriter::new(cli.output_format, cli.no_color),
        })
    }

    /// Create an experiment runner for the effective configuration
    pub fn create_runner(&self) -> Result<ExperimentRunner> {
        ExperimentRunner::new(self.config.clone()).context("Failed to create experiment runner")
    }
}
