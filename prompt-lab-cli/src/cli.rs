use clap::{Parser, Subcommand};
use prompt_lab_core::DEFAULT_CONFIG_PATH;
use std::path::PathBuf;

use crate::output::OutputFormat;

/// Prompt engineering experiment harness
#[derive(Debug, Parser)]
#[command(name = "prompt-lab", version, about, long_about = None)]
pub struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH, env = "PROMPT_LAB_CONFIG")]
    pub config: PathBuf,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Console)]
    pub output_format: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Use canned model responses instead of the live API
    #[arg(long, global = true)]
    pub mock: bool,

    /// Override a setting, e.g. `--set model.temperature=0.3`
    #[arg(long = "set", global = true, value_name = "KEY=VALUE")]
    pub overrides: Vec<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List registered tasks
    ListTasks,

    /// Show details about a task
    TaskInfo {
        /// Task key, e.g. `text_classification`
        task: String,
    },

    /// Run one task
    Run {
        /// Task key
        #[arg(short, long)]
        task: String,

        /// Strategies to run (defaults to the configured or built-in list)
        #[arg(short, long, value_delimiter = ',')]
        strategies: Option<Vec<String>>,
    },

    /// Run every registered task and write the summary and HTML report
    RunAll,

    /// Run every known strategy against one task and rank them
    Compare {
        /// Task key
        #[arg(short, long)]
        task: String,
    },

    /// Time repeated runs of one task
    Benchmark {
        /// Task key
        #[arg(short, long, default_value = "mathematical_reasoning")]
        task: String,

        /// Number of iterations
        #[arg(short, long, default_value = "3")]
        iterations: usize,
    },
}
