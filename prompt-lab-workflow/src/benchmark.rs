use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sysinfo::System;
use std::time::Instant;
use tracing::{info, warn};

use crate::runner::ExperimentRunner;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Timings and memory deltas of repeated runs of one task.
///
/// Only successful iterations contribute to the series and statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub task_key: String,
    pub iterations: usize,
    pub execution_times: Vec<f64>,
    pub memory_usage_mb: Vec<f64>,
    pub avg_execution_time: Option<f64>,
    pub min_execution_time: Option<f64>,
    pub max_execution_time: Option<f64>,
    pub avg_memory_usage: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl BenchmarkResult {
    pub fn successful_iterations(&self) -> usize {
        self.execution_times.len()
    }
}

pub struct BenchmarkRunner<'a> {
    runner: &'a mut ExperimentRunner,
    system: System,
    results: Vec<BenchmarkResult>,
}

impl<'a> BenchmarkRunner<'a> {
    pub fn new(runner: &'a mut ExperimentRunner) -> Self {
        Self {
            runner,
            system: System::new(),
            results: Vec::new(),
        }
    }

    fn used_memory_mb(&mut self) -> f64 {
        self.system.refresh_memory();
        self.system.used_memory() as f64 / BYTES_PER_MB
    }

    pub async fn run(&mut self, task_key: &str, iterations: usize) -> BenchmarkResult {
        let mut execution_times = Vec::with_capacity(iterations);
        let mut memory_usage_mb = Vec::with_capacity(iterations);

        for i in 0..iterations {
            info!("Benchmark iteration {}/{} for {}", i + 1, iterations, task_key);

            let start_memory = self.used_memory_mb();
            let started = Instant::now();
            let outcome = self.runner.run_single_task(task_key, None).await;
            let elapsed = started.elapsed().as_secs_f64();
            let end_memory = self.used_memory_mb();

            match outcome {
                Ok(_) => {
                    let delta = end_memory - start_memory;
                    info!(
                        execution_time = format_args!("{elapsed:.2}s"),
                        memory_delta = format_args!("{delta:.2}MB"),
                        "Benchmark iteration finished"
                    );
                    execution_times.push(elapsed);
                    memory_usage_mb.push(delta.max(0.0));
                }
                Err(e) => warn!("Benchmark iteration {} failed: {}", i + 1, e),
            }
        }

        let mean = |values: &[f64]| {
            if values.is_empty() {
                None
            } else {
                Some(values.iter().sum::<f64>() / values.len() as f64)
            }
        };

        let result = BenchmarkResult {
            task_key: task_key.to_string(),
            iterations,
            avg_execution_time: mean(&execution_times),
            min_execution_time: execution_times.iter().copied().reduce(f64::min),
            max_execution_time: execution_times.iter().copied().reduce(f64::max),
            avg_memory_usage: mean(&memory_usage_mb),
            execution_times,
            memory_usage_mb,
            timestamp: Utc::now(),
        };

        self.results.push(result.clone());
        result
    }

    /// Every result recorded by this benchmark runner, oldest first.
    pub fn results(&self) -> &[BenchmarkResult] {
        &self.results
    }
}
