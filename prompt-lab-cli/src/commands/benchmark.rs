//! Benchmark command

use anyhow::Result;
use prompt_lab_workflow::{BenchmarkResult, BenchmarkRunner};

use crate::context::Context;
use crate::output::{print_field, print_section, TableDisplay};

fn seconds(value: Option<f64>) -> String {
    value
        .map(|v| format!("{v:.3}s"))
        .unwrap_or_else(|| "-".to_string())
}

impl TableDisplay for BenchmarkResult {
    fn headers(&self) -> Vec<&'static str> {
        vec!["Task", "Iterations", "Successful", "Avg Time", "Min Time", "Max Time", "Avg Memory"]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.task_key.clone(),
            self.iterations.to_string(),
            self.successful_iterations().to_string(),
            seconds(self.avg_execution_time),
            seconds(self.min_execution_time),
            seconds(self.max_execution_time),
            self.avg_memory_usage
                .map(|m| format!("{m:.1} MB"))
                .unwrap_or_else(|| "-".to_string()),
        ]
    }

    fn display_single(&self) {
        print_section("Benchmark");
        for (header, value) in self.headers().into_iter().zip(self.fields()) {
            print_field(header, &value);
        }
    }
}

pub async fn execute(ctx: &Context, task: &str, iterations: usize) -> Result<()> {
    if iterations == 0 {
        anyhow::bail!("iterations must be at least 1");
    }

    let mut runner = ctx.create_runner()?;
    // Fail fast on unknown keys instead of timing nothing.
    runner.task(task)?;

    let pb = ctx.output.progress_bar(1, &format!("benchmarking {task}"));
    pb.enable_steady_tick(std::time::Duration::from_millis(120));
    let result = BenchmarkRunner::new(&mut runner).run(task, iterations).await;
    pb.finish_and_clear();

    if result.successful_iterations() == 0 {
        ctx.output.warning("No iteration completed successfully");
    }

    ctx.output.write(&result)
}
