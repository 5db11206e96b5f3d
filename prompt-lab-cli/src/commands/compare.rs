//! Strategy comparison command

use anyhow::Result;
use colored::Colorize;

use crate::commands::track_progress;
use crate::context::Context;
use crate::output::{accuracy_badge, print_field, print_section, OutputFormat};

/// Significance level used when reporting the best-vs-worst t-test.
const ALPHA: f64 = 0.05;

pub async fn execute(ctx: &Context, task: &str) -> Result<()> {
    let mut runner = ctx.create_runner()?;

    let (pb, handle) = track_progress(ctx, &runner, task).await;
    let outcome = runner.compare_strategies(task).await;
    handle.abort();
    pb.finish_and_clear();
    let comparison = outcome?;

    match ctx.output_format {
        OutputFormat::Console => {
            print_section(&format!("Strategy comparison: {}", comparison.task_key));
            ctx.output.write_performance(&comparison.performance);

            if let Some((strategy, accuracy)) = &comparison.best {
                print_field("Best", &format!("{} ({})", strategy.green(), accuracy_badge(Some(*accuracy))));
            }
            if let Some((strategy, accuracy)) = &comparison.worst {
                print_field("Worst", &format!("{} ({})", strategy.red(), accuracy_badge(Some(*accuracy))));
            }

            match &comparison.significance {
                Some(result) => {
                    print_field("t statistic", &format!("{:.4}", result.statistic));
                    let p = result
                        .p_value
                        .map(|p| format!("{p:.4}"))
                        .unwrap_or_else(|| "-".to_string());
                    print_field("p-value", &p);
                    if let Some(d) = result.effect_size {
                        print_field("Cohen's d", &format!("{d:.3}"));
                    }
                    if let Some((lower, upper)) = result.confidence_interval {
                        print_field("95% CI of difference", &format!("[{lower:.3}, {upper:.3}]"));
                    }
                    if result.is_significant(ALPHA) {
                        ctx.output.success("Difference is significant at 0.05");
                    } else {
                        ctx.output.info("Difference is not significant at 0.05");
                    }
                }
                None => ctx.output.info("Not enough distinct strategies to test"),
            }

            if !comparison.confidence_intervals.is_empty() {
                print_section("95% confidence intervals");
                for (strategy, (lower, upper)) in &comparison.confidence_intervals {
                    print_field(strategy, &format!("[{lower:.3}, {upper:.3}]"));
                }
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&comparison)?),
        OutputFormat::Csv | OutputFormat::Html => {
            ctx.output.write_results(&comparison.task_key, &comparison.results)?
        }
    }

    Ok(())
}
