//! Experiment run commands

use anyhow::Result;
use colored::Colorize;
use prompt_lab_workflow::{detailed_analysis, render_csv, render_html, MATHEMATICAL_REASONING_KEY};
use serde_json::json;

use crate::commands::track_progress;
use crate::context::Context;
use crate::output::{accuracy_badge, print_field, print_section, OutputFormat};

pub async fn run(ctx: &Context, task: &str, strategies: Option<Vec<String>>) -> Result<()> {
    let mut runner = ctx.create_runner()?;

    let (pb, handle) = track_progress(ctx, &runner, task).await;
    let outcome = runner.run_single_task(task, strategies.as_deref()).await;
    handle.abort();
    pb.finish_and_clear();
    let table = outcome?;

    ctx.output.write_results(task, &table)?;

    if ctx.output.is_console() && task == MATHEMATICAL_REASONING_KEY {
        let analysis = detailed_analysis(&table);
        print_section("Analysis");
        print_field("Perfect scores", &analysis.overview.perfect_scores.to_string());
        for strategy in &analysis.strategy_performance {
            let consistency = strategy
                .consistency
                .map(|c| format!("{c:.3}"))
                .unwrap_or_else(|| "-".to_string());
            print_field(
                &strategy.strategy,
                &format!(
                    "accuracy {}, consistency {}",
                    accuracy_badge(strategy.accuracy),
                    consistency
                ),
            );
        }
        for recommendation in &analysis.recommendations {
            ctx.output.info(recommendation);
        }
    }

    Ok(())
}

pub async fn run_all(ctx: &Context) -> Result<()> {
    let mut runner = ctx.create_runner()?;

    let (pb, handle) = track_progress(ctx, &runner, "all tasks").await;
    let outcome = runner.run_all_tasks().await;
    handle.abort();
    pb.finish_and_clear();

    match ctx.output_format {
        OutputFormat::Console => {
            for (key, table) in &outcome.results {
                print_section(&key.bold().to_string());
                ctx.output.write_results(key, table)?;
            }
            for (key, error) in &outcome.failures {
                ctx.output.error(&format!("{key} failed: {error}"));
            }

            print_section("Overall");
            print_field(
                "Total tests",
                &outcome.summary.overall_stats.total_tests.to_string(),
            );
            print_field(
                "Overall accuracy",
                &accuracy_badge(Some(outcome.summary.overall_stats.overall_accuracy)),
            );
            if let Some(path) = &outcome.summary_path {
                ctx.output
                    .success(&format!("Summary saved to {}", path.display()));
            }
            if let Some(path) = &outcome.report_path {
                ctx.output
                    .success(&format!("Comprehensive report generated: {}", path.display()));
            }
        }
        OutputFormat::Json => {
            let mut results = serde_json::Map::new();
            for (key, table) in &outcome.results {
                results.insert(key.clone(), serde_json::to_value(table.rows())?);
            }
            let body = json!({
                "summary": outcome.summary,
                "results": results,
                "failures": outcome.failures,
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        OutputFormat::Csv => {
            for (_, table) in &outcome.results {
                print!("{}", render_csv(table));
            }
        }
        OutputFormat::Html => print!("{}", render_html(&outcome.results)),
    }

    if outcome.results.is_empty() && !outcome.failures.is_empty() {
        anyhow::bail!("every task failed");
    }
    Ok(())
}
