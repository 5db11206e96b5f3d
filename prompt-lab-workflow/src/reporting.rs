use chrono::{DateTime, Local, Utc};
use prompt_lab_core::{Result, ResultTable, RESULT_COLUMNS};
use prompt_lab_metrics::{best_strategy, strategy_performance, AggregatedMetrics, MetricAggregator};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

pub const SUMMARY_FILE_NAME: &str = "experiment_summary.json";
pub const REPORTS_DIR: &str = "reports";

/// File-name timestamp, local time.
fn file_timestamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

// ===== Run Summary =====

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskSummary {
    pub total_tests: usize,
    pub successful_tests: usize,
    pub average_accuracy: f64,
    pub best_strategy: String,
    /// Distribution of the scored rows' accuracies.
    pub accuracy_stats: AggregatedMetrics,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OverallStats {
    pub total_tests: usize,
    pub overall_accuracy: f64,
}

/// Cross-task summary of a batch run, persisted as `experiment_summary.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub tasks: BTreeMap<String, TaskSummary>,
    pub overall_stats: OverallStats,
}

impl RunSummary {
    pub fn from_results(all_results: &[(String, ResultTable)]) -> Self {
        let mut tasks = BTreeMap::new();
        let mut total_tests = 0;
        let mut task_means = Vec::new();
        let mut task_weights = Vec::new();

        for (key, table) in all_results {
            if table.is_empty() {
                continue;
            }
            let accuracies = table.accuracies();
            tasks.insert(
                key.clone(),
                TaskSummary {
                    total_tests: table.len(),
                    successful_tests: accuracies.len(),
                    average_accuracy: table.mean_accuracy().unwrap_or(0.0),
                    best_strategy: best_strategy(table)
                        .map(|(s, _)| s)
                        .unwrap_or_else(|| "Unknown".to_string()),
                    accuracy_stats: MetricAggregator::aggregate(&accuracies),
                },
            );
            total_tests += table.len();
            if let Some(mean) = table.mean_accuracy() {
                task_means.push(mean);
                task_weights.push(accuracies.len() as f64);
            }
        }

        // Task means weighted by scored rows: the mean over every scored row.
        let overall_accuracy =
            MetricAggregator::weighted_average(&task_means, &task_weights).unwrap_or(0.0);

        Self {
            run_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            tasks,
            overall_stats: OverallStats {
                total_tests,
                overall_accuracy,
            },
        }
    }

    pub fn task(&self, key: &str) -> Option<&TaskSummary> {
        self.tasks.get(key)
    }
}

// ===== Report Writer =====

/// Persists result tables and run summaries under an output directory.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn ensure_dir(dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        Ok(())
    }

    /// `<output_dir>/<task_key>_<timestamp>.csv`
    pub fn save_csv(&self, table: &ResultTable, task_key: &str) -> Result<PathBuf> {
        Self::ensure_dir(&self.output_dir)?;
        let path = self
            .output_dir
            .join(format!("{}_{}.csv", task_key, file_timestamp()));
        fs::write(&path, render_csv(table))?;
        info!("Results saved to: {}", path.display());
        Ok(path)
    }

    /// `<output_dir>/<task_key>_<timestamp>.json`
    pub fn save_json(&self, table: &ResultTable, task_key: &str) -> Result<PathBuf> {
        Self::ensure_dir(&self.output_dir)?;
        let path = self
            .output_dir
            .join(format!("{}_{}.json", task_key, file_timestamp()));
        fs::write(&path, table.to_json()?)?;
        info!("Results saved to: {}", path.display());
        Ok(path)
    }

    pub fn save_summary(&self, summary: &RunSummary) -> Result<PathBuf> {
        Self::ensure_dir(&self.output_dir)?;
        let path = self.output_dir.join(SUMMARY_FILE_NAME);
        fs::write(&path, serde_json::to_string_pretty(summary)?)?;
        Ok(path)
    }

    /// `<output_dir>/reports/comprehensive_report_<timestamp>.html`
    pub fn write_html(&self, all_results: &[(String, ResultTable)]) -> Result<PathBuf> {
        let dir = self.output_dir.join(REPORTS_DIR);
        Self::ensure_dir(&dir)?;
        let path = dir.join(format!("comprehensive_report_{}.html", file_timestamp()));
        fs::write(&path, render_html(all_results))?;
        info!("Comprehensive report generated: {}", path.display());
        Ok(path)
    }
}

// ===== Renderers =====

/// Quote a CSV cell when it holds a separator, quote or line break.
pub fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// CSV with the fixed result columns as header.
pub fn render_csv(table: &ResultTable) -> String {
    let mut out = String::new();
    out.push_str(&RESULT_COLUMNS.join(","));
    out.push('\n');
    for row in table.rows() {
        let cells: Vec<String> = row.cells().iter().map(|c| csv_field(c)).collect();
        out.push_str(&cells.join(","));
        out.push('\n');
    }
    out
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// `text_classification` -> `Text Classification`
fn title_case(key: &str) -> String {
    key.split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.3}")).unwrap_or_else(|| "-".to_string())
}

fn task_section(key: &str, table: &ResultTable) -> String {
    let mut html = String::new();
    html.push_str("  <div class=\"task-section\">\n");
    html.push_str(&format!("    <h2>{}</h2>\n", escape_html(&title_case(key))));

    let best = best_strategy(table)
        .map(|(s, _)| s)
        .unwrap_or_else(|| "Unknown".to_string());
    html.push_str(&format!(
        "    <div class=\"metric\">Average Accuracy: <strong>{}</strong></div>\n",
        fmt_opt(table.mean_accuracy())
    ));
    html.push_str(&format!(
        "    <div class=\"metric\">Best Strategy: <strong>{}</strong></div>\n",
        escape_html(&best)
    ));
    html.push_str(&format!(
        "    <div class=\"metric\">Total Tests: <strong>{}</strong></div>\n",
        table.len()
    ));

    html.push_str("    <h3>Strategy Performance</h3>\n");
    html.push_str("    <table>\n");
    html.push_str("      <tr><th>Prompt Type</th><th>Prompt Format</th><th>Mean</th><th>Std</th><th>Count</th></tr>\n");
    for perf in strategy_performance(table) {
        html.push_str(&format!(
            "      <tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape_html(&perf.prompt_type),
            escape_html(&perf.prompt_format),
            perf.mean.map(|m| m.to_string()).unwrap_or_else(|| "-".to_string()),
            perf.std_dev.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string()),
            perf.count
        ));
    }
    html.push_str("    </table>\n");
    html.push_str("  </div>\n");
    html
}

fn comparison_section(all_results: &[(String, ResultTable)]) -> String {
    let mut html = String::new();
    html.push_str("  <div class=\"task-section\">\n");
    html.push_str("    <h2>Cross-Task Analysis</h2>\n");
    html.push_str("    <h3>Task Performance Summary</h3>\n");
    html.push_str("    <table>\n");
    html.push_str("      <tr><th>Task</th><th>Avg Accuracy</th><th>Total Tests</th><th>Best Strategy</th></tr>\n");
    for (key, table) in all_results {
        let best = best_strategy(table)
            .map(|(s, _)| s)
            .unwrap_or_else(|| "Unknown".to_string());
        html.push_str(&format!(
            "      <tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape_html(&title_case(key)),
            fmt_opt(table.mean_accuracy()),
            table.len(),
            escape_html(&best)
        ));
    }
    html.push_str("    </table>\n");
    html.push_str("  </div>\n");
    html
}

/// Self-contained HTML report: one section per task plus a cross-task table.
pub fn render_html(all_results: &[(String, ResultTable)]) -> String {
    let mut html = String::from("<!DOCTYPE html>\n<html lang=\"tr\">\n<head>\n");
    html.push_str("  <meta charset=\"UTF-8\">\n");
    html.push_str("  <title>Prompt Engineering Analysis Report</title>\n");
    html.push_str("  <style>\n");
    html.push_str("    body { font-family: Arial, sans-serif; margin: 40px; }\n");
    html.push_str("    .header { background-color: #f4f4f4; padding: 20px; border-radius: 5px; }\n");
    html.push_str("    .task-section { margin: 30px 0; border: 1px solid #ddd; padding: 20px; }\n");
    html.push_str("    .metric { display: inline-block; margin: 10px; padding: 10px; background: #e8f4f8; border-radius: 3px; }\n");
    html.push_str("    table { border-collapse: collapse; width: 100%; }\n");
    html.push_str("    th, td { border: 1px solid #ddd; padding: 8px; text-align: left; }\n");
    html.push_str("    th { background-color: #f2f2f2; }\n");
    html.push_str("  </style>\n");
    html.push_str("</head>\n<body>\n");

    html.push_str("  <div class=\"header\">\n");
    html.push_str("    <h1>Prompt Engineering Analysis Report</h1>\n");
    html.push_str(&format!(
        "    <p>Generated: {}</p>\n",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    ));
    html.push_str(&format!(
        "    <p>Total Tasks Analyzed: {}</p>\n",
        all_results.len()
    ));
    html.push_str("  </div>\n");

    for (key, table) in all_results {
        html.push_str(&task_section(key, table));
    }
    html.push_str(&comparison_section(all_results));

    html.push_str("</body>\n</html>\n");
    html
}
