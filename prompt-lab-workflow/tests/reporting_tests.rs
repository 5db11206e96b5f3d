use pretty_assertions::assert_eq;
use prompt_lab_core::{ResultTable, TaskResult};
use prompt_lab_workflow::*;
use std::collections::HashMap;
use std::fs;
use tempfile::TempDir;

fn result(strategy: &str, response: &str, accuracy: Option<f64>) -> TaskResult {
    TaskResult {
        task_name: "Text Classification - Sentiment Analysis".to_string(),
        prompt_type: strategy.to_string(),
        prompt_format: prompt_format_name(strategy),
        input_text: "Toplantı saat 10:00'da başlayacak.".to_string(),
        model_response: response.to_string(),
        expected_output: accuracy.map(|_| "Nötr".to_string()),
        accuracy,
        metadata: HashMap::new(),
    }
}

fn sample_table() -> ResultTable {
    ResultTable::new(vec![
        result("zero_shot", "Nötr", Some(1.0)),
        result("few_shot", "Olumlu, sanırım", Some(0.0)),
        result("few_shot", "\"Nötr\"", None),
    ])
}

// ===== CSV Tests =====

#[test]
fn test_render_csv_header_and_quoting() {
    let csv = render_csv(&sample_table());
    let mut lines = csv.lines();
    assert_eq!(
        lines.next().unwrap(),
        "Task,Prompt Type,Prompt Format,Input,Response,Expected,Accuracy"
    );
    assert_eq!(
        lines.next().unwrap(),
        "Text Classification - Sentiment Analysis,zero_shot,Zero-shot,Toplantı saat 10:00'da başlayacak.,Nötr,Nötr,1"
    );
    assert!(lines.next().unwrap().contains(",\"Olumlu, sanırım\","));
    assert!(lines.next().unwrap().ends_with(",\"\"\"Nötr\"\"\",,"));
}

#[test]
fn test_save_csv_names_file_after_task_key() {
    let dir = TempDir::new().unwrap();
    let writer = ReportWriter::new(dir.path().join("nested"));

    let path = writer.save_csv(&sample_table(), "text_classification").unwrap();
    let name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("text_classification_"));
    assert!(name.ends_with(".csv"));
    assert_eq!(fs::read_to_string(&path).unwrap(), render_csv(&sample_table()));
}

#[test]
fn test_save_json_uses_display_columns() {
    let dir = TempDir::new().unwrap();
    let writer = ReportWriter::new(dir.path());

    let path = writer.save_json(&sample_table(), "text_classification").unwrap();
    let rows: serde_json::Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(rows.as_array().unwrap().len(), 3);
    assert_eq!(rows[0]["Prompt Format"], "Zero-shot");
    assert!(rows[2]["Accuracy"].is_null());
}

// ===== Summary Tests =====

#[test]
fn test_run_summary_counts() {
    let results = vec![
        ("text_classification".to_string(), sample_table()),
        ("empty".to_string(), ResultTable::default()),
    ];
    let summary = RunSummary::from_results(&results);

    let task = summary.task("text_classification").unwrap();
    assert_eq!(task.total_tests, 3);
    assert_eq!(task.successful_tests, 2);
    assert_eq!(task.average_accuracy, 0.5);
    assert_eq!(task.best_strategy, "zero_shot");
    assert_eq!(task.accuracy_stats.count, 2);
    assert_eq!(task.accuracy_stats.min, rust_decimal::Decimal::ZERO);
    assert_eq!(task.accuracy_stats.max, rust_decimal::Decimal::ONE);
    assert!(summary.task("empty").is_none());

    assert_eq!(summary.overall_stats.total_tests, 3);
    assert_eq!(summary.overall_stats.overall_accuracy, 0.5);
}

#[test]
fn test_overall_accuracy_weights_tasks_by_scored_rows() {
    let perfect = ResultTable::new(vec![result("zero_shot", "Nötr", Some(1.0))]);
    let results = vec![
        ("text_classification".to_string(), sample_table()),
        ("other".to_string(), perfect),
    ];
    let summary = RunSummary::from_results(&results);

    // (1.0 + 0.0 + 1.0) / 3 scored rows, not (0.5 + 1.0) / 2 tasks
    assert!((summary.overall_stats.overall_accuracy - 2.0 / 3.0).abs() < 1e-12);
    assert_eq!(summary.overall_stats.total_tests, 4);
}

#[test]
fn test_save_summary_round_trips() {
    let dir = TempDir::new().unwrap();
    let writer = ReportWriter::new(dir.path());
    let summary = RunSummary::from_results(&[("text_classification".to_string(), sample_table())]);

    let path = writer.save_summary(&summary).unwrap();
    assert_eq!(path.file_name().unwrap(), SUMMARY_FILE_NAME);
    let loaded: RunSummary = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(loaded, summary);
}

// ===== HTML Tests =====

#[test]
fn test_render_html_sections() {
    let results = vec![("text_classification".to_string(), sample_table())];
    let html = render_html(&results);

    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<h2>Text Classification</h2>"));
    assert!(html.contains("Total Tasks Analyzed: 1"));
    assert!(html.contains("Best Strategy: <strong>zero_shot</strong>"));
    assert!(html.contains("<h2>Cross-Task Analysis</h2>"));
    assert!(html.contains("<td>Few-shot</td>"));
}

#[test]
fn test_write_html_goes_to_reports_dir() {
    let dir = TempDir::new().unwrap();
    let writer = ReportWriter::new(dir.path());

    let path = writer
        .write_html(&[("mathematical_reasoning".to_string(), sample_table())])
        .unwrap();
    assert_eq!(path.parent().unwrap(), dir.path().join(REPORTS_DIR));
    let name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("comprehensive_report_"));
    assert!(name.ends_with(".html"));
}

#[test]
fn test_html_escapes_model_text() {
    let table = ResultTable::new(vec![result("<script>", "x", Some(1.0))]);
    let html = render_html(&[("t".to_string(), table)]);
    assert!(!html.contains("<script>"));
    assert!(html.contains("&lt;script&gt;"));
}
