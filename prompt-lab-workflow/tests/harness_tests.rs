use pretty_assertions::assert_eq;
use prompt_lab_core::{LabError, PromptLibrary, Result, TestCase};
use prompt_lab_workflow::*;
use std::sync::Arc;

fn strategies(labels: &[&str]) -> Vec<String> {
    labels.iter().map(|s| s.to_string()).collect()
}

/// Two cases, one of them without an expected output.
struct EchoTask;

impl Task for EchoTask {
    fn name(&self) -> &str {
        "Echo"
    }

    fn test_data(&self) -> Vec<TestCase> {
        vec![
            TestCase::new("a", "alpha").with_expected("alpha"),
            TestCase::new("b", "beta"),
        ]
    }

    fn strategies(&self) -> &[&'static str] {
        &["plain", "shout"]
    }

    fn generate_prompt(&self, strategy: &str, case: &TestCase) -> Result<String> {
        match strategy {
            "plain" => Ok(case.input_text.clone()),
            "shout" => Ok(case.input_text.to_uppercase()),
            other => Err(self.unsupported(other)),
        }
    }

    fn evaluate_response(&self, expected: &str, actual: &str) -> f64 {
        if expected == actual {
            1.0
        } else {
            0.0
        }
    }
}

/// Scorer that misbehaves, to check the harness keeps accuracies in range.
struct OverscoringTask;

impl Task for OverscoringTask {
    fn name(&self) -> &str {
        "Overscoring"
    }

    fn test_data(&self) -> Vec<TestCase> {
        vec![
            TestCase::new("hi", "x").with_expected("x"),
            TestCase::new("nan", "y").with_expected("y"),
        ]
    }

    fn strategies(&self) -> &[&'static str] {
        &["plain"]
    }

    fn generate_prompt(&self, _strategy: &str, case: &TestCase) -> Result<String> {
        Ok(case.input_text.clone())
    }

    fn evaluate_response(&self, expected: &str, _actual: &str) -> f64 {
        if expected == "x" {
            3.5
        } else {
            f64::NAN
        }
    }
}

/// Task whose prompt builder fails outright for one case, with an error that
/// is not trial-scoped.
struct BrokenCaseTask;

impl Task for BrokenCaseTask {
    fn name(&self) -> &str {
        "Broken"
    }

    fn test_data(&self) -> Vec<TestCase> {
        vec![
            TestCase::new("good", "fine")
                .with_expected("fine")
                .with_metadata("difficulty", serde_json::json!("easy")),
            TestCase::new("bad", "corrupt").with_expected("corrupt"),
        ]
    }

    fn strategies(&self) -> &[&'static str] {
        &["plain"]
    }

    fn generate_prompt(&self, _strategy: &str, case: &TestCase) -> Result<String> {
        if case.id == "bad" {
            return Err(LabError::Validation("case data is corrupt".into()));
        }
        Ok(case.input_text.clone())
    }

    fn evaluate_response(&self, expected: &str, actual: &str) -> f64 {
        if expected == actual {
            1.0
        } else {
            0.0
        }
    }
}

// ===== Ordering Tests =====

#[tokio::test]
async fn test_rows_are_strategy_major() {
    let client = StubModelClient::new().with_response("a", "alpha").with_response("b", "beta");
    let table = run_experiment(&EchoTask, &client, &strategies(&["plain", "shout"])).await;

    assert_eq!(table.len(), 4);
    let order: Vec<(&str, &str)> = table
        .results()
        .iter()
        .map(|r| (r.prompt_type.as_str(), r.input_text.as_str()))
        .collect();
    assert_eq!(
        order,
        vec![
            ("plain", "alpha"),
            ("plain", "beta"),
            ("shout", "alpha"),
            ("shout", "beta"),
        ]
    );

    let prompts: Vec<String> = client.calls().into_iter().map(|c| c.prompt).collect();
    assert_eq!(prompts, vec!["alpha", "beta", "ALPHA", "BETA"]);
}

#[tokio::test]
async fn test_missing_expected_output_yields_no_accuracy() {
    let client = StubModelClient::new().with_fallback("alpha");
    let table = run_experiment(&EchoTask, &client, &strategies(&["plain"])).await;

    assert_eq!(table.results()[0].accuracy, Some(1.0));
    assert_eq!(table.results()[1].accuracy, None);
    assert_eq!(table.results()[1].expected_output, None);
}

#[tokio::test]
async fn test_result_metadata_records_case_and_latency() {
    let client = StubModelClient::new().with_fallback("alpha");
    let table = run_experiment(&EchoTask, &client, &strategies(&["plain"])).await;

    let metadata = &table.results()[0].metadata;
    assert_eq!(metadata["case_id"], serde_json::json!("a"));
    assert!(metadata.contains_key("latency_ms"));
}

// ===== Failure Isolation Tests =====

#[tokio::test]
async fn test_failing_trial_drops_exactly_one_row() {
    let client = StubModelClient::new()
        .with_fallback("ok")
        .with_failure("b", Some("shout"));
    let table = run_experiment(&EchoTask, &client, &strategies(&["plain", "shout"])).await;

    assert_eq!(table.len(), 3);
    assert!(!table
        .results()
        .iter()
        .any(|r| r.prompt_type == "shout" && r.input_text == "beta"));
}

#[tokio::test]
async fn test_unsupported_strategy_is_skipped() {
    let client = StubModelClient::new().with_fallback("ok");
    let table = run_experiment(&EchoTask, &client, &strategies(&["plain", "bogus"])).await;

    assert_eq!(table.len(), 2);
    assert_eq!(table.prompt_types(), vec!["plain"]);
    // no prompt for the unsupported strategy ever reaches the client
    assert_eq!(client.call_count(), 2);
}

#[tokio::test]
async fn test_unexpected_error_kind_still_skips_only_that_trial() {
    let client = StubModelClient::new().with_fallback("fine");
    let table = run_experiment(&BrokenCaseTask, &client, &strategies(&["plain"])).await;

    assert_eq!(table.len(), 1);
    assert_eq!(table.results()[0].input_text, "fine");
    assert_eq!(client.call_count(), 1);
}

#[tokio::test]
async fn test_case_metadata_reaches_the_result_row() {
    let client = StubModelClient::new().with_fallback("fine");
    let table = run_experiment(&BrokenCaseTask, &client, &strategies(&["plain"])).await;

    let metadata = &table.results()[0].metadata;
    assert_eq!(metadata["difficulty"], serde_json::json!("easy"));
    assert_eq!(metadata["case_id"], serde_json::json!("good"));
}

#[tokio::test]
async fn test_empty_strategy_list_yields_empty_table() {
    let client = StubModelClient::new();
    let table = run_experiment(&EchoTask, &client, &[]).await;
    assert!(table.is_empty());
    assert_eq!(client.call_count(), 0);
}

#[tokio::test]
async fn test_out_of_range_scores_are_clamped() {
    let client = StubModelClient::new().with_fallback("whatever");
    let table = run_experiment(&OverscoringTask, &client, &strategies(&["plain"])).await;

    assert_eq!(table.accuracies(), vec![1.0, 0.0]);
}

// ===== Progress Tests =====

#[tokio::test]
async fn test_progress_events_cover_every_trial() {
    let executor = ExperimentExecutor::new();
    let mut rx = executor.enable_progress_tracking().await;
    let client = StubModelClient::new()
        .with_fallback("ok")
        .with_failure("a", None);

    executor
        .run_experiment(&EchoTask, &client, &strategies(&["plain"]))
        .await;

    let first = rx.recv().await.unwrap();
    let second = rx.recv().await.unwrap();
    assert_eq!(first.status, TrialStatus::Skipped);
    assert!(first.message.is_some());
    assert_eq!(second.status, TrialStatus::Completed);
    assert_eq!((second.completed, second.total), (2, 2));
}

// ===== Built-in Task Tests =====

#[tokio::test]
async fn test_builtin_math_task_against_stub() {
    let task = MathematicalReasoningTask::new(Arc::new(PromptLibrary::new()));
    let client = StubModelClient::for_builtin_tasks();
    let table = run_experiment(&task, &client, &task.default_strategies()).await;

    assert_eq!(table.len(), 9);
    for result in table.results() {
        let accuracy = result.accuracy.unwrap();
        assert!(accuracy >= 0.86, "{} scored {accuracy}", result.prompt_type);
    }
    assert_eq!(table.results()[0].prompt_format, "Vanilla");
}

#[tokio::test]
async fn test_builtin_sentiment_task_against_stub() {
    let task = TextClassificationTask::new(Arc::new(PromptLibrary::new()));
    let client = StubModelClient::for_builtin_tasks();
    let table = run_experiment(&task, &client, &task.default_strategies()).await;

    assert_eq!(table.len(), 15);
    assert_eq!(table.mean_accuracy(), Some(1.0));
}
