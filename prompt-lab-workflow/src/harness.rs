use prompt_lab_core::{GenerationRequest, ModelClient, Result, ResultTable, TaskResult, TestCase};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, error, info, warn};

use crate::tasks::Task;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum TrialStatus {
    Completed,
    Skipped,
}

/// Progress event for a single (strategy, test case) trial.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialProgress {
    pub task_name: String,
    pub strategy: String,
    pub case_id: String,
    pub completed: usize,
    pub total: usize,
    pub status: TrialStatus,
    pub message: Option<String>,
}

/// Runs every requested strategy against every test case of a task.
///
/// Trials run one after another. A failing trial is logged and produces no
/// row; the run itself never fails. Trial-scoped errors are expected and
/// logged at warn; anything else is logged at error.
#[derive(Default)]
pub struct ExperimentExecutor {
    progress_tx: Arc<RwLock<Option<broadcast::Sender<TrialProgress>>>>,
}

impl ExperimentExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable progress tracking
    pub async fn enable_progress_tracking(&self) -> broadcast::Receiver<TrialProgress> {
        let (tx, rx) = broadcast::channel(256);
        *self.progress_tx.write().await = Some(tx);
        rx
    }

    async fn report_progress(&self, progress: TrialProgress) {
        if let Some(tx) = self.progress_tx.read().await.as_ref() {
            let _ = tx.send(progress);
        }
    }

    /// Strategy-major, test-case-minor loop over the task's fixed test data.
    pub async fn run_experiment(
        &self,
        task: &dyn Task,
        client: &dyn ModelClient,
        strategies: &[String],
    ) -> ResultTable {
        let cases = task.test_data();
        let total = strategies.len() * cases.len();
        let mut results = Vec::with_capacity(total);
        let mut completed = 0;

        info!(
            task = task.name(),
            model = client.name(),
            strategies = strategies.len(),
            cases = cases.len(),
            "Starting experiment"
        );

        for strategy in strategies {
            for case in &cases {
                completed += 1;
                let outcome = self.run_trial(task, client, strategy, case).await;

                let (status, message) = match outcome {
                    Ok(result) => {
                        results.push(result);
                        (TrialStatus::Completed, None)
                    }
                    Err(e) => {
                        if e.is_trial_scoped() {
                            warn!(
                                task = task.name(),
                                strategy = %strategy,
                                case_id = %case.id,
                                error = %e,
                                "Skipping trial"
                            );
                        } else {
                            error!(
                                task = task.name(),
                                strategy = %strategy,
                                case_id = %case.id,
                                error = %e,
                                "Unexpected error, skipping trial"
                            );
                        }
                        (TrialStatus::Skipped, Some(e.to_string()))
                    }
                };

                self.report_progress(TrialProgress {
                    task_name: task.name().to_string(),
                    strategy: strategy.clone(),
                    case_id: case.id.clone(),
                    completed,
                    total,
                    status,
                    message,
                })
                .await;
            }
        }

        info!(
            task = task.name(),
            rows = results.len(),
            skipped = total - results.len(),
            "Experiment finished"
        );

        ResultTable::new(results)
    }

    async fn run_trial(
        &self,
        task: &dyn Task,
        client: &dyn ModelClient,
        strategy: &str,
        case: &TestCase,
    ) -> Result<TaskResult> {
        let prompt = task.generate_prompt(strategy, case)?;
        let request = GenerationRequest::new(&case.id, strategy, prompt);

        let started = Instant::now();
        let response = client.generate(&request).await?;
        let latency_ms = started.elapsed().as_millis() as u64;

        let accuracy = case
            .expected_output
            .as_deref()
            .map(|expected| sanitize(task.evaluate_response(expected, &response)));

        debug!(strategy, case_id = %case.id, ?accuracy, latency_ms, "Trial scored");

        let mut metadata: HashMap<String, serde_json::Value> = case.metadata.clone();
        metadata.insert("case_id".to_string(), case.id.clone().into());
        metadata.insert("latency_ms".to_string(), latency_ms.into());
        if let Some(problem_type) = &case.problem_type {
            metadata.insert("problem_type".to_string(), problem_type.clone().into());
        }

        Ok(TaskResult {
            task_name: task.name().to_string(),
            prompt_type: strategy.to_string(),
            prompt_format: task.prompt_format_name(strategy),
            input_text: case.input_text.clone(),
            model_response: response,
            expected_output: case.expected_output.clone(),
            accuracy,
            metadata,
        })
    }
}

/// Keep accuracies inside `[0, 1]` whatever a task's scorer returns.
fn sanitize(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

/// Run an experiment without progress tracking.
pub async fn run_experiment(
    task: &dyn Task,
    client: &dyn ModelClient,
    strategies: &[String],
) -> ResultTable {
    ExperimentExecutor::new()
        .run_experiment(task, client, strategies)
        .await
}
