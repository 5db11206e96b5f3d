use prompt_lab_core::{LabConfig, LabError, ModelClient, PromptLibrary, Result, ResultTable};
use prompt_lab_metrics::{
    best_strategy, strategy_performance, worst_strategy, StatisticalAnalyzer, StatisticalResult,
    StrategyPerformance, DEFAULT_CONFIDENCE,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::client::client_from_settings;
use crate::harness::ExperimentExecutor;
use crate::reporting::{ReportWriter, RunSummary};
use crate::tasks::{
    MathematicalReasoningTask, Task, TaskInfo, TextClassificationTask, ALL_STRATEGIES,
};

pub const TEXT_CLASSIFICATION_KEY: &str = "text_classification";
pub const MATHEMATICAL_REASONING_KEY: &str = "mathematical_reasoning";

/// Tables kept per task by default; older ones are dropped first.
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Outcome of `run_all_tasks`.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// Tables of the tasks that completed, in registry order.
    pub results: Vec<(String, ResultTable)>,
    /// Keys of the tasks that failed, with the error message.
    pub failures: Vec<(String, String)>,
    pub summary: RunSummary,
    pub summary_path: Option<PathBuf>,
    pub report_path: Option<PathBuf>,
}

/// Every known strategy run against one task, ranked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyComparison {
    pub task_key: String,
    pub results: ResultTable,
    pub performance: Vec<StrategyPerformance>,
    pub best: Option<(String, f64)>,
    pub worst: Option<(String, f64)>,
    /// Best versus worst strategy; absent when they coincide.
    pub significance: Option<StatisticalResult>,
    /// Interval for each strategy's mean accuracy at `DEFAULT_CONFIDENCE`;
    /// strategies with fewer than two scored rows are left out.
    pub confidence_intervals: BTreeMap<String, (f64, f64)>,
}

/// Owns the task registry, the model client and the report writer, and
/// remembers the most recent tables it produced for each task.
pub struct ExperimentRunner {
    config: LabConfig,
    client: Arc<dyn ModelClient>,
    library: Arc<PromptLibrary>,
    tasks: Vec<(String, Arc<dyn Task>)>,
    executor: ExperimentExecutor,
    writer: ReportWriter,
    history: HashMap<String, Vec<ResultTable>>,
    history_limit: usize,
}

impl ExperimentRunner {
    /// Build a runner with the client the configuration selects.
    pub fn new(config: LabConfig) -> Result<Self> {
        config.check()?;
        let client = client_from_settings(&config.model)?;
        Ok(Self::with_client(config, client))
    }

    pub fn with_client(config: LabConfig, client: Arc<dyn ModelClient>) -> Self {
        let library = Arc::new(PromptLibrary::new());
        let writer = ReportWriter::new(config.evaluation.output_dir.clone());

        let mut runner = Self {
            config,
            client,
            library,
            tasks: Vec::new(),
            executor: ExperimentExecutor::new(),
            writer,
            history: HashMap::new(),
            history_limit: DEFAULT_HISTORY_LIMIT,
        };
        runner.register_builtin_tasks();
        info!(tasks = ?runner.list_available_tasks(), "Experiment runner initialized");
        runner
    }

    fn register_builtin_tasks(&mut self) {
        if self.config.task(TEXT_CLASSIFICATION_KEY).enabled {
            let task = TextClassificationTask::new(Arc::clone(&self.library));
            self.tasks
                .push((TEXT_CLASSIFICATION_KEY.to_string(), Arc::new(task)));
        }
        if self.config.task(MATHEMATICAL_REASONING_KEY).enabled {
            let task = MathematicalReasoningTask::new(Arc::clone(&self.library));
            self.tasks
                .push((MATHEMATICAL_REASONING_KEY.to_string(), Arc::new(task)));
        }
    }

    pub fn config(&self) -> &LabConfig {
        &self.config
    }

    pub fn library(&self) -> Arc<PromptLibrary> {
        Arc::clone(&self.library)
    }

    pub fn executor(&self) -> &ExperimentExecutor {
        &self.executor
    }

    pub fn writer(&self) -> &ReportWriter {
        &self.writer
    }

    pub fn list_available_tasks(&self) -> Vec<String> {
        self.tasks.iter().map(|(key, _)| key.clone()).collect()
    }

    pub fn task(&self, key: &str) -> Result<Arc<dyn Task>> {
        self.tasks
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, task)| Arc::clone(task))
            .ok_or_else(|| LabError::TaskNotFound(key.to_string()))
    }

    pub fn task_info(&self, key: &str) -> Result<TaskInfo> {
        let task = self.task(key)?;
        Ok(TaskInfo::of(key, task.as_ref()))
    }

    /// Register a task under `key`, replacing any task already there.
    pub fn add_custom_task(&mut self, key: impl Into<String>, task: Arc<dyn Task>) {
        let key = key.into();
        match self.tasks.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = task,
            None => self.tasks.push((key.clone(), task)),
        }
        info!("Custom task '{}' added", key);
    }

    /// Keep at most `limit` tables per task; `0` turns history off.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        for tables in self.history.values_mut() {
            Self::trim_history(tables, limit);
        }
        self
    }

    fn trim_history(tables: &mut Vec<ResultTable>, limit: usize) {
        if tables.len() > limit {
            let excess = tables.len() - limit;
            tables.drain(..excess);
        }
    }

    /// Most recent tables produced for `key`, oldest first.
    pub fn history(&self, key: &str) -> &[ResultTable] {
        self.history.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Explicit strategies, else the configured list, else the task's own.
    fn strategies_for(&self, key: &str, task: &dyn Task, explicit: Option<&[String]>) -> Vec<String> {
        explicit
            .map(<[String]>::to_vec)
            .or_else(|| self.config.task(key).strategies)
            .unwrap_or_else(|| task.default_strategies())
    }

    async fn execute(&mut self, key: &str, strategies: &[String]) -> Result<ResultTable> {
        let task = self.task(key)?;
        info!("Running {} with strategies: {:?}", key, strategies);

        let table = self
            .executor
            .run_experiment(task.as_ref(), self.client.as_ref(), strategies)
            .await;

        if self.history_limit > 0 {
            let tables = self.history.entry(key.to_string()).or_default();
            tables.push(table.clone());
            Self::trim_history(tables, self.history_limit);
        }
        Ok(table)
    }

    /// Run one task and persist its table when `evaluation.save_results` is set.
    pub async fn run_single_task(
        &mut self,
        key: &str,
        strategies: Option<&[String]>,
    ) -> Result<ResultTable> {
        let task = self.task(key)?;
        let strategies = self.strategies_for(key, task.as_ref(), strategies);
        let table = self.execute(key, &strategies).await?;

        if self.config.evaluation.save_results {
            self.writer.save_csv(&table, key)?;
        }
        Ok(table)
    }

    /// Run every registered task with its configured strategies.
    ///
    /// A failing task is logged and left out; the rest still run. With
    /// `evaluation.save_results` set, the summary and HTML report are written.
    pub async fn run_all_tasks(&mut self) -> BatchOutcome {
        let mut results = Vec::new();
        let mut failures = Vec::new();

        for key in self.list_available_tasks() {
            match self.run_single_task(&key, None).await {
                Ok(table) => {
                    info!("✓ {} completed", key);
                    results.push((key, table));
                }
                Err(e) => {
                    error!("✗ {} failed: {}", key, e);
                    failures.push((key, e.to_string()));
                }
            }
        }

        let summary = RunSummary::from_results(&results);
        let mut summary_path = None;
        let mut report_path = None;

        if self.config.evaluation.save_results {
            match self.writer.save_summary(&summary) {
                Ok(path) => summary_path = Some(path),
                Err(e) => warn!("Could not save run summary: {}", e),
            }
            match self.writer.write_html(&results) {
                Ok(path) => report_path = Some(path),
                Err(e) => warn!("Could not generate HTML report: {}", e),
            }
        }

        BatchOutcome {
            results,
            failures,
            summary,
            summary_path,
            report_path,
        }
    }

    /// Run every known strategy against one task. Strategies the task does
    /// not support yield no rows.
    pub async fn compare_strategies(&mut self, key: &str) -> Result<StrategyComparison> {
        let strategies: Vec<String> = ALL_STRATEGIES.iter().map(|s| s.to_string()).collect();
        let table = self.execute(key, &strategies).await?;

        let sample = |strategy: &str| -> Vec<f64> {
            table
                .for_prompt_type(strategy)
                .filter_map(|r| r.accuracy)
                .collect()
        };

        let best = best_strategy(&table);
        let worst = worst_strategy(&table);
        let significance = match (&best, &worst) {
            (Some((b, _)), Some((w, _))) if b != w => Some(StatisticalAnalyzer::t_test(
                &sample(b.as_str()),
                &sample(w.as_str()),
            )),
            _ => None,
        };

        let confidence_intervals = table
            .prompt_types()
            .into_iter()
            .filter_map(|strategy| {
                StatisticalAnalyzer::confidence_interval(&sample(strategy), DEFAULT_CONFIDENCE)
                    .map(|interval| (strategy.to_string(), interval))
            })
            .collect();

        Ok(StrategyComparison {
            task_key: key.to_string(),
            performance: strategy_performance(&table),
            results: table,
            best,
            worst,
            significance,
            confidence_intervals,
        })
    }
}
