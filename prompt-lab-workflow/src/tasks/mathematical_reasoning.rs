use prompt_lab_core::{
    PromptLibrary, ResponseScorer, Result, ResultTable, TestCase, MATHEMATICAL_REASONING,
};
use prompt_lab_metrics::{MathReasoningScorer, MetricAggregator, ScoreBreakdown};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::Task;

pub const MATHEMATICAL_REASONING_STRATEGIES: [&str; 3] =
    ["vanilla", "zero_shot_cot", "few_shot_cot"];

/// Below this mean accuracy the analysis recommends reworking the prompts.
pub const IMPROVEMENT_THRESHOLD: f64 = 0.8;

/// Word problems reducible to two linear equations, solved with and
/// without chain-of-thought prompting.
pub struct MathematicalReasoningTask {
    library: Arc<PromptLibrary>,
    scorer: MathReasoningScorer,
}

impl MathematicalReasoningTask {
    pub fn new(library: Arc<PromptLibrary>) -> Self {
        Self {
            library,
            scorer: MathReasoningScorer::new(),
        }
    }

    pub fn breakdown(&self, expected: &str, actual: &str) -> ScoreBreakdown {
        self.scorer.breakdown(expected, actual)
    }
}

impl Task for MathematicalReasoningTask {
    fn name(&self) -> &str {
        "Mathematical Reasoning - CoT"
    }

    fn test_data(&self) -> Vec<TestCase> {
        vec![
            TestCase::new(
                "equations-fruit",
                "Bir manavda, 5 kilo elma ve 3 kilo portakal alan bir müşteri toplam 42 TL ödüyor. \
                 Eğer 1 kilo elma, 1 kilo portakaldan 2 TL daha pahalı ise, 1 kilo elma ve 1 kilo \
                 portakalın fiyatı ayrı ayrı kaç TL'dir?",
            )
            .with_expected("1 kilo elma: 6 TL, 1 kilo portakal: 4 TL")
            .with_expected_numbers(vec![6, 4])
            .with_problem_type("equation_system"),
            TestCase::new(
                "equations-cafe",
                "Bir kafede 4 kahve ve 2 çay 26 TL tutuyor. 1 kahve, 1 çaydan 3 TL daha pahalı ise, \
                 1 kahve ve 1 çayın fiyatı nedir?",
            )
            .with_expected("1 kahve: 5 TL, 1 çay: 2 TL")
            .with_expected_numbers(vec![5, 2])
            .with_problem_type("equation_system"),
            TestCase::new(
                "equations-tickets",
                "Bir parkta 6 çocuk ve 4 yetişkin için bilet toplam 84 TL. Çocuk bileti, yetişkin \
                 biletinden 6 TL daha ucuz ise, bilet fiyatları nedir?",
            )
            .with_expected("Çocuk bileti: 6 TL, Yetişkin bileti: 12 TL")
            .with_expected_numbers(vec![6, 12])
            .with_problem_type("equation_system"),
        ]
    }

    fn strategies(&self) -> &[&'static str] {
        &MATHEMATICAL_REASONING_STRATEGIES
    }

    fn generate_prompt(&self, strategy: &str, case: &TestCase) -> Result<String> {
        let problem = case.input_text.as_str();
        match strategy {
            "vanilla" => Ok(format!("Aşağıdaki problemi çözün:\n{problem}")),
            "zero_shot_cot" => Ok(format!(
                "Aşağıdaki problemi çözün. Adım adım düşünelim.\n\n{problem}"
            )),
            "few_shot_cot" => self.library.format(
                MATHEMATICAL_REASONING,
                "equation_systems_few_shot",
                &[("problem", problem)],
            ),
            other => Err(self.unsupported(other)),
        }
    }

    fn evaluate_response(&self, expected: &str, actual: &str) -> f64 {
        self.scorer.score(expected, actual)
    }
}

// ===== Detailed Analysis =====

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisOverview {
    pub total_tests: usize,
    pub average_accuracy: Option<f64>,
    pub perfect_scores: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StrategyAnalysis {
    pub strategy: String,
    pub accuracy: Option<f64>,
    /// `1 - sample std-dev`; absent with fewer than two scored rows.
    pub consistency: Option<f64>,
    pub test_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetailedAnalysis {
    pub overview: AnalysisOverview,
    pub strategy_performance: Vec<StrategyAnalysis>,
    pub recommendations: Vec<String>,
}

/// Per-strategy accuracy and consistency of a run, plus plain-language
/// recommendations.
pub fn detailed_analysis(table: &ResultTable) -> DetailedAnalysis {
    let overview = AnalysisOverview {
        total_tests: table.len(),
        average_accuracy: table.mean_accuracy(),
        perfect_scores: table.accuracies().iter().filter(|a| **a == 1.0).count(),
    };

    let strategy_performance: Vec<StrategyAnalysis> = table
        .prompt_types()
        .into_iter()
        .map(|strategy| {
            let rows: Vec<_> = table.for_prompt_type(strategy).collect();
            let scores: Vec<f64> = rows.iter().filter_map(|r| r.accuracy).collect();
            let accuracy = if scores.is_empty() {
                None
            } else {
                Some(scores.iter().sum::<f64>() / scores.len() as f64)
            };
            StrategyAnalysis {
                strategy: strategy.to_string(),
                accuracy,
                consistency: MetricAggregator::sample_std_dev(&scores).map(|sd| 1.0 - sd),
                test_count: rows.len(),
            }
        })
        .collect();

    let mut recommendations = Vec::new();
    let best = strategy_performance
        .iter()
        .filter_map(|s| s.accuracy.map(|a| (s.strategy.as_str(), a)))
        .fold(None, |best: Option<(&str, f64)>, (strategy, accuracy)| match best {
            Some((_, top)) if top >= accuracy => best,
            _ => Some((strategy, accuracy)),
        });
    if let Some((strategy, _)) = best {
        recommendations.push(format!("En iyi performans: {strategy}"));
    }
    if overview
        .average_accuracy
        .is_some_and(|avg| avg < IMPROVEMENT_THRESHOLD)
    {
        recommendations.push("Prompt'ların iyileştirilmesi önerilir".to_string());
    }

    DetailedAnalysis {
        overview,
        strategy_performance,
        recommendations,
    }
}
