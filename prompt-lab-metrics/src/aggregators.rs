use prompt_lab_core::ResultTable;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AggregatedMetrics {
    pub mean: Decimal,
    pub median: Decimal,
    pub std_dev: Decimal,
    pub min: Decimal,
    pub max: Decimal,
    pub count: usize,
    pub sum: Decimal,
}

pub struct MetricAggregator;

impl MetricAggregator {
    pub fn aggregate(values: &[f64]) -> AggregatedMetrics {
        if values.is_empty() {
            return Self::empty();
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let sum: f64 = values.iter().sum();
        let mean = sum / values.len() as f64;
        let median = Self::percentile(&sorted, 50.0);
        let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / values.len() as f64;
        let std_dev = variance.sqrt();

        AggregatedMetrics {
            mean: Decimal::try_from(mean).unwrap_or_default(),
            median: Decimal::try_from(median).unwrap_or_default(),
            std_dev: Decimal::try_from(std_dev).unwrap_or_default(),
            min: Decimal::try_from(sorted[0]).unwrap_or_default(),
            max: Decimal::try_from(sorted[sorted.len() - 1]).unwrap_or_default(),
            count: values.len(),
            sum: Decimal::try_from(sum).unwrap_or_default(),
        }
    }

    /// Calculate weighted average
    pub fn weighted_average(values: &[f64], weights: &[f64]) -> Option<f64> {
        if values.len() != weights.len() || values.is_empty() {
            return None;
        }

        let weighted_sum: f64 = values
            .iter()
            .zip(weights.iter())
            .map(|(v, w)| v * w)
            .sum();

        let weight_sum: f64 = weights.iter().sum();

        if weight_sum == 0.0 {
            return None;
        }

        Some(weighted_sum / weight_sum)
    }

    /// Sample standard deviation (n - 1 denominator); `None` below two values.
    pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
        if values.len() < 2 {
            return None;
        }
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let variance =
            values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
        Some(variance.sqrt())
    }

    fn percentile(sorted_values: &[f64], percentile: f64) -> f64 {
        if sorted_values.is_empty() {
            return 0.0;
        }
        let index = (percentile / 100.0 * (sorted_values.len() - 1) as f64).round() as usize;
        sorted_values[index.min(sorted_values.len() - 1)]
    }

    fn empty() -> AggregatedMetrics {
        AggregatedMetrics {
            mean: Decimal::ZERO,
            median: Decimal::ZERO,
            std_dev: Decimal::ZERO,
            min: Decimal::ZERO,
            max: Decimal::ZERO,
            count: 0,
            sum: Decimal::ZERO,
        }
    }
}

// ===== Strategy Performance =====

/// Accuracy statistics for one (prompt type, prompt format) group.
///
/// `count` counts scored rows only; rows without an accuracy do not
/// contribute to any statistic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StrategyPerformance {
    pub prompt_type: String,
    pub prompt_format: String,
    pub mean: Option<Decimal>,
    pub std_dev: Option<Decimal>,
    pub count: usize,
}

impl StrategyPerformance {
    pub fn mean_f64(&self) -> Option<f64> {
        self.mean.and_then(|m| m.to_f64())
    }
}

fn rounded(value: f64) -> Option<Decimal> {
    Decimal::try_from(value).ok().map(|d| d.round_dp(3))
}

/// Group a table by prompt type and format, sorted by group key.
pub fn strategy_performance(table: &ResultTable) -> Vec<StrategyPerformance> {
    let mut groups: BTreeMap<(&str, &str), Vec<f64>> = BTreeMap::new();
    for result in table.results() {
        let entry = groups
            .entry((result.prompt_type.as_str(), result.prompt_format.as_str()))
            .or_default();
        if let Some(accuracy) = result.accuracy {
            entry.push(accuracy);
        }
    }

    groups
        .into_iter()
        .map(|((prompt_type, prompt_format), values)| {
            let mean = if values.is_empty() {
                None
            } else {
                rounded(values.iter().sum::<f64>() / values.len() as f64)
            };
            StrategyPerformance {
                prompt_type: prompt_type.to_string(),
                prompt_format: prompt_format.to_string(),
                mean,
                std_dev: MetricAggregator::sample_std_dev(&values).and_then(rounded),
                count: values.len(),
            }
        })
        .collect()
}

/// Mean accuracy per prompt type, sorted by prompt type.
pub fn accuracy_by_strategy(table: &ResultTable) -> Vec<(String, f64)> {
    let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for result in table.results() {
        if let Some(accuracy) = result.accuracy {
            groups.entry(result.prompt_type.as_str()).or_default().push(accuracy);
        }
    }

    groups
        .into_iter()
        .map(|(strategy, values)| {
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            (strategy.to_string(), mean)
        })
        .collect()
}

/// Strategy with the highest mean accuracy; the first in key order wins ties.
pub fn best_strategy(table: &ResultTable) -> Option<(String, f64)> {
    accuracy_by_strategy(table)
        .into_iter()
        .fold(None, |best, (strategy, mean)| match best {
            Some((_, best_mean)) if best_mean >= mean => best,
            _ => Some((strategy, mean)),
        })
}

/// Strategy with the lowest mean accuracy; the first in key order wins ties.
pub fn worst_strategy(table: &ResultTable) -> Option<(String, f64)> {
    accuracy_by_strategy(table)
        .into_iter()
        .fold(None, |worst, (strategy, mean)| match worst {
            Some((_, worst_mean)) if worst_mean <= mean => worst,
            _ => Some((strategy, mean)),
        })
}
