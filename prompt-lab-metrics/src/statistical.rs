use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};
use statrs::statistics::Statistics;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticalResult {
    pub statistic: f64,
    pub p_value: Option<f64>,
    pub confidence_interval: Option<(f64, f64)>,
    pub effect_size: Option<f64>,
}

impl StatisticalResult {
    fn inconclusive() -> Self {
        Self {
            statistic: 0.0,
            p_value: None,
            confidence_interval: None,
            effect_size: None,
        }
    }

    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value.is_some_and(|p| p < alpha)
    }
}

/// Confidence level for intervals reported alongside comparisons.
pub const DEFAULT_CONFIDENCE: f64 = 0.95;

pub struct StatisticalAnalyzer;

impl StatisticalAnalyzer {
    /// Confidence interval for the mean at the given confidence level.
    ///
    /// Returns `None` below two samples.
    pub fn confidence_interval(values: &[f64], confidence: f64) -> Option<(f64, f64)> {
        if values.len() < 2 {
            return None;
        }

        let mean = values.mean();
        let std_dev = values.std_dev();
        let n = values.len() as f64;

        let t_dist = StudentsT::new(0.0, 1.0, n - 1.0).ok()?;
        let t_value = t_dist.inverse_cdf((1.0 + confidence) / 2.0);

        let margin = t_value * (std_dev / n.sqrt());
        Some((mean - margin, mean + margin))
    }

    /// Two-sample t-test with pooled variance.
    ///
    /// `confidence_interval` bounds the difference of means at
    /// `DEFAULT_CONFIDENCE`. Identical constant samples produce no p-value
    /// rather than NaN.
    pub fn t_test(sample1: &[f64], sample2: &[f64]) -> StatisticalResult {
        if sample1.len() < 2 || sample2.len() < 2 {
            return StatisticalResult::inconclusive();
        }

        let mean1 = sample1.mean();
        let mean2 = sample2.mean();
        let var1 = sample1.variance();
        let var2 = sample2.variance();
        let n1 = sample1.len() as f64;
        let n2 = sample2.len() as f64;

        let pooled_var = ((n1 - 1.0) * var1 + (n2 - 1.0) * var2) / (n1 + n2 - 2.0);
        let standard_error = (pooled_var * (1.0 / n1 + 1.0 / n2)).sqrt();
        if standard_error == 0.0 || !standard_error.is_finite() {
            return StatisticalResult {
                statistic: 0.0,
                p_value: None,
                confidence_interval: None,
                effect_size: Some(Self::cohens_d(sample1, sample2)),
            };
        }

        let difference = mean1 - mean2;
        let t_stat = difference / standard_error;
        let df = n1 + n2 - 2.0;
        let t_dist = StudentsT::new(0.0, 1.0, df).ok();
        let p_value = t_dist
            .as_ref()
            .map(|t_dist| 2.0 * (1.0 - t_dist.cdf(t_stat.abs())));
        let confidence_interval = t_dist.map(|t_dist| {
            let margin = t_dist.inverse_cdf((1.0 + DEFAULT_CONFIDENCE) / 2.0) * standard_error;
            (difference - margin, difference + margin)
        });

        StatisticalResult {
            statistic: t_stat,
            p_value,
            confidence_interval,
            effect_size: Some(Self::cohens_d(sample1, sample2)),
        }
    }

    /// Calculate effect size (Cohen's d)
    pub fn cohens_d(sample1: &[f64], sample2: &[f64]) -> f64 {
        if sample1.len() < 2 || sample2.len() < 2 {
            return 0.0;
        }

        let mean1 = sample1.mean();
        let mean2 = sample2.mean();
        let var1 = sample1.variance();
        let var2 = sample2.variance();
        let n1 = sample1.len() as f64;
        let n2 = sample2.len() as f64;

        let pooled_std = (((n1 - 1.0) * var1 + (n2 - 1.0) * var2) / (n1 + n2 - 2.0)).sqrt();

        if pooled_std == 0.0 {
            return 0.0;
        }

        (mean1 - mean2) / pooled_std
    }
}
