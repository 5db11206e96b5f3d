use approx::assert_relative_eq;
use prompt_lab_metrics::statistical::StatisticalAnalyzer;

#[test]
fn test_t_test_separated_samples_is_significant() {
    let strong = vec![0.9, 0.95, 1.0, 0.92, 0.97, 0.94];
    let weak = vec![0.2, 0.25, 0.3, 0.22, 0.28, 0.24];

    let result = StatisticalAnalyzer::t_test(&strong, &weak);
    assert!(result.statistic > 0.0);
    assert!(result.is_significant(0.05));
    assert!(result.effect_size.unwrap() > 1.0);

    // the interval bounds the difference of means and excludes zero
    let (lower, upper) = result.confidence_interval.unwrap();
    assert!(lower > 0.0);
    assert!(lower < 0.6983 && 0.6983 < upper);
}

#[test]
fn test_t_test_interval_spans_zero_for_identical_samples() {
    let sample = vec![0.5, 0.6, 0.7];
    let (lower, upper) = StatisticalAnalyzer::t_test(&sample, &sample)
        .confidence_interval
        .unwrap();
    assert_relative_eq!(lower, -upper, epsilon = 1e-12);
    assert!(upper > 0.0);
}

#[test]
fn test_t_test_identical_samples() {
    let sample = vec![0.5, 0.6, 0.7];
    let result = StatisticalAnalyzer::t_test(&sample, &sample);
    assert_relative_eq!(result.statistic, 0.0);
    assert!(!result.is_significant(0.05));
}

#[test]
fn test_t_test_constant_samples_have_no_p_value() {
    let result = StatisticalAnalyzer::t_test(&[1.0, 1.0], &[1.0, 1.0]);
    assert!(result.p_value.is_none());
    assert!(result.confidence_interval.is_none());
}

#[test]
fn test_t_test_needs_two_values_per_sample() {
    let result = StatisticalAnalyzer::t_test(&[1.0], &[0.0, 0.5]);
    assert!(result.p_value.is_none());
    assert!(result.effect_size.is_none());
}

#[test]
fn test_confidence_interval_contains_mean() {
    let values = vec![0.6, 0.7, 0.8, 0.9];
    let (lower, upper) = StatisticalAnalyzer::confidence_interval(&values, 0.95).unwrap();
    assert!(lower < 0.75 && 0.75 < upper);
    assert!(StatisticalAnalyzer::confidence_interval(&[0.5], 0.95).is_none());
}
