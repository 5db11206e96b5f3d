use prompt_lab_core::domain::*;
use prompt_lab_core::LabError;
use std::io::Write;

fn write_yaml(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

// ===== Defaults =====

#[test]
fn test_model_settings_default() {
    let settings = ModelSettings::default();

    assert_eq!(settings.name, "gemini-2.5-flash");
    assert_eq!(settings.temperature, 0.1);
    assert!(!settings.mock_mode);
    assert_eq!(settings.max_retries, 3);
    assert_eq!(settings.rate_limit_backoff_secs, 60);
    assert!(settings.api_key.is_none());
}

#[test]
fn test_unlisted_task_defaults_to_enabled() {
    let config = LabConfig::mock();
    let task = config.task("text_classification");
    assert!(task.enabled);
    assert!(task.strategies.is_none());
}

// ===== Loading =====

#[test]
fn test_load_from_yaml_file() {
    let file = write_yaml(
        r#"
model:
  name: gemini-test
  temperature: 0.5
  mock_mode: true
tasks:
  text_classification:
    enabled: false
  mathematical_reasoning:
    strategies: [vanilla, few_shot_cot]
evaluation:
  output_dir: out/results
  save_results: false
"#,
    );

    let config = LabConfig::load(file.path(), &[]).unwrap();

    assert_eq!(config.model.name, "gemini-test");
    assert_eq!(config.model.temperature, 0.5);
    assert!(config.model.mock_mode);
    assert!(!config.task("text_classification").enabled);
    assert_eq!(
        config.task("mathematical_reasoning").strategies,
        Some(vec!["vanilla".to_string(), "few_shot_cot".to_string()])
    );
    assert_eq!(config.evaluation.output_dir, std::path::PathBuf::from("out/results"));
    assert!(!config.evaluation.save_results);
}

#[test]
fn test_missing_file_uses_defaults() {
    let overrides = vec![("model.mock_mode".to_string(), "true".to_string())];
    let config = LabConfig::load("does/not/exist.yaml", &overrides).unwrap();
    assert_eq!(config.model.name, "gemini-2.5-flash");
    assert!(config.evaluation.save_results);
}

#[test]
fn test_overrides_take_precedence() {
    let file = write_yaml("model:\n  mock_mode: true\n  name: from-file\n");
    let overrides = vec![("model.name".to_string(), "from-override".to_string())];

    let config = LabConfig::load(file.path(), &overrides).unwrap();
    assert_eq!(config.model.name, "from-override");
}

// ===== Validation =====

#[test]
fn test_live_mode_without_api_key_is_rejected() {
    let config = LabConfig::default();
    let err = config.check().unwrap_err();
    assert!(matches!(err, LabError::Configuration(_)));
    assert!(err.to_string().contains("GEMINI_API_KEY"));
}

#[test]
fn test_live_mode_with_api_key_is_accepted() {
    let mut config = LabConfig::default();
    config.model.api_key = Some("key".to_string());
    assert!(config.check().is_ok());
}

#[test]
fn test_temperature_out_of_range_is_rejected() {
    let mut config = LabConfig::mock();
    config.model.temperature = 3.5;
    assert!(matches!(config.check(), Err(LabError::Validation(_))));
}

#[test]
fn test_parse_override() {
    assert_eq!(
        parse_override("model.name = gemini").unwrap(),
        ("model.name".to_string(), "gemini".to_string())
    );
    assert!(parse_override("no-equals").is_err());
    assert!(parse_override("=value").is_err());
}

// ===== Runtime Overrides =====

#[test]
fn test_override_setting_changes_only_that_key() {
    let mut config = LabConfig::mock();
    config.model.api_key = Some("secret".to_string());

    let updated = config.override_setting("model.temperature", "0.3").unwrap();
    assert_eq!(updated.model.temperature, 0.3);
    assert_eq!(updated.model.name, config.model.name);
    assert!(updated.model.mock_mode);
    assert_eq!(updated.model.api_key.as_deref(), Some("secret"));
    assert_eq!(config.model.temperature, 0.1);
}

#[test]
fn test_override_setting_adds_task_entry() {
    let updated = LabConfig::mock()
        .override_setting("tasks.text_classification.enabled", "false")
        .unwrap();
    assert!(!updated.task("text_classification").enabled);
    assert!(updated.task("mathematical_reasoning").enabled);
}

#[test]
fn test_override_setting_is_validated() {
    let result = LabConfig::mock().override_setting("model.temperature", "9.0");
    assert!(matches!(result, Err(LabError::Validation(_))));
}
