use crate::config::models::{OperationRulesConfig, SchedulerConfig, MAX_READ_RETRY_BACKOFF_MS};
use crate::logging::LogConfig;
use crate::models::OperationKind;

#[test]
fn test_scheduler_validation() {
    let mut config = SchedulerConfig::default();
    assert!(config.validate().is_ok());

    config.batch_size = 0;
    assert!(config.validate().is_err());

    config.batch_size = 10;
    config.concurrency = 0;
    assert!(config.validate().is_err());

    config.concurrency = 3;
    config.read_retry_attempts = 0;
    assert!(config.validate().is_err());

    config.read_retry_attempts = 3;
    config.max_pending_items = Some(0);
    assert!(config.validate().is_err());

    config.max_pending_items = Some(100);
    assert!(config.validate().is_ok());
}

#[test]
fn test_backoff_step_is_capped() {
    let mut config = SchedulerConfig {
        read_retry_backoff_ms: MAX_READ_RETRY_BACKOFF_MS,
        ..SchedulerConfig::default()
    };
    assert!(config.validate().is_ok());

    config.read_retry_backoff_ms = u64::MAX;
    assert!(config.validate().is_err());
}

#[test]
fn test_requires_confirmation_above_threshold() {
    let config = SchedulerConfig {
        large_submission_threshold: 5,
        ..SchedulerConfig::default()
    };
    assert!(!config.requires_confirmation(5));
    assert!(config.requires_confirmation(6));
}

#[test]
fn test_default_operation_rules() {
    let rules = OperationRulesConfig::default();
    assert!(rules.validate().is_ok());

    let merge = rules.rule(OperationKind::Merge);
    assert!(merge.allows_extension("PDF"));
    assert!(!merge.allows_extension("png"));

    let ocr = rules.rule(OperationKind::Ocr);
    assert!(ocr.allows_extension("tiff"));
    assert!(ocr.allows_content_type("image/png"));

    let convert = rules.rule(OperationKind::Convert);
    assert!(convert.allows_extension("docx"));
    assert!(convert.allows_content_type("text/html; charset=utf-8"));
}

#[test]
fn test_empty_rule_is_invalid() {
    let mut rules = OperationRulesConfig::default();
    rules.compress.extensions.clear();
    rules.compress.content_types.clear();
    assert!(rules.validate().is_err());
}

#[test]
fn test_log_config_validation() {
    let config = LogConfig::default();
    assert!(config.validate().is_ok());

    let config = LogConfig {
        enable_file_logging: true,
        log_file_path: None,
        ..LogConfig::default()
    };
    assert!(config.validate().is_err());
}
