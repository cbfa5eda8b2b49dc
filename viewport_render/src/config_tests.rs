/// Tests for InstancingConfig

use super::*;
use serial_test::serial;

#[test]
fn test_default_config() {
    let config = InstancingConfig::default();
    assert_eq!(config.gl_primitive_budget, DEFAULT_GL_PRIMITIVE_BUDGET);
    assert_eq!(config.degrade_policy, DegradePolicy::Overflowing);
    assert_eq!(config.degrade_order, DegradeOrder::Submission);
    assert!(config.prioritize_selected);
    assert_eq!(config.bbox_gl_primitives, BBOX_GL_PRIMITIVES);
}

#[test]
fn test_builder_setters() {
    let config = InstancingConfig::default()
        .with_budget(500)
        .with_degrade_policy(DegradePolicy::All)
        .with_degrade_order(DegradeOrder::LargestFirst)
        .with_selection_priority(false)
        .with_bbox_gl_primitives(0);

    assert_eq!(config.gl_primitive_budget, 500);
    assert_eq!(config.degrade_policy, DegradePolicy::All);
    assert_eq!(config.degrade_order, DegradeOrder::LargestFirst);
    assert!(!config.prioritize_selected);
    assert_eq!(config.bbox_gl_primitives, 0);
}

#[test]
fn test_parse_budget() {
    assert_eq!(parse_budget("10000").unwrap(), 10_000);
    assert_eq!(parse_budget(" 2_500_000 ").unwrap(), 2_500_000);
    assert!(parse_budget("0").is_err());
    assert!(parse_budget("-3").is_err());
    assert!(parse_budget("lots").is_err());
}

#[test]
#[serial]
fn test_from_env() {
    std::env::set_var(BUDGET_ENV_VAR, "4096");
    let config = InstancingConfig::from_env().unwrap();
    assert_eq!(config.gl_primitive_budget, 4096);

    std::env::set_var(BUDGET_ENV_VAR, "nope");
    assert!(InstancingConfig::from_env().is_err());

    std::env::remove_var(BUDGET_ENV_VAR);
    let config = InstancingConfig::from_env().unwrap();
    assert_eq!(config.gl_primitive_budget, DEFAULT_GL_PRIMITIVE_BUDGET);
}
