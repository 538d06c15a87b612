//! Environment overrides for Settings.
//!
//! Kept in its own test binary so the process-wide variables cannot leak into
//! other tests. Tests in this file serialize on `ENV_LOCK`.

use std::env;
use std::fs;
use std::sync::Mutex;

use rstest::rstest;
use tempfile::TempDir;

use featmodel::application::ApplicationError;
use featmodel::config::{Settings, StrategyName};
use featmodel::util::testing;

static ENV_LOCK: Mutex<()> = Mutex::new(());

#[test]
fn given_env_vars_when_loading_then_they_override_the_local_file() {
    testing::init_test_setup();
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    // Arrange
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("featmodel.toml");
    fs::write(&path, "[identifiers]\nstrategy = \"counter\"\nseed = 5\n\n[format]\npretty = true\n").unwrap();
    env::set_var("FEATMODEL__IDENTIFIERS__STRATEGY", "UUID");
    env::set_var("FEATMODEL__FORMAT__PRETTY", "false");

    // Act
    let settings = Settings::load(Some(&path));
    env::remove_var("FEATMODEL__IDENTIFIERS__STRATEGY");
    env::remove_var("FEATMODEL__FORMAT__PRETTY");
    let settings = settings.unwrap();

    // Assert
    assert_eq!(settings.identifiers.strategy, StrategyName::Uuid);
    assert_eq!(settings.identifiers.seed, 5);
    assert!(!settings.format.pretty);
}

#[rstest]
#[case::word("maybe")]
#[case::typo("flase")]
#[case::number("2")]
fn given_invalid_pretty_env_var_when_loading_then_config_error(#[case] value: &str) {
    testing::init_test_setup();
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    // Arrange
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("featmodel.toml");
    fs::write(&path, "[format]\npretty = true\n").unwrap();
    env::set_var("FEATMODEL__FORMAT__PRETTY", value);

    // Act
    let result = Settings::load(Some(&path));
    env::remove_var("FEATMODEL__FORMAT__PRETTY");

    // Assert
    match result {
        Err(ApplicationError::Config { message }) => assert!(message.contains("format.pretty"), "{}", message),
        other => panic!("expected config error, got {:?}", other),
    }
}
