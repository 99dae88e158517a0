use clap::Parser;
use dupsift::cli::Cli;
use dupsift::config::Config;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_config_load_defaults() {
    // Use figment directly without Env to avoid interference from other tests
    let figment = Figment::from(Serialized::defaults(Config::default()));
    let config: Config = figment.extract().unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.threads, 4);
}

#[test]
fn test_config_load_from_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");

    let toml_content = r#"
threads = 8
max_depth = 3
follow_symlinks = true
file_pattern = '\.(jpe?g|png)$'
"#;
    fs::write(&config_path, toml_content).unwrap();

    let figment =
        Figment::from(Serialized::defaults(Config::default())).merge(Toml::file(&config_path));
    let config: Config = figment.extract().unwrap();

    assert_eq!(config.threads, 8);
    assert_eq!(config.max_depth, 3);
    assert!(config.follow_symlinks);
    assert!(!config.same_file_system);
    assert_eq!(config.file_pattern.as_deref(), Some(r"\.(jpe?g|png)$"));

    let walker = config.walker_config();
    assert_eq!(walker.max_depth, Some(3));
    assert!(walker.follow_symlinks);
}

#[test]
fn test_config_env_overrides_file() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "threads = 2\ncase_sensitive = false\n").unwrap();

    // Unique names so parallel tests never see them
    std::env::set_var("DUPSIFT_TEST_ENV_THREADS", "12");
    std::env::set_var("DUPSIFT_TEST_ENV_CASE_SENSITIVE", "true");

    let figment = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(&config_path))
        .merge(Env::prefixed("DUPSIFT_TEST_ENV_").split("__"));
    let config: Config = figment.extract().unwrap();

    assert_eq!(config.threads, 12);
    assert!(config.case_sensitive);

    std::env::remove_var("DUPSIFT_TEST_ENV_THREADS");
    std::env::remove_var("DUPSIFT_TEST_ENV_CASE_SENSITIVE");
}

#[test]
fn test_config_invalid_toml_is_an_error() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "threads = \"many\"\n").unwrap();

    assert!(Config::load(Some(&config_path)).is_err());
}

#[test]
fn test_config_missing_explicit_file_uses_defaults() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("absent.toml");

    let figment = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(&config_path));
    let config: Config = figment.extract().unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_config_save_then_load() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("nested").join("config.toml");

    let config = Config {
        threads: 6,
        max_depth: 2,
        invert_match: true,
        dir_pattern: Some("^\\.git$".to_string()),
        ..Default::default()
    };
    config.save(&config_path).unwrap();

    let figment =
        Figment::from(Serialized::defaults(Config::default())).merge(Toml::file(&config_path));
    let loaded: Config = figment.extract().unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_cli_overrides_file_values() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "threads = 2\nmax_depth = 5\nfollow_symlinks = true\n").unwrap();

    let figment =
        Figment::from(Serialized::defaults(Config::default())).merge(Toml::file(&config_path));
    let config: Config = figment.extract().unwrap();

    let cli = Cli::parse_from(["dupsift", "--threads", "9", "/tmp"]);
    let effective = cli.apply_to(config);

    assert_eq!(effective.threads, 9);
    assert_eq!(effective.max_depth, 5);
    // Flags only switch behavior on
    assert!(effective.follow_symlinks);
}
