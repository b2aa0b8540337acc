use super::*;

#[test]
fn test_parse_minimal_config() {
    let config: Config = serde_yaml::from_str("{}").unwrap();
    assert_eq!(config, Config::default());
    let root = Path::new("/tmp/project");
    assert_eq!(config.migrations_dir(root), root.join("migrations"));
}

#[test]
fn test_parse_full_config() {
    let yaml = r#"
url: duckdb://warehouse.duckdb
path: db/migrations
interrupt: immediate
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.url.as_deref(), Some("duckdb://warehouse.duckdb"));
    assert_eq!(config.path, "db/migrations");
    assert_eq!(config.interrupt, InterruptMode::Immediate);
}

#[test]
fn test_unknown_field_rejected() {
    let result: Result<Config, _> = serde_yaml::from_str("database: foo");
    assert!(result.is_err());
}

#[test]
fn test_load_from_dir() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(Config::load_from_dir(dir.path()).unwrap(), None);

    std::fs::write(dir.path().join("strata.yaml"), "path: sql\n").unwrap();
    let config = Config::load_from_dir(dir.path()).unwrap().unwrap();
    assert_eq!(config.path, "sql");
}

#[test]
fn test_load_invalid_yaml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("strata.yml");
    std::fs::write(&path, "interrupt: sometimes\n").unwrap();
    assert!(matches!(
        Config::load(&path),
        Err(CoreError::ConfigParseError { .. })
    ));
}

#[test]
fn test_load_empty_path_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("strata.yml");
    std::fs::write(&path, "path: \"\"\n").unwrap();
    assert!(matches!(
        Config::load(&path),
        Err(CoreError::ConfigInvalid { .. })
    ));
}
