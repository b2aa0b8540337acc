use super::*;
use st_core::{MigrationFile, Version};

fn global() -> GlobalArgs {
    GlobalArgs {
        url: None,
        path: None,
        config: None,
        verbose: false,
        non_graceful: false,
    }
}

#[test]
fn test_defaults_without_config() {
    let dir = tempfile::tempdir().unwrap();
    let settings = resolve_settings_in(&global(), dir.path()).unwrap();
    assert_eq!(settings.url, None);
    assert_eq!(settings.migrations_dir, dir.path().join("migrations"));
    assert_eq!(settings.interrupt, InterruptMode::Graceful);
    assert!(settings.require_url().is_err());
}

#[test]
fn test_config_file_values() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("strata.yml"),
        "url: duckdb://app.duckdb\npath: db/migrations\ninterrupt: immediate\n",
    )
    .unwrap();

    let settings = resolve_settings_in(&global(), dir.path()).unwrap();
    assert_eq!(settings.require_url().unwrap(), "duckdb://app.duckdb");
    assert_eq!(settings.migrations_dir, dir.path().join("db/migrations"));
    assert_eq!(settings.interrupt, InterruptMode::Immediate);
}

#[test]
fn test_flags_override_config() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("strata.yml"),
        "url: duckdb://app.duckdb\npath: db/migrations\n",
    )
    .unwrap();

    let mut args = global();
    args.url = Some("duckdb://other.duckdb".to_string());
    args.path = Some("sql".to_string());
    args.non_graceful = true;

    let settings = resolve_settings_in(&args, dir.path()).unwrap();
    assert_eq!(settings.url.as_deref(), Some("duckdb://other.duckdb"));
    assert_eq!(settings.migrations_dir, dir.path().join("sql"));
    assert_eq!(settings.interrupt, InterruptMode::Immediate);
}

#[test]
fn test_explicit_config_resolves_path_from_its_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("deploy")).unwrap();
    std::fs::write(dir.path().join("deploy/prod.yml"), "path: migrations\n").unwrap();

    let mut args = global();
    args.config = Some("deploy/prod.yml".to_string());
    let settings = resolve_settings_in(&args, dir.path()).unwrap();
    assert_eq!(
        settings.migrations_dir,
        dir.path().join("deploy").join("migrations")
    );
}

#[test]
fn test_malformed_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("strata.yml"), "unknown_key: 1\n").unwrap();
    assert!(resolve_settings_in(&global(), dir.path()).is_err());
}

#[test]
fn test_build_migrator_requires_existing_dir() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings {
        url: Some("duckdb::memory:".to_string()),
        migrations_dir: dir.path().join("missing"),
        interrupt: InterruptMode::Graceful,
    };
    assert!(build_migrator(&settings, false).is_err());
    assert!(build_migrator(&settings, true).is_ok());
    assert!(settings.migrations_dir.is_dir());
}

#[test]
fn test_format_event() {
    console::set_colors_enabled(false);
    let up = MigrationFile::inline(Version::new(1), "init", Direction::Up, "sql", "");
    let down = MigrationFile::inline(Version::new(1), "init", Direction::Down, "sql", "");

    assert_eq!(format_event(&PipeEvent::File(up)), "> 1_init.up.sql");
    assert_eq!(format_event(&PipeEvent::File(down)), "< 1_init.down.sql");
    assert_eq!(
        format_event(&PipeEvent::Message("hello".to_string())),
        "hello"
    );
}
