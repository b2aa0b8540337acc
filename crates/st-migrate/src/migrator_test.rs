use super::*;
use st_core::pipe::ABORT_MESSAGE;
use st_core::{CoreError, Direction, InterruptMode, MemoryStore, PipeEvent};
use st_db::testing::MemoryBackend;
use std::time::Duration;

fn fixture(files: &[&str]) -> (Migrator, MemoryBackend) {
    let backend = MemoryBackend::new();
    let mut registry = DriverRegistry::new();
    backend.register(&mut registry).unwrap();
    let store: Arc<dyn MigrationStore> = Arc::new(MemoryStore::with_files(
        files.iter().map(|name| (*name, "SELECT 1;")),
    ));
    let migrator = Migrator::new(Arc::new(registry), "memory://test", store);
    (migrator, backend)
}

fn file_names(events: &[PipeEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            PipeEvent::File(f) => Some(f.file_name.clone()),
            _ => None,
        })
        .collect()
}

async fn run_collect(migrator: &Migrator, operation: Operation) -> Vec<PipeEvent> {
    let (task, reader) = migrator.spawn(operation).into_parts();
    let events = reader.collect().await;
    task.await.unwrap();
    events
}

const THREE: [&str; 6] = [
    "1_a.up.sql",
    "1_a.down.sql",
    "2_b.up.sql",
    "2_b.down.sql",
    "3_c.up.sql",
    "3_c.down.sql",
];

#[tokio::test]
async fn test_up_applies_pending_in_order() {
    let (migrator, backend) = fixture(&THREE);
    let events = run_collect(&migrator, Operation::Up).await;

    assert_eq!(
        file_names(&events),
        vec!["1_a.up.sql", "2_b.up.sql", "3_c.up.sql"]
    );
    assert!(!events.iter().any(PipeEvent::is_error));
    assert_eq!(backend.applied(), vec![1, 2, 3]);
    assert_eq!(migrator.version().await.unwrap(), Version::new(3));
    // One driver for the operation, one for the version query.
    assert_eq!(backend.open_count(), 2);
    assert_eq!(backend.close_count(), 2);
}

#[tokio::test]
async fn test_down_reverts_most_recent_first() {
    let (migrator, backend) = fixture(&THREE);
    backend.set_applied([1, 2, 3]);

    let events = run_collect(&migrator, Operation::Down).await;
    assert_eq!(
        file_names(&events),
        vec!["3_c.down.sql", "2_b.down.sql", "1_a.down.sql"]
    );
    assert!(backend.applied().is_empty());
    assert_eq!(migrator.version().await.unwrap(), Version::NIL);
}

#[tokio::test]
async fn test_up_with_nothing_pending() {
    let (migrator, backend) = fixture(&THREE);
    backend.set_applied([1, 2, 3]);

    let events = run_collect(&migrator, Operation::Up).await;
    assert!(events.is_empty());
    assert_eq!(backend.close_count(), 1);
}

#[tokio::test]
async fn test_migrate_relative_steps() {
    let (migrator, backend) = fixture(&THREE);

    migrator.migrate_sync(2).await.unwrap();
    assert_eq!(backend.applied(), vec![1, 2]);

    migrator.migrate_sync(-1).await.unwrap();
    assert_eq!(backend.applied(), vec![1]);

    // More steps than available is not an error.
    migrator.migrate_sync(10).await.unwrap();
    assert_eq!(backend.applied(), vec![1, 2, 3]);

    migrator.migrate_sync(0).await.unwrap();
    assert_eq!(backend.applied(), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_goto_forward_and_to_nil() {
    let (migrator, backend) = fixture(&[
        "101_a.up.sql",
        "101_a.down.sql",
        "201_b.up.sql",
        "201_b.down.sql",
        "301_c.up.sql",
        "301_c.down.sql",
    ]);
    backend.set_applied([101]);

    let events = run_collect(&migrator, Operation::Goto(Version::new(301))).await;
    assert_eq!(file_names(&events), vec!["201_b.up.sql", "301_c.up.sql"]);

    migrator.goto_sync(Version::new(201)).await.unwrap();
    assert_eq!(backend.applied(), vec![101, 201]);

    migrator.goto_sync(Version::NIL).await.unwrap();
    assert!(backend.applied().is_empty());
}

#[tokio::test]
async fn test_failed_file_stops_remaining_plan() {
    let (migrator, backend) = fixture(&THREE);
    backend.fail_on(2, Direction::Up);

    let events = run_collect(&migrator, Operation::Up).await;
    assert_eq!(file_names(&events), vec!["1_a.up.sql", "2_b.up.sql"]);
    assert_eq!(events.iter().filter(|e| e.is_error()).count(), 1);
    assert_eq!(backend.applied(), vec![1]);
    assert_eq!(backend.close_count(), 1);
}

#[tokio::test]
async fn test_missing_down_file_fails_before_applying() {
    let (migrator, backend) = fixture(&["1_a.up.sql", "1_a.down.sql", "2_b.up.sql"]);
    backend.set_applied([1, 2]);

    let errors = migrator.down_sync().await.unwrap_err();
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        errors[0].downcast_ref::<CoreError>(),
        Some(CoreError::MissingDownFile { version }) if *version == Version::new(2)
    ));
    assert!(backend.executed().is_empty());
    assert_eq!(backend.applied(), vec![1, 2]);
}

#[tokio::test]
async fn test_duplicate_files_fail_discovery() {
    let (migrator, backend) = fixture(&["1_a.up.sql", "1_b.up.sql"]);

    let errors = migrator.up_sync().await.unwrap_err();
    assert!(matches!(
        errors[0].downcast_ref::<CoreError>(),
        Some(CoreError::DuplicateMigration { .. })
    ));
    assert!(backend.executed().is_empty());
}

#[tokio::test]
async fn test_initialize_failure_is_reported() {
    let (migrator, backend) = fixture(&THREE);
    backend.fail_initialize(true);

    let errors = migrator.up_sync().await.unwrap_err();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].to_string().contains("[D001]"));
    assert!(backend.executed().is_empty());
    assert!(migrator.version().await.is_err());
}

#[tokio::test]
async fn test_close_failure_is_reported_after_applying() {
    let (migrator, backend) = fixture(&THREE);
    backend.fail_close(true);

    let errors = migrator.up_sync().await.unwrap_err();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].to_string().contains("close failed"));
    assert_eq!(backend.applied(), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_unknown_driver() {
    let store: Arc<dyn MigrationStore> = Arc::new(MemoryStore::new());
    let migrator = Migrator::new(Arc::new(DriverRegistry::new()), "nope://x", store);
    let errors = migrator.up_sync().await.unwrap_err();
    assert!(errors[0].to_string().contains("[D004]"));
}

#[tokio::test]
async fn test_redo_reverts_and_reapplies() {
    let (migrator, backend) = fixture(&THREE);
    backend.set_applied([1, 2]);

    let events = run_collect(&migrator, Operation::Redo).await;
    assert_eq!(file_names(&events), vec!["2_b.down.sql", "2_b.up.sql"]);
    assert_eq!(backend.applied(), vec![1, 2]);
}

#[tokio::test]
async fn test_redo_skips_reapply_when_revert_fails() {
    let (migrator, backend) = fixture(&THREE);
    backend.set_applied([1, 2]);
    backend.fail_on(2, Direction::Down);

    let events = run_collect(&migrator, Operation::Redo).await;
    assert_eq!(file_names(&events), vec!["2_b.down.sql"]);
    assert!(events.iter().any(PipeEvent::is_error));
    assert_eq!(backend.applied(), vec![1, 2]);
}

#[tokio::test]
async fn test_reset_rebuilds_from_empty() {
    let (migrator, backend) = fixture(&THREE);
    backend.set_applied([1, 2]);

    let events = run_collect(&migrator, Operation::Reset).await;
    assert_eq!(
        file_names(&events),
        vec![
            "2_b.down.sql",
            "1_a.down.sql",
            "1_a.up.sql",
            "2_b.up.sql",
            "3_c.up.sql"
        ]
    );
    assert_eq!(backend.applied(), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_graceful_interrupt_finishes_current_file() {
    let (migrator, backend) = fixture(&THREE);
    backend.set_delay(Duration::from_millis(50));
    let interrupt = Interrupt::new(InterruptMode::Graceful);
    let migrator = migrator.with_interrupt(interrupt.clone());

    let mut handle = migrator.spawn(Operation::Up);
    let first = handle.events().recv().await.unwrap();
    assert!(matches!(first, PipeEvent::File(_)));
    interrupt.signal();

    let (task, reader) = handle.into_parts();
    let rest = reader.collect().await;
    task.await.unwrap();

    assert_eq!(backend.applied(), vec![1]);
    assert!(rest.iter().any(|e| e.to_string() == ABORT_MESSAGE));
    assert!(!rest.iter().any(PipeEvent::is_error));
    assert!(file_names(&rest).is_empty());
}

#[tokio::test]
async fn test_immediate_interrupt_stops_without_waiting() {
    let (migrator, backend) = fixture(&THREE);
    backend.set_delay(Duration::from_secs(30));
    let interrupt = Interrupt::new(InterruptMode::Immediate);
    let migrator = migrator.with_interrupt(interrupt.clone());

    let mut handle = migrator.spawn(Operation::Up);
    assert!(matches!(
        handle.events().recv().await,
        Some(PipeEvent::File(_))
    ));
    interrupt.signal();

    let result = tokio::time::timeout(Duration::from_secs(5), handle.wait())
        .await
        .expect("operation should stop promptly");
    assert!(result.is_ok());
    assert!(backend.applied().is_empty());
    assert_eq!(backend.close_count(), 1);
}

#[tokio::test]
async fn test_second_graceful_interrupt_stops_without_waiting() {
    let (migrator, backend) = fixture(&THREE);
    backend.set_delay(Duration::from_secs(30));
    let interrupt = Interrupt::new(InterruptMode::Graceful);
    let migrator = migrator.with_interrupt(interrupt.clone());

    let mut handle = migrator.spawn(Operation::Up);
    assert!(matches!(
        handle.events().recv().await,
        Some(PipeEvent::File(_))
    ));
    interrupt.signal();
    interrupt.signal();

    let result = tokio::time::timeout(Duration::from_secs(5), handle.wait())
        .await
        .expect("operation should stop promptly");
    assert!(result.is_ok());
    assert!(backend.applied().is_empty());
    assert_eq!(backend.close_count(), 1);
}

#[tokio::test]
async fn test_interrupt_before_start_prevents_dispatch() {
    let (migrator, backend) = fixture(&THREE);
    let interrupt = Interrupt::default();
    interrupt.signal();
    let migrator = migrator.with_interrupt(interrupt);

    migrator.up_sync().await.unwrap();
    assert!(backend.executed().is_empty());
    assert_eq!(backend.open_count(), 0);
}

#[tokio::test]
async fn test_caller_owned_pipe_is_closed() {
    let (migrator, backend) = fixture(&THREE);
    let (writer, reader) = pipe();
    let collector = tokio::spawn(reader.collect());

    migrator.up(writer.clone()).await;
    assert!(writer.is_closed());
    assert_eq!(file_names(&collector.await.unwrap()).len(), 3);
    assert_eq!(backend.applied(), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_versions_descending() {
    let (migrator, backend) = fixture(&THREE);
    backend.set_applied([2, 1, 3]);
    let versions = migrator.versions().await.unwrap();
    assert_eq!(
        versions.as_slice(),
        &[Version::new(3), Version::new(2), Version::new(1)]
    );
}
