use coursetrack_core::db::open_db_in_memory;
use coursetrack_core::{
    build_default_registry, Account, AccountRepository, ProgressService, RepoError,
    SqliteAccountRepository, SqliteProgressRepository,
};
use std::time::{SystemTime, UNIX_EPOCH};

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time should be after unix epoch")
        .as_millis() as i64
}

struct Fixture {
    conn: rusqlite::Connection,
    registry: coursetrack_core::HookRegistry,
    account: Account,
}

fn fixture() -> Fixture {
    let conn = open_db_in_memory().unwrap();
    let registry = build_default_registry().unwrap();
    let account = Account::new("ada", "ada@example.com");
    SqliteAccountRepository::new(&conn, &registry)
        .create_account(&account)
        .unwrap();
    Fixture {
        conn,
        registry,
        account,
    }
}

#[test]
fn incomplete_record_has_no_timestamp() {
    let fx = fixture();
    let service = ProgressService::new(SqliteProgressRepository::new(&fx.conn, &fx.registry));

    let progress = service
        .record_progress(fx.account.uuid, "intro-to-sql", false)
        .unwrap();
    assert!(!progress.completed);
    assert_eq!(progress.completed_at, None);
}

#[test]
fn completing_a_lesson_stamps_the_write_time() {
    let fx = fixture();
    let service = ProgressService::new(SqliteProgressRepository::new(&fx.conn, &fx.registry));

    service
        .record_progress(fx.account.uuid, "intro-to-sql", false)
        .unwrap();

    let before = now_epoch_ms();
    let progress = service
        .record_progress(fx.account.uuid, "intro-to-sql", true)
        .unwrap();
    let after = now_epoch_ms();

    assert!(progress.completed);
    let stamped = progress.completed_at.expect("timestamp should be set");
    assert!(stamped >= before && stamped <= after);

    // The stored row agrees with the returned record.
    let stored = service
        .get_progress(fx.account.uuid, "intro-to-sql")
        .unwrap()
        .unwrap();
    assert_eq!(stored.completed_at, progress.completed_at);
}

#[test]
fn repeated_completion_does_not_advance_the_timestamp() {
    let fx = fixture();
    let service = ProgressService::new(SqliteProgressRepository::new(&fx.conn, &fx.registry));

    let first = service
        .record_progress(fx.account.uuid, "intro-to-sql", true)
        .unwrap();
    let second = service
        .record_progress(fx.account.uuid, "intro-to-sql", true)
        .unwrap();

    assert_eq!(second.completed_at, first.completed_at);
    assert_eq!(second.uuid, first.uuid);
}

#[test]
fn unmarking_completion_clears_the_timestamp() {
    let fx = fixture();
    let service = ProgressService::new(SqliteProgressRepository::new(&fx.conn, &fx.registry));

    service
        .record_progress(fx.account.uuid, "intro-to-sql", true)
        .unwrap();
    let progress = service
        .record_progress(fx.account.uuid, "intro-to-sql", false)
        .unwrap();

    assert!(!progress.completed);
    assert_eq!(progress.completed_at, None);
}

#[test]
fn caller_supplied_timestamp_is_overruled_by_the_flag() {
    let fx = fixture();
    let repo = SqliteProgressRepository::new(&fx.conn, &fx.registry);

    use coursetrack_core::{LessonProgress, ProgressRepository};
    let mut progress = LessonProgress::new(fx.account.uuid, "intro-to-sql");
    progress.completed = false;
    progress.completed_at = Some(1_700_000_000_000);

    let persisted = repo.create_progress(&progress).unwrap();
    assert_eq!(persisted.completed_at, None);
    assert!(persisted.timestamp_matches_flag());
}

#[test]
fn one_record_per_account_lesson_pair() {
    let fx = fixture();
    let service = ProgressService::new(SqliteProgressRepository::new(&fx.conn, &fx.registry));

    service
        .record_progress(fx.account.uuid, "intro-to-sql", false)
        .unwrap();
    service
        .record_progress(fx.account.uuid, "intro-to-sql", true)
        .unwrap();

    let count: u32 = fx
        .conn
        .query_row("SELECT COUNT(*) FROM lesson_progress;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn record_progress_rejects_malformed_slug() {
    let fx = fixture();
    let service = ProgressService::new(SqliteProgressRepository::new(&fx.conn, &fx.registry));

    let err = service
        .record_progress(fx.account.uuid, "Not A Slug", true)
        .unwrap_err();
    assert!(matches!(err, RepoError::ProgressValidation(_)));
}

#[test]
fn completion_percent_over_lesson_set() {
    let fx = fixture();
    let service = ProgressService::new(SqliteProgressRepository::new(&fx.conn, &fx.registry));

    service
        .record_progress(fx.account.uuid, "intro", true)
        .unwrap();
    service
        .record_progress(fx.account.uuid, "joins", true)
        .unwrap();
    service
        .record_progress(fx.account.uuid, "indexes", false)
        .unwrap();

    let lessons = ["intro", "joins", "indexes", "transactions"];
    let percent = service
        .completion_percent(fx.account.uuid, &lessons)
        .unwrap();
    assert_eq!(percent, 50.0);

    let third = service
        .completion_percent(fx.account.uuid, &["intro", "joins", "indexes"])
        .unwrap();
    assert_eq!(third, 66.67);

    let empty = service.completion_percent(fx.account.uuid, &[]).unwrap();
    assert_eq!(empty, 0.0);
}

#[test]
fn completion_percent_counts_duplicate_slugs_once() {
    let fx = fixture();
    let service = ProgressService::new(SqliteProgressRepository::new(&fx.conn, &fx.registry));

    service
        .record_progress(fx.account.uuid, "intro", true)
        .unwrap();

    let repeated = service
        .completion_percent(fx.account.uuid, &["intro", "intro", "intro"])
        .unwrap();
    assert_eq!(repeated, 100.0);

    let mixed = service
        .completion_percent(fx.account.uuid, &["intro", "joins", "intro"])
        .unwrap();
    assert_eq!(mixed, 50.0);
}

#[test]
fn list_for_account_orders_by_slug() {
    let fx = fixture();
    let service = ProgressService::new(SqliteProgressRepository::new(&fx.conn, &fx.registry));

    service
        .record_progress(fx.account.uuid, "joins", false)
        .unwrap();
    service
        .record_progress(fx.account.uuid, "intro", true)
        .unwrap();

    let records = service.list_for_account(fx.account.uuid).unwrap();
    let slugs: Vec<&str> = records.iter().map(|r| r.lesson_slug.as_str()).collect();
    assert_eq!(slugs, vec!["intro", "joins"]);
}
