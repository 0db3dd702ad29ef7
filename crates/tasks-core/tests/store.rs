use std::path::Path;
use std::time::Duration;

use rstest::{fixture, rstest};
use tasks_core::store::TASKS_BUCKET;
use tasks_core::{
    ErrorKind, Position, StoreConfig, StoreError, StoreState, TaskDb, TaskId, TaskStore,
};
use tempfile::TempDir;

#[fixture]
fn dir() -> TempDir {
    tempfile::tempdir().unwrap()
}

fn config(dir: &Path) -> StoreConfig {
    StoreConfig::new(dir.join("tasks.db")).with_lock_timeout(Duration::from_millis(200))
}

fn open(dir: &Path) -> TaskDb {
    TaskDb::open(&config(dir)).unwrap()
}

fn listing(db: &TaskDb) -> Vec<(usize, String)> {
    db.list_tasks()
        .unwrap()
        .map(|entry| entry.map(|e| (e.position.get(), e.text)))
        .collect::<Result<_, _>>()
        .unwrap()
}

fn pos(n: usize) -> Position {
    Position::new(n).unwrap()
}

#[rstest]
fn open_creates_file_and_empty_bucket(dir: TempDir) {
    let db = open(dir.path());
    assert_eq!(db.path(), dir.path().join("tasks.db"));
    assert!(db.path().exists());
    assert_eq!(db.state(), StoreState::Open);
    assert!(listing(&db).is_empty());

    let stats = db.stats().unwrap();
    assert_eq!(stats.tasks, 0);
    assert_eq!(stats.next_id, 1);
}

#[rstest]
fn ids_are_unique_and_increasing_across_reopen(dir: TempDir) {
    let mut ids: Vec<TaskId> = Vec::new();
    for round in 0..3 {
        let mut db = open(dir.path());
        for n in 0..4 {
            ids.push(db.add_task(&format!("round {round} task {n}")).unwrap().id);
        }
        // 削除しても id は再利用されない
        db.complete_task(pos(1)).unwrap();
        db.close().unwrap();
    }

    assert_eq!(ids.first().map(|id| id.get()), Some(1));
    for pair in ids.windows(2) {
        assert!(pair[0] < pair[1], "{:?} should be < {:?}", pair[0], pair[1]);
    }
}

#[rstest]
fn add_task_failing_mid_transaction_rolls_back_sequence(dir: TempDir) {
    let mut db = open(dir.path());
    db.add_task("kept").unwrap();
    db.close().unwrap();

    // sequence 更新の後、record の INSERT で失敗させる
    let raw = rusqlite::Connection::open(dir.path().join("tasks.db")).unwrap();
    raw.execute_batch(
        "CREATE TRIGGER fail_write BEFORE INSERT ON entries \
         WHEN NEW.value = CAST('boom' AS BLOB) \
         BEGIN SELECT RAISE(ABORT, 'simulated disk failure'); END;",
    )
    .unwrap();
    drop(raw);

    let mut db = open(dir.path());
    let before = db.stats().unwrap();

    let err = db.add_task("boom").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TransactionAborted);
    assert_eq!(err.root_cause().kind(), ErrorKind::IoFailure);

    assert_eq!(listing(&db), vec![(1, "kept".to_string())]);
    assert_eq!(db.stats().unwrap(), before);
    assert_eq!(db.add_task("after").unwrap().id.get(), before.next_id);
}

/// Same guarantee for arbitrary `update` closures that fail after writing.
#[rstest]
fn failed_transaction_leaves_no_trace(dir: TempDir) {
    let mut db = open(dir.path());
    db.add_task("kept").unwrap();
    let before = db.stats().unwrap();

    // record 書き込み後、commit 前に失敗させる
    let err = db
        .update(|tx| -> Result<(), StoreError> {
            let bucket = tx.bucket(TASKS_BUCKET)?;
            let id = TaskId::new(bucket.next_sequence()?);
            bucket.put(&id.to_key(), b"lost")?;
            Err(StoreError::Io(std::io::Error::other("simulated crash")))
        })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TransactionAborted);
    assert_eq!(err.root_cause().kind(), ErrorKind::IoFailure);

    assert_eq!(listing(&db), vec![(1, "kept".to_string())]);
    assert_eq!(db.stats().unwrap(), before);

    let next = db.add_task("after").unwrap();
    assert_eq!(next.id.get(), before.next_id);
}

#[rstest]
fn listing_stays_ordered_after_deletions(dir: TempDir) {
    let mut db = open(dir.path());
    for text in ["one", "two", "three", "four", "five"] {
        db.add_task(text).unwrap();
    }
    db.complete_task(pos(4)).unwrap();
    db.complete_task(pos(2)).unwrap();

    assert_eq!(
        listing(&db),
        vec![
            (1, "one".to_string()),
            (2, "three".to_string()),
            (3, "five".to_string()),
        ]
    );

    let ids: Vec<u64> = db
        .list_tasks()
        .unwrap()
        .map(|entry| entry.unwrap().id.get())
        .collect();
    assert_eq!(ids, vec![1, 3, 5]);
}

#[rstest]
fn completing_position_two_shifts_the_rest(dir: TempDir) {
    let mut db = open(dir.path());
    for text in ["A", "B", "C"] {
        db.add_task(text).unwrap();
    }

    let removed = db.complete_task(pos(2)).unwrap();
    assert_eq!(removed.text, "B");
    assert_eq!(removed.id.get(), 2);
    assert_eq!(listing(&db), vec![(1, "A".to_string()), (2, "C".to_string())]);
}

#[rstest]
fn listing_is_idempotent(dir: TempDir) {
    let mut db = open(dir.path());
    db.add_task("x").unwrap();
    db.add_task("y").unwrap();
    assert_eq!(listing(&db), listing(&db));
}

#[rstest]
fn listing_spans_many_pages(dir: TempDir) {
    let mut db = open(dir.path());
    for n in 1..=300 {
        db.add_task(&format!("task {n}")).unwrap();
    }
    let rows = listing(&db);
    assert_eq!(rows.len(), 300);
    assert_eq!(rows[299], (300, "task 300".to_string()));
}

#[rstest]
#[case::just_past_end(3)]
#[case::far_past_end(99)]
fn out_of_range_completion_is_not_found(dir: TempDir, #[case] position: usize) {
    let mut db = open(dir.path());
    db.add_task("first").unwrap();
    db.add_task("second").unwrap();

    let err = db.complete_task(pos(position)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(matches!(err, StoreError::NotFound { len: 2, .. }));
    assert_eq!(
        listing(&db),
        vec![(1, "first".to_string()), (2, "second".to_string())]
    );
}

#[rstest]
fn reopen_keeps_tasks(dir: TempDir) {
    let mut db = open(dir.path());
    db.add_task("buy milk").unwrap();
    db.close().unwrap();
    assert_eq!(db.state(), StoreState::Closed);

    let db = open(dir.path());
    assert_eq!(listing(&db), vec![(1, "buy milk".to_string())]);
}

#[rstest]
fn text_is_trimmed_and_blank_rejected(dir: TempDir) {
    let mut db = open(dir.path());
    let task = db.add_task("  walk the dog  ").unwrap();
    assert_eq!(task.text, "walk the dog");

    let err = db.add_task("   ").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(db.stats().unwrap().next_id, 2);
}

#[rstest]
fn second_open_times_out_while_first_is_held(dir: TempDir) {
    let first = open(dir.path());

    let err = TaskDb::open(&config(dir.path()).with_lock_timeout(Duration::from_millis(50)))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::LockTimeout);

    drop(first);
    let reopened = TaskDb::open(&config(dir.path())).unwrap();
    assert_eq!(reopened.state(), StoreState::Open);
}

#[rstest]
fn close_releases_lock_and_is_idempotent(dir: TempDir) {
    let mut first = open(dir.path());
    first.close().unwrap();
    first.close().unwrap();

    let mut second = open(dir.path());
    second.add_task("after close").unwrap();
}

#[rstest]
fn closed_handle_rejects_every_operation(dir: TempDir) {
    let mut db = open(dir.path());
    db.close().unwrap();

    assert!(matches!(db.add_task("x"), Err(StoreError::Closed)));
    assert!(matches!(db.list_tasks(), Err(StoreError::Closed)));
    assert!(matches!(db.complete_task(pos(1)), Err(StoreError::Closed)));
    assert!(matches!(db.stats(), Err(StoreError::Closed)));
    assert!(matches!(db.view(|_| Ok(())), Err(StoreError::Closed)));
}

#[rstest]
fn view_is_read_only(dir: TempDir) {
    let db = open(dir.path());
    let err = db
        .view(|tx| tx.bucket(TASKS_BUCKET)?.put(b"k", b"v"))
        .unwrap_err();
    assert!(matches!(err, StoreError::ReadOnly));
}

#[rstest]
fn non_utf8_record_surfaces_as_corrupt(dir: TempDir) {
    let mut db = open(dir.path());
    db.update(|tx| tx.bucket(TASKS_BUCKET)?.put(&TaskId::new(1).to_key(), &[0xff, 0xfe]))
        .unwrap();

    let first = db.list_tasks().unwrap().next().unwrap().unwrap_err();
    assert_eq!(first.kind(), ErrorKind::IoFailure);
}
