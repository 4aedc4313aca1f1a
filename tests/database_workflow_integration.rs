//! Integration tests for the review record workflow
//! These tests drive the public API against an on-disk SQLite database.

use review_records::domain::{EmployeeId, Review, ReviewError, ReviewField};
use review_records::infra::app_config::AppConfig;
use review_records::infra::db::{Database, ReviewRepository};
use std::collections::HashSet;
use std::rc::Rc;
use tempfile::TempDir;

fn seed_employees(db: &Database, ids: &[EmployeeId]) -> anyhow::Result<()> {
    let conn = db.connection();
    let conn = conn.lock().unwrap();
    conn.execute_batch("CREATE TABLE IF NOT EXISTS employee (id INTEGER PRIMARY KEY, name TEXT)")?;
    for id in ids {
        conn.execute(
            "INSERT INTO employee (id, name) VALUES (?1, ?2)",
            rusqlite::params![id, format!("employee-{}", id)],
        )?;
    }
    Ok(())
}

#[test]
fn test_full_review_workflow() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let db = Database::open_at(dir.path().join("reviews.sqlite"))?;
    seed_employees(&db, &[1, 2])?;

    let mut repo = db.review_repo();
    repo.drop_table()?;
    repo.create_table()?;

    // Create
    let first = repo.create(2023, "Good work", 1)?;
    let second = repo.create(2024, "Keeps improving", 2)?;
    let first_id = first.borrow().id().expect("saved");
    let second_id = second.borrow().id().expect("saved");
    assert_ne!(first_id, second_id);

    // Read back through the identity map
    let found = repo.find_by_id(first_id)?.expect("first review exists");
    assert!(Rc::ptr_eq(&first, &found));
    assert_eq!(
        found.borrow().to_string(),
        format!("<Review {}: 2023, Good work, Employee: 1>", first_id)
    );

    // Update
    first.borrow_mut().set_summary("Great work")?;
    repo.update(&first)?;

    // Delete
    repo.delete(&second)?;
    assert_eq!(second.borrow().id(), None);

    // A new unit of work sees only what was committed
    drop(repo);
    let mut repo = db.review_repo();
    let all = repo.get_all()?;
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].borrow().id(), Some(first_id));
    assert_eq!(all[0].borrow().summary(), "Great work");
    assert!(repo.find_by_id(second_id)?.is_none());
    Ok(())
}

#[test]
fn test_changes_survive_reopen() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("reviews.sqlite");

    let id = {
        let db = Database::open_at(path.clone())?;
        seed_employees(&db, &[7])?;
        let mut repo = db.review_repo();
        repo.create_table()?;
        let review = repo.create(2025, "Persisted across connections", 7)?;
        review.borrow().id().expect("saved")
    };

    let db = Database::open_at(path)?;
    let mut repo = db.review_repo();
    let review = repo.find_by_id(id)?.expect("row persisted");
    assert_eq!(review.borrow().year(), 2025);
    assert_eq!(review.borrow().employee_id(), 7);
    Ok(())
}

#[test]
fn test_injected_lookup_without_employee_table() -> anyhow::Result<()> {
    let db = Database::open_in_memory()?;
    let known: HashSet<EmployeeId> = [10, 11].into_iter().collect();
    let lookup = move |id: EmployeeId| -> anyhow::Result<bool> { Ok(known.contains(&id)) };
    let mut repo = ReviewRepository::new(db.connection(), lookup);
    repo.create_table()?;

    let review = repo.create(2023, "Directory-backed", 10)?;
    assert!(review.borrow().is_persisted());

    let err = repo.create(2023, "Unknown employee", 12).unwrap_err();
    match err {
        ReviewError::Validation(inner) => assert_eq!(inner.field(), Some(ReviewField::EmployeeId)),
        other => panic!("expected validation error, got {other:?}"),
    }

    let transient = Review::new(2030, "Not saved yet", 11, repo.lookup())?.into_shared();
    let id = repo.save(&transient)?;
    assert_eq!(transient.borrow().id(), Some(id));
    assert_eq!(repo.get_all()?.len(), 2);
    Ok(())
}

#[test]
fn test_default_config_saves_without_employee_table() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    if std::env::var("REVIEW_RECORDS_DB_PATH").is_ok() {
        return Ok(());
    }
    let config = AppConfig {
        database_path: Some(dir.path().join("default.sqlite")),
        ..AppConfig::default()
    };
    let db = Database::open_with_config(&config)?;
    assert!(!db.foreign_keys_enabled()?);

    // No `employee` table exists; the referencing column is not enforced.
    let accept_all = |_: EmployeeId| -> anyhow::Result<bool> { Ok(true) };
    let mut repo = ReviewRepository::new(db.connection(), accept_all);
    repo.create_table()?;

    let review = repo.create(2023, "Good work", 1)?;
    let id = review.borrow().id().expect("saved");
    assert!(repo.find_by_id(id)?.is_some());
    Ok(())
}

#[test]
fn test_foreign_keys_enforced_when_configured() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    if std::env::var("REVIEW_RECORDS_DB_PATH").is_ok() {
        return Ok(());
    }
    let config = AppConfig {
        database_path: Some(dir.path().join("fk.sqlite")),
        enforce_foreign_keys: true,
    };
    let db = Database::open_with_config(&config)?;
    assert!(db.foreign_keys_enabled()?);
    seed_employees(&db, &[1])?;

    // The default lookup reads the same table the foreign key references.
    let mut repo = db.review_repo();
    repo.create_table()?;

    let review = repo.create(2023, "Known employee", 1)?;
    assert!(review.borrow().is_persisted());

    let err = repo.create(2023, "Unknown employee", 5).unwrap_err();
    assert!(err.is_invalid_field());

    // With the lookup bypassed, the storage constraint still rejects the row.
    let accept_all = |_: EmployeeId| -> anyhow::Result<bool> { Ok(true) };
    let mut unchecked = ReviewRepository::new(db.connection(), accept_all);
    let err = unchecked.create(2023, "Dangling employee", 5).unwrap_err();
    assert!(matches!(err, ReviewError::Storage(_)));
    assert_eq!(unchecked.tracked_len(), 0);
    assert_eq!(repo.get_all()?.len(), 1);
    Ok(())
}
