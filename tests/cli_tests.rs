//! Integration tests for the `bucket` binary.
//!
//! Each test points the binary at its own temporary data directory.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn bucket(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("bucket").unwrap();
    cmd.env("BUCKET_LEDGER_DATA_DIR", dir.path())
        .env_remove("RUST_LOG");
    cmd
}

fn run(dir: &TempDir, args: &[&str]) -> String {
    let assert = bucket(dir).args(args).assert().success();
    String::from_utf8(assert.get_output().stdout.clone()).unwrap()
}

fn setup_household(dir: &TempDir) {
    run(dir, &["workspace", "create", "Home", "--currency", "usd"]);
    run(dir, &["bucket", "create", "Food", "--allocation", "20"]);
    run(dir, &["bucket", "create", "Rent", "--allocation", "50%"]);
}

#[test]
fn test_init_and_config() {
    let dir = TempDir::new().unwrap();
    bucket(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialization complete"));
    assert!(dir.path().join("config.json").exists());

    bucket(&dir)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("Default currency: USD"))
        .stdout(predicate::str::contains("ledger.json"));
}

#[test]
fn test_workspace_create_list_and_check() {
    let dir = TempDir::new().unwrap();
    bucket(&dir)
        .args(["workspace", "create", "Home", "--currency", "eur"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created workspace: Home (EUR)"));

    let list = run(&dir, &["workspace", "list", "--mine"]);
    assert!(list.contains("Home"));
    assert!(list.contains("EUR"));

    bucket(&dir)
        .args(["workspace", "check", "home"])
        .assert()
        .success()
        .stdout(predicate::str::contains("OK"));
}

#[test]
fn test_allocated_income_and_bucket_list() {
    let dir = TempDir::new().unwrap();
    setup_household(&dir);

    run(&dir, &["txn", "add", "income", "1000", "--allocate", "-m", "Salary"]);

    let list = run(&dir, &["bucket", "list"]);
    assert!(list.contains("200.00"));
    assert!(list.contains("500.00"));
    assert!(list.contains("300.00"));
    assert!(list.contains("1000.00"));
}

#[test]
fn test_transfer_and_overdraw() {
    let dir = TempDir::new().unwrap();
    setup_household(&dir);
    run(&dir, &["txn", "add", "income", "100"]);

    bucket(&dir)
        .args(["transfer", "Inbox", "Food", "40"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Transferred 40.00 from Inbox to Food"));

    bucket(&dir)
        .args(["transfer", "Inbox", "Food", "500"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Insufficient balance"));

    let show = run(&dir, &["bucket", "show", "food"]);
    assert!(show.contains("Balance:     40.00"));
}

#[test]
fn test_distribute_with_targets() {
    let dir = TempDir::new().unwrap();
    setup_household(&dir);
    run(&dir, &["txn", "add", "income", "1000"]);

    bucket(&dir)
        .args(["distribute", "Inbox", "1000", "--to", "Food=20%", "--to", "Rent=15"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Distributed 215.00 from Inbox"))
        .stdout(predicate::str::contains("Remainder 785.00 stays in Inbox"));

    let list = run(&dir, &["bucket", "list"]);
    assert!(list.contains("785.00"));
}

#[test]
fn test_import_json_rows() {
    let dir = TempDir::new().unwrap();
    run(&dir, &["workspace", "create", "Home"]);

    let file = dir.path().join("rows.json");
    fs::write(
        &file,
        r#"[
            {"date": "2025-01-02", "description": "Paycheck", "amount": 150000, "type": "INCOME"},
            {"date": "2025-01-03", "description": "Coffee", "amount": -450, "type": "EXPENSE"}
        ]"#,
    )
    .unwrap();

    bucket(&dir)
        .args(["txn", "import"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 2 transaction(s)"));

    let register = run(&dir, &["txn", "list"]);
    assert!(register.contains("Paycheck"));
    assert!(register.contains("-4.50"));

    let list = run(&dir, &["bucket", "list"]);
    assert!(list.contains("1495.50"));
}

#[test]
fn test_inbox_cannot_be_deleted() {
    let dir = TempDir::new().unwrap();
    run(&dir, &["workspace", "create", "Home"]);

    bucket(&dir)
        .args(["bucket", "delete", "Inbox"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Inbox mutation forbidden"));
}

#[test]
fn test_unknown_bucket_reports_not_found() {
    let dir = TempDir::new().unwrap();
    run(&dir, &["workspace", "create", "Home"]);

    bucket(&dir)
        .args(["txn", "add", "expense", "5", "--bucket", "Nowhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Bucket not found: Nowhere"));
}

#[test]
fn test_audit_lists_committed_changes() {
    let dir = TempDir::new().unwrap();
    run(&dir, &["workspace", "create", "Home"]);
    run(&dir, &["txn", "add", "income", "25", "-m", "Gift"]);

    let audit = run(&dir, &["audit", "--workspace", "Home"]);
    assert!(audit.contains("CREATE Workspace"));
    assert!(audit.contains("CREATE Transaction"));
    assert!(audit.contains("(Gift)"));
}
