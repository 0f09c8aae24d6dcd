use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn halfsies(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("halfsies").unwrap();
    cmd.env("HALFSIES_DATA_DIR", dir.path())
        .env_remove("HALFSIES_LOG")
        .env_remove("HALFSIES_PASSWORD");
    cmd
}

/// Initialized data dir with Alex and Sam registered and Alex logged in
fn household() -> TempDir {
    let dir = TempDir::new().unwrap();
    halfsies(&dir).arg("init").assert().success();
    halfsies(&dir)
        .args(["user", "register", "Alex", "alex@example.com"])
        .env("HALFSIES_PASSWORD", "password123")
        .assert()
        .success();
    halfsies(&dir)
        .args(["user", "register", "Sam", "sam@example.com"])
        .env("HALFSIES_PASSWORD", "password456")
        .assert()
        .success();
    halfsies(&dir)
        .args(["user", "login", "alex@example.com"])
        .env("HALFSIES_PASSWORD", "password123")
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged in as Alex"));
    dir
}

#[test]
fn test_commands_require_init() {
    let dir = TempDir::new().unwrap();
    halfsies(&dir)
        .args(["category", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("halfsies init"));
}

#[test]
fn test_init_seeds_categories() {
    let dir = TempDir::new().unwrap();
    halfsies(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created 10 default categories"));

    halfsies(&dir)
        .args(["category", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Groceries"))
        .stdout(predicate::str::contains("Other"));

    halfsies(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already set up"));
}

#[test]
fn test_third_member_is_rejected() {
    let dir = household();
    halfsies(&dir)
        .args(["user", "register", "Jo", "jo@example.com"])
        .env("HALFSIES_PASSWORD", "password789")
        .assert()
        .failure()
        .stderr(predicate::str::contains("two members"));
}

#[test]
fn test_wrong_password_fails_login() {
    let dir = household();
    halfsies(&dir)
        .args(["user", "login", "sam@example.com"])
        .env("HALFSIES_PASSWORD", "not-the-password")
        .assert()
        .failure();
}

#[test]
fn test_adding_expense_requires_login() {
    let dir = household();
    halfsies(&dir).args(["user", "logout"]).assert().success();
    halfsies(&dir)
        .args(["expense", "add", "Milk", "4.00", "-c", "Groceries"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not logged in"));
}

#[test]
fn test_month_shows_who_owes_whom() {
    let dir = household();
    halfsies(&dir)
        .args([
            "expense", "add", "Weekly shop", "100.00", "-c", "Groceries", "-d", "2025-03-10",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added expense: Weekly shop $100.00"));

    halfsies(&dir)
        .args(["month", "2025-03"])
        .assert()
        .success()
        .stdout(predicate::str::contains("March 2025"))
        .stdout(predicate::str::contains("Balance: Sam owes Alex $50.00"));

    halfsies(&dir)
        .args(["settle", "record", "50.00", "--from", "Sam", "-m", "2025-03"])
        .assert()
        .success()
        .stdout(predicate::str::contains("All settled up"));

    halfsies(&dir)
        .args(["month", "2025-03"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Balance: All settled up"));
}

#[test]
fn test_expense_list_filters_by_month() {
    let dir = household();
    halfsies(&dir)
        .args(["expense", "add", "Rent", "1200", "-c", "Rent", "-d", "2025-01-01"])
        .assert()
        .success();
    halfsies(&dir)
        .args(["expense", "add", "Dinner", "60", "-c", "Dining Out", "-d", "2025-02-14"])
        .assert()
        .success();

    halfsies(&dir)
        .args(["expense", "list", "-m", "2025-02"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dinner"))
        .stdout(predicate::str::contains("Rent").not());
}

#[test]
fn test_export_expenses_csv() {
    let dir = household();
    halfsies(&dir)
        .args(["expense", "add", "Bus pass", "45.50", "-c", "Transport", "-d", "2025-04-02"])
        .assert()
        .success();

    let out = dir.path().join("expenses.csv");
    halfsies(&dir)
        .args(["export", "expenses"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 1 expense(s)"));

    let contents = std::fs::read_to_string(&out).unwrap();
    assert!(contents.starts_with("id,date,description,amount,category"));
    assert!(contents.contains("Bus pass"));
    assert!(contents.contains("45.50"));
}

#[test]
fn test_history_lists_changes() {
    let dir = household();
    halfsies(&dir)
        .args(["location", "add", "Corner Market"])
        .assert()
        .success();

    halfsies(&dir)
        .args(["history", "--entity", "location"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Corner Market"));
}

#[test]
fn test_check_reports_clean_data() {
    let dir = household();
    halfsies(&dir).arg("check").assert().success();
}

#[test]
fn test_check_fix_requires_login() {
    let dir = household();
    halfsies(&dir).args(["user", "logout"]).assert().success();

    let stray = dir.path().join("data").join("receipts").join("stray.pdf");
    std::fs::write(&stray, b"%PDF-1.4").unwrap();

    halfsies(&dir)
        .args(["check", "--fix"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not logged in"));
    assert!(stray.exists());

    halfsies(&dir)
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("stray.pdf"));
}

#[test]
fn test_email_send_requires_login() {
    let dir = household();
    halfsies(&dir).args(["user", "logout"]).assert().success();

    halfsies(&dir)
        .args(["email", "month", "2025-03"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not logged in"));

    halfsies(&dir)
        .args(["email", "month", "2025-03", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Balance: All settled up"));
}
