use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

fn steward(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("steward").unwrap();
    cmd.env("STEWARD_HOME", home.path())
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("STEWARD_PASSWORD");
    cmd
}

fn json_output(cmd: &mut Command) -> Value {
    let output = cmd.output().unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn queue_lifecycle() {
    let home = TempDir::new().unwrap();

    steward(&home)
        .args(["queue", "add", "sales", r#"{"date": "2024-06-01", "total": 310}"#])
        .assert()
        .success()
        .stdout(predicate::str::contains("Queued sales record (ID: 1)"));

    steward(&home)
        .args(["queue", "add", "sales", "-"])
        .write_stdin(r#"{"date": "2024-06-02", "total": 120}"#)
        .assert()
        .success();

    let status = json_output(steward(&home).args(["-o", "json", "queue", "status"]));
    assert_eq!(status["sales"], 2);
    assert_eq!(status["total"], 2);

    steward(&home)
        .args(["queue", "mark-synced", "sales", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Marked 1 of 1 sales records synced"));

    let listed = json_output(steward(&home).args(["-o", "json", "queue", "list", "sales"]));
    let records = listed["items"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["id"], 2);

    let cleared = json_output(steward(&home).args(["-o", "json", "queue", "clear-synced", "sales"]));
    assert_eq!(cleared["cleared"], 1);
}

#[test]
fn queues_are_isolated() {
    let home = TempDir::new().unwrap();

    steward(&home)
        .args(["queue", "add", "inventory", r#"{"flavor_id": 3, "tubs": 4}"#])
        .assert()
        .success();

    let status = json_output(steward(&home).args(["-o", "json", "queue", "status"]));
    assert_eq!(status["inventory"], 1);
    assert_eq!(status["sales"], 0);
    assert_eq!(status["receipts"], 0);

    steward(&home)
        .args(["queue", "mark-synced", "receipts", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Marked 0 of 1"));

    let status = json_output(steward(&home).args(["-o", "json", "queue", "status"]));
    assert_eq!(status["inventory"], 1);
}

#[test]
fn unknown_queue_is_rejected() {
    let home = TempDir::new().unwrap();

    steward(&home)
        .args(["queue", "list", "returns"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("returns"));
}

#[test]
fn invalid_payload_is_rejected() {
    let home = TempDir::new().unwrap();

    steward(&home)
        .args(["queue", "add", "sales", "{not json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn cache_set_and_show() {
    let home = TempDir::new().unwrap();

    steward(&home)
        .args([
            "cache",
            "set",
            "flavors",
            r#"[{"id": 1, "name": "Vanilla"}, {"id": 2, "name": "Mango"}]"#,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cached 2 items in 'flavors'"));

    steward(&home)
        .args(["cache", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Vanilla").and(predicate::str::contains("Mango")));

    steward(&home)
        .args(["cache", "set", "flavors", r#"[{"id": 1}, {"id": 1}]"#])
        .assert()
        .failure();

    steward(&home)
        .args(["cache", "show", "flavors"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Mango"));
}

#[test]
fn sync_with_empty_queues() {
    let home = TempDir::new().unwrap();

    steward(&home)
        .args(["sync", "run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No pending records to sync."));
}

#[test]
fn config_path_uses_home() {
    let home = TempDir::new().unwrap();
    let paths = json_output(steward(&home).args(["-o", "json", "config", "path"]));

    let database = paths["database"].as_str().unwrap();
    assert!(database.starts_with(home.path().to_str().unwrap()));
    assert!(database.ends_with("steward.db"));
}

#[test]
fn session_show_when_logged_out() {
    let home = TempDir::new().unwrap();
    let session = json_output(steward(&home).args(["-o", "json", "session", "show"]));
    assert_eq!(session["authenticated"], false);
}

#[test]
fn config_init_writes_file_once() {
    let home = TempDir::new().unwrap();

    steward(&home).args(["config", "init"]).assert().success();
    assert!(home.path().join("config.yaml").is_file());

    steward(&home)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    steward(&home).args(["config", "init", "--force"]).assert().success();
}
