mod common;

use std::{fs, path::Path};

use assert_cmd::Command;
use common::{SampleExports, TestWorkspace};
use predicates::prelude::*;
use predicates::str::contains;

fn import_cmd(exports: &SampleExports, store: &Path) -> Command {
    let mut cmd = Command::cargo_bin("crm-lake").expect("binary exists");
    cmd.args([
        "import",
        "--deals",
        exports.deals.to_str().unwrap(),
        "--accounts",
        exports.accounts.to_str().unwrap(),
        "--contacts",
        exports.contacts.to_str().unwrap(),
        "--leads",
        exports.leads.to_str().unwrap(),
        "--tasks",
        exports.tasks.to_str().unwrap(),
        "--store",
        store.to_str().unwrap(),
    ]);
    cmd
}

#[test]
fn import_writes_lake_export_and_bucket() {
    let workspace = TestWorkspace::new();
    let exports = workspace.write_exports();
    let store = workspace.path().join("lake");
    let export_path = workspace.path().join("export.csv");
    let bucket = workspace.path().join("bucket");

    import_cmd(&exports, &store)
        .args([
            "--export",
            export_path.to_str().unwrap(),
            "--bucket-dir",
            bucket.to_str().unwrap(),
        ])
        .assert()
        .success();

    assert!(store.join("deals.sqlite").exists());
    assert!(store.join("tasks.sqlite").exists());

    let exported = fs::read_to_string(&export_path).expect("read export");
    let mut lines = exported.lines();
    assert!(lines.next().unwrap().starts_with("Id,OwnerId,FirstName"));
    // three deals (one unmatched) followed by two leads
    assert_eq!(lines.count(), 5);
    assert!(exported.contains("ada@acme.example"));
    assert!(exported.contains("\"vip,west\""));

    let object = fs::read_to_string(bucket.join("C1")).expect("deal object");
    assert!(object.contains("Negotiation"));
    assert!(bucket.join("L1").exists());
    assert!(!bucket.join("C404").exists());
}

#[test]
fn show_and_users_read_back_from_the_lake() {
    let workspace = TestWorkspace::new();
    let exports = workspace.write_exports();
    let store = workspace.path().join("lake");
    import_cmd(&exports, &store).assert().success();

    Command::cargo_bin("crm-lake")
        .expect("binary exists")
        .args(["show", "--kind", "deal", "--id", "C1", "--store", store.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("Negotiation"))
        .stdout(contains("Acme Corp"));

    Command::cargo_bin("crm-lake")
        .expect("binary exists")
        .args(["users", "--store", store.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("Dana Owner"))
        .stdout(contains("Lee Owner"));

    Command::cargo_bin("crm-lake")
        .expect("binary exists")
        .args(["show", "--kind", "task", "--id", "missing", "--store", store.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("No Task stored under id 'missing'"));
}

#[test]
fn export_applies_contact_filters() {
    let workspace = TestWorkspace::new();
    let exports = workspace.write_exports();
    let store = workspace.path().join("lake");
    import_cmd(&exports, &store).assert().success();

    let output = workspace.path().join("vip.csv");
    Command::cargo_bin("crm-lake")
        .expect("binary exists")
        .args([
            "export",
            "--store",
            store.to_str().unwrap(),
            "--tag",
            "vip",
            "--has-email",
            "-o",
            output.to_str().unwrap(),
        ])
        .assert()
        .success();

    let exported = fs::read_to_string(&output).expect("read export");
    let ids: Vec<&str> = exported
        .lines()
        .skip(1)
        .map(|line| line.split(',').next().unwrap_or_default())
        .collect();
    assert_eq!(ids, vec!["C1", "L1"]);

    Command::cargo_bin("crm-lake")
        .expect("binary exists")
        .args([
            "export",
            "--store",
            store.to_str().unwrap(),
            "--from",
            "leads",
            "--owner",
            "U1",
        ])
        .assert()
        .success()
        .stdout(contains("Milton"))
        .stdout(contains("Peter").not());
}

#[test]
fn upload_command_pushes_stored_leads() {
    let workspace = TestWorkspace::new();
    let exports = workspace.write_exports();
    let store = workspace.path().join("lake");
    import_cmd(&exports, &store).assert().success();

    let bucket = workspace.path().join("leads-bucket");
    Command::cargo_bin("crm-lake")
        .expect("binary exists")
        .args([
            "upload",
            "--kind",
            "leads",
            "--store",
            store.to_str().unwrap(),
            "--bucket-dir",
            bucket.to_str().unwrap(),
        ])
        .assert()
        .success();

    let body = fs::read_to_string(bucket.join("L2")).expect("lead object");
    assert!(body.contains("Milton"));
}

#[test]
fn missing_input_aborts_the_run() {
    let workspace = TestWorkspace::new();
    let store = workspace.path().join("lake");
    Command::cargo_bin("crm-lake")
        .expect("binary exists")
        .args([
            "import",
            "--skip",
            "deals,tasks",
            "--leads",
            workspace.path().join("absent.csv").to_str().unwrap(),
            "--store",
            store.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(contains("absent.csv"));
}

#[test]
fn config_file_supplies_inputs() {
    let workspace = TestWorkspace::new();
    let exports = workspace.write_exports();
    let store = workspace.path().join("lake");
    let config = workspace.write(
        "lake.yaml",
        &format!(
            "store: {store:?}\ninputs:\n  deals: null\n  tasks: null\n  leads: {leads:?}\n",
            store = store,
            leads = exports.leads,
        ),
    );

    Command::cargo_bin("crm-lake")
        .expect("binary exists")
        .args(["--config", config.to_str().unwrap(), "import"])
        .assert()
        .success();

    Command::cargo_bin("crm-lake")
        .expect("binary exists")
        .args(["show", "--kind", "lead", "--id", "L1", "--config", config.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("Initech"));
}

#[test]
fn read_commands_refuse_a_missing_lake() {
    let workspace = TestWorkspace::new();
    let missing = workspace.path().join("no-such-lake");

    for args in [
        vec!["users", "--store"],
        vec!["show", "--kind", "lead", "--id", "L1", "--store"],
        vec!["export", "--store"],
    ] {
        Command::cargo_bin("crm-lake")
            .expect("binary exists")
            .args(&args)
            .arg(&missing)
            .assert()
            .failure()
            .stderr(contains("No lake found"));
    }
    Command::cargo_bin("crm-lake")
        .expect("binary exists")
        .args(["upload", "--kind", "deals", "--bucket-dir"])
        .arg(workspace.path().join("bucket"))
        .arg("--store")
        .arg(&missing)
        .assert()
        .failure()
        .stderr(contains("No lake found"));

    assert!(!missing.exists());
    assert!(!workspace.path().join("bucket").exists());
}
