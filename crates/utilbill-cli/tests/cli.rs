use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

const WATER_BILL: &str = "\
AGUAS ANDINAS S.A.
BOLETA ELECTRÓNICA N° 4455667
Nro de cuenta 123456-7
FECHA EMISIÓN:11-FEB-2025
VENCIMIENTO: 03-MAR-2025

DETALLE DE SU CUENTA
Cargo fijo $ 1.050
Consumo agua potable $ 24.180
Alcantarillado $ 20.000
TOTAL A PAGAR $ 45.230
";

fn utilbill() -> Command {
    let mut cmd = Command::cargo_bin("utilbill").unwrap();
    cmd.env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_help_lists_commands() {
    utilbill()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("batch"))
        .stdout(predicate::str::contains("process"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_process_prints_parsed_bill() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("febrero.txt");
    fs::write(&path, WATER_BILL).unwrap();

    utilbill()
        .args(["process", "--provider", "water"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"account_number\": \"123456-7\""))
        .stdout(predicate::str::contains("\"month\": 2"))
        .stdout(predicate::str::contains("\"year\": 2025"));
}

#[test]
fn test_process_text_format() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("febrero.txt");
    fs::write(&path, WATER_BILL).unwrap();

    utilbill()
        .args(["process", "--provider", "water", "--format", "text"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Period:   02-2025"))
        .stdout(predicate::str::contains("$ 45.230"));
}

#[test]
fn test_process_missing_file_fails() {
    utilbill()
        .args(["process", "--provider", "water", "/nonexistent/bill.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_batch_reports_outcome_counts() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("01.txt"), WATER_BILL).unwrap();
    fs::write(
        dir.path().join("02.txt"),
        WATER_BILL.replace("11-FEB-2025", "11-MAR-2025"),
    )
    .unwrap();
    fs::write(dir.path().join("03.txt"), "").unwrap();
    fs::write(
        dir.path().join("04.txt"),
        "Nro de cuenta 123456-7\nFECHA EMISIÓN:11-ABR-2025\n",
    )
    .unwrap();

    utilbill()
        .args(["batch", "--provider", "water"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("2 success, 1 partial, 1 fatal, 0 skipped"))
        .stdout(predicate::str::contains("1 meters, 2 bills stored"))
        .stdout(predicate::str::contains("04.txt: missing total amount"));
}

#[test]
fn test_batch_writes_summary_csv() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("bills");
    fs::create_dir(&input).unwrap();
    fs::write(input.join("01.txt"), WATER_BILL).unwrap();
    let summary = dir.path().join("summary.csv");

    utilbill()
        .args(["batch", "--provider", "water", "--summary"])
        .arg(&summary)
        .arg(&input)
        .assert()
        .success();

    let csv = fs::read_to_string(&summary).unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("document,status,bill_id,account_number,period,total,detail")
    );
    assert_eq!(lines.next(), Some("01.txt,success,1,123456-7,02-2025,45230,"));
}

#[test]
fn test_batch_json_outcomes() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("01.txt"), WATER_BILL).unwrap();

    utilbill()
        .args(["batch", "--provider", "water", "--json"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"success\""));
}

#[test]
fn test_batch_empty_dir_fails() {
    let dir = tempfile::tempdir().unwrap();

    utilbill()
        .args(["batch", "--provider", "electricity"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No documents found"));
}

#[test]
fn test_config_init_and_get() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");

    utilbill()
        .arg("--config")
        .arg(&path)
        .args(["config", "init"])
        .assert()
        .success();
    assert!(path.exists());

    utilbill()
        .arg("--config")
        .arg(&path)
        .args(["config", "set", "batch.jobs", "3"])
        .assert()
        .success();

    utilbill()
        .arg("--config")
        .arg(&path)
        .args(["config", "get", "batch.jobs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3"));
}
