use assert_cmd::Command;
use focusflight::records::{FocusRecord, RecordStore};
use focusflight::store::SqliteStore;

fn seed(db: &std::path::Path) {
    let mut records = RecordStore::open(SqliteStore::open(db).unwrap()).unwrap();
    records
        .append(FocusRecord {
            id: 1_715_650_000_000,
            from_city: "Shanghai".into(),
            to_city: "Hangzhou".into(),
            duration_min: 40,
            flight_number: "FFSHHG404".into(),
            distance_km: 165,
            started_at_epoch_ms: 1_715_647_600_000,
            ended_at_epoch_ms: 1_715_650_000_000,
            completed: true,
        })
        .unwrap();
}

#[test]
fn summary_on_an_empty_logbook() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("flights.db");

    let output = Command::cargo_bin("focusflight")
        .unwrap()
        .args(["--summary", "--utc-offset", "480", "--db"])
        .arg(&db)
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("0 flights"));
    assert!(stdout.contains("0 day streak"));
}

#[test]
fn summary_lists_logged_flights() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("flights.db");
    seed(&db);

    let output = Command::cargo_bin("focusflight")
        .unwrap()
        .arg("--summary")
        .arg("--db")
        .arg(&db)
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("1 flights"));
    assert!(stdout.contains("165 km"));
    assert!(stdout.contains("Shanghai → Hangzhou"));
}

#[test]
fn export_writes_csv_and_json() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("flights.db");
    seed(&db);

    let csv_path = dir.path().join("out").join("flights.csv");
    Command::cargo_bin("focusflight")
        .unwrap()
        .arg("--db")
        .arg(&db)
        .arg("--export")
        .arg(&csv_path)
        .assert()
        .success();
    let csv = std::fs::read_to_string(&csv_path).unwrap();
    assert!(csv.starts_with("id,fromCity,toCity"));
    assert!(csv.contains("Shanghai,Hangzhou,40"));

    let json_path = dir.path().join("flights.json");
    Command::cargo_bin("focusflight")
        .unwrap()
        .arg("--db")
        .arg(&db)
        .arg("--export")
        .arg(&json_path)
        .assert()
        .success();
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(json["totalFocusTime"], 40);
    assert_eq!(json["totalRecords"], 1);
}

#[test]
fn non_tty_without_batch_flag_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    Command::cargo_bin("focusflight")
        .unwrap()
        .arg("--db")
        .arg(dir.path().join("flights.db"))
        .write_stdin("")
        .assert()
        .failure();
}
