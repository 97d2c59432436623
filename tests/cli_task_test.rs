//! Integration tests for work entry operations via the CLI.
//!
//! These tests verify `slg task add/rm` through the real binary: input
//! validation, materials/tools splitting, photo encoding (including the
//! per-image fallback), and the summary totals view.

use std::io::Cursor;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a Command for the slg binary with an isolated data directory.
fn slg(data: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_slg"));
    cmd.env("SLG_DATA_DIR", data.path());
    cmd.env("SLG_CONFIG", data.path().join("config.toml"));
    cmd
}

fn stdout_json(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.assert().success();
    serde_json::from_slice(&output.get_output().stdout).unwrap()
}

fn add_job(data: &TempDir, address: &str) -> String {
    let json = stdout_json(slg(data).args(["job", "add", address]));
    json["job"]["id"].as_str().unwrap().to_string()
}

/// Write a small PNG into the data dir and return its path.
fn write_png(data: &TempDir, name: &str, width: u32, height: u32) -> PathBuf {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        width,
        height,
        image::Rgb([200, 120, 40]),
    ));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageOutputFormat::Png)
        .unwrap();
    let path = data.path().join(name);
    std::fs::write(&path, buf).unwrap();
    path
}

#[test]
fn test_task_add_json() {
    let data = TempDir::new().unwrap();
    let job_id = add_job(&data, "42 Wallaby Way");

    slg(&data)
        .args([
            "task",
            "add",
            &job_id,
            "Paint living room",
            "--time",
            "2 hours",
            "--notes",
            "Two coats",
            "--materials",
            "Paint, Tape, ,Primer",
            "--tools",
            "Brush,Roller",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""id":"tsk-"#))
        .stdout(predicate::str::contains(r#""title":"Paint living room""#))
        .stdout(predicate::str::contains(r#""materials":["Paint","Tape","Primer"]"#))
        .stdout(predicate::str::contains(r#""tools":["Brush","Roller"]"#))
        .stdout(predicate::str::contains(r#""is_completed":false"#));
}

#[test]
fn test_task_add_human() {
    let data = TempDir::new().unwrap();
    let job_id = add_job(&data, "42 Wallaby Way");

    slg(&data)
        .args(["-H", "task", "add", &job_id, "Paint living room"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Recorded entry tsk-"));
}

#[test]
fn test_task_add_blank_title_fails() {
    let data = TempDir::new().unwrap();
    let job_id = add_job(&data, "42 Wallaby Way");

    slg(&data)
        .args(["task", "add", &job_id, "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("title"));

    let json = stdout_json(slg(&data).args(["show", &job_id]));
    assert_eq!(json["job"]["tasks"].as_array().unwrap().len(), 0);
}

#[test]
fn test_task_add_unknown_job_fails() {
    let data = TempDir::new().unwrap();

    slg(&data)
        .args(["task", "add", "job-ffffffff", "Paint"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("job-ffffffff"));
}

#[test]
fn test_tasks_listed_newest_first() {
    let data = TempDir::new().unwrap();
    let job_id = add_job(&data, "42 Wallaby Way");

    slg(&data).args(["task", "add", &job_id, "Demo walls"]).assert().success();
    slg(&data).args(["task", "add", &job_id, "Paint"]).assert().success();

    let json = stdout_json(slg(&data).args(["show", &job_id]));
    let tasks = json["job"]["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0]["title"], "Paint");
    assert_eq!(tasks[1]["title"], "Demo walls");
}

#[test]
fn test_task_rm_removes() {
    let data = TempDir::new().unwrap();
    let job_id = add_job(&data, "42 Wallaby Way");
    let json = stdout_json(slg(&data).args(["task", "add", &job_id, "Paint"]));
    let task_id = json["task"]["id"].as_str().unwrap().to_string();

    slg(&data)
        .args(["task", "rm", &job_id, &task_id])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""removed":true"#));

    let json = stdout_json(slg(&data).args(["show", &job_id]));
    assert_eq!(json["job"]["tasks"].as_array().unwrap().len(), 0);
}

#[test]
fn test_task_rm_absent_is_noop() {
    let data = TempDir::new().unwrap();
    let job_id = add_job(&data, "42 Wallaby Way");

    slg(&data)
        .args(["task", "rm", &job_id, "tsk-ffffffff"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""removed":false"#));
}

#[test]
fn test_task_add_encodes_photo() {
    let data = TempDir::new().unwrap();
    let job_id = add_job(&data, "42 Wallaby Way");
    let photo = write_png(&data, "deck.png", 64, 64);

    let json = stdout_json(slg(&data).args([
        "task",
        "add",
        &job_id,
        "Rebuild deck",
        "--photo",
        photo.to_str().unwrap(),
    ]));
    assert_eq!(json["photo_fallbacks"], 0);
    let urls = json["task"]["image_urls"].as_array().unwrap();
    assert_eq!(urls.len(), 1);
    assert!(
        urls[0]
            .as_str()
            .unwrap()
            .starts_with("data:image/jpeg;base64,")
    );
}

#[test]
fn test_task_add_undecodable_photo_falls_back() {
    let data = TempDir::new().unwrap();
    let job_id = add_job(&data, "42 Wallaby Way");
    let bogus = data.path().join("not-a-photo.jpg");
    std::fs::write(&bogus, b"not image bytes").unwrap();

    let json = stdout_json(slg(&data).args([
        "task",
        "add",
        &job_id,
        "Rebuild deck",
        "--photo",
        bogus.to_str().unwrap(),
    ]));
    assert_eq!(json["photo_fallbacks"], 1);
    let urls = json["task"]["image_urls"].as_array().unwrap();
    assert!(
        urls[0]
            .as_str()
            .unwrap()
            .starts_with("data:application/octet-stream;base64,")
    );
}

#[test]
fn test_task_add_unreadable_photo_discards_batch() {
    let data = TempDir::new().unwrap();
    let job_id = add_job(&data, "42 Wallaby Way");

    slg(&data)
        .args([
            "task",
            "add",
            &job_id,
            "Rebuild deck",
            "--photo",
            "/nonexistent/deck.png",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not read photo"));

    let json = stdout_json(slg(&data).args(["show", &job_id]));
    assert_eq!(json["job"]["tasks"].as_array().unwrap().len(), 0);
}

#[test]
fn test_summary_totals() {
    let data = TempDir::new().unwrap();
    let job_id = add_job(&data, "42 Wallaby Way");

    slg(&data)
        .args([
            "task", "add", &job_id, "Demo walls",
            "--time", "1h",
            "--materials", "Bags",
            "--tools", "Sledge, Ladder",
        ])
        .assert()
        .success();
    slg(&data)
        .args([
            "task", "add", &job_id, "Paint",
            "--time", "30 min",
            "--materials", "Paint, Bags",
            "--tools", "Brush, Ladder",
        ])
        .assert()
        .success();

    let json = stdout_json(slg(&data).args(["summary", &job_id]));
    assert_eq!(json["task_count"], 2);
    assert_eq!(json["total_minutes"], 90.0);
    assert_eq!(json["total_time"], "1h 30m");
    assert_eq!(
        json["materials"],
        serde_json::json!(["Bags", "Bags", "Paint"])
    );
    assert_eq!(
        json["tools"],
        serde_json::json!(["Brush", "Ladder", "Sledge"])
    );
}

#[test]
fn test_summary_human() {
    let data = TempDir::new().unwrap();
    let job_id = add_job(&data, "42 Wallaby Way");
    slg(&data)
        .args(["task", "add", &job_id, "Paint", "--time", "45m"])
        .assert()
        .success();

    slg(&data)
        .args(["-H", "summary", &job_id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Summary for 42 Wallaby Way"))
        .stdout(predicate::str::contains("Total Est. Time: 45m"));
}
