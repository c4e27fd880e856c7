use assert_cmd::prelude::*;
use mockito::{Matcher, Server};
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

fn write_snapshot(dir: &Path, date: &str, stars: u64, total_downloads: u64) {
    let body = serde_json::json!({
        "date": date,
        "timestamp": format!("{date}T06:00:00Z"),
        "stars": stars,
        "today": {"views": 4, "views_uniques": 2, "clones": 1, "clones_uniques": 1},
        "traffic_14d": {"views": {}, "clones": {}, "referrers": [], "paths": []},
        "total_downloads": total_downloads,
        "releases": []
    });
    fs::write(
        dir.join(format!("{date}.json")),
        serde_json::to_string_pretty(&body).unwrap(),
    )
    .unwrap();
}

fn read_timeline(dir: &Path) -> Vec<serde_json::Value> {
    let contents = fs::read_to_string(dir.join("timeline.json")).unwrap();
    serde_json::from_str(&contents).unwrap()
}

#[test]
fn timeline_rebuilds_deltas_from_snapshots() {
    let dir = tempdir().unwrap();
    write_snapshot(dir.path(), "2024-01-03", 15, 150);
    write_snapshot(dir.path(), "2024-01-01", 10, 100);
    write_snapshot(dir.path(), "2024-01-02", 15, 100);
    fs::write(dir.path().join("2023-12-31.json"), "{\"stars\": ").unwrap();

    let mut cmd = Command::cargo_bin("starlens").unwrap();
    cmd.args(["timeline", "--data-dir"]).arg(dir.path());
    cmd.assert().success();

    let timeline = read_timeline(dir.path());
    let rows: Vec<(String, i64, i64)> = timeline
        .iter()
        .map(|e| {
            (
                e["date"].as_str().unwrap().to_string(),
                e["stars_delta"].as_i64().unwrap(),
                e["downloads_delta"].as_i64().unwrap(),
            )
        })
        .collect();

    assert_eq!(
        rows,
        vec![
            ("2024-01-01".to_string(), 0, 0),
            ("2024-01-02".to_string(), 5, 0),
            ("2024-01-03".to_string(), 0, 50),
        ]
    );
    assert_eq!(timeline[0]["views"], 4);
    assert_eq!(timeline[0]["clones_uniques"], 1);
}

#[test]
fn timeline_rerun_is_identical() {
    let dir = tempdir().unwrap();
    write_snapshot(dir.path(), "2024-02-01", 3, 0);
    write_snapshot(dir.path(), "2024-02-02", 7, 20);

    Command::cargo_bin("starlens")
        .unwrap()
        .args(["timeline", "--data-dir"])
        .arg(dir.path())
        .assert()
        .success();
    let first = fs::read_to_string(dir.path().join("timeline.json")).unwrap();

    Command::cargo_bin("starlens")
        .unwrap()
        .args(["timeline", "--data-dir"])
        .arg(dir.path())
        .assert()
        .success();
    let second = fs::read_to_string(dir.path().join("timeline.json")).unwrap();

    assert_eq!(first, second);
    assert_eq!(read_timeline(dir.path()).len(), 2);
}

#[test]
fn charts_fail_when_inputs_are_missing() {
    let dir = tempdir().unwrap();

    let mut cmd = Command::cargo_bin("starlens").unwrap();
    cmd.arg("charts")
        .arg("--stars-file")
        .arg(dir.path().join("stars.txt"))
        .arg("--downloads-file")
        .arg(dir.path().join("downloads.tsv"))
        .arg("--output-dir")
        .arg(dir.path().join("out"));

    cmd.assert().failure();
}

#[test]
fn charts_print_growth_summary() {
    let dir = tempdir().unwrap();
    let stars = dir.path().join("stars.txt");
    let downloads = dir.path().join("downloads.tsv");
    fs::write(&stars, "2024-01-01T10:00:00Z\n2024-01-02T10:00:00Z\n2024-01-02T11:00:00Z\n").unwrap();
    fs::write(&downloads, "v1\t2024-01-01T00:00:00Z\t0\nv2\t2024-01-02T00:00:00Z\t1200\n").unwrap();

    let mut cmd = Command::cargo_bin("starlens").unwrap();
    cmd.arg("charts")
        .arg("--stars-file")
        .arg(&stars)
        .arg("--downloads-file")
        .arg(&downloads)
        .arg("--output-dir")
        .arg(dir.path().join("out"))
        .args(["--title", "octo/hello"]);

    let out = cmd.assert().success().get_output().stdout.clone();
    let text = String::from_utf8(out).unwrap();

    assert!(text.contains("GROWTH SUMMARY: octo/hello"));
    assert!(text.contains("Total stars:       3"));
    assert!(text.contains("Total downloads:   1,200"));
    assert!(dir.path().join("out").join("dashboard.png").is_file());
}

#[test]
fn snapshot_rejects_malformed_repository() {
    let dir = tempdir().unwrap();

    let mut cmd = Command::cargo_bin("starlens").unwrap();
    cmd.args(["snapshot", "--repo", "not-a-repo", "--data-dir"])
        .arg(dir.path())
        .env_remove("GITHUB_TOKEN");

    cmd.assert().failure();
    assert!(!dir.path().join("timeline.json").exists());
}

#[test]
fn snapshot_collects_and_rebuilds_timeline() {
    let mut server = Server::new();
    server
        .mock("GET", "/repos/o/r")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"full_name": "o/r", "stargazers_count": 42}"#)
        .create();
    server
        .mock("GET", "/repos/o/r/traffic/views")
        .with_status(403)
        .with_body(r#"{"message": "Must have push access to repository"}"#)
        .create();
    server
        .mock("GET", "/repos/o/r/traffic/clones")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"count": 2, "uniques": 1, "clones": []}"#)
        .create();
    for endpoint in ["referrers", "paths"] {
        server
            .mock("GET", format!("/repos/o/r/traffic/popular/{endpoint}").as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create();
    }
    let releases = server
        .mock("GET", "/repos/o/r/releases")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"[
                {"tag_name": "v2", "published_at": "2024-01-02T00:00:00Z",
                 "assets": [{"name": "a.zip", "download_count": 10}, {"name": "b.zip", "download_count": 5}]},
                {"tag_name": "v1", "published_at": "2024-01-01T00:00:00Z",
                 "assets": [{"name": "a.zip", "download_count": 25}]}
            ]"#,
        )
        .create();

    let dir = tempdir().unwrap();
    let mut cmd = Command::cargo_bin("starlens").unwrap();
    cmd.args(["snapshot", "--repo", "o/r", "--api-url"])
        .arg(server.url())
        .arg("--data-dir")
        .arg(dir.path())
        .env_remove("GITHUB_TOKEN");
    cmd.assert().success();
    releases.assert();

    let snapshots: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.file_name().unwrap() != "timeline.json")
        .collect();
    assert_eq!(snapshots.len(), 1);

    let snapshot: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&snapshots[0]).unwrap()).unwrap();
    let date = snapshot["date"].as_str().unwrap();
    assert_eq!(
        snapshots[0].file_name().unwrap().to_str().unwrap(),
        format!("{date}.json")
    );
    assert_eq!(snapshot["stars"], 42);
    assert_eq!(snapshot["total_downloads"], 40);
    assert_eq!(snapshot["traffic_14d"]["views"]["count"], 0);
    assert_eq!(snapshot["traffic_14d"]["clones"]["count"], 2);
    assert_eq!(snapshot["releases"].as_array().unwrap().len(), 2);

    let timeline = read_timeline(dir.path());
    assert_eq!(timeline.len(), 1);
    assert_eq!(timeline[0]["date"], date);
    assert_eq!(timeline[0]["stars"], 42);
    assert_eq!(timeline[0]["total_downloads"], 40);
    assert_eq!(timeline[0]["stars_delta"], 0);
}
