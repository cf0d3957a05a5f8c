use std::fs;

use predicates::prelude::*;

mod common;

use common::{write_bmp, Workspace};

#[test]
fn runs() {
    let ws = Workspace::new();
    ws.cmd().assert().success();
}

#[test]
fn outputs_tool_name() {
    let ws = Workspace::new();
    ws.cmd()
        .arg("-V")
        .assert()
        .success()
        .stdout("droplabel 0.1.0\n");
}

// Classify subcommand tests

#[test]
fn classify_local_file_in_braces() {
    let ws = Workspace::new();
    write_bmp(&ws.path("door.bmp"), 4, 4);

    ws.cmd()
        .args(["classify", "  {door.bmp}  "])
        .assert()
        .success()
        .stdout(predicate::str::contains("local file: door.bmp"));
}

#[test]
fn classify_img_tag() {
    let ws = Workspace::new();
    ws.cmd()
        .args([
            "classify",
            r#"<a href="https://example.com/">x</a><img src="https://cdn.example.com/p.png">"#,
        ])
        .assert()
        .success()
        .stdout("remote url: https://cdn.example.com/p.png\n");
}

#[test]
fn classify_unresolvable_fails() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["classify", "nothing useful here"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not extract an image reference"));
}

// Resolve subcommand tests (offline: direct URLs only)

#[test]
fn resolve_direct_image_url_is_unchanged() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["resolve", "https://cdn.example.com/a/b/door.JPG"])
        .assert()
        .success()
        .stdout("https://cdn.example.com/a/b/door.JPG\n");
}

#[test]
fn resolve_google_redirect_is_unwrapped() {
    let ws = Workspace::new();
    ws.cmd()
        .args([
            "resolve",
            "https://www.google.com/url?sa=i&url=https%3A%2F%2Fcdn.example.com%2Fdoor.png",
        ])
        .assert()
        .success()
        .stdout("https://cdn.example.com/door.png\n");
}

// Labels subcommand tests

#[test]
fn labels_add_and_list() {
    let ws = Workspace::new();
    ws.cmd().args(["labels", "add", "Gothic"]).assert().success();
    ws.cmd()
        .args(["labels", "add", "Art Deco"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 total"));

    ws.cmd()
        .args(["labels", "list"])
        .assert()
        .success()
        .stdout("Gothic\nArt Deco\n");
    assert_eq!(
        fs::read_to_string(ws.labels()).expect("read catalog"),
        "Gothic\nArt Deco\n"
    );
}

#[test]
fn labels_add_duplicate_fails_and_keeps_file() {
    let ws = Workspace::new();
    ws.cmd().args(["labels", "add", "Gothic"]).assert().success();
    let before = fs::read(ws.labels()).expect("read catalog");

    ws.cmd()
        .args(["labels", "add", "Gothic"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Label already exists"));
    assert_eq!(fs::read(ws.labels()).expect("read catalog"), before);
}

#[test]
fn labels_add_blank_fails() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["labels", "add", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid label"));
    assert!(!ws.labels().exists());
}

// Next filename / save tests

#[test]
fn next_filename_on_empty_dir() {
    let ws = Workspace::new();
    ws.cmd()
        .arg("next-filename")
        .assert()
        .success()
        .stdout(predicate::str::contains("image_0001.jpg"));
}

#[test]
fn next_filename_after_gap() {
    let ws = Workspace::new();
    fs::create_dir_all(ws.output_dir()).expect("mkdir");
    for name in ["image_0001.jpg", "image_0005.jpg", "notes.txt"] {
        fs::write(ws.output_dir().join(name), b"x").expect("write");
    }
    ws.cmd()
        .arg("next-filename")
        .assert()
        .success()
        .stdout(predicate::str::contains("image_0006.jpg"));
}

#[test]
fn save_local_file_twice() {
    let ws = Workspace::new();
    write_bmp(&ws.path("door.bmp"), 8, 5);
    ws.cmd().args(["labels", "add", "Gothic"]).assert().success();
    ws.cmd().args(["labels", "add", "Modern"]).assert().success();
    let catalog_before = fs::read(ws.labels()).expect("read catalog");

    ws.cmd()
        .args(["save", "{door.bmp}", "-l", "Gothic", "-l", "Modern"])
        .assert()
        .success()
        .stdout(predicate::str::contains("image_0001.jpg [Gothic, Modern]"));
    ws.cmd()
        .args(["save", "door.bmp", "--label", "Modern"])
        .assert()
        .success()
        .stdout(predicate::str::contains("image_0002.jpg [Modern]"));

    let log = fs::read_to_string(ws.annotations()).expect("read log");
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "image_path,labels");
    assert!(lines[1].ends_with("image_0001.jpg,Gothic;Modern"));
    assert!(lines[2].ends_with("image_0002.jpg,Modern"));

    assert!(ws.output_dir().join("image_0001.jpg").is_file());
    assert!(ws.output_dir().join("image_0002.jpg").is_file());
    assert_eq!(fs::read(ws.labels()).expect("read catalog"), catalog_before);

    let published = fs::read_to_string(ws.path("folder_path.txt")).expect("side file");
    assert!(published.ends_with("saved_images"));
}

#[test]
fn save_with_unknown_label_writes_nothing() {
    let ws = Workspace::new();
    write_bmp(&ws.path("door.bmp"), 2, 2);

    ws.cmd()
        .args(["save", "door.bmp", "-l", "Gothic"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not in the catalog"));
    assert!(!ws.annotations().exists());
    assert!(!ws.output_dir().join("image_0001.jpg").exists());
}

#[test]
fn save_requires_a_label() {
    let ws = Workspace::new();
    write_bmp(&ws.path("door.bmp"), 2, 2);
    ws.cmd().args(["save", "door.bmp"]).assert().failure();
}

#[test]
fn fetch_reports_size() {
    let ws = Workspace::new();
    write_bmp(&ws.path("door.bmp"), 7, 3);
    ws.cmd()
        .args(["fetch", "door.bmp"])
        .assert()
        .success()
        .stdout("7x3 from door.bmp\n");
}

#[test]
fn fetch_undecodable_file_fails() {
    let ws = Workspace::new();
    fs::write(ws.path("notes.png"), b"plain text").expect("write");
    ws.cmd()
        .args(["fetch", "notes.png"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to decode image"));
}

// Stats tests

#[test]
fn stats_json_counts_records() {
    let ws = Workspace::new();
    write_bmp(&ws.path("door.bmp"), 2, 2);
    ws.cmd().args(["labels", "add", "Gothic"]).assert().success();
    ws.cmd().args(["labels", "add", "Tudor"]).assert().success();
    ws.cmd()
        .args(["save", "door.bmp", "-l", "Gothic"])
        .assert()
        .success();

    ws.cmd()
        .args(["stats", "--output", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"records\": 1"))
        .stdout(predicate::str::contains("\"unused_labels\": [\n    \"Tudor\"\n  ]"));
}

#[test]
fn stats_rejects_unknown_output() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["stats", "--output", "xml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported format"));
}

// Annotate session tests

#[test]
fn annotate_session_round_trip() {
    let ws = Workspace::new();
    write_bmp(&ws.path("door.bmp"), 3, 3);

    ws.cmd()
        .arg("annotate")
        .write_stdin(":add Gothic\n:add Modern\n:commit Gothic\n{door.bmp}\n:status\n:commit Gothic; Modern\n:status\n:quit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Loaded 3x3 from door.bmp"))
        .stdout(predicate::str::contains("loaded: door.bmp"))
        .stdout(predicate::str::contains("image_0001.jpg [Gothic, Modern]"))
        .stdout(predicate::str::contains("idle"))
        .stderr(predicate::str::contains("No image loaded"));

    let log = fs::read_to_string(ws.annotations()).expect("read log");
    assert_eq!(log.lines().count(), 2);
}
