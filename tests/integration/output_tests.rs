use dupsift::duplicates::DuplicateFinder;
use dupsift::error::ExitCode;
use dupsift::output::{JsonOutput, TextOutput};
use std::fs;
use tempfile::tempdir;

fn scan_fixture() -> (tempfile::TempDir, Vec<dupsift::duplicates::DuplicateGroup>, dupsift::duplicates::ScanSummary) {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("one.txt"), "exported content").unwrap();
    fs::write(dir.path().join("two.txt"), "exported content").unwrap();
    fs::write(dir.path().join("three.txt"), "exported content").unwrap();
    fs::write(dir.path().join("unique.txt"), "unique").unwrap();

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();
    (dir, groups, summary)
}

#[test]
fn test_json_export_structure() {
    let (_dir, groups, summary) = scan_fixture();

    let output = JsonOutput::new(&groups, &summary, ExitCode::for_scan(summary.interrupted));
    let json = output.to_json_pretty().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    let duplicates = value["duplicates"].as_array().unwrap();
    assert_eq!(duplicates.len(), 1);
    assert_eq!(duplicates[0]["size"], 16);
    assert_eq!(duplicates[0]["files"].as_array().unwrap().len(), 3);
    assert_eq!(duplicates[0]["hash"].as_str().unwrap().len(), 64);

    let totals = &value["totals"];
    assert_eq!(totals["total_files"], 4);
    assert_eq!(totals["duplicate_files"], 2);
    assert_eq!(totals["reclaimable_space"], 32);
    assert_eq!(totals["exit_code"], 0);
    assert_eq!(totals["exit_code_name"], "DS000");
    assert_eq!(totals["interrupted"], false);
}

#[test]
fn test_json_write_compact() {
    let (_dir, groups, summary) = scan_fixture();

    let mut buffer = Vec::new();
    JsonOutput::new(&groups, &summary, ExitCode::Success)
        .write_to(&mut buffer, false)
        .unwrap();
    let text = String::from_utf8(buffer).unwrap();

    assert_eq!(text.trim_end().lines().count(), 1);
    assert!(serde_json::from_str::<serde_json::Value>(&text).is_ok());
}

#[test]
fn test_text_export_lists_every_file() {
    let (dir, groups, summary) = scan_fixture();

    let mut buffer = Vec::new();
    TextOutput::new(&groups, &summary)
        .write_to(&mut buffer)
        .unwrap();
    let text = String::from_utf8(buffer).unwrap();

    for name in ["one.txt", "two.txt", "three.txt"] {
        assert!(text.contains(&dir.path().join(name).display().to_string()));
    }
    assert!(!text.contains("unique.txt"));
    assert!(text.contains("1 duplicate group, 2 duplicate files"));
}
