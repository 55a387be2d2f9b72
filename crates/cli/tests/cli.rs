// ABOUTME: Integration tests for the catalog-clean CLI binary.
// ABOUTME: Covers single files, stdin, JSON batches, heading reports and load failures.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

fn clean_cmd() -> Command {
    Command::cargo_bin("catalog-clean").unwrap()
}

#[test]
fn sanitize_html_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("desc.html");
    fs::write(&path, r#"<div><img src="a.jpg"></div>"#).unwrap();

    clean_cmd()
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r#"<p class="p-beta"><img src="a.jpg" class="img-beta"></p>"#,
        ));
}

#[test]
fn sanitize_from_stdin() {
    clean_cmd()
        .arg("-")
        .write_stdin("<p>a<br/><br /><br>b</p>")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r#"<p class="p-beta">a<br class="br-beta">b</p>"#,
        ));
}

#[test]
fn heading_report_as_json() {
    let output = clean_cmd()
        .arg("--headings")
        .arg("--compact")
        .arg("-")
        .write_stdin("<h3><strong>Size</strong></h3><p>Body</p><h3>Color</h3>")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["unified_heading_html"], "<h3><em>SizeColor</em></h3>");
    assert_eq!(report["heading_count"], 2);
}

#[test]
fn batch_adds_new_description_per_record() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("products.json");
    fs::write(
        &path,
        r#"[
            {"id": "SKU-1", "description": "<p></p><p>   </p>"},
            {"id": 2, "description": "<span>x</span>"},
            {"id": "SKU-3", "description": null}
        ]"#,
    )
    .unwrap();

    let output = clean_cmd()
        .arg("--batch")
        .arg(&path)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let records: Value = serde_json::from_slice(&output).unwrap();
    let records = records.as_array().unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0]["new_description"], "");
    assert_eq!(records[1]["new_description"], r#"<p class="p-beta">x</p>"#);
    assert_eq!(records[2]["new_description"], Value::Null);
    assert_eq!(records[0]["id"], "SKU-1");
}

#[test]
fn batch_honors_custom_field_names() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("products.json");
    fs::write(&path, r#"[{"sku": "A", "body": "<div>hi</div>"}]"#).unwrap();

    clean_cmd()
        .arg("--batch")
        .arg("--compact")
        .arg("--id-field")
        .arg("sku")
        .arg("--description-field")
        .arg("body")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r#""new_description":"<p class=\"p-beta\">hi</p>""#,
        ));
}

#[test]
fn config_file_changes_suffix() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("options.json");
    fs::write(&config, r#"{"beta_suffix": "-next"}"#).unwrap();

    clean_cmd()
        .arg("--config")
        .arg(&config)
        .arg("-")
        .write_stdin("<p>x</p>")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"<p class="p-next">x</p>"#));
}

#[test]
fn output_written_to_file() {
    let temp_dir = TempDir::new().unwrap();
    let out = temp_dir.path().join("out.html");

    clean_cmd()
        .arg("-o")
        .arg(&out)
        .arg("-")
        .write_stdin("<p>x</p>")
        .assert()
        .success();

    let written = fs::read_to_string(&out).unwrap();
    assert_eq!(written.trim_end(), r#"<p class="p-beta">x</p>"#);
}

#[test]
fn missing_file_exits_with_failure() {
    let temp_dir = TempDir::new().unwrap();
    let present = temp_dir.path().join("ok.html");
    fs::write(&present, "<p>x</p>").unwrap();
    let missing = temp_dir.path().join("missing.html");

    clean_cmd()
        .arg(&present)
        .arg(&missing)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("file not found"))
        .stdout(predicate::str::contains(r#""failed": 1"#));
}

#[test]
fn product_id_rejected_for_batches() {
    clean_cmd()
        .arg("--batch")
        .arg("--product-id")
        .arg("SKU-1")
        .arg("products.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--product-id"));
}
