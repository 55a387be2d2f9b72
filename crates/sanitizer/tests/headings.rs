// ABOUTME: Integration tests for heading extraction and unification.
// ABOUTME: Covers the merged <h3><em> block, join policies and the rewritten description.

use catalog_sanitizer::{extract_heading_data, HeadingJoin, Sanitizer};
use pretty_assertions::assert_eq;
use std::fs;

fn load_html_fixture(name: &str) -> String {
    let path = format!(
        "{}/tests/fixtures/html/{}.html",
        env!("CARGO_MANIFEST_DIR"),
        name
    );
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("failed to read {}: {}", path, e))
}

#[test]
fn size_and_color_merge_into_one_heading() {
    let report =
        extract_heading_data("<h3><strong>Size</strong></h3><p>Body</p><h3>Color</h3>").unwrap();
    assert_eq!(report.unified_heading_html, "<h3><em>SizeColor</em></h3>");
    assert_eq!(report.rewritten_html, "<h3><em>SizeColor</em></h3><p>Body</p>");
    assert_eq!(report.joined_texts(), "Size | Color");
}

#[test]
fn break_between_policy_from_builder() {
    let sanitizer = Sanitizer::builder()
        .heading_join(HeadingJoin::BreakBetween)
        .build()
        .unwrap();
    let report = sanitizer
        .extract_headings("<h3>Size</h3><h3><em>Color</em></h3>")
        .unwrap();
    assert_eq!(report.unified_heading_html, "<h3><em>Size<br>Color</em></h3>");
}

#[test]
fn rewritten_fixture_has_a_single_heading() {
    let report = extract_heading_data(&load_html_fixture("furniture")).unwrap();
    assert_eq!(report.heading_count, 2);
    assert_eq!(report.level2_heading_count, 1);
    assert_eq!(report.heading_texts, vec!["Dimensions", "Materials"]);
    assert_eq!(
        report.unified_heading_html,
        "<h3><em>DimensionsMaterials</em></h3>"
    );
    assert_eq!(report.rewritten_html.matches("<h3").count(), 1);
    assert!(report.rewritten_html.contains("<h2"));
}

#[test]
fn headings_of_sanitized_output_are_beta() {
    let cleaned = catalog_sanitizer::sanitize("<h3><b>Size</b></h3><h3>Fit</h3>", None);
    let report = extract_heading_data(&cleaned).unwrap();
    assert_eq!(report.beta_heading_count, 2);
    assert_eq!(report.joined_beta_texts(), "Size | Fit");
    assert_eq!(report.unified_heading_html, "<h3><em>SizeFit</em></h3>");
}

#[test]
fn empty_description_gives_empty_report() {
    let report = extract_heading_data("").unwrap();
    assert_eq!(report.heading_count, 0);
    assert_eq!(report.unified_heading_html, "");
    assert_eq!(report.rewritten_html, "");
    assert!(report.tag_sequence.is_empty());
}

#[test]
fn report_serializes_to_json() {
    let report = extract_heading_data("<h3>A</h3>").unwrap();
    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["heading_count"], 1);
    assert_eq!(value["unified_heading_html"], "<h3><em>A</em></h3>");
    assert_eq!(value["tag_sequence"][0], "<h3>");
}
