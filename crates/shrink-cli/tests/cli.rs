//! Command-line tests for the `shrink` binary.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use predicates::prelude::*;
use tempfile::TempDir;

fn shrink() -> Command {
    Command::cargo_bin("shrink").unwrap()
}

/// Write a one-page PDF with one Helvetica text run per line, top to bottom.
fn write_pdf(path: &Path, lines: &[&str]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut operations = Vec::new();
    for (i, text) in lines.iter().enumerate() {
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new("Tf", vec!["F1".into(), 9.into()]));
        operations.push(Operation::new(
            "Td",
            vec![20.into(), (740 - 14 * i as i64).into()],
        ));
        operations.push(Operation::new("Tj", vec![Object::string_literal(*text)]));
        operations.push(Operation::new("ET", vec![]));
    }
    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

const DELI_PAGE: &[&str] = &[
    "Piggly Wiggly #42",
    "Department: Deli",
    "Conf # Date User UPC Description",
    "12345-01 03/14 ABC Turkey 16oz 012345678905 ACME CO 4 EXP 2.99 11.96 11.96",
    "Total",
];

#[test]
fn help_lists_commands() {
    shrink()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("convert"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn convert_writes_workbook_next_to_input() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("Week 12.PDF");
    write_pdf(&input, DELI_PAGE);

    shrink()
        .arg("convert")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 1 sheets (1 records)"));

    let output = dir.path().join("Week 12_converted.xlsx");
    let bytes = fs::read(output).unwrap();
    assert!(bytes.starts_with(b"PK"));
}

#[test]
fn convert_json_to_stdout() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("report.pdf");
    write_pdf(&input, DELI_PAGE);

    shrink()
        .args(["convert", "--format", "json"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"Conf #\": \"12345-01\""))
        .stdout(predicate::str::contains("\"department\": \"Deli\""));
}

#[test]
fn convert_text_summary() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("report.pdf");
    write_pdf(&input, DELI_PAGE);

    shrink()
        .args(["convert", "--format", "text", "--workers", "1"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Records: 1"))
        .stdout(predicate::str::contains("Deli"));
}

#[test]
fn convert_without_data_warns_and_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("blank.pdf");
    write_pdf(&input, &["nothing to see"]);

    shrink()
        .arg("convert")
        .arg(&input)
        .assert()
        .success()
        .stderr(predicate::str::contains("No shrink data found"));

    assert!(!dir.path().join("blank_converted.xlsx").exists());
}

#[test]
fn convert_missing_input_fails() {
    shrink()
        .args(["convert", "does-not-exist.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn convert_rejects_garbage() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("garbage.pdf");
    fs::write(&input, b"definitely not a pdf").unwrap();

    shrink()
        .arg("convert")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse PDF"));
}

#[test]
fn config_init_get_set_round_trip() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("nested").join("config.json");
    let config = config.to_str().unwrap();

    shrink()
        .args(["--config", config, "config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not created"));

    shrink()
        .args(["--config", config, "config", "init"])
        .assert()
        .success();

    shrink()
        .args(["--config", config, "config", "get", "report.store_marker"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"Piggly\""));

    shrink()
        .args(["--config", config, "config", "set", "report.layout", "bands"])
        .assert()
        .success();

    shrink()
        .args(["--config", config, "config", "get", "report.layout"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"bands\""));

    shrink()
        .args(["--config", config, "config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
}

#[test]
fn config_set_rejects_unknown_and_invalid_values() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.json");
    let config = config.to_str().unwrap();

    shrink()
        .args(["--config", config, "config", "set", "report.nope", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration key not found"));

    shrink()
        .args(["--config", config, "config", "set", "report.layout", "sideways"])
        .assert()
        .failure();

    shrink()
        .args(["--config", config, "config", "set", "pdf.y_precision", "9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("y_precision"));
}
