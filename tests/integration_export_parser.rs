//! Integration tests for the export parser with on-disk exports
//!
//! These tests write realistic reservation exports to temporary files and run
//! them through parsing, repair, rendering and record delivery end to end.

use chrono::Datelike;
use pms_export_repair::app::services::csv_renderer::{render_records, render_table};
use pms_export_repair::app::services::record_sink::{JsonLinesSink, MemorySink, deliver};
use pms_export_repair::config::BoundaryConfig;
use pms_export_repair::{Error, ExportParser, PipelineConfig, RecordKey, RowSkipReason};
use std::io::BufReader;
use std::io::Write;
use tempfile::NamedTempFile;

const HEADER: &str = "\tConfirmation Number\tGuest Name\tArrival\tDeparture\tBilling Address\tRate";

fn write_export(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(lines.join("\r\n").as_bytes())
        .expect("Failed to write export");
    file.flush().expect("Failed to flush export");
    file
}

fn reservation_config() -> PipelineConfig {
    PipelineConfig::default()
        .with_free_text_column("Billing Address")
        .with_required_headers(["Guest Name", "Rate"])
        .with_primary_key_field("Confirmation Number")
        .with_date_fields(["Arrival", "Departure"])
        .with_partition_date_field("Arrival")
}

/// Test a reservation export with wrapped addresses end to end
///
/// Purpose: Validate reassembly, date normalization, keying and skip accounting from a file
/// Benefit: Exercises every pipeline stage against the layout the vendor actually emits
#[test]
fn test_parse_reservation_export_file() {
    let export = write_export(&[
        HEADER,
        "\tR-1001\tAda Lovelace\t05-JAN-24\t07-JAN-24\t12 Analytical Row",
        "London",
        "EC1\t149.00",
        "\tR-1002\tCharles Babbage\t2024-01-06\t08/01/2024\t1 Difference Way\t99.50",
        "",
        "\tR-1003\tGrace Hopper\t10012024\t120124\tCompiler House",
        "Arlington\t120.00",
        "\t \tNo Key\t05-JAN-24\t06-JAN-24\tNowhere\t0",
        "\tR-1005\tBad Date\t31-FEB-24\t01-MAR-24\tSomewhere\t10",
    ]);

    let parser = ExportParser::new(reservation_config()).unwrap();
    let batch = parser.parse_file(export.path()).unwrap();

    assert_eq!(batch.processed, 3);
    assert_eq!(batch.skipped, 2);
    assert_eq!(batch.total_rows(), 5);

    let first = &batch.records[0];
    assert_eq!(first.get("Billing Address"), Some("12 Analytical Row London EC1"));
    assert_eq!(first.get("Rate"), Some("149.00"));
    assert_eq!(first.key().partition_key.as_deref(), Some("2024-01-05"));
    assert_eq!(first.key().record_id, "R-1001");

    let second = &batch.records[1];
    assert_eq!(second.date("Departure").unwrap().to_string(), "2024-01-08");

    let third = &batch.records[2];
    assert_eq!(third.get("Billing Address"), Some("Compiler House Arlington"));
    assert_eq!(third.date("Departure").unwrap().day(), 12);

    assert!(matches!(
        batch.skip_reasons[0],
        RowSkipReason::EmptyPrimaryKey { line: 9, .. }
    ));
    assert!(matches!(
        &batch.skip_reasons[1],
        RowSkipReason::MalformedDate { line: 10, field, .. } if field == "Arrival"
    ));
}

/// Test that streamed and in-memory parsing agree
///
/// Purpose: Validate the reader path splits line endings exactly like the in-memory path
/// Benefit: Large exports can be streamed without changing results
#[test]
fn test_streamed_and_in_memory_results_match() {
    let mut lines = vec![HEADER.to_string()];
    for i in 0..200 {
        lines.push(format!(
            "\tR-{}\tGuest {}\t{:02}-JAN-24\t{:02}-FEB-24\t{} Long Street",
            i,
            i,
            i % 28 + 1,
            i % 28 + 1,
            i
        ));
        if i % 3 == 0 {
            lines.push("Flat 2\r".to_string());
        }
        lines.push(format!("Town {}\t{}.00", i, i));
    }
    let text = lines.join("\n");

    let parser = ExportParser::new(reservation_config()).unwrap();
    let in_memory = parser.parse(&text).unwrap();
    let streamed = parser
        .parse_reader(BufReader::new(text.as_bytes()))
        .unwrap();

    assert_eq!(in_memory.processed, 200);
    assert_eq!(in_memory.summary(), streamed.summary());
    assert_eq!(in_memory.records, streamed.records);
}

/// Test repair-only output rendered as quoted CSV
///
/// Purpose: Validate the repair path keeps every row and renders it fully quoted
/// Benefit: Cleaned documents import into spreadsheet tools without column drift
#[test]
fn test_repair_and_render_file() {
    let export = write_export(&[
        HEADER,
        "\tR-1\tA \"Quoted\" Guest\tbad date\t07-JAN-24\tLine one",
        "line two\t50",
        "\t\tNo Key\t05-JAN-24\t06-JAN-24\tx\ty\tz",
    ]);

    let parser = ExportParser::new(reservation_config()).unwrap();
    let table = parser.repair_file(export.path()).unwrap();

    // Repair does not validate: both rows survive
    assert_eq!(table.rows.len(), 2);
    assert!(table.rows.iter().all(|row| row.len() == table.width()));
    assert_eq!(table.rows[1].get(6), Some("y\tz"));

    let document = render_table(&table).unwrap();
    let lines: Vec<&str> = document.split("\r\n").collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[1],
        "\"\",\"R-1\",\"A \"\"Quoted\"\" Guest\",\"bad date\",\"07-JAN-24\",\"Line one line two\",\"50\""
    );
}

/// Test that a missing required column rejects the whole export
///
/// Purpose: Validate header-level failures produce no partial batch
/// Benefit: Operators see a clear error instead of silently empty output
#[test]
fn test_missing_required_columns_fail_fast() {
    let export = write_export(&[
        "\tConfirmation Number\tGuest Name\tArrival\tBilling Address",
        "\tR-1\tAda\t05-JAN-24\tSomewhere",
    ]);

    let parser = ExportParser::new(reservation_config()).unwrap();
    match parser.parse_file(export.path()) {
        Err(Error::MissingColumns { names }) => {
            assert_eq!(names, vec!["Rate".to_string(), "Departure".to_string()]);
        }
        other => panic!("expected MissingColumns, got {:?}", other),
    }
}

/// Test configuration loaded from TOML drives boundary detection
///
/// Purpose: Validate the pattern boundary strategy from a config file
/// Benefit: Exports without a leading separator can still be reassembled
#[test]
fn test_pattern_boundary_from_config_file() {
    let mut config_file = NamedTempFile::new().unwrap();
    write!(
        config_file,
        r#"
separator = "|"
primary_key_field = "Id"
date_fields = ["Arrival"]
partition_date_field = "Arrival"

[boundary]
kind = "pattern"
pattern = '^BK\d+\|'
"#
    )
    .unwrap();

    let config = PipelineConfig::load_layered(Some(config_file.path())).unwrap();
    assert_eq!(
        config.boundary,
        BoundaryConfig::Pattern {
            pattern: r"^BK\d+\|".to_string()
        }
    );

    let parser = ExportParser::new(config).unwrap();
    let batch = parser
        .parse("Id|Arrival|Note\nBK1|05-JAN-24|first\nsecond half\nBK2|06-JAN-24|done")
        .unwrap();

    assert_eq!(batch.processed, 2);
    assert_eq!(batch.records[0].get("Note"), Some("first second half"));
}

/// Test delivery to sinks is idempotent and keyed
///
/// Purpose: Validate records reach persistence keyed by partition date and id
/// Benefit: Re-running an export never duplicates stored records
#[test]
fn test_deliver_to_sinks() {
    let export = write_export(&[
        HEADER,
        "\tR-1\tAda\t05-JAN-24\t07-JAN-24\tLondon\t1",
        "\tR-2\tGrace\t06-JAN-24\t07-JAN-24\tArlington\t2",
    ]);

    let parser = ExportParser::new(reservation_config()).unwrap();
    let batch = parser.parse_file(export.path()).unwrap();

    let mut memory = MemorySink::new();
    deliver(&batch, &mut memory).unwrap();
    deliver(&batch, &mut memory).unwrap();
    assert_eq!(memory.len(), 2);
    assert_eq!(memory.writes(), 4);
    assert!(memory
        .get(&RecordKey {
            partition_key: Some("2024-01-06".to_string()),
            record_id: "R-2".to_string(),
        })
        .is_some());

    let mut jsonl = JsonLinesSink::new(Vec::new());
    assert_eq!(deliver(&batch, &mut jsonl).unwrap(), 2);
    let output = String::from_utf8(jsonl.into_inner().unwrap()).unwrap();
    assert_eq!(output.lines().count(), 2);

    let document = render_records(batch.records[0].header(), &batch.records).unwrap();
    assert!(document.starts_with("\"\",\"Confirmation Number\""));
    assert_eq!(document.matches("\r\n").count(), 2);
}
