//! Tests for the export parser orchestration

use super::*;
use crate::Error;
use crate::app::models::RowSkipReason;
use crate::app::services::export_parser::BoundaryDetector;
use std::io::{Cursor, Write};
use tempfile::NamedTempFile;

#[test]
fn test_parse_reservation_export() {
    let batch = reservation_parser()
        .parse(&create_reservation_export())
        .unwrap();

    assert_eq!(batch.processed, 3);
    assert_eq!(batch.skipped, 0);
    assert!(batch.skip_reasons.is_empty());

    let addresses: Vec<&str> = batch
        .records
        .iter()
        .map(|record| record.get("Billing Address").unwrap())
        .collect();
    assert_eq!(
        addresses,
        vec![
            "12 St James Sq",
            "King's College Cambridge",
            "1 Navy Yard Arlington Virginia"
        ]
    );

    let second = &batch.records[1];
    assert_eq!(second.get("Rate"), Some("95.50"));
    assert_eq!(second.date("Departure").unwrap().to_string(), "2024-01-08");
    assert_eq!(second.key().partition_key.as_deref(), Some("2024-01-06"));
    assert_eq!(second.line_number(), 3);

    let third = &batch.records[2];
    assert_eq!(third.get("Rate"), Some("210.00"));
    assert_eq!(third.line_number(), 5);
    assert!(third.cells().iter().all(|cell| !cell.contains('\n')));
}

#[test]
fn test_missing_required_column_aborts_batch() {
    let export = export_from_lines(&[
        "\tConfirmation Number\tGuest Name\tArrival\tDeparture\tBilling Address",
        "\tC1\tAda\t05-JAN-24\t07-JAN-24\taddr",
        "\t\tNobody\tbad\tbad\taddr",
    ]);

    let error = reservation_parser().parse(&export).unwrap_err();
    match error {
        Error::MissingColumns { names } => assert_eq!(names, vec!["Rate"]),
        other => panic!("Expected MissingColumns, got {:?}", other),
    }
}

#[test]
fn test_empty_input_fails_header_check() {
    let error = reservation_parser().parse("\r\n\r\n").unwrap_err();
    assert!(error.is_header_failure());
}

#[test]
fn test_skip_accounting() {
    let mut lines = vec!["\tId\tName".to_string()];
    for index in 0..10 {
        let id = if index % 3 == 1 { String::new() } else { format!("R{}", index) };
        lines.push(format!("\t{}\tguest {}", id, index));
    }
    let export = lines.join("\n");

    let config = PipelineConfig::default().with_primary_key_field("Id");
    let batch = ExportParser::new(config).unwrap().parse(&export).unwrap();

    assert_eq!(batch.processed, 7);
    assert_eq!(batch.skipped, 3);
    assert_eq!(batch.records.len(), 7);
    assert_eq!(
        batch.skip_reasons.iter().map(RowSkipReason::line).collect::<Vec<_>>(),
        vec![3, 6, 9]
    );
}

#[test]
fn test_malformed_dates_are_counted_not_fatal() {
    let export = export_from_lines(&[
        RESERVATION_HEADER,
        "\tC1\tAda\t05-JAN-24\t310224\taddr\t1",
        "\tC2\tAlan\t06-JAN-24\t07-JAN-24\taddr\t2",
    ]);

    let batch = reservation_parser().parse(&export).unwrap();
    assert_eq!(batch.processed, 1);
    assert_eq!(batch.skipped, 1);
    assert_eq!(batch.records[0].key().record_id, "C2");
    assert!(matches!(
        batch.skip_reasons[0],
        RowSkipReason::MalformedDate { line: 2, .. }
    ));
}

#[test]
fn test_non_ascii_digit_dates_are_skipped() {
    let config = PipelineConfig::default()
        .with_primary_key_field("Id")
        .with_date_fields(["Arrival"]);
    let parser = ExportParser::new(config).unwrap();

    let batch = parser
        .parse("\tId\tArrival\n\t1\t05-JAN-24\n\t2\t0\u{0660}1224\n\t3\t\u{FF12}\u{FF10}\u{FF12}\u{FF14}-01-05\n")
        .unwrap();

    assert_eq!(batch.processed, 1);
    assert_eq!(batch.skipped, 2);
    assert_eq!(batch.records[0].key().record_id, "1");
    assert!(matches!(
        &batch.skip_reasons[0],
        RowSkipReason::MalformedDate { line: 3, field, .. } if field == "Arrival"
    ));
    assert!(matches!(
        batch.skip_reasons[1],
        RowSkipReason::MalformedDate { line: 4, .. }
    ));
}

#[test]
fn test_invalid_utf8_reports_line_number() {
    let mut bytes = b"\tId\tGuest\n\t1\tAda\n\t2\tJos".to_vec();
    // Windows-1252 e-acute
    bytes.push(0xE9);
    bytes.extend_from_slice(b"\n\t3\tAlan\n");

    let config = PipelineConfig::default().with_primary_key_field("Id");
    let error = ExportParser::new(config)
        .unwrap()
        .parse_reader(Cursor::new(bytes))
        .unwrap_err();
    match error {
        Error::Io { message, .. } => assert_eq!(message, "Failed to read export line 3"),
        other => panic!("expected Io error, got {:?}", other),
    }
}

#[test]
fn test_reader_and_in_memory_parsing_agree() {
    let export = create_reservation_export();
    let parser = reservation_parser();

    let in_memory = parser.parse(&export).unwrap();
    let streamed = parser.parse_reader(Cursor::new(export.as_bytes())).unwrap();

    assert_eq!(in_memory.records, streamed.records);
    assert_eq!(in_memory.summary(), streamed.summary());
}

#[test]
fn test_lone_carriage_returns_are_line_breaks() {
    let export = create_reservation_export().replace("\r\n", "\r");
    let batch = reservation_parser().parse(&export).unwrap();

    assert_eq!(batch.processed, 3);
    assert_eq!(
        batch.records[2].get("Billing Address"),
        Some("1 Navy Yard Arlington Virginia")
    );
}

#[test]
fn test_repair_keeps_invalid_rows() {
    let export = export_from_lines(&[
        RESERVATION_HEADER,
        "\t\tNo Key\tnot a date\t\tWrapped",
        "address",
        "\tC9\tShort",
    ]);

    let table = reservation_parser().repair(&export).unwrap();
    assert_eq!(table.width(), 7);
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.rows[0].cells[5], "Wrapped address");
    assert_eq!(table.rows[1].cells, cells(&["", "C9", "Short", "", "", "", ""]));
}

#[test]
fn test_parse_and_repair_files() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", create_reservation_export()).unwrap();

    let parser = reservation_parser();
    let batch = parser.parse_file(file.path()).unwrap();
    assert_eq!(batch.processed, 3);

    let table = parser.repair_file(file.path()).unwrap();
    assert_eq!(table.rows.len(), 3);
}

#[test]
fn test_unreadable_input() {
    let error = reservation_parser()
        .parse_file(std::path::Path::new("/nonexistent/export.txt"))
        .unwrap_err();
    assert!(matches!(error, Error::UnreadableInput { .. }));
}

#[derive(Debug)]
struct StarBoundary;

impl BoundaryDetector for StarBoundary {
    fn is_boundary(&self, line: &str) -> bool {
        line.starts_with('*')
    }
}

#[test]
fn test_custom_boundary_detector() {
    let config = PipelineConfig::default()
        .with_primary_key_field("Id")
        .with_free_text_column("Note");
    let parser = ExportParser::with_detector(config, Box::new(StarBoundary)).unwrap();

    let batch = parser
        .parse("Mark\tId\tNote\n*\t1\tfirst\n  wrapped note\n*\t2\tsecond")
        .unwrap();

    assert_eq!(batch.processed, 2);
    assert_eq!(batch.records[0].get("Note"), Some("first wrapped note"));
    assert_eq!(batch.records[0].cells().len(), 3);
}

#[test]
fn test_invalid_configuration_is_rejected() {
    let config = reservation_config().with_partition_date_field("Guest Name");
    let error = ExportParser::new(config).unwrap_err();
    assert!(matches!(error, Error::Configuration { .. }));
}
