//! Test fixtures shared by the export parser test modules
//!
//! Exports are built from explicit physical lines so each test states exactly
//! where the vendor tool broke a record.

use crate::app::services::export_parser::{
    ContinuationTarget, ExportParser, LeadingSeparator, RowShape,
};
use crate::config::PipelineConfig;

mod parser_tests;

/// Header of the reservation export used across tests
pub const RESERVATION_HEADER: &str =
    "\tConfirmation Number\tGuest Name\tArrival\tDeparture\tBilling Address\tRate";

/// Join physical lines the way the vendor writes them (CRLF)
pub fn export_from_lines(lines: &[&str]) -> String {
    lines.join("\r\n")
}

/// Reservation export with wrapped billing addresses
pub fn create_reservation_export() -> String {
    export_from_lines(&[
        RESERVATION_HEADER,
        "\tC1001\tAda Lovelace\t05-JAN-24\t07-JAN-24\t12 St James Sq\t120.00",
        "\tC1002\tAlan Turing\t2024-01-06\t080124\tKing's College",
        "Cambridge\t95.50",
        "\tC1003\tGrace Hopper\t07/01/2024\t10/01/2024\t1 Navy Yard",
        "Arlington",
        "Virginia\t210.00",
        "",
    ])
}

/// Pipeline configuration matching [`create_reservation_export`]
pub fn reservation_config() -> PipelineConfig {
    PipelineConfig::default()
        .with_required_headers(["Guest Name", "Rate"])
        .with_primary_key_field("Confirmation Number")
        .with_date_fields(["Arrival", "Departure"])
        .with_partition_date_field("Arrival")
        .with_free_text_column("Billing Address")
}

pub fn reservation_parser() -> ExportParser {
    ExportParser::new(reservation_config()).unwrap()
}

pub fn tab_detector() -> LeadingSeparator {
    LeadingSeparator::new('\t')
}

pub fn cells(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

pub fn shape(width: usize, target: ContinuationTarget) -> RowShape {
    RowShape {
        separator: '\t',
        width,
        target,
    }
}
