//! Tests for the optional `json` feature: the diagnostic and classification
//! types serialize and deserialize cleanly.

#![cfg(feature = "json")]

use gedbase::{string_to_database, Diagnostic, DiagnosticKind, ErrorLog, RecordKind, Sex};

#[test]
fn test_diagnostic_round_trips_through_json() {
    let diagnostic = Diagnostic::new(DiagnosticKind::Linkage, "sample.ged", 12, "dangling link");
    let json = serde_json::to_string(&diagnostic).unwrap();
    let back: Diagnostic = serde_json::from_str(&json).unwrap();
    assert_eq!(back.kind, DiagnosticKind::Linkage);
    assert_eq!(back.line, 12);
    assert_eq!(back.message, "dangling link");
}

#[test]
fn test_error_log_serializes_to_array() {
    let source = "0 HEAD\n0 @I1@ INDI\n1 SEX M\n0 TRLR\n";
    let mut log = ErrorLog::new();
    assert!(string_to_database(source, "noname.ged", &mut log).is_none());

    let json = serde_json::to_string(&log).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert!(value["entries"].is_array());
}

#[test]
fn test_classification_types_serialize() {
    let kind_json = serde_json::to_string(&RecordKind::Person).unwrap();
    assert_eq!(kind_json, "\"Person\"");
    let sex_json = serde_json::to_string(&Sex::Female).unwrap();
    assert_eq!(sex_json, "\"Female\"");
}
