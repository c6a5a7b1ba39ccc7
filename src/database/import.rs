//! Importing GEDCOM files into databases.
//!
//! The pipeline runs in stages: decode and lex the file, build the forest of
//! record trees, check keys and key-valued references, store and normalize
//! the records, build the secondary indexes, and validate lineage integrity.
//! After each stage the error log is inspected; a file whose log grew
//! produces no database.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::database::validate::{validate_families, validate_persons, validate_references};
use crate::database::Database;
use crate::encoding::decode_bytes;
use crate::errlog::{Diagnostic, DiagnosticKind, ErrorLog};
use crate::error::GedbaseError;
use crate::node::Record;
use crate::parser::records_from_string;
use crate::record::{is_key, RecordKind};
use crate::splitjoin::{normalize_family, normalize_person};

/// Reads and decodes a GEDCOM file into text.
///
/// # Errors
///
/// Returns an error when the file cannot be read or decoded.
pub fn read_gedcom_file(path: &Path) -> Result<String, GedbaseError> {
    let bytes = fs::read(path)?;
    let (text, encoding) = decode_bytes(&bytes)?;
    log::debug!("decoded {} as {encoding}", path.display());
    Ok(text)
}

/// Imports one GEDCOM file, returning its database.
///
/// Returns `None`, with the problems collected in `log`, when the file does
/// not produce a clean database.
#[must_use]
pub fn gedcom_file_to_database(path: &str, log: &mut ErrorLog) -> Option<Database> {
    let text = match read_gedcom_file(Path::new(path)) {
        Ok(text) => text,
        Err(err) => {
            log.add(Diagnostic::new(
                DiagnosticKind::System,
                path,
                0,
                format!("Could not open file: {err}"),
            ));
            return None;
        }
    };
    string_to_database(&text, path, log)
}

/// Imports a list of GEDCOM files into a list of databases sharing one
/// error log. Files with errors produce no database.
#[must_use]
pub fn import_from_files(paths: &[String], log: &mut ErrorLog) -> Vec<Database> {
    paths
        .iter()
        .filter_map(|path| gedcom_file_to_database(path, log))
        .collect()
}

/// Builds a database from GEDCOM text. `path` names the source in
/// diagnostics.
#[must_use]
pub fn string_to_database(source: &str, path: &str, log: &mut ErrorLog) -> Option<Database> {
    let mut database = Database::new(path);
    let file = database.last_segment().to_string();

    // Lex and build the forest; syntax errors are collected.
    let before = log.len();
    let records = records_from_string(source, &file, log);
    log::debug!("{file}: parsed {} records", records.len());
    if log.len() != before {
        return None;
    }

    // Keys must be unique and every key-valued field must resolve.
    let before = log.len();
    check_keys_and_references(&records, &file, log);
    if log.len() != before {
        return None;
    }

    // Store and normalize the records, then build the secondary indexes.
    let before = log.len();
    for record in records {
        database.store_record(record, log);
    }
    let person_keys: Vec<String> = database.person_keys().map(str::to_string).collect();
    for key in &person_keys {
        if let Some(person) = database.record_mut(key) {
            normalize_person(person);
        }
    }
    let family_keys: Vec<String> = database.family_keys().map(str::to_string).collect();
    for key in &family_keys {
        if let Some(family) = database.record_mut(key) {
            normalize_family(family);
        }
    }
    database.index_names();

    // Validate lineage integrity and references.
    validate_persons(&database, log);
    validate_families(&database, log);
    validate_references(&mut database, log);
    if log.len() != before {
        return None;
    }
    log::debug!("{file}: import complete, {}", database.summary());
    Some(database)
}

/// Checks record keys and the references to them: every non-header,
/// non-trailer record needs a key, keys must be unique, and every field
/// value with the key shape must name a record key.
pub fn check_keys_and_references(records: &[Record], file: &str, log: &mut ErrorLog) {
    let mut keys: HashMap<&str, usize> = HashMap::new();
    for record in records {
        let Some(key) = record.key() else {
            if !matches!(record.kind(), RecordKind::Header | RecordKind::Trailer) {
                log.add(Diagnostic::new(
                    DiagnosticKind::Gedcom,
                    file,
                    record.line(),
                    "record missing a key",
                ));
            }
            continue;
        };
        match keys.get(key) {
            Some(&first_line) => {
                log.add(Diagnostic::new(
                    DiagnosticKind::Gedcom,
                    file,
                    record.line(),
                    format!("A record with key {key} exists at line {first_line}."),
                ));
            }
            None => {
                keys.insert(key, record.line());
            }
        }
    }

    for record in records {
        for node in record.traverse() {
            let Some(value) = record.value(node) else {
                continue;
            };
            if is_key(value) && !keys.contains_key(value) {
                log.add(Diagnostic::new(
                    DiagnosticKind::Gedcom,
                    file,
                    record.line() + record.count_nodes_before(node),
                    format!("invalid key value {value}"),
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_import() {
        let source = "0 HEAD\n0 @I1@ INDI\n1 NAME John /Smith/\n1 SEX M\n0 TRLR\n";
        let mut log = ErrorLog::new();
        let db = string_to_database(source, "minimal.ged", &mut log).expect("clean import");
        assert!(log.is_empty());
        assert_eq!(db.num_persons(), 1);
        assert!(db.header().is_some());
        assert!(db.trailer().is_some());
    }

    #[test]
    fn test_empty_gedcom_yields_empty_database() {
        let mut log = ErrorLog::new();
        let db = string_to_database("0 HEAD\n0 TRLR\n", "empty.ged", &mut log).unwrap();
        assert!(db.is_empty());
    }

    #[test]
    fn test_duplicate_key_fails_import_naming_both_lines() {
        let source = "0 HEAD\n0 @I1@ INDI\n1 NAME A /B/\n1 SEX M\n0 @I1@ INDI\n1 NAME C /D/\n1 SEX F\n0 TRLR\n";
        let mut log = ErrorLog::new();
        assert!(string_to_database(source, "dup.ged", &mut log).is_none());
        assert_eq!(log.len(), 1);
        // The first @I1@ is on line 2, the duplicate on line 5; the one
        // diagnostic references both.
        let diagnostic = log.iter().next().unwrap();
        assert_eq!(diagnostic.kind, DiagnosticKind::Gedcom);
        assert_eq!(diagnostic.line, 5);
        assert!(diagnostic.message.contains("@I1@"));
        assert!(diagnostic.message.contains("line 2"));
    }

    #[test]
    fn test_dangling_reference_is_reported_at_exact_line() {
        let source = "0 HEAD\n0 @I1@ INDI\n1 NAME A /B/\n1 SEX M\n1 FAMS @F9@\n0 TRLR\n";
        let mut log = ErrorLog::new();
        assert!(string_to_database(source, "dangling.ged", &mut log).is_none());
        assert_eq!(log.len(), 1);
        // 1 FAMS @F9@ is on line 5.
        assert_eq!(log.iter().next().unwrap().line, 5);
    }

    #[test]
    fn test_record_missing_key_is_reported() {
        let source = "0 HEAD\n0 INDI\n1 NAME A /B/\n0 TRLR\n";
        let mut log = ErrorLog::new();
        assert!(string_to_database(source, "nokey.ged", &mut log).is_none());
        assert!(log
            .iter()
            .any(|d| d.message.contains("missing a key") && d.line == 2));
    }
}
