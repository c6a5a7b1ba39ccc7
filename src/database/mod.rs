//! The in-memory database of GEDCOM records.
//!
//! A database owns every record parsed from one GEDCOM file, the primary
//! key index over them, the per-kind root lists, and the name and reference
//! indexes. Records refer to each other only through textual keys resolved
//! here; deleting the database frees everything it indexed.

pub mod import;
pub mod nameindex;
pub mod refnindex;
pub mod rootlist;
pub mod validate;

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::errlog::{Diagnostic, DiagnosticKind, ErrorLog};
use crate::node::Record;
use crate::record::{compare_record_keys, RecordKind};
use crate::writer::GedcomWriter;

pub use nameindex::NameIndex;
pub use refnindex::{RefnIndex, RefnInsert};
pub use rootlist::RootList;

/// An in-memory database built from one GEDCOM file.
#[derive(Debug, Default)]
pub struct Database {
    file_path: String,
    last_segment: String,
    records: HashMap<String, Record>,
    header: Option<Record>,
    trailer: Option<Record>,
    person_roots: RootList,
    family_roots: RootList,
    name_index: NameIndex,
    refn_index: RefnIndex,
}

impl Database {
    /// Creates an empty database for the given source path.
    #[must_use]
    pub fn new(file_path: &str) -> Self {
        let last_segment = file_path
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(file_path)
            .to_string();
        Database {
            file_path: file_path.to_string(),
            last_segment,
            ..Database::default()
        }
    }

    /// Returns the path of the backing GEDCOM file.
    #[must_use]
    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    /// Returns the last path segment of the backing file, used in
    /// diagnostics.
    #[must_use]
    pub fn last_segment(&self) -> &str {
        &self.last_segment
    }

    /// Stores a record, indexing it by key and kind.
    ///
    /// Header and trailer records carry no key and are kept aside. A record
    /// missing its key, or whose key is already present, is not stored; the
    /// problem is logged and the first record with the key is retained.
    pub fn store_record(&mut self, record: Record, log: &mut ErrorLog) -> bool {
        match record.kind() {
            RecordKind::Header => {
                if self.header.is_none() {
                    self.header = Some(record);
                }
                return true;
            }
            RecordKind::Trailer => {
                if self.trailer.is_none() {
                    self.trailer = Some(record);
                }
                return true;
            }
            _ => (),
        }
        let Some(key) = record.key().map(str::to_string) else {
            log.add(Diagnostic::new(
                DiagnosticKind::Syntax,
                &self.last_segment,
                record.line(),
                "This record has no key.",
            ));
            return false;
        };
        if let Some(existing) = self.records.get(&key) {
            log.add(Diagnostic::new(
                DiagnosticKind::Gedcom,
                &self.last_segment,
                record.line(),
                format!("A record with key {key} exists at line {}.", existing.line()),
            ));
            return false;
        }
        match record.kind() {
            RecordKind::Person => {
                self.person_roots.insert(&key);
            }
            RecordKind::Family => {
                self.family_roots.insert(&key);
            }
            _ => (),
        }
        self.records.insert(key, record);
        true
    }

    /// Removes a record and every index entry that referenced it.
    ///
    /// Returns the removed record, or `None` if the key was unknown.
    pub fn remove_record(&mut self, key: &str) -> Option<Record> {
        let record = self.records.remove(key)?;
        match record.kind() {
            RecordKind::Person => {
                self.person_roots.remove(key);
                for name in record.tagged_run(record.root(), "NAME") {
                    if let Some(value) = record.value(name) {
                        self.name_index.remove(value, key);
                    }
                }
            }
            RecordKind::Family => {
                self.family_roots.remove(key);
            }
            _ => (),
        }
        for refn in record.tagged_run(record.root(), "REFN") {
            if let Some(value) = record.value(refn) {
                if self.refn_index.search(value) == Some(key) {
                    self.refn_index.remove(value);
                }
            }
        }
        Some(record)
    }

    /// Looks up a record by key.
    #[must_use]
    pub fn record(&self, key: &str) -> Option<&Record> {
        self.records.get(key)
    }

    /// Looks up a record by key for mutation.
    ///
    /// Indexes must be updated in the same logical step as any change to the
    /// fields they mirror.
    pub fn record_mut(&mut self, key: &str) -> Option<&mut Record> {
        self.records.get_mut(key)
    }

    fn record_of_kind(&self, key: &str, kind: RecordKind) -> Option<&Record> {
        self.records.get(key).filter(|r| r.kind() == kind)
    }

    /// Looks up a person record by key.
    #[must_use]
    pub fn person(&self, key: &str) -> Option<&Record> {
        self.record_of_kind(key, RecordKind::Person)
    }

    /// Looks up a family record by key.
    #[must_use]
    pub fn family(&self, key: &str) -> Option<&Record> {
        self.record_of_kind(key, RecordKind::Family)
    }

    /// Looks up a source record by key.
    #[must_use]
    pub fn source(&self, key: &str) -> Option<&Record> {
        self.record_of_kind(key, RecordKind::Source)
    }

    /// Looks up an event record by key.
    #[must_use]
    pub fn event(&self, key: &str) -> Option<&Record> {
        self.record_of_kind(key, RecordKind::Event)
    }

    /// Returns the line on which a record was defined in the source file.
    #[must_use]
    pub fn record_line(&self, key: &str) -> Option<usize> {
        self.records.get(key).map(Record::line)
    }

    /// Returns the header record, if the source had one.
    #[must_use]
    pub fn header(&self) -> Option<&Record> {
        self.header.as_ref()
    }

    /// Returns the trailer record, if the source had one.
    #[must_use]
    pub fn trailer(&self) -> Option<&Record> {
        self.trailer.as_ref()
    }

    /// Iterates person keys in sorted order.
    pub fn person_keys(&self) -> impl Iterator<Item = &str> {
        self.person_roots.iter()
    }

    /// Iterates family keys in sorted order.
    pub fn family_keys(&self) -> impl Iterator<Item = &str> {
        self.family_roots.iter()
    }

    /// Iterates all indexed records in no particular order.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    /// Returns all indexed keys in sorted order.
    #[must_use]
    pub fn keys_sorted(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.records.keys().map(String::as_str).collect();
        keys.sort_by(|a, b| compare_record_keys(a, b));
        keys
    }

    fn count_kind(&self, kind: RecordKind) -> usize {
        self.records.values().filter(|r| r.kind() == kind).count()
    }

    /// Returns the number of person records.
    #[must_use]
    pub fn num_persons(&self) -> usize {
        self.person_roots.len()
    }

    /// Returns the number of family records.
    #[must_use]
    pub fn num_families(&self) -> usize {
        self.family_roots.len()
    }

    /// Returns the number of source records.
    #[must_use]
    pub fn num_sources(&self) -> usize {
        self.count_kind(RecordKind::Source)
    }

    /// Returns the number of event records.
    #[must_use]
    pub fn num_events(&self) -> usize {
        self.count_kind(RecordKind::Event)
    }

    /// Returns the number of records of no recognized kind.
    #[must_use]
    pub fn num_others(&self) -> usize {
        self.count_kind(RecordKind::Other)
    }

    /// Returns true if the database holds no persons and no families.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.num_persons() + self.num_families() == 0
    }

    /// Returns the name index.
    #[must_use]
    pub fn name_index(&self) -> &NameIndex {
        &self.name_index
    }

    /// Returns the reference index.
    #[must_use]
    pub fn refn_index(&self) -> &RefnIndex {
        &self.refn_index
    }

    /// Returns the reference index for mutation.
    pub fn refn_index_mut(&mut self) -> &mut RefnIndex {
        &mut self.refn_index
    }

    /// Rebuilds the name index from the person root list: every NAME child
    /// of every person with a non-empty value is indexed under its name key.
    pub fn index_names(&mut self) {
        let mut index = NameIndex::new();
        let mut indexed = 0usize;
        for key in self.person_roots.iter() {
            let Some(person) = self.records.get(key) else {
                continue;
            };
            for name in person.tagged_run(person.root(), "NAME") {
                if let Some(value) = person.value(name) {
                    if !value.is_empty() {
                        index.insert(value, key);
                        indexed += 1;
                    }
                }
            }
        }
        log::debug!("indexed {indexed} names for {}", self.last_segment);
        self.name_index = index;
    }

    /// Adds a person's NAME values to the name index. Used when a single
    /// record is inserted after the initial build.
    pub fn index_person_names(&mut self, key: &str) {
        let Some(person) = self.records.get(key) else {
            return;
        };
        let names: Vec<String> = person
            .tagged_run(person.root(), "NAME")
            .filter_map(|id| person.value(id))
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect();
        for name in names {
            self.name_index.insert(&name, key);
        }
    }

    /// Renders the whole database as GEDCOM text: header, persons and
    /// families in key order, remaining records in key order, trailer.
    #[must_use]
    pub fn to_gedcom_string(&self, writer: &GedcomWriter) -> String {
        let mut out = String::new();
        self.write_gedcom(&mut out, writer)
            .expect("writing to a String cannot fail");
        out
    }

    /// Writes the whole database as GEDCOM text.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying writer fails.
    pub fn write_gedcom<W: std::fmt::Write>(
        &self,
        out: &mut W,
        writer: &GedcomWriter,
    ) -> std::fmt::Result {
        if let Some(header) = &self.header {
            writer.write_record(out, header)?;
        }
        for key in self.person_roots.iter() {
            writer.write_record(out, &self.records[key])?;
        }
        for key in self.family_roots.iter() {
            writer.write_record(out, &self.records[key])?;
        }
        for key in self.keys_sorted() {
            let record = &self.records[key];
            if !matches!(record.kind(), RecordKind::Person | RecordKind::Family) {
                writer.write_record(out, record)?;
            }
        }
        if let Some(trailer) = &self.trailer {
            writer.write_record(out, trailer)?;
        }
        Ok(())
    }

    /// Prints a summary of record counts to stdout.
    pub fn stats(&self) {
        println!("----------------------");
        println!("| Database stats:    |");
        println!("----------------------");
        println!("  file: {}", self.last_segment);
        println!("  persons: {}", self.num_persons());
        println!("  families: {}", self.num_families());
        println!("  sources: {}", self.num_sources());
        println!("  events: {}", self.num_events());
        println!("  others: {}", self.num_others());
        let (name_keys, name_records) = self.name_index.stats();
        println!("  name keys: {name_keys} ({name_records} names)");
        println!("  references: {}", self.refn_index.len());
        println!("----------------------");
    }

    /// Returns a one-line text summary of the database.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut s = String::new();
        let _ = write!(
            s,
            "{}: {} persons, {} families, {} sources, {} events, {} others",
            self.last_segment,
            self.num_persons(),
            self.num_families(),
            self.num_sources(),
            self.num_events(),
            self.num_others()
        );
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::record_from_string;

    fn record(source: &str) -> Record {
        let mut log = ErrorLog::new();
        record_from_string(source, &mut log).expect("well-formed record")
    }

    #[test]
    fn test_store_and_lookup() {
        let mut db = Database::new("test.ged");
        let mut log = ErrorLog::new();
        assert!(db.store_record(record("0 @I1@ INDI\n1 NAME A /B/\n"), &mut log));
        assert!(db.store_record(record("0 @F1@ FAM\n1 HUSB @I1@\n"), &mut log));
        assert!(log.is_empty());

        assert!(db.person("@I1@").is_some());
        assert!(db.family("@F1@").is_some());
        assert!(db.person("@F1@").is_none());
        assert_eq!(db.num_persons(), 1);
        assert_eq!(db.num_families(), 1);
        assert!(!db.is_empty());
    }

    #[test]
    fn test_duplicate_key_keeps_first_record() {
        let mut db = Database::new("test.ged");
        let mut log = ErrorLog::new();
        let mut first = record("0 @I1@ INDI\n1 NAME First /Kept/\n");
        first.set_line(2);
        let mut second = record("0 @I1@ INDI\n1 NAME Second /Dropped/\n");
        second.set_line(9);

        assert!(db.store_record(first, &mut log));
        assert!(!db.store_record(second, &mut log));

        assert_eq!(log.len(), 1);
        let diagnostic = log.iter().next().unwrap();
        assert_eq!(diagnostic.kind, DiagnosticKind::Gedcom);
        assert_eq!(diagnostic.line, 9);
        assert!(diagnostic.message.contains("line 2"));

        let kept = db.person("@I1@").unwrap();
        let name = kept.find_child(kept.root(), "NAME").unwrap();
        assert_eq!(kept.value(name), Some("First /Kept/"));
    }

    #[test]
    fn test_record_without_key_is_rejected() {
        let mut db = Database::new("test.ged");
        let mut log = ErrorLog::new();
        assert!(!db.store_record(record("0 INDI\n1 NAME A /B/\n"), &mut log));
        assert_eq!(log.len(), 1);
        assert_eq!(db.num_persons(), 0);
    }

    #[test]
    fn test_header_and_trailer_are_kept_aside() {
        let mut db = Database::new("test.ged");
        let mut log = ErrorLog::new();
        assert!(db.store_record(record("0 HEAD\n1 GEDC\n2 VERS 5.5\n"), &mut log));
        assert!(db.store_record(record("0 TRLR\n"), &mut log));
        assert!(log.is_empty());
        assert!(db.header().is_some());
        assert!(db.trailer().is_some());
        assert!(db.is_empty());
    }

    #[test]
    fn test_remove_record_clears_indexes() {
        let mut db = Database::new("test.ged");
        let mut log = ErrorLog::new();
        db.store_record(
            record("0 @I1@ INDI\n1 NAME John /Smith/\n1 REFN R1\n"),
            &mut log,
        );
        db.index_names();
        db.refn_index_mut().add("R1", "@I1@");

        let removed = db.remove_record("@I1@");
        assert!(removed.is_some());
        assert!(db.person("@I1@").is_none());
        assert!(db.name_index().search("John /Smith/").is_none());
        assert!(db.refn_index().search("R1").is_none());
        assert_eq!(db.num_persons(), 0);
    }

    #[test]
    fn test_emission_order() {
        let mut db = Database::new("test.ged");
        let mut log = ErrorLog::new();
        db.store_record(record("0 HEAD\n"), &mut log);
        db.store_record(record("0 @F1@ FAM\n1 HUSB @I1@\n"), &mut log);
        db.store_record(record("0 @I1@ INDI\n1 NAME A /B/\n"), &mut log);
        db.store_record(record("0 @S1@ SOUR\n1 TITL T\n"), &mut log);
        db.store_record(record("0 TRLR\n"), &mut log);

        let text = db.to_gedcom_string(&GedcomWriter::new());
        let roots: Vec<&str> = text
            .lines()
            .filter(|l| l.starts_with('0'))
            .collect();
        assert_eq!(
            roots,
            ["0 HEAD", "0 @I1@ INDI", "0 @F1@ FAM", "0 @S1@ SOUR", "0 TRLR"]
        );
    }
}
