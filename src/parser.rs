//! The forest builder.
//!
//! Turns the flat list of lexed lines into record trees. A small state
//! machine tracks level transitions; on an illegal level it closes the
//! current record, logs the problem, and skips forward to the next level-0
//! line, so a single pass yields every well-formed record plus the complete
//! error set.

use crate::errlog::{Diagnostic, DiagnosticKind, ErrorLog};
use crate::lexer::{lex_string, FlatLine};
use crate::node::{NodeId, Record};

enum State {
    Initial,
    Main,
    Error,
}

/// Builds the forest of record trees from lexed lines.
///
/// Errors are logged and building continues with the next level-0 line.
#[must_use]
pub fn build_forest(lines: &[FlatLine], file: &str, log: &mut ErrorLog) -> Vec<Record> {
    let mut roots: Vec<Record> = Vec::new();
    let mut state = State::Initial;
    let mut current: Option<Record> = None;
    let mut prev: Option<NodeId> = None;
    let mut prev_level: u32 = 0;

    for line in lines {
        match state {
            State::Initial => {
                if line.level == 0 {
                    current = Some(new_record(line));
                    prev = current.as_ref().map(Record::root);
                    prev_level = 0;
                    state = State::Main;
                } else {
                    log.add(Diagnostic::new(
                        DiagnosticKind::Syntax,
                        file,
                        line.line_no,
                        "Illegal line level.",
                    ));
                    state = State::Error;
                }
            }
            State::Main => {
                if line.level == 0 {
                    if let Some(record) = current.take() {
                        roots.push(record);
                    }
                    current = Some(new_record(line));
                    prev = current.as_ref().map(Record::root);
                    prev_level = 0;
                    continue;
                }
                let record = current.as_mut().expect("a record is open in main state");
                let previous = prev.expect("a previous node exists in main state");
                let attach_under = if line.level == prev_level {
                    record.parent_of(previous)
                } else if line.level == prev_level + 1 {
                    Some(previous)
                } else if line.level < prev_level {
                    let mut ancestor = Some(previous);
                    for _ in 0..(prev_level - line.level) {
                        ancestor = ancestor.and_then(|id| record.parent_of(id));
                    }
                    ancestor.and_then(|id| record.parent_of(id))
                } else {
                    None
                };
                match attach_under {
                    Some(parent) => {
                        let node =
                            record.alloc(line.key.as_deref(), &line.tag, line.value.as_deref());
                        record.append_child(parent, node);
                        prev = Some(node);
                        prev_level = line.level;
                    }
                    None => {
                        log.add(Diagnostic::new(
                            DiagnosticKind::Syntax,
                            file,
                            line.line_no,
                            "Illegal level number.",
                        ));
                        if let Some(record) = current.take() {
                            roots.push(record);
                        }
                        state = State::Error;
                    }
                }
            }
            State::Error => {
                if line.level == 0 {
                    current = Some(new_record(line));
                    prev = current.as_ref().map(Record::root);
                    prev_level = 0;
                    state = State::Main;
                }
            }
        }
    }

    if let Some(record) = current.take() {
        roots.push(record);
    }
    roots
}

/// Parses GEDCOM text into a forest of records, collecting errors.
#[must_use]
pub fn records_from_string(source: &str, file: &str, log: &mut ErrorLog) -> Vec<Record> {
    let lines = lex_string(source, file, log);
    build_forest(&lines, file, log)
}

/// Parses GEDCOM text that holds exactly one record.
///
/// Returns `None`, with the problems logged, when the text does not lex and
/// build into a single record.
#[must_use]
pub fn record_from_string(source: &str, log: &mut ErrorLog) -> Option<Record> {
    let before = log.len();
    let mut records = records_from_string(source, "string", log);
    if log.len() != before || records.len() != 1 {
        return None;
    }
    records.pop()
}

fn new_record(line: &FlatLine) -> Record {
    let mut record = Record::new(line.key.as_deref(), &line.tag, line.value.as_deref());
    record.set_line(line.line_no);
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forest(source: &str) -> (Vec<Record>, ErrorLog) {
        let mut log = ErrorLog::new();
        let records = records_from_string(source, "test.ged", &mut log);
        (records, log)
    }

    #[test]
    fn test_single_record_with_nested_levels() {
        let (records, log) = forest("0 @I1@ INDI\n1 BIRT\n2 DATE 1900\n1 SEX M\n");
        assert!(log.is_empty());
        assert_eq!(records.len(), 1);

        let rec = &records[0];
        let tags: Vec<&str> = rec.traverse().map(|id| rec.tag(id)).collect();
        assert_eq!(tags, ["INDI", "BIRT", "DATE", "SEX"]);
        assert_eq!(rec.key(), Some("@I1@"));
        assert_eq!(rec.line(), 1);
    }

    #[test]
    fn test_multiple_records() {
        let (records, log) = forest("0 HEAD\n0 @I1@ INDI\n1 NAME A\n0 TRLR\n");
        assert!(log.is_empty());
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].key(), Some("@I1@"));
        assert_eq!(records[2].line(), 4);
    }

    #[test]
    fn test_level_drop_attaches_to_ancestor() {
        let (records, log) = forest("0 @I1@ INDI\n1 BIRT\n2 DATE 1900\n2 PLAC Here\n1 DEAT\n");
        assert!(log.is_empty());
        let rec = &records[0];
        let deat = rec.find_child(rec.root(), "DEAT").expect("DEAT is a root child");
        assert_eq!(rec.level(deat), 1);
    }

    #[test]
    fn test_first_line_not_level_zero() {
        let (records, log) = forest("1 NAME stray\n0 @I1@ INDI\n");
        assert_eq!(log.len(), 1);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key(), Some("@I1@"));
    }

    #[test]
    fn test_level_jump_closes_record_and_recovers() {
        let (records, log) = forest("0 @I1@ INDI\n2 DATE bad jump\n1 NAME lost\n0 @I2@ INDI\n");
        assert_eq!(log.len(), 1);
        // The partial first record is kept, the stray line is skipped, and
        // parsing resumes at the next level-0 line.
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].key(), Some("@I1@"));
        assert_eq!(records[0].count_nodes(), 1);
        assert_eq!(records[1].key(), Some("@I2@"));
    }

    #[test]
    fn test_record_from_string() {
        let mut log = ErrorLog::new();
        let rec = record_from_string("0 @F1@ FAM\n1 HUSB @I1@\n", &mut log).unwrap();
        assert_eq!(rec.key(), Some("@F1@"));
        assert_eq!(rec.count_nodes(), 2);

        assert!(record_from_string("0 HEAD\n0 TRLR\n", &mut log).is_none());
    }
}
