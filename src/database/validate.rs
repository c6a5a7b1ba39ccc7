//! Lineage and reference validation.
//!
//! Each check appends its failures to the error log and keeps going, so one
//! validation pass reports the complete error set. Diagnostic lines are
//! exact: the record's line of definition plus the pre-order offset of the
//! offending node.

use crate::database::refnindex::RefnInsert;
use crate::database::Database;
use crate::errlog::{Diagnostic, DiagnosticKind, ErrorLog};
use crate::node::{NodeId, Record};
use crate::record::{valid_sex_value, Sex};

const MEMBER_ROLES: [(&str, &str); 3] = [("HUSB", "FAMS"), ("WIFE", "FAMS"), ("CHIL", "FAMC")];

fn node_line(record: &Record, id: NodeId) -> usize {
    record.line() + record.count_nodes_before(id)
}

/// Validates every person: FAMC/FAMS links must resolve to families that
/// link back, and the person must carry a non-empty NAME and a valid SEX.
pub fn validate_persons(database: &Database, log: &mut ErrorLog) {
    let file = database.last_segment();
    for key in database.person_keys() {
        let Some(person) = database.person(key) else {
            continue;
        };
        validate_person(database, person, key, file, log);
    }
}

fn validate_person(
    database: &Database,
    person: &Record,
    key: &str,
    file: &str,
    log: &mut ErrorLog,
) {
    let root = person.root();
    let line = person.line();
    let mut link_errors = 0;

    for famc in person.tagged_run(root, "FAMC") {
        let family_key = person.value(famc).unwrap_or("");
        if database.family(family_key).is_none() {
            log.add(Diagnostic::new(
                DiagnosticKind::Linkage,
                file,
                node_line(person, famc),
                format!(
                    "INDI {key} (line {line}): FAMC {family_key} (line {}) does not exist.",
                    node_line(person, famc)
                ),
            ));
            link_errors += 1;
        }
    }
    for fams in person.tagged_run(root, "FAMS") {
        let family_key = person.value(fams).unwrap_or("");
        if database.family(family_key).is_none() {
            log.add(Diagnostic::new(
                DiagnosticKind::Linkage,
                file,
                node_line(person, fams),
                format!(
                    "INDI {key} (line {line}): FAMS {family_key} (line {}) does not exist.",
                    node_line(person, fams)
                ),
            ));
            link_errors += 1;
        }
    }
    if link_errors == 0 {
        // Each FAMC family must hold exactly one CHIL link back.
        for famc in person.tagged_run(root, "FAMC") {
            let family_key = person.value(famc).unwrap_or("");
            let family = database.family(family_key).expect("checked above");
            let occurrences = family
                .tagged_run(family.root(), "CHIL")
                .filter(|&chil| family.value(chil) == Some(key))
                .count();
            if occurrences != 1 {
                log.add(Diagnostic::new(
                    DiagnosticKind::Linkage,
                    file,
                    node_line(person, famc),
                    format!(
                        "FAM {family_key} has {occurrences} CHIL links to INDI {key}; expected one."
                    ),
                ));
            }
        }
        // Each FAMS family must hold exactly one HUSB or WIFE link back,
        // chosen by the person's sex, which must be definite.
        let sex = person.sex();
        for fams in person.tagged_run(root, "FAMS") {
            let family_key = person.value(fams).unwrap_or("");
            if !sex.is_definite() {
                log.add(Diagnostic::new(
                    DiagnosticKind::Linkage,
                    file,
                    node_line(person, fams),
                    format!(
                        "INDI {key} (line {line}) with FAMS {family_key} link has no sex value."
                    ),
                ));
                continue;
            }
            let role = if sex == Sex::Male { "HUSB" } else { "WIFE" };
            let family = database.family(family_key).expect("checked above");
            let occurrences = family
                .tagged_run(family.root(), role)
                .filter(|&spouse| family.value(spouse) == Some(key))
                .count();
            if occurrences != 1 {
                log.add(Diagnostic::new(
                    DiagnosticKind::Linkage,
                    file,
                    node_line(person, fams),
                    format!("FAM {family_key} should have one {role} link to INDI {key} (line {line})."),
                ));
            }
        }
    }

    let has_name = person
        .tagged_run(root, "NAME")
        .any(|name| person.value(name).is_some_and(|v| !v.is_empty()));
    if !has_name {
        log.add(Diagnostic::new(
            DiagnosticKind::Linkage,
            file,
            line,
            format!("INDI {key} has no NAME line."),
        ));
    }
    let has_valid_sex = person
        .find_child(root, "SEX")
        .and_then(|sex| person.value(sex))
        .is_some_and(valid_sex_value);
    if !has_valid_sex {
        log.add(Diagnostic::new(
            DiagnosticKind::Linkage,
            file,
            line,
            format!("INDI {key} has no valid SEX line."),
        ));
    }
}

/// Validates every family: HUSB/WIFE/CHIL links must resolve to persons that
/// link back exactly once, and the family must have at least one member.
pub fn validate_families(database: &Database, log: &mut ErrorLog) {
    let file = database.last_segment();
    for key in database.family_keys() {
        let Some(family) = database.family(key) else {
            continue;
        };
        validate_family(database, family, key, file, log);
    }
}

fn validate_family(
    database: &Database,
    family: &Record,
    key: &str,
    file: &str,
    log: &mut ErrorLog,
) {
    let root = family.root();
    let line = family.line();
    let mut link_errors = 0;

    // All members must resolve to persons.
    for (role, _) in MEMBER_ROLES {
        for member in family.tagged_run(root, role) {
            let person_key = family.value(member).unwrap_or("");
            if database.person(person_key).is_none() {
                log.add(Diagnostic::new(
                    DiagnosticKind::Linkage,
                    file,
                    node_line(family, member),
                    format!(
                        "FAM {key} (line {line}): {role} {person_key} (line {}) does not exist.",
                        node_line(family, member)
                    ),
                ));
                link_errors += 1;
            }
        }
    }

    // Back links are only meaningful when every member resolved.
    if link_errors == 0 {
        for (role, back) in MEMBER_ROLES {
            for member in family.tagged_run(root, role) {
                let person_key = family.value(member).unwrap_or("");
                let person = database.person(person_key).expect("checked above");
                let occurrences = person
                    .tagged_run(person.root(), back)
                    .filter(|&node| person.value(node) == Some(key))
                    .count();
                if occurrences != 1 {
                    log.add(Diagnostic::new(
                        DiagnosticKind::Linkage,
                        file,
                        node_line(family, member),
                        format!(
                            "INDI {person_key} has {occurrences} {back} links to FAM {key}; expected one."
                        ),
                    ));
                }
            }
        }
    }

    let has_member = MEMBER_ROLES
        .into_iter()
        .any(|(role, _)| family.find_child(root, role).is_some());
    if !has_member {
        log.add(Diagnostic::new(
            DiagnosticKind::Linkage,
            file,
            line,
            format!("FAM {key} has no HUSB, WIFE or CHIL links."),
        ));
    }
}

/// Validates the 1 REFN nodes of every record, building the reference index
/// as it goes: values must be non-empty and globally unique.
pub fn validate_references(database: &mut Database, log: &mut ErrorLog) {
    let file = database.last_segment().to_string();
    let mut found: Vec<(String, String, usize)> = Vec::new();
    for key in database.keys_sorted() {
        let record = database.record(key).expect("key comes from the index");
        for refn in record.tagged_run(record.root(), "REFN") {
            let value = record.value(refn).unwrap_or("").to_string();
            found.push((value, key.to_string(), node_line(record, refn)));
        }
    }
    for (value, key, line) in found {
        if value.is_empty() {
            log.add(Diagnostic::new(
                DiagnosticKind::Gedcom,
                &file,
                line,
                "Missing REFN value",
            ));
        } else if database.refn_index_mut().add(&value, &key) == RefnInsert::AlreadyPresent {
            log.add(Diagnostic::new(
                DiagnosticKind::Gedcom,
                &file,
                line,
                format!("REFN value {value} already in index"),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::record_from_string;

    fn db_with(sources: &[&str]) -> Database {
        let mut db = Database::new("test.ged");
        let mut log = ErrorLog::new();
        for source in sources {
            let record = record_from_string(source, &mut log).expect("well-formed record");
            db.store_record(record, &mut log);
        }
        assert!(log.is_empty());
        db
    }

    #[test]
    fn test_valid_family_passes() {
        let db = db_with(&[
            "0 @I1@ INDI\n1 NAME A /B/\n1 SEX M\n1 FAMS @F1@\n",
            "0 @I2@ INDI\n1 NAME C /D/\n1 SEX F\n1 FAMS @F1@\n",
            "0 @I3@ INDI\n1 NAME E /F/\n1 SEX M\n1 FAMC @F1@\n",
            "0 @F1@ FAM\n1 HUSB @I1@\n1 WIFE @I2@\n1 CHIL @I3@\n",
        ]);
        let mut log = ErrorLog::new();
        validate_persons(&db, &mut log);
        validate_families(&db, &mut log);
        assert!(log.is_empty(), "unexpected errors: {log}");
    }

    #[test]
    fn test_missing_name_and_sex_are_reported_but_do_not_abort() {
        let db = db_with(&["0 @I1@ INDI\n1 BIRT\n2 DATE 1900\n"]);
        let mut log = ErrorLog::new();
        validate_persons(&db, &mut log);
        assert_eq!(log.len(), 2);
        assert!(log.iter().any(|d| d.message.contains("NAME")));
        assert!(log.iter().any(|d| d.message.contains("SEX")));
    }

    #[test]
    fn test_fams_without_definite_sex() {
        let db = db_with(&[
            "0 @I1@ INDI\n1 NAME A /B/\n1 SEX U\n1 FAMS @F1@\n",
            "0 @F1@ FAM\n1 HUSB @I1@\n",
        ]);
        let mut log = ErrorLog::new();
        validate_persons(&db, &mut log);
        assert!(log.iter().any(|d| d.message.contains("no sex value")));
    }

    #[test]
    fn test_missing_backlink_is_reported() {
        let db = db_with(&[
            "0 @I1@ INDI\n1 NAME A /B/\n1 SEX M\n1 FAMS @F1@\n",
            "0 @F1@ FAM\n1 WIFE @I1@\n",
        ]);
        let mut log = ErrorLog::new();
        validate_persons(&db, &mut log);
        assert!(log
            .iter()
            .any(|d| d.message.contains("should have one HUSB link")));
    }

    #[test]
    fn test_empty_family_is_reported() {
        let db = db_with(&["0 @F1@ FAM\n1 MARR\n2 DATE 1900\n"]);
        let mut log = ErrorLog::new();
        validate_families(&db, &mut log);
        assert!(log
            .iter()
            .any(|d| d.message.contains("no HUSB, WIFE or CHIL")));
    }

    #[test]
    fn test_duplicate_refn_is_reported() {
        let mut db = db_with(&[
            "0 @I1@ INDI\n1 NAME A /B/\n1 SEX M\n1 REFN SAME\n",
            "0 @I2@ INDI\n1 NAME C /D/\n1 SEX F\n1 REFN SAME\n",
        ]);
        let mut log = ErrorLog::new();
        validate_references(&mut db, &mut log);
        assert_eq!(log.len(), 1);
        assert!(log.iter().next().unwrap().message.contains("already in index"));
        assert_eq!(db.refn_index().search("SAME"), Some("@I1@"));
    }

    #[test]
    fn test_empty_refn_is_reported() {
        let mut db = db_with(&["0 @I1@ INDI\n1 NAME A /B/\n1 SEX M\n1 REFN\n"]);
        let mut log = ErrorLog::new();
        validate_references(&mut db, &mut log);
        assert_eq!(log.len(), 1);
        assert!(log.iter().next().unwrap().message.contains("Missing REFN"));
    }
}
