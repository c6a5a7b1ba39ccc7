//! Structural edit operations.
//!
//! Every edit to a person or family goes through the split → mutate → join
//! discipline, so records stay in canonical form and the sibling lists are
//! never rewired piecemeal. Operations that change a link update both ends
//! in the same call: the database is either unchanged or consistent.

use std::collections::{HashMap, HashSet};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::database::Database;
use crate::error::GedbaseError;
use crate::node::{NodeId, Record};
use crate::record::{is_key, valid_sex_value, RecordKind, Sex};
use crate::splitjoin::{join_family, join_person, split_family, split_person};

/// The characters used in generated record keys.
const KEY_CHARACTERS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// How many collisions key generation tolerates before giving up.
const KEY_RETRIES: usize = 50;

/// Generates fresh random record keys of the shape `@<T><6 chars>@`.
///
/// The generator is a small xorshift64* stream; seeding from the clock gives
/// each run its own key space, and a fixed seed gives tests a reproducible
/// one.
#[derive(Debug, Clone)]
pub struct KeyGenerator {
    state: u64,
}

impl KeyGenerator {
    /// Creates a generator seeded from the system clock.
    #[must_use]
    pub fn new() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0x9E37_79B9_7F4A_7C15);
        Self::from_seed(nanos)
    }

    /// Creates a generator with a fixed seed.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        KeyGenerator {
            state: if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed },
        }
    }

    fn next_raw(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    fn candidate(&mut self, kind: RecordKind) -> String {
        let mut key = String::with_capacity(9);
        key.push('@');
        key.push(kind.key_char());
        let mut bits = self.next_raw();
        for _ in 0..6 {
            key.push(char::from(KEY_CHARACTERS[(bits % 36) as usize]));
            bits /= 36;
        }
        key.push('@');
        key
    }

    /// Generates a key for a record of `kind` that `in_use` does not know.
    ///
    /// # Errors
    ///
    /// Fails after 50 colliding attempts.
    pub fn generate(
        &mut self,
        kind: RecordKind,
        mut in_use: impl FnMut(&str) -> bool,
    ) -> Result<String, GedbaseError> {
        for _ in 0..KEY_RETRIES {
            let key = self.candidate(kind);
            if !in_use(&key) {
                return Ok(key);
            }
        }
        Err(GedbaseError::KeyGeneration(format!(
            "could not generate a fresh {kind:?} key in {KEY_RETRIES} attempts"
        )))
    }
}

impl Default for KeyGenerator {
    fn default() -> Self {
        KeyGenerator::new()
    }
}

/// Creates an empty person record with a fresh key and stores it.
///
/// # Errors
///
/// Fails when no fresh key can be generated.
pub fn create_person(
    database: &mut Database,
    generator: &mut KeyGenerator,
) -> Result<String, GedbaseError> {
    create_shell(database, generator, RecordKind::Person, "INDI")
}

/// Creates an empty family record with a fresh key and stores it.
///
/// # Errors
///
/// Fails when no fresh key can be generated.
pub fn create_family(
    database: &mut Database,
    generator: &mut KeyGenerator,
) -> Result<String, GedbaseError> {
    create_shell(database, generator, RecordKind::Family, "FAM")
}

fn create_shell(
    database: &mut Database,
    generator: &mut KeyGenerator,
    kind: RecordKind,
    tag: &str,
) -> Result<String, GedbaseError> {
    let key = generator.generate(kind, |candidate| database.record(candidate).is_some())?;
    let record = Record::new(Some(&key), tag, None);
    let mut log = crate::errlog::ErrorLog::new();
    if !database.store_record(record, &mut log) {
        return Err(GedbaseError::Edit(format!("could not store record {key}")));
    }
    Ok(key)
}

/// Adds a child to a family at `index` in the CHIL list, appending when the
/// index is absent or past the end, and adds the matching FAMC link to the
/// child.
///
/// # Errors
///
/// Fails when either record is missing or of the wrong kind.
pub fn add_child_to_family(
    database: &mut Database,
    family_key: &str,
    child_key: &str,
    index: Option<usize>,
) -> Result<(), GedbaseError> {
    require_kind(database, family_key, RecordKind::Family)?;
    require_kind(database, child_key, RecordKind::Person)?;

    let family = database
        .record_mut(family_key)
        .expect("family checked above");
    let mut parts = split_family(family);
    let chil = family.alloc(None, "CHIL", Some(child_key));
    let position = index
        .filter(|&i| i < parts.children.len())
        .unwrap_or(parts.children.len());
    parts.children.insert(position, chil);
    join_family(family, parts);

    let child = database.record_mut(child_key).expect("child checked above");
    let mut parts = split_person(child);
    let famc = child.alloc(None, "FAMC", Some(family_key));
    parts.famcs.push(famc);
    join_person(child, parts);
    Ok(())
}

/// Removes a child from a family: the family's CHIL link and the child's
/// FAMC link are both removed, or neither.
///
/// # Errors
///
/// Fails, leaving both records unchanged, when either link is absent.
pub fn remove_child_from_family(
    database: &mut Database,
    family_key: &str,
    child_key: &str,
) -> Result<(), GedbaseError> {
    let family = require_kind(database, family_key, RecordKind::Family)?;
    let chil = family
        .find_child_with_value(family.root(), "CHIL", child_key)
        .ok_or_else(|| {
            GedbaseError::Edit(format!("FAM {family_key} has no CHIL link to {child_key}"))
        })?;
    let child = require_kind(database, child_key, RecordKind::Person)?;
    let famc = child
        .find_child_with_value(child.root(), "FAMC", family_key)
        .ok_or_else(|| {
            GedbaseError::Edit(format!("INDI {child_key} has no FAMC link to {family_key}"))
        })?;

    remove_part(database, family_key, chil, RemoveFrom::Family);
    remove_part(database, child_key, famc, RemoveFrom::Person);
    Ok(())
}

/// Adds a spouse to a family as HUSB or WIFE according to the spouse's sex,
/// which must be definite, and adds the matching FAMS link to the spouse.
///
/// # Errors
///
/// Fails when either record is missing or the spouse's sex is not definite.
pub fn add_spouse_to_family(
    database: &mut Database,
    family_key: &str,
    spouse_key: &str,
) -> Result<(), GedbaseError> {
    require_kind(database, family_key, RecordKind::Family)?;
    let spouse = require_kind(database, spouse_key, RecordKind::Person)?;
    let sex = spouse.sex();
    if !sex.is_definite() {
        return Err(GedbaseError::Edit(format!(
            "INDI {spouse_key} needs a definite sex to join FAM {family_key} as a spouse"
        )));
    }

    let family = database
        .record_mut(family_key)
        .expect("family checked above");
    let mut parts = split_family(family);
    let tag = if sex == Sex::Male { "HUSB" } else { "WIFE" };
    let node = family.alloc(None, tag, Some(spouse_key));
    if sex == Sex::Male {
        parts.husbands.push(node);
    } else {
        parts.wives.push(node);
    }
    join_family(family, parts);

    let spouse = database
        .record_mut(spouse_key)
        .expect("spouse checked above");
    let mut parts = split_person(spouse);
    let fams = spouse.alloc(None, "FAMS", Some(family_key));
    parts.famss.push(fams);
    join_person(spouse, parts);
    Ok(())
}

/// Removes a spouse from a family: the HUSB-or-WIFE link (chosen by the
/// spouse's sex) and the spouse's FAMS link are both removed, or neither.
///
/// # Errors
///
/// Fails, leaving both records unchanged, when either link is absent or the
/// spouse's sex is not definite.
pub fn remove_spouse_from_family(
    database: &mut Database,
    family_key: &str,
    spouse_key: &str,
) -> Result<(), GedbaseError> {
    let spouse = require_kind(database, spouse_key, RecordKind::Person)?;
    let sex = spouse.sex();
    if !sex.is_definite() {
        return Err(GedbaseError::Edit(format!(
            "INDI {spouse_key} needs a definite sex to leave FAM {family_key}"
        )));
    }
    let fams = spouse
        .find_child_with_value(spouse.root(), "FAMS", family_key)
        .ok_or_else(|| {
            GedbaseError::Edit(format!("INDI {spouse_key} has no FAMS link to {family_key}"))
        })?;
    let family = require_kind(database, family_key, RecordKind::Family)?;
    let tag = if sex == Sex::Male { "HUSB" } else { "WIFE" };
    let link = family
        .find_child_with_value(family.root(), tag, spouse_key)
        .ok_or_else(|| {
            GedbaseError::Edit(format!("FAM {family_key} has no {tag} link to {spouse_key}"))
        })?;

    remove_part(database, family_key, link, RemoveFrom::Family);
    remove_part(database, spouse_key, fams, RemoveFrom::Person);
    Ok(())
}

enum RemoveFrom {
    Person,
    Family,
}

fn remove_part(database: &mut Database, key: &str, node: NodeId, from: RemoveFrom) {
    let record = database.record_mut(key).expect("record checked by caller");
    match from {
        RemoveFrom::Family => {
            let mut parts = split_family(record);
            parts.husbands.retain(|&id| id != node);
            parts.wives.retain(|&id| id != node);
            parts.children.retain(|&id| id != node);
            parts.refns.retain(|&id| id != node);
            parts.rest.retain(|&id| id != node);
            join_family(record, parts);
        }
        RemoveFrom::Person => {
            let mut parts = split_person(record);
            parts.names.retain(|&id| id != node);
            parts.refns.retain(|&id| id != node);
            parts.body.retain(|&id| id != node);
            parts.famcs.retain(|&id| id != node);
            parts.famss.retain(|&id| id != node);
            if parts.sex == Some(node) {
                parts.sex = None;
            }
            join_person(record, parts);
        }
    }
}

fn require_kind<'a>(
    database: &'a Database,
    key: &str,
    kind: RecordKind,
) -> Result<&'a Record, GedbaseError> {
    database
        .record(key)
        .filter(|record| record.kind() == kind)
        .ok_or_else(|| GedbaseError::Edit(format!("{key} is not a {kind:?} record in the database")))
}

/// Ensures a person carries exactly one SEX line valued M, F or U: an
/// invalid value is rewritten to `U` and a missing line is added as `U`.
/// Returns true when the record was changed. The record is normalized as a
/// side effect.
pub fn patch_sex(person: &mut Record) -> bool {
    if person.kind() != RecordKind::Person {
        return false;
    }
    let mut parts = split_person(person);
    let mut changed = false;
    match parts.sex {
        Some(sex) => {
            let invalid = !person.value(sex).is_some_and(valid_sex_value);
            if invalid {
                person.set_value(sex, Some("U".to_string()));
                changed = true;
            }
        }
        None => {
            parts.sex = Some(person.alloc(None, "SEX", Some("U")));
            changed = true;
        }
    }
    join_person(person, parts);
    changed
}

/// Patches the SEX line of every person in a record list, as loaded from a
/// file. Returns how many records were changed.
pub fn patch_sex_records(records: &mut [Record]) -> usize {
    let mut changed = 0;
    for record in records.iter_mut() {
        if record.kind() == RecordKind::Person && patch_sex(record) {
            changed += 1;
        }
    }
    changed
}

/// Remints every record key: each keyed record gets a fresh random key and
/// every key-valued field is rewritten through the same bijection. Returns
/// the old-to-new key mapping.
///
/// # Errors
///
/// Fails when a fresh key cannot be generated.
pub fn remint_record_keys(
    records: &mut [Record],
    generator: &mut KeyGenerator,
) -> Result<HashMap<String, String>, GedbaseError> {
    let mut used: HashSet<String> = records
        .iter()
        .filter_map(|record| record.key().map(str::to_string))
        .collect();
    let mut mapping: HashMap<String, String> = HashMap::new();
    for record in records.iter() {
        let Some(old) = record.key() else {
            continue;
        };
        let fresh = generator.generate(record.kind(), |candidate| used.contains(candidate))?;
        used.insert(fresh.clone());
        mapping.insert(old.to_string(), fresh);
    }

    for record in records.iter_mut() {
        if let Some(old) = record.key() {
            let fresh = mapping[old].clone();
            record.set_key(Some(fresh));
        }
        let nodes: Vec<NodeId> = record.traverse().collect();
        for node in nodes {
            let Some(value) = record.value(node) else {
                continue;
            };
            if is_key(value) {
                if let Some(fresh) = mapping.get(value) {
                    let fresh = fresh.clone();
                    record.set_value(node, Some(fresh));
                }
            }
        }
    }
    Ok(mapping)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::import::string_to_database;
    use crate::errlog::ErrorLog;
    use crate::lineage;
    use crate::parser::record_from_string;
    use crate::writer::GedcomWriter;

    const FAMILY: &str = "\
0 HEAD
0 @I1@ INDI
1 NAME George /Stone/
1 SEX M
1 FAMS @F1@
0 @I2@ INDI
1 NAME Mary /Hill/
1 SEX F
1 FAMS @F1@
0 @I3@ INDI
1 NAME Ann /Stone/
1 SEX F
1 FAMC @F1@
0 @I4@ INDI
1 NAME Ben /Stone/
1 SEX M
0 @F1@ FAM
1 HUSB @I1@
1 WIFE @I2@
1 CHIL @I3@
0 TRLR
";

    fn family_db() -> Database {
        let mut log = ErrorLog::new();
        string_to_database(FAMILY, "family.ged", &mut log).expect("clean import")
    }

    #[test]
    fn test_key_generator_shape() {
        let mut generator = KeyGenerator::from_seed(7);
        let key = generator.generate(RecordKind::Person, |_| false).unwrap();
        assert_eq!(key.len(), 9);
        assert!(key.starts_with("@I"));
        assert!(key.ends_with('@'));
        assert!(key[2..8].bytes().all(|b| b.is_ascii_digit() || b.is_ascii_uppercase()));
    }

    #[test]
    fn test_key_generator_gives_up_after_retries() {
        let mut generator = KeyGenerator::from_seed(7);
        let result = generator.generate(RecordKind::Person, |_| true);
        assert!(result.is_err());
    }

    #[test]
    fn test_add_child_appends_and_links_back() {
        let mut db = family_db();
        add_child_to_family(&mut db, "@F1@", "@I4@", None).unwrap();

        let family = db.family("@F1@").unwrap();
        let children: Vec<&str> = lineage::child_keys(family).collect();
        assert_eq!(children, ["@I3@", "@I4@"]);

        let ben = db.person("@I4@").unwrap();
        let famcs: Vec<&str> = lineage::famc_keys(ben).collect();
        assert_eq!(famcs, ["@F1@"]);
    }

    #[test]
    fn test_add_child_at_index_inserts_before() {
        let mut db = family_db();
        add_child_to_family(&mut db, "@F1@", "@I4@", Some(0)).unwrap();
        let family = db.family("@F1@").unwrap();
        let children: Vec<&str> = lineage::child_keys(family).collect();
        assert_eq!(children, ["@I4@", "@I3@"]);
    }

    #[test]
    fn test_add_child_index_past_end_appends() {
        let mut db = family_db();
        add_child_to_family(&mut db, "@F1@", "@I4@", Some(10)).unwrap();
        let family = db.family("@F1@").unwrap();
        let children: Vec<&str> = lineage::child_keys(family).collect();
        assert_eq!(children, ["@I3@", "@I4@"]);
    }

    #[test]
    fn test_remove_child_unlinks_both_ends() {
        let mut db = family_db();
        remove_child_from_family(&mut db, "@F1@", "@I3@").unwrap();

        let family = db.family("@F1@").unwrap();
        assert_eq!(lineage::child_keys(family).count(), 0);
        let ann = db.person("@I3@").unwrap();
        assert_eq!(lineage::famc_keys(ann).count(), 0);
    }

    #[test]
    fn test_remove_child_without_link_changes_nothing() {
        let mut db = family_db();
        let before = GedcomWriter::new().record_to_string(db.family("@F1@").unwrap());
        assert!(remove_child_from_family(&mut db, "@F1@", "@I4@").is_err());
        let after = GedcomWriter::new().record_to_string(db.family("@F1@").unwrap());
        assert_eq!(before, after);
    }

    #[test]
    fn test_add_spouse_by_sex() {
        let mut db = family_db();
        // Ben is male; a second family gets him as HUSB.
        let mut generator = KeyGenerator::from_seed(11);
        let family_key = create_family(&mut db, &mut generator).unwrap();
        add_spouse_to_family(&mut db, &family_key, "@I4@").unwrap();

        let family = db.family(&family_key).unwrap();
        let husbands: Vec<&str> = lineage::husband_keys(family).collect();
        assert_eq!(husbands, ["@I4@"]);
        let ben = db.person("@I4@").unwrap();
        assert!(lineage::fams_keys(ben).any(|k| k == family_key));
    }

    #[test]
    fn test_remove_spouse() {
        let mut db = family_db();
        remove_spouse_from_family(&mut db, "@F1@", "@I2@").unwrap();
        let family = db.family("@F1@").unwrap();
        assert_eq!(lineage::wife_keys(family).count(), 0);
        let mary = db.person("@I2@").unwrap();
        assert_eq!(lineage::fams_keys(mary).count(), 0);
    }

    #[test]
    fn test_spouse_needs_definite_sex() {
        let mut db = family_db();
        let mut log = ErrorLog::new();
        let neutral =
            record_from_string("0 @I9@ INDI\n1 NAME Pat /Gray/\n1 SEX U\n", &mut log).unwrap();
        db.store_record(neutral, &mut log);
        assert!(add_spouse_to_family(&mut db, "@F1@", "@I9@").is_err());
    }

    #[test]
    fn test_patch_sex() {
        let mut log = ErrorLog::new();
        let mut missing = record_from_string("0 @I1@ INDI\n1 NAME A /B/\n", &mut log).unwrap();
        assert!(patch_sex(&mut missing));
        assert_eq!(missing.sex(), Sex::Unknown);
        let text = GedcomWriter::new().record_to_string(&missing);
        assert!(text.contains("1 SEX U"));

        let mut invalid =
            record_from_string("0 @I2@ INDI\n1 NAME A /B/\n1 SEX male\n", &mut log).unwrap();
        assert!(patch_sex(&mut invalid));
        assert_eq!(invalid.sex(), Sex::Unknown);

        let mut fine =
            record_from_string("0 @I3@ INDI\n1 NAME A /B/\n1 SEX F\n", &mut log).unwrap();
        assert!(!patch_sex(&mut fine));
        assert_eq!(fine.sex(), Sex::Female);
    }

    #[test]
    fn test_patch_sex_records_sweeps_persons_only() {
        let mut log = ErrorLog::new();
        let mut records = crate::parser::records_from_string(
            "0 HEAD\n0 @I1@ INDI\n1 NAME A /B/\n0 @F1@ FAM\n1 HUSB @I1@\n0 TRLR\n",
            "patch.ged",
            &mut log,
        );
        assert!(log.is_empty());
        assert_eq!(patch_sex_records(&mut records), 1);
        // A second sweep finds nothing left to fix.
        assert_eq!(patch_sex_records(&mut records), 0);
    }

    #[test]
    fn test_remint_rewrites_keys_and_references() {
        let mut log = ErrorLog::new();
        let mut records = crate::parser::records_from_string(FAMILY, "family.ged", &mut log);
        assert!(log.is_empty());

        let mut generator = KeyGenerator::from_seed(99);
        let mapping = remint_record_keys(&mut records, &mut generator).unwrap();
        assert_eq!(mapping.len(), 5);

        // Every old key is gone from values and roots; links still resolve.
        let text: String = records
            .iter()
            .map(|r| GedcomWriter::new().record_to_string(r))
            .collect();
        for old in mapping.keys() {
            assert!(!text.contains(old.as_str()));
        }
        let db = string_to_database(&text, "reminted.ged", &mut log).expect("reminted db valid");
        assert_eq!(db.num_persons(), 4);
        assert_eq!(db.num_families(), 1);
    }
}
