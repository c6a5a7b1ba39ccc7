//! Lineage navigation.
//!
//! These operations are defined purely in terms of the canonical
//! person/family structure and the record index: persons reach families
//! through FAMC/FAMS values, families reach persons through HUSB/WIFE/CHIL
//! values, and every hop is a key lookup in the database.

use crate::database::Database;
use crate::name::manipulate_name;
use crate::node::{NodeId, Record};
use crate::record::Sex;

/// Returns the first family a person belongs to as a child.
#[must_use]
pub fn person_to_family_as_child<'a>(
    database: &'a Database,
    person: &Record,
) -> Option<&'a Record> {
    let famc = person.find_child(person.root(), "FAMC")?;
    database.family(person.value(famc)?)
}

/// Returns the father of a person: the first HUSB of the first FAMC.
#[must_use]
pub fn person_to_father<'a>(database: &'a Database, person: &Record) -> Option<&'a Record> {
    family_to_husband(database, person_to_family_as_child(database, person)?)
}

/// Returns the mother of a person: the first WIFE of the first FAMC.
#[must_use]
pub fn person_to_mother<'a>(database: &'a Database, person: &Record) -> Option<&'a Record> {
    family_to_wife(database, person_to_family_as_child(database, person)?)
}

/// Returns the previous sibling of a person: the CHIL before this person in
/// the first FAMC family.
#[must_use]
pub fn person_to_previous_sibling<'a>(
    database: &'a Database,
    person: &Record,
) -> Option<&'a Record> {
    let key = person.key()?;
    let family = person_to_family_as_child(database, person)?;
    let mut previous: Option<&str> = None;
    for chil in family.tagged_run(family.root(), "CHIL") {
        if family.value(chil) == Some(key) {
            return database.person(previous?);
        }
        previous = family.value(chil);
    }
    None
}

/// Returns the next sibling of a person: the CHIL after this person in the
/// first FAMC family.
#[must_use]
pub fn person_to_next_sibling<'a>(database: &'a Database, person: &Record) -> Option<&'a Record> {
    let key = person.key()?;
    let family = person_to_family_as_child(database, person)?;
    let mut seen = false;
    for chil in family.tagged_run(family.root(), "CHIL") {
        if seen {
            return database.person(family.value(chil)?);
        }
        if family.value(chil) == Some(key) {
            seen = true;
        }
    }
    None
}

/// Returns the first husband of a family.
#[must_use]
pub fn family_to_husband<'a>(database: &'a Database, family: &Record) -> Option<&'a Record> {
    let husb = family.find_child(family.root(), "HUSB")?;
    database.person(family.value(husb)?)
}

/// Returns the first wife of a family.
#[must_use]
pub fn family_to_wife<'a>(database: &'a Database, family: &Record) -> Option<&'a Record> {
    let wife = family.find_child(family.root(), "WIFE")?;
    database.person(family.value(wife)?)
}

/// Returns the first spouse of a family with the given definite sex.
#[must_use]
pub fn family_to_spouse<'a>(
    database: &'a Database,
    family: &Record,
    sex: Sex,
) -> Option<&'a Record> {
    match sex {
        Sex::Male => family_to_husband(database, family),
        Sex::Female => family_to_wife(database, family),
        _ => None,
    }
}

/// Returns the first child of a family.
#[must_use]
pub fn family_to_first_child<'a>(database: &'a Database, family: &Record) -> Option<&'a Record> {
    let chil = family.find_child(family.root(), "CHIL")?;
    database.person(family.value(chil)?)
}

/// Returns the last child of a family.
#[must_use]
pub fn family_to_last_child<'a>(database: &'a Database, family: &Record) -> Option<&'a Record> {
    let last = family.tagged_run(family.root(), "CHIL").last()?;
    database.person(family.value(last)?)
}

/// Counts the distinct spouses of a person across all of its FAMS families.
#[must_use]
pub fn number_of_spouses(database: &Database, person: &Record) -> usize {
    let mut seen = std::collections::HashSet::new();
    spouses(database, person)
        .filter_map(|(spouse, _)| spouse.key())
        .filter(|key| seen.insert(key.to_string()))
        .count()
}

/// Counts the families a person belongs to as a spouse.
#[must_use]
pub fn number_of_families(person: &Record) -> usize {
    person.tagged_run(person.root(), "FAMS").count()
}

/// Returns a person's display name from its first NAME line, trimmed to
/// `max` characters, with the surname uppercased.
#[must_use]
pub fn person_to_name(person: &Record, max: usize) -> String {
    let Some(name) = person.find_child(person.root(), "NAME") else {
        return String::new();
    };
    let Some(value) = person.value(name) else {
        return String::new();
    };
    manipulate_name(value, true, true, max)
}

/// Returns a person's title: the value of its first TITL line.
#[must_use]
pub fn person_to_title(person: &Record) -> Option<&str> {
    let titl = person.find_child(person.root(), "TITL")?;
    person.value(titl)
}

/// Iterates the CHIL keys of a family, in order.
pub fn child_keys<'a>(family: &'a Record) -> impl Iterator<Item = &'a str> {
    member_keys(family, "CHIL")
}

/// Iterates the HUSB keys of a family, in order.
pub fn husband_keys<'a>(family: &'a Record) -> impl Iterator<Item = &'a str> {
    member_keys(family, "HUSB")
}

/// Iterates the WIFE keys of a family, in order.
pub fn wife_keys<'a>(family: &'a Record) -> impl Iterator<Item = &'a str> {
    member_keys(family, "WIFE")
}

/// Iterates the FAMC keys of a person, in order.
pub fn famc_keys<'a>(person: &'a Record) -> impl Iterator<Item = &'a str> {
    member_keys(person, "FAMC")
}

/// Iterates the FAMS keys of a person, in order.
pub fn fams_keys<'a>(person: &'a Record) -> impl Iterator<Item = &'a str> {
    member_keys(person, "FAMS")
}

fn member_keys<'a>(record: &'a Record, tag: &'a str) -> impl Iterator<Item = &'a str> {
    record
        .tagged_run(record.root(), tag)
        .filter_map(|id| record.value(id))
}

/// Iterates the children of a family resolved to person records.
pub fn children<'a>(
    database: &'a Database,
    family: &'a Record,
) -> impl Iterator<Item = &'a Record> {
    child_keys(family).filter_map(|key| database.person(key))
}

/// Iterates a person's spouses: for each FAMS family, the first spouse of
/// the opposite role, paired with the family.
pub fn spouses<'a>(
    database: &'a Database,
    person: &'a Record,
) -> impl Iterator<Item = (&'a Record, &'a Record)> {
    let sex = person.sex();
    fams_keys(person)
        .filter_map(move |key| database.family(key))
        .filter_map(move |family| {
            let spouse = match sex {
                Sex::Male => family_to_wife(database, family),
                _ => family_to_husband(database, family),
            }?;
            Some((spouse, family))
        })
}

/// Iterates the families a person belongs to as a spouse.
pub fn families_as_spouse<'a>(
    database: &'a Database,
    person: &'a Record,
) -> impl Iterator<Item = &'a Record> {
    fams_keys(person).filter_map(|key| database.family(key))
}

/// Iterates the families a person belongs to as a child.
pub fn families_as_child<'a>(
    database: &'a Database,
    person: &'a Record,
) -> impl Iterator<Item = &'a Record> {
    famc_keys(person).filter_map(|key| database.family(key))
}

/// Returns the opposite of a definite sex; `Unknown` otherwise.
#[must_use]
pub fn opposite_sex(sex: Sex) -> Sex {
    sex.opposite()
}

/// Extracts `DATE, PLAC` summary text from an event node.
#[must_use]
pub fn event_to_string(record: &Record, event: NodeId) -> Option<String> {
    let date = event_to_date(record, event);
    let place = event_to_place(record, event);
    match (date, place) {
        (Some(date), Some(place)) => Some(format!("{date}, {place}")),
        (Some(date), None) => Some(date.to_string()),
        (None, Some(place)) => Some(place.to_string()),
        (None, None) => None,
    }
}

/// Returns the DATE value of an event node.
#[must_use]
pub fn event_to_date<'a>(record: &'a Record, event: NodeId) -> Option<&'a str> {
    record.value(record.find_child(event, "DATE")?)
}

/// Returns the PLAC value of an event node.
#[must_use]
pub fn event_to_place<'a>(record: &'a Record, event: NodeId) -> Option<&'a str> {
    record.value(record.find_child(event, "PLAC")?)
}
