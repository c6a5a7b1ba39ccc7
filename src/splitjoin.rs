//! Splitting and joining person and family records.
//!
//! Splitting partitions a record's level-1 children into named groups,
//! preserving relative order within each group; joining relinks the groups in
//! canonical order. A split followed by a join therefore normalizes the
//! record, and every structural edit is performed between a split and its
//! matching join.

use crate::node::{NodeId, Record};

/// The parts of a split person: `NAME* REFN* SEX? body* FAMC* FAMS*`.
#[derive(Debug, Default)]
pub struct PersonParts {
    /// The 1 NAME nodes.
    pub names: Vec<NodeId>,
    /// The 1 REFN nodes.
    pub refns: Vec<NodeId>,
    /// The first 1 SEX node; later SEX nodes stay in the body.
    pub sex: Option<NodeId>,
    /// All other level-1 nodes.
    pub body: Vec<NodeId>,
    /// The 1 FAMC nodes.
    pub famcs: Vec<NodeId>,
    /// The 1 FAMS nodes.
    pub famss: Vec<NodeId>,
}

/// The parts of a split family: `REFN* HUSB* WIFE* CHIL* rest*`.
#[derive(Debug, Default)]
pub struct FamilyParts {
    /// The 1 REFN nodes.
    pub refns: Vec<NodeId>,
    /// The 1 HUSB nodes.
    pub husbands: Vec<NodeId>,
    /// The 1 WIFE nodes.
    pub wives: Vec<NodeId>,
    /// The 1 CHIL nodes.
    pub children: Vec<NodeId>,
    /// All other level-1 nodes.
    pub rest: Vec<NodeId>,
}

/// Splits a person record into its parts, detaching all children from the
/// root. The nodes are not copied, only regrouped.
pub fn split_person(person: &mut Record) -> PersonParts {
    let mut parts = PersonParts::default();
    for id in detach_children(person) {
        match person.tag(id) {
            "NAME" => parts.names.push(id),
            "REFN" => parts.refns.push(id),
            "SEX" if parts.sex.is_none() => parts.sex = Some(id),
            "FAMC" => parts.famcs.push(id),
            "FAMS" => parts.famss.push(id),
            _ => parts.body.push(id),
        }
    }
    parts
}

/// Joins a person record back from its parts, in canonical order.
pub fn join_person(person: &mut Record, parts: PersonParts) {
    let mut ordered = parts.names;
    ordered.extend(parts.refns);
    ordered.extend(parts.sex);
    ordered.extend(parts.body);
    ordered.extend(parts.famcs);
    ordered.extend(parts.famss);
    attach_children(person, &ordered);
}

/// Splits a family record into its parts, detaching all children from the
/// root.
pub fn split_family(family: &mut Record) -> FamilyParts {
    let mut parts = FamilyParts::default();
    for id in detach_children(family) {
        match family.tag(id) {
            "REFN" => parts.refns.push(id),
            "HUSB" => parts.husbands.push(id),
            "WIFE" => parts.wives.push(id),
            "CHIL" => parts.children.push(id),
            _ => parts.rest.push(id),
        }
    }
    parts
}

/// Joins a family record back from its parts, in canonical order.
pub fn join_family(family: &mut Record, parts: FamilyParts) {
    let mut ordered = parts.refns;
    ordered.extend(parts.husbands);
    ordered.extend(parts.wives);
    ordered.extend(parts.children);
    ordered.extend(parts.rest);
    attach_children(family, &ordered);
}

/// Puts a person record into canonical form.
pub fn normalize_person(person: &mut Record) {
    let parts = split_person(person);
    join_person(person, parts);
}

/// Puts a family record into canonical form.
pub fn normalize_family(family: &mut Record) {
    let parts = split_family(family);
    join_family(family, parts);
}

fn detach_children(record: &mut Record) -> Vec<NodeId> {
    let children: Vec<NodeId> = record.children(record.root()).collect();
    for &id in &children {
        record.detach(id);
    }
    children
}

fn attach_children(record: &mut Record, ordered: &[NodeId]) {
    let root = record.root();
    for &id in ordered {
        record.append_child(root, id);
    }
}
