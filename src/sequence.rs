//! Sequences: ordered multisets of record references.
//!
//! A sequence holds `{record key, cached name, payload}` tuples. It is the
//! first-class query collection of the scripting language (there called an
//! indiset) and the result type of the lineage closure operations. Order is
//! insertion order until a sort is requested; a sort-state flag remembers
//! which order the elements are in.
//!
//! Sequences own their element tuples but never the records they reference;
//! operations that resolve keys take the owning [`Database`] as an argument.

use std::collections::{HashSet, VecDeque};

use crate::database::Database;
use crate::interp::pvalue::PValue;
use crate::lineage;
use crate::name::{compare_names, exact_match};
use crate::record::compare_record_keys;
use crate::writer::GedcomWriter;

/// The sorted states a sequence can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortState {
    /// Insertion order.
    #[default]
    Unsorted,
    /// Sorted by record key, shorter keys first.
    KeySorted,
    /// Sorted by cached name.
    NameSorted,
}

/// One element of a sequence.
#[derive(Debug, Clone, Default)]
pub struct SequenceEl {
    key: String,
    name: Option<String>,
    value: Option<PValue>,
}

impl SequenceEl {
    /// Creates an element for a record key with an optional payload.
    #[must_use]
    pub fn new(key: &str, value: Option<PValue>) -> Self {
        SequenceEl {
            key: key.to_string(),
            name: None,
            value,
        }
    }

    /// Returns the record key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the cached name, set by a name sort.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the payload.
    #[must_use]
    pub fn value(&self) -> Option<&PValue> {
        self.value.as_ref()
    }
}

/// An ordered, possibly duplicating collection of record references.
#[derive(Debug, Clone, Default)]
pub struct Sequence {
    elements: Vec<SequenceEl>,
    sort: SortState,
}

impl Sequence {
    /// Creates an empty sequence.
    #[must_use]
    pub fn new() -> Self {
        Sequence::default()
    }

    /// Returns the number of elements, duplicates included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns true if the sequence has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Returns the current sort state.
    #[must_use]
    pub fn sort_state(&self) -> SortState {
        self.sort
    }

    /// Appends an element for `key`. Duplicates are permitted; the sequence
    /// becomes unsorted.
    pub fn append(&mut self, key: &str, value: Option<PValue>) {
        self.elements.push(SequenceEl::new(key, value));
        self.sort = SortState::Unsorted;
    }

    /// Appends an already built element.
    pub fn append_element(&mut self, element: SequenceEl) {
        self.elements.push(element);
        self.sort = SortState::Unsorted;
    }

    /// Appends every element of another sequence.
    pub fn append_sequence(&mut self, other: &Sequence) {
        self.elements.extend(other.elements.iter().cloned());
        self.sort = SortState::Unsorted;
    }

    /// Returns true if some element has the given key. Linear scan.
    #[must_use]
    pub fn is_in(&self, key: &str) -> bool {
        self.elements.iter().any(|el| el.key == key)
    }

    /// Removes the earliest element with the given key. Returns false when
    /// no element has it.
    pub fn remove_first(&mut self, key: &str) -> bool {
        match self.elements.iter().position(|el| el.key == key) {
            Some(index) => {
                self.elements.remove(index);
                true
            }
            None => false,
        }
    }

    /// Returns the element at `index`.
    #[must_use]
    pub fn element(&self, index: usize) -> Option<&SequenceEl> {
        self.elements.get(index)
    }

    /// Iterates the elements in their current order.
    pub fn iter(&self) -> std::slice::Iter<'_, SequenceEl> {
        self.elements.iter()
    }

    /// Iterates the record keys in their current order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().map(|el| el.key.as_str())
    }

    /// Stable-sorts the elements by record key, shorter keys first.
    pub fn key_sort(&mut self) {
        if self.sort == SortState::KeySorted {
            return;
        }
        self.elements
            .sort_by(|a, b| compare_record_keys(&a.key, &b.key));
        self.sort = SortState::KeySorted;
    }

    /// Resolves and caches each element's person name, then stable-sorts by
    /// name. Elements that do not resolve to persons sort with an empty
    /// name.
    pub fn name_sort(&mut self, database: &Database) {
        for el in &mut self.elements {
            let name = database
                .person(&el.key)
                .and_then(|person| {
                    let name = person.find_child(person.root(), "NAME")?;
                    person.value(name).map(str::to_string)
                })
                .unwrap_or_default();
            el.name = Some(name);
        }
        self.elements.sort_by(|a, b| {
            compare_names(a.name.as_deref().unwrap_or(""), b.name.as_deref().unwrap_or(""))
        });
        self.sort = SortState::NameSorted;
    }

    /// Returns a new sequence holding the first occurrence of each key, in
    /// the order of this sequence.
    #[must_use]
    pub fn unique(&self) -> Sequence {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut out = Sequence::new();
        for el in &self.elements {
            if seen.insert(el.key.as_str()) {
                out.elements.push(el.clone());
            }
        }
        out.sort = self.sort;
        out
    }

    /// Collapses adjacent elements with equal keys. Callers sort first for
    /// a full deduplication.
    pub fn unique_in_place(&mut self) {
        self.elements.dedup_by(|a, b| a.key == b.key);
    }

    /// Renders every record of the sequence as GEDCOM text.
    #[must_use]
    pub fn to_gedcom(&self, database: &Database) -> String {
        let writer = GedcomWriter::new();
        let mut out = String::new();
        for el in &self.elements {
            if let Some(record) = database.record(&el.key) {
                out.push_str(&writer.record_to_string(record));
            }
        }
        out
    }
}

impl<'a> IntoIterator for &'a Sequence {
    type Item = &'a SequenceEl;
    type IntoIter = std::slice::Iter<'a, SequenceEl>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

fn sorted_unique_keys(sequence: &Sequence) -> Vec<&str> {
    let mut keys: Vec<&str> = sequence.keys().collect();
    keys.sort_by(|a, b| compare_record_keys(a, b));
    keys.dedup();
    keys
}

/// Returns the union of two sequences as sets of keys, in key order.
#[must_use]
pub fn union_sequence(a: &Sequence, b: &Sequence) -> Sequence {
    let keys_a = sorted_unique_keys(a);
    let keys_b = sorted_unique_keys(b);
    let mut out = Sequence::new();
    let (mut i, mut j) = (0, 0);
    while i < keys_a.len() || j < keys_b.len() {
        let next = match (keys_a.get(i), keys_b.get(j)) {
            (Some(&x), Some(&y)) => match compare_record_keys(x, y) {
                std::cmp::Ordering::Less => {
                    i += 1;
                    x
                }
                std::cmp::Ordering::Greater => {
                    j += 1;
                    y
                }
                std::cmp::Ordering::Equal => {
                    i += 1;
                    j += 1;
                    x
                }
            },
            (Some(&x), None) => {
                i += 1;
                x
            }
            (None, Some(&y)) => {
                j += 1;
                y
            }
            (None, None) => break,
        };
        out.append(next, None);
    }
    out.sort = SortState::KeySorted;
    out
}

/// Returns the intersection of two sequences as sets of keys, in key order.
#[must_use]
pub fn intersect_sequence(a: &Sequence, b: &Sequence) -> Sequence {
    let keys_b: HashSet<&str> = b.keys().collect();
    let mut out = Sequence::new();
    for key in sorted_unique_keys(a) {
        if keys_b.contains(key) {
            out.append(key, None);
        }
    }
    out.sort = SortState::KeySorted;
    out
}

/// Returns the elements of `a` whose keys are not in `b`, in key order.
#[must_use]
pub fn difference_sequence(a: &Sequence, b: &Sequence) -> Sequence {
    let keys_b: HashSet<&str> = b.keys().collect();
    let mut out = Sequence::new();
    for key in sorted_unique_keys(a) {
        if !keys_b.contains(key) {
            out.append(key, None);
        }
    }
    out.sort = SortState::KeySorted;
    out
}

/// Returns the one-step child expansion: every child of every FAMS family
/// of every person in the sequence, each appearing once.
#[must_use]
pub fn child_sequence(database: &Database, sequence: &Sequence) -> Sequence {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Sequence::new();
    for key in sequence.keys() {
        let Some(person) = database.person(key) else {
            continue;
        };
        for family in lineage::families_as_spouse(database, person) {
            for child in lineage::child_keys(family) {
                if seen.insert(child.to_string()) {
                    out.append(child, None);
                }
            }
        }
    }
    out
}

/// Returns the one-step parent expansion: every HUSB and WIFE of every FAMC
/// family of every person in the sequence, each appearing once.
#[must_use]
pub fn parent_sequence(database: &Database, sequence: &Sequence) -> Sequence {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Sequence::new();
    for key in sequence.keys() {
        let Some(person) = database.person(key) else {
            continue;
        };
        for family in lineage::families_as_child(database, person) {
            for parent in lineage::husband_keys(family).chain(lineage::wife_keys(family)) {
                if seen.insert(parent.to_string()) {
                    out.append(parent, None);
                }
            }
        }
    }
    out
}

/// Returns the one-step spouse expansion of a sequence.
#[must_use]
pub fn spouse_sequence(database: &Database, sequence: &Sequence) -> Sequence {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Sequence::new();
    for key in sequence.keys() {
        let Some(person) = database.person(key) else {
            continue;
        };
        for (spouse, _) in lineage::spouses(database, person) {
            let Some(spouse_key) = spouse.key() else {
                continue;
            };
            if seen.insert(spouse_key.to_string()) {
                out.append(spouse_key, None);
            }
        }
    }
    out
}

/// Returns the sibling expansion: the other children of each person's first
/// FAMC family. With `close` the persons themselves are included.
#[must_use]
pub fn sibling_sequence(database: &Database, sequence: &Sequence, close: bool) -> Sequence {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Sequence::new();
    for key in sequence.keys() {
        let Some(person) = database.person(key) else {
            continue;
        };
        if close && seen.insert(key.to_string()) {
            out.append(key, None);
        }
        let Some(family) = lineage::person_to_family_as_child(database, person) else {
            continue;
        };
        for sibling in lineage::child_keys(family) {
            if sibling == key && !close {
                continue;
            }
            if seen.insert(sibling.to_string()) {
                out.append(sibling, None);
            }
        }
    }
    out
}

/// Returns the smallest sequence containing every person reachable from the
/// input via FAMC→HUSB/WIFE edges. The inputs themselves are excluded
/// unless `close` is true.
#[must_use]
pub fn ancestor_sequence(database: &Database, sequence: &Sequence, close: bool) -> Sequence {
    closure_sequence(database, sequence, close, parents_of)
}

/// Returns the smallest sequence containing every person reachable from the
/// input via FAMS→CHIL edges. The inputs themselves are excluded unless
/// `close` is true.
#[must_use]
pub fn descendent_sequence(database: &Database, sequence: &Sequence, close: bool) -> Sequence {
    closure_sequence(database, sequence, close, children_of)
}

fn parents_of(database: &Database, key: &str) -> Vec<String> {
    let Some(person) = database.person(key) else {
        return Vec::new();
    };
    lineage::families_as_child(database, person)
        .flat_map(|family| {
            lineage::husband_keys(family)
                .chain(lineage::wife_keys(family))
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect()
}

fn children_of(database: &Database, key: &str) -> Vec<String> {
    let Some(person) = database.person(key) else {
        return Vec::new();
    };
    lineage::families_as_spouse(database, person)
        .flat_map(|family| lineage::child_keys(family).map(str::to_string).collect::<Vec<_>>())
        .collect()
}

fn closure_sequence(
    database: &Database,
    sequence: &Sequence,
    close: bool,
    step: fn(&Database, &str) -> Vec<String>,
) -> Sequence {
    let mut out = Sequence::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<String> = VecDeque::new();
    for key in sequence.keys() {
        if visited.insert(key.to_string()) {
            if close {
                out.append(key, None);
            }
            queue.push_back(key.to_string());
        }
    }
    while let Some(key) = queue.pop_front() {
        for next in step(database, &key) {
            if visited.insert(next.clone()) {
                out.append(&next, None);
                queue.push_back(next);
            }
        }
    }
    out
}

/// Returns the sequence of persons whose name matches the query name: the
/// name-key entry filtered by relaxed piece matching.
#[must_use]
pub fn name_to_sequence(name: &str, database: &Database) -> Sequence {
    let mut out = Sequence::new();
    let Some(keys) = database.name_index().search(name) else {
        return out;
    };
    for key in keys {
        let Some(person) = database.person(key) else {
            continue;
        };
        let matched = person
            .tagged_run(person.root(), "NAME")
            .filter_map(|id| person.value(id))
            .any(|candidate| exact_match(name, candidate));
        if matched {
            out.append(key, None);
        }
    }
    out.key_sort();
    out
}

/// Returns a sequence holding the record a user reference maps to, if any.
#[must_use]
pub fn refn_to_sequence(refn: &str, database: &Database) -> Sequence {
    let mut out = Sequence::new();
    if let Some(key) = database.refn_index().search(refn) {
        out.append(key, None);
    }
    out
}
