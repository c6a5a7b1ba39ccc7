//! Record classification and key handling.
//!
//! A record is a level-0 node and its subtree. Its kind is decided by the
//! root tag, and its identity by a cross-reference key of the form `@X...@`.

use std::cmp::Ordering;

#[cfg(feature = "json")]
use serde::{Deserialize, Serialize};

/// The kind of a GEDCOM record, classified by its root tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
pub enum RecordKind {
    /// An `INDI` record.
    Person,
    /// A `FAM` record.
    Family,
    /// A `SOUR` record.
    Source,
    /// An `EVEN` record.
    Event,
    /// The `HEAD` record; carries no key and is not indexed.
    Header,
    /// The `TRLR` record; carries no key and is not indexed.
    Trailer,
    /// Any other top-level tag.
    Other,
}

impl RecordKind {
    /// Classifies a root tag.
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "INDI" => RecordKind::Person,
            "FAM" => RecordKind::Family,
            "SOUR" => RecordKind::Source,
            "EVEN" => RecordKind::Event,
            "HEAD" => RecordKind::Header,
            "TRLR" => RecordKind::Trailer,
            _ => RecordKind::Other,
        }
    }

    /// Returns the type character used in generated keys.
    #[must_use]
    pub const fn key_char(self) -> char {
        match self {
            RecordKind::Person => 'I',
            RecordKind::Family => 'F',
            RecordKind::Source => 'S',
            RecordKind::Event => 'E',
            _ => 'X',
        }
    }
}

/// The sex of a person.
///
/// `Error` arises only from transient parses of an invalid SEX value; a
/// validated record never carries it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
pub enum Sex {
    /// A `SEX M` line.
    Male,
    /// A `SEX F` line.
    Female,
    /// A `SEX U` line or no SEX line at all.
    Unknown,
    /// A SEX line whose value is none of M, F or U.
    Error,
}

impl Sex {
    /// Parses a SEX line value.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "M" => Sex::Male,
            "F" => Sex::Female,
            "U" => Sex::Unknown,
            _ => Sex::Error,
        }
    }

    /// Returns true for a definite male or female value.
    #[must_use]
    pub const fn is_definite(self) -> bool {
        matches!(self, Sex::Male | Sex::Female)
    }

    /// Returns the opposite sex; `Unknown` for anything indefinite.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Sex::Male => Sex::Female,
            Sex::Female => Sex::Male,
            _ => Sex::Unknown,
        }
    }

    /// Returns the single-letter GEDCOM encoding. `Error` has none and maps
    /// to `U`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Sex::Male => "M",
            Sex::Female => "F",
            Sex::Unknown | Sex::Error => "U",
        }
    }
}

/// Returns true iff the value string is a valid SEX encoding.
#[must_use]
pub fn valid_sex_value(value: &str) -> bool {
    matches!(value, "M" | "F" | "U")
}

/// Returns true iff a string has the GEDCOM key shape: it begins and ends
/// with `@` and is at least three bytes long.
#[must_use]
pub fn is_key(s: &str) -> bool {
    s.len() >= 3 && s.starts_with('@') && s.ends_with('@')
}

/// Wraps a bare identifier in `@` signs.
#[must_use]
pub fn add_at(s: &str) -> String {
    format!("@{s}@")
}

/// Strips the `@` signs from both ends of a key. The input is not checked.
#[must_use]
pub fn remove_at(s: &str) -> &str {
    s.trim_start_matches('@').trim_end_matches('@')
}

/// Orders record keys: shorter keys sort before longer keys, ties broken
/// bytewise. This is the ordering of root lists and key-sorted sequences.
#[must_use]
pub fn compare_record_keys(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_kind_from_tag() {
        assert_eq!(RecordKind::from_tag("INDI"), RecordKind::Person);
        assert_eq!(RecordKind::from_tag("FAM"), RecordKind::Family);
        assert_eq!(RecordKind::from_tag("SOUR"), RecordKind::Source);
        assert_eq!(RecordKind::from_tag("EVEN"), RecordKind::Event);
        assert_eq!(RecordKind::from_tag("HEAD"), RecordKind::Header);
        assert_eq!(RecordKind::from_tag("TRLR"), RecordKind::Trailer);
        assert_eq!(RecordKind::from_tag("NOTE"), RecordKind::Other);
    }

    #[test]
    fn test_sex_parse() {
        assert_eq!(Sex::parse("M"), Sex::Male);
        assert_eq!(Sex::parse("F"), Sex::Female);
        assert_eq!(Sex::parse("U"), Sex::Unknown);
        assert_eq!(Sex::parse("male"), Sex::Error);
    }

    #[test]
    fn test_sex_opposite() {
        assert_eq!(Sex::Male.opposite(), Sex::Female);
        assert_eq!(Sex::Female.opposite(), Sex::Male);
        assert_eq!(Sex::Unknown.opposite(), Sex::Unknown);
    }

    #[test]
    fn test_is_key() {
        assert!(is_key("@I1@"));
        assert!(is_key("@X@"));
        assert!(!is_key("@@"));
        assert!(!is_key("I1"));
        assert!(!is_key("@I1"));
    }

    #[test]
    fn test_add_and_remove_at() {
        assert_eq!(add_at("I1"), "@I1@");
        assert_eq!(remove_at("@I1@"), "I1");
    }

    #[test]
    fn test_compare_record_keys_short_before_long() {
        assert_eq!(compare_record_keys("@I2@", "@I10@"), Ordering::Less);
        assert_eq!(compare_record_keys("@I10@", "@I2@"), Ordering::Greater);
        assert_eq!(compare_record_keys("@I1@", "@I2@"), Ordering::Less);
        assert_eq!(compare_record_keys("@I1@", "@I1@"), Ordering::Equal);
    }
}
