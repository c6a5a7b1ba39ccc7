//! GEDCOM name handling.
//!
//! A GEDCOM name keeps its surname between slashes, e.g. `John /Smith/ Jr`.
//! This module extracts name parts, computes the 5-character phonetic name
//! key used by the name index, compares names for sorting, and implements
//! the relaxed piece matching used when searching by partial name.

use std::cmp::Ordering;

/// The sentinel surname used when a name has no usable surname.
const NO_SURNAME: &str = "____";

/// Returns the surname part of a GEDCOM name: the text between the slashes,
/// trailing whitespace stripped. `None` when there is no slash, or the
/// surname is empty or does not start with a letter.
#[must_use]
pub fn surname(name: &str) -> Option<String> {
    let after_slash = &name[name.find('/')? + 1..];
    let trimmed = after_slash.trim_start();
    let first = trimmed.chars().next()?;
    if first == '/' || !first.is_ascii_alphabetic() {
        return None;
    }
    let end = trimmed.find('/').unwrap_or(trimmed.len());
    Some(trimmed[..end].trim_end().to_string())
}

/// Returns the first initial of the given-name portion, uppercased. `None`
/// when the name has no usable given-name letter.
#[must_use]
pub fn first_initial(name: &str) -> Option<char> {
    let mut rest = name;
    loop {
        rest = rest.trim_start();
        let c = rest.chars().next()?;
        if c.is_ascii_alphabetic() {
            return Some(c.to_ascii_uppercase());
        }
        if c != '/' {
            return None;
        }
        // Skip the slash-delimited surname and keep scanning.
        let after = &rest[1..];
        let close = after.find('/')?;
        rest = &after[close + 1..];
    }
}

/// Returns the classical 4-character Soundex code of a surname: the first
/// letter followed by three digits. An unusable surname codes as `Z999`.
#[must_use]
pub fn soundex(surname: &str) -> String {
    let first = surname.chars().next();
    let Some(first) = first.filter(char::is_ascii_alphabetic) else {
        return "Z999".to_string();
    };
    if surname == NO_SURNAME {
        return "Z999".to_string();
    }

    let mut code = String::with_capacity(4);
    code.push(first.to_ascii_uppercase());
    let mut previous = 0u8;
    for c in surname.chars().skip(1) {
        if code.len() >= 4 {
            break;
        }
        let digit = soundex_code(c.to_ascii_uppercase());
        if digit == 0 {
            previous = 0;
            continue;
        }
        if digit == previous {
            continue;
        }
        previous = digit;
        code.push(char::from(b'0' + digit));
    }
    while code.len() < 4 {
        code.push('0');
    }
    code
}

fn soundex_code(letter: char) -> u8 {
    match letter {
        'B' | 'P' | 'F' | 'V' => 1,
        'C' | 'S' | 'K' | 'G' | 'J' | 'Q' | 'X' | 'Z' => 2,
        'D' | 'T' => 3,
        'L' => 4,
        'M' | 'N' => 5,
        'R' => 6,
        _ => 0,
    }
}

/// Computes the 5-character name key: the first initial (`$` when absent)
/// followed by the Soundex of the surname (`Z999` when absent).
#[must_use]
pub fn name_to_name_key(name: &str) -> String {
    let mut key = String::with_capacity(5);
    key.push(first_initial(name).unwrap_or('$'));
    match surname(name) {
        Some(s) => key.push_str(&soundex(&s)),
        None => key.push_str("Z999"),
    }
    key
}

/// Returns the given-name words of a GEDCOM name (everything outside the
/// slashes), joined by single spaces.
#[must_use]
pub fn given_names(name: &str) -> String {
    pieces(name).join(" ")
}

/// Returns the given-name "pieces" of a name: the whitespace-delimited words
/// outside the slash-delimited surname, in order, case preserved.
#[must_use]
pub fn pieces(name: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut rest = name;
    loop {
        rest = rest.trim_start();
        let Some(c) = rest.chars().next() else {
            return words;
        };
        if c == '/' {
            let after = &rest[1..];
            match after.find('/') {
                Some(close) => {
                    rest = &after[close + 1..];
                    continue;
                }
                None => return words,
            }
        }
        let end = rest
            .find(|c: char| c.is_whitespace() || c == '/')
            .unwrap_or(rest.len());
        words.push(rest[..end].to_string());
        rest = &rest[end..];
    }
}

/// Compares two GEDCOM names for sorting: by surname, then first initial,
/// then word-by-word given-name pieces, a longer piece list sorting after an
/// equal prefix.
#[must_use]
pub fn compare_names(name1: &str, name2: &str) -> Ordering {
    let surname1 = surname(name1).unwrap_or_else(|| NO_SURNAME.to_string());
    let surname2 = surname(name2).unwrap_or_else(|| NO_SURNAME.to_string());
    let by_surname = surname1.cmp(&surname2);
    if by_surname != Ordering::Equal {
        return by_surname;
    }
    let initial1 = first_initial(name1).unwrap_or('$');
    let initial2 = first_initial(name2).unwrap_or('$');
    let by_initial = initial1.cmp(&initial2);
    if by_initial != Ordering::Equal {
        return by_initial;
    }
    let pieces1 = pieces(name1);
    let pieces2 = pieces(name2);
    for (a, b) in pieces1.iter().zip(pieces2.iter()) {
        let by_piece = a.cmp(b);
        if by_piece != Ordering::Equal {
            return by_piece;
        }
    }
    pieces1.len().cmp(&pieces2.len())
}

/// Reduces a name to its uppercase letter-only words. Slashes and whitespace
/// separate words; all non-letters are dropped.
#[must_use]
pub fn squeeze(name: &str) -> Vec<String> {
    name.split(|c: char| c.is_whitespace() || c == '/')
        .map(|word| {
            word.chars()
                .filter(char::is_ascii_alphabetic)
                .map(|c| c.to_ascii_uppercase())
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect()
}

/// Matches a partial word against a complete word: the first letters must be
/// equal and the remaining letters of the partial must appear in the
/// complete word as a subsequence.
#[must_use]
pub fn piece_match(partial: &str, complete: &str) -> bool {
    let mut partial_chars = partial.chars();
    let mut complete_chars = complete.chars();
    match (partial_chars.next(), complete_chars.next()) {
        (Some(p), Some(c)) if p == c => (),
        _ => return false,
    }
    let mut want = partial_chars.next();
    for c in complete_chars {
        match want {
            None => break,
            Some(w) if w == c => want = partial_chars.next(),
            Some(_) => (),
        }
    }
    want.is_none()
}

/// Checks whether a partial name matches a complete name: after squeezing
/// both, every word of the partial must piece-match some word of the
/// complete, in order.
#[must_use]
pub fn exact_match(partial: &str, complete: &str) -> bool {
    let partial_words = squeeze(partial);
    let complete_words = squeeze(complete);
    let mut start = 0;
    for word in &partial_words {
        let mut matched = false;
        for (offset, candidate) in complete_words[start..].iter().enumerate() {
            if piece_match(word, candidate) {
                start += offset + 1;
                matched = true;
                break;
            }
        }
        if !matched {
            return false;
        }
    }
    true
}

/// Removes the slashes from a GEDCOM name, e.g. `John /Smith/` becomes
/// `John Smith`.
#[must_use]
pub fn name_string(name: &str) -> String {
    let stripped: String = name.chars().filter(|&c| c != '/').collect();
    stripped.trim_end().to_string()
}

/// Converts a name to surname-first form, e.g. `Smith, John`.
#[must_use]
pub fn surname_first(name: &str) -> String {
    let surname = surname(name).unwrap_or_else(|| NO_SURNAME.to_string());
    format!("{}, {}", surname, given_names(name))
}

/// Uppercases the surname of a GEDCOM name, leaving the rest untouched.
#[must_use]
pub fn upsurname(name: &str) -> String {
    let Some(open) = name.find('/') else {
        return name.to_string();
    };
    let after = &name[open + 1..];
    let close = after.find('/').map_or(name.len(), |c| open + 1 + c);
    let mut out = String::with_capacity(name.len());
    out.push_str(&name[..=open]);
    out.push_str(&name[open + 1..close].to_uppercase());
    out.push_str(&name[close..]);
    out
}

/// Trims a name to at most `max` characters of display form, never shorter
/// than the first initial plus the surname. Given names are reduced to
/// initials from the right, then dropped entirely.
#[must_use]
pub fn trim_name(name: &str, max: usize) -> String {
    let mut parts = name_to_parts(name);
    let joined = parts.join(" ");
    if joined.len() <= max + 2 {
        return joined;
    }
    let Some(surname_index) = parts.iter().position(|p| p.starts_with('/')) else {
        return joined;
    };
    for i in (0..surname_index).rev() {
        parts[i].truncate(1);
        let joined = join_parts(&parts);
        if joined.len() <= max + 2 {
            return joined;
        }
    }
    for i in (1..surname_index).rev() {
        parts[i].clear();
        let joined = join_parts(&parts);
        if joined.len() <= max + 2 {
            return joined;
        }
    }
    for i in ((surname_index + 1)..parts.len()).rev() {
        parts[i].clear();
        let joined = join_parts(&parts);
        if joined.len() <= max + 2 {
            return joined;
        }
    }
    join_parts(&parts)
}

/// Converts a name to display form: optionally uppercased surname, trimmed
/// to `max` characters, either in regular order (`John Smith`) or surname
/// first (`Smith, John`).
#[must_use]
pub fn manipulate_name(name: &str, caps: bool, regular_order: bool, max: usize) -> String {
    if name.is_empty() {
        return String::new();
    }
    let name = if caps {
        upsurname(name)
    } else {
        name.to_string()
    };
    let trimmed = trim_name(&name, if regular_order { max } else { max.saturating_sub(1) });
    let mut display = if regular_order {
        name_string(&trimmed)
    } else {
        surname_first(&trimmed)
    };
    display.truncate(max);
    display
}

fn name_to_parts(name: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut rest = name.trim_start();
    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix('/') {
            match after.find('/') {
                Some(close) => {
                    parts.push(format!("/{}/", &after[..close]));
                    rest = after[close + 1..].trim_start();
                }
                None => {
                    parts.push(format!("/{after}"));
                    rest = "";
                }
            }
        } else {
            let end = rest
                .find(|c: char| c.is_whitespace() || c == '/')
                .unwrap_or(rest.len());
            parts.push(rest[..end].to_string());
            rest = rest[end..].trim_start();
        }
    }
    parts
}

fn join_parts(parts: &[String]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surname_extraction() {
        assert_eq!(surname("John /Smith/").as_deref(), Some("Smith"));
        assert_eq!(surname("John /Van Cott/ Jr").as_deref(), Some("Van Cott"));
        assert_eq!(surname("John"), None);
        assert_eq!(surname("John //"), None);
        assert_eq!(surname("John /1st/"), None);
    }

    #[test]
    fn test_first_initial() {
        assert_eq!(first_initial("john /Smith/"), Some('J'));
        assert_eq!(first_initial("/Smith/ Anna"), Some('A'));
        assert_eq!(first_initial("/Smith/"), None);
        assert_eq!(first_initial(""), None);
    }

    #[test]
    fn test_soundex_known_codes() {
        assert_eq!(soundex("Smith"), "S530");
        assert_eq!(soundex("Robert"), "R163");
        assert_eq!(soundex("Rupert"), "R163");
        assert_eq!(soundex("Ashcraft"), "A226");
        assert_eq!(soundex("Lee"), "L000");
        assert_eq!(soundex("____"), "Z999");
        assert_eq!(soundex(""), "Z999");
    }

    #[test]
    fn test_soundex_shape() {
        for surname in ["Wetmore", "O'Brien", "de la Cruz", "Q"] {
            let code = soundex(surname);
            assert_eq!(code.len(), 4);
            assert!(code.chars().next().unwrap().is_ascii_uppercase());
            assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_name_key() {
        assert_eq!(name_to_name_key("John /Smith/"), "JS530");
        assert_eq!(name_to_name_key("/Smith/"), "$S530");
        assert_eq!(name_to_name_key("John"), "JZ999");
        assert_eq!(name_to_name_key("").len(), 5);
    }

    #[test]
    fn test_given_names() {
        assert_eq!(given_names("John Quincy /Adams/ Jr"), "John Quincy Jr");
        assert_eq!(given_names("/Adams/"), "");
    }

    #[test]
    fn test_compare_names_orders_by_surname_first() {
        assert_eq!(
            compare_names("Zed /Adams/", "Ann /Brown/"),
            Ordering::Less
        );
        assert_eq!(
            compare_names("Ann /Smith/", "Zed /Smith/"),
            Ordering::Less
        );
        assert_eq!(
            compare_names("Ann /Smith/", "Ann /Smith/"),
            Ordering::Equal
        );
        // Equal prefix, longer piece list sorts after.
        assert_eq!(
            compare_names("Ann /Smith/", "Ann Beth /Smith/"),
            Ordering::Less
        );
    }

    #[test]
    fn test_piece_match_is_subsequence_from_first_letter() {
        assert!(piece_match("JN", "JOHN"));
        assert!(piece_match("JOHN", "JOHN"));
        assert!(!piece_match("OHN", "JOHN"));
        assert!(!piece_match("JOHNX", "JOHN"));
    }

    #[test]
    fn test_exact_match() {
        assert!(exact_match("J /Smith/", "John /Smith/"));
        assert!(exact_match("John", "John Quincy /Smith/"));
        assert!(!exact_match("Jane /Smith/", "John /Smith/"));
        // Words must match in order.
        assert!(exact_match("John Q", "John Quincy /Smith/"));
        assert!(!exact_match("Q John", "John Quincy /Smith/"));
    }

    #[test]
    fn test_exact_match_advances_past_matched_words() {
        // One complete word cannot satisfy two partial words.
        assert!(!exact_match("Q Q", "Quincy /Smith/"));
        assert!(!exact_match("John John", "John /Smith/"));
        // Distinct complete words with the same initial still match in
        // order.
        assert!(exact_match("J J", "John James /Smith/"));
    }

    #[test]
    fn test_name_string_and_surname_first() {
        assert_eq!(name_string("John /Smith/"), "John Smith");
        assert_eq!(surname_first("John /Smith/"), "Smith, John");
    }

    #[test]
    fn test_upsurname() {
        assert_eq!(upsurname("John /Smith/ Jr"), "John /SMITH/ Jr");
        assert_eq!(upsurname("John"), "John");
    }

    #[test]
    fn test_trim_name_reduces_given_names_to_initials() {
        let trimmed = trim_name("Jonathan Edward /Smith/", 14);
        assert!(trimmed.len() <= 16);
        assert!(trimmed.contains("/Smith/"));
    }

    #[test]
    fn test_manipulate_name() {
        assert_eq!(
            manipulate_name("John /Smith/", true, true, 30),
            "John SMITH"
        );
        assert_eq!(
            manipulate_name("John /Smith/", false, false, 30),
            "Smith, John"
        );
        assert_eq!(manipulate_name("", true, true, 30), "");
    }
}
