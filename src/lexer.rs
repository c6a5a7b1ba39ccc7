//! The GEDCOM line lexer.
//!
//! Each non-blank source line is broken into `level [key] tag [value]`
//! fields. Errors are reported into the caller's [`ErrorLog`] and the lexer
//! continues with the next line, so one pass collects every syntax problem
//! in a file.

use crate::errlog::{Diagnostic, DiagnosticKind, ErrorLog};

/// Maximum accepted length of a GEDCOM line in bytes.
pub const MAX_LINE_LEN: usize = 4096;

/// One lexed GEDCOM line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatLine {
    /// 1-based line number in the source.
    pub line_no: usize,
    /// The level number at the start of the line.
    pub level: u32,
    /// The optional `@...@` cross-reference key, `@` signs included.
    pub key: Option<String>,
    /// The tag.
    pub tag: String,
    /// Everything after the single separator space following the tag,
    /// verbatim.
    pub value: Option<String>,
}

/// Breaks one line into fields. The caller strips trailing whitespace and
/// skips blank lines; an empty line reaching this function is an error.
///
/// # Errors
///
/// Returns a message describing the first problem found in the line.
pub fn extract_fields(line: &str) -> Result<(u32, Option<String>, String, Option<String>), String> {
    if line.is_empty() {
        return Err("Empty line.".to_string());
    }
    if line.len() > MAX_LINE_LEN {
        return Err("Gedcom line is too long.".to_string());
    }

    let mut rest = line.trim_start_matches(is_linear_whitespace);

    // Level.
    let digits = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if digits == 0 {
        return Err("Line does not begin with a level.".to_string());
    }
    let mut level: u32 = 0;
    for b in rest.as_bytes().iter().take(digits) {
        level = level.saturating_mul(10).saturating_add(u32::from(b - b'0'));
    }
    rest = rest[digits..].trim_start_matches(is_linear_whitespace);
    if rest.is_empty() {
        return Err("Gedcom line is incomplete.".to_string());
    }

    // Optional key.
    let mut key = None;
    if let Some(after_at) = rest.strip_prefix('@') {
        if after_at.starts_with('@') {
            return Err("Illegal key (@@).".to_string());
        }
        let Some(close) = after_at.find('@') else {
            return Err("Gedcom line is incomplete.".to_string());
        };
        key = Some(format!("@{}@", &after_at[..close]));
        rest = &after_at[close + 1..];
        if !rest.starts_with(' ') {
            return Err("There must be a space between the key and the tag.".to_string());
        }
        rest = rest.trim_start_matches(is_linear_whitespace);
    }

    // Tag.
    if rest.is_empty() {
        return Err("The line is incomplete.".to_string());
    }
    let tag_end = rest
        .find(is_linear_whitespace)
        .unwrap_or(rest.len());
    let tag = rest[..tag_end].to_string();
    rest = &rest[tag_end..];

    // Value: everything after a single separator space, verbatim.
    let value = if rest.is_empty() {
        None
    } else {
        let mut chars = rest.chars();
        chars.next();
        let v = chars.as_str();
        if v.is_empty() {
            None
        } else {
            Some(v.to_string())
        }
    };

    Ok((level, key, tag, value))
}

/// Lexes a whole GEDCOM source into flat lines.
///
/// Trailing whitespace is stripped, blank lines are skipped, and errors are
/// added to `log` while lexing continues with the next line.
#[must_use]
pub fn lex_string(source: &str, file: &str, log: &mut ErrorLog) -> Vec<FlatLine> {
    let mut lines = Vec::new();
    for (index, raw) in source.lines().enumerate() {
        let line_no = index + 1;
        let stripped = raw.trim_end();
        if stripped.trim_start().is_empty() {
            continue;
        }
        match extract_fields(stripped) {
            Ok((level, key, tag, value)) => lines.push(FlatLine {
                line_no,
                level,
                key,
                tag,
                value,
            }),
            Err(message) => {
                log.add(Diagnostic::new(DiagnosticKind::Syntax, file, line_no, message));
            }
        }
    }
    lines
}

fn is_linear_whitespace(c: char) -> bool {
    c.is_whitespace() && c != '\n'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_line() {
        let (level, key, tag, value) = extract_fields("1 NAME John /Smith/").unwrap();
        assert_eq!(level, 1);
        assert_eq!(key, None);
        assert_eq!(tag, "NAME");
        assert_eq!(value.as_deref(), Some("John /Smith/"));
    }

    #[test]
    fn test_line_with_key() {
        let (level, key, tag, value) = extract_fields("0 @I1@ INDI").unwrap();
        assert_eq!(level, 0);
        assert_eq!(key.as_deref(), Some("@I1@"));
        assert_eq!(tag, "INDI");
        assert_eq!(value, None);
    }

    #[test]
    fn test_multi_digit_level() {
        let (level, _, tag, _) = extract_fields("12 NOTE deep").unwrap();
        assert_eq!(level, 12);
        assert_eq!(tag, "NOTE");
    }

    #[test]
    fn test_value_keeps_internal_whitespace() {
        let (_, _, _, value) = extract_fields("1 NOTE two  spaces  kept").unwrap();
        assert_eq!(value.as_deref(), Some("two  spaces  kept"));
    }

    #[test]
    fn test_missing_level_is_error() {
        assert!(extract_fields("NAME no level").is_err());
    }

    #[test]
    fn test_level_only_is_error() {
        assert!(extract_fields("1").is_err());
        assert!(extract_fields("1   ").is_err());
    }

    #[test]
    fn test_empty_key_is_error() {
        assert!(extract_fields("0 @@ INDI").is_err());
    }

    #[test]
    fn test_unterminated_key_is_error() {
        assert!(extract_fields("0 @I1 INDI").is_err());
    }

    #[test]
    fn test_key_without_space_is_error() {
        assert!(extract_fields("0 @I1@INDI").is_err());
    }

    #[test]
    fn test_line_at_maximum_length_is_accepted() {
        let prefix = "1 NOTE ";
        let value = "x".repeat(MAX_LINE_LEN - prefix.len());
        let line = format!("{prefix}{value}");
        assert_eq!(line.len(), MAX_LINE_LEN);
        assert!(extract_fields(&line).is_ok());

        let too_long = format!("{line}x");
        assert!(extract_fields(&too_long).is_err());
    }

    #[test]
    fn test_lex_string_skips_blank_lines_and_collects_errors() {
        let source = "0 HEAD\n\n   \n1 GEDC\nbogus line\n0 TRLR\n";
        let mut log = ErrorLog::new();
        let lines = lex_string(source, "sample.ged", &mut log);

        let tags: Vec<&str> = lines.iter().map(|l| l.tag.as_str()).collect();
        assert_eq!(tags, ["HEAD", "GEDC", "TRLR"]);
        assert_eq!(log.len(), 1);
        assert_eq!(log.iter().next().unwrap().line, 5);
    }

    #[test]
    fn test_line_numbers_are_one_based() {
        let mut log = ErrorLog::new();
        let lines = lex_string("0 HEAD\n1 GEDC", "sample.ged", &mut log);
        assert_eq!(lines[0].line_no, 1);
        assert_eq!(lines[1].line_no, 2);
    }
}
