//! Character encoding detection for GEDCOM input.
//!
//! GEDCOM files in the wild arrive in several encodings. This module detects
//! the common cases and decodes the bytes to a `String` before lexing:
//!
//! - **UTF-8**, with or without BOM (the modern default)
//! - **UTF-16 LE/BE**, detected by BOM
//! - **windows-1252**, the fallback for legacy single-byte files

use encoding_rs::{UTF_16BE, UTF_16LE, WINDOWS_1252};

use crate::error::GedbaseError;

/// The encoding detected while decoding a GEDCOM byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEncoding {
    /// UTF-8, possibly with a BOM.
    Utf8,
    /// UTF-16 little endian, detected by BOM.
    Utf16Le,
    /// UTF-16 big endian, detected by BOM.
    Utf16Be,
    /// Legacy single-byte fallback.
    Windows1252,
}

impl std::fmt::Display for SourceEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceEncoding::Utf8 => write!(f, "UTF-8"),
            SourceEncoding::Utf16Le => write!(f, "UTF-16LE"),
            SourceEncoding::Utf16Be => write!(f, "UTF-16BE"),
            SourceEncoding::Windows1252 => write!(f, "windows-1252"),
        }
    }
}

/// Decodes raw GEDCOM bytes into text.
///
/// # Errors
///
/// Returns a `GedbaseError::Encoding` when a UTF-16 stream is malformed.
pub fn decode_bytes(bytes: &[u8]) -> Result<(String, SourceEncoding), GedbaseError> {
    if bytes.starts_with(&[0xFF, 0xFE]) {
        let (text, _, malformed) = UTF_16LE.decode(bytes);
        if malformed {
            return Err(GedbaseError::Encoding(
                "malformed UTF-16LE byte stream".to_string(),
            ));
        }
        return Ok((strip_bom(&text).to_string(), SourceEncoding::Utf16Le));
    }
    if bytes.starts_with(&[0xFE, 0xFF]) {
        let (text, _, malformed) = UTF_16BE.decode(bytes);
        if malformed {
            return Err(GedbaseError::Encoding(
                "malformed UTF-16BE byte stream".to_string(),
            ));
        }
        return Ok((strip_bom(&text).to_string(), SourceEncoding::Utf16Be));
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => Ok((strip_bom(text).to_string(), SourceEncoding::Utf8)),
        Err(_) => {
            let (text, _, _) = WINDOWS_1252.decode(bytes);
            Ok((text.into_owned(), SourceEncoding::Windows1252))
        }
    }
}

fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{FEFF}').unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_utf8() {
        let (text, encoding) = decode_bytes(b"0 HEAD\n0 TRLR\n").unwrap();
        assert_eq!(encoding, SourceEncoding::Utf8);
        assert!(text.starts_with("0 HEAD"));
    }

    #[test]
    fn test_utf8_bom_is_stripped() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"0 HEAD\n");
        let (text, encoding) = decode_bytes(&bytes).unwrap();
        assert_eq!(encoding, SourceEncoding::Utf8);
        assert!(text.starts_with("0 HEAD"));
    }

    #[test]
    fn test_utf16le_with_bom() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "0 HEAD\n".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let (text, encoding) = decode_bytes(&bytes).unwrap();
        assert_eq!(encoding, SourceEncoding::Utf16Le);
        assert_eq!(text, "0 HEAD\n");
    }

    #[test]
    fn test_latin1_fallback() {
        // "Mu\xF1oz" is not valid UTF-8.
        let bytes = b"0 HEAD\n1 NOTE Mu\xF1oz\n";
        let (text, encoding) = decode_bytes(bytes).unwrap();
        assert_eq!(encoding, SourceEncoding::Windows1252);
        assert!(text.contains("Muñoz"));
    }
}
