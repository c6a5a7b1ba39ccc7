use std::fmt;

use crate::errlog::ErrorLog;

/// Represents hard failures reported by the engine.
///
/// Diagnostics discovered while loading a GEDCOM file are collected in an
/// [`ErrorLog`] rather than raised; this enum is for the conditions that stop
/// an operation outright.
#[derive(Debug)]
pub enum GedbaseError {
    /// An I/O error.
    Io(std::io::Error),
    /// An encoding error while decoding a GEDCOM file.
    Encoding(String),
    /// A load failed; the log holds the collected diagnostics.
    Load(ErrorLog),
    /// A structural edit could not be applied.
    Edit(String),
    /// A fresh record key could not be generated.
    KeyGeneration(String),
}

impl fmt::Display for GedbaseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GedbaseError::Io(err) => write!(f, "IO error: {err}"),
            GedbaseError::Encoding(msg) => write!(f, "Encoding error: {msg}"),
            GedbaseError::Load(log) => {
                write!(f, "Load failed with {} error(s)", log.len())
            }
            GedbaseError::Edit(msg) => write!(f, "Edit error: {msg}"),
            GedbaseError::KeyGeneration(msg) => write!(f, "Key generation error: {msg}"),
        }
    }
}

impl std::error::Error for GedbaseError {}

impl From<std::io::Error> for GedbaseError {
    fn from(err: std::io::Error) -> Self {
        GedbaseError::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_io_error_display() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let err = GedbaseError::Io(io_err);
        assert_eq!(format!("{err}"), "IO error: File not found");
    }

    #[test]
    fn test_encoding_error_display() {
        let err = GedbaseError::Encoding("Invalid UTF-8 sequence".to_string());
        assert_eq!(format!("{err}"), "Encoding error: Invalid UTF-8 sequence");
    }

    #[test]
    fn test_edit_error_display() {
        let err = GedbaseError::Edit("child not in family".to_string());
        assert_eq!(format!("{err}"), "Edit error: child not in family");
    }
}
