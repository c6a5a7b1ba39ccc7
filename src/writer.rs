//! GEDCOM emission.
//!
//! Record trees are written by pre-order traversal, one `level [key] tag
//! [value]` line per node. Output is unindented by default; an optional
//! indentation flag is provided for human inspection.

use std::fmt::Write;

use crate::node::{NodeId, Record};

/// Configuration options for GEDCOM writing.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Line ending to use (default: `"\n"`).
    pub line_ending: String,
    /// Whether to indent nested lines with two spaces per level.
    pub indent: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            line_ending: "\n".to_string(),
            indent: false,
        }
    }
}

/// A writer for serializing records back to GEDCOM format.
///
/// # Example
///
/// ```rust
/// use gedbase::{parser, writer::GedcomWriter, ErrorLog};
///
/// let mut log = ErrorLog::new();
/// let record = parser::record_from_string("0 @I1@ INDI\n1 NAME John /Doe/\n", &mut log).unwrap();
/// let text = GedcomWriter::new().record_to_string(&record);
/// assert_eq!(text, "0 @I1@ INDI\n1 NAME John /Doe/\n");
/// ```
#[derive(Debug, Clone, Default)]
pub struct GedcomWriter {
    config: WriterConfig,
}

impl GedcomWriter {
    /// Creates a new `GedcomWriter` with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a custom line ending.
    #[must_use]
    pub fn line_ending(mut self, ending: &str) -> Self {
        self.config.line_ending = ending.to_string();
        self
    }

    /// Sets whether nested lines are indented.
    #[must_use]
    pub fn indent(mut self, indent: bool) -> Self {
        self.config.indent = indent;
        self
    }

    /// Returns the current writer configuration.
    #[must_use]
    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    /// Writes a whole record, one line per node in pre-order.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying writer fails.
    pub fn write_record<W: Write>(&self, writer: &mut W, record: &Record) -> std::fmt::Result {
        for id in record.traverse() {
            self.write_node(writer, record, id)?;
        }
        Ok(())
    }

    /// Writes a single node line.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying writer fails.
    pub fn write_node<W: Write>(
        &self,
        writer: &mut W,
        record: &Record,
        id: NodeId,
    ) -> std::fmt::Result {
        let level = record.level(id);
        if self.config.indent {
            for _ in 1..level {
                writer.write_str("  ")?;
            }
        }
        write!(writer, "{level}")?;
        if let Some(key) = record.node_key(id) {
            write!(writer, " {key}")?;
        }
        write!(writer, " {}", record.tag(id))?;
        if let Some(value) = record.value(id) {
            write!(writer, " {value}")?;
        }
        writer.write_str(&self.config.line_ending)
    }

    /// Returns a record rendered as a GEDCOM string.
    #[must_use]
    pub fn record_to_string(&self, record: &Record) -> String {
        let mut out = String::new();
        self.write_record(&mut out, record)
            .expect("writing to a String cannot fail");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errlog::ErrorLog;
    use crate::parser::record_from_string;

    fn parse(source: &str) -> Record {
        let mut log = ErrorLog::new();
        record_from_string(source, &mut log).expect("well-formed record")
    }

    #[test]
    fn test_write_person_record() {
        let rec = parse("0 @I1@ INDI\n1 NAME John /Smith/\n1 SEX M\n");
        let text = GedcomWriter::new().record_to_string(&rec);
        assert_eq!(text, "0 @I1@ INDI\n1 NAME John /Smith/\n1 SEX M\n");
    }

    #[test]
    fn test_round_trip_is_identity_on_canonical_text() {
        let source = "0 @I1@ INDI\n1 BIRT\n2 DATE 1 JAN 1900\n2 PLAC Boston\n1 DEAT\n";
        let rec = parse(source);
        assert_eq!(GedcomWriter::new().record_to_string(&rec), source);
    }

    #[test]
    fn test_parse_of_emitted_text_is_structurally_equal() {
        let rec = parse("0 @F1@ FAM\n1 HUSB @I1@\n1 WIFE @I2@\n1 CHIL @I3@\n");
        let text = GedcomWriter::new().record_to_string(&rec);
        let reparsed = parse(&text);
        assert_eq!(rec, reparsed);
    }

    #[test]
    fn test_indented_output() {
        let rec = parse("0 @I1@ INDI\n1 BIRT\n2 DATE 1900\n");
        let text = GedcomWriter::new().indent(true).record_to_string(&rec);
        assert_eq!(text, "0 @I1@ INDI\n1 BIRT\n  2 DATE 1900\n");
    }

    #[test]
    fn test_custom_line_ending() {
        let rec = parse("0 @I1@ INDI\n");
        let text = GedcomWriter::new().line_ending("\r\n").record_to_string(&rec);
        assert_eq!(text, "0 @I1@ INDI\r\n");
    }
}
