/*!
`gedbase` is an in-memory genealogical database engine.

The library reads GEDCOM (GEnealogical Data Communication) files into a tree
model of records, validates lineage integrity, builds indexes by key, by
phonetic name and by user reference, and exposes lineage navigation, a
sequence algebra over sets of records, and a small report scripting runtime
that operates on the loaded database.

Basic example:

```rust
use gedbase::{string_to_database, ErrorLog, GedcomWriter};

let source = "\
0 HEAD
0 @I1@ INDI
1 NAME John /Smith/
1 SEX M
0 TRLR
";

let mut log = ErrorLog::new();
let database = string_to_database(source, "sample.ged", &mut log).expect("clean import");

assert_eq!(database.num_persons(), 1);
assert_eq!(database.to_gedcom_string(&GedcomWriter::new()), source);
```

On a failed load no database is produced and the `ErrorLog` holds every
problem found, sorted by file and line for display.

This crate contains an optional `"json"` feature that derives serialization
for the diagnostic and classification types with [`serde`](https://serde.rs).
*/

#![deny(clippy::pedantic)]
#![warn(missing_docs)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod database;
pub mod encoding;
pub mod errlog;
pub mod error;
pub mod interp;
pub mod lexer;
pub mod lineage;
pub mod name;
pub mod node;
pub mod ops;
pub mod parser;
pub mod record;
pub mod sequence;
pub mod splitjoin;
pub mod tag;
pub mod writer;

pub use database::import::{
    gedcom_file_to_database, import_from_files, string_to_database,
};
pub use database::Database;
pub use errlog::{Diagnostic, DiagnosticKind, ErrorLog, Severity};
pub use error::GedbaseError;
pub use node::{NodeId, Record};
pub use record::{RecordKind, Sex};
pub use sequence::Sequence;
pub use writer::GedcomWriter;
