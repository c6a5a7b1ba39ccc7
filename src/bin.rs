use gedbase::{gedcom_file_to_database, ErrorLog, GedbaseError};
use std::env;
use std::fmt;
use std::process;

#[derive(Debug)]
enum CliError {
    Gedbase(GedbaseError),
    Usage(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CliError::Gedbase(err) => write!(f, "Load error: {err}"),
            CliError::Usage(msg) => write!(f, "Usage error: {msg}"),
        }
    }
}

impl From<GedbaseError> for CliError {
    fn from(err: GedbaseError) -> Self {
        CliError::Gedbase(err)
    }
}

fn main() {
    match run() {
        Ok(()) => {
            process::exit(0);
        }
        Err(e) => {
            let exit_code = match &e {
                CliError::Gedbase(_) => 1,
                CliError::Usage(_) => 2,
            };
            eprintln!("Error: {e}");
            process::exit(exit_code);
        }
    }
}

fn run() -> Result<(), CliError> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        return Err(CliError::Usage("Missing filename.".to_string()));
    }

    if args[1] == "--help" || args[1] == "-h" {
        println!("Usage: gedbase file.ged [file.ged ...]");
        println!("Loads each GEDCOM file into a database and prints its stats,");
        println!("or the collected error log when the file does not validate.");
        return Ok(());
    }

    let mut failed = ErrorLog::new();
    for path in &args[1..] {
        let mut log = ErrorLog::new();
        match gedcom_file_to_database(path, &mut log) {
            Some(database) => {
                database.stats();
            }
            None => {
                eprintln!("{path}: no database created, {} error(s):", log.len());
                eprint!("{log}");
                for diagnostic in &log {
                    failed.add(diagnostic.clone());
                }
            }
        }
    }
    if !failed.is_empty() {
        return Err(CliError::Gedbase(GedbaseError::Load(failed)));
    }
    Ok(())
}
