//! The script runtime context.
//!
//! A context holds everything a running script sees: the loaded database,
//! the current output file, the global symbol table, the stack of call
//! frames, and the tables of user-defined procedures and functions.

use std::collections::HashMap;
use std::rc::Rc;

use crate::database::Database;
use crate::interp::output::ScriptOutput;
use crate::interp::pnode::Routine;
use crate::interp::pvalue::PValue;
use crate::interp::symtab::{Frame, SymbolTable};

/// The runtime state of a script.
#[derive(Debug)]
pub struct Context {
    /// The database the script operates on.
    pub database: Database,
    output: ScriptOutput,
    globals: SymbolTable,
    frames: Vec<Frame>,
    procedures: HashMap<String, Rc<Routine>>,
    functions: HashMap<String, Rc<Routine>>,
}

impl Context {
    /// Creates a context over a database, writing to stdout.
    #[must_use]
    pub fn new(database: Database) -> Self {
        Context::with_output(database, ScriptOutput::stdout())
    }

    /// Creates a context with a specific output destination.
    #[must_use]
    pub fn with_output(database: Database, output: ScriptOutput) -> Self {
        Context {
            database,
            output,
            globals: SymbolTable::new(),
            frames: Vec::new(),
            procedures: HashMap::new(),
            functions: HashMap::new(),
        }
    }

    /// Consumes the context, returning the database intact.
    #[must_use]
    pub fn into_database(self) -> Database {
        self.database
    }

    /// Returns the script output.
    pub fn output(&mut self) -> &mut ScriptOutput {
        &mut self.output
    }

    /// Replaces the script output, flushing the old one.
    pub fn set_output(&mut self, output: ScriptOutput) {
        self.output.flush();
        self.output = output;
    }

    /// Registers a user-defined procedure.
    pub fn define_procedure(&mut self, routine: Routine) {
        self.procedures
            .insert(routine.name.clone(), Rc::new(routine));
    }

    /// Registers a user-defined function.
    pub fn define_function(&mut self, routine: Routine) {
        self.functions.insert(routine.name.clone(), Rc::new(routine));
    }

    /// Looks up a user-defined procedure.
    #[must_use]
    pub fn procedure(&self, name: &str) -> Option<Rc<Routine>> {
        self.procedures.get(name).cloned()
    }

    /// Looks up a user-defined function.
    #[must_use]
    pub fn function(&self, name: &str) -> Option<Rc<Routine>> {
        self.functions.get(name).cloned()
    }

    /// Pushes a call frame.
    pub fn push_frame(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    /// Pops the top call frame.
    pub fn pop_frame(&mut self) {
        self.frames.pop();
    }

    /// Returns the call depth.
    #[must_use]
    pub fn frame_depth(&self) -> usize {
        self.frames.len()
    }

    /// Looks an identifier up: the current frame's table first, then the
    /// global table.
    #[must_use]
    pub fn lookup(&self, ident: &str) -> Option<&PValue> {
        if let Some(frame) = self.frames.last() {
            if let Some(value) = frame.table.get(ident) {
                return Some(value);
            }
        }
        self.globals.get(ident)
    }

    /// Assigns to an identifier: an existing binding is updated in place
    /// (local preferred); otherwise a new binding is created in the current
    /// frame, or globally when no frame is active.
    pub fn assign(&mut self, ident: &str, value: PValue) {
        if let Some(frame) = self.frames.last_mut() {
            if frame.table.contains(ident) {
                frame.table.insert(ident, value);
                return;
            }
            if self.globals.contains(ident) {
                self.globals.insert(ident, value);
                return;
            }
            frame.table.insert(ident, value);
            return;
        }
        self.globals.insert(ident, value);
    }

    /// Assigns to a global identifier regardless of the frame stack.
    pub fn assign_global(&mut self, ident: &str, value: PValue) {
        self.globals.insert(ident, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> Context {
        Context::with_output(Database::new("test.ged"), ScriptOutput::memory("out"))
    }

    #[test]
    fn test_assign_without_frame_goes_global() {
        let mut ctx = context();
        ctx.assign("x", PValue::Int(1));
        assert!(matches!(ctx.lookup("x"), Some(PValue::Int(1))));
    }

    #[test]
    fn test_local_binding_shadows_global() {
        let mut ctx = context();
        ctx.assign_global("x", PValue::Int(1));
        ctx.push_frame(Frame::new("p", 1));
        ctx.assign("y", PValue::Int(10));
        assert!(matches!(ctx.lookup("y"), Some(PValue::Int(10))));
        // x exists globally, so assignment updates the global.
        ctx.assign("x", PValue::Int(2));
        ctx.pop_frame();
        assert!(matches!(ctx.lookup("x"), Some(PValue::Int(2))));
        assert!(ctx.lookup("y").is_none());
    }

    #[test]
    fn test_global_visible_from_frame() {
        let mut ctx = context();
        ctx.assign_global("g", PValue::Int(7));
        ctx.push_frame(Frame::new("p", 1));
        assert!(matches!(ctx.lookup("g"), Some(PValue::Int(7))));
        ctx.pop_frame();
    }
}
