//! The script interpreter.
//!
//! Programs reach the engine as [`PNode`](pnode::PNode) trees. The evaluator
//! dispatches expressions on the node kind (literal, identifier, builtin
//! call, user function or procedure call); the interpreter walks statements
//! and the iteration loops. A statement whose expression evaluates to a
//! string writes that string to the current output file, which is how
//! report programs produce their text.
//!
//! Runtime problems abort the script: every evaluation returns a
//! `Result` and the error carries the source line of the originating
//! program node. The database is left intact.

pub mod builtin;
pub mod builtins;
pub mod context;
pub mod output;
pub mod pnode;
pub mod pvalue;
pub mod symtab;

use std::fmt;
use std::rc::Rc;

use crate::database::Database;
use crate::record::RecordKind;

use context::Context;
use pnode::{PNode, PNodeKind, Routine};
use pvalue::{NodeRef, PValue};
use symtab::Frame;

/// A script runtime error, carrying the source line of the originating
/// program node.
#[derive(Debug, Clone)]
pub struct ScriptError {
    /// Source line of the failing construct.
    pub line: usize,
    /// What went wrong.
    pub message: String,
}

impl ScriptError {
    /// Creates an error anchored at a program node.
    #[must_use]
    pub fn at(node: &PNode, message: impl Into<String>) -> Self {
        ScriptError {
            line: node.line,
            message: message.into(),
        }
    }
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "script error at line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ScriptError {}

/// What a statement told the interpreter to do next.
#[derive(Debug)]
pub enum Signal {
    /// Continue with the next statement.
    Okay,
    /// Terminate the innermost loop.
    Break,
    /// Proceed to the innermost loop's next iteration.
    Continue,
    /// Unwind to the nearest user routine with a value.
    Return(PValue),
}

/// Interprets one statement.
///
/// # Errors
///
/// Returns a [`ScriptError`] when the statement fails at runtime.
pub fn interpret(ctx: &mut Context, node: &PNode) -> Result<Signal, ScriptError> {
    match &node.kind {
        PNodeKind::Block(statements) => {
            for statement in statements {
                match interpret(ctx, statement)? {
                    Signal::Okay => (),
                    signal => return Ok(signal),
                }
            }
            Ok(Signal::Okay)
        }
        PNodeKind::Assign { ident, expr } => {
            let value = evaluate(ctx, expr)?;
            ctx.assign(ident, value);
            Ok(Signal::Okay)
        }
        PNodeKind::If {
            cond,
            then_branch,
            else_branch,
        } => {
            if evaluate(ctx, cond)?.is_truthy() {
                interpret(ctx, then_branch)
            } else if let Some(else_branch) = else_branch {
                interpret(ctx, else_branch)
            } else {
                Ok(Signal::Okay)
            }
        }
        PNodeKind::While { cond, body } => {
            while evaluate(ctx, cond)?.is_truthy() {
                match interpret(ctx, body)? {
                    Signal::Okay | Signal::Continue => (),
                    Signal::Break => break,
                    signal @ Signal::Return(_) => return Ok(signal),
                }
            }
            Ok(Signal::Okay)
        }
        PNodeKind::ForList {
            list,
            element,
            counter,
            body,
        } => {
            let value = evaluate(ctx, list)?;
            let PValue::List(list) = value else {
                return Err(ScriptError::at(node, "forlist needs a list"));
            };
            let mut index = 0;
            loop {
                let element_value = {
                    let borrowed = list.borrow();
                    match borrowed.get(index) {
                        Some(v) => v.clone(),
                        None => break,
                    }
                };
                ctx.assign(element, element_value);
                if let Some(counter) = counter {
                    ctx.assign(counter, PValue::Int(index as i64 + 1));
                }
                match interpret(ctx, body)? {
                    Signal::Okay | Signal::Continue => (),
                    Signal::Break => break,
                    signal @ Signal::Return(_) => return Ok(signal),
                }
                index += 1;
            }
            Ok(Signal::Okay)
        }
        PNodeKind::ForSequence {
            sequence,
            element,
            counter,
            body,
        } => {
            let value = evaluate(ctx, sequence)?;
            let PValue::Sequence(sequence) = value else {
                return Err(ScriptError::at(node, "the loop needs a set"));
            };
            let mut index = 0;
            loop {
                let key = {
                    let borrowed = sequence.borrow();
                    match borrowed.element(index) {
                        Some(el) => el.key().to_string(),
                        None => break,
                    }
                };
                let bound = record_value(&ctx.database, &key);
                ctx.assign(element, bound);
                if let Some(counter) = counter {
                    ctx.assign(counter, PValue::Int(index as i64 + 1));
                }
                match interpret(ctx, body)? {
                    Signal::Okay | Signal::Continue => (),
                    Signal::Break => break,
                    signal @ Signal::Return(_) => return Ok(signal),
                }
                index += 1;
            }
            Ok(Signal::Okay)
        }
        PNodeKind::ForChildren {
            family,
            child,
            counter,
            body,
        } => {
            let family_key = eval_family_key(ctx, family, node)?;
            let keys = snapshot_children(&ctx.database, &family_key);
            run_person_loop(ctx, &keys, child, counter.as_deref(), body)
        }
        PNodeKind::ForSpouses {
            person,
            spouse,
            family,
            counter,
            body,
        } => {
            let person_key = eval_person_key(ctx, person, node)?;
            let pairs = snapshot_spouses(&ctx.database, &person_key);
            let mut count = 0i64;
            for (spouse_key, family_key) in pairs {
                count += 1;
                ctx.assign(spouse, PValue::Person(spouse_key));
                if let Some(family) = family {
                    ctx.assign(family, PValue::Family(family_key));
                }
                if let Some(counter) = counter {
                    ctx.assign(counter, PValue::Int(count));
                }
                match interpret(ctx, body)? {
                    Signal::Okay | Signal::Continue => (),
                    Signal::Break => break,
                    signal @ Signal::Return(_) => return Ok(signal),
                }
            }
            Ok(Signal::Okay)
        }
        PNodeKind::ForFams {
            person,
            family,
            counter,
            body,
        } => {
            let person_key = eval_person_key(ctx, person, node)?;
            let keys = snapshot_linked_families(&ctx.database, &person_key, "FAMS");
            run_family_loop(ctx, &keys, family, counter.as_deref(), body)
        }
        PNodeKind::ForFamcs {
            person,
            family,
            counter,
            body,
        } => {
            let person_key = eval_person_key(ctx, person, node)?;
            let keys = snapshot_linked_families(&ctx.database, &person_key, "FAMC");
            run_family_loop(ctx, &keys, family, counter.as_deref(), body)
        }
        PNodeKind::Traverse {
            root,
            node: node_ident,
            level,
            body,
        } => {
            let value = evaluate(ctx, root)?;
            let visits = snapshot_traverse(ctx, &value)
                .ok_or_else(|| ScriptError::at(node, "traverse needs a record or node"))?;
            for (node_ref, node_level) in visits {
                ctx.assign(node_ident, PValue::Node(node_ref));
                ctx.assign(level, PValue::Int(i64::from(node_level)));
                match interpret(ctx, body)? {
                    Signal::Okay | Signal::Continue => (),
                    Signal::Break => break,
                    signal @ Signal::Return(_) => return Ok(signal),
                }
            }
            Ok(Signal::Okay)
        }
        PNodeKind::Break => Ok(Signal::Break),
        PNodeKind::Continue => Ok(Signal::Continue),
        PNodeKind::Return(expr) => {
            let value = match expr {
                Some(expr) => evaluate(ctx, expr)?,
                None => PValue::Null,
            };
            Ok(Signal::Return(value))
        }
        PNodeKind::ProcCall { name, args } => {
            let routine = ctx
                .procedure(name)
                .ok_or_else(|| ScriptError::at(node, format!("undefined procedure {name}")))?;
            call_routine(ctx, &routine, node, args)?;
            Ok(Signal::Okay)
        }
        // A statement that is an expression: evaluate it, and write string
        // results to the current output.
        _ => {
            let value = evaluate(ctx, node)?;
            if let PValue::String(text) = value {
                ctx.output().write_str(&text);
            }
            Ok(Signal::Okay)
        }
    }
}

/// Evaluates an expression.
///
/// # Errors
///
/// Returns a [`ScriptError`] when the expression fails at runtime.
pub fn evaluate(ctx: &mut Context, node: &PNode) -> Result<PValue, ScriptError> {
    match &node.kind {
        PNodeKind::IntLiteral(value) => Ok(PValue::Int(*value)),
        PNodeKind::FloatLiteral(value) => Ok(PValue::Float(*value)),
        PNodeKind::StringLiteral(value) => Ok(PValue::String(value.clone())),
        PNodeKind::Ident(name) => Ok(ctx.lookup(name).cloned().unwrap_or(PValue::Null)),
        PNodeKind::BuiltinCall { name, args } => {
            let Some(builtin) = builtin::lookup(name) else {
                return Err(ScriptError::at(node, format!("unknown builtin {name}")));
            };
            if args.len() < builtin.min_args || args.len() > builtin.max_args {
                return Err(ScriptError::at(
                    node,
                    format!(
                        "{name} takes {} to {} arguments, got {}",
                        builtin.min_args,
                        builtin.max_args,
                        args.len()
                    ),
                ));
            }
            (builtin.handler)(ctx, node, args)
        }
        PNodeKind::FuncCall { name, args } => {
            let routine = ctx
                .function(name)
                .ok_or_else(|| ScriptError::at(node, format!("undefined function {name}")))?;
            call_routine(ctx, &routine, node, args)
        }
        PNodeKind::ProcCall { name, .. } => Err(ScriptError::at(
            node,
            format!("procedure {name} cannot be used in an expression"),
        )),
        _ => Err(ScriptError::at(node, "statement used as an expression")),
    }
}

/// Calls a user-defined procedure by name with argument expressions.
///
/// # Errors
///
/// Returns a [`ScriptError`] when the procedure is undefined or fails.
pub fn call_procedure(ctx: &mut Context, name: &str, args: &[PNode]) -> Result<(), ScriptError> {
    let call = PNode::proc_call(0, name, args.to_vec());
    interpret(ctx, &call)?;
    Ok(())
}

fn call_routine(
    ctx: &mut Context,
    routine: &Rc<Routine>,
    call: &PNode,
    args: &[PNode],
) -> Result<PValue, ScriptError> {
    if args.len() != routine.params.len() {
        return Err(ScriptError::at(
            call,
            format!(
                "{} takes {} arguments, got {}",
                routine.name,
                routine.params.len(),
                args.len()
            ),
        ));
    }
    // Parameters are evaluated in the caller's frame.
    let mut values = Vec::with_capacity(args.len());
    for arg in args {
        values.push(evaluate(ctx, arg)?);
    }
    let mut frame = Frame::new(&routine.name, call.line);
    for (param, value) in routine.params.iter().zip(values) {
        frame.table.insert(param, value);
    }
    ctx.push_frame(frame);
    let result = interpret(ctx, &routine.body);
    ctx.pop_frame();
    match result? {
        Signal::Return(value) => Ok(value),
        _ => Ok(PValue::Null),
    }
}

/// Resolves a record key to a typed record value.
fn record_value(database: &Database, key: &str) -> PValue {
    match database.record(key) {
        Some(record) => match record.kind() {
            RecordKind::Person => PValue::Person(key.to_string()),
            RecordKind::Family => PValue::Family(key.to_string()),
            RecordKind::Source => PValue::Source(key.to_string()),
            RecordKind::Event => PValue::Event(key.to_string()),
            _ => PValue::Other(key.to_string()),
        },
        None => PValue::Null,
    }
}

fn eval_person_key(ctx: &mut Context, expr: &PNode, loop_node: &PNode) -> Result<String, ScriptError> {
    match evaluate(ctx, expr)? {
        PValue::Person(key) => Ok(key),
        other => Err(ScriptError::at(
            loop_node,
            format!("the loop needs a person, not a {}", other.type_name()),
        )),
    }
}

fn eval_family_key(ctx: &mut Context, expr: &PNode, loop_node: &PNode) -> Result<String, ScriptError> {
    match evaluate(ctx, expr)? {
        PValue::Family(key) => Ok(key),
        other => Err(ScriptError::at(
            loop_node,
            format!("the loop needs a family, not a {}", other.type_name()),
        )),
    }
}

fn snapshot_children(database: &Database, family_key: &str) -> Vec<String> {
    database
        .family(family_key)
        .map(|family| {
            crate::lineage::child_keys(family)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn snapshot_spouses(database: &Database, person_key: &str) -> Vec<(String, String)> {
    let Some(person) = database.person(person_key) else {
        return Vec::new();
    };
    crate::lineage::spouses(database, person)
        .filter_map(|(spouse, family)| Some((spouse.key()?.to_string(), family.key()?.to_string())))
        .collect()
}

fn snapshot_linked_families(database: &Database, person_key: &str, tag: &str) -> Vec<String> {
    database
        .person(person_key)
        .map(|person| {
            person
                .tagged_run(person.root(), tag)
                .filter_map(|id| person.value(id))
                .filter(|key| database.family(key).is_some())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn snapshot_traverse(ctx: &Context, value: &PValue) -> Option<Vec<(NodeRef, u32)>> {
    match value {
        PValue::Node(NodeRef::Db { key, node }) => {
            let record = ctx.database.record(key)?;
            Some(
                record
                    .traverse_from(*node)
                    .map(|id| {
                        (
                            NodeRef::Db {
                                key: key.clone(),
                                node: id,
                            },
                            record.level(id),
                        )
                    })
                    .collect(),
            )
        }
        PValue::Node(NodeRef::Detached { record, node }) => {
            let borrowed = record.borrow();
            Some(
                borrowed
                    .traverse_from(*node)
                    .map(|id| {
                        (
                            NodeRef::Detached {
                                record: Rc::clone(record),
                                node: id,
                            },
                            borrowed.level(id),
                        )
                    })
                    .collect(),
            )
        }
        _ => {
            let key = value.record_key()?;
            let record = ctx.database.record(key)?;
            Some(
                record
                    .traverse()
                    .map(|id| {
                        (
                            NodeRef::Db {
                                key: key.to_string(),
                                node: id,
                            },
                            record.level(id),
                        )
                    })
                    .collect(),
            )
        }
    }
}

fn run_person_loop(
    ctx: &mut Context,
    keys: &[String],
    ident: &str,
    counter: Option<&str>,
    body: &PNode,
) -> Result<Signal, ScriptError> {
    let mut count = 0i64;
    for key in keys {
        count += 1;
        ctx.assign(ident, PValue::Person(key.clone()));
        if let Some(counter) = counter {
            ctx.assign(counter, PValue::Int(count));
        }
        match interpret(ctx, body)? {
            Signal::Okay | Signal::Continue => (),
            Signal::Break => break,
            signal @ Signal::Return(_) => return Ok(signal),
        }
    }
    Ok(Signal::Okay)
}

fn run_family_loop(
    ctx: &mut Context,
    keys: &[String],
    ident: &str,
    counter: Option<&str>,
    body: &PNode,
) -> Result<Signal, ScriptError> {
    let mut count = 0i64;
    for key in keys {
        count += 1;
        ctx.assign(ident, PValue::Family(key.clone()));
        if let Some(counter) = counter {
            ctx.assign(counter, PValue::Int(count));
        }
        match interpret(ctx, body)? {
            Signal::Okay | Signal::Continue => (),
            Signal::Break => break,
            signal @ Signal::Return(_) => return Ok(signal),
        }
    }
    Ok(Signal::Okay)
}
