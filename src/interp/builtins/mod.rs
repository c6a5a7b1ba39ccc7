//! Built-in function handlers.
//!
//! Handlers receive the context, the call-site program node, and the raw
//! argument expressions. Argument evaluation and type checks go through the
//! helpers here so the error messages stay uniform: every mismatch names the
//! builtin and the offending argument position.

pub mod arith;
pub mod gnode;
pub mod list;
pub mod person;
pub mod report;
pub mod seq;
pub mod strings;
pub mod table;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::interp::context::Context;
use crate::interp::evaluate;
use crate::interp::pnode::{PNode, PNodeKind};
use crate::interp::pvalue::{NodeRef, PValue};
use crate::interp::ScriptError;
use crate::sequence::Sequence;

fn ordinal(index: usize) -> &'static str {
    match index {
        0 => "first",
        1 => "second",
        2 => "third",
        3 => "fourth",
        _ => "later",
    }
}

fn builtin_name(call: &PNode) -> &str {
    match &call.kind {
        PNodeKind::BuiltinCall { name, .. } => name,
        _ => "builtin",
    }
}

pub(crate) fn type_error(call: &PNode, index: usize, expected: &str) -> ScriptError {
    ScriptError::at(
        call,
        format!(
            "the {} argument to {} must be a {expected}",
            ordinal(index),
            builtin_name(call)
        ),
    )
}

pub(crate) fn arg_value(
    ctx: &mut Context,
    call: &PNode,
    args: &[PNode],
    index: usize,
) -> Result<PValue, ScriptError> {
    let Some(arg) = args.get(index) else {
        return Err(ScriptError::at(
            call,
            format!(
                "{} is missing its {} argument",
                builtin_name(call),
                ordinal(index)
            ),
        ));
    };
    evaluate(ctx, arg)
}

pub(crate) fn arg_int(
    ctx: &mut Context,
    call: &PNode,
    args: &[PNode],
    index: usize,
) -> Result<i64, ScriptError> {
    match arg_value(ctx, call, args, index)? {
        PValue::Int(value) => Ok(value),
        _ => Err(type_error(call, index, "integer")),
    }
}

pub(crate) fn arg_string(
    ctx: &mut Context,
    call: &PNode,
    args: &[PNode],
    index: usize,
) -> Result<String, ScriptError> {
    match arg_value(ctx, call, args, index)? {
        PValue::String(value) => Ok(value),
        _ => Err(type_error(call, index, "string")),
    }
}

pub(crate) fn arg_bool(
    ctx: &mut Context,
    call: &PNode,
    args: &[PNode],
    index: usize,
) -> Result<bool, ScriptError> {
    Ok(arg_value(ctx, call, args, index)?.is_truthy())
}

pub(crate) fn arg_list(
    ctx: &mut Context,
    call: &PNode,
    args: &[PNode],
    index: usize,
) -> Result<Rc<RefCell<Vec<PValue>>>, ScriptError> {
    match arg_value(ctx, call, args, index)? {
        PValue::List(list) => Ok(list),
        _ => Err(type_error(call, index, "list")),
    }
}

pub(crate) fn arg_table(
    ctx: &mut Context,
    call: &PNode,
    args: &[PNode],
    index: usize,
) -> Result<Rc<RefCell<HashMap<String, PValue>>>, ScriptError> {
    match arg_value(ctx, call, args, index)? {
        PValue::Table(table) => Ok(table),
        _ => Err(type_error(call, index, "table")),
    }
}

pub(crate) fn arg_sequence(
    ctx: &mut Context,
    call: &PNode,
    args: &[PNode],
    index: usize,
) -> Result<Rc<RefCell<Sequence>>, ScriptError> {
    match arg_value(ctx, call, args, index)? {
        PValue::Sequence(sequence) => Ok(sequence),
        _ => Err(type_error(call, index, "set")),
    }
}

pub(crate) fn arg_person(
    ctx: &mut Context,
    call: &PNode,
    args: &[PNode],
    index: usize,
) -> Result<String, ScriptError> {
    match arg_value(ctx, call, args, index)? {
        PValue::Person(key) => Ok(key),
        _ => Err(type_error(call, index, "person")),
    }
}

pub(crate) fn arg_family(
    ctx: &mut Context,
    call: &PNode,
    args: &[PNode],
    index: usize,
) -> Result<String, ScriptError> {
    match arg_value(ctx, call, args, index)? {
        PValue::Family(key) => Ok(key),
        _ => Err(type_error(call, index, "family")),
    }
}

pub(crate) fn arg_node(
    ctx: &mut Context,
    call: &PNode,
    args: &[PNode],
    index: usize,
) -> Result<NodeRef, ScriptError> {
    match arg_value(ctx, call, args, index)? {
        PValue::Node(node) => Ok(node),
        _ => Err(type_error(call, index, "node")),
    }
}

/// Returns the identifier an argument names, without evaluating it. Used by
/// the builtins that create a binding (`list`, `table`, `indiset`, ...).
pub(crate) fn arg_ident<'a>(
    call: &PNode,
    args: &'a [PNode],
    index: usize,
) -> Result<&'a str, ScriptError> {
    match args.get(index).map(|arg| &arg.kind) {
        Some(PNodeKind::Ident(name)) => Ok(name),
        _ => Err(ScriptError::at(
            call,
            format!(
                "the {} argument to {} must be an identifier",
                ordinal(index),
                builtin_name(call)
            ),
        )),
    }
}
