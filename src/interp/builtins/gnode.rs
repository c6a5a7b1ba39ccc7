//! Record node and editing builtins.

use std::cell::RefCell;
use std::rc::Rc;

use crate::interp::builtins::{arg_family, arg_int, arg_node, arg_person, arg_string, arg_value};
use crate::interp::context::Context;
use crate::interp::pnode::PNode;
use crate::interp::pvalue::{NodeRef, PValue};
use crate::interp::ScriptError;
use crate::node::Record;
use crate::ops;

/// usage: createnode(STRING tag[, STRING value]) -> NODE, a detached node
pub fn createnode(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let tag = arg_string(ctx, call, args, 0)?;
    let value = if args.len() > 1 {
        match arg_value(ctx, call, args, 1)? {
            PValue::String(s) => Some(s),
            PValue::Null => None,
            other => {
                return Err(ScriptError::at(
                    call,
                    format!("createnode value must be a string, not a {}", other.type_name()),
                ))
            }
        }
    } else {
        None
    };
    let record = Record::new(None, &tag, value.as_deref());
    let node = record.root();
    Ok(PValue::Node(NodeRef::Detached {
        record: Rc::new(RefCell::new(record)),
        node,
    }))
}

/// usage: tag(NODE) -> STRING
pub fn tag(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    match arg_node(ctx, call, args, 0)? {
        NodeRef::Db { key, node } => {
            let Some(record) = ctx.database.record(&key) else {
                return Ok(PValue::Null);
            };
            Ok(PValue::String(record.tag(node).to_string()))
        }
        NodeRef::Detached { record, node } => {
            let borrowed = record.borrow();
            Ok(PValue::String(borrowed.tag(node).to_string()))
        }
    }
}

/// usage: value(NODE) -> STRING
pub fn value(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    match arg_node(ctx, call, args, 0)? {
        NodeRef::Db { key, node } => {
            let Some(record) = ctx.database.record(&key) else {
                return Ok(PValue::Null);
            };
            Ok(match record.value(node) {
                Some(v) => PValue::String(v.to_string()),
                None => PValue::Null,
            })
        }
        NodeRef::Detached { record, node } => {
            let borrowed = record.borrow();
            Ok(match borrowed.value(node) {
                Some(v) => PValue::String(v.to_string()),
                None => PValue::Null,
            })
        }
    }
}

/// usage: addchild(FAM, INDI[, INT position]) -> VOID, 1-based position
pub fn addchild(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let family = arg_family(ctx, call, args, 0)?;
    let child = arg_person(ctx, call, args, 1)?;
    let index = if args.len() > 2 {
        let position = arg_int(ctx, call, args, 2)?;
        usize::try_from(position - 1).ok()
    } else {
        None
    };
    ops::add_child_to_family(&mut ctx.database, &family, &child, index)
        .map_err(|err| ScriptError::at(call, err.to_string()))?;
    Ok(PValue::Null)
}

/// usage: removechild(FAM, INDI) -> VOID
pub fn removechild(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let family = arg_family(ctx, call, args, 0)?;
    let child = arg_person(ctx, call, args, 1)?;
    ops::remove_child_from_family(&mut ctx.database, &family, &child)
        .map_err(|err| ScriptError::at(call, err.to_string()))?;
    Ok(PValue::Null)
}

/// usage: addspouse(FAM, INDI) -> VOID
pub fn addspouse(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let family = arg_family(ctx, call, args, 0)?;
    let spouse = arg_person(ctx, call, args, 1)?;
    ops::add_spouse_to_family(&mut ctx.database, &family, &spouse)
        .map_err(|err| ScriptError::at(call, err.to_string()))?;
    Ok(PValue::Null)
}

/// usage: removespouse(FAM, INDI) -> VOID
pub fn removespouse(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let family = arg_family(ctx, call, args, 0)?;
    let spouse = arg_person(ctx, call, args, 1)?;
    ops::remove_spouse_from_family(&mut ctx.database, &family, &spouse)
        .map_err(|err| ScriptError::at(call, err.to_string()))?;
    Ok(PValue::Null)
}

/// usage: root(RECORD) -> NODE, the record's root node
pub fn root(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let value = arg_value(ctx, call, args, 0)?;
    let Some(key) = value.record_key() else {
        return Err(ScriptError::at(call, "root needs a record"));
    };
    let Some(record) = ctx.database.record(key) else {
        return Ok(PValue::Null);
    };
    Ok(PValue::Node(NodeRef::Db {
        key: key.to_string(),
        node: record.root(),
    }))
}
