//! Sequence (indiset) builtins.

use crate::interp::builtins::{arg_bool, arg_ident, arg_person, arg_sequence, arg_string, arg_value};
use crate::interp::context::Context;
use crate::interp::pnode::PNode;
use crate::interp::pvalue::PValue;
use crate::interp::ScriptError;
use crate::sequence::{self, Sequence};

/// usage: indiset(IDENT) -> VOID
pub fn indiset(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let ident = arg_ident(call, args, 0)?.to_string();
    ctx.assign(&ident, PValue::new_sequence(Sequence::new()));
    Ok(PValue::Null)
}

/// usage: addtoset(SET, INDI, ANY) -> VOID
pub fn addtoset(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let sequence = arg_sequence(ctx, call, args, 0)?;
    let key = arg_person(ctx, call, args, 1)?;
    let value = arg_value(ctx, call, args, 2)?;
    let payload = match value {
        PValue::Null => None,
        other => Some(other),
    };
    sequence.borrow_mut().append(&key, payload);
    Ok(PValue::Null)
}

/// usage: lengthset(SET) -> INT
pub fn lengthset(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let sequence = arg_sequence(ctx, call, args, 0)?;
    let length = sequence.borrow().len() as i64;
    Ok(PValue::Int(length))
}

/// usage: inset(SET, INDI) -> BOOL
pub fn inset(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let sequence = arg_sequence(ctx, call, args, 0)?;
    let key = arg_person(ctx, call, args, 1)?;
    let found = sequence.borrow().is_in(&key);
    Ok(PValue::Bool(found))
}

/// usage: deletefromset(SET, INDI, BOOL) -> VOID
///
/// The boolean asks for every element with the key to go, not just the
/// first.
pub fn deletefromset(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let sequence = arg_sequence(ctx, call, args, 0)?;
    let key = arg_person(ctx, call, args, 1)?;
    let all = arg_bool(ctx, call, args, 2)?;
    let mut borrowed = sequence.borrow_mut();
    while borrowed.remove_first(&key) {
        if !all {
            break;
        }
    }
    Ok(PValue::Null)
}

/// usage: namesort(SET) -> VOID
pub fn namesort(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let sequence = arg_sequence(ctx, call, args, 0)?;
    sequence.borrow_mut().name_sort(&ctx.database);
    Ok(PValue::Null)
}

/// usage: keysort(SET) -> VOID
pub fn keysort(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let sequence = arg_sequence(ctx, call, args, 0)?;
    sequence.borrow_mut().key_sort();
    Ok(PValue::Null)
}

/// usage: uniqueset(SET) -> SET
pub fn uniqueset(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let sequence = arg_sequence(ctx, call, args, 0)?;
    let unique = sequence.borrow().unique();
    Ok(PValue::new_sequence(unique))
}

fn binary_set_op(
    ctx: &mut Context,
    call: &PNode,
    args: &[PNode],
    op: fn(&Sequence, &Sequence) -> Sequence,
) -> Result<PValue, ScriptError> {
    let a = arg_sequence(ctx, call, args, 0)?;
    let b = arg_sequence(ctx, call, args, 1)?;
    let result = op(&a.borrow(), &b.borrow());
    Ok(PValue::new_sequence(result))
}

/// usage: union(SET, SET) -> SET
pub fn union(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    binary_set_op(ctx, call, args, sequence::union_sequence)
}

/// usage: intersect(SET, SET) -> SET
pub fn intersect(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    binary_set_op(ctx, call, args, sequence::intersect_sequence)
}

/// usage: difference(SET, SET) -> SET
pub fn difference(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    binary_set_op(ctx, call, args, sequence::difference_sequence)
}

fn expansion(
    ctx: &mut Context,
    call: &PNode,
    args: &[PNode],
    op: fn(&crate::database::Database, &Sequence) -> Sequence,
) -> Result<PValue, ScriptError> {
    let sequence = arg_sequence(ctx, call, args, 0)?;
    let result = op(&ctx.database, &sequence.borrow());
    Ok(PValue::new_sequence(result))
}

/// usage: parentset(SET) -> SET
pub fn parentset(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    expansion(ctx, call, args, sequence::parent_sequence)
}

/// usage: childset(SET) -> SET
pub fn childset(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    expansion(ctx, call, args, sequence::child_sequence)
}

/// usage: siblingset(SET) -> SET
pub fn siblingset(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let sequence = arg_sequence(ctx, call, args, 0)?;
    let result = sequence::sibling_sequence(&ctx.database, &sequence.borrow(), false);
    Ok(PValue::new_sequence(result))
}

/// usage: spouseset(SET) -> SET
pub fn spouseset(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    expansion(ctx, call, args, sequence::spouse_sequence)
}

/// usage: ancestorset(SET) -> SET
pub fn ancestorset(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let sequence = arg_sequence(ctx, call, args, 0)?;
    let result = sequence::ancestor_sequence(&ctx.database, &sequence.borrow(), false);
    Ok(PValue::new_sequence(result))
}

/// usage: descendantset(SET) -> SET (also spelled descendentset)
pub fn descendantset(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let sequence = arg_sequence(ctx, call, args, 0)?;
    let result = sequence::descendent_sequence(&ctx.database, &sequence.borrow(), false);
    Ok(PValue::new_sequence(result))
}

/// usage: gengedcom(SET) -> VOID, writes the records to the current output
pub fn gengedcom(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let sequence = arg_sequence(ctx, call, args, 0)?;
    let text = sequence.borrow().to_gedcom(&ctx.database);
    ctx.output().write_str(&text);
    Ok(PValue::Null)
}

/// usage: genindiset(STRING, IDENT) -> VOID, the name query
pub fn genindiset(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let name = arg_string(ctx, call, args, 0)?;
    let ident = arg_ident(call, args, 1)?.to_string();
    let result = sequence::name_to_sequence(&name, &ctx.database);
    ctx.assign(&ident, PValue::new_sequence(result));
    Ok(PValue::Null)
}
