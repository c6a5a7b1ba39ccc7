//! List builtins.
//!
//! Lists are shared containers with queue discipline on the ends: `push`
//! appends, `pop` removes the head, `requeue` puts an element back at the
//! head, and `dequeue` takes from the tail. `getel`/`setel` use 1-based
//! positions.

use crate::interp::builtins::{arg_ident, arg_int, arg_list, arg_value, type_error};
use crate::interp::context::Context;
use crate::interp::pnode::PNode;
use crate::interp::pvalue::PValue;
use crate::interp::ScriptError;

/// usage: list(IDENT) -> VOID
pub fn list(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let ident = arg_ident(call, args, 0)?.to_string();
    ctx.assign(&ident, PValue::new_list());
    Ok(PValue::Null)
}

/// usage: push(LIST, ANY) -> VOID
pub fn push(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let list = arg_list(ctx, call, args, 0)?;
    let value = arg_value(ctx, call, args, 1)?;
    list.borrow_mut().push(value);
    Ok(PValue::Null)
}

/// usage: pop(LIST) -> ANY
pub fn pop(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let list = arg_list(ctx, call, args, 0)?;
    let mut borrowed = list.borrow_mut();
    if borrowed.is_empty() {
        return Ok(PValue::Null);
    }
    Ok(borrowed.remove(0))
}

/// usage: requeue(LIST, ANY) -> VOID
pub fn requeue(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let list = arg_list(ctx, call, args, 0)?;
    let value = arg_value(ctx, call, args, 1)?;
    list.borrow_mut().insert(0, value);
    Ok(PValue::Null)
}

/// usage: dequeue(LIST) -> ANY
pub fn dequeue(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let list = arg_list(ctx, call, args, 0)?;
    let value = list.borrow_mut().pop().unwrap_or(PValue::Null);
    Ok(value)
}

/// usage: getel(LIST, INT) -> ANY, 1-based
pub fn getel(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let list = arg_list(ctx, call, args, 0)?;
    let index = arg_int(ctx, call, args, 1)?;
    let borrowed = list.borrow();
    if index < 1 || index as usize > borrowed.len() {
        return Ok(PValue::Null);
    }
    Ok(borrowed[index as usize - 1].clone())
}

/// usage: setel(LIST, INT, ANY) -> VOID, 1-based
pub fn setel(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let list = arg_list(ctx, call, args, 0)?;
    let index = arg_int(ctx, call, args, 1)?;
    let value = arg_value(ctx, call, args, 2)?;
    let mut borrowed = list.borrow_mut();
    if index < 1 {
        return Err(ScriptError::at(call, "setel position must be positive"));
    }
    let index = index as usize;
    if index > borrowed.len() {
        borrowed.resize(index, PValue::Null);
    }
    borrowed[index - 1] = value;
    Ok(PValue::Null)
}

/// usage: length(LIST) -> INT
pub fn length(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    match arg_value(ctx, call, args, 0)? {
        PValue::List(list) => Ok(PValue::Int(list.borrow().len() as i64)),
        PValue::Table(table) => Ok(PValue::Int(table.borrow().len() as i64)),
        _ => Err(type_error(call, 0, "list")),
    }
}

/// usage: empty(LIST) -> BOOL
pub fn empty(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let list = arg_list(ctx, call, args, 0)?;
    let is_empty = list.borrow().is_empty();
    Ok(PValue::Bool(is_empty))
}
