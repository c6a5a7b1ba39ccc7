//! Table builtins.

use crate::interp::builtins::{arg_ident, arg_string, arg_table, arg_value};
use crate::interp::context::Context;
use crate::interp::pnode::PNode;
use crate::interp::pvalue::PValue;
use crate::interp::ScriptError;

/// usage: table(IDENT) -> VOID
pub fn table(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let ident = arg_ident(call, args, 0)?.to_string();
    ctx.assign(&ident, PValue::new_table());
    Ok(PValue::Null)
}

/// usage: insert(TABLE, STRING, ANY) -> VOID
pub fn insert(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let table = arg_table(ctx, call, args, 0)?;
    let key = arg_string(ctx, call, args, 1)?;
    let value = arg_value(ctx, call, args, 2)?;
    table.borrow_mut().insert(key, value);
    Ok(PValue::Null)
}

/// usage: lookup(TABLE, STRING) -> ANY
pub fn lookup(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let table = arg_table(ctx, call, args, 0)?;
    let key = arg_string(ctx, call, args, 1)?;
    let value = table.borrow().get(&key).cloned().unwrap_or(PValue::Null);
    Ok(value)
}
