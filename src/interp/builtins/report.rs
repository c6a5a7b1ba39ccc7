//! Output builtins: modes, positioning, and output file control.

use crate::interp::builtins::{arg_bool, arg_int, arg_string};
use crate::interp::context::Context;
use crate::interp::pnode::PNode;
use crate::interp::pvalue::PValue;
use crate::interp::ScriptError;

fn positive(call: &PNode, value: i64, what: &str) -> Result<usize, ScriptError> {
    usize::try_from(value)
        .ok()
        .filter(|&v| v > 0)
        .ok_or_else(|| ScriptError::at(call, format!("{what} must be a positive integer")))
}

/// usage: linemode() -> VOID
pub fn linemode(ctx: &mut Context, _call: &PNode, _args: &[PNode]) -> Result<PValue, ScriptError> {
    ctx.output().line_mode();
    Ok(PValue::Null)
}

/// usage: pagemode(INT rows, INT cols) -> VOID
pub fn pagemode(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let rows = positive(call, arg_int(ctx, call, args, 0)?, "rows")?;
    let cols = positive(call, arg_int(ctx, call, args, 1)?, "cols")?;
    ctx.output()
        .page_mode(rows, cols)
        .map_err(|message| ScriptError::at(call, message))?;
    Ok(PValue::Null)
}

/// usage: pageout() -> VOID
pub fn pageout(ctx: &mut Context, call: &PNode, _args: &[PNode]) -> Result<PValue, ScriptError> {
    ctx.output()
        .page_out()
        .map_err(|message| ScriptError::at(call, message))?;
    Ok(PValue::Null)
}

/// usage: pos(INT row, INT col) -> VOID
pub fn pos(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let row = positive(call, arg_int(ctx, call, args, 0)?, "row")?;
    let col = positive(call, arg_int(ctx, call, args, 1)?, "col")?;
    ctx.output()
        .pos(row, col)
        .map_err(|message| ScriptError::at(call, message))?;
    Ok(PValue::Null)
}

/// usage: row(INT) -> VOID
pub fn row(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let row = positive(call, arg_int(ctx, call, args, 0)?, "row")?;
    ctx.output()
        .row(row)
        .map_err(|message| ScriptError::at(call, message))?;
    Ok(PValue::Null)
}

/// usage: col(INT) -> VOID
pub fn col(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let col = positive(call, arg_int(ctx, call, args, 0)?, "col")?;
    ctx.output().col(col);
    Ok(PValue::Null)
}

/// usage: nl() -> VOID
pub fn nl(ctx: &mut Context, _call: &PNode, _args: &[PNode]) -> Result<PValue, ScriptError> {
    ctx.output().write_str("\n");
    Ok(PValue::Null)
}

/// usage: sp() -> VOID
pub fn sp(ctx: &mut Context, _call: &PNode, _args: &[PNode]) -> Result<PValue, ScriptError> {
    ctx.output().write_str(" ");
    Ok(PValue::Null)
}

/// usage: newfile(STRING name[, BOOL append]) -> VOID
pub fn newfile(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let name = arg_string(ctx, call, args, 0)?;
    if name.is_empty() {
        return Err(ScriptError::at(
            call,
            "first argument to newfile must be a non-empty string",
        ));
    }
    let append = if args.len() > 1 {
        arg_bool(ctx, call, args, 1)?
    } else {
        false
    };
    ctx.output()
        .redirect_to_file(&name, append)
        .map_err(|err| ScriptError::at(call, format!("could not open file {name}: {err}")))?;
    Ok(PValue::Null)
}

/// usage: outfile() -> STRING
pub fn outfile(ctx: &mut Context, _call: &PNode, _args: &[PNode]) -> Result<PValue, ScriptError> {
    let name = ctx.output().name().to_string();
    Ok(PValue::String(name))
}
