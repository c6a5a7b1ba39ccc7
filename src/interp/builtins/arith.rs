//! Arithmetic, comparison and logic builtins.

use crate::interp::builtins::{arg_ident, arg_value};
use crate::interp::context::Context;
use crate::interp::evaluate;
use crate::interp::pnode::PNode;
use crate::interp::pvalue::{self, PValue};
use crate::interp::ScriptError;

fn binary(
    ctx: &mut Context,
    call: &PNode,
    args: &[PNode],
    op: fn(&PValue, &PValue) -> Result<PValue, String>,
) -> Result<PValue, ScriptError> {
    let a = arg_value(ctx, call, args, 0)?;
    let b = arg_value(ctx, call, args, 1)?;
    op(&a, &b).map_err(|message| ScriptError::at(call, message))
}

/// usage: add(NUM, NUM) -> NUM
pub fn add(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    binary(ctx, call, args, pvalue::add_values)
}

/// usage: sub(NUM, NUM) -> NUM
pub fn sub(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    binary(ctx, call, args, pvalue::sub_values)
}

/// usage: mul(NUM, NUM) -> NUM
pub fn mul(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    binary(ctx, call, args, pvalue::mul_values)
}

/// usage: div(NUM, NUM) -> NUM
pub fn div(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    binary(ctx, call, args, pvalue::div_values)
}

/// usage: mod(INT, INT) -> INT
pub fn modulus(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    binary(ctx, call, args, pvalue::mod_values)
}

/// usage: exp(INT, INT) -> INT
pub fn exp(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    binary(ctx, call, args, pvalue::exp_values)
}

/// usage: neg(NUM) -> NUM
pub fn neg(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let a = arg_value(ctx, call, args, 0)?;
    pvalue::neg_value(&a).map_err(|message| ScriptError::at(call, message))
}

/// usage: incr(IDENT) -> VOID
pub fn incr(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    bump(ctx, call, args, 1)
}

/// usage: decr(IDENT) -> VOID
pub fn decr(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    bump(ctx, call, args, -1)
}

fn bump(
    ctx: &mut Context,
    call: &PNode,
    args: &[PNode],
    delta: i64,
) -> Result<PValue, ScriptError> {
    let ident = arg_ident(call, args, 0)?.to_string();
    match ctx.lookup(&ident) {
        Some(PValue::Int(value)) => {
            let next = value.wrapping_add(delta);
            ctx.assign(&ident, PValue::Int(next));
            Ok(PValue::Null)
        }
        _ => Err(ScriptError::at(
            call,
            format!("{ident} must hold an integer"),
        )),
    }
}

fn comparison(
    ctx: &mut Context,
    call: &PNode,
    args: &[PNode],
    accept: fn(std::cmp::Ordering) -> bool,
) -> Result<PValue, ScriptError> {
    let a = arg_value(ctx, call, args, 0)?;
    let b = arg_value(ctx, call, args, 1)?;
    let ordering =
        pvalue::compare_values(&a, &b).map_err(|message| ScriptError::at(call, message))?;
    Ok(PValue::Bool(accept(ordering)))
}

/// usage: eq(ANY, ANY) -> BOOL
pub fn eq(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let a = arg_value(ctx, call, args, 0)?;
    let b = arg_value(ctx, call, args, 1)?;
    pvalue::eq_values(&a, &b)
        .map(PValue::Bool)
        .map_err(|message| ScriptError::at(call, message))
}

/// usage: ne(ANY, ANY) -> BOOL
pub fn ne(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let a = arg_value(ctx, call, args, 0)?;
    let b = arg_value(ctx, call, args, 1)?;
    pvalue::eq_values(&a, &b)
        .map(|equal| PValue::Bool(!equal))
        .map_err(|message| ScriptError::at(call, message))
}

/// usage: lt(ANY, ANY) -> BOOL
pub fn lt(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    comparison(ctx, call, args, std::cmp::Ordering::is_lt)
}

/// usage: le(ANY, ANY) -> BOOL
pub fn le(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    comparison(ctx, call, args, std::cmp::Ordering::is_le)
}

/// usage: gt(ANY, ANY) -> BOOL
pub fn gt(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    comparison(ctx, call, args, std::cmp::Ordering::is_gt)
}

/// usage: ge(ANY, ANY) -> BOOL
pub fn ge(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    comparison(ctx, call, args, std::cmp::Ordering::is_ge)
}

/// usage: and(ANY, ANY, ...) -> BOOL, short-circuiting
pub fn and(ctx: &mut Context, _call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    for arg in args {
        if !evaluate(ctx, arg)?.is_truthy() {
            return Ok(PValue::Bool(false));
        }
    }
    Ok(PValue::Bool(true))
}

/// usage: or(ANY, ANY, ...) -> BOOL, short-circuiting
pub fn or(ctx: &mut Context, _call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    for arg in args {
        if evaluate(ctx, arg)?.is_truthy() {
            return Ok(PValue::Bool(true));
        }
    }
    Ok(PValue::Bool(false))
}

/// usage: not(ANY) -> BOOL
pub fn not(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let value = arg_value(ctx, call, args, 0)?;
    Ok(PValue::Bool(!value.is_truthy()))
}
