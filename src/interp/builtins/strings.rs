//! String builtins.

use crate::interp::builtins::{arg_int, arg_string, arg_value};
use crate::interp::context::Context;
use crate::interp::pnode::PNode;
use crate::interp::pvalue::PValue;
use crate::interp::ScriptError;
use crate::name;

/// usage: concat(STRING, STRING, ...) -> STRING
pub fn concat(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let mut out = String::new();
    for index in 0..args.len() {
        match arg_value(ctx, call, args, index)? {
            PValue::String(s) => out.push_str(&s),
            PValue::Null => (),
            other => {
                return Err(ScriptError::at(
                    call,
                    format!("concat arguments must be strings, not {}", other.type_name()),
                ))
            }
        }
    }
    Ok(PValue::String(out))
}

/// usage: strcmp(STRING, STRING) -> INT
pub fn strcmp(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let a = arg_string(ctx, call, args, 0)?;
    let b = arg_string(ctx, call, args, 1)?;
    let result = match a.cmp(&b) {
        std::cmp::Ordering::Less => -1,
        std::cmp::Ordering::Equal => 0,
        std::cmp::Ordering::Greater => 1,
    };
    Ok(PValue::Int(result))
}

/// usage: eqstr(STRING, STRING) -> BOOL
pub fn eqstr(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let a = arg_string(ctx, call, args, 0)?;
    let b = arg_string(ctx, call, args, 1)?;
    Ok(PValue::Bool(a == b))
}

/// usage: strlen(STRING) -> INT
pub fn strlen(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let s = arg_string(ctx, call, args, 0)?;
    Ok(PValue::Int(s.chars().count() as i64))
}

/// usage: substring(STRING, INT, INT) -> STRING, 1-based inclusive
pub fn substring(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let s = arg_string(ctx, call, args, 0)?;
    let start = arg_int(ctx, call, args, 1)?;
    let end = arg_int(ctx, call, args, 2)?;
    if start < 1 || end < start {
        return Ok(PValue::String(String::new()));
    }
    let out: String = s
        .chars()
        .skip(start as usize - 1)
        .take((end - start + 1) as usize)
        .collect();
    Ok(PValue::String(out))
}

/// usage: trim(STRING, INT) -> STRING, the first n characters
pub fn trim(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let s = arg_string(ctx, call, args, 0)?;
    let n = arg_int(ctx, call, args, 1)?.max(0) as usize;
    Ok(PValue::String(s.chars().take(n).collect()))
}

/// usage: rjustify(STRING, INT) -> STRING, right-justified in n columns
pub fn rjustify(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let s = arg_string(ctx, call, args, 0)?;
    let width = arg_int(ctx, call, args, 1)?.max(0) as usize;
    let length = s.chars().count();
    if length >= width {
        return Ok(PValue::String(s.chars().take(width).collect()));
    }
    let mut out = " ".repeat(width - length);
    out.push_str(&s);
    Ok(PValue::String(out))
}

/// usage: upper(STRING) -> STRING
pub fn upper(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let s = arg_string(ctx, call, args, 0)?;
    Ok(PValue::String(s.to_uppercase()))
}

/// usage: lower(STRING) -> STRING
pub fn lower(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let s = arg_string(ctx, call, args, 0)?;
    Ok(PValue::String(s.to_lowercase()))
}

/// usage: capitalize(STRING) -> STRING
pub fn capitalize(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let s = arg_string(ctx, call, args, 0)?;
    let mut chars = s.chars();
    let out = match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    };
    Ok(PValue::String(out))
}

/// usage: d(INT) -> STRING, decimal rendering
pub fn d(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let value = arg_int(ctx, call, args, 0)?;
    Ok(PValue::String(value.to_string()))
}

/// usage: strsoundex(STRING) -> STRING, the Soundex code of a surname
pub fn strsoundex(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let s = arg_string(ctx, call, args, 0)?;
    Ok(PValue::String(name::soundex(&s)))
}
