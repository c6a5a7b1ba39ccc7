//! Lineage accessor builtins.

use crate::interp::builtins::{arg_bool, arg_family, arg_int, arg_person, arg_string, arg_value};
use crate::interp::context::Context;
use crate::interp::pnode::PNode;
use crate::interp::pvalue::{NodeRef, PValue};
use crate::interp::ScriptError;
use crate::lineage;
use crate::name::manipulate_name;
use crate::node::Record;
use crate::record::{add_at, is_key, remove_at};

const DISPLAY_NAME_LENGTH: usize = 68;

fn person_result(record: Option<&Record>) -> PValue {
    match record.and_then(Record::key) {
        Some(key) => PValue::Person(key.to_string()),
        None => PValue::Null,
    }
}

fn family_result(record: Option<&Record>) -> PValue {
    match record.and_then(Record::key) {
        Some(key) => PValue::Family(key.to_string()),
        None => PValue::Null,
    }
}

/// usage: father(INDI) -> INDI
pub fn father(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let key = arg_person(ctx, call, args, 0)?;
    let Some(person) = ctx.database.person(&key) else {
        return Ok(PValue::Null);
    };
    Ok(person_result(lineage::person_to_father(&ctx.database, person)))
}

/// usage: mother(INDI) -> INDI
pub fn mother(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let key = arg_person(ctx, call, args, 0)?;
    let Some(person) = ctx.database.person(&key) else {
        return Ok(PValue::Null);
    };
    Ok(person_result(lineage::person_to_mother(&ctx.database, person)))
}

/// usage: nextsib(INDI) -> INDI
pub fn nextsib(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let key = arg_person(ctx, call, args, 0)?;
    let Some(person) = ctx.database.person(&key) else {
        return Ok(PValue::Null);
    };
    Ok(person_result(lineage::person_to_next_sibling(
        &ctx.database,
        person,
    )))
}

/// usage: prevsib(INDI) -> INDI
pub fn prevsib(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let key = arg_person(ctx, call, args, 0)?;
    let Some(person) = ctx.database.person(&key) else {
        return Ok(PValue::Null);
    };
    Ok(person_result(lineage::person_to_previous_sibling(
        &ctx.database,
        person,
    )))
}

/// usage: parents(INDI) -> FAM, the first family the person is a child in
pub fn parents(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let key = arg_person(ctx, call, args, 0)?;
    let Some(person) = ctx.database.person(&key) else {
        return Ok(PValue::Null);
    };
    Ok(family_result(lineage::person_to_family_as_child(
        &ctx.database,
        person,
    )))
}

/// usage: husband(FAM) -> INDI
pub fn husband(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let key = arg_family(ctx, call, args, 0)?;
    let Some(family) = ctx.database.family(&key) else {
        return Ok(PValue::Null);
    };
    Ok(person_result(lineage::family_to_husband(&ctx.database, family)))
}

/// usage: wife(FAM) -> INDI
pub fn wife(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let key = arg_family(ctx, call, args, 0)?;
    let Some(family) = ctx.database.family(&key) else {
        return Ok(PValue::Null);
    };
    Ok(person_result(lineage::family_to_wife(&ctx.database, family)))
}

/// usage: firstchild(FAM) -> INDI
pub fn firstchild(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let key = arg_family(ctx, call, args, 0)?;
    let Some(family) = ctx.database.family(&key) else {
        return Ok(PValue::Null);
    };
    Ok(person_result(lineage::family_to_first_child(
        &ctx.database,
        family,
    )))
}

/// usage: lastchild(FAM) -> INDI
pub fn lastchild(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let key = arg_family(ctx, call, args, 0)?;
    let Some(family) = ctx.database.family(&key) else {
        return Ok(PValue::Null);
    };
    Ok(person_result(lineage::family_to_last_child(
        &ctx.database,
        family,
    )))
}

/// usage: nchildren(FAM) -> INT
pub fn nchildren(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let key = arg_family(ctx, call, args, 0)?;
    let count = ctx
        .database
        .family(&key)
        .map_or(0, |family| lineage::child_keys(family).count());
    Ok(PValue::Int(count as i64))
}

/// usage: nfamilies(INDI) -> INT
pub fn nfamilies(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let key = arg_person(ctx, call, args, 0)?;
    let count = ctx
        .database
        .person(&key)
        .map_or(0, lineage::number_of_families);
    Ok(PValue::Int(count as i64))
}

/// usage: nspouses(INDI) -> INT
pub fn nspouses(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let key = arg_person(ctx, call, args, 0)?;
    let count = ctx
        .database
        .person(&key)
        .map_or(0, |person| lineage::number_of_spouses(&ctx.database, person));
    Ok(PValue::Int(count as i64))
}

/// usage: sex(INDI) -> STRING
pub fn sex(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let key = arg_person(ctx, call, args, 0)?;
    let Some(person) = ctx.database.person(&key) else {
        return Ok(PValue::Null);
    };
    Ok(PValue::String(person.sex().as_str().to_string()))
}

/// usage: name(INDI[, BOOL caps]) -> STRING
pub fn name(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let key = arg_person(ctx, call, args, 0)?;
    let caps = if args.len() > 1 {
        arg_bool(ctx, call, args, 1)?
    } else {
        true
    };
    let Some(person) = ctx.database.person(&key) else {
        return Ok(PValue::String(String::new()));
    };
    let value = person
        .find_child(person.root(), "NAME")
        .and_then(|id| person.value(id))
        .unwrap_or("");
    Ok(PValue::String(manipulate_name(
        value,
        caps,
        true,
        DISPLAY_NAME_LENGTH,
    )))
}

/// usage: fullname(INDI, BOOL caps, BOOL regular-order, INT max) -> STRING
pub fn fullname(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let key = arg_person(ctx, call, args, 0)?;
    let caps = arg_bool(ctx, call, args, 1)?;
    let regular = arg_bool(ctx, call, args, 2)?;
    let max = arg_int(ctx, call, args, 3)?.max(0) as usize;
    let Some(person) = ctx.database.person(&key) else {
        return Ok(PValue::String(String::new()));
    };
    let value = person
        .find_child(person.root(), "NAME")
        .and_then(|id| person.value(id))
        .unwrap_or("");
    Ok(PValue::String(manipulate_name(value, caps, regular, max)))
}

/// usage: key(RECORD[, BOOL keep-at-signs]) -> STRING
pub fn key(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let value = arg_value(ctx, call, args, 0)?;
    let keep_at = if args.len() > 1 {
        arg_bool(ctx, call, args, 1)?
    } else {
        false
    };
    let raw = match &value {
        PValue::Node(NodeRef::Detached { record, node }) => {
            let borrowed = record.borrow();
            borrowed.node_key(*node).map(str::to_string)
        }
        other => other.record_key().map(str::to_string),
    };
    match raw {
        Some(raw) if keep_at => Ok(PValue::String(raw)),
        Some(raw) => Ok(PValue::String(remove_at(&raw).to_string())),
        None => Ok(PValue::Null),
    }
}

/// usage: indi(STRING) -> INDI, by key with or without @ signs
pub fn indi(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let given = arg_string(ctx, call, args, 0)?;
    let key = if is_key(&given) { given } else { add_at(&given) };
    Ok(person_result(ctx.database.person(&key)))
}

/// usage: fam(STRING) -> FAM, by key with or without @ signs
pub fn fam(ctx: &mut Context, call: &PNode, args: &[PNode]) -> Result<PValue, ScriptError> {
    let given = arg_string(ctx, call, args, 0)?;
    let key = if is_key(&given) { given } else { add_at(&given) };
    Ok(family_result(ctx.database.family(&key)))
}
