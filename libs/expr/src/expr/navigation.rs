//! Member, wildcard, index, slice and call nodes
//!
//! Every navigation step treats a nil cursor as absent data and yields nil
//! without failing, so `a.b.c` over partially populated input is safe.

use super::Node;
use crate::context::Context;
use crate::convert::to_int;
use crate::error::{Error, NameError, Result};
use crate::functions::{Args, Entry};
use crate::value::Value;
use std::sync::Arc;

pub(super) fn member(current: &Value, name: &str) -> Result<Value> {
    match current {
        Value::Nil => Ok(Value::Nil),
        Value::Sequence(items) => {
            let mut collected = Vec::with_capacity(items.len());
            for item in items.iter() {
                match item {
                    Value::Map(_) | Value::Record(_) => collected.push(member(item, name)?),
                    _ => return Err(NameError::new(name, Vec::<&str>::new()).into()),
                }
            }
            if collected.is_empty() {
                return Ok(Value::Nil);
            }
            Ok(Value::Sequence(Arc::new(collected)))
        }
        Value::Map(entries) => entries
            .get(name)
            .cloned()
            .ok_or_else(|| NameError::new(name, entries.keys()).into()),
        Value::Record(record) => {
            if record.is_empty() {
                return Ok(Value::Nil);
            }
            record.get(name).cloned().ok_or_else(|| {
                NameError::new(name, record.visible_fields().map(|f| f.lookup_name())).into()
            })
        }
        _ => Err(NameError::new(name, Vec::<&str>::new()).into()),
    }
}

pub(super) fn wildcard(current: &Value) -> Result<Value> {
    let values: Vec<Value> = match current {
        Value::Nil => return Ok(Value::Nil),
        Value::Record(record) => record.visible_fields().map(|f| f.value.clone()).collect(),
        Value::Map(entries) => entries.values().cloned().collect(),
        other => {
            return Err(Error::Wildcard(format!(
                "wildcard: '*' only usable on struct and map, got {}",
                other.type_name()
            )))
        }
    };
    if values.is_empty() {
        return Ok(Value::Nil);
    }
    Ok(Value::Sequence(Arc::new(values)))
}

/// Index expressions see the cursor being indexed, so in `a[b]` the name `b`
/// resolves inside `a`.
fn position(ctx: &Context, node: &Node) -> Result<i64> {
    let value = node.eval(ctx)?;
    Ok(to_int::<i64>(&value)?)
}

pub(super) fn index(ctx: &Context, index: &Node) -> Result<Value> {
    let current = ctx.current();
    if current.is_nil() {
        return Ok(Value::Nil);
    }
    let i = position(ctx, index)?;
    let items = current.as_sequence().ok_or_else(|| {
        Error::Index(format!(
            "index {} does not exist in {}",
            i,
            current.type_name()
        ))
    })?;

    let len = items.len() as i64;
    let resolved = if i < 0 { i + len } else { i };
    if resolved < 0 || resolved >= len {
        return Err(Error::Index(format!(
            "index {} out of bounds for {}",
            i,
            current.type_name()
        )));
    }
    Ok(items[resolved as usize].clone())
}

pub(super) fn slice(ctx: &Context, begin: &Node, end: Option<&Node>) -> Result<Value> {
    let current = ctx.current();
    if current.is_nil() {
        return Ok(Value::Nil);
    }
    let items = current.as_sequence().ok_or_else(|| {
        Error::Slice(format!(
            "index slice: unable to slice {}",
            current.type_name()
        ))
    })?;
    let len = items.len() as i64;

    let begin = position(ctx, begin)?;
    if begin < 0 {
        return Err(Error::Slice(format!("begin index {} out of bounds", begin)));
    }
    let requested = match end {
        Some(node) => position(ctx, node)?,
        None => len,
    };
    let end = if requested < 0 {
        requested + len
    } else {
        requested
    };
    if end < 0 || end > len {
        return Err(Error::Slice(format!(
            "end index {} out of bounds",
            requested
        )));
    }
    if begin > end {
        return Err(Error::Slice(format!(
            "begin index {} is greater than end index {}",
            begin, end
        )));
    }

    Ok(Value::Sequence(Arc::new(
        items[begin as usize..end as usize].to_vec(),
    )))
}

fn eval_args(ctx: &Context, args: &[Node], into: &mut Args) -> Result<()> {
    for arg in args {
        into.push(arg.eval(ctx)?);
    }
    Ok(())
}

pub(super) fn free_func(ctx: &Context, entry: &Entry, args: &[Node]) -> Result<Value> {
    let mut values = Args::new();
    eval_args(ctx, args, &mut values)?;
    entry.invoke(&values)
}

/// The cursor becomes the first argument; the remaining arguments are
/// evaluated with that same cursor.
pub(super) fn member_func(ctx: &Context, entry: &Entry, args: &[Node]) -> Result<Value> {
    let current = ctx.current();
    if current.is_nil() {
        return Ok(Value::Nil);
    }
    let mut values = Args::new();
    values.push(current.clone());
    eval_args(ctx, args, &mut values)?;
    entry.invoke(&values)
}

pub(super) fn sequence(ctx: &Context, steps: &[Node]) -> Result<Value> {
    let mut current = ctx.current().clone();
    for step in steps {
        current = step.eval(&ctx.next(current))?;
        if current.is_nil() {
            return Ok(Value::Nil);
        }
    }
    Ok(current)
}
