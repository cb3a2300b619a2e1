//! Built-in function table
//!
//! The table is immutable once built. [`table`] hands out a shared instance;
//! callers layer their own functions over it with [`Table::child`].
//!
//! | Function | Arguments | Result |
//! |----------|-----------|--------|
//! | `len` | string, sequence, map or record | character, element, entry or visible field count |
//! | `lower`, `upper`, `trim` | string | string |
//! | `contains`, `startsWith`, `endsWith` | string, string | bool |
//! | `matches` | string, pattern | bool (`regex` feature) |
//! | `keys`, `values` | map or record | sequence |
//! | `abs` | number | number of the same kind |
//! | `min`, `max` | one or more values | smallest / largest by structural order |
//! | `string`, `int`, `float`, `bool` | any | the `as` conversion |

use crate::compare::compare;
use crate::convert::{self, TypeTag};
use crate::error::{ConversionError, Error, Result};
use crate::functions::{Table, Variadic};
use crate::value::Value;
#[cfg(feature = "regex")]
use lru::LruCache;
use std::cmp::Ordering;
#[cfg(feature = "regex")]
use std::num::NonZeroUsize;
#[cfg(feature = "regex")]
use std::sync::{Mutex, PoisonError};
use std::sync::{Arc, OnceLock};

static BUILTINS: OnceLock<Result<Arc<Table>>> = OnceLock::new();

/// The shared built-in table. A registration failure is cached and returned
/// to every caller.
pub fn table() -> Result<Arc<Table>> {
    BUILTINS.get_or_init(|| build().map(Arc::new)).clone()
}

fn build() -> Result<Table> {
    let mut table = Table::new();
    register_all(&mut table).map_err(|err| {
        tracing::error!(error = %err, "failed to register built-in functions");
        err
    })?;
    tracing::debug!(functions = table.function_names().len(), "built-in table ready");
    Ok(table)
}

fn register_all(table: &mut Table) -> Result<()> {
    // Collections
    table.register_fn("len", len)?;
    table.register_fn("keys", keys)?;
    table.register_fn("values", values)?;

    // Strings
    table.register_fn("lower", |s: String| s.to_lowercase())?;
    table.register_fn("upper", |s: String| s.to_uppercase())?;
    table.register_fn("trim", |s: String| s.trim().to_string())?;
    table.register_fn("contains", |s: String, sub: String| s.contains(sub.as_str()))?;
    table.register_fn("startsWith", |s: String, prefix: String| {
        s.starts_with(prefix.as_str())
    })?;
    table.register_fn("endsWith", |s: String, suffix: String| {
        s.ends_with(suffix.as_str())
    })?;
    #[cfg(feature = "regex")]
    table.register_fn("matches", matches)?;

    // Numbers and ordering
    table.register_fn("abs", abs)?;
    table.register_fn("min", |first: Value, rest: Variadic<Value>| {
        extreme(first, rest, Ordering::Less)
    })?;
    table.register_fn("max", |first: Value, rest: Variadic<Value>| {
        extreme(first, rest, Ordering::Greater)
    })?;

    // Conversions
    table.register_fn("string", |v: Value| convert::cast(&v, TypeTag::String))?;
    table.register_fn("int", |v: Value| convert::cast(&v, TypeTag::Int))?;
    table.register_fn("float", |v: Value| convert::cast(&v, TypeTag::Float))?;
    table.register_fn("bool", |v: Value| convert::cast(&v, TypeTag::Bool))?;

    Ok(())
}

fn bad_argument(expected: &str, actual: &Value) -> Error {
    Error::BadArgument {
        index: 0,
        expected: expected.to_string(),
        actual: actual.type_name().to_string(),
    }
}

fn len(value: Value) -> Result<i64> {
    let n = match &value {
        Value::String(s) => s.chars().count(),
        Value::Sequence(items) => items.len(),
        Value::Map(entries) => entries.len(),
        Value::Record(record) => record.visible_fields().count(),
        other => return Err(bad_argument("string, sequence, map or record", other)),
    };
    Ok(convert::narrow::<i64>(n as i128)?)
}

fn keys(value: Value) -> Result<Value> {
    match &value {
        Value::Map(entries) => Ok(Value::sequence(entries.keys().map(String::as_str))),
        Value::Record(record) => Ok(Value::sequence(
            record.visible_fields().map(|f| f.lookup_name()),
        )),
        other => Err(bad_argument("map or record", other)),
    }
}

fn values(value: Value) -> Result<Value> {
    match &value {
        Value::Map(entries) => Ok(Value::sequence(entries.values().cloned())),
        Value::Record(record) => Ok(Value::sequence(
            record.visible_fields().map(|f| f.value.clone()),
        )),
        other => Err(bad_argument("map or record", other)),
    }
}

fn abs(value: Value) -> Result<Value> {
    match value {
        Value::Int(i) => i.checked_abs().map(Value::Int).ok_or_else(|| {
            ConversionError::overflow(format!("absolute value of {} overflows int", i)).into()
        }),
        Value::Uint(_) => Ok(value),
        Value::Float(f) => Ok(Value::Float(f.abs())),
        other => Err(bad_argument("number", &other)),
    }
}

fn extreme(first: Value, rest: Variadic<Value>, keep: Ordering) -> Value {
    rest.into_inner()
        .into_iter()
        .fold(first, |best, candidate| {
            if compare(&candidate, &best) == keep {
                candidate
            } else {
                best
            }
        })
}

#[cfg(feature = "regex")]
const REGEX_CACHE_CAPACITY: usize = 64;

#[cfg(feature = "regex")]
static REGEX_CACHE: OnceLock<Mutex<LruCache<String, regex::Regex>>> = OnceLock::new();

/// Compile `pattern`, reusing a recently compiled regex.
#[cfg(feature = "regex")]
fn cached_regex(pattern: &str) -> Result<regex::Regex> {
    let cache = REGEX_CACHE.get_or_init(|| {
        let capacity = NonZeroUsize::new(REGEX_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Mutex::new(LruCache::new(capacity))
    });

    if let Some(regex) = cache
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get(pattern)
    {
        return Ok(regex.clone());
    }

    let regex = regex::Regex::new(pattern)
        .map_err(|e| Error::from(format!("invalid regular expression: {}", e)))?;
    cache
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .put(pattern.to_string(), regex.clone());
    Ok(regex)
}

#[cfg(feature = "regex")]
fn matches(input: String, pattern: String) -> Result<bool> {
    Ok(cached_regex(&pattern)?.is_match(&input))
}
