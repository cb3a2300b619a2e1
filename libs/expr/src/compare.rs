//! Structural ordering and equality
//!
//! Values order by kind first (nil < numeric < string < bool < record <
//! sequence < map < opaque), then by content. Signed, unsigned and float
//! numbers form one numeric kind compared by exact magnitude.

use crate::value::{Record, Value};
use std::cmp::Ordering;

/// Total structural ordering. `compare(v, v)` is `Equal` for every value,
/// NaN included.
pub fn compare(lhs: &Value, rhs: &Value) -> Ordering {
    let by_rank = rank(lhs).cmp(&rank(rhs));
    if by_rank != Ordering::Equal {
        return by_rank;
    }

    match (lhs, rhs) {
        (Value::Nil, Value::Nil) => Ordering::Equal,
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Sequence(a), Value::Sequence(b)) => compare_sequences(a, b),
        (Value::Map(a), Value::Map(b)) => a
            .len()
            .cmp(&b.len())
            .then_with(|| {
                a.iter()
                    .zip(b.iter())
                    .map(|((ka, va), (kb, vb))| ka.cmp(kb).then_with(|| compare(va, vb)))
                    .find(|o| o.is_ne())
                    .unwrap_or(Ordering::Equal)
            }),
        (Value::Record(a), Value::Record(b)) => compare_records(a, b),
        (Value::Opaque(a), Value::Opaque(b)) => {
            if a.address() == b.address() {
                Ordering::Equal
            } else {
                a.type_name()
                    .cmp(b.type_name())
                    .then_with(|| a.address().cmp(&b.address()))
            }
        }
        _ => compare_numbers(lhs, rhs),
    }
}

/// Structural equality: `compare(lhs, rhs) == Equal`.
pub fn equal(lhs: &Value, rhs: &Value) -> bool {
    compare(lhs, rhs) == Ordering::Equal
}

fn rank(value: &Value) -> u8 {
    match value {
        Value::Nil => 0,
        Value::Int(_) | Value::Uint(_) | Value::Float(_) => 1,
        Value::String(_) => 2,
        Value::Bool(_) => 3,
        Value::Record(_) => 4,
        Value::Sequence(_) => 5,
        Value::Map(_) => 6,
        Value::Opaque(_) => 7,
    }
}

fn compare_sequences(a: &[Value], b: &[Value]) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| {
        a.iter()
            .zip(b)
            .map(|(x, y)| compare(x, y))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    })
}

fn compare_records(a: &Record, b: &Record) -> Ordering {
    if a.type_name() != b.type_name() {
        return a.type_name().cmp(b.type_name());
    }
    a.fields()
        .iter()
        .zip(b.fields())
        .map(|(x, y)| compare(&x.value, &y.value))
        .find(|o| o.is_ne())
        .unwrap_or_else(|| a.fields().len().cmp(&b.fields().len()))
}

fn compare_numbers(lhs: &Value, rhs: &Value) -> Ordering {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => a.cmp(b),
        (Value::Uint(a), Value::Uint(b)) => a.cmp(b),
        // Any negative signed value orders below any unsigned value.
        (Value::Int(a), Value::Uint(b)) => i128::from(*a).cmp(&i128::from(*b)),
        (Value::Uint(a), Value::Int(b)) => i128::from(*a).cmp(&i128::from(*b)),
        (Value::Float(a), Value::Float(b)) => compare_floats(*a, *b),
        (Value::Int(a), Value::Float(b)) => compare_integer_float(i128::from(*a), *b),
        (Value::Uint(a), Value::Float(b)) => compare_integer_float(i128::from(*a), *b),
        (Value::Float(a), Value::Int(b)) => compare_integer_float(i128::from(*b), *a).reverse(),
        (Value::Float(a), Value::Uint(b)) => compare_integer_float(i128::from(*b), *a).reverse(),
        _ => Ordering::Equal,
    }
}

// NaN equals itself and sorts above every other number.
fn compare_floats(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;
const MINUS_TWO_POW_63: f64 = -9_223_372_036_854_775_808.0;

/// Exact comparison of a 64-bit integer against a float.
fn compare_integer_float(int: i128, float: f64) -> Ordering {
    if float.is_nan() || float >= TWO_POW_64 {
        return Ordering::Less;
    }
    if float < MINUS_TWO_POW_63 {
        return Ordering::Greater;
    }

    let whole = float.trunc();
    match int.cmp(&(whole as i128)) {
        Ordering::Equal if float > whole => Ordering::Less,
        Ordering::Equal if float < whole => Ordering::Greater,
        other => other,
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        equal(self, other)
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        compare(self, other)
    }
}
