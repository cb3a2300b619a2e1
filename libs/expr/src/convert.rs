//! Checked conversions between runtime values and host scalars
//!
//! Narrowing never truncates silently: a value that does not fit fails with
//! an overflow or underflow [`ConversionError`]. The `cast_*` functions
//! implement the `as` operator, which is more permissive than the accessors
//! (it parses strings and maps bools to numbers).

use crate::error::{ConversionError, ConversionKind};
use crate::value::Value;
use std::num::IntErrorKind;

type ConvResult<T> = std::result::Result<T, ConversionError>;

/// Fixed-width integer targets.
pub trait IntTarget: Sized + Copy {
    const NAME: &'static str;
    const MIN: i128;
    const MAX: i128;

    fn from_i128_unchecked(n: i128) -> Self;
}

macro_rules! int_target {
    ($($t:ty => $name:literal),* $(,)?) => {
        $(impl IntTarget for $t {
            const NAME: &'static str = $name;
            const MIN: i128 = <$t>::MIN as i128;
            const MAX: i128 = <$t>::MAX as i128;

            fn from_i128_unchecked(n: i128) -> Self {
                n as $t
            }
        })*
    };
}

int_target!(
    i8 => "int8",
    i16 => "int16",
    i32 => "int32",
    i64 => "int64",
    isize => "int",
    u8 => "uint8",
    u16 => "uint16",
    u32 => "uint32",
    u64 => "uint64",
    usize => "uint",
);

/// Narrow an exact integer into `T`.
pub fn narrow<T: IntTarget>(n: i128) -> ConvResult<T> {
    if n < T::MIN {
        return Err(ConversionError::underflow(format!(
            "integer underflow: {} is below the minimum of {}",
            n,
            T::NAME
        )));
    }
    if n > T::MAX {
        return Err(ConversionError::overflow(format!(
            "integer overflow: {} exceeds the maximum of {}",
            n,
            T::NAME
        )));
    }
    Ok(T::from_i128_unchecked(n))
}

/// An integer value widened to `i128`. Only int and uint kinds qualify.
pub fn integer(value: &Value, target: &str) -> ConvResult<i128> {
    match value {
        Value::Int(i) => Ok(i128::from(*i)),
        Value::Uint(u) => Ok(i128::from(*u)),
        other => Err(ConversionError::unsupported(other.type_name(), target)),
    }
}

/// Convert an int or uint value into any fixed-width integer.
pub fn to_int<T: IntTarget>(value: &Value) -> ConvResult<T> {
    narrow(integer(value, T::NAME)?)
}

/// Convert a numeric value to `f64`.
pub fn to_f64(value: &Value) -> ConvResult<f64> {
    match value {
        Value::Int(i) => Ok(*i as f64),
        Value::Uint(u) => Ok(*u as f64),
        Value::Float(f) => Ok(*f),
        other => Err(ConversionError::unsupported(other.type_name(), "float64")),
    }
}

/// Convert a numeric value to `f32`, failing if it exceeds the `f32` range.
pub fn to_f32(value: &Value) -> ConvResult<f32> {
    let f = to_f64(value).map_err(|_| ConversionError::unsupported(value.type_name(), "float32"))?;
    if f.is_finite() && f.abs() > f64::from(f32::MAX) {
        return Err(ConversionError::overflow(format!(
            "float overflow: {} exceeds the range of float32",
            f
        )));
    }
    Ok(f as f32)
}

pub fn to_bool(value: &Value) -> ConvResult<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        other => Err(ConversionError::unsupported(other.type_name(), "bool")),
    }
}

pub fn to_str(value: &Value) -> ConvResult<&str> {
    match value {
        Value::String(s) => Ok(s.as_ref()),
        other => Err(ConversionError::unsupported(other.type_name(), "string")),
    }
}

// ============================================================================
// Arithmetic operand promotion
// ============================================================================

/// Promote an integer operand to `i64`.
pub fn operand_i64(value: &Value) -> ConvResult<i64> {
    to_int::<i64>(value)
}

/// Promote an integer operand to `u64`; negative values underflow.
pub fn operand_u64(value: &Value) -> ConvResult<u64> {
    to_int::<u64>(value)
}

// ============================================================================
// Casts (`as`)
// ============================================================================

/// Target of a cast or `is` test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    Int,
    Uint,
    Float,
    String,
    Bool,
}

impl TypeTag {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "int" => Some(TypeTag::Int),
            "uint" => Some(TypeTag::Uint),
            "float" => Some(TypeTag::Float),
            "string" => Some(TypeTag::String),
            "bool" => Some(TypeTag::Bool),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TypeTag::Int => "int",
            TypeTag::Uint => "uint",
            TypeTag::Float => "float",
            TypeTag::String => "string",
            TypeTag::Bool => "bool",
        }
    }

    /// Whether `value` has exactly this runtime kind.
    pub fn matches(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (TypeTag::Int, Value::Int(_))
                | (TypeTag::Uint, Value::Uint(_))
                | (TypeTag::Float, Value::Float(_))
                | (TypeTag::String, Value::String(_))
                | (TypeTag::Bool, Value::Bool(_))
        )
    }
}

impl std::fmt::Display for TypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

pub fn cast(value: &Value, tag: TypeTag) -> ConvResult<Value> {
    match tag {
        TypeTag::Int => cast_int(value),
        TypeTag::Uint => cast_uint(value),
        TypeTag::Float => cast_float(value).map(Value::Float),
        TypeTag::String => cast_string(value).map(Value::from),
        TypeTag::Bool => cast_bool(value).map(Value::Bool),
    }
}

const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;
const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;

/// Cast to a signed integer. Floats at or beyond `i64::MAX` that still fit
/// in `u64` become unsigned rather than failing.
pub fn cast_int(value: &Value) -> ConvResult<Value> {
    match value {
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Int(i) => Ok(Value::Int(*i)),
        Value::Uint(u) => narrow::<i64>(i128::from(*u)).map(Value::Int),
        Value::Float(f) => float_to_integer(*f, "int"),
        Value::String(s) => parse_int(s).map(Value::Int),
        other => Err(ConversionError::unsupported(other.type_name(), "int")),
    }
}

pub fn cast_uint(value: &Value) -> ConvResult<Value> {
    match value {
        Value::Bool(b) => Ok(Value::Uint(u64::from(*b))),
        Value::Int(i) => narrow::<u64>(i128::from(*i)).map(Value::Uint),
        Value::Uint(u) => Ok(Value::Uint(*u)),
        Value::Float(f) => match float_to_integer(*f, "uint")? {
            Value::Int(i) => narrow::<u64>(i128::from(i)).map(Value::Uint),
            other => Ok(other),
        },
        Value::String(s) => narrow::<u64>(i128::from(parse_int(s)?)).map(Value::Uint),
        other => Err(ConversionError::unsupported(other.type_name(), "uint")),
    }
}

fn float_to_integer(f: f64, target: &str) -> ConvResult<Value> {
    if f.is_nan() {
        return Err(ConversionError::new(
            ConversionKind::Unsupported,
            format!("cannot convert NaN to {}", target),
        ));
    }
    if f >= TWO_POW_63 {
        if f < TWO_POW_64 {
            return Ok(Value::Uint(f as u64));
        }
        return Err(ConversionError::overflow(format!(
            "float value {} is too large to convert to {}",
            f, target
        )));
    }
    if f < -TWO_POW_63 {
        return Err(ConversionError::underflow(format!(
            "float value {} is too small to convert to {}",
            f, target
        )));
    }
    Ok(Value::Int(f.trunc() as i64))
}

/// Parse an integer string: `0x`/`0X` hex, `0b`/`0B` binary, a leading `0`
/// octal, otherwise decimal.
pub fn parse_int(s: &str) -> ConvResult<i64> {
    let (digits, radix) = if let Some(rest) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        (rest, 16)
    } else if let Some(rest) = s.strip_prefix("0b").or_else(|| s.strip_prefix("0B")) {
        (rest, 2)
    } else if s.len() > 1 && s.starts_with('0') {
        (&s[1..], 8)
    } else {
        (s, 10)
    };

    i64::from_str_radix(digits, radix).map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow => {
            ConversionError::overflow(format!("integer overflow: {:?} exceeds int64", s))
        }
        IntErrorKind::NegOverflow => {
            ConversionError::underflow(format!("integer underflow: {:?} is below int64", s))
        }
        _ => ConversionError::syntax(format!("invalid integer syntax: {:?}", s)),
    })
}

pub fn cast_float(value: &Value) -> ConvResult<f64> {
    match value {
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Int(i) => Ok(*i as f64),
        Value::Uint(u) => Ok(*u as f64),
        Value::Float(f) => Ok(*f),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| ConversionError::syntax(format!("invalid float syntax: {:?}", s))),
        other => Err(ConversionError::unsupported(other.type_name(), "float")),
    }
}

pub fn cast_string(value: &Value) -> ConvResult<String> {
    match value {
        Value::Bool(b) => Ok(b.to_string()),
        Value::Int(i) => Ok(i.to_string()),
        Value::Uint(u) => Ok(u.to_string()),
        Value::Float(f) => Ok(f.to_string()),
        Value::String(s) => Ok(s.to_string()),
        other => Err(ConversionError::unsupported(other.type_name(), "string")),
    }
}

pub fn cast_bool(value: &Value) -> ConvResult<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Int(i) => Ok(*i != 0),
        Value::Uint(u) => Ok(*u != 0),
        Value::Float(f) => Ok(*f != 0.0),
        Value::String(s) => match s.as_ref() {
            "0" | "false" => Ok(false),
            "1" | "true" => Ok(true),
            _ => Err(ConversionError::syntax(format!(
                "cannot convert string {:?} to bool",
                s
            ))),
        },
        other => Err(ConversionError::unsupported(other.type_name(), "bool")),
    }
}
