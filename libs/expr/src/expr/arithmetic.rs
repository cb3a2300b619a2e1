//! Numeric operators
//!
//! Binary arithmetic promotes to `f64` when either operand is a float and to
//! `i64` otherwise; uint operands that do not fit in `i64` fail with an
//! overflow. Integer results are checked rather than wrapped. Bitwise and
//! shift operators work on `u64` and always produce uint values.

use super::{ArithmeticOp, BitwiseOp};
use crate::convert::{operand_i64, operand_u64, to_f64};
use crate::error::{ConversionError, Error, Result, ZeroDivisor};
use crate::value::Value;

const MAX_INT_AS_FLOAT: f64 = i64::MAX as f64;

enum Operands {
    Ints(i64, i64),
    Floats(f64, f64),
}

fn promote(op: ArithmeticOp, lhs: &Value, rhs: &Value) -> Result<Operands> {
    if !lhs.kind().is_numeric() || !rhs.kind().is_numeric() {
        return Err(undefined(op.symbol(), lhs, rhs));
    }
    if matches!(lhs, Value::Float(_)) || matches!(rhs, Value::Float(_)) {
        return Ok(Operands::Floats(to_f64(lhs)?, to_f64(rhs)?));
    }
    Ok(Operands::Ints(operand_i64(lhs)?, operand_i64(rhs)?))
}

fn undefined(symbol: &str, lhs: &Value, rhs: &Value) -> Error {
    Error::incompatible(format!(
        "operation for {} {} {} is undefined",
        lhs.type_name(),
        symbol,
        rhs.type_name()
    ))
}

fn overflow(message: String) -> Error {
    Error::Conversion(ConversionError::overflow(message))
}

pub(super) fn binary(op: ArithmeticOp, lhs: &Value, rhs: &Value) -> Result<Value> {
    if op == ArithmeticOp::Add {
        if let (Value::String(a), Value::String(b)) = (lhs, rhs) {
            let mut joined = String::with_capacity(a.len() + b.len());
            joined.push_str(a);
            joined.push_str(b);
            return Ok(Value::from(joined));
        }
    }

    match promote(op, lhs, rhs)? {
        Operands::Floats(a, b) => float_op(op, a, b),
        Operands::Ints(a, b) => int_op(op, a, b),
    }
}

fn float_op(op: ArithmeticOp, a: f64, b: f64) -> Result<Value> {
    let result = match op {
        ArithmeticOp::Add => a + b,
        ArithmeticOp::Subtract => a - b,
        ArithmeticOp::Multiply => a * b,
        ArithmeticOp::Divide => {
            if b == 0.0 {
                return Err(Error::DivisionByZero(ZeroDivisor::Division));
            }
            a / b
        }
        ArithmeticOp::FloorDivide => {
            if b == 0.0 {
                return Err(Error::DivisionByZero(ZeroDivisor::Division));
            }
            (a / b).floor()
        }
        ArithmeticOp::Modulo => {
            if b == 0.0 {
                return Err(Error::DivisionByZero(ZeroDivisor::Modulo));
            }
            a % b
        }
        ArithmeticOp::Power => a.powf(b),
    };
    Ok(Value::Float(result))
}

fn int_op(op: ArithmeticOp, a: i64, b: i64) -> Result<Value> {
    let result = match op {
        ArithmeticOp::Add => a
            .checked_add(b)
            .ok_or_else(|| overflow(format!("sum of {} and {} overflows int", a, b)))?,
        ArithmeticOp::Subtract => a
            .checked_sub(b)
            .ok_or_else(|| overflow(format!("difference of {} and {} overflows int", a, b)))?,
        ArithmeticOp::Multiply => {
            let too_large = || overflow(format!("product of {} and {} is too large", a, b));
            if (a as f64 * b as f64).abs() > MAX_INT_AS_FLOAT {
                return Err(too_large());
            }
            a.checked_mul(b).ok_or_else(too_large)?
        }
        // Integer floor division truncates toward zero, like `/`.
        ArithmeticOp::Divide | ArithmeticOp::FloorDivide => {
            if b == 0 {
                return Err(Error::DivisionByZero(ZeroDivisor::Division));
            }
            a.checked_div(b)
                .ok_or_else(|| overflow(format!("quotient of {} and {} overflows int", a, b)))?
        }
        ArithmeticOp::Modulo => {
            if b == 0 {
                return Err(Error::DivisionByZero(ZeroDivisor::Modulo));
            }
            a.wrapping_rem(b)
        }
        ArithmeticOp::Power => return int_power(a, b),
    };
    Ok(Value::Int(result))
}

/// Integer power by repeated squaring, guarded by a float estimate. A
/// negative exponent produces a float.
fn int_power(base: i64, exponent: i64) -> Result<Value> {
    let estimate = (base as f64).powf(exponent as f64);
    if exponent < 0 {
        return Ok(Value::Float(estimate));
    }
    let too_large = || overflow(format!("result of {}**{} overflows int", base, exponent));
    if estimate.abs() > MAX_INT_AS_FLOAT {
        return Err(too_large());
    }

    let mut result: i64 = 1;
    let mut square = base;
    let mut remaining = exponent;
    while remaining > 0 {
        if remaining & 1 == 1 {
            result = result.checked_mul(square).ok_or_else(too_large)?;
        }
        remaining >>= 1;
        if remaining > 0 {
            square = square.checked_mul(square).ok_or_else(too_large)?;
        }
    }
    Ok(Value::Int(result))
}

pub(super) fn polarity(negate: bool, value: &Value) -> Result<Value> {
    let operator = if negate { "-" } else { "+" };
    match value {
        Value::Nil => Ok(Value::Nil),
        Value::Int(_) | Value::Uint(_) | Value::Float(_) if !negate => Ok(value.clone()),
        Value::Int(i) => i
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| overflow(format!("negation of {} overflows int", i))),
        Value::Uint(_) => {
            let i = operand_i64(value)?;
            Ok(Value::Int(-i))
        }
        Value::Float(f) => Ok(Value::Float(-f)),
        other => Err(Error::Unary {
            operator,
            kind: other.type_name().to_string(),
        }),
    }
}

pub(super) fn bitwise(op: BitwiseOp, lhs: &Value, rhs: &Value) -> Result<Value> {
    let a = operand_u64(lhs)?;
    let b = operand_u64(rhs)?;
    let result = match op {
        BitwiseOp::And => a & b,
        BitwiseOp::Or => a | b,
        BitwiseOp::Xor => a ^ b,
        BitwiseOp::ShiftLeft => u32::try_from(b)
            .ok()
            .and_then(|n| a.checked_shl(n))
            .unwrap_or(0),
        BitwiseOp::ShiftRight => u32::try_from(b)
            .ok()
            .and_then(|n| a.checked_shr(n))
            .unwrap_or(0),
    };
    Ok(Value::Uint(result))
}

pub(super) fn bitwise_not(value: &Value) -> Result<Value> {
    Ok(Value::Uint(!operand_u64(value)?))
}
