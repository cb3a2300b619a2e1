use super::{ComparisonOp, Node};
use crate::compare::{compare, equal};
use crate::context::Context;
use crate::convert::{self, TypeTag};
use crate::error::{Error, Result};
use crate::value::Value;
use std::cmp::Ordering;

pub(super) fn and(ctx: &Context, left: &Node, right: &Node) -> Result<Value> {
    if !left.eval(ctx)?.is_truthy() {
        return Ok(Value::Bool(false));
    }
    Ok(Value::Bool(right.eval(ctx)?.is_truthy()))
}

pub(super) fn or(ctx: &Context, left: &Node, right: &Node) -> Result<Value> {
    if left.eval(ctx)?.is_truthy() {
        return Ok(Value::Bool(true));
    }
    Ok(Value::Bool(right.eval(ctx)?.is_truthy()))
}

/// Comparisons are total: any two values, nil included, have an order.
pub(super) fn comparison(op: ComparisonOp, lhs: &Value, rhs: &Value) -> Value {
    let result = match op {
        ComparisonOp::Equal => equal(lhs, rhs),
        ComparisonOp::NotEqual => !equal(lhs, rhs),
        ComparisonOp::LessThan => compare(lhs, rhs) == Ordering::Less,
        ComparisonOp::LessThanOrEqual => compare(lhs, rhs) != Ordering::Greater,
        ComparisonOp::GreaterThan => compare(lhs, rhs) == Ordering::Greater,
        ComparisonOp::GreaterThanOrEqual => compare(lhs, rhs) != Ordering::Less,
    };
    Value::Bool(result)
}

/// `is` and `is not`; nil has no type, so both yield nil for it.
pub(super) fn is(value: &Value, tag: TypeTag, negated: bool) -> Value {
    if value.is_nil() {
        return Value::Nil;
    }
    Value::Bool(tag.matches(value) != negated)
}

pub(super) fn cast(value: &Value, tag: TypeTag) -> Result<Value> {
    Ok(convert::cast(value, tag)?)
}

/// Membership by structural equality against the elements of `haystack`.
pub(super) fn contains(needle: &Value, haystack: &Value, negated: bool) -> Result<Value> {
    if needle.is_nil() || haystack.is_nil() {
        return Ok(Value::Nil);
    }
    let items = haystack.as_sequence().ok_or_else(|| {
        Error::incompatible(format!(
            "right operand must be a slice or array, got {}",
            haystack.type_name()
        ))
    })?;
    let found = items.iter().any(|item| equal(needle, item));
    Ok(Value::Bool(found != negated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConversionKind;

    fn lit(value: impl Into<Value>) -> Node {
        Node::Literal(value.into())
    }

    #[test]
    fn test_and_or_short_circuit() {
        let ctx = Context::new(Value::Nil);
        // `1.*` fails whenever it runs.
        let boom = Node::Sequence(vec![lit(1), Node::Wildcard]);

        assert_eq!(and(&ctx, &lit(0), &boom).unwrap(), Value::Bool(false));
        assert_eq!(or(&ctx, &lit("x"), &boom).unwrap(), Value::Bool(true));
        assert!(and(&ctx, &lit(1), &boom).is_err());
        assert_eq!(or(&ctx, &lit(0), &lit("")).unwrap(), Value::Bool(false));
        assert_eq!(and(&ctx, &lit(1), &lit(2.5)).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_comparisons_mix_numeric_kinds() {
        let cmp = |op, a: Value, b: Value| comparison(op, &a, &b);
        assert_eq!(cmp(ComparisonOp::Equal, Value::Int(1), Value::Float(1.0)), Value::Bool(true));
        assert_eq!(cmp(ComparisonOp::Equal, Value::Uint(3), Value::Int(3)), Value::Bool(true));
        assert_eq!(
            cmp(ComparisonOp::LessThan, Value::Int(-1), Value::Uint(0)),
            Value::Bool(true)
        );
        assert_eq!(
            cmp(ComparisonOp::GreaterThanOrEqual, Value::from("b"), Value::from("a")),
            Value::Bool(true)
        );
        assert_eq!(cmp(ComparisonOp::NotEqual, Value::Nil, Value::Nil), Value::Bool(false));
        assert_eq!(
            cmp(ComparisonOp::LessThanOrEqual, Value::Nil, Value::Int(0)),
            Value::Bool(true)
        );
    }

    #[test]
    fn test_is() {
        assert_eq!(is(&Value::Int(1), TypeTag::Int, false), Value::Bool(true));
        assert_eq!(is(&Value::Int(1), TypeTag::Uint, false), Value::Bool(false));
        assert_eq!(is(&Value::Int(1), TypeTag::Float, true), Value::Bool(true));
        assert_eq!(is(&Value::sequence([1]), TypeTag::String, false), Value::Bool(false));
        assert_eq!(is(&Value::Nil, TypeTag::Int, false), Value::Nil);
        assert_eq!(is(&Value::Nil, TypeTag::Int, true), Value::Nil);
    }

    #[test]
    fn test_cast_nil_is_unsupported() {
        let err = cast(&Value::Nil, TypeTag::Int).unwrap_err();
        assert_eq!(err.conversion_error().unwrap().kind, ConversionKind::Unsupported);
        assert_eq!(cast(&Value::from("42"), TypeTag::Int).unwrap(), Value::Int(42));
    }

    #[test]
    fn test_contains() {
        let haystack = Value::sequence([1, 2, 3]);
        assert_eq!(contains(&Value::Int(2), &haystack, false).unwrap(), Value::Bool(true));
        assert_eq!(contains(&Value::Float(2.0), &haystack, false).unwrap(), Value::Bool(true));
        assert_eq!(contains(&Value::Int(4), &haystack, false).unwrap(), Value::Bool(false));
        assert_eq!(contains(&Value::Int(4), &haystack, true).unwrap(), Value::Bool(true));
        assert_eq!(contains(&Value::Nil, &haystack, false).unwrap(), Value::Nil);
        assert_eq!(contains(&Value::Int(1), &Value::Nil, true).unwrap(), Value::Nil);

        let err = contains(&Value::Int(1), &Value::from("abc"), false).unwrap_err();
        assert_eq!(
            err.to_string(),
            "incompatible operands: right operand must be a slice or array, got string"
        );
    }
}
