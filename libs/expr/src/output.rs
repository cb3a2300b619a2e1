//! Evaluation results
//!
//! [`Output`] wraps the [`Value`] an expression produced and offers checked
//! accessors for pulling it back into host types.

use crate::convert;
use crate::error::ConversionError;
use crate::value::Value;
use std::fmt;

type ConvResult<T> = std::result::Result<T, ConversionError>;

/// The value produced by one evaluation.
#[derive(Debug, Clone, Default)]
pub struct Output(Value);

macro_rules! integer_accessors {
    ($($name:ident => $t:ty),* $(,)?) => {
        $(
            #[doc = concat!("The result as `", stringify!($t), "`. Only int and uint results qualify.")]
            pub fn $name(&self) -> ConvResult<$t> {
                convert::to_int::<$t>(&self.0)
            }
        )*
    };
}

impl Output {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_truthy(&self) -> bool {
        self.0.is_truthy()
    }

    integer_accessors!(
        as_i64 => i64,
        as_i32 => i32,
        as_i16 => i16,
        as_i8 => i8,
        as_isize => isize,
        as_u64 => u64,
        as_u32 => u32,
        as_u16 => u16,
        as_u8 => u8,
        as_usize => usize,
    );

    pub fn as_f64(&self) -> ConvResult<f64> {
        convert::to_f64(&self.0)
    }

    pub fn as_f32(&self) -> ConvResult<f32> {
        convert::to_f32(&self.0)
    }

    pub fn as_bool(&self) -> ConvResult<bool> {
        convert::to_bool(&self.0)
    }

    pub fn as_str(&self) -> ConvResult<&str> {
        convert::to_str(&self.0)
    }

    pub fn to_string_value(&self) -> ConvResult<String> {
        self.as_str().map(str::to_string)
    }

    pub fn to_json(&self) -> serde_json::Value {
        self.0.to_json()
    }
}

impl PartialEq for Output {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl From<Value> for Output {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl From<Output> for Value {
    fn from(output: Output) -> Self {
        output.0
    }
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConversionKind;

    #[test]
    fn test_integer_accessors_narrow() {
        let out = Output::new(Value::Int(300));
        assert_eq!(out.as_i64(), Ok(300));
        assert_eq!(out.as_i16(), Ok(300));
        assert!(out.as_i8().unwrap_err().is_overflow());
        assert!(out.as_u8().unwrap_err().is_overflow());

        let negative = Output::new(Value::Int(-1));
        assert!(negative.as_u64().unwrap_err().is_underflow());
        assert!(negative.as_usize().unwrap_err().is_underflow());

        let big = Output::new(Value::Uint(u64::MAX));
        assert_eq!(big.as_u64(), Ok(u64::MAX));
        assert!(big.as_i64().unwrap_err().is_overflow());
    }

    #[test]
    fn test_float_accessors_accept_integers() {
        assert_eq!(Output::new(Value::Int(2)).as_f64(), Ok(2.0));
        assert_eq!(Output::new(Value::Uint(2)).as_f32(), Ok(2.0));
        assert_eq!(
            Output::new(Value::Float(1.5)).as_i64().unwrap_err().kind,
            ConversionKind::Unsupported
        );
    }

    #[test]
    fn test_bool_and_string_accessors_are_strict() {
        assert_eq!(Output::new(Value::Bool(true)).as_bool(), Ok(true));
        assert!(Output::new(Value::Int(1)).as_bool().is_err());
        assert_eq!(Output::new(Value::from("hi")).as_str(), Ok("hi"));
        assert_eq!(
            Output::new(Value::from("hi")).to_string_value(),
            Ok("hi".to_string())
        );
        assert!(Output::new(Value::Int(1)).as_str().is_err());
    }

    #[test]
    fn test_predicates_and_equality() {
        assert!(Output::default().is_nil());
        assert!(Output::default().is_zero());
        assert!(!Output::default().is_truthy());
        assert_eq!(Output::default(), Output::new(Value::Nil));
        assert_eq!(Output::new(Value::Int(1)), Output::new(Value::Float(1.0)));
        assert_ne!(Output::new(Value::Int(1)), Output::new(Value::Nil));
    }
}
