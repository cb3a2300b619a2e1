#![allow(dead_code)]

use ferrum_expr::{Engine, Error, Output, Value};
use std::sync::OnceLock;

static ENGINE: OnceLock<Engine> = OnceLock::new();

/// Shared engine over the built-in functions.
pub fn engine() -> &'static Engine {
    ENGINE.get_or_init(|| Engine::new().expect("built-in table"))
}

pub fn eval(source: &str, data: serde_json::Value) -> Result<Output, Error> {
    engine().evaluate(source, data)
}

pub fn eval_ok(source: &str, data: serde_json::Value) -> Value {
    eval(source, data)
        .unwrap_or_else(|e| panic!("failed to evaluate {:?}: {}", source, e))
        .into_value()
}

pub fn eval_nil(source: &str) -> Value {
    eval_ok(source, serde_json::Value::Null)
}

pub fn eval_err(source: &str, data: serde_json::Value) -> Error {
    match eval(source, data) {
        Ok(out) => panic!("expected {:?} to fail, got {:?}", source, out),
        Err(err) => err,
    }
}
