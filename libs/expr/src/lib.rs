//! Ferrum Expr - an embeddable expression language for dynamic host values
//!
//! Expressions are compiled once and evaluated many times against arbitrary
//! data: JSON documents, serde-serialisable structs, or host types that
//! describe themselves as [`Record`]s. The language has no static types;
//! values carry their kind at runtime and operators promote numbers the way
//! the host would, but refuse to overflow or truncate silently.
//!
//! # Architecture Overview
//!
//! ```text
//! Expression String
//!      |
//!   Lexer -> Tokens (+ diagnostics)
//!      |
//!   Parser -> AST
//!      |
//! Analyzer -> Node tree (functions resolved, arity checked)
//!      |
//! Node::eval(Context) -> Value -> Output
//! ```
//!
//! # Example
//!
//! ```rust
//! use ferrum_expr::{compile, compile_with, CompileOptions};
//! use serde_json::json;
//!
//! let expr = compile("user.name.upper() + ' (' + string(user.age) + ')'").unwrap();
//! let out = expr.eval(json!({"user": {"name": "ada", "age": 36}})).unwrap();
//! assert_eq!(out.as_str().unwrap(), "ADA (36)");
//!
//! let options = CompileOptions::new().with_function("clamp", |x: i64, hi: i64| x.min(hi));
//! let expr = compile_with("clamp(score, 10)", options).unwrap();
//! assert_eq!(expr.eval(json!({"score": 42})).unwrap().as_i64().unwrap(), 10);
//! ```

pub mod analyzer;
pub mod ast;
pub mod builtins;
pub mod compare;
pub mod context;
pub mod convert;
pub mod engine;
pub mod error;
pub mod expr;
pub mod functions;
pub mod lexer;
pub mod output;
pub mod parser;
mod stack;
pub mod suggest;
pub mod token;
pub mod value;

// Re-export main types
pub use context::Context;
pub use convert::TypeTag;
pub use engine::{compile, compile_with, must_compile, CompileOptions, Engine, EngineOptions, Expr};
pub use error::{
    ArityError, ConversionError, ConversionKind, Diagnostic, Error, NameError, Result,
    SyntaxError, ZeroDivisor,
};
pub use functions::{Arity, Callable, Entry, Table, Variadic};
pub use output::Output;
pub use output::Output as EvalResult;
pub use value::{to_value, Field, IntoRecord, Kind, Opaque, Record, Value};
