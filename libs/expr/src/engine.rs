//! Compilation entry points and the caching engine
//!
//! Orchestrates the pipeline: Lexer → Parser → AST → Analyzer → [`Node`] tree.
//! A compiled [`Expr`] is immutable and cheap to clone, so it can be shared
//! across threads and evaluated concurrently.

use crate::analyzer::Analyzer;
use crate::builtins;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::expr::Node;
use crate::functions::{Arity, Callable, IntoFunction, Table};
use crate::output::Output;
use crate::parser::{self, MAX_RECURSION_DEPTH};
use crate::value::{self, Value};
use lru::LruCache;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

// ============================================================================
// Compile options
// ============================================================================

/// Options for [`compile_with`].
///
/// Functions added here are registered on a child of the base table, so they
/// shadow built-ins of the same name. Registration problems (invalid or
/// reserved names) are reported when compiling.
#[derive(Clone)]
pub struct CompileOptions {
    base: Option<Arc<Table>>,
    functions: Vec<PendingFunction>,
    /// Parser nesting limit.
    pub max_depth: usize,
}

#[derive(Clone)]
struct PendingFunction {
    name: String,
    callable: Arc<dyn Callable>,
    arity: Arity,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            base: None,
            functions: Vec::new(),
            max_depth: MAX_RECURSION_DEPTH,
        }
    }
}

impl fmt::Debug for CompileOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.functions.iter().map(|p| p.name.as_str()).collect();
        f.debug_struct("CompileOptions")
            .field("base", &self.base)
            .field("functions", &names)
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

impl CompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a typed host function.
    ///
    /// ```rust
    /// use ferrum_expr::{compile_with, CompileOptions, Value};
    ///
    /// let options = CompileOptions::new().with_function("double", |x: i64| x * 2);
    /// let expr = compile_with("double(21)", options).unwrap();
    /// assert_eq!(expr.eval(Value::Nil).unwrap().as_i64().unwrap(), 42);
    /// ```
    pub fn with_function<M, F>(mut self, name: &str, function: F) -> Self
    where
        F: IntoFunction<M>,
    {
        let (callable, arity) = function.into_function();
        self.functions.push(PendingFunction {
            name: name.to_string(),
            callable,
            arity,
        });
        self
    }

    /// Register an already adapted callable with an explicit arity.
    pub fn with_entry(mut self, name: &str, callable: Arc<dyn Callable>, arity: Arity) -> Self {
        self.functions.push(PendingFunction {
            name: name.to_string(),
            callable,
            arity,
        });
        self
    }

    /// Use `table` instead of the built-ins as the base table.
    pub fn with_table(mut self, table: Arc<Table>) -> Self {
        self.base = Some(table);
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// The table compilation resolves against.
    fn table(&self) -> Result<Arc<Table>> {
        let base = match &self.base {
            Some(base) => base.clone(),
            None => builtins::table()?,
        };
        if self.functions.is_empty() {
            return Ok(base);
        }
        let mut table = Table::child(base);
        for pending in &self.functions {
            table.register(&pending.name, pending.callable.clone(), pending.arity)?;
        }
        Ok(Arc::new(table))
    }
}

// ============================================================================
// Compilation
// ============================================================================

/// Compile `source` against the built-in functions.
pub fn compile(source: &str) -> Result<Expr> {
    compile_with(source, CompileOptions::default())
}

pub fn compile_with(source: &str, options: CompileOptions) -> Result<Expr> {
    let table = options.table()?;
    compile_in(source, &table, options.max_depth)
}

/// Compile an expression known to be valid, such as a literal in host code.
///
/// # Panics
///
/// Panics if `source` fails to compile.
pub fn must_compile(source: &str) -> Expr {
    match compile(source) {
        Ok(expr) => expr,
        Err(err) => panic!("must_compile({:?}): {}", source, err),
    }
}

fn compile_in(source: &str, table: &Table, max_depth: usize) -> Result<Expr> {
    let ast = parser::parse_with_depth(source, max_depth).map_err(|err| {
        tracing::debug!(source, error = %err, "parse failed");
        err
    })?;
    let root = Analyzer::new(table, max_depth).analyze(ast)?;
    tracing::debug!(source, "compiled expression");
    Ok(Expr {
        source: Arc::from(source),
        root: Arc::new(root),
    })
}

// ============================================================================
// Compiled expressions
// ============================================================================

/// A compiled expression.
///
/// `Display` and serde both use the original source text; deserializing
/// compiles it again against the built-ins.
#[derive(Debug, Clone)]
pub struct Expr {
    source: Arc<str>,
    root: Arc<Node>,
}

impl Expr {
    /// Evaluate against `value`, which becomes both root and cursor.
    pub fn eval(&self, value: impl Into<Value>) -> Result<Output> {
        let ctx = Context::new(value.into());
        self.root.eval(&ctx).map(Output::new)
    }

    /// Evaluate against any serde-serialisable host value.
    pub fn eval_serialize<T: Serialize + ?Sized>(&self, host: &T) -> Result<Output> {
        self.eval(value::to_value(host)?)
    }

    /// # Panics
    ///
    /// Panics if evaluation fails.
    pub fn must_eval(&self, value: impl Into<Value>) -> Output {
        match self.eval(value) {
            Ok(output) => output,
            Err(err) => panic!("must_eval({:?}): {}", self.source, err),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn node(&self) -> &Node {
        &self.root
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl FromStr for Expr {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        compile(s)
    }
}

impl Serialize for Expr {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for Expr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        compile(&source).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Engine
// ============================================================================

#[derive(Clone, Debug)]
pub struct EngineOptions {
    /// Number of compiled expressions kept in the LRU cache.
    pub cache_capacity: usize,
    pub max_depth: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            cache_capacity: 256,
            max_depth: MAX_RECURSION_DEPTH,
        }
    }
}

/// Compiles expressions against a fixed function table and caches the
/// results by source text.
///
/// ```rust
/// use ferrum_expr::Engine;
/// use serde_json::json;
///
/// let engine = Engine::new().unwrap();
/// let out = engine.evaluate("user.age >= 18", json!({"user": {"age": 30}})).unwrap();
/// assert!(out.as_bool().unwrap());
/// assert_eq!(engine.cached(), 1);
/// ```
pub struct Engine {
    table: Arc<Table>,
    max_depth: usize,
    cache: Mutex<LruCache<String, Expr>>,
}

impl Engine {
    /// An engine over the built-in functions.
    pub fn new() -> Result<Self> {
        Self::with_options(EngineOptions::default())
    }

    pub fn with_options(options: EngineOptions) -> Result<Self> {
        Ok(Self::with_table(builtins::table()?, options))
    }

    pub fn with_table(table: Arc<Table>, options: EngineOptions) -> Self {
        let capacity = NonZeroUsize::new(options.cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            table,
            max_depth: options.max_depth,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn table(&self) -> &Arc<Table> {
        &self.table
    }

    /// Compile `source`, reusing a cached expression when one exists.
    pub fn compile(&self, source: &str) -> Result<Expr> {
        {
            let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(expr) = cache.get(source) {
                tracing::trace!(source, "expression cache hit");
                return Ok(expr.clone());
            }
        }

        tracing::trace!(source, "expression cache miss");
        let expr = compile_in(source, &self.table, self.max_depth)?;

        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache.put(source.to_string(), expr.clone());
        Ok(expr)
    }

    /// Compile (or fetch) `source` and evaluate it against `value`.
    pub fn evaluate(&self, source: &str, value: impl Into<Value>) -> Result<Output> {
        self.compile(source)?.eval(value)
    }

    /// Number of cached expressions.
    pub fn cached(&self) -> usize {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn clear_cache(&self) {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("table", &self.table)
            .field("max_depth", &self.max_depth)
            .field("cached", &self.cached())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_compile_and_eval() {
        let expr = compile("1 + 2").unwrap();
        assert_eq!(expr.eval(Value::Nil).unwrap(), Output::new(Value::Int(3)));
        assert_eq!(expr.source(), "1 + 2");
        assert_eq!(expr.to_string(), "1 + 2");
    }

    #[test]
    fn test_caller_functions_shadow_builtins() {
        let options = CompileOptions::new().with_function("len", |_: String| 99i64);
        let expr = compile_with("len('abc')", options).unwrap();
        assert_eq!(expr.must_eval(Value::Nil).as_i64(), Ok(99));

        assert_eq!(compile("len('abc')").unwrap().must_eval(Value::Nil).as_i64(), Ok(3));
    }

    #[test]
    fn test_registration_errors_surface_at_compile() {
        let options = CompileOptions::new().with_function("and", || 1i64);
        assert!(matches!(
            compile_with("1", options),
            Err(Error::BadFunction(_))
        ));
    }

    #[test]
    fn test_with_table_replaces_builtins() {
        let mut table = Table::new();
        table.register_fn("one", || 1i64).unwrap();
        let options = CompileOptions::new().with_table(Arc::new(table));

        assert!(compile_with("one()", options.clone()).is_ok());
        let err = compile_with("len('x')", options).unwrap_err();
        assert!(err.name_error().is_some());
    }

    #[test]
    fn test_with_entry() {
        let callable: Arc<dyn Callable> =
            Arc::new(|args: &[Value]| -> Result<Value> { Ok(Value::from(args.len())) });
        let options = CompileOptions::new().with_entry("count", callable, Arity::AtLeast(0));
        let expr = compile_with("count(1, 2, 3)", options).unwrap();
        assert_eq!(expr.must_eval(Value::Nil).as_u64(), Ok(3));
    }

    #[test]
    fn test_from_str_and_serde_round_trip() {
        let expr: Expr = "a.b ?? 'none'".parse().unwrap();
        let text = serde_json::to_string(&expr).unwrap();
        assert_eq!(text, "\"a.b ?? 'none'\"");

        let back: Expr = serde_json::from_str(&text).unwrap();
        assert_eq!(back.source(), expr.source());
        assert_eq!(back.must_eval(json!({"a": {"b": null}})).as_str(), Ok("none"));

        assert!(serde_json::from_str::<Expr>("\"1 +\"").is_err());
    }

    #[test]
    fn test_eval_serialize() {
        #[derive(Serialize)]
        struct Repo {
            #[serde(rename = "fullName")]
            full_name: String,
        }
        let expr = compile("fullName.upper()").unwrap();
        let out = expr
            .eval_serialize(&Repo {
                full_name: "a/b".into(),
            })
            .unwrap();
        assert_eq!(out.as_str(), Ok("A/B"));
    }

    #[test]
    fn test_engine_caches_compiled_expressions() {
        let engine = Engine::with_options(EngineOptions {
            cache_capacity: 2,
            ..EngineOptions::default()
        })
        .unwrap();
        assert_eq!(engine.evaluate("1 + 1", Value::Nil).unwrap().as_i64(), Ok(2));
        assert_eq!(engine.evaluate("1 + 1", Value::Nil).unwrap().as_i64(), Ok(2));
        assert_eq!(engine.cached(), 1);

        engine.compile("2").unwrap();
        engine.compile("3").unwrap();
        assert_eq!(engine.cached(), 2);

        assert!(engine.compile("1 +").is_err());
        assert_eq!(engine.cached(), 2);

        engine.clear_cache();
        assert_eq!(engine.cached(), 0);
    }

    #[test]
    fn test_zero_capacity_still_caches_one() {
        let engine = Engine::with_options(EngineOptions {
            cache_capacity: 0,
            ..EngineOptions::default()
        })
        .unwrap();
        engine.compile("1").unwrap();
        assert_eq!(engine.cached(), 1);
    }

    #[test]
    fn test_expr_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Expr>();
        assert_send_sync::<Engine>();
    }
}
