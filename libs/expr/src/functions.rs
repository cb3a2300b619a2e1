//! Function invocation table
//!
//! Maps function names to callables with an [`Arity`] contract. Tables chain
//! to a parent so caller-supplied functions can be layered over the built-ins
//! without mutating them.
//!
//! Typed host functions are adapted once at registration: parameter types
//! implement [`FromValue`], return types implement [`IntoCallResult`], and the
//! arity is derived from the signature. A trailing [`Variadic`] parameter
//! makes the function accept any number of extra arguments.

use crate::error::{ArityError, Error, Result};
use crate::value::{Record, Value};
use smallvec::SmallVec;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Argument buffer used when evaluating calls.
pub type Args = SmallVec<[Value; 4]>;

/// How many arguments a function accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exactly(n) => count == n,
            Arity::AtLeast(n) => count >= n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exactly(n) => write!(f, "exactly {}", n),
            Arity::AtLeast(n) => write!(f, "at least {}", n),
        }
    }
}

/// The uniform calling convention every registered function is adapted to.
pub trait Callable: Send + Sync {
    fn call(&self, args: &[Value]) -> Result<Value>;
}

impl<F> Callable for F
where
    F: Fn(&[Value]) -> Result<Value> + Send + Sync,
{
    fn call(&self, args: &[Value]) -> Result<Value> {
        self(args)
    }
}

/// A resolved function: callable plus arity.
#[derive(Clone)]
pub struct Entry {
    name: Arc<str>,
    callable: Arc<dyn Callable>,
    arity: Arity,
}

impl Entry {
    pub fn new(name: impl Into<Arc<str>>, callable: Arc<dyn Callable>, arity: Arity) -> Self {
        Self {
            name: name.into(),
            callable,
            arity,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> Arity {
        self.arity
    }

    pub fn check_arity(&self, count: usize) -> std::result::Result<(), ArityError> {
        if self.arity.accepts(count) {
            return Ok(());
        }
        Err(ArityError {
            name: self.name.to_string(),
            expected: self.arity.to_string(),
            actual: count,
        })
    }

    /// Call the function after checking the argument count. Failures from
    /// the callable are returned unchanged.
    pub fn invoke(&self, args: &[Value]) -> Result<Value> {
        self.check_arity(args.len())?;
        tracing::trace!(function = %self.name, args = args.len(), "invoking function");
        self.callable.call(args)
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// Name to [`Entry`] map with an optional parent.
#[derive(Default)]
pub struct Table {
    entries: HashMap<String, Entry>,
    parent: Option<Arc<Table>>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty table whose lookup misses fall through to `parent`.
    pub fn child(parent: Arc<Table>) -> Self {
        Self {
            entries: HashMap::new(),
            parent: Some(parent),
        }
    }

    pub fn parent(&self) -> Option<&Arc<Table>> {
        self.parent.as_ref()
    }

    /// Store a callable under `name`, replacing any entry of that name in this
    /// table. Parent entries are shadowed, not touched.
    pub fn register(
        &mut self,
        name: &str,
        callable: Arc<dyn Callable>,
        arity: Arity,
    ) -> Result<&mut Self> {
        validate_name(name)?;
        self.entries
            .insert(name.to_string(), Entry::new(name, callable, arity));
        Ok(self)
    }

    /// Adapt and register a typed host function.
    ///
    /// ```rust
    /// use ferrum_expr::functions::{Arity, Table, Variadic};
    ///
    /// let mut table = Table::new();
    /// table.register_fn("double", |x: i64| x * 2).unwrap();
    /// table
    ///     .register_fn("sum", |xs: Variadic<i64>| xs.iter().sum::<i64>())
    ///     .unwrap();
    ///
    /// assert_eq!(table.lookup("double").unwrap().arity(), Arity::Exactly(1));
    /// assert_eq!(table.lookup("sum").unwrap().arity(), Arity::AtLeast(0));
    /// ```
    pub fn register_fn<M, F>(&mut self, name: &str, function: F) -> Result<&mut Self>
    where
        F: IntoFunction<M>,
    {
        let (callable, arity) = function.into_function();
        self.register(name, callable, arity)
    }

    /// Find `name` here or in the nearest ancestor that defines it.
    pub fn lookup(&self, name: &str) -> Option<&Entry> {
        match self.entries.get(name) {
            Some(entry) => Some(entry),
            None => self.parent.as_ref().and_then(|p| p.lookup(name)),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Every name visible from this table, own names first. A shadowed name
    /// appears once per table that defines it.
    pub fn function_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        if let Some(parent) = &self.parent {
            names.extend(parent.function_names());
        }
        names
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("Table")
            .field("entries", &names)
            .field("parent", &self.parent)
            .finish()
    }
}

fn validate_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if !valid {
        return Err(Error::BadFunction(format!(
            "function name {:?} is not a valid identifier",
            name
        )));
    }
    if crate::lexer::is_keyword(name) {
        return Err(Error::BadFunction(format!(
            "function name {:?} is a reserved word",
            name
        )));
    }
    Ok(())
}

// ============================================================================
// Typed parameters
// ============================================================================

/// Types a function parameter can be declared as.
///
/// `from_value` returns `None` when the argument is not assignable, which the
/// adapter reports as a bad-argument error.
pub trait FromValue: Sized {
    fn expected() -> String;

    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for Value {
    fn expected() -> String {
        "any".to_string()
    }

    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromValue for bool {
    fn expected() -> String {
        "bool".to_string()
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

macro_rules! integer_param {
    ($($t:ty),*) => {
        $(impl FromValue for $t {
            fn expected() -> String {
                <$t as crate::convert::IntTarget>::NAME.to_string()
            }

            fn from_value(value: &Value) -> Option<Self> {
                crate::convert::to_int::<$t>(value).ok()
            }
        })*
    };
}

integer_param!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl FromValue for f64 {
    fn expected() -> String {
        "float64".to_string()
    }

    fn from_value(value: &Value) -> Option<Self> {
        crate::convert::to_f64(value).ok()
    }
}

impl FromValue for f32 {
    fn expected() -> String {
        "float32".to_string()
    }

    fn from_value(value: &Value) -> Option<Self> {
        crate::convert::to_f32(value).ok()
    }
}

impl FromValue for String {
    fn expected() -> String {
        "string".to_string()
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl FromValue for Arc<str> {
    fn expected() -> String {
        "string".to_string()
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FromValue for Arc<Record> {
    fn expected() -> String {
        "record".to_string()
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Record(r) => Some(r.clone()),
            _ => None,
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn expected() -> String {
        format!("sequence of {}", T::expected())
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_sequence()?.iter().map(T::from_value).collect()
    }
}

impl<T: FromValue> FromValue for BTreeMap<String, T> {
    fn expected() -> String {
        format!("map of {}", T::expected())
    }

    fn from_value(value: &Value) -> Option<Self> {
        value
            .as_map()?
            .iter()
            .map(|(k, v)| T::from_value(v).map(|v| (k.clone(), v)))
            .collect()
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn expected() -> String {
        format!("optional {}", T::expected())
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Nil => Some(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// Trailing parameter that collects every remaining argument.
#[derive(Debug, Clone, PartialEq)]
pub struct Variadic<T>(pub Vec<T>);

impl<T> Variadic<T> {
    pub fn into_inner(self) -> Vec<T> {
        self.0
    }
}

impl<T> std::ops::Deref for Variadic<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.0
    }
}

fn argument<T: FromValue>(args: &[Value], index: usize) -> Result<T> {
    let value = args.get(index).unwrap_or(&Value::Nil);
    T::from_value(value).ok_or_else(|| Error::BadArgument {
        index,
        expected: T::expected(),
        actual: value.type_name().to_string(),
    })
}

fn rest<T: FromValue>(args: &[Value], start: usize) -> Result<Variadic<T>> {
    (start..args.len())
        .map(|index| argument::<T>(args, index))
        .collect::<Result<Vec<T>>>()
        .map(Variadic)
}

// ============================================================================
// Typed results
// ============================================================================

/// Return types a host function may declare: any value convertible into
/// [`Value`], or a `Result` whose error is passed through verbatim.
pub trait IntoCallResult {
    fn into_call_result(self) -> Result<Value>;
}

macro_rules! call_result_via_from {
    ($($t:ty),*) => {
        $(impl IntoCallResult for $t {
            fn into_call_result(self) -> Result<Value> {
                Ok(Value::from(self))
            }
        })*
    };
}

call_result_via_from!(
    bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, String, &'static str,
    Arc<str>, Record
);

impl IntoCallResult for Value {
    fn into_call_result(self) -> Result<Value> {
        Ok(self)
    }
}

impl<T: Into<Value>> IntoCallResult for Vec<T> {
    fn into_call_result(self) -> Result<Value> {
        Ok(Value::from(self))
    }
}

impl<T: Into<Value>> IntoCallResult for Option<T> {
    fn into_call_result(self) -> Result<Value> {
        Ok(Value::from(self))
    }
}

impl<T: Into<Value>> IntoCallResult for BTreeMap<String, T> {
    fn into_call_result(self) -> Result<Value> {
        Ok(Value::from(self))
    }
}

impl<T: Into<Value>> IntoCallResult for HashMap<String, T> {
    fn into_call_result(self) -> Result<Value> {
        Ok(Value::from(self))
    }
}

impl<T, E> IntoCallResult for std::result::Result<T, E>
where
    T: IntoCallResult,
    E: Into<Error>,
{
    fn into_call_result(self) -> Result<Value> {
        match self {
            Ok(value) => value.into_call_result(),
            Err(err) => Err(err.into()),
        }
    }
}

// ============================================================================
// Signature adaptation
// ============================================================================

/// Marker for functions with a fixed parameter list.
pub struct Fixed;

/// Marker for functions ending in a [`Variadic`] parameter.
pub struct Varargs;

/// Host functions that can be adapted into a [`Callable`].
///
/// `M` only disambiguates the blanket implementations; callers never name it.
pub trait IntoFunction<M>: Send + Sync + 'static {
    fn into_function(self) -> (Arc<dyn Callable>, Arity);
}

macro_rules! count {
    () => { 0usize };
    ($head:ident $($tail:ident)*) => { 1usize + count!($($tail)*) };
}

macro_rules! impl_into_function {
    ($($arg:ident),*) => {
        impl<F, R, $($arg,)*> IntoFunction<(Fixed, R, $($arg,)*)> for F
        where
            F: Fn($($arg),*) -> R + Send + Sync + 'static,
            R: IntoCallResult,
            $($arg: FromValue,)*
        {
            #[allow(non_snake_case, unused_mut, unused_variables, unused_assignments)]
            fn into_function(self) -> (Arc<dyn Callable>, Arity) {
                let callable = move |args: &[Value]| -> Result<Value> {
                    let mut index = 0usize;
                    $(
                        let $arg = argument::<$arg>(args, index)?;
                        index += 1;
                    )*
                    (self)($($arg),*).into_call_result()
                };
                (Arc::new(callable), Arity::Exactly(count!($($arg)*)))
            }
        }

        impl<F, R, $($arg,)* V> IntoFunction<(Varargs, R, $($arg,)* V)> for F
        where
            F: Fn($($arg,)* Variadic<V>) -> R + Send + Sync + 'static,
            R: IntoCallResult,
            $($arg: FromValue,)*
            V: FromValue,
        {
            #[allow(non_snake_case, unused_mut, unused_variables, unused_assignments)]
            fn into_function(self) -> (Arc<dyn Callable>, Arity) {
                let callable = move |args: &[Value]| -> Result<Value> {
                    let mut index = 0usize;
                    $(
                        let $arg = argument::<$arg>(args, index)?;
                        index += 1;
                    )*
                    let tail = rest::<V>(args, index)?;
                    (self)($($arg,)* tail).into_call_result()
                };
                (Arc::new(callable), Arity::AtLeast(count!($($arg)*)))
            }
        }
    };
}

impl_into_function!();
impl_into_function!(A1);
impl_into_function!(A1, A2);
impl_into_function!(A1, A2, A3);
impl_into_function!(A1, A2, A3, A4);
impl_into_function!(A1, A2, A3, A4, A5);
impl_into_function!(A1, A2, A3, A4, A5, A6);
