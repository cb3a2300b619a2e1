//! Error types for the expression engine
//!
//! Every failure surfaces as an [`Error`] returned from `compile` or `eval`.
//! Compile-time failures are [`Error::Syntax`] and [`Error::Semantic`]; all
//! other variants are raised while evaluating.

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Expression compile and evaluation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("syntax error: {0}")]
    Syntax(SyntaxError),

    #[error("semantic error: {0}")]
    Semantic(Box<Error>),

    #[error(transparent)]
    Name(#[from] NameError),

    #[error("incompatible operands: {0}")]
    IncompatibleOperands(String),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error(transparent)]
    Arity(#[from] ArityError),

    #[error("bad argument: argument {index} must be of type {expected}, got {actual}")]
    BadArgument {
        index: usize,
        expected: String,
        actual: String,
    },

    #[error("{0}")]
    DivisionByZero(ZeroDivisor),

    #[error("bad function: {0}")]
    BadFunction(String),

    #[error("{0}")]
    Index(String),

    #[error("{0}")]
    Slice(String),

    #[error("{0}")]
    Wildcard(String),

    #[error("expression too deeply nested (max depth: {0})")]
    TooDeep(usize),

    #[error("unary '{operator}': not applicable to {kind}")]
    Unary { operator: &'static str, kind: String },

    #[error(transparent)]
    Host(HostError),
}

impl Error {
    /// Wrap a compile-time failure (unresolved function, arity mismatch).
    pub fn semantic(inner: impl Into<Error>) -> Self {
        Error::Semantic(Box::new(inner.into()))
    }

    /// Wrap a failure raised by a host function.
    pub fn host<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Host(HostError(Arc::new(err)))
    }

    pub(crate) fn incompatible(message: impl Into<String>) -> Self {
        Error::IncompatibleOperands(message.into())
    }

    /// The name error carried by this error, looking through semantic wrappers.
    pub fn name_error(&self) -> Option<&NameError> {
        match self {
            Error::Name(err) => Some(err),
            Error::Semantic(inner) => inner.name_error(),
            _ => None,
        }
    }

    /// The conversion error carried by this error, if any.
    pub fn conversion_error(&self) -> Option<&ConversionError> {
        match self {
            Error::Conversion(err) => Some(err),
            Error::Semantic(inner) => inner.conversion_error(),
            _ => None,
        }
    }

    pub fn is_compile_error(&self) -> bool {
        matches!(self, Error::Syntax(_) | Error::Semantic(_))
    }
}

impl From<String> for Error {
    fn from(message: String) -> Self {
        Error::Host(HostError(Arc::new(Message(message))))
    }
}

impl From<&str> for Error {
    fn from(message: &str) -> Self {
        Error::from(message.to_string())
    }
}

impl From<HostError> for Error {
    fn from(err: HostError) -> Self {
        Error::Host(err)
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for Error {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Error::Host(HostError(Arc::from(err)))
    }
}

// ============================================================================
// Syntax errors
// ============================================================================

/// One lexical or parse problem at a source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)
    }
}

/// All lexer and parser diagnostics for one source string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub diagnostics: Vec<Diagnostic>,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, diagnostic) in self.diagnostics.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", diagnostic)?;
        }
        Ok(())
    }
}

// ============================================================================
// Name errors
// ============================================================================

/// A member, key or function name that does not exist, with "did you mean"
/// suggestions drawn from the names that do.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct NameError {
    pub name: String,
    pub suggestions: Vec<String>,
}

impl NameError {
    /// Build a name error, ranking `candidates` by edit distance to `name`.
    pub fn new<I, S>(name: impl Into<String>, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let name = name.into();
        let suggestions = crate::suggest::suggestions(&name, candidates);
        Self { name, suggestions }
    }
}

impl fmt::Display for NameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown name: '{}' does not exist", self.name)?;
        match self.suggestions.as_slice() {
            [] => Ok(()),
            [only] => write!(f, ", did you mean '{}'?", only),
            many => write!(f, ", did you mean one of '{}'?", many.join("', '")),
        }
    }
}

// ============================================================================
// Conversion errors
// ============================================================================

/// Why a conversion failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionKind {
    /// Magnitude too large for the target.
    Overflow,
    /// Negative where unsigned was expected, or below a narrower signed minimum.
    Underflow,
    /// A string did not parse as the target type.
    Syntax,
    /// The source kind cannot be converted to the target at all.
    Unsupported,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ConversionError {
    pub kind: ConversionKind,
    pub message: String,
}

impl ConversionError {
    pub fn new(kind: ConversionKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn overflow(message: impl Into<String>) -> Self {
        Self::new(ConversionKind::Overflow, message)
    }

    pub fn underflow(message: impl Into<String>) -> Self {
        Self::new(ConversionKind::Underflow, message)
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(ConversionKind::Syntax, message)
    }

    pub fn unsupported(from: impl fmt::Display, to: impl fmt::Display) -> Self {
        Self::new(
            ConversionKind::Unsupported,
            format!("cannot convert {} to {}", from, to),
        )
    }

    pub fn is_overflow(&self) -> bool {
        self.kind == ConversionKind::Overflow
    }

    pub fn is_underflow(&self) -> bool {
        self.kind == ConversionKind::Underflow
    }
}

// ============================================================================
// Invocation errors
// ============================================================================

/// Wrong number of arguments passed to a function.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("bad arity: {name} expects {expected} argument(s), got {actual}")]
pub struct ArityError {
    pub name: String,
    pub expected: String,
    pub actual: usize,
}

/// Which operator hit a zero divisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZeroDivisor {
    Division,
    Modulo,
}

impl fmt::Display for ZeroDivisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZeroDivisor::Division => f.write_str("division by zero"),
            ZeroDivisor::Modulo => f.write_str("modulo by zero"),
        }
    }
}

/// An error returned by a host function, passed through unchanged.
#[derive(Debug, Clone)]
pub struct HostError(Arc<dyn std::error::Error + Send + Sync>);

impl HostError {
    pub fn inner(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.0.as_ref()
    }
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for HostError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl PartialEq for HostError {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.to_string() == other.0.to_string()
    }
}

#[derive(Debug)]
struct Message(String);

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for Message {}
