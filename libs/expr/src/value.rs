//! Runtime values
//!
//! Expressions carry no static type information, so every host value is
//! adapted into [`Value`] before evaluation. Composite values sit behind `Arc`
//! so navigating into them clones pointers rather than data.

use crate::error::{ConversionError, ConversionKind};
use serde::Serialize;
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// A dynamically typed value.
#[derive(Clone, Default)]
pub enum Value {
    /// The absent value.
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    String(Arc<str>),
    Sequence(Arc<Vec<Value>>),
    Map(Arc<BTreeMap<String, Value>>),
    Record(Arc<Record>),
    Opaque(Opaque),
}

/// The runtime kind of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    Nil,
    Bool,
    Int,
    Uint,
    Float,
    String,
    Sequence,
    Map,
    Record,
    Opaque,
}

impl Kind {
    pub fn name(self) -> &'static str {
        match self {
            Kind::Nil => "nil",
            Kind::Bool => "bool",
            Kind::Int => "int",
            Kind::Uint => "uint",
            Kind::Float => "float",
            Kind::String => "string",
            Kind::Sequence => "sequence",
            Kind::Map => "map",
            Kind::Record => "record",
            Kind::Opaque => "opaque",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Kind::Int | Kind::Uint | Kind::Float)
    }

    pub fn is_integer(self) -> bool {
        matches!(self, Kind::Int | Kind::Uint)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Nil => Kind::Nil,
            Value::Bool(_) => Kind::Bool,
            Value::Int(_) => Kind::Int,
            Value::Uint(_) => Kind::Uint,
            Value::Float(_) => Kind::Float,
            Value::String(_) => Kind::String,
            Value::Sequence(_) => Kind::Sequence,
            Value::Map(_) => Kind::Map,
            Value::Record(_) => Kind::Record,
            Value::Opaque(_) => Kind::Opaque,
        }
    }

    /// Name used in error messages: the record or opaque type name where one
    /// exists, otherwise the kind.
    pub fn type_name(&self) -> &str {
        match self {
            Value::Record(record) => record.type_name(),
            Value::Opaque(opaque) => opaque.type_name(),
            other => other.kind().name(),
        }
    }

    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Value::String(s.into())
    }

    pub fn sequence<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::Sequence(Arc::new(items.into_iter().map(Into::into).collect()))
    }

    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Map(Arc::new(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Truthiness as used by logical operators, ternaries and `bool` casts
    /// of non-bool values.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Uint(u) => *u != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Sequence(items) => !items.is_empty(),
            Value::Map(entries) => !entries.is_empty(),
            Value::Record(_) => true,
            Value::Opaque(_) => true,
        }
    }

    /// Whether this is the zero value of its kind.
    pub fn is_zero(&self) -> bool {
        match self {
            Value::Nil => true,
            Value::Bool(b) => !*b,
            Value::Int(i) => *i == 0,
            Value::Uint(u) => *u == 0,
            Value::Float(f) => *f == 0.0,
            Value::String(s) => s.is_empty(),
            Value::Sequence(items) => items.is_empty(),
            Value::Map(entries) => entries.is_empty(),
            Value::Record(record) => record.fields.iter().all(|f| f.value.is_zero()),
            Value::Opaque(_) => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_ref()),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    /// The single kind shared by every element of a non-empty sequence.
    pub fn homogeneous_kind(&self) -> Option<Kind> {
        let items = self.as_sequence()?;
        let first = items.first()?.kind();
        items
            .iter()
            .all(|item| item.kind() == first)
            .then_some(first)
    }

    /// Convert to JSON for output. Records become objects keyed by their
    /// visible field names.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            Value::Nil => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(i) => Json::from(*i),
            Value::Uint(u) => Json::from(*u),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::String(s) => Json::String(s.to_string()),
            Value::Sequence(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(entries) => Json::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Value::Record(record) => Json::Object(
                record
                    .visible_fields()
                    .map(|f| (f.lookup_name().to_string(), f.value.to_json()))
                    .collect(),
            ),
            Value::Opaque(opaque) => Json::String(format!("<{}>", opaque.type_name())),
        }
    }
}

/// Convert any serde-serialisable host value.
///
/// Structs arrive as maps keyed by their serialised field names, so
/// `#[serde(rename)]` and `#[serde(skip)]` shape what expressions can see.
pub fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value, ConversionError> {
    serde_json::to_value(value)
        .map(Value::from)
        .map_err(|e| ConversionError::new(ConversionKind::Unsupported, e.to_string()))
}

// ============================================================================
// Records
// ============================================================================

/// A named-field value whose member names are fixed when it is built.
#[derive(Debug, Clone)]
pub struct Record {
    type_name: String,
    fields: Vec<Field>,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    /// Replaces `name` for member lookup when present.
    pub annotation: Option<String>,
    /// Hidden fields never resolve and never appear as suggestions.
    pub visible: bool,
    pub value: Value,
}

impl Field {
    /// The name member access matches against.
    pub fn lookup_name(&self) -> &str {
        self.annotation.as_deref().unwrap_or(&self.name)
    }
}

impl Record {
    pub fn builder(type_name: impl Into<String>) -> RecordBuilder {
        RecordBuilder {
            record: Record {
                type_name: type_name.into(),
                fields: Vec::new(),
            },
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn visible_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.visible)
    }

    /// Look up a visible field by its annotation or native name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.visible_fields()
            .find(|f| f.lookup_name() == name)
            .map(|f| &f.value)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

pub struct RecordBuilder {
    record: Record,
}

impl RecordBuilder {
    pub fn field(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(name.into(), None, true, value.into())
    }

    /// A field looked up by `annotation` instead of its native name.
    pub fn annotated(
        self,
        name: impl Into<String>,
        annotation: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.push(name.into(), Some(annotation.into()), true, value.into())
    }

    /// A field that takes part in comparison but is invisible to member and
    /// wildcard access.
    pub fn hidden(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(name.into(), None, false, value.into())
    }

    fn push(
        mut self,
        name: String,
        annotation: Option<String>,
        visible: bool,
        value: Value,
    ) -> Self {
        self.record.fields.push(Field {
            name,
            annotation,
            visible,
            value,
        });
        self
    }

    pub fn build(self) -> Record {
        self.record
    }
}

/// Host types that describe themselves as records.
///
/// ```rust
/// use ferrum_expr::{IntoRecord, Record, Value};
///
/// struct Event {
///     action: String,
///     token: String,
/// }
///
/// impl IntoRecord for Event {
///     fn to_record(&self) -> Record {
///         Record::builder("Event")
///             .field("action", self.action.as_str())
///             .hidden("token", self.token.as_str())
///             .build()
///     }
/// }
///
/// let event = Event { action: "opened".into(), token: "secret".into() };
/// let value = Value::record_of(&event);
/// assert_eq!(value.as_record().unwrap().get("action"), Some(&Value::from("opened")));
/// assert!(value.as_record().unwrap().get("token").is_none());
/// ```
pub trait IntoRecord {
    fn to_record(&self) -> Record;
}

impl Value {
    pub fn record_of<T: IntoRecord + ?Sized>(value: &T) -> Self {
        Value::Record(Arc::new(value.to_record()))
    }
}

// ============================================================================
// Opaque host values
// ============================================================================

/// A host value with no structure visible to expressions. It is truthy, can be
/// passed to functions, and is only equal to itself.
#[derive(Clone)]
pub struct Opaque {
    type_name: &'static str,
    inner: Arc<dyn Any + Send + Sync>,
}

impl Opaque {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            inner: Arc::new(value),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    pub(crate) fn address(&self) -> usize {
        Arc::as_ptr(&self.inner) as *const () as usize
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Opaque({})", self.type_name)
    }
}

// ============================================================================
// Formatting
// ============================================================================

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("Nil"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Int(i) => write!(f, "Int({})", i),
            Value::Uint(u) => write!(f, "Uint({})", u),
            Value::Float(x) => write!(f, "Float({:?})", x),
            Value::String(s) => write!(f, "String({:?})", s),
            Value::Sequence(items) => f.debug_list().entries(items.iter()).finish(),
            Value::Map(entries) => f.debug_map().entries(entries.iter()).finish(),
            Value::Record(record) => {
                let mut s = f.debug_struct(record.type_name());
                for field in &record.fields {
                    s.field(&field.name, &field.value);
                }
                s.finish()
            }
            Value::Opaque(opaque) => fmt::Debug::fmt(opaque, f),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Uint(u) => write!(f, "{}", u),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => f.write_str(s),
            Value::Sequence(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Map(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                f.write_str("}")
            }
            Value::Record(record) => {
                write!(f, "{}{{", record.type_name())?;
                for (i, field) in record.visible_fields().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", field.lookup_name(), field.value)?;
                }
                f.write_str("}")
            }
            Value::Opaque(opaque) => write!(f, "<{}>", opaque.type_name()),
        }
    }
}

// ============================================================================
// Host conversions
// ============================================================================

macro_rules! from_signed {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Int(v as i64)
            }
        })*
    };
}

macro_rules! from_unsigned {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Uint(v as u64)
            }
        })*
    };
}

from_signed!(i8, i16, i32, i64, isize);
from_unsigned!(u8, u16, u32, u64, usize);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(Arc::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(Arc::from(v))
    }
}

impl From<Arc<str>> for Value {
    fn from(v: Arc<str>) -> Self {
        Value::String(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::sequence(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Nil)
    }
}

impl<K: Into<String>, T: Into<Value>> From<BTreeMap<K, T>> for Value {
    fn from(v: BTreeMap<K, T>) -> Self {
        Value::map(v)
    }
}

impl<K: Into<String>, T: Into<Value>, S> From<HashMap<K, T, S>> for Value {
    fn from(v: HashMap<K, T, S>) -> Self {
        Value::map(v)
    }
}

impl From<Record> for Value {
    fn from(v: Record) -> Self {
        Value::Record(Arc::new(v))
    }
}

impl From<Opaque> for Value {
    fn from(v: Opaque) -> Self {
        Value::Opaque(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match v {
            Json::Null => Value::Nil,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::Uint(u)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Json::String(s) => Value::from(s),
            Json::Array(items) => Value::sequence(items),
            Json::Object(entries) => Value::map(entries),
        }
    }
}

impl From<&serde_json::Value> for Value {
    fn from(v: &serde_json::Value) -> Self {
        Value::from(v.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Nil.is_truthy());
        assert!(Value::Bool(true).is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(Value::Int(-1).is_truthy());
        assert!(!Value::Uint(0).is_truthy());
        assert!(Value::Float(0.5).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::from("x").is_truthy());
        assert!(!Value::sequence(Vec::<i64>::new()).is_truthy());
        assert!(Value::sequence([1]).is_truthy());
        assert!(Value::from(Record::builder("Empty").build()).is_truthy());
        assert!(Value::from(Opaque::new(3u8)).is_truthy());
    }

    #[test]
    fn test_is_zero() {
        assert!(Value::Nil.is_zero());
        assert!(Value::Float(0.0).is_zero());
        assert!(!Value::from("a").is_zero());
        let record = Record::builder("R").field("a", 0).field("b", "").build();
        assert!(Value::from(record).is_zero());
    }

    #[test]
    fn test_record_lookup_prefers_annotation_and_skips_hidden() {
        let record = Record::builder("Event")
            .annotated("PullRequest", "pull_request", 1)
            .field("action", "opened")
            .hidden("secret", "x")
            .build();

        assert_eq!(record.get("pull_request"), Some(&Value::Int(1)));
        assert!(record.get("PullRequest").is_none());
        assert!(record.get("secret").is_none());
        assert_eq!(record.visible_fields().count(), 2);
    }

    #[test]
    fn test_from_json() {
        let v = Value::from(json!({"a": [1, -2, 1.5, "x", null], "big": 18446744073709551615u64}));
        let map = v.as_map().unwrap();
        let a = map["a"].as_sequence().unwrap();
        assert!(matches!(a[0], Value::Int(1)));
        assert!(matches!(a[1], Value::Int(-2)));
        assert!(matches!(a[2], Value::Float(f) if f == 1.5));
        assert_eq!(a[3].as_str(), Some("x"));
        assert!(a[4].is_nil());
        assert!(matches!(map["big"], Value::Uint(u64::MAX)));
    }

    #[test]
    fn test_to_json_hides_hidden_fields() {
        let record = Record::builder("User")
            .annotated("Name", "name", "ada")
            .hidden("password", "x")
            .build();
        assert_eq!(Value::from(record).to_json(), json!({"name": "ada"}));
    }

    #[test]
    fn test_homogeneous_kind() {
        assert_eq!(Value::sequence([1, 2]).homogeneous_kind(), Some(Kind::Int));
        let mixed = Value::sequence([Value::Int(1), Value::from("a")]);
        assert_eq!(mixed.homogeneous_kind(), None);
        assert_eq!(Value::Int(1).homogeneous_kind(), None);
    }

    #[test]
    fn test_to_value_from_serialize() {
        #[derive(Serialize)]
        struct Repo {
            #[serde(rename = "fullName")]
            full_name: String,
            #[serde(skip)]
            #[allow(dead_code)]
            token: String,
        }

        let v = to_value(&Repo {
            full_name: "a/b".into(),
            token: "t".into(),
        })
        .unwrap();
        let map = v.as_map().unwrap();
        assert_eq!(map["fullName"].as_str(), Some("a/b"));
        assert!(!map.contains_key("token"));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Float(1.0).to_string(), "1");
        assert_eq!(Value::Float(0.25).to_string(), "0.25");
        assert_eq!(Value::sequence([1, 2]).to_string(), "[1, 2]");
    }
}
