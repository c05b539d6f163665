//! The value model: [`Value`], the arena [`Heap`] that owns records and
//! collections, and graph equality.
//!
//! Records and collections never own each other. A [`Value::Record`] or
//! [`Value::Collection`] is a [`NodeId`] into the message's heap, so shared
//! subtrees and cycles are ordinary data and identity is the handle itself.

mod collection;
mod equal;
mod heap;
mod record;

pub use collection::OrderedCollection;
pub use equal::{equals, first_difference, Mismatch};
pub use heap::{Heap, Node, NodeId};
pub use record::DynamicRecord;

/// A wire-representable value.
///
/// The derived `PartialEq` is shallow: handles compare by identity and NaN
/// is unequal to itself. Use [`equals`] to compare graphs.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Integer(i32),
    Double(f64),
    String(String),
    /// Milliseconds since the Unix epoch, UTC.
    Date(f64),
    ByteArray(Vec<u8>),
    Record(NodeId),
    Collection(NodeId),
    /// Wire-level back reference. Decoders resolve references to handles and
    /// never produce this; encoders reject it.
    Reference(u32),
}

/// Discriminant of a [`Value`], used for codec dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Boolean,
    Integer,
    Double,
    String,
    Date,
    ByteArray,
    Record,
    Collection,
    Reference,
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Integer(_) => ValueKind::Integer,
            Value::Double(_) => ValueKind::Double,
            Value::String(_) => ValueKind::String,
            Value::Date(_) => ValueKind::Date,
            Value::ByteArray(_) => ValueKind::ByteArray,
            Value::Record(_) => ValueKind::Record,
            Value::Collection(_) => ValueKind::Collection,
            Value::Reference(_) => ValueKind::Reference,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// The heap handle of a record or collection.
    pub fn node_id(&self) -> Option<NodeId> {
        match self {
            Value::Record(id) | Value::Collection(id) => Some(*id),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Double(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::ByteArray(bytes)
    }
}
