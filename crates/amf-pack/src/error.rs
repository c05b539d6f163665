//! Error types for encoding and decoding.

use std::fmt;

use amf_buffers::BufferError;
use thiserror::Error;

use crate::value::NodeId;

/// The reference table an index points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefTable {
    String,
    Object,
    Traits,
}

impl fmt::Display for RefTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RefTable::String => "string",
            RefTable::Object => "object",
            RefTable::Traits => "traits",
        })
    }
}

/// A decode failure. Always fatal for the message being decoded: no partial
/// message is returned alongside it.
///
/// `offset` is a byte offset into the binary input, or into the XML document
/// for the verbose codec.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MalformedInput {
    #[error("unexpected end of input at byte {offset}: {needed} more byte(s) needed")]
    UnexpectedEof { offset: usize, needed: usize },
    #[error("invalid UTF-8 at byte {offset}")]
    InvalidUtf8 { offset: usize },
    #[error("unknown {format} type marker 0x{marker:02x} at byte {offset}")]
    UnknownMarker {
        offset: usize,
        format: &'static str,
        marker: u8,
    },
    #[error("{table} reference {index} at byte {offset} is out of range (table holds {len})")]
    InvalidReference {
        offset: usize,
        table: RefTable,
        index: u32,
        len: usize,
    },
    #[error("unsupported envelope version {version}")]
    UnsupportedVersion { version: u16 },
    #[error("externalizable class {class_name:?} at byte {offset} cannot be decoded")]
    Externalizable { offset: usize, class_name: String },
    #[error("nesting exceeds {limit} levels at byte {offset}")]
    DepthExceeded { offset: usize, limit: usize },
    #[error("duplicate key {key:?} at byte {offset}")]
    DuplicateKey { offset: usize, key: String },
    #[error("{count} trailing byte(s) after the message at byte {offset}")]
    TrailingBytes { offset: usize, count: usize },
    #[error("XML syntax error at byte {offset}: {message}")]
    Xml { offset: usize, message: String },
    #[error("unknown tag <{tag}> at byte {offset}")]
    UnknownTag { offset: usize, tag: String },
    #[error("unexpected {found} at byte {offset}, expected {expected}")]
    Unexpected {
        offset: usize,
        expected: &'static str,
        found: String,
    },
    #[error("<{tag}> at byte {offset} is missing attribute {attribute:?}")]
    MissingAttribute {
        offset: usize,
        tag: &'static str,
        attribute: &'static str,
    },
    #[error("invalid {kind} literal {text:?} at byte {offset}")]
    InvalidLiteral {
        offset: usize,
        kind: &'static str,
        text: String,
    },
    #[error("<array> at byte {offset} declares length {declared} but holds {actual} element(s)")]
    LengthMismatch {
        offset: usize,
        declared: usize,
        actual: usize,
    },
}

impl MalformedInput {
    /// Position in the input where the problem was detected.
    pub fn offset(&self) -> usize {
        match self {
            MalformedInput::UnsupportedVersion { .. } => 0,
            MalformedInput::UnexpectedEof { offset, .. }
            | MalformedInput::InvalidUtf8 { offset }
            | MalformedInput::UnknownMarker { offset, .. }
            | MalformedInput::InvalidReference { offset, .. }
            | MalformedInput::Externalizable { offset, .. }
            | MalformedInput::DepthExceeded { offset, .. }
            | MalformedInput::DuplicateKey { offset, .. }
            | MalformedInput::TrailingBytes { offset, .. }
            | MalformedInput::Xml { offset, .. }
            | MalformedInput::UnknownTag { offset, .. }
            | MalformedInput::Unexpected { offset, .. }
            | MalformedInput::MissingAttribute { offset, .. }
            | MalformedInput::InvalidLiteral { offset, .. }
            | MalformedInput::LengthMismatch { offset, .. } => *offset,
        }
    }
}

impl From<BufferError> for MalformedInput {
    fn from(err: BufferError) -> Self {
        match err {
            BufferError::EndOfBuffer { offset, needed } => {
                MalformedInput::UnexpectedEof { offset, needed }
            }
            BufferError::InvalidUtf8 { offset } => MalformedInput::InvalidUtf8 { offset },
        }
    }
}

/// An encode failure: the message holds something neither wire format can
/// carry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UnsupportedValue {
    #[error("bare reference #{0} cannot be encoded")]
    Reference(u32),
    #[error("handle {id} does not name a {expected} in the heap")]
    DanglingHandle { id: NodeId, expected: &'static str },
    #[error("{what} of length {len} exceeds the limit of {limit}")]
    TooLong {
        what: &'static str,
        len: usize,
        limit: usize,
    },
    #[error("nesting exceeds {limit} levels")]
    DepthExceeded { limit: usize },
    #[error("envelope version {0} is not supported")]
    Version(u16),
}

/// Returned by [`OrderedCollection::set`](crate::value::OrderedCollection::set)
/// for an index past the collection's fixed length.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("index {index} is out of range for a collection of length {len}")]
pub struct IndexOutOfRange {
    pub index: usize,
    pub len: usize,
}

/// Returned by [`export_json`](crate::json::export_json) for graphs JSON
/// cannot express.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum JsonExportError {
    #[error("node {id} is part of a cycle")]
    Cycle { id: NodeId },
    #[error("{0} has no JSON representation")]
    NonFinite(f64),
    #[error("handle {id} does not name a {expected} in the heap")]
    DanglingHandle { id: NodeId, expected: &'static str },
    #[error("bare reference #{0} cannot be exported")]
    Reference(u32),
    #[error("nesting exceeds {limit} levels")]
    DepthExceeded { limit: usize },
}
