//! Per-pass reference tables.
//!
//! Both codecs keep three tables, as AMF3 does: strings, complex values
//! (records, collections, dates and byte arrays) and traits. An index is
//! assigned the first time a definition is written or read, depth-first and
//! before the definition's children, so the encoder's and decoder's
//! numbering line up. Empty strings are never tracked.
//!
//! Tables are created by each encode/decode call and dropped with it.

use std::collections::HashMap;
use std::hash::Hash;

use tracing::trace;

use crate::error::{MalformedInput, RefTable};
use crate::value::{NodeId, Value};

/// Encode side: key → index, in first-seen order.
#[derive(Debug)]
pub struct EncodeTable<K> {
    map: HashMap<K, u32>,
    next: u32,
}

impl<K> Default for EncodeTable<K> {
    fn default() -> Self {
        Self {
            map: HashMap::new(),
            next: 0,
        }
    }
}

impl<K: Hash + Eq> EncodeTable<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the index of `key` if it was seen before. Otherwise assigns it
    /// the next index and returns `None`: the caller must write the full
    /// definition.
    pub fn find_or_assign(&mut self, key: K) -> Option<u32> {
        if let Some(&index) = self.map.get(&key) {
            return Some(index);
        }
        self.map.insert(key, self.next);
        self.next += 1;
        None
    }

    /// Consumes an index for a definition that can never be referenced back.
    pub fn reserve(&mut self) -> u32 {
        let index = self.next;
        self.next += 1;
        index
    }

    /// Number of indices handed out.
    pub fn len(&self) -> usize {
        self.next as usize
    }

    pub fn is_empty(&self) -> bool {
        self.next == 0
    }
}

/// Decode side: an append-only list of definitions addressed by index.
#[derive(Debug)]
pub struct DecodeTable<T> {
    table: RefTable,
    slots: Vec<T>,
}

impl<T> DecodeTable<T> {
    pub fn new(table: RefTable) -> Self {
        Self {
            table,
            slots: Vec::new(),
        }
    }

    pub fn push(&mut self, value: T) -> u32 {
        self.slots.push(value);
        (self.slots.len() - 1) as u32
    }

    /// Resolves `index`; an index not yet defined is malformed input.
    pub fn get(&self, index: u32, offset: usize) -> Result<&T, MalformedInput> {
        let slot = self
            .slots
            .get(index as usize)
            .ok_or(MalformedInput::InvalidReference {
                offset,
                table: self.table,
                index,
                len: self.slots.len(),
            })?;
        trace!(table = %self.table, index, "resolved reference");
        Ok(slot)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Class descriptor shared by records of one shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Traits {
    /// Empty for anonymous records.
    pub class_name: String,
    /// Member names written positionally before any dynamic members.
    pub sealed: Vec<String>,
    pub dynamic: bool,
}

/// Key identifying traits on the encode side.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TraitsKey<'a> {
    pub class_name: &'a str,
    pub sealed: Vec<&'a str>,
}

/// The three encode tables of one pass. Strings borrow from the message.
#[derive(Debug, Default)]
pub struct EncodeTables<'a> {
    pub strings: EncodeTable<&'a str>,
    pub objects: EncodeTable<NodeId>,
    pub traits: EncodeTable<TraitsKey<'a>>,
}

impl<'a> EncodeTables<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a string. Empty strings are never tracked and always report
    /// `None`.
    pub fn string(&mut self, s: &'a str) -> Option<u32> {
        if s.is_empty() {
            return None;
        }
        let hit = self.strings.find_or_assign(s);
        if let Some(index) = hit {
            trace!(index, "string reference");
        }
        hit
    }

    pub fn object(&mut self, id: NodeId) -> Option<u32> {
        let hit = self.objects.find_or_assign(id);
        if let Some(index) = hit {
            trace!(index, node = %id, "object reference");
        }
        hit
    }
}

/// The three decode tables of one pass.
#[derive(Debug)]
pub struct DecodeTables {
    pub strings: DecodeTable<String>,
    pub objects: DecodeTable<Value>,
    pub traits: DecodeTable<Traits>,
}

impl Default for DecodeTables {
    fn default() -> Self {
        Self {
            strings: DecodeTable::new(RefTable::String),
            objects: DecodeTable::new(RefTable::Object),
            traits: DecodeTable::new(RefTable::Traits),
        }
    }
}

impl DecodeTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a decoded string unless it is empty.
    pub fn add_string(&mut self, s: &str) {
        if !s.is_empty() {
            self.strings.push(s.to_owned());
        }
    }
}
