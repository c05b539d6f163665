//! Conversions between value graphs and `serde_json` trees.
//!
//! Import always produces a tree. Export accepts shared subtrees, writing
//! them once per occurrence, but rejects cycles.

use std::collections::HashSet;

use serde_json::{Map, Number};

use crate::error::JsonExportError;
use crate::value::{DynamicRecord, Heap, NodeId, OrderedCollection, Value};

/// Nesting limit of [`export_json`].
pub const MAX_EXPORT_DEPTH: usize = 256;

/// Builds a value from JSON, allocating records and collections in `heap`.
///
/// Numbers that fit an `i32` become [`Value::Integer`]; all others become
/// [`Value::Double`]. Object key order is kept.
pub fn import_json(heap: &mut Heap, json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(*b),
        serde_json::Value::Number(n) => match n.as_i64().map(i32::try_from) {
            Some(Ok(int)) => Value::Integer(int),
            _ => Value::Double(n.as_f64().unwrap_or(f64::NAN)),
        },
        serde_json::Value::String(s) => Value::String(s.clone()),
        serde_json::Value::Array(items) => {
            let items: OrderedCollection = items.iter().map(|v| import_json(heap, v)).collect();
            heap.alloc_collection(items)
        }
        serde_json::Value::Object(entries) => {
            let mut record = DynamicRecord::new();
            for (key, value) in entries {
                let value = import_json(heap, value);
                record.insert(key.as_str(), value);
            }
            heap.alloc_record(record)
        }
    }
}

/// Renders a value as JSON. Dates become their millisecond number, byte
/// arrays arrays of numbers. Class names are dropped.
pub fn export_json(heap: &Heap, value: &Value) -> Result<serde_json::Value, JsonExportError> {
    Exporter {
        heap,
        path: HashSet::new(),
    }
    .export(value)
}

struct Exporter<'a> {
    heap: &'a Heap,
    /// Nodes on the path from the root to the current value.
    path: HashSet<NodeId>,
}

fn number(f: f64) -> Result<serde_json::Value, JsonExportError> {
    Number::from_f64(f)
        .map(serde_json::Value::Number)
        .ok_or(JsonExportError::NonFinite(f))
}

impl Exporter<'_> {
    fn export(&mut self, value: &Value) -> Result<serde_json::Value, JsonExportError> {
        let heap = self.heap;
        Ok(match value {
            Value::Null => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Double(f) | Value::Date(f) => number(*f)?,
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::ByteArray(bytes) => {
                serde_json::Value::Array(bytes.iter().map(|b| serde_json::Value::from(*b)).collect())
            }
            Value::Record(id) => {
                let record = heap.record(*id).ok_or(JsonExportError::DanglingHandle {
                    id: *id,
                    expected: "record",
                })?;
                self.enter(*id)?;
                let mut map = Map::with_capacity(record.len());
                for (key, value) in record.iter() {
                    map.insert(key.to_owned(), self.export(value)?);
                }
                self.path.remove(id);
                serde_json::Value::Object(map)
            }
            Value::Collection(id) => {
                let collection = heap.collection(*id).ok_or(JsonExportError::DanglingHandle {
                    id: *id,
                    expected: "collection",
                })?;
                self.enter(*id)?;
                let items = collection
                    .iter()
                    .map(|v| self.export(v))
                    .collect::<Result<Vec<_>, _>>()?;
                self.path.remove(id);
                serde_json::Value::Array(items)
            }
            Value::Reference(index) => return Err(JsonExportError::Reference(*index)),
        })
    }

    fn enter(&mut self, id: NodeId) -> Result<(), JsonExportError> {
        if self.path.len() >= MAX_EXPORT_DEPTH {
            return Err(JsonExportError::DepthExceeded {
                limit: MAX_EXPORT_DEPTH,
            });
        }
        if !self.path.insert(id) {
            return Err(JsonExportError::Cycle { id });
        }
        Ok(())
    }
}
