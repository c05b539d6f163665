//! Structural equality of value graphs that may live in different heaps.

use std::collections::HashSet;
use std::fmt;

use super::{Heap, NodeId, Value};

/// The first difference found between two graphs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    /// Location of the difference, e.g. `$.prop0[2]`.
    pub path: String,
    pub reason: String,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.reason)
    }
}

impl std::error::Error for Mismatch {}

fn mismatch(path: String, reason: impl Into<String>) -> Option<Mismatch> {
    Some(Mismatch {
        path,
        reason: reason.into(),
    })
}

/// NaN equals NaN; otherwise bit equality, so `0.0` and `-0.0` differ.
fn same_double(a: f64, b: f64) -> bool {
    (a.is_nan() && b.is_nan()) || a.to_bits() == b.to_bits()
}

/// Returns `true` when `a` (in `heap_a`) and `b` (in `heap_b`) are the same
/// graph: equal primitives, records with the same class name and the same
/// keys in the same order, collections of the same length, all compared
/// recursively.
///
/// Cycles terminate: a pair of nodes already under comparison is taken as
/// equal, so two self-referential graphs of the same shape compare equal.
pub fn equals(heap_a: &Heap, a: &Value, heap_b: &Heap, b: &Value) -> bool {
    first_difference(heap_a, a, heap_b, b).is_none()
}

/// Like [`equals`], but reports where the graphs first differ.
pub fn first_difference(heap_a: &Heap, a: &Value, heap_b: &Heap, b: &Value) -> Option<Mismatch> {
    let mut visited: HashSet<(NodeId, NodeId)> = HashSet::new();
    let mut stack: Vec<(String, &Value, &Value)> = vec![("$".to_owned(), a, b)];

    while let Some((path, a, b)) = stack.pop() {
        match (a, b) {
            (Value::Null, Value::Null) => {}
            (Value::Boolean(x), Value::Boolean(y)) if x == y => {}
            (Value::Integer(x), Value::Integer(y)) if x == y => {}
            (Value::Double(x), Value::Double(y)) | (Value::Date(x), Value::Date(y))
                if same_double(*x, *y) => {}
            (Value::String(x), Value::String(y)) if x == y => {}
            (Value::ByteArray(x), Value::ByteArray(y)) if x == y => {}
            (Value::Reference(x), Value::Reference(y)) if x == y => {}
            (Value::Record(x), Value::Record(y)) => {
                if !visited.insert((*x, *y)) {
                    continue;
                }
                let (Some(ra), Some(rb)) = (heap_a.record(*x), heap_b.record(*y)) else {
                    return mismatch(path, format!("dangling record handle {x} / {y}"));
                };
                if ra.class_name() != rb.class_name() {
                    return mismatch(
                        path,
                        format!(
                            "class name {:?} differs from {:?}",
                            ra.class_name(),
                            rb.class_name()
                        ),
                    );
                }
                if ra.len() != rb.len() {
                    return mismatch(
                        path,
                        format!("record has {} entries, expected {}", rb.len(), ra.len()),
                    );
                }
                let mut children = Vec::with_capacity(ra.len());
                for ((ka, va), (kb, vb)) in ra.iter().zip(rb.iter()) {
                    if ka != kb {
                        return mismatch(path, format!("key {kb:?} where {ka:?} was expected"));
                    }
                    children.push((format!("{path}.{ka}"), va, vb));
                }
                stack.extend(children.into_iter().rev());
            }
            (Value::Collection(x), Value::Collection(y)) => {
                if !visited.insert((*x, *y)) {
                    continue;
                }
                let (Some(ca), Some(cb)) = (heap_a.collection(*x), heap_b.collection(*y)) else {
                    return mismatch(path, format!("dangling collection handle {x} / {y}"));
                };
                if ca.len() != cb.len() {
                    return mismatch(
                        path,
                        format!("collection has length {}, expected {}", cb.len(), ca.len()),
                    );
                }
                stack.extend(
                    ca.iter()
                        .zip(cb.iter())
                        .enumerate()
                        .rev()
                        .map(|(i, (va, vb))| (format!("{path}[{i}]"), va, vb)),
                );
            }
            _ => return mismatch(path, format!("found {b:?}, expected {a:?}")),
        }
    }
    None
}
