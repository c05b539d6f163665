use indexmap::IndexMap;

use super::Value;

/// String-keyed, insertion-ordered record with unique keys.
///
/// A record may carry a class name (an AMF typed-object alias); anonymous
/// records have none.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DynamicRecord {
    class_name: Option<String>,
    entries: IndexMap<String, Value>,
}

impl DynamicRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty record with the given class name. An empty name is
    /// the same as no name.
    pub fn typed(class_name: impl Into<String>) -> Self {
        let mut record = Self::new();
        record.set_class_name(class_name);
        record
    }

    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    pub fn set_class_name(&mut self, class_name: impl Into<String>) {
        let name = class_name.into();
        self.class_name = if name.is_empty() { None } else { Some(name) };
    }

    /// Inserts or replaces an entry. A replaced key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Removes an entry, keeping the order of the others.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.shift_remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for DynamicRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}
