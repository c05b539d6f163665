use crate::error::IndexOutOfRange;

use super::Value;

/// Dense sequence whose length is fixed when it is created. Elements start
/// out as [`Value::Null`] and are filled in by index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderedCollection {
    items: Vec<Value>,
}

impl OrderedCollection {
    pub fn with_len(len: usize) -> Self {
        Self {
            items: vec![Value::Null; len],
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }

    /// Replaces the element at `index`, returning the previous one.
    pub fn set(&mut self, index: usize, value: impl Into<Value>) -> Result<Value, IndexOutOfRange> {
        let len = self.items.len();
        match self.items.get_mut(index) {
            Some(slot) => Ok(std::mem::replace(slot, value.into())),
            None => Err(IndexOutOfRange { index, len }),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.items
    }
}

impl From<Vec<Value>> for OrderedCollection {
    fn from(items: Vec<Value>) -> Self {
        Self { items }
    }
}

impl FromIterator<Value> for OrderedCollection {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}
