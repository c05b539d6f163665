//! Arena that owns every record and collection of one message.

use std::fmt;

use super::{DynamicRecord, OrderedCollection, Value};

/// Index of a node in a [`Heap`]. Two handles are the same object exactly
/// when they are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Record(DynamicRecord),
    Collection(OrderedCollection),
}

/// Append-only arena of nodes addressed by [`NodeId`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Heap {
    nodes: Vec<Node>,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn alloc(&mut self, node: Node) -> NodeId {
        debug_assert!(self.nodes.len() < u32::MAX as usize);
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Fills in a node allocated as a placeholder. Decoders allocate a node
    /// before reading its children so that back references can name it.
    pub(crate) fn set_node(&mut self, id: NodeId, node: Node) {
        if let Some(slot) = self.nodes.get_mut(id.index()) {
            *slot = node;
        }
    }

    /// Moves `record` into the heap and returns a handle value for it.
    pub fn alloc_record(&mut self, record: DynamicRecord) -> Value {
        Value::Record(self.alloc(Node::Record(record)))
    }

    /// Moves `collection` into the heap and returns a handle value for it.
    pub fn alloc_collection(&mut self, collection: OrderedCollection) -> Value {
        Value::Collection(self.alloc(Node::Collection(collection)))
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn record(&self, id: NodeId) -> Option<&DynamicRecord> {
        match self.nodes.get(id.index()) {
            Some(Node::Record(record)) => Some(record),
            _ => None,
        }
    }

    pub fn record_mut(&mut self, id: NodeId) -> Option<&mut DynamicRecord> {
        match self.nodes.get_mut(id.index()) {
            Some(Node::Record(record)) => Some(record),
            _ => None,
        }
    }

    pub fn collection(&self, id: NodeId) -> Option<&OrderedCollection> {
        match self.nodes.get(id.index()) {
            Some(Node::Collection(collection)) => Some(collection),
            _ => None,
        }
    }

    pub fn collection_mut(&mut self, id: NodeId) -> Option<&mut OrderedCollection> {
        match self.nodes.get_mut(id.index()) {
            Some(Node::Collection(collection)) => Some(collection),
            _ => None,
        }
    }
}
