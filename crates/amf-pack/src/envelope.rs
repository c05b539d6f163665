//! The action message envelope: headers, ordered bodies and the heap their
//! values live in.

use crate::value::{Heap, Value};

/// Envelope version written when none is set. Version 3 announces AMF3
/// payloads.
pub const DEFAULT_VERSION: u16 = 3;

/// A named header value.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageHeader {
    pub name: String,
    pub must_understand: bool,
    pub value: Value,
}

impl MessageHeader {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            must_understand: false,
            value: value.into(),
        }
    }
}

/// One payload slot. Holds exactly one root value; an unset body holds
/// [`Value::Null`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageBody {
    pub target_uri: String,
    pub response_uri: String,
    pub data: Value,
}

impl MessageBody {
    pub fn new(data: impl Into<Value>) -> Self {
        Self {
            data: data.into(),
            ..Self::default()
        }
    }

    /// Sets the addressing pair used by remoting peers, e.g. `"null"` and
    /// `"/1"`.
    pub fn with_uris(mut self, target: impl Into<String>, response: impl Into<String>) -> Self {
        self.target_uri = target.into();
        self.response_uri = response.into();
        self
    }

    pub fn set_data(&mut self, data: impl Into<Value>) {
        self.data = data.into();
    }
}

/// The unit exchanged between peers.
///
/// Record and collection handles in headers and bodies point into
/// [`ActionMessage::heap`]. Codec calls borrow the message immutably, so it
/// cannot be mutated while it is being encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionMessage {
    pub version: u16,
    headers: Vec<MessageHeader>,
    bodies: Vec<MessageBody>,
    heap: Heap,
}

impl Default for ActionMessage {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionMessage {
    pub fn new() -> Self {
        Self::with_heap(Heap::new())
    }

    /// Creates an empty message around an already populated heap.
    pub fn with_heap(heap: Heap) -> Self {
        Self {
            version: DEFAULT_VERSION,
            headers: Vec::new(),
            bodies: Vec::new(),
            heap,
        }
    }

    pub fn add_body(&mut self, body: MessageBody) {
        self.bodies.push(body);
    }

    pub fn add_header(&mut self, header: MessageHeader) {
        self.headers.push(header);
    }

    pub fn body(&self, index: usize) -> Option<&MessageBody> {
        self.bodies.get(index)
    }

    pub fn body_mut(&mut self, index: usize) -> Option<&mut MessageBody> {
        self.bodies.get_mut(index)
    }

    /// First header named `name`.
    pub fn header(&self, name: &str) -> Option<&MessageHeader> {
        self.headers.iter().find(|h| h.name == name)
    }

    pub fn bodies(&self) -> &[MessageBody] {
        &self.bodies
    }

    pub fn headers(&self) -> &[MessageHeader] {
        &self.headers
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn header_count(&self) -> usize {
        self.headers.len()
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn heap_mut(&mut self) -> &mut Heap {
        &mut self.heap
    }
}
