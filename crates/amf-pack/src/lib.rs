//! Object-graph codec for AMF action messages.
//!
//! An [`ActionMessage`] holds headers and bodies whose values form a graph:
//! records and collections live in the message's [`Heap`] and refer to each
//! other by [`NodeId`], so shared subtrees and cycles are ordinary data.
//! Two wire formats carry it:
//!
//! - [`amf3`]: the binary AMF0 envelope with AMF3 values.
//! - [`amfx`]: the AMFX XML document.
//!
//! Both codecs write repeated strings, records, collections and traits once
//! and refer back to them by index, and both decode their own output to a
//! graph that [`equals`] the input.
//!
//! ```
//! use amf_pack::{decode_binary, encode_binary, equals, ActionMessage, MessageBody};
//!
//! let mut message = ActionMessage::new();
//! let record = message
//!     .heap_mut()
//!     .alloc_record([("prop0", -2000)].into_iter().collect());
//! message.add_body(MessageBody::new(record.clone()));
//!
//! let bytes = encode_binary(&message).unwrap();
//! let decoded = decode_binary(&bytes).unwrap();
//! assert!(equals(
//!     message.heap(),
//!     &record,
//!     decoded.heap(),
//!     &decoded.body(0).unwrap().data,
//! ));
//! ```

pub mod amf3;
pub mod amfx;
pub mod config;
pub mod conformance;
pub mod envelope;
pub mod error;
pub mod json;
pub mod reference;
pub mod value;

pub use amf3::{Amf3Decoder, Amf3Encoder};
pub use amfx::{AmfxDecoder, AmfxEncoder};
pub use config::{CodecConfig, IntegerOverflow, ReferenceScope};
pub use envelope::{ActionMessage, MessageBody, MessageHeader, DEFAULT_VERSION};
pub use error::{IndexOutOfRange, JsonExportError, MalformedInput, RefTable, UnsupportedValue};
pub use value::{
    equals, first_difference, DynamicRecord, Heap, Mismatch, Node, NodeId, OrderedCollection,
    Value, ValueKind,
};

/// Encodes `message` in the binary format with the default configuration.
pub fn encode_binary(message: &ActionMessage) -> Result<Vec<u8>, UnsupportedValue> {
    amf3::encode(message)
}

/// Decodes a binary message with the default configuration.
pub fn decode_binary(data: &[u8]) -> Result<ActionMessage, MalformedInput> {
    amf3::decode(data)
}

/// Encodes `message` as an AMFX document with the default configuration.
pub fn encode_verbose(message: &ActionMessage) -> Result<String, UnsupportedValue> {
    amfx::encode(message)
}

/// Decodes an AMFX document with the default configuration.
pub fn decode_verbose(xml: &str) -> Result<ActionMessage, MalformedInput> {
    amfx::decode(xml)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn message_types_are_send_and_sync() {
        assert_send_sync::<ActionMessage>();
        assert_send_sync::<Value>();
        assert_send_sync::<Heap>();
        assert_send_sync::<MalformedInput>();
    }

    #[test]
    fn both_codecs_share_the_value_model() {
        let mut message = ActionMessage::new();
        let heap = message.heap_mut();
        let list = heap.alloc_collection(vec![Value::from(f64::NAN), Value::from(-0.0)].into());
        message.add_body(MessageBody::new(list));

        let binary = decode_binary(&encode_binary(&message).unwrap()).unwrap();
        let verbose = decode_verbose(&encode_verbose(&message).unwrap()).unwrap();
        conformance::assert_messages_equal(&message, &binary);
        conformance::assert_messages_equal(&message, &verbose);
    }
}
