//! AMF3 binary codec: an AMF0 action message envelope whose header and body
//! values are AMF3 values.

pub mod constants;
mod decoder;
mod encoder;

pub use decoder::Amf3Decoder;
pub use encoder::Amf3Encoder;

use crate::envelope::ActionMessage;
use crate::error::{MalformedInput, UnsupportedValue};

/// Encodes `message` with the default configuration.
pub fn encode(message: &ActionMessage) -> Result<Vec<u8>, UnsupportedValue> {
    Amf3Encoder::new().encode(message)
}

/// Decodes `data` with the default configuration.
pub fn decode(data: &[u8]) -> Result<ActionMessage, MalformedInput> {
    Amf3Decoder::new().decode(data)
}
