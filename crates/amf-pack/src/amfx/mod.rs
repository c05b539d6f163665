//! AMFX: the XML rendition of an action message.
//!
//! ```xml
//! <amfx ver="3" xmlns="http://www.macromedia.com/2005/amfx">
//!   <body targetURI="null" responseURI="/1"><string>Sample Value</string></body>
//! </amfx>
//! ```
//!
//! Strings, complex values and traits use the same three reference tables
//! as the binary codec. References are written as `<string id="n"/>`,
//! `<ref id="n"/>` and `<traits id="n"/>`.

mod decoder;
mod encoder;
pub mod number;
pub mod tags;

pub use decoder::AmfxDecoder;
pub use encoder::AmfxEncoder;

use crate::envelope::ActionMessage;
use crate::error::{MalformedInput, UnsupportedValue};

/// Encodes `message` with the default configuration.
pub fn encode(message: &ActionMessage) -> Result<String, UnsupportedValue> {
    AmfxEncoder::new().encode(message)
}

/// Decodes `xml` with the default configuration.
pub fn decode(xml: &str) -> Result<ActionMessage, MalformedInput> {
    AmfxDecoder::new().decode(xml)
}
