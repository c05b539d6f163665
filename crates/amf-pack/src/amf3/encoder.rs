//! `Amf3Encoder` writes an [`ActionMessage`] as an AMF0 envelope carrying
//! AMF3 values.

use amf_buffers::{Writer, U29_MAX};
use tracing::debug;

use super::constants::{
    amf0, Amf3Marker, INT29_MAX, INT29_MIN, MAX_INLINE_LEN, MAX_SEALED_MEMBERS, SUPPORTED_VERSIONS,
    TRAITS_DYNAMIC, TRAITS_INLINE,
};
use crate::config::{CodecConfig, IntegerOverflow, ReferenceScope};
use crate::envelope::ActionMessage;
use crate::error::UnsupportedValue;
use crate::reference::{EncodeTables, TraitsKey};
use crate::value::{Heap, NodeId, Value};

/// Binary encoder. Reusable: each [`encode`](Self::encode) call starts with
/// fresh reference tables.
#[derive(Debug, Default)]
pub struct Amf3Encoder {
    pub writer: Writer,
    pub config: CodecConfig,
}

impl Amf3Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CodecConfig) -> Self {
        Self {
            writer: Writer::new(),
            config,
        }
    }

    pub fn encode(&mut self, message: &ActionMessage) -> Result<Vec<u8>, UnsupportedValue> {
        self.writer.reset();
        let mut pass = EncodePass {
            writer: &mut self.writer,
            heap: message.heap(),
            config: self.config,
            tables: EncodeTables::new(),
            depth: 0,
        };
        if let Err(err) = pass.write_message(message) {
            self.writer.reset();
            debug!(%err, "AMF3 encode failed");
            return Err(err);
        }
        let bytes = self.writer.flush();
        debug!(
            version = message.version,
            headers = message.header_count(),
            bodies = message.body_count(),
            bytes = bytes.len(),
            "encoded AMF3 message"
        );
        Ok(bytes)
    }
}

/// State of one encode call.
struct EncodePass<'w, 'a> {
    writer: &'w mut Writer,
    heap: &'a Heap,
    config: CodecConfig,
    tables: EncodeTables<'a>,
    depth: usize,
}

fn check_len(what: &'static str, len: usize, limit: usize) -> Result<(), UnsupportedValue> {
    if len > limit {
        return Err(UnsupportedValue::TooLong { what, len, limit });
    }
    Ok(())
}

impl<'w, 'a> EncodePass<'w, 'a> {
    fn write_message(&mut self, message: &'a ActionMessage) -> Result<(), UnsupportedValue> {
        if !SUPPORTED_VERSIONS.contains(&message.version) {
            return Err(UnsupportedValue::Version(message.version));
        }
        let u16_limit = u16::MAX as usize;
        self.writer.u16(message.version);

        check_len("header list", message.header_count(), u16_limit)?;
        self.writer.u16(message.header_count() as u16);
        for header in message.headers() {
            self.write_envelope_utf("header name", &header.name)?;
            self.writer.u8(header.must_understand as u8);
            self.writer.i32(-1);
            self.write_root(&header.value)?;
        }

        check_len("body list", message.body_count(), u16_limit)?;
        self.writer.u16(message.body_count() as u16);
        for body in message.bodies() {
            self.write_envelope_utf("target URI", &body.target_uri)?;
            self.write_envelope_utf("response URI", &body.response_uri)?;
            self.writer.i32(-1);
            self.write_root(&body.data)?;
        }
        Ok(())
    }

    fn write_envelope_utf(&mut self, what: &'static str, s: &str) -> Result<(), UnsupportedValue> {
        check_len(what, s.len(), u16::MAX as usize)?;
        self.writer.utf8_u16(s);
        Ok(())
    }

    /// Writes a header or body value behind the AMF0 switch marker.
    fn write_root(&mut self, value: &'a Value) -> Result<(), UnsupportedValue> {
        if self.config.reference_scope == ReferenceScope::Value {
            self.tables = EncodeTables::new();
        }
        self.writer.u8(amf0::AVMPLUS);
        self.write_value(value)
    }

    fn marker(&mut self, marker: Amf3Marker) {
        self.writer.u8(marker as u8);
    }

    fn write_value(&mut self, value: &'a Value) -> Result<(), UnsupportedValue> {
        match value {
            Value::Null => self.marker(Amf3Marker::Null),
            Value::Boolean(true) => self.marker(Amf3Marker::True),
            Value::Boolean(false) => self.marker(Amf3Marker::False),
            Value::Integer(int) => self.write_integer(*int),
            Value::Double(float) => self.writer.u8f64(Amf3Marker::Double as u8, *float),
            Value::String(s) => {
                self.marker(Amf3Marker::String);
                self.write_string(s)?;
            }
            Value::Date(millis) => {
                self.marker(Amf3Marker::Date);
                self.tables.objects.reserve();
                self.writer.u29(1);
                self.writer.f64(*millis);
            }
            Value::ByteArray(bytes) => {
                check_len("byte array", bytes.len(), MAX_INLINE_LEN)?;
                self.marker(Amf3Marker::ByteArray);
                self.tables.objects.reserve();
                self.writer.u29(((bytes.len() as u32) << 1) | 1);
                self.writer.buf(bytes);
            }
            Value::Record(id) => self.write_record(*id)?,
            Value::Collection(id) => self.write_collection(*id)?,
            Value::Reference(index) => return Err(UnsupportedValue::Reference(*index)),
        }
        Ok(())
    }

    fn write_integer(&mut self, int: i32) {
        if (INT29_MIN..=INT29_MAX).contains(&int) {
            self.marker(Amf3Marker::Integer);
            self.writer.u29(int as u32 & U29_MAX);
            return;
        }
        match self.config.integer_overflow {
            IntegerOverflow::Wide => {
                self.marker(Amf3Marker::IntegerWide);
                self.writer.i32(int);
            }
            IntegerOverflow::PromoteToDouble => {
                self.writer.u8f64(Amf3Marker::Double as u8, int as f64);
            }
        }
    }

    /// Writes a U29S string header and, unless it is a reference, the bytes.
    fn write_string(&mut self, s: &'a str) -> Result<(), UnsupportedValue> {
        if let Some(index) = self.tables.string(s) {
            self.writer.u29(index << 1);
            return Ok(());
        }
        check_len("string", s.len(), MAX_INLINE_LEN)?;
        self.writer.u29(((s.len() as u32) << 1) | 1);
        self.writer.utf8(s);
        Ok(())
    }

    fn enter(&mut self) -> Result<(), UnsupportedValue> {
        self.depth += 1;
        if self.depth > self.config.max_depth {
            return Err(UnsupportedValue::DepthExceeded {
                limit: self.config.max_depth,
            });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn write_record(&mut self, id: NodeId) -> Result<(), UnsupportedValue> {
        let heap = self.heap;
        let record = heap.record(id).ok_or(UnsupportedValue::DanglingHandle {
            id,
            expected: "record",
        })?;
        self.marker(Amf3Marker::Object);
        if let Some(index) = self.tables.object(id) {
            self.writer.u29(index << 1);
            return Ok(());
        }
        self.enter()?;

        // An empty key would read as the end of the dynamic members, so such
        // records list every key as a sealed member instead.
        let class_name = record.class_name().unwrap_or("");
        let sealed: Vec<&'a str> = if record.contains_key("") {
            record.keys().collect()
        } else {
            Vec::new()
        };
        check_len("sealed member list", sealed.len(), MAX_SEALED_MEMBERS)?;
        let key = TraitsKey {
            class_name,
            sealed: sealed.clone(),
        };
        match self.tables.traits.find_or_assign(key) {
            Some(index) => self.writer.u29((index << 2) | 0b01),
            None if sealed.is_empty() => {
                self.writer.u29(TRAITS_INLINE | TRAITS_DYNAMIC);
                self.write_string(class_name)?;
            }
            None => {
                self.writer.u29(((sealed.len() as u32) << 4) | TRAITS_INLINE);
                self.write_string(class_name)?;
                for &name in &sealed {
                    self.write_string(name)?;
                }
            }
        }
        if sealed.is_empty() {
            for (key, value) in record.iter() {
                self.write_string(key)?;
                self.write_value(value)?;
            }
            self.write_string("")?;
        } else {
            for (_, value) in record.iter() {
                self.write_value(value)?;
            }
        }

        self.leave();
        Ok(())
    }

    fn write_collection(&mut self, id: NodeId) -> Result<(), UnsupportedValue> {
        let heap = self.heap;
        let collection = heap.collection(id).ok_or(UnsupportedValue::DanglingHandle {
            id,
            expected: "collection",
        })?;
        self.marker(Amf3Marker::Array);
        if let Some(index) = self.tables.object(id) {
            self.writer.u29(index << 1);
            return Ok(());
        }
        check_len("collection", collection.len(), MAX_INLINE_LEN)?;
        self.enter()?;

        self.writer.u29(((collection.len() as u32) << 1) | 1);
        // No associative entries: the empty-string terminator follows at once.
        self.write_string("")?;
        for value in collection.iter() {
            self.write_value(value)?;
        }

        self.leave();
        Ok(())
    }
}
