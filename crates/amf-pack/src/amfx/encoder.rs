//! `AmfxEncoder` writes an [`ActionMessage`] as an AMFX document.

use quick_xml::escape::escape;
use tracing::debug;

use super::number::render_double;
use super::tags::{self, attr};
use crate::amf3::constants::{INT29_MAX, INT29_MIN, SUPPORTED_VERSIONS};
use crate::config::{CodecConfig, IntegerOverflow, ReferenceScope};
use crate::envelope::ActionMessage;
use crate::error::UnsupportedValue;
use crate::reference::{EncodeTables, TraitsKey};
use crate::value::{Heap, NodeId, Value};

/// Verbose encoder. Output is a single line with no XML declaration.
#[derive(Debug, Default)]
pub struct AmfxEncoder {
    /// Document being written. Reused across calls.
    pub out: String,
    pub config: CodecConfig,
}

impl AmfxEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CodecConfig) -> Self {
        Self {
            out: String::new(),
            config,
        }
    }

    pub fn encode(&mut self, message: &ActionMessage) -> Result<String, UnsupportedValue> {
        self.out.clear();
        let mut pass = EncodePass {
            out: &mut self.out,
            heap: message.heap(),
            config: self.config,
            tables: EncodeTables::new(),
            depth: 0,
        };
        if let Err(err) = pass.write_message(message) {
            self.out.clear();
            debug!(%err, "AMFX encode failed");
            return Err(err);
        }
        let xml = std::mem::take(&mut self.out);
        debug!(
            version = message.version,
            headers = message.header_count(),
            bodies = message.body_count(),
            bytes = xml.len(),
            "encoded AMFX message"
        );
        Ok(xml)
    }
}

struct EncodePass<'w, 'a> {
    out: &'w mut String,
    heap: &'a Heap,
    config: CodecConfig,
    tables: EncodeTables<'a>,
    depth: usize,
}

impl<'w, 'a> EncodePass<'w, 'a> {
    fn write_message(&mut self, message: &'a ActionMessage) -> Result<(), UnsupportedValue> {
        if !SUPPORTED_VERSIONS.contains(&message.version) {
            return Err(UnsupportedValue::Version(message.version));
        }
        self.open(tags::AMFX);
        self.attr(attr::VERSION, &message.version.to_string());
        self.attr(attr::XMLNS, tags::NAMESPACE);
        if message.header_count() == 0 && message.body_count() == 0 {
            self.out.push_str("/>");
            return Ok(());
        }
        self.out.push('>');

        for header in message.headers() {
            self.open(tags::HEADER);
            self.attr(attr::NAME, &header.name);
            self.attr(
                attr::MUST_UNDERSTAND,
                if header.must_understand { "true" } else { "false" },
            );
            self.out.push('>');
            self.write_root(&header.value)?;
            self.close(tags::HEADER);
        }
        for body in message.bodies() {
            self.open(tags::BODY);
            self.attr(attr::TARGET_URI, &body.target_uri);
            self.attr(attr::RESPONSE_URI, &body.response_uri);
            self.out.push('>');
            self.write_root(&body.data)?;
            self.close(tags::BODY);
        }

        self.close(tags::AMFX);
        Ok(())
    }

    fn write_root(&mut self, value: &'a Value) -> Result<(), UnsupportedValue> {
        if self.config.reference_scope == ReferenceScope::Value {
            self.tables = EncodeTables::new();
        }
        self.write_value(value)
    }

    /// Writes `<tag` and leaves the start tag open for attributes.
    fn open(&mut self, tag: &str) {
        self.out.push('<');
        self.out.push_str(tag);
    }

    fn close(&mut self, tag: &str) {
        self.out.push_str("</");
        self.out.push_str(tag);
        self.out.push('>');
    }

    fn empty(&mut self, tag: &str) {
        self.open(tag);
        self.out.push_str("/>");
    }

    fn attr(&mut self, name: &str, value: &str) {
        self.out.push(' ');
        self.out.push_str(name);
        self.out.push_str("=\"");
        write_escaped(self.out, value, true);
        self.out.push('"');
    }

    fn leaf(&mut self, tag: &str, text: &str) {
        self.open(tag);
        self.out.push('>');
        write_escaped(self.out, text, false);
        self.close(tag);
    }

    fn write_value(&mut self, value: &'a Value) -> Result<(), UnsupportedValue> {
        match value {
            Value::Null => self.empty(tags::NULL),
            Value::Boolean(true) => self.empty(tags::TRUE),
            Value::Boolean(false) => self.empty(tags::FALSE),
            Value::Integer(int) => self.write_integer(*int),
            Value::Double(float) => self.leaf(tags::DOUBLE, &render_double(*float)),
            Value::String(s) => self.write_string(s),
            Value::Date(millis) => {
                self.tables.objects.reserve();
                self.leaf(tags::DATE, &render_double(*millis));
            }
            Value::ByteArray(bytes) => {
                self.tables.objects.reserve();
                self.leaf(tags::BYTEARRAY, &hex::encode_upper(bytes));
            }
            Value::Record(id) => self.write_record(*id)?,
            Value::Collection(id) => self.write_collection(*id)?,
            Value::Reference(index) => return Err(UnsupportedValue::Reference(*index)),
        }
        Ok(())
    }

    /// Out-of-range integers follow the same overflow setting as the binary
    /// codec, so both formats decode them to the same kind.
    fn write_integer(&mut self, int: i32) {
        let in_range = (INT29_MIN..=INT29_MAX).contains(&int);
        if !in_range && self.config.integer_overflow == IntegerOverflow::PromoteToDouble {
            self.leaf(tags::DOUBLE, &render_double(int as f64));
        } else {
            self.leaf(tags::INT, &int.to_string());
        }
    }

    fn write_string(&mut self, s: &'a str) {
        if s.is_empty() {
            self.empty(tags::STRING);
        } else if let Some(index) = self.tables.string(s) {
            self.write_id(tags::STRING, index);
        } else {
            self.leaf(tags::STRING, s);
        }
    }

    /// Writes `<tag id="index"/>`.
    fn write_id(&mut self, tag: &str, index: u32) {
        self.open(tag);
        self.attr(attr::ID, &index.to_string());
        self.out.push_str("/>");
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
        if let Some(index) = self.tables.object(id) {
            self.write_id(tags::REF, index);
            return Ok(());
        }
        self.enter()?;

        self.open(tags::OBJECT);
        if let Some(class_name) = record.class_name() {
            self.attr(attr::TYPE, class_name);
        }
        self.out.push('>');

        let keys: Vec<&'a str> = record.keys().collect();
        let key = TraitsKey {
            class_name: record.class_name().unwrap_or(""),
            sealed: keys.clone(),
        };
        match self.tables.traits.find_or_assign(key) {
            Some(index) => self.write_id(tags::TRAITS, index),
            None if keys.is_empty() => self.empty(tags::TRAITS),
            None => {
                self.open(tags::TRAITS);
                self.out.push('>');
                for &key in &keys {
                    self.write_string(key);
                }
                self.close(tags::TRAITS);
            }
        }
        for (_, value) in record.iter() {
            self.write_value(value)?;
        }
        self.close(tags::OBJECT);

        self.leave();
        Ok(())
    }

    fn write_collection(&mut self, id: NodeId) -> Result<(), UnsupportedValue> {
        let heap = self.heap;
        let collection = heap.collection(id).ok_or(UnsupportedValue::DanglingHandle {
            id,
            expected: "collection",
        })?;
        if let Some(index) = self.tables.object(id) {
            self.write_id(tags::REF, index);
            return Ok(());
        }
        self.enter()?;

        self.open(tags::ARRAY);
        self.attr(attr::LENGTH, &collection.len().to_string());
        if collection.is_empty() {
            self.out.push_str("/>");
        } else {
            self.out.push('>');
            for value in collection.iter() {
                self.write_value(value)?;
            }
            self.close(tags::ARRAY);
        }

        self.leave();
        Ok(())
    }
}

/// Writes `s` with markup characters escaped. Carriage returns, and inside
/// attributes also tabs and newlines, become character references so that
/// parsers that normalize whitespace keep them.
fn write_escaped(out: &mut String, s: &str, in_attribute: bool) {
    let escaped = escape(s);
    let mut rest: &str = &escaped;
    let needs_ref = |c: char| c == '\r' || (in_attribute && (c == '\t' || c == '\n'));
    while let Some(pos) = rest.find(needs_ref) {
        out.push_str(&rest[..pos]);
        out.push_str(match rest.as_bytes()[pos] {
            b'\r' => "&#13;",
            b'\t' => "&#9;",
            _ => "&#10;",
        });
        rest = &rest[pos + 1..];
    }
    out.push_str(rest);
}
