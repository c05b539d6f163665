//! `Amf3Decoder` reads an AMF0 envelope carrying AMF3 values back into an
//! [`ActionMessage`] with a fresh heap.

use amf_buffers::Reader;
use tracing::debug;

use super::constants::{
    amf0, Amf3Marker, SUPPORTED_VERSIONS, TRAITS_DYNAMIC, TRAITS_EXTERNALIZABLE,
};
use crate::config::{CodecConfig, ReferenceScope};
use crate::envelope::{ActionMessage, MessageBody, MessageHeader};
use crate::error::MalformedInput;
use crate::reference::{DecodeTables, Traits};
use crate::value::{DynamicRecord, Heap, Node, OrderedCollection, Value};

/// Binary decoder. Decoding is all-or-nothing: on error the partially built
/// heap is dropped.
#[derive(Debug, Default, Clone)]
pub struct Amf3Decoder {
    pub config: CodecConfig,
}

impl Amf3Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn decode(&self, data: &[u8]) -> Result<ActionMessage, MalformedInput> {
        let pass = DecodePass {
            reader: Reader::new(data),
            heap: Heap::new(),
            tables: DecodeTables::new(),
            config: self.config,
            depth: 0,
        };
        match pass.read_message() {
            Ok(message) => {
                debug!(
                    version = message.version,
                    headers = message.header_count(),
                    bodies = message.body_count(),
                    nodes = message.heap().len(),
                    bytes = data.len(),
                    "decoded AMF3 message"
                );
                Ok(message)
            }
            Err(err) => {
                debug!(%err, bytes = data.len(), "AMF3 decode failed");
                Err(err)
            }
        }
    }
}

/// State of one decode call.
struct DecodePass<'a> {
    reader: Reader<'a>,
    heap: Heap,
    tables: DecodeTables,
    config: CodecConfig,
    depth: usize,
}

impl<'a> DecodePass<'a> {
    fn read_message(mut self) -> Result<ActionMessage, MalformedInput> {
        let version = self.reader.try_u16()?;
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(MalformedInput::UnsupportedVersion { version });
        }

        let count = self.reader.try_u16()? as usize;
        let mut headers = Vec::with_capacity(count.min(self.reader.remaining()));
        for _ in 0..count {
            let name = self.reader.try_utf8_u16()?.to_owned();
            let must_understand = self.reader.try_u8()? != 0;
            // Byte length of the value; -1 when unknown. Not needed to parse.
            self.reader.try_i32()?;
            let value = self.read_root()?;
            headers.push(MessageHeader {
                name,
                must_understand,
                value,
            });
        }

        let count = self.reader.try_u16()? as usize;
        let mut bodies = Vec::with_capacity(count.min(self.reader.remaining()));
        for _ in 0..count {
            let target_uri = self.reader.try_utf8_u16()?.to_owned();
            let response_uri = self.reader.try_utf8_u16()?.to_owned();
            self.reader.try_i32()?;
            let data = self.read_root()?;
            bodies.push(MessageBody {
                target_uri,
                response_uri,
                data,
            });
        }

        if !self.reader.is_empty() {
            return Err(MalformedInput::TrailingBytes {
                offset: self.reader.position(),
                count: self.reader.remaining(),
            });
        }

        let mut message = ActionMessage::with_heap(self.heap);
        message.version = version;
        headers.into_iter().for_each(|h| message.add_header(h));
        bodies.into_iter().for_each(|b| message.add_body(b));
        Ok(message)
    }

    /// Reads an envelope-level value: either an AMF0 scalar or an AMF3 value
    /// behind the switch marker.
    fn read_root(&mut self) -> Result<Value, MalformedInput> {
        if self.config.reference_scope == ReferenceScope::Value {
            self.tables = DecodeTables::new();
        }
        let offset = self.reader.position();
        Ok(match self.reader.try_u8()? {
            amf0::AVMPLUS => self.read_value()?,
            amf0::NUMBER => Value::Double(self.reader.try_f64()?),
            amf0::BOOLEAN => Value::Boolean(self.reader.try_u8()? != 0),
            amf0::STRING => Value::String(self.reader.try_utf8_u16()?.to_owned()),
            amf0::NULL | amf0::UNDEFINED => Value::Null,
            marker => {
                return Err(MalformedInput::UnknownMarker {
                    offset,
                    format: "AMF0",
                    marker,
                })
            }
        })
    }

    fn read_value(&mut self) -> Result<Value, MalformedInput> {
        let offset = self.reader.position();
        let marker = Amf3Marker::try_from(self.reader.try_u8()?).map_err(|marker| {
            MalformedInput::UnknownMarker {
                offset,
                format: "AMF3",
                marker,
            }
        })?;
        Ok(match marker {
            Amf3Marker::Undefined | Amf3Marker::Null => Value::Null,
            Amf3Marker::False => Value::Boolean(false),
            Amf3Marker::True => Value::Boolean(true),
            Amf3Marker::Integer => {
                let raw = self.reader.try_u29()?;
                // Sign-extend from 29 bits.
                Value::Integer(((raw << 3) as i32) >> 3)
            }
            Amf3Marker::IntegerWide => Value::Integer(self.reader.try_i32()?),
            Amf3Marker::Double => Value::Double(self.reader.try_f64()?),
            Amf3Marker::String => Value::String(self.read_string()?),
            Amf3Marker::Date => self.read_date(offset)?,
            Amf3Marker::ByteArray => self.read_byte_array(offset)?,
            Amf3Marker::Array => self.read_array(offset)?,
            Amf3Marker::Object => self.read_object(offset)?,
        })
    }

    /// Reads a U29S header and the inline bytes or the referenced string.
    fn read_string(&mut self) -> Result<String, MalformedInput> {
        let offset = self.reader.position();
        let header = self.reader.try_u29()?;
        if header & 1 == 0 {
            return Ok(self.tables.strings.get(header >> 1, offset)?.clone());
        }
        let s = self.reader.try_utf8((header >> 1) as usize)?;
        self.tables.add_string(s);
        Ok(s.to_owned())
    }

    /// Reads a U29O header. Returns the referenced value for a back
    /// reference, or the inline payload (`header >> 1`) otherwise.
    fn read_object_header(&mut self, offset: usize) -> Result<Result<u32, Value>, MalformedInput> {
        let header = self.reader.try_u29()?;
        if header & 1 == 0 {
            return Ok(Err(self.tables.objects.get(header >> 1, offset)?.clone()));
        }
        Ok(Ok(header >> 1))
    }

    fn read_date(&mut self, offset: usize) -> Result<Value, MalformedInput> {
        if let Err(shared) = self.read_object_header(offset)? {
            return Ok(shared);
        }
        let date = Value::Date(self.reader.try_f64()?);
        self.tables.objects.push(date.clone());
        Ok(date)
    }

    fn read_byte_array(&mut self, offset: usize) -> Result<Value, MalformedInput> {
        let len = match self.read_object_header(offset)? {
            Ok(len) => len as usize,
            Err(shared) => return Ok(shared),
        };
        let bytes = Value::ByteArray(self.reader.try_buf(len)?.to_vec());
        self.tables.objects.push(bytes.clone());
        Ok(bytes)
    }

    /// Fails early when `count` items cannot fit in the remaining input,
    /// since each needs at least one byte.
    fn check_count(&self, count: usize) -> Result<(), MalformedInput> {
        let remaining = self.reader.remaining();
        if count > remaining {
            return Err(MalformedInput::UnexpectedEof {
                offset: self.reader.position(),
                needed: count - remaining,
            });
        }
        Ok(())
    }

    fn read_array(&mut self, offset: usize) -> Result<Value, MalformedInput> {
        let dense_len = match self.read_object_header(offset)? {
            Ok(len) => len as usize,
            Err(shared) => return Ok(shared),
        };
        self.check_count(dense_len)?;
        self.enter(offset)?;

        let mut key_offset = self.reader.position();
        let first_key = self.read_string()?;
        let value = if first_key.is_empty() {
            let id = self.heap.alloc(Node::Collection(OrderedCollection::default()));
            self.tables.objects.push(Value::Collection(id));
            let mut items = Vec::with_capacity(dense_len);
            for _ in 0..dense_len {
                items.push(self.read_value()?);
            }
            self.heap.set_node(id, Node::Collection(items.into()));
            Value::Collection(id)
        } else {
            // Associative entries first, then the dense part under its
            // decimal indices.
            let id = self.heap.alloc(Node::Record(DynamicRecord::new()));
            self.tables.objects.push(Value::Record(id));
            let mut record = DynamicRecord::new();
            let mut key = first_key;
            while !key.is_empty() {
                let value = self.read_value()?;
                insert_entry(&mut record, key_offset, key, value)?;
                key_offset = self.reader.position();
                key = self.read_string()?;
            }
            for index in 0..dense_len {
                let value_offset = self.reader.position();
                let value = self.read_value()?;
                insert_entry(&mut record, value_offset, index.to_string(), value)?;
            }
            self.heap.set_node(id, Node::Record(record));
            Value::Record(id)
        };

        self.leave();
        Ok(value)
    }

    fn read_traits(&mut self, offset: usize, header: u32) -> Result<Traits, MalformedInput> {
        // header is the U29O value without its low (inline object) bit.
        if header & 1 == 0 {
            return Ok(self.tables.traits.get(header >> 1, offset)?.clone());
        }
        if (header << 1) & TRAITS_EXTERNALIZABLE != 0 {
            let class_name = self.read_string()?;
            return Err(MalformedInput::Externalizable { offset, class_name });
        }
        let dynamic = (header << 1) & TRAITS_DYNAMIC != 0;
        let sealed_count = (header >> 3) as usize;
        let class_name = self.read_string()?;
        self.check_count(sealed_count)?;
        let mut sealed = Vec::with_capacity(sealed_count);
        for _ in 0..sealed_count {
            sealed.push(self.read_string()?);
        }
        let traits = Traits {
            class_name,
            sealed,
            dynamic,
        };
        self.tables.traits.push(traits.clone());
        Ok(traits)
    }

    fn read_object(&mut self, offset: usize) -> Result<Value, MalformedInput> {
        let header = match self.read_object_header(offset)? {
            Ok(header) => header,
            Err(shared) => return Ok(shared),
        };
        self.enter(offset)?;

        let id = self.heap.alloc(Node::Record(DynamicRecord::new()));
        self.tables.objects.push(Value::Record(id));

        let traits = self.read_traits(offset, header)?;
        let mut record = DynamicRecord::typed(traits.class_name);
        for key in traits.sealed {
            let value_offset = self.reader.position();
            let value = self.read_value()?;
            insert_entry(&mut record, value_offset, key, value)?;
        }
        if traits.dynamic {
            loop {
                let key_offset = self.reader.position();
                let key = self.read_string()?;
                if key.is_empty() {
                    break;
                }
                let value = self.read_value()?;
                insert_entry(&mut record, key_offset, key, value)?;
            }
        }
        self.heap.set_node(id, Node::Record(record));

        self.leave();
        Ok(Value::Record(id))
    }

    fn enter(&mut self, offset: usize) -> Result<(), MalformedInput> {
        self.depth += 1;
        if self.depth > self.config.max_depth {
            return Err(MalformedInput::DepthExceeded {
                offset,
                limit: self.config.max_depth,
            });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }
}

/// Adds an entry, failing instead of replacing an earlier value.
fn insert_entry(
    record: &mut DynamicRecord,
    offset: usize,
    key: String,
    value: Value,
) -> Result<(), MalformedInput> {
    if record.contains_key(&key) {
        return Err(MalformedInput::DuplicateKey { offset, key });
    }
    record.insert(key, value);
    Ok(())
}
