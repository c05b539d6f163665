//! `AmfxDecoder` reads an AMFX document with quick-xml's pull parser.
//!
//! Whitespace between elements, comments, processing instructions and the
//! XML declaration are skipped. Everything else must match the AMFX
//! structure exactly; the first deviation fails the whole document.

use std::fmt;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

use super::number::parse_double;
use super::tags::{self, attr};
use crate::amf3::constants::SUPPORTED_VERSIONS;
use crate::config::{CodecConfig, ReferenceScope};
use crate::envelope::{ActionMessage, MessageBody, MessageHeader};
use crate::error::MalformedInput;
use crate::reference::{DecodeTables, Traits};
use crate::value::{DynamicRecord, Heap, Node, OrderedCollection, Value};

/// Verbose decoder. Decoding is all-or-nothing.
#[derive(Debug, Default, Clone)]
pub struct AmfxDecoder {
    pub config: CodecConfig,
}

impl AmfxDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn decode(&self, xml: &str) -> Result<ActionMessage, MalformedInput> {
        let pass = DecodePass {
            reader: Reader::from_str(xml),
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
                    bytes = xml.len(),
                    "decoded AMFX message"
                );
                Ok(message)
            }
            Err(err) => {
                debug!(%err, bytes = xml.len(), "AMFX decode failed");
                Err(err)
            }
        }
    }
}

fn xml_error(offset: usize, err: impl fmt::Display) -> MalformedInput {
    MalformedInput::Xml {
        offset,
        message: err.to_string(),
    }
}

/// A start tag, or a self-closing one.
struct Element<'a> {
    start: BytesStart<'a>,
    empty: bool,
    offset: usize,
}

impl<'a> Element<'a> {
    fn name(&self) -> &[u8] {
        self.start.local_name().into_inner()
    }

    fn is(&self, tag: &str) -> bool {
        self.name() == tag.as_bytes()
    }

    fn attr(&self, name: &str) -> Result<Option<String>, MalformedInput> {
        for attribute in self.start.attributes() {
            let attribute = attribute.map_err(|e| xml_error(self.offset, e))?;
            if attribute.key.into_inner() == name.as_bytes() {
                let value = attribute
                    .unescape_value()
                    .map_err(|e| xml_error(self.offset, e))?;
                return Ok(Some(value.into_owned()));
            }
        }
        Ok(None)
    }

    fn required_attr(
        &self,
        tag: &'static str,
        attribute: &'static str,
    ) -> Result<String, MalformedInput> {
        self.attr(attribute)?
            .ok_or(MalformedInput::MissingAttribute {
                offset: self.offset,
                tag,
                attribute,
            })
    }

    /// Reads a numeric `id` attribute.
    fn id(&self) -> Result<Option<u32>, MalformedInput> {
        match self.attr(attr::ID)? {
            None => Ok(None),
            Some(text) => text
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| MalformedInput::InvalidLiteral {
                    offset: self.offset,
                    kind: "id",
                    text,
                }),
        }
    }
}

/// The structural events the decoder works with.
enum Tag<'a> {
    Open(Element<'a>),
    Close { offset: usize, name: String },
    Eof { offset: usize },
}

impl Tag<'_> {
    fn unexpected(self, expected: &'static str) -> MalformedInput {
        match self {
            Tag::Open(el) => {
                let name = String::from_utf8_lossy(el.name()).into_owned();
                if tags::is_known(el.name()) {
                    MalformedInput::Unexpected {
                        offset: el.offset,
                        expected,
                        found: format!("<{name}>"),
                    }
                } else {
                    MalformedInput::UnknownTag {
                        offset: el.offset,
                        tag: name,
                    }
                }
            }
            Tag::Close { offset, name } => MalformedInput::Unexpected {
                offset,
                expected,
                found: format!("</{name}>"),
            },
            Tag::Eof { offset } => MalformedInput::Unexpected {
                offset,
                expected,
                found: "end of document".to_owned(),
            },
        }
    }
}

struct DecodePass<'a> {
    reader: Reader<&'a [u8]>,
    heap: Heap,
    tables: DecodeTables,
    config: CodecConfig,
    depth: usize,
}

impl<'a> DecodePass<'a> {
    fn event(&mut self) -> Result<(usize, Event<'a>), MalformedInput> {
        let offset = self.reader.buffer_position();
        let event = self
            .reader
            .read_event()
            .map_err(|e| xml_error(self.reader.buffer_position(), e))?;
        Ok((offset, event))
    }

    /// Next element boundary, skipping whitespace and markup that carries no
    /// data.
    fn next_tag(&mut self) -> Result<Tag<'a>, MalformedInput> {
        loop {
            let (offset, event) = self.event()?;
            match event {
                Event::Start(start) => {
                    return Ok(Tag::Open(Element {
                        start,
                        empty: false,
                        offset,
                    }))
                }
                Event::Empty(start) => {
                    return Ok(Tag::Open(Element {
                        start,
                        empty: true,
                        offset,
                    }))
                }
                Event::End(end) => {
                    let name = String::from_utf8_lossy(end.local_name().into_inner()).into_owned();
                    return Ok(Tag::Close { offset, name });
                }
                Event::Eof => return Ok(Tag::Eof { offset }),
                Event::Text(text) if text.iter().all(u8::is_ascii_whitespace) => {}
                Event::Text(_) | Event::CData(_) => {
                    return Err(MalformedInput::Unexpected {
                        offset,
                        expected: "element",
                        found: "text".to_owned(),
                    })
                }
                _ => {}
            }
        }
    }

    /// Consumes the end tag of `el`, which must have no content.
    fn expect_close(&mut self, el: &Element<'a>) -> Result<(), MalformedInput> {
        if el.empty {
            return Ok(());
        }
        match self.next_tag()? {
            Tag::Close { .. } => Ok(()),
            other => Err(other.unexpected("end tag")),
        }
    }

    /// Reads the character data of a leaf element up to its end tag.
    fn element_text(&mut self, el: &Element<'a>) -> Result<String, MalformedInput> {
        let mut text = String::new();
        if el.empty {
            return Ok(text);
        }
        loop {
            let (offset, event) = self.event()?;
            match event {
                Event::Text(t) => {
                    text.push_str(&t.unescape().map_err(|e| xml_error(offset, e))?);
                }
                Event::CData(data) => {
                    let data =
                        std::str::from_utf8(&data).map_err(|_| MalformedInput::InvalidUtf8 { offset })?;
                    text.push_str(data);
                }
                Event::End(_) => return Ok(text),
                Event::Start(start) | Event::Empty(start) => {
                    let child = Element {
                        start,
                        empty: true,
                        offset,
                    };
                    return Err(Tag::Open(child).unexpected("text"));
                }
                Event::Eof => return Err(Tag::Eof { offset }.unexpected("end tag")),
                _ => {}
            }
        }
    }

    fn read_message(mut self) -> Result<ActionMessage, MalformedInput> {
        let root = match self.next_tag()? {
            Tag::Open(el) if el.is(tags::AMFX) => el,
            other => return Err(other.unexpected("<amfx>")),
        };
        let text = root.required_attr(tags::AMFX, attr::VERSION)?;
        let version: u16 = text
            .trim()
            .parse()
            .map_err(|_| MalformedInput::InvalidLiteral {
                offset: root.offset,
                kind: "version",
                text,
            })?;
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(MalformedInput::UnsupportedVersion { version });
        }

        let mut headers = Vec::new();
        let mut bodies = Vec::new();
        if !root.empty {
            loop {
                match self.next_tag()? {
                    Tag::Open(el) if el.is(tags::HEADER) => headers.push(self.read_header(el)?),
                    Tag::Open(el) if el.is(tags::BODY) => bodies.push(self.read_body(el)?),
                    Tag::Close { .. } => break,
                    other => return Err(other.unexpected("<header> or <body>")),
                }
            }
        }
        match self.next_tag()? {
            Tag::Eof { .. } => {}
            other => return Err(other.unexpected("end of document")),
        }

        let mut message = ActionMessage::with_heap(self.heap);
        message.version = version;
        headers.into_iter().for_each(|h| message.add_header(h));
        bodies.into_iter().for_each(|b| message.add_body(b));
        Ok(message)
    }

    fn read_header(&mut self, el: Element<'a>) -> Result<MessageHeader, MalformedInput> {
        let name = el.required_attr(tags::HEADER, attr::NAME)?;
        let must_understand = match el.attr(attr::MUST_UNDERSTAND)?.as_deref() {
            None | Some("false") => false,
            Some("true") => true,
            Some(other) => {
                return Err(MalformedInput::InvalidLiteral {
                    offset: el.offset,
                    kind: "boolean",
                    text: other.to_owned(),
                })
            }
        };
        let value = self.read_root(&el)?;
        Ok(MessageHeader {
            name,
            must_understand,
            value,
        })
    }

    fn read_body(&mut self, el: Element<'a>) -> Result<MessageBody, MalformedInput> {
        let target_uri = el.attr(attr::TARGET_URI)?.unwrap_or_default();
        let response_uri = el.attr(attr::RESPONSE_URI)?.unwrap_or_default();
        let data = self.read_root(&el)?;
        Ok(MessageBody {
            target_uri,
            response_uri,
            data,
        })
    }

    fn read_root(&mut self, parent: &Element<'a>) -> Result<Value, MalformedInput> {
        if self.config.reference_scope == ReferenceScope::Value {
            self.tables = DecodeTables::new();
        }
        self.read_single_child(parent)
    }

    /// Reads the one value element `parent` must contain.
    fn read_single_child(&mut self, parent: &Element<'a>) -> Result<Value, MalformedInput> {
        if parent.empty {
            return Err(MalformedInput::Unexpected {
                offset: parent.offset,
                expected: "value element",
                found: format!("empty <{}>", String::from_utf8_lossy(parent.name())),
            });
        }
        let value = match self.next_tag()? {
            Tag::Open(el) => self.read_value(el)?,
            other => return Err(other.unexpected("value element")),
        };
        match self.next_tag()? {
            Tag::Close { .. } => Ok(value),
            other => Err(other.unexpected("end tag")),
        }
    }

    fn read_value(&mut self, el: Element<'a>) -> Result<Value, MalformedInput> {
        let Some(tag) = tags::value_tag(el.name()) else {
            return Err(Tag::Open(el).unexpected("value element"));
        };
        Ok(match tag {
            tags::NULL | tags::UNDEFINED => {
                self.expect_close(&el)?;
                Value::Null
            }
            tags::TRUE | tags::FALSE => {
                self.expect_close(&el)?;
                Value::Boolean(tag == tags::TRUE)
            }
            tags::INT => {
                let text = self.element_text(&el)?;
                match text.trim().parse() {
                    Ok(int) => Value::Integer(int),
                    Err(_) => return Err(invalid_literal(&el, "int", text)),
                }
            }
            tags::DOUBLE => Value::Double(self.read_double(&el, "double")?),
            tags::STRING => Value::String(self.read_string(el)?),
            tags::DATE => {
                let date = Value::Date(self.read_double(&el, "date")?);
                self.tables.objects.push(date.clone());
                date
            }
            tags::BYTEARRAY => {
                let text = self.element_text(&el)?;
                let bytes = match hex::decode(text.trim()) {
                    Ok(bytes) => Value::ByteArray(bytes),
                    Err(_) => return Err(invalid_literal(&el, "bytearray", text)),
                };
                self.tables.objects.push(bytes.clone());
                bytes
            }
            tags::REF => {
                let index = el.id()?.ok_or(MalformedInput::MissingAttribute {
                    offset: el.offset,
                    tag: tags::REF,
                    attribute: attr::ID,
                })?;
                self.expect_close(&el)?;
                self.tables.objects.get(index, el.offset)?.clone()
            }
            tags::ARRAY => self.read_array(el)?,
            _ => self.read_object(el)?,
        })
    }

    fn read_double(&mut self, el: &Element<'a>, kind: &'static str) -> Result<f64, MalformedInput> {
        let text = self.element_text(el)?;
        parse_double(&text).ok_or_else(|| invalid_literal(el, kind, text))
    }

    fn read_string(&mut self, el: Element<'a>) -> Result<String, MalformedInput> {
        if let Some(index) = el.id()? {
            self.expect_close(&el)?;
            return Ok(self.tables.strings.get(index, el.offset)?.clone());
        }
        let text = self.element_text(&el)?;
        self.tables.add_string(&text);
        Ok(text)
    }

    fn read_array(&mut self, el: Element<'a>) -> Result<Value, MalformedInput> {
        let text = el.required_attr(tags::ARRAY, attr::LENGTH)?;
        let declared: usize = match text.trim().parse() {
            Ok(len) => len,
            Err(_) => return Err(invalid_literal(&el, "length", text)),
        };
        self.enter(el.offset)?;

        // Named `<item>` children turn the array into a record. The kind is
        // fixed by the first child, since the handle is registered before
        // any child is read.
        let mut next = if el.empty {
            None
        } else {
            Some(self.next_tag()?)
        };
        let is_record = matches!(&next, Some(Tag::Open(child)) if child.is(tags::ITEM));
        let (id, handle) = if is_record {
            let id = self.heap.alloc(Node::Record(DynamicRecord::new()));
            (id, Value::Record(id))
        } else {
            let id = self.heap.alloc(Node::Collection(OrderedCollection::default()));
            (id, Value::Collection(id))
        };
        self.tables.objects.push(handle.clone());

        let mut dense = Vec::with_capacity(declared.min(64));
        let mut named = Vec::new();
        while let Some(tag) = next {
            match tag {
                Tag::Close { .. } => break,
                Tag::Open(child) if child.is(tags::ITEM) => {
                    if !is_record {
                        return Err(Tag::Open(child).unexpected("value element"));
                    }
                    let name = child.required_attr(tags::ITEM, attr::NAME)?;
                    let value = self.read_single_child(&child)?;
                    named.push((child.offset, name, value));
                }
                Tag::Open(child) => {
                    let offset = child.offset;
                    dense.push((offset, self.read_value(child)?));
                }
                eof => return Err(eof.unexpected("value element or </array>")),
            }
            next = Some(self.next_tag()?);
        }
        if dense.len() != declared {
            return Err(MalformedInput::LengthMismatch {
                offset: el.offset,
                declared,
                actual: dense.len(),
            });
        }

        let node = if is_record {
            let mut record = DynamicRecord::new();
            for (offset, name, value) in named {
                insert_entry(&mut record, offset, name, value)?;
            }
            for (index, (offset, value)) in dense.into_iter().enumerate() {
                insert_entry(&mut record, offset, index.to_string(), value)?;
            }
            Node::Record(record)
        } else {
            let items: OrderedCollection = dense.into_iter().map(|(_, value)| value).collect();
            Node::Collection(items)
        };
        self.heap.set_node(id, node);

        self.leave();
        Ok(handle)
    }

    fn read_object(&mut self, el: Element<'a>) -> Result<Value, MalformedInput> {
        self.enter(el.offset)?;
        let class_name = el.attr(attr::TYPE)?.unwrap_or_default();
        let id = self.heap.alloc(Node::Record(DynamicRecord::new()));
        self.tables.objects.push(Value::Record(id));

        if el.empty {
            return Err(MalformedInput::Unexpected {
                offset: el.offset,
                expected: "<traits>",
                found: "empty <object>".to_owned(),
            });
        }
        let keys = match self.next_tag()? {
            Tag::Open(traits) if traits.is(tags::TRAITS) => self.read_traits(traits, &class_name)?,
            other => return Err(other.unexpected("<traits>")),
        };

        let mut record = DynamicRecord::typed(class_name);
        for key in keys {
            let (offset, value) = match self.next_tag()? {
                Tag::Open(child) => (child.offset, self.read_value(child)?),
                other => return Err(other.unexpected("value element")),
            };
            insert_entry(&mut record, offset, key, value)?;
        }
        match self.next_tag()? {
            Tag::Close { .. } => {}
            other => return Err(other.unexpected("</object>")),
        }
        self.heap.set_node(id, Node::Record(record));

        self.leave();
        Ok(Value::Record(id))
    }

    /// Returns the member names listed by, or referenced from, a `<traits>`
    /// element.
    fn read_traits(
        &mut self,
        el: Element<'a>,
        class_name: &str,
    ) -> Result<Vec<String>, MalformedInput> {
        if let Some(index) = el.id()? {
            self.expect_close(&el)?;
            return Ok(self.tables.traits.get(index, el.offset)?.sealed.clone());
        }
        let mut keys = Vec::new();
        if !el.empty {
            loop {
                match self.next_tag()? {
                    Tag::Open(child) if child.is(tags::STRING) => keys.push(self.read_string(child)?),
                    Tag::Close { .. } => break,
                    other => return Err(other.unexpected("<string>")),
                }
            }
        }
        self.tables.traits.push(Traits {
            class_name: class_name.to_owned(),
            sealed: keys.clone(),
            dynamic: false,
        });
        Ok(keys)
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

fn invalid_literal(el: &Element<'_>, kind: &'static str, text: String) -> MalformedInput {
    MalformedInput::InvalidLiteral {
        offset: el.offset,
        kind,
        text,
    }
}
