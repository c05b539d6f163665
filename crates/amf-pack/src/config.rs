//! Codec options shared by the binary and verbose codecs.

/// How both encoders write an [`Integer`](crate::Value::Integer) that falls
/// outside the 29-bit AMF3 integer range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntegerOverflow {
    /// Write the full 32-bit value: under a dedicated marker in the binary
    /// format, as a plain `<int>` in AMFX. The value decodes back as an
    /// `Integer`.
    #[default]
    Wide,
    /// Write the value as a double, as stock AMF3 peers do. The value decodes
    /// back as a `Double` from either format.
    PromoteToDouble,
}

/// Lifetime of the string, object and traits reference tables within one
/// message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferenceScope {
    /// One set of tables for the whole message: a record shared between two
    /// bodies is written once.
    #[default]
    Message,
    /// Fresh tables for every header and body value.
    Value,
}

/// Options controlling encoding and decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecConfig {
    /// Maximum nesting of records and collections. Deeper input fails to
    /// decode; deeper graphs fail to encode.
    pub max_depth: usize,
    pub integer_overflow: IntegerOverflow,
    pub reference_scope: ReferenceScope,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_depth: 256,
            integer_overflow: IntegerOverflow::default(),
            reference_scope: ReferenceScope::default(),
        }
    }
}
