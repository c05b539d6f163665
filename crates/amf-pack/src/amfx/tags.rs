//! AMFX element and attribute names.

/// Default namespace of the `<amfx>` root element.
pub const NAMESPACE: &str = "http://www.macromedia.com/2005/amfx";

pub const AMFX: &str = "amfx";
pub const HEADER: &str = "header";
pub const BODY: &str = "body";

pub const NULL: &str = "null";
pub const UNDEFINED: &str = "undefined";
pub const TRUE: &str = "true";
pub const FALSE: &str = "false";
pub const INT: &str = "int";
pub const DOUBLE: &str = "double";
pub const STRING: &str = "string";
pub const DATE: &str = "date";
pub const BYTEARRAY: &str = "bytearray";
pub const ARRAY: &str = "array";
pub const ITEM: &str = "item";
pub const OBJECT: &str = "object";
pub const TRAITS: &str = "traits";
pub const REF: &str = "ref";

/// Tags that start a value.
pub const VALUES: [&str; 12] = [
    NULL, UNDEFINED, TRUE, FALSE, INT, DOUBLE, STRING, DATE, BYTEARRAY, ARRAY, OBJECT, REF,
];

/// Tags that are part of the format but never start a value.
pub const STRUCTURAL: [&str; 5] = [AMFX, HEADER, BODY, ITEM, TRAITS];

/// Maps an element name to its value tag constant.
pub fn value_tag(name: &[u8]) -> Option<&'static str> {
    VALUES.iter().copied().find(|tag| tag.as_bytes() == name)
}

pub fn is_known(name: &[u8]) -> bool {
    value_tag(name).is_some() || STRUCTURAL.iter().any(|tag| tag.as_bytes() == name)
}

pub mod attr {
    pub const VERSION: &str = "ver";
    pub const XMLNS: &str = "xmlns";
    pub const NAME: &str = "name";
    pub const MUST_UNDERSTAND: &str = "mustUnderstand";
    pub const TARGET_URI: &str = "targetURI";
    pub const RESPONSE_URI: &str = "responseURI";
    pub const LENGTH: &str = "length";
    pub const TYPE: &str = "type";
    pub const ID: &str = "id";
}
