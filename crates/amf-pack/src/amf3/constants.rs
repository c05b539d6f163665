//! AMF0 and AMF3 marker constants.

/// AMF0 markers that may appear at envelope level.
pub mod amf0 {
    pub const NUMBER: u8 = 0x00;
    pub const BOOLEAN: u8 = 0x01;
    pub const STRING: u8 = 0x02;
    pub const NULL: u8 = 0x05;
    pub const UNDEFINED: u8 = 0x06;
    /// Switch to AMF3 for the value that follows.
    pub const AVMPLUS: u8 = 0x11;
}

/// AMF3 value markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Amf3Marker {
    Undefined = 0x00,
    Null = 0x01,
    False = 0x02,
    True = 0x03,
    Integer = 0x04,
    Double = 0x05,
    String = 0x06,
    Date = 0x08,
    Array = 0x09,
    Object = 0x0a,
    ByteArray = 0x0c,
    /// Full-width 32-bit integer for values outside the U29 range. Not part of
    /// stock AMF3; only written under `IntegerOverflow::Wide`.
    IntegerWide = 0x14,
}

impl TryFrom<u8> for Amf3Marker {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        Ok(match byte {
            0x00 => Amf3Marker::Undefined,
            0x01 => Amf3Marker::Null,
            0x02 => Amf3Marker::False,
            0x03 => Amf3Marker::True,
            0x04 => Amf3Marker::Integer,
            0x05 => Amf3Marker::Double,
            0x06 => Amf3Marker::String,
            0x08 => Amf3Marker::Date,
            0x09 => Amf3Marker::Array,
            0x0a => Amf3Marker::Object,
            0x0c => Amf3Marker::ByteArray,
            0x14 => Amf3Marker::IntegerWide,
            other => return Err(other),
        })
    }
}

/// Smallest integer written with the U29 integer marker.
pub const INT29_MIN: i32 = -(1 << 28);
/// Largest integer written with the U29 integer marker.
pub const INT29_MAX: i32 = (1 << 28) - 1;

/// Longest string, collection or byte array an inline U29 header can carry.
pub const MAX_INLINE_LEN: usize = (1 << 28) - 1;

/// U29O flag bits for inline traits.
pub const TRAITS_INLINE: u32 = 0b011;
pub const TRAITS_EXTERNALIZABLE: u32 = 0b0100;
pub const TRAITS_DYNAMIC: u32 = 0b1000;

/// Most sealed member names an inline traits header can declare.
pub const MAX_SEALED_MEMBERS: usize = (1 << 25) - 1;

/// Envelope versions the codec reads and writes.
pub const SUPPORTED_VERSIONS: [u16; 2] = [0, 3];
