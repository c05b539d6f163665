//! Growable big-endian byte writer.

use crate::U29_MAX;

/// An append-only binary writer. All multi-byte values are big-endian, the
/// byte order of both AMF0 and AMF3.
///
/// # Example
///
/// ```
/// use amf_buffers::Writer;
///
/// let mut writer = Writer::new();
/// writer.u8(0x01);
/// writer.u16(0x0203);
/// writer.u29(0x80);
/// assert_eq!(writer.flush(), [0x01, 0x02, 0x03, 0x81, 0x00]);
/// ```
#[derive(Debug, Default, Clone)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a writer with `capacity` bytes preallocated.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Number of bytes written since the last flush.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Discards everything written so far.
    pub fn reset(&mut self) {
        self.buf.clear();
    }

    /// Returns the written bytes and leaves the writer empty.
    pub fn flush(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buf)
    }

    /// Bytes written so far, without consuming them.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    #[inline]
    pub fn u8(&mut self, val: u8) {
        self.buf.push(val);
    }

    #[inline]
    pub fn u16(&mut self, val: u16) {
        self.buf.extend_from_slice(&val.to_be_bytes());
    }

    #[inline]
    pub fn i32(&mut self, val: i32) {
        self.buf.extend_from_slice(&val.to_be_bytes());
    }

    #[inline]
    pub fn u32(&mut self, val: u32) {
        self.buf.extend_from_slice(&val.to_be_bytes());
    }

    /// Writes the raw IEEE-754 bits of `val`. NaN payloads and the sign of
    /// zero are preserved.
    #[inline]
    pub fn f64(&mut self, val: f64) {
        self.buf.extend_from_slice(&val.to_bits().to_be_bytes());
    }

    /// Writes a marker byte followed by a 64-bit float.
    pub fn u8f64(&mut self, marker: u8, val: f64) {
        self.u8(marker);
        self.f64(val);
    }

    /// Writes an AMF3 U29: seven bits per byte with a continuation flag, the
    /// fourth byte (if reached) carrying a full eight bits.
    ///
    /// `val` must not exceed [`U29_MAX`]; higher bits are dropped.
    pub fn u29(&mut self, val: u32) {
        debug_assert!(val <= U29_MAX, "U29 overflow: {val}");
        let val = val & U29_MAX;
        if val < 0x80 {
            self.buf.push(val as u8);
        } else if val < 0x4000 {
            self.buf
                .extend_from_slice(&[((val >> 7) as u8) | 0x80, (val & 0x7f) as u8]);
        } else if val < 0x20_0000 {
            self.buf.extend_from_slice(&[
                ((val >> 14) as u8) | 0x80,
                (((val >> 7) & 0x7f) as u8) | 0x80,
                (val & 0x7f) as u8,
            ]);
        } else {
            self.buf.extend_from_slice(&[
                ((val >> 22) as u8) | 0x80,
                (((val >> 15) & 0x7f) as u8) | 0x80,
                (((val >> 8) & 0x7f) as u8) | 0x80,
                (val & 0xff) as u8,
            ]);
        }
    }

    /// Writes a byte slice verbatim.
    pub fn buf(&mut self, buf: &[u8]) {
        self.buf.extend_from_slice(buf);
    }

    /// Writes the UTF-8 bytes of `s` without a length prefix. Returns the
    /// number of bytes written.
    pub fn utf8(&mut self, s: &str) -> usize {
        self.buf.extend_from_slice(s.as_bytes());
        s.len()
    }

    /// Writes an AMF0 `UTF-8`: a `u16` byte length followed by the bytes.
    ///
    /// The caller is responsible for keeping `s` within `u16::MAX` bytes.
    pub fn utf8_u16(&mut self, s: &str) {
        debug_assert!(s.len() <= u16::MAX as usize);
        self.u16(s.len() as u16);
        self.utf8(s);
    }
}
