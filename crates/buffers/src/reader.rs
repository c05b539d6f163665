//! Bounds-checked big-endian byte reader.

use std::str;

use crate::BufferError;

/// A cursor over a byte slice. Every read is bounds-checked and leaves the
/// cursor untouched when it fails.
///
/// # Example
///
/// ```
/// use amf_buffers::Reader;
///
/// let data = [0x01, 0x02, 0x03, 0x81, 0x00];
/// let mut reader = Reader::new(&data);
///
/// assert_eq!(reader.try_u8(), Ok(0x01));
/// assert_eq!(reader.try_u16(), Ok(0x0203));
/// assert_eq!(reader.try_u29(), Ok(0x80));
/// assert!(reader.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    x: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, x: 0 }
    }

    /// Current cursor position.
    pub fn position(&self) -> usize {
        self.x
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.x
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    #[inline]
    fn take(&mut self, n: usize) -> Result<&'a [u8], BufferError> {
        if n > self.remaining() {
            return Err(BufferError::EndOfBuffer {
                offset: self.x,
                needed: n - self.remaining(),
            });
        }
        let bytes = &self.data[self.x..self.x + n];
        self.x += n;
        Ok(bytes)
    }

    #[inline]
    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], BufferError> {
        let bytes = self.take(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Peeks at the current byte without advancing.
    pub fn try_peek(&self) -> Result<u8, BufferError> {
        self.data
            .get(self.x)
            .copied()
            .ok_or(BufferError::EndOfBuffer {
                offset: self.x,
                needed: 1,
            })
    }

    #[inline]
    pub fn try_u8(&mut self) -> Result<u8, BufferError> {
        Ok(self.take_array::<1>()?[0])
    }

    #[inline]
    pub fn try_u16(&mut self) -> Result<u16, BufferError> {
        self.take_array().map(u16::from_be_bytes)
    }

    #[inline]
    pub fn try_i32(&mut self) -> Result<i32, BufferError> {
        self.take_array().map(i32::from_be_bytes)
    }

    #[inline]
    pub fn try_u32(&mut self) -> Result<u32, BufferError> {
        self.take_array().map(u32::from_be_bytes)
    }

    /// Reads a 64-bit float from its raw big-endian bits.
    #[inline]
    pub fn try_f64(&mut self) -> Result<f64, BufferError> {
        self.take_array()
            .map(|b| f64::from_bits(u64::from_be_bytes(b)))
    }

    /// Reads an AMF3 U29. Fails without advancing if the input ends inside
    /// the integer.
    pub fn try_u29(&mut self) -> Result<u32, BufferError> {
        let start = self.x;
        let mut val: u32 = 0;
        for i in 0..4 {
            let byte = match self.try_u8() {
                Ok(byte) => byte,
                Err(_) => {
                    self.x = start;
                    return Err(BufferError::EndOfBuffer {
                        offset: start,
                        needed: 1,
                    });
                }
            };
            if i == 3 {
                return Ok((val << 8) | byte as u32);
            }
            val = (val << 7) | (byte & 0x7f) as u32;
            if byte & 0x80 == 0 {
                return Ok(val);
            }
        }
        Ok(val)
    }

    /// Reads `size` raw bytes.
    pub fn try_buf(&mut self, size: usize) -> Result<&'a [u8], BufferError> {
        self.take(size)
    }

    /// Reads `size` bytes of UTF-8.
    pub fn try_utf8(&mut self, size: usize) -> Result<&'a str, BufferError> {
        let start = self.x;
        let bytes = self.take(size)?;
        str::from_utf8(bytes).map_err(|_| {
            self.x = start;
            BufferError::InvalidUtf8 { offset: start }
        })
    }

    /// Reads an AMF0 `UTF-8`: a `u16` byte length followed by the bytes.
    pub fn try_utf8_u16(&mut self) -> Result<&'a str, BufferError> {
        let start = self.x;
        let len = self.try_u16()? as usize;
        self.try_utf8(len).inspect_err(|_| self.x = start)
    }
}
