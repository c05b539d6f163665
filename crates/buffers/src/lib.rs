//! Byte buffer primitives for the AMF codecs.
//!
//! [`Writer`] appends big-endian integers, floats, U29 variable-length
//! integers and length-prefixed UTF-8. [`Reader`] reads them back with bounds
//! checking; every read failure reports the offset it happened at.

mod reader;
mod writer;

pub use reader::Reader;
pub use writer::Writer;

use thiserror::Error;

/// Largest value representable as an AMF3 U29.
pub const U29_MAX: u32 = 0x1fff_ffff;

/// Errors produced by [`Reader`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BufferError {
    #[error("unexpected end of buffer at byte {offset}: {needed} more byte(s) needed")]
    EndOfBuffer { offset: usize, needed: usize },
    #[error("invalid UTF-8 at byte {offset}")]
    InvalidUtf8 { offset: usize },
}

impl BufferError {
    /// Byte offset at which the failed read started.
    pub fn offset(&self) -> usize {
        match self {
            BufferError::EndOfBuffer { offset, .. } | BufferError::InvalidUtf8 { offset } => {
                *offset
            }
        }
    }
}
