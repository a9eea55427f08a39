//! Byte sources consumed by the decoder.
//!
//! The decoder only ever talks to a [`Reader`]: a sequential, seekable source
//! of bytes with a configurable byte order. Two implementations are provided,
//! [`SliceReader`] over an in-memory buffer and, with the `std` feature,
//! [`StreamReader`] over any [`std::io::Read`] + [`std::io::Seek`].

use alloc::vec::Vec;

use thiserror::Error;
use zerocopy::byteorder::{BigEndian, F32, F64, I16, I32, I64, LittleEndian, U16, U32, U64};

pub mod slice;
#[cfg(feature = "std")]
pub mod stream;

pub use slice::SliceReader;
#[cfg(feature = "std")]
pub use stream::StreamReader;

/// Byte order of multi-byte numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    #[default]
    Little,
    Big,
}

/// Reference point of a seek.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Whence {
    /// From the first byte of the source.
    Start,
    /// From the current cursor.
    Current,
    /// From the end of the source.
    End,
}

/// Errors from a [`Reader`].
#[derive(Debug, Error)]
pub enum ReadError {
    /// Fewer bytes remained than were requested.
    #[error("Unexpected end of data: wanted {wanted} bytes at offset {offset}.")]
    EndOfData { offset: u64, wanted: usize },
    /// The seek would move the cursor before the start of the source.
    #[error("Cannot seek {offset} bytes from {whence:?}.")]
    InvalidSeek { offset: i64, whence: Whence },
    /// An error from the underlying stream.
    #[cfg(feature = "std")]
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Bytes read at a time when the total is not known to be available.
const CHUNK: usize = 256;

macro_rules! read_number {
    ($name:ident, $into:ident, $wire:ident) => {
        #[doc = concat!("Read a `", stringify!($into), "` in the reader's byte order.")]
        fn $name(&mut self) -> Result<$into, ReadError> {
            let mut buf = [0; size_of::<$into>()];
            self.read_exact(&mut buf)?;

            Ok(match self.order() {
                ByteOrder::Little => {
                    let value: $wire<LittleEndian> = zerocopy::transmute!(buf);
                    value.get()
                }
                ByteOrder::Big => {
                    let value: $wire<BigEndian> = zerocopy::transmute!(buf);
                    value.get()
                }
            })
        }
    };
}

/// A sequential, seekable byte source.
///
/// Implementors supply raw reads, seeking and the current byte order; typed
/// reads are provided on top of these. Every read advances the cursor by the
/// number of bytes consumed.
pub trait Reader {
    /// Fill `buf` completely from the cursor.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), ReadError>;

    /// Move the cursor, returning its new absolute position.
    fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64, ReadError>;

    /// Byte order used for multi-byte numbers.
    fn order(&self) -> ByteOrder;

    /// Replace the byte order, returning the previous one.
    fn set_order(&mut self, order: ByteOrder) -> ByteOrder;

    /// Absolute position of the cursor.
    fn position(&mut self) -> Result<u64, ReadError> {
        self.seek(0, Whence::Current)
    }

    fn read_u8(&mut self) -> Result<u8, ReadError> {
        let mut buf = [0; 1];
        self.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    fn read_i8(&mut self) -> Result<i8, ReadError> {
        Ok(self.read_u8()? as i8)
    }

    read_number!(read_u16, u16, U16);
    read_number!(read_u32, u32, U32);
    read_number!(read_u64, u64, U64);
    read_number!(read_i16, i16, I16);
    read_number!(read_i32, i32, I32);
    read_number!(read_i64, i64, I64);
    read_number!(read_f32, f32, F32);
    read_number!(read_f64, f64, F64);

    /// Read a single byte as a boolean, where any non-zero value is `true`.
    fn read_bool(&mut self) -> Result<bool, ReadError> {
        Ok(self.read_u8()? != 0)
    }

    /// Read exactly `n` bytes, returning them with the offset they started at.
    ///
    /// `n` often comes from the data itself, so the buffer grows with what is
    /// actually read. On failure the cursor may have moved past `offset`.
    fn read_bytes(&mut self, n: usize) -> Result<(u64, Vec<u8>), ReadError> {
        let offset = self.position()?;
        let mut buf = Vec::new();
        let mut chunk = [0; CHUNK];

        while buf.len() < n {
            let step = (n - buf.len()).min(CHUNK);
            match self.read_exact(&mut chunk[..step]) {
                Ok(()) => buf.extend_from_slice(&chunk[..step]),
                Err(ReadError::EndOfData { .. }) => {
                    return Err(ReadError::EndOfData { offset, wanted: n });
                }
                Err(err) => return Err(err),
            }
        }

        Ok((offset, buf))
    }

    /// Read `n` bytes without moving the cursor.
    fn peek(&mut self, n: usize) -> Result<Vec<u8>, ReadError> {
        let offset = self.position()?;
        let result = self.read_bytes(n);
        self.seek(offset as i64, Whence::Start)?;
        Ok(result?.1)
    }

    /// Read everything from the cursor to the end of the source.
    fn read_all(&mut self) -> Result<(u64, Vec<u8>), ReadError> {
        let offset = self.position()?;
        let end = self.seek(0, Whence::End)?;
        self.seek(offset as i64, Whence::Start)?;
        let n = usize::try_from(end.saturating_sub(offset)).map_err(|_| ReadError::EndOfData {
            offset,
            wanted: usize::MAX,
        })?;
        self.read_bytes(n)
    }
}
