//! Stream-based reader implementation.
//!
//! _Requires Cargo feature `std`._

use std::io::{self, Read, Seek, SeekFrom};

use alloc::vec::Vec;

use super::{ByteOrder, ReadError, Reader, Whence};

/// A [`Reader`] over any seekable stream, such as a file.
///
/// _Requires Cargo feature `std`._
#[derive(Debug)]
pub struct StreamReader<R> {
    inner: R,
    pos: u64,
    order: ByteOrder,
}

impl<R: Read + Seek> StreamReader<R> {
    /// Wrap a stream, starting from its current position.
    pub fn new(mut inner: R, order: ByteOrder) -> Result<Self, ReadError> {
        let pos = inner.stream_position()?;
        Ok(Self { inner, pos, order })
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Convert a failed read, resynchronising the tracked position.
    fn read_failed(&mut self, err: io::Error, offset: u64, wanted: usize) -> ReadError {
        if let Ok(pos) = self.inner.stream_position() {
            self.pos = pos;
        }

        match err.kind() {
            io::ErrorKind::UnexpectedEof => ReadError::EndOfData { offset, wanted },
            _ => err.into(),
        }
    }
}

impl<R: Read + Seek> Reader for StreamReader<R> {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), ReadError> {
        let offset = self.pos;

        match self.inner.read_exact(buf) {
            Ok(()) => {
                self.pos += buf.len() as u64;
                Ok(())
            }
            Err(err) => Err(self.read_failed(err, offset, buf.len())),
        }
    }

    fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64, ReadError> {
        let from = match whence {
            Whence::Start => SeekFrom::Start(
                u64::try_from(offset).map_err(|_| ReadError::InvalidSeek { offset, whence })?,
            ),
            Whence::Current => SeekFrom::Current(offset),
            Whence::End => SeekFrom::End(offset),
        };

        self.pos = self.inner.seek(from).map_err(|err| match err.kind() {
            io::ErrorKind::InvalidInput => ReadError::InvalidSeek { offset, whence },
            _ => err.into(),
        })?;

        Ok(self.pos)
    }

    fn order(&self) -> ByteOrder {
        self.order
    }

    fn set_order(&mut self, order: ByteOrder) -> ByteOrder {
        core::mem::replace(&mut self.order, order)
    }

    fn position(&mut self) -> Result<u64, ReadError> {
        Ok(self.pos)
    }

    fn read_bytes(&mut self, n: usize) -> Result<(u64, Vec<u8>), ReadError> {
        let offset = self.pos;

        // Grow with the data rather than trusting `n` up front.
        let mut buf = Vec::new();
        let result = (&mut self.inner).take(n as u64).read_to_end(&mut buf);
        let read = result.map_err(|err| self.read_failed(err, offset, n))?;
        self.pos += read as u64;

        if read < n {
            return Err(ReadError::EndOfData { offset, wanted: n });
        }

        Ok((offset, buf))
    }
}
