//! Slice-based reader implementation.

use alloc::vec::Vec;

use super::{ByteOrder, ReadError, Reader, Whence};

/// A [`Reader`] over an in-memory buffer.
#[derive(Debug, Clone)]
pub struct SliceReader<'a> {
    data: &'a [u8],
    pos: usize,
    order: ByteOrder,
}

impl<'a> SliceReader<'a> {
    pub fn new(data: &'a [u8], order: ByteOrder) -> Self {
        Self {
            data,
            pos: 0,
            order,
        }
    }

    pub fn little_endian(data: &'a [u8]) -> Self {
        Self::new(data, ByteOrder::Little)
    }

    pub fn big_endian(data: &'a [u8]) -> Self {
        Self::new(data, ByteOrder::Big)
    }

    /// Bytes after the cursor. Empty once the cursor is at or past the end.
    pub fn remaining(&self) -> &'a [u8] {
        self.data.get(self.pos..).unwrap_or_default()
    }

    /// Take an exact number of bytes from the cursor, advancing it.
    fn take(&mut self, n: usize) -> Result<&'a [u8], ReadError> {
        let (data, pos) = (self.data, self.pos);
        let bytes = pos
            .checked_add(n)
            .and_then(|end| data.get(pos..end))
            .ok_or(ReadError::EndOfData {
                offset: pos as u64,
                wanted: n,
            })?;

        self.pos += n;
        Ok(bytes)
    }
}

impl Reader for SliceReader<'_> {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), ReadError> {
        buf.copy_from_slice(self.take(buf.len())?);
        Ok(())
    }

    fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64, ReadError> {
        let base = match whence {
            Whence::Start => 0,
            Whence::Current => self.pos as i64,
            Whence::End => self.data.len() as i64,
        };

        // Seeking past the end is allowed; the next read reports it.
        let target = base
            .checked_add(offset)
            .and_then(|target| usize::try_from(target).ok())
            .ok_or(ReadError::InvalidSeek { offset, whence })?;

        self.pos = target;
        Ok(target as u64)
    }

    fn order(&self) -> ByteOrder {
        self.order
    }

    fn set_order(&mut self, order: ByteOrder) -> ByteOrder {
        core::mem::replace(&mut self.order, order)
    }

    fn position(&mut self) -> Result<u64, ReadError> {
        Ok(self.pos as u64)
    }

    fn read_bytes(&mut self, n: usize) -> Result<(u64, Vec<u8>), ReadError> {
        let offset = self.pos as u64;
        Ok((offset, self.take(n)?.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_past_end() {
        let mut r = SliceReader::little_endian(&[1, 2, 3]);
        r.read_u16().unwrap();

        let err = r.read_u16().unwrap_err();
        assert!(matches!(
            err,
            ReadError::EndOfData {
                offset: 2,
                wanted: 2
            }
        ));
        // A failed read does not consume.
        assert_eq!(r.remaining(), [3]);
    }

    #[test]
    fn seek_from_each_origin() {
        let mut r = SliceReader::little_endian(&[0, 1, 2, 3, 4, 5]);
        assert_eq!(r.seek(4, Whence::Start).unwrap(), 4);
        assert_eq!(r.seek(-3, Whence::Current).unwrap(), 1);
        assert_eq!(r.seek(-1, Whence::End).unwrap(), 5);
        assert_eq!(r.read_u8().unwrap(), 5);
    }

    #[test]
    fn seek_before_start_fails() {
        let mut r = SliceReader::little_endian(&[0, 1]);
        r.read_u8().unwrap();

        assert!(matches!(
            r.seek(-2, Whence::Current),
            Err(ReadError::InvalidSeek { offset: -2, .. })
        ));
        assert_eq!(r.position().unwrap(), 1);
    }

    #[test]
    fn seek_past_end_then_read() {
        let mut r = SliceReader::little_endian(&[0, 1]);
        assert_eq!(r.seek(10, Whence::Start).unwrap(), 10);
        assert!(r.remaining().is_empty());
        assert!(matches!(
            r.read_bytes(1),
            Err(ReadError::EndOfData { offset: 10, .. })
        ));
    }

    #[test]
    fn seek_far_past_end() {
        let mut r = SliceReader::little_endian(&[1, 2]);

        // Positions a `usize` cannot hold are rejected rather than wrapped.
        match r.seek(i64::MAX, Whence::Start) {
            Ok(pos) => {
                assert_eq!(pos, i64::MAX as u64);
                assert!(matches!(r.read_u8(), Err(ReadError::EndOfData { .. })));
                assert!(r.remaining().is_empty());
            }
            Err(err) => assert!(matches!(err, ReadError::InvalidSeek { .. })),
        }
    }
}
