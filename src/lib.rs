#![no_std]

//! Declarative decoding of binary records from seekable byte streams.
//!
//! Describe a binary layout as a Rust struct, annotate the fields whose
//! decoding needs more than their type (a length, a seek, a custom routine),
//! and decode without writing offset arithmetic.
//!
//! ```
//! #[derive(Debug, Record)]
//! struct Entry {
//!     name_len: u8,
//!     #[bin(len = self.name_len)]
//!     name: String,
//!     #[bin(offset_start = 32)]
//!     size: u32,
//!     #[bin(len = 4, elem(order = big))]
//!     flags: Vec<u16>,
//!     #[bin(skip)]
//!     cached: Option<Vec<u8>>,
//! }
//!
//! let entry: Entry = bytebind::from_slice(&data, ByteOrder::Little)?;
//! ```
//!
//! Fields decode in declaration order, so a binding may use any field declared
//! before it. See the [`Record`](macro@Record) derive macro for the full
//! attribute grammar, and [`Decode`] for the types fields may have.
//!
//! ## Cargo Features
//!
//! The following crate feature flags are available:
//!
//! - `derive`: enable the derive macro (default).
//! - `std`: enable the stream-based reader (default).

extern crate alloc;
#[cfg(any(feature = "std", test))]
extern crate std;

// Lets code generated by the derive macro name this crate from inside it.
extern crate self as bytebind;

pub mod decode;
pub mod delegate;
pub mod directive;
pub mod engine;
pub mod error;
pub mod reader;

pub use decode::Decode;
pub use delegate::{Delegate, Root, Scope};
pub use directive::{Directive, DirectiveError};
pub use engine::Record;
pub use error::Error;
pub use reader::{ByteOrder, ReadError, Reader, SliceReader, Whence};
#[cfg(feature = "std")]
pub use reader::StreamReader;

/// Derive [`Record`], [`Decode`] and [`Delegate`] for a struct with named
/// fields.
///
/// _Requires Cargo feature `derive`._
///
/// # Field options
///
/// Options go in a `#[bin(...)]` attribute on the field, separated by commas.
/// Expressions are evaluated on every decode with `self` bound to the record,
/// whose earlier fields are already decoded. Any integer type is accepted.
///
/// - `skip`: leave the field at its default, reading nothing. A skipped field
///   may have any type implementing [`Default`].
/// - `len = expr`: byte count of a `String`, element count of a `Vec` or
///   array, or width of an integer (required for `isize` and `usize`).
/// - `offset = expr`, `offset_start = expr`, `offset_end = expr`: seek relative
///   to the cursor, the start, or the end before decoding. Seeks apply in the
///   order written.
/// - `with = name`: decode with a routine declared on this record or an
///   enclosing one.
/// - `order = little` or `order = big`: byte order for this field and
///   everything nested in it.
/// - `elem(...)`: options for each element of a `Vec` or array.
///
/// ```
/// #[derive(Debug, Record)]
/// struct Table {
///     count: u16,
///     #[bin(len = self.count, elem(len = 4))]
///     offsets: Vec<usize>,
///     #[bin(offset_end = -4, order = big)]
///     checksum: u32,
/// }
/// ```
///
/// # Routines
///
/// Declare routines on the struct. A routine takes the reader and either
/// updates the record itself, or returns a value for the field, which must have
/// exactly the declared type. Errors may be any type converting into
/// [`Error`].
///
/// ```
/// #[derive(Debug, Record)]
/// #[bin(decoder(read_header), decoder(read_stamp -> u64))]
/// struct Capture {
///     #[bin(with = read_header)]
///     version: u8,
///     #[bin(with = read_stamp)]
///     stamp: u64,
///     frames: Frames,
/// }
///
/// impl Capture {
///     fn read_header(&mut self, r: &mut dyn Reader) -> Result<(), Error> {
///         if r.read_u16()? != 0xa1b2 {
///             return Err(Error::custom("bad magic"));
///         }
///         self.version = r.read_u8()?;
///         Ok(())
///     }
///
///     fn read_stamp(&mut self, r: &mut dyn Reader) -> Result<u64, Error> {
///         Ok(r.read_u32()? as u64 * 1_000)
///     }
/// }
/// ```
///
/// Here any field of `Frames` (or deeper) declared `#[bin(with = read_stamp)]`
/// with type `u64` is also decoded by `Capture::read_stamp`.
#[cfg(feature = "derive")]
pub use bytebind_derive::Record;

/// A record decodable through a trait object.
///
/// Implemented for every [`Record`].
pub trait DynRecord {
    fn decode_from(&mut self, r: &mut dyn Reader) -> Result<(), Error>;
}

impl<R: Record> DynRecord for R {
    fn decode_from(&mut self, r: &mut dyn Reader) -> Result<(), Error> {
        decode(self, r)
    }
}

/// Decode a record from a reader, starting at its current position.
pub fn decode<R: Record>(record: &mut R, r: &mut dyn Reader) -> Result<(), Error> {
    engine::decode_record(record, r, &mut Root)
}

/// Decode a record chosen at runtime.
///
/// Fails with [`Error::InvalidTarget`], without reading, when there is no
/// target.
pub fn decode_dyn(target: Option<&mut dyn DynRecord>, r: &mut dyn Reader) -> Result<(), Error> {
    let Some(target) = target else {
        return Err(Error::InvalidTarget);
    };

    target.decode_from(r)
}

/// Decode a record from the start of a slice.
pub fn decode_slice<R: Record>(data: &[u8], order: ByteOrder, record: &mut R) -> Result<(), Error> {
    decode(record, &mut SliceReader::new(data, order))
}

/// Decode a new record from the start of a slice.
pub fn from_slice<R: Record>(data: &[u8], order: ByteOrder) -> Result<R, Error> {
    let mut record = R::zero();
    decode_slice(data, order, &mut record)?;
    Ok(record)
}

/// Decode a record from a stream, starting at its current position.
///
/// _Requires Cargo feature `std`._
#[cfg(feature = "std")]
pub fn decode_reader<R: Record>(
    r: &mut (impl std::io::Read + std::io::Seek),
    order: ByteOrder,
    record: &mut R,
) -> Result<(), Error> {
    decode(record, &mut StreamReader::new(r, order)?)
}
