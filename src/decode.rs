//! Decoding by field type.
//!
//! Every type that can appear as a record field implements [`Decode`]. The
//! implementations here cover integers, floats, booleans, strings, vectors and
//! arrays; records get theirs from `#[derive(Record)]`. Other types can take
//! part by implementing the trait by hand.

use alloc::{string::String, vec::Vec};
use core::any::type_name;

use crate::{
    delegate::{Held, Scope},
    directive::Directive,
    engine::decode_element,
    error::Error,
    reader::{ReadError, Reader},
};

/// A value that can be decoded from a [`Reader`] under a [`Directive`].
pub trait Decode: Sized + 'static {
    /// The value a field holds before it is decoded.
    fn zero() -> Self;

    /// Decode in place.
    ///
    /// `scope` holds the record declaring the field followed by its enclosing
    /// records, for delegation by nested values.
    fn decode(
        &mut self,
        directive: &Directive,
        r: &mut dyn Reader,
        scope: &mut dyn Scope,
    ) -> Result<(), Error>;
}

/// Pick an integer width: the first of 1, 2, 4 and 8 bytes equal to either the
/// directive's length or the type's own width.
///
/// The two are alternatives, not a cross-check: an `i32` with `len = 1` reads
/// one byte, and with `len = 8` reads four.
fn resolve_width(length: Option<u64>, native: Option<u64>, type_name: &'static str) -> Result<u64, Error> {
    [1, 2, 4, 8]
        .into_iter()
        .find(|w| length == Some(*w) || native == Some(*w))
        .ok_or(Error::Width { type_name, length })
}

/// A byte count that cannot fit in memory is more than any source holds.
fn byte_count(length: u64, r: &mut dyn Reader) -> Result<usize, Error> {
    let Ok(count) = usize::try_from(length) else {
        return Err(ReadError::EndOfData {
            offset: r.position()?,
            wanted: usize::MAX,
        }
        .into());
    };

    Ok(count)
}

fn read_signed(r: &mut dyn Reader, width: u64) -> Result<i64, Error> {
    Ok(match width {
        1 => r.read_i8()? as i64,
        2 => r.read_i16()? as i64,
        4 => r.read_i32()? as i64,
        _ => r.read_i64()?,
    })
}

fn read_unsigned(r: &mut dyn Reader, width: u64) -> Result<u64, Error> {
    Ok(match width {
        1 => r.read_u8()? as u64,
        2 => r.read_u16()? as u64,
        4 => r.read_u32()? as u64,
        _ => r.read_u64()?,
    })
}

macro_rules! decode_integer {
    ($t:ident, $read:ident, $native:expr) => {
        impl Decode for $t {
            fn zero() -> Self {
                0
            }

            fn decode(&mut self, d: &Directive, r: &mut dyn Reader, _: &mut dyn Scope) -> Result<(), Error> {
                let width = resolve_width(d.length, $native, type_name::<$t>())?;
                *self = $read(r, width)? as $t;
                Ok(())
            }
        }
    };
}

decode_integer!(i8, read_signed, Some(1));
decode_integer!(i16, read_signed, Some(2));
decode_integer!(i32, read_signed, Some(4));
decode_integer!(i64, read_signed, Some(8));
decode_integer!(isize, read_signed, None);

decode_integer!(u8, read_unsigned, Some(1));
decode_integer!(u16, read_unsigned, Some(2));
decode_integer!(u32, read_unsigned, Some(4));
decode_integer!(u64, read_unsigned, Some(8));
decode_integer!(usize, read_unsigned, None);

macro_rules! decode_fixed {
    ($t:ident, $zero:expr, $read:ident) => {
        impl Decode for $t {
            fn zero() -> Self {
                $zero
            }

            fn decode(&mut self, _: &Directive, r: &mut dyn Reader, _: &mut dyn Scope) -> Result<(), Error> {
                *self = r.$read()?;
                Ok(())
            }
        }
    };
}

decode_fixed!(f32, 0.0, read_f32);
decode_fixed!(f64, 0.0, read_f64);
decode_fixed!(bool, false, read_bool);

impl Decode for String {
    fn zero() -> Self {
        String::new()
    }

    fn decode(&mut self, d: &Directive, r: &mut dyn Reader, _: &mut dyn Scope) -> Result<(), Error> {
        let length = d.length.ok_or(Error::MissingLength { kind: "string" })?;
        let count = byte_count(length, r)?;
        let (_, bytes) = r.read_bytes(count)?;
        *self = String::from_utf8(bytes)?;
        Ok(())
    }
}

/// Appends `length` elements to whatever the vector already holds.
impl<T: Decode> Decode for Vec<T> {
    fn zero() -> Self {
        Vec::new()
    }

    fn decode(&mut self, d: &Directive, r: &mut dyn Reader, scope: &mut dyn Scope) -> Result<(), Error> {
        let length = d.length.ok_or(Error::MissingLength { kind: "slice" })?;
        let default = Directive::default();
        let element = d.element.as_deref().unwrap_or(&default);

        for _ in 0..length {
            let mut value = T::zero();
            decode_element(&mut value, element, r, &mut Held::new(self, scope))?;
            self.push(value);
        }

        Ok(())
    }
}

/// Decodes `length` elements from the front, or the whole array when no
/// length (or zero) is given.
impl<T: Decode, const N: usize> Decode for [T; N] {
    fn zero() -> Self {
        core::array::from_fn(|_| T::zero())
    }

    fn decode(&mut self, d: &Directive, r: &mut dyn Reader, scope: &mut dyn Scope) -> Result<(), Error> {
        let length = d.length.filter(|l| *l != 0).unwrap_or(N as u64);
        let count = usize::try_from(length)
            .ok()
            .filter(|count| *count <= N)
            .ok_or(Error::ArrayLength {
                length,
                capacity: N,
            })?;

        let default = Directive::default();
        let element = d.element.as_deref().unwrap_or(&default);

        for index in 0..count {
            let mut value = T::zero();
            decode_element(&mut value, element, r, &mut Held::new(self, scope))?;
            self[index] = value;
        }

        Ok(())
    }
}
