//! Per-field decoding instructions.
//!
//! A [`Directive`] is what a field's `#[bin(...)]` attribute evaluates to on a
//! particular decode. Bindings may refer to fields decoded earlier in the same
//! record (`len = self.count`), so directives are rebuilt for every field on
//! every call rather than stored.

use alloc::{
    boxed::Box,
    string::{String, ToString},
    vec::Vec,
};
use core::fmt::Display;

use thiserror::Error;

use crate::reader::{ByteOrder, Whence};

/// Instructions for decoding a single field or sequence element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directive {
    /// Skip the field entirely: no seek, no read.
    pub ignore: bool,
    /// Byte count for strings, element count for sequences, or integer width.
    pub length: Option<u64>,
    /// Name of a routine to decode the field with, instead of its type.
    pub delegate: Option<&'static str>,
    /// Repositions applied in order before decoding.
    pub seek: Vec<Seek>,
    /// Byte order for this field and everything nested under it.
    pub order: Option<ByteOrder>,
    /// Directive for each element of a sequence.
    pub element: Option<Box<Directive>>,
}

/// A single reposition of the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Seek {
    pub offset: i64,
    pub whence: Whence,
}

/// An error evaluating a binding.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DirectiveError {
    /// A length was negative or too large.
    #[error("Length {0} is out of range.")]
    Length(String),
    /// An offset did not fit a signed 64-bit integer.
    #[error("Offset {0} is out of range.")]
    Offset(String),
}

impl Directive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ignore(mut self) -> Self {
        self.ignore = true;
        self
    }

    pub fn length(mut self, length: u64) -> Self {
        self.length = Some(length);
        self
    }

    pub fn delegate(mut self, routine: &'static str) -> Self {
        self.delegate = Some(routine);
        self
    }

    pub fn seek(mut self, offset: i64, whence: Whence) -> Self {
        self.seek.push(Seek { offset, whence });
        self
    }

    pub fn order(mut self, order: ByteOrder) -> Self {
        self.order = Some(order);
        self
    }

    pub fn element(mut self, element: Directive) -> Self {
        self.element = Some(Box::new(element));
        self
    }
}

/// Convert a length binding of any integer type.
pub fn length<T>(value: T) -> Result<u64, DirectiveError>
where
    T: TryInto<u64> + Copy + Display,
{
    value
        .try_into()
        .map_err(|_| DirectiveError::Length(value.to_string()))
}

/// Convert an offset binding of any integer type.
pub fn offset<T>(value: T) -> Result<i64, DirectiveError>
where
    T: TryInto<i64> + Copy + Display,
{
    value
        .try_into()
        .map_err(|_| DirectiveError::Offset(value.to_string()))
}
