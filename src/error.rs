use alloc::{boxed::Box, string::FromUtf8Error, vec::Vec};

use thiserror::Error;

use crate::{
    directive::DirectiveError,
    reader::{ReadError, Whence},
};

/// Errors occurring while decoding a record.
///
/// Failures inside a field are wrapped in [`Error::Field`] once per level of
/// nesting. Each level's message names only its own field; the cause is its
/// [`source`](core::error::Error::source), so walking the chain reads as a
/// path from the outermost record to the failing field.
#[derive(Debug, Error)]
pub enum Error {
    /// The decode target was missing.
    #[error("Invalid decode target: expected a record, found none.")]
    InvalidTarget,
    /// A field's binding could not be evaluated.
    #[error("Failed to resolve the directive of field `{field}`.")]
    Directive {
        field: &'static str,
        source: DirectiveError,
    },
    /// An error from the reader.
    #[error(transparent)]
    Read(#[from] ReadError),
    /// Repositioning before a field failed.
    #[error("Failed to seek {offset} bytes from {whence:?}.")]
    Seek {
        offset: i64,
        whence: Whence,
        source: ReadError,
    },
    /// No routine with the requested name accepts this field.
    #[error(
        "No decoder `{routine}` for a field of type `{field_type}` on `{record}` or an enclosing record. Expected one of:\n\
         \tfn {routine}(&mut self, r: &mut dyn Reader) -> Result<(), Error>\n\
         \tfn {routine}(&mut self, r: &mut dyn Reader) -> Result<{field_type}, Error>\n\
         declared with `#[bin(decoder({routine}))]` or `#[bin(decoder({routine} -> {field_type}))]`."
    )]
    Unresolved {
        record: &'static str,
        routine: &'static str,
        field_type: &'static str,
    },
    /// An integer's width is given neither by its type nor by a usable length.
    #[error("Need a `len` of 1, 2, 4 or 8 or an explicitly sized type for `{type_name}` (found {length:?}).")]
    Width {
        type_name: &'static str,
        length: Option<u64>,
    },
    /// A variable-length field has no length.
    #[error("Need a `len` for {kind}.")]
    MissingLength { kind: &'static str },
    /// A length exceeds the capacity of a fixed-size array.
    #[error("Length {length} exceeds array of {capacity}.")]
    ArrayLength { length: u64, capacity: usize },
    /// A string field held invalid UTF-8.
    #[error(transparent)]
    Utf8(#[from] FromUtf8Error),
    /// An error raised by a decoding routine.
    #[error("{0}")]
    Custom(Box<dyn core::error::Error + Send + Sync>),
    /// An error within a named field.
    #[error("Failed to decode field `{name}`.")]
    Field {
        name: &'static str,
        source: Box<Error>,
    },
}

impl Error {
    /// Wrap an error from a decoding routine.
    pub fn custom(err: impl Into<Box<dyn core::error::Error + Send + Sync>>) -> Self {
        Self::Custom(err.into())
    }

    /// Attach the name of the field this error occurred in.
    pub fn in_field(self, name: &'static str) -> Self {
        Self::Field {
            name,
            source: Box::new(self),
        }
    }

    /// Names of the fields leading to the failure, outermost first.
    pub fn path(&self) -> Vec<&'static str> {
        let mut path = Vec::new();
        let mut err = self;

        while let Self::Field { name, source } = err {
            path.push(*name);
            err = source;
        }

        if let Self::Directive { field, .. } = err {
            path.push(*field);
        }

        path
    }

    /// The innermost error, beneath any field context.
    pub fn leaf(&self) -> &Error {
        match self {
            Self::Field { source, .. } => source.leaf(),
            err => err,
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::{
        string::{String, ToString},
        vec,
    };
    use core::{error::Error as _, iter};

    use super::*;

    fn chain(err: &Error) -> Vec<String> {
        iter::successors(Some(err as &dyn core::error::Error), |&err| err.source())
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn field_context_reads_as_path() {
        let err = Error::from(ReadError::EndOfData {
            offset: 3,
            wanted: 4,
        })
        .in_field("magic")
        .in_field("header");

        // Every level appears once when the chain is walked.
        assert_eq!(
            chain(&err),
            [
                "Failed to decode field `header`.",
                "Failed to decode field `magic`.",
                "Unexpected end of data: wanted 4 bytes at offset 3.",
            ]
        );
        assert_eq!(err.path(), vec!["header", "magic"]);
        assert!(matches!(err.leaf(), Error::Read(ReadError::EndOfData { .. })));
    }

    #[test]
    fn directive_failure_ends_path() {
        let err = Error::Directive {
            field: "name",
            source: DirectiveError::Length("-2".into()),
        }
        .in_field("entry");

        assert_eq!(err.path(), vec!["entry", "name"]);
        assert_eq!(
            chain(&err),
            [
                "Failed to decode field `entry`.",
                "Failed to resolve the directive of field `name`.",
                "Length -2 is out of range.",
            ]
        );
    }

    #[test]
    fn seek_failure_keeps_its_cause() {
        let err = Error::Seek {
            offset: -1,
            whence: Whence::Start,
            source: ReadError::InvalidSeek {
                offset: -1,
                whence: Whence::Start,
            },
        };

        assert_eq!(
            chain(&err),
            [
                "Failed to seek -1 bytes from Start.",
                "Cannot seek -1 bytes from Start.",
            ]
        );
    }

    #[test]
    fn custom_message_is_verbatim() {
        let err = Error::custom("checksum mismatch");
        assert_eq!(err.to_string(), "checksum mismatch");
        assert!(err.source().is_none());
    }
}
