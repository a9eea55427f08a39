//! The record walk.
//!
//! A record's decode plan is produced by `#[derive(Record)]`: a list of field
//! names, a method evaluating each field's [`Directive`] against the record as
//! decoded so far, and a method routing each field to [`decode_member`]. The
//! functions here carry out that plan.

use core::{
    any::{Any, TypeId, type_name},
    mem,
};

use crate::{
    decode::Decode,
    delegate::{Delegate, Delegated, Frame, Scope, settle, try_delegate},
    directive::{Directive, DirectiveError},
    error::Error,
    reader::Reader,
};

/// A record whose fields can be decoded in declaration order.
///
/// Derive this trait with [`Record`](macro@crate::Record) rather than
/// implementing it by hand.
pub trait Record: Decode + Delegate {
    /// Type name, for diagnostics.
    const NAME: &'static str;
    /// Field names in declaration order.
    const FIELDS: &'static [&'static str];

    /// Evaluate the binding of the field at `field`.
    fn directive(&self, field: usize) -> Result<Directive, DirectiveError>;

    /// Decode the field at `field`, typically through [`decode_member`].
    ///
    /// `ancestors` holds the records enclosing this one, nearest first.
    fn decode_field(
        &mut self,
        field: usize,
        directive: &Directive,
        r: &mut dyn Reader,
        ancestors: &mut dyn Scope,
    ) -> Result<(), Error>;
}

/// Decode every field of a record, in declaration order.
///
/// Stops at the first failure; fields decoded before it keep their values.
pub fn decode_record<R: Record>(
    record: &mut R,
    r: &mut dyn Reader,
    ancestors: &mut dyn Scope,
) -> Result<(), Error> {
    for (index, &name) in R::FIELDS.iter().enumerate() {
        let directive = record
            .directive(index)
            .map_err(|source| Error::Directive {
                field: name,
                source,
            })?;

        if directive.ignore {
            continue;
        }

        positioned(r, &directive, |r| {
            record.decode_field(index, &directive, r, ancestors)
        })
        .map_err(|err| err.in_field(name))?;
    }

    Ok(())
}

/// Decode one field of a record, either through a routine or by its type.
///
/// A routine runs with the field in place, so one returning nothing may set
/// the field itself. Otherwise the value is moved out while it decodes, and the
/// record becomes the nearest enclosing record for the value's own nested
/// fields and elements. A routine found further out gets the value put back in
/// place while it runs.
pub fn decode_member<R, T>(
    record: &mut R,
    member: fn(&mut R) -> &mut T,
    directive: &Directive,
    r: &mut dyn Reader,
    ancestors: &mut dyn Scope,
) -> Result<(), Error>
where
    R: Record,
    T: Decode,
{
    if let Some(routine) = directive.delegate {
        let target = TypeId::of::<T>();
        let delegated = try_delegate(record, routine, r, target)
            .or_else(|| ancestors.resolve(routine, r, target, Some(&mut *record as &mut dyn Any)))
            .ok_or_else(|| unresolved::<T>(R::NAME, routine))??;

        settle(member(record), delegated);
        return Ok(());
    }

    let mut value = mem::replace(member(record), T::zero());
    let result = value.decode(directive, r, &mut Frame::new(&mut *record, member, ancestors));
    *member(record) = value;
    result
}

/// Decode one element of a sequence, with the same handling as a field.
///
/// `scope` starts with the record declaring the sequence.
pub fn decode_element<T: Decode>(
    value: &mut T,
    directive: &Directive,
    r: &mut dyn Reader,
    scope: &mut dyn Scope,
) -> Result<(), Error> {
    if directive.ignore {
        return Ok(());
    }

    positioned(r, directive, |r| {
        let Some(routine) = directive.delegate else {
            return value.decode(directive, r, scope);
        };

        let delegated: Delegated = scope
            .resolve(routine, r, TypeId::of::<T>(), None)
            .ok_or_else(|| unresolved::<T>(scope.owner().unwrap_or("<none>"), routine))??;

        settle(value, delegated);
        Ok(())
    })
}

/// Apply a directive's seeks and byte order around a decoding step.
///
/// The previous byte order is restored whether or not the step succeeds.
fn positioned(
    r: &mut dyn Reader,
    directive: &Directive,
    step: impl FnOnce(&mut dyn Reader) -> Result<(), Error>,
) -> Result<(), Error> {
    for seek in &directive.seek {
        r.seek(seek.offset, seek.whence)
            .map_err(|source| Error::Seek {
                offset: seek.offset,
                whence: seek.whence,
                source,
            })?;
    }

    let Some(order) = directive.order else {
        return step(r);
    };

    let previous = r.set_order(order);
    let result = step(r);
    r.set_order(previous);
    result
}

fn unresolved<T>(record: &'static str, routine: &'static str) -> Error {
    Error::Unresolved {
        record,
        routine,
        field_type: type_name::<T>(),
    }
}
