//! Caller-supplied decoding routines and the chain of records offering them.
//!
//! A record opts into custom decoding by declaring routines with
//! `#[bin(decoder(...))]`. When a field asks for a routine with
//! `#[bin(with = ...)]`, the record declaring the field is asked first, then
//! each enclosing record from the nearest outward. This lets a routine written
//! once on an outer record serve every nested record that needs it.

use alloc::boxed::Box;
use core::{
    any::{Any, TypeId},
    mem,
};

use either::Either::{self, Left, Right};

use crate::{error::Error, reader::Reader};

/// A value produced by a routine, of the type the field asked for.
pub type Value = Box<dyn Any>;

/// The outcome of a routine: either it updated its record itself, or it
/// produced a value for the field.
pub type Delegated = Either<(), Value>;

#[doc(hidden)]
pub fn into_value<T: Any>(value: T) -> Value {
    Box::new(value)
}

/// Decoding routines offered by a record.
///
/// Derived from `#[bin(decoder(...))]`; the two methods correspond to the two
/// accepted routine shapes and are tried in order.
pub trait Delegate {
    /// Type name of the record, for diagnostics.
    fn record_name(&self) -> &'static str;

    /// Run a routine returning nothing, if one is named `routine`.
    fn decode_with(&mut self, routine: &str, r: &mut dyn Reader) -> Option<Result<(), Error>> {
        let _ = (routine, r);
        None
    }

    /// Run a routine producing a value of the type identified by `target`, if
    /// one is named `routine`.
    fn decode_value(
        &mut self,
        routine: &str,
        r: &mut dyn Reader,
        target: TypeId,
    ) -> Option<Result<Value, Error>> {
        let _ = (routine, r, target);
        None
    }
}

/// Records available for delegation, nearest first.
pub trait Scope {
    /// Type name of the nearest record, if any.
    fn owner(&self) -> Option<&'static str>;

    /// Find and run the first matching routine.
    ///
    /// `held` is the value being decoded one level below the nearest record,
    /// which is out of its slot while it decodes. A frame whose slot matches it
    /// puts it back for the duration of the routine, so the routine sees and
    /// may change the record as it currently stands.
    ///
    /// Returns `None` when no record in the scope offers one.
    fn resolve(
        &mut self,
        routine: &str,
        r: &mut dyn Reader,
        target: TypeId,
        held: Option<&mut dyn Any>,
    ) -> Option<Result<Delegated, Error>>;
}

/// The empty scope above a top-level record.
#[derive(Debug, Clone, Copy, Default)]
pub struct Root;

impl Scope for Root {
    fn owner(&self) -> Option<&'static str> {
        None
    }

    fn resolve(
        &mut self,
        _: &str,
        _: &mut dyn Reader,
        _: TypeId,
        _: Option<&mut dyn Any>,
    ) -> Option<Result<Delegated, Error>> {
        None
    }
}

/// A record pushed on top of an enclosing scope while one of its fields
/// decodes.
///
/// The field's value is out of the record for that time; `member` locates the
/// slot it returns to.
pub struct Frame<'a, R, T> {
    record: &'a mut R,
    member: fn(&mut R) -> &mut T,
    parent: &'a mut dyn Scope,
}

impl<'a, R, T> Frame<'a, R, T> {
    pub fn new(record: &'a mut R, member: fn(&mut R) -> &mut T, parent: &'a mut dyn Scope) -> Self {
        Self {
            record,
            member,
            parent,
        }
    }
}

impl<R: Delegate + 'static, T: 'static> Frame<'_, R, T> {
    fn resolve_here(
        &mut self,
        routine: &str,
        r: &mut dyn Reader,
        target: TypeId,
    ) -> Option<Result<Delegated, Error>> {
        try_delegate(&mut *self.record, routine, r, target).or_else(|| {
            let record = &mut *self.record as &mut dyn Any;
            self.parent.resolve(routine, r, target, Some(record))
        })
    }
}

impl<R: Delegate + 'static, T: 'static> Scope for Frame<'_, R, T> {
    fn owner(&self) -> Option<&'static str> {
        Some(self.record.record_name())
    }

    fn resolve(
        &mut self,
        routine: &str,
        r: &mut dyn Reader,
        target: TypeId,
        held: Option<&mut dyn Any>,
    ) -> Option<Result<Delegated, Error>> {
        let Some(held) = held.and_then(|held| held.downcast_mut::<T>()) else {
            return self.resolve_here(routine, r, target);
        };

        mem::swap((self.member)(&mut *self.record), held);
        let result = self.resolve_here(routine, r, target);
        mem::swap((self.member)(&mut *self.record), held);
        result
    }
}

/// A sequence offered to enclosing records while one of its elements decodes.
///
/// Elements decoded so far are visible; the one in progress is not.
pub struct Held<'a> {
    value: &'a mut dyn Any,
    parent: &'a mut dyn Scope,
}

impl<'a> Held<'a> {
    pub fn new(value: &'a mut dyn Any, parent: &'a mut dyn Scope) -> Self {
        Self { value, parent }
    }
}

impl Scope for Held<'_> {
    fn owner(&self) -> Option<&'static str> {
        self.parent.owner()
    }

    fn resolve(
        &mut self,
        routine: &str,
        r: &mut dyn Reader,
        target: TypeId,
        _: Option<&mut dyn Any>,
    ) -> Option<Result<Delegated, Error>> {
        self.parent.resolve(routine, r, target, Some(&mut *self.value))
    }
}

/// Ask a single record for a routine, preferring the shape returning nothing.
pub fn try_delegate(
    record: &mut dyn Delegate,
    routine: &str,
    r: &mut dyn Reader,
    target: TypeId,
) -> Option<Result<Delegated, Error>> {
    if let Some(result) = record.decode_with(routine, r) {
        return Some(result.map(Left));
    }

    record
        .decode_value(routine, r, target)
        .map(|result| result.map(Right))
}

/// Store the outcome of a routine into its slot.
///
/// A produced value of the wrong type is discarded: the slot cannot hold it.
pub(crate) fn settle<T: 'static>(slot: &mut T, delegated: Delegated) {
    if let Right(value) = delegated {
        if let Ok(value) = value.downcast::<T>() {
            *slot = *value;
        }
    }
}
