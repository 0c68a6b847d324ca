//! Row-to-struct projection. Three binding strategies mirror the three
//! ways a target type can accept values: direct field assignment,
//! setter-style mutation, and positional construction.
//!
//! Field and setter binding match selections by binding name, so an
//! expression selected under an alias lands in the field of that name
//! and an unnamed expression (no alias, not a bare column) is silently
//! skipped. Constructor binding is positional and immune to naming, but
//! strict about arity.

#[cfg(test)]
mod tests;

use crate::{error::Error, row::Row, value::Value};

///
/// FieldBind
///
/// Target of by-name field projection. `bind_field` returns whether the
/// name was recognized; unknown names are ignored by the driver, which
/// is what lets one row feed differently-shaped targets.
///

pub trait FieldBind: Default {
    fn bind_field(&mut self, field: &str, value: &Value) -> bool;
}

///
/// SetterBind
///
/// Setter-style counterpart of [`FieldBind`]. Distinct from it because
/// a target may accept different names through setters than it exposes
/// as fields, or normalize values on the way in.
///

pub trait SetterBind: Default {
    fn apply_setter(&mut self, field: &str, value: &Value) -> bool;
}

///
/// ConstructorBind
///
/// Positional construction from a full row. Implementations should
/// check arity with [`expect_arity`] and value kinds as they destructure.
///

pub trait ConstructorBind: Sized {
    fn from_values(values: &[Value]) -> Result<Self, Error>;
}

/// Guard for [`ConstructorBind`] implementations.
pub fn expect_arity(values: &[Value], expected: usize) -> Result<(), Error> {
    if values.len() == expected {
        Ok(())
    } else {
        Err(Error::ProjectionArityMismatch {
            expected,
            found: values.len(),
        })
    }
}

/// Project one row by field names.
#[must_use]
pub fn fields<T: FieldBind>(row: &Row) -> T {
    let mut target = T::default();
    bind_named(row, |name, value| {
        target.bind_field(name, value);
    });
    target
}

/// Project one row through setters.
#[must_use]
pub fn setters<T: SetterBind>(row: &Row) -> T {
    let mut target = T::default();
    bind_named(row, |name, value| {
        target.apply_setter(name, value);
    });
    target
}

/// Project one row positionally.
pub fn constructor<T: ConstructorBind>(row: &Row) -> Result<T, Error> {
    T::from_values(row.values())
}

pub fn fields_list<T: FieldBind>(rows: &[Row]) -> Vec<T> {
    rows.iter().map(fields).collect()
}

pub fn setters_list<T: SetterBind>(rows: &[Row]) -> Vec<T> {
    rows.iter().map(setters).collect()
}

pub fn constructor_list<T: ConstructorBind>(rows: &[Row]) -> Result<Vec<T>, Error> {
    rows.iter().map(constructor).collect()
}

fn bind_named(row: &Row, mut bind: impl FnMut(&str, &Value)) {
    for (expr, value) in row.exprs().iter().zip(row.values()) {
        if let Some(name) = expr.binding_name() {
            bind(name, value);
        }
    }
}
