//! Field projection for partial updates.
//!
//! Each updatable entity declares a static table of [`FieldDescriptor`]s. A
//! sparse input record reports one [`FieldValue`] per descriptor, and
//! [`project_fields`] keeps only the supplied ones, in declaration order,
//! paired with their persisted column names.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProjectionError {
    #[error("no fields to update")]
    NoFieldsToUpdate,
}

/// A value bound into an update statement.
///
/// NULLs keep their SQL type so a cleared column binds with the right
/// parameter type.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Text(Option<String>),
    Float(Option<f64>),
    Int(Option<i64>),
    Json(Option<Value>),
}

impl ColumnValue {
    #[must_use]
    pub fn is_null(&self) -> bool {
        match self {
            ColumnValue::Text(v) => v.is_none(),
            ColumnValue::Float(v) => v.is_none(),
            ColumnValue::Int(v) => v.is_none(),
            ColumnValue::Json(v) => v.is_none(),
        }
    }
}

/// Zero-value test for plain fields: NULL, empty text, `0`, `0.0`, or an
/// empty JSON object/array.
#[must_use]
#[allow(clippy::float_cmp)] // only an exact 0.0 counts as the zero value
pub fn is_zero_value(value: &ColumnValue) -> bool {
    match value {
        ColumnValue::Text(v) => v.as_deref().is_none_or(str::is_empty),
        ColumnValue::Float(v) => v.is_none_or(|f| f == 0.0),
        ColumnValue::Int(v) => v.is_none_or(|i| i == 0),
        ColumnValue::Json(v) => match v {
            None | Some(Value::Null) => true,
            Some(Value::Object(map)) => map.is_empty(),
            Some(Value::Array(items)) => items.is_empty(),
            Some(_) => false,
        },
    }
}

#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// Projected whenever the input marks the field present, even if the
    /// value is NULL or zero.
    Optional,
    /// Always carries a value; projected only when `is_zero` is false.
    ///
    /// A plain field deliberately set to its zero value cannot be told apart
    /// from one that was never supplied, and is skipped.
    Plain { is_zero: fn(&ColumnValue) -> bool },
}

impl FieldKind {
    /// Plain field using [`is_zero_value`] as its comparator.
    #[must_use]
    pub const fn plain() -> Self {
        FieldKind::Plain {
            is_zero: is_zero_value,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor {
    pub name: &'static str,
    /// Declared persisted name; the column falls back to `name` when unset.
    pub rename: Option<&'static str>,
    pub kind: FieldKind,
}

impl FieldDescriptor {
    #[must_use]
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            rename: None,
            kind,
        }
    }

    #[must_use]
    pub const fn renamed(name: &'static str, column: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            rename: Some(column),
            kind,
        }
    }

    #[must_use]
    pub fn column(&self) -> &'static str {
        self.rename.unwrap_or(self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Absent,
    Present(ColumnValue),
}

/// A partially populated input whose fields are described by a static table.
pub trait SparseRecord {
    /// Updatable fields in declaration order.
    const FIELDS: &'static [FieldDescriptor];

    /// One entry per element of [`Self::FIELDS`], in the same order.
    fn field_values(&self) -> Vec<FieldValue>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: &'static str,
    pub value: ColumnValue,
}

/// Non-empty, ordered set of column assignments for one update.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    assignments: Vec<Assignment>,
}

impl Projection {
    #[must_use]
    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.assignments.iter().map(|a| a.column)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    /// Never true for a projection returned by [`project_fields`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

/// Builds the projection of the fields actually supplied in `input`.
///
/// # Errors
///
/// Returns [`ProjectionError::NoFieldsToUpdate`] when nothing was supplied.
pub fn project_fields<R: SparseRecord>(input: &R) -> Result<Projection, ProjectionError> {
    let values = input.field_values();
    debug_assert_eq!(values.len(), R::FIELDS.len(), "one value per descriptor");

    let assignments: Vec<Assignment> = R::FIELDS
        .iter()
        .zip(values)
        .filter_map(|(descriptor, value)| {
            let FieldValue::Present(value) = value else {
                return None;
            };
            match descriptor.kind {
                FieldKind::Plain { is_zero } if is_zero(&value) => None,
                FieldKind::Optional | FieldKind::Plain { .. } => Some(Assignment {
                    column: descriptor.column(),
                    value,
                }),
            }
        })
        .collect();

    if assignments.is_empty() {
        return Err(ProjectionError::NoFieldsToUpdate);
    }
    Ok(Projection { assignments })
}

#[cfg(test)]
#[path = "projection_test.rs"]
mod tests;
