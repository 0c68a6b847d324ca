use crate::{query::JoinKind, store::StorageError, value::ValueKind};
use thiserror::Error as ThisError;

///
/// Error
///
/// Top-level error taxonomy for the query core.
///
/// Construction-time failures (`TypeMismatch`, `UnsupportedJoin`,
/// `UnknownField`) surface at builder-call time, never at execution.
/// `ProjectionArityMismatch` is unavoidably deferred to row mapping
/// because target shapes are not introspected earlier. `Storage` is an
/// opaque pass-through from the storage session: it is never retried or
/// reinterpreted here, since idempotence of arbitrary queries cannot be
/// assumed.
///

#[derive(Clone, Debug, PartialEq, ThisError)]
pub enum Error {
    #[error("type mismatch in {context}: expected {expected}, found {found}")]
    TypeMismatch {
        expected: ValueKind,
        found: ValueKind,
        context: String,
    },

    #[error(
        "unsupported {kind} join from {source_entity} to {target}: no association path and no ON predicate"
    )]
    UnsupportedJoin {
        source_entity: &'static str,
        target: &'static str,
        kind: JoinKind,
    },

    #[error("unknown field '{field}' on entity {entity}")]
    UnknownField {
        entity: &'static str,
        field: String,
    },

    #[error("expected at most one result row, found {count}")]
    NonUniqueResult { count: usize },

    #[error("constructor projection expected {expected} values, found {found}")]
    ProjectionArityMismatch { expected: usize, found: usize },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl Error {
    pub(crate) fn type_mismatch(
        expected: ValueKind,
        found: ValueKind,
        context: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            expected,
            found,
            context: context.into(),
        }
    }
}
