//! Quarry core: a typed, composable query-building and execution
//! engine over pluggable row storage.
//!
//! Queries are built in three strictly separated stages. Expressions
//! and predicates are immutable typed trees, validated as they are
//! constructed. A [`query::QueryBuilder`] accumulates clauses and
//! freezes into an immutable [`query::QueryPlan`]. An
//! [`exec::Executor`] (or the session-bound [`exec::QueryFactory`])
//! runs plans against a [`store::StorageSession`] and projects the
//! resulting rows.

pub mod error;
pub mod exec;
pub mod expr;
pub mod model;
pub mod predicate;
pub mod project;
pub mod query;
pub mod row;
pub mod store;
pub mod value;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::Error;

pub mod prelude {
    //! One-stop import for query construction and execution.

    pub use crate::{
        error::Error,
        exec::{Assignment, DeleteQuery, Executor, FluentQuery, PagedResult, QueryFactory, UpdateQuery},
        expr::{AggFunc, ArithOp, CaseBuilder, Column, Expr},
        model::{AssociationModel, EntityFieldModel, EntityModel, EntityRef},
        predicate::{BooleanBuilder, CompareOp, Predicate},
        project::{ConstructorBind, FieldBind, SetterBind},
        query::{
            JoinKind, JoinLink, JoinSpec, NullOrder, OrderDirection, OrderSpec,
            QueryBuilder, QueryPlan,
        },
        row::Row,
        store::{MemoryStore, RowKey, StorageError, StorageSession, StoredRow},
        value::{Value, ValueKind},
    };
}
