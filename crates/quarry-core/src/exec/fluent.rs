//! Session-bound fluent API. A [`QueryFactory`] wraps one storage
//! session and hands out chainable query, update, and delete builders
//! whose terminal methods execute immediately. The underlying
//! builder/plan/executor split stays available for callers that want to
//! freeze and reuse plans.

use crate::{
    error::Error,
    exec::{Assignment, Executor, PagedResult},
    expr::{Column, Expr},
    model::EntityRef,
    predicate::Predicate,
    query::{JoinKind, OrderSpec, QueryBuilder, QueryPlan},
    row::Row,
    store::StorageSession,
    value::Value,
};

///
/// QueryFactory
///

#[derive(Debug)]
pub struct QueryFactory<'s, S: StorageSession> {
    session: &'s S,
}

impl<'s, S: StorageSession> QueryFactory<'s, S> {
    #[must_use]
    pub const fn new(session: &'s S) -> Self {
        Self { session }
    }

    #[must_use]
    pub fn select(&self, exprs: Vec<Expr>) -> FluentQuery<'s, S> {
        FluentQuery {
            session: self.session,
            builder: QueryBuilder::select(exprs),
        }
    }

    #[must_use]
    pub fn select_from(&self, root: EntityRef) -> FluentQuery<'s, S> {
        FluentQuery {
            session: self.session,
            builder: QueryBuilder::select_from(root),
        }
    }

    #[must_use]
    pub const fn update(&self, target: EntityRef) -> UpdateQuery<'s, S> {
        UpdateQuery {
            session: self.session,
            target,
            assignments: Vec::new(),
            filter: None,
        }
    }

    #[must_use]
    pub const fn delete(&self, target: EntityRef) -> DeleteQuery<'s, S> {
        DeleteQuery {
            session: self.session,
            target,
            filter: None,
        }
    }
}

///
/// FluentQuery
///
/// A query builder carrying its session, so the chain ends in a fetch
/// instead of a plan. `build` escapes back to a reusable [`QueryPlan`],
/// which is also how subqueries are made.
///

#[derive(Debug)]
pub struct FluentQuery<'s, S: StorageSession> {
    session: &'s S,
    builder: QueryBuilder,
}

impl<S: StorageSession> FluentQuery<'_, S> {
    #[must_use]
    pub fn from(mut self, entity: EntityRef) -> Self {
        self.builder = self.builder.from(entity);
        self
    }

    pub fn join(mut self, target: EntityRef, kind: JoinKind) -> Result<Self, Error> {
        self.builder = self.builder.join(target, kind)?;
        Ok(self)
    }

    pub fn inner_join(self, target: EntityRef) -> Result<Self, Error> {
        self.join(target, JoinKind::Inner)
    }

    pub fn left_join(self, target: EntityRef) -> Result<Self, Error> {
        self.join(target, JoinKind::Left)
    }

    pub fn right_join(self, target: EntityRef) -> Result<Self, Error> {
        self.join(target, JoinKind::Right)
    }

    #[must_use]
    pub fn join_on(mut self, target: EntityRef, kind: JoinKind, condition: Predicate) -> Self {
        self.builder = self.builder.join_on(target, kind, condition);
        self
    }

    #[must_use]
    pub fn on(mut self, condition: Predicate) -> Self {
        self.builder = self.builder.on(condition);
        self
    }

    #[must_use]
    pub fn fetch_join(mut self) -> Self {
        self.builder = self.builder.fetch_join();
        self
    }

    #[must_use]
    pub fn filter(mut self, condition: Predicate) -> Self {
        self.builder = self.builder.filter(condition);
        self
    }

    #[must_use]
    pub fn filter_opt(mut self, condition: Option<Predicate>) -> Self {
        self.builder = self.builder.filter_opt(condition);
        self
    }

    #[must_use]
    pub fn where_(mut self, conditions: Vec<Option<Predicate>>) -> Self {
        self.builder = self.builder.where_(conditions);
        self
    }

    #[must_use]
    pub fn group_by(mut self, exprs: Vec<Expr>) -> Self {
        self.builder = self.builder.group_by(exprs);
        self
    }

    #[must_use]
    pub fn order_by(mut self, specs: Vec<OrderSpec>) -> Self {
        self.builder = self.builder.order_by(specs);
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        self.builder = self.builder.offset(offset);
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.builder = self.builder.limit(limit);
        self
    }

    /// Freeze into a plan without executing.
    #[must_use]
    pub fn build(self) -> QueryPlan {
        self.builder.build()
    }

    ///
    /// TERMINALS
    ///

    pub fn fetch_list(self) -> Result<Vec<Row>, Error> {
        let executor = Executor::new(self.session);
        executor.fetch_list(&self.builder.build())
    }

    pub fn fetch_one(self) -> Result<Option<Row>, Error> {
        let executor = Executor::new(self.session);
        executor.fetch_one(&self.builder.build())
    }

    pub fn fetch_first(self) -> Result<Option<Row>, Error> {
        let executor = Executor::new(self.session);
        executor.fetch_first(&self.builder.build())
    }

    pub fn fetch_paged(self) -> Result<PagedResult, Error> {
        let executor = Executor::new(self.session);
        executor.fetch_paged(&self.builder.build())
    }

    pub fn count(self) -> Result<u64, Error> {
        let executor = Executor::new(self.session);
        executor.count(&self.builder.build())
    }

    pub fn exists(self) -> Result<bool, Error> {
        let executor = Executor::new(self.session);
        executor.exists(&self.builder.build())
    }
}

///
/// UpdateQuery
///

#[derive(Debug)]
pub struct UpdateQuery<'s, S: StorageSession> {
    session: &'s S,
    target: EntityRef,
    assignments: Vec<Assignment>,
    filter: Option<Predicate>,
}

impl<S: StorageSession> UpdateQuery<'_, S> {
    pub fn set(mut self, column: Column, value: impl Into<Value>) -> Result<Self, Error> {
        self.assignments.push(Assignment::set(column, value)?);
        Ok(self)
    }

    pub fn set_expr(mut self, column: Column, expr: Expr) -> Result<Self, Error> {
        self.assignments.push(Assignment::set_expr(column, expr)?);
        Ok(self)
    }

    #[must_use]
    pub fn filter(mut self, condition: Predicate) -> Self {
        self.filter = Predicate::and_opt(self.filter.take(), Some(condition));
        self
    }

    /// Number of rows written.
    pub fn execute(self) -> Result<u64, Error> {
        let executor = Executor::new(self.session);
        executor.execute_update(self.target, &self.assignments, self.filter.as_ref())
    }
}

///
/// DeleteQuery
///

#[derive(Debug)]
pub struct DeleteQuery<'s, S: StorageSession> {
    session: &'s S,
    target: EntityRef,
    filter: Option<Predicate>,
}

impl<S: StorageSession> DeleteQuery<'_, S> {
    #[must_use]
    pub fn filter(mut self, condition: Predicate) -> Self {
        self.filter = Predicate::and_opt(self.filter.take(), Some(condition));
        self
    }

    /// Number of rows removed.
    pub fn execute(self) -> Result<u64, Error> {
        let executor = Executor::new(self.session);
        executor.execute_delete(self.target, self.filter.as_ref())
    }
}
