pub(crate) mod eval;
pub mod fluent;
pub(crate) mod pipeline;


pub use fluent::{DeleteQuery, FluentQuery, QueryFactory, UpdateQuery};

use crate::{
    error::Error,
    exec::eval::{Binding, Scope},
    expr::{Column, Expr},
    model::EntityRef,
    predicate::Predicate,
    query::QueryPlan,
    row::Row,
    store::StorageSession,
    value::Value,
};
use tracing::debug;

///
/// PagedResult
///
/// One page of rows plus the total the query would produce without
/// paging. The total costs a second execution of the un-paged query.
///

#[derive(Clone, Debug, PartialEq)]
pub struct PagedResult {
    pub rows: Vec<Row>,
    pub total: u64,
    pub offset: u64,
    pub limit: Option<u64>,
}

///
/// Assignment
///
/// One field mutation of a bulk update. Constructors type-check the
/// assigned value against the column, so an executed update never
/// writes a mismatched kind.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Assignment {
    pub(crate) column: Column,
    pub(crate) value: Expr,
}

impl Assignment {
    pub fn set(column: Column, value: impl Into<Value>) -> Result<Self, Error> {
        let value = value.into();
        if !value.is_null() && !column.kind.comparable_with(value.kind()) {
            return Err(Error::type_mismatch(
                column.kind,
                value.kind(),
                format!("set {}.{}", column.entity, column.field),
            ));
        }

        Ok(Self {
            column,
            value: Expr::Literal(value),
        })
    }

    /// Assign a computed expression, typically derived from the row's
    /// current values.
    pub fn set_expr(column: Column, expr: Expr) -> Result<Self, Error> {
        if !column.kind.comparable_with(expr.kind()) {
            return Err(Error::type_mismatch(
                column.kind,
                expr.kind(),
                format!("set {}.{}", column.entity, column.field),
            ));
        }

        Ok(Self {
            column,
            value: expr,
        })
    }
}

///
/// Executor
///
/// Terminal operations over frozen plans, bound to one storage session.
/// Plans stay untouched; every method may be called any number of times
/// against the same plan.
///

pub struct Executor<'s, S: StorageSession> {
    session: &'s S,
}

impl<'s, S: StorageSession> Executor<'s, S> {
    #[must_use]
    pub const fn new(session: &'s S) -> Self {
        Self { session }
    }

    /// All result rows.
    pub fn fetch_list(&self, plan: &QueryPlan) -> Result<Vec<Row>, Error> {
        let rows = pipeline::run(self.session, plan, None)?;
        debug!(rows = rows.len(), "fetch_list");

        Ok(rows)
    }

    /// Exactly zero or one row; two or more is an error.
    pub fn fetch_one(&self, plan: &QueryPlan) -> Result<Option<Row>, Error> {
        let mut rows = pipeline::run(self.session, plan, None)?;
        match rows.len() {
            0 => Ok(None),
            1 => Ok(rows.pop()),
            count => Err(Error::NonUniqueResult { count }),
        }
    }

    /// The first row, however many there are.
    pub fn fetch_first(&self, plan: &QueryPlan) -> Result<Option<Row>, Error> {
        let limited = QueryPlan {
            limit: Some(1),
            ..plan.clone()
        };
        let mut rows = pipeline::run(self.session, &limited, None)?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }

    /// Number of rows the plan produces, ignoring its ordering and
    /// paging.
    pub fn count(&self, plan: &QueryPlan) -> Result<u64, Error> {
        if plan.group_by.is_empty() && !plan.has_aggregates() {
            let rows = pipeline::run(self.session, &plan.for_count(), None)?;
            let count = rows
                .first()
                .and_then(|row| row.at(0))
                .and_then(Value::as_i64)
                .unwrap_or(0);
            return Ok(count.max(0).unsigned_abs());
        }

        // Grouped or aggregated plans count their result rows.
        let stripped = QueryPlan {
            order_by: Vec::new(),
            offset: None,
            limit: None,
            ..plan.clone()
        };
        let rows = pipeline::run(self.session, &stripped, None)?;
        Ok(u64::try_from(rows.len()).unwrap_or(u64::MAX))
    }

    /// Whether the plan produces at least one row.
    pub fn exists(&self, plan: &QueryPlan) -> Result<bool, Error> {
        Ok(self.fetch_first(plan)?.is_some())
    }

    /// One page per the plan's own offset and limit, plus the un-paged
    /// total.
    pub fn fetch_paged(&self, plan: &QueryPlan) -> Result<PagedResult, Error> {
        let rows = pipeline::run(self.session, plan, None)?;
        let total = self.count(plan)?;
        debug!(rows = rows.len(), total, "fetch_paged");

        Ok(PagedResult {
            rows,
            total,
            offset: plan.offset.unwrap_or(0),
            limit: plan.limit,
        })
    }

    ///
    /// BULK MUTATIONS
    ///
    /// Bulk operations write straight to the storage session. Rows
    /// fetched before a bulk write are plain values and keep their old
    /// contents; re-fetch to observe the new state.
    ///

    /// Update every row of `target` matching `filter` (all rows when
    /// `None`). Assignment expressions see the row's pre-update values.
    pub fn execute_update(
        &self,
        target: EntityRef,
        assignments: &[Assignment],
        filter: Option<&Predicate>,
    ) -> Result<u64, Error> {
        let mut updates = Vec::new();

        for stored in self.session.scan(target.model)? {
            let frames = vec![Binding {
                alias: target.alias,
                row: Some(stored.clone()),
            }];
            let scope = Scope {
                frames: &frames,
                outer: None,
            };

            let matched = match filter {
                None => true,
                Some(filter) => eval::eval_pred(filter, &scope, None, self.session)?,
            };
            if !matched {
                continue;
            }

            let mut fields = Vec::with_capacity(assignments.len());
            for assignment in assignments {
                let value =
                    eval::eval_expr(&assignment.value, &scope, None, self.session)?;
                fields.push((assignment.column.field.to_string(), value));
            }
            updates.push((stored.key, fields));
        }

        let written = self.session.apply_update(target.model, updates)?;
        debug!(entity = target.model.name, written, "execute_update");

        Ok(written)
    }

    /// Delete every row of `target` matching `filter` (all rows when
    /// `None`).
    pub fn execute_delete(
        &self,
        target: EntityRef,
        filter: Option<&Predicate>,
    ) -> Result<u64, Error> {
        let mut keys = Vec::new();

        for stored in self.session.scan(target.model)? {
            let frames = vec![Binding {
                alias: target.alias,
                row: Some(stored.clone()),
            }];
            let scope = Scope {
                frames: &frames,
                outer: None,
            };

            let matched = match filter {
                None => true,
                Some(filter) => eval::eval_pred(filter, &scope, None, self.session)?,
            };
            if matched {
                keys.push(stored.key);
            }
        }

        let removed = self.session.delete_rows(target.model, keys)?;
        debug!(entity = target.model.name, removed, "execute_delete");

        Ok(removed)
    }
}
