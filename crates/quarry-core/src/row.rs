//! Result rows. A row pairs the plan's select expressions with the
//! values they produced, so callers can look values up structurally (by
//! the expression they selected) or positionally.

use crate::{expr::Expr, value::Value};
use std::sync::Arc;

///
/// Row
///
/// One result row. The expression list is shared across every row of a
/// result set, since it is identical for all of them.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    exprs: Arc<Vec<Expr>>,
    values: Vec<Value>,
}

impl Row {
    #[must_use]
    pub(crate) const fn new(exprs: Arc<Vec<Expr>>, values: Vec<Value>) -> Self {
        Self { exprs, values }
    }

    /// Value of a selected expression, matched structurally. An aliased
    /// selection also matches a lookup by its inner expression.
    #[must_use]
    pub fn get(&self, expr: &Expr) -> Option<&Value> {
        self.exprs.iter().position(|e| {
            e == expr
                || matches!(e, Expr::Alias { expr: inner, .. } if inner.as_ref() == expr)
        })
        .map(|idx| &self.values[idx])
    }

    /// Value of a selection by binding name: its alias, or a bare
    /// column's field name.
    #[must_use]
    pub fn get_named(&self, name: &str) -> Option<&Value> {
        self.exprs
            .iter()
            .position(|e| e.binding_name() == Some(name))
            .map(|idx| &self.values[idx])
    }

    #[must_use]
    pub fn at(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    #[must_use]
    pub fn exprs(&self) -> &[Expr] {
        &self.exprs
    }

    #[must_use]
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
