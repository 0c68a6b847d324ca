#[cfg(test)]
mod tests;

use crate::{
    error::Error,
    expr::Expr,
    model::EntityRef,
    predicate::Predicate,
    value::ValueKind,
};
use derive_more::Display;
use serde::Serialize;

///
/// JoinKind
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Serialize)]
pub enum JoinKind {
    #[display("inner")]
    Inner,
    #[display("left")]
    Left,
    #[display("right")]
    Right,
}

///
/// OrderDirection
///

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum OrderDirection {
    Asc,
    Desc,
}

///
/// NullOrder
///

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum NullOrder {
    First,
    Last,
}

///
/// OrderSpec
///
/// One sort key. Without an explicit null placement, ascending sorts put
/// nulls last and descending sorts put them first, mirroring the
/// behavior of treating null as the largest value.
///

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OrderSpec {
    pub expr: Expr,
    pub direction: OrderDirection,
    pub nulls: Option<NullOrder>,
}

impl OrderSpec {
    #[must_use]
    pub const fn asc(expr: Expr) -> Self {
        Self {
            expr,
            direction: OrderDirection::Asc,
            nulls: None,
        }
    }

    #[must_use]
    pub const fn desc(expr: Expr) -> Self {
        Self {
            expr,
            direction: OrderDirection::Desc,
            nulls: None,
        }
    }

    #[must_use]
    pub const fn nulls_first(mut self) -> Self {
        self.nulls = Some(NullOrder::First);
        self
    }

    #[must_use]
    pub const fn nulls_last(mut self) -> Self {
        self.nulls = Some(NullOrder::Last);
        self
    }
}

///
/// JoinLink
///
/// How a join pairs source rows with target rows: along a declared
/// association (foreign-key equality), or purely through the ON
/// predicate.
///

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum JoinLink {
    Association {
        source_alias: &'static str,
        source_field: &'static str,
        target_field: &'static str,
    },
    On,
}

///
/// JoinSpec
///

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct JoinSpec {
    pub target: EntityRef,
    pub kind: JoinKind,
    pub link: JoinLink,
    /// Extra condition ANDed onto the link; for `JoinLink::On` this is
    /// the entire join condition (absent means a cross pairing).
    pub on: Option<Predicate>,
    /// Fetch joins also expand the target's columns into an
    /// entity-projection select list.
    pub fetch: bool,
}

///
/// QueryBuilder
///
/// Mutable accumulator for one query. Consumes and returns `self` so
/// clauses chain; `build` freezes it into an immutable [`QueryPlan`].
/// Join construction is the one fallible step, since association paths
/// are checked against the models right away.
///

#[derive(Clone, Debug, Default)]
pub struct QueryBuilder {
    select: Vec<Expr>,
    entity_select: bool,
    from: Vec<EntityRef>,
    joins: Vec<JoinSpec>,
    filter: Option<Predicate>,
    group_by: Vec<Expr>,
    order_by: Vec<OrderSpec>,
    offset: Option<u64>,
    limit: Option<u64>,
}

impl QueryBuilder {
    /// Start from an explicit projection list.
    #[must_use]
    pub fn select(exprs: Vec<Expr>) -> Self {
        Self {
            select: exprs,
            ..Self::default()
        }
    }

    /// Start from an entity projection: every column of `root`, plus the
    /// columns of any fetch-joined entities, in declaration order.
    #[must_use]
    pub fn select_from(root: EntityRef) -> Self {
        Self {
            entity_select: true,
            from: vec![root],
            ..Self::default()
        }
    }

    /// Add a source entity. More than one source forms a cartesian
    /// product (theta join), constrained only by the filter.
    #[must_use]
    pub fn from(mut self, entity: EntityRef) -> Self {
        self.from.push(entity);
        self
    }

    ///
    /// JOINS
    ///

    /// Join `target` along a declared association with any in-scope
    /// entity. Fails with `UnsupportedJoin` when no association path
    /// exists in either direction; use [`join_on`](Self::join_on) then.
    pub fn join(self, target: EntityRef, kind: JoinKind) -> Result<Self, Error> {
        let Some(link) = self.association_link(&target) else {
            return Err(Error::UnsupportedJoin {
                source_entity: self.from.first().map_or("?", |e| e.alias),
                target: target.alias,
                kind,
            });
        };

        Ok(self.push_join(JoinSpec {
            target,
            kind,
            link,
            on: None,
            fetch: false,
        }))
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

    /// Join `target` on an explicit predicate, with no association
    /// requirement. The predicate is the entire join condition.
    #[must_use]
    pub fn join_on(self, target: EntityRef, kind: JoinKind, condition: Predicate) -> Self {
        self.push_join(JoinSpec {
            target,
            kind,
            link: JoinLink::On,
            on: Some(condition),
            fetch: false,
        })
    }

    /// AND an extra condition onto the most recent join. Before any
    /// join, the condition folds into the filter instead.
    #[must_use]
    pub fn on(mut self, condition: Predicate) -> Self {
        if let Some(join) = self.joins.last_mut() {
            join.on = Predicate::and_opt(join.on.take(), Some(condition));
        } else {
            self.filter = Predicate::and_opt(self.filter.take(), Some(condition));
        }
        self
    }

    /// Mark the most recent join as a fetch join.
    #[must_use]
    pub fn fetch_join(mut self) -> Self {
        if let Some(join) = self.joins.last_mut() {
            join.fetch = true;
        }
        self
    }

    // Resolve an association between `target` and any in-scope entity,
    // sources first, earlier joins next. A forward association (declared
    // on the in-scope entity) wins over a reverse one.
    fn association_link(&self, target: &EntityRef) -> Option<JoinLink> {
        let in_scope = self
            .from
            .iter()
            .chain(self.joins.iter().map(|j| &j.target));

        for source in in_scope {
            if let Some(assoc) = source.model.association_to(target.model.name) {
                return Some(JoinLink::Association {
                    source_alias: source.alias,
                    source_field: assoc.local_field,
                    target_field: assoc.foreign_field,
                });
            }
            if let Some(assoc) = target.model.association_to(source.model.name) {
                return Some(JoinLink::Association {
                    source_alias: source.alias,
                    source_field: assoc.foreign_field,
                    target_field: assoc.local_field,
                });
            }
        }

        None
    }

    fn push_join(mut self, join: JoinSpec) -> Self {
        self.joins.push(join);
        self
    }

    ///
    /// CLAUSES
    ///

    #[must_use]
    pub fn filter(mut self, condition: Predicate) -> Self {
        self.filter = Predicate::and_opt(self.filter.take(), Some(condition));
        self
    }

    /// Filter that skips `None`, for dynamic conditions built from
    /// optional parameters.
    #[must_use]
    pub fn filter_opt(mut self, condition: Option<Predicate>) -> Self {
        self.filter = Predicate::and_opt(self.filter.take(), condition);
        self
    }

    /// Variadic filter: conditions are ANDed, `None` entries skipped.
    #[must_use]
    pub fn where_(mut self, conditions: Vec<Option<Predicate>>) -> Self {
        for condition in conditions {
            self.filter = Predicate::and_opt(self.filter.take(), condition);
        }
        self
    }

    #[must_use]
    pub fn group_by(mut self, exprs: Vec<Expr>) -> Self {
        self.group_by.extend(exprs);
        self
    }

    #[must_use]
    pub fn order_by(mut self, specs: Vec<OrderSpec>) -> Self {
        self.order_by.extend(specs);
        self
    }

    #[must_use]
    pub const fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    ///
    /// BUILD
    ///

    /// Freeze into an immutable plan. Entity projections expand here, so
    /// the plan always carries a concrete select list.
    #[must_use]
    pub fn build(self) -> QueryPlan {
        let select = if self.entity_select {
            let mut cols: Vec<Expr> = self
                .from
                .first()
                .map(|root| root.columns().into_iter().map(Expr::Column).collect())
                .unwrap_or_default();
            for join in self.joins.iter().filter(|j| j.fetch) {
                cols.extend(join.target.columns().into_iter().map(Expr::Column));
            }
            cols
        } else {
            self.select
        };

        QueryPlan {
            select,
            from: self.from,
            joins: self.joins,
            filter: self.filter,
            group_by: self.group_by,
            order_by: self.order_by,
            offset: self.offset,
            limit: self.limit,
        }
    }
}

///
/// QueryPlan
///
/// Frozen, executable description of one query. Plans are plain data:
/// cloneable, comparable, serializable, and reusable across executions
/// and as subqueries.
///

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QueryPlan {
    pub select: Vec<Expr>,
    pub from: Vec<EntityRef>,
    pub joins: Vec<JoinSpec>,
    pub filter: Option<Predicate>,
    pub group_by: Vec<Expr>,
    pub order_by: Vec<OrderSpec>,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

impl QueryPlan {
    #[must_use]
    pub fn root(&self) -> Option<&EntityRef> {
        self.from.first()
    }

    /// Kind of the first select expression, for typing scalar subqueries.
    #[must_use]
    pub fn scalar_kind(&self) -> ValueKind {
        self.select.first().map_or(ValueKind::Null, Expr::kind)
    }

    /// Whether any select expression aggregates.
    #[must_use]
    pub(crate) fn has_aggregates(&self) -> bool {
        self.select.iter().any(Expr::contains_aggregate)
    }

    /// The same query reshaped to `select count(*)`, with ordering and
    /// paging dropped since they cannot change the total.
    #[must_use]
    pub(crate) fn for_count(&self) -> Self {
        Self {
            select: vec![Expr::count_all()],
            order_by: Vec::new(),
            offset: None,
            limit: None,
            ..self.clone()
        }
    }
}
