
use crate::{expr::Expr, query::QueryPlan};
use derive_more::Display;
use serde::Serialize;
use std::ops::{BitAnd, BitOr};

///
/// CompareOp
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Serialize)]
pub enum CompareOp {
    #[display("=")]
    Eq,
    #[display("!=")]
    Ne,
    #[display("<")]
    Lt,
    #[display("<=")]
    Loe,
    #[display(">")]
    Gt,
    #[display(">=")]
    Goe,
}

impl CompareOp {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Loe => "<=",
            Self::Gt => ">",
            Self::Goe => ">=",
        }
    }
}

///
/// Predicate
///
/// Boolean expression tree. Predicates are plain immutable values:
/// combining two predicates builds a new node and never mutates either
/// operand, so subtrees can be shared, stored, and reused across
/// queries.
///
/// Null semantics follow SQL three-valued logic collapsed to two values:
/// any comparison touching a null evaluates to false, and only
/// `IsNull` / `IsNotNull` observe nullness directly.
///

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Predicate {
    Compare {
        op: CompareOp,
        lhs: Expr,
        rhs: Expr,
    },
    /// Inclusive on both bounds.
    Between {
        expr: Expr,
        low: Expr,
        high: Expr,
    },
    In {
        expr: Expr,
        list: Vec<Expr>,
    },
    InSubquery {
        expr: Expr,
        query: Box<QueryPlan>,
    },
    IsNull(Expr),
    IsNotNull(Expr),
    Like {
        expr: Expr,
        pattern: String,
    },
    And(Vec<Self>),
    Or(Vec<Self>),
    Not(Box<Self>),
}

impl Predicate {
    /// Conjunction. Flattens nested ANDs so `a & b & c` is one node.
    #[must_use]
    pub fn and(self, rhs: Self) -> Self {
        match (self, rhs) {
            (Self::And(mut lhs), Self::And(rhs)) => {
                lhs.extend(rhs);
                Self::And(lhs)
            }
            (Self::And(mut lhs), rhs) => {
                lhs.push(rhs);
                Self::And(lhs)
            }
            (lhs, Self::And(mut rhs)) => {
                rhs.insert(0, lhs);
                Self::And(rhs)
            }
            (lhs, rhs) => Self::And(vec![lhs, rhs]),
        }
    }

    /// Disjunction. Flattens like [`and`](Self::and).
    #[must_use]
    pub fn or(self, rhs: Self) -> Self {
        match (self, rhs) {
            (Self::Or(mut lhs), Self::Or(rhs)) => {
                lhs.extend(rhs);
                Self::Or(lhs)
            }
            (Self::Or(mut lhs), rhs) => {
                lhs.push(rhs);
                Self::Or(lhs)
            }
            (lhs, Self::Or(mut rhs)) => {
                rhs.insert(0, lhs);
                Self::Or(rhs)
            }
            (lhs, rhs) => Self::Or(vec![lhs, rhs]),
        }
    }

    #[must_use]
    pub fn negate(self) -> Self {
        match self {
            Self::Not(inner) => *inner,
            other => Self::Not(Box::new(other)),
        }
    }

    /// AND of two optional predicates; `None` operands vanish. The
    /// backbone of null-skipping dynamic filters.
    #[must_use]
    pub fn and_opt(lhs: Option<Self>, rhs: Option<Self>) -> Option<Self> {
        match (lhs, rhs) {
            (Some(lhs), Some(rhs)) => Some(lhs.and(rhs)),
            (one, None) | (None, one) => one,
        }
    }

    /// OR counterpart of [`and_opt`](Self::and_opt).
    #[must_use]
    pub fn or_opt(lhs: Option<Self>, rhs: Option<Self>) -> Option<Self> {
        match (lhs, rhs) {
            (Some(lhs), Some(rhs)) => Some(lhs.or(rhs)),
            (one, None) | (None, one) => one,
        }
    }
}

impl BitAnd for Predicate {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        self.and(rhs)
    }
}

impl BitOr for Predicate {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.or(rhs)
    }
}

///
/// BooleanBuilder
///
/// Incremental predicate accumulator for conditions that arrive one at a
/// time, typically from optional request parameters. Starts empty;
/// `None` conditions are skipped, so absent parameters simply do not
/// constrain the query. An empty builder yields `None`, which filters
/// treat as "match everything".
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BooleanBuilder {
    acc: Option<Predicate>,
}

impl BooleanBuilder {
    #[must_use]
    pub const fn new() -> Self {
        Self { acc: None }
    }

    /// Start from an optional seed condition; `None` seeds an empty
    /// builder.
    #[must_use]
    pub fn from_seed(seed: impl Into<Option<Predicate>>) -> Self {
        Self { acc: seed.into() }
    }

    #[must_use]
    pub fn and(mut self, condition: impl Into<Option<Predicate>>) -> Self {
        self.acc = Predicate::and_opt(self.acc, condition.into());
        self
    }

    #[must_use]
    pub fn or(mut self, condition: impl Into<Option<Predicate>>) -> Self {
        self.acc = Predicate::or_opt(self.acc, condition.into());
        self
    }

    #[must_use]
    pub fn has_value(&self) -> bool {
        self.acc.is_some()
    }

    #[must_use]
    pub fn build(self) -> Option<Predicate> {
        self.acc
    }
}
