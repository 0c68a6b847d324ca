#[cfg(test)]
mod tests;

use crate::{
    error::Error,
    predicate::{CompareOp, Predicate},
    query::{OrderSpec, QueryPlan},
    value::{Value, ValueKind},
};
use derive_more::Display;
use serde::Serialize;

///
/// Column
///
/// Typed reference to one entity field under one query alias. Columns
/// are the leaves of every expression tree; all operator constructors
/// validate operand kinds here, at construction time.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct Column {
    /// Alias of the entity reference this column belongs to.
    pub entity: &'static str,
    pub field: &'static str,
    pub kind: ValueKind,
}

impl Column {
    #[must_use]
    pub const fn new(entity: &'static str, field: &'static str, kind: ValueKind) -> Self {
        Self {
            entity,
            field,
            kind,
        }
    }

    #[must_use]
    pub const fn expr(self) -> Expr {
        Expr::Column(self)
    }

    fn context(self, op: &str) -> String {
        format!("{}.{} {op}", self.entity, self.field)
    }

    // ------------------------------------------------------------------
    // Comparison operators (value RHS)
    // ------------------------------------------------------------------

    fn compare_value(self, op: CompareOp, value: Value) -> Result<Predicate, Error> {
        ensure_comparable(self.kind, value.kind(), self.context(op.symbol()))?;

        Ok(Predicate::Compare {
            op,
            lhs: self.expr(),
            rhs: Expr::Literal(value),
        })
    }

    pub fn eq(self, value: impl Into<Value>) -> Result<Predicate, Error> {
        self.compare_value(CompareOp::Eq, value.into())
    }

    pub fn ne(self, value: impl Into<Value>) -> Result<Predicate, Error> {
        self.compare_value(CompareOp::Ne, value.into())
    }

    pub fn gt(self, value: impl Into<Value>) -> Result<Predicate, Error> {
        self.compare_value(CompareOp::Gt, value.into())
    }

    /// Greater-or-equal.
    pub fn goe(self, value: impl Into<Value>) -> Result<Predicate, Error> {
        self.compare_value(CompareOp::Goe, value.into())
    }

    pub fn lt(self, value: impl Into<Value>) -> Result<Predicate, Error> {
        self.compare_value(CompareOp::Lt, value.into())
    }

    /// Less-or-equal.
    pub fn loe(self, value: impl Into<Value>) -> Result<Predicate, Error> {
        self.compare_value(CompareOp::Loe, value.into())
    }

    // ------------------------------------------------------------------
    // Comparison operators (expression RHS: columns, subqueries)
    // ------------------------------------------------------------------

    fn compare_expr(self, op: CompareOp, rhs: Expr) -> Result<Predicate, Error> {
        ensure_comparable(self.kind, rhs.kind(), self.context(op.symbol()))?;

        Ok(Predicate::Compare {
            op,
            lhs: self.expr(),
            rhs,
        })
    }

    pub fn eq_expr(self, rhs: impl Into<Expr>) -> Result<Predicate, Error> {
        self.compare_expr(CompareOp::Eq, rhs.into())
    }

    pub fn ne_expr(self, rhs: impl Into<Expr>) -> Result<Predicate, Error> {
        self.compare_expr(CompareOp::Ne, rhs.into())
    }

    pub fn gt_expr(self, rhs: impl Into<Expr>) -> Result<Predicate, Error> {
        self.compare_expr(CompareOp::Gt, rhs.into())
    }

    pub fn goe_expr(self, rhs: impl Into<Expr>) -> Result<Predicate, Error> {
        self.compare_expr(CompareOp::Goe, rhs.into())
    }

    pub fn lt_expr(self, rhs: impl Into<Expr>) -> Result<Predicate, Error> {
        self.compare_expr(CompareOp::Lt, rhs.into())
    }

    pub fn loe_expr(self, rhs: impl Into<Expr>) -> Result<Predicate, Error> {
        self.compare_expr(CompareOp::Loe, rhs.into())
    }

    // ------------------------------------------------------------------
    // Range / membership / text predicates
    // ------------------------------------------------------------------

    pub fn between(self, low: impl Into<Value>, high: impl Into<Value>) -> Result<Predicate, Error> {
        let (low, high) = (low.into(), high.into());
        ensure_comparable(self.kind, low.kind(), self.context("between low"))?;
        ensure_comparable(self.kind, high.kind(), self.context("between high"))?;

        Ok(Predicate::Between {
            expr: self.expr(),
            low: Expr::Literal(low),
            high: Expr::Literal(high),
        })
    }

    pub fn in_list(self, values: Vec<Value>) -> Result<Predicate, Error> {
        for value in &values {
            ensure_comparable(self.kind, value.kind(), self.context("in"))?;
        }

        Ok(Predicate::In {
            expr: self.expr(),
            list: values.into_iter().map(Expr::Literal).collect(),
        })
    }

    /// Membership against the value set produced by a subquery.
    pub fn in_subquery(self, query: QueryPlan) -> Result<Predicate, Error> {
        ensure_comparable(self.kind, query.scalar_kind(), self.context("in"))?;

        Ok(Predicate::InSubquery {
            expr: self.expr(),
            query: Box::new(query),
        })
    }

    /// SQL LIKE over text columns; `%` is the only wildcard.
    pub fn like(self, pattern: impl Into<String>) -> Result<Predicate, Error> {
        self.require_text("like")?;

        Ok(Predicate::Like {
            expr: self.expr(),
            pattern: pattern.into(),
        })
    }

    /// Substring containment, expressed as `%needle%`.
    pub fn contains(self, needle: impl Into<String>) -> Result<Predicate, Error> {
        self.require_text("contains")?;

        Ok(Predicate::Like {
            expr: self.expr(),
            pattern: format!("%{}%", needle.into()),
        })
    }

    #[must_use]
    pub const fn is_null(self) -> Predicate {
        Predicate::IsNull(self.expr())
    }

    #[must_use]
    pub const fn is_not_null(self) -> Predicate {
        Predicate::IsNotNull(self.expr())
    }

    // ------------------------------------------------------------------
    // Aggregates
    // ------------------------------------------------------------------

    pub fn sum(self) -> Result<Expr, Error> {
        self.require_numeric("sum")?;
        Ok(Expr::aggregate(AggFunc::Sum, self.expr()))
    }

    pub fn avg(self) -> Result<Expr, Error> {
        self.require_numeric("avg")?;
        Ok(Expr::aggregate(AggFunc::Avg, self.expr()))
    }

    pub fn max(self) -> Result<Expr, Error> {
        self.require_orderable("max")?;
        Ok(Expr::aggregate(AggFunc::Max, self.expr()))
    }

    pub fn min(self) -> Result<Expr, Error> {
        self.require_orderable("min")?;
        Ok(Expr::aggregate(AggFunc::Min, self.expr()))
    }

    /// Count of rows with a non-null value for this column.
    #[must_use]
    pub fn count(self) -> Expr {
        Expr::aggregate(AggFunc::Count, self.expr())
    }

    // ------------------------------------------------------------------
    // Derived value expressions
    // ------------------------------------------------------------------

    fn arith(self, op: ArithOp, rhs: Expr) -> Result<Expr, Error> {
        self.require_numeric(op.symbol())?;
        if !rhs.kind().is_numeric() {
            return Err(Error::type_mismatch(
                ValueKind::Int,
                rhs.kind(),
                self.context(op.symbol()),
            ));
        }

        Ok(Expr::Binary {
            op,
            lhs: Box::new(self.expr()),
            rhs: Box::new(rhs),
        })
    }

    pub fn add(self, rhs: impl Into<Value>) -> Result<Expr, Error> {
        self.arith(ArithOp::Add, Expr::Literal(rhs.into()))
    }

    pub fn sub(self, rhs: impl Into<Value>) -> Result<Expr, Error> {
        self.arith(ArithOp::Sub, Expr::Literal(rhs.into()))
    }

    pub fn multiply(self, rhs: impl Into<Value>) -> Result<Expr, Error> {
        self.arith(ArithOp::Mul, Expr::Literal(rhs.into()))
    }

    pub fn concat(self, rhs: impl Into<Expr>) -> Result<Expr, Error> {
        self.expr().concat(rhs)
    }

    /// Cast to text, whatever the column kind.
    #[must_use]
    pub fn string_value(self) -> Expr {
        self.expr().string_value()
    }

    /// Lowercase a text column.
    pub fn lower(self) -> Result<Expr, Error> {
        self.require_text("lower")?;
        Ok(Expr::Lower(Box::new(self.expr())))
    }

    #[must_use]
    pub fn alias(self, name: impl Into<String>) -> Expr {
        self.expr().alias(name)
    }

    // ------------------------------------------------------------------
    // Ordering sugar
    // ------------------------------------------------------------------

    #[must_use]
    pub fn asc(self) -> OrderSpec {
        OrderSpec::asc(self.expr())
    }

    #[must_use]
    pub fn desc(self) -> OrderSpec {
        OrderSpec::desc(self.expr())
    }

    // ------------------------------------------------------------------
    // Kind guards
    // ------------------------------------------------------------------

    fn require_text(self, op: &str) -> Result<(), Error> {
        if self.kind == ValueKind::Text {
            Ok(())
        } else {
            Err(Error::type_mismatch(
                ValueKind::Text,
                self.kind,
                self.context(op),
            ))
        }
    }

    fn require_numeric(self, op: &str) -> Result<(), Error> {
        if self.kind.is_numeric() {
            Ok(())
        } else {
            Err(Error::type_mismatch(
                ValueKind::Int,
                self.kind,
                self.context(op),
            ))
        }
    }

    fn require_orderable(self, op: &str) -> Result<(), Error> {
        if matches!(self.kind, ValueKind::List | ValueKind::Null) {
            Err(Error::type_mismatch(
                ValueKind::Int,
                self.kind,
                self.context(op),
            ))
        } else {
            Ok(())
        }
    }
}

///
/// ArithOp
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Serialize)]
pub enum ArithOp {
    #[display("+")]
    Add,
    #[display("-")]
    Sub,
    #[display("*")]
    Mul,
}

impl ArithOp {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
        }
    }
}

///
/// AggFunc
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Serialize)]
pub enum AggFunc {
    #[display("count")]
    Count,
    #[display("sum")]
    Sum,
    #[display("avg")]
    Avg,
    #[display("max")]
    Max,
    #[display("min")]
    Min,
}

///
/// Expr
///
/// Typed expression node. Expressions are immutable values composed into
/// trees; identical inputs always produce structurally equal trees, so
/// callers may deduplicate or compare them freely.
///

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Expr {
    Column(Column),
    Literal(Value),
    Binary {
        op: ArithOp,
        lhs: Box<Self>,
        rhs: Box<Self>,
    },
    Concat(Vec<Self>),
    /// Ordered branches; the first matching condition wins, later
    /// branches never override earlier matches. The default is mandatory
    /// (enforced by `CaseBuilder`).
    Case {
        branches: Vec<(Predicate, Self)>,
        default: Box<Self>,
    },
    Cast {
        expr: Box<Self>,
        to: ValueKind,
    },
    Lower(Box<Self>),
    Aggregate {
        func: AggFunc,
        /// `None` is `count(*)`.
        arg: Option<Box<Self>>,
    },
    /// Scalar subquery; also usable as the value set of an IN predicate
    /// through `Predicate::InSubquery`. Subqueries are not permitted in
    /// the FROM position, which the builder API does not offer.
    Subquery(Box<QueryPlan>),
    Alias {
        expr: Box<Self>,
        name: String,
    },
}

impl Expr {
    ///
    /// CONSTRUCTION
    ///

    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    /// `count(*)`.
    #[must_use]
    pub const fn count_all() -> Self {
        Self::Aggregate {
            func: AggFunc::Count,
            arg: None,
        }
    }

    #[must_use]
    pub fn subquery(plan: QueryPlan) -> Self {
        Self::Subquery(Box::new(plan))
    }

    #[must_use]
    pub const fn case() -> CaseBuilder {
        CaseBuilder::new()
    }

    fn aggregate(func: AggFunc, arg: Self) -> Self {
        Self::Aggregate {
            func,
            arg: Some(Box::new(arg)),
        }
    }

    ///
    /// TYPES
    ///

    /// Result kind of this expression. Total because every constructor
    /// validated its operands.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Column(col) => col.kind,
            Self::Literal(value) => value.kind(),
            Self::Binary { lhs, rhs, .. } => {
                if lhs.kind() == ValueKind::Float || rhs.kind() == ValueKind::Float {
                    ValueKind::Float
                } else {
                    ValueKind::Int
                }
            }
            Self::Concat(_) | Self::Lower(_) => ValueKind::Text,
            Self::Case { default, .. } => default.kind(),
            Self::Cast { to, .. } => *to,
            Self::Aggregate { func, arg } => match func {
                AggFunc::Count => ValueKind::Int,
                AggFunc::Avg => ValueKind::Float,
                AggFunc::Sum | AggFunc::Max | AggFunc::Min => {
                    arg.as_ref().map_or(ValueKind::Int, |a| a.kind())
                }
            },
            Self::Subquery(plan) => plan.scalar_kind(),
            Self::Alias { expr, .. } => expr.kind(),
        }
    }

    ///
    /// COMPOSITION
    ///

    #[must_use]
    pub fn alias(self, name: impl Into<String>) -> Self {
        Self::Alias {
            expr: Box::new(self),
            name: name.into(),
        }
    }

    /// Cast to text; the escape hatch for concatenating non-text
    /// expressions.
    #[must_use]
    pub fn string_value(self) -> Self {
        Self::Cast {
            expr: Box::new(self),
            to: ValueKind::Text,
        }
    }

    /// Text concatenation. Both sides must already be text; cast with
    /// [`string_value`](Self::string_value) first otherwise.
    pub fn concat(self, rhs: impl Into<Self>) -> Result<Self, Error> {
        let rhs = rhs.into();
        for side in [&self, &rhs] {
            if side.kind() != ValueKind::Text {
                return Err(Error::type_mismatch(
                    ValueKind::Text,
                    side.kind(),
                    "concat",
                ));
            }
        }

        // Flatten chained concats into one node.
        let mut parts = match self {
            Self::Concat(parts) => parts,
            other => vec![other],
        };
        parts.push(rhs);
        Ok(Self::Concat(parts))
    }

    pub fn multiply(self, rhs: impl Into<Self>) -> Result<Self, Error> {
        self.binary(ArithOp::Mul, rhs.into())
    }

    pub fn add(self, rhs: impl Into<Self>) -> Result<Self, Error> {
        self.binary(ArithOp::Add, rhs.into())
    }

    pub fn sub(self, rhs: impl Into<Self>) -> Result<Self, Error> {
        self.binary(ArithOp::Sub, rhs.into())
    }

    fn binary(self, op: ArithOp, rhs: Self) -> Result<Self, Error> {
        for side in [&self, &rhs] {
            if !side.kind().is_numeric() {
                return Err(Error::type_mismatch(
                    ValueKind::Int,
                    side.kind(),
                    op.symbol(),
                ));
            }
        }

        Ok(Self::Binary {
            op,
            lhs: Box::new(self),
            rhs: Box::new(rhs),
        })
    }

    #[must_use]
    pub fn asc(self) -> OrderSpec {
        OrderSpec::asc(self)
    }

    #[must_use]
    pub fn desc(self) -> OrderSpec {
        OrderSpec::desc(self)
    }

    ///
    /// INSPECTION
    ///

    /// Whether this tree contains an aggregate above subquery boundaries
    /// (a subquery's aggregates are its own concern).
    #[must_use]
    pub(crate) fn contains_aggregate(&self) -> bool {
        match self {
            Self::Aggregate { .. } => true,
            Self::Column(_) | Self::Literal(_) | Self::Subquery(_) => false,
            Self::Binary { lhs, rhs, .. } => {
                lhs.contains_aggregate() || rhs.contains_aggregate()
            }
            Self::Concat(parts) => parts.iter().any(Self::contains_aggregate),
            Self::Case { branches, default } => {
                default.contains_aggregate()
                    || branches.iter().any(|(_, result)| result.contains_aggregate())
            }
            Self::Cast { expr, .. } | Self::Lower(expr) | Self::Alias { expr, .. } => {
                expr.contains_aggregate()
            }
        }
    }

    /// Name this expression binds to during field/setter projection:
    /// an explicit alias, or a bare column's field name.
    #[must_use]
    pub(crate) fn binding_name(&self) -> Option<&str> {
        match self {
            Self::Alias { name, .. } => Some(name),
            Self::Column(col) => Some(col.field),
            _ => None,
        }
    }
}

impl From<Column> for Expr {
    fn from(col: Column) -> Self {
        Self::Column(col)
    }
}

impl From<Value> for Expr {
    fn from(value: Value) -> Self {
        Self::Literal(value)
    }
}

///
/// CaseBuilder
///
/// Ordered case-when accumulator. `otherwise` is the only terminal, so a
/// case expression cannot be built without its mandatory default; branch
/// result kinds are checked against the default there.
///

#[derive(Debug, Default)]
pub struct CaseBuilder {
    branches: Vec<(Predicate, Expr)>,
}

impl CaseBuilder {
    #[must_use]
    pub(crate) const fn new() -> Self {
        Self {
            branches: Vec::new(),
        }
    }

    #[must_use]
    pub fn when(mut self, condition: Predicate, result: impl Into<Expr>) -> Self {
        self.branches.push((condition, result.into()));
        self
    }

    pub fn otherwise(self, default: impl Into<Expr>) -> Result<Expr, Error> {
        let default = default.into();
        for (_, result) in &self.branches {
            if !result.kind().comparable_with(default.kind()) {
                return Err(Error::type_mismatch(
                    default.kind(),
                    result.kind(),
                    "case-when branch result",
                ));
            }
        }

        Ok(Expr::Case {
            branches: self.branches,
            default: Box::new(default),
        })
    }
}

fn ensure_comparable(
    expected: ValueKind,
    found: ValueKind,
    context: String,
) -> Result<(), Error> {
    if expected.comparable_with(found) {
        Ok(())
    } else {
        Err(Error::TypeMismatch {
            expected,
            found,
            context,
        })
    }
}
