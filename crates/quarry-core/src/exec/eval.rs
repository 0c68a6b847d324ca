//! Expression and predicate evaluation against joined rows.
//!
//! Evaluation sees the world through a [`Scope`]: the bindings of the
//! current joined row, chained to the scope of an enclosing query when
//! inside a subquery. Lookup walks local bindings first, so an inner
//! alias shadows an outer one of the same name.

use crate::{
    error::Error,
    exec::pipeline,
    expr::{AggFunc, ArithOp, Expr},
    predicate::{CompareOp, Predicate},
    store::{StorageSession, StoredRow},
    value::{Value, like_match, loose_cmp, loose_eq},
};
use std::cmp::Ordering;

///
/// Binding
///
/// One aliased entity within a joined row. `row` is `None` for the
/// unmatched side of an outer join; every column under that alias then
/// reads as null.
///

#[derive(Clone, Debug)]
pub(crate) struct Binding {
    pub alias: &'static str,
    pub row: Option<StoredRow>,
}

pub(crate) type JoinedRow = Vec<Binding>;

///
/// Scope
///

#[derive(Clone, Copy, Debug)]
pub(crate) struct Scope<'a> {
    pub frames: &'a JoinedRow,
    pub outer: Option<&'a Scope<'a>>,
}

impl Scope<'_> {
    fn lookup(&self, alias: &str) -> Option<&Binding> {
        self.frames
            .iter()
            .find(|b| b.alias == alias)
            .or_else(|| self.outer.and_then(|outer| outer.lookup(alias)))
    }
}

/// Rows an aggregate ranges over. `None` outside grouped evaluation, in
/// which case aggregates yield null.
pub(crate) type Group<'a> = Option<&'a [JoinedRow]>;

pub(crate) fn eval_expr(
    expr: &Expr,
    scope: &Scope<'_>,
    group: Group<'_>,
    session: &dyn StorageSession,
) -> Result<Value, Error> {
    match expr {
        Expr::Column(col) => {
            let Some(binding) = scope.lookup(col.entity) else {
                return Err(Error::UnknownField {
                    entity: col.entity,
                    field: col.field.to_string(),
                });
            };
            Ok(binding
                .row
                .as_ref()
                .map_or(Value::Null, |row| row.field(col.field)))
        }

        Expr::Literal(value) => Ok(value.clone()),

        Expr::Binary { op, lhs, rhs } => {
            let lhs = eval_expr(lhs, scope, group, session)?;
            let rhs = eval_expr(rhs, scope, group, session)?;
            Ok(eval_arith(*op, &lhs, &rhs))
        }

        Expr::Concat(parts) => {
            let mut out = String::new();
            for part in parts {
                let value = eval_expr(part, scope, group, session)?;
                if value.is_null() {
                    return Ok(Value::Null);
                }
                out.push_str(&value.render_text());
            }
            Ok(Value::Text(out))
        }

        Expr::Case { branches, default } => {
            for (condition, result) in branches {
                if eval_pred(condition, scope, group, session)? {
                    return eval_expr(result, scope, group, session);
                }
            }
            eval_expr(default, scope, group, session)
        }

        Expr::Cast { expr, to } => {
            let value = eval_expr(expr, scope, group, session)?;
            if value.is_null() {
                return Ok(Value::Null);
            }
            Ok(match to {
                crate::value::ValueKind::Text => Value::Text(value.render_text()),
                _ => value,
            })
        }

        Expr::Lower(inner) => {
            let value = eval_expr(inner, scope, group, session)?;
            Ok(match value {
                Value::Text(s) => Value::Text(s.to_lowercase()),
                _ => Value::Null,
            })
        }

        Expr::Aggregate { func, arg } => {
            eval_aggregate(*func, arg.as_deref(), scope, group, session)
        }

        Expr::Subquery(plan) => {
            let rows = pipeline::run(session, plan, Some(scope))?;
            match rows.len() {
                0 => Ok(Value::Null),
                1 => Ok(rows[0].at(0).cloned().unwrap_or(Value::Null)),
                count => Err(Error::NonUniqueResult { count }),
            }
        }

        Expr::Alias { expr, .. } => eval_expr(expr, scope, group, session),
    }
}

fn eval_arith(op: ArithOp, lhs: &Value, rhs: &Value) -> Value {
    if lhs.is_null() || rhs.is_null() {
        return Value::Null;
    }

    // Integer overflow reads as null, like any other unrepresentable
    // result.
    if let (Value::Int(a), Value::Int(b)) = (lhs, rhs) {
        let result = match op {
            ArithOp::Add => a.checked_add(*b),
            ArithOp::Sub => a.checked_sub(*b),
            ArithOp::Mul => a.checked_mul(*b),
        };
        return result.map_or(Value::Null, Value::Int);
    }

    match (lhs.to_f64(), rhs.to_f64()) {
        (Some(a), Some(b)) => Value::Float(match op {
            ArithOp::Add => a + b,
            ArithOp::Sub => a - b,
            ArithOp::Mul => a * b,
        }),
        _ => Value::Null,
    }
}

#[expect(clippy::cast_precision_loss)]
fn eval_aggregate(
    func: AggFunc,
    arg: Option<&Expr>,
    scope: &Scope<'_>,
    group: Group<'_>,
    session: &dyn StorageSession,
) -> Result<Value, Error> {
    let Some(rows) = group else {
        return Ok(Value::Null);
    };

    // Argument values over the group, nulls dropped (count(*) keeps
    // every row).
    let mut values = Vec::new();
    if let Some(arg) = arg {
        for row in rows {
            let row_scope = Scope {
                frames: row,
                outer: scope.outer,
            };
            let value = eval_expr(arg, &row_scope, None, session)?;
            if !value.is_null() {
                values.push(value);
            }
        }
    }

    #[expect(clippy::cast_possible_wrap)]
    let result = match func {
        AggFunc::Count => {
            let count = if arg.is_some() { values.len() } else { rows.len() };
            Value::Int(count as i64)
        }
        AggFunc::Sum => sum_values(&values),
        AggFunc::Avg => {
            if values.is_empty() {
                Value::Null
            } else {
                let total = match sum_values(&values) {
                    Value::Int(n) => n as f64,
                    Value::Float(f) => f,
                    _ => return Ok(Value::Null),
                };
                Value::Float(total / values.len() as f64)
            }
        }
        AggFunc::Max => fold_extreme(values, Ordering::Greater),
        AggFunc::Min => fold_extreme(values, Ordering::Less),
    };

    Ok(result)
}

// Integer sums stay integers; one float operand widens the rest.
fn sum_values(values: &[Value]) -> Value {
    if values.is_empty() {
        return Value::Null;
    }

    if values.iter().all(|v| matches!(v, Value::Int(_))) {
        return Value::Int(values.iter().filter_map(Value::as_i64).sum());
    }

    let total: f64 = values.iter().filter_map(Value::to_f64).sum();
    Value::Float(total)
}

fn fold_extreme(values: Vec<Value>, keep: Ordering) -> Value {
    let mut best: Option<Value> = None;
    for value in values {
        best = Some(match best {
            None => value,
            Some(current) => {
                if loose_cmp(&value, &current) == Some(keep) {
                    value
                } else {
                    current
                }
            }
        });
    }
    best.unwrap_or(Value::Null)
}

pub(crate) fn eval_pred(
    pred: &Predicate,
    scope: &Scope<'_>,
    group: Group<'_>,
    session: &dyn StorageSession,
) -> Result<bool, Error> {
    match pred {
        Predicate::Compare { op, lhs, rhs } => {
            let lhs = eval_expr(lhs, scope, group, session)?;
            let rhs = eval_expr(rhs, scope, group, session)?;
            Ok(eval_compare(*op, &lhs, &rhs))
        }

        Predicate::Between { expr, low, high } => {
            let value = eval_expr(expr, scope, group, session)?;
            let low = eval_expr(low, scope, group, session)?;
            let high = eval_expr(high, scope, group, session)?;
            Ok(eval_compare(CompareOp::Goe, &value, &low)
                && eval_compare(CompareOp::Loe, &value, &high))
        }

        Predicate::In { expr, list } => {
            let value = eval_expr(expr, scope, group, session)?;
            if value.is_null() {
                return Ok(false);
            }
            for candidate in list {
                let candidate = eval_expr(candidate, scope, group, session)?;
                if loose_eq(&value, &candidate) {
                    return Ok(true);
                }
            }
            Ok(false)
        }

        Predicate::InSubquery { expr, query } => {
            let value = eval_expr(expr, scope, group, session)?;
            if value.is_null() {
                return Ok(false);
            }
            let rows = pipeline::run(session, query, Some(scope))?;
            Ok(rows.iter().any(|row| {
                row.at(0).is_some_and(|candidate| loose_eq(&value, candidate))
            }))
        }

        Predicate::IsNull(expr) => {
            Ok(eval_expr(expr, scope, group, session)?.is_null())
        }

        Predicate::IsNotNull(expr) => {
            Ok(!eval_expr(expr, scope, group, session)?.is_null())
        }

        Predicate::Like { expr, pattern } => {
            match eval_expr(expr, scope, group, session)? {
                Value::Text(text) => Ok(like_match(&text, pattern)),
                _ => Ok(false),
            }
        }

        Predicate::And(parts) => {
            for part in parts {
                if !eval_pred(part, scope, group, session)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }

        Predicate::Or(parts) => {
            for part in parts {
                if eval_pred(part, scope, group, session)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }

        Predicate::Not(inner) => Ok(!eval_pred(inner, scope, group, session)?),
    }
}

// Null operands make every comparison false, including `!=`.
fn eval_compare(op: CompareOp, lhs: &Value, rhs: &Value) -> bool {
    if lhs.is_null() || rhs.is_null() {
        return false;
    }

    match op {
        CompareOp::Eq => loose_eq(lhs, rhs),
        CompareOp::Ne => !loose_eq(lhs, rhs),
        CompareOp::Lt => loose_cmp(lhs, rhs) == Some(Ordering::Less),
        CompareOp::Gt => loose_cmp(lhs, rhs) == Some(Ordering::Greater),
        CompareOp::Loe => {
            matches!(loose_cmp(lhs, rhs), Some(Ordering::Less | Ordering::Equal))
        }
        CompareOp::Goe => {
            matches!(
                loose_cmp(lhs, rhs),
                Some(Ordering::Greater | Ordering::Equal)
            )
        }
    }
}
