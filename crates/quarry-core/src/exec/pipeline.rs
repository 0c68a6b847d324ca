//! Plan execution: scan, join, filter, group, sort, page, project.
//!
//! Execution is a straight pipeline over in-memory joined rows. Every
//! stage is written for correctness over cleverness; the storage
//! session is the only source of rows, reached exclusively through
//! `scan`.

use crate::{
    error::Error,
    exec::eval::{self, Binding, JoinedRow, Scope},
    expr::Expr,
    query::{JoinKind, JoinLink, JoinSpec, NullOrder, OrderDirection, OrderSpec, QueryPlan},
    row::Row,
    store::StorageSession,
    value::{Value, loose_cmp, loose_eq},
};
use std::{cmp::Ordering, sync::Arc};

/// Execute `plan` and produce its result rows. `outer` carries the
/// enclosing row scope when the plan runs as a subquery, making outer
/// aliases visible to correlated predicates.
pub(crate) fn run(
    session: &dyn StorageSession,
    plan: &QueryPlan,
    outer: Option<&Scope<'_>>,
) -> Result<Vec<Row>, Error> {
    // Cartesian product of the source entities.
    let mut rows: Vec<JoinedRow> = vec![JoinedRow::new()];
    for entity in &plan.from {
        let stored = session.scan(entity.model)?;
        let mut next = Vec::with_capacity(rows.len() * stored.len().max(1));
        for combo in &rows {
            for row in &stored {
                let mut joined = combo.clone();
                joined.push(Binding {
                    alias: entity.alias,
                    row: Some(row.clone()),
                });
                next.push(joined);
            }
        }
        rows = next;
    }

    // Aliases bound so far, for synthesizing the null side of right
    // joins.
    let mut aliases: Vec<&'static str> = plan.from.iter().map(|e| e.alias).collect();

    for join in &plan.joins {
        rows = apply_join(session, rows, &aliases, join, outer)?;
        aliases.push(join.target.alias);
    }

    if let Some(filter) = &plan.filter {
        let mut kept = Vec::with_capacity(rows.len());
        for row in rows {
            let scope = Scope {
                frames: &row,
                outer,
            };
            if eval::eval_pred(filter, &scope, None, session)? {
                kept.push(row);
            }
        }
        rows = kept;
    }

    // Each output unit is one row, or one group when grouping or
    // aggregating. Select values and sort keys are computed together so
    // aggregates range over the right rows in both.
    let mut units: Vec<(Vec<Value>, Vec<Value>)> = Vec::new();

    if plan.group_by.is_empty() && !plan.has_aggregates() {
        for row in &rows {
            let scope = Scope {
                frames: row,
                outer,
            };
            units.push((
                eval_list(&plan.select, &scope, None, session)?,
                eval_order_keys(&plan.order_by, &scope, None, session)?,
            ));
        }
    } else {
        let empty = JoinedRow::new();
        for group in group_rows(&plan.group_by, rows, outer, session)? {
            let scope = Scope {
                frames: group.first().unwrap_or(&empty),
                outer,
            };
            units.push((
                eval_list(&plan.select, &scope, Some(&group), session)?,
                eval_order_keys(&plan.order_by, &scope, Some(&group), session)?,
            ));
        }
    }

    if !plan.order_by.is_empty() {
        sort_units(&mut units, &plan.order_by);
    }

    let offset = plan.offset.map_or(0, |n| usize::try_from(n).unwrap_or(usize::MAX));
    let limit = plan
        .limit
        .map_or(usize::MAX, |n| usize::try_from(n).unwrap_or(usize::MAX));

    let exprs = Arc::new(plan.select.clone());
    Ok(units
        .into_iter()
        .skip(offset)
        .take(limit)
        .map(|(values, _)| Row::new(Arc::clone(&exprs), values))
        .collect())
}

fn apply_join(
    session: &dyn StorageSession,
    rows: Vec<JoinedRow>,
    aliases: &[&'static str],
    join: &JoinSpec,
    outer: Option<&Scope<'_>>,
) -> Result<Vec<JoinedRow>, Error> {
    let targets = session.scan(join.target.model)?;
    let mut matched_targets = vec![false; targets.len()];
    let mut out = Vec::with_capacity(rows.len());

    for combo in rows {
        let mut matched_any = false;

        for (idx, target) in targets.iter().enumerate() {
            if matches_link(&combo, join, target) {
                let mut candidate = combo.clone();
                candidate.push(Binding {
                    alias: join.target.alias,
                    row: Some(target.clone()),
                });

                let on_ok = match &join.on {
                    None => true,
                    Some(on) => {
                        let scope = Scope {
                            frames: &candidate,
                            outer,
                        };
                        eval::eval_pred(on, &scope, None, session)?
                    }
                };

                if on_ok {
                    matched_any = true;
                    matched_targets[idx] = true;
                    out.push(candidate);
                }
            }
        }

        // Left joins keep the source side with a null target.
        if !matched_any && join.kind == JoinKind::Left {
            let mut padded = combo;
            padded.push(Binding {
                alias: join.target.alias,
                row: None,
            });
            out.push(padded);
        }
    }

    // Right joins keep unmatched targets with a null source side.
    if join.kind == JoinKind::Right {
        for (idx, target) in targets.into_iter().enumerate() {
            if !matched_targets[idx] {
                let mut padded: JoinedRow = aliases
                    .iter()
                    .map(|&alias| Binding { alias, row: None })
                    .collect();
                padded.push(Binding {
                    alias: join.target.alias,
                    row: Some(target),
                });
                out.push(padded);
            }
        }
    }

    Ok(out)
}

// The association half of the join condition; `JoinLink::On` pairs
// everything and leaves the decision to the ON predicate.
fn matches_link(combo: &JoinedRow, join: &JoinSpec, target: &crate::store::StoredRow) -> bool {
    match &join.link {
        JoinLink::On => true,
        JoinLink::Association {
            source_alias,
            source_field,
            target_field,
        } => combo
            .iter()
            .find(|b| b.alias == *source_alias)
            .and_then(|b| b.row.as_ref())
            .is_some_and(|row| {
                loose_eq(&row.field(source_field), &target.field(target_field))
            }),
    }
}

// First-seen-order grouping; keys compare with the same loose equality
// predicates use.
fn group_rows(
    group_by: &[Expr],
    rows: Vec<JoinedRow>,
    outer: Option<&Scope<'_>>,
    session: &dyn StorageSession,
) -> Result<Vec<Vec<JoinedRow>>, Error> {
    if group_by.is_empty() {
        // Aggregate-all: one group, even over zero rows.
        return Ok(vec![rows]);
    }

    let mut groups: Vec<(Vec<Value>, Vec<JoinedRow>)> = Vec::new();
    for row in rows {
        let scope = Scope {
            frames: &row,
            outer,
        };
        let key = eval_list(group_by, &scope, None, session)?;

        let slot = groups.iter_mut().find(|(existing, _)| {
            existing.len() == key.len()
                && existing.iter().zip(&key).all(|(a, b)| {
                    (a.is_null() && b.is_null()) || loose_eq(a, b)
                })
        });

        match slot {
            Some((_, members)) => members.push(row),
            None => groups.push((key, vec![row])),
        }
    }

    Ok(groups.into_iter().map(|(_, members)| members).collect())
}

fn eval_list(
    exprs: &[Expr],
    scope: &Scope<'_>,
    group: eval::Group<'_>,
    session: &dyn StorageSession,
) -> Result<Vec<Value>, Error> {
    exprs
        .iter()
        .map(|expr| eval::eval_expr(expr, scope, group, session))
        .collect()
}

fn eval_order_keys(
    order_by: &[OrderSpec],
    scope: &Scope<'_>,
    group: eval::Group<'_>,
    session: &dyn StorageSession,
) -> Result<Vec<Value>, Error> {
    order_by
        .iter()
        .map(|spec| eval::eval_expr(&spec.expr, scope, group, session))
        .collect()
}

fn sort_units(units: &mut [(Vec<Value>, Vec<Value>)], order_by: &[OrderSpec]) {
    units.sort_by(|(_, a), (_, b)| {
        for (idx, spec) in order_by.iter().enumerate() {
            let ord = compare_key(&a[idx], &b[idx], spec);
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
}

fn compare_key(a: &Value, b: &Value, spec: &OrderSpec) -> Ordering {
    // Default null placement treats null as the largest value: last
    // ascending, first descending.
    let nulls = spec.nulls.unwrap_or(match spec.direction {
        OrderDirection::Asc => NullOrder::Last,
        OrderDirection::Desc => NullOrder::First,
    });

    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => match nulls {
            NullOrder::First => Ordering::Less,
            NullOrder::Last => Ordering::Greater,
        },
        (false, true) => match nulls {
            NullOrder::First => Ordering::Greater,
            NullOrder::Last => Ordering::Less,
        },
        (false, false) => {
            let ord = loose_cmp(a, b).unwrap_or(Ordering::Equal);
            match spec.direction {
                OrderDirection::Asc => ord,
                OrderDirection::Desc => ord.reverse(),
            }
        }
    }
}
