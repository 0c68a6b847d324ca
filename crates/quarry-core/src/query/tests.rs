use super::*;
use crate::test_support::{MemberCols, TeamCols};

const M: MemberCols = MemberCols::new();
const T: TeamCols = TeamCols::new();

#[test]
fn join_resolves_forward_association() {
    let plan = QueryBuilder::select(vec![M.username().expr()])
        .from(M.entity)
        .join(T.entity, JoinKind::Inner)
        .unwrap()
        .build();

    assert_eq!(
        plan.joins[0].link,
        JoinLink::Association {
            source_alias: "Member",
            source_field: "team_id",
            target_field: "id",
        }
    );
}

#[test]
fn join_resolves_reverse_association() {
    // Team declares members; joining Member from Team walks it forward,
    // joining Team from a schema where only Team declares the path
    // walks it in reverse. Both land on the same field pair.
    let plan = QueryBuilder::select(vec![T.name().expr()])
        .from(T.entity)
        .join(M.entity, JoinKind::Left)
        .unwrap()
        .build();

    assert_eq!(
        plan.joins[0].link,
        JoinLink::Association {
            source_alias: "Team",
            source_field: "id",
            target_field: "team_id",
        }
    );
}

#[test]
fn join_without_association_fails_at_builder_time() {
    let other = MemberCols::aliased("stranger");
    // Two Member refs have no association path to each other.
    let err = QueryBuilder::select(vec![M.username().expr()])
        .from(M.entity)
        .join(other.entity, JoinKind::Left)
        .unwrap_err();

    assert_eq!(
        err,
        crate::error::Error::UnsupportedJoin {
            source_entity: "Member",
            target: "stranger",
            kind: JoinKind::Left,
        }
    );
}

#[test]
fn join_on_needs_no_association() {
    let other = TeamCols::aliased("t2");
    let condition = other.name().eq("teamA").unwrap();
    let plan = QueryBuilder::select(vec![M.username().expr()])
        .from(M.entity)
        .join_on(other.entity, JoinKind::Left, condition.clone())
        .build();

    assert_eq!(plan.joins[0].link, JoinLink::On);
    assert_eq!(plan.joins[0].on, Some(condition));
}

#[test]
fn on_refines_the_most_recent_join() {
    let refine = T.name().eq("teamA").unwrap();
    let plan = QueryBuilder::select(vec![M.username().expr()])
        .from(M.entity)
        .join(T.entity, JoinKind::Left)
        .unwrap()
        .on(refine.clone())
        .build();

    assert_eq!(plan.joins[0].on, Some(refine));
}

#[test]
fn on_before_any_join_folds_into_filter() {
    let condition = M.age().gt(18).unwrap();
    let plan = QueryBuilder::select(vec![M.username().expr()])
        .from(M.entity)
        .on(condition.clone())
        .build();

    assert_eq!(plan.filter, Some(condition));
    assert!(plan.joins.is_empty());
}

#[test]
fn select_from_expands_root_columns() {
    let plan = QueryBuilder::select_from(M.entity).build();

    let fields: Vec<_> = plan
        .select
        .iter()
        .filter_map(crate::expr::Expr::binding_name)
        .collect();
    assert_eq!(fields, vec!["id", "username", "age", "team_id"]);
}

#[test]
fn fetch_join_expands_target_columns_too() {
    let plan = QueryBuilder::select_from(M.entity)
        .join(T.entity, JoinKind::Inner)
        .unwrap()
        .fetch_join()
        .build();

    assert_eq!(plan.select.len(), MEMBER_FIELDS + TEAM_FIELDS);
    assert!(plan.joins[0].fetch);
}

const MEMBER_FIELDS: usize = 4;
const TEAM_FIELDS: usize = 2;

#[test]
fn non_fetch_join_leaves_select_alone() {
    let plan = QueryBuilder::select_from(M.entity)
        .join(T.entity, JoinKind::Inner)
        .unwrap()
        .build();

    assert_eq!(plan.select.len(), MEMBER_FIELDS);
}

#[test]
fn where_ands_and_skips_none() {
    let a = M.age().gt(10).unwrap();
    let b = M.username().like("member%").unwrap();
    let plan = QueryBuilder::select(vec![M.username().expr()])
        .from(M.entity)
        .where_(vec![Some(a.clone()), None, Some(b.clone())])
        .build();

    assert_eq!(plan.filter, Some(a.and(b)));
}

#[test]
fn repeated_filters_accumulate_with_and() {
    let a = M.age().gt(10).unwrap();
    let b = M.age().lt(40).unwrap();
    let plan = QueryBuilder::select(vec![M.username().expr()])
        .from(M.entity)
        .filter(a.clone())
        .filter_opt(None)
        .filter(b.clone())
        .build();

    assert_eq!(plan.filter, Some(a.and(b)));
}

#[test]
fn order_spec_defaults_and_overrides() {
    let spec = M.age().desc();
    assert_eq!(spec.direction, OrderDirection::Desc);
    assert_eq!(spec.nulls, None);

    let spec = M.username().asc().nulls_last();
    assert_eq!(spec.direction, OrderDirection::Asc);
    assert_eq!(spec.nulls, Some(NullOrder::Last));
}

#[test]
fn built_plans_are_reusable_values() {
    let plan = QueryBuilder::select(vec![M.username().expr()])
        .from(M.entity)
        .offset(1)
        .limit(2)
        .build();

    let copy = plan.clone();
    assert_eq!(plan, copy);
    assert_eq!(plan.offset, Some(1));
    assert_eq!(plan.limit, Some(2));
}

#[test]
fn for_count_strips_order_and_paging() {
    let plan = QueryBuilder::select(vec![M.username().expr()])
        .from(M.entity)
        .order_by(vec![M.age().desc()])
        .offset(1)
        .limit(2)
        .build();

    let counted = plan.for_count();
    assert!(counted.order_by.is_empty());
    assert_eq!(counted.offset, None);
    assert_eq!(counted.limit, None);
    assert_eq!(counted.select, vec![crate::expr::Expr::count_all()]);
    assert_eq!(counted.filter, plan.filter);
}

#[test]
fn scalar_kind_tracks_first_selection() {
    let plan = QueryBuilder::select(vec![M.age().max().unwrap()])
        .from(M.entity)
        .build();
    assert_eq!(plan.scalar_kind(), crate::value::ValueKind::Int);

    let empty = QueryBuilder::select(vec![]).build();
    assert_eq!(empty.scalar_kind(), crate::value::ValueKind::Null);
}
