use super::*;
use crate::test_support::{MemberCols, TeamCols};

const M: MemberCols = MemberCols::new();
const T: TeamCols = TeamCols::new();

#[test]
fn comparisons_validate_operand_kinds() {
    assert!(M.age().eq(30).is_ok());
    assert!(M.age().goe(20).is_ok());
    assert!(M.username().eq("member1").is_ok());

    let err = M.age().eq("thirty").unwrap_err();
    assert!(matches!(
        err,
        Error::TypeMismatch {
            expected: ValueKind::Int,
            found: ValueKind::Text,
            ..
        }
    ));
}

#[test]
fn int_and_float_are_mutually_comparable() {
    assert!(M.age().gt(19.5).is_ok());
}

#[test]
fn null_literal_comparison_is_rejected_in_favor_of_is_null() {
    let err = M.username().eq(Value::Null).unwrap_err();
    assert!(matches!(err, Error::TypeMismatch { .. }));

    assert!(matches!(M.username().is_null(), Predicate::IsNull(_)));
}

#[test]
fn between_checks_both_bounds() {
    assert!(M.age().between(10, 30).is_ok());
    assert!(M.age().between(10, "thirty").is_err());
    assert!(M.age().between("ten", 30).is_err());
}

#[test]
fn in_list_checks_every_element() {
    assert!(M.age().in_list(vec![10.into(), 20.into()]).is_ok());
    assert!(
        M.age()
            .in_list(vec![10.into(), "twenty".into()])
            .is_err()
    );
}

#[test]
fn like_and_contains_require_text() {
    assert!(M.username().like("member%").is_ok());
    assert!(M.age().like("1%").is_err());

    let pred = M.username().contains("ember").unwrap();
    assert!(matches!(pred, Predicate::Like { pattern, .. } if pattern == "%ember%"));
}

#[test]
fn aggregates_enforce_argument_kinds() {
    assert!(M.age().sum().is_ok());
    assert!(M.age().avg().is_ok());
    assert!(M.username().sum().is_err());
    assert!(M.username().avg().is_err());

    // max/min order anything orderable, text included
    assert!(M.username().max().is_ok());
    assert!(M.age().min().is_ok());
}

#[test]
fn aggregate_result_kinds() {
    assert_eq!(M.age().count().kind(), ValueKind::Int);
    assert_eq!(Expr::count_all().kind(), ValueKind::Int);
    assert_eq!(M.age().avg().unwrap().kind(), ValueKind::Float);
    assert_eq!(M.age().sum().unwrap().kind(), ValueKind::Int);
    assert_eq!(M.username().max().unwrap().kind(), ValueKind::Text);
}

#[test]
fn arithmetic_requires_numeric_operands() {
    assert!(M.age().multiply(2).is_ok());
    assert!(M.age().add(-1).is_ok());
    assert!(M.username().multiply(2).is_err());
    assert!(M.age().add("one").is_err());
}

#[test]
fn binary_kind_widens_to_float() {
    assert_eq!(M.age().multiply(2).unwrap().kind(), ValueKind::Int);
    assert_eq!(M.age().multiply(1.5).unwrap().kind(), ValueKind::Float);
}

#[test]
fn concat_is_text_only_with_string_value_escape() {
    assert!(M.username().concat(Expr::literal("_suffix")).is_ok());

    let err = M.username().concat(M.age().expr()).unwrap_err();
    assert!(matches!(
        err,
        Error::TypeMismatch {
            expected: ValueKind::Text,
            found: ValueKind::Int,
            ..
        }
    ));

    let ok = M.username().concat(M.age().string_value()).unwrap();
    assert_eq!(ok.kind(), ValueKind::Text);
}

#[test]
fn chained_concat_flattens() {
    let expr = M
        .username()
        .concat(Expr::literal("_"))
        .unwrap()
        .concat(M.age().string_value())
        .unwrap();
    assert!(matches!(expr, Expr::Concat(ref parts) if parts.len() == 3));
}

#[test]
fn lower_requires_text() {
    assert!(M.username().lower().is_ok());
    assert!(M.age().lower().is_err());
}

#[test]
fn case_builder_requires_consistent_branch_kinds() {
    let ok = Expr::case()
        .when(M.age().loe(20).unwrap(), Expr::literal("junior"))
        .when(M.age().loe(30).unwrap(), Expr::literal("mid"))
        .otherwise(Expr::literal("senior"));
    assert!(ok.is_ok());

    let err = Expr::case()
        .when(M.age().loe(20).unwrap(), Expr::literal("junior"))
        .otherwise(Expr::literal(0))
        .unwrap_err();
    assert!(matches!(err, Error::TypeMismatch { .. }));
}

#[test]
fn case_preserves_branch_order() {
    let first = M.age().loe(20).unwrap();
    let second = M.age().loe(30).unwrap();
    let expr = Expr::case()
        .when(first.clone(), Expr::literal("a"))
        .when(second.clone(), Expr::literal("b"))
        .otherwise(Expr::literal("c"))
        .unwrap();

    let Expr::Case { branches, .. } = expr else {
        panic!("expected case expression");
    };
    assert_eq!(branches[0].0, first);
    assert_eq!(branches[1].0, second);
}

#[test]
fn identical_inputs_build_equal_trees() {
    assert_eq!(M.age().gt(18).unwrap(), M.age().gt(18).unwrap());
    assert_eq!(
        M.username().alias("name"),
        M.username().alias("name")
    );
}

#[test]
fn binding_names_come_from_alias_or_column() {
    assert_eq!(M.username().expr().binding_name(), Some("username"));
    assert_eq!(
        M.username().alias("name").binding_name(),
        Some("name")
    );
    assert_eq!(M.age().multiply(2).unwrap().binding_name(), None);
}

#[test]
fn expr_comparison_against_another_column() {
    let pred = M.username().eq_expr(T.name().expr()).unwrap();
    assert!(matches!(pred, Predicate::Compare { op: CompareOp::Eq, .. }));

    assert!(M.age().eq_expr(T.name().expr()).is_err());
}
