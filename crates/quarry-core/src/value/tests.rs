use super::*;

#[test]
fn kind_tracks_variant() {
    assert_eq!(Value::Null.kind(), ValueKind::Null);
    assert_eq!(Value::Bool(true).kind(), ValueKind::Bool);
    assert_eq!(Value::Int(1).kind(), ValueKind::Int);
    assert_eq!(Value::Float(1.5).kind(), ValueKind::Float);
    assert_eq!(Value::Text("x".to_string()).kind(), ValueKind::Text);
    assert_eq!(Value::List(vec![]).kind(), ValueKind::List);
}

#[test]
fn numeric_family_is_comparable_across_variants() {
    assert!(ValueKind::Int.comparable_with(ValueKind::Float));
    assert!(ValueKind::Float.comparable_with(ValueKind::Int));
    assert!(ValueKind::Text.comparable_with(ValueKind::Text));
    assert!(!ValueKind::Text.comparable_with(ValueKind::Int));
}

#[test]
fn from_impls_cover_primitive_inputs() {
    assert_eq!(Value::from(10_i32), Value::Int(10));
    assert_eq!(Value::from(10_u8), Value::Int(10));
    assert_eq!(Value::from("ten"), Value::Text("ten".to_string()));
    assert_eq!(Value::from(2.5_f64), Value::Float(2.5));
    assert_eq!(Value::from(Some(3_i64)), Value::Int(3));
    assert_eq!(Value::from(None::<i64>), Value::Null);
}

#[test]
fn cmp_numeric_widens_across_the_family() {
    use std::cmp::Ordering;

    assert_eq!(
        Value::Int(2).cmp_numeric(&Value::Float(2.0)),
        Some(Ordering::Equal)
    );
    assert_eq!(
        Value::Int(3).cmp_numeric(&Value::Float(2.5)),
        Some(Ordering::Greater)
    );
    assert_eq!(Value::Int(2).cmp_numeric(&Value::Text("2".to_string())), None);
}

#[test]
fn float_equality_uses_total_order() {
    assert_eq!(Value::Float(f64::NAN), Value::Float(f64::NAN));
    assert_ne!(Value::Float(0.5), Value::Float(0.25));
}

#[test]
fn render_text_matches_string_cast_semantics() {
    assert_eq!(Value::Int(10).render_text(), "10");
    assert_eq!(Value::Text("m".to_string()).render_text(), "m");
    assert_eq!(Value::Null.render_text(), "");
}

#[test]
fn value_serializes_stably() {
    let json = serde_json::to_string(&Value::from_list(vec![1_i64, 2, 3])).unwrap();
    assert_eq!(json, r#"{"List":[{"Int":1},{"Int":2},{"Int":3}]}"#);
}
