//! Comparison helpers shared by predicate evaluation and ordering.
//!
//! "Loose" comparisons are the query-surface semantics: NULL never
//! compares (three-valued logic collapsed to false), and the numeric
//! family compares across `Int`/`Float`.

use crate::value::Value;
use std::cmp::Ordering;

/// Equality as predicates see it: NULL on either side is never equal,
/// numerics compare across the family, everything else structurally.
pub(crate) fn loose_eq(a: &Value, b: &Value) -> bool {
    if a.is_null() || b.is_null() {
        return false;
    }
    if let Some(ord) = a.cmp_numeric(b) {
        return ord == Ordering::Equal;
    }

    a == b
}

/// Ordering as predicates and ORDER BY keys see it.
///
/// `None` when either side is NULL or the variants are not mutually
/// orderable; callers decide null placement separately.
pub(crate) fn loose_cmp(a: &Value, b: &Value) -> Option<Ordering> {
    if a.is_null() || b.is_null() {
        return None;
    }
    if let Some(ord) = a.cmp_numeric(b) {
        return Some(ord);
    }

    a.partial_cmp(b)
}

/// SQL LIKE matching with `%` as the only wildcard (no escapes).
pub(crate) fn like_match(text: &str, pattern: &str) -> bool {
    let mut segments = pattern.split('%');
    let first = segments.next().unwrap_or("");
    if !text.starts_with(first) {
        return false;
    }

    let rest_segments: Vec<&str> = segments.collect();
    let mut rest = &text[first.len()..];

    // No '%' in the pattern at all: exact match.
    let Some((last, middles)) = rest_segments.split_last() else {
        return rest.is_empty();
    };

    for seg in middles {
        if seg.is_empty() {
            continue;
        }
        match rest.find(seg) {
            Some(i) => rest = &rest[i + seg.len()..],
            None => return false,
        }
    }

    rest.ends_with(last)
}
