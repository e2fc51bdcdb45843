//! Worked examples of per-entry dispatch, derivation and selection

use crate::common::*;
use std::collections::BTreeMap;

#[test]
fn test_subtract_partial_mapping() {
    let s = session_ef();
    let mut ones = BTreeMap::new();
    ones.insert("e".to_string(), Value::from(e().ones_like()));

    let diff = s.binop(BinaryOp::Sub, &ones);
    assert_eq!(diff.keys().collect::<Vec<_>>(), vec!["e", "f"]);

    let expected = LabeledArray::from_ints(
        vec![Axis::range("a", 2), Axis::range("b", 3)],
        vec![-1, 0, 1, 2, 3, 4],
    )
    .unwrap();
    assert!(diff.get_array("e").unwrap().equals(&expected, false));

    // f has no counterpart on the right: f - undefined is all NaN
    let f_diff = diff.get_array("f").unwrap();
    assert_eq!(f_diff.axis_names(), vec!["a", "b"]);
    assert!(f_diff.all_nan());
}

#[test]
fn test_session_minus_itself_is_zero() {
    let s = session_ef();
    let zero = &s - &s;
    for (name, value) in &zero {
        let array = value.as_array().unwrap();
        assert!(array.values().iter().all(|v| *v == 0.0), "{} not zero", name);
    }
}

#[test]
fn test_plus_zero_is_identity() {
    let s = mixed_session();
    let arrays = s.filter(None, Some(ValueKind::Array)).unwrap();
    assert_same_session(&(&arrays + 0i64), &arrays);
    assert_same_session(&(0.0 + &arrays), &arrays);
}

#[test]
fn test_incompatible_entries_do_not_spoil_siblings() {
    let s = session_ef();
    // e no longer lines up with its counterpart; f still does
    let swapped = Session::from_pairs([("e", f()), ("f", f())]);
    let out = &s * &swapped;
    assert!(out["e"].is_undefined());
    assert!(out.get_array("f").is_ok());
    assert_eq!(out.get_array("f").unwrap().values()[5], 25.0);
}

#[test]
fn test_right_only_keys_are_appended() {
    let s = session_ef();
    let t = Session::from_pairs([("z", 1i64), ("e", 2i64)]);
    let out = &s + &t;
    assert_eq!(out.keys().collect::<Vec<_>>(), vec!["e", "f", "z"]);
    // undefined + 1 is a float NaN
    assert!(out["z"].is_undefined());
    assert_eq!(out.get_array("e").unwrap().values()[0], 2.0);
}

#[test]
fn test_filter_by_kind_keeps_arrays_only() {
    let mut s = Session::new();
    s.set("e", e());
    s.set("label", "a plain string");
    let arrays = s.filter(None, Some(ValueKind::Array)).unwrap();
    assert_eq!(arrays.keys().collect::<Vec<_>>(), vec!["e"]);
}

#[test]
fn test_mask_selection_from_comparison() {
    let s = mixed_session();
    let mut t = s.copy();
    t.set("g", g().full_like(1.0));
    t.delete("count").unwrap();

    let mask = s.array_equals(&t).unwrap();
    let unchanged = s.select_mask(&mask).unwrap();
    assert_eq!(
        unchanged.keys().collect::<Vec<_>>(),
        vec!["e", "f", "b", "title"]
    );
    assert!(!s.equals(&t));
    assert!(s.equals(&s.copy()));
}

#[test]
fn test_transpose_then_compact() {
    let constant = LabeledArray::from_ints(
        vec![Axis::range("a", 3), Axis::range("b", 2)],
        vec![7, 8, 7, 8, 7, 8],
    )
    .unwrap();
    let s = Session::from_pairs([("c", Value::from(constant)), ("e", Value::from(e()))]);

    let t = s.transpose(&["b"]).unwrap();
    assert_eq!(t.get_array("c").unwrap().axis_names(), vec!["b", "a"]);

    let compacted = t.compact();
    assert_eq!(compacted.get_array("c").unwrap().axis_names(), vec!["b"]);
    assert_eq!(compacted.get_array("e").unwrap().axis_names(), vec!["b", "a"]);
    // source untouched
    assert_eq!(s.get_array("c").unwrap().axis_names(), vec!["a", "b"]);
}

#[test]
fn test_summary_and_export() {
    let s = mixed_session();
    let summary = s.summary(Some("{name}: {axes_names} ({title})"));
    assert_eq!(summary, "e: a, b ()\ng: a (quarterly g)\nf: a, b ()");

    let exported = s.export(Some(&["count", "e"])).unwrap();
    assert_eq!(exported[0], ("count".to_string(), Value::Int(3)));
    assert!(exported[1].1.is_array());
}

#[test]
fn test_float_errors_surface_once_per_call() {
    let (handler, seen) = recording_handler();
    let mut s = Session::from_pairs([("g", g()), ("h", g())]);
    s.set_float_error_handler(handler);

    let _ = &s / 0.0;
    let _ = &s * 2.0;
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, BinaryOp::Div);
    // per array: three x/0 and one NaN input that does not count
    assert_eq!(seen[0].1.divide_by_zero, 6);
}

#[test]
fn test_array_on_the_left_of_a_session() {
    let s = session_ef();
    let ones = Value::from(e().ones_like());
    let out = &ones - &s;

    let expected = LabeledArray::from_ints(
        vec![Axis::range("a", 2), Axis::range("b", 3)],
        vec![1, 0, -1, -2, -3, -4],
    )
    .unwrap();
    assert!(out.get_array("e").unwrap().equals(&expected, false));
    // f does not line up with the left array
    assert!(out["f"].is_undefined());
}

#[test]
fn test_integer_entries_beyond_float_precision() {
    let big = (1i64 << 53) + 1;
    let s = Session::from_pairs([("n", big)]);
    assert_eq!((&s + 0i64)["n"], Value::Int(big));
    assert_eq!((2i64 * &s)["n"], Value::Int(2 * big));
    assert_eq!(s.binop(BinaryOp::Eq, &Value::Int(big - 1))["n"], Value::Bool(false));
    assert!(!s.equals(&Session::from_pairs([("n", big - 1)])));
}

#[test]
fn test_summary_placeholders_in_names_and_titles() {
    let s = Session::from_pairs([("{axes_names}", g().with_title("{name}"))]);
    assert_eq!(s.summary(Some("{name} / {title}")), "{axes_names} / {name}");
}
