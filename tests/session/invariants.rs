//! Property tests over ordering, key unions and self-comparison

use crate::common::*;
use proptest::prelude::*;
use std::collections::BTreeSet;

fn name_strategy() -> impl Strategy<Value = String> {
    "[a-e][0-9]?"
}

fn entries_strategy() -> impl Strategy<Value = Vec<(String, i64)>> {
    prop::collection::vec((name_strategy(), -50i64..50), 0..12)
}

fn build(entries: &[(String, i64)]) -> Session {
    let mut s = Session::new();
    for (name, v) in entries {
        let array =
            LabeledArray::from_ints(vec![Axis::range("a", 2)], vec![*v, v.wrapping_mul(3)]).unwrap();
        s.set(name.clone(), array);
    }
    s
}

/// First-seen order of names
fn first_seen(entries: &[(String, i64)]) -> Vec<String> {
    let mut order: Vec<String> = Vec::new();
    for (name, _) in entries {
        if !order.contains(name) {
            order.push(name.clone());
        }
    }
    order
}

proptest! {
    #[test]
    fn overwrite_never_reorders(entries in entries_strategy()) {
        let s = build(&entries);
        let keys: Vec<String> = s.keys().map(String::from).collect();
        prop_assert_eq!(keys, first_seen(&entries));

        let sorted: Vec<String> = entries.iter().map(|(n, _)| n.clone()).collect::<BTreeSet<_>>().into_iter().collect();
        prop_assert_eq!(s.names(), sorted.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn binary_result_covers_key_union(left in entries_strategy(), right in entries_strategy()) {
        let a = build(&left);
        let b = build(&right);
        let c = &a - &b;

        let mut expected: Vec<String> = first_seen(&left);
        for name in first_seen(&right) {
            if !expected.contains(&name) {
                expected.push(name);
            }
        }
        let keys: Vec<String> = c.keys().map(String::from).collect();
        prop_assert_eq!(keys, expected);

        for name in c.keys() {
            let one_sided = a.contains(name) != b.contains(name);
            let array = c.get_array(name).unwrap();
            prop_assert_eq!(array.all_nan(), one_sided);
        }
    }

    #[test]
    fn self_difference_is_zero(entries in entries_strategy()) {
        let s = build(&entries);
        let zero = &s - &s;
        for (_, value) in &zero {
            prop_assert!(value.as_array().unwrap().values().iter().all(|v| *v == 0.0));
        }
    }

    #[test]
    fn array_equals_is_reflexive(entries in entries_strategy()) {
        let s = build(&entries);
        let mask = s.array_equals(&s).unwrap();
        prop_assert!(mask.as_array().unwrap().all());
        prop_assert!(s.equals(&s.copy()));
    }

    #[test]
    fn filter_returns_matching_subset(entries in entries_strategy(), prefix in "[a-e]") {
        let s = build(&entries);
        let filtered = s.filter(Some(prefix.as_str()), None).unwrap();
        let all: BTreeSet<&str> = s.keys().collect();
        for name in filtered.keys() {
            prop_assert!(all.contains(name));
            prop_assert!(name.starts_with(prefix.as_str()));
        }
        let expected = s.keys().filter(|n| n.starts_with(prefix.as_str())).count();
        prop_assert_eq!(filtered.len(), expected);
    }
}
