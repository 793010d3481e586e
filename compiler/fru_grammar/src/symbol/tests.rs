use super::*;
use proptest::prelude::*;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

fn hash_of(set: &SymbolSet) -> u64 {
    let mut hasher = DefaultHasher::new();
    set.hash(&mut hasher);
    hasher.finish()
}

#[test]
fn test_insert_and_contains() {
    let mut set = SymbolSet::new();
    assert!(set.insert(Symbol(3)));
    assert!(!set.insert(Symbol(3)));
    assert!(set.insert(Symbol(300)));
    assert!(set.contains(Symbol(3)));
    assert!(set.contains(Symbol(300)));
    assert!(!set.contains(Symbol(4)));
    assert!(!set.contains(Symbol(9000)));
    assert_eq!(set.len(), 2);
}

#[test]
fn test_union_reports_growth() {
    let mut a: SymbolSet = [Symbol(1), Symbol(2)].into_iter().collect();
    let b: SymbolSet = [Symbol(2)].into_iter().collect();
    assert!(!a.union_with(&b));
    let c: SymbolSet = [Symbol(130)].into_iter().collect();
    assert!(a.union_with(&c));
    assert_eq!(a.iter().collect::<Vec<_>>(), vec![Symbol(1), Symbol(2), Symbol(130)]);
}

#[test]
fn test_equality_ignores_trailing_capacity() {
    let mut grown = SymbolSet::new();
    grown.insert(Symbol(500));
    grown.remove(Symbol(500));
    grown.insert(Symbol(1));
    let small = SymbolSet::single(Symbol(1));
    assert_eq!(grown, small);
    assert_eq!(hash_of(&grown), hash_of(&small));
}

#[test]
fn test_intersects() {
    let a: SymbolSet = [Symbol(1), Symbol(70)].into_iter().collect();
    let b: SymbolSet = [Symbol(70)].into_iter().collect();
    let c: SymbolSet = [Symbol(2)].into_iter().collect();
    assert!(a.intersects(&b));
    assert!(!a.intersects(&c));
    assert!(!SymbolSet::new().intersects(&a));
}

#[test]
fn test_error_symbol_display() {
    assert_eq!(Symbol::ERROR.to_string(), "#ERROR");
    assert_eq!(Symbol(7).to_string(), "#7");
    assert!(Symbol::ERROR.is_error());
    assert!(!Symbol::END.is_error());
}

proptest! {
    #[test]
    fn iter_is_sorted_and_complete(ids in proptest::collection::vec(0u16..600, 0..40)) {
        let set: SymbolSet = ids.iter().copied().map(Symbol).collect();
        let mut expected: Vec<u16> = ids.clone();
        expected.sort_unstable();
        expected.dedup();
        let actual: Vec<u16> = set.iter().map(|s| s.0).collect();
        prop_assert_eq!(actual, expected);
    }
}
