#![cfg(test)]

use super::{Idx, IndexVec};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct TestId(u32);

impl Idx for TestId {
    fn from_usize(idx: usize) -> Self {
        TestId(idx as u32)
    }
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[test]
fn test_push_returns_sequential_indices() {
    let mut v: IndexVec<TestId, &str> = IndexVec::new();
    let a = v.push("a");
    let b = v.push("b");
    assert_eq!(a, TestId(0));
    assert_eq!(b, TestId(1));
    assert_eq!(v[a], "a");
    assert_eq!(v[b], "b");
}

#[test]
fn test_next_index() {
    let mut v: IndexVec<TestId, i32> = IndexVec::new();
    assert_eq!(v.next_index(), TestId(0));
    v.push(1);
    assert_eq!(v.next_index(), TestId(1));
}

#[test]
fn test_get_out_of_bounds() {
    let v: IndexVec<TestId, i32> = IndexVec::new();
    assert!(v.get(TestId(0)).is_none());
}

#[test]
fn test_iter_enumerated() {
    let mut v: IndexVec<TestId, i32> = IndexVec::new();
    v.push(10);
    v.push(20);
    let pairs: Vec<_> = v.iter_enumerated().collect();
    assert_eq!(pairs, vec![(TestId(0), &10), (TestId(1), &20)]);
}

#[test]
fn test_index_mut() {
    let mut v: IndexVec<TestId, i32> = IndexVec::new();
    let id = v.push(1);
    v[id] += 41;
    assert_eq!(v[id], 42);
}

#[test]
fn test_newtype_index_macro() {
    crate::newtype_index! {
        struct MacroId;
    }
    let mut v: IndexVec<MacroId, char> = IndexVec::with_capacity(2);
    let id = v.push('x');
    assert_eq!(id, MacroId(0));
    assert_eq!(v[id], 'x');
}
