//! String interner implementation using DashMap for concurrent access.
//!
//! Two lock-free maps back the interner: a forward map from string to
//! table index and a reverse map from index to string. Strings are
//! allocated once and leaked to obtain `'static` references; interned
//! strings are never removed, so the leak is bounded by the set of
//! distinct names in the compilation.

use ahash::RandomState;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::LazyLock;

use super::Symbol;

/// Global string table instance, initialized on first use.
pub(super) static STRING_TABLE: LazyLock<StringTable> = LazyLock::new(StringTable::new);

/// Thread-safe string table
pub(super) struct StringTable {
    /// string → index
    map: DashMap<&'static str, u32, RandomState>,
    /// index → string
    strings: DashMap<u32, &'static str, RandomState>,
    /// Next free index
    next_index: AtomicU32,
}

impl StringTable {
    fn new() -> Self {
        Self {
            map: DashMap::with_capacity_and_hasher(256, RandomState::new()),
            strings: DashMap::with_capacity_and_hasher(256, RandomState::new()),
            next_index: AtomicU32::new(0),
        }
    }

    /// Intern a string, returning its stable symbol
    pub(super) fn intern(&self, string: &str) -> Symbol {
        // Fast path: already interned.
        if let Some(idx) = self.map.get(string) {
            return Symbol { index: *idx };
        }

        let leaked: &'static str = Box::leak(string.to_owned().into_boxed_str());
        let index = *self.map.entry(leaked).or_insert_with(|| {
            let idx = self.next_index.fetch_add(1, Ordering::SeqCst);
            assert!(idx != u32::MAX, "string table overflow");
            self.strings.insert(idx, leaked);
            idx
        });
        Symbol { index }
    }

    /// Resolve a symbol back to its string
    pub(super) fn get(&self, symbol: Symbol) -> Option<&'static str> {
        self.strings.get(&symbol.index).map(|entry| *entry)
    }
}
