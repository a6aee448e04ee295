//! String interning for identifiers that flow through the IR: binder hints,
//! field/constructor names carried on atoms, Imp function and label names.
//!
//! A [`Symbol`] is a 4-byte handle into a process-global, thread-safe string
//! table. Interning is O(1) amortized (DashMap lookup or insert); comparing
//! two symbols is an integer comparison. Strings are leaked to `'static` once
//! interned, which is fine for a compiler process: total unique identifier
//! text is bounded by the size of the compilation unit.
//!
//! A handful of symbols used internally by the lowering passes themselves
//! (not user identifiers) are pre-interned at fixed indices so they can be
//! compared without a table lookup — see [`Symbol::intern_known`].

use dashmap::DashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::LazyLock;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol {
    index: u32,
}

const RESERVED_SYMBOLS_END: u32 = 64;

/// Symbols pre-interned at fixed indices, used by the lowering and
/// vectorization passes to name synthesized binders without an intern call
/// on every fresh-name allocation.
pub const KW_FOR: Symbol = Symbol { index: 0 };
pub const KW_SEQ: Symbol = Symbol { index: 1 };
pub const KW_TAB: Symbol = Symbol { index: 2 };
pub const KW_CASE: Symbol = Symbol { index: 3 };
pub const TY_FIN: Symbol = Symbol { index: 4 };
pub const TY_NAT: Symbol = Symbol { index: 5 };
pub const TY_UNIT: Symbol = Symbol { index: 6 };
pub const ID_DEST: Symbol = Symbol { index: 7 };
pub const ID_IDX: Symbol = Symbol { index: 8 };
pub const ID_TMP: Symbol = Symbol { index: 9 };
pub const ID_RESULT: Symbol = Symbol { index: 10 };
pub const ID_ANSWER: Symbol = Symbol { index: 11 };
pub const ID_REF: Symbol = Symbol { index: 12 };

const KNOWN: &[(&str, Symbol)] = &[
    ("for", KW_FOR),
    ("seq", KW_SEQ),
    ("tab", KW_TAB),
    ("case", KW_CASE),
    ("Fin", TY_FIN),
    ("Nat", TY_NAT),
    ("Unit", TY_UNIT),
    ("dest", ID_DEST),
    ("ix", ID_IDX),
    ("tmp", ID_TMP),
    ("result", ID_RESULT),
    ("answer", ID_ANSWER),
    ("ref", ID_REF),
];

struct StringTable {
    map: DashMap<u64, (&'static str, u32)>,
    next_index: AtomicU32,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

static STRING_TABLE: LazyLock<StringTable> = LazyLock::new(|| {
    let table = StringTable {
        map: DashMap::new(),
        next_index: AtomicU32::new(RESERVED_SYMBOLS_END),
        hits: AtomicUsize::new(0),
        misses: AtomicUsize::new(0),
    };
    for (text, sym) in KNOWN {
        table.insert_at(text, sym.index);
    }
    table
});

impl StringTable {
    fn hash_of(s: &str) -> u64 {
        let mut hasher = ahash::AHasher::default();
        s.hash(&mut hasher);
        hasher.finish()
    }

    fn insert_at(&self, s: &str, index: u32) {
        let leaked: &'static str = Box::leak(s.to_string().into_boxed_str());
        self.map.insert(Self::hash_of(s), (leaked, index));
    }

    fn intern(&self, s: &str) -> Symbol {
        let hash = Self::hash_of(s);
        if let Some(entry) = self.map.get(&hash) {
            if entry.0 == s {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Symbol { index: entry.1 };
            }
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        let index = self.next_index.fetch_add(1, Ordering::Relaxed);
        self.insert_at(s, index);
        Symbol { index }
    }

    fn get(&self, symbol: Symbol) -> Option<&'static str> {
        self.map
            .iter()
            .find(|entry| entry.value().1 == symbol.index)
            .map(|entry| entry.value().0)
    }
}

impl Symbol {
    #[inline]
    pub fn intern(s: &str) -> Self {
        if let Some((_, sym)) = KNOWN.iter().find(|(text, _)| *text == s) {
            return *sym;
        }
        STRING_TABLE.intern(s)
    }

    #[inline]
    pub fn as_str(&self) -> &'static str {
        STRING_TABLE.get(*self).unwrap_or("")
    }

    #[inline]
    pub fn is_known(&self) -> bool {
        self.index < RESERVED_SYMBOLS_END
    }

    #[inline]
    pub fn as_u32(&self) -> u32 {
        self.index
    }

    /// # Safety
    /// `index` must name an entry already present in the global table.
    #[inline]
    pub unsafe fn from_u32_unchecked(index: u32) -> Self {
        Self { index }
    }

    pub fn hit_rate() -> f64 {
        let hits = STRING_TABLE.hits.load(Ordering::Relaxed) as f64;
        let misses = STRING_TABLE.misses.load(Ordering::Relaxed) as f64;
        if hits + misses == 0.0 {
            0.0
        } else {
            hits / (hits + misses)
        }
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.as_str())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

static_assertions::assert_impl_all!(Symbol: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_idempotent() {
        let a = Symbol::intern("widget");
        let b = Symbol::intern("widget");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "widget");
    }

    #[test]
    fn distinct_strings_get_distinct_symbols() {
        assert_ne!(Symbol::intern("a"), Symbol::intern("b"));
    }

    #[test]
    fn known_symbols_short_circuit_the_table() {
        assert!(KW_FOR.is_known());
        assert_eq!(Symbol::intern("for"), KW_FOR);
        assert!(!Symbol::intern("user_var").is_known());
    }

    #[test]
    fn concurrent_interning_of_same_string_converges() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| Symbol::intern("shared_name")))
            .collect();
        let syms: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(syms.windows(2).all(|w| w[0] == w[1]));
    }
}
