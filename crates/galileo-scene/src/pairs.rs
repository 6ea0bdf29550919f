use std::collections::HashMap;
use std::sync::Arc;

/// Unordered pairs of `0..n` in `combinations(0..n, 2)` order:
/// (0,1) (0,2) .. (0,n-1) (1,2) ..
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairTable {
    n: usize,
    pairs: Vec<(usize, usize)>,
}

impl PairTable {
    pub fn new(n: usize) -> Self {
        let mut pairs = Vec::with_capacity(n * n.saturating_sub(1) / 2);
        for i in 0..n {
            for j in (i + 1)..n {
                pairs.push((i, j));
            }
        }
        Self { n, pairs }
    }

    #[inline] pub fn len(&self) -> usize { self.pairs.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.pairs.is_empty() }
    #[inline] pub fn pairs(&self) -> &[(usize, usize)] { &self.pairs }
    #[inline] pub fn pair(&self, col: usize) -> Option<(usize, usize)> { self.pairs.get(col).copied() }

    /// Column of the pair {a, b}; argument order does not matter.
    pub fn index(&self, a: usize, b: usize) -> Option<usize> {
        let (i, j) = if a < b { (a, b) } else { (b, a) };
        if i == j || j >= self.n { return None; }
        Some(i * (2 * self.n - i - 1) / 2 + (j - i - 1))
    }
}

/// One enumeration per tracked count, built on first use.
#[derive(Debug, Default)]
pub struct PairCache {
    tables: HashMap<usize, Arc<PairTable>>,
}

impl PairCache {
    pub fn new() -> Self { Self::default() }

    pub fn get(&mut self, n: usize) -> Arc<PairTable> {
        self.tables.entry(n).or_insert_with(|| Arc::new(PairTable::new(n))).clone()
    }

    #[inline] pub fn cached(&self) -> usize { self.tables.len() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test] fn canonical_order() {
        let t = PairTable::new(4);
        assert_eq!(t.pairs(), &[(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]);
    }

    #[test] fn index_matches_enumeration() {
        let t = PairTable::new(7);
        for (col, &(i, j)) in t.pairs().iter().enumerate() {
            assert_eq!(t.index(i, j), Some(col));
            assert_eq!(t.index(j, i), Some(col));
        }
        assert_eq!(t.index(2, 2), None);
        assert_eq!(t.index(0, 7), None);
    }

    #[test] fn degenerate_counts() {
        assert!(PairTable::new(0).is_empty());
        assert!(PairTable::new(1).is_empty());
    }

    #[test] fn cache_reuses_tables() {
        let mut c = PairCache::new();
        let a = c.get(3);
        let b = c.get(3);
        assert!(Arc::ptr_eq(&a, &b));
        c.get(5);
        assert_eq!(c.cached(), 2);
    }
}
