use std::collections::BTreeMap;

/// Occurrence counts per category (artist, client, year, ...).
///
/// Backed by a `BTreeMap` so iteration is ascending by category, which is the
/// order yearly tables are reported in.
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution<K: Ord> {
    counts: BTreeMap<K, usize>,
}

impl<K: Ord> Default for Distribution<K> {
    fn default() -> Self {
        Self {
            counts: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Clone> Distribution<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, category: K) {
        *self.counts.entry(category).or_insert(0) += 1;
    }

    pub fn count(&self, category: &K) -> usize {
        self.counts.get(category).copied().unwrap_or(0)
    }

    /// Number of distinct categories.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Shannon entropy in bits: `-Σ p·log2(p)`. Empty → 0.
    pub fn entropy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let total = total as f64;
        let h: f64 = self
            .counts
            .values()
            .map(|&c| {
                let p = c as f64 / total;
                -p * p.log2()
            })
            .sum();
        // A single category sums to -0.0
        if h > 0.0 { h } else { 0.0 }
    }

    /// (category, count) pairs in ascending category order.
    pub fn ascending(&self) -> Vec<(K, usize)> {
        self.counts.iter().map(|(k, &c)| (k.clone(), c)).collect()
    }

    /// (category, count) pairs by descending count; ties by ascending category.
    pub fn ranked(&self) -> Vec<(K, usize)> {
        let mut pairs = self.ascending();
        // Stable sort keeps the ascending-category order within equal counts.
        pairs.sort_by(|a, b| b.1.cmp(&a.1));
        pairs
    }
}
