use ragdb_core::error::Result;
use ragdb_core::traits::VectorIndex;
use ragdb_core::types::{IndexEntry, SearchHit};

use crate::math::{check_batch, check_query, euclidean, normalize, TopK};

/// Exact brute-force index: O(n·D) per query, O(k) extra memory.
#[derive(Debug, Default, Clone)]
pub struct FlatIndex {
    dim: Option<usize>,
    entries: Vec<IndexEntry>,
}

impl FlatIndex {
    pub fn new() -> Self { Self::default() }
}

impl VectorIndex for FlatIndex {
    fn dim(&self) -> Option<usize> { self.dim }
    fn len(&self) -> usize { self.entries.len() }

    fn insert(&mut self, entries: Vec<IndexEntry>) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let dim = check_batch(self.dim, &entries)?;
        self.dim = Some(dim);
        self.entries.extend(entries.into_iter().map(|e| IndexEntry { vector: normalize(&e.vector), chunk_id: e.chunk_id }));
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        check_query(self.dim, self.entries.len(), query, k)?;
        let query = normalize(query);
        let mut top = TopK::new(k.min(self.entries.len()));
        for (position, entry) in self.entries.iter().enumerate() {
            top.push(euclidean(&query, &entry.vector), position);
        }
        Ok(top.into_hits(&self.entries))
    }

    fn entries(&self) -> &[IndexEntry] { &self.entries }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragdb_core::Error;

    fn unit(dim: usize, axis: usize) -> Vec<f32> {
        let mut v = vec![0.0; dim];
        v[axis] = 1.0;
        v
    }

    fn populated(n: usize) -> FlatIndex {
        let mut index = FlatIndex::new();
        let entries = (0..n).map(|i| IndexEntry::new(format!("c{i}"), unit(n, i))).collect();
        index.insert(entries).expect("insert");
        index
    }

    #[test]
    fn copy_of_vector_is_nearest_at_zero() {
        let index = populated(6);
        for i in 0..6 {
            let hits = index.search(&unit(6, i), 3).expect("search");
            assert_eq!(hits[0].chunk_id, format!("c{i}"));
            assert_eq!(hits[0].distance, 0.0);
        }
    }

    #[test]
    fn results_sorted_and_truncated() {
        let mut index = FlatIndex::new();
        let vectors = [[1.0, 0.0], [0.8, 0.6], [0.0, 1.0], [-1.0, 0.0]];
        index.insert(vectors.iter().enumerate().map(|(i, v)| IndexEntry::new(format!("c{i}"), v.to_vec())).collect()).expect("insert");

        let hits = index.search(&[1.0, 0.1], 10).expect("search");
        assert_eq!(hits.len(), 4, "min(k, N)");
        let ids: Vec<&str> = hits.iter().map(|h| h.chunk_id.as_str()).collect();
        assert_eq!(ids, vec!["c0", "c1", "c2", "c3"]);
        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
        assert_eq!(index.search(&[1.0, 0.1], 2).expect("search").len(), 2);
    }

    #[test]
    fn magnitude_does_not_change_ranking() {
        let mut index = FlatIndex::new();
        index.insert(vec![IndexEntry::new("big", vec![100.0, 0.0]), IndexEntry::new("small", vec![0.0, 0.01])]).expect("insert");
        let hits = index.search(&[0.001, 0.0], 1).expect("search");
        assert_eq!(hits[0].chunk_id, "big");
        assert!(hits[0].distance.abs() < 1e-6);
    }

    #[test]
    fn ties_go_to_oldest_entry() {
        let mut index = FlatIndex::new();
        index.insert(vec![IndexEntry::new("first", vec![0.0, 1.0]), IndexEntry::new("second", vec![0.0, 2.0])]).expect("insert");
        index.insert(vec![IndexEntry::new("third", vec![0.0, 3.0])]).expect("insert");
        let ids: Vec<String> = index.search(&[0.0, 1.0], 3).expect("search").into_iter().map(|h| h.chunk_id).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn empty_index_fails() {
        assert!(matches!(FlatIndex::new().search(&[1.0], 1), Err(Error::EmptyIndex)));
    }

    #[test]
    fn dimension_is_fixed_by_first_insert() {
        let mut index = populated(3);
        let err = index.insert(vec![IndexEntry::new("ok", unit(3, 0)), IndexEntry::new("bad", vec![1.0; 4])]).expect_err("mismatch");
        assert!(matches!(err, Error::Dimension { expected: 3, actual: 4 }));
        assert_eq!(index.len(), 3, "failed batch stores nothing");
        assert!(matches!(index.search(&[1.0, 0.0], 1), Err(Error::Dimension { .. })));
    }

    #[test]
    fn zero_k_is_config_error() {
        assert!(matches!(populated(2).search(&unit(2, 0), 0), Err(Error::Config(_))));
    }

    #[test]
    fn duplicate_ids_are_not_deduplicated() {
        let mut index = FlatIndex::new();
        index.insert(vec![IndexEntry::new("dup", vec![1.0, 0.0])]).expect("insert");
        index.insert(vec![IndexEntry::new("dup", vec![1.0, 0.0])]).expect("insert");
        assert_eq!(index.len(), 2);
    }
}
