//! Inverted-file (IVF) index: vectors are bucketed under k-means centroids and
//! a query only scans the buckets whose centroids are nearest to it.
//!
//! Trade-off: a true neighbour living in an unprobed bucket is missed, so
//! recall is approximate. Cardinality and ordering match [`FlatIndex`]: probing
//! widens until at least `min(k, len)` candidates are gathered and candidates
//! are ranked exactly with the same tie rule.
//!
//! [`FlatIndex`]: crate::FlatIndex

use std::sync::OnceLock;

use ragdb_core::error::Result;
use ragdb_core::traits::VectorIndex;
use ragdb_core::types::{IndexEntry, SearchHit};

use crate::math::{check_batch, check_query, euclidean, normalize, TopK};

const KMEANS_ITERATIONS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IvfParams {
    /// Upper bound on the number of partitions.
    pub max_nlist: usize,
    pub nprobe: usize,
}

impl Default for IvfParams {
    fn default() -> Self {
        Self { max_nlist: 1024, nprobe: 8 }
    }
}

/// Partition count for a training set of `n` vectors: about `2·sqrt(n)`,
/// never more than `n - 1` so tiny corpora still get populated buckets.
pub fn compute_nlist(n: usize, max_nlist: usize) -> usize {
    let sqrt_n = (n as f64).sqrt() as usize;
    let nlist = (2 * sqrt_n).min(max_nlist);
    nlist.min(n.saturating_sub(1)).max(1)
}

/// Centroids and the entry positions filed under each of them.
#[derive(Debug, Clone)]
struct Partitions {
    centroids: Vec<Vec<f32>>,
    /// Positions into `entries`, ascending within each list.
    lists: Vec<Vec<usize>>,
}

/// Partitions are trained over every stored entry the first time they are
/// needed and discarded by `insert`, so they depend only on the entry
/// sequence and not on how it was batched.
#[derive(Debug, Clone)]
pub struct IvfIndex {
    params: IvfParams,
    dim: Option<usize>,
    entries: Vec<IndexEntry>,
    partitions: OnceLock<Partitions>,
}

impl IvfIndex {
    pub fn new(params: IvfParams) -> Self {
        Self { params, dim: None, entries: Vec::new(), partitions: OnceLock::new() }
    }

    pub fn nlist(&self) -> usize {
        if self.entries.is_empty() { 0 } else { self.partitions().centroids.len() }
    }

    fn partitions(&self) -> &Partitions {
        self.partitions.get_or_init(|| train(&self.entries, self.params.max_nlist))
    }
}

/// Spherical k-means. Initial centroids are evenly spaced samples so training
/// is deterministic.
fn train(entries: &[IndexEntry], max_nlist: usize) -> Partitions {
    let n = entries.len();
    let nlist = compute_nlist(n, max_nlist);
    let dim = entries[0].vector.len();
    let mut centroids: Vec<Vec<f32>> = (0..nlist).map(|i| entries[i * n / nlist].vector.clone()).collect();

    for _ in 0..KMEANS_ITERATIONS {
        let mut sums = vec![vec![0f64; dim]; nlist];
        let mut counts = vec![0usize; nlist];
        for e in entries {
            let c = nearest(&centroids, &e.vector);
            counts[c] += 1;
            for (s, x) in sums[c].iter_mut().zip(&e.vector) { *s += f64::from(*x); }
        }
        let mut moved = false;
        for (c, (sum, count)) in sums.into_iter().zip(counts).enumerate() {
            if count == 0 {
                continue;
            }
            let mean: Vec<f32> = sum.iter().map(|s| (s / count as f64) as f32).collect();
            let updated = normalize(&mean);
            if updated != centroids[c] {
                centroids[c] = updated;
                moved = true;
            }
        }
        if !moved {
            break;
        }
    }

    let mut lists = vec![Vec::new(); nlist];
    for (position, e) in entries.iter().enumerate() {
        lists[nearest(&centroids, &e.vector)].push(position);
    }
    tracing::debug!("IVF trained: {} partitions over {} vectors", nlist, n);
    Partitions { centroids, lists }
}

fn nearest(centroids: &[Vec<f32>], v: &[f32]) -> usize {
    let mut best = 0usize;
    let mut best_distance = f32::INFINITY;
    for (i, c) in centroids.iter().enumerate() {
        let d = euclidean(c, v);
        if d < best_distance {
            best = i;
            best_distance = d;
        }
    }
    best
}

impl VectorIndex for IvfIndex {
    fn dim(&self) -> Option<usize> { self.dim }
    fn len(&self) -> usize { self.entries.len() }

    fn insert(&mut self, entries: Vec<IndexEntry>) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let dim = check_batch(self.dim, &entries)?;
        self.dim = Some(dim);
        self.entries.extend(entries.into_iter().map(|e| IndexEntry { vector: normalize(&e.vector), chunk_id: e.chunk_id }));
        self.partitions = OnceLock::new();
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        check_query(self.dim, self.entries.len(), query, k)?;
        let query = normalize(query);
        let partitions = self.partitions();

        let mut order: Vec<(f32, usize)> = partitions.centroids.iter().enumerate().map(|(i, c)| (euclidean(c, &query), i)).collect();
        order.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let wanted = k.min(self.entries.len());
        let mut top = TopK::new(wanted);
        let mut gathered = 0usize;
        for (probed, &(_, list)) in order.iter().enumerate() {
            if probed >= self.params.nprobe && gathered >= wanted {
                break;
            }
            for &position in &partitions.lists[list] {
                top.push(euclidean(&query, &self.entries[position].vector), position);
            }
            gathered += partitions.lists[list].len();
        }
        Ok(top.into_hits(&self.entries))
    }

    fn prepare(&self) {
        if !self.entries.is_empty() {
            self.partitions();
        }
    }

    fn entries(&self) -> &[IndexEntry] { &self.entries }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FlatIndex;
    use ragdb_core::Error;

    /// Deterministic pseudo-random vectors (LCG) so the test needs no RNG crate.
    fn vectors(n: usize, dim: usize) -> Vec<Vec<f32>> {
        let mut state = 0x2545_f491_u64;
        (0..n)
            .map(|_| {
                (0..dim)
                    .map(|_| {
                        state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
                        ((state >> 33) as f32 / (1u64 << 31) as f32) - 0.5
                    })
                    .collect()
            })
            .collect()
    }

    fn build(n: usize, params: IvfParams) -> (IvfIndex, Vec<Vec<f32>>) {
        let vs = vectors(n, 16);
        let mut index = IvfIndex::new(params);
        index.insert(vs.iter().enumerate().map(|(i, v)| IndexEntry::new(format!("c{i}"), v.clone())).collect()).expect("insert");
        (index, vs)
    }

    #[test]
    fn nlist_heuristic() {
        assert_eq!(compute_nlist(1, 1024), 1);
        assert_eq!(compute_nlist(3, 1024), 2);
        assert_eq!(compute_nlist(400, 1024), 40);
        assert_eq!(compute_nlist(1_000_000, 1024), 1024);
    }

    #[test]
    fn finds_exact_copies() {
        let (index, vs) = build(200, IvfParams { max_nlist: 64, nprobe: 1 });
        assert!(index.nlist() > 1);
        for (i, v) in vs.iter().enumerate() {
            let hits = index.search(v, 1).expect("search");
            assert_eq!(hits[0].chunk_id, format!("c{i}"));
            assert_eq!(hits[0].distance, 0.0);
        }
    }

    #[test]
    fn cardinality_and_order_match_contract() {
        let (index, vs) = build(120, IvfParams { max_nlist: 32, nprobe: 1 });
        for k in [1, 5, 50, 500] {
            let hits = index.search(&vs[7], k).expect("search");
            assert_eq!(hits.len(), k.min(120));
            assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
        }
    }

    #[test]
    fn probing_every_list_is_exact() {
        let (ivf, vs) = build(150, IvfParams { max_nlist: 16, nprobe: 16 });
        let mut flat = FlatIndex::new();
        flat.insert(vs.iter().enumerate().map(|(i, v)| IndexEntry::new(format!("c{i}"), v.clone())).collect()).expect("insert");
        let q = vectors(1, 16).remove(0);
        assert_eq!(ivf.search(&q, 10).expect("ivf"), flat.search(&q, 10).expect("flat"));
    }

    #[test]
    fn later_batches_retrain_partitions() {
        let (mut index, _) = build(50, IvfParams::default());
        assert_eq!(index.nlist(), 14);
        index.insert(vec![IndexEntry::new("late", vec![1.0; 16])]).expect("insert");
        assert_eq!(index.nlist(), 14);
        assert_eq!(index.search(&[1.0; 16], 1).expect("search")[0].chunk_id, "late");
        assert!(matches!(index.insert(vec![IndexEntry::new("bad", vec![1.0; 3])]), Err(Error::Dimension { .. })));
    }

    #[test]
    fn batching_does_not_change_results() {
        let vs = vectors(90, 16);
        let entries: Vec<IndexEntry> = vs.iter().enumerate().map(|(i, v)| IndexEntry::new(format!("c{i}"), v.clone())).collect();
        let params = IvfParams { max_nlist: 12, nprobe: 2 };
        let mut one = IvfIndex::new(params);
        one.insert(entries.clone()).expect("insert");
        let mut many = IvfIndex::new(params);
        for batch in entries.chunks(25) {
            many.insert(batch.to_vec()).expect("insert");
        }
        for q in vectors(95, 16).into_iter().skip(90) {
            assert_eq!(one.search(&q, 7).expect("one"), many.search(&q, 7).expect("many"));
        }
    }

    #[test]
    fn empty_ivf_fails() {
        assert!(matches!(IvfIndex::new(IvfParams::default()).search(&[0.0; 4], 3), Err(Error::EmptyIndex)));
    }
}
