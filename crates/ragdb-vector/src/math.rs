use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ragdb_core::error::{Error, Result};
use ragdb_core::types::{IndexEntry, SearchHit};

const UNIT_TOLERANCE: f64 = 1e-6;

/// Scale `v` to unit length.
///
/// Vectors already within `UNIT_TOLERANCE` of unit length are returned
/// unchanged (bit-for-bit), so normalizing twice is a no-op. Zero vectors are
/// returned as-is.
pub fn normalize(v: &[f32]) -> Vec<f32> {
    let norm = v.iter().map(|&x| f64::from(x) * f64::from(x)).sum::<f64>().sqrt();
    if norm == 0.0 || (norm - 1.0).abs() <= UNIT_TOLERANCE {
        return v.to_vec();
    }
    v.iter().map(|&x| (f64::from(x) / norm) as f32).collect()
}

pub fn euclidean(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum::<f32>().sqrt()
}

/// Checks a batch against the index dimension (or fixes it from the first
/// vector) and returns the dimension every vector in the batch has.
pub(crate) fn check_batch(dim: Option<usize>, entries: &[IndexEntry]) -> Result<usize> {
    let expected = match (dim, entries.first()) {
        (Some(d), _) => d,
        (None, Some(first)) => first.vector.len(),
        (None, None) => return Ok(0),
    };
    if expected == 0 {
        return Err(Error::Config("vectors must have at least one component".into()));
    }
    if let Some(bad) = entries.iter().find(|e| e.vector.len() != expected) {
        return Err(Error::Dimension { expected, actual: bad.vector.len() });
    }
    Ok(expected)
}

/// Shared precondition checks for `search`.
pub(crate) fn check_query(dim: Option<usize>, len: usize, query: &[f32], k: usize) -> Result<()> {
    if len == 0 {
        return Err(Error::EmptyIndex);
    }
    if k == 0 {
        return Err(Error::Config("k must be a positive integer".into()));
    }
    match dim {
        Some(d) if d != query.len() => Err(Error::Dimension { expected: d, actual: query.len() }),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    distance: f32,
    position: usize,
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance.total_cmp(&other.distance).then(self.position.cmp(&other.position))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool { self.cmp(other) == Ordering::Equal }
}

impl Eq for Candidate {}

/// Keeps the `k` smallest `(distance, insertion position)` pairs. Callers
/// pass `k` already clamped to the index size.
pub(crate) struct TopK {
    k: usize,
    heap: BinaryHeap<Candidate>,
}

impl TopK {
    pub fn new(k: usize) -> Self {
        Self { k, heap: BinaryHeap::with_capacity(k.saturating_add(1)) }
    }

    pub fn push(&mut self, distance: f32, position: usize) {
        let candidate = Candidate { distance, position };
        if self.heap.len() < self.k {
            self.heap.push(candidate);
        } else if self.heap.peek().is_some_and(|worst| candidate < *worst) {
            self.heap.pop();
            self.heap.push(candidate);
        }
    }

    pub fn into_hits(self, entries: &[IndexEntry]) -> Vec<SearchHit> {
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|c| SearchHit { chunk_id: entries[c.position].chunk_id.clone(), distance: c.distance })
            .collect()
    }
}
