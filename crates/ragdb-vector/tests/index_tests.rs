use ragdb_core::config::{IndexKind, IngestSettings};
use ragdb_core::traits::VectorIndex;
use ragdb_core::types::{Chunk, IndexEntry};
use ragdb_core::Error;
use ragdb_vector::{new_index, read_records, write_records, PersistedRecord};

fn raw_vectors(n: usize, dim: usize) -> Vec<Vec<f32>> {
    (0..n)
        .map(|i| (0..dim).map(|j| (((i * 31 + j * 17) % 23) as f32 - 11.0) * (1.0 + i as f32 * 0.05)).collect())
        .collect()
}

fn chunk_for(i: usize) -> Chunk {
    Chunk {
        id: format!("doc{}:{}", i / 4, i % 4),
        source_document_id: format!("doc{}", i / 4),
        chunk_index: i % 4,
        start_offset: (i % 4) * 450,
        end_offset: (i % 4) * 450 + 500,
        text: format!("chunk number {i}"),
    }
}

fn populate(kind: IndexKind, n: usize) -> Box<dyn VectorIndex> {
    let settings = IngestSettings { index_kind: kind, nlist: 8, nprobe: 2, ..IngestSettings::default() };
    let mut index = new_index(&settings);
    let entries: Vec<IndexEntry> = raw_vectors(n, 12).into_iter().enumerate().map(|(i, v)| IndexEntry::new(chunk_for(i).id, v)).collect();
    // two batches to exercise append
    let (a, b) = entries.split_at(n / 2);
    index.insert(a.to_vec()).expect("insert a");
    index.insert(b.to_vec()).expect("insert b");
    index
}

#[test]
fn persisted_round_trip_reproduces_search() {
    for kind in [IndexKind::Flat, IndexKind::Ivf] {
        let index = populate(kind, 40);
        let records: Vec<PersistedRecord> = index.entries().iter().enumerate().map(|(i, e)| PersistedRecord::from_parts(e, &chunk_for(i))).collect();

        let tmp = tempfile::tempdir().expect("tmp");
        let path = tmp.path().join("index.jsonl");
        write_records(&path, &records).expect("write");

        let settings = IngestSettings { index_kind: kind, nlist: 8, nprobe: 2, ..IngestSettings::default() };
        let mut restored = new_index(&settings);
        let loaded = read_records(&path).expect("read");
        restored.insert(loaded.into_iter().map(|r| r.into_parts().0).collect()).expect("reinsert");

        for q in raw_vectors(5, 12).into_iter().map(|v| v.into_iter().map(|x| -x * 0.5).collect::<Vec<f32>>()) {
            for k in [1, 3, 40] {
                assert_eq!(index.search(&q, k).expect("orig"), restored.search(&q, k).expect("restored"), "kind={kind:?} k={k}");
            }
        }
    }
}

#[test]
fn search_length_is_min_k_n() {
    for kind in [IndexKind::Flat, IndexKind::Ivf] {
        let index = populate(kind, 10);
        let q = raw_vectors(1, 12).remove(0);
        for k in 1..15 {
            let hits = index.search(&q, k).expect("search");
            assert_eq!(hits.len(), k.min(10));
            assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
        }
    }
}

#[test]
fn empty_index_of_any_kind_fails() {
    for kind in [IndexKind::Flat, IndexKind::Ivf] {
        let index = new_index(&IngestSettings { index_kind: kind, ..IngestSettings::default() });
        assert!(matches!(index.search(&[1.0, 2.0], 1), Err(Error::EmptyIndex)));
    }
}

#[test]
fn huge_k_returns_every_entry() {
    for kind in [IndexKind::Flat, IndexKind::Ivf] {
        let index = populate(kind, 10);
        let q = raw_vectors(1, 12).remove(0);
        for k in [usize::MAX, 1 << 60] {
            let hits = index.search(&q, k).expect("search");
            assert_eq!(hits.len(), 10, "kind={kind:?}");
            assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
        }
    }
}
