use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use super::{DescriptorMatcher, DistanceNorm};
use crate::detected_points::Match;
use crate::error::{BenchError, Result};
use crate::types::DescriptorMatrix;

pub fn hamming(a: &[u8], b: &[u8]) -> u32 {
    a.iter().zip(b).map(|(x, y)| (x ^ y).count_ones()).sum()
}

pub fn l2_squared(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn check_inputs(query: &DescriptorMatrix, train: &DescriptorMatrix, norm: DistanceNorm) -> Result<()> {
    if !norm.fits(query.output_type()) || !norm.fits(train.output_type()) {
        return Err(BenchError::IncomparableDescriptors {
            norm,
            query: query.output_type(),
            train: train.output_type(),
        });
    }
    if query.width() != train.width() {
        return Err(BenchError::DescriptorWidthMismatch {
            query: query.width(),
            train: train.width(),
        });
    }
    Ok(())
}

/// Distance between query row `q` and train row `t`. Inputs must have
/// passed `check_inputs`.
fn row_distance(query: &DescriptorMatrix, q: usize, train: &DescriptorMatrix, t: usize) -> f32 {
    match (query, train) {
        (DescriptorMatrix::Binary { .. }, DescriptorMatrix::Binary { .. }) => {
            match (query.binary_row(q), train.binary_row(t)) {
                (Some(a), Some(b)) => hamming(a, b) as f32,
                _ => f32::INFINITY,
            }
        }
        _ => match (query.float_row(q), train.float_row(t)) {
            (Some(a), Some(b)) => l2_squared(a, b).sqrt(),
            _ => f32::INFINITY,
        },
    }
}

/// The `k` best candidates seen so far, ascending by distance. Equal
/// distances keep insertion order.
struct TopK {
    k: usize,
    items: Vec<Match>,
}

impl TopK {
    fn new(k: usize) -> TopK {
        TopK {
            k,
            items: Vec::with_capacity(k + 1),
        }
    }

    fn push(&mut self, m: Match) {
        if self.k == 0 || (self.items.len() == self.k && m.distance >= self.worst()) {
            return;
        }
        let pos = self.items.partition_point(|x| x.distance <= m.distance);
        self.items.insert(pos, m);
        self.items.truncate(self.k);
    }

    fn worst(&self) -> f32 {
        self.items.last().map_or(f32::INFINITY, |m| m.distance)
    }

    fn is_full(&self) -> bool {
        self.items.len() == self.k
    }
}

/// Exhaustive nearest-neighbour search.
#[derive(Debug, Clone, Copy, Default)]
pub struct BruteForceMatcher;

impl DescriptorMatcher for BruteForceMatcher {
    fn knn_match(
        &self,
        query: &DescriptorMatrix,
        train: &DescriptorMatrix,
        k: usize,
        norm: DistanceNorm,
    ) -> Result<Vec<Vec<Match>>> {
        check_inputs(query, train, norm)?;
        Ok((0..query.rows())
            .map(|q| {
                let mut top = TopK::new(k);
                for t in 0..train.rows() {
                    top.push(Match::new(q, t, row_distance(query, q, train, t)));
                }
                top.items
            })
            .collect())
    }
}

/// Approximate search: locality-sensitive hashing for binary descriptors,
/// best-bin-first kd-tree for float descriptors.
#[derive(Debug, Clone)]
pub struct IndexedMatcher {
    /// Number of LSH hash tables.
    pub tables: usize,
    /// Bits sampled per LSH key.
    pub key_bits: usize,
    /// Probe keys at Hamming distance 1 from the query key as well.
    pub multi_probe: bool,
    /// Maximum number of train rows compared per query in the kd-tree.
    pub max_checks: usize,
    pub leaf_size: usize,
    pub seed: u64,
}

impl Default for IndexedMatcher {
    fn default() -> Self {
        Self {
            tables: 6,
            key_bits: 12,
            multi_probe: true,
            max_checks: 64,
            leaf_size: 8,
            seed: 0x1d_e7ab,
        }
    }
}

impl DescriptorMatcher for IndexedMatcher {
    fn knn_match(
        &self,
        query: &DescriptorMatrix,
        train: &DescriptorMatrix,
        k: usize,
        norm: DistanceNorm,
    ) -> Result<Vec<Vec<Match>>> {
        check_inputs(query, train, norm)?;
        Ok(match train {
            DescriptorMatrix::Binary { .. } => self.lsh_knn(query, train, k),
            DescriptorMatrix::Float { .. } => self.kd_knn(query, train, k),
        })
    }
}

struct LshTable {
    bits: Vec<usize>,
    buckets: HashMap<u32, Vec<usize>>,
}

impl LshTable {
    fn key(&self, row: &[u8]) -> u32 {
        self.bits.iter().enumerate().fold(0u32, |key, (i, &bit)| {
            if row[bit / 8] & (1 << (bit % 8)) != 0 {
                key | (1 << i)
            } else {
                key
            }
        })
    }
}

impl IndexedMatcher {
    fn lsh_knn(&self, query: &DescriptorMatrix, train: &DescriptorMatrix, k: usize) -> Vec<Vec<Match>> {
        let total_bits = train.width() * 8;
        let key_bits = self.key_bits.min(total_bits).min(32);
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let tables: Vec<LshTable> = (0..self.tables)
            .map(|_| {
                let mut table = LshTable {
                    bits: rand::seq::index::sample(&mut rng, total_bits, key_bits).into_vec(),
                    buckets: HashMap::new(),
                };
                for t in 0..train.rows() {
                    if let Some(row) = train.binary_row(t) {
                        let key = table.key(row);
                        table.buckets.entry(key).or_default().push(t);
                    }
                }
                table
            })
            .collect();

        let mut seen = vec![false; train.rows()];
        (0..query.rows())
            .map(|q| {
                let Some(row) = query.binary_row(q) else {
                    return Vec::new();
                };
                let mut candidates = Vec::new();
                for table in &tables {
                    let key = table.key(row);
                    let probes = if self.multi_probe { key_bits } else { 0 };
                    let keys = std::iter::once(key).chain((0..probes).map(|b| key ^ (1 << b)));
                    for probe in keys {
                        for &t in table.buckets.get(&probe).into_iter().flatten() {
                            if !seen[t] {
                                seen[t] = true;
                                candidates.push(t);
                            }
                        }
                    }
                }
                candidates.sort_unstable();
                let mut top = TopK::new(k);
                for &t in &candidates {
                    seen[t] = false;
                    top.push(Match::new(q, t, row_distance(query, q, train, t)));
                }
                // too few bucket hits: scan so the query still gets min(k, rows) candidates
                if top.items.len() < k.min(train.rows()) {
                    top = TopK::new(k);
                    for t in 0..train.rows() {
                        top.push(Match::new(q, t, row_distance(query, q, train, t)));
                    }
                }
                top.items
            })
            .collect()
    }

    fn kd_knn(&self, query: &DescriptorMatrix, train: &DescriptorMatrix, k: usize) -> Vec<Vec<Match>> {
        let DescriptorMatrix::Float { dims, data } = train else {
            return Vec::new();
        };
        let tree = KdTree::build(data, *dims, self.leaf_size.max(1));
        (0..query.rows())
            .map(|q| match query.float_row(q) {
                Some(row) => tree.search(row, q, k, self.max_checks),
                None => Vec::new(),
            })
            .collect()
    }
}

enum KdNode {
    Leaf { start: usize, end: usize },
    Split { dim: usize, value: f32, left: usize, right: usize },
}

struct KdTree<'a> {
    data: &'a [f32],
    dims: usize,
    indices: Vec<usize>,
    nodes: Vec<KdNode>,
}

/// Min-heap entry on the lower distance bound of a subtree.
struct Branch {
    bound: f32,
    node: usize,
}

impl PartialEq for Branch {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Branch {}

impl PartialOrd for Branch {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Branch {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .bound
            .total_cmp(&self.bound)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl<'a> KdTree<'a> {
    fn build(data: &'a [f32], dims: usize, leaf_size: usize) -> KdTree<'a> {
        let rows = if dims == 0 { 0 } else { data.len() / dims };
        let mut tree = KdTree {
            data,
            dims,
            indices: (0..rows).collect(),
            nodes: Vec::new(),
        };
        if rows > 0 {
            tree.build_node(0, rows, leaf_size);
        }
        tree
    }

    fn value(&self, row: usize, dim: usize) -> f32 {
        self.data[row * self.dims + dim]
    }

    fn row(&self, row: usize) -> &[f32] {
        &self.data[row * self.dims..(row + 1) * self.dims]
    }

    fn build_node(&mut self, start: usize, end: usize, leaf_size: usize) -> usize {
        let id = self.nodes.len();
        if end - start <= leaf_size {
            self.nodes.push(KdNode::Leaf { start, end });
            return id;
        }
        // split on the dimension with the largest variance
        let n = (end - start) as f32;
        let dim = (0..self.dims)
            .map(|d| {
                let (sum, sq) = self.indices[start..end].iter().fold((0.0f32, 0.0f32), |(s, q), &i| {
                    let v = self.value(i, d);
                    (s + v, q + v * v)
                });
                let mean = sum / n;
                (d, sq / n - mean * mean)
            })
            .max_by(|a, b| a.1.total_cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
            .map_or(0, |(d, _)| d);

        let mid = start + (end - start) / 2;
        let data = self.data;
        let dims = self.dims;
        self.indices[start..end]
            .select_nth_unstable_by(mid - start, |&a, &b| {
                data[a * dims + dim].total_cmp(&data[b * dims + dim])
            });
        let value = self.value(self.indices[mid], dim);

        self.nodes.push(KdNode::Leaf { start, end });
        let left = self.build_node(start, mid, leaf_size);
        let right = self.build_node(mid, end, leaf_size);
        self.nodes[id] = KdNode::Split {
            dim,
            value,
            left,
            right,
        };
        id
    }

    fn search(&self, q: &[f32], query_idx: usize, k: usize, max_checks: usize) -> Vec<Match> {
        // squared distances inside, converted on the way out
        let mut top = TopK::new(k);
        if self.nodes.is_empty() || k == 0 {
            return Vec::new();
        }
        let mut heap = BinaryHeap::new();
        heap.push(Branch { bound: 0.0, node: 0 });
        let mut checks = 0;
        while let Some(Branch { bound, mut node }) = heap.pop() {
            if top.is_full() && bound >= top.worst() {
                break;
            }
            if checks >= max_checks && top.is_full() {
                break;
            }
            loop {
                match self.nodes[node] {
                    KdNode::Split {
                        dim,
                        value,
                        left,
                        right,
                    } => {
                        let diff = q[dim] - value;
                        let (near, far) = if diff < 0.0 { (left, right) } else { (right, left) };
                        heap.push(Branch {
                            bound: bound.max(diff * diff),
                            node: far,
                        });
                        node = near;
                    }
                    KdNode::Leaf { start, end } => {
                        for &t in &self.indices[start..end] {
                            top.push(Match::new(query_idx, t, l2_squared(q, self.row(t))));
                        }
                        checks += end - start;
                        break;
                    }
                }
            }
        }
        let mut items = top.items;
        items.iter_mut().for_each(|m| m.distance = m.distance.sqrt());
        items
    }
}
