//! Per-layer vertex ordering minimising edge crossings.
//!
//! Median sweeps alternating direction plus adjacent-pair transposition,
//! iterated up to 24 rounds, keeping the best ordering seen. Crossing counts
//! use merge-and-count inversion counting. The initial order is a seeded
//! shuffle, and ties stay randomised by re-shuffling before every stable
//! re-sort.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use selkie_graph::{GraphRead, NodeAttribute, NodeId};

const MAX_ITERATIONS: usize = 24;

/// Computes a per-layer order (dense 0..k within each layer).
pub fn vertex_ordering(
    g: &impl GraphRead,
    layers: &NodeAttribute<usize>,
    layer_count: usize,
    seed: u64,
) -> NodeAttribute<usize> {
    let mut node_layers: Vec<Vec<NodeId>> = vec![Vec::new(); layer_count];
    for n in g.node_ids() {
        node_layers[layers.value(n)].push(n);
    }

    let mut state = Ordering {
        g,
        layers,
        orders: NodeAttribute::new(g.max_node_id(), usize::MAX),
        node_layers,
        rng: StdRng::seed_from_u64(seed),
    };

    state.normalize_order();

    let mut best = state.orders.clone();
    let mut crossings = usize::MAX;

    for iteration in 0..MAX_ITERATIONS {
        state.median(iteration);
        state.normalize_order();
        state.transpose();

        let now = state.count_crossings();
        if now < crossings {
            best = state.orders.clone();
            crossings = now;
            if now == 0 {
                break;
            }
        }
    }

    tracing::trace!(crossings, "vertex ordering settled");
    best
}

struct Ordering<'a, G: GraphRead> {
    g: &'a G,
    layers: &'a NodeAttribute<usize>,
    orders: NodeAttribute<usize>,
    node_layers: Vec<Vec<NodeId>>,
    rng: StdRng,
}

impl<G: GraphRead> Ordering<'_, G> {
    /// Re-normalises orders to dense per-layer positions. The shuffle before
    /// the stable sort keeps ties random between rounds.
    fn normalize_order(&mut self) {
        for nodes in &mut self.node_layers {
            nodes.shuffle(&mut self.rng);
            nodes.sort_by_key(|&n| self.orders.value(n));

            for (position, &n) in nodes.iter().enumerate() {
                self.orders.set(n, position);
            }
        }
    }

    fn median(&mut self, iteration: usize) {
        let downward = iteration % 2 == 0;
        for layer in &self.node_layers {
            for &node in layer {
                let mut neighbor_orders: Vec<usize> = if downward {
                    self.g
                        .child_nodes(node)
                        .into_iter()
                        .map(|c| self.orders.value(c))
                        .collect()
                } else {
                    self.g
                        .parent_nodes(node)
                        .into_iter()
                        .map(|p| self.orders.value(p))
                        .collect()
                };

                if !neighbor_orders.is_empty() {
                    neighbor_orders.sort_unstable();
                    self.orders
                        .set(node, neighbor_orders[neighbor_orders.len() / 2]);
                }
            }
        }
    }

    fn neighbor_orders(&self, n: NodeId) -> (Vec<usize>, Vec<usize>) {
        let mut top: Vec<usize> = self
            .g
            .parent_nodes(n)
            .into_iter()
            .map(|p| self.orders.value(p))
            .collect();
        let mut bottom: Vec<usize> = self
            .g
            .child_nodes(n)
            .into_iter()
            .map(|c| self.orders.value(c))
            .collect();
        top.sort_unstable();
        bottom.sort_unstable();
        (top, bottom)
    }

    /// Pairwise crossings with `n1` ordered before `n2`.
    fn count_crossings_pair(&self, n1: NodeId, n2: NodeId) -> usize {
        let (top1, bottom1) = self.neighbor_orders(n1);
        let (top2, bottom2) = self.neighbor_orders(n2);
        merge_count(&top1, &top2) + merge_count(&bottom1, &bottom2)
    }

    fn count_crossings_between(&self, l1: usize, l2: usize) -> usize {
        let layer = &self.node_layers[l1];
        if layer.len() <= 1 {
            return 0;
        }

        let mut orders: Vec<usize> = Vec::new();
        let mut neighbors: Vec<usize> = Vec::new();
        for &node in layer {
            neighbors.clear();
            for other in self.g.neighbors(node) {
                if self.layers.value(other) == l2 {
                    neighbors.push(self.orders.value(other));
                }
            }
            neighbors.sort_unstable();
            orders.extend_from_slice(&neighbors);
        }

        count_inversions(&mut orders)
    }

    fn count_crossings(&self) -> usize {
        let mut crossings = 0;
        for l in 0..self.node_layers.len().saturating_sub(1) {
            crossings += self.count_crossings_between(l, l + 1);
        }
        crossings
    }

    /// Swaps adjacent pairs while a swap strictly improves somewhere.
    fn transpose(&mut self) {
        let mut improved = true;
        while improved {
            improved = false;
            for layer_ix in 0..self.node_layers.len() {
                if self.node_layers[layer_ix].is_empty() {
                    continue;
                }
                for i in 0..self.node_layers[layer_ix].len() - 1 {
                    let v = self.node_layers[layer_ix][i];
                    let w = self.node_layers[layer_ix][i + 1];

                    let current = self.count_crossings_pair(v, w);
                    let swapped = self.count_crossings_pair(w, v);

                    if swapped <= current {
                        if swapped < current {
                            improved = true;
                        }
                        self.orders.set(v, i + 1);
                        self.orders.set(w, i);
                        self.node_layers[layer_ix].swap(i, i + 1);
                    }
                }
            }
        }
    }
}

/// Inversions between two sorted runs (pairs `lo[i] > hi[j]`).
fn merge_count(lo: &[usize], hi: &[usize]) -> usize {
    let mut inversions = 0;
    let mut i = 0;
    let mut j = 0;

    while i < lo.len() && j < hi.len() {
        if lo[i] > hi[j] {
            j += 1;
            inversions += lo.len() - i;
        } else {
            i += 1;
        }
    }

    inversions
}

/// Total inversions via bottom-up merge sort.
fn count_inversions(arr: &mut [usize]) -> usize {
    let len = arr.len();
    let mut buf = vec![0usize; len];
    let mut inversions = 0;
    let mut width = 1;

    while width < len {
        let mut lo = 0;
        while lo + width < len {
            let mid = lo + width;
            let hi = (lo + 2 * width).min(len);

            let (mut i, mut j, mut k) = (lo, mid, lo);
            while i < mid && j < hi {
                if arr[i] <= arr[j] {
                    buf[k] = arr[i];
                    i += 1;
                } else {
                    buf[k] = arr[j];
                    j += 1;
                    inversions += mid - i;
                }
                k += 1;
            }
            while i < mid {
                buf[k] = arr[i];
                i += 1;
                k += 1;
            }
            while j < hi {
                buf[k] = arr[j];
                j += 1;
                k += 1;
            }

            arr[lo..hi].copy_from_slice(&buf[lo..hi]);
            lo = hi;
        }
        width *= 2;
    }

    inversions
}

#[cfg(test)]
mod tests {
    use super::{count_inversions, merge_count};

    #[test]
    fn merge_count_counts_pairwise_inversions() {
        assert_eq!(merge_count(&[0, 1], &[2, 3]), 0);
        assert_eq!(merge_count(&[2, 3], &[0, 1]), 4);
        assert_eq!(merge_count(&[1, 3], &[2]), 1);
        assert_eq!(merge_count(&[], &[1, 2]), 0);
    }

    #[test]
    fn count_inversions_matches_bubble_distance() {
        assert_eq!(count_inversions(&mut [0, 1, 2, 3]), 0);
        assert_eq!(count_inversions(&mut [3, 2, 1, 0]), 6);
        assert_eq!(count_inversions(&mut [1, 0, 3, 2]), 2);
        assert_eq!(count_inversions(&mut [2, 0, 1]), 2);
        assert_eq!(count_inversions(&mut []), 0);
    }
}
