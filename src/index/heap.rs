//! Bounded top-k posting retention per term.
//!
//! spec.md §4.C's posting-cap upgrade (a binding REDESIGN FLAG, see §9):
//! the original "stop appending once the cap is hit" policy is
//! order-dependent and can silently drop a later, higher-weight posting in
//! favor of an earlier, lower-weight one. This keeps at most
//! `MAX_POSTINGS_PER_TERM` postings per term, evicting the minimum-weight
//! entry whenever a larger one arrives.
//!
//! Ordering floats in a `BinaryHeap` needs a total order; `f64::total_cmp`
//! (used the same way in `examples/Xevion-rustdoc-mcp`'s search ranking)
//! avoids pulling in an extra crate just for this.
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::{Posting, MAX_POSTINGS_PER_TERM};

#[derive(Debug, Clone)]
struct MinOrdPosting(Posting);

impl PartialEq for MinOrdPosting {
    fn eq(&self, other: &Self) -> bool {
        self.0.weight == other.0.weight
    }
}
impl Eq for MinOrdPosting {}

impl PartialOrd for MinOrdPosting {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MinOrdPosting {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so that `BinaryHeap` (a max-heap) surfaces the smallest
        // weight at its top, letting us evict the minimum cheaply.
        other.0.weight.total_cmp(&self.0.weight)
    }
}

/// A bounded min-heap of postings for a single term, capped at
/// `MAX_POSTINGS_PER_TERM`.
#[derive(Debug, Default)]
pub struct BoundedPostings {
    heap: BinaryHeap<MinOrdPosting>,
    cap: usize,
}

impl BoundedPostings {
    pub fn new() -> Self {
        Self::with_cap(MAX_POSTINGS_PER_TERM)
    }

    pub fn with_cap(cap: usize) -> Self {
        Self {
            heap: BinaryHeap::new(),
            cap,
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Inserts `posting`, evicting the current minimum-weight entry if the
    /// heap is already at capacity and `posting` outweighs it.
    pub fn push(&mut self, posting: Posting) {
        if self.heap.len() < self.cap {
            self.heap.push(MinOrdPosting(posting));
            return;
        }
        // heap.peek() is the minimum weight currently retained.
        if let Some(min) = self.heap.peek() {
            if posting.weight > min.0.weight {
                self.heap.pop();
                self.heap.push(MinOrdPosting(posting));
            }
        }
    }

    /// Drains the heap into a `Vec<Posting>` sorted by weight descending.
    pub fn into_sorted_vec(self) -> Vec<Posting> {
        let mut postings: Vec<Posting> = self.heap.into_iter().map(|m| m.0).collect();
        postings.sort_by(|a, b| b.weight.total_cmp(&a.weight));
        postings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caps_at_capacity() {
        let mut heap = BoundedPostings::with_cap(3);
        for i in 0..10 {
            heap.push(Posting::new(i.to_string(), i as f64));
        }
        assert_eq!(heap.len(), 3);
        let sorted = heap.into_sorted_vec();
        // only the three largest weights (7, 8, 9) should survive
        assert_eq!(
            sorted.iter().map(|p| p.weight).collect::<Vec<_>>(),
            vec![9.0, 8.0, 7.0]
        );
    }

    #[test]
    fn retains_highest_weights_regardless_of_arrival_order() {
        let mut heap = BoundedPostings::with_cap(2);
        let weights = [5.0, 1.0, 9.0, 2.0, 8.0];
        for (i, w) in weights.iter().enumerate() {
            heap.push(Posting::new(i.to_string(), *w));
        }
        let sorted = heap.into_sorted_vec();
        let min_retained = sorted.last().unwrap().weight;
        // no posting below min_retained should beat anything we kept: the
        // two largest are 9.0 and 8.0, regardless of arrival order.
        assert_eq!(sorted[0].weight, 9.0);
        assert_eq!(sorted[1].weight, 8.0);
        assert!(min_retained >= 8.0);
    }

    #[test]
    fn sorted_output_is_descending() {
        let mut heap = BoundedPostings::with_cap(100);
        for w in [3.0, 1.0, 4.0, 1.5, 5.0, 9.0, 2.6] {
            heap.push(Posting::new(format!("{w}"), w));
        }
        let sorted = heap.into_sorted_vec();
        for pair in sorted.windows(2) {
            assert!(pair[0].weight >= pair[1].weight);
        }
    }
}
