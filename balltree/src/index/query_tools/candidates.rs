/*
* Licensed to Elasticsearch B.V. under one or more contributor
* license agreements. See the NOTICE file distributed with
* this work for additional information regarding copyright
* ownership. Elasticsearch B.V. licenses this file to you under
* the Apache License, Version 2.0 (the "License"); you may
* not use this file except in compliance with the License.
* You may obtain a copy of the License at
*
*  http://www.apache.org/licenses/LICENSE-2.0
*
* Unless required by applicable law or agreed to in writing,
* software distributed under the License is distributed on an
* "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
* KIND, either express or implied.  See the License for the
* specific language governing permissions and limitations
* under the License.
*/

use super::query_items::QuerySingleton;
use pointcloud::PointIndex;
use std::collections::BinaryHeap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// The neighbors found so far for one query. With a `k` bound this is a max-heap of at most `k`
/// candidates, otherwise it keeps everything that passes the radius and self edge filters.
///
/// Candidates sit behind a lock so that several threads can offer points for the same query,
/// which is what the symmetric brute force similarity graph does.
#[derive(Debug)]
pub struct CandidateSet {
    query_index: Option<PointIndex>,
    k: Option<usize>,
    radius: Option<f32>,
    include_self_edges: bool,
    dist_heap: Mutex<BinaryHeap<QuerySingleton>>,
}

impl CandidateSet {
    /// An empty set for a query. `query_index` is the query's own reference index, if it has one,
    /// and is what self edges are detected with.
    pub fn new(
        query_index: Option<PointIndex>,
        k: Option<usize>,
        radius: Option<f32>,
        include_self_edges: bool,
    ) -> CandidateSet {
        let capacity = k.map(|k| k.min(1024)).unwrap_or(0);
        CandidateSet {
            query_index,
            k,
            radius,
            include_self_edges,
            dist_heap: Mutex::new(BinaryHeap::with_capacity(capacity)),
        }
    }

    fn heap(&self) -> MutexGuard<'_, BinaryHeap<QuerySingleton>> {
        self.dist_heap.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The neighbor cap
    pub fn k(&self) -> Option<usize> {
        self.k
    }

    /// The radius bound
    pub fn radius(&self) -> Option<f32> {
        self.radius
    }

    /// Offers a reference point at distance `dist`. It is kept if it passes the self edge and
    /// radius filters and, when full, is strictly closer than the current worst candidate, which
    /// it then replaces.
    pub fn evaluate_point(&self, dist: f32, ref_index: PointIndex) {
        if self.k == Some(0) {
            return;
        }
        if !self.include_self_edges && self.query_index == Some(ref_index) {
            return;
        }
        if let Some(radius) = self.radius {
            if !(dist < radius) {
                return;
            }
        }
        let mut heap = self.heap();
        match self.k {
            Some(k) if heap.len() >= k => {
                if let Some(mut worst) = heap.peek_mut() {
                    if dist < worst.dist {
                        *worst = QuerySingleton::new(ref_index, dist);
                    }
                }
            }
            _ => heap.push(QuerySingleton::new(ref_index, dist)),
        }
    }

    /// Number of candidates held
    pub fn len(&self) -> usize {
        self.heap().len()
    }

    /// If nothing has been kept yet
    pub fn is_empty(&self) -> bool {
        self.heap().is_empty()
    }

    /// The distance of the worst candidate, `None` while empty
    pub fn max_dist(&self) -> Option<f32> {
        self.heap().peek().map(|s| s.dist)
    }

    /// The number of candidates and the worst distance, read under one lock.
    pub fn occupancy(&self) -> (usize, Option<f32>) {
        let heap = self.heap();
        (heap.len(), heap.peek().map(|s| s.dist))
    }

    /// Unpacks the candidates, closest first. Ties are broken by index.
    pub fn into_sorted(self) -> Vec<(f32, PointIndex)> {
        self.dist_heap
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .into_sorted_vec()
            .into_iter()
            .map(|s| (s.dist, s.index))
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn unpacking_has_correct_order() {
        let candidates = CandidateSet::new(None, None, None, true);
        for (i, d) in [0.5, 0.1, 0.3, 0.1, 0.9].iter().enumerate() {
            candidates.evaluate_point(*d, i);
        }
        assert_eq!(candidates.len(), 5);
        assert_eq!(candidates.max_dist(), Some(0.9));
        let sorted = candidates.into_sorted();
        let indexes: Vec<PointIndex> = sorted.iter().map(|(_, i)| *i).collect();
        assert_eq!(indexes, vec![1, 3, 2, 0, 4]);
    }

    #[test]
    fn k_bound_keeps_the_closest() {
        let candidates = CandidateSet::new(None, Some(2), None, true);
        candidates.evaluate_point(3.0, 0);
        candidates.evaluate_point(1.0, 1);
        assert_eq!(candidates.max_dist(), Some(3.0));
        candidates.evaluate_point(2.0, 2);
        assert_eq!(candidates.occupancy(), (2, Some(2.0)));
        // a tie with the worst does not replace it
        candidates.evaluate_point(2.0, 3);
        candidates.evaluate_point(5.0, 4);
        assert_eq!(candidates.into_sorted(), vec![(1.0, 1), (2.0, 2)]);
    }

    #[test]
    fn radius_is_strict() {
        let candidates = CandidateSet::new(None, None, Some(1.0), true);
        candidates.evaluate_point(0.5, 0);
        candidates.evaluate_point(1.0, 1);
        candidates.evaluate_point(f32::INFINITY, 2);
        assert_eq!(candidates.into_sorted(), vec![(0.5, 0)]);
    }

    #[test]
    fn self_edges() {
        let excluding = CandidateSet::new(Some(4), None, None, false);
        excluding.evaluate_point(0.0, 4);
        excluding.evaluate_point(0.0, 5);
        assert_eq!(excluding.into_sorted(), vec![(0.0, 5)]);

        let including = CandidateSet::new(Some(4), None, None, true);
        including.evaluate_point(0.0, 4);
        assert_eq!(including.len(), 1);

        // A query that is not a reference point has nothing to exclude
        let outside = CandidateSet::new(None, None, None, false);
        outside.evaluate_point(0.0, 4);
        assert_eq!(outside.len(), 1);
    }

    #[test]
    fn zero_k_holds_nothing() {
        let candidates = CandidateSet::new(None, Some(0), None, true);
        candidates.evaluate_point(0.0, 0);
        assert!(candidates.is_empty());
        assert_eq!(candidates.max_dist(), None);
    }

    #[test]
    fn concurrent_offers() {
        let candidates = CandidateSet::new(None, Some(10), None, true);
        (0..1000usize).into_par_iter().for_each(|i| {
            candidates.evaluate_point(((i * 7919) % 1000) as f32, i);
        });
        let sorted = candidates.into_sorted();
        assert_eq!(sorted.len(), 10);
        for (j, (d, _)) in sorted.iter().enumerate() {
            assert_eq!(*d, j as f32);
        }
    }
}
