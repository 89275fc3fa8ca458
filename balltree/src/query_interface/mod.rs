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

//! Interfaces that answer many queries at once. The tree is shared behind an `Arc` and the
//! queries are spread over rayon's pool, each with its own candidate set.

use crate::errors::*;
use crate::monitor::*;
use crate::{BallTree, QueryParameters};
use log::info;
use pointcloud::*;
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

mod table;
pub use table::*;

/// Sorted neighbor lists, entry `i` for query row `i`
pub type NeighborLists = Vec<Vec<(f32, PointIndex)>>;

/// Runs bulk queries against a shared tree.
#[derive(Debug)]
pub struct BulkInterface<D: PointCloud, M: Metric> {
    tree: Arc<BallTree<D, M>>,
}

impl<D: PointCloud, M: Metric> Clone for BulkInterface<D, M> {
    fn clone(&self) -> Self {
        BulkInterface {
            tree: Arc::clone(&self.tree),
        }
    }
}

impl<D: PointCloud, M: Metric> BulkInterface<D, M> {
    /// Wraps a tree
    pub fn new(tree: Arc<BallTree<D, M>>) -> Self {
        BulkInterface { tree }
    }

    /// The tree being queried
    pub fn tree(&self) -> &Arc<BallTree<D, M>> {
        &self.tree
    }

    /// The neighbors of every row of `queries`. Query row `i` is treated as reference point `i`
    /// when self edges are excluded.
    pub fn query_indexes<Q: PointCloud>(
        &self,
        queries: &Q,
        params: &QueryParameters,
    ) -> BallTreeResult<NeighborLists> {
        match self.tree.parameters().verbosity {
            0 => self.query_indexes_with(queries, params, &NeverCancel, &NoProgress),
            1 => self.query_indexes_with(queries, params, &NeverCancel, &LogProgress),
            _ => self.query_indexes_with(queries, params, &NeverCancel, &BarProgress::new()),
        }
    }

    /// Same as `query_indexes`. The cancel check is polled before each query; once it fires the
    /// whole batch fails with `Cancelled`.
    pub fn query_indexes_with<Q, C, P>(
        &self,
        queries: &Q,
        params: &QueryParameters,
        cancel: &C,
        progress: &P,
    ) -> BallTreeResult<NeighborLists>
    where
        Q: PointCloud,
        C: CancelCheck,
        P: ProgressSink,
    {
        params.validate()?;
        for i in 0..queries.len() {
            self.tree.check_query(queries.point(i)?)?;
        }

        let start = Instant::now();
        let total = queries.len();
        let report_every = (total / 100).max(1);
        let done = AtomicUsize::new(0);
        let neighbors = (0..total)
            .into_par_iter()
            .map(|i| {
                if cancel.must_cancel() {
                    return Err(BallTreeError::Cancelled);
                }
                let candidates = self.tree.search(queries.point(i)?, Some(i), params)?;
                let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                if finished % report_every == 0 || finished == total {
                    progress.report(
                        Progress::Queries {
                            done: finished,
                            total,
                        },
                        start.elapsed(),
                    );
                }
                Ok(candidates.into_sorted())
            })
            .collect::<BallTreeResult<NeighborLists>>()?;
        info!("answered {} queries in {:?}", total, start.elapsed());
        Ok(neighbors)
    }

    /// Queries the reference rows against themselves
    pub fn similarity_graph_indexes(&self, params: &QueryParameters) -> BallTreeResult<NeighborLists> {
        self.query_indexes(&**self.tree.point_cloud(), params)
    }

    /// Same as `similarity_graph_indexes`, with explicit cancellation and progress reporting.
    pub fn similarity_graph_indexes_with<C: CancelCheck, P: ProgressSink>(
        &self,
        params: &QueryParameters,
        cancel: &C,
        progress: &P,
    ) -> BallTreeResult<NeighborLists> {
        self.query_indexes_with(&**self.tree.point_cloud(), params, cancel, progress)
    }
}

impl<D: LabeledCloud, M: Metric> BulkInterface<D, M> {
    /// The neighbors of every row of `queries`, by label.
    pub fn query<Q: LabeledCloud>(
        &self,
        queries: &Q,
        params: &QueryParameters,
    ) -> BallTreeResult<NeighborTable> {
        let neighbors = self.query_indexes(queries, params)?;
        NeighborTable::from_neighbors(&neighbors, queries, &**self.tree.point_cloud())
    }

    /// The similarity graph of the reference rows, by label.
    pub fn similarity_graph(&self, params: &QueryParameters) -> BallTreeResult<NeighborTable> {
        let references = &**self.tree.point_cloud();
        let neighbors = self.similarity_graph_indexes(params)?;
        NeighborTable::from_neighbors(&neighbors, references, references)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BallTreeBuilder;
    use pointcloud::data_sources::DataRam;
    use pointcloud::label_sources::{Label, LabelColumn};
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn random_tree(count: usize, dim: usize, leaf_size: usize) -> Arc<BallTree<DataRam, L2>> {
        let mut rng = SmallRng::seed_from_u64(11);
        let data: Vec<f32> = (0..count * dim).map(|_| rng.gen::<f32>()).collect();
        let cloud = Arc::new(DataRam::new(data, dim).unwrap());
        let mut builder = BallTreeBuilder::new();
        builder.set_leaf_size(leaf_size);
        Arc::new(builder.build(cloud, L2).unwrap())
    }

    #[test]
    fn bulk_matches_single_queries() {
        let tree = random_tree(300, 3, 10);
        let interface = BulkInterface::new(Arc::clone(&tree));
        let mut rng = SmallRng::seed_from_u64(12);
        let data: Vec<f32> = (0..40 * 3).map(|_| rng.gen::<f32>()).collect();
        let queries = DataRam::new(data, 3).unwrap();
        let params = QueryParameters::knn(7).with_radius(0.4);

        let bulk = interface.query_indexes(&queries, &params).unwrap();
        assert_eq!(bulk.len(), 40);
        for (i, neighbors) in bulk.iter().enumerate() {
            let single = tree
                .query_point(queries.point(i).unwrap(), Some(i), &params)
                .unwrap();
            assert_eq!(neighbors, &single);
        }
    }

    #[test]
    fn similarity_graph_drops_only_self() {
        let tree = random_tree(200, 2, 8);
        let interface = BulkInterface::new(Arc::clone(&tree));
        let without = interface
            .similarity_graph_indexes(&QueryParameters::knn(5).with_self_edges(false))
            .unwrap();
        let with = interface
            .similarity_graph_indexes(&QueryParameters::knn(6))
            .unwrap();
        for (i, (a, b)) in without.iter().zip(with.iter()).enumerate() {
            assert_eq!(a.len(), 5);
            assert!(a.iter().all(|(_, j)| *j != i));
            let b_distances: Vec<f32> = b.iter().filter(|(_, j)| *j != i).map(|(d, _)| *d).collect();
            let a_distances: Vec<f32> = a.iter().map(|(d, _)| *d).collect();
            assert_eq!(a_distances[..], b_distances[..5]);
        }
    }

    #[test]
    fn labeled_similarity_graph() {
        let cloud = SimpleLabeledCloud::new(
            DataRam::new(vec![0.0, 1.0, 3.0], 1).unwrap(),
            LabelColumn::strings(vec!["a", "b", "c"]),
        )
        .unwrap();
        let mut builder = BallTreeBuilder::new();
        builder.set_leaf_size(1);
        let tree = builder.build(Arc::new(cloud), L1).unwrap();
        let interface = BulkInterface::new(Arc::new(tree));
        let table = interface
            .similarity_graph(&QueryParameters::knn(1).with_self_edges(false))
            .unwrap();
        assert_eq!(table.len(), 3);
        let c_label = Label::from("c");
        let c: Vec<&NeighborRow> = table.for_query(&c_label).collect();
        assert_eq!(c[0].neighbor_label, Label::from("b"));
        assert_eq!(c[0].distance, 2.0);
        assert_eq!(c[0].rank, 0);
    }

    #[test]
    fn cancelled_batch_fails() {
        let tree = random_tree(100, 2, 10);
        let interface = BulkInterface::new(tree);
        let flag = CancelFlag::new();
        flag.cancel();
        let result = interface.similarity_graph_indexes_with(
            &QueryParameters::knn(3),
            &flag,
            &NoProgress,
        );
        assert!(matches!(result, Err(BallTreeError::Cancelled)));
    }

    #[test]
    fn non_finite_query_distances_fail() {
        let cloud = Arc::new(
            DataRam::new(vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 10.0, 10.0], 2).unwrap(),
        );
        let mut builder = BallTreeBuilder::new();
        builder.set_leaf_size(2);
        let state = builder.build(Arc::clone(&cloud), L2).unwrap().save();
        let tree = Arc::new(BallTree::load(state, cloud, L2).unwrap());

        let nan_row = [f32::NAN, 0.0];
        for params in &[
            QueryParameters::knn(2),
            QueryParameters::range(5.0),
            QueryParameters::new(),
        ] {
            match tree.query_point(PointRef::Dense(&nan_row), None, params) {
                Err(BallTreeError::NonFiniteDistance { .. }) => {}
                other => panic!("expected a non-finite distance, got {:?}", other),
            }
        }

        let interface = BulkInterface::new(tree);
        let queries = DataRam::new(vec![0.5, 0.5, 1.0, f32::NAN, 0.0, 1.0], 2).unwrap();
        match interface.query_indexes(&queries, &QueryParameters::knn(2)) {
            Err(BallTreeError::NonFiniteDistance { .. }) => {}
            other => panic!("expected a non-finite distance, got {:?}", other),
        }
    }

    #[test]
    fn bad_queries_fail_up_front() {
        let tree = random_tree(50, 2, 10);
        let interface = BulkInterface::new(tree);
        let queries = DataRam::new(vec![0.0; 6], 3).unwrap();
        assert!(interface
            .query_indexes(&queries, &QueryParameters::knn(1))
            .is_err());
        let queries = DataRam::new(vec![0.0; 4], 2).unwrap();
        assert!(interface
            .query_indexes(&queries, &QueryParameters::range(-1.0))
            .is_err());
    }
}
