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

//! An exhaustive index over the same clouds and metrics as the ball tree. It answers the same
//! queries with the same filters, and is what the tree is checked against.
//!
//! The similarity graph is computed blockwise. Each pair of blocks is visited once and every
//! distance found is offered to both of its endpoints, so the metric is evaluated on each
//! unordered pair exactly once.

use crate::errors::*;
use crate::index::query_tools::{CandidateSet, QueryParameters};
use crate::query_interface::{NeighborLists, NeighborTable};
use log::{debug, info};
use pointcloud::*;
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;

/// Scans every reference point for every query.
#[derive(Debug)]
pub struct BruteForceIndex<D: PointCloud, M: Metric> {
    point_cloud: Arc<D>,
    metric: M,
    block_size: usize,
}

impl<D: PointCloud, M: Metric> BruteForceIndex<D, M> {
    /// Wraps a cloud, checking its rows.
    pub fn new(point_cloud: Arc<D>, metric: M) -> BallTreeResult<BruteForceIndex<D, M>> {
        point_cloud.validate_rows()?;
        Ok(BruteForceIndex {
            point_cloud,
            metric,
            block_size: 256,
        })
    }

    /// Rows per block of the similarity graph, at least 1.
    pub fn set_block_size(&mut self, x: usize) -> &mut Self {
        self.block_size = x.max(1);
        self
    }

    /// The indexed cloud
    pub fn point_cloud(&self) -> &Arc<D> {
        &self.point_cloud
    }

    /// The metric
    pub fn metric(&self) -> &M {
        &self.metric
    }

    fn kstar(&self, k: Option<usize>) -> Option<usize> {
        k.map(|k| k.min(self.point_cloud.len()))
    }

    fn check_query(&self, point: PointRef) -> BallTreeResult<()> {
        if self.point_cloud.is_empty() {
            return Ok(());
        }
        Ok(check_row(
            point,
            self.point_cloud.is_sparse(),
            self.point_cloud.dim(),
        )?)
    }

    /// The neighbors of a row, closest first.
    pub fn query_point(
        &self,
        point: PointRef,
        query_index: Option<PointIndex>,
        params: &QueryParameters,
    ) -> BallTreeResult<Vec<(f32, PointIndex)>> {
        params.validate()?;
        self.check_query(point)?;
        self.scan(point, query_index, params)
    }

    fn scan(
        &self,
        point: PointRef,
        query_index: Option<PointIndex>,
        params: &QueryParameters,
    ) -> BallTreeResult<Vec<(f32, PointIndex)>> {
        let candidates = CandidateSet::new(
            query_index,
            self.kstar(params.k),
            params.radius,
            params.include_self_edges,
        );
        if candidates.k() == Some(0) {
            return Ok(Vec::new());
        }
        let references = self.point_cloud.reference_indexes();
        let distances = self
            .point_cloud
            .distances_to_point(&self.metric, point, &references)?;
        for (reference, distance) in references.into_iter().zip(distances) {
            if !distance.is_finite() {
                return Err(BallTreeError::NonFiniteDistance {
                    reference,
                    other: query_index,
                    distance,
                });
            }
            candidates.evaluate_point(distance, reference);
        }
        Ok(candidates.into_sorted())
    }

    /// The neighbors of every row of `queries`. Query row `i` is treated as reference point `i`
    /// when self edges are excluded.
    pub fn query_indexes<Q: PointCloud>(
        &self,
        queries: &Q,
        params: &QueryParameters,
    ) -> BallTreeResult<NeighborLists> {
        params.validate()?;
        for i in 0..queries.len() {
            self.check_query(queries.point(i)?)?;
        }
        (0..queries.len())
            .into_par_iter()
            .map(|i| self.scan(queries.point(i)?, Some(i), params))
            .collect()
    }

    /// All to all neighbors of the reference rows.
    pub fn similarity_graph_indexes(&self, params: &QueryParameters) -> BallTreeResult<NeighborLists> {
        params.validate()?;
        let start = Instant::now();
        let num_points = self.point_cloud.len();
        let kstar = self.kstar(params.k);
        let candidates: Vec<CandidateSet> = (0..num_points)
            .map(|i| CandidateSet::new(Some(i), kstar, params.radius, params.include_self_edges))
            .collect();
        if kstar == Some(0) || num_points == 0 {
            return Ok(candidates.into_iter().map(|c| c.into_sorted()).collect());
        }

        let num_blocks = (num_points + self.block_size - 1) / self.block_size;
        let block_pairs: Vec<(usize, usize)> = (0..num_blocks)
            .flat_map(|bi| (bi..num_blocks).map(move |bj| (bi, bj)))
            .collect();
        debug!(
            "similarity graph over {} points in {} block pairs",
            num_points,
            block_pairs.len()
        );
        block_pairs
            .into_par_iter()
            .try_for_each(|(bi, bj)| self.visit_block_pair(bi, bj, &candidates))?;

        info!(
            "brute force similarity graph over {} points took {:?}",
            num_points,
            start.elapsed()
        );
        Ok(candidates.into_iter().map(|c| c.into_sorted()).collect())
    }

    fn block(&self, b: usize) -> std::ops::Range<usize> {
        let start = b * self.block_size;
        start..(start + self.block_size).min(self.point_cloud.len())
    }

    fn visit_block_pair(
        &self,
        bi: usize,
        bj: usize,
        candidates: &[CandidateSet],
    ) -> BallTreeResult<()> {
        for row in self.block(bi) {
            let row_point = self.point_cloud.point(row)?;
            let columns = self.block(bj);
            // within a block only the upper triangle and the diagonal are visited
            let first_column = if bi == bj { row } else { columns.start };
            for column in first_column..columns.end {
                let distance = self.metric.dist(row_point, self.point_cloud.point(column)?)?;
                if !distance.is_finite() {
                    return Err(BallTreeError::NonFiniteDistance {
                        reference: column,
                        other: Some(row),
                        distance,
                    });
                }
                candidates[row].evaluate_point(distance, column);
                if column != row {
                    candidates[column].evaluate_point(distance, row);
                }
            }
        }
        Ok(())
    }
}

impl<D: LabeledCloud, M: Metric> BruteForceIndex<D, M> {
    /// The neighbors of every row of `queries`, by label.
    pub fn query<Q: LabeledCloud>(
        &self,
        queries: &Q,
        params: &QueryParameters,
    ) -> BallTreeResult<NeighborTable> {
        let neighbors = self.query_indexes(queries, params)?;
        NeighborTable::from_neighbors(&neighbors, queries, &*self.point_cloud)
    }

    /// The similarity graph of the reference rows, by label.
    pub fn similarity_graph(&self, params: &QueryParameters) -> BallTreeResult<NeighborTable> {
        let neighbors = self.similarity_graph_indexes(params)?;
        NeighborTable::from_neighbors(&neighbors, &*self.point_cloud, &*self.point_cloud)
    }
}
