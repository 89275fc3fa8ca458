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

//! # The Ball Tree Data Structure
//! The built tree is immutable. It is a flat array of balls laid out as an implicit complete binary
//! tree, the leaf every reference point landed in, and the reference points regrouped by leaf so
//! that visiting a leaf only touches its own points.
//!
//! Queries walk the tree depth first with an explicit stack. A node is opened only when its ball
//! could still hold a point that the query would keep, see [`activate_query_node`]. Every query
//! owns its candidate set and its stack, so queries can run in parallel over a shared tree.

use super::node::*;
use super::query_tools::{CandidateSet, QueryParameters};
use crate::errors::*;
use crate::tree_file_format::TreeState;
use pointcloud::*;

use std::sync::Arc;
use std::time::Duration;

/// Container for the parameters governing the construction of the ball tree
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BallTreeParameters {
    /// The maximum number of points a leaf should hold. After automatic sizing, never 0.
    pub leaf_size: usize,
    /// Number of levels of the tree. A tree with a single leaf has depth 1.
    pub tree_depth: usize,
    /// If this is greater than 1 builds and bulk queries draw a progress bar,
    /// if it is 1 they log their progress.
    pub verbosity: u32,
}

/// A short description of a built tree
#[derive(Debug, Clone, PartialEq)]
pub struct TreeSummary {
    /// Number of reference points
    pub num_points: usize,
    /// Dimension of the reference points
    pub dim: usize,
    /// Leaf size after automatic sizing
    pub leaf_size: usize,
    /// Number of levels
    pub tree_depth: usize,
    /// Number of balls
    pub num_nodes: usize,
    /// Number of leaves
    pub num_leaves: usize,
    /// Size of the largest leaf
    pub max_leaf_count: usize,
    /// Wall time of the build, zero for a loaded tree
    pub build_time: Duration,
}

/// The tree, with the point cloud and the metric it was built with.
#[derive(Debug)]
pub struct BallTree<D: PointCloud, M: Metric> {
    pub(crate) parameters: BallTreeParameters,
    pub(crate) point_cloud: Arc<D>,
    pub(crate) metric: M,
    pub(crate) nodes: Vec<BallNode>,
    pub(crate) membership: Vec<usize>,
    pub(crate) leaf_order: Vec<PointIndex>,
    pub(crate) leaf_ranges: Vec<(usize, usize)>,
    pub(crate) build_time: Duration,
}

/// Decides if a ball has to be opened. `min_dist` is a lower bound on the distance from the query
/// to anything in the ball, `count` and `max_dist` describe the candidates held so far.
///
/// * no bounds: always open,
/// * radius only: open if `min_dist < radius`,
/// * `k` only: open if fewer than `k` candidates are held or `min_dist` beats the worst one,
/// * both: both conditions.
pub fn activate_query_node(
    k: Option<usize>,
    radius: Option<f32>,
    min_dist: f32,
    count: usize,
    max_dist: Option<f32>,
) -> bool {
    let within_radius = || radius.map_or(true, |r| min_dist < r);
    let could_improve = || match k {
        None => true,
        Some(k) => count < k || max_dist.map_or(false, |m| min_dist < m),
    };
    within_radius() && could_improve()
}

/// Regroups the reference indexes by leaf. Leaf `l` holds `leaf_order[leaf_ranges[l].0..leaf_ranges[l].1]`,
/// in increasing index order. Every entry of `membership` has to be a leaf.
pub(crate) fn group_by_leaf(
    membership: &[usize],
    num_leaves: usize,
) -> (Vec<PointIndex>, Vec<(usize, usize)>) {
    let leaf_offset = num_leaves - 1;
    let mut counts = vec![0usize; num_leaves];
    for leaf in membership {
        counts[leaf - leaf_offset] += 1;
    }
    let mut leaf_ranges = Vec::with_capacity(num_leaves);
    let mut start = 0;
    for count in counts {
        leaf_ranges.push((start, start + count));
        start += count;
    }
    let mut fill: Vec<usize> = leaf_ranges.iter().map(|(s, _)| *s).collect();
    let mut leaf_order = vec![0; membership.len()];
    for (point, leaf) in membership.iter().enumerate() {
        let slot = &mut fill[leaf - leaf_offset];
        leaf_order[*slot] = point;
        *slot += 1;
    }
    (leaf_order, leaf_ranges)
}

/// Distance between two points of the cloud, NaN and infinities are errors.
pub(crate) fn checked_distance<D: PointCloud, M: Metric>(
    point_cloud: &D,
    metric: &M,
    pivot: PointIndex,
    reference: PointIndex,
) -> BallTreeResult<f32> {
    let distance = metric.dist(point_cloud.point(pivot)?, point_cloud.point(reference)?)?;
    if distance.is_finite() {
        Ok(distance)
    } else {
        Err(BallTreeError::NonFiniteDistance {
            reference,
            other: Some(pivot),
            distance,
        })
    }
}

impl<D: PointCloud, M: Metric> BallTree<D, M> {
    pub(crate) fn from_parts(
        parameters: BallTreeParameters,
        point_cloud: Arc<D>,
        metric: M,
        nodes: Vec<BallNode>,
        membership: Vec<usize>,
        build_time: Duration,
    ) -> BallTree<D, M> {
        let num_leaves = (nodes.len() + 1) / 2;
        let (leaf_order, leaf_ranges) = group_by_leaf(&membership, num_leaves);
        BallTree {
            parameters,
            point_cloud,
            metric,
            nodes,
            membership,
            leaf_order,
            leaf_ranges,
            build_time,
        }
    }

    /// The cloud the tree indexes
    pub fn point_cloud(&self) -> &Arc<D> {
        &self.point_cloud
    }

    /// The metric the tree was built with
    pub fn metric(&self) -> &M {
        &self.metric
    }

    /// The parameters the tree was built with
    pub fn parameters(&self) -> &BallTreeParameters {
        &self.parameters
    }

    /// Number of reference points
    pub fn len(&self) -> usize {
        self.membership.len()
    }

    /// If there are no reference points
    pub fn is_empty(&self) -> bool {
        self.membership.is_empty()
    }

    /// The balls, in implicit tree order
    pub fn nodes(&self) -> &[BallNode] {
        &self.nodes
    }

    /// A ball by index
    pub fn node(&self, index: usize) -> Option<&BallNode> {
        self.nodes.get(index)
    }

    /// Number of balls, `2^tree_depth - 1`
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of leaves, `2^(tree_depth - 1)`
    pub fn num_leaves(&self) -> usize {
        self.leaf_ranges.len()
    }

    /// Internal nodes come first, the last `num_leaves` nodes are the leaves.
    pub fn is_leaf(&self, index: usize) -> bool {
        index >= self.nodes.len() / 2
    }

    /// The leaf every reference point belongs to
    pub fn membership(&self) -> &[usize] {
        &self.membership
    }

    /// The reference points of a leaf, in increasing order. Empty for internal nodes.
    pub fn leaf_members(&self, index: usize) -> &[PointIndex] {
        if !self.is_leaf(index) {
            return &[];
        }
        match self.leaf_ranges.get(index - self.nodes.len() / 2) {
            Some((start, end)) => &self.leaf_order[*start..*end],
            None => &[],
        }
    }

    /// The effective neighbor cap, `min(k, n)`
    pub fn kstar(&self, k: Option<usize>) -> Option<usize> {
        k.map(|k| k.min(self.len()))
    }

    /// Describes the tree
    pub fn summary(&self) -> TreeSummary {
        TreeSummary {
            num_points: self.len(),
            dim: self.point_cloud.dim(),
            leaf_size: self.parameters.leaf_size,
            tree_depth: self.parameters.tree_depth,
            num_nodes: self.num_nodes(),
            num_leaves: self.num_leaves(),
            max_leaf_count: self
                .leaf_ranges
                .iter()
                .map(|(s, e)| e - s)
                .max()
                .unwrap_or(0),
            build_time: self.build_time,
        }
    }

    /// Checks that a query row has the format and the dimension of the reference rows.
    /// Anything goes against an empty tree.
    pub fn check_query(&self, point: PointRef) -> BallTreeResult<()> {
        if self.is_empty() {
            return Ok(());
        }
        Ok(check_row(
            point,
            self.point_cloud.is_sparse(),
            self.point_cloud.dim(),
        )?)
    }

    /// The neighbors of a row, closest first. `query_index` is the row's own reference index when
    /// the query is a reference point, which is how self edges are recognised.
    pub fn query_point(
        &self,
        point: PointRef,
        query_index: Option<PointIndex>,
        params: &QueryParameters,
    ) -> BallTreeResult<Vec<(f32, PointIndex)>> {
        params.validate()?;
        self.check_query(point)?;
        Ok(self.search(point, query_index, params)?.into_sorted())
    }

    /// The `k` nearest reference points, closest first.
    pub fn knn(&self, point: PointRef, k: usize) -> BallTreeResult<Vec<(f32, PointIndex)>> {
        self.query_point(point, None, &QueryParameters::knn(k))
    }

    /// Every reference point strictly closer than `radius`, closest first.
    pub fn range(&self, point: PointRef, radius: f32) -> BallTreeResult<Vec<(f32, PointIndex)>> {
        self.query_point(point, None, &QueryParameters::range(radius))
    }

    fn query_distance(
        &self,
        reference: PointIndex,
        point: PointRef,
        query_index: Option<PointIndex>,
    ) -> BallTreeResult<f32> {
        let distance = self.metric.dist(self.point_cloud.point(reference)?, point)?;
        if distance.is_finite() {
            Ok(distance)
        } else {
            Err(BallTreeError::NonFiniteDistance {
                reference,
                other: query_index,
                distance,
            })
        }
    }

    /// Distance from the query to a node's pivot, `None` for empty nodes.
    fn pivot_distance(
        &self,
        index: usize,
        point: PointRef,
        query_index: Option<PointIndex>,
    ) -> BallTreeResult<Option<f32>> {
        let node = &self.nodes[index];
        if node.is_empty() {
            return Ok(None);
        }
        match node.pivot() {
            Some(pivot) => Ok(Some(self.query_distance(pivot, point, query_index)?)),
            None => Err(BallTreeError::CorruptState(format!(
                "node {} covers points but has no pivot",
                index
            ))),
        }
    }

    /// Runs the traversal and hands back the unsorted candidate set. The row and the parameters
    /// are assumed to be checked.
    pub(crate) fn search(
        &self,
        point: PointRef,
        query_index: Option<PointIndex>,
        params: &QueryParameters,
    ) -> BallTreeResult<CandidateSet> {
        let kstar = self.kstar(params.k);
        let candidates =
            CandidateSet::new(query_index, kstar, params.radius, params.include_self_edges);
        if kstar == Some(0) {
            return Ok(candidates);
        }
        let root_dist = match self.pivot_distance(0, point, query_index)? {
            Some(d) => d,
            None => return Ok(candidates),
        };

        // Pivot distances travel with the node so each is computed once.
        let mut node_stack: Vec<(usize, f32)> = Vec::with_capacity(2 * self.parameters.tree_depth);
        node_stack.push((0, root_dist));
        while let Some((index, pivot_dist)) = node_stack.pop() {
            let min_dist = pivot_dist - self.nodes[index].radius();
            let (count, max_dist) = candidates.occupancy();
            if !activate_query_node(kstar, params.radius, min_dist, count, max_dist) {
                continue;
            }
            if self.is_leaf(index) {
                for reference in self.leaf_members(index) {
                    let d = self.query_distance(*reference, point, query_index)?;
                    candidates.evaluate_point(d, *reference);
                }
            } else {
                let first = first_child(index);
                let second = second_child(index);
                let first_dist = self.pivot_distance(first, point, query_index)?;
                let second_dist = self.pivot_distance(second, point, query_index)?;
                // the closer child goes on top
                match (first_dist, second_dist) {
                    (Some(d1), Some(d2)) if d1 <= d2 => {
                        node_stack.push((second, d2));
                        node_stack.push((first, d1));
                    }
                    (Some(d1), Some(d2)) => {
                        node_stack.push((first, d1));
                        node_stack.push((second, d2));
                    }
                    (Some(d1), None) => node_stack.push((first, d1)),
                    (None, Some(d2)) => node_stack.push((second, d2)),
                    (None, None) => {}
                }
            }
        }
        Ok(candidates)
    }

    /// Everything needed to rebuild this tree over the same cloud.
    pub fn save(&self) -> TreeState {
        TreeState {
            leaf_size: self.parameters.leaf_size,
            tree_depth: self.parameters.tree_depth,
            num_points: self.len(),
            dim: self.point_cloud.dim(),
            sparse: self.point_cloud.is_sparse(),
            verbosity: self.parameters.verbosity,
            nodes: self.nodes.clone(),
            membership: self.membership.clone(),
        }
    }

    /// Restores a saved tree. The state is validated against the cloud before anything is used.
    pub fn load(state: TreeState, point_cloud: Arc<D>, metric: M) -> BallTreeResult<BallTree<D, M>> {
        state.validate(&*point_cloud)?;
        point_cloud.validate_rows()?;
        let parameters = BallTreeParameters {
            leaf_size: state.leaf_size,
            tree_depth: state.tree_depth,
            verbosity: state.verbosity,
        };
        Ok(BallTree::from_parts(
            parameters,
            point_cloud,
            metric,
            state.nodes,
            state.membership,
            Duration::default(),
        ))
    }
}
