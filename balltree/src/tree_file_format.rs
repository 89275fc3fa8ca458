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

//! The serialisable state of a built tree. This is everything needed to answer queries again
//! against the same point cloud without rebuilding.

use crate::errors::*;
use crate::index::node::*;
use crate::index::{tree_depth, BallNode};
use pointcloud::PointCloud;
use serde::{Deserialize, Serialize};

/// A built tree, minus the point cloud and the metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeState {
    /// The leaf size the tree was built with, after automatic sizing
    pub leaf_size: usize,
    /// Number of levels, a single leaf is depth 1
    pub tree_depth: usize,
    /// Number of reference points
    pub num_points: usize,
    /// Dimension of the reference points
    pub dim: usize,
    /// If the reference points are sparse
    pub sparse: bool,
    /// Verbosity of the builder, reused by bulk queries
    #[serde(default)]
    pub verbosity: u32,
    /// The implicit tree, `2^tree_depth - 1` nodes
    pub nodes: Vec<BallNode>,
    /// Leaf node of every reference point
    pub membership: Vec<usize>,
}

impl TreeState {
    /// Checks that this state describes a tree over `point_cloud`: the shape matches the point
    /// count and leaf size, every point sits in a leaf, pivots are valid indexes, radii are finite
    /// and the cover counts add up.
    pub fn validate<D: PointCloud>(&self, point_cloud: &D) -> BallTreeResult<()> {
        let n = point_cloud.len();
        if self.num_points != n || self.membership.len() != n {
            return Err(corrupt(format!(
                "state covers {} points with {} memberships but the cloud has {}",
                self.num_points,
                self.membership.len(),
                n
            )));
        }
        if n > 0 && (self.dim != point_cloud.dim() || self.sparse != point_cloud.is_sparse()) {
            return Err(corrupt(format!(
                "state is for {} rows of dimension {}",
                if self.sparse { "sparse" } else { "dense" },
                self.dim
            )));
        }
        if self.leaf_size == 0 {
            return Err(corrupt("leaf size of zero".to_string()));
        }
        if self.tree_depth == 0 || self.tree_depth != tree_depth(n, self.leaf_size) {
            return Err(corrupt(format!(
                "depth {} does not fit {} points with leaf size {}",
                self.tree_depth, n, self.leaf_size
            )));
        }
        let num_leaves = 1usize << (self.tree_depth - 1);
        let num_nodes = 2 * num_leaves - 1;
        if self.nodes.len() != num_nodes {
            return Err(corrupt(format!(
                "expected {} nodes, found {}",
                num_nodes,
                self.nodes.len()
            )));
        }

        let leaf_offset = num_leaves - 1;
        let mut counts = vec![0usize; num_nodes];
        for (point, leaf) in self.membership.iter().enumerate() {
            if *leaf < leaf_offset || *leaf >= num_nodes {
                return Err(corrupt(format!(
                    "point {} is assigned to {}, which is not a leaf",
                    point, leaf
                )));
            }
            counts[*leaf] += 1;
        }
        for i in (0..leaf_offset).rev() {
            counts[i] = counts[first_child(i)] + counts[second_child(i)];
        }

        for (i, (node, count)) in self.nodes.iter().zip(counts).enumerate() {
            if node.cover_count() != count {
                return Err(corrupt(format!(
                    "node {} claims {} points but covers {}",
                    i,
                    node.cover_count(),
                    count
                )));
            }
            match node.pivot() {
                Some(p) if p >= n => {
                    return Err(corrupt(format!("node {} has pivot {} out of range", i, p)))
                }
                None if count > 0 => {
                    return Err(corrupt(format!("node {} covers points but has no pivot", i)))
                }
                _ => {}
            }
            if !node.radius().is_finite() || node.radius() < 0.0 {
                return Err(corrupt(format!(
                    "node {} has radius {}",
                    i,
                    node.radius()
                )));
            }
        }
        Ok(())
    }
}

fn corrupt(msg: String) -> BallTreeError {
    BallTreeError::CorruptState(msg)
}
