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

//! # The Node
//! A ball: a pivot point and a radius that bounds the distance from the pivot to every point in
//! the node's subtree. Nodes live in an implicit complete binary tree, node `i` has children
//! `2i + 1` and `2i + 2`.

use pointcloud::PointIndex;
use serde::{Deserialize, Serialize};

/// One ball of the tree. `pivot` is `None` for the nodes that never received a point, which
/// happens when the tree has more leaves than the data can fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BallNode {
    pivot: Option<PointIndex>,
    radius: f32,
    cover_count: usize,
}

impl Default for BallNode {
    fn default() -> BallNode {
        BallNode::new()
    }
}

impl BallNode {
    /// Creates a new blank node
    pub fn new() -> BallNode {
        BallNode {
            pivot: None,
            radius: 0.0,
            cover_count: 0,
        }
    }

    /// The reference point the ball is centered on
    pub fn pivot(&self) -> Option<PointIndex> {
        self.pivot
    }

    /// Upper bound on the distance from the pivot to anything in the subtree
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Number of reference points in the subtree
    pub fn cover_count(&self) -> usize {
        self.cover_count
    }

    /// If no reference point ended up in this subtree
    pub fn is_empty(&self) -> bool {
        self.cover_count == 0
    }

    pub(crate) fn set_pivot(&mut self, pivot: PointIndex) {
        self.pivot = Some(pivot);
    }

    pub(crate) fn set_radius(&mut self, radius: f32) {
        self.radius = radius;
    }

    pub(crate) fn add_cover(&mut self, count: usize) {
        self.cover_count += count;
    }
}

/// Index of the first child of node `i`
#[inline]
pub fn first_child(i: usize) -> usize {
    2 * i + 1
}

/// Index of the second child of node `i`
#[inline]
pub fn second_child(i: usize) -> usize {
    2 * i + 2
}

/// Index of the parent of node `i`, the root has none
#[inline]
pub fn parent(i: usize) -> Option<usize> {
    if i == 0 {
        None
    } else {
        Some((i - 1) / 2)
    }
}

/// The nodes of tree level `level` are `level_start(level)..level_start(level + 1)`
#[inline]
pub fn level_start(level: usize) -> usize {
    (1 << level) - 1
}
