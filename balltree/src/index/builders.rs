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
use super::node::*;
use super::tree::*;
use crate::errors::*;
use crate::monitor::*;
use pointcloud::loaders::load_yaml;
use pointcloud::*;

use log::{debug, info, warn};
use rayon::prelude::*;
use std::cmp::max;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use yaml_rust::Yaml;

/// The leaf size used when the builder is given 0. Keeps the depth of the tree around 12.
pub fn automatic_leaf_size(num_points: usize) -> usize {
    max(1000, (num_points + 2047) / 2048)
}

/// Number of levels of a tree over `num_points` points with leaves of at most `leaf_size` points,
/// `ceil(log2(ceil(num_points / leaf_size))) + 1`. An empty tree is a single leaf.
pub fn tree_depth(num_points: usize, leaf_size: usize) -> usize {
    if num_points == 0 || leaf_size == 0 {
        return 1;
    }
    let min_leaves = (num_points - 1) / leaf_size + 1;
    min_leaves.next_power_of_two().trailing_zeros() as usize + 1
}

/// Sends the points of a node that sit exactly on its median alternately to the first and
/// the second child, first child first. One toggle per node of the level being split.
#[derive(Debug)]
struct MedianToggles {
    level_start: usize,
    first_next: Vec<bool>,
}

impl MedianToggles {
    fn new(level_start: usize, count: usize) -> MedianToggles {
        MedianToggles {
            level_start,
            first_next: vec![true; count],
        }
    }

    fn next_child(&mut self, node: usize) -> usize {
        let first_next = &mut self.first_next[node - self.level_start];
        let child = if *first_next {
            first_child(node)
        } else {
            second_child(node)
        };
        *first_next = !*first_next;
        child
    }
}

/// The median of a node's distances, the mean of the two middle values for an even count.
/// Nodes with one point or none get -1, which sends a lone point to the second child.
fn median(dists: &mut [f32]) -> f32 {
    let len = dists.len();
    if len <= 1 {
        return -1.0;
    }
    let mid = len / 2;
    let (lower, upper, _) = dists.select_nth_unstable_by(mid, f32::total_cmp);
    let upper = *upper;
    if len % 2 == 0 {
        let lower = lower.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        (lower + upper) / 2.0
    } else {
        upper
    }
}

/// The construction state. Levels are split top down, each split makes three passes over every
/// reference point.
struct TreeSplitter<'a, D: PointCloud, M: Metric> {
    point_cloud: &'a D,
    metric: &'a M,
    nodes: Vec<BallNode>,
    membership: Vec<usize>,
}

impl<'a, D: PointCloud, M: Metric> TreeSplitter<'a, D, M> {
    fn new(point_cloud: &'a D, metric: &'a M, depth: usize) -> TreeSplitter<'a, D, M> {
        let num_points = point_cloud.len();
        let mut nodes = vec![BallNode::new(); level_start(depth)];
        if num_points > 0 {
            nodes[0].set_pivot(0);
            nodes[0].add_cover(num_points);
        }
        TreeSplitter {
            point_cloud,
            metric,
            nodes,
            membership: vec![0; num_points],
        }
    }

    /// Distance from every point to the pivot of `pivot_node(membership[point])`.
    fn distances_to_pivots<F>(&self, pivot_node: F) -> BallTreeResult<Vec<f32>>
    where
        F: Fn(usize) -> usize + Sync,
    {
        (0..self.membership.len())
            .into_par_iter()
            .map(|point| {
                let node = pivot_node(self.membership[point]);
                let pivot = self.nodes[node].pivot().ok_or_else(|| {
                    BallTreeError::CorruptState(format!(
                        "node {} holds points but has no pivot",
                        node
                    ))
                })?;
                checked_distance(self.point_cloud, self.metric, pivot, point)
            })
            .collect()
    }

    fn split_level(&mut self, level: usize) -> BallTreeResult<()> {
        let start = level_start(level);
        let count = level_start(level + 1) - start;

        // Pass 1: the radius of each node, its farthest point pivots the first child.
        let pivot_dists = self.distances_to_pivots(|node| node)?;
        for (point, d) in pivot_dists.iter().enumerate() {
            let node = self.membership[point];
            if *d >= self.nodes[node].radius() {
                self.nodes[node].set_radius(*d);
                self.nodes[first_child(node)].set_pivot(point);
            }
        }

        // Pass 2: the point farthest from the first child's pivot pivots the second child.
        let first_child_dists = self.distances_to_pivots(first_child)?;
        let mut first_child_radius = vec![0.0f32; count];
        let mut node_dists: Vec<Vec<f32>> = vec![Vec::new(); count];
        for (point, d) in first_child_dists.iter().enumerate() {
            let node = self.membership[point];
            if *d >= first_child_radius[node - start] {
                first_child_radius[node - start] = *d;
                self.nodes[second_child(node)].set_pivot(point);
            }
            node_dists[node - start].push(*d);
        }
        let medians: Vec<f32> = node_dists.par_iter_mut().map(|d| median(d)).collect();

        // Pass 3: split at the median.
        let mut toggles = MedianToggles::new(start, count);
        for (point, d) in first_child_dists.iter().enumerate() {
            let node = self.membership[point];
            let median = medians[node - start];
            let child = if *d < median {
                first_child(node)
            } else if *d > median {
                second_child(node)
            } else {
                toggles.next_child(node)
            };
            self.membership[point] = child;
            self.nodes[child].add_cover(1);
        }
        Ok(())
    }

    /// The leaves never get a pass 1, this sets their radii.
    fn finish_leaves(&mut self) -> BallTreeResult<()> {
        let pivot_dists = self.distances_to_pivots(|node| node)?;
        for (point, d) in pivot_dists.iter().enumerate() {
            let node = self.membership[point];
            if *d >= self.nodes[node].radius() {
                self.nodes[node].set_radius(*d);
            }
        }
        Ok(())
    }
}

/// A construction object for a ball tree.
#[derive(Debug, Clone)]
pub struct BallTreeBuilder {
    pub(crate) leaf_size: usize,
    pub(crate) verbosity: u32,
}

impl Default for BallTreeBuilder {
    fn default() -> BallTreeBuilder {
        BallTreeBuilder {
            leaf_size: 0,
            verbosity: 0,
        }
    }
}

impl BallTreeBuilder {
    /// Creates a new builder with automatic leaf sizing and no output
    pub fn new() -> BallTreeBuilder {
        BallTreeBuilder::default()
    }

    /// Reads `leaf_size` and `verbosity` from a YAML file, anything missing keeps its default.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> BallTreeResult<BallTreeBuilder> {
        let params = load_yaml(&path)?;
        BallTreeBuilder::from_yaml_params(&params, path.as_ref())
    }

    /// Reads `leaf_size` and `verbosity` from an already parsed document.
    pub fn from_yaml_params(params: &Yaml, path: &Path) -> BallTreeResult<BallTreeBuilder> {
        let field = |name: &str| -> BallTreeResult<Option<i64>> {
            match &params[name] {
                Yaml::BadValue => Ok(None),
                Yaml::Integer(i) if *i >= 0 => Ok(Some(*i)),
                _ => Err(BallTreeError::ParsingError(
                    ParsingError::MalformedYamlError {
                        file_name: path.to_string_lossy().to_string(),
                        field: name.to_string(),
                    },
                )),
            }
        };
        let mut builder = BallTreeBuilder::new();
        if let Some(leaf_size) = field("leaf_size")? {
            builder.set_leaf_size(leaf_size as usize);
        }
        if let Some(verbosity) = field("verbosity")? {
            builder.set_verbosity(verbosity as u32);
        }
        Ok(builder)
    }

    /// The maximum number of points in a leaf, 0 picks one from the number of points.
    pub fn set_leaf_size(&mut self, x: usize) -> &mut Self {
        self.leaf_size = x;
        self
    }

    /// 0 is silent, 1 logs progress, anything greater draws a progress bar.
    pub fn set_verbosity(&mut self, x: u32) -> &mut Self {
        self.verbosity = x;
        self
    }

    /// Builds the tree, reporting progress according to the verbosity.
    pub fn build<D: PointCloud, M: Metric>(
        &self,
        point_cloud: Arc<D>,
        metric: M,
    ) -> BallTreeResult<BallTree<D, M>> {
        match self.verbosity {
            0 => self.build_with(point_cloud, metric, &NeverCancel, &NoProgress),
            1 => self.build_with(point_cloud, metric, &NeverCancel, &LogProgress),
            _ => self.build_with(point_cloud, metric, &NeverCancel, &BarProgress::new()),
        }
    }

    /// Builds the tree. The cancel check is polled before every level, a cancelled build returns
    /// `Cancelled` and nothing else.
    pub fn build_with<D, M, C, P>(
        &self,
        point_cloud: Arc<D>,
        metric: M,
        cancel: &C,
        progress: &P,
    ) -> BallTreeResult<BallTree<D, M>>
    where
        D: PointCloud,
        M: Metric,
        C: CancelCheck,
        P: ProgressSink,
    {
        let start = Instant::now();
        point_cloud.validate_rows()?;

        let num_points = point_cloud.len();
        let leaf_size = if self.leaf_size == 0 {
            automatic_leaf_size(num_points)
        } else {
            self.leaf_size
        };
        let depth = tree_depth(num_points, leaf_size);
        if point_cloud.dim() > 100 {
            warn!(
                "the data has {} dimensions, the computational advantage of the ball tree diminishes past 100",
                point_cloud.dim()
            );
        }
        if depth > 12 {
            warn!(
                "the ball tree is very large with depth {}, consider a larger leaf size",
                depth
            );
        }
        info!(
            "building a ball tree over {} points with leaf size {} and depth {}",
            num_points, leaf_size, depth
        );

        let mut splitter = TreeSplitter::new(&*point_cloud, &metric, depth);
        for level in 0..depth - 1 {
            if cancel.must_cancel() {
                return Err(BallTreeError::Cancelled);
            }
            splitter.split_level(level)?;
            debug!(
                "split level {} into {} nodes after {:?}",
                level,
                1usize << (level + 1),
                start.elapsed()
            );
            progress.report(Progress::TreeLevel { level, depth }, start.elapsed());
        }
        if cancel.must_cancel() {
            return Err(BallTreeError::Cancelled);
        }
        splitter.finish_leaves()?;
        progress.report(
            Progress::TreeLevel {
                level: depth - 1,
                depth,
            },
            start.elapsed(),
        );

        let TreeSplitter {
            nodes, membership, ..
        } = splitter;
        let parameters = BallTreeParameters {
            leaf_size,
            tree_depth: depth,
            verbosity: self.verbosity,
        };
        let tree = BallTree::from_parts(
            parameters,
            Arc::clone(&point_cloud),
            metric,
            nodes,
            membership,
            start.elapsed(),
        );
        info!("built the ball tree in {:?}", tree.build_time);
        Ok(tree)
    }
}
