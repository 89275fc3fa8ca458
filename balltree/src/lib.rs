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

#![warn(missing_docs)]
#![doc(test(attr(allow(unused_variables), deny(warnings))))]

//! # Ball Tree
//! An exact nearest neighbor index over a point cloud. The tree is a complete binary tree of
//! balls stored in a flat array, node `i` has children `2i + 1` and `2i + 2`. Each ball is
//! centered on one of the reference points and covers every point routed through it.
//!
//! ## Building
//! Points are split one level at a time. For every node the far point from its pivot becomes the
//! pivot of the first child, the far point from that one becomes the pivot of the second child,
//! and each point is sent by its distance to the first child's pivot: below the node's median of
//! those distances it goes to the first child, above it to the second. Points exactly on the median alternate between the children, so duplicated data
//! still splits evenly. The only parameter is the leaf size. When it is 0 a leaf size is picked
//! from the number of points.
//!
//! ## Querying
//! Queries are exact. They carry a `k` bound, a radius bound, both, or neither, and can exclude
//! the query's own row. A node is only opened when its ball could hold a point that passes the
//! bounds, so the answers are identical to the ones [`brute_force::BruteForceIndex`] gives.
//!
//! ```rust
//! use balltree::*;
//! use pointcloud::data_sources::DataRam;
//! use pointcloud::{PointRef, L2};
//! use std::sync::Arc;
//!
//! let cloud = DataRam::new(vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 10.0, 10.0], 2).unwrap();
//! let tree = BallTreeBuilder::new()
//!     .set_leaf_size(2)
//!     .build(Arc::new(cloud), L2)
//!     .unwrap();
//! let neighbors = tree.knn(PointRef::Dense(&[0.1, 0.1]), 2).unwrap();
//! assert_eq!(neighbors[0].1, 0);
//! ```

#[cfg(test)]
#[macro_use]
extern crate assert_approx_eq;

pub mod errors;
pub use errors::{BallTreeError, BallTreeResult};

mod index;
pub use index::*;

pub mod brute_force;
pub mod monitor;
pub mod query_interface;

pub mod tree_file_format;
pub use tree_file_format::TreeState;
pub mod utils;
