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

//! Every query mode of the ball tree against the brute force index, over dense, sparse and
//! composite data.

use balltree::brute_force::BruteForceIndex;
use balltree::query_interface::{BulkInterface, NeighborLists};
use balltree::*;
use pointcloud::data_sources::{DataRam, SparseDataRam};
use pointcloud::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

fn dense_cloud(count: usize, dim: usize, seed: u64) -> DataRam {
    let mut rng = SmallRng::seed_from_u64(seed);
    let data: Vec<f32> = (0..count * dim).map(|_| rng.gen_range(-1.0..1.0)).collect();
    DataRam::new(data, dim).unwrap()
}

fn sparse_cloud(count: usize, dim: usize, seed: u64) -> SparseDataRam {
    let mut rng = SmallRng::seed_from_u64(seed);
    let rows: Vec<Vec<(u32, f32)>> = (0..count)
        .map(|_| {
            (0..dim as u32)
                .filter_map(|c| {
                    if rng.gen_bool(0.3) {
                        Some((c, rng.gen::<f32>()))
                    } else {
                        None
                    }
                })
                .collect()
        })
        .collect();
    SparseDataRam::from_rows(&rows, dim).unwrap()
}

fn query_modes(median_scale: f32) -> Vec<QueryParameters> {
    vec![
        QueryParameters::knn(1),
        QueryParameters::knn(10),
        QueryParameters::knn(10).with_self_edges(false),
        QueryParameters::range(median_scale),
        QueryParameters::range(median_scale).with_self_edges(false),
        QueryParameters::knn(5).with_radius(median_scale),
        QueryParameters::knn(5)
            .with_radius(median_scale)
            .with_self_edges(false),
    ]
}

fn assert_same(tree: &NeighborLists, scan: &NeighborLists) {
    assert_eq!(tree.len(), scan.len());
    for (query, (t, s)) in tree.iter().zip(scan.iter()).enumerate() {
        assert_eq!(t.len(), s.len(), "query {} found a different count", query);
        for ((td, _), (sd, _)) in t.iter().zip(s.iter()) {
            assert!((td - sd).abs() < 1e-5, "query {}: {} vs {}", query, td, sd);
        }
    }
}

fn compare<D: PointCloud, M: Metric + Clone>(cloud: D, metric: M, leaf_size: usize, scale: f32) {
    let cloud = Arc::new(cloud);
    let mut builder = BallTreeBuilder::new();
    builder.set_leaf_size(leaf_size);
    let tree = Arc::new(builder.build(Arc::clone(&cloud), metric.clone()).unwrap());
    let interface = BulkInterface::new(Arc::clone(&tree));
    let mut brute = BruteForceIndex::new(Arc::clone(&cloud), metric).unwrap();
    brute.set_block_size(33);

    for params in query_modes(scale) {
        let from_tree = interface.similarity_graph_indexes(&params).unwrap();
        let from_scan = brute.similarity_graph_indexes(&params).unwrap();
        assert_same(&from_tree, &from_scan);
    }
}

#[test]
fn dense_l2() {
    compare(dense_cloud(500, 4, 1), L2, 16, 0.5);
}

#[test]
fn dense_l1_automatic_leaf_size() {
    compare(dense_cloud(300, 3, 2), L1, 0, 0.8);
}

#[test]
fn dense_linfty_small_leaves() {
    compare(dense_cloud(200, 2, 3), Linfty, 1, 0.2);
}

#[test]
fn sparse_l2() {
    compare(sparse_cloud(300, 20, 4), L2, 8, 0.9);
}

#[test]
fn composite_dense() {
    let metric = CompositeMetric::new(vec![
        MetricComponent::new("position", vec![0, 1], 1.0, L2).unwrap(),
        MetricComponent::new("extra", vec![2, 3, 4], 0.5, L1).unwrap(),
    ])
    .unwrap();
    compare(dense_cloud(250, 5, 5), Arc::new(metric), 10, 0.7);
}

#[test]
fn outside_queries_match() {
    let cloud = Arc::new(dense_cloud(400, 3, 6));
    let queries = dense_cloud(50, 3, 7);
    let mut builder = BallTreeBuilder::new();
    builder.set_leaf_size(20);
    let tree = Arc::new(builder.build(Arc::clone(&cloud), L2).unwrap());
    let interface = BulkInterface::new(tree);
    let brute = BruteForceIndex::new(cloud, L2).unwrap();
    for params in query_modes(0.4) {
        assert_same(
            &interface.query_indexes(&queries, &params).unwrap(),
            &brute.query_indexes(&queries, &params).unwrap(),
        );
    }
}

#[test]
fn duplicated_points() {
    let mut data = Vec::new();
    for i in 0..200 {
        let v = (i % 5) as f32;
        data.push(v);
        data.push(-v);
    }
    compare(DataRam::new(data, 2).unwrap(), L2, 4, 1.5);
}
