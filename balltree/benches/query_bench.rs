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

use balltree::brute_force::BruteForceIndex;
use balltree::query_interface::BulkInterface;
use balltree::*;
use pointcloud::data_sources::*;
use pointcloud::*;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

fn build_ram_random_test(count: usize, data_dim: usize) -> Arc<DataRam> {
    let mut rng = SmallRng::seed_from_u64(0);
    Arc::new(
        DataRam::new(
            (0..count * data_dim).map(|_i| rng.gen::<f32>()).collect(),
            data_dim,
        )
        .unwrap(),
    )
}

fn build_benchmarks(c: &mut Criterion) {
    let pc = build_ram_random_test(20_000, 8);
    let mut builder = BallTreeBuilder::new();
    builder.set_leaf_size(40);
    c.bench_function("build_20000x8_leaf_40", |b| {
        b.iter(|| builder.build(Arc::clone(&pc), L2).unwrap())
    });
}

fn query_benchmarks(c: &mut Criterion) {
    let pc = build_ram_random_test(20_000, 8);
    let mut builder = BallTreeBuilder::new();
    builder.set_leaf_size(40);
    let tree = builder.build(Arc::clone(&pc), L2).unwrap();
    let point = Point::Dense(vec![0.5; 8]);

    c.bench_function("knn_10", |b| {
        b.iter(|| tree.knn(black_box(point.to_ref()), 10).unwrap())
    });
    c.bench_function("range_0.2", |b| {
        b.iter(|| tree.range(black_box(point.to_ref()), 0.2).unwrap())
    });

    let brute = BruteForceIndex::new(Arc::clone(&pc), L2).unwrap();
    let params = QueryParameters::knn(10);
    c.bench_function("brute_force_knn_10", |b| {
        b.iter(|| {
            brute
                .query_point(black_box(point.to_ref()), None, &params)
                .unwrap()
        })
    });
}

fn graph_benchmarks(c: &mut Criterion) {
    let pc = build_ram_random_test(2_000, 8);
    let mut builder = BallTreeBuilder::new();
    builder.set_leaf_size(20);
    let interface = BulkInterface::new(Arc::new(builder.build(Arc::clone(&pc), L2).unwrap()));
    let brute = BruteForceIndex::new(pc, L2).unwrap();
    let params = QueryParameters::knn(10).with_self_edges(false);

    let mut group = c.benchmark_group("similarity_graph_2000x8");
    group.sample_size(10);
    group.bench_function("ball_tree", |b| {
        b.iter(|| interface.similarity_graph_indexes(&params).unwrap())
    });
    group.bench_function("brute_force", |b| {
        b.iter(|| brute.similarity_graph_indexes(&params).unwrap())
    });
    group.finish();
}

criterion_group!(
    benches,
    build_benchmarks,
    query_benchmarks,
    graph_benchmarks
);
criterion_main!(benches);
