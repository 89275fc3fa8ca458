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

use pointcloud::data_sources::*;
use pointcloud::*;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

fn build_ram_random_test(count: usize, data_dim: usize) -> DataRam {
    let mut rng = SmallRng::seed_from_u64(0);
    DataRam::new(
        (0..count * data_dim).map(|_i| rng.gen::<f32>()).collect(),
        data_dim,
    )
    .unwrap()
}

fn dense_benchmarks(c: &mut Criterion) {
    let count = 100;
    let dim = 303;
    let pc = build_ram_random_test(count, dim);

    let indexes_small: [PointIndex; 9] = [1, 3, 5, 7, 9, 11, 13, 15, 17];
    let indexes_large: Vec<PointIndex> = (0..count).collect();

    let point = Point::Dense(vec![0.0; dim]);

    c.bench_function("L2_distances_to_point_small", |b| {
        b.iter(|| {
            pc.distances_to_point(&L2, black_box(point.to_ref()), black_box(&indexes_small))
                .unwrap()
        })
    });
    c.bench_function("L2_distances_to_point_large", |b| {
        b.iter(|| {
            pc.distances_to_point(&L2, black_box(point.to_ref()), black_box(&indexes_large))
                .unwrap()
        })
    });
    c.bench_function("L1_distances_to_point_large", |b| {
        b.iter(|| {
            pc.distances_to_point(&L1, black_box(point.to_ref()), black_box(&indexes_large))
                .unwrap()
        })
    });
}

fn sparse_benchmarks(c: &mut Criterion) {
    let mut rng = SmallRng::seed_from_u64(1);
    let dim = 10000;
    let rows: Vec<Vec<(u32, f32)>> = (0..100)
        .map(|_| {
            let mut cols: Vec<u32> = (0..50).map(|_| rng.gen_range(0..dim as u32)).collect();
            cols.sort_unstable();
            cols.dedup();
            cols.into_iter().map(|c| (c, rng.gen::<f32>())).collect()
        })
        .collect();
    let pc = SparseDataRam::from_rows(&rows, dim).unwrap();
    let indexes: Vec<PointIndex> = (0..pc.len()).collect();
    let point = pc.point(0).unwrap().to_point();

    c.bench_function("L2_sparse_distances_to_point", |b| {
        b.iter(|| {
            pc.distances_to_point(&L2, black_box(point.to_ref()), black_box(&indexes))
                .unwrap()
        })
    });
}

criterion_group!(benches, dense_benchmarks, sparse_benchmarks);
criterion_main!(benches);
