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

//! Builds a tree and prints part of its similarity graph. Pass a yaml config to use your own
//! data, otherwise a random cloud is used.
//!
//! ```bash
//! cargo run --example similarity_graph -- data/mnist.yml
//! ```

use balltree::query_interface::BulkInterface;
use balltree::utils::ball_tree_from_yaml;
use balltree::*;
use env_logger::Builder;
use log::LevelFilter;
use pointcloud::data_sources::DataRam;
use pointcloud::label_sources::LabelColumn;
use pointcloud::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::env;
use std::sync::Arc;

fn random_tree() -> BallTreeResult<BallTree<DefaultLabeledCloud, L2>> {
    let mut rng = SmallRng::seed_from_u64(0);
    let count = 5000;
    let data = DataRam::new((0..count * 10).map(|_| rng.gen::<f32>()).collect(), 10)?;
    let labels = LabelColumn::integers((0..count as i64).map(|i| i % 10).collect());
    let cloud = SimpleLabeledCloud::new(data, labels)?;
    BallTreeBuilder::new()
        .set_verbosity(2)
        .build(Arc::new(cloud), L2)
}

fn main() -> BallTreeResult<()> {
    let mut builder = Builder::new();
    builder.filter_level(LevelFilter::Info).init();

    let tree = match env::args().nth(1) {
        Some(path) => ball_tree_from_yaml(path, L2)?,
        None => random_tree()?,
    };
    println!("{:?}", tree.summary());

    let interface = BulkInterface::new(Arc::new(tree));
    let params = QueryParameters::knn(5).with_self_edges(false);
    let graph = interface.similarity_graph(&params)?;
    for row in graph.iter().take(20) {
        println!(
            "{} -> {} at {:.4} (rank {})",
            row.query_label, row.neighbor_label, row.distance, row.rank
        );
    }
    Ok(())
}
