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

//! Utility functions for i/o

use crate::errors::*;
use crate::index::{BallTree, BallTreeBuilder};
use crate::tree_file_format::TreeState;
use log::info;
use pointcloud::loaders::{labeled_ram_from_yaml_params, load_yaml};
use pointcloud::*;
use std::fs::{remove_file, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

/// Given a yaml file on disk, it loads the labeled data it points at and builds a ball tree.
///
/// ```yaml
/// ---
/// leaf_size: 40
/// verbosity: 1
/// data_path: DATA_CSVs
/// data_dim: 784
/// has_headers: false
/// labels_path: LABELS_CSV
/// label_csv_index: 3
/// ```
pub fn ball_tree_from_yaml<P: AsRef<Path>, M: Metric>(
    path: P,
    metric: M,
) -> BallTreeResult<BallTree<DefaultLabeledCloud, M>> {
    let params = load_yaml(&path)?;
    let point_cloud = labeled_ram_from_yaml_params(&params, path.as_ref())?;
    let builder = BallTreeBuilder::from_yaml_params(&params, path.as_ref())?;
    info!(
        "loaded {} points of dimension {}, building a ball tree with leaf size {}",
        point_cloud.len(),
        point_cloud.dim(),
        builder.leaf_size
    );
    builder.build(Arc::new(point_cloud), metric)
}

/// Reads a tree saved with `save_tree` and attaches it to the cloud it was built over.
pub fn load_tree<P: AsRef<Path>, D: PointCloud, M: Metric>(
    tree_path: P,
    point_cloud: Arc<D>,
    metric: M,
) -> BallTreeResult<BallTree<D, M>> {
    let tree_path_ref: &Path = tree_path.as_ref();
    info!("loading tree from {}", tree_path_ref.to_string_lossy());
    let file = File::open(tree_path_ref)?;
    let state: TreeState = serde_json::from_reader(BufReader::new(file))?;
    BallTree::load(state, point_cloud, metric)
}

/// Writes the tree's state as JSON, replacing whatever is at the path.
pub fn save_tree<P: AsRef<Path>, D: PointCloud, M: Metric>(
    tree_path: P,
    tree: &BallTree<D, M>,
) -> BallTreeResult<()> {
    let tree_path_ref: &Path = tree_path.as_ref();
    info!("saving tree to {}", tree_path_ref.to_string_lossy());
    if tree_path_ref.exists() {
        info!("{} exists, removing", tree_path_ref.to_string_lossy());
        remove_file(tree_path_ref)?;
    }
    let mut writer = BufWriter::new(File::create(tree_path_ref)?);
    serde_json::to_writer(&mut writer, &tree.save())?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::QueryParameters;
    use pointcloud::data_sources::DataRam;
    use pointcloud::label_sources::Label;
    use std::fs;
    use tempdir::TempDir;

    #[test]
    fn save_then_load() {
        let dir = TempDir::new("balltree_utils").unwrap();
        let path = dir.path().join("tree.json");
        let data: Vec<f32> = (0..60).map(|i| ((i * 7) % 13) as f32).collect();
        let cloud = Arc::new(DataRam::new(data, 3).unwrap());
        let mut builder = BallTreeBuilder::new();
        builder.set_leaf_size(3);
        let tree = builder.build(Arc::clone(&cloud), L2).unwrap();
        fs::write(&path, "stale").unwrap();
        save_tree(&path, &tree).unwrap();

        let loaded = load_tree(&path, Arc::clone(&cloud), L2).unwrap();
        assert_eq!(loaded.nodes(), tree.nodes());
        assert_eq!(loaded.membership(), tree.membership());
        let params = QueryParameters::knn(4);
        for i in 0..cloud.len() {
            let point = cloud.point(i).unwrap();
            assert_eq!(
                loaded.query_point(point, Some(i), &params).unwrap(),
                tree.query_point(point, Some(i), &params).unwrap()
            );
        }
    }

    #[test]
    fn load_rejects_other_clouds() {
        let dir = TempDir::new("balltree_utils").unwrap();
        let path = dir.path().join("tree.json");
        let cloud = Arc::new(DataRam::new(vec![0.0, 1.0, 2.0, 3.0], 1).unwrap());
        let tree = BallTreeBuilder::new().build(cloud, L1).unwrap();
        save_tree(&path, &tree).unwrap();
        let smaller = Arc::new(DataRam::new(vec![0.0, 1.0], 1).unwrap());
        assert!(load_tree(&path, smaller, L1).is_err());
        assert!(load_tree(dir.path().join("missing.json"), Arc::new(DataRam::new(Vec::new(), 1).unwrap()), L1).is_err());
    }

    #[test]
    fn tree_from_yaml() {
        let dir = TempDir::new("balltree_utils").unwrap();
        fs::write(dir.path().join("data.csv"), "0,0\n1,0\n0,1\n10,10\n").unwrap();
        fs::write(dir.path().join("labels.csv"), "a\nb\nc\nd\n").unwrap();
        let yaml_path = dir.path().join("tree.yml");
        fs::write(
            &yaml_path,
            "---\nleaf_size: 2\ndata_path: data.csv\ndata_dim: 2\nlabels_path: labels.csv\nlabel_csv_index: 0\n",
        )
        .unwrap();
        let tree = ball_tree_from_yaml(&yaml_path, L2).unwrap();
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.parameters().leaf_size, 2);
        assert_eq!(tree.point_cloud().label_or_index(3).unwrap(), Label::from("d"));
    }
}
