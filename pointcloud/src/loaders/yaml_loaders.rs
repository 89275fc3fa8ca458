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

use glob::{glob_with, MatchOptions};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};
use yaml_rust::{Yaml, YamlLoader};

use super::csv_loaders::*;
use crate::base_traits::*;
use crate::data_sources::DataRam;
use crate::label_sources::LabelColumn;
use crate::pc_errors::*;
use crate::*;

/// Reads the first document of a YAML file.
pub fn load_yaml<P: AsRef<Path>>(path: P) -> PointCloudResult<Yaml> {
    let file_name = path.as_ref().to_string_lossy().to_string();
    let config = fs::read_to_string(&path)?;
    let mut docs = YamlLoader::load_from_str(&config).map_err(|e| {
        PointCloudError::ParsingError(ParsingError::MalformedYamlError {
            file_name: file_name.clone(),
            field: e.to_string(),
        })
    })?;
    if docs.is_empty() {
        return Err(PointCloudError::ParsingError(
            ParsingError::MissingYamlError {
                file_name,
                field: "document".to_string(),
            },
        ));
    }
    Ok(docs.swap_remove(0))
}

/// Given a yaml file on disk, it builds a point cloud. Minimal example below.
/// ```yaml
/// ---
/// data_path: data/*.csv
/// data_dim: 784
/// has_headers: false
/// ```
/// The data path is a glob, relative to the yaml file. Matching files are concatenated in
/// alphabetical order. The dimension is optional and checked when given.
pub fn ram_from_yaml<P: AsRef<Path>>(path: P) -> PointCloudResult<DefaultCloud> {
    let params = load_yaml(&path)?;
    ram_from_yaml_params(&params, path.as_ref())
}

/// Given a yaml file on disk, it builds a labeled point cloud. Minimal example below.
/// ```yaml
/// ---
/// data_path: data.csv
/// labels_path: labels.csv
/// label_csv_index: 2
/// ```
/// Without a `labels_path` every point is unlabeled.
pub fn labeled_ram_from_yaml<P: AsRef<Path>>(path: P) -> PointCloudResult<DefaultLabeledCloud> {
    let params = load_yaml(&path)?;
    labeled_ram_from_yaml_params(&params, path.as_ref())
}

/// Like `ram_from_yaml`, for an already parsed document.
pub fn ram_from_yaml_params(params: &Yaml, yaml_path: &Path) -> PointCloudResult<DefaultCloud> {
    let has_headers = params["has_headers"].as_bool().unwrap_or(false);
    let data_paths = get_file_list(required_str(params, "data_path", yaml_path)?, yaml_path)?;

    let mut data_set = DataRam::new(vec![], 0)?;
    for path in &data_paths {
        debug!("reading {}", path.to_string_lossy());
        data_set.merge(open_dense_csv(path, has_headers)?)?;
    }
    info!(
        "loaded {} points of dimension {} from {} files",
        data_set.len(),
        data_set.dim(),
        data_paths.len()
    );
    if let Some(data_dim) = params["data_dim"].as_i64() {
        if data_dim < 0 || data_dim as usize != data_set.dim() {
            return Err(PointCloudError::dimension_mismatch(
                data_dim.max(0) as usize,
                data_set.dim(),
            ));
        }
    }
    Ok(data_set)
}

/// Like `labeled_ram_from_yaml`, for an already parsed document.
pub fn labeled_ram_from_yaml_params(
    params: &Yaml,
    yaml_path: &Path,
) -> PointCloudResult<DefaultLabeledCloud> {
    let data_set = ram_from_yaml_params(params, yaml_path)?;
    let label_set = match params["labels_path"].as_str() {
        Some(labels_reg) => {
            let has_headers = params["has_headers"].as_bool().unwrap_or(false);
            let index = params["label_csv_index"].as_i64().unwrap_or(0);
            if index < 0 {
                return Err(malformed_field(yaml_path, "label_csv_index"));
            }
            let mut labels = LabelColumn::default();
            for path in get_file_list(labels_reg, yaml_path)? {
                labels.merge(open_label_csv(&path, index as usize, has_headers)?);
            }
            labels
        }
        None => LabelColumn::unlabeled(data_set.len()),
    };
    SimpleLabeledCloud::new(data_set, label_set)
}

fn required_str<'a>(params: &'a Yaml, field: &str, yaml_path: &Path) -> PointCloudResult<&'a str> {
    params[field].as_str().ok_or_else(|| {
        PointCloudError::ParsingError(ParsingError::MissingYamlError {
            file_name: yaml_path.to_string_lossy().to_string(),
            field: field.to_string(),
        })
    })
}

fn malformed_field(yaml_path: &Path, field: &str) -> PointCloudError {
    PointCloudError::ParsingError(ParsingError::MalformedYamlError {
        file_name: yaml_path.to_string_lossy().to_string(),
        field: field.to_string(),
    })
}

fn get_file_list(files_reg: &str, yaml_path: &Path) -> PointCloudResult<Vec<PathBuf>> {
    let options = MatchOptions {
        case_sensitive: false,
        ..Default::default()
    };
    let files_reg_path = Path::new(files_reg);
    let pattern = if files_reg_path.is_absolute() {
        files_reg_path.to_path_buf()
    } else {
        yaml_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(files_reg_path)
    };
    let glob_paths = glob_with(&pattern.to_string_lossy(), options)
        .map_err(|_| malformed_field(yaml_path, files_reg))?;

    let mut paths = Vec::new();
    for entry in glob_paths {
        paths.push(entry.map_err(|e| PointCloudError::IoError(e.into_error()))?);
    }
    if paths.is_empty() {
        return Err(malformed_field(yaml_path, files_reg));
    }
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label_sources::Label;
    use tempdir::TempDir;

    #[test]
    fn yaml_with_glob_and_labels() {
        let dir = TempDir::new("yaml_loader").unwrap();
        fs::write(dir.path().join("part_0.csv"), "0,0\n1,1\n").unwrap();
        fs::write(dir.path().join("part_1.csv"), "2,2\n").unwrap();
        fs::write(dir.path().join("labels.csv"), "x,10\ny,11\nz,12\n").unwrap();
        let yaml_path = dir.path().join("data.yml");
        fs::write(
            &yaml_path,
            "---\ndata_path: part_*.csv\ndata_dim: 2\nlabels_path: labels.csv\nlabel_csv_index: 0\n",
        )
        .unwrap();

        let cloud = labeled_ram_from_yaml(&yaml_path).unwrap();
        assert_eq!(cloud.len(), 3);
        assert_eq!(cloud.dim(), 2);
        match cloud.point(2).unwrap() {
            PointRef::Dense(x) => assert_eq!(x, &[2.0, 2.0]),
            _ => panic!("dense csv produced a sparse row"),
        }
        assert_eq!(cloud.label(1).unwrap(), Some(&Label::from("y")));
    }

    #[test]
    fn yaml_without_labels() {
        let dir = TempDir::new("yaml_loader").unwrap();
        fs::write(dir.path().join("data.csv"), "0,0,0\n").unwrap();
        let yaml_path = dir.path().join("data.yml");
        fs::write(&yaml_path, "---\ndata_path: data.csv\n").unwrap();
        let cloud = labeled_ram_from_yaml(&yaml_path).unwrap();
        assert_eq!(cloud.label(0).unwrap(), None);
        assert_eq!(ram_from_yaml(&yaml_path).unwrap().dim(), 3);
    }

    #[test]
    fn yaml_problems_are_reported() {
        let dir = TempDir::new("yaml_loader").unwrap();
        fs::write(dir.path().join("data.csv"), "0,0,0\n").unwrap();
        let missing = dir.path().join("missing.yml");
        fs::write(&missing, "---\ndata_dim: 3\n").unwrap();
        assert!(ram_from_yaml(&missing).is_err());
        let wrong_dim = dir.path().join("wrong_dim.yml");
        fs::write(&wrong_dim, "---\ndata_path: data.csv\ndata_dim: 4\n").unwrap();
        assert!(ram_from_yaml(&wrong_dim).is_err());
        let no_match = dir.path().join("no_match.yml");
        fs::write(&no_match, "---\ndata_path: nothing_*.csv\n").unwrap();
        assert!(ram_from_yaml(&no_match).is_err());
    }
}
