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

use rayon::prelude::*;
use std::cmp::{max, min};
use std::fmt::Debug;

use crate::distances::*;
use crate::label_sources::Label;
use crate::pc_errors::*;
use crate::*;

#[inline]
fn chunk(data_dim: usize) -> usize {
    max(min(15000 / max(data_dim, 1), 20), 1)
}

/// Base trait for a point cloud
pub trait PointCloud: Debug + Send + Sync + 'static {
    /// The number of samples this cloud covers
    fn len(&self) -> usize;
    /// If this is empty
    fn is_empty(&self) -> bool;
    /// The dimension of the underlying data
    fn dim(&self) -> usize;
    /// Indexes used for access
    fn reference_indexes(&self) -> Vec<PointIndex> {
        (0..self.len()).collect()
    }
    /// Gets a point from this dataset
    fn point(&self, pn: PointIndex) -> PointCloudResult<PointRef>;
    /// If the rows of this cloud are sparse
    fn is_sparse(&self) -> bool;

    /// Distances from one of our own points to a list of our points.
    fn distances_to_point_index<M: Metric>(
        &self,
        metric: &M,
        i: PointIndex,
        indexes: &[PointIndex],
    ) -> PointCloudResult<Vec<f32>> {
        self.distances_to_point(metric, self.point(i)?, indexes)
    }

    /// The main distance function. This paralizes if there are more than a few chunks of points.
    fn distances_to_point<M: Metric>(
        &self,
        metric: &M,
        x: PointRef,
        indexes: &[PointIndex],
    ) -> PointCloudResult<Vec<f32>> {
        let chunk = chunk(self.dim());
        if indexes.len() > chunk * 3 {
            indexes
                .par_chunks(chunk)
                .map(|chunk_indexes| {
                    chunk_indexes
                        .iter()
                        .map(|i| metric.dist(x, self.point(*i)?))
                        .collect::<PointCloudResult<Vec<f32>>>()
                })
                .collect::<PointCloudResult<Vec<Vec<f32>>>>()
                .map(|chunks| chunks.concat())
        } else {
            indexes
                .iter()
                .map(|i| metric.dist(x, self.point(*i)?))
                .collect()
        }
    }

    /// Checks that every row has the format of the cloud and, if dense, the width of the cloud.
    /// Sparse rows must have sorted indexes below the dimension.
    fn validate_rows(&self) -> PointCloudResult<()> {
        let sparse = self.is_sparse();
        let dim = self.dim();
        for i in 0..self.len() {
            check_row(self.point(i)?, sparse, dim)?;
        }
        Ok(())
    }
}

/// Checks a single row against a format and a dimension. Used for rows that come from outside of
/// a cloud as well.
pub fn check_row(point: PointRef, sparse: bool, dim: usize) -> PointCloudResult<()> {
    match point {
        PointRef::Dense(values) => {
            if sparse {
                return Err(PointCloudError::MetricError);
            }
            if values.len() != dim {
                return Err(PointCloudError::dimension_mismatch(dim, values.len()));
            }
        }
        PointRef::Sparse(values, indexes) => {
            if !sparse {
                return Err(PointCloudError::MetricError);
            }
            if values.len() != indexes.len() {
                return Err(PointCloudError::malformed(format!(
                    "sparse row has {} values and {} indexes",
                    values.len(),
                    indexes.len()
                )));
            }
            if indexes.windows(2).any(|w| w[0] >= w[1]) {
                return Err(PointCloudError::malformed(
                    "sparse row indexes are not strictly increasing",
                ));
            }
            if let Some(last) = indexes.last() {
                if *last as usize >= dim {
                    return Err(PointCloudError::dimension_mismatch(dim, *last as usize + 1));
                }
            }
        }
    }
    Ok(())
}

/// A collection of labels, one optional label per point
pub trait LabelSet: Debug + Send + Sync + 'static {
    /// Number of elements in this label set
    fn len(&self) -> usize;
    /// If there are no elements left in this label set
    fn is_empty(&self) -> bool;
    /// Grabs a label reference. Supports errors (the label could be remote),
    /// and partially labeled datasets with the option.
    fn label(&self, pn: PointIndex) -> PointCloudResult<Option<&Label>>;
}

/// Simply shoves together a point cloud and a label set, for a labeled cloud
pub trait LabeledCloud: PointCloud {
    /// Grabs a label reference. Supports errors (the label could be remote),
    /// and partially labeled datasets with the option.
    fn label(&self, pn: PointIndex) -> PointCloudResult<Option<&Label>>;

    /// The label of a point, or the point's index when it has none.
    fn label_or_index(&self, pn: PointIndex) -> PointCloudResult<Label> {
        Ok(self
            .label(pn)?
            .cloned()
            .unwrap_or(Label::Integer(pn as i64)))
    }
}

/// Simply shoves together a point cloud and a label set, for a labeled cloud
#[derive(Debug)]
pub struct SimpleLabeledCloud<D, L> {
    data: D,
    labels: L,
}

impl<D: PointCloud, L: LabelSet> SimpleLabeledCloud<D, L> {
    /// Creates a new one, the data and the labels have to describe the same number of points
    pub fn new(data: D, labels: L) -> PointCloudResult<Self> {
        if data.len() != labels.len() {
            return Err(PointCloudError::malformed(format!(
                "{} points but {} labels",
                data.len(),
                labels.len()
            )));
        }
        Ok(SimpleLabeledCloud { data, labels })
    }

    /// The data half
    pub fn data(&self) -> &D {
        &self.data
    }

    /// The label half
    pub fn labels(&self) -> &L {
        &self.labels
    }
}

impl<D: PointCloud, L: LabelSet> PointCloud for SimpleLabeledCloud<D, L> {
    #[inline]
    fn dim(&self) -> usize {
        self.data.dim()
    }
    #[inline]
    fn len(&self) -> usize {
        self.data.len()
    }
    #[inline]
    fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
    #[inline]
    fn reference_indexes(&self) -> Vec<PointIndex> {
        self.data.reference_indexes()
    }
    #[inline]
    fn point(&self, i: PointIndex) -> PointCloudResult<PointRef> {
        self.data.point(i)
    }
    #[inline]
    fn is_sparse(&self) -> bool {
        self.data.is_sparse()
    }
}

impl<D: PointCloud, L: LabelSet> LabeledCloud for SimpleLabeledCloud<D, L> {
    fn label(&self, pn: PointIndex) -> PointCloudResult<Option<&Label>> {
        self.labels.label(pn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_sources::{DataRam, SparseDataRam};
    use crate::label_sources::LabelColumn;

    #[test]
    fn parallel_distances_match_serial() {
        let count = 500;
        let data: Vec<f32> = (0..count * 2).map(|i| (i % 17) as f32).collect();
        let cloud = DataRam::new(data, 2).unwrap();
        let indexes: Vec<PointIndex> = (0..count).collect();
        let origin = vec![0.0, 0.0];
        let dists = cloud
            .distances_to_point(&L2, PointRef::from(&origin), &indexes)
            .unwrap();
        assert_eq!(dists.len(), count);
        for (i, d) in indexes.iter().zip(dists) {
            let expected = L2.dist(cloud.point(*i).unwrap(), PointRef::from(&origin)).unwrap();
            assert_approx_eq!(d, expected);
        }
        let small = cloud.distances_to_point_index(&L1, 1, &[0, 2]).unwrap();
        assert_eq!(small.len(), 2);
    }

    #[test]
    fn row_checks() {
        let dense = vec![1.0, 2.0];
        assert!(check_row(PointRef::from(&dense), false, 2).is_ok());
        assert!(check_row(PointRef::from(&dense), false, 3).is_err());
        assert!(check_row(PointRef::from(&dense), true, 2).is_err());
        assert!(check_row(PointRef::Sparse(&[1.0, 2.0], &[0, 4]), true, 5).is_ok());
        assert!(check_row(PointRef::Sparse(&[1.0, 2.0], &[0, 5]), true, 5).is_err());
        assert!(check_row(PointRef::Sparse(&[1.0, 2.0], &[3, 3]), true, 5).is_err());
        assert!(check_row(PointRef::Sparse(&[1.0], &[3, 4]), true, 5).is_err());
    }

    #[test]
    fn validate_whole_clouds() {
        let dense = DataRam::new(vec![0.0; 12], 3).unwrap();
        assert!(dense.validate_rows().is_ok());
        let sparse = SparseDataRam::new(vec![1.0, 1.0], vec![0, 2], vec![0, 1, 2], 3).unwrap();
        assert!(sparse.validate_rows().is_ok());
    }

    #[test]
    fn labels_fall_back_to_the_index() {
        let data = DataRam::new(vec![0.0, 1.0, 2.0], 1).unwrap();
        let labels =
            LabelColumn::from_options(vec![Some(Label::from("a")), None, Some(Label::Integer(7))]);
        let cloud = SimpleLabeledCloud::new(data, labels).unwrap();
        assert_eq!(cloud.label_or_index(0).unwrap(), Label::from("a"));
        assert_eq!(cloud.label_or_index(1).unwrap(), Label::Integer(1));
        assert_eq!(cloud.label_or_index(2).unwrap(), Label::Integer(7));
        assert!(cloud.label(3).is_err());
    }

    #[test]
    fn mismatched_labels_are_rejected() {
        let data = DataRam::new(vec![0.0, 1.0, 2.0], 1).unwrap();
        let labels = LabelColumn::new(vec![Label::Integer(1)]);
        assert!(SimpleLabeledCloud::new(data, labels).is_err());
    }
}
