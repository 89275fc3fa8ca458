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

use crate::base_traits::*;
use crate::label_sources::Label;
use crate::pc_errors::{PointCloudError, PointCloudResult};
use crate::{PointIndex, PointRef};

/// Dense row-major data stored in ram, with a dimensionality.
#[derive(Debug, Clone)]
pub struct DataRam {
    name: String,
    data: Vec<f32>,
    dim: usize,
}

impl DataRam {
    /// Consumes your buffer and dimension and gives a dimensioned buffer. The buffer length has to
    /// be a multiple of the dimension.
    pub fn new(data: Vec<f32>, dim: usize) -> PointCloudResult<DataRam> {
        if dim == 0 {
            if !data.is_empty() {
                return Err(PointCloudError::malformed(
                    "non-empty data with dimension zero",
                ));
            }
        } else if data.len() % dim != 0 {
            return Err(PointCloudError::malformed(format!(
                "{} values do not split into rows of width {}",
                data.len(),
                dim
            )));
        }
        Ok(DataRam {
            name: "RAM".to_string(),
            data,
            dim,
        })
    }

    /// Glues rows of the same width together.
    pub fn from_rows(rows: &[Vec<f32>]) -> PointCloudResult<DataRam> {
        let dim = rows.first().map(|r| r.len()).unwrap_or(0);
        let mut data = Vec::with_capacity(dim * rows.len());
        for row in rows {
            if row.len() != dim {
                return Err(PointCloudError::dimension_mismatch(dim, row.len()));
            }
            data.extend_from_slice(row);
        }
        DataRam::new(data, dim)
    }

    /// Names the source, the name shows up in access errors
    pub fn with_name(mut self, name: &str) -> DataRam {
        self.name = name.to_string();
        self
    }

    /// Merges two ram sets together.
    pub fn merge(&mut self, other: DataRam) -> PointCloudResult<()> {
        if self.data.is_empty() && self.dim == 0 {
            self.dim = other.dim;
        }
        if self.dim != other.dim && !other.data.is_empty() {
            return Err(PointCloudError::dimension_mismatch(self.dim, other.dim));
        }
        self.data.extend(other.data);
        Ok(())
    }
}

impl PointCloud for DataRam {
    #[inline]
    fn dim(&self) -> usize {
        self.dim
    }
    #[inline]
    fn len(&self) -> usize {
        if self.dim == 0 {
            0
        } else {
            self.data.len() / self.dim
        }
    }
    #[inline]
    fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
    #[inline]
    fn point(&self, i: PointIndex) -> PointCloudResult<PointRef> {
        match self.data.get(self.dim * i..self.dim * i + self.dim) {
            Some(x) if self.dim > 0 => Ok(PointRef::Dense(x)),
            _ => Err(PointCloudError::data_access(i, &self.name)),
        }
    }
    #[inline]
    fn is_sparse(&self) -> bool {
        false
    }
}

/// Unlabeled, so every point is labeled by its index
impl LabeledCloud for DataRam {
    fn label(&self, pn: PointIndex) -> PointCloudResult<Option<&Label>> {
        if pn < self.len() {
            Ok(None)
        } else {
            Err(PointCloudError::data_access(pn, &self.name))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_correct() {
        let data: Vec<f32> = (0..30).map(|i| i as f32).collect();
        let pc = DataRam::new(data, 5).unwrap();
        assert_eq!(pc.len(), 6);
        match pc.point(2).unwrap() {
            PointRef::Dense(x) => assert_eq!(x, &[10.0, 11.0, 12.0, 13.0, 14.0]),
            _ => panic!("dense source returned a sparse row"),
        }
        assert!(pc.point(6).is_err());
        assert_eq!(pc.reference_indexes(), vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn bad_buffers_are_rejected() {
        assert!(DataRam::new(vec![0.0; 7], 3).is_err());
        assert!(DataRam::new(vec![0.0; 2], 0).is_err());
        assert!(DataRam::from_rows(&[vec![0.0, 1.0], vec![2.0]]).is_err());
    }

    #[test]
    fn empty_sources() {
        let pc = DataRam::new(vec![], 0).unwrap();
        assert_eq!(pc.len(), 0);
        assert!(pc.is_empty());
        assert!(pc.point(0).is_err());
        let from_nothing = DataRam::from_rows(&[]).unwrap();
        assert_eq!(from_nothing.len(), 0);
    }

    #[test]
    fn merging() {
        let mut pc = DataRam::from_rows(&[vec![0.0, 1.0]]).unwrap();
        pc.merge(DataRam::from_rows(&[vec![2.0, 3.0]]).unwrap())
            .unwrap();
        assert_eq!(pc.len(), 2);
        assert!(pc.merge(DataRam::from_rows(&[vec![2.0]]).unwrap()).is_err());
        assert_eq!(pc.label(1).unwrap(), None);
        assert!(pc.label(2).is_err());
    }
}
