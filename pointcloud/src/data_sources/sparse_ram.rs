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

/// Sparse rows stored in ram in compressed sparse row form. Row `i` owns the values and column
/// indexes in `row_index[i]..row_index[i + 1]`.
#[derive(Debug, Clone)]
pub struct SparseDataRam {
    name: String,
    values: Vec<f32>,
    col_index: Vec<u32>,
    row_index: Vec<usize>,
    dim: usize,
}

impl SparseDataRam {
    /// Validates the three buffers. Offsets have to start at zero, never decrease and end at the
    /// number of values. Within a row the column indexes have to be strictly increasing and below
    /// the dimension.
    pub fn new(
        values: Vec<f32>,
        col_index: Vec<u32>,
        row_index: Vec<usize>,
        dim: usize,
    ) -> PointCloudResult<SparseDataRam> {
        if values.len() != col_index.len() {
            return Err(PointCloudError::malformed(format!(
                "{} values but {} column indexes",
                values.len(),
                col_index.len()
            )));
        }
        if row_index.first() != Some(&0) || row_index.last() != Some(&values.len()) {
            return Err(PointCloudError::malformed(
                "row offsets must start at 0 and end at the number of values",
            ));
        }
        for w in row_index.windows(2) {
            if w[0] > w[1] {
                return Err(PointCloudError::malformed("row offsets decrease"));
            }
            let cols = &col_index[w[0]..w[1]];
            if cols.windows(2).any(|c| c[0] >= c[1]) {
                return Err(PointCloudError::malformed(
                    "column indexes within a row must be strictly increasing",
                ));
            }
            if let Some(last) = cols.last() {
                if *last as usize >= dim {
                    return Err(PointCloudError::dimension_mismatch(dim, *last as usize + 1));
                }
            }
        }
        Ok(SparseDataRam {
            name: "SPARSE RAM".to_string(),
            values,
            col_index,
            row_index,
            dim,
        })
    }

    /// Builds the buffers out of `(column, value)` lists. Each list is sorted by column, two
    /// entries for the same column are an error.
    pub fn from_rows(rows: &[Vec<(u32, f32)>], dim: usize) -> PointCloudResult<SparseDataRam> {
        let mut values = Vec::new();
        let mut col_index = Vec::new();
        let mut row_index = Vec::with_capacity(rows.len() + 1);
        row_index.push(0);
        for row in rows {
            let mut row = row.clone();
            row.sort_by_key(|(c, _)| *c);
            for (c, v) in row {
                col_index.push(c);
                values.push(v);
            }
            row_index.push(values.len());
        }
        SparseDataRam::new(values, col_index, row_index, dim)
    }

    /// Names the source, the name shows up in access errors
    pub fn with_name(mut self, name: &str) -> SparseDataRam {
        self.name = name.to_string();
        self
    }

    /// Number of stored, non-zero, entries
    pub fn nnz(&self) -> usize {
        self.values.len()
    }
}

impl PointCloud for SparseDataRam {
    #[inline]
    fn len(&self) -> usize {
        self.row_index.len() - 1
    }
    #[inline]
    fn is_empty(&self) -> bool {
        self.row_index.len() <= 1
    }
    #[inline]
    fn dim(&self) -> usize {
        self.dim
    }
    fn point(&self, pn: PointIndex) -> PointCloudResult<PointRef> {
        match (self.row_index.get(pn), self.row_index.get(pn + 1)) {
            (Some(lower), Some(upper)) => Ok(PointRef::Sparse(
                &self.values[*lower..*upper],
                &self.col_index[*lower..*upper],
            )),
            _ => Err(PointCloudError::data_access(pn, &self.name)),
        }
    }
    #[inline]
    fn is_sparse(&self) -> bool {
        true
    }
}

/// Unlabeled, so every point is labeled by its index
impl LabeledCloud for SparseDataRam {
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
    fn rows_come_back_out() {
        let pc = SparseDataRam::from_rows(
            &[vec![(4, 1.0), (1, 2.0)], vec![], vec![(0, 3.0)]],
            5,
        )
        .unwrap();
        assert_eq!(pc.len(), 3);
        assert_eq!(pc.nnz(), 3);
        match pc.point(0).unwrap() {
            PointRef::Sparse(values, indexes) => {
                assert_eq!(values, &[2.0, 1.0]);
                assert_eq!(indexes, &[1, 4]);
            }
            _ => panic!("sparse source returned a dense row"),
        }
        match pc.point(1).unwrap() {
            PointRef::Sparse(values, _) => assert!(values.is_empty()),
            _ => panic!("sparse source returned a dense row"),
        }
        assert!(pc.point(3).is_err());
    }

    #[test]
    fn bad_buffers_are_rejected() {
        // offsets past the end
        assert!(SparseDataRam::new(vec![1.0], vec![0], vec![0, 2], 3).is_err());
        // unsorted columns
        assert!(SparseDataRam::new(vec![1.0, 1.0], vec![2, 1], vec![0, 2], 3).is_err());
        // column beyond the dimension
        assert!(SparseDataRam::new(vec![1.0], vec![3], vec![0, 1], 3).is_err());
        // duplicate column
        assert!(SparseDataRam::from_rows(&[vec![(1, 1.0), (1, 2.0)]], 3).is_err());
    }

    #[test]
    fn empty_source() {
        let pc = SparseDataRam::new(vec![], vec![], vec![0], 10).unwrap();
        assert!(pc.is_empty());
        assert_eq!(pc.len(), 0);
    }
}
