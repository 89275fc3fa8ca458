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

//! Weighted sums of metrics over named groups of columns. This is how heterogeneous rows, say
//! a block of coordinates and a block of counts, get measured with one distance.

use crate::distances::Metric;
use crate::pc_errors::*;
use crate::PointRef;
use smallvec::SmallVec;

type Gathered = SmallVec<[f32; 32]>;
type GatheredIndexes = SmallVec<[u32; 32]>;

/// One term of a composite distance.
#[derive(Debug)]
pub struct MetricComponent {
    name: String,
    columns: Vec<u32>,
    weight: f32,
    metric: Box<dyn Metric>,
}

impl MetricComponent {
    /// Creates a term. The columns are sorted and de-duplicated, the weight must be finite and
    /// non-negative.
    pub fn new<M: Metric>(
        name: &str,
        mut columns: Vec<u32>,
        weight: f32,
        metric: M,
    ) -> PointCloudResult<MetricComponent> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(PointCloudError::malformed(format!(
                "component {} has an invalid weight {}",
                name, weight
            )));
        }
        if columns.is_empty() {
            return Err(PointCloudError::malformed(format!(
                "component {} covers no columns",
                name
            )));
        }
        columns.sort_unstable();
        columns.dedup();
        Ok(MetricComponent {
            name: name.to_string(),
            columns,
            weight,
            metric: Box::new(metric),
        })
    }

    /// Name of the column group
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sorted columns this term reads
    pub fn columns(&self) -> &[u32] {
        &self.columns
    }

    /// Weight of this term in the sum
    pub fn weight(&self) -> f32 {
        self.weight
    }

    fn gather(&self, x: &[f32]) -> Gathered {
        self.columns
            .iter()
            .map(|c| x.get(*c as usize).copied().unwrap_or(0.0))
            .collect()
    }

    fn filter<'a>(&self, ind: &'a [u32], val: &'a [f32]) -> (GatheredIndexes, Gathered) {
        ind.iter()
            .zip(val)
            .filter(|(i, _)| self.columns.binary_search(*i).is_ok())
            .map(|(i, v)| (*i, *v))
            .unzip()
    }
}

/// The weighted sum of its components.
#[derive(Debug)]
pub struct CompositeMetric {
    components: Vec<MetricComponent>,
}

impl CompositeMetric {
    /// Glues the components together, there has to be at least one.
    pub fn new(components: Vec<MetricComponent>) -> PointCloudResult<CompositeMetric> {
        if components.is_empty() {
            return Err(PointCloudError::malformed(
                "a composite metric needs at least one component",
            ));
        }
        Ok(CompositeMetric { components })
    }

    /// The terms of the sum
    pub fn components(&self) -> &[MetricComponent] {
        &self.components
    }

    /// The largest column any component reads
    pub fn max_column(&self) -> Option<u32> {
        self.components
            .iter()
            .filter_map(|c| c.columns.last().copied())
            .max()
    }
}

impl Metric for CompositeMetric {
    fn dense(&self, x: &[f32], y: &[f32]) -> f32 {
        self.components
            .iter()
            .map(|c| c.weight * c.metric.dense(&c.gather(x), &c.gather(y)))
            .fold(0.0, |acc, d| acc + d)
    }

    fn sparse(&self, x_ind: &[u32], x_val: &[f32], y_ind: &[u32], y_val: &[f32]) -> f32 {
        self.components
            .iter()
            .map(|c| {
                let (xi, xv) = c.filter(x_ind, x_val);
                let (yi, yv) = c.filter(y_ind, y_val);
                c.weight * c.metric.sparse(&xi, &xv, &yi, &yv)
            })
            .fold(0.0, |acc, d| acc + d)
    }

    fn dist(&self, x: PointRef, y: PointRef) -> PointCloudResult<f32> {
        match (x, y) {
            (PointRef::Dense(x_vals), PointRef::Dense(y_vals)) => {
                if x_vals.len() != y_vals.len() {
                    return Err(PointCloudError::dimension_mismatch(
                        x_vals.len(),
                        y_vals.len(),
                    ));
                }
                if let Some(max_column) = self.max_column() {
                    if max_column as usize >= x_vals.len() {
                        return Err(PointCloudError::dimension_mismatch(
                            max_column as usize + 1,
                            x_vals.len(),
                        ));
                    }
                }
                Ok(self.dense(x_vals, y_vals))
            }
            (PointRef::Sparse(x_vals, x_ind), PointRef::Sparse(y_vals, y_ind)) => {
                Ok(self.sparse(x_ind, x_vals, y_ind, y_vals))
            }
            _ => Err(PointCloudError::MetricError),
        }
    }
}
