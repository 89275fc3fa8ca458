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

//! Supported distances

use super::PointRef;
use crate::pc_errors::*;
use std::cmp::Ordering;
use std::fmt::Debug;
use std::iter::{Peekable, Zip};
use std::slice::Iter;
use std::sync::Arc;

/// The trait that enables a metric. Metrics are values so that they can carry configuration and
/// be stored in the index that uses them.
pub trait Metric: Debug + Send + Sync + 'static {
    /// Dense calculation, the slices have the same length
    fn dense(&self, x: &[f32], y: &[f32]) -> f32;
    /// Sparse calculation, we assume that the index slices are in accending order and
    /// that the values correspond to the indexes
    fn sparse(&self, x_ind: &[u32], x_val: &[f32], y_ind: &[u32], y_val: &[f32]) -> f32;
    /// Useful external calculation. Checks that the two rows have the same format and, for dense
    /// rows, the same width.
    fn dist(&self, x: PointRef, y: PointRef) -> PointCloudResult<f32> {
        match (x, y) {
            (PointRef::Dense(x_vals), PointRef::Dense(y_vals)) => {
                if x_vals.len() != y_vals.len() {
                    return Err(PointCloudError::dimension_mismatch(
                        x_vals.len(),
                        y_vals.len(),
                    ));
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

impl<M: Metric + ?Sized> Metric for Box<M> {
    fn dense(&self, x: &[f32], y: &[f32]) -> f32 {
        (**self).dense(x, y)
    }
    fn sparse(&self, x_ind: &[u32], x_val: &[f32], y_ind: &[u32], y_val: &[f32]) -> f32 {
        (**self).sparse(x_ind, x_val, y_ind, y_val)
    }
    fn dist(&self, x: PointRef, y: PointRef) -> PointCloudResult<f32> {
        (**self).dist(x, y)
    }
}

impl<M: Metric + ?Sized> Metric for Arc<M> {
    fn dense(&self, x: &[f32], y: &[f32]) -> f32 {
        (**self).dense(x, y)
    }
    fn sparse(&self, x_ind: &[u32], x_val: &[f32], y_ind: &[u32], y_val: &[f32]) -> f32 {
        (**self).sparse(x_ind, x_val, y_ind, y_val)
    }
    fn dist(&self, x: PointRef, y: PointRef) -> PointCloudResult<f32> {
        (**self).dist(x, y)
    }
}

/// Walks two sorted sparse rows at once and yields the coordinate differences over the union of
/// their indexes. Coordinates missing from a row are zero.
pub(crate) struct SparseDiffs<'a> {
    x: Peekable<Zip<Iter<'a, u32>, Iter<'a, f32>>>,
    y: Peekable<Zip<Iter<'a, u32>, Iter<'a, f32>>>,
}

impl<'a> SparseDiffs<'a> {
    pub(crate) fn new(
        x_ind: &'a [u32],
        x_val: &'a [f32],
        y_ind: &'a [u32],
        y_val: &'a [f32],
    ) -> SparseDiffs<'a> {
        SparseDiffs {
            x: x_ind.iter().zip(x_val.iter()).peekable(),
            y: y_ind.iter().zip(y_val.iter()).peekable(),
        }
    }
}

impl<'a> Iterator for SparseDiffs<'a> {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let order = match (self.x.peek(), self.y.peek()) {
            (Some((xi, _)), Some((yi, _))) => xi.cmp(yi),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => return None,
        };
        match order {
            Ordering::Equal => {
                let (_, xv) = self.x.next()?;
                let (_, yv) = self.y.next()?;
                Some(xv - yv)
            }
            Ordering::Less => self.x.next().map(|(_, xv)| *xv),
            Ordering::Greater => self.y.next().map(|(_, yv)| -yv),
        }
    }
}

/// L2 norm, the square root of the sum of squares
#[derive(Debug, Clone, Copy, Default)]
pub struct L2;

impl Metric for L2 {
    #[inline]
    fn dense(&self, x: &[f32], y: &[f32]) -> f32 {
        x.iter()
            .zip(y)
            .map(|(xi, yi)| (xi - yi) * (xi - yi))
            .fold(0.0, |acc, d| acc + d)
            .sqrt()
    }

    #[inline]
    fn sparse(&self, x_ind: &[u32], x_val: &[f32], y_ind: &[u32], y_val: &[f32]) -> f32 {
        SparseDiffs::new(x_ind, x_val, y_ind, y_val)
            .map(|d| d * d)
            .fold(0.0, |acc, d| acc + d)
            .sqrt()
    }
}

/// L1 norm, the sum of absolute values
#[derive(Debug, Clone, Copy, Default)]
pub struct L1;

impl Metric for L1 {
    #[inline]
    fn dense(&self, x: &[f32], y: &[f32]) -> f32 {
        x.iter()
            .zip(y)
            .map(|(xi, yi)| (xi - yi).abs())
            .fold(0.0, |acc, d| acc + d)
    }

    #[inline]
    fn sparse(&self, x_ind: &[u32], x_val: &[f32], y_ind: &[u32], y_val: &[f32]) -> f32 {
        SparseDiffs::new(x_ind, x_val, y_ind, y_val)
            .map(|d| d.abs())
            .fold(0.0, |acc, d| acc + d)
    }
}

/// L-infinity norm, the largest absolute coordinate difference
#[derive(Debug, Clone, Copy, Default)]
pub struct Linfty;

impl Metric for Linfty {
    #[inline]
    fn dense(&self, x: &[f32], y: &[f32]) -> f32 {
        x.iter()
            .zip(y)
            .map(|(xi, yi)| (xi - yi).abs())
            .fold(0.0, f32::max)
    }

    #[inline]
    fn sparse(&self, x_ind: &[u32], x_val: &[f32], y_ind: &[u32], y_val: &[f32]) -> f32 {
        SparseDiffs::new(x_ind, x_val, y_ind, y_val)
            .map(|d| d.abs())
            .fold(0.0, f32::max)
    }
}
