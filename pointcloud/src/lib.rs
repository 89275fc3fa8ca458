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
//! # Point Cloud
//! Row access for the ball tree. A cloud hands out dense or sparse rows by index, can be glued
//! to a label set, and the metrics in this crate measure distances between those rows.

#![warn(missing_docs)]

#[cfg(test)]
#[macro_use]
extern crate assert_approx_eq;

mod distances;
pub use distances::*;
mod composite;
pub use composite::*;
pub mod pc_errors;

pub mod data_sources;
pub mod label_sources;
pub mod loaders;

mod base_traits;
#[doc(inline)]
pub use base_traits::*;

use data_sources::DataRam;
use label_sources::LabelColumn;
use serde::{Deserialize, Serialize};

/// A sensible default for a labeled cloud
pub type DefaultLabeledCloud = SimpleLabeledCloud<DataRam, LabelColumn>;
/// A sensible default for an unlabeled cloud
pub type DefaultCloud = DataRam;

/// To make things more obvious, we type the point index.
pub type PointIndex = usize;

/// Reference to a point inside of a dataset.
#[derive(Clone, Copy, Debug)]
pub enum PointRef<'a> {
    /// Dense reference
    Dense(&'a [f32]),
    /// Sparse reference, values, then indexes
    Sparse(&'a [f32], &'a [u32]),
}

impl<'a> PointRef<'a> {
    /// If this is a sparse row
    pub fn is_sparse(&self) -> bool {
        matches!(self, PointRef::Sparse(..))
    }

    /// Copies the row out of the data source.
    pub fn to_point(&self) -> Point {
        match *self {
            PointRef::Dense(v) => Point::Dense(v.to_vec()),
            PointRef::Sparse(v, i) => Point::Sparse(v.to_vec(), i.to_vec()),
        }
    }
}

impl<'a> From<&'a [f32]> for PointRef<'a> {
    fn from(x: &'a [f32]) -> PointRef<'a> {
        PointRef::Dense(x)
    }
}

impl<'a> From<&'a Vec<f32>> for PointRef<'a> {
    fn from(x: &'a Vec<f32>) -> PointRef<'a> {
        PointRef::Dense(&x[..])
    }
}

impl<'a> From<&'a Point> for PointRef<'a> {
    fn from(x: &'a Point) -> PointRef<'a> {
        x.to_ref()
    }
}

/// An actual point, self contained with it's own objects on the heap.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Point {
    /// Dense contiguous point
    Dense(Vec<f32>),
    /// Sparse contiguous point, values then indexes
    Sparse(Vec<f32>, Vec<u32>),
}

impl Point {
    /// Borrows a point. Should be an implementation of `AsRef`, but the lifetimes disagreed.
    pub fn to_ref(&self) -> PointRef<'_> {
        match self {
            Point::Dense(v) => PointRef::Dense(&v[..]),
            Point::Sparse(v, i) => PointRef::Sparse(&v[..], &i[..]),
        }
    }
}
