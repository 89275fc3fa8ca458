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

//! Tools and data structures for assisting ball tree queries.

use crate::errors::*;

pub(crate) mod query_items;

mod candidates;
pub use candidates::CandidateSet;

/// The bounds of a query. `None` leaves that bound off, so the default query returns every
/// reference point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryParameters {
    /// Keep at most this many neighbors, the closest ones
    pub k: Option<usize>,
    /// Keep only neighbors strictly closer than this
    pub radius: Option<f32>,
    /// If a query that is itself a reference point may return that point
    pub include_self_edges: bool,
}

impl Default for QueryParameters {
    fn default() -> QueryParameters {
        QueryParameters {
            k: None,
            radius: None,
            include_self_edges: true,
        }
    }
}

impl QueryParameters {
    /// No bounds at all
    pub fn new() -> QueryParameters {
        QueryParameters::default()
    }

    /// The `k` closest points
    pub fn knn(k: usize) -> QueryParameters {
        QueryParameters::new().with_k(k)
    }

    /// Every point strictly within `radius`
    pub fn range(radius: f32) -> QueryParameters {
        QueryParameters::new().with_radius(radius)
    }

    /// Sets the neighbor cap
    pub fn with_k(mut self, k: usize) -> QueryParameters {
        self.k = Some(k);
        self
    }

    /// Sets the radius
    pub fn with_radius(mut self, radius: f32) -> QueryParameters {
        self.radius = Some(radius);
        self
    }

    /// Sets the self edge policy
    pub fn with_self_edges(mut self, include_self_edges: bool) -> QueryParameters {
        self.include_self_edges = include_self_edges;
        self
    }

    /// A radius has to be a non-negative number.
    pub fn validate(&self) -> BallTreeResult<()> {
        match self.radius {
            Some(r) if r.is_nan() || r < 0.0 => Err(BallTreeError::InvalidParameter(format!(
                "the radius must be a non-negative number, got {}",
                r
            ))),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radius_validation() {
        assert!(QueryParameters::range(0.0).validate().is_ok());
        assert!(QueryParameters::range(f32::INFINITY).validate().is_ok());
        assert!(QueryParameters::range(-1.0).validate().is_err());
        assert!(QueryParameters::range(f32::NAN).validate().is_err());
        assert!(QueryParameters::knn(0).validate().is_ok());
    }

    #[test]
    fn chaining() {
        let params = QueryParameters::knn(3)
            .with_radius(2.0)
            .with_self_edges(false);
        assert_eq!(params.k, Some(3));
        assert_eq!(params.radius, Some(2.0));
        assert!(!params.include_self_edges);
        assert!(QueryParameters::new().include_self_edges);
    }
}
