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

//! The output of bulk queries, one row per (query, neighbor) pair.

use crate::errors::*;
use pointcloud::label_sources::Label;
use pointcloud::{LabeledCloud, PointIndex};
use serde::{Deserialize, Serialize};
use std::slice::Iter;

/// A neighbor of a query. `rank` is the neighbor's 0-based position in the query's sorted list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborRow {
    /// Label of the query row, its index when unlabeled
    pub query_label: Label,
    /// Label of the reference row, its index when unlabeled
    pub neighbor_label: Label,
    /// Distance between the two
    pub distance: f32,
    /// 0 for the closest neighbor
    pub rank: usize,
}

/// Neighbors of a batch of queries, grouped by query in query order and sorted by distance within
/// each query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NeighborTable {
    rows: Vec<NeighborRow>,
}

impl NeighborTable {
    /// Labels sorted neighbor lists. Entry `i` of `neighbors` belongs to query row `i`.
    pub fn from_neighbors<Q: LabeledCloud, R: LabeledCloud>(
        neighbors: &[Vec<(f32, PointIndex)>],
        queries: &Q,
        references: &R,
    ) -> BallTreeResult<NeighborTable> {
        let mut rows = Vec::with_capacity(neighbors.iter().map(|n| n.len()).sum());
        for (query, query_neighbors) in neighbors.iter().enumerate() {
            if query_neighbors.is_empty() {
                continue;
            }
            let query_label = queries.label_or_index(query)?;
            for (rank, (distance, reference)) in query_neighbors.iter().enumerate() {
                rows.push(NeighborRow {
                    query_label: query_label.clone(),
                    neighbor_label: references.label_or_index(*reference)?,
                    distance: *distance,
                    rank,
                });
            }
        }
        Ok(NeighborTable { rows })
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// If no query found a neighbor
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All rows
    pub fn rows(&self) -> &[NeighborRow] {
        &self.rows
    }

    /// Iterates over the rows
    pub fn iter(&self) -> Iter<'_, NeighborRow> {
        self.rows.iter()
    }

    /// The rows of one query, closest first
    pub fn for_query<'a>(&'a self, query_label: &'a Label) -> impl Iterator<Item = &'a NeighborRow> {
        self.rows
            .iter()
            .filter(move |row| &row.query_label == query_label)
    }

    /// Gives up the rows
    pub fn into_rows(self) -> Vec<NeighborRow> {
        self.rows
    }
}

impl<'a> IntoIterator for &'a NeighborTable {
    type Item = &'a NeighborRow;
    type IntoIter = Iter<'a, NeighborRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
