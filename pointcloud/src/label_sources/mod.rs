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

//! Labels for the rows of a point cloud. A label is a scalar, either an integer or a string.

use crate::base_traits::*;
use crate::pc_errors::*;
use crate::PointIndex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A scalar label attached to a point
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Label {
    /// Integer label, also the fallback for unlabeled rows
    Integer(i64),
    /// Named label
    String(String),
}

impl Label {
    /// Reads a label out of a text field, integers first.
    pub fn parse(field: &str) -> Label {
        let field = field.trim();
        match field.parse::<i64>() {
            Ok(i) => Label::Integer(i),
            Err(_) => Label::String(field.to_string()),
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Label::Integer(i) => write!(f, "{}", i),
            Label::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for Label {
    fn from(i: i64) -> Label {
        Label::Integer(i)
    }
}

impl From<&str> for Label {
    fn from(s: &str) -> Label {
        Label::String(s.to_string())
    }
}

impl From<String> for Label {
    fn from(s: String) -> Label {
        Label::String(s)
    }
}

/// A column of labels held in ram. Missing entries are `None`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LabelColumn {
    labels: Vec<Option<Label>>,
}

impl LabelColumn {
    /// Every point is labeled
    pub fn new(labels: Vec<Label>) -> LabelColumn {
        LabelColumn {
            labels: labels.into_iter().map(Some).collect(),
        }
    }

    /// A partially labeled column
    pub fn from_options(labels: Vec<Option<Label>>) -> LabelColumn {
        LabelColumn { labels }
    }

    /// No point is labeled
    pub fn unlabeled(len: usize) -> LabelColumn {
        LabelColumn {
            labels: vec![None; len],
        }
    }

    /// Integer labels
    pub fn integers(labels: Vec<i64>) -> LabelColumn {
        LabelColumn::new(labels.into_iter().map(Label::Integer).collect())
    }

    /// String labels
    pub fn strings<S: Into<String>>(labels: Vec<S>) -> LabelColumn {
        LabelColumn::new(
            labels
                .into_iter()
                .map(|s| Label::String(s.into()))
                .collect(),
        )
    }

    /// Appends another column at the end of this one
    pub fn merge(&mut self, other: LabelColumn) {
        self.labels.extend(other.labels);
    }
}

impl LabelSet for LabelColumn {
    fn len(&self) -> usize {
        self.labels.len()
    }
    fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
    fn label(&self, pn: PointIndex) -> PointCloudResult<Option<&Label>> {
        match self.labels.get(pn) {
            Some(label) => Ok(label.as_ref()),
            None => Err(PointCloudError::data_access(pn, "label column")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_prefers_integers() {
        assert_eq!(Label::parse(" 12 "), Label::Integer(12));
        assert_eq!(Label::parse("cat"), Label::from("cat"));
        assert_eq!(format!("{}", Label::parse("-3")), "-3");
    }

    #[test]
    fn column_access() {
        let mut column = LabelColumn::integers(vec![3, 4]);
        column.merge(LabelColumn::unlabeled(1));
        column.merge(LabelColumn::strings(vec!["x"]));
        assert_eq!(column.len(), 4);
        assert_eq!(column.label(1).unwrap(), Some(&Label::Integer(4)));
        assert_eq!(column.label(2).unwrap(), None);
        assert_eq!(column.label(3).unwrap(), Some(&Label::from("x")));
        assert!(column.label(4).is_err());
    }
}
