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

//! The errors that can occor when a ball tree is being built, queried, saved or loaded.
//! Most errors are floated up from `PointCloud` as that's the i/o layer.

use pointcloud::pc_errors::PointCloudError;
use pointcloud::PointIndex;
use std::error::Error;
use std::fmt;
use std::io;

/// Helper type for a call that could go wrong.
pub type BallTreeResult<T> = Result<T, BallTreeError>;

/// Error type for the ball tree. Mostly this is a wrapper around `PointCloudError`, as the data
/// i/o is where most errors happen.
#[derive(Debug)]
pub enum BallTreeError {
    /// Malformed rows or an unreadable index, surfaced by the point cloud or the metric
    PointCloudError(PointCloudError),
    /// The metric returned a NaN or an infinity
    NonFiniteDistance {
        /// The point being placed or scored
        reference: PointIndex,
        /// The pivot or query it was measured against, if it is a point of the cloud
        other: Option<PointIndex>,
        /// What the metric returned
        distance: f32,
    },
    /// The caller asked the build or the query to stop
    Cancelled,
    /// A builder or query parameter is out of range
    InvalidParameter(String),
    /// A saved tree doesn't fit the point cloud it was loaded against
    CorruptState(String),
    /// IO error when opening files
    IoError(io::Error),
    /// Parsing error when loading a config or a saved tree
    ParsingError(ParsingError),
}

impl fmt::Display for BallTreeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            BallTreeError::IoError(ref e) => write!(f, "{}", e),
            BallTreeError::ParsingError(ref e) => write!(f, "{}", e),
            BallTreeError::PointCloudError(ref e) => write!(f, "{}", e),
            BallTreeError::NonFiniteDistance {
                reference,
                other,
                distance,
            } => match other {
                Some(other) => write!(
                    f,
                    "the distance between points {} and {} is {}",
                    reference, other, distance
                ),
                None => write!(
                    f,
                    "the distance between point {} and the query is {}",
                    reference, distance
                ),
            },
            BallTreeError::Cancelled => write!(f, "the operation was cancelled"),
            BallTreeError::InvalidParameter(ref msg) => write!(f, "invalid parameter: {}", msg),
            BallTreeError::CorruptState(ref msg) => write!(f, "corrupt tree state: {}", msg),
        }
    }
}

impl Error for BallTreeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match *self {
            BallTreeError::IoError(ref e) => Some(e),
            BallTreeError::ParsingError(ref e) => Some(e),
            BallTreeError::PointCloudError(ref e) => Some(e),
            _ => None,
        }
    }
}

impl From<PointCloudError> for BallTreeError {
    fn from(err: PointCloudError) -> Self {
        BallTreeError::PointCloudError(err)
    }
}

impl From<io::Error> for BallTreeError {
    fn from(err: io::Error) -> Self {
        BallTreeError::IoError(err)
    }
}

impl From<serde_json::Error> for BallTreeError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            BallTreeError::IoError(err.into())
        } else {
            BallTreeError::ParsingError(ParsingError::JsonError(err))
        }
    }
}

impl From<BallTreeError> for io::Error {
    fn from(err: BallTreeError) -> Self {
        match err {
            BallTreeError::IoError(e) => e,
            e => io::Error::new(io::ErrorKind::Other, Box::new(e)),
        }
    }
}

/// A parsing error occored while doing something with text
#[derive(Debug)]
pub enum ParsingError {
    /// Yaml was messed up
    MalformedYamlError {
        /// The file that was messed up
        file_name: String,
        /// The value that was messed up
        field: String,
    },
    /// A saved tree couldn't be decoded
    JsonError(serde_json::Error),
}

impl fmt::Display for ParsingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ParsingError::MalformedYamlError {
                ref file_name,
                ref field,
            } => write!(f, "malformed yaml field {} in {}", field, file_name),
            ParsingError::JsonError(ref e) => write!(f, "{}", e),
        }
    }
}

impl Error for ParsingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match *self {
            ParsingError::JsonError(ref e) => Some(e),
            ParsingError::MalformedYamlError { .. } => None,
        }
    }
}
