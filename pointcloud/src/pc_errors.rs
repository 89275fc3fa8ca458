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

//! The errors that can occur when a point cloud is loading, being read, or being measured
use std::error::Error;
use std::fmt;
use std::io;

/// Result alias for everything in this crate
pub type PointCloudResult<T> = Result<T, PointCloudError>;

/// Error type for the point cloud
#[derive(Debug)]
pub enum PointCloudError {
    /// Unable to retrieve some data point (given by index) from a data source (slice name)
    DataAccessError {
        /// Index of access error
        index: usize,
        /// Data source that had the access error
        slice_name: String,
    },
    /// A dense row was compared against a sparse row
    MetricError,
    /// Two rows, or a row and its source, disagree on the dimension
    DimensionMismatch {
        /// The dimension the source or the first row has
        expected: usize,
        /// The dimension that was found
        found: usize,
    },
    /// The raw buffers handed to a source or metric are inconsistent
    MalformedData(String),
    /// IO error when opening files
    IoError(io::Error),
    /// Parsing error when loading a YAML or CSV file
    ParsingError(ParsingError),
}

impl fmt::Display for PointCloudError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            PointCloudError::IoError(ref e) => write!(f, "{}", e),
            PointCloudError::ParsingError(ref e) => write!(f, "{}", e),
            PointCloudError::DataAccessError {
                index,
                ref slice_name,
            } => write!(f, "unable to read point {} from {}", index, slice_name),
            PointCloudError::MetricError => {
                write!(f, "a dense point cannot be measured against a sparse point")
            }
            PointCloudError::DimensionMismatch { expected, found } => write!(
                f,
                "dimension mismatch, expected {} and found {}",
                expected, found
            ),
            PointCloudError::MalformedData(ref msg) => write!(f, "malformed data: {}", msg),
        }
    }
}

impl Error for PointCloudError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match *self {
            PointCloudError::IoError(ref e) => Some(e),
            PointCloudError::ParsingError(ref e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for PointCloudError {
    fn from(err: io::Error) -> Self {
        PointCloudError::IoError(err)
    }
}

impl From<ParsingError> for PointCloudError {
    fn from(err: ParsingError) -> Self {
        PointCloudError::ParsingError(err)
    }
}

impl From<PointCloudError> for io::Error {
    fn from(err: PointCloudError) -> Self {
        match err {
            PointCloudError::IoError(e) => e,
            e => io::Error::new(io::ErrorKind::Other, Box::new(e)),
        }
    }
}

impl PointCloudError {
    /// If we can't get an element from a data source, gives the index and the source name
    pub fn data_access(index: usize, slice_name: &str) -> PointCloudError {
        PointCloudError::DataAccessError {
            index,
            slice_name: slice_name.to_string(),
        }
    }

    /// Two widths that should agree but don't
    pub fn dimension_mismatch(expected: usize, found: usize) -> PointCloudError {
        PointCloudError::DimensionMismatch { expected, found }
    }

    /// Shorthand for `MalformedData`
    pub fn malformed<S: Into<String>>(msg: S) -> PointCloudError {
        PointCloudError::MalformedData(msg.into())
    }
}

/// A parsing error occured while reading a descriptor or a data file
#[derive(Debug)]
pub enum ParsingError {
    /// Yaml was messed up
    MalformedYamlError {
        /// The file that was messed up
        file_name: String,
        /// The value that was messed up
        field: String,
    },
    /// A needed field was missing from the file.
    MissingYamlError {
        /// The file
        file_name: String,
        /// The missing field
        field: String,
    },
    /// An error reading the CSV
    CSVReadError {
        /// The file that the error occured in
        file_name: String,
        /// The line that was messed up
        line_number: usize,
        /// The entry that was messed up
        key: String,
    },
    /// Something else happened parsing a string
    RegularParsingError(&'static str),
}

impl fmt::Display for ParsingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ParsingError::MalformedYamlError {
                ref file_name,
                ref field,
            } => write!(f, "malformed yaml field {} in {}", field, file_name),
            ParsingError::MissingYamlError {
                ref file_name,
                ref field,
            } => write!(f, "missing yaml field {} in {}", field, file_name),
            ParsingError::CSVReadError {
                ref file_name,
                line_number,
                ref key,
            } => write!(
                f,
                "unable to read {:?} on line {} of {}",
                key, line_number, file_name
            ),
            ParsingError::RegularParsingError(msg) => write!(f, "{}", msg),
        }
    }
}

impl Error for ParsingError {}
