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

use csv::{Reader, ReaderBuilder, StringRecord};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::data_sources::DataRam;
use crate::label_sources::{Label, LabelColumn};
use crate::pc_errors::*;

fn open_reader<P: AsRef<Path>>(
    path: P,
    has_headers: bool,
) -> PointCloudResult<Reader<Box<dyn Read>>> {
    let file = File::open(&path)?;
    let source: Box<dyn Read> = match path.as_ref().extension() {
        Some(ext) if ext == "gz" => Box::new(GzDecoder::new(file)),
        _ => Box::new(file),
    };
    Ok(ReaderBuilder::new()
        .has_headers(has_headers)
        .flexible(true)
        .from_reader(source))
}

fn csv_error(path: &Path, e: csv::Error) -> PointCloudError {
    let line_number = e.position().map(|p| p.line() as usize).unwrap_or(0);
    match e.into_kind() {
        csv::ErrorKind::Io(e) => PointCloudError::IoError(e),
        kind => PointCloudError::ParsingError(ParsingError::CSVReadError {
            file_name: path.to_string_lossy().to_string(),
            line_number,
            key: format!("{:?}", kind),
        }),
    }
}

fn line_of(record: &StringRecord) -> usize {
    record.position().map(|p| p.line() as usize).unwrap_or(0)
}

/// Reads a CSV of numbers, one row per line. Every line has to have the same number of fields.
/// Files ending in `.gz` are decompressed on the fly.
pub fn open_dense_csv<P: AsRef<Path>>(path: P, has_headers: bool) -> PointCloudResult<DataRam> {
    let path = path.as_ref();
    let mut rdr = open_reader(path, has_headers)?;
    let mut data = Vec::new();
    let mut dim = None;
    for result in rdr.records() {
        let record = result.map_err(|e| csv_error(path, e))?;
        match dim {
            None => dim = Some(record.len()),
            Some(d) if d != record.len() => {
                return Err(PointCloudError::dimension_mismatch(d, record.len()))
            }
            _ => {}
        }
        for field in record.iter() {
            let val = field.trim().parse::<f32>().map_err(|_| {
                PointCloudError::ParsingError(ParsingError::CSVReadError {
                    file_name: path.to_string_lossy().to_string(),
                    line_number: line_of(&record),
                    key: field.to_string(),
                })
            })?;
            data.push(val);
        }
    }
    DataRam::new(data, dim.unwrap_or(0)).map(|ram| ram.with_name(&path.to_string_lossy()))
}

/// Reads one column of a CSV as labels. Integers become `Label::Integer`, anything else is a
/// string label, and empty or missing fields are unlabeled.
pub fn open_label_csv<P: AsRef<Path>>(
    path: P,
    index: usize,
    has_headers: bool,
) -> PointCloudResult<LabelColumn> {
    let path = path.as_ref();
    let mut rdr = open_reader(path, has_headers)?;
    let mut labels = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| csv_error(path, e))?;
        let label = match record.get(index) {
            Some(val) if !val.trim().is_empty() => Some(Label::parse(val)),
            _ => None,
        };
        labels.push(label);
    }
    Ok(LabelColumn::from_options(labels))
}
