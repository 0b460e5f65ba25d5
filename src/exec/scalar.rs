// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.
//! Row-level scalar values.
//!
//! Responsibilities:
//! - Bridges Arrow arrays and single row values for group keys, sort keys,
//!   and literal expressions.
//! - Provides the byte encoding used to key hash tables by row.
//!
//! Current limitations:
//! - Covers the column types wired through the execution layer (boolean,
//!   int32, int64, float64, utf8); other types surface explicit errors.

use std::cmp::Ordering;
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, BooleanArray, BooleanBuilder, Float64Array, Float64Builder, Int32Array,
    Int32Builder, Int64Array, Int64Builder, StringArray, StringBuilder,
};
use arrow::datatypes::DataType;

use crate::exec::chunk::Chunk;

/// A single value from one row of a column.
#[derive(Clone, Debug, PartialEq)]
pub enum ScalarValue {
    Null,
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Float64(f64),
    Utf8(String),
}

impl ScalarValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }

    pub fn data_type(&self) -> Option<DataType> {
        match self {
            ScalarValue::Null => None,
            ScalarValue::Boolean(_) => Some(DataType::Boolean),
            ScalarValue::Int32(_) => Some(DataType::Int32),
            ScalarValue::Int64(_) => Some(DataType::Int64),
            ScalarValue::Float64(_) => Some(DataType::Float64),
            ScalarValue::Utf8(_) => Some(DataType::Utf8),
        }
    }
}

/// Reads the value at `row` from `array`.
pub fn scalar_at(array: &ArrayRef, row: usize) -> Result<ScalarValue, String> {
    if row >= array.len() {
        return Err(format!(
            "row {} out of range (len={})",
            row,
            array.len()
        ));
    }
    if array.is_null(row) {
        return Ok(ScalarValue::Null);
    }
    match array.data_type() {
        DataType::Boolean => {
            let a = array.as_any().downcast_ref::<BooleanArray>().unwrap();
            Ok(ScalarValue::Boolean(a.value(row)))
        }
        DataType::Int32 => {
            let a = array.as_any().downcast_ref::<Int32Array>().unwrap();
            Ok(ScalarValue::Int32(a.value(row)))
        }
        DataType::Int64 => {
            let a = array.as_any().downcast_ref::<Int64Array>().unwrap();
            Ok(ScalarValue::Int64(a.value(row)))
        }
        DataType::Float64 => {
            let a = array.as_any().downcast_ref::<Float64Array>().unwrap();
            Ok(ScalarValue::Float64(a.value(row)))
        }
        DataType::Utf8 => {
            let a = array.as_any().downcast_ref::<StringArray>().unwrap();
            Ok(ScalarValue::Utf8(a.value(row).to_string()))
        }
        other => Err(format!("unsupported scalar data type: {other}")),
    }
}

/// Appends a type-tagged byte encoding of `value` to `buf`.
///
/// The encoding is injective per column position, which makes concatenated
/// encodings usable as hash-table keys for multi-column rows.
pub fn encode_scalar(value: &ScalarValue, buf: &mut Vec<u8>) {
    match value {
        ScalarValue::Null => buf.push(0),
        ScalarValue::Boolean(v) => {
            buf.push(1);
            buf.push(u8::from(*v));
        }
        ScalarValue::Int32(v) => {
            buf.push(2);
            buf.extend_from_slice(&v.to_le_bytes());
        }
        ScalarValue::Int64(v) => {
            buf.push(3);
            buf.extend_from_slice(&v.to_le_bytes());
        }
        ScalarValue::Float64(v) => {
            buf.push(4);
            buf.extend_from_slice(&v.to_bits().to_le_bytes());
        }
        ScalarValue::Utf8(v) => {
            buf.push(5);
            buf.extend_from_slice(&(v.len() as u32).to_le_bytes());
            buf.extend_from_slice(v.as_bytes());
        }
    }
}

/// Encodes the values of `columns` at `row` into `buf`.
pub fn encode_row_key(
    chunk: &Chunk,
    columns: &[usize],
    row: usize,
    buf: &mut Vec<u8>,
) -> Result<(), String> {
    for &column in columns {
        let array = chunk.column(column)?;
        let value = scalar_at(&array, row)?;
        encode_scalar(&value, buf);
    }
    Ok(())
}

/// Total order over same-type scalars; nulls sort first.
pub fn compare_scalars(a: &ScalarValue, b: &ScalarValue) -> Result<Ordering, String> {
    match (a, b) {
        (ScalarValue::Null, ScalarValue::Null) => Ok(Ordering::Equal),
        (ScalarValue::Null, _) => Ok(Ordering::Less),
        (_, ScalarValue::Null) => Ok(Ordering::Greater),
        (ScalarValue::Boolean(x), ScalarValue::Boolean(y)) => Ok(x.cmp(y)),
        (ScalarValue::Int32(x), ScalarValue::Int32(y)) => Ok(x.cmp(y)),
        (ScalarValue::Int64(x), ScalarValue::Int64(y)) => Ok(x.cmp(y)),
        (ScalarValue::Float64(x), ScalarValue::Float64(y)) => Ok(x.total_cmp(y)),
        (ScalarValue::Utf8(x), ScalarValue::Utf8(y)) => Ok(x.cmp(y)),
        (x, y) => Err(format!("cannot compare scalars of mixed types: {x:?} vs {y:?}")),
    }
}

/// Builds an array of `data_type` from row scalars.
pub fn build_array(values: &[ScalarValue], data_type: &DataType) -> Result<ArrayRef, String> {
    match data_type {
        DataType::Boolean => {
            let mut builder = BooleanBuilder::with_capacity(values.len());
            for value in values {
                match value {
                    ScalarValue::Null => builder.append_null(),
                    ScalarValue::Boolean(v) => builder.append_value(*v),
                    other => return Err(type_mismatch(data_type, other)),
                }
            }
            Ok(Arc::new(builder.finish()))
        }
        DataType::Int32 => {
            let mut builder = Int32Builder::with_capacity(values.len());
            for value in values {
                match value {
                    ScalarValue::Null => builder.append_null(),
                    ScalarValue::Int32(v) => builder.append_value(*v),
                    other => return Err(type_mismatch(data_type, other)),
                }
            }
            Ok(Arc::new(builder.finish()))
        }
        DataType::Int64 => {
            let mut builder = Int64Builder::with_capacity(values.len());
            for value in values {
                match value {
                    ScalarValue::Null => builder.append_null(),
                    ScalarValue::Int64(v) => builder.append_value(*v),
                    other => return Err(type_mismatch(data_type, other)),
                }
            }
            Ok(Arc::new(builder.finish()))
        }
        DataType::Float64 => {
            let mut builder = Float64Builder::with_capacity(values.len());
            for value in values {
                match value {
                    ScalarValue::Null => builder.append_null(),
                    ScalarValue::Float64(v) => builder.append_value(*v),
                    other => return Err(type_mismatch(data_type, other)),
                }
            }
            Ok(Arc::new(builder.finish()))
        }
        DataType::Utf8 => {
            let mut builder = StringBuilder::new();
            for value in values {
                match value {
                    ScalarValue::Null => builder.append_null(),
                    ScalarValue::Utf8(v) => builder.append_value(v),
                    other => return Err(type_mismatch(data_type, other)),
                }
            }
            Ok(Arc::new(builder.finish()))
        }
        other => Err(format!("unsupported output data type: {other}")),
    }
}

/// Builds a constant array of length `len`.
pub fn build_repeated_array(
    value: &ScalarValue,
    data_type: &DataType,
    len: usize,
) -> Result<ArrayRef, String> {
    let values = vec![value.clone(); len];
    build_array(&values, data_type)
}

fn type_mismatch(data_type: &DataType, value: &ScalarValue) -> String {
    format!("scalar {value:?} does not fit array type {data_type}")
}
