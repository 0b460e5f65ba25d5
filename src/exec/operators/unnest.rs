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
//! Unnest operator.
//!
//! Responsibilities:
//! - Flattens a list column into one row per element, replicating the
//!   configured companion columns; rows with null or empty lists drop out.

use std::sync::Arc;

use arrow::array::{Array, ListArray, RecordBatch, UInt32Array};
use arrow::compute::take;
use arrow::datatypes::{DataType, Field, Schema};

use crate::exec::chunk::Chunk;
use crate::exec::pipeline::operator::Operator;

/// List-flattening processor.
pub struct Unnest {
    operator_id: i32,
    replicate_columns: Vec<usize>,
    unnest_column: usize,
    pending: Option<Chunk>,
    finishing: bool,
}

impl Unnest {
    pub fn new(operator_id: i32, replicate_columns: Vec<usize>, unnest_column: usize) -> Self {
        Self {
            operator_id,
            replicate_columns,
            unnest_column,
            pending: None,
            finishing: false,
        }
    }

    fn process(&self, chunk: &Chunk) -> Result<Chunk, String> {
        let list_array = chunk.column(self.unnest_column)?;
        let list = list_array
            .as_any()
            .downcast_ref::<ListArray>()
            .ok_or_else(|| {
                format!(
                    "unnest column must be a list, got {}",
                    list_array.data_type()
                )
            })?;
        let offsets = list.value_offsets();
        let mut parent_rows = Vec::new();
        let mut element_rows = Vec::new();
        for row in 0..chunk.len() {
            if list.is_null(row) {
                continue;
            }
            let start = offsets[row] as u32;
            let end = offsets[row + 1] as u32;
            for element in start..end {
                parent_rows.push(row as u32);
                element_rows.push(element);
            }
        }

        let parent_indices = UInt32Array::from(parent_rows);
        let element_indices = UInt32Array::from(element_rows);
        let input_schema = chunk.schema();
        let mut fields = Vec::with_capacity(self.replicate_columns.len() + 1);
        let mut columns = Vec::with_capacity(fields.capacity());
        for &column in &self.replicate_columns {
            let replicated = take(chunk.column(column)?.as_ref(), &parent_indices, None)
                .map_err(|e| format!("unnest replicate failed: {e}"))?;
            fields.push(input_schema.field(column).clone());
            columns.push(replicated);
        }
        let element_type = match input_schema.field(self.unnest_column).data_type() {
            DataType::List(field) => field.data_type().clone(),
            other => return Err(format!("unnest column must be a list, got {other}")),
        };
        let elements = take(list.values().as_ref(), &element_indices, None)
            .map_err(|e| format!("unnest elements failed: {e}"))?;
        fields.push(Field::new(
            input_schema.field(self.unnest_column).name(),
            element_type,
            true,
        ));
        columns.push(elements);

        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)
            .map_err(|e| format!("unnest output failed: {e}"))?;
        Ok(Chunk::new(batch))
    }
}

impl Operator for Unnest {
    fn operator_id(&self) -> i32 {
        self.operator_id
    }

    fn name(&self) -> &str {
        "Unnest"
    }

    fn need_input(&self) -> bool {
        !self.finishing && self.pending.is_none()
    }

    fn push_chunk(&mut self, chunk: Chunk) -> Result<(), String> {
        if self.pending.is_some() {
            return Err("unnest received input while output is pending".to_string());
        }
        let out = self.process(&chunk)?;
        if !out.is_empty() {
            self.pending = Some(out);
        }
        Ok(())
    }

    fn pull_chunk(&mut self) -> Result<Option<Chunk>, String> {
        Ok(self.pending.take())
    }

    fn set_finishing(&mut self) -> Result<(), String> {
        self.finishing = true;
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.finishing && self.pending.is_none()
    }
}
