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
//! Assign-unique-id operator.
//!
//! Responsibilities:
//! - Appends a 64-bit id column unique across the task: the task-unique id
//!   in the high bits, a block-allocated row counter in the low bits.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use arrow::array::{ArrayRef, Int64Array, RecordBatch};
use arrow::datatypes::{DataType, Field, Schema};

use crate::exec::chunk::Chunk;
use crate::exec::pipeline::operator::Operator;

/// Rows fetched from the shared counter per request; keeps contention low
/// while bounding the id range a dying driver can strand.
const ROWS_PER_REQUEST: i64 = 1 << 20;
const TASK_UNIQUE_ID_SHIFT: u32 = 40;

/// Appends the unique-id column.
pub struct AssignUniqueId {
    operator_id: i32,
    id_name: String,
    id_mask: i64,
    counter: Arc<AtomicI64>,
    block_next: i64,
    block_end: i64,
    pending: Option<Chunk>,
    finishing: bool,
}

impl AssignUniqueId {
    pub fn new(
        operator_id: i32,
        id_name: String,
        task_unique_id: i64,
        counter: Arc<AtomicI64>,
    ) -> Self {
        Self {
            operator_id,
            id_name,
            id_mask: task_unique_id << TASK_UNIQUE_ID_SHIFT,
            counter,
            block_next: 0,
            block_end: 0,
            pending: None,
            finishing: false,
        }
    }

    fn next_id(&mut self) -> i64 {
        if self.block_next == self.block_end {
            self.block_next = self.counter.fetch_add(ROWS_PER_REQUEST, Ordering::Relaxed);
            self.block_end = self.block_next + ROWS_PER_REQUEST;
        }
        let id = self.id_mask | self.block_next;
        self.block_next += 1;
        id
    }

    fn process(&mut self, chunk: &Chunk) -> Result<Chunk, String> {
        let ids: Vec<i64> = (0..chunk.len()).map(|_| self.next_id()).collect();
        let input_schema = chunk.schema();
        let mut fields: Vec<Field> = input_schema
            .fields()
            .iter()
            .map(|f| f.as_ref().clone())
            .collect();
        fields.push(Field::new(&self.id_name, DataType::Int64, false));
        let mut columns: Vec<ArrayRef> = chunk.columns().to_vec();
        columns.push(Arc::new(Int64Array::from(ids)));
        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)
            .map_err(|e| format!("assign unique id output failed: {e}"))?;
        Ok(Chunk::new(batch))
    }
}

impl Operator for AssignUniqueId {
    fn operator_id(&self) -> i32 {
        self.operator_id
    }

    fn name(&self) -> &str {
        "AssignUniqueId"
    }

    fn need_input(&self) -> bool {
        !self.finishing && self.pending.is_none()
    }

    fn push_chunk(&mut self, chunk: Chunk) -> Result<(), String> {
        if self.pending.is_some() {
            return Err("assign unique id received input while output is pending".to_string());
        }
        self.pending = Some(self.process(&chunk)?);
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
