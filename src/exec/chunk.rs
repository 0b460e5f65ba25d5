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
//! Columnar chunk wrapper.
//!
//! Responsibilities:
//! - Wraps Arrow `RecordBatch` as the unit of data flowing between operators.
//! - Provides the positional column access and slicing helpers operators use.

use std::sync::Arc;

use arrow::array::{ArrayRef, RecordBatch};
use arrow::compute::concat_batches;
use arrow::datatypes::{Schema, SchemaRef};

/// A chunk of data, consisting of multiple rows. Wrapper around Arrow RecordBatch.
#[derive(Debug, Clone)]
pub struct Chunk {
    batch: RecordBatch,
}

impl Chunk {
    pub fn new(batch: RecordBatch) -> Self {
        Self { batch }
    }

    pub fn empty(schema: SchemaRef) -> Self {
        Self {
            batch: RecordBatch::new_empty(schema),
        }
    }

    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn into_batch(self) -> RecordBatch {
        self.batch
    }

    pub fn len(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.num_rows() == 0
    }

    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    pub fn columns(&self) -> &[ArrayRef] {
        self.batch.columns()
    }

    pub fn column(&self, index: usize) -> Result<ArrayRef, String> {
        self.batch.columns().get(index).cloned().ok_or_else(|| {
            format!(
                "column index {} out of range (num_columns={})",
                index,
                self.batch.num_columns()
            )
        })
    }

    pub fn slice(&self, offset: usize, length: usize) -> Self {
        Self {
            batch: self.batch.slice(offset, length),
        }
    }

    pub fn estimated_bytes(&self) -> usize {
        self.batch.get_array_memory_size()
    }

    /// Concatenates chunks sharing `schema` into one chunk.
    pub fn concat(schema: &SchemaRef, chunks: &[Chunk]) -> Result<Chunk, String> {
        let batches: Vec<&RecordBatch> = chunks.iter().map(|c| &c.batch).collect();
        let batch = concat_batches(schema, batches)
            .map_err(|e| format!("concat chunks failed: {e}"))?;
        Ok(Chunk::new(batch))
    }
}

impl Default for Chunk {
    fn default() -> Self {
        Self {
            batch: RecordBatch::new_empty(Arc::new(Schema::empty())),
        }
    }
}
