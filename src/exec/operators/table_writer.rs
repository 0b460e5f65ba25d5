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
//! Table writer operator.
//!
//! Responsibilities:
//! - Appends input rows through the connector insert handle, commits on
//!   finish, and reports the written row count as a single output row.

use std::sync::Arc;

use arrow::array::{ArrayRef, Int64Array, RecordBatch};
use arrow::datatypes::{DataType, Field, Schema};

use crate::connector::ConnectorInsertTableHandle;
use crate::exec::chunk::Chunk;
use crate::exec::pipeline::operator::Operator;

/// Writes rows through a connector handle.
pub struct TableWriter {
    operator_id: i32,
    handle: Arc<dyn ConnectorInsertTableHandle>,
    rows_written: i64,
    result: Option<Chunk>,
    finishing: bool,
}

impl TableWriter {
    pub fn new(operator_id: i32, handle: Arc<dyn ConnectorInsertTableHandle>) -> Self {
        Self {
            operator_id,
            handle,
            rows_written: 0,
            result: None,
            finishing: false,
        }
    }
}

impl Operator for TableWriter {
    fn operator_id(&self) -> i32 {
        self.operator_id
    }

    fn name(&self) -> &str {
        "TableWriter"
    }

    fn need_input(&self) -> bool {
        !self.finishing
    }

    fn push_chunk(&mut self, chunk: Chunk) -> Result<(), String> {
        if self.finishing {
            return Err("table writer received input after finish".to_string());
        }
        if chunk.is_empty() {
            return Ok(());
        }
        self.handle.append(&chunk)?;
        self.rows_written += chunk.len() as i64;
        Ok(())
    }

    fn pull_chunk(&mut self) -> Result<Option<Chunk>, String> {
        Ok(self.result.take())
    }

    fn set_finishing(&mut self) -> Result<(), String> {
        if self.finishing {
            return Ok(());
        }
        self.finishing = true;
        self.handle.commit()?;
        let schema = Arc::new(Schema::new(vec![Field::new("rows", DataType::Int64, false)]));
        let rows = Arc::new(Int64Array::from(vec![self.rows_written])) as ArrayRef;
        let batch = RecordBatch::try_new(schema, vec![rows])
            .map_err(|e| format!("table writer output failed: {e}"))?;
        self.result = Some(Chunk::new(batch));
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.finishing && self.result.is_none()
    }
}
