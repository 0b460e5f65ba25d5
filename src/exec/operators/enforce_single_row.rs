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
//! Single-row guard operator, as required by scalar subqueries.

use crate::exec::chunk::Chunk;
use crate::exec::pipeline::operator::Operator;

/// Passes through at most one row; more than one row is a query error.
pub struct EnforceSingleRow {
    operator_id: i32,
    row: Option<Chunk>,
    rows_seen: usize,
    finishing: bool,
}

impl EnforceSingleRow {
    pub fn new(operator_id: i32) -> Self {
        Self {
            operator_id,
            row: None,
            rows_seen: 0,
            finishing: false,
        }
    }
}

impl Operator for EnforceSingleRow {
    fn operator_id(&self) -> i32 {
        self.operator_id
    }

    fn name(&self) -> &str {
        "EnforceSingleRow"
    }

    fn need_input(&self) -> bool {
        !self.finishing
    }

    fn push_chunk(&mut self, chunk: Chunk) -> Result<(), String> {
        if self.finishing {
            return Err("enforce single row received input after finish".to_string());
        }
        self.rows_seen += chunk.len();
        if self.rows_seen > 1 {
            return Err(format!(
                "expected at most one row of input, received {}",
                self.rows_seen
            ));
        }
        if chunk.len() == 1 {
            self.row = Some(chunk);
        }
        Ok(())
    }

    fn pull_chunk(&mut self) -> Result<Option<Chunk>, String> {
        if self.finishing {
            Ok(self.row.take())
        } else {
            Ok(None)
        }
    }

    fn set_finishing(&mut self) -> Result<(), String> {
        self.finishing = true;
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.finishing && self.row.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{ArrayRef, Int64Array, RecordBatch};
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;

    fn chunk(values: &[i64]) -> Chunk {
        let schema = Arc::new(Schema::new(vec![Field::new("v", DataType::Int64, false)]));
        let array = Arc::new(Int64Array::from(values.to_vec())) as ArrayRef;
        Chunk::new(RecordBatch::try_new(schema, vec![array]).expect("record batch"))
    }

    #[test]
    fn passes_one_row_through() {
        let mut op = EnforceSingleRow::new(0);
        op.push_chunk(chunk(&[42])).expect("push");
        assert!(op.pull_chunk().expect("pull").is_none());
        op.set_finishing().expect("finish");
        let out = op.pull_chunk().expect("pull").expect("chunk");
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn rejects_a_second_row() {
        let mut op = EnforceSingleRow::new(0);
        op.push_chunk(chunk(&[1])).expect("push");
        let err = op.push_chunk(chunk(&[2])).unwrap_err();
        assert!(err.contains("at most one row"));
    }
}
