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
//! Order-by operator.
//!
//! Responsibilities:
//! - Accumulates its whole input, sorts it once on finish, and emits the
//!   sorted result as a single chunk.

use crate::exec::chunk::Chunk;
use crate::exec::node::sort::SortKey;
use crate::exec::operators::sort_util::sort_chunk;
use crate::exec::pipeline::operator::Operator;

/// Blocking full sort.
pub struct OrderBy {
    operator_id: i32,
    keys: Vec<SortKey>,
    accumulated: Vec<Chunk>,
    result: Option<Chunk>,
    finishing: bool,
}

impl OrderBy {
    pub fn new(operator_id: i32, keys: Vec<SortKey>) -> Self {
        Self {
            operator_id,
            keys,
            accumulated: Vec::new(),
            result: None,
            finishing: false,
        }
    }
}

impl Operator for OrderBy {
    fn operator_id(&self) -> i32 {
        self.operator_id
    }

    fn name(&self) -> &str {
        "OrderBy"
    }

    fn need_input(&self) -> bool {
        !self.finishing
    }

    fn push_chunk(&mut self, chunk: Chunk) -> Result<(), String> {
        if self.finishing {
            return Err("order by received input after finish".to_string());
        }
        if !chunk.is_empty() {
            self.accumulated.push(chunk);
        }
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
        if self.accumulated.is_empty() {
            return Ok(());
        }
        let schema = self.accumulated[0].schema();
        let all = Chunk::concat(&schema, &self.accumulated)?;
        self.accumulated.clear();
        self.result = Some(sort_chunk(&all, &self.keys, None)?);
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.finishing && self.result.is_none()
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
    fn sorts_across_chunks() {
        let mut op = OrderBy::new(0, vec![SortKey::asc(0)]);
        op.push_chunk(chunk(&[3, 1])).expect("push");
        op.push_chunk(chunk(&[2])).expect("push");
        assert!(op.pull_chunk().expect("pull").is_none());
        op.set_finishing().expect("finish");
        let out = op.pull_chunk().expect("pull").expect("chunk");
        let col = out.column(0).expect("column");
        let col = col.as_any().downcast_ref::<Int64Array>().expect("int64");
        assert_eq!(col.values(), &[1, 2, 3]);
        assert!(op.is_finished());
    }

    #[test]
    fn empty_input_finishes_without_output() {
        let mut op = OrderBy::new(0, vec![SortKey::asc(0)]);
        op.set_finishing().expect("finish");
        assert!(op.pull_chunk().expect("pull").is_none());
        assert!(op.is_finished());
    }
}
