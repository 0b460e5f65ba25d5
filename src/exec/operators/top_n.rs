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
//! Top-N operator.
//!
//! Keeps the sort bounded: after each input chunk the accumulated state is
//! re-sorted and truncated to the limit, so memory stays proportional to N.

use crate::exec::chunk::Chunk;
use crate::exec::node::sort::SortKey;
use crate::exec::operators::sort_util::sort_chunk;
use crate::exec::pipeline::operator::Operator;

/// Bounded sort retaining the first `limit` rows of the sort order.
pub struct TopN {
    operator_id: i32,
    keys: Vec<SortKey>,
    limit: usize,
    top: Option<Chunk>,
    result: Option<Chunk>,
    finishing: bool,
}

impl TopN {
    pub fn new(operator_id: i32, keys: Vec<SortKey>, limit: usize) -> Self {
        Self {
            operator_id,
            keys,
            limit,
            top: None,
            result: None,
            finishing: false,
        }
    }
}

impl Operator for TopN {
    fn operator_id(&self) -> i32 {
        self.operator_id
    }

    fn name(&self) -> &str {
        "TopN"
    }

    fn need_input(&self) -> bool {
        !self.finishing
    }

    fn push_chunk(&mut self, chunk: Chunk) -> Result<(), String> {
        if self.finishing {
            return Err("top n received input after finish".to_string());
        }
        if chunk.is_empty() || self.limit == 0 {
            return Ok(());
        }
        let combined = match self.top.take() {
            Some(top) => Chunk::concat(&top.schema(), &[top, chunk])?,
            None => chunk,
        };
        self.top = Some(sort_chunk(&combined, &self.keys, Some(self.limit))?);
        Ok(())
    }

    fn pull_chunk(&mut self) -> Result<Option<Chunk>, String> {
        Ok(self.result.take())
    }

    fn set_finishing(&mut self) -> Result<(), String> {
        if !self.finishing {
            self.finishing = true;
            self.result = self.top.take();
        }
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
    fn keeps_the_smallest_rows() {
        let mut op = TopN::new(0, vec![SortKey::asc(0)], 2);
        op.push_chunk(chunk(&[9, 4])).expect("push");
        op.push_chunk(chunk(&[7, 1, 8])).expect("push");
        op.set_finishing().expect("finish");
        let out = op.pull_chunk().expect("pull").expect("chunk");
        let col = out.column(0).expect("column");
        let col = col.as_any().downcast_ref::<Int64Array>().expect("int64");
        assert_eq!(col.values(), &[1, 4]);
    }
}
