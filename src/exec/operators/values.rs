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
//! VALUES source operator.
//!
//! Responsibilities:
//! - Produces literal rows from a values plan node as source chunks.
//! - Every driver emits the full chunk list; a values pipeline runs on one
//!   driver unless the node was explicitly marked parallelizable.

use crate::exec::chunk::Chunk;
use crate::exec::pipeline::operator::Operator;

/// Finite source emitting the plan node's literal chunks in order.
pub struct Values {
    operator_id: i32,
    chunks: Vec<Chunk>,
    next: usize,
}

impl Values {
    pub fn new(operator_id: i32, chunks: Vec<Chunk>) -> Self {
        Self {
            operator_id,
            chunks,
            next: 0,
        }
    }
}

impl Operator for Values {
    fn operator_id(&self) -> i32 {
        self.operator_id
    }

    fn name(&self) -> &str {
        "Values"
    }

    fn need_input(&self) -> bool {
        false
    }

    fn push_chunk(&mut self, _chunk: Chunk) -> Result<(), String> {
        Err("values operator does not accept input".to_string())
    }

    fn pull_chunk(&mut self) -> Result<Option<Chunk>, String> {
        if self.next >= self.chunks.len() {
            return Ok(None);
        }
        let chunk = self.chunks[self.next].clone();
        self.next += 1;
        Ok(Some(chunk))
    }

    fn set_finishing(&mut self) -> Result<(), String> {
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.next >= self.chunks.len()
    }
}
