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
//! Limit operator.

use crate::exec::chunk::Chunk;
use crate::exec::pipeline::operator::Operator;

/// Skips `offset` rows, then passes through at most `limit` rows.
pub struct Limit {
    operator_id: i32,
    remaining_offset: usize,
    remaining_limit: usize,
    pending: Option<Chunk>,
    finishing: bool,
}

impl Limit {
    pub fn new(operator_id: i32, offset: usize, limit: usize) -> Self {
        Self {
            operator_id,
            remaining_offset: offset,
            remaining_limit: limit,
            pending: None,
            finishing: false,
        }
    }
}

impl Operator for Limit {
    fn operator_id(&self) -> i32 {
        self.operator_id
    }

    fn name(&self) -> &str {
        "Limit"
    }

    fn need_input(&self) -> bool {
        !self.finishing && self.remaining_limit > 0 && self.pending.is_none()
    }

    fn push_chunk(&mut self, chunk: Chunk) -> Result<(), String> {
        if self.pending.is_some() {
            return Err("limit received input while output is pending".to_string());
        }
        if self.remaining_limit == 0 {
            return Ok(());
        }
        let mut chunk = chunk;
        if self.remaining_offset > 0 {
            let skip = self.remaining_offset.min(chunk.len());
            self.remaining_offset -= skip;
            if skip == chunk.len() {
                return Ok(());
            }
            chunk = chunk.slice(skip, chunk.len() - skip);
        }
        let take = self.remaining_limit.min(chunk.len());
        self.remaining_limit -= take;
        if take < chunk.len() {
            chunk = chunk.slice(0, take);
        }
        if !chunk.is_empty() {
            self.pending = Some(chunk);
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
        self.pending.is_none() && (self.finishing || self.remaining_limit == 0)
    }
}
