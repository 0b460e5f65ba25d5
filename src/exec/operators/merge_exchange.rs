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
//! Merge exchange source operator.
//!
//! Responsibilities:
//! - Reads remote streams that are each sorted on the merge keys and emits
//!   one globally sorted stream; runs single-threaded.

use std::sync::Arc;

use crate::exec::chunk::Chunk;
use crate::exec::node::sort::SortKey;
use crate::exec::operators::sort_util::sort_chunk;
use crate::exec::pipeline::operator::{BlockedReason, Operator};
use crate::runtime::exchange::ExchangeClient;

/// Sorted-merging exchange source.
pub struct MergeExchange {
    operator_id: i32,
    keys: Vec<SortKey>,
    client: Arc<dyn ExchangeClient>,
    collected: Vec<Chunk>,
    result: Option<Chunk>,
    emitted: bool,
}

impl MergeExchange {
    pub fn new(operator_id: i32, keys: Vec<SortKey>, client: Arc<dyn ExchangeClient>) -> Self {
        Self {
            operator_id,
            keys,
            client,
            collected: Vec::new(),
            result: None,
            emitted: false,
        }
    }
}

impl Operator for MergeExchange {
    fn operator_id(&self) -> i32 {
        self.operator_id
    }

    fn name(&self) -> &str {
        "MergeExchange"
    }

    fn need_input(&self) -> bool {
        false
    }

    fn push_chunk(&mut self, _chunk: Chunk) -> Result<(), String> {
        Err("merge exchange operator does not accept input".to_string())
    }

    fn pull_chunk(&mut self) -> Result<Option<Chunk>, String> {
        while let Some(chunk) = self.client.poll_chunk()? {
            if !chunk.is_empty() {
                self.collected.push(chunk);
            }
        }
        if !self.client.is_finished() {
            return Ok(None);
        }
        if !self.emitted {
            self.emitted = true;
            if !self.collected.is_empty() {
                let schema = self.collected[0].schema();
                let all = Chunk::concat(&schema, &self.collected)?;
                self.collected.clear();
                self.result = Some(sort_chunk(&all, &self.keys, None)?);
            }
        }
        Ok(self.result.take())
    }

    fn set_finishing(&mut self) -> Result<(), String> {
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.emitted && self.result.is_none()
    }

    fn is_blocked(&self) -> Option<BlockedReason> {
        if self.client.is_finished() || !self.collected.is_empty() || self.result.is_some() {
            None
        } else {
            Some(BlockedReason::Dependency("exchange client".to_string()))
        }
    }
}
