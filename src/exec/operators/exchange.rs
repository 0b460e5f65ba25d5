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
//! Exchange source operator.

use std::sync::Arc;

use crate::exec::chunk::Chunk;
use crate::exec::pipeline::operator::Operator;
use crate::runtime::exchange::ExchangeClient;

/// Source reading remote chunks from the task's exchange client.
pub struct Exchange {
    operator_id: i32,
    client: Arc<dyn ExchangeClient>,
    finished: bool,
}

impl Exchange {
    pub fn new(operator_id: i32, client: Arc<dyn ExchangeClient>) -> Self {
        Self {
            operator_id,
            client,
            finished: false,
        }
    }
}

impl Operator for Exchange {
    fn operator_id(&self) -> i32 {
        self.operator_id
    }

    fn name(&self) -> &str {
        "Exchange"
    }

    fn need_input(&self) -> bool {
        false
    }

    fn push_chunk(&mut self, _chunk: Chunk) -> Result<(), String> {
        Err("exchange operator does not accept input".to_string())
    }

    fn pull_chunk(&mut self) -> Result<Option<Chunk>, String> {
        if self.finished {
            return Ok(None);
        }
        match self.client.poll_chunk()? {
            Some(chunk) => Ok(Some(chunk)),
            None => {
                if self.client.is_finished() {
                    self.finished = true;
                }
                Ok(None)
            }
        }
    }

    fn set_finishing(&mut self) -> Result<(), String> {
        self.finished = true;
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.finished
    }
}
