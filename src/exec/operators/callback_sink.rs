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
//! Callback sink operator.
//!
//! Responsibilities:
//! - Terminates a pipeline by handing every chunk to a consumer closure;
//!   signals end of stream with a final `None`.
//! - Backs the final query output and the enqueue side of local-merge and
//!   merge-join handoffs.

use crate::exec::chunk::Chunk;
use crate::exec::pipeline::operator::{Consumer, Operator};

/// Terminal sink forwarding chunks into a consumer callback.
pub struct CallbackSink {
    operator_id: i32,
    consumer: Consumer,
    finished: bool,
}

impl CallbackSink {
    pub fn new(operator_id: i32, consumer: Consumer) -> Self {
        Self {
            operator_id,
            consumer,
            finished: false,
        }
    }
}

impl Operator for CallbackSink {
    fn operator_id(&self) -> i32 {
        self.operator_id
    }

    fn name(&self) -> &str {
        "CallbackSink"
    }

    fn need_input(&self) -> bool {
        !self.finished
    }

    fn push_chunk(&mut self, chunk: Chunk) -> Result<(), String> {
        if self.finished {
            return Err("callback sink received input after finish".to_string());
        }
        (self.consumer)(Some(chunk))
    }

    fn pull_chunk(&mut self) -> Result<Option<Chunk>, String> {
        Ok(None)
    }

    fn set_finishing(&mut self) -> Result<(), String> {
        if !self.finished {
            self.finished = true;
            (self.consumer)(None)?;
        }
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.finished
    }
}
