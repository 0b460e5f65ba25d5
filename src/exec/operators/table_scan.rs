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
//! Table scan source operator.
//!
//! Responsibilities:
//! - Pulls chunks registered with the task for this scan node; parallel
//!   drivers drain the shared queue and therefore split the input.
//!
//! Current limitations:
//! - Scan input must be registered before the drivers run; an empty queue
//!   reads as end of input.

use std::sync::Arc;

use crate::common::ids::PlanNodeId;
use crate::exec::chunk::Chunk;
use crate::exec::pipeline::operator::Operator;
use crate::runtime::task::Task;

/// Source operator reading task-registered table data.
pub struct TableScan {
    operator_id: i32,
    node_id: PlanNodeId,
    task: Arc<Task>,
    finished: bool,
}

impl TableScan {
    pub fn new(operator_id: i32, node_id: PlanNodeId, task: Arc<Task>) -> Self {
        Self {
            operator_id,
            node_id,
            task,
            finished: false,
        }
    }
}

impl Operator for TableScan {
    fn operator_id(&self) -> i32 {
        self.operator_id
    }

    fn name(&self) -> &str {
        "TableScan"
    }

    fn need_input(&self) -> bool {
        false
    }

    fn push_chunk(&mut self, _chunk: Chunk) -> Result<(), String> {
        Err("table scan operator does not accept input".to_string())
    }

    fn pull_chunk(&mut self) -> Result<Option<Chunk>, String> {
        if self.finished {
            return Ok(None);
        }
        match self.task.poll_scan_chunk(self.node_id) {
            Some(chunk) => Ok(Some(chunk)),
            None => {
                self.finished = true;
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
