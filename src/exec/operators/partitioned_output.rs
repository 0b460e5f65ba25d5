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
//! Partitioned output sink operator.
//!
//! Responsibilities:
//! - Routes output chunks into the task's partitioned output buffer, hashed
//!   on the partition keys; transmission to remote consumers happens
//!   outside this crate.

use std::sync::Arc;

use crate::exec::chunk::Chunk;
use crate::exec::operators::hash_util::{partition_indices, take_rows};
use crate::exec::pipeline::operator::Operator;
use crate::runtime::task::Task;

/// Terminal sink feeding the task output buffer.
pub struct PartitionedOutput {
    operator_id: i32,
    keys: Vec<usize>,
    num_partitions: u32,
    task: Arc<Task>,
    finished: bool,
}

impl PartitionedOutput {
    pub fn new(operator_id: i32, keys: Vec<usize>, num_partitions: u32, task: Arc<Task>) -> Self {
        Self {
            operator_id,
            keys,
            num_partitions: num_partitions.max(1),
            task,
            finished: false,
        }
    }
}

impl Operator for PartitionedOutput {
    fn operator_id(&self) -> i32 {
        self.operator_id
    }

    fn name(&self) -> &str {
        "PartitionedOutput"
    }

    fn need_input(&self) -> bool {
        !self.finished
    }

    fn push_chunk(&mut self, chunk: Chunk) -> Result<(), String> {
        if self.finished {
            return Err("partitioned output received input after finish".to_string());
        }
        if chunk.is_empty() {
            return Ok(());
        }
        if self.keys.is_empty() || self.num_partitions == 1 {
            return self.task.enqueue_output(0, chunk);
        }
        let assignment = partition_indices(&chunk, &self.keys, self.num_partitions as usize)?;
        for (partition, rows) in assignment.iter().enumerate() {
            if rows.is_empty() {
                continue;
            }
            let part = take_rows(&chunk, rows)?;
            self.task.enqueue_output(partition as u32, part)?;
        }
        Ok(())
    }

    fn pull_chunk(&mut self) -> Result<Option<Chunk>, String> {
        Ok(None)
    }

    fn set_finishing(&mut self) -> Result<(), String> {
        self.finished = true;
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.finished
    }
}
