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
//! Local exchange buffer and operators.
//!
//! Responsibilities:
//! - Routes chunks between the producer pipeline's partition sink and the
//!   consumer pipeline's per-driver source, round-robin or hashed.
//! - Tracks producer completion so consumers observe end of stream only
//!   after every producer driver finished.
//!
//! Key exported interfaces:
//! - Types: `LocalExchangeMemory`, `LocalPartition`, `LocalExchangeSource`.
//!
//! Current limitations:
//! - Consumer drivers must be materialized before producer drivers run;
//!   drivers are created in planned factory order, which guarantees this.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use arrow::datatypes::SchemaRef;

use crate::common::config::local_exchange_max_buffered_rows;
use crate::exec::chunk::Chunk;
use crate::exec::node::local_exchange::LocalPartitionSpec;
use crate::exec::operators::hash_util::{partition_indices, take_rows};
use crate::exec::pipeline::operator::{BlockedReason, Operator};

struct MemoryState {
    queues: Vec<VecDeque<Chunk>>,
    buffered_rows: usize,
    producers: usize,
    finished_producers: usize,
}

/// Task-owned buffer of one local partition node.
pub struct LocalExchangeMemory {
    spec: LocalPartitionSpec,
    schema: SchemaRef,
    next_round_robin: AtomicUsize,
    state: Mutex<MemoryState>,
}

impl LocalExchangeMemory {
    pub fn new(partitions: usize, spec: LocalPartitionSpec, schema: SchemaRef) -> Self {
        Self {
            spec,
            schema,
            next_round_robin: AtomicUsize::new(0),
            state: Mutex::new(MemoryState {
                queues: (0..partitions.max(1)).map(|_| VecDeque::new()).collect(),
                buffered_rows: 0,
                producers: 0,
                finished_producers: 0,
            }),
        }
    }

    pub fn partition_count(&self) -> usize {
        self.state
            .lock()
            .map(|state| state.queues.len())
            .unwrap_or(0)
    }

    pub fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    pub fn register_producer(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.producers += 1;
        }
    }

    pub fn finish_producer(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.finished_producers += 1;
        }
    }

    /// Capacity check for producer backpressure; unbounded when the config
    /// row cap is zero.
    pub fn has_capacity(&self) -> bool {
        let cap = local_exchange_max_buffered_rows();
        if cap == 0 {
            return true;
        }
        self.state
            .lock()
            .map(|state| state.buffered_rows < cap)
            .unwrap_or(false)
    }

    pub fn push(&self, chunk: Chunk) -> Result<(), String> {
        if chunk.is_empty() {
            return Ok(());
        }
        match &self.spec {
            LocalPartitionSpec::RoundRobin => {
                let mut state = self
                    .state
                    .lock()
                    .map_err(|_| "local exchange lock poisoned")?;
                let partition =
                    self.next_round_robin.fetch_add(1, Ordering::Relaxed) % state.queues.len();
                state.buffered_rows += chunk.len();
                state.queues[partition].push_back(chunk);
                Ok(())
            }
            LocalPartitionSpec::HashColumns(columns) => {
                let partitions = self.partition_count();
                let assignment = partition_indices(&chunk, columns, partitions)?;
                let mut parts = Vec::with_capacity(partitions);
                for rows in &assignment {
                    if rows.is_empty() {
                        parts.push(None);
                    } else {
                        parts.push(Some(take_rows(&chunk, rows)?));
                    }
                }
                let mut state = self
                    .state
                    .lock()
                    .map_err(|_| "local exchange lock poisoned")?;
                for (partition, part) in parts.into_iter().enumerate() {
                    if let Some(part) = part {
                        state.buffered_rows += part.len();
                        state.queues[partition].push_back(part);
                    }
                }
                Ok(())
            }
        }
    }

    pub fn poll(&self, partition: usize) -> Result<Option<Chunk>, String> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| "local exchange lock poisoned")?;
        if partition >= state.queues.len() {
            return Err(format!(
                "local exchange partition {} out of range (count={})",
                partition,
                state.queues.len()
            ));
        }
        let chunk = state.queues[partition].pop_front();
        if let Some(chunk) = &chunk {
            state.buffered_rows -= chunk.len();
        }
        Ok(chunk)
    }

    pub fn has_pending(&self, partition: usize) -> bool {
        self.state
            .lock()
            .map(|state| {
                state
                    .queues
                    .get(partition)
                    .map(|queue| !queue.is_empty())
                    .unwrap_or(false)
            })
            .unwrap_or(false)
    }

    /// End of stream for one consumer: every registered producer finished
    /// and the consumer's queue is empty.
    pub fn is_drained(&self, partition: usize) -> bool {
        self.state
            .lock()
            .map(|state| {
                state.producers > 0
                    && state.finished_producers == state.producers
                    && state
                        .queues
                        .get(partition)
                        .map(VecDeque::is_empty)
                        .unwrap_or(true)
            })
            .unwrap_or(true)
    }
}

/// Sink side of a local partition: routes producer chunks into the buffer.
pub struct LocalPartition {
    operator_id: i32,
    memory: Arc<LocalExchangeMemory>,
    finished: bool,
}

impl LocalPartition {
    pub fn new(operator_id: i32, memory: Arc<LocalExchangeMemory>) -> Self {
        memory.register_producer();
        Self {
            operator_id,
            memory,
            finished: false,
        }
    }
}

impl Operator for LocalPartition {
    fn operator_id(&self) -> i32 {
        self.operator_id
    }

    fn name(&self) -> &str {
        "LocalPartition"
    }

    fn need_input(&self) -> bool {
        !self.finished && self.memory.has_capacity()
    }

    fn push_chunk(&mut self, chunk: Chunk) -> Result<(), String> {
        if self.finished {
            return Err("local partition received input after finish".to_string());
        }
        self.memory.push(chunk)
    }

    fn pull_chunk(&mut self) -> Result<Option<Chunk>, String> {
        Ok(None)
    }

    fn set_finishing(&mut self) -> Result<(), String> {
        if !self.finished {
            self.finished = true;
            self.memory.finish_producer();
        }
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.finished
    }

    fn is_blocked(&self) -> Option<BlockedReason> {
        if !self.finished && !self.memory.has_capacity() {
            Some(BlockedReason::OutputFull)
        } else {
            None
        }
    }
}

/// Source side of a local partition: reads this driver's queue.
pub struct LocalExchangeSource {
    operator_id: i32,
    memory: Arc<LocalExchangeMemory>,
    partition: usize,
}

impl LocalExchangeSource {
    pub fn new(operator_id: i32, memory: Arc<LocalExchangeMemory>, partition: usize) -> Self {
        Self {
            operator_id,
            memory,
            partition,
        }
    }
}

impl Operator for LocalExchangeSource {
    fn operator_id(&self) -> i32 {
        self.operator_id
    }

    fn name(&self) -> &str {
        "LocalExchangeSource"
    }

    fn need_input(&self) -> bool {
        false
    }

    fn push_chunk(&mut self, _chunk: Chunk) -> Result<(), String> {
        Err("local exchange source does not accept input".to_string())
    }

    fn pull_chunk(&mut self) -> Result<Option<Chunk>, String> {
        self.memory.poll(self.partition)
    }

    fn set_finishing(&mut self) -> Result<(), String> {
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.memory.is_drained(self.partition)
    }

    fn is_blocked(&self) -> Option<BlockedReason> {
        if self.memory.has_pending(self.partition) || self.memory.is_drained(self.partition) {
            None
        } else {
            Some(BlockedReason::InputEmpty)
        }
    }
}
