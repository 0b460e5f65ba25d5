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
//! Task-owned handoff queues.
//!
//! Responsibilities:
//! - Buffers chunks between a producer pipeline's callback sink and the
//!   consuming merge operator, with an explicit end-of-stream flag.
//! - Backs both local-merge sources (one per producer driver) and
//!   merge-join sources (one per merge-join node).

use std::collections::VecDeque;
use std::sync::Mutex;

use arrow::datatypes::SchemaRef;

use crate::exec::chunk::Chunk;

#[derive(Default)]
struct QueueState {
    chunks: VecDeque<Chunk>,
    finished: bool,
}

/// FIFO chunk queue with a terminal finished marker.
#[derive(Default)]
pub struct ChunkQueue {
    state: Mutex<QueueState>,
}

impl ChunkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&self, chunk: Chunk) -> Result<(), String> {
        let mut state = self.state.lock().map_err(|_| "queue lock poisoned")?;
        if state.finished {
            return Err("enqueue after queue was finished".to_string());
        }
        state.chunks.push_back(chunk);
        Ok(())
    }

    pub fn set_finished(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.finished = true;
        }
    }

    pub fn poll(&self) -> Option<Chunk> {
        self.state
            .lock()
            .ok()
            .and_then(|mut state| state.chunks.pop_front())
    }

    /// True once the producer reported end of stream, drained or not.
    pub fn is_finished(&self) -> bool {
        self.state
            .lock()
            .map(|state| state.finished)
            .unwrap_or(true)
    }

    /// True once the producer finished and every buffered chunk was drained.
    pub fn is_drained(&self) -> bool {
        self.state
            .lock()
            .map(|state| state.finished && state.chunks.is_empty())
            .unwrap_or(true)
    }
}

/// Per-producer-driver source feeding a local merge operator.
pub struct LocalMergeSource {
    schema: SchemaRef,
    queue: ChunkQueue,
}

impl LocalMergeSource {
    pub fn new(schema: SchemaRef) -> Self {
        Self {
            schema,
            queue: ChunkQueue::new(),
        }
    }

    pub fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    pub fn enqueue(&self, chunk: Chunk) -> Result<(), String> {
        self.queue.enqueue(chunk)
    }

    pub fn set_finished(&self) {
        self.queue.set_finished()
    }

    pub fn poll(&self) -> Option<Chunk> {
        self.queue.poll()
    }

    pub fn is_drained(&self) -> bool {
        self.queue.is_drained()
    }
}

/// Source feeding the right side of a merge join.
#[derive(Default)]
pub struct MergeJoinSource {
    queue: ChunkQueue,
}

impl MergeJoinSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&self, chunk: Chunk) -> Result<(), String> {
        self.queue.enqueue(chunk)
    }

    pub fn set_finished(&self) {
        self.queue.set_finished()
    }

    pub fn poll(&self) -> Option<Chunk> {
        self.queue.poll()
    }

    pub fn is_finished(&self) -> bool {
        self.queue.is_finished()
    }

    pub fn is_drained(&self) -> bool {
        self.queue.is_drained()
    }
}
