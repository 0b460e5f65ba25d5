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
//! Exchange client seam.
//!
//! Responsibilities:
//! - Defines the interface exchange operators use to receive chunks from
//!   remote producers; transport is owned by the surrounding system.
//! - Provides an in-memory queue client for embedded use and tests.

use std::sync::Arc;

use crate::exec::chunk::Chunk;
use crate::runtime::merge_source::ChunkQueue;

/// Receives chunks produced by remote workers for one exchange.
pub trait ExchangeClient: Send + Sync {
    /// Next buffered chunk, or `None` when nothing is available right now.
    fn poll_chunk(&self) -> Result<Option<Chunk>, String>;

    /// True once all remote producers reported completion and the buffer
    /// is empty.
    fn is_finished(&self) -> bool;
}

/// Exchange client fed locally through a queue.
#[derive(Default)]
pub struct QueueExchangeClient {
    queue: ChunkQueue,
}

impl QueueExchangeClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn enqueue(&self, chunk: Chunk) -> Result<(), String> {
        self.queue.enqueue(chunk)
    }

    pub fn finish(&self) {
        self.queue.set_finished()
    }
}

impl ExchangeClient for QueueExchangeClient {
    fn poll_chunk(&self) -> Result<Option<Chunk>, String> {
        Ok(self.queue.poll())
    }

    fn is_finished(&self) -> bool {
        self.queue.is_drained()
    }
}
