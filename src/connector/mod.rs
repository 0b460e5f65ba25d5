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
//! Connector write seam.
//!
//! Responsibilities:
//! - Defines the insert-handle contract table-write plan nodes expose to the
//!   planner (threading capability) and to the writer operator (row sink).
//! - Ships an in-memory handle used by embedded callers and tests.

use std::fmt;
use std::sync::Mutex;

use crate::exec::chunk::Chunk;

/// Connector-side handle for one insert target.
pub trait ConnectorInsertTableHandle: fmt::Debug + Send + Sync {
    /// Whether parallel writer drivers may share this handle. The planner
    /// caps the pipeline at one driver when this is false.
    fn supports_multi_threading(&self) -> bool;

    fn append(&self, chunk: &Chunk) -> Result<(), String>;

    fn commit(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Insert handle buffering written chunks in memory.
pub struct MemoryInsertTableHandle {
    multi_threading: bool,
    written: Mutex<Vec<Chunk>>,
}

impl MemoryInsertTableHandle {
    pub fn new(multi_threading: bool) -> Self {
        Self {
            multi_threading,
            written: Mutex::new(Vec::new()),
        }
    }

    pub fn written_chunks(&self) -> Vec<Chunk> {
        self.written.lock().expect("insert handle lock").clone()
    }

    pub fn written_rows(&self) -> usize {
        self.written
            .lock()
            .expect("insert handle lock")
            .iter()
            .map(|c| c.len())
            .sum()
    }
}

impl fmt::Debug for MemoryInsertTableHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryInsertTableHandle")
            .field("multi_threading", &self.multi_threading)
            .finish()
    }
}

impl ConnectorInsertTableHandle for MemoryInsertTableHandle {
    fn supports_multi_threading(&self) -> bool {
        self.multi_threading
    }

    fn append(&self, chunk: &Chunk) -> Result<(), String> {
        self.written
            .lock()
            .map_err(|_| "insert handle lock poisoned".to_string())?
            .push(chunk.clone());
        Ok(())
    }
}
