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
//! Hash join operators.
//!
//! Responsibilities:
//! - The build sink collects the second join source into a shared bridge
//!   and publishes a key-encoded row index when its pipeline finishes.
//! - The probe operator streams the first source against the published
//!   table and emits inner-join matches.
//!
//! Key exported interfaces:
//! - Types: `HashJoinBridge`, `HashBuild`, `HashProbe`.

use std::sync::{Arc, Mutex};

use arrow::array::RecordBatch;
use arrow::datatypes::Schema;
use hashbrown::HashMap;

use crate::exec::chunk::Chunk;
use crate::exec::operators::hash_util::take_rows;
use crate::exec::pipeline::operator::{BlockedReason, Operator};
use crate::exec::scalar::{encode_row_key, scalar_at};

/// Published build side: concatenated rows plus the key index.
pub struct JoinTable {
    /// `None` when the build side produced no rows.
    build: Option<Chunk>,
    index: HashMap<Vec<u8>, Vec<u32>>,
}

#[derive(Default)]
struct BridgeState {
    build_chunks: Vec<Chunk>,
    table: Option<Arc<JoinTable>>,
}

/// Shared state pairing one build pipeline with one probe pipeline.
#[derive(Default)]
pub struct HashJoinBridge {
    state: Mutex<BridgeState>,
}

impl HashJoinBridge {
    pub fn new() -> Self {
        Self::default()
    }

    fn add_build_chunk(&self, chunk: Chunk) -> Result<(), String> {
        let mut state = self.state.lock().map_err(|_| "join bridge lock poisoned")?;
        if state.table.is_some() {
            return Err("hash build received input after the table was published".to_string());
        }
        if !chunk.is_empty() {
            state.build_chunks.push(chunk);
        }
        Ok(())
    }

    fn publish_table(&self, build_keys: &[usize]) -> Result<(), String> {
        let mut state = self.state.lock().map_err(|_| "join bridge lock poisoned")?;
        if state.table.is_some() {
            return Ok(());
        }
        let chunks = std::mem::take(&mut state.build_chunks);
        let build = match chunks.first() {
            Some(first) => Some(Chunk::concat(&first.schema(), &chunks)?),
            None => None,
        };
        let mut index: HashMap<Vec<u8>, Vec<u32>> = HashMap::new();
        if let Some(build) = &build {
            let mut buf = Vec::new();
            for row in 0..build.len() {
                if row_has_null_key(build, build_keys, row)? {
                    continue;
                }
                buf.clear();
                encode_row_key(build, build_keys, row, &mut buf)?;
                index.entry(buf.clone()).or_default().push(row as u32);
            }
        }
        state.table = Some(Arc::new(JoinTable { build, index }));
        Ok(())
    }

    fn table(&self) -> Option<Arc<JoinTable>> {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.table.clone())
    }

    pub fn is_ready(&self) -> bool {
        self.table().is_some()
    }
}

fn row_has_null_key(chunk: &Chunk, columns: &[usize], row: usize) -> Result<bool, String> {
    for &column in columns {
        if scalar_at(&chunk.column(column)?, row)?.is_null() {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Sink terminating the build pipeline of a hash join.
pub struct HashBuild {
    operator_id: i32,
    bridge: Arc<HashJoinBridge>,
    build_keys: Vec<usize>,
    finished: bool,
}

impl HashBuild {
    pub fn new(operator_id: i32, bridge: Arc<HashJoinBridge>, build_keys: Vec<usize>) -> Self {
        Self {
            operator_id,
            bridge,
            build_keys,
            finished: false,
        }
    }
}

impl Operator for HashBuild {
    fn operator_id(&self) -> i32 {
        self.operator_id
    }

    fn name(&self) -> &str {
        "HashBuild"
    }

    fn need_input(&self) -> bool {
        !self.finished
    }

    fn push_chunk(&mut self, chunk: Chunk) -> Result<(), String> {
        self.bridge.add_build_chunk(chunk)
    }

    fn pull_chunk(&mut self) -> Result<Option<Chunk>, String> {
        Ok(None)
    }

    fn set_finishing(&mut self) -> Result<(), String> {
        if !self.finished {
            self.bridge.publish_table(&self.build_keys)?;
            self.finished = true;
        }
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.finished
    }
}

/// Streams probe rows against the published build table.
pub struct HashProbe {
    operator_id: i32,
    bridge: Arc<HashJoinBridge>,
    probe_keys: Vec<usize>,
    pending: Option<Chunk>,
    finishing: bool,
}

impl HashProbe {
    pub fn new(operator_id: i32, bridge: Arc<HashJoinBridge>, probe_keys: Vec<usize>) -> Self {
        Self {
            operator_id,
            bridge,
            probe_keys,
            pending: None,
            finishing: false,
        }
    }

    fn probe(&self, table: &JoinTable, chunk: &Chunk) -> Result<Option<Chunk>, String> {
        let Some(build) = &table.build else {
            return Ok(None);
        };
        let mut probe_rows = Vec::new();
        let mut build_rows = Vec::new();
        let mut buf = Vec::new();
        for row in 0..chunk.len() {
            if row_has_null_key(chunk, &self.probe_keys, row)? {
                continue;
            }
            buf.clear();
            encode_row_key(chunk, &self.probe_keys, row, &mut buf)?;
            if let Some(matches) = table.index.get(&buf) {
                for &build_row in matches {
                    probe_rows.push(row as u32);
                    build_rows.push(build_row);
                }
            }
        }
        if probe_rows.is_empty() {
            return Ok(None);
        }
        let probe_side = take_rows(chunk, &probe_rows)?;
        let build_side = take_rows(build, &build_rows)?;
        Ok(Some(concat_sides(&probe_side, &build_side)?))
    }
}

/// Glues matched left and right rows into one output chunk.
pub(crate) fn concat_sides(left: &Chunk, right: &Chunk) -> Result<Chunk, String> {
    let mut fields = Vec::with_capacity(left.num_columns() + right.num_columns());
    for field in left.schema().fields() {
        fields.push(field.as_ref().clone());
    }
    for field in right.schema().fields() {
        fields.push(field.as_ref().clone());
    }
    let mut columns = Vec::with_capacity(fields.len());
    columns.extend(left.columns().iter().cloned());
    columns.extend(right.columns().iter().cloned());
    let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)
        .map_err(|e| format!("join output failed: {e}"))?;
    Ok(Chunk::new(batch))
}

impl Operator for HashProbe {
    fn operator_id(&self) -> i32 {
        self.operator_id
    }

    fn name(&self) -> &str {
        "HashProbe"
    }

    fn need_input(&self) -> bool {
        !self.finishing && self.pending.is_none() && self.bridge.is_ready()
    }

    fn push_chunk(&mut self, chunk: Chunk) -> Result<(), String> {
        if self.pending.is_some() {
            return Err("hash probe received input while output is pending".to_string());
        }
        let table = self
            .bridge
            .table()
            .ok_or_else(|| "hash probe received input before build side was ready".to_string())?;
        self.pending = self.probe(&table, &chunk)?;
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
        self.finishing && self.pending.is_none()
    }

    fn is_blocked(&self) -> Option<BlockedReason> {
        if self.bridge.is_ready() {
            None
        } else {
            Some(BlockedReason::Dependency("hash join build".to_string()))
        }
    }
}
