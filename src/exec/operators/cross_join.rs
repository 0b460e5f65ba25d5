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
//! Cross join operators.
//!
//! Responsibilities:
//! - The build sink collects the second source into a shared bridge.
//! - The probe operator emits the cartesian product of each probe chunk
//!   with the collected build rows.

use std::sync::{Arc, Mutex};

use crate::exec::chunk::Chunk;
use crate::exec::operators::hash_util::take_rows;
use crate::exec::pipeline::operator::{BlockedReason, Operator};

#[derive(Default)]
struct CrossBridgeState {
    chunks: Vec<Chunk>,
    build: Option<Option<Chunk>>,
}

/// Shared state pairing the cross-join build and probe pipelines.
#[derive(Default)]
pub struct CrossJoinBridge {
    state: Mutex<CrossBridgeState>,
}

impl CrossJoinBridge {
    pub fn new() -> Self {
        Self::default()
    }

    fn add_build_chunk(&self, chunk: Chunk) -> Result<(), String> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| "cross join bridge lock poisoned")?;
        if state.build.is_some() {
            return Err("cross join build received input after finish".to_string());
        }
        if !chunk.is_empty() {
            state.chunks.push(chunk);
        }
        Ok(())
    }

    fn publish(&self) -> Result<(), String> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| "cross join bridge lock poisoned")?;
        if state.build.is_some() {
            return Ok(());
        }
        let chunks = std::mem::take(&mut state.chunks);
        let build = match chunks.first() {
            Some(first) => Some(Chunk::concat(&first.schema(), &chunks)?),
            None => None,
        };
        state.build = Some(build);
        Ok(())
    }

    fn build(&self) -> Option<Option<Chunk>> {
        self.state.lock().ok().and_then(|state| state.build.clone())
    }

    pub fn is_ready(&self) -> bool {
        self.build().is_some()
    }
}

/// Sink terminating the build pipeline of a cross join.
pub struct CrossJoinBuild {
    operator_id: i32,
    bridge: Arc<CrossJoinBridge>,
    finished: bool,
}

impl CrossJoinBuild {
    pub fn new(operator_id: i32, bridge: Arc<CrossJoinBridge>) -> Self {
        Self {
            operator_id,
            bridge,
            finished: false,
        }
    }
}

impl Operator for CrossJoinBuild {
    fn operator_id(&self) -> i32 {
        self.operator_id
    }

    fn name(&self) -> &str {
        "CrossJoinBuild"
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
            self.bridge.publish()?;
            self.finished = true;
        }
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.finished
    }
}

/// Emits probe-rows x build-rows for every probe chunk.
pub struct CrossJoinProbe {
    operator_id: i32,
    bridge: Arc<CrossJoinBridge>,
    pending: Option<Chunk>,
    finishing: bool,
}

impl CrossJoinProbe {
    pub fn new(operator_id: i32, bridge: Arc<CrossJoinBridge>) -> Self {
        Self {
            operator_id,
            bridge,
            pending: None,
            finishing: false,
        }
    }
}

impl Operator for CrossJoinProbe {
    fn operator_id(&self) -> i32 {
        self.operator_id
    }

    fn name(&self) -> &str {
        "CrossJoinProbe"
    }

    fn need_input(&self) -> bool {
        !self.finishing && self.pending.is_none() && self.bridge.is_ready()
    }

    fn push_chunk(&mut self, chunk: Chunk) -> Result<(), String> {
        if self.pending.is_some() {
            return Err("cross join probe received input while output is pending".to_string());
        }
        let build = self.bridge.build().ok_or_else(|| {
            "cross join probe received input before build side was ready".to_string()
        })?;
        let Some(build) = build else {
            return Ok(());
        };
        if chunk.is_empty() {
            return Ok(());
        }
        let build_len = build.len() as u32;
        let mut probe_rows = Vec::with_capacity(chunk.len() * build.len());
        let mut build_rows = Vec::with_capacity(chunk.len() * build.len());
        for probe_row in 0..chunk.len() as u32 {
            for build_row in 0..build_len {
                probe_rows.push(probe_row);
                build_rows.push(build_row);
            }
        }
        let left = take_rows(&chunk, &probe_rows)?;
        let right = take_rows(&build, &build_rows)?;
        self.pending = Some(super::hash_join::concat_sides(&left, &right)?);
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
            Some(BlockedReason::Dependency("cross join build".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{ArrayRef, Int64Array, RecordBatch};
    use arrow::datatypes::{DataType, Field, Schema};

    fn chunk(name: &str, values: &[i64]) -> Chunk {
        let schema = Arc::new(Schema::new(vec![Field::new(name, DataType::Int64, false)]));
        let array = Arc::new(Int64Array::from(values.to_vec())) as ArrayRef;
        Chunk::new(RecordBatch::try_new(schema, vec![array]).expect("record batch"))
    }

    #[test]
    fn emits_cartesian_product() {
        let bridge = Arc::new(CrossJoinBridge::new());
        let mut build = CrossJoinBuild::new(0, Arc::clone(&bridge));
        build.push_chunk(chunk("b", &[10, 20])).expect("push");
        build.set_finishing().expect("finish");

        let mut probe = CrossJoinProbe::new(0, bridge);
        probe.push_chunk(chunk("p", &[1, 2, 3])).expect("push");
        let out = probe.pull_chunk().expect("pull").expect("chunk");
        assert_eq!(out.len(), 6);
        assert_eq!(out.num_columns(), 2);
    }

    #[test]
    fn empty_build_side_produces_nothing() {
        let bridge = Arc::new(CrossJoinBridge::new());
        let mut build = CrossJoinBuild::new(0, Arc::clone(&bridge));
        build.set_finishing().expect("finish");

        let mut probe = CrossJoinProbe::new(0, bridge);
        probe.push_chunk(chunk("p", &[1])).expect("push");
        assert!(probe.pull_chunk().expect("pull").is_none());
    }
}
