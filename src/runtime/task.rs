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
//! Task-scoped runtime state.
//!
//! Responsibilities:
//! - Owns the auxiliary structures paired across pipeline boundaries:
//!   local-merge sources, merge-join sources, and local exchange buffers.
//! - Feeds table scans from registered chunks and buffers partitioned
//!   output for remote consumers.
//!
//! Key exported interfaces:
//! - Types: `Task`.
//!
//! Current limitations:
//! - Registration errors (duplicate or missing keys) are surfaced to the
//!   caller unchanged; there is no implicit re-creation.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use arrow::datatypes::SchemaRef;

use crate::common::ids::PlanNodeId;
use crate::exec::chunk::Chunk;
use crate::exec::node::local_exchange::LocalPartitionSpec;
use crate::exec::operators::cross_join::CrossJoinBridge;
use crate::exec::operators::hash_join::HashJoinBridge;
use crate::exec::operators::local_exchange::LocalExchangeMemory;
use crate::runtime::merge_source::{LocalMergeSource, MergeJoinSource};

/// Shared state of one executing task on this worker.
pub struct Task {
    task_id: String,
    local_merge_sources: Mutex<Option<Vec<Arc<LocalMergeSource>>>>,
    merge_join_sources: Mutex<HashMap<PlanNodeId, Arc<MergeJoinSource>>>,
    hash_join_bridges: Mutex<HashMap<PlanNodeId, Arc<HashJoinBridge>>>,
    cross_join_bridges: Mutex<HashMap<PlanNodeId, Arc<CrossJoinBridge>>>,
    local_exchanges: Mutex<HashMap<PlanNodeId, Arc<LocalExchangeMemory>>>,
    scan_chunks: Mutex<HashMap<PlanNodeId, VecDeque<Chunk>>>,
    output: Mutex<HashMap<u32, Vec<Chunk>>>,
}

impl Task {
    pub fn new(task_id: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            task_id: task_id.into(),
            local_merge_sources: Mutex::new(None),
            merge_join_sources: Mutex::new(HashMap::new()),
            hash_join_bridges: Mutex::new(HashMap::new()),
            cross_join_bridges: Mutex::new(HashMap::new()),
            local_exchanges: Mutex::new(HashMap::new()),
            scan_chunks: Mutex::new(HashMap::new()),
            output: Mutex::new(HashMap::new()),
        })
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// Creates the merge sources feeding the task's local merge, one per
    /// producer driver. Called during local-merge driver materialization.
    pub fn create_local_merge_sources(
        &self,
        count: usize,
        schema: SchemaRef,
    ) -> Result<(), String> {
        let mut sources = self
            .local_merge_sources
            .lock()
            .map_err(|_| "local merge sources lock poisoned".to_string())?;
        if sources.is_some() {
            return Err(format!(
                "task {} already has local merge sources",
                self.task_id
            ));
        }
        *sources = Some(
            (0..count)
                .map(|_| Arc::new(LocalMergeSource::new(schema.clone())))
                .collect(),
        );
        Ok(())
    }

    pub fn local_merge_source(&self, driver_id: u32) -> Result<Arc<LocalMergeSource>, String> {
        let sources = self
            .local_merge_sources
            .lock()
            .map_err(|_| "local merge sources lock poisoned".to_string())?;
        let sources = sources.as_ref().ok_or_else(|| {
            format!("task {} has no local merge sources", self.task_id)
        })?;
        sources.get(driver_id as usize).cloned().ok_or_else(|| {
            format!(
                "local merge source {} out of range (count={})",
                driver_id,
                sources.len()
            )
        })
    }

    pub fn local_merge_sources(&self) -> Result<Vec<Arc<LocalMergeSource>>, String> {
        let sources = self
            .local_merge_sources
            .lock()
            .map_err(|_| "local merge sources lock poisoned".to_string())?;
        sources.clone().ok_or_else(|| {
            format!("task {} has no local merge sources", self.task_id)
        })
    }

    /// Registers the merge-join source for `node_id`. Called once, by the
    /// driver materialization of the merge-join pipeline.
    pub fn create_merge_join_source(
        &self,
        node_id: PlanNodeId,
    ) -> Result<Arc<MergeJoinSource>, String> {
        let mut sources = self
            .merge_join_sources
            .lock()
            .map_err(|_| "merge join sources lock poisoned".to_string())?;
        if sources.contains_key(&node_id) {
            return Err(format!(
                "merge join source for node {} already exists",
                node_id
            ));
        }
        let source = Arc::new(MergeJoinSource::new());
        sources.insert(node_id, Arc::clone(&source));
        Ok(source)
    }

    pub fn merge_join_source(&self, node_id: PlanNodeId) -> Result<Arc<MergeJoinSource>, String> {
        self.merge_join_sources
            .lock()
            .map_err(|_| "merge join sources lock poisoned".to_string())?
            .get(&node_id)
            .cloned()
            .ok_or_else(|| format!("no merge join source for node {}", node_id))
    }

    /// Create-or-get of the bridge pairing a hash join's build and probe
    /// pipelines; either side may be materialized first.
    pub fn hash_join_bridge(&self, node_id: PlanNodeId) -> Result<Arc<HashJoinBridge>, String> {
        let mut bridges = self
            .hash_join_bridges
            .lock()
            .map_err(|_| "hash join bridges lock poisoned".to_string())?;
        Ok(Arc::clone(
            bridges
                .entry(node_id)
                .or_insert_with(|| Arc::new(HashJoinBridge::new())),
        ))
    }

    pub fn cross_join_bridge(&self, node_id: PlanNodeId) -> Result<Arc<CrossJoinBridge>, String> {
        let mut bridges = self
            .cross_join_bridges
            .lock()
            .map_err(|_| "cross join bridges lock poisoned".to_string())?;
        Ok(Arc::clone(
            bridges
                .entry(node_id)
                .or_insert_with(|| Arc::new(CrossJoinBridge::new())),
        ))
    }

    /// Create-or-get of the local exchange buffer for a local partition
    /// node. The partition count is fixed by the first creation; a
    /// conflicting later count is a wiring error.
    pub fn create_local_exchange(
        &self,
        node_id: PlanNodeId,
        partitions: usize,
        spec: LocalPartitionSpec,
        schema: SchemaRef,
    ) -> Result<Arc<LocalExchangeMemory>, String> {
        let mut exchanges = self
            .local_exchanges
            .lock()
            .map_err(|_| "local exchanges lock poisoned".to_string())?;
        if let Some(existing) = exchanges.get(&node_id) {
            if existing.partition_count() != partitions {
                return Err(format!(
                    "local exchange for node {} already sized to {} partitions, requested {}",
                    node_id,
                    existing.partition_count(),
                    partitions
                ));
            }
            return Ok(Arc::clone(existing));
        }
        let memory = Arc::new(LocalExchangeMemory::new(partitions, spec, schema));
        exchanges.insert(node_id, Arc::clone(&memory));
        Ok(memory)
    }

    pub fn local_exchange(&self, node_id: PlanNodeId) -> Result<Arc<LocalExchangeMemory>, String> {
        self.local_exchanges
            .lock()
            .map_err(|_| "local exchanges lock poisoned".to_string())?
            .get(&node_id)
            .cloned()
            .ok_or_else(|| format!("no local exchange for node {}", node_id))
    }

    /// Registers scan input for a table scan node. Drivers poll chunks off
    /// the shared queue, so parallel scans split the data between them.
    pub fn add_scan_chunks(&self, node_id: PlanNodeId, chunks: Vec<Chunk>) {
        let mut scan = self.scan_chunks.lock().expect("scan chunks lock");
        scan.entry(node_id).or_default().extend(chunks);
    }

    pub fn poll_scan_chunk(&self, node_id: PlanNodeId) -> Option<Chunk> {
        self.scan_chunks
            .lock()
            .ok()
            .and_then(|mut scan| scan.get_mut(&node_id).and_then(VecDeque::pop_front))
    }

    pub fn enqueue_output(&self, partition: u32, chunk: Chunk) -> Result<(), String> {
        self.output
            .lock()
            .map_err(|_| "output buffer lock poisoned".to_string())?
            .entry(partition)
            .or_default()
            .push(chunk);
        Ok(())
    }

    pub fn take_output(&self, partition: u32) -> Vec<Chunk> {
        self.output
            .lock()
            .ok()
            .and_then(|mut output| output.remove(&partition))
            .unwrap_or_default()
    }
}
