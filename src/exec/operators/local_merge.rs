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
//! Local merge operator.
//!
//! Responsibilities:
//! - Single-driver merge of the per-driver sorted streams produced by the
//!   upstream pipeline, read from the task's merge sources.

use std::sync::Arc;

use crate::exec::chunk::Chunk;
use crate::exec::node::sort::SortKey;
use crate::exec::operators::sort_util::sort_chunk;
use crate::exec::pipeline::operator::{BlockedReason, Operator};
use crate::runtime::merge_source::LocalMergeSource;

/// Merges task merge sources into one sorted stream.
pub struct LocalMerge {
    operator_id: i32,
    keys: Vec<SortKey>,
    sources: Vec<Arc<LocalMergeSource>>,
    collected: Vec<Chunk>,
    result: Option<Chunk>,
    emitted: bool,
}

impl LocalMerge {
    pub fn new(
        operator_id: i32,
        keys: Vec<SortKey>,
        sources: Vec<Arc<LocalMergeSource>>,
    ) -> Self {
        Self {
            operator_id,
            keys,
            sources,
            collected: Vec::new(),
            result: None,
            emitted: false,
        }
    }

    fn drain_sources(&mut self) {
        for source in &self.sources {
            while let Some(chunk) = source.poll() {
                if !chunk.is_empty() {
                    self.collected.push(chunk);
                }
            }
        }
    }

    fn all_drained(&self) -> bool {
        self.sources.iter().all(|source| source.is_drained())
    }
}

impl Operator for LocalMerge {
    fn operator_id(&self) -> i32 {
        self.operator_id
    }

    fn name(&self) -> &str {
        "LocalMerge"
    }

    fn need_input(&self) -> bool {
        false
    }

    fn push_chunk(&mut self, _chunk: Chunk) -> Result<(), String> {
        Err("local merge reads from its merge sources, not from pipeline input".to_string())
    }

    fn pull_chunk(&mut self) -> Result<Option<Chunk>, String> {
        self.drain_sources();
        if !self.all_drained() {
            return Ok(None);
        }
        if !self.emitted {
            self.emitted = true;
            if !self.collected.is_empty() {
                let schema = self.collected[0].schema();
                let all = Chunk::concat(&schema, &self.collected)?;
                self.collected.clear();
                self.result = Some(sort_chunk(&all, &self.keys, None)?);
            }
        }
        Ok(self.result.take())
    }

    fn set_finishing(&mut self) -> Result<(), String> {
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.emitted && self.result.is_none()
    }

    fn is_blocked(&self) -> Option<BlockedReason> {
        if self.all_drained() {
            None
        } else {
            Some(BlockedReason::Dependency("local merge sources".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{ArrayRef, Int64Array, RecordBatch};
    use arrow::datatypes::{DataType, Field, Schema, SchemaRef};

    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![Field::new("v", DataType::Int64, false)]))
    }

    fn chunk(values: &[i64]) -> Chunk {
        let array = Arc::new(Int64Array::from(values.to_vec())) as ArrayRef;
        Chunk::new(RecordBatch::try_new(schema(), vec![array]).expect("record batch"))
    }

    #[test]
    fn merges_sorted_producer_streams() {
        let sources = vec![
            Arc::new(LocalMergeSource::new(schema())),
            Arc::new(LocalMergeSource::new(schema())),
        ];
        sources[0].enqueue(chunk(&[1, 4])).expect("enqueue");
        sources[1].enqueue(chunk(&[2, 3])).expect("enqueue");

        let mut op = LocalMerge::new(0, vec![SortKey::asc(0)], sources.clone());
        // Blocks until every producer stream finished.
        assert!(op.pull_chunk().expect("pull").is_none());
        assert!(op.is_blocked().is_some());

        sources[0].set_finished();
        sources[1].set_finished();
        let out = op.pull_chunk().expect("pull").expect("chunk");
        let col = out.column(0).expect("column");
        let col = col.as_any().downcast_ref::<Int64Array>().expect("int64");
        assert_eq!(col.values(), &[1, 2, 3, 4]);
        assert!(op.is_finished());
    }
}
