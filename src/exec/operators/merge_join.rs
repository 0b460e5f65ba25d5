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
//! Merge join operator.
//!
//! Responsibilities:
//! - Joins two streams sorted ascending on their join keys. The left side
//!   is the pipeline input; the right side arrives through the task's
//!   merge-join source, fed by a callback sink on its own pipeline.
//!
//! Current limitations:
//! - Inner join; rows with null keys never match.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::exec::chunk::Chunk;
use crate::exec::operators::hash_join::concat_sides;
use crate::exec::operators::hash_util::take_rows;
use crate::exec::pipeline::operator::{BlockedReason, Operator};
use crate::exec::scalar::{compare_scalars, scalar_at, ScalarValue};
use crate::runtime::merge_source::MergeJoinSource;

/// Sorted-merge inner join.
pub struct MergeJoin {
    operator_id: i32,
    left_keys: Vec<usize>,
    right_keys: Vec<usize>,
    source: Arc<MergeJoinSource>,
    left_chunks: Vec<Chunk>,
    right_chunks: Vec<Chunk>,
    left_done: bool,
    emitted: bool,
    result: Option<Chunk>,
}

impl MergeJoin {
    pub fn new(
        operator_id: i32,
        left_keys: Vec<usize>,
        right_keys: Vec<usize>,
        source: Arc<MergeJoinSource>,
    ) -> Self {
        Self {
            operator_id,
            left_keys,
            right_keys,
            source,
            left_chunks: Vec::new(),
            right_chunks: Vec::new(),
            left_done: false,
            emitted: false,
            result: None,
        }
    }

    fn drain_source(&mut self) {
        while let Some(chunk) = self.source.poll() {
            if !chunk.is_empty() {
                self.right_chunks.push(chunk);
            }
        }
    }

    fn join(&mut self) -> Result<Option<Chunk>, String> {
        let left = match self.left_chunks.first() {
            Some(first) => Chunk::concat(&first.schema(), &self.left_chunks)?,
            None => return Ok(None),
        };
        let right = match self.right_chunks.first() {
            Some(first) => Chunk::concat(&first.schema(), &self.right_chunks)?,
            None => return Ok(None),
        };
        self.left_chunks.clear();
        self.right_chunks.clear();

        let left_rows = key_rows(&left, &self.left_keys)?;
        let right_rows = key_rows(&right, &self.right_keys)?;

        let mut left_out = Vec::new();
        let mut right_out = Vec::new();
        let mut i = 0;
        let mut j = 0;
        while i < left_rows.len() && j < right_rows.len() {
            let li = match &left_rows[i] {
                Some(key) => key,
                None => {
                    i += 1;
                    continue;
                }
            };
            let rj = match &right_rows[j] {
                Some(key) => key,
                None => {
                    j += 1;
                    continue;
                }
            };
            match compare_keys(li, rj)? {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    let i_end = run_end(&left_rows, i, li)?;
                    let j_end = run_end(&right_rows, j, rj)?;
                    for l in i..i_end {
                        for r in j..j_end {
                            left_out.push(l as u32);
                            right_out.push(r as u32);
                        }
                    }
                    i = i_end;
                    j = j_end;
                }
            }
        }
        if left_out.is_empty() {
            return Ok(None);
        }
        let left_side = take_rows(&left, &left_out)?;
        let right_side = take_rows(&right, &right_out)?;
        Ok(Some(concat_sides(&left_side, &right_side)?))
    }
}

/// Key scalars per row; `None` marks rows with a null key.
fn key_rows(chunk: &Chunk, keys: &[usize]) -> Result<Vec<Option<Vec<ScalarValue>>>, String> {
    let mut rows = Vec::with_capacity(chunk.len());
    for row in 0..chunk.len() {
        let mut values = Vec::with_capacity(keys.len());
        let mut has_null = false;
        for &column in keys {
            let value = scalar_at(&chunk.column(column)?, row)?;
            has_null |= value.is_null();
            values.push(value);
        }
        rows.push((!has_null).then_some(values));
    }
    Ok(rows)
}

fn compare_keys(a: &[ScalarValue], b: &[ScalarValue]) -> Result<Ordering, String> {
    for (x, y) in a.iter().zip(b) {
        let ordering = compare_scalars(x, y)?;
        if ordering != Ordering::Equal {
            return Ok(ordering);
        }
    }
    Ok(Ordering::Equal)
}

/// End of the run of rows whose key equals `key`, starting at `start`.
fn run_end(
    rows: &[Option<Vec<ScalarValue>>],
    start: usize,
    key: &[ScalarValue],
) -> Result<usize, String> {
    let mut end = start + 1;
    while end < rows.len() {
        let same = match &rows[end] {
            Some(next) => compare_keys(next, key)? == Ordering::Equal,
            None => false,
        };
        if !same {
            break;
        }
        end += 1;
    }
    Ok(end)
}

impl Operator for MergeJoin {
    fn operator_id(&self) -> i32 {
        self.operator_id
    }

    fn name(&self) -> &str {
        "MergeJoin"
    }

    fn need_input(&self) -> bool {
        !self.left_done
    }

    fn push_chunk(&mut self, chunk: Chunk) -> Result<(), String> {
        if self.left_done {
            return Err("merge join received input after finish".to_string());
        }
        if !chunk.is_empty() {
            self.left_chunks.push(chunk);
        }
        Ok(())
    }

    fn pull_chunk(&mut self) -> Result<Option<Chunk>, String> {
        self.drain_source();
        if !self.left_done || !self.source.is_finished() {
            return Ok(None);
        }
        if !self.emitted {
            self.emitted = true;
            self.result = self.join()?;
        }
        Ok(self.result.take())
    }

    fn set_finishing(&mut self) -> Result<(), String> {
        self.left_done = true;
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.left_done && self.emitted && self.result.is_none()
    }

    fn is_blocked(&self) -> Option<BlockedReason> {
        if self.left_done && !self.source.is_finished() {
            Some(BlockedReason::Dependency("merge join source".to_string()))
        } else {
            None
        }
    }
}
