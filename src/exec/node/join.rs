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
//! Join plan nodes.
//!
//! The first source is always the probe (streamed) side and stays in the
//! parent pipeline; the second source becomes its own pipeline terminated
//! by the matching build sink.

use std::sync::Arc;

use crate::exec::node::PlanNode;

/// Equi-join evaluated by building a hash table over the second source.
#[derive(Clone, Debug)]
pub struct HashJoinNode {
    pub probe: Arc<PlanNode>,
    pub build: Arc<PlanNode>,
    pub probe_keys: Vec<usize>,
    pub build_keys: Vec<usize>,
}

/// Unconditioned cartesian join.
#[derive(Clone, Debug)]
pub struct CrossJoinNode {
    pub probe: Arc<PlanNode>,
    pub build: Arc<PlanNode>,
}

/// Equi-join over two streams sorted on their join keys. The right stream
/// reaches the operator through a task-registered merge-join source.
#[derive(Clone, Debug)]
pub struct MergeJoinNode {
    pub left: Arc<PlanNode>,
    pub right: Arc<PlanNode>,
    pub left_keys: Vec<usize>,
    pub right_keys: Vec<usize>,
}
