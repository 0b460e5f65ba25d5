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
use std::sync::Arc;

use crate::exec::node::PlanNode;

/// Stage of a multi-phase aggregation.
///
/// Partial and intermediate stages may run in parallel; final and single
/// stages must run on one driver so every group lands in one state table.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AggregationStep {
    Partial,
    Intermediate,
    Final,
    Single,
}

impl AggregationStep {
    pub fn is_single_threaded(self) -> bool {
        matches!(self, AggregationStep::Final | AggregationStep::Single)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AggFunc {
    Count,
    Sum,
    Min,
    Max,
}

/// One aggregate function call over an optional input column.
#[derive(Clone, Debug)]
pub struct AggregateSpec {
    pub func: AggFunc,
    /// Input column; `None` only for count-star.
    pub input: Option<usize>,
    pub name: String,
}

/// Grouped aggregation. Also carried by the streaming variant, whose input
/// must additionally arrive sorted on the group-by columns.
#[derive(Clone, Debug)]
pub struct AggregationNode {
    pub input: Arc<PlanNode>,
    pub step: AggregationStep,
    pub group_by: Vec<usize>,
    pub aggregates: Vec<AggregateSpec>,
}

impl AggregationNode {
    pub fn step(&self) -> AggregationStep {
        self.step
    }
}
