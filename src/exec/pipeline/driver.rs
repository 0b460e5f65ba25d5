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
//! Driver instances.
//!
//! Responsibilities:
//! - Carries the per-driver context operators are constructed against.
//! - Owns the materialized operator sequence of one pipeline instance; the
//!   scheduler that steps the operators lives outside this crate.

use std::sync::Arc;

use crate::exec::pipeline::operator::Operator;
use crate::runtime::task::Task;

/// Identity and shared state of one driver within a task.
#[derive(Clone)]
pub struct DriverCtx {
    pub task: Arc<Task>,
    /// Driver index within the pipeline, `0..driver_count`.
    pub driver_id: u32,
    /// Index of the owning factory in the planned factory list.
    pub pipeline_id: i32,
}

impl DriverCtx {
    pub fn new(task: Arc<Task>, driver_id: u32, pipeline_id: i32) -> Self {
        Self {
            task,
            driver_id,
            pipeline_id,
        }
    }
}

/// One instantiated pipeline: an ordered operator chain plus its context.
pub struct Driver {
    ctx: DriverCtx,
    operators: Vec<Box<dyn Operator>>,
}

impl Driver {
    pub fn new(ctx: DriverCtx, operators: Vec<Box<dyn Operator>>) -> Self {
        Self { ctx, operators }
    }

    pub fn ctx(&self) -> &DriverCtx {
        &self.ctx
    }

    pub fn operators(&self) -> &[Box<dyn Operator>] {
        &self.operators
    }

    pub fn operators_mut(&mut self) -> &mut [Box<dyn Operator>] {
        &mut self.operators
    }

    pub fn operator_names(&self) -> Vec<&str> {
        self.operators.iter().map(|op| op.name()).collect()
    }

    pub fn operator_ids(&self) -> Vec<i32> {
        self.operators.iter().map(|op| op.operator_id()).collect()
    }
}
