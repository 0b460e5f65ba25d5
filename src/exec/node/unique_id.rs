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
use std::sync::atomic::AtomicI64;
use std::sync::Arc;

use crate::exec::node::PlanNode;

/// Appends a 64-bit id column unique across the whole task.
///
/// The task-unique id occupies the high bits; the shared counter hands out
/// row-number blocks so parallel drivers never collide.
#[derive(Clone, Debug)]
pub struct AssignUniqueIdNode {
    pub input: Arc<PlanNode>,
    pub id_name: String,
    pub task_unique_id: i64,
    pub unique_id_counter: Arc<AtomicI64>,
}

impl AssignUniqueIdNode {
    pub fn task_unique_id(&self) -> i64 {
        self.task_unique_id
    }

    pub fn unique_id_counter(&self) -> &Arc<AtomicI64> {
        &self.unique_id_counter
    }
}
