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

/// Row limit with offset. The final (non-partial) stage runs on one driver
/// so the offset is applied against a single row stream.
#[derive(Clone, Debug)]
pub struct LimitNode {
    pub input: Arc<PlanNode>,
    pub offset: usize,
    pub limit: usize,
    pub is_partial: bool,
}

impl LimitNode {
    pub fn is_partial(&self) -> bool {
        self.is_partial
    }
}
