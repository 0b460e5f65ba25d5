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

/// One sort key: column position plus direction and null placement.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SortKey {
    pub column: usize,
    pub descending: bool,
    pub nulls_first: bool,
}

impl SortKey {
    pub fn asc(column: usize) -> Self {
        Self {
            column,
            descending: false,
            nulls_first: false,
        }
    }

    pub fn desc(column: usize) -> Self {
        Self {
            column,
            descending: true,
            nulls_first: false,
        }
    }
}

/// Full sort. Partial order-by sorts each driver's share; the final stage
/// runs single-threaded.
#[derive(Clone, Debug)]
pub struct OrderByNode {
    pub input: Arc<PlanNode>,
    pub keys: Vec<SortKey>,
    pub is_partial: bool,
}

impl OrderByNode {
    pub fn is_partial(&self) -> bool {
        self.is_partial
    }
}

/// Sort bounded to the top `limit` rows.
#[derive(Clone, Debug)]
pub struct TopNNode {
    pub input: Arc<PlanNode>,
    pub keys: Vec<SortKey>,
    pub limit: usize,
    pub is_partial: bool,
}

impl TopNNode {
    pub fn is_partial(&self) -> bool {
        self.is_partial
    }
}
