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
//! In-process exchange barrier nodes.
//!
//! Both nodes cut the plan into separate pipelines: local merge re-orders
//! the output of a parallel sorted stage onto one driver, local partition
//! re-distributes rows across sibling drivers.

use std::sync::Arc;

use arrow::datatypes::SchemaRef;

use crate::exec::node::sort::SortKey;
use crate::exec::node::PlanNode;

/// Merges per-driver sorted streams into one globally sorted stream.
#[derive(Clone, Debug)]
pub struct LocalMergeNode {
    pub input: Arc<PlanNode>,
    pub keys: Vec<SortKey>,
    pub output_schema: SchemaRef,
}

/// Row routing policy of a local partition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LocalPartitionSpec {
    RoundRobin,
    HashColumns(Vec<usize>),
}

/// Shuffles rows to the drivers of the consuming pipeline.
#[derive(Clone, Debug)]
pub struct LocalPartitionNode {
    pub input: Arc<PlanNode>,
    pub spec: LocalPartitionSpec,
    pub output_schema: SchemaRef,
}
