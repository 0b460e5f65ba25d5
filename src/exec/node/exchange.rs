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

use arrow::datatypes::SchemaRef;

use crate::exec::node::sort::SortKey;
use crate::exec::node::PlanNode;

/// Leaf node receiving chunks from remote workers via an exchange client.
#[derive(Clone, Debug)]
pub struct ExchangeNode {
    pub output_schema: SchemaRef,
}

/// Exchange leaf that merges sorted remote streams; runs single-threaded.
#[derive(Clone, Debug)]
pub struct MergeExchangeNode {
    pub output_schema: SchemaRef,
    pub keys: Vec<SortKey>,
}

/// Sink node handing partitioned chunks to the task output buffer for
/// transmission to remote consumers.
#[derive(Clone, Debug)]
pub struct PartitionedOutputNode {
    pub input: Arc<PlanNode>,
    pub keys: Vec<usize>,
    pub num_partitions: u32,
}
