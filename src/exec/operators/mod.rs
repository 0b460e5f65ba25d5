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
//! Physical operators.
//!
//! One file per operator family; drivers own operator instances and step
//! them cooperatively through the contract in `exec::pipeline::operator`.

pub mod aggregation;
pub mod assign_unique_id;
pub mod callback_sink;
pub mod cross_join;
pub mod enforce_single_row;
pub mod exchange;
pub mod filter_project;
pub mod hash_join;
pub mod hash_util;
pub mod limit;
pub mod local_exchange;
pub mod local_merge;
pub mod merge_exchange;
pub mod merge_join;
pub mod order_by;
pub mod partitioned_output;
pub mod sort_util;
pub mod table_scan;
pub mod table_writer;
pub mod top_n;
pub mod unnest;
pub mod values;

pub use aggregation::{HashAggregation, StreamingAggregation};
pub use assign_unique_id::AssignUniqueId;
pub use callback_sink::CallbackSink;
pub use cross_join::{CrossJoinBridge, CrossJoinBuild, CrossJoinProbe};
pub use enforce_single_row::EnforceSingleRow;
pub use exchange::Exchange;
pub use filter_project::FilterProject;
pub use hash_join::{HashBuild, HashJoinBridge, HashProbe};
pub use limit::Limit;
pub use local_exchange::{LocalExchangeMemory, LocalExchangeSource, LocalPartition};
pub use local_merge::LocalMerge;
pub use merge_exchange::MergeExchange;
pub use merge_join::MergeJoin;
pub use order_by::OrderBy;
pub use partitioned_output::PartitionedOutput;
pub use table_scan::TableScan;
pub use table_writer::TableWriter;
pub use top_n::TopN;
pub use unnest::Unnest;
pub use values::Values;
