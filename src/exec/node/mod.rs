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
//! Logical plan nodes.
//!
//! Responsibilities:
//! - Defines the immutable plan-node tree handed to the local planner.
//! - Provides uniform child access (`sources`) over a closed set of node
//!   kinds plus an open extension arm for plug-in operators.
//!
//! Key exported interfaces:
//! - Types: `PlanNode`, `PlanNodeKind`, `ExtensionPlanNode`.

pub mod aggregate;
pub mod exchange;
pub mod filter;
pub mod join;
pub mod limit;
pub mod local_exchange;
pub mod project;
pub mod scan;
pub mod single_row;
pub mod sort;
pub mod table_write;
pub mod unique_id;
pub mod unnest;
pub mod values;

use std::fmt;
use std::sync::Arc;

pub use crate::common::ids::PlanNodeId;
use crate::exec::node::aggregate::AggregationNode;
use crate::exec::node::exchange::{ExchangeNode, MergeExchangeNode, PartitionedOutputNode};
use crate::exec::node::filter::FilterNode;
use crate::exec::node::join::{CrossJoinNode, HashJoinNode, MergeJoinNode};
use crate::exec::node::limit::LimitNode;
use crate::exec::node::local_exchange::{LocalMergeNode, LocalPartitionNode};
use crate::exec::node::project::ProjectNode;
use crate::exec::node::scan::TableScanNode;
use crate::exec::node::single_row::EnforceSingleRowNode;
use crate::exec::node::sort::{OrderByNode, TopNNode};
use crate::exec::node::table_write::TableWriteNode;
use crate::exec::node::unique_id::AssignUniqueIdNode;
use crate::exec::node::unnest::UnnestNode;
use crate::exec::node::values::ValuesNode;

/// Plug-in plan nodes the closed enum does not know about.
///
/// A matching translator must be registered for the planner to materialize
/// such a node; see `exec::pipeline::translator`.
pub trait ExtensionPlanNode: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn sources(&self) -> Vec<&Arc<PlanNode>>;
}

#[derive(Clone, Debug)]
pub enum PlanNodeKind {
    TableScan(TableScanNode),
    Values(ValuesNode),
    Filter(FilterNode),
    Project(ProjectNode),
    Aggregation(AggregationNode),
    StreamingAggregation(AggregationNode),
    TopN(TopNNode),
    Limit(LimitNode),
    OrderBy(OrderByNode),
    LocalMerge(LocalMergeNode),
    LocalPartition(LocalPartitionNode),
    HashJoin(HashJoinNode),
    CrossJoin(CrossJoinNode),
    MergeJoin(MergeJoinNode),
    Exchange(ExchangeNode),
    MergeExchange(MergeExchangeNode),
    PartitionedOutput(PartitionedOutputNode),
    TableWrite(TableWriteNode),
    Unnest(UnnestNode),
    EnforceSingleRow(EnforceSingleRowNode),
    AssignUniqueId(AssignUniqueIdNode),
    Extension(Arc<dyn ExtensionPlanNode>),
}

/// One node of the logical plan tree.
#[derive(Clone, Debug)]
pub struct PlanNode {
    pub id: PlanNodeId,
    pub kind: PlanNodeKind,
}

impl PlanNode {
    pub fn new(id: PlanNodeId, kind: PlanNodeKind) -> Self {
        Self { id, kind }
    }

    pub fn id(&self) -> PlanNodeId {
        self.id
    }

    /// Children in execution order. Probe/left sides come first; the
    /// planner's pipeline slicing depends on this order.
    pub fn sources(&self) -> Vec<&Arc<PlanNode>> {
        match &self.kind {
            PlanNodeKind::TableScan(_)
            | PlanNodeKind::Values(_)
            | PlanNodeKind::Exchange(_)
            | PlanNodeKind::MergeExchange(_) => Vec::new(),
            PlanNodeKind::Filter(node) => vec![&node.input],
            PlanNodeKind::Project(node) => vec![&node.input],
            PlanNodeKind::Aggregation(node) | PlanNodeKind::StreamingAggregation(node) => {
                vec![&node.input]
            }
            PlanNodeKind::TopN(node) => vec![&node.input],
            PlanNodeKind::Limit(node) => vec![&node.input],
            PlanNodeKind::OrderBy(node) => vec![&node.input],
            PlanNodeKind::LocalMerge(node) => vec![&node.input],
            PlanNodeKind::LocalPartition(node) => vec![&node.input],
            PlanNodeKind::HashJoin(node) => vec![&node.probe, &node.build],
            PlanNodeKind::CrossJoin(node) => vec![&node.probe, &node.build],
            PlanNodeKind::MergeJoin(node) => vec![&node.left, &node.right],
            PlanNodeKind::PartitionedOutput(node) => vec![&node.input],
            PlanNodeKind::TableWrite(node) => vec![&node.input],
            PlanNodeKind::Unnest(node) => vec![&node.input],
            PlanNodeKind::EnforceSingleRow(node) => vec![&node.input],
            PlanNodeKind::AssignUniqueId(node) => vec![&node.input],
            PlanNodeKind::Extension(node) => node.sources(),
        }
    }

    pub fn name(&self) -> &str {
        match &self.kind {
            PlanNodeKind::TableScan(_) => "TableScan",
            PlanNodeKind::Values(_) => "Values",
            PlanNodeKind::Filter(_) => "Filter",
            PlanNodeKind::Project(_) => "Project",
            PlanNodeKind::Aggregation(_) => "Aggregation",
            PlanNodeKind::StreamingAggregation(_) => "StreamingAggregation",
            PlanNodeKind::TopN(_) => "TopN",
            PlanNodeKind::Limit(_) => "Limit",
            PlanNodeKind::OrderBy(_) => "OrderBy",
            PlanNodeKind::LocalMerge(_) => "LocalMerge",
            PlanNodeKind::LocalPartition(_) => "LocalPartition",
            PlanNodeKind::HashJoin(_) => "HashJoin",
            PlanNodeKind::CrossJoin(_) => "CrossJoin",
            PlanNodeKind::MergeJoin(_) => "MergeJoin",
            PlanNodeKind::Exchange(_) => "Exchange",
            PlanNodeKind::MergeExchange(_) => "MergeExchange",
            PlanNodeKind::PartitionedOutput(_) => "PartitionedOutput",
            PlanNodeKind::TableWrite(_) => "TableWrite",
            PlanNodeKind::Unnest(_) => "Unnest",
            PlanNodeKind::EnforceSingleRow(_) => "EnforceSingleRow",
            PlanNodeKind::AssignUniqueId(_) => "AssignUniqueId",
            PlanNodeKind::Extension(node) => node.name(),
        }
    }
}

impl fmt::Display for PlanNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (id={})", self.name(), self.id)
    }
}
