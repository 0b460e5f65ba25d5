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
//! Driver factories.
//!
//! Responsibilities:
//! - Carries one pipeline's plan-node slice and instantiates it into a
//!   driver: an ordered operator chain plus the terminating sink.
//! - Fuses adjacent filter and project nodes into one operator; operator
//!   ids stay dense regardless of fusion.
//! - Registers task-side auxiliary structures (merge sources, merge-join
//!   sources, local exchange buffers) while materializing.
//!
//! Key exported interfaces:
//! - Types: `DriverFactory`.

use std::sync::Arc;

use crate::common::logging::debug;
use crate::exec::node::{PlanNode, PlanNodeKind};
use crate::exec::operators::filter_project::Projection;
use crate::exec::operators::{
    AssignUniqueId, CrossJoinProbe, EnforceSingleRow, Exchange, FilterProject, HashAggregation,
    HashProbe, Limit, LocalExchangeSource, LocalMerge, MergeExchange, MergeJoin, OrderBy,
    PartitionedOutput, StreamingAggregation, TableScan, TableWriter, TopN, Unnest, Values,
};
use crate::exec::pipeline::driver::{Driver, DriverCtx};
use crate::exec::pipeline::operator::{Operator, OperatorSupplier};
use crate::exec::pipeline::translator::translate_plan_node;
use crate::runtime::exchange::ExchangeClient;

/// Blueprint of one pipeline, instantiated once per parallel driver.
pub struct DriverFactory {
    /// Plan nodes of this pipeline, source-most first.
    pub plan_nodes: Vec<Arc<PlanNode>>,
    /// Terminating sink; present on every factory except possibly the root.
    pub consumer_supplier: Option<OperatorSupplier>,
    /// True iff the pipeline starts at a leaf node and reads external input.
    pub input_driver: bool,
    /// True only for the factory driving the root of the plan.
    pub output_driver: bool,
    /// Parallelism cap; `u32::MAX` means unconstrained.
    pub max_drivers: u32,
}

impl Default for DriverFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl DriverFactory {
    pub fn new() -> Self {
        Self {
            plan_nodes: Vec::new(),
            consumer_supplier: None,
            input_driver: false,
            output_driver: false,
            max_drivers: 1,
        }
    }

    /// Materializes one driver instance of this pipeline.
    ///
    /// `num_drivers` reports the resolved driver count of a pipeline by its
    /// id; it sizes the merge-source array under a local merge and the
    /// partition queues under a local partition.
    pub fn create_driver<F>(
        &self,
        ctx: DriverCtx,
        exchange_client: Option<Arc<dyn ExchangeClient>>,
        num_drivers: F,
    ) -> Result<Driver, String>
    where
        F: Fn(i32) -> u32,
    {
        let mut operators: Vec<Box<dyn Operator>> = Vec::with_capacity(self.plan_nodes.len());
        let mut i = 0;
        while i < self.plan_nodes.len() {
            // Id of the operator being made. Not the same as `i` because
            // adjacent plan nodes may fuse.
            let id = operators.len() as i32;
            let node = &self.plan_nodes[i];
            match &node.kind {
                PlanNodeKind::Filter(filter) => {
                    let next_project = self.plan_nodes.get(i + 1).and_then(|next| match &next.kind
                    {
                        PlanNodeKind::Project(project) => Some(Projection {
                            exprs: project.exprs.clone(),
                            names: project.names.clone(),
                        }),
                        _ => None,
                    });
                    let fused = next_project.is_some();
                    operators.push(Box::new(FilterProject::new(
                        id,
                        Some(filter.predicate.clone()),
                        next_project,
                    )?));
                    i += if fused { 2 } else { 1 };
                    continue;
                }
                PlanNodeKind::Project(project) => {
                    operators.push(Box::new(FilterProject::new(
                        id,
                        None,
                        Some(Projection {
                            exprs: project.exprs.clone(),
                            names: project.names.clone(),
                        }),
                    )?));
                }
                PlanNodeKind::Values(values) => {
                    operators.push(Box::new(Values::new(id, values.chunks.clone())));
                }
                PlanNodeKind::TableScan(_) => {
                    operators.push(Box::new(TableScan::new(
                        id,
                        node.id,
                        Arc::clone(&ctx.task),
                    )));
                }
                PlanNodeKind::TableWrite(write) => {
                    operators.push(Box::new(TableWriter::new(
                        id,
                        Arc::clone(write.insert_table_handle().connector_insert_table_handle()),
                    )));
                }
                PlanNodeKind::MergeExchange(merge_exchange) => {
                    let client = exchange_client.clone().ok_or_else(|| {
                        format!("merge exchange node {} requires an exchange client", node.id)
                    })?;
                    // Keeps the plan-node position as the operator id,
                    // unlike every other branch.
                    operators.push(Box::new(MergeExchange::new(
                        i as i32,
                        merge_exchange.keys.clone(),
                        client,
                    )));
                }
                PlanNodeKind::Exchange(_) => {
                    let client = exchange_client.clone().ok_or_else(|| {
                        format!("exchange node {} requires an exchange client", node.id)
                    })?;
                    operators.push(Box::new(Exchange::new(id, client)));
                }
                PlanNodeKind::PartitionedOutput(output) => {
                    operators.push(Box::new(PartitionedOutput::new(
                        id,
                        output.keys.clone(),
                        output.num_partitions,
                        Arc::clone(&ctx.task),
                    )));
                }
                PlanNodeKind::HashJoin(join) => {
                    let bridge = ctx.task.hash_join_bridge(node.id)?;
                    operators.push(Box::new(HashProbe::new(id, bridge, join.probe_keys.clone())));
                }
                PlanNodeKind::CrossJoin(_) => {
                    let bridge = ctx.task.cross_join_bridge(node.id)?;
                    operators.push(Box::new(CrossJoinProbe::new(id, bridge)));
                }
                PlanNodeKind::StreamingAggregation(aggregation) => {
                    operators.push(Box::new(StreamingAggregation::new(
                        id,
                        aggregation.step,
                        aggregation.group_by.clone(),
                        aggregation.aggregates.clone(),
                    )?));
                }
                PlanNodeKind::Aggregation(aggregation) => {
                    operators.push(Box::new(HashAggregation::new(
                        id,
                        aggregation.step,
                        aggregation.group_by.clone(),
                        aggregation.aggregates.clone(),
                    )?));
                }
                PlanNodeKind::TopN(top_n) => {
                    operators.push(Box::new(TopN::new(id, top_n.keys.clone(), top_n.limit)));
                }
                PlanNodeKind::Limit(limit) => {
                    operators.push(Box::new(Limit::new(id, limit.offset, limit.limit)));
                }
                PlanNodeKind::OrderBy(order_by) => {
                    operators.push(Box::new(OrderBy::new(id, order_by.keys.clone())));
                }
                PlanNodeKind::LocalMerge(local_merge) => {
                    let num_sources = num_drivers(ctx.pipeline_id + 1) as usize;
                    ctx.task
                        .create_local_merge_sources(num_sources, local_merge.output_schema.clone())?;
                    let sources = ctx.task.local_merge_sources()?;
                    operators.push(Box::new(LocalMerge::new(
                        id,
                        local_merge.keys.clone(),
                        sources,
                    )));
                }
                PlanNodeKind::MergeJoin(merge_join) => {
                    let source = ctx.task.create_merge_join_source(node.id)?;
                    operators.push(Box::new(MergeJoin::new(
                        id,
                        merge_join.left_keys.clone(),
                        merge_join.right_keys.clone(),
                        source,
                    )));
                }
                PlanNodeKind::LocalPartition(local_partition) => {
                    let partitions = num_drivers(ctx.pipeline_id) as usize;
                    let memory = ctx.task.create_local_exchange(
                        node.id,
                        partitions,
                        local_partition.spec.clone(),
                        local_partition.output_schema.clone(),
                    )?;
                    operators.push(Box::new(LocalExchangeSource::new(
                        id,
                        memory,
                        ctx.driver_id as usize,
                    )));
                }
                PlanNodeKind::Unnest(unnest) => {
                    operators.push(Box::new(Unnest::new(
                        id,
                        unnest.replicate_columns.clone(),
                        unnest.unnest_column,
                    )));
                }
                PlanNodeKind::EnforceSingleRow(_) => {
                    operators.push(Box::new(EnforceSingleRow::new(id)));
                }
                PlanNodeKind::AssignUniqueId(assign) => {
                    operators.push(Box::new(AssignUniqueId::new(
                        id,
                        assign.id_name.clone(),
                        assign.task_unique_id(),
                        Arc::clone(assign.unique_id_counter()),
                    )));
                }
                PlanNodeKind::Extension(_) => match translate_plan_node(&ctx, id, node) {
                    Some(operator) => operators.push(operator?),
                    None => return Err(format!("unsupported plan node: {node}")),
                },
            }
            i += 1;
        }
        if let Some(supplier) = &self.consumer_supplier {
            let id = operators.len() as i32;
            operators.push(supplier(id, &ctx)?);
        }
        debug!(
            "driver created: task={} pipeline_id={} driver_id={} operators={}",
            ctx.task.task_id(),
            ctx.pipeline_id,
            ctx.driver_id,
            operators
                .iter()
                .map(|op| op.name())
                .collect::<Vec<_>>()
                .join(" -> ")
        );
        Ok(Driver::new(ctx, operators))
    }
}
