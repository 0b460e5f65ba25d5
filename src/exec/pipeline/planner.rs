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
//! Local pipeline planner.
//!
//! Responsibilities:
//! - Slices a plan-node tree into driver factories: one per pipeline, in an
//!   order where every factory precedes the factories feeding it.
//! - Pairs each child pipeline with the sink its parent node requires
//!   (build sinks, local partition, callback sinks into merge sources).
//! - Computes each factory's driver cap from per-node constraints.
//!
//! Key exported interfaces:
//! - Types: `LocalPlanner`.

use std::sync::Arc;

use crate::common::logging::debug;
use crate::exec::node::{PlanNode, PlanNodeKind};
use crate::exec::operators::{CallbackSink, CrossJoinBuild, HashBuild, LocalPartition};
use crate::exec::pipeline::driver::DriverCtx;
use crate::exec::pipeline::driver_factory::DriverFactory;
use crate::exec::pipeline::operator::{Consumer, ConsumerSupplier, Operator, OperatorSupplier};
use crate::exec::pipeline::translator::translator_max_drivers;

/// Slices plan trees into driver factories.
pub struct LocalPlanner;

impl LocalPlanner {
    /// Populates `driver_factories` for `plan_node`. Factory 0 drives the
    /// root; `consumer_supplier` receives the root's output rows. On error
    /// the out-list is left empty.
    pub fn plan(
        plan_node: &Arc<PlanNode>,
        consumer_supplier: Option<ConsumerSupplier>,
        driver_factories: &mut Vec<DriverFactory>,
    ) -> Result<(), String> {
        driver_factories.clear();
        let mut factories = Vec::new();
        plan_recursive(
            plan_node,
            None,
            make_root_consumer_supplier(consumer_supplier),
            &mut factories,
        )?;
        factories[0].output_driver = true;
        for factory in &mut factories {
            factory.max_drivers = max_drivers(&factory.plan_nodes)?;
        }
        debug!(
            "planned {} pipelines for plan rooted at {}",
            factories.len(),
            plan_node
        );
        *driver_factories = factories;
        Ok(())
    }
}

/// True when the sources of `plan_node` must run in their own pipelines.
fn must_start_new_pipeline(plan_node: &PlanNode, source_index: usize) -> bool {
    match plan_node.kind {
        // Barrier nodes own their upstream: it always becomes a pipeline.
        PlanNodeKind::LocalMerge(_) | PlanNodeKind::LocalPartition(_) => true,
        // Non-first sources always run in their own pipeline.
        _ => source_index != 0,
    }
}

/// Wraps the caller's final consumer into a callback sink supplier.
fn make_root_consumer_supplier(
    consumer_supplier: Option<ConsumerSupplier>,
) -> Option<OperatorSupplier> {
    consumer_supplier.map(|supplier| {
        let supplier_fn = move |operator_id: i32,
                                _ctx: &DriverCtx|
              -> Result<Box<dyn Operator>, String> {
            Ok(Box::new(CallbackSink::new(operator_id, supplier())))
        };
        Arc::new(supplier_fn) as OperatorSupplier
    })
}

/// Sink terminating any child pipeline of `plan_node`, decided by the
/// parent's kind. `None` when the child fuses into the parent's pipeline.
fn make_consumer_supplier(plan_node: &Arc<PlanNode>) -> Option<OperatorSupplier> {
    match &plan_node.kind {
        PlanNodeKind::LocalMerge(_) => {
            let supplier_fn =
                |operator_id: i32, ctx: &DriverCtx| -> Result<Box<dyn Operator>, String> {
                    let source = ctx.task.local_merge_source(ctx.driver_id)?;
                    let consumer: Consumer = Arc::new(move |chunk| match chunk {
                        Some(chunk) => source.enqueue(chunk),
                        None => {
                            source.set_finished();
                            Ok(())
                        }
                    });
                    Ok(Box::new(CallbackSink::new(operator_id, consumer)))
                };
            Some(Arc::new(supplier_fn) as OperatorSupplier)
        }
        PlanNodeKind::LocalPartition(_) => {
            let node_id = plan_node.id;
            let supplier_fn =
                move |operator_id: i32, ctx: &DriverCtx| -> Result<Box<dyn Operator>, String> {
                    let memory = ctx.task.local_exchange(node_id)?;
                    Ok(Box::new(LocalPartition::new(operator_id, memory)))
                };
            Some(Arc::new(supplier_fn) as OperatorSupplier)
        }
        PlanNodeKind::HashJoin(join) => {
            let node_id = plan_node.id;
            let build_keys = join.build_keys.clone();
            let supplier_fn =
                move |operator_id: i32, ctx: &DriverCtx| -> Result<Box<dyn Operator>, String> {
                    let bridge = ctx.task.hash_join_bridge(node_id)?;
                    Ok(Box::new(HashBuild::new(
                        operator_id,
                        bridge,
                        build_keys.clone(),
                    )))
                };
            Some(Arc::new(supplier_fn) as OperatorSupplier)
        }
        PlanNodeKind::CrossJoin(_) => {
            let node_id = plan_node.id;
            let supplier_fn =
                move |operator_id: i32, ctx: &DriverCtx| -> Result<Box<dyn Operator>, String> {
                    let bridge = ctx.task.cross_join_bridge(node_id)?;
                    Ok(Box::new(CrossJoinBuild::new(operator_id, bridge)))
                };
            Some(Arc::new(supplier_fn) as OperatorSupplier)
        }
        PlanNodeKind::MergeJoin(_) => {
            let node_id = plan_node.id;
            let supplier_fn =
                move |operator_id: i32, ctx: &DriverCtx| -> Result<Box<dyn Operator>, String> {
                    let source = ctx.task.merge_join_source(node_id)?;
                    let consumer: Consumer = Arc::new(move |chunk| match chunk {
                        Some(chunk) => source.enqueue(chunk),
                        None => {
                            source.set_finished();
                            Ok(())
                        }
                    });
                    Ok(Box::new(CallbackSink::new(operator_id, consumer)))
                };
            Some(Arc::new(supplier_fn) as OperatorSupplier)
        }
        _ => None,
    }
}

/// Recursive pipeline slicing: sources first, then the node itself, so each
/// factory's `plan_nodes` runs bottom-up. A fresh factory is opened for the
/// root call and for every child that must not fuse.
fn plan_recursive(
    plan_node: &Arc<PlanNode>,
    current_factory: Option<usize>,
    consumer_supplier: Option<OperatorSupplier>,
    factories: &mut Vec<DriverFactory>,
) -> Result<(), String> {
    let current = match current_factory {
        Some(index) => index,
        None => {
            let mut factory = DriverFactory::new();
            factory.consumer_supplier = consumer_supplier;
            factories.push(factory);
            factories.len() - 1
        }
    };

    let sources = plan_node.sources();
    if sources.is_empty() {
        factories[current].input_driver = true;
    } else {
        for (index, source) in sources.into_iter().enumerate() {
            let fused = (!must_start_new_pipeline(plan_node, index)).then_some(current);
            plan_recursive(source, fused, make_consumer_supplier(plan_node), factories)?;
        }
    }

    factories[current].plan_nodes.push(Arc::clone(plan_node));
    Ok(())
}

/// Driver cap for one pipeline: the first matching constraint per node,
/// intersected. `u32::MAX` means no node constrained the pipeline.
fn max_drivers(plan_nodes: &[Arc<PlanNode>]) -> Result<u32, String> {
    let mut count = u32::MAX;
    for node in plan_nodes {
        match &node.kind {
            PlanNodeKind::Aggregation(aggregation)
            | PlanNodeKind::StreamingAggregation(aggregation) => {
                // Final and single-stage aggregations run single-threaded.
                if aggregation.step().is_single_threaded() {
                    return Ok(1);
                }
            }
            PlanNodeKind::TopN(top_n) => {
                if !top_n.is_partial() {
                    return Ok(1);
                }
            }
            PlanNodeKind::Values(values) => {
                if !values.is_parallelizable() {
                    return Ok(1);
                }
            }
            PlanNodeKind::Limit(limit) => {
                if !limit.is_partial() {
                    return Ok(1);
                }
            }
            PlanNodeKind::OrderBy(order_by) => {
                if !order_by.is_partial() {
                    return Ok(1);
                }
            }
            PlanNodeKind::LocalMerge(_) => return Ok(1),
            PlanNodeKind::MergeExchange(_) => return Ok(1),
            PlanNodeKind::TableWrite(write) => {
                if !write
                    .insert_table_handle()
                    .connector_insert_table_handle()
                    .supports_multi_threading()
                {
                    return Ok(1);
                }
            }
            _ => {
                if let Some(declared) = translator_max_drivers(node) {
                    if declared == 0 {
                        return Err(format!(
                            "max drivers must be greater than 0. Plan node: {node}"
                        ));
                    }
                    if declared == 1 {
                        return Ok(1);
                    }
                    count = count.min(declared);
                }
            }
        }
    }
    Ok(count)
}
