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
//! Shared helpers for pipeline tests: plan-node builders, a hand-driven
//! driver loop, and chunk fixtures.
#![allow(dead_code)]

use std::sync::atomic::AtomicI64;
use std::sync::{Arc, Mutex};

use arrow::array::{ArrayRef, Int64Array, RecordBatch};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};

use corvex::common::ids::PlanNodeId;
use corvex::connector::MemoryInsertTableHandle;
use corvex::exec::chunk::Chunk;
use corvex::exec::expr::{CmpOp, Expr};
use corvex::exec::node::aggregate::{AggFunc, AggregateSpec, AggregationNode, AggregationStep};
use corvex::exec::node::exchange::{ExchangeNode, MergeExchangeNode, PartitionedOutputNode};
use corvex::exec::node::filter::FilterNode;
use corvex::exec::node::join::{CrossJoinNode, HashJoinNode, MergeJoinNode};
use corvex::exec::node::limit::LimitNode;
use corvex::exec::node::local_exchange::{LocalMergeNode, LocalPartitionNode, LocalPartitionSpec};
use corvex::exec::node::project::ProjectNode;
use corvex::exec::node::scan::TableScanNode;
use corvex::exec::node::single_row::EnforceSingleRowNode;
use corvex::exec::node::sort::{OrderByNode, SortKey, TopNNode};
use corvex::exec::node::table_write::{InsertTableHandle, TableWriteNode};
use corvex::exec::node::unique_id::AssignUniqueIdNode;
use corvex::exec::node::unnest::UnnestNode;
use corvex::exec::node::values::ValuesNode;
use corvex::exec::node::{PlanNode, PlanNodeKind};
use corvex::exec::pipeline::driver::{Driver, DriverCtx};
use corvex::exec::pipeline::operator::{Consumer, ConsumerSupplier, Operator};
use corvex::exec::scalar::ScalarValue;
use corvex::runtime::task::Task;
use corvex::DriverFactory;
use corvex::LocalPlanner;

pub fn int_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![Field::new("v", DataType::Int64, false)]))
}

pub fn int_chunk(values: &[i64]) -> Chunk {
    let array = Arc::new(Int64Array::from(values.to_vec())) as ArrayRef;
    Chunk::new(RecordBatch::try_new(int_schema(), vec![array]).expect("record batch"))
}

pub fn two_column_chunk(keys: &[i64], values: &[i64]) -> Chunk {
    let schema = Arc::new(Schema::new(vec![
        Field::new("k", DataType::Int64, false),
        Field::new("v", DataType::Int64, false),
    ]));
    let k = Arc::new(Int64Array::from(keys.to_vec())) as ArrayRef;
    let v = Arc::new(Int64Array::from(values.to_vec())) as ArrayRef;
    Chunk::new(RecordBatch::try_new(schema, vec![k, v]).expect("record batch"))
}

pub fn int_column(chunk: &Chunk, index: usize) -> Vec<i64> {
    let col = chunk.column(index).expect("column");
    let col = col.as_any().downcast_ref::<Int64Array>().expect("int64");
    (0..col.len()).map(|i| col.value(i)).collect()
}

pub fn node(id: i32, kind: PlanNodeKind) -> Arc<PlanNode> {
    Arc::new(PlanNode::new(PlanNodeId::new(id), kind))
}

pub fn values_node(id: i32, parallelizable: bool, chunks: Vec<Chunk>) -> Arc<PlanNode> {
    node(
        id,
        PlanNodeKind::Values(ValuesNode {
            chunks,
            parallelizable,
        }),
    )
}

pub fn scan_node(id: i32) -> Arc<PlanNode> {
    node(
        id,
        PlanNodeKind::TableScan(TableScanNode {
            output_schema: int_schema(),
        }),
    )
}

/// `col0 > bound`
pub fn filter_node(id: i32, input: Arc<PlanNode>, bound: i64) -> Arc<PlanNode> {
    node(
        id,
        PlanNodeKind::Filter(FilterNode {
            input,
            predicate: Expr::cmp(CmpOp::Gt, Expr::col(0), Expr::lit(ScalarValue::Int64(bound))),
        }),
    )
}

/// Projects `col0` unchanged under `name`.
pub fn project_node(id: i32, input: Arc<PlanNode>, name: &str) -> Arc<PlanNode> {
    node(
        id,
        PlanNodeKind::Project(ProjectNode {
            input,
            exprs: vec![Expr::col(0)],
            names: vec![name.to_string()],
        }),
    )
}

pub fn count_star() -> AggregateSpec {
    AggregateSpec {
        func: AggFunc::Count,
        input: None,
        name: "cnt".to_string(),
    }
}

pub fn aggregation_node(
    id: i32,
    input: Arc<PlanNode>,
    step: AggregationStep,
    group_by: Vec<usize>,
) -> Arc<PlanNode> {
    node(
        id,
        PlanNodeKind::Aggregation(AggregationNode {
            input,
            step,
            group_by,
            aggregates: vec![count_star()],
        }),
    )
}

pub fn order_by_node(id: i32, input: Arc<PlanNode>, is_partial: bool) -> Arc<PlanNode> {
    node(
        id,
        PlanNodeKind::OrderBy(OrderByNode {
            input,
            keys: vec![SortKey::asc(0)],
            is_partial,
        }),
    )
}

pub fn top_n_node(id: i32, input: Arc<PlanNode>, limit: usize, is_partial: bool) -> Arc<PlanNode> {
    node(
        id,
        PlanNodeKind::TopN(TopNNode {
            input,
            keys: vec![SortKey::asc(0)],
            limit,
            is_partial,
        }),
    )
}

pub fn limit_node(id: i32, input: Arc<PlanNode>, limit: usize, is_partial: bool) -> Arc<PlanNode> {
    node(
        id,
        PlanNodeKind::Limit(LimitNode {
            input,
            offset: 0,
            limit,
            is_partial,
        }),
    )
}

pub fn local_merge_node(id: i32, input: Arc<PlanNode>) -> Arc<PlanNode> {
    node(
        id,
        PlanNodeKind::LocalMerge(LocalMergeNode {
            input,
            keys: vec![SortKey::asc(0)],
            output_schema: int_schema(),
        }),
    )
}

pub fn local_partition_node(id: i32, input: Arc<PlanNode>) -> Arc<PlanNode> {
    node(
        id,
        PlanNodeKind::LocalPartition(LocalPartitionNode {
            input,
            spec: LocalPartitionSpec::RoundRobin,
            output_schema: int_schema(),
        }),
    )
}

pub fn hash_join_node(id: i32, probe: Arc<PlanNode>, build: Arc<PlanNode>) -> Arc<PlanNode> {
    node(
        id,
        PlanNodeKind::HashJoin(HashJoinNode {
            probe,
            build,
            probe_keys: vec![0],
            build_keys: vec![0],
        }),
    )
}

pub fn cross_join_node(id: i32, probe: Arc<PlanNode>, build: Arc<PlanNode>) -> Arc<PlanNode> {
    node(id, PlanNodeKind::CrossJoin(CrossJoinNode { probe, build }))
}

pub fn merge_join_node(id: i32, left: Arc<PlanNode>, right: Arc<PlanNode>) -> Arc<PlanNode> {
    node(
        id,
        PlanNodeKind::MergeJoin(MergeJoinNode {
            left,
            right,
            left_keys: vec![0],
            right_keys: vec![0],
        }),
    )
}

pub fn exchange_node(id: i32) -> Arc<PlanNode> {
    node(
        id,
        PlanNodeKind::Exchange(ExchangeNode {
            output_schema: int_schema(),
        }),
    )
}

pub fn merge_exchange_node(id: i32) -> Arc<PlanNode> {
    node(
        id,
        PlanNodeKind::MergeExchange(MergeExchangeNode {
            output_schema: int_schema(),
            keys: vec![SortKey::asc(0)],
        }),
    )
}

pub fn partitioned_output_node(id: i32, input: Arc<PlanNode>) -> Arc<PlanNode> {
    node(
        id,
        PlanNodeKind::PartitionedOutput(PartitionedOutputNode {
            input,
            keys: Vec::new(),
            num_partitions: 1,
        }),
    )
}

pub fn table_write_node(
    id: i32,
    input: Arc<PlanNode>,
    handle: Arc<MemoryInsertTableHandle>,
) -> Arc<PlanNode> {
    node(
        id,
        PlanNodeKind::TableWrite(TableWriteNode {
            input,
            insert_table_handle: InsertTableHandle::new(handle),
        }),
    )
}

pub fn unnest_node(id: i32, input: Arc<PlanNode>) -> Arc<PlanNode> {
    node(
        id,
        PlanNodeKind::Unnest(UnnestNode {
            input,
            replicate_columns: vec![0],
            unnest_column: 1,
        }),
    )
}

pub fn enforce_single_row_node(id: i32, input: Arc<PlanNode>) -> Arc<PlanNode> {
    node(id, PlanNodeKind::EnforceSingleRow(EnforceSingleRowNode { input }))
}

pub fn assign_unique_id_node(id: i32, input: Arc<PlanNode>) -> Arc<PlanNode> {
    node(
        id,
        PlanNodeKind::AssignUniqueId(AssignUniqueIdNode {
            input,
            id_name: "unique".to_string(),
            task_unique_id: 1,
            unique_id_counter: Arc::new(AtomicI64::new(0)),
        }),
    )
}

/// Plans `root` without a final consumer.
pub fn plan(root: &Arc<PlanNode>) -> Vec<DriverFactory> {
    let mut factories = Vec::new();
    LocalPlanner::plan(root, None, &mut factories).expect("plan");
    factories
}

/// Final consumer collecting every output chunk into a shared vector.
pub fn collecting_consumer() -> (ConsumerSupplier, Arc<Mutex<Vec<Chunk>>>) {
    let collected: Arc<Mutex<Vec<Chunk>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&collected);
    let supplier: ConsumerSupplier = Arc::new(move || {
        let sink = Arc::clone(&sink);
        let consumer: Consumer = Arc::new(move |chunk| {
            if let Some(chunk) = chunk {
                sink.lock().expect("collector lock").push(chunk);
            }
            Ok(())
        });
        consumer
    });
    (supplier, collected)
}

pub fn make_driver(
    factory: &DriverFactory,
    task: &Arc<Task>,
    pipeline_id: i32,
    driver_id: u32,
    num_drivers: impl Fn(i32) -> u32,
) -> Driver {
    factory
        .create_driver(
            DriverCtx::new(Arc::clone(task), driver_id, pipeline_id),
            None,
            num_drivers,
        )
        .expect("create driver")
}

/// Steps a driver's operators until the terminal operator finishes.
///
/// This is a deliberately naive synchronous stand-in for the scheduler:
/// cross-pipeline dependencies must already be satisfied or the loop
/// reports a stall.
pub fn drive(driver: &mut Driver) -> Result<(), String> {
    let operators = driver.operators_mut();
    let count = operators.len();
    let mut finishing_sent = vec![false; count];
    loop {
        let mut progressed = false;
        for i in 0..count.saturating_sub(1) {
            let (upstream_half, downstream_half) = operators.split_at_mut(i + 1);
            let upstream = &mut upstream_half[i];
            let downstream = &mut downstream_half[0];
            if downstream.need_input() {
                if let Some(chunk) = upstream.pull_chunk()? {
                    downstream.push_chunk(chunk)?;
                    progressed = true;
                    continue;
                }
            }
            if upstream.is_finished() && !finishing_sent[i + 1] {
                downstream.set_finishing()?;
                finishing_sent[i + 1] = true;
                progressed = true;
            }
        }
        let last = operators
            .last_mut()
            .ok_or_else(|| "driver has no operators".to_string())?;
        if last.pull_chunk()?.is_some() {
            progressed = true;
        }
        if last.is_finished() {
            return Ok(());
        }
        if !progressed {
            return Err("pipeline stalled".to_string());
        }
    }
}

pub fn operator_names(driver: &Driver) -> Vec<String> {
    driver
        .operator_names()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Structural invariants every planned factory list must satisfy.
pub fn check_invariants(factories: &[DriverFactory]) {
    assert!(!factories.is_empty());
    for (index, factory) in factories.iter().enumerate() {
        assert_eq!(factory.output_driver, index == 0, "factory {index}");
        if index > 0 {
            assert!(
                factory.consumer_supplier.is_some(),
                "non-root factory {index} lacks a sink"
            );
        }
        assert!(factory.max_drivers >= 1, "factory {index}");
        assert!(!factory.plan_nodes.is_empty(), "factory {index}");
        let leaf = factory.plan_nodes[0].sources().is_empty();
        assert_eq!(factory.input_driver, leaf, "factory {index}");
    }
}
