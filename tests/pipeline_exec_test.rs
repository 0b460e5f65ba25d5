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
//! End-to-end pipeline tests: plan, materialize, and hand-drive drivers
//! through the cross-pipeline handoffs.

mod common;

use std::sync::{Arc, Mutex};

use common::*;
use corvex::common::ids::PlanNodeId;
use corvex::connector::MemoryInsertTableHandle;
use corvex::exec::chunk::Chunk;
use corvex::exec::node::aggregate::AggregationStep;
use corvex::exec::node::{ExtensionPlanNode, PlanNode, PlanNodeKind};
use corvex::exec::pipeline::driver::DriverCtx;
use corvex::exec::pipeline::operator::Operator;
use corvex::exec::pipeline::translator::{register_translator, PlanNodeTranslator};
use corvex::runtime::exchange::{ExchangeClient, QueueExchangeClient};
use corvex::runtime::task::Task;
use corvex::LocalPlanner;

fn collected_ints(collected: &Arc<Mutex<Vec<Chunk>>>, column: usize) -> Vec<i64> {
    collected
        .lock()
        .expect("collector lock")
        .iter()
        .flat_map(|chunk| int_column(chunk, column))
        .collect()
}

#[test]
fn fused_filter_project_pipeline_delivers_to_the_final_consumer() {
    let values = values_node(0, false, vec![int_chunk(&[1, 2, 3]), int_chunk(&[4, 5])]);
    let filter = filter_node(1, values, 2);
    let root = project_node(2, filter, "kept");

    let (consumer, collected) = collecting_consumer();
    let mut factories = Vec::new();
    LocalPlanner::plan(&root, Some(consumer), &mut factories).expect("plan");
    assert_eq!(factories.len(), 1);

    let task = Task::new("exec-fuse");
    let mut driver = make_driver(&factories[0], &task, 0, 0, |_| 1);
    assert_eq!(
        driver.operator_names(),
        vec!["Values", "FilterProject", "CallbackSink"]
    );
    drive(&mut driver).expect("drive");
    assert_eq!(collected_ints(&collected, 0), vec![3, 4, 5]);
}

#[test]
fn hash_join_pipelines_meet_through_the_bridge() {
    let probe = values_node(0, false, vec![int_chunk(&[1, 2, 3])]);
    let build = values_node(1, false, vec![int_chunk(&[2, 3, 4])]);
    let root = hash_join_node(2, probe, build);

    let (consumer, collected) = collecting_consumer();
    let mut factories = Vec::new();
    LocalPlanner::plan(&root, Some(consumer), &mut factories).expect("plan");
    assert_eq!(factories.len(), 2);

    let task = Task::new("exec-hash-join");
    let mut probe_driver = make_driver(&factories[0], &task, 0, 0, |_| 1);
    let mut build_driver = make_driver(&factories[1], &task, 1, 0, |_| 1);

    drive(&mut build_driver).expect("drive build");
    drive(&mut probe_driver).expect("drive probe");

    let mut keys = collected_ints(&collected, 0);
    keys.sort_unstable();
    assert_eq!(keys, vec![2, 3]);
}

#[test]
fn local_merge_reorders_parallel_sorted_streams() {
    let scan = scan_node(0);
    let partial_sort = order_by_node(1, scan, true);
    let root = local_merge_node(2, partial_sort);

    let (consumer, collected) = collecting_consumer();
    let mut factories = Vec::new();
    LocalPlanner::plan(&root, Some(consumer), &mut factories).expect("plan");

    let task = Task::new("exec-local-merge");
    task.add_scan_chunks(PlanNodeId::new(0), vec![int_chunk(&[3, 1]), int_chunk(&[4, 2])]);

    let num_drivers = |pipeline: i32| if pipeline == 1 { 2 } else { 1 };
    let mut merge_driver = make_driver(&factories[0], &task, 0, 0, num_drivers);
    let mut producer_a = make_driver(&factories[1], &task, 1, 0, num_drivers);
    let mut producer_b = make_driver(&factories[1], &task, 1, 1, num_drivers);

    drive(&mut producer_a).expect("drive producer a");
    drive(&mut producer_b).expect("drive producer b");
    drive(&mut merge_driver).expect("drive merge");

    assert_eq!(collected_ints(&collected, 0), vec![1, 2, 3, 4]);
}

#[test]
fn merge_join_streams_meet_through_the_task_source() {
    let left = values_node(0, false, vec![int_chunk(&[1, 2, 2, 5])]);
    let right = values_node(1, false, vec![int_chunk(&[2, 2, 3, 5])]);
    let root = merge_join_node(2, left, right);

    let (consumer, collected) = collecting_consumer();
    let mut factories = Vec::new();
    LocalPlanner::plan(&root, Some(consumer), &mut factories).expect("plan");

    let task = Task::new("exec-merge-join");
    let mut left_driver = make_driver(&factories[0], &task, 0, 0, |_| 1);
    let mut right_driver = make_driver(&factories[1], &task, 1, 0, |_| 1);

    drive(&mut right_driver).expect("drive right");
    drive(&mut left_driver).expect("drive left");

    // Key 2 matches 2x2 times, key 5 once.
    assert_eq!(collected_ints(&collected, 0).len(), 5);
}

#[test]
fn local_partition_feeds_the_consuming_pipeline() {
    let values = values_node(0, true, vec![int_chunk(&[1, 2]), int_chunk(&[3, 4])]);
    let partition = local_partition_node(1, values);
    let root = aggregation_node(2, partition, AggregationStep::Final, vec![]);

    let (consumer, collected) = collecting_consumer();
    let mut factories = Vec::new();
    LocalPlanner::plan(&root, Some(consumer), &mut factories).expect("plan");
    assert_eq!(factories.len(), 2);
    assert_eq!(factories[0].max_drivers, 1);

    let task = Task::new("exec-local-partition");
    let mut consumer_driver = make_driver(&factories[0], &task, 0, 0, |_| 1);
    assert_eq!(
        consumer_driver.operator_names(),
        vec!["LocalExchangeSource", "HashAggregation", "CallbackSink"]
    );
    let mut producer_driver = make_driver(&factories[1], &task, 1, 0, |_| 1);
    assert_eq!(
        producer_driver.operator_names(),
        vec!["Values", "LocalPartition"]
    );

    drive(&mut producer_driver).expect("drive producer");
    drive(&mut consumer_driver).expect("drive consumer");

    assert_eq!(collected_ints(&collected, 0), vec![4]);
}

#[test]
fn exchange_fragment_aggregates_remote_chunks() {
    let exchange = exchange_node(0);
    let root = aggregation_node(1, exchange, AggregationStep::Final, vec![]);

    let (consumer, collected) = collecting_consumer();
    let mut factories = Vec::new();
    LocalPlanner::plan(&root, Some(consumer), &mut factories).expect("plan");

    let client = QueueExchangeClient::new();
    client.enqueue(int_chunk(&[1, 2, 3])).expect("enqueue");
    client.enqueue(int_chunk(&[4])).expect("enqueue");
    client.finish();

    let task = Task::new("exec-exchange");
    let client: Arc<dyn ExchangeClient> = client;
    let mut driver = factories[0]
        .create_driver(DriverCtx::new(Arc::clone(&task), 0, 0), Some(client), |_| 1)
        .expect("create driver");
    drive(&mut driver).expect("drive");

    assert_eq!(collected_ints(&collected, 0), vec![4]);
}

#[test]
fn table_write_pipeline_writes_through_the_connector_handle() {
    let handle = Arc::new(MemoryInsertTableHandle::new(false));
    let values = values_node(0, false, vec![int_chunk(&[7, 8, 9])]);
    let root = table_write_node(1, values, Arc::clone(&handle));

    let factories = plan(&root);
    assert_eq!(factories[0].max_drivers, 1);

    let task = Task::new("exec-table-write");
    let mut driver = make_driver(&factories[0], &task, 0, 0, |_| 1);
    drive(&mut driver).expect("drive");
    assert_eq!(handle.written_rows(), 3);
}

#[derive(Debug)]
struct RowMarkerNode {
    input: Arc<PlanNode>,
}

impl ExtensionPlanNode for RowMarkerNode {
    fn name(&self) -> &str {
        "RowMarker"
    }

    fn sources(&self) -> Vec<&Arc<PlanNode>> {
        vec![&self.input]
    }
}

struct RowMarkerOperator {
    operator_id: i32,
    pending: Option<Chunk>,
    finishing: bool,
}

impl Operator for RowMarkerOperator {
    fn operator_id(&self) -> i32 {
        self.operator_id
    }

    fn name(&self) -> &str {
        "RowMarker"
    }

    fn need_input(&self) -> bool {
        !self.finishing && self.pending.is_none()
    }

    fn push_chunk(&mut self, chunk: Chunk) -> Result<(), String> {
        self.pending = Some(chunk);
        Ok(())
    }

    fn pull_chunk(&mut self) -> Result<Option<Chunk>, String> {
        Ok(self.pending.take())
    }

    fn set_finishing(&mut self) -> Result<(), String> {
        self.finishing = true;
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.finishing && self.pending.is_none()
    }
}

struct RowMarkerTranslator;

impl PlanNodeTranslator for RowMarkerTranslator {
    fn to_operator(
        &self,
        _ctx: &DriverCtx,
        operator_id: i32,
        node: &Arc<PlanNode>,
    ) -> Option<Result<Box<dyn Operator>, String>> {
        match &node.kind {
            PlanNodeKind::Extension(extension) if extension.name() == "RowMarker" => {
                Some(Ok(Box::new(RowMarkerOperator {
                    operator_id,
                    pending: None,
                    finishing: false,
                })))
            }
            _ => None,
        }
    }
}

#[derive(Debug)]
struct UnknownExtensionNode;

impl ExtensionPlanNode for UnknownExtensionNode {
    fn name(&self) -> &str {
        "UnknownExtension"
    }

    fn sources(&self) -> Vec<&Arc<PlanNode>> {
        Vec::new()
    }
}

#[test]
fn registered_translators_materialize_extension_nodes() {
    register_translator(Arc::new(RowMarkerTranslator));

    let values = values_node(0, false, vec![int_chunk(&[1, 2])]);
    let root = node(
        1,
        PlanNodeKind::Extension(Arc::new(RowMarkerNode { input: values })),
    );

    let (consumer, collected) = collecting_consumer();
    let mut factories = Vec::new();
    LocalPlanner::plan(&root, Some(consumer), &mut factories).expect("plan");

    let task = Task::new("exec-extension");
    let mut driver = make_driver(&factories[0], &task, 0, 0, |_| 1);
    assert_eq!(
        driver.operator_names(),
        vec!["Values", "RowMarker", "CallbackSink"]
    );
    drive(&mut driver).expect("drive");
    assert_eq!(collected_ints(&collected, 0), vec![1, 2]);
}

#[test]
fn unhandled_extension_nodes_fail_driver_creation() {
    let root = node(0, PlanNodeKind::Extension(Arc::new(UnknownExtensionNode)));
    let factories = plan(&root);

    let task = Task::new("exec-unknown-extension");
    let err = factories[0]
        .create_driver(DriverCtx::new(Arc::clone(&task), 0, 0), None, |_| 1)
        .err()
        .expect("driver creation must fail");
    assert!(err.contains("unsupported plan node"), "{err}");
    assert!(err.contains("UnknownExtension"), "{err}");
}
