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
//! Planning tests: pipeline slicing shapes, driver caps, and structural
//! invariants over random plans.

mod common;

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use common::*;
use corvex::exec::node::aggregate::AggregationStep;
use corvex::exec::node::PlanNode;
use corvex::runtime::task::Task;
use corvex::DriverFactory;
use corvex::LocalPlanner;

fn factory_summary(factories: &[DriverFactory]) -> Vec<(Vec<i32>, bool, bool, u32)> {
    factories
        .iter()
        .map(|factory| {
            (
                factory
                    .plan_nodes
                    .iter()
                    .map(|node| node.id().as_i32())
                    .collect(),
                factory.input_driver,
                factory.output_driver,
                factory.max_drivers,
            )
        })
        .collect()
}

fn node_names(factory: &DriverFactory) -> Vec<&str> {
    factory.plan_nodes.iter().map(|node| node.name()).collect()
}

#[test]
fn scan_filter_project_final_aggregation_is_one_fused_pipeline() {
    let scan = scan_node(0);
    let filter = filter_node(1, scan, 10);
    let project = project_node(2, filter, "v");
    let root = aggregation_node(3, project, AggregationStep::Final, vec![]);

    let factories = plan(&root);
    check_invariants(&factories);
    assert_eq!(factories.len(), 1);
    assert!(factories[0].input_driver);
    assert!(factories[0].output_driver);
    assert_eq!(factories[0].max_drivers, 1);
    assert_eq!(
        node_names(&factories[0]),
        vec!["TableScan", "Filter", "Project", "Aggregation"]
    );

    let task = Task::new("q1");
    let driver = make_driver(&factories[0], &task, 0, 0, |_| 1);
    assert_eq!(
        driver.operator_names(),
        vec!["TableScan", "FilterProject", "HashAggregation"]
    );
    assert_eq!(driver.operator_ids(), vec![0, 1, 2]);
}

#[test]
fn exchange_fragment_pair_shapes() {
    // Producing fragment: scan -> partial aggregation -> partitioned output.
    let scan = scan_node(0);
    let partial = aggregation_node(1, scan, AggregationStep::Partial, vec![]);
    let producer_root = partitioned_output_node(2, partial);
    let producer = plan(&producer_root);
    check_invariants(&producer);
    assert_eq!(producer.len(), 1);
    assert!(producer[0].input_driver);
    assert_eq!(producer[0].max_drivers, u32::MAX);
    assert_eq!(
        node_names(&producer[0]),
        vec!["TableScan", "Aggregation", "PartitionedOutput"]
    );

    // Consuming fragment: exchange -> final aggregation.
    let exchange = exchange_node(3);
    let consumer_root = aggregation_node(4, exchange, AggregationStep::Final, vec![]);
    let consumer = plan(&consumer_root);
    check_invariants(&consumer);
    assert_eq!(consumer.len(), 1);
    assert!(consumer[0].output_driver);
    assert_eq!(consumer[0].max_drivers, 1);
    assert_eq!(node_names(&consumer[0]), vec!["Exchange", "Aggregation"]);
}

#[test]
fn hash_join_splits_only_the_build_side() {
    let probe = scan_node(0);
    let build = scan_node(1);
    let root = hash_join_node(2, probe, build);

    let factories = plan(&root);
    check_invariants(&factories);
    assert_eq!(factories.len(), 2);
    assert_eq!(node_names(&factories[0]), vec!["TableScan", "HashJoin"]);
    assert_eq!(node_names(&factories[1]), vec!["TableScan"]);
    assert!(factories[1].consumer_supplier.is_some());

    let task = Task::new("q3");
    let probe_driver = make_driver(&factories[0], &task, 0, 0, |_| 1);
    assert_eq!(probe_driver.operator_names(), vec!["TableScan", "HashProbe"]);
    let build_driver = make_driver(&factories[1], &task, 1, 0, |_| 1);
    assert_eq!(build_driver.operator_names(), vec!["TableScan", "HashBuild"]);
}

#[test]
fn local_merge_owns_its_upstream_pipeline() {
    let scan = scan_node(0);
    let partial_sort = order_by_node(1, scan, true);
    let root = local_merge_node(2, partial_sort);

    let factories = plan(&root);
    check_invariants(&factories);
    assert_eq!(factories.len(), 2);
    assert_eq!(node_names(&factories[0]), vec!["LocalMerge"]);
    assert_eq!(factories[0].max_drivers, 1);
    assert!(factories[0].output_driver);
    assert_eq!(node_names(&factories[1]), vec!["TableScan", "OrderBy"]);
    assert!(factories[1].consumer_supplier.is_some());
    assert_eq!(factories[1].max_drivers, u32::MAX);

    // Materializing the merge driver sizes the merge-source array from the
    // upstream pipeline's driver count.
    let task = Task::new("q4");
    let merge_driver = make_driver(&factories[0], &task, 0, 0, |pipeline| {
        if pipeline == 1 {
            2
        } else {
            1
        }
    });
    assert_eq!(merge_driver.operator_names(), vec!["LocalMerge"]);
    assert!(task.local_merge_source(0).is_ok());
    assert!(task.local_merge_source(1).is_ok());
    assert!(task.local_merge_source(2).is_err());

    // Producer drivers terminate in callback sinks feeding those sources.
    let producer = make_driver(&factories[1], &task, 1, 0, |_| 2);
    assert_eq!(
        producer.operator_names(),
        vec!["TableScan", "OrderBy", "CallbackSink"]
    );
    assert_eq!(producer.operator_ids(), vec![0, 1, 2]);
}

#[test]
fn non_parallelizable_values_chain_runs_single_threaded() {
    let values = values_node(0, false, vec![two_column_chunk(&[1], &[1])]);
    let unnest = unnest_node(1, values);
    let root = enforce_single_row_node(2, unnest);

    let factories = plan(&root);
    check_invariants(&factories);
    assert_eq!(factories.len(), 1);
    assert!(factories[0].input_driver);
    assert_eq!(factories[0].max_drivers, 1);

    let task = Task::new("q5");
    let driver = make_driver(&factories[0], &task, 0, 0, |_| 1);
    assert_eq!(
        driver.operator_names(),
        vec!["Values", "Unnest", "EnforceSingleRow"]
    );
    assert_eq!(driver.operator_ids(), vec![0, 1, 2]);
}

#[test]
fn merge_join_registers_its_source_and_sinks_the_right_side() {
    let left = scan_node(0);
    let right = scan_node(1);
    let root = merge_join_node(2, left, right);

    let factories = plan(&root);
    check_invariants(&factories);
    assert_eq!(factories.len(), 2);
    assert_eq!(node_names(&factories[0]), vec!["TableScan", "MergeJoin"]);
    assert_eq!(node_names(&factories[1]), vec!["TableScan"]);

    let task = Task::new("q6");
    let join_node_id = root.id();
    assert!(task.merge_join_source(join_node_id).is_err());
    let left_driver = make_driver(&factories[0], &task, 0, 0, |_| 1);
    assert_eq!(left_driver.operator_names(), vec!["TableScan", "MergeJoin"]);
    assert!(task.merge_join_source(join_node_id).is_ok());

    let right_driver = make_driver(&factories[1], &task, 1, 0, |_| 1);
    assert_eq!(
        right_driver.operator_names(),
        vec!["TableScan", "CallbackSink"]
    );
}

#[test]
fn fusion_applies_only_to_adjacent_filter_project() {
    // Filter NOT followed by project stays a lone filter-project operator.
    let scan = scan_node(0);
    let filter = filter_node(1, scan, 0);
    let root = limit_node(2, filter, 10, false);
    let factories = plan(&root);
    let task = Task::new("q-fuse");
    let driver = make_driver(&factories[0], &task, 0, 0, |_| 1);
    assert_eq!(
        driver.operator_names(),
        vec!["TableScan", "FilterProject", "Limit"]
    );
    assert_eq!(driver.operator_ids(), vec![0, 1, 2]);

    // Project then filter (reversed order) must not fuse either.
    let scan = scan_node(3);
    let project = project_node(4, scan, "v");
    let root = filter_node(5, project, 0);
    let factories = plan(&root);
    let driver = make_driver(&factories[0], &task, 0, 0, |_| 1);
    assert_eq!(
        driver.operator_names(),
        vec!["TableScan", "FilterProject", "FilterProject"]
    );
    assert_eq!(driver.operator_ids(), vec![0, 1, 2]);
}

#[test]
fn planning_is_deterministic() {
    let scan = scan_node(0);
    let build = scan_node(1);
    let join = hash_join_node(2, scan, build);
    let sorted = order_by_node(3, join, true);
    let root = local_merge_node(4, sorted);

    let first = factory_summary(&plan(&root));
    let second = factory_summary(&plan(&root));
    assert_eq!(first, second);
}

fn count_nodes_named(node: &Arc<PlanNode>, name: &str) -> usize {
    let own = usize::from(node.name() == name);
    own + node
        .sources()
        .iter()
        .map(|source| count_nodes_named(source, name))
        .sum::<usize>()
}

/// Random plan tree; returns the root and the number of pipeline-splitting
/// nodes in it (each contributes exactly one extra factory).
fn random_tree(rng: &mut StdRng, depth: usize, next_id: &mut i32) -> (Arc<PlanNode>, usize) {
    let my_id = *next_id;
    *next_id += 1;
    if depth == 0 || rng.gen_bool(0.25) {
        let leaf = if rng.gen_bool(0.5) {
            scan_node(my_id)
        } else {
            values_node(my_id, rng.gen_bool(0.5), Vec::new())
        };
        return (leaf, 0);
    }
    match rng.gen_range(0..11) {
        0 => {
            let (input, splits) = random_tree(rng, depth - 1, next_id);
            (filter_node(my_id, input, 0), splits)
        }
        1 => {
            let (input, splits) = random_tree(rng, depth - 1, next_id);
            (project_node(my_id, input, "p"), splits)
        }
        2 => {
            let (input, splits) = random_tree(rng, depth - 1, next_id);
            let partial = rng.gen_bool(0.5);
            (limit_node(my_id, input, 5, partial), splits)
        }
        3 => {
            let (input, splits) = random_tree(rng, depth - 1, next_id);
            let partial = rng.gen_bool(0.5);
            (top_n_node(my_id, input, 5, partial), splits)
        }
        4 => {
            let (input, splits) = random_tree(rng, depth - 1, next_id);
            let partial = rng.gen_bool(0.5);
            (order_by_node(my_id, input, partial), splits)
        }
        5 => {
            let (input, splits) = random_tree(rng, depth - 1, next_id);
            let step = if rng.gen_bool(0.5) {
                AggregationStep::Partial
            } else {
                AggregationStep::Final
            };
            (aggregation_node(my_id, input, step, vec![]), splits)
        }
        6 => {
            let (input, splits) = random_tree(rng, depth - 1, next_id);
            (local_merge_node(my_id, input), splits + 1)
        }
        7 => {
            let (input, splits) = random_tree(rng, depth - 1, next_id);
            (local_partition_node(my_id, input), splits + 1)
        }
        8 => {
            let (probe, left_splits) = random_tree(rng, depth - 1, next_id);
            let (build, right_splits) = random_tree(rng, depth - 1, next_id);
            (
                hash_join_node(my_id, probe, build),
                left_splits + right_splits + 1,
            )
        }
        9 => {
            let (probe, left_splits) = random_tree(rng, depth - 1, next_id);
            let (build, right_splits) = random_tree(rng, depth - 1, next_id);
            (
                cross_join_node(my_id, probe, build),
                left_splits + right_splits + 1,
            )
        }
        _ => {
            let (left, left_splits) = random_tree(rng, depth - 1, next_id);
            let (right, right_splits) = random_tree(rng, depth - 1, next_id);
            (
                merge_join_node(my_id, left, right),
                left_splits + right_splits + 1,
            )
        }
    }
}

#[test]
fn random_plans_satisfy_planner_invariants() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..50 {
        let mut next_id = 0;
        let (root, splitters) = random_tree(&mut rng, 4, &mut next_id);

        let mut factories = Vec::new();
        LocalPlanner::plan(&root, None, &mut factories).expect("plan");
        check_invariants(&factories);
        assert_eq!(factories.len(), 1 + splitters, "root: {root}");

        // Every local partition node heads exactly one pipeline.
        let local_partitions = count_nodes_named(&root, "LocalPartition");
        let partition_heads = factories
            .iter()
            .filter(|factory| factory.plan_nodes[0].name() == "LocalPartition")
            .count();
        assert_eq!(partition_heads, local_partitions, "root: {root}");

        // Same input, same output.
        let mut again = Vec::new();
        LocalPlanner::plan(&root, None, &mut again).expect("plan");
        assert_eq!(factory_summary(&factories), factory_summary(&again));
    }
}
