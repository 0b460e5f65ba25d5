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
//! Extension plan-node translators.
//!
//! Responsibilities:
//! - Process-wide registry turning extension plan nodes into operators and
//!   declaring per-node driver caps for operators the planner does not know.
//!
//! Key exported interfaces:
//! - Types: `PlanNodeTranslator`.
//! - Functions: `register_translator`, `translate_plan_node`,
//!   `translator_max_drivers`.

use std::sync::{Arc, OnceLock, RwLock};

use crate::exec::node::PlanNode;
use crate::exec::pipeline::driver::DriverCtx;
use crate::exec::pipeline::operator::Operator;

/// Plug-in hook mapping extension plan nodes onto operators.
///
/// Translators are consulted in registration order; the first one that
/// returns `Some` wins.
pub trait PlanNodeTranslator: Send + Sync {
    /// Builds the operator for `node`, or `None` when the node is not ours.
    fn to_operator(
        &self,
        ctx: &DriverCtx,
        operator_id: i32,
        node: &Arc<PlanNode>,
    ) -> Option<Result<Box<dyn Operator>, String>>;

    /// Driver cap for `node`, or `None` when the translator imposes none.
    fn max_drivers(&self, node: &Arc<PlanNode>) -> Option<u32> {
        let _ = node;
        None
    }
}

fn registry() -> &'static RwLock<Vec<Arc<dyn PlanNodeTranslator>>> {
    static REGISTRY: OnceLock<RwLock<Vec<Arc<dyn PlanNodeTranslator>>>> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(Vec::new()))
}

pub fn register_translator(translator: Arc<dyn PlanNodeTranslator>) {
    registry()
        .write()
        .expect("translator registry lock")
        .push(translator);
}

/// Asks every registered translator for an operator for `node`.
pub fn translate_plan_node(
    ctx: &DriverCtx,
    operator_id: i32,
    node: &Arc<PlanNode>,
) -> Option<Result<Box<dyn Operator>, String>> {
    let translators = registry().read().expect("translator registry lock");
    for translator in translators.iter() {
        if let Some(result) = translator.to_operator(ctx, operator_id, node) {
            return Some(result);
        }
    }
    None
}

/// First registered driver cap declared for `node`, if any.
pub fn translator_max_drivers(node: &Arc<PlanNode>) -> Option<u32> {
    let translators = registry().read().expect("translator registry lock");
    translators.iter().find_map(|t| t.max_drivers(node))
}
