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
//! Process execution environment helpers.

use crate::common::config;

/// Degree of parallelism for pipeline execution.
///
/// `requested` wins when positive, then the config override, then the
/// machine's available parallelism.
pub fn calc_pipeline_dop(requested: u32) -> u32 {
    if requested > 0 {
        return requested;
    }
    let configured = config::config().runtime.pipeline_dop;
    if configured > 0 {
        return configured;
    }
    std::thread::available_parallelism()
        .map(|n| n.get() as u32)
        .unwrap_or(1)
}

/// Resolves a planner driver cap into a concrete driver count.
///
/// The planner reports `u32::MAX` for unconstrained pipelines; the clamp to
/// the process dop happens here, on the runtime side.
pub fn resolve_driver_count(max_drivers: u32) -> u32 {
    max_drivers.min(calc_pipeline_dop(0)).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requested_dop_wins() {
        assert_eq!(calc_pipeline_dop(3), 3);
    }

    #[test]
    fn resolve_caps_unbounded_pipelines() {
        let resolved = resolve_driver_count(u32::MAX);
        assert!(resolved >= 1);
        assert!(resolved <= calc_pipeline_dop(0));
        assert_eq!(resolve_driver_count(1), 1);
    }
}
