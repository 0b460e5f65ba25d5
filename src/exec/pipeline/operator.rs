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
//! Operator execution contract.
//!
//! Responsibilities:
//! - Defines the cooperative push/pull interface drivers use to move chunks
//!   through a pipeline, with explicit blocking signals.
//! - Defines the deferred-construction thunks carried by driver factories.
//!
//! Key exported interfaces:
//! - Types: `Operator`, `BlockedReason`, `OperatorSupplier`, `Consumer`,
//!   `ConsumerSupplier`.

use std::sync::Arc;

use crate::exec::chunk::Chunk;
use crate::exec::pipeline::driver::DriverCtx;

/// Why an operator cannot make progress right now.
///
/// Drivers run operators cooperatively: when every operator of a pipeline
/// reports blocked, the driver yields its worker thread and is rescheduled
/// once the blocking condition clears.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BlockedReason {
    /// Upstream currently has no data available.
    InputEmpty,
    /// Downstream cannot accept more output at the moment.
    OutputFull,
    /// Waiting on a named cross-pipeline dependency (e.g. build side ready).
    Dependency(String),
}

/// One physical operator instance owned by a driver.
pub trait Operator: Send {
    /// Position of the operator within its driver, dense from zero.
    fn operator_id(&self) -> i32;

    fn name(&self) -> &str;

    fn need_input(&self) -> bool;

    fn push_chunk(&mut self, chunk: Chunk) -> Result<(), String>;

    fn pull_chunk(&mut self) -> Result<Option<Chunk>, String>;

    /// Signals that no more input will arrive.
    fn set_finishing(&mut self) -> Result<(), String>;

    fn is_finished(&self) -> bool;

    fn is_blocked(&self) -> Option<BlockedReason> {
        None
    }

    fn close(&mut self) -> Result<(), String> {
        Ok(())
    }
}

/// Deferred operator construction: `(operator_id, driver_ctx) -> operator`.
pub type OperatorSupplier =
    Arc<dyn Fn(i32, &DriverCtx) -> Result<Box<dyn Operator>, String> + Send + Sync>;

/// Receives the chunks of one driver's output stream; `None` marks its end.
pub type Consumer = Arc<dyn Fn(Option<Chunk>) -> Result<(), String> + Send + Sync>;

/// Produces one `Consumer` per output driver.
pub type ConsumerSupplier = Arc<dyn Fn() -> Consumer + Send + Sync>;
