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
use std::sync::Arc;

use crate::connector::ConnectorInsertTableHandle;
use crate::exec::node::PlanNode;

/// Engine-level wrapper around the connector's insert handle.
#[derive(Clone, Debug)]
pub struct InsertTableHandle {
    connector_handle: Arc<dyn ConnectorInsertTableHandle>,
}

impl InsertTableHandle {
    pub fn new(connector_handle: Arc<dyn ConnectorInsertTableHandle>) -> Self {
        Self { connector_handle }
    }

    pub fn connector_insert_table_handle(&self) -> &Arc<dyn ConnectorInsertTableHandle> {
        &self.connector_handle
    }
}

/// Writes input rows through a connector and reports the written row count.
#[derive(Clone, Debug)]
pub struct TableWriteNode {
    pub input: Arc<PlanNode>,
    pub insert_table_handle: InsertTableHandle,
}

impl TableWriteNode {
    pub fn insert_table_handle(&self) -> &InsertTableHandle {
        &self.insert_table_handle
    }
}
