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
//! Fused filter/project operator.
//!
//! Responsibilities:
//! - Applies an optional row filter and an optional projection in one pass;
//!   adjacent filter and project plan nodes fuse into a single instance.
//!
//! Key exported interfaces:
//! - Types: `FilterProject`.

use std::sync::Arc;

use arrow::array::RecordBatch;
use arrow::compute::filter_record_batch;
use arrow::datatypes::{Field, Schema};

use crate::exec::chunk::Chunk;
use crate::exec::expr::{eval_boolean, Expr};
use crate::exec::pipeline::operator::Operator;

/// Projection half of a fused filter/project.
#[derive(Clone, Debug)]
pub struct Projection {
    pub exprs: Vec<Expr>,
    pub names: Vec<String>,
}

/// Single-pass filter and/or projection; at least one side is present.
pub struct FilterProject {
    operator_id: i32,
    filter: Option<Expr>,
    projection: Option<Projection>,
    pending: Option<Chunk>,
    finishing: bool,
}

impl FilterProject {
    pub fn new(
        operator_id: i32,
        filter: Option<Expr>,
        projection: Option<Projection>,
    ) -> Result<Self, String> {
        if filter.is_none() && projection.is_none() {
            return Err("filter project needs a filter or a projection".to_string());
        }
        if let Some(projection) = &projection {
            if projection.exprs.len() != projection.names.len() {
                return Err(format!(
                    "projection has {} exprs but {} names",
                    projection.exprs.len(),
                    projection.names.len()
                ));
            }
        }
        Ok(Self {
            operator_id,
            filter,
            projection,
            pending: None,
            finishing: false,
        })
    }

    fn process(&self, chunk: Chunk) -> Result<Chunk, String> {
        let filtered = match &self.filter {
            Some(predicate) => {
                let mask = eval_boolean(predicate, &chunk)?;
                let batch = filter_record_batch(chunk.batch(), &mask)
                    .map_err(|e| format!("filter failed: {e}"))?;
                Chunk::new(batch)
            }
            None => chunk,
        };
        let Some(projection) = &self.projection else {
            return Ok(filtered);
        };
        let mut columns = Vec::with_capacity(projection.exprs.len());
        let mut fields = Vec::with_capacity(projection.exprs.len());
        for (expr, name) in projection.exprs.iter().zip(&projection.names) {
            let array = expr.eval(&filtered)?;
            fields.push(Field::new(name, array.data_type().clone(), true));
            columns.push(array);
        }
        let schema = Arc::new(Schema::new(fields));
        let batch = RecordBatch::try_new(schema, columns)
            .map_err(|e| format!("projection failed: {e}"))?;
        Ok(Chunk::new(batch))
    }
}

impl Operator for FilterProject {
    fn operator_id(&self) -> i32 {
        self.operator_id
    }

    fn name(&self) -> &str {
        "FilterProject"
    }

    fn need_input(&self) -> bool {
        !self.finishing && self.pending.is_none()
    }

    fn push_chunk(&mut self, chunk: Chunk) -> Result<(), String> {
        if self.pending.is_some() {
            return Err("filter project received input while output is pending".to_string());
        }
        self.pending = Some(self.process(chunk)?);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::expr::CmpOp;
    use crate::exec::scalar::ScalarValue;
    use arrow::array::{ArrayRef, Int64Array};
    use arrow::datatypes::DataType;

    fn chunk(values: &[i64]) -> Chunk {
        let schema = Arc::new(Schema::new(vec![Field::new("v", DataType::Int64, false)]));
        let array = Arc::new(Int64Array::from(values.to_vec())) as ArrayRef;
        Chunk::new(RecordBatch::try_new(schema, vec![array]).expect("record batch"))
    }

    #[test]
    fn filters_and_projects_in_one_pass() {
        let filter = Expr::cmp(CmpOp::Gt, Expr::col(0), Expr::lit(ScalarValue::Int64(1)));
        let projection = Projection {
            exprs: vec![Expr::arith(
                crate::exec::expr::ArithOp::Add,
                Expr::col(0),
                Expr::lit(ScalarValue::Int64(100)),
            )],
            names: vec!["v_plus".to_string()],
        };
        let mut op = FilterProject::new(0, Some(filter), Some(projection)).expect("new");
        op.push_chunk(chunk(&[1, 2, 3])).expect("push");
        let out = op.pull_chunk().expect("pull").expect("chunk");
        let col = out.column(0).expect("column");
        let col = col.as_any().downcast_ref::<Int64Array>().expect("int64");
        assert_eq!(col.values(), &[102, 103]);
        assert_eq!(out.schema().field(0).name(), "v_plus");
    }

    #[test]
    fn filter_only_keeps_input_schema() {
        let filter = Expr::cmp(CmpOp::Lt, Expr::col(0), Expr::lit(ScalarValue::Int64(3)));
        let mut op = FilterProject::new(0, Some(filter), None).expect("new");
        let input = chunk(&[1, 5, 2]);
        let schema = input.schema();
        op.push_chunk(input).expect("push");
        let out = op.pull_chunk().expect("pull").expect("chunk");
        assert_eq!(out.len(), 2);
        assert_eq!(out.schema(), schema);
    }

    #[test]
    fn empty_operator_is_rejected() {
        assert!(FilterProject::new(0, None, None).is_err());
    }
}
