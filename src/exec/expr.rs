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
//! Row expressions over chunks.
//!
//! Responsibilities:
//! - Defines the owned expression tree carried by filter and project plan
//!   nodes.
//! - Evaluates expressions column-at-a-time with Arrow compute kernels.
//!
//! Key exported interfaces:
//! - Types: `Expr`, `CmpOp`, `ArithOp`.
//!
//! Current limitations:
//! - Covers column references, literals, comparisons, arithmetic, and
//!   boolean connectives; anything else belongs to the plan front-end.

use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanArray};
use arrow::compute::kernels::cmp::{eq, gt, gt_eq, lt, lt_eq, neq};
use arrow::compute::kernels::numeric::{add, div, mul, sub};
use arrow::compute::{and, not, or};

use crate::exec::chunk::Chunk;
use crate::exec::scalar::{build_repeated_array, ScalarValue};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// An owned expression tree evaluated against one chunk at a time.
#[derive(Clone, Debug)]
pub enum Expr {
    Column(usize),
    Literal(ScalarValue),
    Cmp {
        op: CmpOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Arith {
        op: ArithOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
}

impl Expr {
    pub fn col(index: usize) -> Expr {
        Expr::Column(index)
    }

    pub fn lit(value: ScalarValue) -> Expr {
        Expr::Literal(value)
    }

    pub fn cmp(op: CmpOp, left: Expr, right: Expr) -> Expr {
        Expr::Cmp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn arith(op: ArithOp, left: Expr, right: Expr) -> Expr {
        Expr::Arith {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Evaluates the expression over `chunk`, producing one value per row.
    pub fn eval(&self, chunk: &Chunk) -> Result<ArrayRef, String> {
        match self {
            Expr::Column(index) => chunk.column(*index),
            Expr::Literal(value) => {
                let data_type = value
                    .data_type()
                    .ok_or_else(|| "untyped null literal is not supported".to_string())?;
                build_repeated_array(value, &data_type, chunk.len())
            }
            Expr::Cmp { op, left, right } => {
                let l = left.eval(chunk)?;
                let r = right.eval(chunk)?;
                let result = match op {
                    CmpOp::Eq => eq(&l, &r),
                    CmpOp::NotEq => neq(&l, &r),
                    CmpOp::Lt => lt(&l, &r),
                    CmpOp::LtEq => lt_eq(&l, &r),
                    CmpOp::Gt => gt(&l, &r),
                    CmpOp::GtEq => gt_eq(&l, &r),
                }
                .map_err(|e| format!("comparison failed: {e}"))?;
                Ok(Arc::new(result) as ArrayRef)
            }
            Expr::Arith { op, left, right } => {
                let l = left.eval(chunk)?;
                let r = right.eval(chunk)?;
                match op {
                    ArithOp::Add => add(&l, &r),
                    ArithOp::Sub => sub(&l, &r),
                    ArithOp::Mul => mul(&l, &r),
                    ArithOp::Div => div(&l, &r),
                }
                .map_err(|e| format!("arithmetic failed: {e}"))
            }
            Expr::And(left, right) => {
                let l = eval_boolean(left, chunk)?;
                let r = eval_boolean(right, chunk)?;
                let result = and(&l, &r).map_err(|e| format!("and failed: {e}"))?;
                Ok(Arc::new(result) as ArrayRef)
            }
            Expr::Or(left, right) => {
                let l = eval_boolean(left, chunk)?;
                let r = eval_boolean(right, chunk)?;
                let result = or(&l, &r).map_err(|e| format!("or failed: {e}"))?;
                Ok(Arc::new(result) as ArrayRef)
            }
            Expr::Not(inner) => {
                let v = eval_boolean(inner, chunk)?;
                let result = not(&v).map_err(|e| format!("not failed: {e}"))?;
                Ok(Arc::new(result) as ArrayRef)
            }
        }
    }
}

/// Evaluates `expr` and requires a boolean result.
pub fn eval_boolean(expr: &Expr, chunk: &Chunk) -> Result<BooleanArray, String> {
    let array = expr.eval(chunk)?;
    array
        .as_any()
        .downcast_ref::<BooleanArray>()
        .cloned()
        .ok_or_else(|| {
            format!(
                "expression must produce a boolean array, got {}",
                array.data_type()
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Int64Array, RecordBatch};
    use arrow::datatypes::{DataType, Field, Schema};

    fn chunk(values: &[i64]) -> Chunk {
        let schema = Arc::new(Schema::new(vec![Field::new("v", DataType::Int64, false)]));
        let array = Arc::new(Int64Array::from(values.to_vec())) as ArrayRef;
        Chunk::new(RecordBatch::try_new(schema, vec![array]).expect("record batch"))
    }

    #[test]
    fn comparison_against_literal() {
        let c = chunk(&[1, 5, 3]);
        let expr = Expr::cmp(CmpOp::Gt, Expr::col(0), Expr::lit(ScalarValue::Int64(2)));
        let mask = eval_boolean(&expr, &c).expect("eval");
        let values: Vec<bool> = (0..mask.len()).map(|i| mask.value(i)).collect();
        assert_eq!(values, vec![false, true, true]);
    }

    #[test]
    fn arithmetic_projection() {
        let c = chunk(&[1, 2]);
        let expr = Expr::arith(ArithOp::Mul, Expr::col(0), Expr::lit(ScalarValue::Int64(10)));
        let out = expr.eval(&c).expect("eval");
        let out = out.as_any().downcast_ref::<Int64Array>().expect("int64");
        assert_eq!(out.values(), &[10, 20]);
    }

    #[test]
    fn non_boolean_predicate_is_an_error() {
        let c = chunk(&[1]);
        let err = eval_boolean(&Expr::col(0), &c).unwrap_err();
        assert!(err.contains("boolean"));
    }
}
