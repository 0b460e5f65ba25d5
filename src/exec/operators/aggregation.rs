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
//! Aggregation operators.
//!
//! Responsibilities:
//! - Hash aggregation groups arbitrary-order input in a key-encoded table.
//! - Streaming aggregation consumes input sorted on the group-by columns
//!   and flushes a group as soon as its key range ends.
//!
//! Key exported interfaces:
//! - Types: `HashAggregation`, `StreamingAggregation`.
//!
//! Current limitations:
//! - Function set is count/sum/min/max; sum accepts int64 and float64.
//!   In merge stages (final/intermediate) count sums the partial counts.

use arrow::array::{ArrayRef, RecordBatch};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use hashbrown::HashMap;
use std::sync::Arc;

use crate::exec::chunk::Chunk;
use crate::exec::node::aggregate::{AggFunc, AggregateSpec, AggregationStep};
use crate::exec::pipeline::operator::Operator;
use crate::exec::scalar::{
    build_array, compare_scalars, encode_row_key, scalar_at, ScalarValue,
};

/// Running state of one aggregate within one group.
struct Accumulator {
    func: AggFunc,
    count: i64,
    value: ScalarValue,
}

impl Accumulator {
    fn new(func: AggFunc) -> Self {
        Self {
            func,
            count: 0,
            value: ScalarValue::Null,
        }
    }

    fn update(&mut self, input: Option<&ScalarValue>) -> Result<(), String> {
        match self.func {
            AggFunc::Count => {
                match input {
                    // count(*) counts every row, count(col) skips nulls.
                    None => self.count += 1,
                    Some(v) if !v.is_null() => self.count += 1,
                    Some(_) => {}
                }
                Ok(())
            }
            AggFunc::Sum => {
                let Some(v) = input else {
                    return Err("sum requires an input column".to_string());
                };
                if v.is_null() {
                    return Ok(());
                }
                self.value = match (&self.value, v) {
                    (ScalarValue::Null, _) => v.clone(),
                    (ScalarValue::Int64(a), ScalarValue::Int64(b)) => ScalarValue::Int64(a + b),
                    (ScalarValue::Float64(a), ScalarValue::Float64(b)) => {
                        ScalarValue::Float64(a + b)
                    }
                    (a, b) => {
                        return Err(format!("sum over unsupported values: {a:?} + {b:?}"))
                    }
                };
                Ok(())
            }
            AggFunc::Min | AggFunc::Max => {
                let Some(v) = input else {
                    return Err("min/max require an input column".to_string());
                };
                if v.is_null() {
                    return Ok(());
                }
                if self.value.is_null() {
                    self.value = v.clone();
                    return Ok(());
                }
                let ordering = compare_scalars(v, &self.value)?;
                let replace = match self.func {
                    AggFunc::Min => ordering.is_lt(),
                    _ => ordering.is_gt(),
                };
                if replace {
                    self.value = v.clone();
                }
                Ok(())
            }
        }
    }

    fn output(&self) -> ScalarValue {
        match self.func {
            AggFunc::Count => ScalarValue::Int64(self.count),
            _ => self.value.clone(),
        }
    }
}

/// In merge stages a count over a partial-count column sums it. A bare
/// count-star keeps counting rows; it has no intermediate column to merge.
fn effective_func(spec: &AggregateSpec, step: AggregationStep) -> AggFunc {
    match (spec.func, step) {
        (AggFunc::Count, AggregationStep::Final | AggregationStep::Intermediate)
            if spec.input.is_some() =>
        {
            AggFunc::Sum
        }
        (func, _) => func,
    }
}

fn new_accumulators(aggregates: &[AggregateSpec], step: AggregationStep) -> Vec<Accumulator> {
    aggregates
        .iter()
        .map(|spec| Accumulator::new(effective_func(spec, step)))
        .collect()
}

fn validate_specs(aggregates: &[AggregateSpec], _step: AggregationStep) -> Result<(), String> {
    for spec in aggregates {
        if spec.func != AggFunc::Count && spec.input.is_none() {
            return Err(format!("aggregate {} requires an input column", spec.name));
        }
    }
    Ok(())
}

fn update_row(
    accumulators: &mut [Accumulator],
    aggregates: &[AggregateSpec],
    chunk: &Chunk,
    row: usize,
) -> Result<(), String> {
    for (accumulator, spec) in accumulators.iter_mut().zip(aggregates) {
        let input = match spec.input {
            Some(column) => Some(scalar_at(&chunk.column(column)?, row)?),
            None => None,
        };
        accumulator.update(input.as_ref())?;
    }
    Ok(())
}

fn agg_output_type(
    spec: &AggregateSpec,
    step: AggregationStep,
    input_schema: Option<&SchemaRef>,
) -> DataType {
    if effective_func(spec, step) == AggFunc::Count {
        return DataType::Int64;
    }
    match (spec.input, input_schema) {
        (Some(column), Some(schema)) if column < schema.fields().len() => {
            schema.field(column).data_type().clone()
        }
        // No input seen; the column is all-null anyway.
        _ => DataType::Int64,
    }
}

/// Builds the output chunk for finished groups: group-by columns first, one
/// column per aggregate after them.
fn build_output(
    input_schema: Option<&SchemaRef>,
    group_by: &[usize],
    aggregates: &[AggregateSpec],
    step: AggregationStep,
    entries: &[(Vec<ScalarValue>, Vec<Accumulator>)],
) -> Result<Chunk, String> {
    let mut fields = Vec::with_capacity(group_by.len() + aggregates.len());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(fields.capacity());

    for (position, &column) in group_by.iter().enumerate() {
        let schema = input_schema
            .ok_or_else(|| "grouped aggregation output requires an input schema".to_string())?;
        if column >= schema.fields().len() {
            return Err(format!("group-by column {column} out of range"));
        }
        let field = schema.field(column);
        let values: Vec<ScalarValue> =
            entries.iter().map(|(keys, _)| keys[position].clone()).collect();
        columns.push(build_array(&values, field.data_type())?);
        fields.push(Field::new(field.name(), field.data_type().clone(), true));
    }

    for (position, spec) in aggregates.iter().enumerate() {
        let data_type = agg_output_type(spec, step, input_schema);
        let values: Vec<ScalarValue> = entries
            .iter()
            .map(|(_, accumulators)| accumulators[position].output())
            .collect();
        columns.push(build_array(&values, &data_type)?);
        fields.push(Field::new(&spec.name, data_type, true));
    }

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema, columns)
        .map_err(|e| format!("aggregation output failed: {e}"))?;
    Ok(Chunk::new(batch))
}

/// Blocking grouped aggregation over a key-encoded hash table.
pub struct HashAggregation {
    operator_id: i32,
    step: AggregationStep,
    group_by: Vec<usize>,
    aggregates: Vec<AggregateSpec>,
    input_schema: Option<SchemaRef>,
    group_index: HashMap<Vec<u8>, usize>,
    entries: Vec<(Vec<ScalarValue>, Vec<Accumulator>)>,
    result: Option<Chunk>,
    finishing: bool,
}

impl HashAggregation {
    pub fn new(
        operator_id: i32,
        step: AggregationStep,
        group_by: Vec<usize>,
        aggregates: Vec<AggregateSpec>,
    ) -> Result<Self, String> {
        validate_specs(&aggregates, step)?;
        let mut entries = Vec::new();
        if group_by.is_empty() {
            // Global aggregation emits exactly one row, input or not.
            entries.push((Vec::new(), new_accumulators(&aggregates, step)));
        }
        Ok(Self {
            operator_id,
            step,
            group_by,
            aggregates,
            input_schema: None,
            group_index: HashMap::new(),
            entries,
            result: None,
            finishing: false,
        })
    }
}

impl Operator for HashAggregation {
    fn operator_id(&self) -> i32 {
        self.operator_id
    }

    fn name(&self) -> &str {
        "HashAggregation"
    }

    fn need_input(&self) -> bool {
        !self.finishing
    }

    fn push_chunk(&mut self, chunk: Chunk) -> Result<(), String> {
        if self.finishing {
            return Err("aggregation received input after finish".to_string());
        }
        if self.input_schema.is_none() {
            self.input_schema = Some(chunk.schema());
        }
        let mut buf = Vec::new();
        for row in 0..chunk.len() {
            let entry = if self.group_by.is_empty() {
                0
            } else {
                buf.clear();
                encode_row_key(&chunk, &self.group_by, row, &mut buf)?;
                if let Some(&index) = self.group_index.get(&buf) {
                    index
                } else {
                    let mut keys = Vec::with_capacity(self.group_by.len());
                    for &column in &self.group_by {
                        keys.push(scalar_at(&chunk.column(column)?, row)?);
                    }
                    let index = self.entries.len();
                    self.entries
                        .push((keys, new_accumulators(&self.aggregates, self.step)));
                    self.group_index.insert(buf.clone(), index);
                    index
                }
            };
            let (_, accumulators) = &mut self.entries[entry];
            update_row(accumulators, &self.aggregates, &chunk, row)?;
        }
        Ok(())
    }

    fn pull_chunk(&mut self) -> Result<Option<Chunk>, String> {
        Ok(self.result.take())
    }

    fn set_finishing(&mut self) -> Result<(), String> {
        if self.finishing {
            return Ok(());
        }
        self.finishing = true;
        if self.entries.is_empty() {
            return Ok(());
        }
        self.result = Some(build_output(
            self.input_schema.as_ref(),
            &self.group_by,
            &self.aggregates,
            self.step,
            &self.entries,
        )?);
        self.entries.clear();
        self.group_index.clear();
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.finishing && self.result.is_none()
    }
}

/// Aggregation over input sorted on the group-by columns; a group is
/// complete as soon as a row with a different key arrives.
pub struct StreamingAggregation {
    operator_id: i32,
    step: AggregationStep,
    group_by: Vec<usize>,
    aggregates: Vec<AggregateSpec>,
    input_schema: Option<SchemaRef>,
    current: Option<(Vec<u8>, Vec<ScalarValue>, Vec<Accumulator>)>,
    pending: Option<Chunk>,
    finishing: bool,
}

impl StreamingAggregation {
    pub fn new(
        operator_id: i32,
        step: AggregationStep,
        group_by: Vec<usize>,
        aggregates: Vec<AggregateSpec>,
    ) -> Result<Self, String> {
        validate_specs(&aggregates, step)?;
        let current = group_by
            .is_empty()
            .then(|| (Vec::new(), Vec::new(), new_accumulators(&aggregates, step)));
        Ok(Self {
            operator_id,
            step,
            group_by,
            aggregates,
            input_schema: None,
            current,
            pending: None,
            finishing: false,
        })
    }
}

impl Operator for StreamingAggregation {
    fn operator_id(&self) -> i32 {
        self.operator_id
    }

    fn name(&self) -> &str {
        "StreamingAggregation"
    }

    fn need_input(&self) -> bool {
        !self.finishing && self.pending.is_none()
    }

    fn push_chunk(&mut self, chunk: Chunk) -> Result<(), String> {
        if self.finishing {
            return Err("aggregation received input after finish".to_string());
        }
        if self.pending.is_some() {
            return Err("aggregation received input while output is pending".to_string());
        }
        if self.input_schema.is_none() {
            self.input_schema = Some(chunk.schema());
        }
        let mut completed = Vec::new();
        let mut buf = Vec::new();
        for row in 0..chunk.len() {
            if self.group_by.is_empty() {
                let (_, _, accumulators) = self.current.as_mut().expect("global group");
                update_row(accumulators, &self.aggregates, &chunk, row)?;
                continue;
            }
            buf.clear();
            encode_row_key(&chunk, &self.group_by, row, &mut buf)?;
            let start_new = match &self.current {
                Some((key, _, _)) => *key != buf,
                None => true,
            };
            if start_new {
                if let Some((_, keys, accumulators)) = self.current.take() {
                    completed.push((keys, accumulators));
                }
                let mut keys = Vec::with_capacity(self.group_by.len());
                for &column in &self.group_by {
                    keys.push(scalar_at(&chunk.column(column)?, row)?);
                }
                self.current = Some((
                    buf.clone(),
                    keys,
                    new_accumulators(&self.aggregates, self.step),
                ));
            }
            let (_, _, accumulators) = self.current.as_mut().expect("current group");
            update_row(accumulators, &self.aggregates, &chunk, row)?;
        }
        if !completed.is_empty() {
            self.pending = Some(build_output(
                self.input_schema.as_ref(),
                &self.group_by,
                &self.aggregates,
                self.step,
                &completed,
            )?);
        }
        Ok(())
    }

    fn pull_chunk(&mut self) -> Result<Option<Chunk>, String> {
        Ok(self.pending.take())
    }

    fn set_finishing(&mut self) -> Result<(), String> {
        if self.finishing {
            return Ok(());
        }
        self.finishing = true;
        if let Some((_, keys, accumulators)) = self.current.take() {
            let tail = vec![(keys, accumulators)];
            let chunk = build_output(
                self.input_schema.as_ref(),
                &self.group_by,
                &self.aggregates,
                self.step,
                &tail,
            )?;
            match self.pending.take() {
                Some(pending) => {
                    let schema = pending.schema();
                    self.pending = Some(Chunk::concat(&schema, &[pending, chunk])?);
                }
                None => self.pending = Some(chunk),
            }
        }
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.finishing && self.pending.is_none()
    }
}
