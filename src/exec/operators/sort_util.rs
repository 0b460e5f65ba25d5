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
//! Shared sort helpers for the sort-family operators.

use arrow::array::{RecordBatch, UInt32Array};
use arrow::compute::{lexsort_to_indices, take, SortColumn, SortOptions};

use crate::exec::chunk::Chunk;
use crate::exec::node::sort::SortKey;

/// Re-orders every column of `chunk` by `indices`.
pub(crate) fn take_chunk(chunk: &Chunk, indices: &UInt32Array) -> Result<Chunk, String> {
    let mut columns = Vec::with_capacity(chunk.num_columns());
    for column in chunk.columns() {
        let taken =
            take(column.as_ref(), indices, None).map_err(|e| format!("take failed: {e}"))?;
        columns.push(taken);
    }
    let batch = RecordBatch::try_new(chunk.schema(), columns)
        .map_err(|e| format!("take failed: {e}"))?;
    Ok(Chunk::new(batch))
}

/// Sorts `chunk` by `keys`, optionally bounded to the first `limit` rows.
pub(crate) fn sort_chunk(
    chunk: &Chunk,
    keys: &[SortKey],
    limit: Option<usize>,
) -> Result<Chunk, String> {
    if chunk.is_empty() || keys.is_empty() {
        return Ok(chunk.clone());
    }
    let mut columns = Vec::with_capacity(keys.len());
    for key in keys {
        columns.push(SortColumn {
            values: chunk.column(key.column)?,
            options: Some(SortOptions {
                descending: key.descending,
                nulls_first: key.nulls_first,
            }),
        });
    }
    let indices =
        lexsort_to_indices(&columns, limit).map_err(|e| format!("sort failed: {e}"))?;
    take_chunk(chunk, &indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{ArrayRef, Int64Array};
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;

    fn chunk(values: &[i64]) -> Chunk {
        let schema = Arc::new(Schema::new(vec![Field::new("v", DataType::Int64, false)]));
        let array = Arc::new(Int64Array::from(values.to_vec())) as ArrayRef;
        Chunk::new(RecordBatch::try_new(schema, vec![array]).expect("record batch"))
    }

    fn values_of(chunk: &Chunk) -> Vec<i64> {
        let col = chunk.column(0).expect("column");
        let col = col.as_any().downcast_ref::<Int64Array>().expect("int64");
        col.values().to_vec()
    }

    #[test]
    fn sorts_ascending_and_descending() {
        let c = chunk(&[3, 1, 2]);
        let asc = sort_chunk(&c, &[SortKey::asc(0)], None).expect("sort");
        assert_eq!(values_of(&asc), vec![1, 2, 3]);
        let desc = sort_chunk(&c, &[SortKey::desc(0)], None).expect("sort");
        assert_eq!(values_of(&desc), vec![3, 2, 1]);
    }

    #[test]
    fn limit_bounds_the_result() {
        let c = chunk(&[5, 1, 4, 2]);
        let top = sort_chunk(&c, &[SortKey::asc(0)], Some(2)).expect("sort");
        assert_eq!(values_of(&top), vec![1, 2]);
    }
}
