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
//! Row hashing helpers shared by partitioning and join operators.

use std::hash::Hasher;

use arrow::array::UInt32Array;
use twox_hash::XxHash64;

use crate::exec::chunk::Chunk;
use crate::exec::operators::sort_util::take_chunk;
use crate::exec::scalar::encode_row_key;

const HASH_SEED: u64 = 0;

/// Hashes the key columns of every row.
pub(crate) fn hash_rows(chunk: &Chunk, columns: &[usize]) -> Result<Vec<u64>, String> {
    let mut hashes = Vec::with_capacity(chunk.len());
    let mut buf = Vec::new();
    for row in 0..chunk.len() {
        buf.clear();
        encode_row_key(chunk, columns, row, &mut buf)?;
        let mut hasher = XxHash64::with_seed(HASH_SEED);
        hasher.write(&buf);
        hashes.push(hasher.finish());
    }
    Ok(hashes)
}

/// Row indices per partition, assigning each row by key hash.
pub(crate) fn partition_indices(
    chunk: &Chunk,
    columns: &[usize],
    partitions: usize,
) -> Result<Vec<Vec<u32>>, String> {
    if partitions == 0 {
        return Err("partition count must be positive".to_string());
    }
    let hashes = hash_rows(chunk, columns)?;
    let mut indices = vec![Vec::new(); partitions];
    for (row, hash) in hashes.iter().enumerate() {
        indices[(hash % partitions as u64) as usize].push(row as u32);
    }
    Ok(indices)
}

/// Materializes the given rows of `chunk` as a new chunk.
pub(crate) fn take_rows(chunk: &Chunk, rows: &[u32]) -> Result<Chunk, String> {
    let indices = UInt32Array::from(rows.to_vec());
    take_chunk(chunk, &indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{ArrayRef, Int64Array, RecordBatch};
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;

    fn chunk(values: &[i64]) -> Chunk {
        let schema = Arc::new(Schema::new(vec![Field::new("k", DataType::Int64, false)]));
        let array = Arc::new(Int64Array::from(values.to_vec())) as ArrayRef;
        Chunk::new(RecordBatch::try_new(schema, vec![array]).expect("record batch"))
    }

    #[test]
    fn equal_keys_hash_equal() {
        let hashes = hash_rows(&chunk(&[1, 2, 1]), &[0]).expect("hash");
        assert_eq!(hashes[0], hashes[2]);
        assert_ne!(hashes[0], hashes[1]);
    }

    #[test]
    fn partitioning_covers_every_row() {
        let c = chunk(&[1, 2, 3, 1, 2]);
        let parts = partition_indices(&c, &[0], 3).expect("partition");
        let total: usize = parts.iter().map(Vec::len).sum();
        assert_eq!(total, c.len());
        // Same key, same partition.
        let find = |row: u32| parts.iter().position(|p| p.contains(&row)).unwrap();
        assert_eq!(find(0), find(3));
        assert_eq!(find(1), find(4));
    }
}
