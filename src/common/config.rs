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
//! Process-wide configuration.
//!
//! Responsibilities:
//! - Loads an optional `corvex.toml` (or `$CORVEX_CONFIG`) into a process
//!   singleton; falls back to built-in defaults when no file exists.
//! - Exposes the runtime tunables consumed by the pipeline layer.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

static CONFIG: OnceLock<CorvexConfig> = OnceLock::new();

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Clone, Deserialize)]
pub struct CorvexConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Optional full tracing EnvFilter expression.
    /// If set, this takes precedence over `log_level`.
    #[serde(default)]
    pub log_filter: Option<String>,

    #[serde(default)]
    pub runtime: RuntimeConfig,
}

#[derive(Clone, Default, Deserialize)]
pub struct RuntimeConfig {
    /// Degree of parallelism applied to unconstrained pipelines.
    /// 0 means "derive from the machine's available parallelism".
    #[serde(default)]
    pub pipeline_dop: u32,

    /// Upper bound on buffered rows per local exchange partition queue.
    /// 0 means unbounded.
    #[serde(default)]
    pub local_exchange_max_buffered_rows: usize,
}

impl Default for CorvexConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_filter: None,
            runtime: RuntimeConfig::default(),
        }
    }
}

impl CorvexConfig {
    fn load_from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let cfg: CorvexConfig = toml::from_str(&raw)
            .with_context(|| format!("parse config file {}", path.display()))?;
        Ok(cfg)
    }

    pub fn log_filter(&self) -> String {
        match &self.log_filter {
            Some(filter) if !filter.trim().is_empty() => filter.clone(),
            _ => self.log_level.clone(),
        }
    }
}

pub fn init_from_path(path: impl AsRef<Path>) -> Result<&'static CorvexConfig> {
    if let Some(cfg) = CONFIG.get() {
        return Ok(cfg);
    }
    let cfg = CorvexConfig::load_from_file(path.as_ref())?;
    let _ = CONFIG.set(cfg);
    Ok(CONFIG.get().expect("CONFIG set"))
}

/// Returns the process configuration, loading it on first use.
///
/// Lookup order: `$CORVEX_CONFIG`, then `./corvex.toml`, then defaults.
/// A missing file is not an error; a present-but-invalid file is surfaced
/// once and the defaults are kept for the rest of the process.
pub fn config() -> &'static CorvexConfig {
    CONFIG.get_or_init(|| {
        let path = match std::env::var("CORVEX_CONFIG") {
            Ok(p) if !p.trim().is_empty() => Some(PathBuf::from(p)),
            _ => {
                let p = PathBuf::from("corvex.toml");
                p.exists().then_some(p)
            }
        };
        match path {
            Some(p) => match CorvexConfig::load_from_file(&p) {
                Ok(cfg) => cfg,
                Err(e) => {
                    eprintln!("corvex: ignoring config {}: {e:#}", p.display());
                    CorvexConfig::default()
                }
            },
            None => CorvexConfig::default(),
        }
    })
}

pub fn local_exchange_max_buffered_rows() -> usize {
    config().runtime.local_exchange_max_buffered_rows
}
