// Copyright (c) 2024-2025 Orientus Contributors.
// SPDX-License-Identifier: Apache-2.0
//
//! Driver boundary: the narrow contract between the mapping layer and the
//! wire-protocol driver.
//!
//! The handshake, socket framing, and the REST transport alternative live
//! behind these traits. The mapping layer only ever asks a driver to execute
//! one statement (or one atomic script) and hand back rows exposing
//! identifier, version, and a field map.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::record::{FieldMap, Rid, Value, Version};

/// Connection parameters for one database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl ServerConfig {
    /// Config for a database on the given host and port.
    pub fn new(
        host: impl Into<String>,
        port: u16,
        database: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            database: database.into(),
            username: username.into(),
            password: password.into(),
        }
    }
}

/// One result row handed back by the driver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    /// Server-assigned identifier, absent for projection-only rows
    pub rid: Option<Rid>,
    /// Optimistic-concurrency token, absent for projection-only rows
    pub version: Option<Version>,
    /// Field values keyed by externally-visible property name
    pub fields: FieldMap,
}

impl ResultRow {
    /// Empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a row from the JSON document shape the server uses
    /// (`@rid`/`@version` metadata keys, remaining keys as fields).
    ///
    /// Nested arrays and objects have no field-literal representation and
    /// are dropped; `@`-prefixed metadata other than rid/version is ignored.
    pub fn from_json(document: &serde_json::Value) -> Result<Self> {
        let object = document
            .as_object()
            .ok_or_else(|| Error::InvalidArgument("result row must be a JSON object".into()))?;
        Self::decode_fields(object)
    }

    /// Like [`from_json`](Self::from_json), for drivers holding the raw
    /// JSON text of a row.
    pub fn from_json_str(document: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(document)?;
        Self::from_json(&value)
    }

    fn decode_fields(object: &serde_json::Map<String, serde_json::Value>) -> Result<Self> {
        let mut row = ResultRow::new();
        for (key, value) in object {
            match key.as_str() {
                "@rid" => {
                    if let Some(rid) = value.as_str() {
                        row.rid = Some(Rid::new(rid));
                    }
                }
                "@version" => {
                    if let Some(version) = value.as_i64() {
                        row.version = Some(Version(version as i32));
                    }
                }
                key if key.starts_with('@') => {}
                key => {
                    if let Some(value) = json_to_value(value) {
                        row.fields.insert(key.to_string(), value);
                    } else {
                        log::debug!("dropping non-scalar result field '{key}'");
                    }
                }
            }
        }
        Ok(row)
    }
}

fn json_to_value(value: &serde_json::Value) -> Option<Value> {
    match value {
        serde_json::Value::Null => Some(Value::Null),
        serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Value::Int(i))
            } else {
                n.as_f64().map(Value::Float)
            }
        }
        serde_json::Value::String(s) => Some(Value::String(s.clone())),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
    }
}

/// A live driver connection to one database.
///
/// Implementations fail with [`Error::Command`] when the server rejects a
/// statement and with [`Error::DuplicateKey`] when a uniqueness constraint
/// is violated.
pub trait Connection: Send {
    /// Execute one statement and return the resulting rows.
    fn execute(&mut self, statement: &str) -> Result<Vec<ResultRow>>;

    /// Execute a multi-statement script as one atomic unit.
    fn execute_script(&mut self, script: &str) -> Result<Vec<ResultRow>>;

    /// Close the underlying handle.
    fn close(&mut self) -> Result<()>;
}

/// Opens driver connections; fails with [`Error::Connection`].
pub trait Connector: Send + Sync {
    /// Open one connection to the configured database.
    fn open(&self, config: &ServerConfig) -> Result<Box<dyn Connection>>;
}
