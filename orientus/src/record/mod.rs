// Copyright (c) 2024-2025 Orientus Contributors.
// SPDX-License-Identifier: Apache-2.0
//
//! Record model: identity, class naming, and lifecycle bookkeeping for
//! persisted entities.
//!
//! A record is either *new* (no identifier) or *persisted* (server-assigned
//! [`Rid`] plus optimistic-concurrency [`Version`]). Domain types implement
//! the [`Record`] trait with an explicit property-descriptor table; there is
//! no runtime reflection anywhere in the mapping layer.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::schema::PropertyDescriptor;

/// Server-assigned record identifier, e.g. `#12:0`.
///
/// Immutable once assigned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rid(String);

impl Rid {
    /// Wrap a raw identifier as received from the server.
    pub fn new(rid: impl Into<String>) -> Self {
        Self(rid.into())
    }

    /// Raw identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier has the `#<cluster>:<position>` shape with a
    /// non-negative cluster and position.
    pub fn is_well_formed(&self) -> bool {
        let Some(body) = self.0.strip_prefix('#') else {
            return false;
        };
        let Some((cluster, position)) = body.split_once(':') else {
            return false;
        };
        cluster.parse::<u64>().is_ok() && position.parse::<u64>().is_ok()
    }
}

impl fmt::Display for Rid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Optimistic-concurrency token returned by the server on writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(pub i32);

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of a persisted entity, dispatched by match rather than downcasting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// Plain record with no graph role
    Document,
    /// Graph node
    Vertex,
    /// Directed relation between two vertices
    Edge,
}

/// A field literal carried between typed records and statements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// SQL NULL
    Null,
    /// Boolean literal
    Bool(bool),
    /// Integer literal
    Int(i64),
    /// Floating-point literal
    Float(f64),
    /// Temporal literal, rendered as `'YYYY-MM-DD HH:MM:SS'`
    DateTime(DateTime<Utc>),
    /// String literal, quoted and escaped on rendering
    String(String),
}

impl Value {
    /// Render the value as a statement literal.
    ///
    /// Strings are single-quoted with embedded `'` escaped as `\'`; numeric
    /// and boolean values pass through unquoted.
    pub fn to_sql_literal(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::DateTime(dt) => format!("'{}'", dt.format("%Y-%m-%d %H:%M:%S")),
            Value::String(s) => format!("'{}'", s.replace('\'', "\\'")),
        }
    }

    /// Whether this is the NULL literal.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Value::DateTime(dt)
    }
}

/// Field map of a result row, keyed by externally-visible property name.
pub type FieldMap = BTreeMap<String, Value>;

#[derive(Debug, Default)]
struct StateInner {
    rid: Option<Rid>,
    version: Option<Version>,
    batch_variable: Option<String>,
}

/// Shared lifecycle bookkeeping of one record: identifier, version, and the
/// transient batch variable.
///
/// Cloning a `RecordState` shares the underlying state. An edge holds clones
/// of its endpoint vertices' states, which is how a non-owning endpoint
/// reference is expressed: the edge never copies endpoint fields, it only
/// observes the endpoints' identities at the moment its creation statement
/// is built.
#[derive(Debug, Clone, Default)]
pub struct RecordState {
    shared: Arc<Mutex<StateInner>>,
}

impl RecordState {
    /// Fresh state for an unpersisted record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Server-assigned identifier, if the record has been persisted.
    pub fn rid(&self) -> Option<Rid> {
        self.shared.lock().rid.clone()
    }

    /// Optimistic-concurrency token from the last server write.
    pub fn version(&self) -> Option<Version> {
        self.shared.lock().version
    }

    /// Whether the record has a server-assigned identifier.
    pub fn is_persisted(&self) -> bool {
        self.shared.lock().rid.is_some()
    }

    /// Record the server-assigned identity after a successful write.
    ///
    /// The identifier is immutable once assigned: a second call keeps the
    /// original rid and only refreshes the version.
    pub fn mark_persisted(&self, rid: Rid, version: Version) {
        let mut inner = self.shared.lock();
        if let Some(existing) = &inner.rid {
            if *existing != rid {
                log::warn!(
                    "ignoring rid change {} -> {} on persisted record",
                    existing,
                    rid
                );
            }
        } else {
            inner.rid = Some(rid);
        }
        inner.version = Some(version);
    }

    /// Script-local variable bound while a statement referencing this record
    /// is queued in an open batch.
    pub fn batch_variable(&self) -> Option<String> {
        self.shared.lock().batch_variable.clone()
    }

    pub(crate) fn bind_batch_variable(&self, name: String) {
        self.shared.lock().batch_variable = Some(name);
    }

    pub(crate) fn clear_batch_variable(&self) {
        self.shared.lock().batch_variable = None;
    }

    /// How a statement refers to this record: `$<variable>` while bound in an
    /// open batch, otherwise the persisted identifier.
    pub fn reference(&self) -> Option<String> {
        let inner = self.shared.lock();
        if let Some(variable) = &inner.batch_variable {
            return Some(format!("${variable}"));
        }
        inner.rid.as_ref().map(|rid| rid.as_str().to_string())
    }
}

/// A typed persisted entity.
///
/// Implementations declare their class name, graph kind, and an explicit
/// property-descriptor table; serialization iterates the declared fields
/// only, so bookkeeping state and edge endpoints never leak into statements.
pub trait Record {
    /// Class/element name on the server.
    const CLASS: &'static str;

    /// Graph role of this class.
    const KIND: RecordKind;

    /// Declared property descriptors, one per mapped field.
    fn descriptors() -> &'static [PropertyDescriptor];

    /// Lifecycle bookkeeping handle.
    fn state(&self) -> &RecordState;

    /// Declared field values in declaration order.
    fn fields(&self) -> Vec<(&'static str, Value)>;

    /// Apply one field by externally-visible name during materialization.
    ///
    /// Names with no matching field are ignored.
    fn set_field(&mut self, name: &str, value: Value);

    /// Endpoint states `(from, to)` for edges; `None` for any other kind.
    fn endpoints(&self) -> Option<(&RecordState, &RecordState)> {
        None
    }
}
