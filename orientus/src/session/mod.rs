// Copyright (c) 2024-2025 Orientus Contributors.
// SPDX-License-Identifier: Apache-2.0
//
//! Sessions: scoped, exclusive use of one pooled connection.
//!
//! [`Session`] executes every statement immediately and copies returned
//! identities back onto records. [`BatchSession`] defers statements into one
//! atomic script instead; see [`batch`].

pub mod batch;

pub use batch::BatchSession;

use crate::error::{Error, Result};
use crate::pool::PooledConnection;
use crate::protocol::ResultRow;
use crate::record::{Record, RecordKind, Rid, Value, Version};
use crate::schema::SchemaSync;
use crate::serializer::{self, Joiner};

/// Outcome of [`Session::save_if_not_exists`]: an explicit two-branch
/// contract instead of duplicate-key control flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Saved {
    /// No matching record existed; the record was inserted.
    Inserted,
    /// A record with equal field values already existed; its identity was
    /// adopted onto the in-memory record and no insert was issued.
    Existing(Rid),
}

/// Session with immediate execution semantics.
///
/// Holds one pooled connection for its whole lifetime; dropping the session
/// releases the connection on every exit path.
pub struct Session<'db> {
    connection: PooledConnection<'db>,
    schema: SchemaSync,
}

impl<'db> Session<'db> {
    pub(crate) fn new(connection: PooledConnection<'db>) -> Self {
        Self {
            connection,
            schema: SchemaSync::new(),
        }
    }

    /// Execute one statement and return the raw rows.
    ///
    /// Statement failures propagate as [`Error::Command`]; they are never
    /// converted into an empty result set, so an empty `Vec` always means
    /// the statement succeeded with no rows.
    pub fn query_raw(&mut self, statement: &str) -> Result<Vec<ResultRow>> {
        log::debug!("query: {statement}");
        self.connection.as_mut().execute(statement)
    }

    /// Execute a selection statement and materialize each row as `R`.
    ///
    /// When `limit` is given and the statement carries no LIMIT clause of
    /// its own, ` LIMIT <n>` is appended.
    pub fn query<R: Record + Default>(
        &mut self,
        statement: &str,
        limit: Option<usize>,
    ) -> Result<Vec<R>> {
        let statement = apply_limit(statement, limit);
        let rows = self.query_raw(&statement)?;
        log::debug!("query returned {} row(s)", rows.len());
        Ok(rows.iter().map(serializer::materialize).collect())
    }

    /// Load one record by identifier, or `None` when the identifier does
    /// not resolve.
    pub fn fetch<R: Record + Default>(&mut self, rid: &Rid) -> Result<Option<R>> {
        let statement = format!("SELECT FROM {} WHERE @rid = '{}'", R::CLASS, rid);
        let rows = self.query_raw(&statement)?;
        Ok(rows.first().map(serializer::materialize))
    }

    /// Persist a new record.
    ///
    /// Lazily synchronizes the record's class schema, validates declared
    /// constraints, then emits `CREATE EDGE` for edges (resolving both
    /// endpoint references at this moment) or `INSERT INTO` otherwise. On
    /// success the server-assigned identifier and version are copied onto
    /// the record.
    pub fn save<R: Record>(&mut self, record: &R) -> Result<()> {
        self.schema.ensure_class::<R>(self.connection.as_mut())?;
        serializer::validate(record)?;
        let statement = match R::KIND {
            RecordKind::Edge => create_edge_statement(record)?,
            _ => insert_statement(record)?,
        };
        let rows = self.query_raw(&statement)?;
        adopt_identity(record, &rows);
        Ok(())
    }

    /// Insert the record unless a record with equal field values already
    /// exists.
    ///
    /// Looks up by field equality first (no insert is issued for an
    /// existing record) and inserts otherwise. This is not a race-free
    /// primitive: a concurrent insert between lookup and insert surfaces as
    /// [`Error::DuplicateKey`] and is deliberately not swallowed.
    pub fn save_if_not_exists<R: Record + Default>(&mut self, record: &R) -> Result<Saved> {
        self.schema.ensure_class::<R>(self.connection.as_mut())?;
        serializer::validate(record)?;
        let filter = serializer::serialize(record, Joiner::Where)?;
        let statement = format!("SELECT FROM {} WHERE {}", R::CLASS, filter);
        let rows = self.query_raw(&statement)?;
        if let Some(row) = rows.first() {
            adopt_identity(record, std::slice::from_ref(row));
            let rid = row
                .rid
                .clone()
                .ok_or_else(|| Error::Command("matching row carries no @rid".to_string()))?;
            return Ok(Saved::Existing(rid));
        }
        self.save(record)?;
        Ok(Saved::Inserted)
    }

    /// Engine-side upsert keyed by field equality:
    /// `UPDATE <class> SET ... UPSERT WHERE ...`.
    pub fn upsert<R: Record>(&mut self, record: &R) -> Result<()> {
        self.schema.ensure_class::<R>(self.connection.as_mut())?;
        serializer::validate(record)?;
        let statement = upsert_statement(record)?;
        let rows = self.query_raw(&statement)?;
        adopt_identity(record, &rows);
        Ok(())
    }

    /// Write the record's current fields back to its persisted identity.
    pub fn update<R: Record>(&mut self, record: &R) -> Result<()> {
        serializer::validate(record)?;
        let rid = require_rid(record)?;
        let statement = update_statement(record, rid.as_str())?;
        self.query_raw(&statement)?;
        Ok(())
    }

    /// Update selected fields of a record addressed by identifier, without
    /// a typed record in hand.
    pub fn update_by_rid(
        &mut self,
        class: &str,
        rid: &Rid,
        assignments: &[(&str, Value)],
    ) -> Result<()> {
        if assignments.is_empty() {
            return Err(Error::EmptyRecord(class.to_string()));
        }
        let set_clause: Vec<String> = assignments
            .iter()
            .map(|(name, value)| format!("{} = {}", name, value.to_sql_literal()))
            .collect();
        let statement = format!(
            "UPDATE {} SET {} WHERE @rid = {}",
            class,
            set_clause.join(", "),
            rid_literal(rid.as_str())
        );
        self.query_raw(&statement)?;
        Ok(())
    }

    /// Delete the record server-side, choosing the statement by kind.
    pub fn delete<R: Record>(&mut self, record: &R) -> Result<()> {
        let rid = require_rid(record)?;
        let statement = delete_statement::<R>(rid.as_str());
        self.query_raw(&statement)?;
        Ok(())
    }
}

fn require_rid<R: Record>(record: &R) -> Result<Rid> {
    record.state().rid().ok_or_else(|| {
        Error::InvalidArgument(format!("record of class '{}' is not persisted", R::CLASS))
    })
}

pub(crate) fn adopt_identity<R: Record>(record: &R, rows: &[ResultRow]) {
    if let Some(row) = rows.first() {
        if let Some(rid) = &row.rid {
            record
                .state()
                .mark_persisted(rid.clone(), row.version.unwrap_or(Version(0)));
        }
    }
}

pub(crate) fn insert_statement<R: Record>(record: &R) -> Result<String> {
    Ok(format!(
        "INSERT INTO {} SET {}",
        R::CLASS,
        serializer::serialize(record, Joiner::Set)?
    ))
}

/// Build the edge-creation statement, resolving both endpoint references
/// (identifier or batch variable) at this moment. An edge without fields is
/// valid, so [`Error::EmptyRecord`] from the serializer elides the SET
/// clause instead of failing.
pub(crate) fn create_edge_statement<R: Record>(record: &R) -> Result<String> {
    let (from, to) = record.endpoints().ok_or_else(|| {
        Error::InvalidArgument(format!("record of class '{}' is not an edge", R::CLASS))
    })?;
    let from_reference = from.reference().ok_or_else(|| endpoint_error::<R>("from"))?;
    let to_reference = to.reference().ok_or_else(|| endpoint_error::<R>("to"))?;

    let mut statement = format!(
        "CREATE EDGE {} FROM {} TO {}",
        R::CLASS,
        from_reference,
        to_reference
    );
    match serializer::serialize(record, Joiner::Set) {
        Ok(set_clause) => statement.push_str(&format!(" SET {set_clause}")),
        Err(Error::EmptyRecord(_)) => {}
        Err(e) => return Err(e),
    }
    Ok(statement)
}

fn endpoint_error<R: Record>(which: &str) -> Error {
    Error::InvalidArgument(format!(
        "edge '{}': {} endpoint is neither persisted nor queued in a batch",
        R::CLASS,
        which
    ))
}

pub(crate) fn update_statement<R: Record>(record: &R, target: &str) -> Result<String> {
    Ok(format!(
        "UPDATE {} SET {} WHERE @rid = {}",
        R::CLASS,
        serializer::serialize(record, Joiner::Set)?,
        rid_literal(target)
    ))
}

pub(crate) fn upsert_statement<R: Record>(record: &R) -> Result<String> {
    Ok(format!(
        "UPDATE {} SET {} UPSERT WHERE {}",
        R::CLASS,
        serializer::serialize(record, Joiner::Set)?,
        serializer::serialize(record, Joiner::Where)?
    ))
}

pub(crate) fn delete_statement<R: Record>(target: &str) -> String {
    match R::KIND {
        RecordKind::Vertex => format!("DELETE VERTEX {target}"),
        RecordKind::Edge => format!("DELETE EDGE {target}"),
        RecordKind::Document => {
            format!("DELETE FROM {} WHERE @rid = {}", R::CLASS, target)
        }
    }
}

/// Quote identifier targets; batch variables pass through so the engine can
/// substitute them.
fn rid_literal(target: &str) -> String {
    if target.starts_with('$') {
        target.to_string()
    } else {
        format!("'{target}'")
    }
}

fn apply_limit(statement: &str, limit: Option<usize>) -> String {
    match limit {
        Some(n) if !statement.to_uppercase().contains(" LIMIT ") => {
            format!("{statement} LIMIT {n}")
        }
        _ => statement.to_string(),
    }
}
