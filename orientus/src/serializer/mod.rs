// Copyright (c) 2024-2025 Orientus Contributors.
// SPDX-License-Identifier: Apache-2.0
//
//! Field serializer: declared record fields to statement fragments and
//! result rows back to typed records.
//!
//! Only declared fields ever reach a statement; lifecycle bookkeeping
//! (identifier, version, batch variable) and edge endpoint references are
//! not part of [`Record::fields`] and therefore cannot leak into output.

use crate::error::{Error, Result};
use crate::protocol::ResultRow;
use crate::record::{Record, Version};

/// How serialized fields are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Joiner {
    /// `, ` — SET clauses
    Set,
    /// ` AND ` — equality-based WHERE clauses
    Where,
}

impl Joiner {
    fn separator(self) -> &'static str {
        match self {
            Joiner::Set => ", ",
            Joiner::Where => " AND ",
        }
    }
}

/// Render every declared field as `name = literal`, joined per `joiner`.
///
/// Fails with [`Error::EmptyRecord`] when the record has zero declared
/// fields, which would otherwise produce a syntactically invalid statement.
pub fn serialize<R: Record>(record: &R, joiner: Joiner) -> Result<String> {
    let fields = record.fields();
    if fields.is_empty() {
        return Err(Error::EmptyRecord(R::CLASS.to_string()));
    }
    let rendered: Vec<String> = fields
        .iter()
        .map(|(name, value)| format!("{} = {}", name, value.to_sql_literal()))
        .collect();
    Ok(rendered.join(joiner.separator()))
}

/// Instantiate a typed record from a result row.
///
/// Copies the row's identifier and version onto the record state, then maps
/// each declared descriptor's externally-visible name back to the in-memory
/// field by name lookup. Row fields with no matching descriptor are silently
/// dropped.
pub fn materialize<R: Record + Default>(row: &ResultRow) -> R {
    let mut record = R::default();
    for descriptor in R::descriptors() {
        if let Some(value) = row.fields.get(descriptor.name()) {
            record.set_field(descriptor.name(), value.clone());
        }
    }
    if let Some(rid) = &row.rid {
        record
            .state()
            .mark_persisted(rid.clone(), row.version.unwrap_or(Version(0)));
    }
    record
}

/// Check every declared constraint against the record's current fields.
///
/// Runs client-side before a statement is emitted, so constraint violations
/// fail fast with [`Error::Validation`] instead of a server round trip.
pub fn validate<R: Record>(record: &R) -> Result<()> {
    let fields = record.fields();
    for descriptor in R::descriptors() {
        let value = fields
            .iter()
            .find(|(name, _)| *name == descriptor.name())
            .map(|(_, value)| value);
        descriptor.check(value).map_err(|reason| Error::Validation {
            class: R::CLASS.to_string(),
            field: descriptor.name().to_string(),
            reason,
        })?;
    }
    Ok(())
}

/// Field values of a record rendered as a result row, without identity.
///
/// Useful to feed a record's own fields back through [`materialize`], e.g.
/// when adopting the result of an equality lookup.
pub fn as_row<R: Record>(record: &R) -> ResultRow {
    let mut row = ResultRow::new();
    for (name, value) in record.fields() {
        row.fields.insert(name.to_string(), value);
    }
    row
}
