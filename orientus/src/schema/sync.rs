// Copyright (c) 2024-2025 Orientus Contributors.
// SPDX-License-Identifier: Apache-2.0
//
//! Reflection of declared property descriptors into server-side DDL.
//!
//! Classes are created lazily the first time a record of a class is seen by
//! a session. Statement order matters to the engine: class before
//! properties, properties before indices.

use std::collections::HashSet;

use crate::error::Result;
use crate::protocol::Connection;
use crate::record::{Record, RecordKind};

/// Tracks which classes have already been synchronized, at most once per
/// class per session lifetime.
#[derive(Debug, Default)]
pub struct SchemaSync {
    ensured: HashSet<String>,
}

impl SchemaSync {
    /// Empty synchronizer; no class is considered ensured yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the class has already been synchronized by this instance.
    pub fn is_ensured(&self, class: &str) -> bool {
        self.ensured.contains(class)
    }

    /// Idempotently create the class, its declared properties, and unique
    /// indices for `R`.
    ///
    /// A class is only marked ensured after every DDL statement succeeded,
    /// so a failed synchronization is retried on the next call.
    pub fn ensure_class<R: Record>(&mut self, connection: &mut dyn Connection) -> Result<()> {
        if self.is_ensured(R::CLASS) {
            return Ok(());
        }
        for statement in class_statements::<R>() {
            log::debug!("schema: {statement}");
            connection.execute(&statement)?;
        }
        self.ensured.insert(R::CLASS.to_string());
        Ok(())
    }
}

/// DDL statements for `R` in dependency order: `CREATE CLASS`, then one
/// `CREATE PROPERTY` per descriptor, then one `CREATE INDEX` per unique
/// descriptor.
pub fn class_statements<R: Record>() -> Vec<String> {
    let mut statements = vec![create_class_statement(R::CLASS, R::KIND)];
    for descriptor in R::descriptors() {
        let mut statement = format!(
            "CREATE PROPERTY {}.{} {}",
            R::CLASS,
            descriptor.name(),
            descriptor.kind()
        );
        if let Some(constraints) = descriptor.ddl_constraints() {
            statement.push_str(&format!(" ({constraints})"));
        }
        statements.push(statement);
    }
    for descriptor in R::descriptors().iter().filter(|d| d.is_unique()) {
        statements.push(format!(
            "CREATE INDEX {}.{} UNIQUE",
            R::CLASS,
            descriptor.name()
        ));
    }
    statements
}

fn create_class_statement(class: &str, kind: RecordKind) -> String {
    match kind {
        RecordKind::Vertex => format!("CREATE CLASS {class} IF NOT EXISTS EXTENDS V"),
        RecordKind::Edge => format!("CREATE CLASS {class} IF NOT EXISTS EXTENDS E"),
        RecordKind::Document => format!("CREATE CLASS {class} IF NOT EXISTS"),
    }
}
