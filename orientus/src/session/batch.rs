// Copyright (c) 2024-2025 Orientus Contributors.
// SPDX-License-Identifier: Apache-2.0
//
//! Batch assembler: deferred statements, variable binding, and atomic
//! script finalization.
//!
//! Statements queued between [`BatchSession::begin`] and
//! [`BatchSession::commit`] execute as one `begin; ...; commit retry 10;`
//! script on one connection. The first statement a record participates in
//! binds it to a script-local variable; later statements in the same batch
//! reference the record as `$<variable>`, letting the engine substitute the
//! not-yet-committed identifier.

use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::pool::PooledConnection;
use crate::protocol::ResultRow;
use crate::record::{Record, RecordKind, RecordState};
use crate::schema::sync::class_statements;
use crate::serializer;

use super::{
    apply_limit, create_edge_statement, insert_statement, update_statement, upsert_statement,
};

struct BatchEntry {
    variable: String,
    statement: String,
}

/// Ordered statement queue of one open batch.
#[derive(Default)]
struct BatchScript {
    open: bool,
    counter: usize,
    entries: Vec<BatchEntry>,
    participants: Vec<RecordState>,
}

impl BatchScript {
    /// Queue a statement owned by `state`. The first participation binds the
    /// record to `<class><ordinal>`; a record never receives a second
    /// binding, so later statements get an anonymous `qry<ordinal>` slot.
    fn push_record(&mut self, statement: String, state: &RecordState, class: &str) {
        self.counter += 1;
        if state.batch_variable().is_none() {
            let variable = format!("{class}{}", self.counter);
            state.bind_batch_variable(variable.clone());
            self.participants.push(state.clone());
            self.entries.push(BatchEntry {
                variable,
                statement,
            });
        } else {
            self.entries.push(BatchEntry {
                variable: format!("qry{}", self.counter),
                statement,
            });
        }
    }

    fn push_query(&mut self, statement: String) {
        self.counter += 1;
        self.entries.push(BatchEntry {
            variable: format!("qry{}", self.counter),
            statement,
        });
    }

    fn finalize(&self) -> String {
        let mut lines = vec!["begin;".to_string()];
        for entry in &self.entries {
            lines.push(format!("let {} = {};", entry.variable, entry.statement));
        }
        lines.push("commit retry 10;".to_string());
        lines.join("\n")
    }

    /// Reset the queue and unbind every participating record, regardless of
    /// how the batch ended.
    fn clear(&mut self) {
        for state in self.participants.drain(..) {
            state.clear_batch_variable();
        }
        self.entries.clear();
        self.counter = 0;
        self.open = false;
    }
}

/// Session that defers statements into one atomic batch script.
///
/// State machine: Closed → Open (`begin`) → Closed (`commit`). Every
/// statement-producing operation fails with [`Error::BatchNotOpen`] while
/// closed; [`close`](Self::close) fails with [`Error::BatchNotClosed`] when
/// a batch is abandoned while open.
pub struct BatchSession<'db> {
    connection: PooledConnection<'db>,
    script: BatchScript,
    ensured_classes: HashSet<String>,
    pending_classes: Vec<(String, Vec<String>)>,
}

impl<'db> BatchSession<'db> {
    pub(crate) fn new(connection: PooledConnection<'db>) -> Self {
        Self {
            connection,
            script: BatchScript::default(),
            ensured_classes: HashSet::new(),
            pending_classes: Vec::new(),
        }
    }

    /// Open a batch. Fails when one is already open.
    pub fn begin(&mut self) -> Result<()> {
        if self.script.open {
            return Err(Error::InvalidArgument("batch is already open".to_string()));
        }
        self.script.open = true;
        Ok(())
    }

    /// Whether a batch is currently open.
    pub fn is_open(&self) -> bool {
        self.script.open
    }

    /// Queue a creation statement for the record and bind it to a batch
    /// variable.
    ///
    /// Edge endpoints resolve to `$<variable>` when the endpoint was queued
    /// earlier in this batch, or to its identifier when already persisted.
    pub fn save<R: Record>(&mut self, record: &R) -> Result<()> {
        self.check_open()?;
        serializer::validate(record)?;
        self.defer_class::<R>();
        let statement = match R::KIND {
            RecordKind::Edge => create_edge_statement(record)?,
            _ => insert_statement(record)?,
        };
        self.script.push_record(statement, record.state(), R::CLASS);
        Ok(())
    }

    /// Queue an engine-side upsert keyed by field equality.
    pub fn upsert<R: Record>(&mut self, record: &R) -> Result<()> {
        self.check_open()?;
        serializer::validate(record)?;
        self.defer_class::<R>();
        let statement = upsert_statement(record)?;
        self.script.push_record(statement, record.state(), R::CLASS);
        Ok(())
    }

    /// Queue an update addressing the record by identifier or, for a record
    /// queued earlier in this batch, by its batch variable.
    pub fn update<R: Record>(&mut self, record: &R) -> Result<()> {
        self.check_open()?;
        serializer::validate(record)?;
        let target = self.require_reference(record)?;
        let statement = update_statement(record, &target)?;
        self.script.push_record(statement, record.state(), R::CLASS);
        Ok(())
    }

    /// Queue a deletion, choosing the statement by record kind.
    pub fn delete<R: Record>(&mut self, record: &R) -> Result<()> {
        self.check_open()?;
        let target = self.require_reference(record)?;
        self.script.push_query(super::delete_statement::<R>(&target));
        Ok(())
    }

    /// Queue a read statement; its rows become part of the script result.
    pub fn query(&mut self, statement: &str, limit: Option<usize>) -> Result<()> {
        self.check_open()?;
        self.script.push_query(apply_limit(statement, limit));
        Ok(())
    }

    /// Finalize the queued statements and execute them as one atomic unit.
    ///
    /// Deferred class DDL (de-duplicated by class name across all queued
    /// records) runs first on the same connection, since DDL is not
    /// transactional in the engine. Statement failures inside the script
    /// surface as one [`Error::Command`] for the whole script; nothing is
    /// partially committed. Batch variables of all participating records
    /// are cleared regardless of outcome.
    pub fn commit(&mut self) -> Result<Vec<ResultRow>> {
        self.check_open()?;
        let script_text = self.script.finalize();
        let result = match self.run_deferred_ddl() {
            Ok(()) => {
                log::debug!("batch script:\n{script_text}");
                self.connection.as_mut().execute_script(&script_text)
            }
            Err(e) => Err(e),
        };
        self.script.clear();
        result
    }

    /// Close the session, failing when a batch was left open.
    ///
    /// An abandoned batch discards its queued statements; the error carries
    /// how many were dropped.
    pub fn close(mut self) -> Result<()> {
        if self.script.open {
            let queued = self.script.entries.len();
            self.script.clear();
            return Err(Error::BatchNotClosed(queued));
        }
        Ok(())
    }

    fn check_open(&self) -> Result<()> {
        if self.script.open {
            Ok(())
        } else {
            Err(Error::BatchNotOpen)
        }
    }

    fn require_reference<R: Record>(&self, record: &R) -> Result<String> {
        record.state().reference().ok_or_else(|| {
            Error::InvalidArgument(format!(
                "record of class '{}' is neither persisted nor queued in this batch",
                R::CLASS
            ))
        })
    }

    fn defer_class<R: Record>(&mut self) {
        if self.ensured_classes.contains(R::CLASS)
            || self.pending_classes.iter().any(|(class, _)| class == R::CLASS)
        {
            return;
        }
        self.pending_classes
            .push((R::CLASS.to_string(), class_statements::<R>()));
    }

    fn run_deferred_ddl(&mut self) -> Result<()> {
        for (_, statements) in &self.pending_classes {
            for statement in statements {
                log::debug!("schema: {statement}");
                self.connection.as_mut().execute(statement)?;
            }
        }
        for (class, _) in self.pending_classes.drain(..) {
            self.ensured_classes.insert(class);
        }
        Ok(())
    }
}

impl Drop for BatchSession<'_> {
    fn drop(&mut self) {
        if self.script.open {
            log::error!(
                "batch session dropped with an open batch; {} queued statement(s) discarded",
                self.script.entries.len()
            );
            self.script.clear();
        }
    }
}
