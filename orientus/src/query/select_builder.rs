// Copyright (c) 2024-2025 Orientus Contributors.
// SPDX-License-Identifier: Apache-2.0
//
//! Fluent SELECT statement compiler.
//!
//! Each builder call fills one clause slot; rendering always emits the
//! slots in the engine's fixed clause order
//! `SELECT FROM WHERE GROUP BY ORDER BY UNWIND SKIP LIMIT FETCHPLAN
//! TIMEOUT LOCK PARALLEL NOCACHE`, regardless of call order.

use std::fmt;

use crate::error::{Error, Result};
use crate::record::Record;
use crate::schema::{Clause, PropertyDescriptor};

/// Sort direction for ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        })
    }
}

/// What the engine does when a query exceeds its timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutStrategy {
    /// Return the rows gathered so far
    Return,
    /// Fail the query
    Exception,
}

impl fmt::Display for TimeoutStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TimeoutStrategy::Return => "RETURN",
            TimeoutStrategy::Exception => "EXCEPTION",
        })
    }
}

/// Locking strategy for the selected records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockStrategy {
    Record,
}

impl fmt::Display for LockStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LockStrategy::Record => "RECORD",
        })
    }
}

/// Fluent SELECT builder for one target class.
#[derive(Debug, Clone, Default)]
pub struct Select {
    projection: Option<String>,
    from: Option<String>,
    where_clause: Option<String>,
    group_by: Option<String>,
    order_by: Option<String>,
    unwind: Option<String>,
    skip: Option<usize>,
    limit: Option<usize>,
    fetch_plan: Option<String>,
    timeout: Option<String>,
    lock: Option<LockStrategy>,
    parallel: bool,
    nocache: bool,
}

impl Select {
    /// Select all fields from the class of `R`.
    pub fn from_class<R: Record>() -> Self {
        Self {
            from: Some(R::CLASS.to_string()),
            ..Self::default()
        }
    }

    /// Project only the given properties.
    pub fn fields(mut self, fields: &[&PropertyDescriptor]) -> Self {
        self.projection = Some(join_names(fields));
        self
    }

    /// Filter rows by a clause tree.
    pub fn where_(mut self, clause: &Clause) -> Self {
        self.where_clause = Some(clause.to_string());
        self
    }

    /// Filter rows by an already-rendered predicate.
    pub fn where_raw(mut self, predicate: impl Into<String>) -> Self {
        self.where_clause = Some(predicate.into());
        self
    }

    /// Start a WHERE clause on one property, to be completed by
    /// [`like`](Self::like).
    pub fn where_property(mut self, property: &PropertyDescriptor) -> Self {
        self.where_clause = Some(property.name().to_string());
        self
    }

    /// Append `LIKE '<pattern>'` to the WHERE slot.
    pub fn like(mut self, pattern: &str) -> Self {
        self.where_clause = Some(match self.where_clause {
            Some(current) => format!("{current} LIKE '{pattern}'"),
            None => format!("LIKE '{pattern}'"),
        });
        self
    }

    /// Group rows by the given properties.
    pub fn group_by(mut self, fields: &[&PropertyDescriptor]) -> Self {
        self.group_by = Some(join_names(fields));
        self
    }

    /// Order rows by the given properties.
    pub fn order_by(mut self, fields: &[&PropertyDescriptor], order: Order) -> Self {
        self.order_by = Some(format!("{} {}", join_names(fields), order));
        self
    }

    /// Unwind collection-valued properties into one row per element.
    pub fn unwind(mut self, fields: &[&PropertyDescriptor]) -> Self {
        self.unwind = Some(join_names(fields));
        self
    }

    /// Skip the first `number` rows.
    pub fn skip(mut self, number: usize) -> Self {
        self.skip = Some(number);
        self
    }

    /// Cap the result at `number` rows.
    pub fn limit(mut self, number: usize) -> Self {
        self.limit = Some(number);
        self
    }

    /// Attach a fetch plan, e.g. `*:-1`.
    pub fn fetch_plan(mut self, plan: impl Into<String>) -> Self {
        self.fetch_plan = Some(plan.into());
        self
    }

    /// Bound query execution time.
    ///
    /// Fails with [`Error::InvalidArgument`] when `millis` is zero.
    pub fn timeout(mut self, millis: u64, strategy: TimeoutStrategy) -> Result<Self> {
        if millis == 0 {
            return Err(Error::InvalidArgument(
                "timeout must be a positive number of milliseconds".to_string(),
            ));
        }
        self.timeout = Some(format!("{millis} {strategy}"));
        Ok(self)
    }

    /// Lock selected records for the duration of the statement.
    pub fn lock(mut self, strategy: LockStrategy) -> Self {
        self.lock = Some(strategy);
        self
    }

    /// Let the engine parallelize the query.
    pub fn parallel(mut self) -> Self {
        self.parallel = true;
        self
    }

    /// Bypass the engine's result cache.
    pub fn nocache(mut self) -> Self {
        self.nocache = true;
        self
    }

    /// Render the statement, emitting populated slots in fixed clause
    /// order.
    pub fn done(&self) -> String {
        let mut parts = Vec::new();
        match &self.projection {
            Some(projection) => parts.push(format!("SELECT {projection}")),
            None => parts.push("SELECT".to_string()),
        }
        if let Some(from) = &self.from {
            parts.push(format!("FROM {from}"));
        }
        if let Some(where_clause) = &self.where_clause {
            parts.push(format!("WHERE {where_clause}"));
        }
        if let Some(group_by) = &self.group_by {
            parts.push(format!("GROUP BY {group_by}"));
        }
        if let Some(order_by) = &self.order_by {
            parts.push(format!("ORDER BY {order_by}"));
        }
        if let Some(unwind) = &self.unwind {
            parts.push(format!("UNWIND {unwind}"));
        }
        if let Some(skip) = self.skip {
            parts.push(format!("SKIP {skip}"));
        }
        if let Some(limit) = self.limit {
            parts.push(format!("LIMIT {limit}"));
        }
        if let Some(plan) = &self.fetch_plan {
            parts.push(format!("FETCHPLAN {plan}"));
        }
        if let Some(timeout) = &self.timeout {
            parts.push(format!("TIMEOUT {timeout}"));
        }
        if let Some(lock) = &self.lock {
            parts.push(format!("LOCK {lock}"));
        }
        if self.parallel {
            parts.push("PARALLEL".to_string());
        }
        if self.nocache {
            parts.push("NOCACHE".to_string());
        }
        parts.join("\n")
    }
}

fn join_names(fields: &[&PropertyDescriptor]) -> String {
    fields
        .iter()
        .map(|field| field.name().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
