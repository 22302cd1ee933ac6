// Copyright (c) 2024-2025 Orientus Contributors.
// SPDX-License-Identifier: Apache-2.0
//
//! Fluent graph-traversal (MATCH) pattern compiler.
//!
//! The builder keeps an ordered list of rendered pattern fragments and at
//! most one "open" vertex step. `vertex` opens a step and `where_`/`when`
//! attach conditions to it; every other call first closes the open step by
//! rendering it as `{as: <alias>, class: <class>, ...}` and then appends
//! its own fragment. `done` performs a final close and joins everything
//! under a leading `MATCH` line.

use crate::record::Record;
use crate::schema::Clause;

#[derive(Debug, Default)]
struct VertexStep {
    alias: String,
    class: Option<String>,
    where_clause: Option<String>,
    while_clause: Option<String>,
}

impl VertexStep {
    fn render(&self) -> String {
        let mut body = format!("as: {}", self.alias);
        if let Some(class) = &self.class {
            body.push_str(&format!(", class: {class}"));
        }
        if let Some(where_clause) = &self.where_clause {
            body.push_str(&format!(", where: ({where_clause})"));
        }
        if let Some(while_clause) = &self.while_clause {
            body.push_str(&format!(", while: ({while_clause})"));
        }
        format!("{{{body}}}")
    }
}

/// Fluent MATCH pattern builder.
#[derive(Debug, Default)]
pub struct Match {
    fragments: Vec<String>,
    open_step: Option<VertexStep>,
}

impl Match {
    /// Empty pattern.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a vertex step for the class of `V` under the given alias.
    pub fn vertex<V: Record>(mut self, alias: &str) -> Self {
        self.open_step = Some(VertexStep {
            alias: alias.to_string(),
            class: Some(V::CLASS.to_string()),
            ..VertexStep::default()
        });
        self
    }

    /// Attach a filter to the currently open vertex step; no-op when no
    /// step is open.
    pub fn where_(mut self, clause: &Clause) -> Self {
        if let Some(step) = self.open_step.as_mut() {
            step.where_clause = Some(clause.to_string());
        }
        self
    }

    /// Attach a traversal loop condition (`while:`) to the currently open
    /// vertex step; no-op when no step is open.
    pub fn when(mut self, clause: &Clause) -> Self {
        if let Some(step) = self.open_step.as_mut() {
            step.while_clause = Some(clause.to_string());
        }
        self
    }

    /// Traverse outgoing edges of class `E`.
    pub fn out_edge<E: Record>(mut self) -> Self {
        self.close_step();
        self.fragments.push(format!(".out({})", E::CLASS));
        self
    }

    /// Traverse incoming edges of class `E`.
    pub fn in_edge<E: Record>(mut self) -> Self {
        self.close_step();
        self.fragments.push(format!(".in({})", E::CLASS));
        self
    }

    /// Traverse edges of class `E` in both directions.
    pub fn both_edge<E: Record>(mut self) -> Self {
        self.close_step();
        self.fragments.push(format!(".both({})", E::CLASS));
        self
    }

    /// Start a negated pattern: the following steps must not match.
    pub fn not(mut self) -> Self {
        self.close_step();
        self.fragments.push(", NOT".to_string());
        self
    }

    /// Return the given expression from the pattern.
    pub fn return_result(mut self, expression: &str) -> Self {
        self.close_step();
        self.fragments.push(format!("RETURN {expression}"));
        self
    }

    /// Return distinct values of the given expression.
    pub fn return_distinct(mut self, expression: &str) -> Self {
        self.close_step();
        self.fragments.push(format!("RETURN DISTINCT {expression}"));
        self
    }

    /// Group returned rows; empty expressions are ignored.
    pub fn group_by(mut self, expression: &str) -> Self {
        self.close_step();
        if !expression.is_empty() {
            self.fragments.push(format!("GROUP BY {expression}"));
        }
        self
    }

    /// Order returned rows; empty expressions are ignored.
    pub fn order_by(mut self, expression: &str) -> Self {
        self.close_step();
        if !expression.is_empty() {
            self.fragments.push(format!("ORDER BY {expression}"));
        }
        self
    }

    /// Skip the first `number` result rows.
    pub fn skip(mut self, number: usize) -> Self {
        self.close_step();
        self.fragments.push(format!("SKIP {number}"));
        self
    }

    /// Cap the result at `number` rows.
    pub fn limit(mut self, number: usize) -> Self {
        self.close_step();
        self.fragments.push(format!("LIMIT {number}"));
        self
    }

    /// Render the pattern.
    pub fn done(mut self) -> String {
        self.close_step();
        format!("MATCH\n{}", self.fragments.join("\n"))
    }

    fn close_step(&mut self) {
        if let Some(step) = self.open_step.take() {
            self.fragments.push(step.render());
        }
    }
}
