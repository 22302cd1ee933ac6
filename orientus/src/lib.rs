// Copyright (c) 2024-2025 Orientus Contributors.
// SPDX-License-Identifier: Apache-2.0
//
//! Orientus - a typed object-graph mapping client for OrientDB-compatible
//! databases
//!
//! This crate lets application code declare graph entities (vertices,
//! edges, plain records) as typed Rust values and persist/query them
//! against a remote graph database without hand-writing its SQL dialect
//! for common cases.
//!
//! # Quick Start
//!
//! A domain class is declared once: a property-descriptor table plus a
//! [`Record`] implementation mapping the declared names onto the struct
//! fields.
//!
//! ```no_run
//! use orientus::{
//!     Database, PropertyDescriptor, PropertyKind, Record, RecordKind, RecordState,
//!     ServerConfig, Value,
//! };
//!
//! static PERSON_PROPERTIES: [PropertyDescriptor; 1] =
//!     [PropertyDescriptor::new("name", PropertyKind::String).mandatory()];
//!
//! #[derive(Default)]
//! struct Person {
//!     state: RecordState,
//!     name: String,
//! }
//!
//! impl Record for Person {
//!     const CLASS: &'static str = "Person";
//!     const KIND: RecordKind = RecordKind::Vertex;
//!
//!     fn descriptors() -> &'static [PropertyDescriptor] {
//!         &PERSON_PROPERTIES
//!     }
//!
//!     fn state(&self) -> &RecordState {
//!         &self.state
//!     }
//!
//!     fn fields(&self) -> Vec<(&'static str, Value)> {
//!         vec![("name", Value::from(self.name.clone()))]
//!     }
//!
//!     fn set_field(&mut self, name: &str, value: Value) {
//!         if let ("name", Value::String(s)) = (name, value) {
//!             self.name = s;
//!         }
//!     }
//! }
//!
//! fn run(driver: impl orientus::Connector + 'static) -> orientus::Result<()> {
//!     let config = ServerConfig::new("localhost", 2424, "knowledge", "root", "admin");
//!     let db = Database::connect(config, driver)?;
//!
//!     // Immediate execution: the class schema is created lazily, the
//!     // server-assigned identity lands back on the record.
//!     let mut session = db.session()?;
//!     let person = Person { name: "John".into(), ..Person::default() };
//!     session.save(&person)?;
//!
//!     // Batched execution: one atomic script.
//!     let mut batch = db.batch()?;
//!     batch.begin()?;
//!     batch.save(&Person { name: "Marie".into(), ..Person::default() })?;
//!     batch.commit()?;
//!     batch.close()?;
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - **Typed records** - declare a class once with a property-descriptor
//!   table; serialization and materialization are static, no reflection
//! - **Schema synchronization** - classes, properties, and unique indices
//!   are created lazily from the declared descriptors
//! - **Batch scripts** - defer statements into one atomic
//!   `begin; ...; commit retry 10;` unit with cross-statement variable
//!   references
//! - **Query builders** - fluent MATCH traversal and SELECT compilers
//! - **Connection pooling** - bounded pool with blocking acquire
//!
//! # Module Organization
//!
//! - [`record`] - record model: identity, kinds, lifecycle bookkeeping
//! - [`schema`] - property descriptors, predicates, DDL synchronization
//! - [`serializer`] - fields to statement fragments and rows to records
//! - [`protocol`] - the narrow driver boundary
//! - [`pool`] - database handle and bounded connection pool
//! - [`session`] - immediate and batched execution
//! - [`query`] - MATCH and SELECT statement compilers
//! - [`error`] - error types and handling

pub mod error;
pub mod pool;
pub mod protocol;
pub mod query;
pub mod record;
pub mod schema;
pub mod serializer;
pub mod session;

// Re-export main types for convenience
pub use error::{Error, Result};
pub use pool::{Database, PoolOptions, PooledConnection};
pub use protocol::{Connection, Connector, ResultRow, ServerConfig};
pub use query::{LockStrategy, Match, Order, Select, TimeoutStrategy};
pub use record::{FieldMap, Record, RecordKind, RecordState, Rid, Value, Version};
pub use schema::{Clause, PropertyDescriptor, PropertyKind, SchemaSync};
pub use session::{BatchSession, Saved, Session};
