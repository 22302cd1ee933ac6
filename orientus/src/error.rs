// Copyright (c) 2024-2025 Orientus Contributors.
// SPDX-License-Identifier: Apache-2.0
//
//! Error types for the Orientus client

use std::time::Duration;

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Orientus operations
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open or maintain a connection to the server
    #[error("connection error: {0}")]
    Connection(String),

    /// The server rejected a statement
    #[error("command rejected: {0}")]
    Command(String),

    /// A uniqueness constraint was violated on the server
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// A record with zero serializable fields cannot produce a statement
    #[error("record of class '{0}' has no serializable fields")]
    EmptyRecord(String),

    /// A statement-producing batch operation was called outside begin/commit
    #[error("batch is not open")]
    BatchNotOpen,

    /// A batch session was closed while a batch was still open
    #[error("batch left open with {0} queued statement(s)")]
    BatchNotClosed(usize),

    /// A caller-supplied argument is invalid
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A declared property constraint failed client-side validation
    #[error("validation failed for {class}.{field}: {reason}")]
    Validation {
        /// Class whose property failed validation
        class: String,
        /// Property name
        field: String,
        /// Constraint that was violated
        reason: String,
    },

    /// No pooled connection became available within the acquire timeout
    #[error("no connection available within {0:?}")]
    PoolTimeout(Duration),

    /// Serialization/deserialization errors at the driver boundary
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
