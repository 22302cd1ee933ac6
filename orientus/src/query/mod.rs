// Copyright (c) 2024-2025 Orientus Contributors.
// SPDX-License-Identifier: Apache-2.0
//
//! Declarative statement compilers: graph traversal (MATCH) and row
//! selection (SELECT).
//!
//! Both builders compile to a statement string consumed by the session
//! execution path; they never touch a connection themselves.

pub mod match_builder;
pub mod select_builder;

pub use match_builder::Match;
pub use select_builder::{LockStrategy, Order, Select, TimeoutStrategy};
