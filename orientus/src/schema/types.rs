// Copyright (c) 2024-2025 Orientus Contributors.
// SPDX-License-Identifier: Apache-2.0
//
//! Property descriptors and the boolean clause tree they produce.
//!
//! A [`PropertyDescriptor`] is declared once per mapped field of a domain
//! class. It is read-only metadata: the schema synchronizer reads it to emit
//! `CREATE PROPERTY`/`CREATE INDEX` DDL, the serializer reads it to enforce
//! constraints client-side, and query code uses it as an expression factory
//! for comparison predicates.

use std::borrow::Cow;
use std::fmt;

use regex::Regex;

use crate::record::Value;

/// Property types understood by the server's DDL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Boolean,
    Integer,
    Short,
    Long,
    Float,
    Double,
    String,
    Binary,
    Byte,
    Date,
    DateTime,
    Decimal,
    Embedded,
    EmbeddedList,
    EmbeddedSet,
    EmbeddedMap,
    Link,
    LinkList,
    LinkSet,
    LinkMap,
    Any,
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = match self {
            PropertyKind::Boolean => "BOOLEAN",
            PropertyKind::Integer => "INTEGER",
            PropertyKind::Short => "SHORT",
            PropertyKind::Long => "LONG",
            PropertyKind::Float => "FLOAT",
            PropertyKind::Double => "DOUBLE",
            PropertyKind::String => "STRING",
            PropertyKind::Binary => "BINARY",
            PropertyKind::Byte => "BYTE",
            PropertyKind::Date => "DATE",
            PropertyKind::DateTime => "DATETIME",
            PropertyKind::Decimal => "DECIMAL",
            PropertyKind::Embedded => "EMBEDDED",
            PropertyKind::EmbeddedList => "EMBEDDEDLIST",
            PropertyKind::EmbeddedSet => "EMBEDDEDSET",
            PropertyKind::EmbeddedMap => "EMBEDDEDMAP",
            PropertyKind::Link => "LINK",
            PropertyKind::LinkList => "LINKLIST",
            PropertyKind::LinkSet => "LINKSET",
            PropertyKind::LinkMap => "LINKMAP",
            PropertyKind::Any => "ANY",
        };
        f.write_str(keyword)
    }
}

/// Declared metadata for one property of a domain class.
///
/// Const-constructible so domain types can declare `static` descriptor
/// tables:
///
/// ```ignore
/// static TEXT: PropertyDescriptor =
///     PropertyDescriptor::new("text", PropertyKind::String).mandatory();
/// ```
#[derive(Debug, Clone)]
pub struct PropertyDescriptor {
    name: Cow<'static, str>,
    kind: PropertyKind,
    min: Option<i64>,
    max: Option<i64>,
    mandatory: bool,
    readonly: bool,
    notnull: bool,
    unique: bool,
    regex: Option<&'static str>,
}

impl PropertyDescriptor {
    /// Descriptor with no constraints.
    pub const fn new(name: &'static str, kind: PropertyKind) -> Self {
        Self {
            name: Cow::Borrowed(name),
            kind,
            min: None,
            max: None,
            mandatory: false,
            readonly: false,
            notnull: false,
            unique: false,
            regex: None,
        }
    }

    /// Lower bound: numeric value for numeric kinds, length for strings.
    pub const fn min(mut self, min: i64) -> Self {
        self.min = Some(min);
        self
    }

    /// Upper bound: numeric value for numeric kinds, length for strings.
    pub const fn max(mut self, max: i64) -> Self {
        self.max = Some(max);
        self
    }

    /// The property must be present and non-null on every record.
    pub const fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    /// The property cannot be changed after the first assignment.
    pub const fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    /// The property may be absent but never null.
    pub const fn notnull(mut self) -> Self {
        self.notnull = true;
        self
    }

    /// String values must match the given pattern.
    pub const fn regex(mut self, pattern: &'static str) -> Self {
        self.regex = Some(pattern);
        self
    }

    /// A unique index is created for the property.
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Externally-visible property name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared property type.
    pub fn kind(&self) -> PropertyKind {
        self.kind
    }

    /// Whether a unique index is declared for the property.
    pub fn is_unique(&self) -> bool {
        self.unique
    }

    /// Whether the property is declared read-only.
    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    /// Derived projection applying the server-side `trim()` function,
    /// usable wherever a descriptor builds a predicate.
    pub fn trim(&self) -> PropertyDescriptor {
        PropertyDescriptor {
            name: Cow::Owned(format!("{}.trim()", self.name)),
            kind: self.kind,
            min: None,
            max: None,
            mandatory: false,
            readonly: false,
            notnull: false,
            unique: false,
            regex: None,
        }
    }

    /// Constraint clause body for `CREATE PROPERTY`, e.g.
    /// `MIN 1,MAX 64,MANDATORY TRUE`; `None` when unconstrained.
    pub fn ddl_constraints(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(min) = self.min {
            parts.push(format!("MIN {min}"));
        }
        if let Some(max) = self.max {
            parts.push(format!("MAX {max}"));
        }
        if self.mandatory {
            parts.push("MANDATORY TRUE".to_string());
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(","))
        }
    }

    /// Check one field value against the declared constraints.
    ///
    /// `None` means the field is absent from the record. Returns the reason
    /// text of the first violated constraint.
    pub fn check(&self, value: Option<&Value>) -> Result<(), String> {
        let value = match value {
            None => {
                if self.mandatory {
                    return Err("MANDATORY property is missing".to_string());
                }
                return Ok(());
            }
            Some(Value::Null) => {
                if self.mandatory {
                    return Err("MANDATORY property is null".to_string());
                }
                if self.notnull {
                    return Err("NOTNULL property is null".to_string());
                }
                return Ok(());
            }
            Some(value) => value,
        };

        if let (Some(pattern), Value::String(s)) = (self.regex, value) {
            let re = Regex::new(pattern)
                .map_err(|e| format!("invalid REGEXP constraint '{pattern}': {e}"))?;
            if !re.is_match(s) {
                return Err(format!("value does not match REGEXP '{pattern}'"));
            }
        }

        // MIN/MAX bound the value for numeric kinds and the length for strings.
        let magnitude = match value {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::String(s) => Some(s.chars().count() as f64),
            _ => None,
        };
        if let Some(magnitude) = magnitude {
            if let Some(min) = self.min {
                if magnitude < min as f64 {
                    return Err(format!("value is below MIN {min}"));
                }
            }
            if let Some(max) = self.max {
                if magnitude > max as f64 {
                    return Err(format!("value is above MAX {max}"));
                }
            }
        }

        Ok(())
    }

    /// `<name> = <literal>` predicate; `IS NULL` when compared to null.
    pub fn eq(&self, value: impl Into<Value>) -> Clause {
        self.compare("=", "IS", value)
    }

    /// `<name> != <literal>` predicate; `IS NOT NULL` when compared to null.
    pub fn ne(&self, value: impl Into<Value>) -> Clause {
        self.compare("!=", "IS NOT", value)
    }

    /// `<name> < <literal>` predicate.
    pub fn lt(&self, value: impl Into<Value>) -> Clause {
        self.compare("<", "<", value)
    }

    /// `<name> <= <literal>` predicate.
    pub fn le(&self, value: impl Into<Value>) -> Clause {
        self.compare("<=", "<=", value)
    }

    /// `<name> > <literal>` predicate.
    pub fn gt(&self, value: impl Into<Value>) -> Clause {
        self.compare(">", ">", value)
    }

    /// `<name> >= <literal>` predicate.
    pub fn ge(&self, value: impl Into<Value>) -> Clause {
        self.compare(">=", ">=", value)
    }

    fn compare(&self, operator: &str, null_operator: &str, value: impl Into<Value>) -> Clause {
        let value = value.into();
        if value.is_null() {
            Clause::raw(format!("{} {} NULL", self.name, null_operator))
        } else {
            Clause::raw(format!(
                "{} {} {}",
                self.name,
                operator,
                value.to_sql_literal()
            ))
        }
    }
}

/// Immutable rendered boolean expression.
///
/// Combinators always produce a new clause wrapping both operands in one
/// parenthesis pair, regardless of operand complexity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause(String);

impl Clause {
    /// Wrap an already-rendered expression.
    pub fn raw(expression: impl Into<String>) -> Self {
        Self(expression.into())
    }

    /// `(<self> AND <other>)`
    pub fn and(&self, other: &Clause) -> Clause {
        Clause(format!("({} AND {})", self.0, other.0))
    }

    /// `(<self> OR <other>)`
    pub fn or(&self, other: &Clause) -> Clause {
        Clause(format!("({} OR {})", self.0, other.0))
    }

    /// Rendered expression text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
