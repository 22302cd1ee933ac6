//! Shared test fixtures: a scripted in-memory driver and a small domain
//! model exercising all three record kinds.

#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;

use orientus::{
    Connection, Connector, Error, PropertyDescriptor, PropertyKind, Record, RecordKind,
    RecordState, Result, ResultRow, Rid, ServerConfig, Value, Version,
};

/// Reply a [`MockDriver`] hands back for a matching statement.
#[derive(Clone)]
pub enum Reply {
    Rows(Vec<ResultRow>),
    CommandError(String),
    DuplicateKey(String),
}

#[derive(Clone, Default)]
pub struct MockDriver {
    pub statements: Arc<Mutex<Vec<String>>>,
    pub scripts: Arc<Mutex<Vec<String>>>,
    replies: Arc<Mutex<Vec<(String, Reply)>>>,
    pub opened: Arc<Mutex<usize>>,
    pub closed: Arc<Mutex<usize>>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for the first future statement containing `needle`.
    pub fn reply_with(&self, needle: &str, reply: Reply) {
        self.replies.lock().push((needle.to_string(), reply));
    }

    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().clone()
    }

    pub fn scripts(&self) -> Vec<String> {
        self.scripts.lock().clone()
    }

    pub fn opened(&self) -> usize {
        *self.opened.lock()
    }

    fn take_reply(&self, statement: &str) -> Result<Vec<ResultRow>> {
        let mut replies = self.replies.lock();
        let index = replies
            .iter()
            .position(|(needle, _)| statement.contains(needle.as_str()));
        match index.map(|i| replies.remove(i).1) {
            Some(Reply::Rows(rows)) => Ok(rows),
            Some(Reply::CommandError(message)) => Err(Error::Command(message)),
            Some(Reply::DuplicateKey(message)) => Err(Error::DuplicateKey(message)),
            None => Ok(Vec::new()),
        }
    }
}

impl Connector for MockDriver {
    fn open(&self, _config: &ServerConfig) -> Result<Box<dyn Connection>> {
        *self.opened.lock() += 1;
        Ok(Box::new(MockConnection {
            driver: self.clone(),
        }))
    }
}

struct MockConnection {
    driver: MockDriver,
}

impl Connection for MockConnection {
    fn execute(&mut self, statement: &str) -> Result<Vec<ResultRow>> {
        self.driver.statements.lock().push(statement.to_string());
        self.driver.take_reply(statement)
    }

    fn execute_script(&mut self, script: &str) -> Result<Vec<ResultRow>> {
        self.driver.scripts.lock().push(script.to_string());
        self.driver.take_reply(script)
    }

    fn close(&mut self) -> Result<()> {
        *self.driver.closed.lock() += 1;
        Ok(())
    }
}

/// Opt into test logging with `RUST_LOG=debug cargo test`.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn config() -> ServerConfig {
    ServerConfig::new("localhost", 2424, "test", "root", "admin")
}

pub fn row(rid: &str, version: i32, fields: &[(&str, Value)]) -> ResultRow {
    let mut row = ResultRow::new();
    row.rid = Some(Rid::new(rid));
    row.version = Some(Version(version));
    for (name, value) in fields {
        row.fields.insert((*name).to_string(), value.clone());
    }
    row
}

// ---------------------------------------------------------------------------
// Domain fixtures
// ---------------------------------------------------------------------------

static PERSON_PROPERTIES: [PropertyDescriptor; 1] =
    [PropertyDescriptor::new("name", PropertyKind::String).mandatory()];

#[derive(Default)]
pub struct Person {
    state: RecordState,
    pub name: String,
}

impl Person {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }
}

impl Record for Person {
    const CLASS: &'static str = "Person";
    const KIND: RecordKind = RecordKind::Vertex;

    fn descriptors() -> &'static [PropertyDescriptor] {
        &PERSON_PROPERTIES
    }

    fn state(&self) -> &RecordState {
        &self.state
    }

    fn fields(&self) -> Vec<(&'static str, Value)> {
        vec![("name", Value::from(self.name.clone()))]
    }

    fn set_field(&mut self, name: &str, value: Value) {
        if let ("name", Value::String(s)) = (name, value) {
            self.name = s;
        }
    }
}

static RELATED_PROPERTIES: [PropertyDescriptor; 1] =
    [PropertyDescriptor::new("relation_type", PropertyKind::String)];

pub struct Related {
    state: RecordState,
    from: RecordState,
    to: RecordState,
    pub relation_type: String,
}

impl Related {
    pub fn between(from: &impl Record, to: &impl Record) -> Self {
        Self {
            state: RecordState::new(),
            from: from.state().clone(),
            to: to.state().clone(),
            relation_type: "love".to_string(),
        }
    }
}

impl Record for Related {
    const CLASS: &'static str = "Related";
    const KIND: RecordKind = RecordKind::Edge;

    fn descriptors() -> &'static [PropertyDescriptor] {
        &RELATED_PROPERTIES
    }

    fn state(&self) -> &RecordState {
        &self.state
    }

    fn fields(&self) -> Vec<(&'static str, Value)> {
        vec![("relation_type", Value::from(self.relation_type.clone()))]
    }

    fn set_field(&mut self, name: &str, value: Value) {
        if let ("relation_type", Value::String(s)) = (name, value) {
            self.relation_type = s;
        }
    }

    fn endpoints(&self) -> Option<(&RecordState, &RecordState)> {
        Some((&self.from, &self.to))
    }
}

static FILE_PROPERTIES: [PropertyDescriptor; 2] = [
    PropertyDescriptor::new("filename", PropertyKind::String)
        .mandatory()
        .unique(),
    PropertyDescriptor::new("size", PropertyKind::Long).min(0),
];

#[derive(Default)]
pub struct File {
    state: RecordState,
    pub filename: String,
    pub size: i64,
}

impl File {
    pub fn new(filename: &str, size: i64) -> Self {
        Self {
            filename: filename.to_string(),
            size,
            ..Self::default()
        }
    }
}

impl Record for File {
    const CLASS: &'static str = "File";
    const KIND: RecordKind = RecordKind::Document;

    fn descriptors() -> &'static [PropertyDescriptor] {
        &FILE_PROPERTIES
    }

    fn state(&self) -> &RecordState {
        &self.state
    }

    fn fields(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("filename", Value::from(self.filename.clone())),
            ("size", Value::from(self.size)),
        ]
    }

    fn set_field(&mut self, name: &str, value: Value) {
        match (name, value) {
            ("filename", Value::String(s)) => self.filename = s,
            ("size", Value::Int(i)) => self.size = i,
            _ => {}
        }
    }
}
