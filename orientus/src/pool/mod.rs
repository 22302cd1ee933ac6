// Copyright (c) 2024-2025 Orientus Contributors.
// SPDX-License-Identifier: Apache-2.0
//
//! Bounded connection pool and the database handle that owns it.
//!
//! Every operation that needs a connection receives one explicitly through
//! a [`PooledConnection`] guard; there is no ambient global handle. The
//! guard returns its connection to the pool on drop, on every exit path.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::error::{Error, Result};
use crate::protocol::{Connection, Connector, ServerConfig};
use crate::session::{BatchSession, Session};

/// Pool sizing and acquire behavior.
#[derive(Debug, Clone)]
pub struct PoolOptions {
    /// Upper bound on concurrently open connections
    pub max_connections: usize,
    /// How long `acquire` blocks for a free connection before failing
    pub acquire_timeout: Duration,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            max_connections: 10,
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Default)]
struct PoolState {
    idle: Vec<Box<dyn Connection>>,
    open: usize,
}

/// Handle to one database: connection parameters, driver, and the bounded
/// pool of live connections.
pub struct Database {
    config: ServerConfig,
    connector: Box<dyn Connector>,
    options: PoolOptions,
    state: Mutex<PoolState>,
    available: Condvar,
}

impl Database {
    /// Connect with default pool options.
    ///
    /// One connection is opened eagerly so bad credentials or an
    /// unreachable server fail here rather than on first use.
    pub fn connect(config: ServerConfig, connector: impl Connector + 'static) -> Result<Self> {
        Self::connect_with(config, connector, PoolOptions::default())
    }

    /// Connect with explicit pool options.
    pub fn connect_with(
        config: ServerConfig,
        connector: impl Connector + 'static,
        options: PoolOptions,
    ) -> Result<Self> {
        let database = Self {
            config,
            connector: Box::new(connector),
            options,
            state: Mutex::new(PoolState::default()),
            available: Condvar::new(),
        };
        let connection = database.connector.open(&database.config)?;
        {
            let mut state = database.state.lock();
            state.idle.push(connection);
            state.open = 1;
        }
        log::info!(
            "connected to '{}' on {}:{}",
            database.config.database,
            database.config.host,
            database.config.port
        );
        Ok(database)
    }

    /// Connection parameters this pool was opened with.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Number of idle pooled connections.
    pub fn idle_connections(&self) -> usize {
        self.state.lock().idle.len()
    }

    /// Take exclusive ownership of a connection until the guard drops.
    ///
    /// Pops an idle connection when one exists, opens a new one while under
    /// `max_connections`, and otherwise blocks up to `acquire_timeout`
    /// before failing with [`Error::PoolTimeout`].
    pub fn acquire(&self) -> Result<PooledConnection<'_>> {
        let deadline = Instant::now() + self.options.acquire_timeout;
        let mut state = self.state.lock();
        loop {
            if let Some(connection) = state.idle.pop() {
                return Ok(PooledConnection {
                    database: self,
                    connection: Some(connection),
                });
            }
            if state.open < self.options.max_connections {
                state.open += 1;
                drop(state);
                match self.connector.open(&self.config) {
                    Ok(connection) => {
                        return Ok(PooledConnection {
                            database: self,
                            connection: Some(connection),
                        });
                    }
                    Err(e) => {
                        self.state.lock().open -= 1;
                        self.available.notify_one();
                        return Err(e);
                    }
                }
            }
            if self.available.wait_until(&mut state, deadline).timed_out() {
                return Err(Error::PoolTimeout(self.options.acquire_timeout));
            }
        }
    }

    /// Session with immediate execution semantics.
    pub fn session(&self) -> Result<Session<'_>> {
        Ok(Session::new(self.acquire()?))
    }

    /// Session that defers statements into one atomic batch script.
    pub fn batch(&self) -> Result<BatchSession<'_>> {
        Ok(BatchSession::new(self.acquire()?))
    }

    /// Close all idle connections.
    ///
    /// Connections currently held by sessions are closed when their guards
    /// return them and the pool is closed again, or when the process exits.
    pub fn close(&self) -> Result<()> {
        let mut state = self.state.lock();
        log::info!("closing '{}' database pool", self.config.database);
        while let Some(mut connection) = state.idle.pop() {
            state.open -= 1;
            if let Err(e) = connection.close() {
                log::warn!("error closing pooled connection: {e}");
            }
        }
        Ok(())
    }

    fn release(&self, connection: Box<dyn Connection>) {
        self.state.lock().idle.push(connection);
        self.available.notify_one();
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Database")
            .field("database", &self.config.database)
            .field("open", &state.open)
            .field("idle", &state.idle.len())
            .finish()
    }
}

/// RAII guard over one pooled connection.
///
/// Owned exclusively by the caller between acquire and drop; dropping the
/// guard releases the connection back to the pool.
pub struct PooledConnection<'db> {
    database: &'db Database,
    connection: Option<Box<dyn Connection>>,
}

impl PooledConnection<'_> {
    /// The underlying driver connection.
    pub fn as_mut(&mut self) -> &mut dyn Connection {
        self.connection
            .as_mut()
            .expect("connection is present until drop")
            .as_mut()
    }
}

impl Drop for PooledConnection<'_> {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.take() {
            self.database.release(connection);
        }
    }
}
