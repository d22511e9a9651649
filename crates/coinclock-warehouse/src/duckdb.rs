//! Small reuse pool for `DuckDB` connections to the coin store.
//!
//! All connections share one database instance: the pool opens the file once
//! and clones further connections from that root, so a process never holds
//! two instances (and two file locks) on the same path.

use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use ::duckdb::Connection;

struct Shared {
    db_path: PathBuf,
    max_idle: usize,
    root: Mutex<Connection>,
    idle: Mutex<Vec<Connection>>,
}

/// Hands out connections to a single database file.
#[derive(Clone)]
pub struct ConnectionPool {
    shared: Arc<Shared>,
}

impl ConnectionPool {
    /// Open the database at `path` and keep up to `max_idle` spare connections.
    ///
    /// # Errors
    /// Returns an error if the database file cannot be opened or configured.
    pub fn open(path: impl Into<PathBuf>, max_idle: usize) -> Result<Self, ::duckdb::Error> {
        let db_path = path.into();
        let root = Connection::open(&db_path)?;
        configure(&root)?;

        Ok(Self {
            shared: Arc::new(Shared {
                db_path,
                max_idle: max_idle.max(1),
                root: Mutex::new(root),
                idle: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Reuse an idle connection or clone a new one from the root.
    ///
    /// # Errors
    /// Returns an error if a new connection cannot be created.
    ///
    /// # Panics
    /// Panics if a pool mutex is poisoned.
    pub fn lease(&self) -> Result<Lease, ::duckdb::Error> {
        let reused = self
            .shared
            .idle
            .lock()
            .expect("duckdb pool mutex poisoned")
            .pop();

        let connection = match reused {
            Some(connection) => connection,
            None => {
                let connection = self
                    .shared
                    .root
                    .lock()
                    .expect("duckdb root connection mutex poisoned")
                    .try_clone()?;
                configure(&connection)?;
                connection
            }
        };

        Ok(Lease {
            shared: Arc::clone(&self.shared),
            connection: Some(connection),
        })
    }

    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.shared.db_path
    }

    /// Idle connections currently parked in the pool.
    pub fn idle_count(&self) -> usize {
        self.shared
            .idle
            .lock()
            .expect("duckdb pool mutex poisoned")
            .len()
    }
}

/// A leased connection; returned to the pool on drop.
pub struct Lease {
    shared: Arc<Shared>,
    connection: Option<Connection>,
}

impl Deref for Lease {
    type Target = Connection;

    fn deref(&self) -> &Self::Target {
        self.connection
            .as_ref()
            .expect("leased connection already returned")
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        let Some(connection) = self.connection.take() else {
            return;
        };

        let mut idle = self.shared.idle.lock().expect("duckdb pool mutex poisoned");
        if idle.len() < self.shared.max_idle {
            idle.push(connection);
        }
    }
}

fn configure(connection: &Connection) -> Result<(), ::duckdb::Error> {
    connection.execute_batch("PRAGMA disable_progress_bar;")
}
