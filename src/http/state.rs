// Application state - shared connection and request timeout

use super::error::AppError;
use crate::store::{Deadline, Session};
use parking_lot::Mutex;
use rusqlite::Connection;
use std::sync::Arc;
use std::time::Duration;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Connection>>,
    request_timeout: Duration,
}

impl AppState {
    pub fn new(conn: Connection, request_timeout: Duration) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            request_timeout,
        }
    }

    /// Run `f` on the blocking pool with a session bounded by this request's
    /// deadline. Time spent waiting for the connection counts against it.
    pub async fn run<T, F>(&self, f: F) -> Result<T, AppError>
    where
        T: Send + 'static,
        F: FnOnce(&Session<'_>) -> crate::Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        let deadline = Deadline::after(self.request_timeout);

        let result = tokio::task::spawn_blocking(move || {
            let conn = db.lock();
            f(&Session::new(&conn, deadline))
        })
        .await
        .map_err(|err| AppError::Internal(format!("store task failed: {err}")))?;

        result.map_err(AppError::from)
    }
}
