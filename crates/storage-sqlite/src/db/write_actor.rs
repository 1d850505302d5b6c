//! Single-writer actor for SQLite.
//!
//! SQLite allows only one writer at a time; funnelling every write through
//! one dedicated connection avoids `SQLITE_BUSY` churn under concurrent
//! batch acquisitions. Each job runs inside an immediate transaction, so a
//! mixed daily/intraday upsert commits or rolls back as a unit.

use diesel::connection::Connection;
use diesel::SqliteConnection;
use tokio::sync::{mpsc, oneshot};

use barvault_core::errors::Result;

use super::DbPool;
use crate::errors::StorageError;

// Every cache write (upsert or clear) resolves to an affected-row count,
// so the job type can be concrete.
type WriteJob = Box<dyn FnOnce(&mut SqliteConnection) -> Result<usize> + Send + 'static>;

/// Handle for sending jobs to the writer actor.
#[derive(Clone)]
pub struct WriteHandle {
    tx: mpsc::Sender<(WriteJob, oneshot::Sender<Result<usize>>)>,
}

impl WriteHandle {
    /// Runs `job` on the writer's dedicated connection, inside an immediate
    /// transaction, and returns the affected-row count.
    pub async fn exec<F>(&self, job: F) -> Result<usize>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<usize> + Send + 'static,
    {
        let (ret_tx, ret_rx) = oneshot::channel();

        self.tx
            .send((Box::new(job), ret_tx))
            .await
            .expect("writer actor stopped: job channel closed");

        ret_rx
            .await
            .expect("writer actor dropped the reply sender without responding")
    }
}

/// Spawns the background writer task. The actor pins one pooled connection
/// for its lifetime and processes jobs serially until every `WriteHandle`
/// is dropped.
pub fn spawn_writer(pool: DbPool) -> WriteHandle {
    let (tx, mut rx) = mpsc::channel::<(WriteJob, oneshot::Sender<Result<usize>>)>(1024);

    tokio::spawn(async move {
        let mut conn = pool
            .get()
            .expect("failed to get a connection from the pool for the writer actor");

        while let Some((job, reply_tx)) = rx.recv().await {
            // immediate_transaction needs an error type with From<DieselError>;
            // StorageError fills that role, converted back at the boundary.
            let result: Result<usize> = conn
                .immediate_transaction::<_, StorageError, _>(|c| job(c).map_err(StorageError::from))
                .map_err(|e: StorageError| e.into());

            // Receiver may have given up (cancelled request); that is fine.
            let _ = reply_tx.send(result);
        }
    });

    WriteHandle { tx }
}

#[cfg(test)]
mod tests {
    use diesel::RunQueryDsl;
    use tempfile::TempDir;

    use barvault_core::errors::{DatabaseError, Error};

    use super::*;
    use crate::db;
    use crate::errors::IntoCore;

    async fn test_writer() -> (WriteHandle, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bars.db");
        let path = path.to_str().unwrap();

        db::init(path).unwrap();
        let pool = db::create_pool(path).unwrap();
        db::run_migrations(&pool).unwrap();

        (spawn_writer(pool.as_ref().clone()), dir)
    }

    #[tokio::test]
    async fn exec_returns_row_counts_and_survives_job_errors() {
        let (writer, _dir) = test_writer().await;

        let failed = writer
            .exec(|_conn| Err(Error::Database(DatabaseError::QueryFailed("boom".into()))))
            .await;
        assert!(failed.is_err());

        // The actor keeps serving after a failed job.
        let written = writer
            .exec(|conn| {
                diesel::sql_query(
                    "INSERT INTO daily_bars \
                     (symbol, bar_date, open, high, low, close, volume, created_at) \
                     VALUES ('AAPL', '2025-06-02', '1', '2', '0.5', '1.5', 10, \
                     '2025-06-02 00:00:00')",
                )
                .execute(conn)
                .into_core()
            })
            .await
            .unwrap();
        assert_eq!(written, 1);
    }
}
