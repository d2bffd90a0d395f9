//! Connection pooling, migrations, and the single-writer actor.

mod write_actor;

pub use write_actor::{spawn_writer, WriteHandle};

use crate::errors::StorageError;
use alm_core::errors::{DatabaseError, Error, Result};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::sql_query;
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::fs;
use std::path::Path;
use std::sync::Arc;

pub type DbPool = Arc<Pool<ConnectionManager<SqliteConnection>>>;
pub type DbConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Creates the database file (and parent directories) if needed, then runs
/// pending migrations. Call once at process start.
pub fn init(db_path: &str) -> Result<()> {
    if !Path::new(db_path).exists() {
        create_db_file(db_path)?;
    }
    run_migrations(db_path)
}

/// Builds the r2d2 connection pool used for reads. Writes go through the
/// single connection owned by the writer actor instead.
pub fn create_pool(db_path: &str) -> Result<DbPool> {
    let manager = ConnectionManager::<SqliteConnection>::new(db_path);
    let pool = Pool::builder()
        .build(manager)
        .map_err(|e| Error::Database(DatabaseError::PoolCreationFailed(e.to_string())))?;
    Ok(Arc::new(pool))
}

/// Checks out a read connection with the session pragmas applied.
pub fn get_connection(pool: &DbPool) -> Result<DbConnection> {
    let mut conn = pool
        .get()
        .map_err(|e| Error::Database(DatabaseError::ConnectionFailed(e.to_string())))?;
    apply_pragmas(&mut conn)?;
    Ok(conn)
}

pub fn run_migrations(db_path: &str) -> Result<()> {
    let mut conn = establish_connection(db_path)?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| Error::from(StorageError::MigrationFailed(e.to_string())))?;
    Ok(())
}

fn establish_connection(db_path: &str) -> Result<SqliteConnection> {
    let mut conn = SqliteConnection::establish(db_path)
        .map_err(|e| Error::from(StorageError::ConnectionFailed(e)))?;
    apply_pragmas(&mut conn)?;
    Ok(conn)
}

pub(crate) fn apply_pragmas(conn: &mut SqliteConnection) -> Result<()> {
    // WAL lets day-range reads proceed while the writer actor holds its
    // connection; busy_timeout covers the checkpoint window.
    sql_query("PRAGMA journal_mode = WAL")
        .execute(conn)
        .map_err(|e| Error::from(StorageError::QueryFailed(e)))?;
    sql_query("PRAGMA busy_timeout = 5000")
        .execute(conn)
        .map_err(|e| Error::from(StorageError::QueryFailed(e)))?;
    sql_query("PRAGMA foreign_keys = ON")
        .execute(conn)
        .map_err(|e| Error::from(StorageError::QueryFailed(e)))?;
    Ok(())
}

fn create_db_file(db_path: &str) -> Result<()> {
    if let Some(db_dir) = Path::new(db_path).parent() {
        if !db_dir.exists() {
            fs::create_dir_all(db_dir)
                .map_err(|e| Error::Database(DatabaseError::Internal(e.to_string())))?;
        }
    }
    fs::File::create(db_path)
        .map_err(|e| Error::Database(DatabaseError::Internal(e.to_string())))?;
    Ok(())
}
