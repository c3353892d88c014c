pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod utils;

use sea_orm::DatabaseConnection;

pub use config::Config;
pub use error::{AppError, AppResult};

// sea-orm's `mock` feature removes the `Clone` derive from
// `DatabaseConnection`, so spell out an equivalent impl there.
#[cfg_attr(not(feature = "mock"), derive(Clone))]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Config,
}

#[cfg(feature = "mock")]
impl Clone for AppState {
    fn clone(&self) -> Self {
        let db = match &self.db {
            DatabaseConnection::SqlxPostgresPoolConnection(conn) => {
                DatabaseConnection::SqlxPostgresPoolConnection(conn.clone())
            }
            DatabaseConnection::MockDatabaseConnection(conn) => {
                DatabaseConnection::MockDatabaseConnection(conn.clone())
            }
            DatabaseConnection::Disconnected => DatabaseConnection::Disconnected,
        };
        Self {
            db,
            config: self.config.clone(),
        }
    }
}
