//! Database connection pool management.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

/// Database configuration.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

/// Creates a PostgreSQL connection pool with the given configuration.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .connect(&config.url)
        .await
}

/// Distinguishes connectivity faults (database unreachable, pool
/// exhausted) from query-level faults (bad statement, constraint
/// violation).
///
/// Callers swallow connectivity faults on best-effort writes such as
/// progress updates; query faults always surface.
pub fn is_connectivity_error(error: &sqlx::Error) -> bool {
    matches!(
        error,
        sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_timeout_is_connectivity() {
        assert!(is_connectivity_error(&sqlx::Error::PoolTimedOut));
        assert!(is_connectivity_error(&sqlx::Error::PoolClosed));
    }

    #[test]
    fn test_row_not_found_is_not_connectivity() {
        assert!(!is_connectivity_error(&sqlx::Error::RowNotFound));
    }
}
