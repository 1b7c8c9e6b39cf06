//! Database lifecycle helpers for the `PostgreSQL` integration tests.

use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use eyre::eyre;
use paperjobs::generation::adapters::postgres::JobPgPool;
use pg_embedded_setup_unpriv::{TestCluster, test_support::shared_test_cluster};
use rstest::fixture;
use tokio::runtime::Runtime;
use uuid::Uuid;

const MIGRATIONS: [&str; 3] = [
    include_str!("../../migrations/2026-03-01-000000_create_generation_jobs/up.sql"),
    include_str!("../../migrations/2026-03-01-000001_create_owner_credentials/up.sql"),
    include_str!("../../migrations/2026-03-08-000000_create_custom_assets/up.sql"),
];

/// Template database holding the migrated schema.
const TEMPLATE_DB: &str = "paperjobs_test_template";

/// A migrated database private to one test, dropped when the test ends.
pub struct TestDatabase {
    /// Single-connection pool onto the database.
    pub pool: JobPgPool,
    runtime: Runtime,
    _cleanup: CleanupGuard,
}

impl TestDatabase {
    /// Runs a repository call to completion.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}

/// Clones a fresh database from the migrated template.
#[fixture]
pub fn database(shared_test_cluster: &'static TestCluster) -> eyre::Result<TestDatabase> {
    ensure_template(shared_test_cluster)?;
    let db_name = format!("paperjobs_{}", Uuid::new_v4().simple());
    shared_test_cluster
        .create_database_from_template(db_name.as_str(), TEMPLATE_DB)
        .map_err(|e| eyre!("{e}"))?;
    let cleanup = CleanupGuard {
        cluster: shared_test_cluster,
        db_name: db_name.clone(),
    };

    let url = shared_test_cluster.connection().database_url(&db_name);
    let pool = Pool::builder()
        .max_size(1)
        .build(ConnectionManager::<PgConnection>::new(url))?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    Ok(TestDatabase {
        pool,
        runtime,
        _cleanup: cleanup,
    })
}

fn ensure_template(cluster: &TestCluster) -> eyre::Result<()> {
    cluster
        .ensure_template_exists(TEMPLATE_DB, |db_name| {
            let url = cluster.connection().database_url(db_name);
            let mut conn = PgConnection::establish(&url).map_err(|e| eyre!("{e}"))?;
            for migration in MIGRATIONS {
                execute_sql_statements(&mut conn, migration)?;
            }
            Ok(())
        })
        .map_err(|e| eyre!("{e}"))
}

/// Runs each statement of a migration file in turn.
fn execute_sql_statements(conn: &mut PgConnection, sql: &str) -> eyre::Result<()> {
    for statement in sql.split(';') {
        let trimmed = statement.trim();
        if trimmed.is_empty() || trimmed.lines().all(|line| line.trim().starts_with("--")) {
            continue;
        }
        diesel::sql_query(trimmed)
            .execute(conn)
            .map_err(|e| eyre!("SQL error: {e}\nStatement: {trimmed}"))?;
    }
    Ok(())
}

struct CleanupGuard {
    cluster: &'static TestCluster,
    db_name: String,
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if let Err(e) = self.cluster.drop_database(self.db_name.as_str()) {
            eprintln!("Warning: failed to drop test database {}: {e}", self.db_name);
        }
    }
}
