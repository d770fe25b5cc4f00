//! Postgres harness with testcontainers for store-level tests.
//!
//! One container is started for the whole test binary and migrated once.
//! Each test gets its own pool on top of it.

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::PgPool;
use test_context::AsyncTestContext;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

use registration_core::kernel::PgRegistrationStore;

use super::init_tracing;

struct SharedDatabase {
    db_url: String,
    // Keep the container alive for the entire test run
    _postgres: ContainerAsync<Postgres>,
}

static SHARED_DB: OnceCell<SharedDatabase> = OnceCell::const_new();

impl SharedDatabase {
    async fn init() -> Result<Self> {
        init_tracing();

        let postgres = Postgres::default()
            .with_tag("16")
            .start()
            .await
            .context("Failed to start Postgres container")?;

        let host = postgres.get_host().await?;
        let port = postgres.get_host_port_ipv4(5432).await?;
        let db_url = format!("postgresql://postgres:postgres@{}:{}/postgres", host, port);

        let pool = PgPool::connect(&db_url)
            .await
            .context("Failed to connect to Postgres for migrations")?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run migrations")?;

        Ok(Self {
            db_url,
            _postgres: postgres,
        })
    }

    async fn get() -> &'static Self {
        SHARED_DB
            .get_or_init(|| async {
                Self::init()
                    .await
                    .expect("Failed to initialize shared test database")
            })
            .await
    }
}

/// Harness exposing a migrated database and the Postgres store on top of it.
///
/// The database is shared, so tests must use fresh ids and emails.
pub struct PgHarness {
    pub db_pool: PgPool,
    pub store: Arc<PgRegistrationStore>,
}

impl AsyncTestContext for PgHarness {
    async fn setup() -> Self {
        Self::new().await.expect("Failed to create Postgres harness")
    }
}

impl PgHarness {
    pub async fn new() -> Result<Self> {
        let shared = SharedDatabase::get().await;

        let db_pool = PgPool::connect(&shared.db_url)
            .await
            .context("Failed to connect to test database")?;

        Ok(Self {
            store: Arc::new(PgRegistrationStore::new(db_pool.clone())),
            db_pool,
        })
    }
}
