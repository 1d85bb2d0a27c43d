use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Pool, Postgres};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::{Config, DatabaseConfig};
use crate::database::models::{CatalogCounts, ModuleOverview, NewApiDoc};
use crate::database::queries::{ApiDocQueries, CatalogQueries, ModuleQueries};
use crate::ingest::DocStore;

pub mod models;
pub mod queries;

pub type DbPool = Pool<Postgres>;

#[derive(Debug, Clone)]
pub struct Database {
    pool: DbPool,
    dimension: usize,
}

impl Database {
    pub async fn connect(config: &Config) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .connect_with(Self::connect_options(&config.database))
            .await
            .context("Failed to create database connection pool")?;

        debug!(
            "Connected to PostgreSQL database {} at {}:{}",
            config.database.dbname, config.database.host, config.database.port
        );

        Ok(Self {
            pool,
            dimension: config.ingest.dimension,
        })
    }

    pub async fn connect_url(url: &str, dimension: usize) -> Result<Self> {
        let options = url
            .parse::<PgConnectOptions>()
            .context("Failed to parse database URL")?;

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("Failed to create database connection pool")?;

        Ok(Self { pool, dimension })
    }

    #[inline]
    pub fn connect_options(database: &DatabaseConfig) -> PgConnectOptions {
        let mut options = PgConnectOptions::new()
            .host(&database.host)
            .port(database.port)
            .database(&database.dbname)
            .username(&database.user);

        if !database.password.is_empty() {
            options = options.password(&database.password);
        }

        options
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations");

        sqlx::migrate!("src/database/migrations")
            .run(&self.pool)
            .await
            .context("Failed to run schema migration")?;

        debug!("Database migrations completed successfully");
        Ok(())
    }

    pub async fn module_overviews(&self) -> Result<Vec<ModuleOverview>> {
        ModuleQueries::overviews(&self.pool).await
    }

    pub async fn catalog_counts(&self) -> Result<CatalogCounts> {
        CatalogQueries::counts(&self.pool).await
    }

    /// Refresh planner statistics so the ANN indexes are used well after a
    /// large load.
    pub async fn optimize(&self) -> Result<()> {
        info!("Optimizing database statistics");

        sqlx::query("ANALYZE")
            .execute(&self.pool)
            .await
            .context("Failed to analyze database")?;

        debug!("Database optimization completed");
        Ok(())
    }
}

#[async_trait]
impl DocStore for Database {
    async fn resolve_module(&self, name: &str, label: Option<&str>) -> Result<Uuid> {
        ModuleQueries::get_or_create(&self.pool, name, label, self.dimension).await
    }

    async fn insert_chunks(&self, docs: &[NewApiDoc]) -> Result<u64> {
        ApiDocQueries::insert_batch(&self.pool, docs).await
    }

    async fn refresh_module_embedding(&self, module_id: Uuid) -> Result<()> {
        ModuleQueries::refresh_embedding(&self.pool, module_id, self.dimension).await
    }
}
