use super::models::*;
use anyhow::{Context, Result};
use pgvector::Vector;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

pub struct ModuleQueries;

impl ModuleQueries {
    #[inline]
    pub async fn get_by_name(pool: &PgPool, name: &str) -> Result<Option<Module>> {
        sqlx::query_as::<_, Module>(
            r#"
            SELECT id, name, label, description, auth_type, categories, embedding
            FROM modules WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(pool)
        .await
        .context("Failed to get module by name")
    }

    /// Resolves a module by its unique name, creating a placeholder row when
    /// none exists. Concurrent callers racing on the same name converge on a
    /// single row: the insert ignores a name conflict and the loser re-reads.
    #[inline]
    pub async fn get_or_create(
        pool: &PgPool,
        name: &str,
        label: Option<&str>,
        dimension: usize,
    ) -> Result<Uuid> {
        if let Some(module) = Self::get_by_name(pool, name).await? {
            return Ok(module.id);
        }

        let id = Uuid::new_v4();
        let inserted = sqlx::query(
            r#"
            INSERT INTO modules (id, name, label, description, auth_type, categories, embedding)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(label)
        .bind("TEMPORARY: created automatically during documentation import")
        .bind("NONE")
        .bind(Vec::<String>::new())
        .bind(Vector::from(vec![0.0; dimension]))
        .execute(pool)
        .await
        .context("Failed to create module")?
        .rows_affected();

        if inserted > 0 {
            debug!("Created placeholder module {} ({})", name, id);
            return Ok(id);
        }

        Self::get_by_name(pool, name)
            .await?
            .map(|module| module.id)
            .ok_or_else(|| anyhow::anyhow!("Module {name} missing after insert conflict"))
    }

    /// Recomputes the module embedding as the element-wise mean of its
    /// chunks' embeddings. Modules without chunks get the zero vector.
    #[inline]
    pub async fn refresh_embedding(pool: &PgPool, module_id: Uuid, dimension: usize) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE modules
            SET embedding = COALESCE(
                (SELECT AVG(embedding) FROM api_docs WHERE module_id = $1),
                $2
            )
            WHERE id = $1
            "#,
        )
        .bind(module_id)
        .bind(Vector::from(vec![0.0; dimension]))
        .execute(pool)
        .await
        .context("Failed to refresh module embedding")?;

        debug!("Refreshed mean embedding for module {}", module_id);
        Ok(())
    }

    #[inline]
    pub async fn overviews(pool: &PgPool) -> Result<Vec<ModuleOverview>> {
        sqlx::query_as::<_, ModuleOverview>(
            r#"
            SELECT m.name,
                   m.label,
                   COUNT(d.id) AS doc_count,
                   (m.embedding IS NOT NULL) AS has_embedding
            FROM modules m
            LEFT JOIN api_docs d ON d.module_id = m.id
            GROUP BY m.id
            ORDER BY m.name
            "#,
        )
        .fetch_all(pool)
        .await
        .context("Failed to list module overviews")
    }
}

pub struct ApiDocQueries;

impl ApiDocQueries {
    /// Inserts staged chunks in a single transaction. Rows whose
    /// (module_id, chunk_id) pair already exists are dropped by the partial
    /// unique index; the returned count covers rows actually written.
    #[inline]
    pub async fn insert_batch(pool: &PgPool, docs: &[NewApiDoc]) -> Result<u64> {
        if docs.is_empty() {
            return Ok(0);
        }

        let mut transaction = pool
            .begin()
            .await
            .context("Failed to begin transaction for batch chunk insert")?;

        let mut inserted = 0u64;
        for doc in docs {
            let result = sqlx::query(
                r#"
                INSERT INTO api_docs (module_id, source_url, content, embedding, chunk_id)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (module_id, chunk_id) WHERE chunk_id IS NOT NULL DO NOTHING
                "#,
            )
            .bind(doc.module_id)
            .bind(&doc.source_url)
            .bind(&doc.content)
            .bind(&doc.embedding)
            .bind(&doc.chunk_id)
            .execute(&mut *transaction)
            .await
            .context("Failed to insert documentation chunk in batch")?;

            inserted += result.rows_affected();
        }

        transaction
            .commit()
            .await
            .context("Failed to commit batch chunk insert transaction")?;

        debug!(
            "Committed batch of {} chunks ({} inserted)",
            docs.len(),
            inserted
        );
        Ok(inserted)
    }

    #[inline]
    pub async fn list_for_module(pool: &PgPool, module_id: Uuid) -> Result<Vec<ApiDoc>> {
        sqlx::query_as::<_, ApiDoc>(
            r#"
            SELECT id, module_id, source_url, content, embedding, chunk_id
            FROM api_docs WHERE module_id = $1
            "#,
        )
        .bind(module_id)
        .fetch_all(pool)
        .await
        .context("Failed to list documentation chunks")
    }

    #[inline]
    pub async fn count_for_module(pool: &PgPool, module_id: Uuid) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM api_docs WHERE module_id = $1")
            .bind(module_id)
            .fetch_one(pool)
            .await
            .context("Failed to count documentation chunks")
    }
}

pub struct CatalogQueries;

impl CatalogQueries {
    #[inline]
    pub async fn counts(pool: &PgPool) -> Result<CatalogCounts> {
        let row = sqlx::query_as::<_, (i64, i64, i64, i64, i64)>(
            r#"
            SELECT (SELECT COUNT(*) FROM modules),
                   (SELECT COUNT(*) FROM api_docs),
                   (SELECT COUNT(*) FROM actions),
                   (SELECT COUNT(*) FROM triggers),
                   (SELECT COUNT(*) FROM connections)
            "#,
        )
        .fetch_one(pool)
        .await
        .context("Failed to count catalog rows")?;

        Ok(CatalogCounts {
            modules: row.0,
            api_docs: row.1,
            actions: row.2,
            triggers: row.3,
            connections: row.4,
        })
    }
}
