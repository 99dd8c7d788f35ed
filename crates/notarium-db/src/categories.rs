//! Category store implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};

use notarium_core::{
    Category, CategoryStore, CreateCategoryRequest, Error, Result, UpdateCategoryRequest,
};

/// PostgreSQL implementation of CategoryStore.
pub struct PgCategoryStore {
    pool: PgPool,
}

impl PgCategoryStore {
    /// Create a new PgCategoryStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Per-user name uniqueness, case-sensitive as stored. `exclude_id`
    /// ignores the row being renamed.
    async fn name_exists(&self, user_id: i64, name: &str, exclude_id: Option<i64>) -> Result<bool> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM category
             WHERE user_id = $1 AND name = $2 AND ($3::BIGINT IS NULL OR id <> $3))",
        )
        .bind(user_id)
        .bind(name)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)
    }
}

fn map_category(row: &sqlx::postgres::PgRow) -> Category {
    Category {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        color: row.get("color"),
        sort_order: row.get("sort_order"),
        created_at_utc: row.get("created_at_utc"),
    }
}

#[async_trait]
impl CategoryStore for PgCategoryStore {
    async fn list(&self, user_id: i64) -> Result<Vec<Category>> {
        let rows = sqlx::query(
            "SELECT id, user_id, name, color, sort_order, created_at_utc
             FROM category WHERE user_id = $1
             ORDER BY sort_order, id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(map_category).collect())
    }

    async fn create(&self, user_id: i64, req: CreateCategoryRequest) -> Result<i64> {
        let name = req.name.trim().to_string();
        if name.is_empty() {
            return Err(Error::Validation(
                "category name must not be empty".to_string(),
            ));
        }
        if self.name_exists(user_id, &name, None).await? {
            return Err(Error::BusinessRule(format!(
                "a category named '{}' already exists",
                name
            )));
        }

        let next_order: i32 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(sort_order), 0) + 1 FROM category WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        sqlx::query_scalar(
            "INSERT INTO category (user_id, name, color, sort_order, created_at_utc)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id",
        )
        .bind(user_id)
        .bind(&name)
        .bind(&req.color)
        .bind(next_order)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)
    }

    async fn update(
        &self,
        user_id: i64,
        category_id: i64,
        req: UpdateCategoryRequest,
    ) -> Result<()> {
        let name = req.name.trim().to_string();
        if name.is_empty() {
            return Err(Error::Validation(
                "category name must not be empty".to_string(),
            ));
        }
        if self.name_exists(user_id, &name, Some(category_id)).await? {
            return Err(Error::BusinessRule(format!(
                "a category named '{}' already exists",
                name
            )));
        }

        let affected = sqlx::query(
            "UPDATE category SET name = $1, color = $2, sort_order = $3
             WHERE id = $4 AND user_id = $5",
        )
        .bind(&name)
        .bind(&req.color)
        .bind(req.sort_order)
        .bind(category_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?
        .rows_affected();

        if affected == 0 {
            return Err(Error::NotFound(format!("category {}", category_id)));
        }
        Ok(())
    }

    async fn delete(&self, user_id: i64, category_id: i64) -> Result<()> {
        let owned: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM category WHERE id = $1 AND user_id = $2)",
        )
        .bind(category_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;
        if !owned {
            return Err(Error::NotFound(format!("category {}", category_id)));
        }

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        // Notes survive category deletion; only the reference is cleared.
        sqlx::query("UPDATE note SET category_id = NULL WHERE category_id = $1")
            .bind(category_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        sqlx::query("DELETE FROM category WHERE id = $1")
            .bind(category_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }
}
