//! Postgres-backed order store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

use orderflow_core::{NewOrder, Order, OrderId};

use super::{OrderStore, OrderStoreError};

/// Order store on top of a sqlx connection pool.
///
/// The pool is `Send + Sync` and handles connection ownership; the insert is
/// a single statement, so a failed write leaves no partial order behind.
#[derive(Debug, Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str) -> Result<Self, OrderStoreError> {
        let pool = PgPool::connect(url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn ensure_schema(&self) -> Result<(), OrderStoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS orders (
                id BIGSERIAL PRIMARY KEY,
                item VARCHAR(255) NOT NULL,
                quantity BIGINT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("ensure_schema", e))?;

        Ok(())
    }

    async fn insert(&self, order: &NewOrder) -> Result<Order, OrderStoreError> {
        let row = sqlx::query(
            "INSERT INTO orders (item, quantity) VALUES ($1, $2) RETURNING id, created_at",
        )
        .bind(order.item())
        .bind(order.quantity())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert", e))?;

        let id: i64 = row
            .try_get("id")
            .map_err(|e| map_sqlx_error("insert", e))?;
        let created_at: DateTime<Utc> = row
            .try_get("created_at")
            .map_err(|e| map_sqlx_error("insert", e))?;

        Ok(Order {
            id: OrderId(id),
            item: order.item().to_string(),
            quantity: order.quantity(),
            created_at,
        })
    }
}

/// Map sqlx errors to `OrderStoreError` with enough context to diagnose.
fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> OrderStoreError {
    match err {
        sqlx::Error::Database(db_err) => OrderStoreError::new(
            operation,
            format!("database error: {}", db_err.message()),
        ),
        sqlx::Error::PoolClosed => OrderStoreError::new(operation, "connection pool closed"),
        other => OrderStoreError::new(operation, other.to_string()),
    }
}
