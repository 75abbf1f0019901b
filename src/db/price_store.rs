use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{debug, info};

use crate::errors::AppError;
use crate::models::{format_date, PriceRecord, Token};

/// Persistence seam for collected prices. Collectors only see this trait,
/// which keeps the core loop testable against an in-memory double.
#[async_trait]
pub trait PriceStore: Send + Sync {
    /// Insert a (token, date) price. An already-present key is a success and
    /// the stored value is left untouched.
    async fn put(&self, record: &PriceRecord) -> Result<(), AppError>;

    /// Look up the stored price for a (token, date), if any.
    async fn get(&self, token: Token, date: NaiveDate) -> Result<Option<f64>, AppError>;
}

/// Postgres-backed store: one table per token, `date` (dd-mm-yyyy string)
/// as the primary key.
pub struct PgPriceStore {
    pool: PgPool,
}

impl PgPriceStore {
    /// Connect and make sure every per-token table exists. Both failures are
    /// fatal; nothing should start collecting against a broken store.
    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(Token::ALL.len() as u32 + 1)
            .connect(database_url)
            .await?;

        let store = Self { pool };
        store.ensure_tables().await?;
        Ok(store)
    }

    async fn ensure_tables(&self) -> Result<(), AppError> {
        for token in Token::ALL {
            info!("Creating the '{}' table if missing", token.table());
            sqlx::query(&format!(
                "CREATE TABLE IF NOT EXISTS {} (date VARCHAR(10) PRIMARY KEY, price DOUBLE PRECISION)",
                token.table()
            ))
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl PriceStore for PgPriceStore {
    async fn put(&self, record: &PriceRecord) -> Result<(), AppError> {
        debug!(
            "[INSERT] {}: {} - {}",
            record.token.table(),
            format_date(record.date),
            record.price
        );
        // DO NOTHING, not DO UPDATE: a stored price is immutable.
        sqlx::query(&format!(
            "INSERT INTO {} (date, price) VALUES ($1, $2) ON CONFLICT (date) DO NOTHING",
            record.token.table()
        ))
        .bind(format_date(record.date))
        .bind(record.price)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, token: Token, date: NaiveDate) -> Result<Option<f64>, AppError> {
        debug!("[SELECT] {}: {}", token.table(), format_date(date));
        let price = sqlx::query_scalar::<_, f64>(&format!(
            "SELECT price FROM {} WHERE date = $1",
            token.table()
        ))
        .bind(format_date(date))
        .fetch_optional(&self.pool)
        .await?;
        Ok(price)
    }
}
