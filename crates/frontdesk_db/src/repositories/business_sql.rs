//! SQL implementation of the business repository

use crate::error::DbError;
use crate::repositories::business::{Business, BusinessRepository, CalendarConnectionStatus};
use crate::DbClient;
use chrono::Utc;
use sqlx::Row;
use tracing::{debug, error, info};

/// SQL implementation of the business repository
#[derive(Debug, Clone)]
pub struct SqlBusinessRepository {
    db_client: DbClient,
}

impl SqlBusinessRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    fn row_to_business(row: sqlx::any::AnyRow) -> Business {
        let status: String = row
            .try_get("calendar_connection_status")
            .unwrap_or_else(|_| "unconnected".to_string());
        Business {
            id: row.try_get("id").unwrap_or_default(),
            name: row.try_get("name").unwrap_or_default(),
            timezone: row.try_get("timezone").ok(),
            calendar_refresh_token: row
                .try_get::<Option<String>, _>("calendar_refresh_token")
                .unwrap_or(None),
            calendar_connection_status: CalendarConnectionStatus::parse(&status),
            calendar_connected_at: row
                .try_get::<Option<String>, _>("calendar_connected_at")
                .unwrap_or(None),
            calendar_needs_reauth_at: row
                .try_get::<Option<String>, _>("calendar_needs_reauth_at")
                .unwrap_or(None),
        }
    }
}

impl BusinessRepository for SqlBusinessRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing businesses schema");

        let query = r#"
            CREATE TABLE IF NOT EXISTS businesses (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                timezone TEXT,
                calendar_refresh_token TEXT,
                calendar_connection_status TEXT NOT NULL DEFAULT 'unconnected',
                calendar_connected_at TEXT,
                calendar_needs_reauth_at TEXT
            )
        "#;

        self.db_client.execute(query).await?;

        info!("Businesses schema initialized successfully");
        Ok(())
    }

    async fn find(&self, business_id: &str) -> Result<Option<Business>, DbError> {
        let query = r#"
            SELECT id, name, timezone, calendar_refresh_token,
                   calendar_connection_status, calendar_connected_at,
                   calendar_needs_reauth_at
            FROM businesses
            WHERE id = $1
        "#;

        let result = sqlx::query(query)
            .bind(business_id)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to find business: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(result.map(Self::row_to_business))
    }

    async fn upsert(&self, business: Business) -> Result<Business, DbError> {
        debug!("Upserting business: {}", business.id);

        // Credential columns stay out of the conflict update on purpose;
        // only the OAuth exchange and the reauth path may touch them.
        let query = r#"
            INSERT INTO businesses (id, name, timezone, calendar_refresh_token,
                                    calendar_connection_status, calendar_connected_at,
                                    calendar_needs_reauth_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                timezone = excluded.timezone
        "#;

        sqlx::query(query)
            .bind(&business.id)
            .bind(&business.name)
            .bind(&business.timezone)
            .bind(&business.calendar_refresh_token)
            .bind(business.calendar_connection_status.as_str())
            .bind(&business.calendar_connected_at)
            .bind(&business.calendar_needs_reauth_at)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to upsert business: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(business)
    }

    async fn save_calendar_credential(
        &self,
        business_id: &str,
        refresh_token: &str,
    ) -> Result<(), DbError> {
        if refresh_token.is_empty() {
            // Overwriting a live credential with nothing is the bug class
            // this store exists to prevent.
            return Err(DbError::InvalidValue(
                "refusing to store an empty refresh token".to_string(),
            ));
        }

        debug!("Storing calendar credential for business: {}", business_id);

        let query = r#"
            UPDATE businesses
            SET calendar_refresh_token = $1,
                calendar_connection_status = 'connected',
                calendar_connected_at = $2,
                calendar_needs_reauth_at = NULL
            WHERE id = $3
        "#;

        let result = sqlx::query(query)
            .bind(refresh_token)
            .bind(Utc::now().to_rfc3339())
            .bind(business_id)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to store calendar credential: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("business: {}", business_id)));
        }

        info!("Calendar credential stored for business: {}", business_id);
        Ok(())
    }

    async fn mark_needs_reauth(&self, business_id: &str, clear_token: bool) -> Result<(), DbError> {
        debug!(
            "Marking business {} as needs_reauth (clear_token: {})",
            business_id, clear_token
        );

        let query = if clear_token {
            r#"
                UPDATE businesses
                SET calendar_connection_status = 'needs_reauth',
                    calendar_needs_reauth_at = $1,
                    calendar_refresh_token = NULL
                WHERE id = $2
            "#
        } else {
            r#"
                UPDATE businesses
                SET calendar_connection_status = 'needs_reauth',
                    calendar_needs_reauth_at = $1
                WHERE id = $2
            "#
        };

        let result = sqlx::query(query)
            .bind(Utc::now().to_rfc3339())
            .bind(business_id)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to mark business needs_reauth: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("business: {}", business_id)));
        }

        Ok(())
    }
}
