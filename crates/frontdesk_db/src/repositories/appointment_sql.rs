//! SQL implementation of the appointment repository

use crate::error::DbError;
use crate::repositories::appointment::{Appointment, AppointmentRepository};
use crate::DbClient;
use chrono::Utc;
use sqlx::Row;
use tracing::{debug, error};

/// SQL implementation of the appointment repository
#[derive(Debug, Clone)]
pub struct SqlAppointmentRepository {
    db_client: DbClient,
}

impl SqlAppointmentRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    fn row_to_appointment(row: sqlx::any::AnyRow) -> Appointment {
        Appointment {
            id: row.try_get("id").ok(),
            business_id: row.try_get("business_id").unwrap_or_default(),
            customer_id: row.try_get::<Option<String>, _>("customer_id").unwrap_or(None),
            customer_name: row.try_get("customer_name").unwrap_or_default(),
            customer_phone: row
                .try_get::<Option<String>, _>("customer_phone")
                .unwrap_or(None),
            customer_email: row.try_get("customer_email").unwrap_or_default(),
            service: row.try_get::<Option<String>, _>("service").unwrap_or(None),
            start_time: row.try_get("start_time").unwrap_or_default(),
            end_time: row.try_get("end_time").unwrap_or_default(),
            event_id: row.try_get("event_id").unwrap_or_default(),
            event_link: row.try_get::<Option<String>, _>("event_link").unwrap_or(None),
            meet_link: row.try_get::<Option<String>, _>("meet_link").unwrap_or(None),
            status: row
                .try_get("status")
                .unwrap_or_else(|_| "confirmed".to_string()),
            created_at: row.try_get::<Option<String>, _>("created_at").unwrap_or(None),
            updated_at: row.try_get::<Option<String>, _>("updated_at").unwrap_or(None),
        }
    }
}

impl AppointmentRepository for SqlAppointmentRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing appointments schema");

        let query = r#"
            CREATE TABLE IF NOT EXISTS appointments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                business_id TEXT NOT NULL,
                customer_id TEXT,
                customer_name TEXT NOT NULL,
                customer_phone TEXT,
                customer_email TEXT NOT NULL,
                service TEXT,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                event_id TEXT NOT NULL,
                event_link TEXT,
                meet_link TEXT,
                status TEXT NOT NULL DEFAULT 'confirmed',
                created_at TEXT,
                updated_at TEXT
            )
        "#;

        self.db_client.execute(query).await?;
        Ok(())
    }

    async fn create(&self, appointment: Appointment) -> Result<Appointment, DbError> {
        debug!(
            "Creating appointment for business {} / event {}",
            appointment.business_id, appointment.event_id
        );

        let now = Utc::now().to_rfc3339();

        let query = r#"
            INSERT INTO appointments (business_id, customer_id, customer_name,
                                      customer_phone, customer_email, service,
                                      start_time, end_time, event_id, event_link,
                                      meet_link, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING id
        "#;

        let row = sqlx::query(query)
            .bind(&appointment.business_id)
            .bind(&appointment.customer_id)
            .bind(&appointment.customer_name)
            .bind(&appointment.customer_phone)
            .bind(&appointment.customer_email)
            .bind(&appointment.service)
            .bind(&appointment.start_time)
            .bind(&appointment.end_time)
            .bind(&appointment.event_id)
            .bind(&appointment.event_link)
            .bind(&appointment.meet_link)
            .bind(&appointment.status)
            .bind(&now)
            .bind(&now)
            .fetch_one(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to insert appointment: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(Appointment {
            id: row.try_get("id").ok(),
            created_at: Some(now.clone()),
            updated_at: Some(now),
            ..appointment
        })
    }

    async fn find_by_event_id(&self, event_id: &str) -> Result<Option<Appointment>, DbError> {
        let query = r#"
            SELECT * FROM appointments WHERE event_id = $1
        "#;

        let result = sqlx::query(query)
            .bind(event_id)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to find appointment: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(result.map(Self::row_to_appointment))
    }

    async fn list_for_business(&self, business_id: &str) -> Result<Vec<Appointment>, DbError> {
        let query = r#"
            SELECT * FROM appointments
            WHERE business_id = $1
            ORDER BY start_time DESC
        "#;

        let rows = sqlx::query(query)
            .bind(business_id)
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to list appointments: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(rows.into_iter().map(Self::row_to_appointment).collect())
    }
}
