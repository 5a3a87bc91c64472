//! SQL implementation of the task repository

use crate::error::DbError;
use crate::repositories::task::{CompanionTask, TaskRepository};
use crate::DbClient;
use chrono::Utc;
use sqlx::Row;
use tracing::{debug, error};

/// SQL implementation of the task repository
#[derive(Debug, Clone)]
pub struct SqlTaskRepository {
    db_client: DbClient,
}

impl SqlTaskRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    fn row_to_task(row: sqlx::any::AnyRow) -> CompanionTask {
        CompanionTask {
            id: row.try_get("id").ok(),
            business_id: row.try_get("business_id").unwrap_or_default(),
            title: row.try_get("title").unwrap_or_default(),
            due_at: row.try_get("due_at").unwrap_or_default(),
            event_id: row.try_get::<Option<String>, _>("event_id").unwrap_or(None),
            meet_link: row.try_get::<Option<String>, _>("meet_link").unwrap_or(None),
            attendee_email: row
                .try_get::<Option<String>, _>("attendee_email")
                .unwrap_or(None),
            created_at: row.try_get::<Option<String>, _>("created_at").unwrap_or(None),
        }
    }
}

impl TaskRepository for SqlTaskRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing tasks schema");

        let query = r#"
            CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                business_id TEXT NOT NULL,
                title TEXT NOT NULL,
                due_at TEXT NOT NULL,
                event_id TEXT,
                meet_link TEXT,
                attendee_email TEXT,
                created_at TEXT
            )
        "#;

        self.db_client.execute(query).await?;
        Ok(())
    }

    async fn create(&self, task: CompanionTask) -> Result<CompanionTask, DbError> {
        debug!("Creating task for business {}", task.business_id);

        let now = Utc::now().to_rfc3339();

        let query = r#"
            INSERT INTO tasks (business_id, title, due_at, event_id, meet_link,
                               attendee_email, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
        "#;

        let row = sqlx::query(query)
            .bind(&task.business_id)
            .bind(&task.title)
            .bind(&task.due_at)
            .bind(&task.event_id)
            .bind(&task.meet_link)
            .bind(&task.attendee_email)
            .bind(&now)
            .fetch_one(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to insert task: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(CompanionTask {
            id: row.try_get("id").ok(),
            created_at: Some(now),
            ..task
        })
    }

    async fn list_for_business(&self, business_id: &str) -> Result<Vec<CompanionTask>, DbError> {
        let query = r#"
            SELECT * FROM tasks
            WHERE business_id = $1
            ORDER BY due_at ASC
        "#;

        let rows = sqlx::query(query)
            .bind(business_id)
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to list tasks: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(rows.into_iter().map(Self::row_to_task).collect())
    }
}
