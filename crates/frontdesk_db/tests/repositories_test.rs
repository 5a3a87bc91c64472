//! Repository integration tests against a scratch SQLite file.
//!
//! The Any driver gives every pooled connection its own database for
//! `:memory:` URLs, so these tests use a throwaway file instead.

use frontdesk_db::repositories::{
    AppointmentRepository, BusinessRepository, SqlAppointmentRepository, SqlBusinessRepository,
    SqlTaskRepository, TaskRepository,
};
use frontdesk_db::{DbClient, DbError};
use frontdesk_common::models::{
    Appointment, Business, CalendarConnectionStatus, CompanionTask,
};

struct ScratchDb {
    client: DbClient,
    path: std::path::PathBuf,
}

impl Drop for ScratchDb {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

async fn scratch_db() -> ScratchDb {
    let path = std::env::temp_dir().join(format!("frontdesk-test-{}.db", uuid::Uuid::new_v4()));
    let url = format!("sqlite://{}", path.display());
    let client = DbClient::from_url(&url).await.expect("scratch db");
    ScratchDb { client, path }
}

fn sample_business(id: &str) -> Business {
    Business {
        id: id.to_string(),
        name: "Bella Salon".to_string(),
        timezone: Some("America/New_York".to_string()),
        calendar_refresh_token: None,
        calendar_connection_status: CalendarConnectionStatus::Unconnected,
        calendar_connected_at: None,
        calendar_needs_reauth_at: None,
    }
}

#[tokio::test]
async fn credential_lifecycle() {
    let db = scratch_db().await;
    let repo = SqlBusinessRepository::new(db.client.clone());
    repo.init_schema().await.unwrap();

    repo.upsert(sample_business("biz-1")).await.unwrap();

    let found = repo.find("biz-1").await.unwrap().unwrap();
    assert_eq!(found.calendar_refresh_token, None);
    assert_eq!(
        found.calendar_connection_status,
        CalendarConnectionStatus::Unconnected
    );

    repo.save_calendar_credential("biz-1", "1//refresh-abc")
        .await
        .unwrap();

    let connected = repo.find("biz-1").await.unwrap().unwrap();
    assert_eq!(
        connected.calendar_refresh_token.as_deref(),
        Some("1//refresh-abc")
    );
    assert_eq!(
        connected.calendar_connection_status,
        CalendarConnectionStatus::Connected
    );
    assert!(connected.calendar_connected_at.is_some());
    assert_eq!(connected.calendar_needs_reauth_at, None);
}

#[tokio::test]
async fn empty_credential_is_rejected() {
    let db = scratch_db().await;
    let repo = SqlBusinessRepository::new(db.client.clone());
    repo.init_schema().await.unwrap();
    repo.upsert(sample_business("biz-2")).await.unwrap();
    repo.save_calendar_credential("biz-2", "1//live-token")
        .await
        .unwrap();

    let err = repo
        .save_calendar_credential("biz-2", "")
        .await
        .expect_err("empty token must be refused");
    assert!(matches!(err, DbError::InvalidValue(_)));

    // The stored credential survives the rejected write unchanged.
    let found = repo.find("biz-2").await.unwrap().unwrap();
    assert_eq!(
        found.calendar_refresh_token.as_deref(),
        Some("1//live-token")
    );
}

#[tokio::test]
async fn mark_needs_reauth_clears_token_by_default_policy() {
    let db = scratch_db().await;
    let repo = SqlBusinessRepository::new(db.client.clone());
    repo.init_schema().await.unwrap();
    repo.upsert(sample_business("biz-3")).await.unwrap();
    repo.save_calendar_credential("biz-3", "1//doomed")
        .await
        .unwrap();

    repo.mark_needs_reauth("biz-3", true).await.unwrap();

    let found = repo.find("biz-3").await.unwrap().unwrap();
    assert_eq!(found.calendar_refresh_token, None);
    assert_eq!(
        found.calendar_connection_status,
        CalendarConnectionStatus::NeedsReauth
    );
    assert!(found.calendar_needs_reauth_at.is_some());
}

#[tokio::test]
async fn mark_needs_reauth_can_keep_token() {
    let db = scratch_db().await;
    let repo = SqlBusinessRepository::new(db.client.clone());
    repo.init_schema().await.unwrap();
    repo.upsert(sample_business("biz-4")).await.unwrap();
    repo.save_calendar_credential("biz-4", "1//kept")
        .await
        .unwrap();

    repo.mark_needs_reauth("biz-4", false).await.unwrap();

    let found = repo.find("biz-4").await.unwrap().unwrap();
    assert_eq!(found.calendar_refresh_token.as_deref(), Some("1//kept"));
    assert_eq!(
        found.calendar_connection_status,
        CalendarConnectionStatus::NeedsReauth
    );
}

#[tokio::test]
async fn upsert_does_not_clobber_credentials() {
    let db = scratch_db().await;
    let repo = SqlBusinessRepository::new(db.client.clone());
    repo.init_schema().await.unwrap();
    repo.upsert(sample_business("biz-5")).await.unwrap();
    repo.save_calendar_credential("biz-5", "1//sticky")
        .await
        .unwrap();

    // A later profile update (rename) must not touch the credential.
    let mut renamed = sample_business("biz-5");
    renamed.name = "Bella Salon & Spa".to_string();
    repo.upsert(renamed).await.unwrap();

    let found = repo.find("biz-5").await.unwrap().unwrap();
    assert_eq!(found.name, "Bella Salon & Spa");
    assert_eq!(found.calendar_refresh_token.as_deref(), Some("1//sticky"));
    assert_eq!(
        found.calendar_connection_status,
        CalendarConnectionStatus::Connected
    );
}

#[tokio::test]
async fn appointment_roundtrip() {
    let db = scratch_db().await;
    let repo = SqlAppointmentRepository::new(db.client.clone());
    repo.init_schema().await.unwrap();

    let created = repo
        .create(Appointment {
            id: None,
            business_id: "biz-1".to_string(),
            customer_id: Some("cust-9".to_string()),
            customer_name: "Dana Fox".to_string(),
            customer_phone: Some("+15550100".to_string()),
            customer_email: "dana@example.com".to_string(),
            service: Some("Consultation".to_string()),
            start_time: "2025-03-01T10:00:00+00:00".to_string(),
            end_time: "2025-03-01T11:00:00+00:00".to_string(),
            event_id: "evt-123".to_string(),
            event_link: Some("https://calendar.example/evt-123".to_string()),
            meet_link: None,
            status: "confirmed".to_string(),
            created_at: None,
            updated_at: None,
        })
        .await
        .unwrap();

    assert!(created.id.is_some());
    assert!(created.created_at.is_some());

    let found = repo.find_by_event_id("evt-123").await.unwrap().unwrap();
    assert_eq!(found.customer_name, "Dana Fox");
    assert_eq!(found.business_id, "biz-1");

    let listed = repo.list_for_business("biz-1").await.unwrap();
    assert_eq!(listed.len(), 1);
    assert!(repo.find_by_event_id("evt-missing").await.unwrap().is_none());
}

#[tokio::test]
async fn task_roundtrip() {
    let db = scratch_db().await;
    let repo = SqlTaskRepository::new(db.client.clone());
    repo.init_schema().await.unwrap();

    let created = repo
        .create(CompanionTask {
            id: None,
            business_id: "biz-1".to_string(),
            title: "Consultation: Dana Fox".to_string(),
            due_at: "2025-03-01T10:00:00+00:00".to_string(),
            event_id: Some("evt-123".to_string()),
            meet_link: None,
            attendee_email: Some("dana@example.com".to_string()),
            created_at: None,
        })
        .await
        .unwrap();

    assert!(created.id.is_some());

    let listed = repo.list_for_business("biz-1").await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].title, "Consultation: Dana Fox");
}
