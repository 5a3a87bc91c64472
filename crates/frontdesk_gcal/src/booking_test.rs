#[cfg(test)]
mod tests {
    use crate::booking::{
        book_appointment, require_credential, surface_provider_error, validate_booking_request,
        BookAppointmentRequest,
    };
    use crate::resolver::{business_marker, CalendarResolver};
    use crate::service::mock::{MockCalendarProvider, MockMailSender};
    use crate::service::GcalError;
    use frontdesk_common::error::HttpStatusCode;
    use frontdesk_common::models::{
        Appointment, Business, CalendarConnectionStatus, CompanionTask,
    };
    use frontdesk_config::GcalConfig;
    use frontdesk_db::repositories::{
        AppointmentRepository, BusinessRepository, TaskRepository,
    };
    use frontdesk_db::DbError;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    // --- In-memory repositories ---

    #[derive(Default)]
    struct MemBusinesses {
        inner: Mutex<HashMap<String, Business>>,
    }

    impl MemBusinesses {
        fn with(business: Business) -> Self {
            let repo = Self::default();
            repo.inner
                .lock()
                .unwrap()
                .insert(business.id.clone(), business);
            repo
        }

        fn get(&self, business_id: &str) -> Option<Business> {
            self.inner.lock().unwrap().get(business_id).cloned()
        }
    }

    impl BusinessRepository for MemBusinesses {
        async fn init_schema(&self) -> Result<(), DbError> {
            Ok(())
        }

        async fn find(&self, business_id: &str) -> Result<Option<Business>, DbError> {
            Ok(self.get(business_id))
        }

        async fn upsert(&self, business: Business) -> Result<Business, DbError> {
            self.inner
                .lock()
                .unwrap()
                .insert(business.id.clone(), business.clone());
            Ok(business)
        }

        async fn save_calendar_credential(
            &self,
            business_id: &str,
            refresh_token: &str,
        ) -> Result<(), DbError> {
            let mut inner = self.inner.lock().unwrap();
            let business = inner
                .get_mut(business_id)
                .ok_or_else(|| DbError::NotFound(format!("business: {}", business_id)))?;
            business.calendar_refresh_token = Some(refresh_token.to_string());
            business.calendar_connection_status = CalendarConnectionStatus::Connected;
            business.calendar_needs_reauth_at = None;
            Ok(())
        }

        async fn mark_needs_reauth(
            &self,
            business_id: &str,
            clear_token: bool,
        ) -> Result<(), DbError> {
            let mut inner = self.inner.lock().unwrap();
            let business = inner
                .get_mut(business_id)
                .ok_or_else(|| DbError::NotFound(format!("business: {}", business_id)))?;
            business.calendar_connection_status = CalendarConnectionStatus::NeedsReauth;
            business.calendar_needs_reauth_at = Some("2025-03-01T00:00:00+00:00".to_string());
            if clear_token {
                business.calendar_refresh_token = None;
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemAppointments {
        inner: Mutex<Vec<Appointment>>,
        fail: AtomicBool,
    }

    impl AppointmentRepository for MemAppointments {
        async fn init_schema(&self) -> Result<(), DbError> {
            Ok(())
        }

        async fn create(&self, appointment: Appointment) -> Result<Appointment, DbError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(DbError::QueryError("disk full".to_string()));
            }
            let mut inner = self.inner.lock().unwrap();
            let stored = Appointment {
                id: Some(inner.len() as i64 + 1),
                ..appointment
            };
            inner.push(stored.clone());
            Ok(stored)
        }

        async fn find_by_event_id(&self, event_id: &str) -> Result<Option<Appointment>, DbError> {
            Ok(self
                .inner
                .lock()
                .unwrap()
                .iter()
                .find(|a| a.event_id == event_id)
                .cloned())
        }

        async fn list_for_business(&self, business_id: &str) -> Result<Vec<Appointment>, DbError> {
            Ok(self
                .inner
                .lock()
                .unwrap()
                .iter()
                .filter(|a| a.business_id == business_id)
                .cloned()
                .collect())
        }
    }

    #[derive(Default)]
    struct MemTasks {
        inner: Mutex<Vec<CompanionTask>>,
        fail: AtomicBool,
    }

    impl TaskRepository for MemTasks {
        async fn init_schema(&self) -> Result<(), DbError> {
            Ok(())
        }

        async fn create(&self, task: CompanionTask) -> Result<CompanionTask, DbError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(DbError::QueryError("tasks table locked".to_string()));
            }
            let mut inner = self.inner.lock().unwrap();
            let stored = CompanionTask {
                id: Some(inner.len() as i64 + 1),
                ..task
            };
            inner.push(stored.clone());
            Ok(stored)
        }

        async fn list_for_business(
            &self,
            business_id: &str,
        ) -> Result<Vec<CompanionTask>, DbError> {
            Ok(self
                .inner
                .lock()
                .unwrap()
                .iter()
                .filter(|t| t.business_id == business_id)
                .cloned()
                .collect())
        }
    }

    // --- Fixtures ---

    fn connected_business() -> Business {
        Business {
            id: "biz-1".to_string(),
            name: "Bella Salon".to_string(),
            timezone: Some("America/New_York".to_string()),
            calendar_refresh_token: Some("1//refresh".to_string()),
            calendar_connection_status: CalendarConnectionStatus::Connected,
            calendar_connected_at: Some("2025-01-01T00:00:00+00:00".to_string()),
            calendar_needs_reauth_at: None,
        }
    }

    fn booking_request() -> BookAppointmentRequest {
        BookAppointmentRequest {
            business_id: "biz-1".to_string(),
            customer_id: Some("cust-9".to_string()),
            customer_name: "Dana Fox".to_string(),
            customer_phone: Some("+15550100".to_string()),
            customer_email: "dana@example.com".to_string(),
            service: Some("Consultation".to_string()),
            start_time: "2025-03-01T10:00:00Z".to_string(),
            end_time: "2025-03-01T11:00:00Z".to_string(),
        }
    }

    fn resolver() -> CalendarResolver {
        CalendarResolver::new(&GcalConfig::default())
    }

    fn ts(value: &str) -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::parse_from_rfc3339(value)
            .unwrap()
            .with_timezone(&chrono::Utc)
    }

    // --- Tests ---

    #[tokio::test]
    async fn books_free_slot_end_to_end() {
        let provider = MockCalendarProvider::new();
        let businesses = MemBusinesses::with(connected_business());
        let appointments = MemAppointments::default();
        let tasks = MemTasks::default();
        let mailer = MockMailSender::new();
        let resolver = resolver();
        let business = connected_business();

        let outcome = book_appointment(
            &provider,
            &businesses,
            &appointments,
            &tasks,
            &mailer,
            &resolver,
            &business,
            booking_request(),
        )
        .await
        .unwrap();

        assert!(outcome.success);
        assert!(!outcome.event_id.is_empty());
        assert_eq!(outcome.appointment_id, Some(1));
        assert_eq!(outcome.task_id, Some(1));
        assert!(outcome.notification_sent);
        assert_eq!(outcome.message, "Appointment booked and confirmation sent.");

        assert_eq!(provider.event_inserts.load(Ordering::SeqCst), 1);
        let recorded = appointments
            .find_by_event_id(&outcome.event_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(recorded.customer_name, "Dana Fox");
        assert_eq!(mailer.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn detected_conflict_blocks_insertion() {
        let provider = MockCalendarProvider::new();
        let calendar_id = "cal-biz1";
        provider.add_calendar(
            calendar_id,
            "Bella Salon Appointments",
            Some(&business_marker("biz-1")),
        );
        provider.add_event(
            calendar_id,
            "evt-existing",
            "Existing booking",
            None,
            ts("2025-03-01T10:00:00Z"),
            ts("2025-03-01T11:00:00Z"),
        );

        let businesses = MemBusinesses::with(connected_business());
        let appointments = MemAppointments::default();
        let tasks = MemTasks::default();
        let mailer = MockMailSender::new();
        let resolver = resolver();
        let business = connected_business();

        // Overlapping slot: [10:30, 11:30) against the existing [10:00, 11:00).
        let mut request = booking_request();
        request.start_time = "2025-03-01T10:30:00Z".to_string();
        request.end_time = "2025-03-01T11:30:00Z".to_string();

        let error = book_appointment(
            &provider,
            &businesses,
            &appointments,
            &tasks,
            &mailer,
            &resolver,
            &business,
            request,
        )
        .await
        .unwrap_err();

        match &error {
            GcalError::Conflict(conflicts) => {
                assert_eq!(conflicts.len(), 1);
                assert_eq!(conflicts[0].event_id, "evt-existing");
            }
            other => panic!("expected conflict, got {:?}", other),
        }
        assert_eq!(error.status_code(), 409);

        // No insertion, no record, no mail.
        assert_eq!(provider.event_inserts.load(Ordering::SeqCst), 0);
        assert_eq!(provider.event_count(calendar_id), 1);
        assert!(appointments.list_for_business("biz-1").await.unwrap().is_empty());
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn validation_failures_never_reach_the_provider() {
        let provider = MockCalendarProvider::new();
        provider.set_failure("provider must not be called");
        let businesses = MemBusinesses::with(connected_business());
        let appointments = MemAppointments::default();
        let tasks = MemTasks::default();
        let mailer = MockMailSender::new();
        let resolver = resolver();
        let business = connected_business();

        let mut request = booking_request();
        request.customer_email = String::new();

        let error = book_appointment(
            &provider,
            &businesses,
            &appointments,
            &tasks,
            &mailer,
            &resolver,
            &business,
            request,
        )
        .await
        .unwrap_err();

        assert!(matches!(error, GcalError::Validation(_)));
        assert_eq!(error.status_code(), 400);
    }

    #[test]
    fn malformed_times_fail_validation() {
        let mut request = booking_request();
        request.start_time = "tomorrow at noon".to_string();
        assert!(matches!(
            validate_booking_request(&request),
            Err(GcalError::TimeParseError(_))
        ));

        let mut request = booking_request();
        request.end_time = request.start_time.clone();
        assert!(matches!(
            validate_booking_request(&request),
            Err(GcalError::Validation(_))
        ));
    }

    #[test]
    fn missing_credential_is_a_credential_error_not_a_validation_one() {
        // The request itself is valid...
        assert!(validate_booking_request(&booking_request()).is_ok());

        // ...so the tokenless business surfaces as the dedicated
        // credential error, mapped to 401.
        let mut business = connected_business();
        business.calendar_refresh_token = None;
        let error = require_credential(&business).unwrap_err();
        assert!(matches!(error, GcalError::NoCredential));
        assert_eq!(error.status_code(), 401);
    }

    #[tokio::test]
    async fn notification_failure_is_flagged_not_fatal() {
        let provider = MockCalendarProvider::new();
        let businesses = MemBusinesses::with(connected_business());
        let appointments = MemAppointments::default();
        let tasks = MemTasks::default();
        let mailer = MockMailSender::failing();
        let resolver = resolver();
        let business = connected_business();

        let outcome = book_appointment(
            &provider,
            &businesses,
            &appointments,
            &tasks,
            &mailer,
            &resolver,
            &business,
            booking_request(),
        )
        .await
        .unwrap();

        assert!(outcome.success);
        assert!(!outcome.notification_sent);
        assert_eq!(
            outcome.message,
            "Appointment booked. Confirmation email could not be sent."
        );
        assert_eq!(provider.event_inserts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn task_failure_does_not_fail_the_booking() {
        let provider = MockCalendarProvider::new();
        let businesses = MemBusinesses::with(connected_business());
        let appointments = MemAppointments::default();
        let tasks = MemTasks::default();
        tasks.fail.store(true, Ordering::SeqCst);
        let mailer = MockMailSender::new();
        let resolver = resolver();
        let business = connected_business();

        let outcome = book_appointment(
            &provider,
            &businesses,
            &appointments,
            &tasks,
            &mailer,
            &resolver,
            &business,
            booking_request(),
        )
        .await
        .unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.task_id, None);
        assert!(outcome.notification_sent);
    }

    #[tokio::test]
    async fn persistence_failure_is_fatal_but_the_event_remains() {
        let provider = MockCalendarProvider::new();
        let businesses = MemBusinesses::with(connected_business());
        let appointments = MemAppointments::default();
        appointments.fail.store(true, Ordering::SeqCst);
        let tasks = MemTasks::default();
        let mailer = MockMailSender::new();
        let resolver = resolver();
        let business = connected_business();

        let error = book_appointment(
            &provider,
            &businesses,
            &appointments,
            &tasks,
            &mailer,
            &resolver,
            &business,
            booking_request(),
        )
        .await
        .unwrap_err();

        assert!(matches!(error, GcalError::Storage(_)));
        // Intentional accepted inconsistency: the provider event exists
        // without a local record, and no compensating delete happens.
        assert_eq!(provider.event_inserts.load(Ordering::SeqCst), 1);
        // Followups never ran.
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn reauth_classified_failure_clears_the_credential() {
        let businesses = MemBusinesses::with(connected_business());

        let surfaced = surface_provider_error(
            &businesses,
            "biz-1",
            GcalError::Auth("invalid_grant: Token has been expired or revoked.".to_string()),
        )
        .await;

        assert!(matches!(surfaced, GcalError::ReauthRequired));
        assert_eq!(surfaced.status_code(), 401);

        let business = businesses.get("biz-1").unwrap();
        assert_eq!(business.calendar_refresh_token, None);
        assert_eq!(
            business.calendar_connection_status,
            CalendarConnectionStatus::NeedsReauth
        );
    }

    #[tokio::test]
    async fn transient_failure_keeps_the_credential() {
        let businesses = MemBusinesses::with(connected_business());

        let surfaced = surface_provider_error(
            &businesses,
            "biz-1",
            GcalError::Auth("Backend Error".to_string()),
        )
        .await;

        assert!(matches!(surfaced, GcalError::Auth(_)));
        assert_eq!(surfaced.status_code(), 500);

        let business = businesses.get("biz-1").unwrap();
        assert_eq!(business.calendar_refresh_token.as_deref(), Some("1//refresh"));
        assert_eq!(
            business.calendar_connection_status,
            CalendarConnectionStatus::Connected
        );
    }
}
