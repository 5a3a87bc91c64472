#[cfg(test)]
mod tests {
    use crate::classify::{classify, classify_parts, REAUTH_ERROR_CODE};
    use crate::service::GcalError;

    #[test]
    fn invalid_grant_is_reauth_regardless_of_status() {
        for status in [None, Some(400), Some(401), Some(500)] {
            let failure = classify_parts(status, "invalid_grant: Bad Request");
            assert!(failure.reauth_required, "status {:?}", status);
            assert!(failure.invalid_grant);
            assert_eq!(failure.http_status, status);
        }
    }

    #[test]
    fn expired_or_revoked_token_phrasing_is_reauth() {
        let expired = classify_parts(Some(401), "Token has been expired or revoked.");
        assert!(expired.reauth_required);
        assert!(!expired.invalid_grant);

        let revoked = classify_parts(None, "the refresh token was revoked by the user");
        assert!(revoked.reauth_required);
    }

    #[test]
    fn internal_sentinel_is_reauth() {
        let failure = classify_parts(None, REAUTH_ERROR_CODE);
        assert!(failure.reauth_required);
        assert!(!failure.invalid_grant);
    }

    #[test]
    fn other_errors_pass_through_with_status_and_message() {
        let failure = classify_parts(Some(503), "Backend Error");
        assert!(!failure.reauth_required);
        assert!(!failure.invalid_grant);
        assert_eq!(failure.http_status, Some(503));
        assert_eq!(failure.message, "Backend Error");
    }

    #[test]
    fn expired_without_token_context_is_not_reauth() {
        // "expired" alone can describe a sync token or a page cursor.
        let failure = classify_parts(Some(410), "Sync window expired, perform full sync");
        assert!(!failure.reauth_required);
    }

    #[test]
    fn missing_credential_classifies_as_reauth() {
        let failure = classify(&GcalError::NoCredential);
        assert!(failure.reauth_required);
        assert_eq!(failure.http_status, Some(401));
    }

    #[test]
    fn validation_errors_never_classify_as_reauth() {
        let failure = classify(&GcalError::Validation("customer_name is required".into()));
        assert!(!failure.reauth_required);
    }
}
