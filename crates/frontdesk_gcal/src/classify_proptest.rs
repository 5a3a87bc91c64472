#[cfg(test)]
mod tests {
    use crate::classify::classify_parts;
    use proptest::prelude::*;

    proptest! {
        /// Any message embedding `invalid_grant` classifies as reauth, no
        /// matter what surrounds it or which status the provider attached.
        #[test]
        fn embedded_invalid_grant_always_reauth(
            prefix in "[a-zA-Z0-9 :,.]{0,40}",
            suffix in "[a-zA-Z0-9 :,.]{0,40}",
            status in proptest::option::of(100u16..600),
        ) {
            let message = format!("{}invalid_grant{}", prefix, suffix);
            let failure = classify_parts(status, &message);
            prop_assert!(failure.reauth_required);
            prop_assert!(failure.invalid_grant);
            prop_assert_eq!(failure.http_status, status);
        }

        /// Messages free of every trigger phrase never classify as reauth.
        #[test]
        fn trigger_free_messages_pass_through(
            message in "[a-z0-9 ]{0,60}",
            status in proptest::option::of(100u16..600),
        ) {
            prop_assume!(!message.contains("invalid_grant"));
            prop_assume!(!message.contains("google_reauth_required"));
            prop_assume!(!(message.contains("token")
                && (message.contains("expired") || message.contains("revoked"))));

            let failure = classify_parts(status, &message);
            prop_assert!(!failure.reauth_required);
        }
    }
}
