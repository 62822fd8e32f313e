//! Property tests for session issuance

use aura_auth_core::SessionIssuer;
use aura_types::UserId;
use proptest::prelude::*;
use std::time::Duration;

const SECRET: &str = "proptest-secret-0123456789abcdef0123";
const TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

proptest! {
    /// Any issued token validates and recovers the same (user_id, email)
    #[test]
    fn roundtrip_recovers_identity(email in "[a-z]{1,16}@[a-z]{1,12}\\.[a-z]{2,4}") {
        let issuer = SessionIssuer::new(SECRET, TTL).unwrap();
        let user_id = UserId::new();

        let token = issuer.issue(user_id, &email).unwrap();
        let claims = issuer.validate(&token).unwrap();

        prop_assert_eq!(claims.user_id(), Some(user_id));
        prop_assert_eq!(claims.email, email);
    }

    /// Truncating the token anywhere invalidates it
    #[test]
    fn truncated_token_rejected(cut in 0usize..64) {
        let issuer = SessionIssuer::new(SECRET, TTL).unwrap();
        let token = issuer.issue(UserId::new(), "p@example.com").unwrap();

        let cut = cut.min(token.len().saturating_sub(1));
        let truncated = &token[..cut];
        prop_assert!(issuer.validate(truncated).is_err());
    }
}
