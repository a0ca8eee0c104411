use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use motorpool_core::{DomainError, DomainResult, InviteCodeId, ShopId, UserId};

/// Length of a generated code: 4 random bytes, hex-encoded.
pub const CODE_LENGTH: usize = 8;

/// Upper bound accepted for stored codes.
pub const MAX_CODE_LENGTH: usize = 9;

const MAX_GENERATION_ATTEMPTS: u32 = 5;

/// A redeemable token granting membership in its shop, subject to
/// expiry and use-count limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteCode {
    pub id: InviteCodeId,
    pub shop_id: ShopId,
    /// Stored normalized (uppercase); lookups normalize their input.
    pub code: String,
    pub created_by: UserId,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_uses: Option<i32>,
    pub current_uses: i32,
    pub created_at: DateTime<Utc>,
}

/// Derived usability of a code at a point in time. Exhaustion is computed
/// from the counters, never stored as a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InviteUsability {
    Usable,
    Deactivated,
    Expired,
    Exhausted,
}

impl InviteCode {
    pub fn new(
        shop_id: ShopId,
        created_by: UserId,
        code: impl Into<String>,
        max_uses: Option<i32>,
        expires_at: Option<DateTime<Utc>>,
    ) -> DomainResult<Self> {
        let code = normalize_code(&code.into());
        if code.is_empty() || code.len() > MAX_CODE_LENGTH {
            return Err(DomainError::validation(format!(
                "invite code must be 1..={MAX_CODE_LENGTH} characters"
            )));
        }
        if let Some(max) = max_uses {
            if max < 1 {
                return Err(DomainError::validation("max_uses must be at least 1"));
            }
        }
        Ok(Self {
            id: InviteCodeId::new(),
            shop_id,
            code,
            created_by,
            is_active: true,
            expires_at,
            max_uses,
            current_uses: 0,
            created_at: Utc::now(),
        })
    }

    /// Usability at `now`. Deactivation wins over expiry, expiry over
    /// exhaustion, so callers report the strongest reason a code is dead.
    pub fn usability(&self, now: DateTime<Utc>) -> InviteUsability {
        if !self.is_active {
            return InviteUsability::Deactivated;
        }
        if let Some(expires_at) = self.expires_at {
            if now >= expires_at {
                return InviteUsability::Expired;
            }
        }
        if let Some(max_uses) = self.max_uses {
            if self.current_uses >= max_uses {
                return InviteUsability::Exhausted;
            }
        }
        InviteUsability::Usable
    }

    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.usability(now) == InviteUsability::Usable
    }
}

/// Normalize a user-supplied code for storage or lookup.
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Produce one candidate code: 4 random bytes, hex, uppercase.
///
/// The code space is small; callers must retry on collision with an
/// existing code (bounded by [`MAX_GENERATION_ATTEMPTS`]).
pub fn generate_code() -> String {
    let bytes: [u8; 4] = rand::random();
    format!(
        "{:02X}{:02X}{:02X}{:02X}",
        bytes[0], bytes[1], bytes[2], bytes[3]
    )
}

/// How many generation attempts a collision-retry loop should make before
/// giving up.
pub fn max_generation_attempts() -> u32 {
    MAX_GENERATION_ATTEMPTS
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn test_code(max_uses: Option<i32>, expires_at: Option<DateTime<Utc>>) -> InviteCode {
        InviteCode::new(ShopId::new(), UserId::new(), generate_code(), max_uses, expires_at)
            .unwrap()
    }

    #[test]
    fn fresh_code_is_usable() {
        let code = test_code(Some(3), None);
        assert_eq!(code.usability(Utc::now()), InviteUsability::Usable);
    }

    #[test]
    fn deactivated_code_is_not_usable() {
        let mut code = test_code(None, None);
        code.is_active = false;
        assert_eq!(code.usability(Utc::now()), InviteUsability::Deactivated);
    }

    #[test]
    fn code_expires_at_the_deadline() {
        let expires = Utc::now() + Duration::minutes(30);
        let code = test_code(None, Some(expires));
        assert_eq!(code.usability(expires - Duration::seconds(1)), InviteUsability::Usable);
        assert_eq!(code.usability(expires), InviteUsability::Expired);
        assert_eq!(code.usability(expires + Duration::seconds(1)), InviteUsability::Expired);
    }

    #[test]
    fn code_exhausts_at_max_uses() {
        let mut code = test_code(Some(2), None);
        code.current_uses = 1;
        assert_eq!(code.usability(Utc::now()), InviteUsability::Usable);
        code.current_uses = 2;
        assert_eq!(code.usability(Utc::now()), InviteUsability::Exhausted);
    }

    #[test]
    fn unlimited_code_never_exhausts() {
        let mut code = test_code(None, None);
        code.current_uses = 10_000;
        assert_eq!(code.usability(Utc::now()), InviteUsability::Usable);
    }

    #[test]
    fn deactivation_wins_over_expiry() {
        let mut code = test_code(Some(1), Some(Utc::now() - Duration::hours(1)));
        code.is_active = false;
        code.current_uses = 1;
        assert_eq!(code.usability(Utc::now()), InviteUsability::Deactivated);
    }

    #[test]
    fn new_normalizes_the_code() {
        let code = InviteCode::new(ShopId::new(), UserId::new(), " ab12cd34 ", None, None).unwrap();
        assert_eq!(code.code, "AB12CD34");
    }

    #[test]
    fn zero_max_uses_is_rejected() {
        match InviteCode::new(ShopId::new(), UserId::new(), "AB12CD34", Some(0), None) {
            Err(DomainError::Validation(msg)) => assert!(msg.contains("max_uses")),
            other => panic!("Expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn overlong_code_is_rejected() {
        let result = InviteCode::new(ShopId::new(), UserId::new(), "ABCDEF1234", None, None);
        assert!(result.is_err());
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            /// Generated codes are always 8 uppercase hex characters and
            /// already normalized.
            #[test]
            fn generated_codes_are_normalized_hex(_seed in 0u32..1024) {
                let code = generate_code();
                prop_assert_eq!(code.len(), CODE_LENGTH);
                prop_assert!(code.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
                prop_assert_eq!(normalize_code(&code), code);
            }

            /// Lookup normalization is case-insensitive: any casing of a code
            /// normalizes to the stored form.
            #[test]
            fn normalization_is_case_insensitive(raw in "[0-9a-fA-F]{8}") {
                let stored = normalize_code(&raw);
                prop_assert_eq!(normalize_code(&raw.to_lowercase()), stored.clone());
                prop_assert_eq!(normalize_code(&raw.to_uppercase()), stored);
            }
        }
    }
}
