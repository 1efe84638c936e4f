use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Admin-issued code. `valid_until` and `revoked_at` govern whether the code
/// is still redeemable; they have no effect on windows already redeemed.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct ReferralCode {
    pub code: String,
    pub valid_until: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl ReferralCode {
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.valid_until <= now
    }
}

/// A user's redemption of a code. The access window is fixed at redemption
/// time and lives independently of the code's own lifecycle.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct ReferralRedemption {
    pub id: Uuid,
    pub code: String,
    pub user_id: Uuid,
    pub redeemed_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
