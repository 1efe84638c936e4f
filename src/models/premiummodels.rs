use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authoritative tag naming why a caller currently has premium access.
/// `None` is the only value that denies access; every other variant grants it.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PremiumSource {
    None,
    Stripe,
    Referral,
    Manual,
    Admin,
    Creator,
}

impl PremiumSource {
    pub fn to_str(&self) -> &str {
        match self {
            PremiumSource::None => "none",
            PremiumSource::Stripe => "stripe",
            PremiumSource::Referral => "referral",
            PremiumSource::Manual => "manual",
            PremiumSource::Admin => "admin",
            PremiumSource::Creator => "creator",
        }
    }

    pub fn grants_access(&self) -> bool {
        !matches!(self, PremiumSource::None)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "subscription_plan", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionPlan {
    Monthly,
    Yearly,
}

impl SubscriptionPlan {
    pub fn to_str(&self) -> &str {
        match self {
            SubscriptionPlan::Monthly => "monthly",
            SubscriptionPlan::Yearly => "yearly",
        }
    }

    pub fn duration(&self) -> chrono::Duration {
        match self {
            SubscriptionPlan::Monthly => chrono::Duration::days(30),
            SubscriptionPlan::Yearly => chrono::Duration::days(365),
        }
    }
}

/// Current paid window for a user. One row per user; re-activation replaces it.
/// Active iff `expires_at > now`.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct UserSubscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan: SubscriptionPlan,
    pub stripe_session_id: String,
    pub starts_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Operator override, keyed by principal so a grant may precede profile
/// creation. Presence of the row is the grant; there is no expiry.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct ManualPremiumGrant {
    pub principal: String,
    pub granted_by: Uuid,
    pub granted_at: DateTime<Utc>,
}
