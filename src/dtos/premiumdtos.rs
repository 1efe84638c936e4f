use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::premiummodels::{SubscriptionPlan, UserSubscription};

use super::userdtos::UserProfileDto;

/// Wire timestamps are nanosecond epoch integers.
pub fn timestamp_ns(dt: DateTime<Utc>) -> i64 {
    dt.timestamp_nanos_opt().unwrap_or(i64::MAX)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubscriptionStatusDto {
    pub plan: String,
    #[serde(rename = "expiresAt")]
    pub expires_at: i64,
    #[serde(rename = "stripeSessionId")]
    pub stripe_session_id: String,
}

impl SubscriptionStatusDto {
    pub fn from_subscription(subscription: &UserSubscription) -> Self {
        SubscriptionStatusDto {
            plan: subscription.plan.to_str().to_string(),
            expires_at: timestamp_ns(subscription.expires_at),
            stripe_session_id: subscription.stripe_session_id.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubscriptionStatusResponseDto {
    pub status: String,
    pub subscription: Option<SubscriptionStatusDto>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PremiumStatusResponseDto {
    pub status: String,
    #[serde(rename = "premiumSource")]
    pub premium_source: String,
    #[serde(rename = "hasActiveAccess")]
    pub has_active_access: bool,
}

#[derive(Debug, Validate, Deserialize)]
pub struct ActivateSubscriptionDto {
    #[validate(length(min = 1, message = "Session id is required"))]
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub plan: SubscriptionPlan,
}

#[derive(Debug, Validate, Deserialize)]
pub struct PremiumPrincipalDto {
    #[validate(length(min = 1, message = "Principal is required"))]
    pub principal: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminDiagnosisResponseDto {
    pub status: String,
    #[serde(rename = "premiumSource")]
    pub premium_source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfileDto>,
}
