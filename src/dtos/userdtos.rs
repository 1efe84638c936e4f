use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{premiummodels::UserSubscription, referralmodel::ReferralRedemption, usermodel::User};

use super::{premiumdtos::SubscriptionStatusDto, referraldtos::ReferralStatusDto};

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct RegisterUserDto {
    #[validate(length(min = 5, max = 63, message = "Principal must be between 5-63 characters"))]
    pub principal: String,

    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[validate(email(message = "Email is invalid"))]
    pub email: Option<String>,

    #[validate(
        length(min = 1, message = "Password is required"),
        length(min = 6, message = "Password must be at least 6 characters")
    )]
    pub password: String,

    #[validate(
        length(min = 1, message = "Confirm Password is required"),
        must_match(other = "password", message = "passwords do not match")
    )]
    #[serde(rename = "passwordConfirm")]
    pub password_confirm: String,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct LoginUserDto {
    #[validate(length(min = 1, message = "Principal is required"))]
    pub principal: String,
    #[validate(
        length(min = 1, message = "Password is required"),
        length(min = 6, message = "Password must be at least 6 characters")
    )]
    pub password: String,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpdateUserProfileDto {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[validate(email(message = "Email is invalid"))]
    pub email: Option<String>,
}

#[derive(Serialize, Deserialize, Validate)]
pub struct RequestQueryDto {
    #[validate(range(min = 1))]
    pub page: Option<usize>,
    #[validate(range(min = 1, max = 50))]
    pub limit: Option<usize>,
}

/// The caller-owned profile, with the display-only expiry facts attached.
/// The timestamps here never gate anything; access goes through the
/// resolved premium source.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserProfileDto {
    pub principal: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub role: String,
    #[serde(rename = "hasManualPremium")]
    pub has_manual_premium: bool,
    #[serde(rename = "termsAccepted")]
    pub terms_accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription: Option<SubscriptionStatusDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referral: Option<ReferralStatusDto>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl UserProfileDto {
    pub fn from_parts(
        user: &User,
        has_manual_premium: bool,
        subscription: Option<&UserSubscription>,
        referral: Option<&ReferralRedemption>,
    ) -> Self {
        UserProfileDto {
            principal: user.principal.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role.to_str().to_string(),
            has_manual_premium,
            terms_accepted: user.has_accepted_terms(),
            subscription: subscription.map(SubscriptionStatusDto::from_subscription),
            referral: referral.map(ReferralStatusDto::from_redemption),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserData {
    pub user: UserProfileDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponseDto {
    pub status: String,
    pub data: UserData,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserLoginResponseDto {
    pub status: String,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IsAdminResponseDto {
    pub status: String,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
}

#[derive(Serialize, Deserialize)]
pub struct Response {
    pub status: &'static str,
    pub message: String,
}
