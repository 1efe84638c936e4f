use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::referralmodel::{ReferralCode, ReferralRedemption};

use super::premiumdtos::timestamp_ns;

#[derive(Debug, Validate, Deserialize)]
pub struct CreateReferralCodeDto {
    /// Omitted code means the service generates one.
    pub code: Option<String>,
    #[serde(rename = "validForNs")]
    pub valid_for_ns: i64,
}

#[derive(Debug, Validate, Deserialize)]
pub struct RevokeReferralCodeDto {
    #[validate(length(min = 1, message = "Code is required"))]
    pub code: String,
}

#[derive(Debug, Validate, Deserialize)]
pub struct RedeemReferralCodeDto {
    #[validate(length(min = 1, message = "Code is required"))]
    pub code: String,
}

/// Admin view of an issued code.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReferralCodeStatusDto {
    pub code: String,
    #[serde(rename = "validUntil")]
    pub valid_until: i64,
}

impl ReferralCodeStatusDto {
    pub fn from_code(code: &ReferralCode) -> Self {
        ReferralCodeStatusDto {
            code: code.code.clone(),
            valid_until: timestamp_ns(code.valid_until),
        }
    }

    pub fn from_codes(codes: &[ReferralCode]) -> Vec<ReferralCodeStatusDto> {
        codes.iter().map(ReferralCodeStatusDto::from_code).collect()
    }
}

/// A caller's redeemed window, as shown on the profile.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReferralStatusDto {
    pub code: String,
    #[serde(rename = "expiresAt")]
    pub expires_at: i64,
}

impl ReferralStatusDto {
    pub fn from_redemption(redemption: &ReferralRedemption) -> Self {
        ReferralStatusDto {
            code: redemption.code.clone(),
            expires_at: timestamp_ns(redemption.expires_at),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReferralCodeListResponseDto {
    pub status: String,
    pub codes: Vec<ReferralCodeStatusDto>,
    pub results: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateReferralCodeResponseDto {
    pub status: String,
    pub code: ReferralCodeStatusDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RedeemResponseDto {
    pub status: String,
    pub message: String,
    pub referral: ReferralStatusDto,
}
