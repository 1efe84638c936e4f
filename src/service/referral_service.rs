use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::{
    db::referraldb::ReferralExt,
    models::{
        referralmodel::{ReferralCode, ReferralRedemption},
        usermodel::User,
    },
    service::{error::ServiceError, premium_service::PremiumService},
    utils::code_generator::generate_referral_code,
    AppState,
};

pub struct ReferralService;

impl ReferralService {
    pub fn validate_code(code: &str) -> Result<(), ServiceError> {
        let pattern = regex::Regex::new(r"^[A-Za-z0-9_-]{4,32}$")
            .map_err(|e| ServiceError::InvalidCode(e.to_string()))?;

        if !pattern.is_match(code) {
            return Err(ServiceError::InvalidCode(code.to_string()));
        }
        Ok(())
    }

    /// Whether a code can be redeemed by this caller right now. Ordering of
    /// the checks fixes which failure a caller sees when several apply:
    /// revocation trumps expiry trumps the per-caller conflict.
    pub fn check_redeemable(
        code: &ReferralCode,
        already_redeemed: bool,
        now: DateTime<Utc>,
    ) -> Result<(), ServiceError> {
        if code.is_revoked() {
            return Err(ServiceError::CodeRevoked(code.code.clone()));
        }
        if code.is_expired(now) {
            return Err(ServiceError::CodeExpired(code.code.clone()));
        }
        if already_redeemed {
            return Err(ServiceError::AlreadyRedeemed(code.code.clone()));
        }
        Ok(())
    }

    /// Issue a new code valid for `valid_for_ns` nanoseconds. The code
    /// string is generated when the admin does not supply one.
    pub async fn create_code(
        app_state: &Arc<AppState>,
        admin: &User,
        code: Option<String>,
        valid_for_ns: i64,
    ) -> Result<ReferralCode, ServiceError> {
        if valid_for_ns <= 0 {
            return Err(ServiceError::InvalidDuration(format!(
                "{} ns is not a positive window",
                valid_for_ns
            )));
        }

        let code = match code {
            Some(code) => {
                Self::validate_code(&code)?;
                code
            }
            None => generate_referral_code(),
        };

        let valid_until = Utc::now() + Duration::nanoseconds(valid_for_ns);

        let created = app_state
            .db_client
            .create_referral_code(&code, valid_until, admin.id)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation() {
                        return ServiceError::CodeExists(code.clone());
                    }
                }
                ServiceError::Database(e)
            })?;

        tracing::info!(
            "referral code {} created by {}, valid until {}",
            created.code,
            admin.id,
            created.valid_until
        );
        Ok(created)
    }

    /// Revoking stops future redemptions only; windows already redeemed
    /// keep running.
    pub async fn revoke_code(app_state: &Arc<AppState>, code: &str) -> Result<(), ServiceError> {
        Self::validate_code(code)?;

        let existing = app_state
            .db_client
            .get_referral_code(code)
            .await?
            .ok_or_else(|| ServiceError::CodeNotFound(code.to_string()))?;

        if existing.is_revoked() {
            return Err(ServiceError::CodeRevoked(code.to_string()));
        }

        app_state.db_client.revoke_referral_code(code).await?;
        tracing::info!("referral code {} revoked", code);
        Ok(())
    }

    pub async fn active_codes(
        app_state: &Arc<AppState>,
    ) -> Result<Vec<ReferralCode>, ServiceError> {
        let codes = app_state
            .db_client
            .get_active_referral_codes(Utc::now())
            .await?;
        Ok(codes)
    }

    /// Redeem a code for the caller. The access window starts now and runs
    /// for the configured duration, detached from the code's own expiry.
    pub async fn redeem(
        app_state: &Arc<AppState>,
        user: &User,
        code: &str,
    ) -> Result<ReferralRedemption, ServiceError> {
        Self::validate_code(code)?;

        let now = Utc::now();
        let referral_code = app_state
            .db_client
            .get_referral_code(code)
            .await?
            .ok_or_else(|| ServiceError::CodeNotFound(code.to_string()))?;

        let already_redeemed = app_state.db_client.has_redeemed(code, user.id).await?;
        Self::check_redeemable(&referral_code, already_redeemed, now)?;

        let expires_at = now + Duration::days(app_state.env.referral_access_days);

        let redemption = app_state
            .db_client
            .insert_redemption(code, user.id, now, expires_at)
            .await
            .map_err(|e| {
                // Lost a race with the caller's own duplicate request.
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation() {
                        return ServiceError::AlreadyRedeemed(code.to_string());
                    }
                }
                ServiceError::Database(e)
            })?;

        tracing::info!(
            "referral code {} redeemed by {}, access until {}",
            code,
            user.id,
            expires_at
        );

        PremiumService::invalidate_facts(app_state, Some(&user.id.to_string())).await;
        Ok(redemption)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn code(valid_until: DateTime<Utc>, revoked_at: Option<DateTime<Utc>>) -> ReferralCode {
        ReferralCode {
            code: "LAUNCH30".to_string(),
            valid_until,
            revoked_at,
            created_by: Uuid::nil(),
            created_at: Utc::now() - Duration::days(1),
        }
    }

    #[test]
    fn live_code_first_redemption_is_allowed() {
        let now = Utc::now();
        let live = code(now + Duration::days(7), None);
        assert!(ReferralService::check_redeemable(&live, false, now).is_ok());
    }

    #[test]
    fn expired_code_never_redeems() {
        let now = Utc::now();
        let expired = code(now - Duration::seconds(1), None);
        assert!(matches!(
            ReferralService::check_redeemable(&expired, false, now),
            Err(ServiceError::CodeExpired(_))
        ));
        // Expiry boundary is exclusive: validUntil == now is already expired.
        let boundary = code(now, None);
        assert!(matches!(
            ReferralService::check_redeemable(&boundary, false, now),
            Err(ServiceError::CodeExpired(_))
        ));
    }

    #[test]
    fn revoked_code_never_redeems_even_if_unexpired() {
        let now = Utc::now();
        let revoked = code(now + Duration::days(7), Some(now - Duration::hours(1)));
        assert!(matches!(
            ReferralService::check_redeemable(&revoked, false, now),
            Err(ServiceError::CodeRevoked(_))
        ));
        // Revocation also wins over expiry when both apply.
        let revoked_and_expired = code(now - Duration::days(1), Some(now - Duration::hours(1)));
        assert!(matches!(
            ReferralService::check_redeemable(&revoked_and_expired, true, now),
            Err(ServiceError::CodeRevoked(_))
        ));
    }

    #[test]
    fn second_redemption_by_same_caller_conflicts() {
        let now = Utc::now();
        let live = code(now + Duration::days(7), None);
        assert!(matches!(
            ReferralService::check_redeemable(&live, true, now),
            Err(ServiceError::AlreadyRedeemed(_))
        ));
    }

    #[test]
    fn code_shape_is_enforced() {
        assert!(ReferralService::validate_code("LAUNCH30").is_ok());
        assert!(ReferralService::validate_code("vip_week-1").is_ok());

        assert!(ReferralService::validate_code("abc").is_err());
        assert!(ReferralService::validate_code("has space").is_err());
        assert!(ReferralService::validate_code(&"x".repeat(33)).is_err());
    }
}
