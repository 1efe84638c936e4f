use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    db::{cache::CacheHelper, premiumdb::PremiumExt, referraldb::ReferralExt, userdb::UserExt},
    models::{
        premiummodels::{PremiumSource, SubscriptionPlan, UserSubscription},
        usermodel::{User, UserRole},
    },
    service::{
        access::{
            derive_premium_source, AccessFacts, FactState, ReferralSnapshot, SourceInputs,
            SubscriptionSnapshot,
        },
        error::ServiceError,
    },
    AppState,
};

pub struct PremiumService;

/// Admin diagnosis of an arbitrary principal.
#[derive(Debug)]
pub struct Diagnosis {
    pub premium_source: PremiumSource,
    pub profile: Option<DiagnosisProfile>,
}

#[derive(Debug)]
pub struct DiagnosisProfile {
    pub user: User,
    pub has_manual_grant: bool,
    pub subscription: Option<UserSubscription>,
    pub referral: Option<crate::models::referralmodel::ReferralRedemption>,
}

impl PremiumService {
    /// Principals are opaque identity strings owned by the identity
    /// collaborator; only the shape is checked here.
    pub fn validate_principal(principal: &str) -> Result<(), ServiceError> {
        let pattern = regex::Regex::new(r"^[a-z0-9][a-z0-9-]{4,62}$")
            .map_err(|e| ServiceError::InvalidPrincipal(e.to_string()))?;

        if !pattern.is_match(principal) {
            return Err(ServiceError::InvalidPrincipal(principal.to_string()));
        }
        Ok(())
    }

    /// Fetch the caller's three access facts, each independently. A failed
    /// read degrades that single fact to `Failed` so the resolver can fail
    /// closed instead of the whole request erroring out.
    pub async fn collect_facts(
        app_state: &Arc<AppState>,
        user: &User,
    ) -> AccessFacts {
        let subscription = match app_state.db_client.get_user_subscription(user.id).await {
            Ok(row) => FactState::Ready(row.map(subscription_snapshot)),
            Err(e) => {
                tracing::warn!("subscription fact fetch failed for {}: {}", user.id, e);
                FactState::Failed
            }
        };

        let referral = match app_state.db_client.get_latest_redemption(user.id).await {
            Ok(row) => FactState::Ready(row.map(referral_snapshot)),
            Err(e) => {
                tracing::warn!("referral fact fetch failed for {}: {}", user.id, e);
                FactState::Failed
            }
        };

        let premium_source = match app_state.db_client.has_manual_grant(&user.principal).await {
            Ok(has_manual_grant) => {
                let inputs = SourceInputs {
                    role: Some(user.role),
                    has_manual_grant,
                    subscription: subscription.ready().cloned().flatten(),
                    referral: referral.ready().cloned().flatten(),
                };
                FactState::Ready(derive_premium_source(&inputs, Utc::now()))
            }
            Err(e) => {
                tracing::warn!("premium source fetch failed for {}: {}", user.id, e);
                FactState::Failed
            }
        };

        AccessFacts {
            premium_source,
            subscription,
            referral,
        }
    }

    /// The authoritative tag for the caller. Unlike the gate path this
    /// propagates storage errors; the endpoint has nothing to fail closed
    /// over.
    pub async fn check_premium_status(
        app_state: &Arc<AppState>,
        user: &User,
    ) -> Result<PremiumSource, ServiceError> {
        let inputs = Self::source_inputs_for(app_state, user.id, &user.principal, Some(user.role))
            .await?;
        Ok(derive_premium_source(&inputs, Utc::now()))
    }

    pub async fn subscription_status(
        app_state: &Arc<AppState>,
        user_id: Uuid,
    ) -> Result<Option<UserSubscription>, ServiceError> {
        let subscription = app_state.db_client.get_user_subscription(user_id).await?;
        Ok(subscription)
    }

    /// Record the caller's paid window after a completed checkout. Stripe
    /// verification itself belongs to the payment collaborator; this only
    /// binds the session id to the caller.
    pub async fn activate_subscription(
        app_state: &Arc<AppState>,
        user: &User,
        session_id: &str,
        plan: SubscriptionPlan,
    ) -> Result<UserSubscription, ServiceError> {
        if let Some(existing) = app_state
            .db_client
            .get_subscription_by_session(session_id)
            .await?
        {
            if existing.user_id != user.id {
                return Err(ServiceError::SessionInUse(session_id.to_string()));
            }
            // Success-page re-poll of an already recorded session.
            return Ok(existing);
        }

        let starts_at = Utc::now();
        let expires_at = starts_at + plan.duration();

        let subscription = app_state
            .db_client
            .upsert_subscription(user.id, plan, session_id, starts_at, expires_at)
            .await?;

        tracing::info!(
            "subscription activated for {} ({}) until {}",
            user.id,
            plan.to_str(),
            expires_at
        );

        Self::invalidate_facts(app_state, Some(&user.id.to_string())).await;
        Ok(subscription)
    }

    /// Idempotent operator override: granting twice leaves state identical
    /// to granting once.
    pub async fn grant_manual_premium(
        app_state: &Arc<AppState>,
        admin: &User,
        principal: &str,
    ) -> Result<(), ServiceError> {
        // Routing already gates on the admin role; this keeps the contract
        // visible at the service boundary.
        if admin.role != UserRole::Admin {
            return Err(ServiceError::Unauthorized);
        }
        Self::validate_principal(principal)?;

        let inserted = app_state
            .db_client
            .insert_manual_grant(principal, admin.id)
            .await?;

        if inserted {
            tracing::info!("manual premium granted to {} by {}", principal, admin.id);
        } else {
            tracing::debug!("manual premium for {} already present", principal);
        }

        Self::invalidate_facts(app_state, None).await;
        Ok(())
    }

    /// Remove the manual override only. Stripe and referral access are
    /// independent grants and survive this.
    pub async fn revoke_manual_premium(
        app_state: &Arc<AppState>,
        admin: &User,
        principal: &str,
    ) -> Result<(), ServiceError> {
        if admin.role != UserRole::Admin {
            return Err(ServiceError::Unauthorized);
        }
        Self::validate_principal(principal)?;

        let removed = app_state.db_client.delete_manual_grant(principal).await?;
        if removed == 0 {
            return Err(ServiceError::ManualGrantNotFound(principal.to_string()));
        }

        tracing::info!("manual premium revoked for {} by {}", principal, admin.id);
        Self::invalidate_facts(app_state, None).await;
        Ok(())
    }

    /// Resolve an arbitrary principal's tag for the admin panel. `profile`
    /// is `None` when no profile exists yet, which is distinct from a
    /// profile with no access.
    pub async fn diagnose(
        app_state: &Arc<AppState>,
        principal: &str,
    ) -> Result<Diagnosis, ServiceError> {
        Self::validate_principal(principal)?;

        let user = app_state
            .db_client
            .get_user(None, Some(principal), None)
            .await?;

        let has_manual_grant = app_state.db_client.has_manual_grant(principal).await?;

        match user {
            Some(user) => {
                let subscription = app_state.db_client.get_user_subscription(user.id).await?;
                let referral = app_state.db_client.get_latest_redemption(user.id).await?;

                let inputs = SourceInputs {
                    role: Some(user.role),
                    has_manual_grant,
                    subscription: subscription.clone().map(subscription_snapshot),
                    referral: referral.clone().map(referral_snapshot),
                };

                Ok(Diagnosis {
                    premium_source: derive_premium_source(&inputs, Utc::now()),
                    profile: Some(DiagnosisProfile {
                        user,
                        has_manual_grant,
                        subscription,
                        referral,
                    }),
                })
            }
            None => {
                let inputs = SourceInputs {
                    role: None,
                    has_manual_grant,
                    subscription: None,
                    referral: None,
                };

                Ok(Diagnosis {
                    premium_source: derive_premium_source(&inputs, Utc::now()),
                    profile: None,
                })
            }
        }
    }

    async fn source_inputs_for(
        app_state: &Arc<AppState>,
        user_id: Uuid,
        principal: &str,
        role: Option<UserRole>,
    ) -> Result<SourceInputs, ServiceError> {
        let has_manual_grant = app_state.db_client.has_manual_grant(principal).await?;
        let subscription = app_state
            .db_client
            .get_user_subscription(user_id)
            .await?
            .map(subscription_snapshot);
        let referral = app_state
            .db_client
            .get_latest_redemption(user_id)
            .await?
            .map(referral_snapshot);

        Ok(SourceInputs {
            role,
            has_manual_grant,
            subscription,
            referral,
        })
    }

    /// Clear the cached fact set after an access-changing mutation so the
    /// next read cannot observe a stale mix. Cache loss is tolerable; a
    /// delete failure is logged and reads fall through to the database at
    /// TTL expiry.
    pub async fn invalidate_facts(app_state: &Arc<AppState>, user_tag: Option<&str>) {
        if let Some(redis) = &app_state.db_client.redis_client {
            if let Err(e) = CacheHelper::invalidate_premium_facts(redis, user_tag).await {
                tracing::error!("failed to invalidate premium fact cache: {}", e);
            }
        }
    }
}

fn subscription_snapshot(row: UserSubscription) -> SubscriptionSnapshot {
    SubscriptionSnapshot {
        plan: row.plan,
        expires_at: row.expires_at,
        stripe_session_id: row.stripe_session_id,
    }
}

fn referral_snapshot(row: crate::models::referralmodel::ReferralRedemption) -> ReferralSnapshot {
    ReferralSnapshot {
        code: row.code,
        expires_at: row.expires_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn principal_shape_is_enforced() {
        assert!(PremiumService::validate_principal("w3gef-xyaaa-aaaab-qacda-cai").is_ok());
        assert!(PremiumService::validate_principal("user-12345").is_ok());

        assert!(PremiumService::validate_principal("").is_err());
        assert!(PremiumService::validate_principal("ab").is_err());
        assert!(PremiumService::validate_principal("-leading-dash").is_err());
        assert!(PremiumService::validate_principal("Has Spaces").is_err());
        assert!(PremiumService::validate_principal("UPPERCASE-9999").is_err());
    }

    #[test]
    fn plan_windows() {
        assert_eq!(SubscriptionPlan::Monthly.duration(), chrono::Duration::days(30));
        assert_eq!(SubscriptionPlan::Yearly.duration(), chrono::Duration::days(365));
    }
}
