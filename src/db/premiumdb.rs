use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::db::DBClient;
use crate::models::premiummodels::{ManualPremiumGrant, SubscriptionPlan, UserSubscription};

#[async_trait]
pub trait PremiumExt {
    /// Latest subscription row for the user, expired or not. Expiry is
    /// display data here; access decisions go through the resolver.
    async fn get_user_subscription(
        &self,
        user_id: Uuid,
    ) -> Result<Option<UserSubscription>, sqlx::Error>;

    async fn get_subscription_by_session(
        &self,
        stripe_session_id: &str,
    ) -> Result<Option<UserSubscription>, sqlx::Error>;

    async fn upsert_subscription(
        &self,
        user_id: Uuid,
        plan: SubscriptionPlan,
        stripe_session_id: &str,
        starts_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<UserSubscription, sqlx::Error>;

    /// Insert-or-ignore. Returns whether a new grant row was created;
    /// `false` means the grant already existed and nothing changed.
    async fn insert_manual_grant(
        &self,
        principal: &str,
        granted_by: Uuid,
    ) -> Result<bool, sqlx::Error>;

    /// Returns the number of rows removed (0 when no grant existed).
    async fn delete_manual_grant(&self, principal: &str) -> Result<u64, sqlx::Error>;

    async fn has_manual_grant(&self, principal: &str) -> Result<bool, sqlx::Error>;

    async fn get_manual_grant(
        &self,
        principal: &str,
    ) -> Result<Option<ManualPremiumGrant>, sqlx::Error>;
}

#[async_trait]
impl PremiumExt for DBClient {
    async fn get_user_subscription(
        &self,
        user_id: Uuid,
    ) -> Result<Option<UserSubscription>, sqlx::Error> {
        sqlx::query_as::<_, UserSubscription>(
            r#"
            SELECT * FROM user_subscriptions
            WHERE user_id = $1
            ORDER BY created_at DESC LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_subscription_by_session(
        &self,
        stripe_session_id: &str,
    ) -> Result<Option<UserSubscription>, sqlx::Error> {
        sqlx::query_as::<_, UserSubscription>(
            r#"SELECT * FROM user_subscriptions WHERE stripe_session_id = $1"#,
        )
        .bind(stripe_session_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn upsert_subscription(
        &self,
        user_id: Uuid,
        plan: SubscriptionPlan,
        stripe_session_id: &str,
        starts_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<UserSubscription, sqlx::Error> {
        sqlx::query_as::<_, UserSubscription>(
            r#"
            INSERT INTO user_subscriptions
            (user_id, plan, stripe_session_id, starts_at, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id) DO UPDATE
            SET plan = EXCLUDED.plan,
                stripe_session_id = EXCLUDED.stripe_session_id,
                starts_at = EXCLUDED.starts_at,
                expires_at = EXCLUDED.expires_at,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(plan)
        .bind(stripe_session_id)
        .bind(starts_at)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await
    }

    async fn insert_manual_grant(
        &self,
        principal: &str,
        granted_by: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO manual_premium_grants (principal, granted_by)
            VALUES ($1, $2)
            ON CONFLICT (principal) DO NOTHING
            "#,
        )
        .bind(principal)
        .bind(granted_by)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_manual_grant(&self, principal: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(r#"DELETE FROM manual_premium_grants WHERE principal = $1"#)
            .bind(principal)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn has_manual_grant(&self, principal: &str) -> Result<bool, sqlx::Error> {
        let grant = self.get_manual_grant(principal).await?;
        Ok(grant.is_some())
    }

    async fn get_manual_grant(
        &self,
        principal: &str,
    ) -> Result<Option<ManualPremiumGrant>, sqlx::Error> {
        sqlx::query_as::<_, ManualPremiumGrant>(
            r#"SELECT * FROM manual_premium_grants WHERE principal = $1"#,
        )
        .bind(principal)
        .fetch_optional(&self.pool)
        .await
    }
}
