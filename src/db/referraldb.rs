use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::db::DBClient;
use crate::models::referralmodel::{ReferralCode, ReferralRedemption};

#[async_trait]
pub trait ReferralExt {
    async fn create_referral_code(
        &self,
        code: &str,
        valid_until: DateTime<Utc>,
        created_by: Uuid,
    ) -> Result<ReferralCode, sqlx::Error>;

    async fn get_referral_code(&self, code: &str) -> Result<Option<ReferralCode>, sqlx::Error>;

    /// Stamp `revoked_at` on a live code. Returns rows affected: 0 means the
    /// code does not exist or was already revoked.
    async fn revoke_referral_code(&self, code: &str) -> Result<u64, sqlx::Error>;

    /// Codes that are neither revoked nor past their own validity.
    async fn get_active_referral_codes(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ReferralCode>, sqlx::Error>;

    async fn insert_redemption(
        &self,
        code: &str,
        user_id: Uuid,
        redeemed_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<ReferralRedemption, sqlx::Error>;

    async fn has_redeemed(&self, code: &str, user_id: Uuid) -> Result<bool, sqlx::Error>;

    /// The caller's most recent redemption, expired or not. Expiry is
    /// display data; access decisions go through the resolver.
    async fn get_latest_redemption(
        &self,
        user_id: Uuid,
    ) -> Result<Option<ReferralRedemption>, sqlx::Error>;
}

#[async_trait]
impl ReferralExt for DBClient {
    async fn create_referral_code(
        &self,
        code: &str,
        valid_until: DateTime<Utc>,
        created_by: Uuid,
    ) -> Result<ReferralCode, sqlx::Error> {
        sqlx::query_as::<_, ReferralCode>(
            r#"
            INSERT INTO referral_codes (code, valid_until, created_by)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(code)
        .bind(valid_until)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_referral_code(&self, code: &str) -> Result<Option<ReferralCode>, sqlx::Error> {
        sqlx::query_as::<_, ReferralCode>(r#"SELECT * FROM referral_codes WHERE code = $1"#)
            .bind(code)
            .fetch_optional(&self.pool)
            .await
    }

    async fn revoke_referral_code(&self, code: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE referral_codes
            SET revoked_at = NOW()
            WHERE code = $1 AND revoked_at IS NULL
            "#,
        )
        .bind(code)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn get_active_referral_codes(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ReferralCode>, sqlx::Error> {
        sqlx::query_as::<_, ReferralCode>(
            r#"
            SELECT * FROM referral_codes
            WHERE revoked_at IS NULL AND valid_until > $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
    }

    async fn insert_redemption(
        &self,
        code: &str,
        user_id: Uuid,
        redeemed_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<ReferralRedemption, sqlx::Error> {
        sqlx::query_as::<_, ReferralRedemption>(
            r#"
            INSERT INTO referral_redemptions (code, user_id, redeemed_at, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(code)
        .bind(user_id)
        .bind(redeemed_at)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await
    }

    async fn has_redeemed(&self, code: &str, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let existing = sqlx::query_as::<_, ReferralRedemption>(
            r#"SELECT * FROM referral_redemptions WHERE code = $1 AND user_id = $2"#,
        )
        .bind(code)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(existing.is_some())
    }

    async fn get_latest_redemption(
        &self,
        user_id: Uuid,
    ) -> Result<Option<ReferralRedemption>, sqlx::Error> {
        sqlx::query_as::<_, ReferralRedemption>(
            r#"
            SELECT * FROM referral_redemptions
            WHERE user_id = $1
            ORDER BY redeemed_at DESC LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }
}
