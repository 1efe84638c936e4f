use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::db::DBClient;
use crate::models::usermodel::{User, UserRole};

#[async_trait]
pub trait UserExt {
    /// Fetch a user by any one identifier. Passing several is allowed; the
    /// first match wins, mirroring how lookups are issued from middleware
    /// (by id) and from admin tooling (by principal).
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        principal: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error>;

    async fn save_user<T: Into<String> + Send>(
        &self,
        principal: T,
        name: T,
        email: Option<String>,
        password: T,
    ) -> Result<User, sqlx::Error>;

    async fn update_user_profile(
        &self,
        user_id: Uuid,
        name: String,
        email: Option<String>,
    ) -> Result<User, sqlx::Error>;

    async fn set_terms_accepted(
        &self,
        user_id: Uuid,
        accepted_at: DateTime<Utc>,
    ) -> Result<User, sqlx::Error>;

    async fn update_user_role(
        &self,
        target_id: Uuid,
        role: UserRole,
    ) -> Result<User, sqlx::Error>;
}

#[async_trait]
impl UserExt for DBClient {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        principal: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error> {
        let mut user: Option<User> = None;

        if let Some(user_id) = user_id {
            user = sqlx::query_as::<_, User>(r#"SELECT * FROM users WHERE id = $1"#)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        } else if let Some(principal) = principal {
            user = sqlx::query_as::<_, User>(r#"SELECT * FROM users WHERE principal = $1"#)
                .bind(principal)
                .fetch_optional(&self.pool)
                .await?;
        } else if let Some(email) = email {
            user = sqlx::query_as::<_, User>(r#"SELECT * FROM users WHERE email = $1"#)
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
        }

        Ok(user)
    }

    async fn save_user<T: Into<String> + Send>(
        &self,
        principal: T,
        name: T,
        email: Option<String>,
        password: T,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (principal, name, email, password, role)
            VALUES ($1, $2, $3, $4, 'user')
            RETURNING *
            "#,
        )
        .bind(principal.into())
        .bind(name.into())
        .bind(email)
        .bind(password.into())
        .fetch_one(&self.pool)
        .await
    }

    async fn update_user_profile(
        &self,
        user_id: Uuid,
        name: String,
        email: Option<String>,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = $1, email = $2, updated_at = NOW()
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn set_terms_accepted(
        &self,
        user_id: Uuid,
        accepted_at: DateTime<Utc>,
    ) -> Result<User, sqlx::Error> {
        // Idempotent: re-acceptance keeps the original timestamp.
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET terms_accepted_at = COALESCE(terms_accepted_at, $1), updated_at = NOW()
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(accepted_at)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_user_role(
        &self,
        target_id: Uuid,
        role: UserRole,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET role = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(role)
        .bind(target_id)
        .fetch_one(&self.pool)
        .await
    }
}
