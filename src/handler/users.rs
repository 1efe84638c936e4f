use std::sync::Arc;

use axum::{
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    db::{premiumdb::PremiumExt, referraldb::ReferralExt, userdb::UserExt},
    dtos::userdtos::*,
    error::HttpError,
    middleware::JWTAuthMiddeware,
    models::usermodel::UserRole,
    service::premium_service::PremiumService,
    AppState,
};

pub fn users_handler() -> Router {
    Router::new()
        .route("/me", get(get_me).put(update_me))
        .route("/me/is-admin", get(is_admin))
        .route("/terms/accept", post(accept_terms))
}

/// The caller's profile with display-only expiry facts attached. One of the
/// three cached fact reads; mutations that change access clear it together
/// with the subscription and premium-status reads.
pub async fn get_me(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let user = user.user;

    let has_manual_premium = app_state
        .db_client
        .has_manual_grant(&user.principal)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let subscription = app_state
        .db_client
        .get_user_subscription(user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let referral = app_state
        .db_client
        .get_latest_redemption(user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let response = UserResponseDto {
        status: "success".to_string(),
        data: UserData {
            user: UserProfileDto::from_parts(
                &user,
                has_manual_premium,
                subscription.as_ref(),
                referral.as_ref(),
            ),
        },
    };

    Ok(Json(response))
}

pub async fn is_admin(
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    Ok(Json(IsAdminResponseDto {
        status: "success".to_string(),
        is_admin: user.user.role == UserRole::Admin,
    }))
}

pub async fn update_me(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<UpdateUserProfileDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let user_id = user.user.id;

    app_state
        .db_client
        .update_user_profile(user_id, body.name, body.email)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    PremiumService::invalidate_facts(&app_state, Some(&user_id.to_string())).await;

    Ok(Json(Response {
        status: "success",
        message: "Profile updated successfully".to_string(),
    }))
}

pub async fn accept_terms(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let user_id = user.user.id;

    app_state
        .db_client
        .set_terms_accepted(user_id, Utc::now())
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    PremiumService::invalidate_facts(&app_state, Some(&user_id.to_string())).await;

    Ok(Json(Response {
        status: "success",
        message: "Terms of service accepted".to_string(),
    }))
}
