use std::sync::Arc;

use axum::{
    extract::Path,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use validator::Validate;

use crate::{
    dtos::{premiumdtos::*, userdtos::UserProfileDto},
    error::HttpError,
    middleware::{role_check, JWTAuthMiddeware},
    models::usermodel::UserRole,
    service::premium_service::PremiumService,
    AppState,
};

pub fn premium_handler() -> Router {
    let admin_routes = Router::new()
        .route("/grant", post(grant_manual_premium))
        .route("/revoke", post(revoke_manual_premium))
        .route("/diagnosis/:principal", get(admin_premium_diagnosis))
        .layer(middleware::from_fn(|state, req, next| {
            role_check(state, req, next, vec![UserRole::Admin])
        }));

    Router::new()
        .route("/subscription", get(check_subscription_status))
        .route("/subscription/activate", post(activate_subscription))
        .route("/status", get(check_premium_status))
        .nest("/admin", admin_routes)
}

pub async fn check_subscription_status(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let subscription = PremiumService::subscription_status(&app_state, user.user.id)
        .await
        .map_err(HttpError::from)?;

    Ok(Json(SubscriptionStatusResponseDto {
        status: "success".to_string(),
        subscription: subscription
            .as_ref()
            .map(SubscriptionStatusDto::from_subscription),
    }))
}

/// The authoritative tag for the caller. The paired boolean is derived from
/// the tag and nothing else.
pub async fn check_premium_status(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let source = PremiumService::check_premium_status(&app_state, &user.user)
        .await
        .map_err(HttpError::from)?;

    Ok(Json(PremiumStatusResponseDto {
        status: "success".to_string(),
        premium_source: source.to_str().to_string(),
        has_active_access: source.grants_access(),
    }))
}

pub async fn activate_subscription(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<ActivateSubscriptionDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let subscription = PremiumService::activate_subscription(
        &app_state,
        &user.user,
        &body.session_id,
        body.plan,
    )
    .await
    .map_err(HttpError::from)?;

    Ok(Json(SubscriptionStatusResponseDto {
        status: "success".to_string(),
        subscription: Some(SubscriptionStatusDto::from_subscription(&subscription)),
    }))
}

pub async fn grant_manual_premium(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(admin): Extension<JWTAuthMiddeware>,
    Json(body): Json<PremiumPrincipalDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    PremiumService::grant_manual_premium(&app_state, &admin.user, &body.principal)
        .await
        .map_err(HttpError::from)?;

    Ok(Json(crate::dtos::userdtos::Response {
        status: "success",
        message: "Manual premium access granted".to_string(),
    }))
}

pub async fn revoke_manual_premium(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(admin): Extension<JWTAuthMiddeware>,
    Json(body): Json<PremiumPrincipalDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    PremiumService::revoke_manual_premium(&app_state, &admin.user, &body.principal)
        .await
        .map_err(HttpError::from)?;

    Ok(Json(crate::dtos::userdtos::Response {
        status: "success",
        message: "Manual premium access revoked".to_string(),
    }))
}

/// Read-only: resolves an arbitrary principal the same way the gate would.
/// A missing `user` field means no profile exists yet, which is not the
/// same as a profile with no access.
pub async fn admin_premium_diagnosis(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(principal): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let diagnosis = PremiumService::diagnose(&app_state, &principal)
        .await
        .map_err(HttpError::from)?;

    Ok(Json(AdminDiagnosisResponseDto {
        status: "success".to_string(),
        premium_source: diagnosis.premium_source.to_str().to_string(),
        user: diagnosis.profile.map(|profile| {
            UserProfileDto::from_parts(
                &profile.user,
                profile.has_manual_grant,
                profile.subscription.as_ref(),
                profile.referral.as_ref(),
            )
        }),
    }))
}
