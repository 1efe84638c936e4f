use std::sync::Arc;

use axum::{
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use validator::Validate;

use crate::{
    dtos::referraldtos::*,
    error::HttpError,
    middleware::{role_check, JWTAuthMiddeware},
    models::usermodel::UserRole,
    service::referral_service::ReferralService,
    AppState,
};

pub fn referral_handler() -> Router {
    let admin_routes = Router::new()
        .route(
            "/codes",
            get(get_active_referral_codes).post(create_referral_code),
        )
        .route("/codes/revoke", post(revoke_referral_code))
        .layer(middleware::from_fn(|state, req, next| {
            role_check(state, req, next, vec![UserRole::Admin])
        }));

    Router::new()
        .route("/redeem", post(redeem_referral_code))
        .nest("/admin", admin_routes)
}

pub async fn get_active_referral_codes(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let codes = ReferralService::active_codes(&app_state)
        .await
        .map_err(HttpError::from)?;

    Ok(Json(ReferralCodeListResponseDto {
        status: "success".to_string(),
        results: codes.len() as i64,
        codes: ReferralCodeStatusDto::from_codes(&codes),
    }))
}

pub async fn create_referral_code(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(admin): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateReferralCodeDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let code = ReferralService::create_code(&app_state, &admin.user, body.code, body.valid_for_ns)
        .await
        .map_err(HttpError::from)?;

    Ok(Json(CreateReferralCodeResponseDto {
        status: "success".to_string(),
        code: ReferralCodeStatusDto::from_code(&code),
    }))
}

pub async fn revoke_referral_code(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<RevokeReferralCodeDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    ReferralService::revoke_code(&app_state, &body.code)
        .await
        .map_err(HttpError::from)?;

    Ok(Json(crate::dtos::userdtos::Response {
        status: "success",
        message: "Referral code revoked".to_string(),
    }))
}

pub async fn redeem_referral_code(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<RedeemReferralCodeDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let redemption = ReferralService::redeem(&app_state, &user.user, &body.code)
        .await
        .map_err(HttpError::from)?;

    Ok(Json(RedeemResponseDto {
        status: "success".to_string(),
        message: "Referral code redeemed".to_string(),
        referral: ReferralStatusDto::from_redemption(&redemption),
    }))
}
