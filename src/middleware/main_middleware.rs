use std::sync::Arc;

use axum::{
    body::Body,
    extract::Request,
    http::{header, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Extension, Json,
};

use axum_extra::extract::cookie::CookieJar;
use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    db::{
        cache::{CacheHelper, FACT_CACHE_TTL},
        userdb::UserExt,
    },
    error::{ErrorMessage, HttpError},
    middleware::cache_invalidation::{
        invalidate_cache_for_request, should_cache_request, CacheInvalidationConfig,
    },
    models::{premiummodels::PremiumSource, usermodel::{User, UserRole}},
    service::{
        access::{resolve_access, AccessDecision},
        premium_service::PremiumService,
    },
    utils::token,
    AppState,
};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JWTAuthMiddeware {
    pub user: User,
}

/// Resolved gate outcome, available to handlers behind the premium gate.
#[derive(Debug, Clone, Copy)]
pub struct PremiumAccess {
    pub source: PremiumSource,
}

pub async fn auth(
    cookie_jar: CookieJar,
    Extension(app_state): Extension<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, HttpError> {
    let cookies = cookie_jar
        .get("token")
        .map(|cookie| cookie.value().to_string())
        .or_else(|| {
            req.headers()
                .get(header::AUTHORIZATION)
                .and_then(|auth_header| auth_header.to_str().ok())
                .and_then(|auth_value| {
                    if auth_value.starts_with("Bearer ") {
                        Some(auth_value[7..].to_owned())
                    } else {
                        None
                    }
                })
        });

    let token = cookies
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::TokenNotProvided.to_string()))?;

    let token_details = match token::decode_token(token, app_state.env.jwt_secret.as_bytes()) {
        Ok(token_details) => token_details,
        Err(_) => {
            return Err(HttpError::unauthorized(ErrorMessage::InvalidToken.to_string()));
        }
    };

    let user_id = uuid::Uuid::parse_str(&token_details)
        .map_err(|_| HttpError::unauthorized(ErrorMessage::InvalidToken.to_string()))?;

    let user = app_state
        .db_client
        .get_user(Some(user_id), None, None)
        .await
        .map_err(|_| HttpError::unauthorized(ErrorMessage::UserNoLongerExist.to_string()))?;

    let user = user
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::UserNoLongerExist.to_string()))?;

    req.extensions_mut().insert(JWTAuthMiddeware { user });

    Ok(next.run(req).await)
}

pub async fn role_check(
    Extension(_app_state): Extension<Arc<AppState>>,
    req: Request,
    next: Next,
    required_roles: Vec<UserRole>,
) -> Result<impl IntoResponse, HttpError> {
    let user = req
        .extensions()
        .get::<JWTAuthMiddeware>()
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::UserNotAuthenticated.to_string()))?;

    if !required_roles.contains(&user.user.role) {
        return Err(HttpError::new(
            ErrorMessage::PermissionDenied.to_string(),
            StatusCode::FORBIDDEN,
        ));
    }

    Ok(next.run(req).await)
}

/// Stands between authenticated callers and prediction content. Terms come
/// first with their own status so the client can route to the acceptance
/// flow; the paywall answer is only given once every fact has resolved.
pub async fn premium_gate(
    Extension(app_state): Extension<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, HttpError> {
    let user = req
        .extensions()
        .get::<JWTAuthMiddeware>()
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::UserNotAuthenticated.to_string()))?
        .user
        .clone();

    if !user.has_accepted_terms() {
        return Err(HttpError::forbidden(ErrorMessage::TermsNotAccepted.to_string()));
    }

    let facts = PremiumService::collect_facts(&app_state, &user).await;

    match resolve_access(&facts, chrono::Utc::now()) {
        AccessDecision::Granted(source) => {
            tracing::debug!("premium gate passed for {} via {}", user.id, source.to_str());
            req.extensions_mut().insert(PremiumAccess { source });
            Ok(next.run(req).await)
        }
        AccessDecision::Denied => Err(HttpError::payment_required(
            ErrorMessage::PremiumRequired.to_string(),
        )),
        // Server-side fact reads always settle, but the resolver contract
        // keeps the tri-state; never turn an unsettled read into a paywall.
        AccessDecision::Unknown => Err(HttpError::new(
            "Access facts are still resolving, please retry",
            StatusCode::SERVICE_UNAVAILABLE,
        )),
    }
}

/// Serves cached fact reads and clears the paired cache groups after
/// successful mutations. Also rate limits login attempts. Runs without the
/// auth layer, so the cache key user tag comes from decoding the token
/// directly.
pub async fn cache_and_rate_limit(req: Request, next: Next) -> Result<impl IntoResponse, HttpError> {
    let cache_config = CacheInvalidationConfig::new();

    let app_state = req
        .extensions()
        .get::<Arc<AppState>>()
        .cloned()
        .ok_or_else(|| HttpError::server_error("AppState missing from request extensions"))?;

    let path = req.uri().path().to_string();
    let method = req.method().clone();

    if let Some(redis_arc) = &app_state.db_client.redis_client {
        if method == Method::POST && path == "/api/auth/login" {
            let ip = req
                .headers()
                .get("x-forwarded-for")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("unknown")
                .to_string();

            let key = format!("rl:login:{}", ip);
            let mut conn = ConnectionManager::clone(redis_arc);
            let count: i64 = redis::cmd("INCR")
                .arg(&key)
                .query_async(&mut conn)
                .await
                .map_err(|e| HttpError::server_error(e.to_string()))?;
            if count == 1 {
                let _: () = redis::cmd("EXPIRE")
                    .arg(&key)
                    .arg(3600)
                    .query_async(&mut conn)
                    .await
                    .map_err(|e| HttpError::server_error(e.to_string()))?;
            }
            if count > 5 {
                return Err(HttpError::new(
                    "Too many attempts".to_string(),
                    StatusCode::TOO_MANY_REQUESTS,
                ));
            }
        }
    }

    if method == Method::GET {
        if !should_cache_request(method.as_str(), &path, &cache_config) {
            return Ok(next.run(req).await);
        }

        if let Some(redis_arc) = app_state.db_client.redis_client.clone() {
            let user_tag = resolve_user_tag(&req, &app_state);
            let cache_key = format!("cache:GET:{}:{}", path, user_tag);

            if let Ok(Some(cached_value)) = CacheHelper::get::<Value>(&redis_arc, &cache_key).await
            {
                return Ok(Json(cached_value).into_response());
            }

            // Not cached: run downstream and cache successful JSON responses.
            let response = next.run(req).await;
            let status = response.status();

            if status.is_success() {
                let is_json = response
                    .headers()
                    .get(header::CONTENT_TYPE)
                    .and_then(|ct| ct.to_str().ok())
                    .map(|ct| ct.contains("application/json"))
                    .unwrap_or(false);

                if is_json {
                    let (parts, body) = response.into_parts();
                    let bytes = axum::body::to_bytes(body, 64 * 1024).await.map_err(|_| {
                        HttpError::server_error("Failed to buffer response body for caching")
                    })?;

                    if let Ok(json_val) = serde_json::from_slice::<Value>(&bytes) {
                        let _ =
                            CacheHelper::set(&redis_arc, &cache_key, &json_val, FACT_CACHE_TTL)
                                .await;
                    }

                    return Ok(Response::from_parts(parts, Body::from(bytes)));
                }
            }

            return Ok(response);
        }

        return Ok(next.run(req).await);
    }

    // Mutations: run the handler, then clear the paired cache groups on
    // success so a stale "denied" view cannot follow a successful grant.
    let response = next.run(req).await;

    if response.status().is_success() {
        if let Some(redis_arc) = &app_state.db_client.redis_client {
            if let Err(e) =
                invalidate_cache_for_request(redis_arc, &cache_config, method.as_str(), &path)
                    .await
            {
                tracing::error!("Failed to invalidate cache: {:?}", e);
            }
        }
    }

    Ok(response)
}

fn resolve_user_tag(req: &Request, app_state: &Arc<AppState>) -> String {
    if let Some(auth) = req.extensions().get::<JWTAuthMiddeware>() {
        return auth.user.id.to_string();
    }

    let token_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer ").map(|s| s.to_string()))
        .or_else(|| {
            req.headers()
                .get(header::COOKIE)
                .and_then(|h| h.to_str().ok())
                .and_then(|cookie_header| {
                    cookie_header
                        .split(';')
                        .map(|s| s.trim())
                        .find(|s| s.starts_with("token="))
                        .and_then(|pair| pair.strip_prefix("token=").map(|s| s.to_string()))
                })
        });

    match token_value {
        Some(tok) => token::decode_token(tok, app_state.env.jwt_secret.as_bytes())
            .unwrap_or_else(|_| "anon".to_string()),
        None => "anon".to_string(),
    }
}
