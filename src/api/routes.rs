//! Health and credential issuance handlers

use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use super::extract::Payload;
use super::server::AppState;
use crate::auth::models::{SigninRequest, SignupRequest, UserView};
use crate::auth::{refresh_cookie, AuthUser, Issued};
use crate::error::{Error, Result};

// Health check

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// `{access, user}` plus the refresh cookie
fn issued_response(state: &AppState, status: StatusCode, issued: Issued) -> Result<Response> {
    let cookie = refresh_cookie(&issued.tokens.refresh, &state.cookies);
    let cookie = HeaderValue::from_str(&cookie.to_string())
        .map_err(|e| Error::Internal(format!("invalid cookie header: {e}")))?;

    let mut response = (status, Json(issued.response())).into_response();
    response.headers_mut().insert(SET_COOKIE, cookie);
    Ok(response)
}

// Auth routes

pub async fn signup(
    State(state): State<AppState>,
    Payload(req): Payload<SignupRequest>,
) -> Result<Response> {
    let issued = state.auth.signup(req).await?;
    issued_response(&state, StatusCode::CREATED, issued)
}

pub async fn signin(
    State(state): State<AppState>,
    Payload(req): Payload<SigninRequest>,
) -> Result<Response> {
    let issued = state.auth.signin(req).await?;
    issued_response(&state, StatusCode::OK, issued)
}

pub async fn me(State(state): State<AppState>, user: AuthUser) -> Result<Json<UserView>> {
    let user = state.auth.current_user(&user).await?;
    Ok(Json(user.view()))
}
