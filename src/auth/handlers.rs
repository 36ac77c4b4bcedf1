use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::auth::dto::{
    AuthTokens, LoginRequest, OtpPending, Profile, RegisterRequest, UpdateMeRequest,
    VerifyLoginOtpRequest, VerifyRegisterOtpRequest,
};
use crate::auth::jwt::AuthUser;
use crate::auth::service;
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/verify-register-otp", post(verify_register_otp))
        .route("/auth/verify-login-otp", post(verify_login_otp))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me).put(update_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<OtpPending>>), ApiError> {
    let pending = service::register(&state, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(service::OTP_SENT, pending)),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<OtpPending>>, ApiError> {
    let pending = service::login(&state, payload).await?;
    Ok(Json(ApiResponse::success(service::OTP_SENT, pending)))
}

#[instrument(skip(state, payload))]
pub async fn verify_register_otp(
    State(state): State<AppState>,
    Json(payload): Json<VerifyRegisterOtpRequest>,
) -> Result<Json<ApiResponse<AuthTokens>>, ApiError> {
    let tokens = service::verify_register_otp(&state, payload).await?;
    Ok(Json(ApiResponse::success("Registration successful", tokens)))
}

#[instrument(skip(state, payload))]
pub async fn verify_login_otp(
    State(state): State<AppState>,
    Json(payload): Json<VerifyLoginOtpRequest>,
) -> Result<Json<ApiResponse<AuthTokens>>, ApiError> {
    let tokens = service::verify_login_otp(&state, payload).await?;
    Ok(Json(ApiResponse::success("Login successful", tokens)))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ApiResponse<Profile>>, ApiError> {
    let profile = service::get_me(&state, user_id).await?;
    Ok(Json(ApiResponse::success("Profile retrieved", profile)))
}

#[instrument(skip(state, payload))]
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdateMeRequest>,
) -> Result<Json<ApiResponse<Profile>>, ApiError> {
    let profile = service::update_me(&state, user_id, payload).await?;
    Ok(Json(ApiResponse::success("Profile updated", profile)))
}
