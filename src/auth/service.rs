use std::time::Duration;

use axum::extract::FromRef;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::dto::{
    AuthTokens, LoginRequest, OtpPending, Profile, PublicUser, RegisterRequest, UpdateMeRequest,
    VerifyLoginOtpRequest, VerifyRegisterOtpRequest,
};
use crate::auth::jwt::JwtKeys;
use crate::auth::otp::generate_code;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::repo::NewUser;
use crate::auth::validate;
use crate::error::ApiError;
use crate::state::AppState;

pub const OTP_SENT: &str = "OTP has been sent to your email";

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Mints a code, stores it (replacing any pending one) and hands it to the
/// mailer. A failed send rolls the stored code back so the challenge can be
/// retried from scratch.
async fn issue_otp(state: &AppState, email: &str) -> Result<(), ApiError> {
    let code = generate_code();
    let ttl = Duration::from_secs(state.config.otp.ttl_seconds);
    state.otp.put(email, &code, ttl).await?;
    if let Err(e) = state.mailer.send_otp(email, &code).await {
        warn!(email = %email, error = %e, "otp delivery failed, rolling back code");
        state.otp.remove(email).await?;
        return Err(ApiError::Delivery);
    }
    info!(email = %email, "otp issued");
    Ok(())
}

/// Starts a gated registration: validates the payload and issues the OTP
/// challenge. No account exists until the code is verified.
pub async fn register(state: &AppState, payload: RegisterRequest) -> Result<OtpPending, ApiError> {
    validate::validate_register(&payload).map_err(ApiError::Validation)?;
    let email = normalize_email(&payload.email);

    if state.users.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "register email already exists");
        return Err(ApiError::DuplicateEmail);
    }

    issue_otp(state, &email).await?;
    Ok(OtpPending { email })
}

/// Completes a gated registration: the OTP must verify first, then the
/// resubmitted payload is validated again and the account is created.
pub async fn verify_register_otp(
    state: &AppState,
    request: VerifyRegisterOtpRequest,
) -> Result<AuthTokens, ApiError> {
    let email = normalize_email(&request.profile.email);

    if !state
        .otp
        .verify_and_evict(&email, request.otp.trim())
        .await?
    {
        warn!(email = %email, "register otp rejected");
        return Err(ApiError::InvalidOtp);
    }

    let valid = validate::validate_register(&request.profile).map_err(ApiError::Validation)?;
    if state.users.find_by_email(&email).await?.is_some() {
        return Err(ApiError::DuplicateEmail);
    }

    let user = state
        .users
        .create(NewUser {
            full_name: request.profile.full_name.trim().to_string(),
            phone: request.profile.phone.trim().to_string(),
            email,
            password_hash: hash_password(&request.profile.password)?,
            date_of_birth: valid.date_of_birth,
            city: request.profile.city.trim().to_string(),
            gender: request.profile.gender.clone(),
            role: valid.role,
        })
        .await?;

    let chat_token = state.chat.provision(user.id, &user.full_name).await?;
    let access_token = JwtKeys::from_ref(state).sign(user.id)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(AuthTokens {
        access_token,
        token_type: "Bearer",
        chat_token,
        user: PublicUser::from(&user),
    })
}

/// Checks credentials and issues the OTP challenge. A missing account and a
/// wrong password fail identically so neither check leaks.
pub async fn login(state: &AppState, payload: LoginRequest) -> Result<OtpPending, ApiError> {
    validate::validate_login(&payload).map_err(ApiError::Validation)?;
    let email = normalize_email(&payload.email);

    let Some(user) = state.users.find_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(ApiError::InvalidCredentials);
    };
    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    issue_otp(state, &email).await?;
    Ok(OtpPending { email })
}

pub async fn verify_login_otp(
    state: &AppState,
    request: VerifyLoginOtpRequest,
) -> Result<AuthTokens, ApiError> {
    let email = normalize_email(&request.email);

    if !state
        .otp
        .verify_and_evict(&email, request.otp.trim())
        .await?
    {
        warn!(email = %email, "login otp rejected");
        return Err(ApiError::InvalidOtp);
    }

    // The account can vanish between login and verify.
    let Some(user) = state.users.find_by_email(&email).await? else {
        return Err(ApiError::UserNotFound);
    };

    let chat_token = state.chat.provision(user.id, &user.full_name).await?;
    let access_token = JwtKeys::from_ref(state).sign(user.id)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(AuthTokens {
        access_token,
        token_type: "Bearer",
        chat_token,
        user: PublicUser::from(&user),
    })
}

pub async fn get_me(state: &AppState, user_id: Uuid) -> Result<Profile, ApiError> {
    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or(ApiError::UserNotFound)?;
    Ok(Profile::from(&user))
}

pub async fn update_me(
    state: &AppState,
    user_id: Uuid,
    payload: UpdateMeRequest,
) -> Result<Profile, ApiError> {
    let patch = validate::validate_update(&payload).map_err(ApiError::Validation)?;
    if patch.is_empty() {
        return get_me(state, user_id).await;
    }

    let updated = state
        .users
        .update_profile(user_id, patch)
        .await
        .map_err(|e| {
            warn!(user_id = %user_id, error = %e, "profile update rejected");
            ApiError::UpdateFailed
        })?;

    let user = updated.ok_or(ApiError::UserNotFound)?;
    info!(user_id = %user.id, "profile updated");
    Ok(Profile::from(&user))
}
