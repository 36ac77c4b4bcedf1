use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::repo::User;
use crate::auth::validate::DATE_FORMAT;

/// Request body for user registration. Also resubmitted alongside the OTP,
/// since no account exists until the code is verified.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub full_name: String,
    pub phone: String,
    pub email: String,
    pub password: String,
    /// YYYY-MM-DD
    pub date_of_birth: String,
    pub city: String,
    pub gender: String,
    #[serde(default)]
    pub role: Option<String>,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Registration payload plus the code delivered out-of-band.
#[derive(Debug, Deserialize)]
pub struct VerifyRegisterOtpRequest {
    pub otp: String,
    #[serde(flatten)]
    pub profile: RegisterRequest,
}

#[derive(Debug, Deserialize)]
pub struct VerifyLoginOtpRequest {
    pub email: String,
    pub otp: String,
}

/// Profile patch. `password` and `role` are deliberately absent: whatever a
/// caller puts in the body, those fields cannot reach the store.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMeRequest {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub date_of_birth: Option<String>,
    pub city: Option<String>,
    pub gender: Option<String>,
}

/// Returned by register and login while the OTP challenge is pending.
#[derive(Debug, Serialize)]
pub struct OtpPending {
    pub email: String,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub role: String,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
        }
    }
}

/// Response returned after successful OTP verification.
#[derive(Debug, Serialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub token_type: &'static str,
    pub chat_token: String,
    pub user: PublicUser,
}

/// Own-profile projection for /me. Never carries password material.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: String,
    pub city: String,
    pub gender: String,
    pub role: String,
}

impl From<&User> for Profile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            date_of_birth: user
                .date_of_birth
                .format(DATE_FORMAT)
                .unwrap_or_default(),
            city: user.city.clone(),
            gender: user.gender.clone(),
            role: user.role.clone(),
        }
    }
}
