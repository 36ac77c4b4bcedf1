use lazy_static::lazy_static;
use regex::Regex;
use time::{format_description::FormatItem, macros::format_description, Date};

use crate::auth::dto::{LoginRequest, RegisterRequest, UpdateMeRequest};
use crate::auth::repo::ProfilePatch;
use crate::error::FieldErrors;

pub(crate) const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

const GENDERS: &[&str] = &["male", "female"];
const ROLES: &[&str] = &["client", "lawyer", "admin"];
pub(crate) const DEFAULT_ROLE: &str = "client";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn parse_date(raw: &str) -> Option<Date> {
    Date::parse(raw.trim(), DATE_FORMAT).ok()
}

fn push(errors: &mut FieldErrors, field: &str, message: &str) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.to_string());
}

/// Fields that only exist in validated form.
#[derive(Debug)]
pub(crate) struct ValidRegistration {
    pub date_of_birth: Date,
    pub role: String,
}

pub(crate) fn validate_register(req: &RegisterRequest) -> Result<ValidRegistration, FieldErrors> {
    let mut errors = FieldErrors::new();

    if req.full_name.trim().is_empty() {
        push(&mut errors, "fullName", "Full name is required");
    }
    if req.phone.trim().is_empty() {
        push(&mut errors, "phone", "Phone is required");
    }
    if !is_valid_email(req.email.trim()) {
        push(&mut errors, "email", "Invalid email address");
    }
    if req.password.len() < 6 {
        push(
            &mut errors,
            "password",
            "Password must be at least 6 characters",
        );
    }
    let date_of_birth = parse_date(&req.date_of_birth);
    if date_of_birth.is_none() {
        push(
            &mut errors,
            "dateOfBirth",
            "Invalid date of birth, expected YYYY-MM-DD",
        );
    }
    if req.city.trim().is_empty() {
        push(&mut errors, "city", "City is required");
    }
    if !GENDERS.contains(&req.gender.as_str()) {
        push(&mut errors, "gender", "Gender must be male or female");
    }
    let role = match req.role.as_deref() {
        None => DEFAULT_ROLE.to_string(),
        Some(role) if ROLES.contains(&role) => role.to_string(),
        Some(_) => {
            push(&mut errors, "role", "Role must be client, lawyer or admin");
            String::new()
        }
    };

    match (errors.is_empty(), date_of_birth) {
        (true, Some(date_of_birth)) => Ok(ValidRegistration {
            date_of_birth,
            role,
        }),
        _ => Err(errors),
    }
}

pub(crate) fn validate_login(req: &LoginRequest) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    if !is_valid_email(req.email.trim()) {
        push(&mut errors, "email", "Invalid email address");
    }
    if req.password.is_empty() {
        push(&mut errors, "password", "Password is required");
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates the present fields of a profile patch and produces the
/// store-level patch. Absent fields stay untouched.
pub(crate) fn validate_update(req: &UpdateMeRequest) -> Result<ProfilePatch, FieldErrors> {
    let mut errors = FieldErrors::new();
    let mut patch = ProfilePatch::default();

    if let Some(full_name) = &req.full_name {
        if full_name.trim().is_empty() {
            push(&mut errors, "fullName", "Full name is required");
        } else {
            patch.full_name = Some(full_name.trim().to_string());
        }
    }
    if let Some(phone) = &req.phone {
        if phone.trim().is_empty() {
            push(&mut errors, "phone", "Phone is required");
        } else {
            patch.phone = Some(phone.trim().to_string());
        }
    }
    if let Some(email) = &req.email {
        let email = email.trim().to_lowercase();
        if !is_valid_email(&email) {
            push(&mut errors, "email", "Invalid email address");
        } else {
            patch.email = Some(email);
        }
    }
    if let Some(raw) = &req.date_of_birth {
        match parse_date(raw) {
            Some(date) => patch.date_of_birth = Some(date),
            None => push(
                &mut errors,
                "dateOfBirth",
                "Invalid date of birth, expected YYYY-MM-DD",
            ),
        }
    }
    if let Some(city) = &req.city {
        if city.trim().is_empty() {
            push(&mut errors, "city", "City is required");
        } else {
            patch.city = Some(city.trim().to_string());
        }
    }
    if let Some(gender) = &req.gender {
        if GENDERS.contains(&gender.as_str()) {
            patch.gender = Some(gender.clone());
        } else {
            push(&mut errors, "gender", "Gender must be male or female");
        }
    }

    if errors.is_empty() {
        Ok(patch)
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_register() -> RegisterRequest {
        RegisterRequest {
            full_name: "Ada Lovelace".into(),
            phone: "+628123456789".into(),
            email: "ada@example.com".into(),
            password: "secret1".into(),
            date_of_birth: "1990-12-10".into(),
            city: "Jakarta".into(),
            gender: "female".into(),
            role: None,
        }
    }

    #[test]
    fn valid_registration_defaults_role_to_client() {
        let valid = validate_register(&valid_register()).expect("should validate");
        assert_eq!(valid.role, "client");
        assert_eq!(valid.date_of_birth.to_string(), "1990-12-10");
    }

    #[test]
    fn explicit_role_is_kept() {
        let mut req = valid_register();
        req.role = Some("lawyer".into());
        let valid = validate_register(&req).expect("should validate");
        assert_eq!(valid.role, "lawyer");
    }

    #[test]
    fn register_collects_one_error_list_per_field() {
        let req = RegisterRequest {
            full_name: " ".into(),
            phone: "".into(),
            email: "not-an-email".into(),
            password: "short".into(),
            date_of_birth: "10/12/1990".into(),
            city: "".into(),
            gender: "other".into(),
            role: Some("root".into()),
        };
        let errors = validate_register(&req).unwrap_err();
        for field in [
            "fullName",
            "phone",
            "email",
            "password",
            "dateOfBirth",
            "city",
            "gender",
            "role",
        ] {
            assert!(errors.contains_key(field), "missing errors for {field}");
        }
        assert_eq!(errors["password"], vec!["Password must be at least 6 characters"]);
    }

    #[test]
    fn login_requires_email_shape_and_password() {
        let errors = validate_login(&LoginRequest {
            email: "nope".into(),
            password: "".into(),
        })
        .unwrap_err();
        assert!(errors.contains_key("email"));
        assert!(errors.contains_key("password"));

        assert!(validate_login(&LoginRequest {
            email: "a@b.co".into(),
            password: "x".into(),
        })
        .is_ok());
    }

    #[test]
    fn update_patch_keeps_only_present_fields() {
        let patch = validate_update(&UpdateMeRequest {
            city: Some(" Bandung ".into()),
            email: Some("NEW@Example.COM".into()),
            ..Default::default()
        })
        .expect("should validate");
        assert_eq!(patch.city.as_deref(), Some("Bandung"));
        assert_eq!(patch.email.as_deref(), Some("new@example.com"));
        assert!(patch.full_name.is_none());
        assert!(patch.date_of_birth.is_none());
    }

    #[test]
    fn update_rejects_bad_gender_and_date() {
        let errors = validate_update(&UpdateMeRequest {
            gender: Some("unknown".into()),
            date_of_birth: Some("12-10-1990".into()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(errors.contains_key("gender"));
        assert!(errors.contains_key("dateOfBirth"));
    }
}
