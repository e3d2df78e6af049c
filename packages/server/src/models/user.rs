use serde::{Deserialize, Serialize};

use super::shared::{MAX_TEXT_LENGTH, ValidationError};

/// Request body for user registration.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "user@example.com")]
    pub email: String,
    /// Password (5-128 characters).
    #[schema(example = "testpass123")]
    pub password: String,
    #[schema(example = "Test User")]
    #[serde(default)]
    pub name: String,
}

/// Request body for obtaining an access token.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct TokenRequest {
    #[schema(example = "user@example.com")]
    pub email: String,
    #[schema(example = "testpass123")]
    pub password: String,
}

/// Request body for `PATCH /user/me`.
#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateMeRequest {
    pub name: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = "user@example.com")]
    pub email: String,
    #[schema(example = "Test User")]
    pub name: String,
}

impl From<crate::entity::user::Model> for UserResponse {
    fn from(user: crate::entity::user::Model) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct TokenResponse {
    /// JWT bearer token.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
}

/// Lower-case the domain part of an email address; the local part is kept as typed.
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => email.to_string(),
    }
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    let valid = match email.rsplit_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid || email.chars().count() > MAX_TEXT_LENGTH {
        return Err(ValidationError::new("email", "Enter a valid email address"));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < 5 || password.len() > 128 {
        return Err(ValidationError::new(
            "password",
            "Password must be 5-128 characters",
        ));
    }
    Ok(())
}

pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().chars().count() > MAX_TEXT_LENGTH {
        return Err(ValidationError::new(
            "name",
            format!("name must be at most {MAX_TEXT_LENGTH} characters"),
        ));
    }
    Ok(())
}

pub fn validate_register_request(payload: &RegisterRequest) -> Result<(), ValidationError> {
    validate_email(&payload.email)?;
    validate_password(&payload.password)?;
    validate_name(&payload.name)?;
    Ok(())
}

pub fn validate_token_request(payload: &TokenRequest) -> Result<(), ValidationError> {
    if payload.email.trim().is_empty() {
        return Err(ValidationError::new("email", "Email must not be empty"));
    }
    if payload.password.is_empty() {
        return Err(ValidationError::new("password", "Password must not be empty"));
    }
    Ok(())
}

pub fn validate_update_me(payload: &UpdateMeRequest) -> Result<(), ValidationError> {
    if let Some(ref name) = payload.name {
        validate_name(name)?;
    }
    if let Some(ref password) = payload.password {
        validate_password(password)?;
    }
    Ok(())
}
