use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::{require_field, AppState};
use crate::crypto::{hash_password, verify_password};
use crate::db::models::User;
use crate::db::UserRepository;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub roll_no: Option<String>,
    pub department: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub message: String,
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub user: User,
}

/// Standard address grammar check: one local part, one domain with a dot.
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
        && !email.chars().any(char::is_whitespace)
}

/// Loose phone pattern: digits, `+`, `-`, spaces, parentheses, length 10-15.
fn is_valid_phone(phone: &str) -> bool {
    let len = phone.chars().count();

    (10..=15).contains(&len)
        && phone
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'))
}

/// POST /register
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<RegisterResponse>, AppError> {
    let Json(req) = payload.map_err(|_| AppError::Validation("Invalid JSON data".to_string()))?;

    let name = require_field(&req.name, "name")?;
    let email = require_field(&req.email, "email")?;
    let roll_no = require_field(&req.roll_no, "roll_no")?;
    let department = require_field(&req.department, "department")?;
    let phone = require_field(&req.phone, "phone")?;

    // The password is validated and hashed untrimmed.
    let password = req.password.as_deref().unwrap_or("");
    if password.trim().is_empty() {
        return Err(AppError::Validation("Field 'password' is required".to_string()));
    }

    if !is_valid_email(email) {
        return Err(AppError::Validation("Invalid email format".to_string()));
    }
    if !is_valid_phone(phone) {
        return Err(AppError::Validation("Invalid phone number format".to_string()));
    }
    if password.len() < 6 {
        return Err(AppError::Validation(
            "Password must be at least 6 characters long".to_string(),
        ));
    }

    // Collect every violated uniqueness constraint, not just the first.
    let mut errors = Vec::new();
    if UserRepository::email_exists(&state.db, email).await? {
        errors.push("Email already exists".to_string());
    }
    if UserRepository::roll_no_exists(&state.db, roll_no).await? {
        errors.push("Roll number already exists".to_string());
    }
    if UserRepository::phone_exists(&state.db, phone).await? {
        errors.push("Phone number already exists".to_string());
    }
    if !errors.is_empty() {
        return Err(AppError::Conflict(errors));
    }

    let password_hash = hash_password(password)?;

    // The unique indexes still win any race against the checks above; a
    // rejected insert comes back as the same 409 shape.
    let user = UserRepository::create(
        &state.db,
        name,
        email,
        roll_no,
        department,
        phone,
        &password_hash,
    )
    .await?;

    tracing::info!("registered user {} ({})", user.id, user.email);

    Ok(Json(RegisterResponse {
        success: true,
        message: "Registration successful".to_string(),
        user,
    }))
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let Json(req) = payload.map_err(|_| AppError::Validation("Invalid JSON data".to_string()))?;

    let (Some(email), Some(password)) = (req.email.as_deref(), req.password.as_deref()) else {
        return Err(AppError::Validation(
            "Email and password are required".to_string(),
        ));
    };
    let email = email.trim();

    // Unknown email and wrong password collapse into the same response.
    let user = UserRepository::get_by_email(&state.db, email)
        .await?
        .ok_or_else(|| AppError::Auth("Invalid email or password".to_string()))?;

    if !verify_password(password, &user.password)? {
        return Err(AppError::Auth("Invalid email or password".to_string()));
    }

    // Best-effort: a failed timestamp update must not fail the login.
    if let Err(err) = UserRepository::touch_last_login(&state.db, user.id).await {
        tracing::warn!("failed to update last_login for user {}: {}", user.id, err);
    }

    tracing::info!("user {} logged in", user.id);

    Ok(Json(LoginResponse {
        success: true,
        message: "Login successful".to_string(),
        user,
    }))
}
