//! Request schemas. Each check yields a typed value or field-level errors.

use axum::{extract::rejection::JsonRejection, Json};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    auth::dto::{SignInBody, SignUpBody},
    error::{AppError, FieldError},
    users::{
        dto::UpdateUserBody,
        repo_types::{Role, UserChanges},
    },
};

pub const NAME_MIN: usize = 2;
pub const NAME_MAX: usize = 255;
pub const EMAIL_MAX: usize = 255;
pub const PASSWORD_MIN: usize = 8;
pub const PASSWORD_MAX: usize = 128;

pub type Validated<T> = Result<T, Vec<FieldError>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUp {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignIn {
    pub email: String,
    pub password: String,
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Unwraps a JSON body, turning malformed payloads into a `body` field error.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::Validation(vec![FieldError::new("body", rejection.body_text())]))
}

fn string_field<'a>(
    field: &str,
    value: Option<&'a Value>,
    required: bool,
    errors: &mut Vec<FieldError>,
) -> Option<&'a str> {
    match value {
        None | Some(Value::Null) => {
            if required {
                errors.push(FieldError::new(field, "Required"));
            }
            None
        }
        Some(Value::String(s)) => Some(s.as_str()),
        Some(_) => {
            errors.push(FieldError::new(field, "Expected string"));
            None
        }
    }
}

fn check_name(raw: &str, errors: &mut Vec<FieldError>) -> Option<String> {
    let name = raw.trim();
    let len = name.chars().count();
    if len < NAME_MIN {
        errors.push(FieldError::new(
            "name",
            format!("Name must be at least {NAME_MIN} characters long"),
        ));
        None
    } else if len > NAME_MAX {
        errors.push(FieldError::new(
            "name",
            format!("Name must be at most {NAME_MAX} characters long"),
        ));
        None
    } else {
        Some(name.to_string())
    }
}

fn check_email(raw: &str, errors: &mut Vec<FieldError>) -> Option<String> {
    let email = raw.trim().to_lowercase();
    if email.chars().count() > EMAIL_MAX {
        errors.push(FieldError::new(
            "email",
            format!("Email must be at most {EMAIL_MAX} characters long"),
        ));
        None
    } else if !is_valid_email(&email) {
        errors.push(FieldError::new("email", "Invalid email address"));
        None
    } else {
        Some(email)
    }
}

fn check_password(raw: &str, errors: &mut Vec<FieldError>) -> Option<String> {
    let len = raw.chars().count();
    if len < PASSWORD_MIN {
        errors.push(FieldError::new(
            "password",
            format!("Password must be at least {PASSWORD_MIN} characters long"),
        ));
        None
    } else if len > PASSWORD_MAX {
        errors.push(FieldError::new(
            "password",
            format!("Password must be at most {PASSWORD_MAX} characters long"),
        ));
        None
    } else {
        Some(raw.to_string())
    }
}

fn check_role(raw: &str, errors: &mut Vec<FieldError>) -> Option<Role> {
    match raw.parse::<Role>() {
        Ok(role) => Some(role),
        Err(()) => {
            errors.push(FieldError::new("role", "Role must be one of: user, admin"));
            None
        }
    }
}

pub fn sign_up(body: &SignUpBody) -> Validated<SignUp> {
    let mut errors = Vec::new();

    let name = string_field("name", body.name.as_ref(), true, &mut errors)
        .and_then(|v| check_name(v, &mut errors));
    let email = string_field("email", body.email.as_ref(), true, &mut errors)
        .and_then(|v| check_email(v, &mut errors));
    let password = string_field("password", body.password.as_ref(), true, &mut errors)
        .and_then(|v| check_password(v, &mut errors));
    let role = match string_field("role", body.role.as_ref(), false, &mut errors) {
        Some(v) => check_role(v, &mut errors),
        None => Some(Role::default()),
    };

    match (name, email, password, role) {
        (Some(name), Some(email), Some(password), Some(role)) if errors.is_empty() => Ok(SignUp {
            name,
            email,
            password,
            role,
        }),
        _ => Err(errors),
    }
}

pub fn sign_in(body: &SignInBody) -> Validated<SignIn> {
    let mut errors = Vec::new();

    let email = string_field("email", body.email.as_ref(), true, &mut errors)
        .and_then(|v| check_email(v, &mut errors));
    let password = string_field("password", body.password.as_ref(), true, &mut errors)
        .and_then(|v| {
            if v.is_empty() {
                errors.push(FieldError::new("password", "Password is required"));
                None
            } else {
                Some(v.to_string())
            }
        });

    match (email, password) {
        (Some(email), Some(password)) if errors.is_empty() => Ok(SignIn { email, password }),
        _ => Err(errors),
    }
}

pub fn user_id(raw: &str) -> Validated<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| vec![FieldError::new("id", "Invalid user id")])
}

/// Any subset of name/email/role. An empty object passes.
pub fn update_user(body: &UpdateUserBody) -> Validated<UserChanges> {
    let mut errors = Vec::new();

    let name = string_field("name", body.name.as_ref(), false, &mut errors)
        .and_then(|v| check_name(v, &mut errors));
    let email = string_field("email", body.email.as_ref(), false, &mut errors)
        .and_then(|v| check_email(v, &mut errors));
    let role = string_field("role", body.role.as_ref(), false, &mut errors)
        .and_then(|v| check_role(v, &mut errors));

    if errors.is_empty() {
        Ok(UserChanges { name, email, role })
    } else {
        Err(errors)
    }
}
