use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::users::repo_types::User;

/// Raw signup body; fields stay untyped so the validator can report per-field type errors.
#[derive(Debug, Default, Deserialize)]
pub struct SignUpBody {
    pub name: Option<Value>,
    pub email: Option<Value>,
    pub password: Option<Value>,
    pub role: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SignInBody {
    pub email: Option<Value>,
    pub password: Option<Value>,
}

/// Response returned after signup and signin. The token travels in the cookie only.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: &'static str,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
