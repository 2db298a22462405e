use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::users::repo_types::User;

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserBody {
    pub name: Option<Value>,
    pub email: Option<Value>,
    pub role: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub message: &'static str,
    pub users: Vec<User>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub message: &'static str,
    pub user: User,
}
