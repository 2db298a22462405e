use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::users::repo_types::{Role, User};

/// JWT payload carried in the `token` cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,      // user ID
    pub email: String,  // user email at signing time
    pub role: Role,     // user role at signing time
    pub iat: usize,     // issued at (unix timestamp)
    pub exp: usize,     // expires at (unix timestamp)
    pub iss: String,    // issuer
    pub aud: String,    // audience
}

/// Identity of the caller for the lifetime of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

impl SessionIdentity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<Claims> for SessionIdentity {
    fn from(c: Claims) -> Self {
        Self {
            id: c.sub,
            email: c.email,
            role: c.role,
        }
    }
}

impl From<&User> for SessionIdentity {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            email: u.email.clone(),
            role: u.role,
        }
    }
}
