//! Who may modify which user record.

use uuid::Uuid;

use crate::{auth::claims::SessionIdentity, error::AppError, users::repo_types::UserChanges};

#[derive(Debug, Clone, Copy)]
pub enum Action<'a> {
    Update(&'a UserChanges),
    Delete,
}

/// Self-or-admin rule; role changes are admin only. First failing rule wins.
pub fn authorize(
    caller: Option<&SessionIdentity>,
    target: Uuid,
    action: Action<'_>,
) -> Result<(), AppError> {
    let Some(caller) = caller else {
        return Err(AppError::Unauthenticated(match action {
            Action::Update(_) => "You must be logged in to update user information",
            Action::Delete => "You must be logged in to delete users",
        }));
    };

    if !caller.is_admin() && caller.id != target {
        return Err(AppError::Forbidden(match action {
            Action::Update(_) => "You can only update your own information",
            Action::Delete => "You can only delete your own account",
        }));
    }

    if let Action::Update(changes) = action {
        if changes.role.is_some() && !caller.is_admin() {
            return Err(AppError::Forbidden("Only administrators can change user roles"));
        }
    }

    Ok(())
}
