use crate::error::{AppError, AppResult};

/// Account roles. Fixed at registration, never changed in-band.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Role::Admin),
            "user" => Some(Role::User),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

/// Validates a role string from a registration request.
pub fn parse_role(s: &str) -> AppResult<Role> {
    Role::parse(s).ok_or_else(|| {
        AppError::Validation("Invalid role. Only 'admin' or 'user' are allowed.".into())
    })
}

/// Deletion policy for rating rows: admins delete anything, everyone
/// else only their own rows.
pub fn may_delete_rating(actor: Role, owns_rating: bool) -> bool {
    actor == Role::Admin || owns_rating
}
