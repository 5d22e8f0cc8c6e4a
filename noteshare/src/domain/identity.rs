use serde::{Deserialize, Serialize};

use crate::database::models::UserDbModel;

/// The authenticated caller, as established by the auth context.
///
/// Trusted as-is by the sharing workflow; it is never re-verified against the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    pub email: String,
}

impl From<&UserDbModel> for AuthUser {
    fn from(user: &UserDbModel) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}
