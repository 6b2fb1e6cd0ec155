use himo_db::Database;
use himo_db::models::Capability;

use crate::error::ApiError;

/// Gate for every admin action: only users flagged as admin pass.
pub fn require_admin(db: &Database, user_id: i64) -> Result<(), ApiError> {
    match db.capability(user_id)? {
        Capability::Admin => Ok(()),
        Capability::Member | Capability::Unknown => Err(ApiError::AccessDenied),
    }
}
