use diesel::pg::PgConnection;
use diesel::prelude::*;
use thiserror::Error;
use uuid::Uuid;

use crate::models::NewActivityLog;
use crate::schema::activity_logs;

pub const ACTION_CREATED: &str = "Created application";
pub const ACTION_UPDATED: &str = "Updated application";
pub const ACTION_DELETED: &str = "Deleted application";

#[derive(Debug, Error)]
pub enum ActivityLogError {
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
}

pub type ActivityLogResult<T> = Result<T, ActivityLogError>;

/// Appends one activity entry. Entries are never updated or deleted; the
/// `application_id` column is nulled by the database when the application
/// itself is removed.
pub fn record_activity(
    conn: &mut PgConnection,
    user_id: Uuid,
    application_id: Option<Uuid>,
    action: &str,
) -> ActivityLogResult<()> {
    let entry = NewActivityLog {
        id: Uuid::new_v4(),
        user_id,
        application_id,
        action: action.to_string(),
    };

    diesel::insert_into(activity_logs::table)
        .values(&entry)
        .execute(conn)?;

    Ok(())
}
