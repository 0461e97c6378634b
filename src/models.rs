use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::*;

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = applications)]
#[diesel(belongs_to(User))]
pub struct Application {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_name: String,
    pub job_title: String,
    pub contact_email: Option<String>,
    pub portal_link: Option<String>,
    pub job_description: String,
    pub notes: String,
    pub application_date: NaiveDate,
    pub status: String,
    pub follow_up_date: Option<NaiveDate>,
    pub priority: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = applications)]
pub struct NewApplication {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_name: String,
    pub job_title: String,
    pub contact_email: Option<String>,
    pub portal_link: Option<String>,
    pub job_description: String,
    pub notes: String,
    pub application_date: NaiveDate,
    pub status: String,
    pub follow_up_date: Option<NaiveDate>,
    pub priority: String,
}

/// Full-record update; every field is written so a PUT replaces the row.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = applications)]
#[diesel(treat_none_as_null = true)]
pub struct ApplicationChangeset {
    pub company_name: String,
    pub job_title: String,
    pub contact_email: Option<String>,
    pub portal_link: Option<String>,
    pub job_description: String,
    pub notes: String,
    pub application_date: NaiveDate,
    pub status: String,
    pub follow_up_date: Option<NaiveDate>,
    pub priority: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = email_templates)]
#[diesel(belongs_to(User))]
pub struct EmailTemplate {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub subject: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = email_templates)]
pub struct NewEmailTemplate {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = activity_logs)]
#[diesel(belongs_to(User))]
#[diesel(belongs_to(Application))]
pub struct ActivityLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub application_id: Option<Uuid>,
    pub action: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = activity_logs)]
pub struct NewActivityLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub application_id: Option<Uuid>,
    pub action: String,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = refresh_tokens)]
#[diesel(belongs_to(User))]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub issued_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
    pub revoked_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = refresh_tokens)]
pub struct NewRefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub issued_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}
