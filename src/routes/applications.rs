use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::activity::{self, ACTION_CREATED, ACTION_DELETED, ACTION_UPDATED};
use crate::analytics::{
    matches_filter, ApplicationFilter, ApplicationStatus, Priority, PriorityFilter, StatusFilter,
};
use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::models::{Application, ApplicationChangeset, NewApplication};
use crate::schema::applications;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ApplicationListQuery {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub search: Option<String>,
    #[serde(default)]
    pub follow_up_due: bool,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Clone, Copy)]
enum SortField {
    ApplicationDate,
    CompanyName,
    JobTitle,
}

impl SortField {
    fn parse(value: Option<&str>) -> AppResult<Self> {
        match value {
            None | Some("application_date") => Ok(SortField::ApplicationDate),
            Some("company_name") => Ok(SortField::CompanyName),
            Some("job_title") => Ok(SortField::JobTitle),
            Some(other) => Err(AppError::bad_request(format!(
                "unknown sort field '{other}'"
            ))),
        }
    }
}

fn parse_descending(value: Option<&str>) -> AppResult<bool> {
    match value {
        None | Some("desc") => Ok(true),
        Some("asc") => Ok(false),
        Some(other) => Err(AppError::bad_request(format!(
            "unknown sort order '{other}'"
        ))),
    }
}

#[derive(Serialize)]
pub struct ApplicationResponse {
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

impl From<Application> for ApplicationResponse {
    fn from(application: Application) -> Self {
        Self {
            id: application.id,
            user_id: application.user_id,
            company_name: application.company_name,
            job_title: application.job_title,
            contact_email: application.contact_email,
            portal_link: application.portal_link,
            job_description: application.job_description,
            notes: application.notes,
            application_date: application.application_date,
            status: application.status,
            follow_up_date: application.follow_up_date,
            priority: application.priority,
            created_at: application.created_at,
            updated_at: application.updated_at,
        }
    }
}

#[derive(Serialize)]
pub struct ApplicationListResponse {
    pub applications: Vec<ApplicationResponse>,
}

#[derive(Serialize)]
pub struct ApplicationDetailResponse {
    pub application: ApplicationResponse,
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

/// Incoming create/update payload. Everything optional at the serde level so
/// validation can answer with a 400 instead of a deserialize error.
#[derive(Deserialize)]
pub struct ApplicationPayload {
    pub company_name: Option<String>,
    pub job_title: Option<String>,
    pub application_date: Option<NaiveDate>,
    pub contact_email: Option<String>,
    pub portal_link: Option<String>,
    pub job_description: Option<String>,
    pub notes: Option<String>,
    pub status: Option<String>,
    pub follow_up_date: Option<NaiveDate>,
    pub priority: Option<String>,
}

struct ValidatedApplication {
    company_name: String,
    job_title: String,
    application_date: NaiveDate,
    contact_email: Option<String>,
    portal_link: Option<String>,
    job_description: String,
    notes: String,
    status: ApplicationStatus,
    follow_up_date: Option<NaiveDate>,
    priority: Priority,
}

/// Empty optional strings become NULL, free-text fields default to empty,
/// status/priority fall back to `Applied`/`Medium` and must be known values.
fn validate_payload(payload: ApplicationPayload) -> AppResult<ValidatedApplication> {
    let company_name = payload
        .company_name
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(AppError::missing_required_fields)?;
    let job_title = payload
        .job_title
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(AppError::missing_required_fields)?;
    let application_date = payload
        .application_date
        .ok_or_else(AppError::missing_required_fields)?;

    let status = match payload.status.as_deref() {
        None | Some("") => ApplicationStatus::Applied,
        Some(raw) => ApplicationStatus::parse(raw)
            .ok_or_else(|| AppError::bad_request(format!("unknown status '{raw}'")))?,
    };
    let priority = match payload.priority.as_deref() {
        None | Some("") => Priority::Medium,
        Some(raw) => Priority::parse(raw)
            .ok_or_else(|| AppError::bad_request(format!("unknown priority '{raw}'")))?,
    };

    Ok(ValidatedApplication {
        company_name,
        job_title,
        application_date,
        contact_email: payload.contact_email.filter(|value| !value.is_empty()),
        portal_link: payload.portal_link.filter(|value| !value.is_empty()),
        job_description: payload.job_description.unwrap_or_default(),
        notes: payload.notes.unwrap_or_default(),
        status,
        follow_up_date: payload.follow_up_date,
        priority,
    })
}

/// The single canonical filtering path: the caller's rows are fetched
/// owner-scoped and SQL-ordered, then the pure filter engine applies the
/// search/status/priority/follow-up predicates.
pub async fn list_applications(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<ApplicationListQuery>,
) -> AppResult<Json<ApplicationListResponse>> {
    let filter = ApplicationFilter {
        search: params.search.unwrap_or_default(),
        status: StatusFilter::parse(params.status.as_deref()).map_err(AppError::bad_request)?,
        priority: PriorityFilter::parse(params.priority.as_deref())
            .map_err(AppError::bad_request)?,
        follow_up_due: params.follow_up_due,
    };
    let sort_field = SortField::parse(params.sort_by.as_deref())?;
    let descending = parse_descending(params.sort_order.as_deref())?;

    let mut conn = state.db()?;
    let mut query = applications::table
        .filter(applications::user_id.eq(user.user_id))
        .into_boxed();
    query = match (sort_field, descending) {
        (SortField::ApplicationDate, true) => query.order(applications::application_date.desc()),
        (SortField::ApplicationDate, false) => query.order(applications::application_date.asc()),
        (SortField::CompanyName, true) => query.order(applications::company_name.desc()),
        (SortField::CompanyName, false) => query.order(applications::company_name.asc()),
        (SortField::JobTitle, true) => query.order(applications::job_title.desc()),
        (SortField::JobTitle, false) => query.order(applications::job_title.asc()),
    };

    let mut rows: Vec<Application> = query.load(&mut conn)?;
    let today = Utc::now().date_naive();
    rows.retain(|application| matches_filter(application, &filter, today));

    Ok(Json(ApplicationListResponse {
        applications: rows.into_iter().map(ApplicationResponse::from).collect(),
    }))
}

pub async fn get_application(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApplicationDetailResponse>> {
    let mut conn = state.db()?;

    let application: Application = applications::table
        .find(id)
        .filter(applications::user_id.eq(user.user_id))
        .first(&mut conn)
        .map_err(|err| match err {
            diesel::result::Error::NotFound => AppError::not_found("Application not found"),
            other => AppError::from(other),
        })?;

    Ok(Json(ApplicationDetailResponse {
        application: application.into(),
    }))
}

pub async fn create_application(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<ApplicationPayload>,
) -> AppResult<(StatusCode, Json<ApplicationDetailResponse>)> {
    let validated = validate_payload(payload)?;
    let mut conn = state.db()?;

    let new_application = NewApplication {
        id: Uuid::new_v4(),
        user_id: user.user_id,
        company_name: validated.company_name,
        job_title: validated.job_title,
        contact_email: validated.contact_email,
        portal_link: validated.portal_link,
        job_description: validated.job_description,
        notes: validated.notes,
        application_date: validated.application_date,
        status: validated.status.as_str().to_string(),
        follow_up_date: validated.follow_up_date,
        priority: validated.priority.as_str().to_string(),
    };

    diesel::insert_into(applications::table)
        .values(&new_application)
        .execute(&mut conn)?;

    activity::record_activity(
        &mut conn,
        user.user_id,
        Some(new_application.id),
        ACTION_CREATED,
    )
    .map_err(AppError::internal)?;

    let application: Application = applications::table
        .find(new_application.id)
        .first(&mut conn)?;

    info!(
        application_id = %application.id,
        company = %application.company_name,
        "application created"
    );

    Ok((
        StatusCode::CREATED,
        Json(ApplicationDetailResponse {
            application: application.into(),
        }),
    ))
}

pub async fn update_application(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ApplicationPayload>,
) -> AppResult<Json<ApplicationDetailResponse>> {
    let validated = validate_payload(payload)?;
    let mut conn = state.db()?;

    let changeset = ApplicationChangeset {
        company_name: validated.company_name,
        job_title: validated.job_title,
        contact_email: validated.contact_email,
        portal_link: validated.portal_link,
        job_description: validated.job_description,
        notes: validated.notes,
        application_date: validated.application_date,
        status: validated.status.as_str().to_string(),
        follow_up_date: validated.follow_up_date,
        priority: validated.priority.as_str().to_string(),
        updated_at: Utc::now(),
    };

    // Owner-scoped: a guessed id belonging to someone else looks identical to
    // a nonexistent one.
    let updated = diesel::update(
        applications::table
            .find(id)
            .filter(applications::user_id.eq(user.user_id)),
    )
    .set(&changeset)
    .execute(&mut conn)?;

    if updated == 0 {
        return Err(AppError::not_found("Application not found"));
    }

    activity::record_activity(&mut conn, user.user_id, Some(id), ACTION_UPDATED)
        .map_err(AppError::internal)?;

    let application: Application = applications::table.find(id).first(&mut conn)?;

    Ok(Json(ApplicationDetailResponse {
        application: application.into(),
    }))
}

pub async fn delete_application(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DeleteResponse>> {
    let mut conn = state.db()?;

    let exists: Option<Uuid> = applications::table
        .find(id)
        .filter(applications::user_id.eq(user.user_id))
        .select(applications::id)
        .first(&mut conn)
        .optional()?;

    if exists.is_none() {
        return Err(AppError::not_found("Application not found"));
    }

    // The log entry goes in before the row disappears; the FK then nulls the
    // application reference on delete.
    activity::record_activity(&mut conn, user.user_id, Some(id), ACTION_DELETED)
        .map_err(AppError::internal)?;

    diesel::delete(
        applications::table
            .find(id)
            .filter(applications::user_id.eq(user.user_id)),
    )
    .execute(&mut conn)?;

    info!(application_id = %id, "application deleted");

    Ok(Json(DeleteResponse { success: true }))
}
