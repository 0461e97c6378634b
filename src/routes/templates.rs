use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::email::prepare_email;
use crate::error::{AppError, AppResult};
use crate::models::{Application, EmailTemplate, NewEmailTemplate};
use crate::schema::{applications, email_templates};
use crate::state::AppState;

#[derive(Serialize)]
pub struct TemplateResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub subject: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<EmailTemplate> for TemplateResponse {
    fn from(template: EmailTemplate) -> Self {
        Self {
            id: template.id,
            user_id: template.user_id,
            name: template.name,
            subject: template.subject,
            body: template.body,
            created_at: template.created_at,
            updated_at: template.updated_at,
        }
    }
}

#[derive(Serialize)]
pub struct TemplateListResponse {
    pub templates: Vec<TemplateResponse>,
}

#[derive(Serialize)]
pub struct TemplateDetailResponse {
    pub template: TemplateResponse,
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

#[derive(Deserialize)]
pub struct TemplatePayload {
    pub name: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
}

struct ValidatedTemplate {
    name: String,
    subject: String,
    body: String,
}

fn validate_payload(payload: TemplatePayload) -> AppResult<ValidatedTemplate> {
    let name = payload
        .name
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(AppError::missing_required_fields)?;
    let subject = payload
        .subject
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(AppError::missing_required_fields)?;
    let body = payload
        .body
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(AppError::missing_required_fields)?;

    Ok(ValidatedTemplate {
        name,
        subject,
        body,
    })
}

pub async fn list_templates(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<TemplateListResponse>> {
    let mut conn = state.db()?;

    let rows: Vec<EmailTemplate> = email_templates::table
        .filter(email_templates::user_id.eq(user.user_id))
        .order(email_templates::name.asc())
        .load(&mut conn)?;

    Ok(Json(TemplateListResponse {
        templates: rows.into_iter().map(TemplateResponse::from).collect(),
    }))
}

pub async fn create_template(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<TemplatePayload>,
) -> AppResult<(StatusCode, Json<TemplateDetailResponse>)> {
    let validated = validate_payload(payload)?;
    let mut conn = state.db()?;

    let new_template = NewEmailTemplate {
        id: Uuid::new_v4(),
        user_id: user.user_id,
        name: validated.name,
        subject: validated.subject,
        body: validated.body,
    };

    diesel::insert_into(email_templates::table)
        .values(&new_template)
        .execute(&mut conn)?;

    let template: EmailTemplate = email_templates::table
        .find(new_template.id)
        .first(&mut conn)?;

    Ok((
        StatusCode::CREATED,
        Json(TemplateDetailResponse {
            template: template.into(),
        }),
    ))
}

pub async fn update_template(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<TemplatePayload>,
) -> AppResult<Json<TemplateDetailResponse>> {
    let validated = validate_payload(payload)?;
    let mut conn = state.db()?;

    let updated = diesel::update(
        email_templates::table
            .find(id)
            .filter(email_templates::user_id.eq(user.user_id)),
    )
    .set((
        email_templates::name.eq(validated.name),
        email_templates::subject.eq(validated.subject),
        email_templates::body.eq(validated.body),
        email_templates::updated_at.eq(Utc::now()),
    ))
    .execute(&mut conn)?;

    if updated == 0 {
        return Err(AppError::not_found("Template not found"));
    }

    let template: EmailTemplate = email_templates::table.find(id).first(&mut conn)?;

    Ok(Json(TemplateDetailResponse {
        template: template.into(),
    }))
}

pub async fn delete_template(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DeleteResponse>> {
    let mut conn = state.db()?;

    let deleted = diesel::delete(
        email_templates::table
            .find(id)
            .filter(email_templates::user_id.eq(user.user_id)),
    )
    .execute(&mut conn)?;

    if deleted == 0 {
        return Err(AppError::not_found("Template not found"));
    }

    Ok(Json(DeleteResponse { success: true }))
}

#[derive(Deserialize)]
pub struct BulkEmailRequest {
    pub application_ids: Vec<Uuid>,
    pub template_id: Uuid,
    pub custom_subject: Option<String>,
    pub custom_body: Option<String>,
}

#[derive(Serialize)]
pub struct BulkEmailEntry {
    pub application_id: Uuid,
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Serialize)]
pub struct BulkEmailResponse {
    pub prepared: usize,
    pub skipped: usize,
    pub emails: Vec<BulkEmailEntry>,
}

/// Renders the template for each selected application. Sending is a log-only
/// stub; applications without a contact email are skipped.
pub async fn bulk_email(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<BulkEmailRequest>,
) -> AppResult<Json<BulkEmailResponse>> {
    if payload.application_ids.is_empty() {
        return Err(AppError::bad_request("application_ids must not be empty"));
    }

    let mut conn = state.db()?;

    let template: EmailTemplate = email_templates::table
        .find(payload.template_id)
        .filter(email_templates::user_id.eq(user.user_id))
        .first(&mut conn)
        .map_err(|err| match err {
            diesel::result::Error::NotFound => AppError::not_found("Template not found"),
            other => AppError::from(other),
        })?;

    let subject = payload
        .custom_subject
        .filter(|value| !value.trim().is_empty())
        .unwrap_or(template.subject);
    let body = payload
        .custom_body
        .filter(|value| !value.trim().is_empty())
        .unwrap_or(template.body);

    let selected: Vec<Application> = applications::table
        .filter(applications::user_id.eq(user.user_id))
        .filter(applications::id.eq_any(&payload.application_ids))
        .load(&mut conn)?;

    let mut emails = Vec::new();
    let mut skipped = 0;
    for application in &selected {
        match prepare_email(&subject, &body, application) {
            Some(prepared) => {
                info!(
                    application_id = %application.id,
                    to = %prepared.to,
                    subject = %prepared.subject,
                    "prepared follow-up email (delivery not implemented)"
                );
                emails.push(BulkEmailEntry {
                    application_id: application.id,
                    to: prepared.to,
                    subject: prepared.subject,
                    body: prepared.body,
                });
            }
            None => skipped += 1,
        }
    }

    Ok(Json(BulkEmailResponse {
        prepared: emails.len(),
        skipped,
        emails,
    }))
}
