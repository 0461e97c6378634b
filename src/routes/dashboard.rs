use axum::extract::{Json, Query, State};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analytics::{dashboard_stats, DashboardStats};
use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::models::{ActivityLog, Application};
use crate::schema::{activity_logs, applications};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct DashboardQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Serialize)]
pub struct ActivityApplication {
    pub company_name: String,
    pub job_title: String,
}

#[derive(Serialize)]
pub struct ActivityLogEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub application_id: Option<Uuid>,
    pub action: String,
    pub timestamp: DateTime<Utc>,
    pub application: Option<ActivityApplication>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityResponse {
    pub activity_logs: Vec<ActivityLogEntry>,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub stats: DashboardStats,
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum DashboardResponse {
    Activity(ActivityResponse),
    Stats(StatsResponse),
}

pub async fn dashboard(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<DashboardQuery>,
) -> AppResult<Json<DashboardResponse>> {
    let kind = params.kind.ok_or_else(|| {
        AppError::bad_request("Missing 'type' query parameter. Expected 'activity' or 'stats'.")
    })?;

    match kind.as_str() {
        "activity" => Ok(Json(DashboardResponse::Activity(recent_activity(
            &state, &user,
        )?))),
        "stats" => Ok(Json(DashboardResponse::Stats(stats(&state, &user)?))),
        other => Err(AppError::bad_request(format!(
            "Invalid 'type' parameter: {other}. Expected 'activity' or 'stats'."
        ))),
    }
}

/// The newest feed entries, each carrying the related application's company
/// and title while that application still exists.
fn recent_activity(state: &AppState, user: &AuthenticatedUser) -> AppResult<ActivityResponse> {
    let mut conn = state.db()?;

    let rows: Vec<(ActivityLog, Option<(String, String)>)> = activity_logs::table
        .left_join(applications::table)
        .filter(activity_logs::user_id.eq(user.user_id))
        .order(activity_logs::timestamp.desc())
        .limit(state.config.activity_feed_limit)
        .select((
            activity_logs::all_columns,
            (applications::company_name, applications::job_title).nullable(),
        ))
        .load(&mut conn)?;

    let entries = rows
        .into_iter()
        .map(|(log, application)| ActivityLogEntry {
            id: log.id,
            user_id: log.user_id,
            application_id: log.application_id,
            action: log.action,
            timestamp: log.timestamp,
            application: application.map(|(company_name, job_title)| ActivityApplication {
                company_name,
                job_title,
            }),
        })
        .collect();

    Ok(ActivityResponse {
        activity_logs: entries,
    })
}

fn stats(state: &AppState, user: &AuthenticatedUser) -> AppResult<StatsResponse> {
    let mut conn = state.db()?;

    let rows: Vec<Application> = applications::table
        .filter(applications::user_id.eq(user.user_id))
        .load(&mut conn)?;

    Ok(StatsResponse {
        stats: dashboard_stats(&rows, Utc::now().date_naive()),
    })
}
