mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::{acquire_db_lock, body_to_vec, TestApp};
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Deserialize)]
struct StatsEnvelope {
    stats: Stats,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Stats {
    total_applications: u64,
    response_rate: f64,
    pending_follow_ups: u64,
    applications_by_status: BTreeMap<String, u64>,
    applications_by_month: Vec<MonthCount>,
}

#[derive(Deserialize)]
struct MonthCount {
    month: String,
    count: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActivityEnvelope {
    activity_logs: Vec<ActivityEntry>,
}

#[derive(Deserialize)]
struct ActivityEntry {
    action: String,
    application_id: Option<Uuid>,
    application: Option<ActivityApplication>,
}

#[derive(Deserialize)]
struct ActivityApplication {
    company_name: String,
    job_title: String,
}

async fn create_application(app: &TestApp, token: &str, payload: serde_json::Value) -> Result<()> {
    let response = app.post_json("/api/applications", &payload, Some(token)).await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    Ok(())
}

#[tokio::test]
async fn stats_reflect_the_collection() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    app.insert_user("stats@example.com", "Stats", "pw").await?;
    let token = app.login_token("stats@example.com", "pw").await?;

    create_application(
        &app,
        &token,
        json!({
            "company_name": "Acme",
            "job_title": "Engineer",
            "application_date": "2024-12-20",
            "status": "Applied",
            "follow_up_date": "2020-01-01"
        }),
    )
    .await?;
    create_application(
        &app,
        &token,
        json!({
            "company_name": "Globex",
            "job_title": "Designer",
            "application_date": "2025-01-05",
            "status": "Interview Scheduled"
        }),
    )
    .await?;
    create_application(
        &app,
        &token,
        json!({
            "company_name": "Initech",
            "job_title": "Analyst",
            "application_date": "2025-01-28",
            "status": "Applied"
        }),
    )
    .await?;

    let response = app.get("/api/dashboard?type=stats", Some(&token)).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_to_vec(response.into_body()).await?;
    let envelope: StatsEnvelope = serde_json::from_slice(&body)?;
    let stats = envelope.stats;

    assert_eq!(stats.total_applications, 3);
    assert!((stats.response_rate - 100.0 / 3.0).abs() < 1e-9);
    assert_eq!(stats.pending_follow_ups, 1);

    assert_eq!(stats.applications_by_status.get("Applied"), Some(&2));
    assert_eq!(
        stats.applications_by_status.get("Interview Scheduled"),
        Some(&1)
    );
    assert_eq!(
        stats.applications_by_status.values().sum::<u64>(),
        stats.total_applications
    );

    let labels: Vec<&str> = stats
        .applications_by_month
        .iter()
        .map(|entry| entry.month.as_str())
        .collect();
    assert_eq!(labels, vec!["Dec 2024", "Jan 2025"]);
    assert_eq!(stats.applications_by_month[1].count, 2);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn activity_feed_includes_application_details() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    app.insert_user("feed@example.com", "Feed", "pw").await?;
    let token = app.login_token("feed@example.com", "pw").await?;

    create_application(
        &app,
        &token,
        json!({
            "company_name": "Acme",
            "job_title": "Engineer",
            "application_date": "2025-01-10"
        }),
    )
    .await?;

    let response = app.get("/api/dashboard?type=activity", Some(&token)).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_to_vec(response.into_body()).await?;
    let envelope: ActivityEnvelope = serde_json::from_slice(&body)?;

    assert_eq!(envelope.activity_logs.len(), 1);
    let entry = &envelope.activity_logs[0];
    assert_eq!(entry.action, "Created application");
    assert!(entry.application_id.is_some());
    let related = entry.application.as_ref().expect("related application");
    assert_eq!(related.company_name, "Acme");
    assert_eq!(related.job_title, "Engineer");

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn dashboard_type_parameter_is_validated() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    app.insert_user("types@example.com", "Types", "pw").await?;
    let token = app.login_token("types@example.com", "pw").await?;

    let response = app.get("/api/dashboard", Some(&token)).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.get("/api/dashboard?type=bogus", Some(&token)).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    app.cleanup().await?;
    Ok(())
}
