use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::Application;

/// Workflow state of a single application. Stored in the database as the
/// canonical display string (`as_str`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplicationStatus {
    Applied,
    #[serde(rename = "Interview Scheduled")]
    InterviewScheduled,
    Offer,
    Rejected,
    #[serde(rename = "Follow-Up Due")]
    FollowUpDue,
}

impl ApplicationStatus {
    pub const ALL: &'static [ApplicationStatus] = &[
        ApplicationStatus::Applied,
        ApplicationStatus::InterviewScheduled,
        ApplicationStatus::Offer,
        ApplicationStatus::Rejected,
        ApplicationStatus::FollowUpDue,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "Applied",
            ApplicationStatus::InterviewScheduled => "Interview Scheduled",
            ApplicationStatus::Offer => "Offer",
            ApplicationStatus::Rejected => "Rejected",
            ApplicationStatus::FollowUpDue => "Follow-Up Due",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub const ALL: &'static [Priority] = &[Priority::High, Priority::Medium, Priority::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|priority| priority.as_str() == value)
    }
}

/// Status filter value: the literal `all` (any casing) selects everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(ApplicationStatus),
}

impl StatusFilter {
    pub fn parse(value: Option<&str>) -> Result<Self, String> {
        match value {
            None => Ok(StatusFilter::All),
            Some(raw) if raw.is_empty() || raw.eq_ignore_ascii_case("all") => Ok(StatusFilter::All),
            Some(raw) => ApplicationStatus::parse(raw)
                .map(StatusFilter::Only)
                .ok_or_else(|| format!("unknown status '{raw}'")),
        }
    }

    fn matches(&self, status: &str) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => wanted.as_str() == status,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PriorityFilter {
    #[default]
    All,
    Only(Priority),
}

impl PriorityFilter {
    pub fn parse(value: Option<&str>) -> Result<Self, String> {
        match value {
            None => Ok(PriorityFilter::All),
            Some(raw) if raw.is_empty() || raw.eq_ignore_ascii_case("all") => {
                Ok(PriorityFilter::All)
            }
            Some(raw) => Priority::parse(raw)
                .map(PriorityFilter::Only)
                .ok_or_else(|| format!("unknown priority '{raw}'")),
        }
    }

    fn matches(&self, priority: &str) -> bool {
        match self {
            PriorityFilter::All => true,
            PriorityFilter::Only(wanted) => wanted.as_str() == priority,
        }
    }
}

/// The five recognized filter fields. Sort order is part of the list query,
/// not of the predicate, so it lives in the route layer.
#[derive(Debug, Clone, Default)]
pub struct ApplicationFilter {
    pub search: String,
    pub status: StatusFilter,
    pub priority: PriorityFilter,
    pub follow_up_due: bool,
}

/// An application is due for follow-up when the follow-up date is set and not
/// in the future; a follow-up date of exactly `today` counts.
pub fn follow_up_due(application: &Application, today: NaiveDate) -> bool {
    application
        .follow_up_date
        .map(|date| date <= today)
        .unwrap_or(false)
}

pub fn matches_filter(
    application: &Application,
    filter: &ApplicationFilter,
    today: NaiveDate,
) -> bool {
    if !filter.search.is_empty() {
        let needle = filter.search.to_lowercase();
        let in_company = application.company_name.to_lowercase().contains(&needle);
        let in_title = application.job_title.to_lowercase().contains(&needle);
        let in_email = application
            .contact_email
            .as_deref()
            .map(|email| email.to_lowercase().contains(&needle))
            .unwrap_or(false);
        if !in_company && !in_title && !in_email {
            return false;
        }
    }

    if !filter.status.matches(&application.status) {
        return false;
    }

    if !filter.priority.matches(&application.priority) {
        return false;
    }

    if filter.follow_up_due && !follow_up_due(application, today) {
        return false;
    }

    true
}

/// Keeps the subsequence of `applications` matching every predicate, in the
/// original relative order.
pub fn filter_applications<'a>(
    applications: &'a [Application],
    filter: &ApplicationFilter,
    today: NaiveDate,
) -> Vec<&'a Application> {
    applications
        .iter()
        .filter(|application| matches_filter(application, filter, today))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_applications: u64,
    pub response_rate: f64,
    pub interviews_scheduled: u64,
    pub pending_follow_ups: u64,
    pub applications_by_status: BTreeMap<String, u64>,
    pub applications_by_month: Vec<MonthCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthCount {
    pub month: String,
    pub count: u64,
}

/// Derives the dashboard figures from the caller's full collection.
///
/// Interview Scheduled and Offer both count as a response. Month buckets are
/// keyed by (year, month) of the application date so December 2024 sorts
/// before January 2025 regardless of label ordering.
pub fn dashboard_stats(applications: &[Application], today: NaiveDate) -> DashboardStats {
    let total = applications.len() as u64;

    let responses = applications
        .iter()
        .filter(|application| {
            matches!(
                ApplicationStatus::parse(&application.status),
                Some(ApplicationStatus::InterviewScheduled) | Some(ApplicationStatus::Offer)
            )
        })
        .count() as u64;

    let response_rate = if total > 0 {
        responses as f64 / total as f64 * 100.0
    } else {
        0.0
    };

    let interviews_scheduled = applications
        .iter()
        .filter(|application| application.status == ApplicationStatus::InterviewScheduled.as_str())
        .count() as u64;

    let pending_follow_ups = applications
        .iter()
        .filter(|application| follow_up_due(application, today))
        .count() as u64;

    let mut by_status: BTreeMap<String, u64> = BTreeMap::new();
    for application in applications {
        *by_status.entry(application.status.clone()).or_insert(0) += 1;
    }

    let mut by_month: BTreeMap<(i32, u32), u64> = BTreeMap::new();
    for application in applications {
        let key = (
            application.application_date.year(),
            application.application_date.month(),
        );
        *by_month.entry(key).or_insert(0) += 1;
    }
    let applications_by_month = by_month
        .into_iter()
        .map(|((year, month), count)| MonthCount {
            month: month_label(year, month),
            count,
        })
        .collect();

    DashboardStats {
        total_applications: total,
        response_rate,
        interviews_scheduled,
        pending_follow_ups,
        applications_by_status: by_status,
        applications_by_month,
    }
}

fn month_label(year: i32, month: u32) -> String {
    const NAMES: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];
    format!("{} {year}", NAMES[(month - 1) as usize])
}
