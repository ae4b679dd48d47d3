use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Period {
    pub code: String,
    pub position: usize,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeRecord {
    pub subject_id: i64,
    pub subject_name: String,
    pub event_id: i64,
    pub event_date: String,
    pub numeric_value: f64,
    pub display_value: String,
    pub counts_toward_average: bool,
    pub period_label: String,
    pub period_code: String,
    pub component_description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct AttendanceSummary {
    pub absence_hours: f64,
    pub tardy_count: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subject {
    pub id: i64,
    pub name: String,
    pub teachers: Vec<String>,
}

/// Portal user id paired with the id used by the social layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub internal_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: String,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserSnapshot {
    pub user_id: String,
    pub internal_id: Uuid,
    pub name: Option<String>,
    pub school: Option<String>,
    pub average: Option<f64>,
    pub absence_hours: Option<f64>,
    pub tardy_count: Option<f64>,
    pub accepted_social_terms: bool,
    pub last_update: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub internal_id: Uuid,
    pub name: String,
    pub average: f64,
    pub absence_hours: f64,
    pub tardy_count: f64,
    pub follower_count: i64,
    pub last_update: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UserRanking {
    pub average_rank: Option<usize>,
    pub absences_rank: Option<usize>,
    pub tardies_rank: Option<usize>,
    pub followers_rank: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubjectSummary {
    pub subject_name: String,
    pub count: usize,
    pub average: Option<f64>,
}
