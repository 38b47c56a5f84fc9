use sqlx::PgPool;
use std::str::FromStr;
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
}

// Core models
// Note: FromRow is needed for runtime query_as (without DATABASE_URL at compile time)

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "job_status", rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Interview,
    Declined,
}

impl Default for JobStatus {
    fn default() -> Self {
        JobStatus::Pending
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "interview" => Ok(JobStatus::Interview),
            "declined" => Ok(JobStatus::Declined),
            other => Err(format!("unknown job status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, sqlx::Type)]
#[serde(rename_all = "kebab-case")]
#[sqlx(type_name = "job_type", rename_all = "kebab-case")]
pub enum JobType {
    FullTime,
    PartTime,
    Internship,
    Remote,
}

impl Default for JobType {
    fn default() -> Self {
        JobType::FullTime
    }
}

impl FromStr for JobType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full-time" => Ok(JobType::FullTime),
            "part-time" => Ok(JobType::PartTime),
            "internship" => Ok(JobType::Internship),
            "remote" => Ok(JobType::Remote),
            other => Err(format!("unknown job type: {other}")),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: uuid::Uuid,
    pub company: String,
    pub position: String,
    pub status: JobStatus,
    pub job_type: JobType,
    pub created_by: uuid::Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

// API Request/Response types

#[derive(Debug, serde::Deserialize, validator::Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    #[validate(length(min = 1, message = "Company or Position fields cannot be empty"))]
    pub company: String,
    #[validate(length(min = 1, message = "Company or Position fields cannot be empty"))]
    pub position: String,
    pub status: Option<JobStatus>,
    pub job_type: Option<JobType>,
}

/// Patch body: any subset of the mutable fields.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateJobRequest {
    pub company: Option<String>,
    pub position: Option<String>,
    pub status: Option<JobStatus>,
    pub job_type: Option<JobType>,
}

#[derive(Debug, serde::Serialize)]
pub struct JobResponse {
    pub job: Job,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobListResponse {
    pub jobs: Vec<Job>,
    pub total_jobs: i64,
    pub num_of_pages: i64,
}

/// Per-status counts; statuses with no jobs report 0 rather than being omitted.
#[derive(Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct DefaultStats {
    pub pending: i64,
    pub interview: i64,
    pub declined: i64,
}

#[derive(Debug, PartialEq, Eq, serde::Serialize)]
pub struct MonthlyApplication {
    pub date: String,
    pub count: i64,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub default_stats: DefaultStats,
    pub monthly_applications: Vec<MonthlyApplication>,
}

#[derive(Debug, serde::Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub database: String,
}
