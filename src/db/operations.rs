use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::{CreateJobRequest, Job, JobStatus, JobType, UpdateJobRequest};
use crate::types::AppResult;

/// Fixed page size; the exposed contract does not let clients change it.
pub const PAGE_SIZE: i64 = 10;

const JOB_COLUMNS: &str =
    r#"id, company, "position", status, job_type, created_by, created_at, updated_at"#;

// Single-job statements are always scoped by (id, owner) so that a wrong id
// and a wrong owner are indistinguishable.
const SELECT_JOB_SQL: &str = r#"
    SELECT id, company, "position", status, job_type, created_by, created_at, updated_at
    FROM jobs WHERE id = $1 AND created_by = $2
    "#;

const UPDATE_JOB_SQL: &str = r#"
    UPDATE jobs
    SET company = COALESCE($3, company),
        "position" = COALESCE($4, "position"),
        status = COALESCE($5, status),
        job_type = COALESCE($6, job_type),
        updated_at = NOW()
    WHERE id = $1 AND created_by = $2
    RETURNING id, company, "position", status, job_type, created_by, created_at, updated_at
    "#;

const DELETE_JOB_SQL: &str =
    "DELETE FROM jobs WHERE id = $1 AND created_by = $2 RETURNING id";

/// Optional constraints applied on top of the mandatory owner scope.
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub search: Option<String>,
    pub status: Option<JobStatus>,
    pub job_type: Option<JobType>,
}

/// Sort-key lookup table for listings. An unrecognized or absent key maps to
/// no entry, which leaves the result in the store's natural order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Latest,
    Oldest,
    AToZ,
    ZToA,
}

impl SortKey {
    pub fn from_param(value: &str) -> Option<Self> {
        match value {
            "latest" => Some(SortKey::Latest),
            "oldest" => Some(SortKey::Oldest),
            "a-z" => Some(SortKey::AToZ),
            "z-a" => Some(SortKey::ZToA),
            _ => None,
        }
    }

    fn order_clause(self) -> &'static str {
        match self {
            SortKey::Latest => " ORDER BY created_at DESC",
            SortKey::Oldest => " ORDER BY created_at ASC",
            SortKey::AToZ => r#" ORDER BY "position" ASC"#,
            SortKey::ZToA => r#" ORDER BY "position" DESC"#,
        }
    }
}

pub fn num_of_pages(total_jobs: i64) -> i64 {
    (total_jobs + PAGE_SIZE - 1) / PAGE_SIZE
}

#[derive(Debug, sqlx::FromRow)]
pub struct StatusCount {
    pub status: JobStatus,
    pub count: i64,
}

#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct MonthlyCount {
    pub year: i32,
    pub month: i32,
    pub count: i64,
}

fn apply_filters(builder: &mut QueryBuilder<'_, Postgres>, owner: Uuid, filter: &JobFilter) {
    builder.push(" WHERE created_by = ").push_bind(owner);

    if let Some(search) = &filter.search {
        builder
            .push(r#" AND "position" ILIKE "#)
            .push_bind(format!("%{search}%"));
    }
    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status);
    }
    if let Some(job_type) = filter.job_type {
        builder.push(" AND job_type = ").push_bind(job_type);
    }
}

fn build_list_query(
    owner: Uuid,
    filter: &JobFilter,
    sort: Option<SortKey>,
    page: i64,
) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT {JOB_COLUMNS} FROM jobs"));
    apply_filters(&mut builder, owner, filter);

    if let Some(sort) = sort {
        builder.push(sort.order_clause());
    }

    let page = page.max(1);
    builder
        .push(" LIMIT ")
        .push_bind(PAGE_SIZE)
        .push(" OFFSET ")
        .push_bind((page - 1) * PAGE_SIZE);

    builder
}

pub struct JobRepository;

impl JobRepository {
    /// One page of the owner's jobs, filtered and optionally sorted.
    pub async fn list_jobs(
        pool: &PgPool,
        owner: Uuid,
        filter: &JobFilter,
        sort: Option<SortKey>,
        page: i64,
    ) -> AppResult<Vec<Job>> {
        let mut query = build_list_query(owner, filter, sort, page);
        let jobs = query.build_query_as::<Job>().fetch_all(pool).await?;
        Ok(jobs)
    }

    /// Count of matches ignoring pagination.
    pub async fn count_jobs(pool: &PgPool, owner: Uuid, filter: &JobFilter) -> AppResult<i64> {
        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM jobs");
        apply_filters(&mut builder, owner, filter);
        let total = builder
            .build_query_scalar::<i64>()
            .fetch_one(pool)
            .await?;
        Ok(total)
    }

    pub async fn create_job(
        pool: &PgPool,
        owner: Uuid,
        request: &CreateJobRequest,
    ) -> AppResult<Job> {
        let job = sqlx::query_as::<_, Job>(
            r#"
            INSERT INTO jobs (company, "position", status, job_type, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, company, "position", status, job_type, created_by, created_at, updated_at
            "#,
        )
        .bind(request.company.as_str())
        .bind(request.position.as_str())
        .bind(request.status.unwrap_or_default())
        .bind(request.job_type.unwrap_or_default())
        .bind(owner)
        .fetch_one(pool)
        .await?;

        Ok(job)
    }

    /// Lookup scoped by `(id, owner)`; a wrong id and a wrong owner are
    /// indistinguishable.
    pub async fn get_job(pool: &PgPool, owner: Uuid, id: Uuid) -> AppResult<Option<Job>> {
        let job = sqlx::query_as::<_, Job>(SELECT_JOB_SQL)
            .bind(id)
            .bind(owner)
            .fetch_optional(pool)
            .await?;

        Ok(job)
    }

    /// Partial update of the mutable fields; omitted fields keep their value.
    pub async fn update_job(
        pool: &PgPool,
        owner: Uuid,
        id: Uuid,
        request: &UpdateJobRequest,
    ) -> AppResult<Option<Job>> {
        let job = sqlx::query_as::<_, Job>(UPDATE_JOB_SQL)
            .bind(id)
            .bind(owner)
            .bind(request.company.as_deref())
            .bind(request.position.as_deref())
            .bind(request.status)
            .bind(request.job_type)
            .fetch_optional(pool)
            .await?;

        Ok(job)
    }

    /// Returns true if a row was deleted.
    pub async fn delete_job(pool: &PgPool, owner: Uuid, id: Uuid) -> AppResult<bool> {
        let deleted = sqlx::query_scalar::<_, Uuid>(DELETE_JOB_SQL)
            .bind(id)
            .bind(owner)
            .fetch_optional(pool)
            .await?;

        Ok(deleted.is_some())
    }

    pub async fn status_counts(pool: &PgPool, owner: Uuid) -> AppResult<Vec<StatusCount>> {
        let counts = sqlx::query_as::<_, StatusCount>(
            "SELECT status, COUNT(*) AS count FROM jobs WHERE created_by = $1 GROUP BY status",
        )
        .bind(owner)
        .fetch_all(pool)
        .await?;

        Ok(counts)
    }

    /// Per-month application counts, most recent months first, at most 6.
    pub async fn monthly_counts(pool: &PgPool, owner: Uuid) -> AppResult<Vec<MonthlyCount>> {
        let counts = sqlx::query_as::<_, MonthlyCount>(
            r#"
            SELECT EXTRACT(YEAR FROM created_at)::INT AS year,
                   EXTRACT(MONTH FROM created_at)::INT AS month,
                   COUNT(*) AS count
            FROM jobs
            WHERE created_by = $1
            GROUP BY year, month
            ORDER BY year DESC, month DESC
            LIMIT 6
            "#,
        )
        .bind(owner)
        .fetch_all(pool)
        .await?;

        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_key_lookup_table() {
        assert_eq!(SortKey::from_param("latest"), Some(SortKey::Latest));
        assert_eq!(SortKey::from_param("oldest"), Some(SortKey::Oldest));
        assert_eq!(SortKey::from_param("a-z"), Some(SortKey::AToZ));
        assert_eq!(SortKey::from_param("z-a"), Some(SortKey::ZToA));
        // No table entry means no ORDER BY at all.
        assert_eq!(SortKey::from_param("newest"), None);
        assert_eq!(SortKey::from_param(""), None);
    }

    #[test]
    fn order_clauses_match_sort_keys() {
        assert_eq!(SortKey::Latest.order_clause(), " ORDER BY created_at DESC");
        assert_eq!(SortKey::Oldest.order_clause(), " ORDER BY created_at ASC");
        assert_eq!(SortKey::AToZ.order_clause(), r#" ORDER BY "position" ASC"#);
        assert_eq!(SortKey::ZToA.order_clause(), r#" ORDER BY "position" DESC"#);
    }

    #[test]
    fn page_count_is_ceiling_of_total_over_page_size() {
        assert_eq!(num_of_pages(0), 0);
        assert_eq!(num_of_pages(1), 1);
        assert_eq!(num_of_pages(10), 1);
        assert_eq!(num_of_pages(11), 2);
        assert_eq!(num_of_pages(60), 6);
    }

    #[test]
    fn single_job_statements_scope_by_owner() {
        // A job is only visible or mutable through its (id, owner) pair.
        for sql in [SELECT_JOB_SQL, UPDATE_JOB_SQL, DELETE_JOB_SQL] {
            assert!(sql.contains("id = $1 AND created_by = $2"));
        }
    }

    #[test]
    fn list_query_always_scopes_by_owner() {
        let mut query = build_list_query(Uuid::new_v4(), &JobFilter::default(), None, 1);
        let sql = query.sql();
        assert!(sql.contains("WHERE created_by = $1"));
        assert!(!sql.contains("ORDER BY"));
        assert!(sql.contains("LIMIT $2 OFFSET $3"));
    }

    #[test]
    fn list_query_applies_all_filters() {
        let filter = JobFilter {
            search: Some("engineer".to_string()),
            status: Some(JobStatus::Pending),
            job_type: Some(JobType::Remote),
        };
        let mut query = build_list_query(Uuid::new_v4(), &filter, Some(SortKey::Latest), 3);
        let sql = query.sql();
        assert!(sql.contains(r#""position" ILIKE $2"#));
        assert!(sql.contains("status = $3"));
        assert!(sql.contains("job_type = $4"));
        assert!(sql.contains("ORDER BY created_at DESC"));
        assert!(sql.contains("LIMIT $5 OFFSET $6"));
    }

    #[test]
    fn list_query_clamps_page_to_one() {
        // Page 0 and page 1 must produce the same query.
        let owner = Uuid::new_v4();
        let mut zero = build_list_query(owner, &JobFilter::default(), None, 0);
        let mut one = build_list_query(owner, &JobFilter::default(), None, 1);
        assert_eq!(zero.sql(), one.sql());
    }
}
