use crate::core::search::{CandidateFetch, ExclusionResolver, FetchError};
use crate::models::{Candidate, Day, EligibilityField, FilterDimension, FilterSpec, ValueField};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<PostgresError> for FetchError {
    fn from(value: PostgresError) -> Self {
        match value {
            PostgresError::SqlxError(
                e @ (sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)),
            ) => FetchError::Unavailable(e.to_string()),
            other => FetchError::Query(other.to_string()),
        }
    }
}

/// A case's stored recruitment criteria
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseFilters {
    pub case_id: String,
    pub filters: FilterSpec,
}

const CANDIDATE_COLUMNS: &str = "id, name, gender, race, political_affiliation, age, state, \
    education_level, marital_status, family_income, available_weekdays, available_weekends, \
    served_on_jury, convicted_felon, us_citizen, has_children, served_armed_forces, \
    currently_employed, internet_access";

/// PostgreSQL client for the participant store
///
/// Holds participants, cases (with their lineage and filter documents),
/// invitations and the blacklist. Serves as both the candidate store and the
/// exclusion resolver for the search engine.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, PostgresError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    /// Load the stored filters of each case, in the order requested
    ///
    /// Fails with `NotFound` if any case id is unknown.
    pub async fn case_filters(&self, case_ids: &[String]) -> Result<Vec<CaseFilters>, PostgresError> {
        let query = r#"
            SELECT id, filters
            FROM cases
            WHERE id = ANY($1)
        "#;

        let rows = sqlx::query(query)
            .bind(case_ids.to_vec())
            .fetch_all(&self.pool)
            .await?;

        let mut found = Vec::with_capacity(rows.len());
        for row in &rows {
            let case_id: String = row.try_get("id")?;
            let Json(filters): Json<FilterSpec> = row.try_get("filters")?;
            found.push(CaseFilters { case_id, filters });
        }

        case_ids
            .iter()
            .map(|id| {
                found
                    .iter()
                    .find(|case| &case.case_id == id)
                    .cloned()
                    .ok_or_else(|| PostgresError::NotFound(format!("Case {}", id)))
            })
            .collect()
    }

    /// Participants excluded from recruiting for the given cases
    ///
    /// Everyone invited to these cases or any of their ancestor cases, plus
    /// the blacklist.
    pub async fn excluded_participants(&self, case_ids: &[String]) -> Result<HashSet<String>, PostgresError> {
        let query = r#"
            WITH RECURSIVE lineage AS (
                SELECT id, parent_case_id FROM cases WHERE id = ANY($1)
                UNION
                SELECT c.id, c.parent_case_id
                FROM cases c
                JOIN lineage l ON c.id = l.parent_case_id
            )
            SELECT participant_id FROM case_invites
            WHERE case_id IN (SELECT id FROM lineage)
            UNION
            SELECT participant_id FROM blacklist
        "#;

        let ids: Vec<String> = sqlx::query_scalar(query)
            .bind(case_ids.to_vec())
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!("Excluding {} participants for cases {:?}", ids.len(), case_ids);

        Ok(ids.into_iter().collect())
    }

    /// Query active participants matching every dimension of `spec`
    pub async fn query_candidates(
        &self,
        spec: &FilterSpec,
        exclude: &HashSet<String>,
        limit: usize,
    ) -> Result<Vec<Candidate>, PostgresError> {
        let mut builder = build_candidate_query(spec, exclude, limit);
        let candidates = builder
            .build_query_as::<Candidate>()
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!("Queried {} candidates (limit {})", candidates.len(), limit);

        Ok(candidates)
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, PostgresError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

#[async_trait]
impl CandidateFetch for PostgresClient {
    async fn fetch(
        &self,
        spec: &FilterSpec,
        exclude: &HashSet<String>,
        limit: usize,
    ) -> Result<Vec<Candidate>, FetchError> {
        Ok(self.query_candidates(spec, exclude, limit).await?)
    }
}

#[async_trait]
impl ExclusionResolver for PostgresClient {
    async fn excluded_ids(&self, case_ids: &[String]) -> Result<HashSet<String>, FetchError> {
        Ok(self.excluded_participants(case_ids).await?)
    }
}

fn value_column(field: ValueField) -> &'static str {
    match field {
        ValueField::Gender => "gender",
        ValueField::Race => "race",
        ValueField::PoliticalAffiliation => "political_affiliation",
        ValueField::State => "state",
        ValueField::EducationLevel => "education_level",
        ValueField::MaritalStatus => "marital_status",
        ValueField::FamilyIncome => "family_income",
    }
}

fn eligibility_column(field: EligibilityField) -> &'static str {
    match field {
        EligibilityField::ServedOnJury => "served_on_jury",
        EligibilityField::ConvictedFelon => "convicted_felon",
        EligibilityField::UsCitizen => "us_citizen",
        EligibilityField::HasChildren => "has_children",
        EligibilityField::ServedArmedForces => "served_armed_forces",
        EligibilityField::CurrentlyEmployed => "currently_employed",
        EligibilityField::InternetAccess => "internet_access",
    }
}

/// Translate a filter spec into a participant query
///
/// NULL columns fail every predicate, so missing values never match.
fn build_candidate_query(
    spec: &FilterSpec,
    exclude: &HashSet<String>,
    limit: usize,
) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!(
        "SELECT {} FROM participants WHERE active",
        CANDIDATE_COLUMNS
    ));

    for dimension in spec.dimensions() {
        match dimension {
            FilterDimension::Values(field, values) => {
                builder
                    .push(" AND ")
                    .push(value_column(*field))
                    .push(" = ANY(")
                    .push_bind(values.iter().cloned().collect::<Vec<String>>())
                    .push(")");
            }
            FilterDimension::Age(range) => {
                if let Some(min) = range.min {
                    builder.push(" AND age >= ").push_bind(min);
                }
                if let Some(max) = range.max {
                    builder.push(" AND age <= ").push_bind(max);
                }
            }
            FilterDimension::Availability(days) => {
                let clauses: Vec<&str> = days
                    .iter()
                    .map(|day| match day {
                        Day::Weekdays => "available_weekdays IS TRUE",
                        Day::Weekends => "available_weekends IS TRUE",
                    })
                    .collect();
                builder.push(" AND (").push(clauses.join(" OR ")).push(")");
            }
            FilterDimension::Eligibility(field, answer) => {
                builder
                    .push(" AND ")
                    .push(eligibility_column(*field))
                    .push(" = ")
                    .push_bind(answer.as_bool());
            }
        }
    }

    if !exclude.is_empty() {
        builder
            .push(" AND NOT (id = ANY(")
            .push_bind(exclude.iter().cloned().collect::<Vec<String>>())
            .push("))");
    }

    builder.push(" LIMIT ").push_bind(limit as i64);
    builder
}
