use actix_web::{web, HttpResponse, Responder};
use validator::Validate;
use crate::core::{
    combine, dropped_groups, relax, CandidateSearch, ExclusionResolver, RandomShuffle, SearchError,
};
use crate::models::{
    CombineFiltersRequest, CombineFiltersResponse, ErrorResponse, FilterSpec, HealthResponse,
    SearchCandidatesRequest, SearchCandidatesResponse,
};
use crate::services::{CacheManager, CaseFilters, PostgresClient, PostgresError};
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub postgres: Arc<PostgresClient>,
    pub cache: Option<Arc<CacheManager>>,
    pub search: CandidateSearch,
    pub shuffle_seed: Option<u64>,
}

/// Configure all candidate-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/candidates/search", web::post().to(search_candidates))
        .route("/filters/combine", web::post().to(combine_filters));
}

fn error_response(status: actix_web::http::StatusCode, error: &str, message: String) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse {
        error: error.to_string(),
        message,
        status_code: status.as_u16(),
    })
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let pg_healthy = state.postgres.health_check().await.unwrap_or(false);

    let status = if pg_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        cache: state.cache.as_ref().map(|cache| cache.stats()),
        timestamp: chrono::Utc::now(),
    })
}

/// Load each case's filters, from cache where possible
async fn load_case_filters(state: &AppState, case_ids: &[String]) -> Result<Vec<FilterSpec>, PostgresError> {
    let mut cached = Vec::with_capacity(case_ids.len());
    for case_id in case_ids {
        cached.push(match &state.cache {
            Some(cache) => cache.case_filters(case_id).await,
            None => None,
        });
    }

    let mut missing: Vec<String> = Vec::new();
    for (case_id, hit) in case_ids.iter().zip(&cached) {
        if hit.is_none() && !missing.contains(case_id) {
            missing.push(case_id.clone());
        }
    }

    if missing.is_empty() {
        return merge_case_filters(case_ids, cached, &[]);
    }

    let loaded = state.postgres.case_filters(&missing).await?;
    if let Some(cache) = &state.cache {
        for case in &loaded {
            cache.store_case_filters(&case.case_id, &case.filters).await;
        }
    }

    merge_case_filters(case_ids, cached, &loaded)
}

/// Line up cached and freshly loaded filters with the requested case order
///
/// `cached` holds one slot per requested id. A slot left empty must be filled
/// from `loaded`, otherwise the case is reported as not found.
fn merge_case_filters(
    case_ids: &[String],
    cached: Vec<Option<FilterSpec>>,
    loaded: &[CaseFilters],
) -> Result<Vec<FilterSpec>, PostgresError> {
    case_ids
        .iter()
        .zip(cached)
        .map(|(case_id, hit)| match hit {
            Some(filters) => Ok(filters),
            None => loaded
                .iter()
                .find(|case| &case.case_id == case_id)
                .map(|case| case.filters.clone())
                .ok_or_else(|| PostgresError::NotFound(format!("Case {}", case_id))),
        })
        .collect()
}

/// Search candidates for a set of cases
///
/// POST /api/v1/candidates/search
///
/// Request body:
/// ```json
/// {
///   "caseIds": ["string"],
///   "minRequired": 50,
///   "seed": 42
/// }
/// ```
async fn search_candidates(
    state: web::Data<AppState>,
    req: web::Json<SearchCandidatesRequest>,
) -> impl Responder {
    use actix_web::http::StatusCode;

    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for search request: {:?}", errors);
        return error_response(StatusCode::BAD_REQUEST, "Validation failed", errors.to_string());
    }

    let search = match req.min_required {
        Some(min_required) => state.search.with_min_required(min_required),
        None => state.search,
    };

    tracing::info!(
        "Searching candidates for cases {:?} (min required {})",
        req.case_ids,
        search.options().min_required
    );

    let specs = match load_case_filters(&state, &req.case_ids).await {
        Ok(specs) => specs,
        Err(PostgresError::NotFound(message)) => {
            return error_response(StatusCode::NOT_FOUND, "Case not found", message);
        }
        Err(e) => {
            tracing::error!("Failed to load case filters: {}", e);
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load case filters",
                e.to_string(),
            );
        }
    };

    let exclusions = match state.postgres.excluded_ids(&req.case_ids).await {
        Ok(ids) => ids,
        Err(e) => {
            tracing::error!("Failed to resolve exclusions for {:?}: {}", req.case_ids, e);
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to resolve exclusions",
                e.to_string(),
            );
        }
    };

    let mut shuffle = match req.seed.or(state.shuffle_seed) {
        Some(seed) => RandomShuffle::seeded(seed),
        None => RandomShuffle::from_entropy(),
    };

    let outcome = match search
        .search(&specs, exclusions, state.postgres.as_ref(), &mut shuffle)
        .await
    {
        Ok(outcome) => outcome,
        Err(e @ SearchError::AllLevelsFailed { .. }) => {
            tracing::error!("Candidate search failed: {}", e);
            return error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "Candidate store unavailable",
                e.to_string(),
            );
        }
    };

    if outcome.is_under_filled() {
        tracing::info!(
            "Only {} of {} requested candidates found for cases {:?}",
            outcome.candidates.len(),
            outcome.min_required,
            req.case_ids
        );
    }

    let under_filled = outcome.is_under_filled();
    HttpResponse::Ok().json(SearchCandidatesResponse {
        search_id: uuid::Uuid::new_v4().to_string(),
        total_found: outcome.total_found,
        min_required: outcome.min_required,
        under_filled,
        candidates: outcome.candidates,
        combined_filter: outcome.combined,
        levels: outcome.levels,
        generated_at: chrono::Utc::now(),
    })
}

/// Preview combined and relaxed filters
///
/// POST /api/v1/filters/combine
///
/// Request body:
/// ```json
/// {
///   "specs": [{ "gender": ["Female"] }, { "age": { "min": 30 } }],
///   "level": 2
/// }
/// ```
async fn combine_filters(req: web::Json<CombineFiltersRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        return error_response(
            actix_web::http::StatusCode::BAD_REQUEST,
            "Validation failed",
            errors.to_string(),
        );
    }

    let combined = combine(&req.specs);
    let relaxed = req.level.map(|level| relax(&combined, level));
    let dropped = req.level.map(|level| dropped_groups(level).to_vec()).unwrap_or_default();

    HttpResponse::Ok().json(CombineFiltersResponse {
        combined,
        relaxed,
        dropped_groups: dropped,
    })
}
