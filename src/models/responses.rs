use serde::Serialize;
use crate::core::search::LevelReport;
use crate::models::domain::MatchedCandidate;
use crate::models::filters::{FilterGroup, FilterSpec};
use crate::services::CacheStats;

/// Response for the candidate search endpoint
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCandidatesResponse {
    pub search_id: String,
    pub candidates: Vec<MatchedCandidate>,
    pub combined_filter: FilterSpec,
    pub total_found: usize,
    pub min_required: usize,
    pub under_filled: bool,
    pub levels: Vec<LevelReport>,
    pub generated_at: chrono::DateTime<chrono::Utc>,
}

/// Response for the filter preview endpoint
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CombineFiltersResponse {
    pub combined: FilterSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relaxed: Option<FilterSpec>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dropped_groups: Vec<FilterGroup>,
}

/// Health check response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Absent when the service runs without a cache
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheStats>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
