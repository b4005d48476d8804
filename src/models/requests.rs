use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::models::filters::FilterSpec;

/// Request to search candidates for one or more cases
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SearchCandidatesRequest {
    #[validate(length(min = 1, max = 20))]
    #[serde(alias = "case_ids", rename = "caseIds")]
    pub case_ids: Vec<String>,
    #[validate(range(min = 1, max = 1000))]
    #[serde(default, alias = "min_required", rename = "minRequired")]
    pub min_required: Option<usize>,
    /// Fixes the candidate shuffle, for reproducible searches
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Request to preview the combined (and optionally relaxed) filter for a set of specs
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CombineFiltersRequest {
    #[validate(length(max = 50))]
    pub specs: Vec<FilterSpec>,
    #[validate(range(max = 7))]
    #[serde(default)]
    pub level: Option<usize>,
}
