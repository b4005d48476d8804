// Core engine exports
pub mod combiner;
pub mod filters;
pub mod ranking;
pub mod relaxer;
pub mod scoring;
pub mod search;

pub use combiner::combine;
pub use filters::{check_dimension, dimension_satisfied, evaluate_checks, satisfies_all};
pub use ranking::rank;
pub use relaxer::{dropped_groups, relax, MAX_RELAXATION_LEVEL, RELAXATION_ORDER};
pub use scoring::{case_pass_count, match_score, multi_case_score, passes_case, MatchScore};
pub use search::{
    absorb_batch, CandidateFetch, CandidateSearch, ExclusionResolver, FetchError, KeepOrder,
    LevelReport, RandomShuffle, SearchError, SearchOptions, SearchOutcome, SearchState, Shuffle,
};
