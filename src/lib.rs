//! Recruit Algo - candidate matching and relaxation engine for study recruitment
//!
//! Merges the criteria of one or more cases, widens the search by dropping
//! criteria in a fixed priority order until enough participants are found,
//! and ranks them by how many cases they fully satisfy.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{combine, relax, rank, CandidateFetch, CandidateSearch, ExclusionResolver, SearchOptions, SearchOutcome};
pub use models::{Candidate, FilterSpec, MatchedCandidate, SearchCandidatesRequest, SearchCandidatesResponse};
