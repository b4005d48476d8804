// Model exports
pub mod domain;
pub mod filters;
pub mod requests;
pub mod responses;

pub use domain::{Candidate, FilterCheck, MatchKind, MatchedCandidate};
pub use filters::{
    AgeRange, Answer, CombinedFilterSpec, Day, DimensionKey, EligibilityField, EligibilityValue,
    FilterDimension, FilterGroup, FilterSpec, ValueField,
};
pub use requests::{CombineFiltersRequest, SearchCandidatesRequest};
pub use responses::{CombineFiltersResponse, ErrorResponse, HealthResponse, SearchCandidatesResponse};
