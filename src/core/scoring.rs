use crate::core::filters::dimension_satisfied;
use crate::models::{Candidate, FilterSpec};
use serde::Serialize;
use std::ops::Add;

/// Satisfied / evaluated dimension counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MatchScore {
    pub score: u32,
    pub total: u32,
}

impl MatchScore {
    /// A case passes only when it restricts something and every restriction holds
    pub fn passes(&self) -> bool {
        self.total > 0 && self.score == self.total
    }
}

impl Add for MatchScore {
    type Output = MatchScore;

    fn add(self, other: MatchScore) -> MatchScore {
        MatchScore {
            score: self.score + other.score,
            total: self.total + other.total,
        }
    }
}

/// Score a candidate against one spec
///
/// Every restricting dimension adds one to `total`; each one the candidate
/// satisfies adds one to `score`. Absent dimensions do not count.
pub fn match_score(candidate: &Candidate, spec: &FilterSpec) -> MatchScore {
    spec.dimensions().fold(MatchScore::default(), |acc, dimension| MatchScore {
        score: acc.score + u32::from(dimension_satisfied(candidate, dimension)),
        total: acc.total + 1,
    })
}

#[inline]
pub fn passes_case(candidate: &Candidate, spec: &FilterSpec) -> bool {
    match_score(candidate, spec).passes()
}

/// Sum of per-case scores, each case scored against its own spec
pub fn multi_case_score(candidate: &Candidate, specs: &[FilterSpec]) -> MatchScore {
    specs
        .iter()
        .map(|spec| match_score(candidate, spec))
        .fold(MatchScore::default(), Add::add)
}

/// Number of cases whose criteria the candidate fully satisfies
pub fn case_pass_count(candidate: &Candidate, specs: &[FilterSpec]) -> usize {
    specs.iter().filter(|spec| passes_case(candidate, spec)).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AgeRange, Answer, Day, EligibilityField, FilterDimension, ValueField};

    fn create_test_candidate() -> Candidate {
        Candidate {
            gender: Some("Male".to_string()),
            political_affiliation: Some("Republican".to_string()),
            age: Some(45),
            available_weekdays: Some(true),
            convicted_felon: Some(false),
            ..Candidate::new("p1")
        }
    }

    fn create_test_spec() -> FilterSpec {
        FilterSpec::new()
            .with_values(ValueField::Gender, ["Male", "Female"])
            .with(FilterDimension::Age(AgeRange::between(18, 40)))
            .with(FilterDimension::Availability([Day::Weekdays].into()))
            .with(FilterDimension::Eligibility(EligibilityField::ConvictedFelon, Answer::No))
    }

    #[test]
    fn test_match_score_counts_present_dimensions() {
        let score = match_score(&create_test_candidate(), &create_test_spec());
        assert_eq!(score, MatchScore { score: 3, total: 4 });
        assert!(!score.passes());
    }

    #[test]
    fn test_empty_spec_never_passes() {
        let candidate = create_test_candidate();
        let score = match_score(&candidate, &FilterSpec::new());

        assert_eq!(score, MatchScore::default());
        assert!(!passes_case(&candidate, &FilterSpec::new()));
    }

    #[test]
    fn test_passes_case_when_all_satisfied() {
        let spec = FilterSpec::new().with_values(ValueField::PoliticalAffiliation, ["Republican"]);
        assert!(passes_case(&create_test_candidate(), &spec));
    }

    #[test]
    fn test_multi_case_score_and_pass_count() {
        let candidate = create_test_candidate();
        let specs = vec![
            create_test_spec(),
            FilterSpec::new().with_values(ValueField::PoliticalAffiliation, ["Republican"]),
            FilterSpec::new().with_values(ValueField::PoliticalAffiliation, ["Democrat"]),
            FilterSpec::new(),
        ];

        assert_eq!(multi_case_score(&candidate, &specs), MatchScore { score: 4, total: 6 });
        assert_eq!(case_pass_count(&candidate, &specs), 1);
    }
}
