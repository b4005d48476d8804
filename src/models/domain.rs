use serde::{Deserialize, Serialize};
use crate::models::filters::{DimensionKey, EligibilityField, ValueField};

/// A person under consideration for a case
///
/// Every demographic value is optional. A missing value never satisfies a
/// restriction on that dimension.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub race: Option<String>,
    #[serde(default)]
    pub political_affiliation: Option<String>,
    #[serde(default)]
    pub age: Option<i32>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub education_level: Option<String>,
    #[serde(default)]
    pub marital_status: Option<String>,
    #[serde(default)]
    pub family_income: Option<String>,
    #[serde(default)]
    pub available_weekdays: Option<bool>,
    #[serde(default)]
    pub available_weekends: Option<bool>,
    #[serde(default)]
    pub served_on_jury: Option<bool>,
    #[serde(default)]
    pub convicted_felon: Option<bool>,
    #[serde(default)]
    pub us_citizen: Option<bool>,
    #[serde(default)]
    pub has_children: Option<bool>,
    #[serde(default)]
    pub served_armed_forces: Option<bool>,
    #[serde(default)]
    pub currently_employed: Option<bool>,
    #[serde(default)]
    pub internet_access: Option<bool>,
}

impl Candidate {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// The candidate's value for a set-valued field
    pub fn value(&self, field: ValueField) -> Option<&str> {
        let value = match field {
            ValueField::Gender => &self.gender,
            ValueField::Race => &self.race,
            ValueField::PoliticalAffiliation => &self.political_affiliation,
            ValueField::State => &self.state,
            ValueField::EducationLevel => &self.education_level,
            ValueField::MaritalStatus => &self.marital_status,
            ValueField::FamilyIncome => &self.family_income,
        };
        value.as_deref()
    }

    /// The candidate's answer to an eligibility question
    pub fn answer(&self, field: EligibilityField) -> Option<bool> {
        match field {
            EligibilityField::ServedOnJury => self.served_on_jury,
            EligibilityField::ConvictedFelon => self.convicted_felon,
            EligibilityField::UsCitizen => self.us_citizen,
            EligibilityField::HasChildren => self.has_children,
            EligibilityField::ServedArmedForces => self.served_armed_forces,
            EligibilityField::CurrentlyEmployed => self.currently_employed,
            EligibilityField::InternetAccess => self.internet_access,
        }
    }
}

/// Outcome of evaluating one dimension against a candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterCheck {
    pub dimension: DimensionKey,
    pub passes: bool,
    pub detail: String,
}

/// Badge shown to the operator for how a candidate was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Exact,
    Partial,
    Fallback,
}

/// Candidate annotated by the search engine
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedCandidate {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub match_level: usize,
    pub match_kind: MatchKind,
    pub filter_checks: Vec<FilterCheck>,
    pub case_pass_count: usize,
    pub multi_score: u32,
    pub multi_total: u32,
}

impl MatchedCandidate {
    pub fn new(candidate: Candidate, match_level: usize, filter_checks: Vec<FilterCheck>) -> Self {
        Self {
            candidate,
            match_level,
            match_kind: MatchKind::for_level(match_level),
            filter_checks,
            case_pass_count: 0,
            multi_score: 0,
            multi_total: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.candidate.id
    }

    pub fn passes_all_checks(&self) -> bool {
        self.filter_checks.iter().all(|check| check.passes)
    }
}

impl MatchKind {
    pub fn for_level(level: usize) -> Self {
        match level {
            0 => MatchKind::Exact,
            l if l >= crate::core::relaxer::MAX_RELAXATION_LEVEL => MatchKind::Fallback,
            _ => MatchKind::Partial,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_kind_for_level() {
        assert_eq!(MatchKind::for_level(0), MatchKind::Exact);
        assert_eq!(MatchKind::for_level(1), MatchKind::Partial);
        assert_eq!(MatchKind::for_level(6), MatchKind::Partial);
        assert_eq!(MatchKind::for_level(7), MatchKind::Fallback);
    }

    #[test]
    fn test_candidate_deserializes_with_missing_fields() {
        let candidate: Candidate = serde_json::from_str(r#"{"id":"p1","gender":"Female","age":33}"#).unwrap();

        assert_eq!(candidate.value(ValueField::Gender), Some("Female"));
        assert_eq!(candidate.value(ValueField::Race), None);
        assert_eq!(candidate.answer(EligibilityField::UsCitizen), None);
    }
}
