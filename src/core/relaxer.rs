use crate::models::{FilterGroup, FilterSpec};

/// Filter groups in the order they are dropped, most disposable first
pub const RELAXATION_ORDER: [FilterGroup; 7] = [
    FilterGroup::Location,
    FilterGroup::Age,
    FilterGroup::Race,
    FilterGroup::Gender,
    FilterGroup::Socioeconomic,
    FilterGroup::Eligibility,
    FilterGroup::PoliticalAffiliation,
];

/// Level at which every group has been dropped
pub const MAX_RELAXATION_LEVEL: usize = RELAXATION_ORDER.len();

/// Groups removed at `level`
pub fn dropped_groups(level: usize) -> &'static [FilterGroup] {
    &RELAXATION_ORDER[..level.min(MAX_RELAXATION_LEVEL)]
}

/// Copy of `spec` with the first `level` groups of the relaxation order removed
pub fn relax(spec: &FilterSpec, level: usize) -> FilterSpec {
    spec.without_groups(dropped_groups(level))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AgeRange, Answer, EligibilityField, FilterDimension, ValueField};

    fn full_spec() -> FilterSpec {
        FilterSpec::new()
            .with_values(ValueField::State, ["CA"])
            .with(FilterDimension::Age(AgeRange::between(18, 65)))
            .with_values(ValueField::Race, ["Black"])
            .with_values(ValueField::Gender, ["Female"])
            .with_values(ValueField::EducationLevel, ["Bachelor"])
            .with(FilterDimension::Eligibility(EligibilityField::UsCitizen, Answer::Yes))
            .with_values(ValueField::PoliticalAffiliation, ["Independent"])
    }

    #[test]
    fn test_level_zero_is_identity() {
        let spec = full_spec();
        assert_eq!(relax(&spec, 0), spec);
    }

    #[test]
    fn test_level_one_drops_location_only() {
        let relaxed = relax(&full_spec(), 1);
        assert!(!relaxed.has_group(FilterGroup::Location));
        assert_eq!(relaxed.len(), full_spec().len() - 1);
    }

    #[test]
    fn test_political_affiliation_dropped_last() {
        let six = relax(&full_spec(), 6);
        assert_eq!(six.len(), 1);
        assert!(six.has_group(FilterGroup::PoliticalAffiliation));

        assert!(relax(&full_spec(), 7).is_unrestricted());
        assert!(relax(&full_spec(), 12).is_unrestricted());
    }

    #[test]
    fn test_socioeconomic_drops_as_a_group() {
        let spec = FilterSpec::new()
            .with_values(ValueField::MaritalStatus, ["Married"])
            .with_values(ValueField::FamilyIncome, ["50k-75k"]);

        assert_eq!(relax(&spec, 4), spec);
        assert!(relax(&spec, 5).is_unrestricted());
    }
}
