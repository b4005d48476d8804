use crate::models::{Candidate, Day, FilterCheck, FilterDimension, FilterSpec};
use std::collections::BTreeSet;

/// Check whether a candidate satisfies a single filter dimension
///
/// Missing candidate values never satisfy a restriction.
#[inline]
pub fn dimension_satisfied(candidate: &Candidate, dimension: &FilterDimension) -> bool {
    match dimension {
        FilterDimension::Values(field, allowed) => candidate
            .value(*field)
            .map_or(false, |value| allowed.contains(value)),
        FilterDimension::Age(range) => candidate.age.map_or(false, |age| range.contains(age)),
        FilterDimension::Availability(days) => available_on(candidate, days),
        FilterDimension::Eligibility(field, required) => {
            candidate.answer(*field) == Some(required.as_bool())
        }
    }
}

/// Any requested day the candidate is available on satisfies availability
#[inline]
fn available_on(candidate: &Candidate, days: &BTreeSet<Day>) -> bool {
    (days.contains(&Day::Weekdays) && candidate.available_weekdays == Some(true))
        || (days.contains(&Day::Weekends) && candidate.available_weekends == Some(true))
}

/// Evaluate one dimension into a check with a human-readable detail
pub fn check_dimension(candidate: &Candidate, dimension: &FilterDimension) -> FilterCheck {
    FilterCheck {
        dimension: dimension.key(),
        passes: dimension_satisfied(candidate, dimension),
        detail: describe(candidate, dimension),
    }
}

/// Evaluate every dimension of `spec`, in canonical order
pub fn evaluate_checks(candidate: &Candidate, spec: &FilterSpec) -> Vec<FilterCheck> {
    spec.dimensions()
        .map(|dimension| check_dimension(candidate, dimension))
        .collect()
}

/// True when the candidate satisfies every dimension of `spec`
///
/// An unrestricted spec admits everyone. This is the record-store predicate,
/// unlike `passes_case` which never passes an empty spec.
#[inline]
pub fn satisfies_all(candidate: &Candidate, spec: &FilterSpec) -> bool {
    spec.dimensions()
        .all(|dimension| dimension_satisfied(candidate, dimension))
}

fn describe(candidate: &Candidate, dimension: &FilterDimension) -> String {
    match dimension {
        FilterDimension::Values(field, allowed) => {
            let allowed = join(allowed.iter().map(String::as_str));
            match candidate.value(*field) {
                Some(value) if dimension_satisfied(candidate, dimension) => {
                    format!("{} in [{}]", value, allowed)
                }
                Some(value) => format!("{} not in [{}]", value, allowed),
                None => format!("no value, expected one of [{}]", allowed),
            }
        }
        FilterDimension::Age(range) => match candidate.age {
            Some(age) if range.contains(age) => format!("{} within {}", age, range),
            Some(age) => format!("{} outside {}", age, range),
            None => format!("no age, expected {}", range),
        },
        FilterDimension::Availability(days) => {
            let requested = join(days.iter().map(|day| match day {
                Day::Weekdays => "Weekdays",
                Day::Weekends => "Weekends",
            }));
            format!(
                "weekdays: {}, weekends: {}; requested [{}]",
                yes_no(candidate.available_weekdays),
                yes_no(candidate.available_weekends),
                requested
            )
        }
        FilterDimension::Eligibility(field, required) => {
            format!("{}, required {:?}", yes_no(candidate.answer(*field)), required)
        }
    }
}

fn join<'a>(values: impl Iterator<Item = &'a str>) -> String {
    values.collect::<Vec<_>>().join(", ")
}

fn yes_no(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "Yes",
        Some(false) => "No",
        None => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AgeRange, Answer, EligibilityField, ValueField};

    fn create_test_candidate() -> Candidate {
        Candidate {
            gender: Some("Female".to_string()),
            state: Some("CA".to_string()),
            age: Some(34),
            available_weekdays: Some(false),
            available_weekends: Some(true),
            us_citizen: Some(true),
            ..Candidate::new("p1")
        }
    }

    #[test]
    fn test_value_membership() {
        let candidate = create_test_candidate();
        let dim = FilterDimension::Values(ValueField::State, ["CA".to_string(), "NV".to_string()].into());

        assert!(dimension_satisfied(&candidate, &dim));
        assert_eq!(check_dimension(&candidate, &dim).detail, "CA in [CA, NV]");
    }

    #[test]
    fn test_missing_value_never_matches() {
        let candidate = create_test_candidate();
        let dim = FilterDimension::Values(ValueField::Race, ["Asian".to_string()].into());

        let check = check_dimension(&candidate, &dim);
        assert!(!check.passes);
        assert_eq!(check.detail, "no value, expected one of [Asian]");
    }

    #[test]
    fn test_age_bounds_inclusive() {
        let candidate = create_test_candidate();

        assert!(dimension_satisfied(&candidate, &FilterDimension::Age(AgeRange::between(34, 40))));
        assert!(dimension_satisfied(&candidate, &FilterDimension::Age(AgeRange::between(20, 34))));
        assert!(dimension_satisfied(&candidate, &FilterDimension::Age(AgeRange::new(None, Some(50)))));
        assert!(!dimension_satisfied(&candidate, &FilterDimension::Age(AgeRange::between(35, 60))));
    }

    #[test]
    fn test_inverted_age_range_matches_nobody() {
        let candidate = create_test_candidate();
        assert!(!dimension_satisfied(&candidate, &FilterDimension::Age(AgeRange::between(40, 30))));
    }

    #[test]
    fn test_availability_is_any_requested_day() {
        let candidate = create_test_candidate();

        let both = FilterDimension::Availability([Day::Weekdays, Day::Weekends].into());
        let weekdays = FilterDimension::Availability([Day::Weekdays].into());

        assert!(dimension_satisfied(&candidate, &both));
        assert!(!dimension_satisfied(&candidate, &weekdays));
    }

    #[test]
    fn test_eligibility_equality() {
        let candidate = create_test_candidate();

        assert!(dimension_satisfied(
            &candidate,
            &FilterDimension::Eligibility(EligibilityField::UsCitizen, Answer::Yes)
        ));
        assert!(!dimension_satisfied(
            &candidate,
            &FilterDimension::Eligibility(EligibilityField::UsCitizen, Answer::No)
        ));
        // Unanswered question fails either way
        assert!(!dimension_satisfied(
            &candidate,
            &FilterDimension::Eligibility(EligibilityField::HasChildren, Answer::No)
        ));
    }

    #[test]
    fn test_checks_follow_spec_dimensions() {
        let candidate = create_test_candidate();
        let spec = FilterSpec::new()
            .with_values(ValueField::Gender, ["Male"])
            .with(FilterDimension::Age(AgeRange::between(30, 40)));

        let checks = evaluate_checks(&candidate, &spec);
        assert_eq!(checks.len(), spec.len());
        assert!(!checks[0].passes);
        assert!(checks[1].passes);
        assert!(!satisfies_all(&candidate, &spec));
        assert!(satisfies_all(&candidate, &FilterSpec::new()));
    }
}
