use crate::models::{
    AgeRange, CombinedFilterSpec, EligibilityField, FilterDimension, FilterSpec, ValueField,
};
use std::collections::BTreeSet;

/// Lower age bound assumed for a spec that leaves `min` open
pub const DEFAULT_MIN_AGE: i32 = 0;
/// Upper age bound assumed for a spec that leaves `max` open
pub const DEFAULT_MAX_AGE: i32 = 100;

/// Merge per-case criteria into one combined spec
///
/// - Set fields: intersection of the specs that restrict the field. An empty
///   intersection leaves the field unrestricted.
/// - Age: highest `min` and lowest `max` across the specs that restrict age.
///   Disjoint windows produce an inverted range, which is kept as-is.
/// - Eligibility: the first restricting answer in input order wins.
pub fn combine(specs: &[FilterSpec]) -> CombinedFilterSpec {
    match specs {
        [] => FilterSpec::new(),
        [single] => single.clone(),
        _ => {
            let mut combined = FilterSpec::new();

            for field in ValueField::ALL {
                if let Some(values) = intersect(specs.iter().filter_map(|spec| spec.values(field))) {
                    combined.insert(FilterDimension::Values(field, values));
                } else if specs.iter().filter(|spec| spec.values(field).is_some()).count() > 1 {
                    tracing::debug!("Conflicting {} filters, leaving unrestricted", field.name());
                }
            }

            if let Some(range) = combine_age(specs) {
                combined.insert(FilterDimension::Age(range));
            }

            if let Some(days) = intersect(specs.iter().filter_map(|spec| spec.availability())) {
                combined.insert(FilterDimension::Availability(days));
            }

            for field in EligibilityField::ALL {
                if let Some(answer) = combine_eligibility(specs, field) {
                    combined.insert(FilterDimension::Eligibility(field, answer));
                }
            }

            combined
        }
    }
}

/// Intersect every restricting set; `None` when nothing restricts or the
/// intersection is empty
fn intersect<'a, T>(mut sets: impl Iterator<Item = &'a BTreeSet<T>>) -> Option<BTreeSet<T>>
where
    T: Ord + Clone + 'a,
{
    let first = sets.next()?.clone();
    let merged = sets.fold(first, |acc, set| acc.intersection(set).cloned().collect());
    (!merged.is_empty()).then_some(merged)
}

fn combine_age(specs: &[FilterSpec]) -> Option<AgeRange> {
    let ranges: Vec<&AgeRange> = specs.iter().filter_map(|spec| spec.age()).collect();
    if ranges.is_empty() {
        return None;
    }

    let min = ranges
        .iter()
        .map(|range| range.min.unwrap_or(DEFAULT_MIN_AGE))
        .max()
        .unwrap_or(DEFAULT_MIN_AGE);
    let max = ranges
        .iter()
        .map(|range| range.max.unwrap_or(DEFAULT_MAX_AGE))
        .min()
        .unwrap_or(DEFAULT_MAX_AGE);

    if min > max {
        tracing::debug!("Combined age range is inverted ({}-{})", min, max);
    }

    Some(AgeRange::between(min, max))
}

fn combine_eligibility(specs: &[FilterSpec], field: EligibilityField) -> Option<crate::models::Answer> {
    let mut answers = specs.iter().filter_map(|spec| spec.eligibility(field));
    let first = answers.next()?;
    if answers.any(|answer| answer != first) {
        tracing::debug!("Conflicting {} requirements, keeping {:?}", field.name(), first);
    }
    Some(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Answer, Day};

    fn genders(values: &[&str]) -> FilterSpec {
        FilterSpec::new().with_values(ValueField::Gender, values.iter().copied())
    }

    #[test]
    fn test_empty_and_single() {
        assert!(combine(&[]).is_unrestricted());

        let spec = genders(&["M"]).with(FilterDimension::Age(AgeRange::new(Some(30), None)));
        assert_eq!(combine(&[spec.clone()]), spec);
    }

    #[test]
    fn test_set_intersection() {
        let combined = combine(&[genders(&["M"]), genders(&["M", "F"])]);
        assert_eq!(combined.values(ValueField::Gender), Some(&BTreeSet::from(["M".to_string()])));
    }

    #[test]
    fn test_unrestricted_plus_restricted() {
        let combined = combine(&[FilterSpec::new(), genders(&["M"])]);
        assert_eq!(combined.values(ValueField::Gender), Some(&BTreeSet::from(["M".to_string()])));
    }

    #[test]
    fn test_empty_intersection_falls_back_to_unrestricted() {
        let combined = combine(&[genders(&["M"]), genders(&["F"])]);
        assert!(combined.values(ValueField::Gender).is_none());
        assert!(combined.is_unrestricted());
    }

    #[test]
    fn test_age_narrows_and_may_invert() {
        let a = FilterSpec::new().with(FilterDimension::Age(AgeRange::between(20, 30)));
        let b = FilterSpec::new().with(FilterDimension::Age(AgeRange::between(40, 50)));

        assert_eq!(combine(&[a, b]).age(), Some(&AgeRange::between(40, 30)));
    }

    #[test]
    fn test_age_defaults_for_open_bounds() {
        let a = FilterSpec::new().with(FilterDimension::Age(AgeRange::new(Some(25), None)));
        let b = FilterSpec::new().with(FilterDimension::Age(AgeRange::new(None, Some(60))));
        let c = FilterSpec::new();

        assert_eq!(combine(&[a.clone(), c]).age(), Some(&AgeRange::between(25, 100)));
        assert_eq!(combine(&[a, b]).age(), Some(&AgeRange::between(25, 60)));
    }

    #[test]
    fn test_eligibility_first_wins() {
        let yes = FilterSpec::new().with(FilterDimension::Eligibility(EligibilityField::HasChildren, Answer::Yes));
        let no = FilterSpec::new().with(FilterDimension::Eligibility(EligibilityField::HasChildren, Answer::No));

        assert_eq!(
            combine(&[FilterSpec::new(), no.clone(), yes.clone()]).eligibility(EligibilityField::HasChildren),
            Some(Answer::No)
        );
        assert_eq!(
            combine(&[yes, no]).eligibility(EligibilityField::HasChildren),
            Some(Answer::Yes)
        );
    }

    #[test]
    fn test_availability_intersection() {
        let a = FilterSpec::new().with(FilterDimension::Availability([Day::Weekdays, Day::Weekends].into()));
        let b = FilterSpec::new().with(FilterDimension::Availability([Day::Weekends].into()));

        assert_eq!(combine(&[a, b]).availability(), Some(&BTreeSet::from([Day::Weekends])));
    }
}
