use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Set-valued demographic fields. The candidate holds a single value for each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ValueField {
    Gender,
    Race,
    PoliticalAffiliation,
    State,
    EducationLevel,
    MaritalStatus,
    FamilyIncome,
}

impl ValueField {
    pub const ALL: [ValueField; 7] = [
        ValueField::Gender,
        ValueField::Race,
        ValueField::PoliticalAffiliation,
        ValueField::State,
        ValueField::EducationLevel,
        ValueField::MaritalStatus,
        ValueField::FamilyIncome,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ValueField::Gender => "gender",
            ValueField::Race => "race",
            ValueField::PoliticalAffiliation => "politicalAffiliation",
            ValueField::State => "location.state",
            ValueField::EducationLevel => "socioeconomic.educationLevel",
            ValueField::MaritalStatus => "socioeconomic.maritalStatus",
            ValueField::FamilyIncome => "socioeconomic.familyIncome",
        }
    }

    pub fn group(self) -> FilterGroup {
        match self {
            ValueField::Gender => FilterGroup::Gender,
            ValueField::Race => FilterGroup::Race,
            ValueField::PoliticalAffiliation => FilterGroup::PoliticalAffiliation,
            ValueField::State => FilterGroup::Location,
            ValueField::EducationLevel
            | ValueField::MaritalStatus
            | ValueField::FamilyIncome => FilterGroup::Socioeconomic,
        }
    }
}

/// Yes/No screening questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EligibilityField {
    ServedOnJury,
    ConvictedFelon,
    UsCitizen,
    HasChildren,
    ServedArmedForces,
    CurrentlyEmployed,
    InternetAccess,
}

impl EligibilityField {
    pub const ALL: [EligibilityField; 7] = [
        EligibilityField::ServedOnJury,
        EligibilityField::ConvictedFelon,
        EligibilityField::UsCitizen,
        EligibilityField::HasChildren,
        EligibilityField::ServedArmedForces,
        EligibilityField::CurrentlyEmployed,
        EligibilityField::InternetAccess,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EligibilityField::ServedOnJury => "eligibility.servedOnJury",
            EligibilityField::ConvictedFelon => "eligibility.convictedFelon",
            EligibilityField::UsCitizen => "eligibility.usCitizen",
            EligibilityField::HasChildren => "eligibility.hasChildren",
            EligibilityField::ServedArmedForces => "eligibility.servedArmedForces",
            EligibilityField::CurrentlyEmployed => "eligibility.currentlyEmployed",
            EligibilityField::InternetAccess => "eligibility.internetAccess",
        }
    }
}

/// Top-level filter groups. Relaxation drops whole groups at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterGroup {
    Location,
    Age,
    Race,
    Gender,
    Socioeconomic,
    Eligibility,
    PoliticalAffiliation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Day {
    Weekdays,
    Weekends,
}

/// A restricting eligibility answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Answer {
    Yes,
    No,
}

impl Answer {
    pub fn as_bool(self) -> bool {
        matches!(self, Answer::Yes)
    }
}

/// Eligibility value as it appears on the wire; `Any` never restricts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EligibilityValue {
    Yes,
    No,
    Any,
}

impl EligibilityValue {
    fn restriction(self) -> Option<Answer> {
        match self {
            EligibilityValue::Yes => Some(Answer::Yes),
            EligibilityValue::No => Some(Answer::No),
            EligibilityValue::Any => None,
        }
    }
}

/// Inclusive age bounds. An omitted bound is unbounded on that side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AgeRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<i32>,
}

impl AgeRange {
    pub fn new(min: Option<i32>, max: Option<i32>) -> Self {
        Self { min, max }
    }

    pub fn between(min: i32, max: i32) -> Self {
        Self { min: Some(min), max: Some(max) }
    }

    pub fn contains(&self, age: i32) -> bool {
        self.min.map_or(true, |min| age >= min) && self.max.map_or(true, |max| age <= max)
    }

    fn restricts(&self) -> bool {
        self.min.is_some() || self.max.is_some()
    }
}

impl fmt::Display for AgeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (Some(min), Some(max)) => write!(f, "{}-{}", min, max),
            (Some(min), None) => write!(f, "{}+", min),
            (None, Some(max)) => write!(f, "up to {}", max),
            (None, None) => write!(f, "any age"),
        }
    }
}

/// Identifies one scorable dimension of a filter spec.
///
/// The derived ordering is the canonical order of per-dimension checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DimensionKey {
    Value(ValueField),
    Age,
    Availability,
    Eligibility(EligibilityField),
}

impl DimensionKey {
    pub fn name(self) -> &'static str {
        match self {
            DimensionKey::Value(field) => field.name(),
            DimensionKey::Age => "age",
            DimensionKey::Availability => "socioeconomic.availability",
            DimensionKey::Eligibility(field) => field.name(),
        }
    }

    pub fn group(self) -> FilterGroup {
        match self {
            DimensionKey::Value(field) => field.group(),
            DimensionKey::Age => FilterGroup::Age,
            DimensionKey::Availability => FilterGroup::Socioeconomic,
            DimensionKey::Eligibility(_) => FilterGroup::Eligibility,
        }
    }
}

impl fmt::Display for DimensionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for DimensionKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// One restricting criterion with its typed payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterDimension {
    Values(ValueField, BTreeSet<String>),
    Age(AgeRange),
    Availability(BTreeSet<Day>),
    Eligibility(EligibilityField, Answer),
}

impl FilterDimension {
    pub fn key(&self) -> DimensionKey {
        match self {
            FilterDimension::Values(field, _) => DimensionKey::Value(*field),
            FilterDimension::Age(_) => DimensionKey::Age,
            FilterDimension::Availability(_) => DimensionKey::Availability,
            FilterDimension::Eligibility(field, _) => DimensionKey::Eligibility(*field),
        }
    }

    /// Whether this criterion actually narrows the population
    pub fn restricts(&self) -> bool {
        match self {
            FilterDimension::Values(_, set) => !set.is_empty(),
            FilterDimension::Age(range) => range.restricts(),
            FilterDimension::Availability(days) => !days.is_empty(),
            FilterDimension::Eligibility(..) => true,
        }
    }
}

/// Recruitment criteria for one case, or the merge of several cases.
///
/// Only restricting dimensions are stored; an absent dimension means
/// "no restriction". Serializes to the nested JSON document shape used by
/// case storage and the HTTP API.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "FilterSpecDocument", into = "FilterSpecDocument")]
pub struct FilterSpec {
    dimensions: BTreeMap<DimensionKey, FilterDimension>,
}

/// Merged criteria across every active case
pub type CombinedFilterSpec = FilterSpec;

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, dimension: FilterDimension) -> Self {
        self.insert(dimension);
        self
    }

    pub fn with_values<I, S>(self, field: ValueField, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with(FilterDimension::Values(
            field,
            values.into_iter().map(Into::into).collect(),
        ))
    }

    /// Insert a dimension, replacing any previous one with the same key.
    /// Non-restricting dimensions are discarded.
    pub fn insert(&mut self, dimension: FilterDimension) {
        let key = dimension.key();
        if dimension.restricts() {
            self.dimensions.insert(key, dimension);
        } else {
            self.dimensions.remove(&key);
        }
    }

    pub fn get(&self, key: DimensionKey) -> Option<&FilterDimension> {
        self.dimensions.get(&key)
    }

    pub fn values(&self, field: ValueField) -> Option<&BTreeSet<String>> {
        match self.dimensions.get(&DimensionKey::Value(field)) {
            Some(FilterDimension::Values(_, set)) => Some(set),
            _ => None,
        }
    }

    pub fn age(&self) -> Option<&AgeRange> {
        match self.dimensions.get(&DimensionKey::Age) {
            Some(FilterDimension::Age(range)) => Some(range),
            _ => None,
        }
    }

    pub fn availability(&self) -> Option<&BTreeSet<Day>> {
        match self.dimensions.get(&DimensionKey::Availability) {
            Some(FilterDimension::Availability(days)) => Some(days),
            _ => None,
        }
    }

    pub fn eligibility(&self, field: EligibilityField) -> Option<Answer> {
        match self.dimensions.get(&DimensionKey::Eligibility(field)) {
            Some(FilterDimension::Eligibility(_, answer)) => Some(*answer),
            _ => None,
        }
    }

    /// Dimensions in canonical order
    pub fn dimensions(&self) -> impl Iterator<Item = &FilterDimension> {
        self.dimensions.values()
    }

    pub fn len(&self) -> usize {
        self.dimensions.len()
    }

    pub fn is_unrestricted(&self) -> bool {
        self.dimensions.is_empty()
    }

    pub fn has_group(&self, group: FilterGroup) -> bool {
        self.dimensions.keys().any(|key| key.group() == group)
    }

    /// Copy of this spec without any dimension belonging to `groups`
    pub fn without_groups(&self, groups: &[FilterGroup]) -> Self {
        Self {
            dimensions: self
                .dimensions
                .iter()
                .filter(|(key, _)| !groups.contains(&key.group()))
                .map(|(key, dimension)| (*key, dimension.clone()))
                .collect(),
        }
    }
}

// Wire documents

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FilterSpecDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    gender: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    race: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    political_affiliation: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    age: Option<AgeRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    location: Option<LocationDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    socioeconomic: Option<SocioeconomicDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    eligibility: Option<EligibilityDocument>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LocationDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    state: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SocioeconomicDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    education_level: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    marital_status: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    family_income: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    availability: Option<Vec<Day>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EligibilityDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    served_on_jury: Option<EligibilityValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    convicted_felon: Option<EligibilityValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    us_citizen: Option<EligibilityValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    has_children: Option<EligibilityValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    served_armed_forces: Option<EligibilityValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    currently_employed: Option<EligibilityValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    internet_access: Option<EligibilityValue>,
}

impl EligibilityDocument {
    fn slot(&mut self, field: EligibilityField) -> &mut Option<EligibilityValue> {
        match field {
            EligibilityField::ServedOnJury => &mut self.served_on_jury,
            EligibilityField::ConvictedFelon => &mut self.convicted_felon,
            EligibilityField::UsCitizen => &mut self.us_citizen,
            EligibilityField::HasChildren => &mut self.has_children,
            EligibilityField::ServedArmedForces => &mut self.served_armed_forces,
            EligibilityField::CurrentlyEmployed => &mut self.currently_employed,
            EligibilityField::InternetAccess => &mut self.internet_access,
        }
    }
}

impl From<FilterSpecDocument> for FilterSpec {
    fn from(doc: FilterSpecDocument) -> Self {
        let mut spec = FilterSpec::new();
        let put_values = |spec: &mut FilterSpec, field: ValueField, values: Option<Vec<String>>| {
            if let Some(values) = values {
                spec.insert(FilterDimension::Values(field, values.into_iter().collect()));
            }
        };

        put_values(&mut spec, ValueField::Gender, doc.gender);
        put_values(&mut spec, ValueField::Race, doc.race);
        put_values(&mut spec, ValueField::PoliticalAffiliation, doc.political_affiliation);

        if let Some(age) = doc.age {
            spec.insert(FilterDimension::Age(age));
        }

        if let Some(location) = doc.location {
            put_values(&mut spec, ValueField::State, location.state);
        }

        if let Some(socio) = doc.socioeconomic {
            put_values(&mut spec, ValueField::EducationLevel, socio.education_level);
            put_values(&mut spec, ValueField::MaritalStatus, socio.marital_status);
            put_values(&mut spec, ValueField::FamilyIncome, socio.family_income);
            if let Some(days) = socio.availability {
                spec.insert(FilterDimension::Availability(days.into_iter().collect()));
            }
        }

        if let Some(mut eligibility) = doc.eligibility {
            for field in EligibilityField::ALL {
                if let Some(answer) = (*eligibility.slot(field)).and_then(EligibilityValue::restriction) {
                    spec.insert(FilterDimension::Eligibility(field, answer));
                }
            }
        }

        spec
    }
}

impl From<FilterSpec> for FilterSpecDocument {
    fn from(spec: FilterSpec) -> Self {
        let mut doc = FilterSpecDocument::default();
        let mut location = LocationDocument::default();
        let mut socio = SocioeconomicDocument::default();
        let mut eligibility = EligibilityDocument::default();
        let mut has_location = false;
        let mut has_socio = false;
        let mut has_eligibility = false;

        for dimension in spec.dimensions.into_values() {
            match dimension {
                FilterDimension::Values(field, set) => {
                    let values = Some(set.into_iter().collect());
                    match field {
                        ValueField::Gender => doc.gender = values,
                        ValueField::Race => doc.race = values,
                        ValueField::PoliticalAffiliation => doc.political_affiliation = values,
                        ValueField::State => {
                            location.state = values;
                            has_location = true;
                        }
                        ValueField::EducationLevel => {
                            socio.education_level = values;
                            has_socio = true;
                        }
                        ValueField::MaritalStatus => {
                            socio.marital_status = values;
                            has_socio = true;
                        }
                        ValueField::FamilyIncome => {
                            socio.family_income = values;
                            has_socio = true;
                        }
                    }
                }
                FilterDimension::Age(range) => doc.age = Some(range),
                FilterDimension::Availability(days) => {
                    socio.availability = Some(days.into_iter().collect());
                    has_socio = true;
                }
                FilterDimension::Eligibility(field, answer) => {
                    *eligibility.slot(field) = Some(match answer {
                        Answer::Yes => EligibilityValue::Yes,
                        Answer::No => EligibilityValue::No,
                    });
                    has_eligibility = true;
                }
            }
        }

        doc.location = has_location.then_some(location);
        doc.socioeconomic = has_socio.then_some(socio);
        doc.eligibility = has_eligibility.then_some(eligibility);
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_nested_document() {
        let spec: FilterSpec = serde_json::from_value(json!({
            "gender": ["Female"],
            "age": { "min": 21, "max": 40 },
            "location": { "state": ["CA", "NY"] },
            "socioeconomic": { "availability": ["Weekends"], "maritalStatus": [] },
            "eligibility": { "usCitizen": "Yes", "hasChildren": "Any" }
        }))
        .unwrap();

        assert_eq!(spec.len(), 5);
        assert_eq!(spec.age(), Some(&AgeRange::between(21, 40)));
        assert_eq!(spec.eligibility(EligibilityField::UsCitizen), Some(Answer::Yes));
        assert_eq!(spec.eligibility(EligibilityField::HasChildren), None);
        // Empty arrays do not restrict
        assert!(spec.values(ValueField::MaritalStatus).is_none());
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let spec: FilterSpec = serde_json::from_value(json!({
            "shoeSize": [42],
            "race": ["Asian"]
        }))
        .unwrap();

        assert_eq!(spec.len(), 1);
        assert!(spec.has_group(FilterGroup::Race));
    }

    #[test]
    fn test_serializes_back_to_nested_shape() {
        let spec = FilterSpec::new()
            .with_values(ValueField::State, ["TX"])
            .with(FilterDimension::Eligibility(EligibilityField::ConvictedFelon, Answer::No));

        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(
            value,
            json!({
                "location": { "state": ["TX"] },
                "eligibility": { "convictedFelon": "No" }
            })
        );
    }

    #[test]
    fn test_empty_age_range_does_not_restrict() {
        let spec = FilterSpec::new().with(FilterDimension::Age(AgeRange::default()));
        assert!(spec.is_unrestricted());
    }

    #[test]
    fn test_age_range_display() {
        assert_eq!(AgeRange::between(20, 30).to_string(), "20-30");
        assert_eq!(AgeRange::new(Some(65), None).to_string(), "65+");
    }
}
