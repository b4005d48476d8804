use crate::core::filters::satisfies_all;
use crate::core::search::{CandidateFetch, ExclusionResolver, FetchError};
use crate::models::{Candidate, FilterSpec};
use async_trait::async_trait;
use std::collections::HashSet;

/// Candidate store held entirely in memory
///
/// Applies the same predicates as the SQL store, in insertion order. Useful for
/// tests, benchmarks and running the engine against a fixture population.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    candidates: Vec<Candidate>,
    blacklist: HashSet<String>,
}

impl InMemoryStore {
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self {
            candidates,
            blacklist: HashSet::new(),
        }
    }

    pub fn with_blacklist<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blacklist.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

#[async_trait]
impl CandidateFetch for InMemoryStore {
    async fn fetch(
        &self,
        spec: &FilterSpec,
        exclude: &HashSet<String>,
        limit: usize,
    ) -> Result<Vec<Candidate>, FetchError> {
        let found: Vec<Candidate> = self
            .candidates
            .iter()
            .filter(|candidate| !exclude.contains(&candidate.id))
            .filter(|candidate| satisfies_all(candidate, spec))
            .take(limit)
            .cloned()
            .collect();

        tracing::trace!("In-memory fetch returned {} candidates", found.len());
        Ok(found)
    }
}

#[async_trait]
impl ExclusionResolver for InMemoryStore {
    async fn excluded_ids(&self, _case_ids: &[String]) -> Result<HashSet<String>, FetchError> {
        Ok(self.blacklist.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ValueField;

    fn create_store() -> InMemoryStore {
        InMemoryStore::new(vec![
            Candidate { state: Some("CA".into()), ..Candidate::new("1") },
            Candidate { state: Some("NY".into()), ..Candidate::new("2") },
            Candidate { state: Some("CA".into()), ..Candidate::new("3") },
            Candidate::new("4"),
        ])
        .with_blacklist(["3"])
    }

    #[tokio::test]
    async fn test_fetch_applies_spec_exclusions_and_limit() {
        let store = create_store();
        let spec = FilterSpec::new().with_values(ValueField::State, ["CA"]);

        let found = store.fetch(&spec, &HashSet::from(["1".to_string()]), 10).await.unwrap();
        let ids: Vec<&str> = found.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["3"]);

        let everyone = store.fetch(&FilterSpec::new(), &HashSet::new(), 2).await.unwrap();
        assert_eq!(everyone.len(), 2);
    }

    #[tokio::test]
    async fn test_blacklist_is_the_exclusion_set() {
        let store = create_store();
        let excluded = store.excluded_ids(&["case-1".to_string()]).await.unwrap();
        assert_eq!(excluded, HashSet::from(["3".to_string()]));
    }
}
