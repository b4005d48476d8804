use crate::core::{
    combiner::combine,
    filters::evaluate_checks,
    ranking::rank,
    relaxer::{relax, MAX_RELAXATION_LEVEL},
    scoring::{case_pass_count, multi_case_score},
};
use crate::models::{Candidate, CombinedFilterSpec, FilterSpec, MatchedCandidate};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;

/// Errors raised by a candidate store
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Candidate store unavailable: {0}")]
    Unavailable(String),

    #[error("Candidate query failed: {0}")]
    Query(String),
}

/// Errors that end a search
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("All {attempts} relaxation levels failed to fetch candidates: {source}")]
    AllLevelsFailed {
        attempts: usize,
        #[source]
        source: FetchError,
    },
}

/// Record store capable of answering filter queries
#[async_trait]
pub trait CandidateFetch: Send + Sync {
    /// Fetch up to `limit` candidates satisfying every dimension of `spec`,
    /// skipping any id in `exclude`
    async fn fetch(
        &self,
        spec: &FilterSpec,
        exclude: &HashSet<String>,
        limit: usize,
    ) -> Result<Vec<Candidate>, FetchError>;
}

/// Supplies participant ids that must never be offered for the given cases
/// (blacklisted, already invited, or recruited by an ancestor case)
#[async_trait]
pub trait ExclusionResolver: Send + Sync {
    async fn excluded_ids(&self, case_ids: &[String]) -> Result<HashSet<String>, FetchError>;
}

/// Reorders each fetched batch before it joins the pool
pub trait Shuffle: Send {
    fn shuffle(&mut self, batch: &mut [Candidate]);
}

/// Uniform random shuffle backed by a seedable RNG
pub struct RandomShuffle {
    rng: StdRng,
}

impl RandomShuffle {
    pub fn from_entropy() -> Self {
        Self { rng: StdRng::from_entropy() }
    }

    pub fn seeded(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }
}

impl Shuffle for RandomShuffle {
    fn shuffle(&mut self, batch: &mut [Candidate]) {
        if batch.len() > 1 {
            batch.shuffle(&mut self.rng);
        }
    }
}

/// Leaves store order untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepOrder;

impl Shuffle for KeepOrder {
    fn shuffle(&mut self, _batch: &mut [Candidate]) {}
}

/// Search tuning
#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    /// Pool size at which widening stops
    pub min_required: usize,
    /// Extra rows requested per level to absorb duplicates
    pub fetch_pad: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            min_required: 50,
            fetch_pad: 20,
        }
    }
}

/// What happened at one relaxation level
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelReport {
    pub level: usize,
    pub requested: usize,
    pub fetched: usize,
    pub added: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Ranked search result
///
/// `candidates` is capped at `min_required`. The last level fetched usually
/// overshoots by up to `fetch_pad` rows, and the lowest-ranked of those are
/// dropped from `candidates` but still counted in `total_found`.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub candidates: Vec<MatchedCandidate>,
    pub combined: CombinedFilterSpec,
    pub levels: Vec<LevelReport>,
    /// Unique candidates assembled, including any cut by the `min_required` cap
    pub total_found: usize,
    pub min_required: usize,
}

impl SearchOutcome {
    /// Fewer candidates than requested after exhausting every level
    pub fn is_under_filled(&self) -> bool {
        self.candidates.len() < self.min_required
    }
}

/// Accumulator threaded through the relaxation levels
#[derive(Debug, Default)]
pub struct SearchState {
    pub seen: HashSet<String>,
    pub pool: Vec<MatchedCandidate>,
    pub levels: Vec<LevelReport>,
    last_error: Option<FetchError>,
}

impl SearchState {
    pub fn new(exclusions: HashSet<String>) -> Self {
        Self {
            seen: exclusions,
            ..Default::default()
        }
    }

    fn failed_levels(&self) -> usize {
        self.levels.iter().filter(|report| report.error.is_some()).count()
    }
}

/// Add a fetched batch to the pool
///
/// Already-seen ids are skipped. A candidate returned at level 0 that does not
/// pass every combined-filter check is labelled level 1.
pub fn absorb_batch(
    mut state: SearchState,
    batch: Vec<Candidate>,
    level: usize,
    combined: &CombinedFilterSpec,
) -> SearchState {
    for candidate in batch {
        if !state.seen.insert(candidate.id.clone()) {
            continue;
        }

        let checks = evaluate_checks(&candidate, combined);
        let match_level = if level == 0 && !checks.iter().all(|check| check.passes) {
            1
        } else {
            level
        };

        state.pool.push(MatchedCandidate::new(candidate, match_level, checks));
    }
    state
}

/// Widen-until-enough candidate search across one or more cases
///
/// # Pipeline Stages
/// 1. Combine per-case criteria
/// 2. Fetch at increasing relaxation levels until the pool is large enough
/// 3. Score every candidate against each case's own criteria
/// 4. Rank and cap the result at `min_required`
#[derive(Debug, Clone, Copy, Default)]
pub struct CandidateSearch {
    options: SearchOptions,
}

impl CandidateSearch {
    pub fn new(options: SearchOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> SearchOptions {
        self.options
    }

    /// Copy of this search with a different target pool size
    pub fn with_min_required(self, min_required: usize) -> Self {
        Self {
            options: SearchOptions {
                min_required,
                ..self.options
            },
        }
    }

    /// Run the search
    ///
    /// # Arguments
    /// * `specs` - Each case's own criteria
    /// * `exclusions` - Ids that must never be returned
    /// * `store` - Record store queried once per level
    /// * `shuffle` - Applied to each fetched batch
    ///
    /// # Returns
    /// The ranked outcome, which may hold fewer than `min_required` candidates.
    /// Fails only when every attempted level fails to fetch.
    pub async fn search<F>(
        &self,
        specs: &[FilterSpec],
        exclusions: HashSet<String>,
        store: &F,
        shuffle: &mut dyn Shuffle,
    ) -> Result<SearchOutcome, SearchError>
    where
        F: CandidateFetch + ?Sized,
    {
        let min_required = self.options.min_required;
        let combined = combine(specs);

        let mut state = SearchState::new(exclusions);
        for level in 0..=MAX_RELAXATION_LEVEL {
            if state.pool.len() >= min_required {
                break;
            }
            state = self.search_level(state, &combined, level, store, shuffle).await;
        }

        let attempts = state.levels.len();
        if attempts > 0 && state.failed_levels() == attempts {
            if let Some(source) = state.last_error.take() {
                return Err(SearchError::AllLevelsFailed { attempts, source });
            }
        }

        let SearchState { pool, levels, .. } = state;
        let total_found = pool.len();

        let scored = pool
            .into_iter()
            .map(|mut matched| {
                let multi = multi_case_score(&matched.candidate, specs);
                matched.multi_score = multi.score;
                matched.multi_total = multi.total;
                matched.case_pass_count = case_pass_count(&matched.candidate, specs);
                matched
            })
            .collect();

        let mut candidates = rank(scored);
        candidates.truncate(min_required);

        tracing::info!(
            "Search over {} case(s) found {} candidates (returning {}, wanted {})",
            specs.len(),
            total_found,
            candidates.len(),
            min_required
        );

        Ok(SearchOutcome {
            candidates,
            combined,
            levels,
            total_found,
            min_required,
        })
    }

    /// Fetch, shuffle and absorb one relaxation level
    async fn search_level<F>(
        &self,
        mut state: SearchState,
        combined: &CombinedFilterSpec,
        level: usize,
        store: &F,
        shuffle: &mut dyn Shuffle,
    ) -> SearchState
    where
        F: CandidateFetch + ?Sized,
    {
        let relaxed = relax(combined, level);
        let requested = self.options.min_required.saturating_sub(state.pool.len()) + self.options.fetch_pad;

        match store.fetch(&relaxed, &state.seen, requested).await {
            Ok(mut batch) => {
                shuffle.shuffle(&mut batch);
                let fetched = batch.len();
                let before = state.pool.len();

                state = absorb_batch(state, batch, level, combined);
                let added = state.pool.len() - before;

                tracing::debug!(
                    "Level {}: requested {}, fetched {}, added {} (pool {})",
                    level,
                    requested,
                    fetched,
                    added,
                    state.pool.len()
                );

                state.levels.push(LevelReport {
                    level,
                    requested,
                    fetched,
                    added,
                    error: None,
                });
            }
            Err(e) => {
                tracing::warn!("Fetch failed at relaxation level {}, continuing: {}", level, e);
                state.levels.push(LevelReport {
                    level,
                    requested,
                    fetched: 0,
                    added: 0,
                    error: Some(e.to_string()),
                });
                state.last_error = Some(e);
            }
        }

        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::filters::satisfies_all;
    use crate::models::ValueField;

    struct VecStore(Vec<Candidate>);

    #[async_trait]
    impl CandidateFetch for VecStore {
        async fn fetch(
            &self,
            spec: &FilterSpec,
            exclude: &HashSet<String>,
            limit: usize,
        ) -> Result<Vec<Candidate>, FetchError> {
            Ok(self
                .0
                .iter()
                .filter(|c| !exclude.contains(&c.id) && satisfies_all(c, spec))
                .take(limit)
                .cloned()
                .collect())
        }
    }

    struct DownStore;

    #[async_trait]
    impl CandidateFetch for DownStore {
        async fn fetch(
            &self,
            _spec: &FilterSpec,
            _exclude: &HashSet<String>,
            _limit: usize,
        ) -> Result<Vec<Candidate>, FetchError> {
            Err(FetchError::Unavailable("connection refused".to_string()))
        }
    }

    fn person(id: &str, gender: &str) -> Candidate {
        Candidate {
            gender: Some(gender.to_string()),
            ..Candidate::new(id)
        }
    }

    #[test]
    fn test_absorb_skips_seen_and_reclassifies() {
        let combined = FilterSpec::new().with_values(ValueField::Gender, ["Female"]);
        let state = SearchState::new(HashSet::from(["blocked".to_string()]));

        let state = absorb_batch(
            state,
            vec![
                person("a", "Female"),
                person("blocked", "Female"),
                person("b", "Male"),
                person("a", "Female"),
            ],
            0,
            &combined,
        );

        assert_eq!(state.pool.len(), 2);
        assert_eq!(state.pool[0].match_level, 0);
        assert_eq!(state.pool[1].id(), "b");
        assert_eq!(state.pool[1].match_level, 1);
        assert!(state.seen.contains("b"));
    }

    #[test]
    fn test_shuffle_noop_on_small_batches() {
        let mut shuffle = RandomShuffle::seeded(7);
        let mut empty: Vec<Candidate> = vec![];
        let mut single = vec![person("only", "Male")];

        shuffle.shuffle(&mut empty);
        shuffle.shuffle(&mut single);

        assert!(empty.is_empty());
        assert_eq!(single[0].id, "only");
    }

    #[test]
    fn test_seeded_shuffle_is_reproducible() {
        let batch: Vec<Candidate> = (0..20).map(|i| person(&i.to_string(), "Male")).collect();

        let mut a = batch.clone();
        let mut b = batch.clone();
        RandomShuffle::seeded(42).shuffle(&mut a);
        RandomShuffle::seeded(42).shuffle(&mut b);

        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_stops_once_filled() {
        let store = VecStore((0..10).map(|i| person(&format!("f{}", i), "Female")).collect());
        let search = CandidateSearch::new(SearchOptions { min_required: 3, fetch_pad: 0 });
        let specs = vec![FilterSpec::new().with_values(ValueField::Gender, ["Female"])];

        let outcome = search
            .search(&specs, HashSet::new(), &store, &mut KeepOrder)
            .await
            .unwrap();

        assert_eq!(outcome.levels.len(), 1);
        assert_eq!(outcome.candidates.len(), 3);
        assert!(!outcome.is_under_filled());
        // The level was asked for exactly three rows, so nothing is cut
        assert_eq!(outcome.total_found, 3);
    }

    #[tokio::test]
    async fn test_every_level_failing_is_an_error() {
        let search = CandidateSearch::default();
        let specs = vec![FilterSpec::new().with_values(ValueField::Gender, ["Female"])];

        let result = search
            .search(&specs, HashSet::new(), &DownStore, &mut KeepOrder)
            .await;

        match result {
            Err(SearchError::AllLevelsFailed { attempts, .. }) => {
                assert_eq!(attempts, MAX_RELAXATION_LEVEL + 1)
            }
            other => panic!("expected AllLevelsFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_exhaustion_returns_partial_pool() {
        let store = VecStore(vec![person("a", "Female"), person("b", "Male")]);
        let search = CandidateSearch::default();
        let specs = vec![FilterSpec::new().with_values(ValueField::Gender, ["Female"])];

        let outcome = search
            .search(&specs, HashSet::new(), &store, &mut KeepOrder)
            .await
            .unwrap();

        assert_eq!(outcome.levels.len(), MAX_RELAXATION_LEVEL + 1);
        assert_eq!(outcome.candidates.len(), 2);
        assert!(outcome.is_under_filled());
        assert_eq!(outcome.candidates[0].id(), "a");
        assert_eq!(outcome.candidates[0].case_pass_count, 1);
    }
}
