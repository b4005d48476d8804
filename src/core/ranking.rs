use crate::models::MatchedCandidate;

/// Order candidates for presentation
///
/// Stable sort, descending by cases fully satisfied and then by summed
/// per-case score. Ties keep their incoming order.
pub fn rank(mut pool: Vec<MatchedCandidate>) -> Vec<MatchedCandidate> {
    pool.sort_by(|a, b| {
        b.case_pass_count
            .cmp(&a.case_pass_count)
            .then_with(|| b.multi_score.cmp(&a.multi_score))
    });
    pool
}
