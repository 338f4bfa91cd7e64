use std::cmp::Ordering;

use crate::models::RankedResult;

/// Orders results by final score, best first.
///
/// Ties are broken by ascending film identifier so the order never depends on
/// the order candidates arrived in.
pub fn rank(mut results: Vec<RankedResult<'_>>) -> Vec<RankedResult<'_>> {
    results.sort_by(compare);
    results
}

/// Ranks the full candidate set, then keeps the best `k`
pub fn rank_top_k(results: Vec<RankedResult<'_>>, k: usize) -> Vec<RankedResult<'_>> {
    let mut ranked = rank(results);
    ranked.truncate(k);
    ranked
}

fn compare(a: &RankedResult<'_>, b: &RankedResult<'_>) -> Ordering {
    b.final_score()
        .total_cmp(&a.final_score())
        .then_with(|| a.film.id.cmp(&b.film.id))
}
