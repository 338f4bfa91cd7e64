/// Clamps `value` into `[lo, hi]`. NaN maps to `lo`.
pub fn clamp(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        return lo;
    }
    value.max(lo).min(hi)
}

/// Maps a raw cosine similarity (nominally [-1, 1]) into [0, 1].
///
/// Input is not trusted: values drifting outside the cosine range are clamped.
pub fn normalize(raw_similarity: f64) -> f64 {
    clamp((raw_similarity + 1.0) / 2.0, 0.0, 1.0)
}
