//! Overlap percentage between two sets of file hashes.

/// Percentage of the smaller set that is shared, rounded to one decimal
/// with exact halves going to the even digit.
///
/// Returns `0.0` when either set is empty. The result always lies in
/// `[0, 100]`.
pub fn similarity_percent(common: usize, unique_a: usize, unique_b: usize) -> f64 {
    let smaller = unique_a.min(unique_b);
    if smaller == 0 {
        return 0.0;
    }
    let ratio = common as f64 / smaller as f64 * 100.0;
    round_tenth(ratio).clamp(0.0, 100.0)
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}
