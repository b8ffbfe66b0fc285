//! Hamming distance and normalized similarity between fingerprints.
//!
//! All functions are pure and safe to call from any number of threads.

use crate::scanner::Fingerprint;

/// Number of differing bits between two fingerprints of equal width.
///
/// # Panics
///
/// Debug builds assert equal widths; callers filter mismatches beforehand.
#[must_use]
pub fn hamming_distance(a: &Fingerprint, b: &Fingerprint) -> u32 {
    debug_assert_eq!(a.width(), b.width(), "compared fingerprints of unequal width");
    a.as_bytes()
        .iter()
        .zip(b.as_bytes())
        .map(|(x, y)| (x ^ y).count_ones())
        .sum()
}

/// Similarity in `[0, 1]`: one minus the normalized Hamming distance.
///
/// Identical fingerprints score exactly `1.0`.
///
/// # Example
///
/// ```
/// use simdupe::duplicates::similarity;
/// use simdupe::scanner::Fingerprint;
///
/// let a = Fingerprint::from_u64(0);
/// let b = Fingerprint::from_u64(1);
/// assert_eq!(similarity(&a, &a), 1.0);
/// assert_eq!(similarity(&a, &b), 1.0 - 1.0 / 64.0);
/// ```
#[must_use]
pub fn similarity(a: &Fingerprint, b: &Fingerprint) -> f64 {
    let distance = hamming_distance(a, b);
    if distance == 0 {
        return 1.0;
    }
    1.0 - f64::from(distance) / f64::from(a.width())
}

/// Like [`similarity`], but `None` when the widths differ.
#[must_use]
pub fn try_similarity(a: &Fingerprint, b: &Fingerprint) -> Option<f64> {
    (a.width() == b.width()).then(|| similarity(a, b))
}
