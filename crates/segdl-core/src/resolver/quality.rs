//! Quality tier selection among candidate URLs.

/// Tiers tried in order; the first tier with any match wins.
const QUALITY_TIERS: [&str; 4] = ["1080", "720", "480", "240"];

/// Longest candidate in the best available tier, or the longest overall when no
/// candidate names a tier. On equal length the earlier candidate wins.
pub fn best_quality<C: AsRef<str>>(candidates: &[C]) -> Option<&C> {
    QUALITY_TIERS
        .iter()
        .find_map(|tier| longest(candidates.iter().filter(|c| c.as_ref().contains(tier))))
        .or_else(|| longest(candidates.iter()))
}

fn longest<'a, C: AsRef<str> + 'a>(candidates: impl Iterator<Item = &'a C>) -> Option<&'a C> {
    candidates.reduce(|best, c| {
        if c.as_ref().len() > best.as_ref().len() {
            c
        } else {
            best
        }
    })
}
