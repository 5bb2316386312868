/// Sistrix-style click-through curve for the first results page, indexed by `position - 1`.
pub const SISTRIX_CTR_CURVE: [f64; 10] = [
    0.316, 0.241, 0.186, 0.133, 0.095, 0.062, 0.042, 0.031, 0.026, 0.023,
];

/// Flat CTR for positions 11-20.
pub const PAGE_TWO_CTR: f64 = 0.01;
/// Flat CTR for positions 21-50.
pub const DEEP_CTR: f64 = 0.005;
/// Flat CTR for positions 51-100.
pub const TAIL_CTR: f64 = 0.001;

pub const MAX_TRACKED_POSITION: u32 = 100;

/// Highest CTR any single ranking can earn.
pub const MAX_CTR: f64 = SISTRIX_CTR_CURVE[0];

/// Estimated click-through rate for a SERP position. Unranked, `0` and
/// anything deeper than [`MAX_TRACKED_POSITION`] earn nothing.
pub fn ctr(position: Option<u32>) -> f64 {
    match position {
        None | Some(0) => 0.0,
        Some(p @ 1..=10) => SISTRIX_CTR_CURVE[(p - 1) as usize],
        Some(11..=20) => PAGE_TWO_CTR,
        Some(21..=50) => DEEP_CTR,
        Some(51..=MAX_TRACKED_POSITION) => TAIL_CTR,
        Some(_) => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_page_uses_curve() {
        assert!((ctr(Some(1)) - 0.316).abs() < 1e-9);
        assert!((ctr(Some(10)) - 0.023).abs() < 1e-9);
    }

    #[test]
    fn tiers_beyond_first_page() {
        assert_eq!(ctr(Some(11)), PAGE_TWO_CTR);
        assert_eq!(ctr(Some(20)), PAGE_TWO_CTR);
        assert_eq!(ctr(Some(21)), DEEP_CTR);
        assert_eq!(ctr(Some(50)), DEEP_CTR);
        assert_eq!(ctr(Some(51)), TAIL_CTR);
        assert_eq!(ctr(Some(100)), TAIL_CTR);
    }

    #[test]
    fn untracked_positions_earn_nothing() {
        assert_eq!(ctr(None), 0.0);
        assert_eq!(ctr(Some(0)), 0.0);
        assert_eq!(ctr(Some(101)), 0.0);
    }
}
