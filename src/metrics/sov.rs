use crate::metrics::ctr::ctr;
use crate::metrics::sos::percent_of;
use crate::{Entity, MarketKeyword, PositionMatrix};

/// CTR-weighted visibility for every entity, in input order.
///
/// `visible_volumes` are kept unrounded; callers round once when presenting.
#[derive(Debug, Clone, PartialEq)]
pub struct SovBreakdown {
    pub total_market_volume: u64,
    pub visible_volumes: Vec<f64>,
    pub shares: Vec<f64>,
}

impl SovBreakdown {
    pub fn share(&self, index: usize) -> f64 {
        self.shares.get(index).copied().unwrap_or(0.0)
    }

    pub fn visible_volume(&self, index: usize) -> f64 {
        self.visible_volumes.get(index).copied().unwrap_or(0.0)
    }
}

/// Sum of the supplied keyword volumes, or the externally expanded market
/// volume when one is given and positive.
///
/// The numerator only ever covers the supplied keyword/position pairs, so a
/// broadened denominator yields a conservative SOV.
pub fn market_volume(keywords: &[MarketKeyword], override_volume: Option<u64>) -> u64 {
    match override_volume {
        Some(volume) if volume > 0 => volume,
        _ => keywords
            .iter()
            .fold(0u64, |total, keyword| total.saturating_add(keyword.volume)),
    }
}

pub fn visible_volume(entity: &Entity, keywords: &[MarketKeyword], positions: &PositionMatrix) -> f64 {
    keywords
        .iter()
        .enumerate()
        .map(|(index, keyword)| keyword.volume as f64 * ctr(positions.position(index, &entity.name)))
        .sum()
}

pub fn share_of_voice(
    entities: &[Entity],
    keywords: &[MarketKeyword],
    positions: &PositionMatrix,
    override_volume: Option<u64>,
) -> SovBreakdown {
    let total_market_volume = market_volume(keywords, override_volume);

    let visible_volumes: Vec<f64> = entities
        .iter()
        .map(|entity| visible_volume(entity, keywords, positions))
        .collect();

    let shares = visible_volumes
        .iter()
        .map(|visible| percent_of(*visible, total_market_volume as f64).clamp(0.0, 100.0))
        .collect();

    SovBreakdown {
        total_market_volume,
        visible_volumes,
        shares,
    }
}
