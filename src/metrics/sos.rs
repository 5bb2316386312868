use crate::Entity;

/// Share of Search for every entity, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct SosBreakdown {
    pub total_brand_volume: u64,
    pub shares: Vec<f64>,
}

impl SosBreakdown {
    pub fn share(&self, index: usize) -> f64 {
        self.shares.get(index).copied().unwrap_or(0.0)
    }
}

/// Every entity, the analysed brand included, counts towards the denominator.
pub fn share_of_search(entities: &[Entity]) -> SosBreakdown {
    let total_brand_volume = entities
        .iter()
        .fold(0u64, |total, entity| total.saturating_add(entity.volume));

    let shares = entities
        .iter()
        .map(|entity| percent_of(entity.volume as f64, total_brand_volume as f64))
        .collect();

    SosBreakdown {
        total_brand_volume,
        shares,
    }
}

pub(crate) fn percent_of(part: f64, total: f64) -> f64 {
    if total > 0.0 && part.is_finite() {
        part / total * 100.0
    } else {
        0.0
    }
}
