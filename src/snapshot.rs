use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::metrics::{growth_gap, share_of_search, share_of_voice, GapScheme, GapStatus};
use crate::EngineInput;

/// Per-entity row of a snapshot, used for tables and charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandMetrics {
    pub name: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub is_own_brand: bool,
    pub volume: u64,
    pub sos: f64,
    pub sov: f64,
    pub visible_volume: u64,
    pub gap: f64,
}

/// One immutable computation of every metric for a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Creation year-month, `YYYY-MM`.
    pub date: String,
    pub timestamp: DateTime<Utc>,
    pub brand_name: String,
    pub brand_volume: u64,
    pub total_brand_volume: u64,
    pub total_market_volume: u64,
    #[serde(default)]
    pub market_keyword_count: usize,
    pub sos: f64,
    pub sov: f64,
    pub visible_volume: u64,
    pub gap: f64,
    pub status: GapStatus,
    pub all_brands: Vec<BrandMetrics>,
}

impl Snapshot {
    pub fn brand_row(&self) -> Option<&BrandMetrics> {
        self.all_brands.iter().find(|row| row.is_own_brand)
    }

    /// Rows ordered by SOS, highest first. Ties keep input order, so the
    /// brand wins a tie against any competitor.
    pub fn ranked_by_sos(&self) -> Vec<&BrandMetrics> {
        let mut rows: Vec<&BrandMetrics> = self.all_brands.iter().collect();
        rows.sort_by(|a, b| b.sos.total_cmp(&a.sos));
        rows
    }

    pub fn trend_from(&self, previous: &Snapshot) -> SnapshotTrend {
        SnapshotTrend {
            sos_delta: self.sos - previous.sos,
            sov_delta: self.sov - previous.sov,
            gap_delta: self.gap - previous.gap,
            status_changed: self.status != previous.status,
        }
    }
}

/// Change between the two most recent snapshots. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotTrend {
    pub sos_delta: f64,
    pub sov_delta: f64,
    pub gap_delta: f64,
    pub status_changed: bool,
}

/// Trend of the last entry against the one before it; `history` must be
/// ordered by timestamp.
pub fn trend_for(history: &[Snapshot]) -> Option<SnapshotTrend> {
    match history {
        [.., previous, latest] => Some(latest.trend_from(previous)),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotAssembler {
    scheme: GapScheme,
}

impl SnapshotAssembler {
    pub fn new(scheme: GapScheme) -> Self {
        Self { scheme }
    }

    pub fn scheme(&self) -> GapScheme {
        self.scheme
    }

    pub fn assemble(&self, input: &EngineInput, at: DateTime<Utc>) -> Snapshot {
        let entities = input.entities();
        let sos = share_of_search(&entities);
        let sov = share_of_voice(
            &entities,
            &input.market_keywords,
            &input.positions,
            input.total_market_volume_override,
        );

        let all_brands: Vec<BrandMetrics> = entities
            .iter()
            .enumerate()
            .map(|(index, entity)| BrandMetrics {
                name: entity.name.clone(),
                domain: entity.domain.clone(),
                is_own_brand: entity.is_own_brand,
                volume: entity.volume,
                sos: sos.share(index),
                sov: sov.share(index),
                visible_volume: round_volume(sov.visible_volume(index)),
                gap: sov.share(index) - sos.share(index),
            })
            .collect();

        // Index 0 is always the brand.
        let brand_sos = sos.share(0);
        let brand_sov = sov.share(0);
        let gap = growth_gap(brand_sos, brand_sov, self.scheme);

        Snapshot {
            date: at.format("%Y-%m").to_string(),
            timestamp: at,
            brand_name: input.brand.name.clone(),
            brand_volume: input.brand.volume,
            total_brand_volume: sos.total_brand_volume,
            total_market_volume: sov.total_market_volume,
            market_keyword_count: input.market_keywords.len(),
            sos: brand_sos,
            sov: brand_sov,
            visible_volume: round_volume(sov.visible_volume(0)),
            gap: gap.value,
            status: gap.status,
            all_brands,
        }
    }
}

fn round_volume(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}
