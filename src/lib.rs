pub mod config;
pub mod metrics;
pub mod recommend;
pub mod snapshot;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use metrics::{GapScheme, GapStatus};
pub use recommend::{
    generate_recommendations, Priority, Recommendation, RecommendationContext, RecommendationEngine,
};
pub use snapshot::{trend_for, BrandMetrics, Snapshot, SnapshotAssembler, SnapshotTrend};

/// A brand or competitor taking part in one computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub name: String,
    #[serde(default)]
    pub domain: Option<String>,
    /// Monthly branded-search estimate.
    #[serde(default)]
    pub volume: u64,
    #[serde(default)]
    pub is_own_brand: bool,
}

impl Entity {
    pub fn brand(name: impl Into<String>, volume: u64) -> Self {
        Self {
            name: name.into(),
            domain: None,
            volume,
            is_own_brand: true,
        }
    }

    pub fn competitor(name: impl Into<String>, volume: u64) -> Self {
        Self {
            name: name.into(),
            domain: None,
            volume,
            is_own_brand: false,
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }
}

/// Non-brand category term. Order only matters for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketKeyword {
    pub keyword: String,
    #[serde(default)]
    pub volume: u64,
}

impl MarketKeyword {
    pub fn new(keyword: impl Into<String>, volume: u64) -> Self {
        Self {
            keyword: keyword.into(),
            volume,
        }
    }
}

/// Sparse keyword index → entity name → SERP rank.
///
/// A missing entry means "not ranked within the observed depth".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositionMatrix {
    ranks: BTreeMap<usize, BTreeMap<String, u32>>,
}

impl PositionMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, keyword_index: usize, entity: impl Into<String>, position: u32) {
        self.ranks
            .entry(keyword_index)
            .or_default()
            .insert(entity.into(), position);
    }

    pub fn with(mut self, keyword_index: usize, entity: impl Into<String>, position: u32) -> Self {
        self.set(keyword_index, entity, position);
        self
    }

    pub fn position(&self, keyword_index: usize, entity: &str) -> Option<u32> {
        self.ranks
            .get(&keyword_index)
            .and_then(|row| row.get(entity))
            .copied()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.values().all(|row| row.is_empty())
    }
}

/// Everything the engine needs for one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineInput {
    pub brand: Entity,
    #[serde(default)]
    pub competitors: Vec<Entity>,
    #[serde(default)]
    pub market_keywords: Vec<MarketKeyword>,
    #[serde(default)]
    pub positions: PositionMatrix,
    /// Denominator supplied by keyword expansion; replaces the keyword sum when positive.
    #[serde(default)]
    pub total_market_volume_override: Option<u64>,
}

impl EngineInput {
    pub fn new(brand: Entity) -> Self {
        Self {
            brand,
            competitors: Vec::new(),
            market_keywords: Vec::new(),
            positions: PositionMatrix::default(),
            total_market_volume_override: None,
        }
    }

    /// The brand first, then competitors in input order, with `is_own_brand`
    /// normalised so exactly one entity is the brand.
    pub fn entities(&self) -> Vec<Entity> {
        let mut brand = self.brand.clone();
        brand.is_own_brand = true;

        std::iter::once(brand)
            .chain(self.competitors.iter().cloned().map(|mut competitor| {
                competitor.is_own_brand = false;
                competitor
            }))
            .collect()
    }
}

pub fn compute_snapshot(input: &EngineInput) -> Snapshot {
    compute_snapshot_at(input, Utc::now())
}

pub fn compute_snapshot_at(input: &EngineInput, at: DateTime<Utc>) -> Snapshot {
    SnapshotAssembler::default().assemble(input, at)
}

pub fn format_number(value: f64) -> String {
    let rounded = value.round().max(0.0) as u64;
    let digits = rounded.to_string();
    let mut result = String::with_capacity(digits.len() + digits.len() / 3);

    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }

    result
}

/// Formats a value that is already a percentage (`15.61` → `15.6%`).
pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value)
}

pub fn format_signed(value: f64) -> String {
    if value > 0.0 {
        format!("+{:.1}", value)
    } else {
        format!("{:.1}", value)
    }
}
