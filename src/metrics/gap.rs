use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Canonical growth-gap threshold, in percentage points.
pub const STANDARD_GAP_THRESHOLD: f64 = 5.0;
/// Threshold used by the narrower competitor-analysis scheme.
pub const NARROW_GAP_THRESHOLD: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapStatus {
    Growing,
    Declining,
    Neutral,
    GrowthPotential,
    MissingOpportunities,
    Balanced,
}

impl GapStatus {
    pub fn label(self) -> &'static str {
        match self {
            GapStatus::Growing => "growing",
            GapStatus::Declining => "declining",
            GapStatus::Neutral => "neutral",
            GapStatus::GrowthPotential => "growth_potential",
            GapStatus::MissingOpportunities => "missing_opportunities",
            GapStatus::Balanced => "balanced",
        }
    }

    pub fn interpretation(self) -> &'static str {
        match self {
            GapStatus::Growing | GapStatus::GrowthPotential => {
                "Visibility is ahead of demand; expect brand search share to grow."
            }
            GapStatus::Declining | GapStatus::MissingOpportunities => {
                "Visibility trails demand; competitors capture clicks your brand could earn."
            }
            GapStatus::Neutral | GapStatus::Balanced => {
                "Visibility and demand are in line with each other."
            }
        }
    }

    pub fn is_positive(self) -> bool {
        matches!(self, GapStatus::Growing | GapStatus::GrowthPotential)
    }

    pub fn is_negative(self) -> bool {
        matches!(self, GapStatus::Declining | GapStatus::MissingOpportunities)
    }

    /// The scheme that produces this status.
    pub fn scheme(self) -> GapScheme {
        match self {
            GapStatus::Growing | GapStatus::Declining | GapStatus::Neutral => GapScheme::Standard,
            GapStatus::GrowthPotential
            | GapStatus::MissingOpportunities
            | GapStatus::Balanced => GapScheme::Narrow,
        }
    }
}

/// Three-way classification of `sov - sos`.
///
/// `Standard` is the shared default. `Narrow` exists for the competitor
/// analysis view, which reads smaller gaps as actionable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GapScheme {
    #[default]
    Standard,
    Narrow,
}

impl FromStr for GapScheme {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "standard" | "default" => Ok(GapScheme::Standard),
            "narrow" | "competitor" => Ok(GapScheme::Narrow),
            other => Err(format!("unknown gap scheme: {}", other)),
        }
    }
}

impl GapScheme {

    pub fn label(self) -> &'static str {
        match self {
            GapScheme::Standard => "standard",
            GapScheme::Narrow => "narrow",
        }
    }

    pub fn threshold(self) -> f64 {
        match self {
            GapScheme::Standard => STANDARD_GAP_THRESHOLD,
            GapScheme::Narrow => NARROW_GAP_THRESHOLD,
        }
    }

    pub fn classify(self, gap: f64) -> GapStatus {
        let threshold = self.threshold();
        match self {
            GapScheme::Standard if gap > threshold => GapStatus::Growing,
            GapScheme::Standard if gap < -threshold => GapStatus::Declining,
            GapScheme::Standard => GapStatus::Neutral,
            GapScheme::Narrow if gap > threshold => GapStatus::GrowthPotential,
            GapScheme::Narrow if gap < -threshold => GapStatus::MissingOpportunities,
            GapScheme::Narrow => GapStatus::Balanced,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthGap {
    pub value: f64,
    pub status: GapStatus,
}

pub fn growth_gap(sos: f64, sov: f64, scheme: GapScheme) -> GrowthGap {
    let value = sov - sos;
    GrowthGap {
        value,
        status: scheme.classify(value),
    }
}
