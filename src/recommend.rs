use serde::{Deserialize, Serialize};

use crate::snapshot::Snapshot;

/// Brand SOV below this (in percent) is flagged as low category visibility.
pub const LOW_SOV_THRESHOLD: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub priority: Priority,
    pub title: String,
    pub message: String,
}

impl Recommendation {
    fn new(priority: Priority, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            priority,
            title: title.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationContext {
    pub market_keyword_count: usize,
}

impl RecommendationContext {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self {
            market_keyword_count: snapshot.market_keyword_count,
        }
    }
}

/// Rule-based insights. Rules run in a fixed order and each contributes at
/// most one recommendation.
///
/// The gap rule reads the status stored on the snapshot, so a regenerated
/// list always agrees with the status it was classified under.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecommendationEngine;

impl RecommendationEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn generate(
        &self,
        snapshot: &Snapshot,
        context: &RecommendationContext,
    ) -> Vec<Recommendation> {
        let mut recommendations = vec![self.gap_rule(snapshot)];
        if let Some(recommendation) = sos_rank_rule(snapshot) {
            recommendations.push(recommendation);
        }
        if let Some(recommendation) = low_sov_rule(snapshot, context) {
            recommendations.push(recommendation);
        }
        recommendations
    }

    fn gap_rule(&self, snapshot: &Snapshot) -> Recommendation {
        let status = snapshot.status;
        if status.is_positive() {
            Recommendation::new(
                Priority::Medium,
                "Growth signal",
                format!(
                    "Share of Voice ({:.1}%) is {:.1} points ahead of Share of Search ({:.1}%). \
                     Visibility is outpacing demand, which usually precedes market-share growth; \
                     keep investing in the keywords that drive it.",
                    snapshot.sov, snapshot.gap, snapshot.sos
                ),
            )
        } else if status.is_negative() {
            Recommendation::new(
                Priority::High,
                "Visibility gap",
                format!(
                    "Share of Voice ({:.1}%) trails Share of Search ({:.1}%) by {:.1} points. \
                     Competitors capture category clicks your brand demand should earn; \
                     prioritise rankings on market keywords.",
                    snapshot.sov,
                    snapshot.sos,
                    snapshot.gap.abs()
                ),
            )
        } else {
            Recommendation::new(
                Priority::Low,
                "Balanced position",
                format!(
                    "Share of Voice and Share of Search are within {:.0} points of each other. \
                     Grow both together to gain share.",
                    status.scheme().threshold()
                ),
            )
        }
    }
}

pub fn generate_recommendations(
    snapshot: &Snapshot,
    context: &RecommendationContext,
) -> Vec<Recommendation> {
    RecommendationEngine::new().generate(snapshot, context)
}

fn sos_rank_rule(snapshot: &Snapshot) -> Option<Recommendation> {
    let brand = snapshot.brand_row()?;
    let ranked = snapshot.ranked_by_sos();
    let leader = ranked.first()?;

    if leader.is_own_brand {
        return Some(Recommendation::new(
            Priority::Low,
            "Category leader",
            format!(
                "{} leads branded search demand with {:.1}% Share of Search. \
                 Defend the position by keeping visibility ahead of demand.",
                brand.name, brand.sos
            ),
        ));
    }

    Some(Recommendation::new(
        Priority::Medium,
        format!("Gap to {}", leader.name),
        format!(
            "{} holds {:.1}% Share of Search, {:.1} points ahead of {} ({:.1}%). \
             Closing the gap requires building branded demand, not only rankings.",
            leader.name,
            leader.sos,
            leader.sos - brand.sos,
            brand.name,
            brand.sos
        ),
    ))
}

fn low_sov_rule(snapshot: &Snapshot, context: &RecommendationContext) -> Option<Recommendation> {
    if snapshot.sov >= LOW_SOV_THRESHOLD || context.market_keyword_count == 0 {
        return None;
    }
    Some(Recommendation::new(
        Priority::High,
        "Low category visibility",
        format!(
            "Only {:.1}% Share of Voice across {} market keyword{}. \
             Target page-one rankings for the highest-volume category terms.",
            snapshot.sov,
            context.market_keyword_count,
            if context.market_keyword_count == 1 { "" } else { "s" }
        ),
    ))
}
