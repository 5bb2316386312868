use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use search_share::{
    EngineInput, Entity, MarketKeyword, PositionMatrix, Recommendation, Snapshot, SnapshotTrend,
};

const MAX_POSITION: u64 = 100;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEntity {
    pub name: Option<String>,
    pub domain: Option<String>,
    pub volume: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiKeyword {
    pub keyword: Option<String>,
    pub volume: Option<Value>,
}

/// Compute request as sent by the setup wizard or a CLI input file.
///
/// Numeric fields are taken leniently: anything missing, negative or
/// non-numeric counts as 0, and a position outside 1-100 counts as unranked.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiComputeRequest {
    pub brand: Option<ApiEntity>,
    pub competitors: Option<Vec<ApiEntity>>,
    pub market_keywords: Option<Vec<ApiKeyword>>,
    pub positions: Option<HashMap<String, HashMap<String, Value>>>,
    pub total_market_volume_override: Option<Value>,
}

impl ApiComputeRequest {
    pub fn into_input(self) -> Result<EngineInput, String> {
        let brand = self.brand.unwrap_or_default();
        let brand_name = brand.name.as_deref().map(str::trim).unwrap_or_default();
        if brand_name.is_empty() {
            return Err("brand name is required".to_string());
        }

        let mut input = EngineInput::new(Entity {
            name: brand_name.to_string(),
            domain: clean_domain(brand.domain),
            volume: volume_or_zero(brand.volume.as_ref()),
            is_own_brand: true,
        });

        for competitor in self.competitors.unwrap_or_default() {
            let name = competitor.name.as_deref().map(str::trim).unwrap_or_default();
            if name.is_empty() {
                continue;
            }
            // Ranks are keyed by name, so a repeated name would share one SERP result.
            if name == input.brand.name
                || input.competitors.iter().any(|existing| existing.name == name)
            {
                return Err(format!("duplicate entity name: {}", name));
            }
            input.competitors.push(Entity {
                name: name.to_string(),
                domain: clean_domain(competitor.domain),
                volume: volume_or_zero(competitor.volume.as_ref()),
                is_own_brand: false,
            });
        }

        // Keep every keyword so position indices stay aligned.
        input.market_keywords = self
            .market_keywords
            .unwrap_or_default()
            .into_iter()
            .map(|keyword| {
                MarketKeyword::new(
                    keyword.keyword.unwrap_or_default().trim(),
                    volume_or_zero(keyword.volume.as_ref()),
                )
            })
            .collect();

        input.positions = positions_from(self.positions.unwrap_or_default());

        input.total_market_volume_override = match volume_or_zero(
            self.total_market_volume_override.as_ref(),
        ) {
            0 => None,
            volume => Some(volume),
        };

        Ok(input)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiComputeResponse {
    pub snapshot: Snapshot,
    pub trend: Option<SnapshotTrend>,
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHistoryResponse {
    pub project_id: String,
    pub snapshots: Vec<Snapshot>,
    pub trend: Option<SnapshotTrend>,
}

fn volume_or_zero(value: Option<&Value>) -> u64 {
    let number = match value {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    };
    match number {
        Some(number) if number.is_finite() && number > 0.0 => number.round() as u64,
        _ => 0,
    }
}

fn position_or_unranked(value: &Value) -> Option<u32> {
    let position = match value {
        Value::Number(number) => number.as_u64().or_else(|| {
            number
                .as_f64()
                .filter(|value| value.fract() == 0.0 && *value >= 0.0)
                .map(|value| value as u64)
        }),
        Value::String(text) => text.trim().parse::<u64>().ok(),
        _ => None,
    }?;
    if (1..=MAX_POSITION).contains(&position) {
        Some(position as u32)
    } else {
        None
    }
}

fn positions_from(raw: HashMap<String, HashMap<String, Value>>) -> PositionMatrix {
    let mut positions = PositionMatrix::new();
    for (index, row) in raw {
        let Ok(index) = index.trim().parse::<usize>() else {
            continue;
        };
        for (entity, value) in row {
            if let Some(position) = position_or_unranked(&value) {
                positions.set(index, entity.trim(), position);
            }
        }
    }
    positions
}

fn clean_domain(domain: Option<String>) -> Option<String> {
    domain
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(value: Value) -> ApiComputeRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn missing_brand_name_is_rejected() {
        let err = request(json!({ "brand": { "volume": 10 } }))
            .into_input()
            .unwrap_err();
        assert_eq!(err, "brand name is required");
    }

    #[test]
    fn malformed_numbers_degrade_to_zero() {
        let input = request(json!({
            "brand": { "name": "Acme", "volume": "abc" },
            "competitors": [
                { "name": "Rival", "volume": -40 },
                { "name": "Other", "volume": "1,200" },
                { "volume": 500 }
            ],
            "marketKeywords": [{ "keyword": "running shoes" }],
            "totalMarketVolumeOverride": null
        }))
        .into_input()
        .unwrap();

        assert_eq!(input.brand.volume, 0);
        assert_eq!(input.competitors.len(), 2);
        assert_eq!(input.competitors[0].volume, 0);
        assert_eq!(input.competitors[1].volume, 1_200);
        assert_eq!(input.market_keywords[0].volume, 0);
        assert_eq!(input.total_market_volume_override, None);
    }

    #[test]
    fn out_of_range_positions_are_unranked() {
        let input = request(json!({
            "brand": { "name": "Acme", "volume": 100 },
            "marketKeywords": [
                { "keyword": "a", "volume": 10 },
                { "keyword": "b", "volume": 10 }
            ],
            "positions": {
                "0": { "Acme": 3, "Rival": 0 },
                "1": { "Acme": 101, "Rival": "7" },
                "x": { "Acme": 1 }
            },
            "totalMarketVolumeOverride": 5000
        }))
        .into_input()
        .unwrap();

        assert_eq!(input.positions.position(0, "Acme"), Some(3));
        assert_eq!(input.positions.position(0, "Rival"), None);
        assert_eq!(input.positions.position(1, "Acme"), None);
        assert_eq!(input.positions.position(1, "Rival"), Some(7));
        assert_eq!(input.total_market_volume_override, Some(5_000));
    }

    #[test]
    fn position_keys_are_trimmed_like_entity_names() {
        let input = request(json!({
            "brand": { "name": "Acme ", "volume": 100 },
            "competitors": [{ "name": " Bolt", "volume": 100 }],
            "marketKeywords": [{ "keyword": "trail shoes", "volume": 10000 }],
            "positions": { "0": { "Acme ": 1, " Bolt ": 4 } }
        }))
        .into_input()
        .unwrap();

        assert_eq!(input.brand.name, "Acme");
        assert_eq!(input.positions.position(0, "Acme"), Some(1));
        assert_eq!(input.positions.position(0, "Bolt"), Some(4));

        let snapshot = search_share::compute_snapshot(&input);
        assert_eq!(snapshot.visible_volume, 3_160);
        assert!((snapshot.sov - 31.6).abs() < 1e-9);
    }

    #[test]
    fn duplicate_entity_names_are_rejected() {
        let err = request(json!({
            "brand": { "name": "Acme", "volume": 100 },
            "competitors": [{ "name": " Acme ", "volume": 50 }, { "name": "Bolt" }]
        }))
        .into_input()
        .unwrap_err();
        assert_eq!(err, "duplicate entity name: Acme");

        let err = request(json!({
            "brand": { "name": "Acme", "volume": 100 },
            "competitors": [{ "name": "Bolt" }, { "name": "Bolt", "volume": 9 }]
        }))
        .into_input()
        .unwrap_err();
        assert_eq!(err, "duplicate entity name: Bolt");
    }
}
