// REST implementation of the historical telemetry query
use crate::application::history_repository::{HistoryRepository, TimeRange};
use crate::domain::entity::EntityRef;
use crate::domain::telemetry::{FieldValue, TimeSeriesPoint};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;

/// Raw points per key, capped by the backend.
const POINT_LIMIT: u32 = 50_000;

#[derive(Debug, Clone)]
pub struct RestHistoryRepository {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct RawPoint {
    ts: i64,
    value: serde_json::Value,
}

impl RestHistoryRepository {
    pub fn new(base_url: String, token: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            client: reqwest::Client::new(),
        }
    }

    fn build_query_url(&self, entity: &EntityRef, keys: &[&str], range: TimeRange) -> String {
        format!(
            "{}/api/plugins/telemetry/{}/{}/values/timeseries?limit={}&agg=NONE&keys={}&startTs={}&endTs={}&orderBy=ASC&useStrictDataTypes=true",
            self.base_url,
            entity.entity_type,
            entity.id,
            POINT_LIMIT,
            urlencoding::encode(&keys.join(",")),
            range.start_ms,
            range.end_ms,
        )
    }
}

#[async_trait]
impl HistoryRepository for RestHistoryRepository {
    async fn fetch_timeseries(
        &self,
        entity: &EntityRef,
        keys: &[&str],
        range: TimeRange,
    ) -> Result<HashMap<String, Vec<TimeSeriesPoint>>> {
        let url = self.build_query_url(entity, keys, range);

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/json")
            .send()
            .await
            .context("failed to send historical telemetry request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("historical telemetry query failed with status {}: {}", status, body);
        }

        let raw: HashMap<String, Vec<RawPoint>> = response
            .json()
            .await
            .context("failed to parse historical telemetry response")?;

        Ok(raw
            .into_iter()
            .map(|(key, points)| {
                let series = points
                    .into_iter()
                    .map(|p| TimeSeriesPoint::new(p.ts, FieldValue::from_json(&p.value).as_f64()))
                    .collect();
                (key, series)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_query_url() {
        let repo = RestHistoryRepository::new(
            "https://platform.example/".to_string(),
            "token".to_string(),
        );
        let entity = EntityRef::new("ASSET", "abc-123");
        let url = repo.build_query_url(
            &entity,
            &["totalSavedPower", "totalSavedCost"],
            TimeRange { start_ms: 100, end_ms: 200 },
        );
        assert_eq!(
            url,
            "https://platform.example/api/plugins/telemetry/ASSET/abc-123/values/timeseries\
             ?limit=50000&agg=NONE&keys=totalSavedPower%2CtotalSavedCost\
             &startTs=100&endTs=200&orderBy=ASC&useStrictDataTypes=true"
        );
    }

    #[test]
    fn test_raw_point_values_read_permissively() {
        let raw: Vec<RawPoint> =
            serde_json::from_str(r#"[{"ts":1,"value":"1200.5"},{"ts":2,"value":7}]"#).unwrap();
        let points: Vec<TimeSeriesPoint> = raw
            .into_iter()
            .map(|p| TimeSeriesPoint::new(p.ts, FieldValue::from_json(&p.value).as_f64()))
            .collect();
        assert_eq!(points[0].value, 1200.5);
        assert_eq!(points[1].value, 7.0);
    }
}
