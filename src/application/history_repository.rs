// Repository trait for the one-shot historical telemetry query
use crate::domain::entity::EntityRef;
use crate::domain::telemetry::TimeSeriesPoint;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;

/// Closed time window in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl TimeRange {
    /// Trailing window ending now.
    pub fn trailing_days(days: i64) -> Self {
        let end_ms = Utc::now().timestamp_millis();
        Self {
            start_ms: end_ms - days * 86_400_000,
            end_ms,
        }
    }
}

#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Fetch raw (non-aggregated) points for the given metric keys, ascending
    /// by timestamp. Returns one series per key that has data.
    async fn fetch_timeseries(
        &self,
        entity: &EntityRef,
        keys: &[&str],
        range: TimeRange,
    ) -> anyhow::Result<HashMap<String, Vec<TimeSeriesPoint>>>;
}
