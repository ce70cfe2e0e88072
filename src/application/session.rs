// Dashboard session - explicit per-widget state, one instance per session.
// Owns the telemetry store and historical buffer; every merge signal rebuilds
// the view-model and hands it to the sink.
use crate::application::aggregator::build_view_model;
use crate::application::history_repository::{HistoryRepository, TimeRange};
use crate::domain::entity::RootSelection;
use crate::domain::telemetry::{FieldValue, ROOT_SOURCE_TAG, TelemetryStore, TimeSeriesBuffer};
use crate::domain::view_model::ViewModel;
use crate::infrastructure::ws::subscription::SubscriptionManager;
use std::sync::Arc;

/// Root metrics fetched historically and seeded into the root record.
pub const ROOT_METRIC_KEYS: [&str; 6] = [
    "totalSavedPower",
    "totalSavedCost",
    "totalSavedCO2",
    "totalTreeCount",
    "totalOriginPowerUsage",
    "totalPowerUsage",
];

/// Historical window behind the trend chart.
const HISTORY_WINDOW_DAYS: i64 = 365;

/// Change listener: receives every rebuilt view-model. The rendering side of
/// this seam is a collaborator concern.
pub trait ViewSink: Send + Sync {
    fn on_update(&self, view: &ViewModel);
}

pub struct DashboardSession {
    selection: RootSelection,
    history: Arc<dyn HistoryRepository>,
    sink: Arc<dyn ViewSink>,
    store: TelemetryStore,
    buffer: TimeSeriesBuffer,
    active: bool,
}

impl DashboardSession {
    pub fn new(
        selection: RootSelection,
        history: Arc<dyn HistoryRepository>,
        sink: Arc<dyn ViewSink>,
    ) -> Self {
        Self {
            selection,
            history,
            sink,
            store: TelemetryStore::new(),
            buffer: TimeSeriesBuffer::new(),
            active: true,
        }
    }

    pub fn root_id(&self) -> &str {
        &self.selection.entity.id
    }

    pub fn store(&self) -> &TelemetryStore {
        &self.store
    }

    /// One-shot historical load. Failure leaves the buffer empty and the
    /// session running: absence of trend data must never block live updates.
    pub async fn load_history(&mut self) {
        let range = TimeRange::trailing_days(HISTORY_WINDOW_DAYS);
        match self
            .history
            .fetch_timeseries(&self.selection.entity, &ROOT_METRIC_KEYS, range)
            .await
        {
            Ok(series) if !series.is_empty() => {
                // seed the root record with each series' most recent point
                let seeds: Vec<(String, FieldValue)> = series
                    .iter()
                    .filter_map(|(key, points)| {
                        points.last().map(|p| (key.clone(), FieldValue::from(p.value)))
                    })
                    .collect();
                let root_id = self.selection.entity.id.clone();
                self.store.apply_fields(&root_id, seeds);
                self.buffer.insert_source(ROOT_SOURCE_TAG, series);
                tracing::debug!(root = %self.selection.display_name, "historical series loaded");
            }
            Ok(_) => {
                tracing::debug!("no historical data for root entity");
            }
            Err(e) => {
                tracing::error!(error = %e, "historical fetch failed, continuing without trend data");
            }
        }
    }

    /// Rebuild the view-model and notify the sink. Skipped while nothing has
    /// been observed yet.
    pub fn publish(&self) {
        if self.store.is_empty() {
            return;
        }
        let view = build_view_model(&self.store, &self.buffer, self.root_id());
        self.sink.on_update(&view);
    }

    /// Drive the live subscription until the channel closes or the session
    /// is shut down. The channel is closed on the way out either way.
    pub async fn run(&mut self, subscription: &mut SubscriptionManager) {
        self.publish();
        while subscription.next_merge(&mut self.store).await {
            if !self.active {
                // torn down mid-flight: drop the signal, do not re-render
                break;
            }
            self.publish();
        }
        subscription.close().await;
        tracing::info!(root = %self.selection.display_name, "dashboard session ended");
    }

    /// Mark the session torn down; in-flight merges are discarded afterwards.
    pub fn shutdown(&mut self) {
        self.active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::{EntityKind, EntityRef};
    use crate::domain::telemetry::TimeSeriesPoint;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct StubHistory {
        result: Option<HashMap<String, Vec<TimeSeriesPoint>>>,
    }

    #[async_trait]
    impl HistoryRepository for StubHistory {
        async fn fetch_timeseries(
            &self,
            _entity: &EntityRef,
            _keys: &[&str],
            _range: TimeRange,
        ) -> anyhow::Result<HashMap<String, Vec<TimeSeriesPoint>>> {
            match &self.result {
                Some(series) => Ok(series.clone()),
                None => anyhow::bail!("backend unavailable"),
            }
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        updates: Mutex<Vec<ViewModel>>,
    }

    impl ViewSink for RecordingSink {
        fn on_update(&self, view: &ViewModel) {
            self.updates.lock().unwrap().push(view.clone());
        }
    }

    fn selection() -> RootSelection {
        RootSelection {
            entity: EntityRef::new("ASSET", "root-1"),
            kind: EntityKind::Device,
            display_name: "본관".to_string(),
        }
    }

    fn session_with(
        result: Option<HashMap<String, Vec<TimeSeriesPoint>>>,
    ) -> (DashboardSession, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let session = DashboardSession::new(
            selection(),
            Arc::new(StubHistory { result }),
            sink.clone(),
        );
        (session, sink)
    }

    #[tokio::test]
    async fn test_history_seeds_root_record_with_last_values() {
        let mut series = HashMap::new();
        series.insert(
            "totalSavedPower".to_string(),
            vec![TimeSeriesPoint::new(1000, 900.0), TimeSeriesPoint::new(2000, 1200.5)],
        );
        series.insert(
            "totalSavedCost".to_string(),
            vec![TimeSeriesPoint::new(2000, 300000.0)],
        );
        let (mut session, _) = session_with(Some(series));

        session.load_history().await;
        assert_eq!(session.store().field_f64("root-1", "totalSavedPower"), 1200.5);
        assert_eq!(session.store().field_f64("root-1", "totalSavedCost"), 300000.0);
    }

    #[tokio::test]
    async fn test_history_failure_is_not_fatal() {
        let (mut session, sink) = session_with(None);
        session.load_history().await;
        assert!(session.store().is_empty());

        // the session still renders once live data arrives
        session.store.apply_fields("d1", [("status".to_string(), FieldValue::from("normal"))]);
        session.publish();
        assert_eq!(sink.updates.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_publish_skips_empty_store() {
        let (session, sink) = session_with(None);
        session.publish();
        assert!(sink.updates.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_live_update_overwrites_seeded_history() {
        let mut series = HashMap::new();
        series.insert(
            "totalSavedPower".to_string(),
            vec![TimeSeriesPoint::new(1000, 900.0)],
        );
        let (mut session, _) = session_with(Some(series));
        session.load_history().await;

        // last-write-wins: an incremental push may overwrite the seed
        session
            .store
            .apply_fields("root-1", [("totalSavedPower".to_string(), FieldValue::from(950.0))]);
        assert_eq!(session.store().field_f64("root-1", "totalSavedPower"), 950.0);
    }
}
