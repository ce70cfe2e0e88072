// Console renderer - logs each view-model as a structured summary line
use crate::application::session::ViewSink;
use crate::domain::view_model::{StatusBucket, ViewModel, format_number};

#[derive(Debug, Default)]
pub struct ConsoleSink;

impl ViewSink for ConsoleSink {
    fn on_update(&self, view: &ViewModel) {
        tracing::info!(
            generated_at = %view.generated_at.format("%Y-%m-%d %H:%M:%S"),
            year_power = %view.summary.year_power_text(),
            year_cost = %view.summary.year_cost_text(),
            co2 = %view.summary.co2_text(),
            trees = %view.summary.tree_text(),
            month_power = %view.summary.month_power_text(),
            month_cost = %view.summary.month_cost_text(),
            gauge = view.gauge_percent,
            "dashboard updated"
        );
        tracing::info!(
            devices = view.counts.total(),
            normal = view.counts.get(StatusBucket::Normal),
            warning = view.counts.get(StatusBucket::Warning),
            danger = view.counts.get(StatusBucket::Danger),
            etc = view.counts.get(StatusBucket::Etc),
            "device status"
        );
        for ranked in &view.top_devices {
            tracing::info!(
                device = %ranked.label,
                saved = %format_number(ranked.value, 2),
                "savings ranking"
            );
        }
    }
}
