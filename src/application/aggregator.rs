// Aggregator - builds the view-model from the current telemetry state.
// Pure function of the store and buffer; safe to call on every change signal.
use crate::domain::telemetry::{
    FieldRecord, FieldValue, ROOT_SOURCE_TAG, TelemetryStore, TimeSeriesBuffer,
};
use crate::domain::view_model::{
    BucketCounts, DeviceSummary, MonthlyPoint, RankedDevice, StatusBucket, SummaryMetrics,
    ViewModel,
};
use chrono::{DateTime, Datelike, Utc};

/// Name-pattern keyword marking auxiliary corridor devices. Compatibility
/// shim for entities that carry no explicit `category` attribute.
pub const CORRIDOR_KEYWORD: &str = "복도";

/// Metric the trend line is drawn from.
const TREND_KEY: &str = "totalSavedPower";

/// Bars shown in the device ranking chart.
const TOP_DEVICE_LIMIT: usize = 8;

pub fn build_view_model(
    store: &TelemetryStore,
    buffer: &TimeSeriesBuffer,
    root_id: &str,
) -> ViewModel {
    let empty = FieldRecord::new();
    let root = store.record(root_id).unwrap_or(&empty);

    let year_saved_power = read_f64(root, "totalSavedPower");
    let year_saved_cost = read_f64(root, "totalSavedCost");
    let summary = SummaryMetrics {
        year_saved_power,
        year_saved_cost,
        year_saved_co2: read_f64(root, "totalSavedCO2"),
        tree_count: read_f64(root, "totalTreeCount"),
        // fixed seasonal-flattening approximation, not a true monthly rollup
        month_saved_power: year_saved_power / 12.0,
        month_saved_cost: year_saved_cost / 12.0,
    };

    // deterministic device order keeps external filtering stable across builds
    let mut device_ids: Vec<&str> = store.entity_ids().filter(|id| *id != root_id).collect();
    device_ids.sort_unstable();

    let mut devices = Vec::with_capacity(device_ids.len());
    let mut counts = BucketCounts::default();
    for id in device_ids {
        let record = match store.record(id) {
            Some(record) => record,
            None => continue,
        };
        let device = summarize_device(id, record);
        counts.add(device.status);
        devices.push(device);
    }

    ViewModel {
        generated_at: Utc::now(),
        gauge_percent: gauge_percent(root, &devices, store),
        monthly_trend: monthly_peaks(buffer.series(ROOT_SOURCE_TAG, TREND_KEY).unwrap_or(&[])),
        top_devices: rank_devices(&devices),
        summary,
        devices,
        counts,
    }
}

fn summarize_device(id: &str, record: &FieldRecord) -> DeviceSummary {
    let display_name = text_field(record, "label")
        .or_else(|| text_field(record, "name"))
        .or_else(|| text_field(record, "tag"))
        .unwrap_or("Unknown")
        .to_string();
    let raw_status = text_field(record, "status").map(String::from);

    DeviceSummary {
        id: id.to_string(),
        status: classify(record, &display_name, raw_status.as_deref()),
        temperature: record.get("temperature").map(FieldValue::as_f64),
        control_mode: text_field(record, "controlMode").map(String::from),
        savings: savings_value(record),
        display_name,
        raw_status,
    }
}

/// Status bucketing. An explicit `category` attribute takes precedence; the
/// corridor name match remains as a shim for unmarked entities and overrides
/// the status field either way.
fn classify(record: &FieldRecord, display_name: &str, raw_status: Option<&str>) -> StatusBucket {
    if let Some(category) = text_field(record, "category") {
        if category.eq_ignore_ascii_case("etc") || category.eq_ignore_ascii_case("corridor") {
            return StatusBucket::Etc;
        }
    } else if display_name.contains(CORRIDOR_KEYWORD) {
        return StatusBucket::Etc;
    }
    match raw_status {
        Some("danger") | Some("check") => StatusBucket::Danger,
        Some("warning") => StatusBucket::Warning,
        _ => StatusBucket::Normal,
    }
}

/// Savings figure for the ranking chart, by field-priority fallback.
fn savings_value(record: &FieldRecord) -> f64 {
    for key in ["deviceSavedPower", "savedPower", "powerUsage"] {
        if let Some(value) = record.get(key) {
            return value.as_f64();
        }
    }
    0.0
}

/// Usage-to-baseline gauge, displayed inverted as "percent of savings
/// achieved". Root-level totals win; devices are summed in only when the root
/// carries no baseline total. A zero baseline yields ratio 0 (gauge 100).
fn gauge_percent(root: &FieldRecord, devices: &[DeviceSummary], store: &TelemetryStore) -> u32 {
    let mut usage = read_f64(root, "totalPowerUsage");
    let mut origin = read_f64(root, "totalOriginPowerUsage");

    if origin == 0.0 {
        for device in devices {
            usage += store.field_f64(&device.id, "powerUsage");
            origin += store.field_f64(&device.id, "originPowerUsage");
        }
    }

    let ratio = if origin > 0.0 {
        ((usage / origin) * 100.0).round().min(100.0) as u32
    } else {
        0
    };
    100 - ratio
}

/// Peak observed value per calendar month, zero for months without data,
/// ordered by month number. Peak, not sum: the metric is a running total.
fn monthly_peaks(points: &[crate::domain::telemetry::TimeSeriesPoint]) -> Vec<MonthlyPoint> {
    let mut peaks = [0.0_f64; 12];
    for point in points {
        if let Some(ts) = DateTime::<Utc>::from_timestamp_millis(point.ts_ms) {
            let slot = (ts.month() - 1) as usize;
            if point.value > peaks[slot] {
                peaks[slot] = point.value;
            }
        }
    }
    peaks
        .iter()
        .enumerate()
        .map(|(i, value)| MonthlyPoint {
            month: i as u32 + 1,
            value: value.round(),
        })
        .collect()
}

fn rank_devices(devices: &[DeviceSummary]) -> Vec<RankedDevice> {
    let mut ranking: Vec<RankedDevice> = devices
        .iter()
        .map(|d| RankedDevice {
            label: d.display_name.clone(),
            value: d.savings,
        })
        .collect();
    ranking.sort_by(|a, b| {
        b.value
            .partial_cmp(&a.value)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.label.cmp(&b.label))
    });
    ranking.truncate(TOP_DEVICE_LIMIT);
    ranking
}

fn read_f64(record: &FieldRecord, key: &str) -> f64 {
    record.get(key).map(FieldValue::as_f64).unwrap_or(0.0)
}

/// Text field lookup treating empty strings as missing.
fn text_field<'a>(record: &'a FieldRecord, key: &str) -> Option<&'a str> {
    record.get(key).and_then(FieldValue::as_str).filter(|s| !s.is_empty())
}
