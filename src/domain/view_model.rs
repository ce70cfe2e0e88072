// View-model domain - pure projection of the telemetry store, rebuilt on
// every change and never mutated in place
use chrono::{DateTime, Utc};

/// Status bucket a device card lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusBucket {
    Normal,
    Warning,
    Danger,
    Etc,
}

/// Per-bucket device counts. Always sums to the device list length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BucketCounts {
    pub normal: usize,
    pub warning: usize,
    pub danger: usize,
    pub etc: usize,
}

impl BucketCounts {
    pub fn total(&self) -> usize {
        self.normal + self.warning + self.danger + self.etc
    }

    pub fn add(&mut self, bucket: StatusBucket) {
        match bucket {
            StatusBucket::Normal => self.normal += 1,
            StatusBucket::Warning => self.warning += 1,
            StatusBucket::Danger => self.danger += 1,
            StatusBucket::Etc => self.etc += 1,
        }
    }

    pub fn get(&self, bucket: StatusBucket) -> usize {
        match bucket {
            StatusBucket::Normal => self.normal,
            StatusBucket::Warning => self.warning,
            StatusBucket::Danger => self.danger,
            StatusBucket::Etc => self.etc,
        }
    }
}

/// One non-root entity as shown in the device card list.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSummary {
    pub id: String,
    pub display_name: String,
    pub temperature: Option<f64>,
    pub status: StatusBucket,
    pub raw_status: Option<String>,
    pub control_mode: Option<String>,
    pub savings: f64,
}

/// One entry of the 12-month trend line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthlyPoint {
    pub month: u32,
    pub value: f64,
}

/// One bar of the top-N device ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedDevice {
    pub label: String,
    pub value: f64,
}

/// Rollup figures read from the root record.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SummaryMetrics {
    pub year_saved_power: f64,
    pub year_saved_cost: f64,
    pub year_saved_co2: f64,
    pub tree_count: f64,
    pub month_saved_power: f64,
    pub month_saved_cost: f64,
}

impl SummaryMetrics {
    pub fn year_power_text(&self) -> String {
        format!("{} kWh", format_number(self.year_saved_power, 2))
    }

    pub fn year_cost_text(&self) -> String {
        format!("{}원", format_number(self.year_saved_cost, 0))
    }

    pub fn co2_text(&self) -> String {
        format!("{} CO₂", format_number(self.year_saved_co2, 1))
    }

    pub fn tree_text(&self) -> String {
        format!("{}그루", format_number(self.tree_count, 0))
    }

    pub fn month_power_text(&self) -> String {
        format!("{} kWh", format_number(self.month_saved_power, 2))
    }

    pub fn month_cost_text(&self) -> String {
        format!("{}원", format_number(self.month_saved_cost, 0))
    }
}

/// Everything the presentation layer needs for one render pass.
#[derive(Debug, Clone)]
pub struct ViewModel {
    pub generated_at: DateTime<Utc>,
    pub summary: SummaryMetrics,
    /// Percent of savings achieved: 100 minus the usage-to-baseline ratio.
    pub gauge_percent: u32,
    pub devices: Vec<DeviceSummary>,
    pub counts: BucketCounts,
    pub monthly_trend: Vec<MonthlyPoint>,
    pub top_devices: Vec<RankedDevice>,
}

/// Fixed-decimal formatting with thousands separators, e.g. `1,200.50`.
/// Non-finite input renders as a dash placeholder.
pub fn format_number(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return "-".to_string();
    }
    let formatted = format!("{value:.decimals$}");
    let (sign, rest) = match formatted.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", formatted.as_str()),
    };
    let (int_part, frac_part) = match rest.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (rest, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    match frac_part {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number_grouping() {
        assert_eq!(format_number(300000.0, 0), "300,000");
        assert_eq!(format_number(1200.5, 2), "1,200.50");
        assert_eq!(format_number(999.0, 0), "999");
        assert_eq!(format_number(1000.0, 0), "1,000");
        assert_eq!(format_number(1234567.891, 1), "1,234,567.9");
        assert_eq!(format_number(-4321.0, 0), "-4,321");
        assert_eq!(format_number(f64::NAN, 2), "-");
    }

    #[test]
    fn test_summary_text() {
        let summary = SummaryMetrics {
            year_saved_power: 1200.5,
            year_saved_cost: 300000.0,
            month_saved_power: 1200.5 / 12.0,
            month_saved_cost: 300000.0 / 12.0,
            ..Default::default()
        };
        assert_eq!(summary.year_power_text(), "1,200.50 kWh");
        assert_eq!(summary.year_cost_text(), "300,000원");
        assert_eq!(summary.month_power_text(), "100.04 kWh");
        assert_eq!(summary.month_cost_text(), "25,000원");
    }

    #[test]
    fn test_bucket_counts_sum() {
        let mut counts = BucketCounts::default();
        counts.add(StatusBucket::Danger);
        counts.add(StatusBucket::Warning);
        counts.add(StatusBucket::Normal);
        counts.add(StatusBucket::Normal);
        assert_eq!(counts.total(), 4);
        assert_eq!(counts.get(StatusBucket::Normal), 2);
        assert_eq!(counts.get(StatusBucket::Etc), 0);
    }
}
