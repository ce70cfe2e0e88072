// Status filter - card-list filtering that survives view-model rebuilds
use crate::domain::view_model::{DeviceSummary, StatusBucket, ViewModel};

/// Selected status bucket, if any. Selecting the active bucket again clears
/// the filter; the selection itself lives outside the view-model so a rebuild
/// never resets it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusFilter {
    active: Option<StatusBucket>,
}

impl StatusFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<StatusBucket> {
        self.active
    }

    /// Select a bucket, or clear the filter when the same bucket is selected
    /// twice in a row.
    pub fn toggle(&mut self, bucket: StatusBucket) {
        self.active = match self.active {
            Some(current) if current == bucket => None,
            _ => Some(bucket),
        };
    }

    pub fn clear(&mut self) {
        self.active = None;
    }

    /// The device cards visible under the current selection, in view order.
    pub fn apply<'a>(&self, view: &'a ViewModel) -> Vec<&'a DeviceSummary> {
        match self.active {
            None => view.devices.iter().collect(),
            Some(bucket) => view.devices.iter().filter(|d| d.status == bucket).collect(),
        }
    }
}
