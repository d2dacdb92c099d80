//! Chart marker sink that keeps every marker for the run summary.

use tracing::debug;

use barclose_core::engine::{ChartMarker, SignalMarker};

#[derive(Debug, Clone, Default)]
pub struct RecordingMarker {
    markers: Vec<SignalMarker>,
}

impl RecordingMarker {
    pub fn into_markers(self) -> Vec<SignalMarker> {
        self.markers
    }
}

impl ChartMarker for RecordingMarker {
    fn mark(&mut self, marker: SignalMarker) {
        debug!(name = %marker.name, time = %marker.time, price = marker.price, "marker drawn");
        self.markers.push(marker);
    }
}
