//! Diagnostics report assembly and export
//!
//! A report is a pure value rebuilt on every request: layout identity,
//! fresh matrix mapping, a bounded copy of the key geometry, and one merged
//! diagnostics entry per key. It holds no references into the live
//! trackers, so it stays valid however the layout or counters move
//! afterward.

use std::sync::Arc;

use serde::Serialize;
use std::io::Write;
use std::path::Path;

use crate::keyboard::{
    GpioPin, KeyEventTracker, KeyGeometry, LayoutProvider, MatrixMapping, MatrixMappingResolver,
};

/// Kind of switch scan hardware as reported to the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum KscanType {
    Unspecified,
    Charlieplex,
    /// Active matrix is not charlieplexed; mapping fields are absent
    Unsupported,
}

/// Diagnostics for one logical key position
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyDiagnostics {
    pub position: u32,
    pub press_count: u32,
    pub release_count: u32,
    pub chatter_count: u32,
    pub is_pressed: bool,
    pub last_change_ms: u64,
    /// Drive line index when mapped, 0 otherwise
    pub row: u32,
    /// Sense line index when mapped, 0 otherwise
    pub column: u32,
    pub has_gpio_mapping: bool,
    pub drive_gpio: Option<GpioPin>,
    pub sense_gpio: Option<GpioPin>,
}

/// Complete diagnostics snapshot returned for one report request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticsReport {
    pub layout_name: String,
    pub layout_index: u32,
    pub kscan_type: KscanType,
    pub chatter_window_ms: u64,
    pub physical_keys: Vec<KeyGeometry>,
    pub keys: Vec<KeyDiagnostics>,
}

impl DiagnosticsReport {
    /// Export report to a pretty JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export report to a JSON file
    pub fn export_json(&self, path: &Path) -> std::io::Result<()> {
        let json = self
            .to_json()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let mut file = std::fs::File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

/// Builds [`DiagnosticsReport`] values from the live trackers and layout.
pub struct DiagnosticsReportAssembler {
    tracker: Arc<KeyEventTracker>,
    layout: Arc<dyn LayoutProvider>,
    max_keys: usize,
}

impl DiagnosticsReportAssembler {
    pub fn new(
        tracker: Arc<KeyEventTracker>,
        layout: Arc<dyn LayoutProvider>,
        max_keys: usize,
    ) -> Self {
        Self {
            tracker,
            layout,
            max_keys,
        }
    }

    /// Assemble a snapshot of the current diagnostics state.
    ///
    /// The layout and matrix mapping are resolved fresh for this call, and
    /// geometry is copied rather than referenced, so a layout switch midway
    /// through a client exchange cannot produce a mixed report. Lists are
    /// silently truncated at the configured maximum: partial data beats
    /// failure for a diagnostics tool. With `reset_after` the tracker is
    /// zeroed only after the snapshot is taken, so the returned counters
    /// are always the pre-reset values.
    pub fn build_report(&self, reset_after: bool) -> DiagnosticsReport {
        let info = self.layout.active_layout();
        let mapping = MatrixMappingResolver::resolve(self.layout.as_ref());
        let lines = self.layout.matrix().lines;

        let mut physical_keys = self.layout.key_geometry();
        physical_keys.truncate(self.max_keys);

        let stats = self.tracker.snapshot_all();
        let key_count = self.layout.keymap_len().min(self.max_keys);
        let keys = (0..key_count)
            .map(|position| {
                let stat = stats.get(position).copied().unwrap_or_default();
                let mut entry = KeyDiagnostics {
                    position: position as u32,
                    press_count: stat.press_count,
                    release_count: stat.release_count,
                    chatter_count: stat.chatter_count,
                    is_pressed: stat.last_state,
                    last_change_ms: stat.last_change_ms,
                    row: 0,
                    column: 0,
                    has_gpio_mapping: false,
                    drive_gpio: None,
                    sense_gpio: None,
                };
                if let Some(gpio) = mapping.get(position) {
                    entry.row = gpio.drive_line as u32;
                    entry.column = gpio.sense_line as u32;
                    entry.has_gpio_mapping = true;
                    entry.drive_gpio = lines.get(gpio.drive_line as usize).cloned();
                    entry.sense_gpio = lines.get(gpio.sense_line as usize).cloned();
                }
                entry
            })
            .collect();

        if reset_after {
            self.tracker.reset();
        }

        DiagnosticsReport {
            layout_name: info.name,
            layout_index: info.index,
            kscan_type: kscan_type_of(&mapping),
            chatter_window_ms: self.tracker.chatter_window_ms(),
            physical_keys,
            keys,
        }
    }
}

fn kscan_type_of(mapping: &MatrixMapping) -> KscanType {
    if mapping.supported {
        KscanType::Charlieplex
    } else {
        KscanType::Unsupported
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard::{KeyTransition, MatrixKind, StaticLayout};

    fn geometry(position: u32) -> KeyGeometry {
        KeyGeometry {
            position,
            x: position as i32 * 100,
            y: 0,
            width: 100,
            height: 100,
            rotation: None,
        }
    }

    /// Two-line charlieplex board with two keys
    fn demo_layout() -> StaticLayout {
        StaticLayout::new(
            "demo",
            1,
            2,
            MatrixKind::Charlieplex,
            vec![GpioPin::new("gpio0", 2, 0), GpioPin::new("gpio0", 3, 0)],
        )
        .with_pair(0, 1, 0)
        .with_pair(1, 0, 1)
        .with_key(geometry(0))
        .with_key(geometry(1))
    }

    fn assembler(layout: StaticLayout, max_keys: usize) -> DiagnosticsReportAssembler {
        let layout = Arc::new(layout);
        let tracker = Arc::new(KeyEventTracker::new(layout.keymap_len(), 5));
        DiagnosticsReportAssembler::new(tracker, layout, max_keys)
    }

    #[test]
    fn report_carries_layout_identity_and_config() {
        let report = assembler(demo_layout(), 128).build_report(false);

        assert_eq!(report.layout_name, "demo");
        assert_eq!(report.layout_index, 1);
        assert_eq!(report.kscan_type, KscanType::Charlieplex);
        assert_eq!(report.chatter_window_ms, 5);
    }

    #[test]
    fn report_merges_stats_and_mapping() {
        let layout = Arc::new(demo_layout());
        let tracker = Arc::new(KeyEventTracker::new(2, 5));
        tracker.record_transition(&KeyTransition::press(1, 400));
        let assembler = DiagnosticsReportAssembler::new(tracker, layout, 128);

        let report = assembler.build_report(false);
        assert_eq!(report.keys.len(), 2);

        let key = &report.keys[1];
        assert_eq!(key.press_count, 1);
        assert!(key.is_pressed);
        assert_eq!(key.last_change_ms, 400);
        assert!(key.has_gpio_mapping);
        assert_eq!((key.row, key.column), (1, 0));
        assert_eq!(key.drive_gpio.as_ref().unwrap().pin, 3);
        assert_eq!(key.sense_gpio.as_ref().unwrap().pin, 2);
    }

    #[test]
    fn reset_after_returns_pre_reset_values() {
        let layout = Arc::new(demo_layout());
        let tracker = Arc::new(KeyEventTracker::new(2, 5));
        tracker.record_transition(&KeyTransition::press(0, 100));
        let assembler = DiagnosticsReportAssembler::new(tracker.clone(), layout, 128);

        let first = assembler.build_report(true);
        assert_eq!(first.keys[0].press_count, 1);

        let second = assembler.build_report(false);
        assert_eq!(second.keys[0].press_count, 0);
        assert_eq!(second.keys[0].last_change_ms, 0);
    }

    #[test]
    fn lists_truncate_at_max_keys() {
        let mut layout = StaticLayout::new(
            "big",
            0,
            10,
            MatrixKind::Charlieplex,
            vec![GpioPin::new("gpio0", 2, 0), GpioPin::new("gpio0", 3, 0)],
        );
        for position in 0..10 {
            layout = layout.with_key(geometry(position));
        }

        let report = assembler(layout, 4).build_report(false);
        assert_eq!(report.physical_keys.len(), 4);
        assert_eq!(report.keys.len(), 4);
    }

    #[test]
    fn unsupported_matrix_reports_no_mappings() {
        let layout = StaticLayout::new(
            "grid",
            0,
            2,
            MatrixKind::RowColumn,
            vec![GpioPin::new("gpio0", 2, 0), GpioPin::new("gpio0", 3, 0)],
        );

        let report = assembler(layout, 128).build_report(false);
        assert_eq!(report.kscan_type, KscanType::Unsupported);
        assert!(report.keys.iter().all(|k| !k.has_gpio_mapping));
        assert!(report.keys.iter().all(|k| k.drive_gpio.is_none()));
    }

    #[test]
    fn unmapped_key_has_no_gpio_fields() {
        // Only position 0 is wired
        let layout = StaticLayout::new(
            "sparse",
            0,
            2,
            MatrixKind::Charlieplex,
            vec![GpioPin::new("gpio0", 2, 0), GpioPin::new("gpio0", 3, 0)],
        )
        .with_pair(0, 1, 0);

        let report = assembler(layout, 128).build_report(false);
        assert!(report.keys[0].has_gpio_mapping);
        assert!(!report.keys[1].has_gpio_mapping);
        assert!(report.keys[1].sense_gpio.is_none());
    }

    #[test]
    fn report_serializes_to_json() {
        let report = assembler(demo_layout(), 128).build_report(false);
        let json = report.to_json().expect("JSON serialization failed");

        assert!(json.contains("\"layout_name\""));
        assert!(json.contains("\"physical_keys\""));
        assert!(json.contains("\"Charlieplex\""));
    }
}
