//! Keyboard Diagnostics simulator
//!
//! Host-side harness for the diagnostics engine: wires a small charlieplex
//! demo board to the shared trackers, runs synthetic key and battery
//! activity from producer threads, then drives the request dispatcher over
//! the wire format the way a client would.

use anyhow::Result;
use prost::Message;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use keyboard_diagnostics::battery::{BatterySampler, BatteryStateSource, SampleRingBuffer};
use keyboard_diagnostics::config::DiagnosticsConfig;
use keyboard_diagnostics::keyboard::{
    GpioPin, KeyEventTracker, KeyGeometry, KeyTransition, LayoutProvider, MatrixKind, StaticLayout,
};
use keyboard_diagnostics::report::DiagnosticsReportAssembler;
use keyboard_diagnostics::rpc::{proto, RequestDispatcher, SUBSYSTEM_META};

/// Battery that drains one percent per sample
struct DrainingBattery {
    level: std::sync::atomic::AtomicU8,
}

impl BatteryStateSource for DrainingBattery {
    fn state_of_charge(&self) -> u8 {
        self.level
            .fetch_sub(1, std::sync::atomic::Ordering::Relaxed)
    }
}

/// Four-line charlieplex demo board with six wired keys
fn demo_layout() -> StaticLayout {
    let lines = (0..4)
        .map(|i| GpioPin::new("gpio0", 10 + i, 0x11))
        .collect();
    let mut layout = StaticLayout::new("demo60", 0, 6, MatrixKind::Charlieplex, lines);

    let pairs = [(0, 1), (1, 0), (0, 2), (2, 0), (1, 3), (3, 1)];
    for (position, (drive, sense)) in pairs.into_iter().enumerate() {
        layout = layout.with_pair(drive, sense, position);
        layout = layout.with_key(KeyGeometry {
            position: position as u32,
            x: position as i32 * 100,
            y: 0,
            width: 100,
            height: 100,
            rotation: None,
        });
    }
    layout
}

/// Synthetic typing with a chattering switch at position 2
fn run_typist(tracker: Arc<KeyEventTracker>) {
    let mut now_ms: u64 = 1_000;
    for round in 0..20u64 {
        for position in 0..6 {
            tracker.record_transition(&KeyTransition::press(position, now_ms));
            now_ms += 40;
            tracker.record_transition(&KeyTransition::release(position, now_ms));
            now_ms += 60;

            // Worn switch: a bounce pair right after every third release
            if position == 2 && round % 3 == 0 {
                tracker.record_transition(&KeyTransition::press(2, now_ms + 2));
                tracker.record_transition(&KeyTransition::release(2, now_ms + 3));
                now_ms += 50;
            }
        }
        thread::sleep(Duration::from_millis(2));
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let config = DiagnosticsConfig::load().unwrap_or_default();
    let layout = Arc::new(demo_layout());
    let tracker = Arc::new(KeyEventTracker::new(
        layout.keymap_len(),
        config.chatter.window_ms,
    ));
    let history = Arc::new(SampleRingBuffer::new(config.history.capacity));

    log::info!(
        "subsystem {} ({:?}) sampling every {}s, history capacity {}",
        SUBSYSTEM_META.id,
        SUBSYSTEM_META.security,
        config.history.sample_interval_seconds,
        history.capacity()
    );

    // Asynchronous writers: key events and battery samples run against the
    // shared handles while the dispatcher serves reads below
    let typist = {
        let tracker = tracker.clone();
        thread::spawn(move || run_typist(tracker))
    };
    let gauge = {
        let sampler = BatterySampler::new(
            Arc::new(DrainingBattery {
                level: std::sync::atomic::AtomicU8::new(100),
            }),
            history.clone(),
        );
        let interval = config.history.sample_interval_seconds;
        thread::spawn(move || {
            for tick in 1..=10u32 {
                sampler.sample(tick * interval);
                thread::sleep(Duration::from_millis(3));
            }
        })
    };

    let dispatcher = RequestDispatcher::new(
        tracker.clone(),
        history.clone(),
        layout.clone(),
        &config,
    );

    typist.join().expect("typist thread panicked");
    gauge.join().expect("battery thread panicked");

    // Drive the dispatcher through the wire format, as a client would
    let report_request = proto::Request {
        kind: Some(proto::request::Kind::GetDiagnostics(
            proto::GetDiagnosticsRequest { reset_after: false },
        )),
    };
    let encoded = dispatcher.handle(&report_request.encode_to_vec());
    let response = proto::Response::decode(encoded.as_slice())?;

    if let Some(proto::response::Kind::Diagnostics(report)) = response.kind {
        println!("Layout: {} (kscan {:?})", report.layout_name, report.kscan_type());
        for key in &report.keys {
            println!(
                "  key {:>2}: {:>3} press / {:>3} release / {:>2} chatter  drive {:?}",
                key.position,
                key.press_count,
                key.release_count,
                key.chatter_count,
                key.drive_gpio.as_ref().map(|p| (p.port.as_str(), p.pin)),
            );
        }
    }

    let history_request = proto::Request {
        kind: Some(proto::request::Kind::GetHistory(proto::GetHistoryRequest {
            max_entries: 0,
        })),
    };
    let encoded = dispatcher.handle(&history_request.encode_to_vec());
    let response = proto::Response::decode(encoded.as_slice())?;

    if let Some(proto::response::Kind::History(history)) = response.kind {
        println!(
            "Battery: {} of {} samples, every {}s",
            history.total_entries, history.capacity, history.sample_interval_seconds
        );
        for sample in &history.samples {
            println!("  {:>6}s  {:>3}%", sample.timestamp_seconds, sample.level_percent);
        }
    }

    // Export the full snapshot for offline inspection
    let assembler =
        DiagnosticsReportAssembler::new(tracker, layout, config.layout.max_keys);
    let filename = format!(
        "keyboard_diagnostics_{}.json",
        chrono::Utc::now().format("%Y%m%d_%H%M%S")
    );
    assembler
        .build_report(false)
        .export_json(std::path::Path::new(&filename))?;
    println!("Report exported to {filename}");

    Ok(())
}
