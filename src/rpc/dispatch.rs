//! Request decoding, dispatch, and response encoding
//!
//! Each request is stateless and independent: decode, run exactly one
//! handler, encode exactly one response. Malformed or unrecognized input
//! yields a structured error response and touches no state, so a confused
//! client can never corrupt the telemetry it is asking about.

use std::sync::Arc;

use prost::Message;

use super::proto;
use crate::battery::SampleRingBuffer;
use crate::config::DiagnosticsConfig;
use crate::keyboard::{KeyEventTracker, LayoutProvider};
use crate::report::DiagnosticsReportAssembler;

/// Routes decoded requests to the diagnostics engine.
pub struct RequestDispatcher {
    assembler: DiagnosticsReportAssembler,
    tracker: Arc<KeyEventTracker>,
    history: Arc<SampleRingBuffer>,
    sample_interval_seconds: u32,
}

impl RequestDispatcher {
    pub fn new(
        tracker: Arc<KeyEventTracker>,
        history: Arc<SampleRingBuffer>,
        layout: Arc<dyn LayoutProvider>,
        config: &DiagnosticsConfig,
    ) -> Self {
        Self {
            assembler: DiagnosticsReportAssembler::new(
                tracker.clone(),
                layout,
                config.layout.max_keys,
            ),
            tracker,
            history,
            sample_interval_seconds: config.history.sample_interval_seconds,
        }
    }

    /// Handle one raw request payload, returning the encoded response.
    ///
    /// Never fails: a payload that does not decode as a [`proto::Request`]
    /// produces an encoded error response with no side effects.
    pub fn handle(&self, payload: &[u8]) -> Vec<u8> {
        let response = match proto::Request::decode(payload) {
            Ok(request) => self.dispatch(request),
            Err(err) => {
                log::warn!("failed to decode diagnostics request: {err}");
                proto::Response::error("failed to decode request")
            }
        };
        response.encode_to_vec()
    }

    /// Dispatch one decoded request. Every path returns exactly one
    /// response variant.
    pub fn dispatch(&self, request: proto::Request) -> proto::Response {
        use proto::request::Kind;

        match request.kind {
            Some(Kind::GetDiagnostics(req)) => self.get_diagnostics(req.reset_after),
            Some(Kind::ResetDiagnostics(_)) => self.reset_diagnostics(),
            Some(Kind::GetHistory(req)) => self.get_history(req.max_entries),
            Some(Kind::ClearHistory(_)) => self.clear_history(),
            None => {
                log::warn!("diagnostics request with no recognized variant");
                proto::Response::error("unsupported request")
            }
        }
    }

    fn get_diagnostics(&self, reset_after: bool) -> proto::Response {
        let report = self.assembler.build_report(reset_after);
        proto::Response::diagnostics(proto::DiagnosticsReport::from(&report))
    }

    fn reset_diagnostics(&self) -> proto::Response {
        self.tracker.reset();
        proto::Response::reset_ack()
    }

    fn get_history(&self, max_entries: u32) -> proto::Response {
        // The ring clamps zero / oversized requests to its stored count
        let samples = self.history.read(max_entries as usize);
        proto::Response::history(proto::HistoryResponse {
            samples: samples.iter().map(proto::BatterySample::from).collect(),
            capacity: self.history.capacity() as u32,
            total_entries: self.history.total_entries() as u32,
            sample_interval_seconds: self.sample_interval_seconds,
        })
    }

    fn clear_history(&self) -> proto::Response {
        self.history.clear();
        proto::Response::clear_ack(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battery::BatterySample;
    use crate::keyboard::{GpioPin, KeyTransition, MatrixKind, StaticLayout};
    use crate::rpc::proto::{request, response};

    fn dispatcher() -> (RequestDispatcher, Arc<KeyEventTracker>, Arc<SampleRingBuffer>) {
        let layout = Arc::new(
            StaticLayout::new(
                "unit",
                0,
                2,
                MatrixKind::Charlieplex,
                vec![GpioPin::new("gpio0", 6, 0), GpioPin::new("gpio0", 7, 0)],
            )
            .with_pair(0, 1, 0)
            .with_pair(1, 0, 1),
        );
        let mut config = DiagnosticsConfig::default();
        config.history.capacity = 5;
        let tracker = Arc::new(KeyEventTracker::new(2, config.chatter.window_ms));
        let history = Arc::new(SampleRingBuffer::new(config.history.capacity));
        let dispatcher =
            RequestDispatcher::new(tracker.clone(), history.clone(), layout, &config);
        (dispatcher, tracker, history)
    }

    fn wrap(kind: request::Kind) -> proto::Request {
        proto::Request { kind: Some(kind) }
    }

    #[test]
    fn malformed_payload_yields_error_and_no_mutation() {
        let (dispatcher, tracker, history) = dispatcher();
        tracker.record_transition(&KeyTransition::press(0, 10));
        history.push(BatterySample {
            timestamp_seconds: 1,
            level_percent: 90,
        });
        let stats_before = tracker.snapshot_all();

        // 0xff encodes field 31 with invalid wire type 7
        let encoded = dispatcher.handle(&[0xff, 0xff]);
        let response = proto::Response::decode(encoded.as_slice()).unwrap();

        assert!(matches!(response.kind, Some(response::Kind::Error(_))));
        assert_eq!(tracker.snapshot_all(), stats_before);
        assert_eq!(history.total_entries(), 1);
    }

    #[test]
    fn missing_variant_yields_error_response() {
        let (dispatcher, _, _) = dispatcher();
        let response = dispatcher.dispatch(proto::Request { kind: None });
        let Some(response::Kind::Error(err)) = response.kind else {
            panic!("expected error response");
        };
        assert!(!err.message.is_empty());
    }

    #[test]
    fn reset_request_zeroes_tracker_and_acks() {
        let (dispatcher, tracker, _) = dispatcher();
        tracker.record_transition(&KeyTransition::press(1, 50));

        let response = dispatcher.dispatch(wrap(request::Kind::ResetDiagnostics(
            proto::ResetDiagnosticsRequest {},
        )));

        assert!(matches!(response.kind, Some(response::Kind::ResetAck(_))));
        assert_eq!(tracker.snapshot(1).unwrap().press_count, 0);
    }

    #[test]
    fn clear_history_request_empties_ring_and_acks() {
        let (dispatcher, _, history) = dispatcher();
        history.push(BatterySample {
            timestamp_seconds: 5,
            level_percent: 77,
        });

        let response = dispatcher.dispatch(wrap(request::Kind::ClearHistory(
            proto::ClearHistoryRequest {},
        )));

        let Some(response::Kind::ClearAck(ack)) = response.kind else {
            panic!("expected clear ack");
        };
        assert!(ack.success);
        assert_eq!(history.total_entries(), 0);
    }

    #[test]
    fn history_response_carries_buffer_metadata() {
        let (dispatcher, _, history) = dispatcher();
        history.push(BatterySample {
            timestamp_seconds: 30,
            level_percent: 88,
        });

        let response = dispatcher.dispatch(wrap(request::Kind::GetHistory(
            proto::GetHistoryRequest { max_entries: 0 },
        )));

        let Some(response::Kind::History(history_response)) = response.kind else {
            panic!("expected history response");
        };
        assert_eq!(history_response.capacity, 5);
        assert_eq!(history_response.total_entries, 1);
        assert_eq!(history_response.sample_interval_seconds, 600);
        assert_eq!(history_response.samples[0].level_percent, 88);
    }

    #[test]
    fn get_diagnostics_returns_report_variant() {
        let (dispatcher, tracker, _) = dispatcher();
        tracker.record_transition(&KeyTransition::press(0, 10));

        let response = dispatcher.dispatch(wrap(request::Kind::GetDiagnostics(
            proto::GetDiagnosticsRequest { reset_after: false },
        )));

        let Some(response::Kind::Diagnostics(report)) = response.kind else {
            panic!("expected diagnostics response");
        };
        assert_eq!(report.layout_name, "unit");
        assert_eq!(report.keys.len(), 2);
        assert_eq!(report.keys[0].press_count, 1);
    }
}
