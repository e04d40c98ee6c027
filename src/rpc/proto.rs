//! Wire message schema
//!
//! Protobuf-compatible request/response messages, written out as `prost`
//! derives so no protoc step is needed at build time. Field numbers are the
//! external contract shared with the client UI; never renumber them.
//! Length-delimited framing is handled by the transport, outside this
//! crate: the dispatcher sees one message payload per exchange.

use crate::{battery, keyboard, report};

// --- Requests ------------------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetDiagnosticsRequest {
    /// Zero the per-key counters once the snapshot has been taken
    #[prost(bool, tag = "1")]
    pub reset_after: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ResetDiagnosticsRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetHistoryRequest {
    /// Most-recent sample count to return; 0 means everything stored
    #[prost(uint32, tag = "1")]
    pub max_entries: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ClearHistoryRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Request {
    #[prost(oneof = "request::Kind", tags = "1, 2, 3, 4")]
    pub kind: Option<request::Kind>,
}

pub mod request {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Kind {
        #[prost(message, tag = "1")]
        GetDiagnostics(super::GetDiagnosticsRequest),
        #[prost(message, tag = "2")]
        ResetDiagnostics(super::ResetDiagnosticsRequest),
        #[prost(message, tag = "3")]
        GetHistory(super::GetHistoryRequest),
        #[prost(message, tag = "4")]
        ClearHistory(super::ClearHistoryRequest),
    }
}

// --- Responses -----------------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ErrorResponse {
    #[prost(string, tag = "1")]
    pub message: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ResetAck {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ClearAck {
    #[prost(bool, tag = "1")]
    pub success: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BatterySample {
    #[prost(uint32, tag = "1")]
    pub timestamp_seconds: u32,
    #[prost(uint32, tag = "2")]
    pub level_percent: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HistoryResponse {
    /// Oldest-first window of stored samples
    #[prost(message, repeated, tag = "1")]
    pub samples: ::prost::alloc::vec::Vec<BatterySample>,
    #[prost(uint32, tag = "2")]
    pub capacity: u32,
    #[prost(uint32, tag = "3")]
    pub total_entries: u32,
    #[prost(uint32, tag = "4")]
    pub sample_interval_seconds: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum KscanType {
    Unspecified = 0,
    Charlieplex = 1,
    Unsupported = 2,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GpioPin {
    #[prost(string, tag = "1")]
    pub port: ::prost::alloc::string::String,
    #[prost(uint32, tag = "2")]
    pub pin: u32,
    #[prost(uint32, tag = "3")]
    pub flags: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct KeyPhysical {
    #[prost(uint32, tag = "1")]
    pub position: u32,
    #[prost(sint32, tag = "2")]
    pub x: i32,
    #[prost(sint32, tag = "3")]
    pub y: i32,
    #[prost(uint32, tag = "4")]
    pub width: u32,
    #[prost(uint32, tag = "5")]
    pub height: u32,
    #[prost(sint32, optional, tag = "6")]
    pub rotation: Option<i32>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct KeyDiagnostics {
    #[prost(uint32, tag = "1")]
    pub position: u32,
    #[prost(uint32, tag = "2")]
    pub press_count: u32,
    #[prost(uint32, tag = "3")]
    pub release_count: u32,
    #[prost(uint32, tag = "4")]
    pub chatter_count: u32,
    #[prost(bool, tag = "5")]
    pub is_pressed: bool,
    #[prost(uint64, tag = "6")]
    pub last_change_ms: u64,
    #[prost(uint32, tag = "7")]
    pub row: u32,
    #[prost(uint32, tag = "8")]
    pub column: u32,
    #[prost(bool, tag = "9")]
    pub has_gpio_mapping: bool,
    #[prost(message, optional, tag = "10")]
    pub drive_gpio: Option<GpioPin>,
    #[prost(message, optional, tag = "11")]
    pub sense_gpio: Option<GpioPin>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DiagnosticsReport {
    #[prost(string, tag = "1")]
    pub layout_name: ::prost::alloc::string::String,
    #[prost(uint32, tag = "2")]
    pub layout_index: u32,
    #[prost(enumeration = "KscanType", tag = "3")]
    pub kscan_type: i32,
    #[prost(uint32, tag = "4")]
    pub chatter_window_ms: u32,
    #[prost(message, repeated, tag = "5")]
    pub physical_keys: ::prost::alloc::vec::Vec<KeyPhysical>,
    #[prost(message, repeated, tag = "6")]
    pub keys: ::prost::alloc::vec::Vec<KeyDiagnostics>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Response {
    #[prost(oneof = "response::Kind", tags = "1, 2, 3, 4, 5")]
    pub kind: Option<response::Kind>,
}

pub mod response {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Kind {
        #[prost(message, tag = "1")]
        Error(super::ErrorResponse),
        #[prost(message, tag = "2")]
        Diagnostics(super::DiagnosticsReport),
        #[prost(message, tag = "3")]
        ResetAck(super::ResetAck),
        #[prost(message, tag = "4")]
        History(super::HistoryResponse),
        #[prost(message, tag = "5")]
        ClearAck(super::ClearAck),
    }
}

impl Response {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: Some(response::Kind::Error(ErrorResponse {
                message: message.into(),
            })),
        }
    }

    pub fn diagnostics(report: DiagnosticsReport) -> Self {
        Self {
            kind: Some(response::Kind::Diagnostics(report)),
        }
    }

    pub fn reset_ack() -> Self {
        Self {
            kind: Some(response::Kind::ResetAck(ResetAck {})),
        }
    }

    pub fn history(history: HistoryResponse) -> Self {
        Self {
            kind: Some(response::Kind::History(history)),
        }
    }

    pub fn clear_ack(success: bool) -> Self {
        Self {
            kind: Some(response::Kind::ClearAck(ClearAck { success })),
        }
    }
}

// --- Domain conversions --------------------------------------------------

impl From<&battery::BatterySample> for BatterySample {
    fn from(sample: &battery::BatterySample) -> Self {
        Self {
            timestamp_seconds: sample.timestamp_seconds,
            level_percent: sample.level_percent as u32,
        }
    }
}

impl From<&keyboard::GpioPin> for GpioPin {
    fn from(pin: &keyboard::GpioPin) -> Self {
        Self {
            port: pin.port.clone(),
            pin: pin.pin,
            flags: pin.flags,
        }
    }
}

impl From<&keyboard::KeyGeometry> for KeyPhysical {
    fn from(geometry: &keyboard::KeyGeometry) -> Self {
        Self {
            position: geometry.position,
            x: geometry.x,
            y: geometry.y,
            width: geometry.width,
            height: geometry.height,
            rotation: geometry.rotation,
        }
    }
}

impl From<report::KscanType> for KscanType {
    fn from(kind: report::KscanType) -> Self {
        match kind {
            report::KscanType::Unspecified => KscanType::Unspecified,
            report::KscanType::Charlieplex => KscanType::Charlieplex,
            report::KscanType::Unsupported => KscanType::Unsupported,
        }
    }
}

impl From<&report::KeyDiagnostics> for KeyDiagnostics {
    fn from(key: &report::KeyDiagnostics) -> Self {
        Self {
            position: key.position,
            press_count: key.press_count,
            release_count: key.release_count,
            chatter_count: key.chatter_count,
            is_pressed: key.is_pressed,
            last_change_ms: key.last_change_ms,
            row: key.row,
            column: key.column,
            has_gpio_mapping: key.has_gpio_mapping,
            drive_gpio: key.drive_gpio.as_ref().map(GpioPin::from),
            sense_gpio: key.sense_gpio.as_ref().map(GpioPin::from),
        }
    }
}

impl From<&report::DiagnosticsReport> for DiagnosticsReport {
    fn from(report: &report::DiagnosticsReport) -> Self {
        Self {
            layout_name: report.layout_name.clone(),
            layout_index: report.layout_index,
            kscan_type: KscanType::from(report.kscan_type) as i32,
            chatter_window_ms: report.chatter_window_ms as u32,
            physical_keys: report.physical_keys.iter().map(KeyPhysical::from).collect(),
            keys: report.keys.iter().map(KeyDiagnostics::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn request_oneof_roundtrip() {
        let request = Request {
            kind: Some(request::Kind::GetHistory(GetHistoryRequest {
                max_entries: 17,
            })),
        };

        let bytes = request.encode_to_vec();
        let decoded = Request::decode(bytes.as_slice()).expect("decode failed");
        assert_eq!(decoded, request);
    }

    #[test]
    fn empty_request_decodes_to_no_kind() {
        let decoded = Request::decode(&[][..]).expect("decode failed");
        assert!(decoded.kind.is_none());
    }

    #[test]
    fn kscan_type_accessor_tolerates_unknown_values() {
        let mut report = DiagnosticsReport::default();
        report.kscan_type = 99;
        assert_eq!(report.kscan_type(), KscanType::Unspecified);

        report.kscan_type = KscanType::Charlieplex as i32;
        assert_eq!(report.kscan_type(), KscanType::Charlieplex);
    }

    #[test]
    fn domain_report_converts_field_for_field() {
        let domain = crate::report::DiagnosticsReport {
            layout_name: "demo".to_string(),
            layout_index: 2,
            kscan_type: crate::report::KscanType::Charlieplex,
            chatter_window_ms: 5,
            physical_keys: vec![crate::keyboard::KeyGeometry {
                position: 0,
                x: -50,
                y: 0,
                width: 100,
                height: 100,
                rotation: Some(-90),
            }],
            keys: vec![],
        };

        let wire = DiagnosticsReport::from(&domain);
        assert_eq!(wire.layout_name, "demo");
        assert_eq!(wire.kscan_type(), KscanType::Charlieplex);
        assert_eq!(wire.physical_keys[0].x, -50);
        assert_eq!(wire.physical_keys[0].rotation, Some(-90));
    }
}
