//! Request/response protocol surface
//!
//! The transport layer routes inbound payloads to this subsystem by its
//! registered identifier and consumes the advertised metadata; everything
//! past that boundary is [`RequestDispatcher`].

mod dispatch;
pub mod proto;

pub use dispatch::RequestDispatcher;

/// Security classification consumed by the transport layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityLevel {
    /// No unlock required; suggested default so diagnostics stay reachable
    /// in unreliable environments
    Unsecured,
    /// Transport must be unlocked before requests are routed here
    Secured,
}

/// Registration metadata for the diagnostics subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubsystemMeta {
    /// Stable routing identifier, `<namespace>__<feature>` form
    pub id: &'static str,
    /// Where a client can load the matching UI from
    pub ui_url: &'static str,
    pub security: SecurityLevel,
}

/// Metadata the transport registers for this subsystem
pub const SUBSYSTEM_META: SubsystemMeta = SubsystemMeta {
    id: "kbd__diagnostics",
    ui_url: "http://localhost:5173",
    security: SecurityLevel::Unsecured,
};
