//! Battery telemetry: sample history and periodic sampling

mod history;
mod sampler;

pub use history::{BatterySample, SampleRingBuffer};
pub use sampler::{BatterySampler, BatteryStateSource};
