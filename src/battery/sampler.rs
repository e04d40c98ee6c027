//! Periodic battery sampling
//!
//! The scheduler that fires the sampling tick lives outside this crate; a
//! timer, a delayable work item, or a test calls [`BatterySampler::sample`]
//! at the configured interval and the sampler does the rest.

use std::sync::Arc;

use super::history::{BatterySample, SampleRingBuffer};

/// Source of the current battery state of charge.
///
/// In firmware this is the fuel gauge / ADC path; the simulator and tests
/// supply synthetic readings.
pub trait BatteryStateSource: Send + Sync {
    /// Current state of charge, 0-100
    fn state_of_charge(&self) -> u8;
}

/// Body of the periodic sampling tick: read the charge, stamp it, store it.
pub struct BatterySampler {
    source: Arc<dyn BatteryStateSource>,
    history: Arc<SampleRingBuffer>,
}

impl BatterySampler {
    pub fn new(source: Arc<dyn BatteryStateSource>, history: Arc<SampleRingBuffer>) -> Self {
        Self { source, history }
    }

    /// Take one sample at the given device uptime.
    pub fn sample(&self, uptime_seconds: u32) {
        let level_percent = self.source.state_of_charge();
        self.history.push(BatterySample {
            timestamp_seconds: uptime_seconds,
            level_percent,
        });
        log::debug!("battery sample: {level_percent}% at {uptime_seconds}s");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU8, Ordering};

    struct FakeGauge {
        level: AtomicU8,
    }

    impl BatteryStateSource for FakeGauge {
        fn state_of_charge(&self) -> u8 {
            self.level.load(Ordering::Relaxed)
        }
    }

    #[test]
    fn sample_records_current_charge_with_timestamp() {
        let gauge = Arc::new(FakeGauge {
            level: AtomicU8::new(87),
        });
        let history = Arc::new(SampleRingBuffer::new(8));
        let sampler = BatterySampler::new(gauge.clone(), history.clone());

        sampler.sample(60);
        gauge.level.store(85, Ordering::Relaxed);
        sampler.sample(120);

        let samples = history.read(0);
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].timestamp_seconds, 60);
        assert_eq!(samples[0].level_percent, 87);
        assert_eq!(samples[1].level_percent, 85);
    }
}
