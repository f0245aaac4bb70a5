//! Battery observation: derive an integer percentage from the platform
//! sensor and republish it on a fixed interval.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tokio_util::task::AbortOnDropHandle;
use tracing::debug;

/// Battery percentage above which chat access is blocked.
pub const GATE_THRESHOLD: u8 = 5;

/// How often [`BatteryMonitor`] re-reads the sensor.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Point-in-time battery sensor collaborator.
pub trait BatterySensor: Send + Sync + 'static {
    /// Raw state-of-charge fraction in `[0, 1]`. Implementations return a
    /// negative value when the platform cannot report one (emulators,
    /// desktop builds).
    fn read_fraction(&self) -> f32;
}

/// Derive the integer percentage from a raw sensor fraction.
///
/// `None` means the reading is unavailable; callers treat that as "no gate
/// applied" rather than an error.
pub fn percent_from_fraction(raw: f32) -> Option<u8> {
    if !raw.is_finite() || raw < 0.0 {
        return None;
    }
    Some((raw.min(1.0) * 100.0).round() as u8)
}

/// Is chat access blocked at this reading? An unknown reading never gates.
pub fn gated(reading: Option<u8>, threshold: u8) -> bool {
    matches!(reading, Some(level) if level > threshold)
}

/// Samples the sensor on a fixed interval and publishes the derived
/// percentage on a watch channel. Sampling stops when the monitor is
/// dropped.
pub struct BatteryMonitor {
    level: watch::Receiver<Option<u8>>,
    _sampler: AbortOnDropHandle<()>,
}

impl BatteryMonitor {
    pub fn spawn(sensor: Arc<dyn BatterySensor>, refresh: Duration) -> Self {
        let (tx, level) = watch::channel(percent_from_fraction(sensor.read_fraction()));
        let sampler = AbortOnDropHandle::new(tokio::spawn(async move {
            let mut tick = interval(refresh);
            tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately and the channel already
            // holds an initial reading.
            tick.tick().await;
            loop {
                tick.tick().await;
                let reading = percent_from_fraction(sensor.read_fraction());
                debug!(?reading, "battery sampled");
                if tx.send(reading).is_err() {
                    break;
                }
            }
        }));
        Self {
            level,
            _sampler: sampler,
        }
    }

    /// Latest published reading.
    pub fn reading(&self) -> Option<u8> {
        *self.level.borrow()
    }

    /// Watch handle for flows that react to level changes.
    pub fn subscribe(&self) -> watch::Receiver<Option<u8>> {
        self.level.clone()
    }
}
