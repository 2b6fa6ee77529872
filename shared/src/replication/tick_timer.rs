use std::time::{Duration, Instant};

/// Schedules the replication tick at a fixed rate.
///
/// The time a tick spent working is taken out of the wait before the next
/// one, so the achieved rate does not drift under load.
#[derive(Clone, Debug)]
pub struct TickTimer {
    interval: Duration,
    next_tick: Option<Instant>,
}

/// Longest wait between two ticks
pub const MAX_TICK_INTERVAL: Duration = Duration::from_secs(60 * 60);

impl TickTimer {
    /// `update_rate` is in ticks per second. Returns `None` for rates that
    /// are not positive or whose interval is longer than `MAX_TICK_INTERVAL`.
    pub fn new(update_rate: f32) -> Option<Self> {
        Some(Self {
            interval: Self::interval_for(update_rate)?,
            next_tick: None,
        })
    }

    pub fn interval_for(update_rate: f32) -> Option<Duration> {
        if !(update_rate.is_finite() && update_rate > 0.0) {
            return None;
        }
        Duration::try_from_secs_f64(1.0 / f64::from(update_rate))
            .ok()
            .filter(|interval| *interval <= MAX_TICK_INTERVAL)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether a tick is due at `now`. The first call is always due.
    pub fn ready(&self, now: &Instant) -> bool {
        self.next_tick.map_or(true, |next_tick| *now >= next_tick)
    }

    /// Schedules the next tick after one that began at `started` and
    /// worked for `processing`
    pub fn finish(&mut self, started: &Instant, processing: Duration) {
        let wait = self.interval.saturating_sub(processing);
        self.next_tick = Some(*started + processing + wait);
    }

    pub fn next_tick(&self) -> Option<Instant> {
        self.next_tick
    }
}
