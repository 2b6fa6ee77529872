use std::{
    fmt,
    time::{Duration, Instant},
};

/// Averages over one status interval
#[derive(Clone, Debug, PartialEq)]
pub struct StatusReport {
    pub ticks: u32,
    pub average_tick: Duration,
    pub messages: u64,
    pub connections: usize,
    pub interval: Duration,
}

impl StatusReport {
    pub fn messages_per_second(&self) -> f32 {
        let seconds = self.interval.as_secs_f32();
        if seconds > 0.0 {
            self.messages as f32 / seconds
        } else {
            0.0
        }
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ticks, avg {:.3}ms/tick, {} msgs ({:.1}/s), {} connections",
            self.ticks,
            self.average_tick.as_secs_f64() * 1000.0,
            self.messages,
            self.messages_per_second(),
            self.connections,
        )
    }
}

/// Accumulates tick timings and message counts between reports
#[derive(Clone, Debug)]
pub struct StatusReporter {
    interval: Duration,
    window_start: Option<Instant>,
    ticks: u32,
    busy: Duration,
    messages: u64,
}

impl StatusReporter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            window_start: None,
            ticks: 0,
            busy: Duration::ZERO,
            messages: 0,
        }
    }

    pub fn record_tick(&mut self, processing: Duration, messages: usize) {
        self.ticks += 1;
        self.busy += processing;
        self.messages += messages as u64;
    }

    /// Returns a report and starts a new window once `interval` has elapsed
    pub fn poll(&mut self, now: &Instant, connections: usize) -> Option<StatusReport> {
        let window_start = *self.window_start.get_or_insert(*now);
        let elapsed = now.saturating_duration_since(window_start);
        if elapsed < self.interval || self.interval.is_zero() {
            return None;
        }

        let report = StatusReport {
            ticks: self.ticks,
            average_tick: if self.ticks > 0 {
                self.busy / self.ticks
            } else {
                Duration::ZERO
            },
            messages: self.messages,
            connections,
            interval: elapsed,
        };
        self.window_start = Some(*now);
        self.ticks = 0;
        self.busy = Duration::ZERO;
        self.messages = 0;
        Some(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_once_per_interval() {
        let start = Instant::now();
        let mut reporter = StatusReporter::new(Duration::from_secs(2));
        assert_eq!(reporter.poll(&start, 0), None);

        reporter.record_tick(Duration::from_millis(2), 3);
        reporter.record_tick(Duration::from_millis(4), 1);
        assert_eq!(reporter.poll(&(start + Duration::from_secs(1)), 1), None);

        let report = reporter.poll(&(start + Duration::from_secs(2)), 1).unwrap();
        assert_eq!(report.ticks, 2);
        assert_eq!(report.average_tick, Duration::from_millis(3));
        assert_eq!(report.messages, 4);
        assert_eq!(report.messages_per_second(), 2.0);

        // the window restarts
        assert_eq!(reporter.poll(&(start + Duration::from_secs(3)), 1), None);
    }
}
