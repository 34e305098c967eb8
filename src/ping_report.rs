use crate::AttemptOutcome;
use std::fmt;
use std::net::Ipv4Addr;

/// Running counters of a session. `received <= sent` and `rtts().len() == received` hold after
/// every [`SessionStats::record`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionStats {
    sent: u32,
    received: u32,
    rtts: Vec<f64>,
}

impl SessionStats {
    pub fn record(&mut self, outcome: &AttemptOutcome) {
        self.sent += 1;
        if let Some(seconds) = outcome.delay() {
            self.received += 1;
            self.rtts.push(seconds);
        }
    }

    pub fn sent(&self) -> u32 {
        self.sent
    }

    pub fn received(&self) -> u32 {
        self.received
    }

    /// Round-trip times in seconds, in attempt order.
    pub fn rtts(&self) -> &[f64] {
        &self.rtts
    }

    /// Lost requests in percent; `None` before the first attempt.
    pub fn loss_rate(&self) -> Option<f64> {
        if self.sent == 0 {
            return None;
        }
        Some(f64::from(self.sent - self.received) / f64::from(self.sent) * 100.0)
    }

    pub fn rtt_summary(&self) -> Option<RttSummary> {
        let first = *self.rtts.first()?;
        let (min, max, sum) = self
            .rtts
            .iter()
            .fold((first, first, 0.0), |(min, max, sum), &rtt| (min.min(rtt), max.max(rtt), sum + rtt));
        #[allow(clippy::cast_precision_loss)]
        let avg = sum / self.rtts.len() as f64;
        Some(RttSummary { min_ms: min * 1000.0, max_ms: max * 1000.0, avg_ms: avg * 1000.0 })
    }
}

/// Round-trip times in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RttSummary {
    pub min_ms: f64,
    pub max_ms: f64,
    pub avg_ms: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PingReport {
    pub target: Ipv4Addr,
    pub stats: SessionStats,
    /// One entry per attempt, in order.
    pub outcomes: Vec<AttemptOutcome>,
}

impl PingReport {
    pub fn sent(&self) -> u32 {
        self.stats.sent()
    }

    pub fn received(&self) -> u32 {
        self.stats.received()
    }

    pub fn loss_rate(&self) -> Option<f64> {
        self.stats.loss_rate()
    }

    /// `None` when no reply came back.
    pub fn rtt(&self) -> Option<RttSummary> {
        self.stats.rtt_summary()
    }
}

impl fmt::Display for PingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} packets sent, {} packets received", self.sent(), self.received())?;
        if let Some(loss_rate) = self.loss_rate() {
            write!(f, ", so loss rate of {loss_rate:.2}%")?;
        }
        writeln!(f)?;
        match self.rtt() {
            Some(RttSummary { min_ms, max_ms, avg_ms }) => {
                write!(f, "RTT min is {min_ms:.2}ms, max is {max_ms:.2}ms, and average is {avg_ms:.2}ms")
            }
            None => write!(f, "No RTTs to report."),
        }
    }
}
