use crate::details::icmp::v4::echo_codec::ParsedReply;
use std::fmt;

/// Result of a single echo attempt.
#[derive(Clone, Debug, PartialEq)]
pub enum AttemptOutcome {
    /// Round-trip time in seconds.
    Delay(f64),
    Error(String),
    Timeout,
}

impl AttemptOutcome {
    pub fn delay(&self) -> Option<f64> {
        match *self {
            AttemptOutcome::Delay(seconds) => Some(seconds),
            AttemptOutcome::Error(_) | AttemptOutcome::Timeout => None,
        }
    }
}

impl From<ParsedReply> for AttemptOutcome {
    fn from(reply: ParsedReply) -> Self {
        match reply {
            ParsedReply::Success { rtt_seconds } => AttemptOutcome::Delay(rtt_seconds),
            error => AttemptOutcome::Error(error.error_message().unwrap_or_default()),
        }
    }
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptOutcome::Delay(seconds) => write!(f, "time = {:.2}ms", seconds * 1000.0),
            AttemptOutcome::Error(message) => write!(f, "{message}"),
            AttemptOutcome::Timeout => write!(f, "Request timed out."),
        }
    }
}
