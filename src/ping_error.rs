use std::{error::Error, fmt, io};

pub type GenericError = Box<dyn Error + Send + Sync + 'static>;

pub type PingResult<T> = std::result::Result<T, PingError>;

/// Failures that end a whole session. Per-attempt problems (timeouts, ICMP errors) are
/// reported as [`crate::AttemptOutcome`]s instead.
#[derive(Debug)]
pub enum PingError {
    /// The raw socket could not be created, usually for lack of privileges.
    SocketAcquisition(io::Error),
    Resolution { host: String, message: String },
    MalformedPacket(String),
}

impl fmt::Display for PingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "PingError")?;
        match self {
            PingError::SocketAcquisition(error) => write!(f, ": could not open raw ICMP socket: {error}"),
            PingError::Resolution { host, message } => write!(f, ": could not resolve {host}: {message}"),
            PingError::MalformedPacket(message) => write!(f, ": malformed packet: {message}"),
        }
    }
}

impl Error for PingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PingError::SocketAcquisition(error) => Some(error),
            PingError::Resolution { .. } | PingError::MalformedPacket(_) => None,
        }
    }
}
