use std::time::Duration;

/// Settings for a [`crate::PingSession`].
///
/// `PingConfig::default()` resolves the process identifier and the platform checksum handling
/// once; override single fields with struct update syntax.
#[allow(clippy::module_name_repetitions)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PingConfig {
    /// How long one attempt waits for its reply.
    pub timeout: Duration,
    /// Number of attempts.
    pub count: u32,
    /// Pause after every attempt, however long the attempt took.
    pub interval: Duration,
    /// Echo identifier; replies carrying any other identifier are ignored.
    pub identifier: u16,
    /// Byte-swap the computed checksum a second time before writing it.
    pub swap_checksum_twice: bool,
}

impl Default for PingConfig {
    fn default() -> Self {
        PingConfig {
            timeout: Duration::from_secs(1),
            count: 10,
            interval: Duration::from_secs(1),
            identifier: process_identifier(),
            swap_checksum_twice: swap_checksum_twice_for_target(),
        }
    }
}

/// Identifier derived from the process id, truncated to 16 bits.
pub fn process_identifier() -> u16 {
    u16::try_from(std::process::id() & 0xFFFF).unwrap_or_default()
}

/// Whether echo requests built on this platform need the second checksum swap.
///
/// Headers are written in network byte order and the checksum engine already returns its
/// result in that order, so the kernels we build for (Linux, the BSDs and macOS) all take the
/// checksum as computed. The flag stays in [`PingConfig`] for kernels that expect it in host
/// order.
pub const fn swap_checksum_twice_for_target() -> bool {
    false
}
