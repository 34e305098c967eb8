use crate::details::icmp::v4::{EchoCodec, IcmpSocket, RawSocket};
use crate::details::EchoExchange;
use crate::utils::lookup_host_v4;
use crate::{AttemptOutcome, PingConfig, PingError, PingReport, PingResult, SessionStats};
use std::io;
use std::net::Ipv4Addr;
use std::time::Duration;

/// Sends `count` echo requests one after the other and collects the statistics.
///
/// Each attempt opens its own socket through the opener and closes it before the pause that
/// follows. Failing to open a socket ends the session.
#[allow(clippy::module_name_repetitions)]
pub struct PingSession<F> {
    config: PingConfig,
    open_socket: F,
}

impl PingSession<fn() -> io::Result<RawSocket>> {
    /// Session on raw ICMP sockets. Needs root or `CAP_NET_RAW`.
    pub fn raw(config: PingConfig) -> Self {
        PingSession { config, open_socket: RawSocket::open }
    }
}

impl<F, S> PingSession<F>
where
    F: Fn() -> io::Result<S>,
    S: IcmpSocket,
{
    pub fn with_socket_opener(config: PingConfig, open_socket: F) -> Self {
        PingSession { config, open_socket }
    }

    pub fn config(&self) -> &PingConfig {
        &self.config
    }

    pub fn run(&self, host: &str) -> PingResult<PingReport> {
        self.run_with(host, |_, _| {})
    }

    /// Like [`PingSession::run`], calling `on_attempt` with the attempt index and its outcome
    /// as soon as each attempt ends.
    pub fn run_with<C>(&self, host: &str, mut on_attempt: C) -> PingResult<PingReport>
    where
        C: FnMut(u32, &AttemptOutcome),
    {
        let target = lookup_host_v4(host)?;
        tracing::debug!("pinging {host} ({target}) {} times", self.config.count);

        let codec = EchoCodec::new(self.config.identifier, self.config.swap_checksum_twice);
        let mut stats = SessionStats::default();
        let mut outcomes = vec![];
        for attempt in 0..self.config.count {
            let outcome = self.attempt(codec, target)?;
            stats.record(&outcome);
            tracing::debug!("attempt {attempt} to {target}: {outcome}");
            on_attempt(attempt, &outcome);
            outcomes.push(outcome);

            std::thread::sleep(self.config.interval);
        }

        Ok(PingReport { target, stats, outcomes })
    }

    fn attempt(&self, codec: EchoCodec, target: Ipv4Addr) -> PingResult<AttemptOutcome> {
        let socket = (self.open_socket)().map_err(PingError::SocketAcquisition)?;
        let mut exchange = EchoExchange::new(socket, codec, self.config.timeout);
        let outcome = exchange.run(target);
        tracing::trace!("exchange with {target} went through {:?}", exchange.get_states());
        Ok(outcome)
    }
}

/// Pings `host` `count` times over raw sockets, waiting up to `timeout` for each reply.
pub fn ping(host: &str, timeout: Duration, count: u32) -> PingResult<PingReport> {
    let config = PingConfig { timeout, count, ..PingConfig::default() };
    PingSession::raw(config).run(host)
}
