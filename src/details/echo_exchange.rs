use crate::details::icmp::v4::echo_codec::parse_reply;
use crate::details::icmp::v4::socket::MIN_READ_TIMEOUT;
use crate::details::icmp::v4::{EchoCodec, IcmpSocket};
use crate::utils::unix_time_secs;
use crate::AttemptOutcome;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant};

const RECV_BUFFER_LEN: usize = 1024;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum State {
    WaitingForReady,
    PacketArrived,
    Matched,
    Mismatched,
    IcmpError,
    TimedOut,
    Failed,
}

/// One echo request and the wait for its answer, on a socket owned for just this attempt.
///
/// Dropping the exchange closes the socket.
pub(crate) struct EchoExchange<S> {
    states: Vec<State>,
    socket: S,
    codec: EchoCodec,
    timeout: Duration,
}

impl<S> EchoExchange<S>
where
    S: IcmpSocket,
{
    pub(crate) fn new(socket: S, codec: EchoCodec, timeout: Duration) -> Self {
        EchoExchange { states: vec![], socket, codec, timeout }
    }

    /// States passed through so far, oldest first.
    pub(crate) fn get_states(&self) -> Vec<State> {
        self.states.clone()
    }

    pub(crate) fn run(&mut self, target: Ipv4Addr) -> AttemptOutcome {
        if let Err(message) = self.send(target) {
            tracing::warn!("{message}");
            self.states.push(State::Failed);
            return AttemptOutcome::Error(message);
        }
        self.receive()
    }

    fn send(&self, target: Ipv4Addr) -> Result<(), String> {
        let packet = self
            .codec
            .build_echo_request(unix_time_secs())
            .ok_or_else(|| "could not create ICMP package".to_owned())?;
        let addr: socket2::SockAddr = SocketAddr::new(IpAddr::V4(target), 0).into();
        self.socket.send_to(&packet, &addr).map_err(|error| format!("send failed: {error}"))?;
        tracing::trace!("echo request sent to {target} with identifier {}", self.codec.identifier());
        Ok(())
    }

    fn receive(&mut self) -> AttemptOutcome {
        let mut buf = [0u8; RECV_BUFFER_LEN];
        let mut remaining = self.timeout;
        loop {
            if remaining < MIN_READ_TIMEOUT {
                return self.timed_out();
            }
            self.states.push(State::WaitingForReady);
            let started_wait = Instant::now();
            let received = self.socket.receive_with_deadline(&mut buf, remaining);
            let waited = started_wait.elapsed();

            let n = match received {
                Ok(Some(n)) => n,
                Ok(None) => return self.timed_out(),
                Err(error) => {
                    tracing::warn!("receive failed: {error}");
                    self.states.push(State::Failed);
                    return AttemptOutcome::Error(format!("receive failed: {error}"));
                }
            };
            let arrival_time = unix_time_secs();
            self.states.push(State::PacketArrived);

            match parse_reply(&buf[..n]) {
                Ok(datagram) => match self.codec.classify(&datagram, arrival_time) {
                    Some(reply) => return self.finish(reply.into()),
                    None => tracing::trace!("unrelated ICMP type {} on socket", datagram.header.icmp_type),
                },
                Err(error) => tracing::debug!("ignoring datagram: {error}"),
            }

            self.states.push(State::Mismatched);
            remaining = remaining.saturating_sub(waited);
        }
    }

    fn finish(&mut self, outcome: AttemptOutcome) -> AttemptOutcome {
        match outcome {
            AttemptOutcome::Delay(seconds) => {
                tracing::trace!("echo reply after {seconds}s");
                self.states.push(State::Matched);
            }
            AttemptOutcome::Error(ref message) => {
                // Not checked against our identifier: error messages quote the original request,
                // which this exchange does not inspect.
                tracing::warn!("ICMP error: {message}");
                self.states.push(State::IcmpError);
            }
            AttemptOutcome::Timeout => self.states.push(State::TimedOut),
        }
        outcome
    }

    fn timed_out(&mut self) -> AttemptOutcome {
        tracing::warn!("no matching reply within {:?}", self.timeout);
        self.states.push(State::TimedOut);
        AttemptOutcome::Timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::details::icmp::v4::echo_codec::tests::{icmp_message, into_reply, ipv4_datagram};
    use crate::details::icmp::v4::socket::tests::{OnReceive, OnSend, SocketMock};
    use more_asserts as ma;

    const IDENTIFIER: u16 = 0xABCD;
    const LOCALHOST: Ipv4Addr = Ipv4Addr::new(127, 0, 0, 1);

    fn exchange(socket: SocketMock, timeout: Duration) -> EchoExchange<SocketMock> {
        EchoExchange::new(socket, EchoCodec::new(IDENTIFIER, false), timeout)
    }

    fn reply_for(identifier: u16) -> Vec<u8> {
        let request = EchoCodec::new(identifier, false).build_echo_request(unix_time_secs()).unwrap();
        ipv4_datagram(5, &into_reply(request))
    }

    #[test]
    fn matching_reply_yields_delay() {
        let socket = SocketMock::echoing(1);
        let mut exchange = exchange(socket.clone(), Duration::from_secs(1));

        let outcome = exchange.run(LOCALHOST);

        let delay = outcome.delay().expect("expected a delay");
        ma::assert_ge!(delay, 0.0);
        ma::assert_lt!(delay, 1.0);
        assert_eq!(vec![State::WaitingForReady, State::PacketArrived, State::Matched], exchange.get_states());
        socket.should_send_number_of_messages(1).should_send_to_address(&IpAddr::V4(LOCALHOST));
    }

    #[test]
    fn sends_one_echo_request_with_identifier() {
        let socket = SocketMock::echoing(1);
        exchange(socket.clone(), Duration::from_secs(1)).run(LOCALHOST);

        let sent = socket.sent_packets();
        assert_eq!(1, sent.len());
        assert_eq!(8, sent[0][0]);
        assert_eq!(IDENTIFIER.to_be_bytes(), sent[0][4..6]);
    }

    #[test]
    fn mismatched_reply_then_silence_times_out() {
        let socket = SocketMock::new(OnSend::ReturnDefault, vec![OnReceive::Datagram(reply_for(IDENTIFIER + 1))]);
        let mut exchange = exchange(socket.clone(), Duration::from_secs(1));

        assert_eq!(AttemptOutcome::Timeout, exchange.run(LOCALHOST));
        assert_eq!(
            vec![State::WaitingForReady, State::PacketArrived, State::Mismatched, State::WaitingForReady, State::TimedOut],
            exchange.get_states()
        );
        socket.should_have_drained_script();
    }

    #[test]
    fn mismatched_replies_are_drained_until_the_match() {
        let socket = SocketMock::new(
            OnSend::ReturnDefault,
            vec![
                OnReceive::Datagram(reply_for(1)),
                OnReceive::Datagram(reply_for(2)),
                OnReceive::EchoLastRequest,
            ],
        );
        let mut exchange = exchange(socket.clone(), Duration::from_secs(1));

        assert!(matches!(exchange.run(LOCALHOST), AttemptOutcome::Delay(_)));
        assert_eq!(Some(&State::Matched), exchange.get_states().last());
        assert_eq!(2, exchange.get_states().iter().filter(|state| **state == State::Mismatched).count());
    }

    #[test]
    fn destination_host_unreachable_is_an_error() {
        let unreachable = ipv4_datagram(5, &icmp_message(3, 1, 0, &[0u8; 28]));
        let socket = SocketMock::new(OnSend::ReturnDefault, vec![OnReceive::Datagram(unreachable)]);
        let mut exchange = exchange(socket, Duration::from_secs(1));

        assert_eq!(AttemptOutcome::Error("1: Destination Host Unreachable".to_string()), exchange.run(LOCALHOST));
        assert_eq!(vec![State::WaitingForReady, State::PacketArrived, State::IcmpError], exchange.get_states());
    }

    #[test]
    fn time_exceeded_ends_the_wait_even_if_a_reply_follows() {
        let time_exceeded = ipv4_datagram(5, &icmp_message(11, 0, 0, &[0u8; 28]));
        let socket = SocketMock::new(
            OnSend::ReturnDefault,
            vec![OnReceive::Datagram(time_exceeded), OnReceive::EchoLastRequest],
        );
        let mut exchange = exchange(socket, Duration::from_secs(1));

        assert_eq!(AttemptOutcome::Error("Time Exceeded".to_string()), exchange.run(LOCALHOST));
    }

    #[test]
    fn own_request_on_loopback_is_skipped() {
        let own_request =
            ipv4_datagram(5, &EchoCodec::new(IDENTIFIER, false).build_echo_request(unix_time_secs()).unwrap());
        let socket = SocketMock::new(
            OnSend::ReturnDefault,
            vec![OnReceive::Datagram(own_request), OnReceive::EchoLastRequest],
        );
        let mut exchange = exchange(socket, Duration::from_secs(1));

        assert!(matches!(exchange.run(LOCALHOST), AttemptOutcome::Delay(_)));
    }

    #[test]
    fn malformed_datagram_is_skipped() {
        let socket = SocketMock::new(
            OnSend::ReturnDefault,
            vec![OnReceive::Datagram(vec![0x45, 0x00, 0x00]), OnReceive::EchoLastRequest],
        );
        let mut exchange = exchange(socket, Duration::from_secs(1));

        assert!(matches!(exchange.run(LOCALHOST), AttemptOutcome::Delay(_)));
    }

    #[test]
    fn waiting_shrinks_the_budget() {
        let timeout = Duration::from_millis(500);
        let wait = Duration::from_millis(100);
        let socket = SocketMock::new(
            OnSend::ReturnDefault,
            vec![OnReceive::DatagramAfter(wait, reply_for(IDENTIFIER + 1)), OnReceive::Nothing],
        );
        let mut exchange = exchange(socket.clone(), timeout);

        assert_eq!(AttemptOutcome::Timeout, exchange.run(LOCALHOST));

        let budgets = socket.budgets();
        assert_eq!(2, budgets.len());
        assert_eq!(timeout, budgets[0]);
        ma::assert_le!(budgets[1], timeout - wait);
    }

    #[test]
    fn unrelated_traffic_cannot_extend_the_wait() {
        let timeout = Duration::from_millis(100);
        let socket = SocketMock::new(
            OnSend::ReturnDefault,
            vec![
                OnReceive::DatagramAfter(Duration::from_millis(60), reply_for(IDENTIFIER + 1)),
                OnReceive::DatagramAfter(Duration::from_millis(60), reply_for(IDENTIFIER + 2)),
                OnReceive::EchoLastRequest,
            ],
        );
        let mut exchange = exchange(socket, timeout);

        let started = Instant::now();
        assert_eq!(AttemptOutcome::Timeout, exchange.run(LOCALHOST));
        ma::assert_lt!(started.elapsed(), Duration::from_millis(500));
    }

    #[test]
    fn mismatch_with_no_budget_left_times_out() {
        let socket = SocketMock::new(
            OnSend::ReturnDefault,
            vec![OnReceive::Datagram(reply_for(IDENTIFIER + 1)), OnReceive::EchoLastRequest],
        );
        let mut exchange = exchange(socket.clone(), Duration::ZERO);

        assert_eq!(AttemptOutcome::Timeout, exchange.run(LOCALHOST));
        assert_eq!(vec![State::TimedOut], exchange.get_states());
        assert!(socket.budgets().is_empty());
    }

    #[test]
    fn sub_microsecond_budget_is_never_handed_to_the_socket() {
        let socket = SocketMock::new(OnSend::ReturnDefault, vec![OnReceive::EchoLastRequest]);
        let mut exchange = exchange(socket.clone(), Duration::from_nanos(500));

        assert_eq!(AttemptOutcome::Timeout, exchange.run(LOCALHOST));
        assert!(socket.budgets().is_empty());
    }

    #[test]
    fn budget_left_after_unrelated_traffic_is_at_least_a_microsecond() {
        let timeout = Duration::from_millis(20);
        let socket = SocketMock::new(
            OnSend::ReturnDefault,
            vec![
                OnReceive::DatagramAfter(Duration::from_millis(9), reply_for(IDENTIFIER + 1)),
                OnReceive::DatagramAfter(Duration::from_millis(9), reply_for(IDENTIFIER + 2)),
                OnReceive::DatagramAfter(Duration::from_millis(9), reply_for(IDENTIFIER + 3)),
                OnReceive::Nothing,
            ],
        );
        let mut exchange = exchange(socket.clone(), timeout);

        assert_eq!(AttemptOutcome::Timeout, exchange.run(LOCALHOST));
        for budget in socket.budgets() {
            ma::assert_ge!(budget, MIN_READ_TIMEOUT);
        }
    }

    #[test]
    fn when_send_fails_then_attempt_fails_without_waiting() {
        let socket = SocketMock::new(OnSend::ReturnErr, vec![OnReceive::EchoLastRequest]);
        let mut exchange = exchange(socket.clone(), Duration::from_secs(1));

        let outcome = exchange.run(LOCALHOST);

        assert!(matches!(outcome, AttemptOutcome::Error(ref message) if message.starts_with("send failed")));
        assert_eq!(vec![State::Failed], exchange.get_states());
        assert!(socket.budgets().is_empty());
    }

    #[test]
    fn when_receive_fails_then_attempt_fails() {
        let socket = SocketMock::new(OnSend::ReturnDefault, vec![OnReceive::Fail]);
        let mut exchange = exchange(socket, Duration::from_secs(1));

        let outcome = exchange.run(LOCALHOST);

        assert!(matches!(outcome, AttemptOutcome::Error(ref message) if message.starts_with("receive failed")));
        assert_eq!(vec![State::WaitingForReady, State::Failed], exchange.get_states());
    }
}
