use std::{io, time::Duration};

pub(crate) mod raw_socket;
pub(crate) use raw_socket::MIN_READ_TIMEOUT;

/// A socket that sees every ICMP datagram delivered to the host, not only replies to us.
pub trait IcmpSocket {
    fn send_to(&self, buf: &[u8], addr: &socket2::SockAddr) -> io::Result<usize>;

    /// Reads one datagram (IP header included) into `buf`, blocking for at most `remaining`.
    ///
    /// `Ok(None)` means nothing arrived in time.
    fn receive_with_deadline(&self, buf: &mut [u8], remaining: Duration) -> io::Result<Option<usize>>;
}
