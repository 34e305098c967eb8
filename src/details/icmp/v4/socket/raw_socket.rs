use super::IcmpSocket;
use socket2::{Domain, Protocol, Type};
use std::io::{self, Read};
use std::time::Duration;

/// Smallest budget a read timeout can express.
pub(crate) const MIN_READ_TIMEOUT: Duration = Duration::from_micros(1);

/// Raw IPv4 socket bound to the ICMP protocol. Reads return whole IP datagrams.
///
/// Opening one needs `CAP_NET_RAW` (or root). The socket is closed when dropped.
pub struct RawSocket {
    socket: socket2::Socket,
}

impl RawSocket {
    pub fn open() -> Result<Self, io::Error> {
        tracing::trace!("creating RawSocket");
        let socket = socket2::Socket::new(Domain::IPV4, Type::RAW, Some(Protocol::ICMPV4))?;
        Ok(RawSocket { socket })
    }
}

impl IcmpSocket for RawSocket {
    fn send_to(&self, buf: &[u8], addr: &socket2::SockAddr) -> io::Result<usize> {
        self.socket.send_to(buf, addr)
    }

    fn receive_with_deadline(&self, buf: &mut [u8], remaining: Duration) -> io::Result<Option<usize>> {
        // The kernel timeout has microsecond resolution and a zero timeout means "block forever".
        if remaining < MIN_READ_TIMEOUT {
            return Ok(None);
        }
        self.socket.set_read_timeout(Some(remaining))?;
        match (&self.socket).read(buf) {
            Ok(n) => Ok(Some(n)),
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
