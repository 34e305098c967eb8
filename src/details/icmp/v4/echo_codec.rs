use crate::details::checksum::checksum;
use crate::details::icmp::v4::SequenceNumber;
use crate::PingError;
use pnet_packet::icmp::echo_reply::EchoReplyPacket;
use pnet_packet::icmp::echo_request::{EchoRequestPacket, MutableEchoRequestPacket};
use pnet_packet::icmp::{IcmpCode, IcmpTypes};
use pnet_packet::ipv4::Ipv4Packet;
use pnet_packet::Packet;

pub(crate) const ICMP_HEADER_SIZE: usize = 8;
pub(crate) const TIMESTAMP_SIZE: usize = 8;

const ECHO_REPLY: u8 = IcmpTypes::EchoReply.0;
const ECHO_REQUEST: u8 = IcmpTypes::EchoRequest.0;
const DESTINATION_UNREACHABLE: u8 = IcmpTypes::DestinationUnreachable.0;
const TIME_EXCEEDED: u8 = IcmpTypes::TimeExceeded.0;

/// The eight bytes following the IP header, read as an echo header.
///
/// Error messages (types 3, 11, ...) have the same first four bytes; for them `identifier` and
/// `sequence` hold whatever the "unused" field contains.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IcmpHeader {
    pub icmp_type: u8,
    pub code: u8,
    pub checksum: u16,
    pub identifier: u16,
    pub sequence: u16,
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParsedDatagram<'a> {
    pub ip_header_len: usize,
    pub header: IcmpHeader,
    pub payload: &'a [u8],
}

impl ParsedDatagram<'_> {
    /// Send time embedded by [`EchoCodec::build_echo_request`], if the payload is long enough.
    pub fn timestamp(&self) -> Option<f64> {
        let bytes: [u8; TIMESTAMP_SIZE] = self.payload.get(..TIMESTAMP_SIZE)?.try_into().ok()?;
        Some(f64::from_ne_bytes(bytes))
    }
}

/// What a received datagram means for the attempt waiting on it.
#[derive(Clone, Debug, PartialEq)]
pub enum ParsedReply {
    Success { rtt_seconds: f64 },
    DestinationUnreachable { code: u8 },
    TimeExceeded,
    OtherIcmpError { icmp_type: u8, code: u8 },
}

impl ParsedReply {
    /// Human readable description of an error reply; `None` for [`ParsedReply::Success`].
    pub fn error_message(&self) -> Option<String> {
        match *self {
            ParsedReply::Success { .. } => None,
            ParsedReply::DestinationUnreachable { code } => Some(match code {
                0 => "0: Destination Network Unreachable".to_owned(),
                1 => "1: Destination Host Unreachable".to_owned(),
                3 => "3: Destination Port Unreachable".to_owned(),
                _ => generic_error_message(DESTINATION_UNREACHABLE, code),
            }),
            ParsedReply::TimeExceeded => Some("Time Exceeded".to_owned()),
            ParsedReply::OtherIcmpError { icmp_type, code } => Some(generic_error_message(icmp_type, code)),
        }
    }
}

fn generic_error_message(icmp_type: u8, code: u8) -> String {
    format!("ICMP Error: Type {icmp_type}, Code {code}")
}

/// Builds echo requests for one identifier and classifies what comes back.
#[derive(Clone, Copy, Debug)]
pub struct EchoCodec {
    identifier: u16,
    swap_checksum_twice: bool,
}

impl EchoCodec {
    pub fn new(identifier: u16, swap_checksum_twice: bool) -> Self {
        EchoCodec { identifier, swap_checksum_twice }
    }

    pub fn identifier(&self) -> u16 {
        self.identifier
    }

    /// Echo request carrying `timestamp` (seconds since the UNIX epoch) as its payload.
    ///
    /// Returns `None` only if pnet refuses the buffer, which cannot happen for the fixed size
    /// used here.
    pub fn build_echo_request(&self, timestamp: f64) -> Option<Vec<u8>> {
        let buf = vec![0u8; EchoRequestPacket::minimum_packet_size() + TIMESTAMP_SIZE];
        let mut package = MutableEchoRequestPacket::owned(buf)?;
        package.set_icmp_type(IcmpTypes::EchoRequest);
        package.set_icmp_code(IcmpCode::new(0));
        package.set_identifier(self.identifier);
        package.set_sequence_number(SequenceNumber::start_value().into());
        package.set_payload(&timestamp.to_ne_bytes());

        package.set_checksum(0_u16);
        let mut sum = checksum(package.packet());
        if self.swap_checksum_twice {
            sum = sum.swap_bytes();
        }
        package.set_checksum(sum);
        Some(package.packet().to_vec())
    }

    /// Maps a parsed datagram to a reply for this codec's identifier.
    ///
    /// `None` means the datagram is unrelated traffic and the caller should keep waiting:
    /// an echo reply for another identifier, an echo request (the loopback copy of our own
    /// request shows up on the raw socket), or a matching reply without a timestamp.
    ///
    /// Known limitation: any other ICMP type is reported as an error for this attempt without
    /// checking that it refers to our request.
    pub fn classify(&self, datagram: &ParsedDatagram<'_>, arrival_time: f64) -> Option<ParsedReply> {
        let IcmpHeader { icmp_type, code, identifier, .. } = datagram.header;
        match icmp_type {
            ECHO_REPLY if identifier == self.identifier => match datagram.timestamp() {
                Some(sent_time) => Some(ParsedReply::Success { rtt_seconds: arrival_time - sent_time }),
                None => {
                    tracing::debug!("echo reply for identifier {identifier} without timestamp");
                    None
                }
            },
            ECHO_REPLY => {
                tracing::debug!("echo reply for identifier {identifier}, waiting for {}", self.identifier);
                None
            }
            ECHO_REQUEST => None,
            DESTINATION_UNREACHABLE if matches!(code, 0 | 1 | 3) => Some(ParsedReply::DestinationUnreachable { code }),
            TIME_EXCEEDED => Some(ParsedReply::TimeExceeded),
            _ => Some(ParsedReply::OtherIcmpError { icmp_type, code }),
        }
    }
}

/// Length of the IPv4 header in bytes, from the IHL nibble.
pub fn ip_header_len(datagram: &[u8]) -> Option<usize> {
    let ipv4_packet = Ipv4Packet::new(datagram)?;
    Some(usize::from(ipv4_packet.get_header_length()) * 4)
}

/// Splits a datagram read from a raw socket into IP header length, ICMP header and payload.
///
/// The received checksum is not verified.
pub fn parse_reply(datagram: &[u8]) -> Result<ParsedDatagram<'_>, PingError> {
    let ip_header_len = ip_header_len(datagram)
        .ok_or_else(|| PingError::MalformedPacket(format!("{} bytes is too short for an IPv4 header", datagram.len())))?;
    let icmp_bytes = datagram.get(ip_header_len..).unwrap_or_default();
    let echo = EchoReplyPacket::new(icmp_bytes).ok_or_else(|| {
        PingError::MalformedPacket(format!("{} bytes after the IP header, need {ICMP_HEADER_SIZE}", icmp_bytes.len()))
    })?;

    let header = IcmpHeader {
        icmp_type: echo.get_icmp_type().0,
        code: echo.get_icmp_code().0,
        checksum: echo.get_checksum(),
        identifier: echo.get_identifier(),
        sequence: echo.get_sequence_number(),
    };
    Ok(ParsedDatagram { ip_header_len, header, payload: &icmp_bytes[ICMP_HEADER_SIZE..] })
}
