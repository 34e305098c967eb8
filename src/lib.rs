#![warn(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

pub use details::checksum::checksum;
pub use details::icmp::v4::echo_codec::{ip_header_len, parse_reply, EchoCodec, IcmpHeader, ParsedDatagram, ParsedReply};
pub use details::icmp::v4::socket::raw_socket::RawSocket;
pub use details::icmp::v4::socket::IcmpSocket;
pub use ping_config::*;
pub use ping_error::{GenericError, PingError, PingResult};
pub use ping_output::*;
pub use ping_report::*;
pub use ping_session::*;
pub use utils::lookup_host_v4;

mod details;
mod ping_config;
mod ping_error;
mod ping_output;
mod ping_report;
mod ping_session;
mod utils;
