pub(crate) use echo_exchange::EchoExchange;

pub(crate) mod checksum;
mod echo_exchange;
pub(crate) mod icmp;
