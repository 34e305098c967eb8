pub(crate) mod echo_codec;
pub(crate) use echo_codec::EchoCodec;

mod sequence_number;
pub(crate) use sequence_number::SequenceNumber;

pub(crate) mod socket;
pub(crate) use socket::raw_socket::RawSocket;
pub(crate) use socket::IcmpSocket;
