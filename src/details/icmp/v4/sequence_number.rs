type SequenceNumberInnerType = u16;

/// Sequence number carried in echo requests.
///
/// Every attempt is a fresh exchange on its own socket, so requests always carry the start
/// value; replies are matched by identifier only.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub(crate) struct SequenceNumber(SequenceNumberInnerType);

impl SequenceNumber {
    pub(crate) fn start_value() -> SequenceNumber {
        // ICMPv4 sequence numbers start from 1.
        SequenceNumber(1)
    }
}

impl From<SequenceNumber> for SequenceNumberInnerType {
    fn from(value: SequenceNumber) -> Self {
        value.0
    }
}

impl From<SequenceNumberInnerType> for SequenceNumber {
    fn from(value: SequenceNumberInnerType) -> Self {
        SequenceNumber(value)
    }
}
