/// RFC 1071 Internet checksum.
///
/// Words are summed as little-endian pairs, so the complemented sum comes out byte-swapped;
/// the final swap puts it back into network byte order. The returned value can be written
/// big-endian straight into a checksum field.
pub fn checksum(bytes: &[u8]) -> u16 {
    let mut sum: u32 = 0;

    let mut words = bytes.chunks_exact(2);
    for word in &mut words {
        sum = sum.wrapping_add(u32::from(word[0]) + u32::from(word[1]) * 256);
    }
    if let [last] = words.remainder() {
        sum = sum.wrapping_add(u32::from(*last));
    }

    while sum >> 16 != 0 {
        sum = (sum >> 16) + (sum & 0xFFFF);
    }

    #[allow(clippy::cast_possible_truncation)]
    let answer = !(sum as u16);
    answer.swap_bytes()
}
