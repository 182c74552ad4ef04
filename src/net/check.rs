/// Calculates the Internet Checksum from [RFC1071](https://tools.ietf.org/html/rfc1071).
///
/// Bytes are summed as big endian 16 bit words, with a trailing odd byte
/// padded with zero. Running the checksum over data which already contains a
/// valid checksum yields 0.
///
/// See [IPv4 header checksum](https://en.wikipedia.org/wiki/IPv4_header_checksum) for an example.
pub fn internet_checksum<I>(bytes: I) -> u16
where
    I: IntoIterator<Item = u8>,
{
    let mut acc = 0 as u32;
    let mut bytes = bytes.into_iter();

    loop {
        match (bytes.next(), bytes.next()) {
            (Some(hi), Some(lo)) => acc += (hi as u32) << 8 | lo as u32,
            (Some(hi), None) => {
                acc += (hi as u32) << 8;
                break;
            }
            _ => break,
        }

        // Fold early so long buffers can never overflow the accumulator.
        if acc > 0xFFFF {
            acc -= 0xFFFF;
        }
    }

    while acc > 0xFFFF {
        acc -= 0xFFFF;
    }

    !acc as u16
}
