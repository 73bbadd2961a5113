use crate::ConvertError;

/// Converts a retry counter to an 8-byte array in big-endian byte order.
///
/// Big-endian keeps stored counters ordered under sled's lexicographic
/// key/value comparisons.
pub const fn counter_to_bytes(num: u64) -> [u8; 8] {
    num.to_be_bytes()
}

/// Reads a retry counter back from its stored 8-byte big-endian form.
pub fn counter_from_bytes<B: AsRef<[u8]>>(bytes: B) -> Result<u64, ConvertError> {
    let bytes = bytes.as_ref();
    let expected_len = 8;

    if bytes.len() != expected_len {
        return Err(ConvertError::InvalidLength(bytes.len()));
    }
    let array: [u8; 8] = bytes.try_into().expect("Guaranteed safe after length check");
    Ok(u64::from_be_bytes(array))
}
