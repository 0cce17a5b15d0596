use crate::constants::{CHECKSUM_OFFSET, CHECKSUM_START};
use crate::report::Report;

/// XOR of the serialized report bytes in `[2, 88)`.
///
/// Skips status and transaction id, and stops before the checksum byte itself.
pub fn compute_checksum(report: &Report) -> u8 {
    report.to_bytes()[CHECKSUM_START..CHECKSUM_OFFSET]
        .iter()
        .fold(0, |crc, byte| crc ^ byte)
}
