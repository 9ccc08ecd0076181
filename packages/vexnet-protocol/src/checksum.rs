//! Additive payload checksum.

/// Computes the checksum byte sent after `payload`.
///
/// This is the two's complement of the payload's byte sum, so the sum of every
/// payload byte and the checksum is zero (mod 256). It is a plain integrity
/// check and offers no protection against deliberate tampering.
pub fn checksum(payload: &[u8]) -> u8 {
    payload
        .iter()
        .fold(0u8, |checksum, &byte| checksum.wrapping_sub(byte))
}

/// Running sum of received bytes.
///
/// An intact frame sums to zero once its checksum byte has been pushed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ByteSum(u8);

impl ByteSum {
    pub(crate) fn push(&mut self, byte: u8) {
        self.0 = self.0.wrapping_add(byte);
    }

    pub(crate) fn value(self) -> u8 {
        self.0
    }

    pub(crate) fn is_zero(self) -> bool {
        self.0 == 0
    }
}
