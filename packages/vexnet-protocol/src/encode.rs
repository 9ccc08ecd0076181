use alloc::{vec, vec::Vec};

use crate::{HEADER, checksum::checksum, packet::Packet};

/// A type that can be encoded into a sequence of bytes.
pub trait Encode {
    /// Returns the number of bytes this value will take when encoded.
    fn size(&self) -> usize;

    /// Encodes this instance into the provided byte slice.
    ///
    /// `data` must be at least [`Encode::size`] bytes long.
    fn encode(&self, data: &mut [u8]);
}

/// Encodes `value` into a freshly allocated buffer.
pub fn encode<E: Encode + ?Sized>(value: &E) -> Vec<u8> {
    let mut encoded = vec![0; value.size()];
    value.encode(&mut encoded);
    encoded
}

impl Encode for [u8] {
    fn size(&self) -> usize {
        self.len()
    }

    fn encode(&self, data: &mut [u8]) {
        data[..self.len()].copy_from_slice(self);
    }
}

impl<const N: usize> Encode for [u8; N] {
    fn size(&self) -> usize {
        N
    }

    fn encode(&self, data: &mut [u8]) {
        data[..N].copy_from_slice(self);
    }
}

/// Frames a packet.
///
/// | Field      | Size | Description |
/// |------------|------|-------------|
/// | `header`   | 2    | Must be [`HEADER`]. |
/// | `type`     | 1    | [`Packet::wire_type`]. |
/// | `length`   | 0–1  | [`Packet::length_byte`]. |
/// | `payload`  | n    | [`Packet::payload`]. |
/// | `checksum` | 0–1  | Present when the payload is non-empty and the checksum is enabled. |
impl Encode for Packet {
    fn size(&self) -> usize {
        let body = match self.length_byte() {
            Some(_) => 1 + self.payload().len() + usize::from(self.has_checksum()),
            None => 0,
        };

        HEADER.len() + 1 + body
    }

    fn encode(&self, data: &mut [u8]) {
        HEADER.encode(data);
        data[2] = self.wire_type();

        // Empty payloads are never length-prefixed or checksummed
        let Some(length) = self.length_byte() else {
            return;
        };
        data[3] = length;

        let payload = self.payload();
        payload.encode(&mut data[4..]);

        if self.has_checksum() {
            data[4 + payload.len()] = checksum(payload);
        }
    }
}
