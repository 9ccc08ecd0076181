use alloc::vec::Vec;
use core::time::Duration;

use log::{debug, trace, warn};
use thiserror::Error;

use crate::{
    SYNC1, SYNC2,
    catalog::{Catalog, Framing},
    checksum::ByteSum,
    packet::Packet,
    transport::{Transport, TransportError},
};

/// How long the decoder waits for each byte of a frame by default.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// How long the decoder waits for a length byte that may not exist.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(10);

#[derive(Debug, Error)]
pub enum DecodeError {
    /// The stream is not aligned on a frame boundary. The offending byte has
    /// been consumed; decoding again resumes with the next one.
    #[error("Expected sync byte {expected:#04x}, found {found:#04x}.")]
    Resync { expected: u8, found: u8 },

    #[error("Packet type {wire_type:#04x} declared length {found}, expected {expected}.")]
    LengthMismatch { wire_type: u8, expected: u8, found: u8 },

    /// The payload and checksum of the frame summed to `sum` instead of zero.
    #[error("Checksum mismatch on packet type {wire_type:#04x}, frame summed to {sum:#04x}.")]
    ChecksumMismatch { wire_type: u8, sum: u8 },

    #[error("Transport failure: {0}")]
    TransportFailure(#[from] TransportError),
}

impl DecodeError {
    pub const fn kind(&self) -> DecodeErrorKind {
        match self {
            Self::Resync { .. } => DecodeErrorKind::Resync,
            Self::LengthMismatch { .. } => DecodeErrorKind::LengthMismatch,
            Self::ChecksumMismatch { .. } => DecodeErrorKind::ChecksumMismatch,
            Self::TransportFailure(_) => DecodeErrorKind::TransportFailure,
        }
    }
}

/// Classification of a [`DecodeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeErrorKind {
    Resync,
    LengthMismatch,
    ChecksumMismatch,
    TransportFailure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitSync1,
    AwaitSync2,
    ReadType,
    ReadLength {
        wire_type: u8,
    },
    ReadPayload {
        wire_type: u8,
        remaining: u8,
        has_checksum: bool,
    },
    ReadChecksum {
        wire_type: u8,
    },
}

/// Outcome of reading a frame's type byte.
enum Dispatch {
    /// The frame ends at the type byte.
    Complete(Packet),
    /// A length byte follows.
    Length,
}

/// Reads packets from a [`Transport`], one frame per call.
///
/// Every call to [`Decoder::decode`] starts looking for a new frame; a frame
/// interrupted by an error is abandoned, never resumed. The decoder never
/// retries on its own: after a [`DecodeError::Resync`] the caller decides
/// whether to decode again (which skips past the offending byte) or give up
/// on the link.
///
/// # Frame dispatch
///
/// After the type byte, the [`Catalog`] decides how the frame continues:
///
/// - A known kind without payload completes the frame immediately.
/// - A known kind with a payload must be followed by its exact length byte.
/// - A type byte shared by an empty kind and a sized kind (`0x3B` in the
///   standard catalog) is resolved by peeking at the next byte: if it is the
///   sized kind's length byte the frame continues, otherwise the empty kind
///   is produced and the peeked byte is left in the stream.
/// - An unknown type byte is followed by a length byte only if one arrives
///   within the probe timeout and it is not [`SYNC1`](crate::SYNC1). If none
///   does, a raw packet with an empty payload is produced and the peeked byte
///   is left in the stream. Otherwise the frame is assumed to be checksummed
///   and carry `length - 1` payload bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoder<'a> {
    catalog: Catalog<'a>,
    read_timeout: Duration,
    probe_timeout: Duration,
}

impl Default for Decoder<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder<'static> {
    /// Creates a decoder for the standard catalog.
    pub const fn new() -> Self {
        Self {
            catalog: Catalog::STANDARD,
            read_timeout: DEFAULT_READ_TIMEOUT,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }
}

impl<'a> Decoder<'a> {
    pub fn with_catalog<'b>(self, catalog: Catalog<'b>) -> Decoder<'b> {
        Decoder {
            catalog,
            read_timeout: self.read_timeout,
            probe_timeout: self.probe_timeout,
        }
    }

    /// Sets how long to wait for each byte of a frame.
    pub const fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Sets how long to wait for a length byte after a type byte that may
    /// end the frame.
    pub const fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub const fn catalog(&self) -> Catalog<'a> {
        self.catalog
    }

    pub const fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    pub const fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    /// Reads one frame from `transport`.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::Resync`] if the next bytes are not the sync sequence.
    /// - [`DecodeError::LengthMismatch`] if the length byte disagrees with the catalog.
    /// - [`DecodeError::ChecksumMismatch`] if the frame fails its integrity check.
    /// - [`DecodeError::TransportFailure`] if a read fails or times out mid-frame.
    pub fn decode<T: Transport + ?Sized>(&self, transport: &mut T) -> Result<Packet, DecodeError> {
        let mut state = State::AwaitSync1;
        let mut payload = Vec::new();
        let mut sum = ByteSum::default();

        loop {
            trace!("decoder state: {:?}", state);

            state = match state {
                State::AwaitSync1 => {
                    self.expect_sync(transport, SYNC1)?;
                    State::AwaitSync2
                }
                State::AwaitSync2 => {
                    self.expect_sync(transport, SYNC2)?;
                    State::ReadType
                }
                State::ReadType => {
                    let wire_type = self.read(transport)?;

                    match self.dispatch(transport, wire_type)? {
                        Dispatch::Complete(packet) => return Ok(packet),
                        Dispatch::Length => State::ReadLength { wire_type },
                    }
                }
                State::ReadLength { wire_type } => {
                    let length = self.read(transport)?;
                    let (size, has_checksum) = self.payload_layout(wire_type, length)?;
                    payload.reserve_exact(size as usize);

                    State::ReadPayload {
                        wire_type,
                        remaining: size,
                        has_checksum,
                    }
                }
                State::ReadPayload {
                    wire_type,
                    remaining: 0,
                    has_checksum,
                } => {
                    if !has_checksum {
                        return Ok(Packet::from_parts(wire_type, payload, false));
                    }

                    State::ReadChecksum { wire_type }
                }
                State::ReadPayload {
                    wire_type,
                    remaining,
                    has_checksum,
                } => {
                    let byte = self.read(transport)?;
                    sum.push(byte);
                    payload.push(byte);

                    State::ReadPayload {
                        wire_type,
                        remaining: remaining - 1,
                        has_checksum,
                    }
                }
                State::ReadChecksum { wire_type } => {
                    sum.push(self.read(transport)?);

                    if !sum.is_zero() {
                        warn!(
                            "Dropping packet {:#04x} with bad checksum: {:x?}",
                            wire_type, payload
                        );
                        return Err(DecodeError::ChecksumMismatch {
                            wire_type,
                            sum: sum.value(),
                        });
                    }

                    return Ok(Packet::from_parts(wire_type, payload, true));
                }
            };
        }
    }

    fn read<T: Transport + ?Sized>(&self, transport: &mut T) -> Result<u8, DecodeError> {
        transport.read_byte(self.read_timeout).map_err(|e| {
            debug!("Read failed mid-frame: {}", e);
            DecodeError::TransportFailure(e)
        })
    }

    fn expect_sync<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
        expected: u8,
    ) -> Result<(), DecodeError> {
        let found = self.read(transport)?;

        if found != expected {
            debug!(
                "Expected sync byte {:#04x}, found {:#04x}. Stream needs resync.",
                expected, found
            );
            return Err(DecodeError::Resync { expected, found });
        }

        Ok(())
    }

    /// Decides whether the frame ends at its type byte.
    fn dispatch<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
        wire_type: u8,
    ) -> Result<Dispatch, DecodeError> {
        let empty = self
            .catalog
            .candidates(wire_type)
            .find(|framing| framing.payload_size() == 0);
        let mut sized = self
            .catalog
            .candidates(wire_type)
            .filter(|framing| framing.payload_size() > 0)
            .peekable();

        match (empty, sized.peek().is_some()) {
            (Some(framing), false) => Ok(Dispatch::Complete(empty_packet(framing))),
            (None, true) => Ok(Dispatch::Length),
            (Some(framing), true) => {
                let next = self.probe(transport)?;

                if next.is_some_and(|byte| sized.any(|f| f.length_byte() == Some(byte))) {
                    Ok(Dispatch::Length)
                } else {
                    Ok(Dispatch::Complete(empty_packet(framing)))
                }
            }
            (None, false) => {
                // SYNC1 starts the next frame, so it is never taken as a length.
                match self.probe(transport)? {
                    Some(byte) if byte != SYNC1 => Ok(Dispatch::Length),
                    _ => {
                        debug!(
                            "Unknown packet type {:#04x} with no length byte, assuming empty payload",
                            wire_type
                        );
                        Ok(Dispatch::Complete(Packet::from_parts(
                            wire_type,
                            Vec::new(),
                            true,
                        )))
                    }
                }
            }
        }
    }

    fn probe<T: Transport + ?Sized>(&self, transport: &mut T) -> Result<Option<u8>, DecodeError> {
        let next = transport.peek_byte(self.probe_timeout)?;
        trace!("probed next byte: {:x?}", next);
        Ok(next)
    }

    /// Validates a length byte, returning the payload size and whether a
    /// checksum trailer follows.
    fn payload_layout(&self, wire_type: u8, length: u8) -> Result<(u8, bool), DecodeError> {
        let mut sized = self
            .catalog
            .candidates(wire_type)
            .filter(|framing| framing.payload_size() > 0)
            .peekable();

        let Some(first) = sized.peek().copied() else {
            // Unknown type. Assume a checksum, which needs a length of at least 1.
            return match length {
                0 => Err(length_mismatch(wire_type, 1, length)),
                length => Ok((length - 1, true)),
            };
        };

        match sized.find(|framing| framing.length_byte() == Some(length)) {
            Some(framing) => Ok((framing.payload_size(), framing.has_checksum())),
            None => {
                let expected = first.length_byte().unwrap_or_default();
                Err(length_mismatch(wire_type, expected, length))
            }
        }
    }
}

fn empty_packet(framing: &Framing) -> Packet {
    Packet::from_parts(framing.wire_type(), Vec::new(), framing.has_checksum())
}

fn length_mismatch(wire_type: u8, expected: u8, found: u8) -> DecodeError {
    warn!(
        "Packet {:#04x} has length {}, expected {}",
        wire_type, found, expected
    );
    DecodeError::LengthMismatch {
        wire_type,
        expected,
        found,
    }
}

#[cfg(test)]
mod tests {
    use alloc::{vec, vec::Vec};

    use super::{DecodeError, DecodeErrorKind, Decoder};
    use crate::{
        catalog::{Catalog, Framing, PacketKind},
        encode::encode,
        packet::Packet,
        transport::{MemoryTransport, TransportError},
    };

    /// Deterministic xorshift bytes.
    fn noise(seed: &mut u32, len: usize) -> Vec<u8> {
        (0..len)
            .map(|_| {
                *seed ^= *seed << 13;
                *seed ^= *seed >> 17;
                *seed ^= *seed << 5;
                *seed as u8
            })
            .collect()
    }

    fn decode(bytes: &[u8]) -> Result<Packet, DecodeError> {
        Decoder::new().decode(&mut MemoryTransport::with_inbound(bytes))
    }

    fn lcd_update_frame() -> Vec<u8> {
        let payload: Vec<u8> = (0x30..0x41).collect();
        encode(&Packet::new(PacketKind::LcdUpdate, payload).unwrap())
    }

    #[test]
    fn round_trip() {
        let mut seed = 0xDEAD_BEEF;

        for kind in PacketKind::ALL {
            for _ in 0..32 {
                let payload = noise(&mut seed, kind.payload_size() as usize);
                let packet = Packet::new(kind, payload).unwrap();

                let mut transport = MemoryTransport::with_inbound(encode(&packet));
                let decoded = Decoder::new().decode(&mut transport).unwrap();

                assert_eq!(decoded.kind(), Some(kind));
                assert_eq!(decoded, packet);
                assert_eq!(transport.pending(), 0);
            }
        }
    }

    #[test]
    fn resync_on_corrupt_prefix() {
        let mut bytes = vec![0x00];
        bytes.extend(lcd_update_frame());
        assert_eq!(&bytes[1..5], &[0xAA, 0x55, 0x1E, 0x12]);

        let decoder = Decoder::new();
        let mut transport = MemoryTransport::with_inbound(&bytes);

        let error = decoder.decode(&mut transport).unwrap_err();
        assert!(matches!(
            error,
            DecodeError::Resync {
                expected: 0xAA,
                found: 0x00
            }
        ));

        // Only the bad byte was discarded.
        let packet = decoder.decode(&mut transport).unwrap();
        assert_eq!(packet.kind(), Some(PacketKind::LcdUpdate));
        assert_eq!(transport.pending(), 0);
    }

    #[test]
    fn bad_sync_bytes() {
        let mut frame = lcd_update_frame();
        frame[0] = 0x12;
        assert!(matches!(
            decode(&frame),
            Err(DecodeError::Resync {
                expected: 0xAA,
                found: 0x12
            })
        ));

        let mut frame = lcd_update_frame();
        frame[1] = 0x56;
        assert!(matches!(
            decode(&frame),
            Err(DecodeError::Resync {
                expected: 0x55,
                found: 0x56
            })
        ));
    }

    #[test]
    fn length_mismatch() {
        for length in (0..=u8::MAX).filter(|&length| length != 18) {
            let mut frame = lcd_update_frame();
            frame[3] = length;

            match decode(&frame) {
                Err(DecodeError::LengthMismatch {
                    wire_type: 0x1E,
                    expected: 18,
                    found,
                }) => assert_eq!(found, length),
                other => panic!("length {length} decoded as {other:?}"),
            }
        }
    }

    #[test]
    fn checksum_mismatch() {
        let frame = encode(&Packet::new(PacketKind::LcdUpdateResponse, vec![0x5A]).unwrap());

        for bit in 0..8 {
            let mut corrupt = frame.clone();
            corrupt[4] ^= 1 << bit;

            let error = decode(&corrupt).unwrap_err();
            assert_eq!(error.kind(), DecodeErrorKind::ChecksumMismatch);
        }

        let mut corrupt = frame.clone();
        corrupt[5] = corrupt[5].wrapping_add(1);
        assert!(matches!(
            decode(&corrupt),
            Err(DecodeError::ChecksumMismatch {
                wire_type: 0x16,
                sum: 0x01
            })
        ));
    }

    #[test]
    fn empty_kinds_read_nothing_more() {
        let mut transport = MemoryTransport::with_inbound([0xAA, 0x55, 0x3A, 0xAA, 0x55]);
        let packet = Decoder::new().decode(&mut transport).unwrap();

        assert_eq!(packet.kind(), Some(PacketKind::JoyVersionRequest));
        assert!(packet.payload().is_empty());
        assert_eq!(transport.reads(), 3);
        assert_eq!(transport.peeks(), 0);
        assert_eq!(transport.pending(), 2);
    }

    #[test]
    fn shared_type_byte_without_length() {
        // A status request followed by the next frame.
        let mut transport = MemoryTransport::with_inbound([0xAA, 0x55, 0x3B, 0xAA, 0x55, 0x3A]);
        let decoder = Decoder::new();

        let packet = decoder.decode(&mut transport).unwrap();
        assert_eq!(packet.kind(), Some(PacketKind::JoyStatusRequest));
        assert_eq!(transport.reads(), 3);

        let packet = decoder.decode(&mut transport).unwrap();
        assert_eq!(packet.kind(), Some(PacketKind::JoyVersionRequest));

        // And one at the end of the stream.
        let packet = decode(&[0xAA, 0x55, 0x3B]).unwrap();
        assert_eq!(packet.kind(), Some(PacketKind::JoyStatusRequest));
    }

    #[test]
    fn shared_type_byte_with_length() {
        let packet = decode(&[0xAA, 0x55, 0x3B, 0x02, 0x01, 0x07]).unwrap();

        assert_eq!(packet.kind(), Some(PacketKind::JoyVersionRequestResponse));
        assert_eq!(packet.payload(), &[0x01, 0x07]);
        assert!(!packet.has_checksum());
    }

    #[test]
    fn unknown_type_without_length() {
        let mut transport = MemoryTransport::with_inbound([0xAA, 0x55, 0x42]);
        let packet = Decoder::new().decode(&mut transport).unwrap();

        assert_eq!(packet.wire_type(), 0x42);
        assert_eq!(packet.kind(), None);
        assert!(packet.payload().is_empty());
        assert_eq!(transport.peeks(), 1);
    }

    #[test]
    fn unknown_type_followed_by_frame() {
        let mut transport = MemoryTransport::with_inbound([0xAA, 0x55, 0x42, 0xAA, 0x55, 0x3A]);
        let decoder = Decoder::new();

        let packet = decoder.decode(&mut transport).unwrap();
        assert_eq!(packet.wire_type(), 0x42);
        assert!(packet.payload().is_empty());
        assert_eq!(transport.pending(), 3);

        let packet = decoder.decode(&mut transport).unwrap();
        assert_eq!(packet.kind(), Some(PacketKind::JoyVersionRequest));
        assert_eq!(transport.pending(), 0);
    }

    #[test]
    fn unknown_type_with_length() {
        let packet = Packet::raw(0x42, vec![0x01, 0x02, 0x03], true).unwrap();
        assert_eq!(decode(&encode(&packet)).unwrap(), packet);

        // A length byte of zero leaves no room for the checksum.
        assert!(matches!(
            decode(&[0xAA, 0x55, 0x42, 0x00]),
            Err(DecodeError::LengthMismatch {
                wire_type: 0x42,
                expected: 1,
                found: 0
            })
        ));

        // Length 1 is a checksum with nothing to check.
        let packet = decode(&[0xAA, 0x55, 0x42, 0x01, 0x00]).unwrap();
        assert!(packet.payload().is_empty());
    }

    #[test]
    fn truncated_frame() {
        let frame = lcd_update_frame();

        for len in 0..frame.len() {
            let error = decode(&frame[..len]).unwrap_err();
            assert!(
                matches!(error, DecodeError::TransportFailure(TransportError::Timeout)),
                "prefix of {len} bytes decoded as {error:?}"
            );
        }
    }

    #[test]
    fn closed_transport() {
        let mut transport = MemoryTransport::with_inbound(lcd_update_frame());
        transport.close();

        let error = Decoder::new().decode(&mut transport).unwrap_err();
        assert!(matches!(
            error,
            DecodeError::TransportFailure(TransportError::Closed)
        ));
    }

    #[test]
    fn custom_catalog() {
        const ENTRIES: [Framing; 1] = [Framing::new(PacketKind::LcdUpdateResponse, 0x16, 3, false)];
        let decoder = Decoder::new().with_catalog(Catalog::new(&ENTRIES));

        let packet = decoder
            .decode(&mut MemoryTransport::with_inbound([
                0xAA, 0x55, 0x16, 0x03, 0x01, 0x02, 0x03,
            ]))
            .unwrap();
        assert_eq!(packet.payload(), &[0x01, 0x02, 0x03]);
        assert!(!packet.has_checksum());

        // The standard framing of 0x16 no longer applies.
        let standard = encode(&Packet::new(PacketKind::LcdUpdateResponse, vec![0x01]).unwrap());
        assert_eq!(
            decoder
                .decode(&mut MemoryTransport::with_inbound(standard))
                .unwrap_err()
                .kind(),
            DecodeErrorKind::LengthMismatch
        );
    }
}
