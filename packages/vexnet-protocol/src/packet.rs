use alloc::vec::Vec;
use core::fmt;

use thiserror::Error;

use crate::catalog::{Catalog, PacketKind};

/// A single VEXnet packet.
///
/// The payload is owned by the packet; cloning a packet copies its bytes.
///
/// # Invariants
///
/// - `payload.len() <= 255`, and `<= 254` when the checksum is enabled, so the
///   frame's length byte can describe it.
/// - Packets built from a [`PacketKind`] carry exactly
///   [`PacketKind::payload_size`] bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Packet {
    wire_type: u8,
    payload: Vec<u8>,
    has_checksum: bool,
}

impl Packet {
    /// Creates a packet of a known kind.
    ///
    /// # Errors
    ///
    /// Returns [`PacketSizeError::WrongSize`] if `payload` is not exactly as long
    /// as the kind requires.
    pub fn new(kind: PacketKind, payload: impl Into<Vec<u8>>) -> Result<Self, PacketSizeError> {
        let payload = payload.into();
        let framing = kind.framing();

        if payload.len() != framing.payload_size() as usize {
            return Err(PacketSizeError::WrongSize {
                kind,
                expected: framing.payload_size(),
                found: payload.len(),
            });
        }

        Ok(Self::from_parts(
            framing.wire_type(),
            payload,
            framing.has_checksum(),
        ))
    }

    /// Creates a packet of a known kind with a zero-filled payload.
    pub fn zeroed(kind: PacketKind) -> Self {
        let framing = kind.framing();

        Self::from_parts(
            framing.wire_type(),
            alloc::vec![0; framing.payload_size() as usize],
            framing.has_checksum(),
        )
    }

    /// Creates a packet with an arbitrary type byte.
    ///
    /// # Errors
    ///
    /// Returns [`PacketSizeError::TooLarge`] if the payload does not fit in a
    /// single frame.
    pub fn raw(
        wire_type: u8,
        payload: impl Into<Vec<u8>>,
        has_checksum: bool,
    ) -> Result<Self, PacketSizeError> {
        let payload = payload.into();
        let max_size = Self::max_payload_size(has_checksum);

        if payload.len() > max_size {
            return Err(PacketSizeError::TooLarge {
                size: payload.len(),
                max_size,
            });
        }

        Ok(Self::from_parts(wire_type, payload, has_checksum))
    }

    /// Largest payload a frame can carry.
    pub const fn max_payload_size(has_checksum: bool) -> usize {
        if has_checksum {
            u8::MAX as usize - 1
        } else {
            u8::MAX as usize
        }
    }

    /// Creates a packet from parts already known to satisfy the size invariants.
    pub(crate) fn from_parts(wire_type: u8, payload: Vec<u8>, has_checksum: bool) -> Self {
        debug_assert!(payload.len() <= Self::max_payload_size(has_checksum));

        Self {
            wire_type,
            payload,
            has_checksum,
        }
    }

    pub fn wire_type(&self) -> u8 {
        self.wire_type
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    /// Number of payload bytes.
    pub fn size(&self) -> u8 {
        self.payload.len() as u8
    }

    pub fn has_checksum(&self) -> bool {
        self.has_checksum
    }

    /// The length byte this packet is framed with, or `None` if the payload is
    /// empty and the frame ends after the type byte.
    pub fn length_byte(&self) -> Option<u8> {
        match self.size() {
            0 => None,
            size if self.has_checksum => Some(size + 1),
            size => Some(size),
        }
    }

    /// Looks up the kind matching this packet's type byte, size and checksum
    /// setting in [`Catalog::STANDARD`].
    ///
    /// Returns `None` for custom and unrecognized packets. Packets decoded with
    /// a custom catalog should be looked up with [`Packet::kind_in`].
    pub fn kind(&self) -> Option<PacketKind> {
        self.kind_in(&Catalog::STANDARD)
    }

    /// Looks up the kind matching this packet in `catalog`.
    pub fn kind_in(&self, catalog: &Catalog<'_>) -> Option<PacketKind> {
        let framing = catalog.resolve(self.wire_type, self.payload.len())?;

        // The checksum setting only shows on the wire when there is a payload.
        if self.payload.is_empty() || framing.has_checksum() == self.has_checksum {
            Some(framing.kind())
        } else {
            None
        }
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            Some(kind) => writeln!(f, "Packet: {kind}")?,
            None => writeln!(f, "Packet: UNKNOWN_PACKET_TYPE")?,
        }
        writeln!(f, "Type: 0x{:02X}", self.wire_type)?;
        writeln!(f, "Size: {}", self.size())?;
        write!(f, "Data:")?;

        if self.payload.is_empty() {
            return write!(f, " None");
        }

        for byte in &self.payload {
            write!(f, " {byte:02X}")?;
        }

        Ok(())
    }
}

/// Returned when a payload cannot be framed as requested.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PacketSizeError {
    #[error("{kind} packets carry {expected} payload bytes, got {found}.")]
    WrongSize {
        kind: PacketKind,
        expected: u8,
        found: usize,
    },

    #[error("Payload of {size} bytes exceeds the {max_size} byte frame limit.")]
    TooLarge { size: usize, max_size: usize },
}
