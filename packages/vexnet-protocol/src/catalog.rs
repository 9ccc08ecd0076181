//! Known packet kinds and how each one is framed on the wire.

use core::fmt;

/// Packet kinds understood by VEXnet peripherals.
///
/// The set is closed; frames carrying any other type byte are still decoded,
/// but only as raw [`Packet`](crate::Packet)s whose [`kind`](crate::Packet::kind)
/// is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketKind {
    /// New contents for the LCD display.
    LcdUpdate,
    /// Reply from the LCD display.
    LcdUpdateResponse,

    /// A joystick asking its partner port for controller state.
    JoyStatusRequest,
    /// Controller state, see [`ControllerStatus`](crate::controller::ControllerStatus).
    JoyStatusRequestResponse,

    /// A joystick asking for the version of the partner device.
    JoyVersionRequest,
    /// Version of the partner device.
    JoyVersionRequestResponse,
}

impl PacketKind {
    /// Every known packet kind, in catalog order.
    pub const ALL: [PacketKind; 6] = [
        Self::LcdUpdate,
        Self::LcdUpdateResponse,
        Self::JoyStatusRequest,
        Self::JoyStatusRequestResponse,
        Self::JoyVersionRequest,
        Self::JoyVersionRequestResponse,
    ];

    /// Returns the standard framing of this kind.
    pub const fn framing(self) -> Framing {
        match self {
            Self::LcdUpdate => Framing::new(self, 0x1E, 17, true),
            Self::LcdUpdateResponse => Framing::new(self, 0x16, 1, true),
            Self::JoyStatusRequest => Framing::new(self, 0x3B, 0, true),
            Self::JoyStatusRequestResponse => Framing::new(self, 0x39, 9, true),
            Self::JoyVersionRequest => Framing::new(self, 0x3A, 0, false),
            Self::JoyVersionRequestResponse => Framing::new(self, 0x3B, 2, false),
        }
    }

    /// The byte sent right after the sync bytes.
    pub const fn wire_type(self) -> u8 {
        self.framing().wire_type
    }

    /// Number of payload bytes carried by this kind.
    pub const fn payload_size(self) -> u8 {
        self.framing().payload_size
    }

    /// Whether a checksum trailer follows the payload.
    pub const fn has_checksum(self) -> bool {
        self.framing().has_checksum
    }

    /// Protocol name of this kind, e.g. `LCD_UPDATE`.
    pub const fn name(self) -> &'static str {
        match self {
            Self::LcdUpdate => "LCD_UPDATE",
            Self::LcdUpdateResponse => "LCD_UPDATE_RESPONSE",
            Self::JoyStatusRequest => "JOY_STATUS_REQUEST",
            Self::JoyStatusRequestResponse => "JOY_STATUS_REQUEST_RESPONSE",
            Self::JoyVersionRequest => "JOY_VERSION_REQUEST",
            Self::JoyVersionRequestResponse => "JOY_VERSION_REQUEST_RESPONSE",
        }
    }
}

impl fmt::Display for PacketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a packet kind is laid out on the wire.
///
/// # Invariants
///
/// - A checksummed framing carries at most 254 payload bytes, so that its
///   length byte (`payload_size + 1`) fits in a `u8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Framing {
    kind: PacketKind,
    wire_type: u8,
    payload_size: u8,
    has_checksum: bool,
}

impl Framing {
    /// Creates a new [`Framing`].
    ///
    /// # Panics
    ///
    /// Panics if `has_checksum` is set and `payload_size` is 255, since the
    /// length byte could not represent the frame.
    pub const fn new(kind: PacketKind, wire_type: u8, payload_size: u8, has_checksum: bool) -> Self {
        assert!(
            !has_checksum || payload_size < u8::MAX,
            "Checksummed payloads are limited to 254 bytes"
        );

        Self {
            kind,
            wire_type,
            payload_size,
            has_checksum,
        }
    }

    pub const fn kind(&self) -> PacketKind {
        self.kind
    }

    pub const fn wire_type(&self) -> u8 {
        self.wire_type
    }

    pub const fn payload_size(&self) -> u8 {
        self.payload_size
    }

    pub const fn has_checksum(&self) -> bool {
        self.has_checksum
    }

    /// The length byte a frame of this kind carries, or `None` for kinds
    /// without a payload (those frames end right after the type byte).
    pub const fn length_byte(&self) -> Option<u8> {
        if self.payload_size == 0 {
            None
        } else if self.has_checksum {
            Some(self.payload_size + 1)
        } else {
            Some(self.payload_size)
        }
    }
}

const STANDARD_ENTRIES: [Framing; 6] = [
    PacketKind::LcdUpdate.framing(),
    PacketKind::LcdUpdateResponse.framing(),
    PacketKind::JoyStatusRequest.framing(),
    PacketKind::JoyStatusRequestResponse.framing(),
    PacketKind::JoyVersionRequest.framing(),
    PacketKind::JoyVersionRequestResponse.framing(),
];

/// Lookup table from wire type bytes to [`Framing`]s.
///
/// A type byte may be shared by several entries, as long as they differ in
/// payload size. The standard table does this for `0x3B`, which is both the
/// empty [`JoyStatusRequest`](PacketKind::JoyStatusRequest) and the two byte
/// [`JoyVersionRequestResponse`](PacketKind::JoyVersionRequestResponse); the
/// [`Decoder`](crate::Decoder) tells them apart by whether a matching length
/// byte follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Catalog<'a> {
    entries: &'a [Framing],
}

impl Catalog<'static> {
    /// The VEXnet packet catalog.
    pub const STANDARD: Self = Self::new(&STANDARD_ENTRIES);
}

impl Default for Catalog<'static> {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl<'a> Catalog<'a> {
    /// Creates a catalog from a custom table.
    pub const fn new(entries: &'a [Framing]) -> Self {
        Self { entries }
    }

    pub const fn entries(&self) -> &'a [Framing] {
        self.entries
    }

    /// Iterates over every entry using `wire_type`, in table order.
    pub fn candidates(&self, wire_type: u8) -> impl Iterator<Item = &'a Framing> + use<'a> {
        self.entries
            .iter()
            .filter(move |framing| framing.wire_type == wire_type)
    }

    /// Returns the first kind in table order that uses `wire_type`.
    ///
    /// For a shared type byte this is the kind a bare frame (no length byte)
    /// decodes to. Use [`Catalog::resolve`] when the payload size is known.
    pub fn kind_for(&self, wire_type: u8) -> Option<PacketKind> {
        self.candidates(wire_type).next().map(Framing::kind)
    }

    /// Returns the framing of `kind`, if this catalog knows about it.
    pub fn framing_for(&self, kind: PacketKind) -> Option<Framing> {
        self.entries
            .iter()
            .find(|framing| framing.kind == kind)
            .copied()
    }

    /// Returns the entry matching both `wire_type` and `payload_len` exactly.
    pub fn resolve(&self, wire_type: u8, payload_len: usize) -> Option<Framing> {
        self.candidates(wire_type)
            .find(|framing| framing.payload_size as usize == payload_len)
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::{Catalog, Framing, PacketKind};

    #[test]
    fn standard_table() {
        let expected = [
            (PacketKind::LcdUpdate, 0x1E, 17, true),
            (PacketKind::LcdUpdateResponse, 0x16, 1, true),
            (PacketKind::JoyStatusRequest, 0x3B, 0, true),
            (PacketKind::JoyStatusRequestResponse, 0x39, 9, true),
            (PacketKind::JoyVersionRequest, 0x3A, 0, false),
            (PacketKind::JoyVersionRequestResponse, 0x3B, 2, false),
        ];

        for (kind, wire_type, payload_size, has_checksum) in expected {
            let framing = Catalog::STANDARD.framing_for(kind).unwrap();

            assert_eq!(framing, kind.framing());
            assert_eq!(framing.wire_type(), wire_type);
            assert_eq!(framing.payload_size(), payload_size);
            assert_eq!(framing.has_checksum(), has_checksum);
        }
    }

    #[test]
    fn shared_type_byte() {
        // A bare 0x3B frame is a status request.
        assert_eq!(
            Catalog::STANDARD.kind_for(0x3B),
            Some(PacketKind::JoyStatusRequest)
        );
        assert_eq!(Catalog::STANDARD.candidates(0x3B).count(), 2);

        assert_eq!(
            Catalog::STANDARD.resolve(0x3B, 0).map(|f| f.kind()),
            Some(PacketKind::JoyStatusRequest)
        );
        assert_eq!(
            Catalog::STANDARD.resolve(0x3B, 2).map(|f| f.kind()),
            Some(PacketKind::JoyVersionRequestResponse)
        );
        assert_eq!(Catalog::STANDARD.resolve(0x3B, 1), None);
    }

    #[test]
    fn unknown_type() {
        assert_eq!(Catalog::STANDARD.kind_for(0x42), None);
        assert_eq!(Catalog::STANDARD.candidates(0x42).count(), 0);
    }

    #[test]
    fn length_byte() {
        assert_eq!(PacketKind::LcdUpdate.framing().length_byte(), Some(18));
        assert_eq!(
            PacketKind::JoyVersionRequestResponse.framing().length_byte(),
            Some(2)
        );
        assert_eq!(PacketKind::JoyStatusRequest.framing().length_byte(), None);
        assert_eq!(PacketKind::JoyVersionRequest.framing().length_byte(), None);
    }

    #[test]
    fn custom_catalog() {
        const ENTRIES: [Framing; 1] = [Framing::new(PacketKind::LcdUpdateResponse, 0x17, 3, false)];
        let catalog = Catalog::new(&ENTRIES);

        assert_eq!(catalog.kind_for(0x17), Some(PacketKind::LcdUpdateResponse));
        assert_eq!(catalog.kind_for(0x16), None);
        assert_eq!(catalog.framing_for(PacketKind::LcdUpdate), None);
    }
}
