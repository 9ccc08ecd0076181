//! Controller state, as reported to a joystick through its partner port.
//!
//! A [`JoyStatusRequestResponse`](PacketKind::JoyStatusRequestResponse)
//! carries nine bytes:
//!
//! | Byte  | Content |
//! |-------|---------|
//! | 0–3   | Joystick axes 1 through 4. |
//! | 4     | [`Buttons56`] |
//! | 5     | [`Buttons78`] |
//! | 6–8   | Accelerometer Y, X and Z. |

use bitflags::bitflags;
use thiserror::Error;

use crate::{catalog::PacketKind, encode::Encode, packet::Packet};

bitflags! {
    /// Shoulder buttons, packed into byte 4.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Buttons56: u8 {
        const BUTTON_5D = 1 << 0;
        const BUTTON_5U = 1 << 1;
        const BUTTON_6D = 1 << 2;
        const BUTTON_6U = 1 << 3;
    }
}

bitflags! {
    /// Front button pads, packed into byte 5.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Buttons78: u8 {
        const BUTTON_7D = 1 << 0;
        const BUTTON_7L = 1 << 1;
        const BUTTON_7U = 1 << 2;
        const BUTTON_7R = 1 << 3;
        const BUTTON_8D = 1 << 4;
        const BUTTON_8L = 1 << 5;
        const BUTTON_8U = 1 << 6;
        const BUTTON_8R = 1 << 7;
    }
}

/// Resting value of an axis.
pub const AXIS_CENTER: u8 = 0x7F;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControllerStatus {
    /// Joystick axes 1 through 4.
    pub joysticks: [u8; 4],
    pub buttons_56: Buttons56,
    pub buttons_78: Buttons78,
    pub accel_y: u8,
    pub accel_x: u8,
    pub accel_z: u8,
}

impl ControllerStatus {
    pub const PAYLOAD_SIZE: usize = PacketKind::JoyStatusRequestResponse.payload_size() as usize;

    /// Centered sticks, level accelerometer, nothing pressed.
    pub const NEUTRAL: Self = Self {
        joysticks: [AXIS_CENTER; 4],
        buttons_56: Buttons56::empty(),
        buttons_78: Buttons78::empty(),
        accel_y: AXIS_CENTER,
        accel_x: AXIS_CENTER,
        accel_z: AXIS_CENTER,
    };

    /// Builds a status from raw inputs.
    ///
    /// `buttons` is ordered 5D, 5U, 6D, 6U, 7D, 7L, 7U, 7R, 8D, 8L, 8U, 8R and
    /// `accel` is ordered Y, X, Z.
    pub fn from_inputs(joysticks: [u8; 4], buttons: [bool; 12], accel: [u8; 3]) -> Self {
        let [b5d, b5u, b6d, b6u, b7d, b7l, b7u, b7r, b8d, b8l, b8u, b8r] = buttons;

        let mut buttons_56 = Buttons56::empty();
        buttons_56.set(Buttons56::BUTTON_5D, b5d);
        buttons_56.set(Buttons56::BUTTON_5U, b5u);
        buttons_56.set(Buttons56::BUTTON_6D, b6d);
        buttons_56.set(Buttons56::BUTTON_6U, b6u);

        let mut buttons_78 = Buttons78::empty();
        buttons_78.set(Buttons78::BUTTON_7D, b7d);
        buttons_78.set(Buttons78::BUTTON_7L, b7l);
        buttons_78.set(Buttons78::BUTTON_7U, b7u);
        buttons_78.set(Buttons78::BUTTON_7R, b7r);
        buttons_78.set(Buttons78::BUTTON_8D, b8d);
        buttons_78.set(Buttons78::BUTTON_8L, b8l);
        buttons_78.set(Buttons78::BUTTON_8U, b8u);
        buttons_78.set(Buttons78::BUTTON_8R, b8r);

        let [accel_y, accel_x, accel_z] = accel;

        Self {
            joysticks,
            buttons_56,
            buttons_78,
            accel_y,
            accel_x,
            accel_z,
        }
    }

    pub fn payload(&self) -> [u8; Self::PAYLOAD_SIZE] {
        let mut payload = [0; Self::PAYLOAD_SIZE];
        self.encode(&mut payload);
        payload
    }

    /// Wraps this status in a [`JoyStatusRequestResponse`](PacketKind::JoyStatusRequestResponse) packet.
    pub fn to_packet(&self) -> Packet {
        let framing = PacketKind::JoyStatusRequestResponse.framing();
        Packet::from_parts(
            framing.wire_type(),
            self.payload().to_vec(),
            framing.has_checksum(),
        )
    }
}

impl Default for ControllerStatus {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

impl Encode for ControllerStatus {
    fn size(&self) -> usize {
        Self::PAYLOAD_SIZE
    }

    fn encode(&self, data: &mut [u8]) {
        self.joysticks.encode(data);
        data[4] = self.buttons_56.bits();
        data[5] = self.buttons_78.bits();
        data[6] = self.accel_y;
        data[7] = self.accel_x;
        data[8] = self.accel_z;
    }
}

impl From<ControllerStatus> for Packet {
    fn from(status: ControllerStatus) -> Self {
        status.to_packet()
    }
}

impl TryFrom<&Packet> for ControllerStatus {
    type Error = NotControllerStatus;

    fn try_from(packet: &Packet) -> Result<Self, Self::Error> {
        if packet.kind() != Some(PacketKind::JoyStatusRequestResponse) {
            return Err(NotControllerStatus {
                wire_type: packet.wire_type(),
                size: packet.size(),
            });
        }

        let data = packet.payload();
        Ok(Self {
            joysticks: [data[0], data[1], data[2], data[3]],
            buttons_56: Buttons56::from_bits_retain(data[4]),
            buttons_78: Buttons78::from_bits_retain(data[5]),
            accel_y: data[6],
            accel_x: data[7],
            accel_z: data[8],
        })
    }
}

/// Returned when parsing a [`ControllerStatus`] out of another kind of packet.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("Packet {wire_type:#04x} with {size} payload bytes is not a controller status.")]
pub struct NotControllerStatus {
    pub wire_type: u8,
    pub size: u8,
}

/// Packs raw controller inputs into a
/// [`JoyStatusRequestResponse`](PacketKind::JoyStatusRequestResponse) packet.
///
/// See [`ControllerStatus::from_inputs`] for the order of `buttons` and `accel`.
pub fn compile_controller_packet(joysticks: [u8; 4], buttons: [bool; 12], accel: [u8; 3]) -> Packet {
    ControllerStatus::from_inputs(joysticks, buttons, accel).to_packet()
}
