//! Implementation of the VEXnet serial packet protocol in Rust.
//!
//! VEXnet peripherals (the LCD display and the joystick partner port) exchange
//! short, fixed-purpose packets over an asynchronous serial link. Every frame
//! looks like this:
//!
//! | Field      | Size | Description |
//! |------------|------|-------------|
//! | `header`   | 2    | Must be [`HEADER`] (`0xAA 0x55`). |
//! | `type`     | 1    | Wire type of the packet, see [`PacketKind`]. |
//! | `length`   | 0–1  | Payload size, plus one when a checksum follows. Omitted for empty payloads. |
//! | `payload`  | n    | Packet payload. |
//! | `checksum` | 0–1  | Two's complement of the payload byte sum, see [`checksum()`]. |
//!
//! Packets are serialized with [`encode()`] and read back from a [`Transport`]
//! by a [`Decoder`].

#![no_std]

extern crate alloc;

pub mod catalog;
pub mod controller;
pub mod transport;

mod checksum;
mod decode;
mod encode;
mod packet;

pub use catalog::{Catalog, Framing, PacketKind};
pub use checksum::checksum;
pub use decode::{
    DEFAULT_PROBE_TIMEOUT, DEFAULT_READ_TIMEOUT, DecodeError, DecodeErrorKind, Decoder,
};
pub use encode::{Encode, encode};
pub use packet::{Packet, PacketSizeError};
pub use transport::{MemoryTransport, Transport, TransportError};

/// First sync byte of every frame.
pub const SYNC1: u8 = 0xAA;

/// Second sync byte of every frame.
pub const SYNC2: u8 = 0x55;

/// Starting byte sequence for all packets, in both directions.
pub const HEADER: [u8; 2] = [SYNC1, SYNC2];
