//! Crate for talking to VEXnet peripherals over a serial link. Not affiliated with Innovation First Inc.
//!
//! A [`Connection`] owns a [`Transport`] and moves whole [`Packet`]s over it.
//! With the `serial` feature (on by default), [`serial::SerialTransport`]
//! provides a transport backed by a real serial port.

pub use vexnet_protocol as protocol;

use log::{error, trace};
use thiserror::Error;
use vexnet_protocol::{DecodeError, Decoder, Packet, Transport, TransportError, encode};

pub mod config;
#[cfg(feature = "serial")]
pub mod serial;

/// An open link to a VEXnet peripheral.
///
/// Each connection owns its transport, so any number of links can be open at
/// once.
#[derive(Debug)]
pub struct Connection<T: Transport> {
    transport: T,
    decoder: Decoder<'static>,
}

impl<T: Transport> Connection<T> {
    /// Wraps `transport`, decoding with the standard catalog and default timeouts.
    pub fn new(transport: T) -> Self {
        Self::with_decoder(transport, Decoder::new())
    }

    pub fn with_decoder(transport: T, decoder: Decoder<'static>) -> Self {
        Self { transport, decoder }
    }

    pub fn decoder(&self) -> &Decoder<'static> {
        &self.decoder
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    pub fn is_open(&self) -> bool {
        self.transport.is_open()
    }

    /// Sends a packet.
    pub fn send(&mut self, packet: &Packet) -> Result<(), ConnectionError> {
        self.ensure_open()?;

        let encoded = encode(packet);
        trace!("sent packet: {:x?}", encoded);

        self.transport.write_bytes(&encoded).map_err(|e| {
            error!("Failed to send packet {:#04x}: {}", packet.wire_type(), e);
            e
        })?;

        Ok(())
    }

    /// Receives a packet, blocking until a frame ends or the transport times out.
    pub fn recv(&mut self) -> Result<Packet, ConnectionError> {
        self.ensure_open()?;

        let packet = self.decoder.decode(&mut self.transport)?;
        trace!(
            "received packet {:#04x}: {:x?}",
            packet.wire_type(),
            packet.payload()
        );

        Ok(packet)
    }

    /// Receives a packet if any bytes are waiting, without blocking on a
    /// silent link.
    pub fn try_recv(&mut self) -> Result<Option<Packet>, ConnectionError> {
        self.ensure_open()?;

        if !self.transport.bytes_available() {
            return Ok(None);
        }

        self.recv().map(Some)
    }

    fn ensure_open(&self) -> Result<(), ConnectionError> {
        if self.transport.is_open() {
            Ok(())
        } else {
            error!("Attempted to use a connection that is not open");
            Err(ConnectionError::NotOpen)
        }
    }
}

#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("Connection is not open")]
    NotOpen,

    #[error("Packet decoding error: {0}")]
    DecodeError(#[from] DecodeError),

    #[error("Transport error: {0}")]
    TransportError(#[from] TransportError),
}
