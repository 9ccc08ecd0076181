//! The byte link packets travel over.

use alloc::{boxed::Box, collections::VecDeque, vec::Vec};
use core::time::Duration;

use thiserror::Error;

/// A blocking, byte-oriented link to a VEXnet peripheral.
///
/// Implementors own any lookahead state: a byte returned by
/// [`peek_byte`](Transport::peek_byte) must be returned again by the next
/// [`read_byte`](Transport::read_byte).
pub trait Transport {
    /// Reads and consumes one byte, waiting at most `timeout` for it.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Timeout`] if no byte arrives in time.
    fn read_byte(&mut self, timeout: Duration) -> Result<u8, TransportError>;

    /// Returns the next byte without consuming it, waiting at most `timeout`.
    ///
    /// `Ok(None)` means no byte arrived in time; this is not an error.
    fn peek_byte(&mut self, timeout: Duration) -> Result<Option<u8>, TransportError>;

    /// Writes every byte of `bytes` to the link.
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Whether a byte can be read without waiting.
    fn bytes_available(&self) -> bool;

    fn is_open(&self) -> bool;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn read_byte(&mut self, timeout: Duration) -> Result<u8, TransportError> {
        (**self).read_byte(timeout)
    }

    fn peek_byte(&mut self, timeout: Duration) -> Result<Option<u8>, TransportError> {
        (**self).peek_byte(timeout)
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        (**self).write_bytes(bytes)
    }

    fn bytes_available(&self) -> bool {
        (**self).bytes_available()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Timed out waiting for data")]
    Timeout,

    #[error("Transport is closed")]
    Closed,

    #[error("IO Error: {0}")]
    Io(Box<dyn core::error::Error + Send + Sync>),
}

impl TransportError {
    /// Wraps an error raised by the underlying link.
    pub fn io(error: impl core::error::Error + Send + Sync + 'static) -> Self {
        Self::Io(Box::new(error))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

/// An in-memory [`Transport`].
///
/// Reads are served from a queue of inbound bytes and writes are recorded.
/// An empty queue behaves like a silent link: reads time out immediately and
/// peeks return `None`.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    inbound: VecDeque<u8>,
    outbound: Vec<u8>,
    reads: usize,
    peeks: usize,
    closed: bool,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport that will yield `bytes`.
    pub fn with_inbound(bytes: impl AsRef<[u8]>) -> Self {
        let mut transport = Self::new();
        transport.push_inbound(bytes);
        transport
    }

    /// Queues more bytes to be read.
    pub fn push_inbound(&mut self, bytes: impl AsRef<[u8]>) {
        self.inbound.extend(bytes.as_ref());
    }

    /// Number of queued bytes not yet read.
    pub fn pending(&self) -> usize {
        self.inbound.len()
    }

    /// Every byte written so far.
    pub fn written(&self) -> &[u8] {
        &self.outbound
    }

    /// Takes the bytes written so far, clearing the record.
    pub fn take_written(&mut self) -> Vec<u8> {
        core::mem::take(&mut self.outbound)
    }

    /// Moves every written byte to the inbound queue, as if the link was
    /// wired back onto itself.
    pub fn loop_back(&mut self) {
        let written = self.take_written();
        self.push_inbound(written);
    }

    /// Number of bytes consumed by [`Transport::read_byte`].
    pub fn reads(&self) -> usize {
        self.reads
    }

    /// Number of [`Transport::peek_byte`] calls.
    pub fn peeks(&self) -> usize {
        self.peeks
    }

    pub fn close(&mut self) {
        self.closed = true;
    }
}

impl Transport for MemoryTransport {
    fn read_byte(&mut self, _timeout: Duration) -> Result<u8, TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }

        let byte = self.inbound.pop_front().ok_or(TransportError::Timeout)?;
        self.reads += 1;
        Ok(byte)
    }

    fn peek_byte(&mut self, _timeout: Duration) -> Result<Option<u8>, TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }

        self.peeks += 1;
        Ok(self.inbound.front().copied())
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }

        self.outbound.extend_from_slice(bytes);
        Ok(())
    }

    fn bytes_available(&self) -> bool {
        !self.closed && !self.inbound.is_empty()
    }

    fn is_open(&self) -> bool {
        !self.closed
    }
}

#[cfg(test)]
mod tests {
    use core::time::Duration;

    use super::{MemoryTransport, Transport, TransportError};

    const TIMEOUT: Duration = Duration::from_millis(10);

    #[test]
    fn peek_does_not_consume() {
        let mut transport = MemoryTransport::with_inbound([0x01, 0x02]);

        assert_eq!(transport.peek_byte(TIMEOUT).unwrap(), Some(0x01));
        assert_eq!(transport.peek_byte(TIMEOUT).unwrap(), Some(0x01));
        assert_eq!(transport.read_byte(TIMEOUT).unwrap(), 0x01);
        assert_eq!(transport.read_byte(TIMEOUT).unwrap(), 0x02);
        assert_eq!(transport.peek_byte(TIMEOUT).unwrap(), None);

        assert_eq!(transport.reads(), 2);
        assert_eq!(transport.peeks(), 3);
    }

    #[test]
    fn silent_link_times_out() {
        let mut transport = MemoryTransport::new();

        assert!(!transport.bytes_available());
        assert!(transport.read_byte(TIMEOUT).unwrap_err().is_timeout());
    }

    #[test]
    fn closed() {
        let mut transport = MemoryTransport::with_inbound([0x01]);
        transport.close();

        assert!(!transport.is_open());
        assert!(!transport.bytes_available());
        assert!(matches!(
            transport.read_byte(TIMEOUT),
            Err(TransportError::Closed)
        ));
        assert!(matches!(
            transport.write_bytes(&[0x02]),
            Err(TransportError::Closed)
        ));
    }

    #[test]
    fn loop_back() {
        let mut transport = MemoryTransport::new();
        transport.write_bytes(&[0xAA, 0x55]).unwrap();
        assert_eq!(transport.written(), &[0xAA, 0x55]);

        transport.loop_back();
        assert!(transport.written().is_empty());
        assert_eq!(transport.pending(), 2);
        assert_eq!(transport.read_byte(TIMEOUT).unwrap(), 0xAA);
    }
}
