//! Implements discovering, opening, and talking to VEXnet devices over a serial port.

use std::{
    io::{self, Read, Write},
    time::Duration,
};

use log::{debug, trace};
use serialport::{ClearBuffer, SerialPort, SerialPortType};
use thiserror::Error;
use vexnet_protocol::{Transport, TransportError};

use crate::config::{DataBits, DeviceType, Parity, SerialConfig, StopBits};

/// A serial port that may have a VEXnet device attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VexnetPort {
    pub port_name: String,
    /// Human readable label, e.g. the USB product name.
    pub description: String,
}

/// Lists the serial ports available on this machine.
pub fn find_ports() -> Result<Vec<VexnetPort>, SerialError> {
    let mut ports = Vec::new();

    for port in serialport::available_ports()? {
        if cfg!(target_os = "macos") && port.port_name.starts_with("/dev/tty.") {
            // https://pbxbook.com/other/mac-tty.html
            debug!(
                "Ignoring port named {:?} because it is a call-in device",
                port.port_name
            );
            continue;
        }

        let description = match port.port_type {
            SerialPortType::UsbPort(info) => info
                .product
                .or(info.manufacturer)
                .unwrap_or_else(|| format!("USB device {:04x}:{:04x}", info.vid, info.pid)),
            SerialPortType::PciPort => "PCI device".to_string(),
            SerialPortType::BluetoothPort => "Bluetooth device".to_string(),
            SerialPortType::Unknown => "Unknown device".to_string(),
        };

        debug!("Found serial port {:?} ({})", port.port_name, description);
        ports.push(VexnetPort {
            port_name: port.port_name,
            description,
        });
    }

    Ok(ports)
}

/// One byte of lookahead in front of a byte source.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Pushback(Option<u8>);

impl Pushback {
    /// Takes the held byte, or reads a fresh one.
    fn take_or<E>(
        &mut self,
        read: impl FnOnce() -> Result<Option<u8>, E>,
    ) -> Result<Option<u8>, E> {
        match self.0.take() {
            Some(byte) => Ok(Some(byte)),
            None => read(),
        }
    }

    /// Returns the held byte, reading and holding a fresh one if empty.
    fn peek_or<E>(
        &mut self,
        read: impl FnOnce() -> Result<Option<u8>, E>,
    ) -> Result<Option<u8>, E> {
        if self.0.is_none() {
            self.0 = read()?;
        }

        Ok(self.0)
    }

    fn is_held(&self) -> bool {
        self.0.is_some()
    }

    fn clear(&mut self) {
        self.0 = None;
    }
}

/// A [`Transport`] over a serial port.
pub struct SerialTransport {
    port: Option<Box<dyn SerialPort>>,
    port_name: String,
    pushback: Pushback,
}

impl SerialTransport {
    /// Opens `port_name` at the baud rate of `device`, 8-N-1.
    pub fn open(port_name: &str, device: DeviceType) -> Result<Self, SerialError> {
        Self::open_with(port_name, &SerialConfig::from(device))
    }

    /// Opens `port_name` with custom settings.
    ///
    /// Anything already waiting in the port's buffers is discarded.
    pub fn open_with(port_name: &str, config: &SerialConfig) -> Result<Self, SerialError> {
        debug!("Opening serial port {:?} with {:?}", port_name, config);

        let port = serialport::new(port_name, config.baud_rate)
            .data_bits(config.data_bits.into())
            .parity(config.parity.into())
            .stop_bits(config.stop_bits.into())
            .timeout(config.timeout)
            .open()?;

        port.clear(ClearBuffer::All)?;
        debug!("Flushed buffers of {:?}", port_name);

        Ok(Self {
            port: Some(port),
            port_name: port_name.to_string(),
            pushback: Pushback::default(),
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Discards every byte received but not yet read.
    pub fn flush_receiver(&mut self) -> Result<(), SerialError> {
        self.pushback.clear();

        if let Some(port) = &self.port {
            port.clear(ClearBuffer::Input)?;
            debug!("Flushed receiver of {:?}", self.port_name);
        }

        Ok(())
    }

    /// Closes the port. Further reads and writes fail with [`TransportError::Closed`].
    pub fn close(&mut self) {
        if self.port.take().is_some() {
            debug!("Closed serial port {:?}", self.port_name);
        }
        self.pushback.clear();
    }

    fn port_mut(&mut self) -> Result<&mut Box<dyn SerialPort>, TransportError> {
        self.port.as_mut().ok_or(TransportError::Closed)
    }
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("port_name", &self.port_name)
            .field("open", &self.port.is_some())
            .field("pushback", &self.pushback)
            .finish()
    }
}

/// Reads a single byte, returning `None` if none arrives within `timeout`.
fn read_one(port: &mut dyn SerialPort, timeout: Duration) -> Result<Option<u8>, TransportError> {
    port.set_timeout(timeout).map_err(TransportError::io)?;

    let mut byte = [0; 1];
    match port.read(&mut byte) {
        Ok(1) => {
            trace!("read byte {:#04x}", byte[0]);
            Ok(Some(byte[0]))
        }
        Ok(_) => Ok(None),
        Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(None),
        Err(e) => Err(TransportError::io(e)),
    }
}

impl Transport for SerialTransport {
    fn read_byte(&mut self, timeout: Duration) -> Result<u8, TransportError> {
        let port = self.port.as_mut().ok_or(TransportError::Closed)?;

        self.pushback
            .take_or(|| read_one(&mut **port, timeout))?
            .ok_or(TransportError::Timeout)
    }

    fn peek_byte(&mut self, timeout: Duration) -> Result<Option<u8>, TransportError> {
        let port = self.port.as_mut().ok_or(TransportError::Closed)?;

        self.pushback.peek_or(|| read_one(&mut **port, timeout))
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let port = self.port_mut()?;

        port.write_all(bytes).map_err(TransportError::io)?;
        port.flush().map_err(TransportError::io)?;

        Ok(())
    }

    fn bytes_available(&self) -> bool {
        let Some(port) = &self.port else {
            return false;
        };

        self.pushback.is_held() || port.bytes_to_read().is_ok_and(|count| count > 0)
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }
}

impl From<DataBits> for serialport::DataBits {
    fn from(data_bits: DataBits) -> Self {
        match data_bits {
            DataBits::Five => Self::Five,
            DataBits::Six => Self::Six,
            DataBits::Seven => Self::Seven,
            DataBits::Eight => Self::Eight,
        }
    }
}

impl From<Parity> for serialport::Parity {
    fn from(parity: Parity) -> Self {
        match parity {
            Parity::None => Self::None,
            Parity::Odd => Self::Odd,
            Parity::Even => Self::Even,
        }
    }
}

impl From<StopBits> for serialport::StopBits {
    fn from(stop_bits: StopBits) -> Self {
        match stop_bits {
            StopBits::One => Self::One,
            StopBits::Two => Self::Two,
        }
    }
}

#[derive(Error, Debug)]
pub enum SerialError {
    #[error("IO Error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialport Error: {0}")]
    SerialportError(#[from] serialport::Error),
}
