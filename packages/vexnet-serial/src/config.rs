//! Serial link parameters.

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Baud rate of the VEXnet LCD display.
pub const LCD_DISPLAY_BAUDRATE: u32 = 19200;

/// Baud rate of the joystick partner port.
pub const JOYSTICK_PARTNER_BAUDRATE: u32 = 115200;

/// How long a serial read blocks by default.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(100);

/// The kind of peripheral on the other end of the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DeviceType {
    LcdDisplay,
    JoystickPartnerPort,
}

impl DeviceType {
    pub const fn baud_rate(self) -> u32 {
        match self {
            Self::LcdDisplay => LCD_DISPLAY_BAUDRATE,
            Self::JoystickPartnerPort => JOYSTICK_PARTNER_BAUDRATE,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DataBits {
    Five,
    Six,
    Seven,
    #[default]
    Eight,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Parity {
    #[default]
    None,
    Odd,
    Even,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StopBits {
    #[default]
    One,
    Two,
}

/// Settings used when opening a serial port.
///
/// Defaults to 8 data bits, no parity and one stop bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SerialConfig {
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    /// Upper bound on how long a single read blocks.
    pub timeout: Duration,
}

impl SerialConfig {
    pub const fn new(baud_rate: u32) -> Self {
        Self {
            baud_rate,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub const fn data_bits(mut self, data_bits: DataBits) -> Self {
        self.data_bits = data_bits;
        self
    }

    pub const fn parity(mut self, parity: Parity) -> Self {
        self.parity = parity;
        self
    }

    pub const fn stop_bits(mut self, stop_bits: StopBits) -> Self {
        self.stop_bits = stop_bits;
        self
    }

    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl From<DeviceType> for SerialConfig {
    fn from(device: DeviceType) -> Self {
        Self::new(device.baud_rate())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{DataBits, DeviceType, Parity, SerialConfig, StopBits};

    #[test]
    fn device_baud_rates() {
        assert_eq!(DeviceType::LcdDisplay.baud_rate(), 19200);
        assert_eq!(DeviceType::JoystickPartnerPort.baud_rate(), 115200);
    }

    #[test]
    fn defaults_to_8n1() {
        let config = SerialConfig::from(DeviceType::LcdDisplay);

        assert_eq!(config.baud_rate, 19200);
        assert_eq!(config.data_bits, DataBits::Eight);
        assert_eq!(config.parity, Parity::None);
        assert_eq!(config.stop_bits, StopBits::One);
        assert_eq!(config.timeout, Duration::from_millis(100));
    }

    #[test]
    fn builder() {
        let config = SerialConfig::new(9600)
            .data_bits(DataBits::Seven)
            .parity(Parity::Even)
            .stop_bits(StopBits::Two)
            .timeout(Duration::from_secs(1));

        assert_eq!(
            config,
            SerialConfig {
                baud_rate: 9600,
                data_bits: DataBits::Seven,
                parity: Parity::Even,
                stop_bits: StopBits::Two,
                timeout: Duration::from_secs(1),
            }
        );
    }
}
