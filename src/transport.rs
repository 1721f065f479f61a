//! Serial channel configuration and the host hook that opens it.

use embedded_io::{Read, ReadReady, Write};

/// Baud rate of the AT-command firmware.
pub const BAUD_RATE: u32 = 115_200;

/// Baud rate of the older firmware revision. Not supported.
pub const LEGACY_BAUD_RATE: u32 = 9_600;

/// UART parity setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Wiring and framing of the serial link to the player module.
///
/// Pin numbers and the channel index are opaque to this crate; they are
/// handed to the [`SerialOpener`] unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    /// UART peripheral index.
    pub channel: u8,
    /// TX pin number.
    pub tx_pin: u8,
    /// RX pin number.
    pub rx_pin: u8,
    pub baud_rate: u32,
    pub data_bits: u8,
    pub parity: Parity,
    pub stop_bits: u8,
}

impl UartConfig {
    /// Creates an 8N1 configuration at [`BAUD_RATE`].
    pub const fn new(channel: u8, tx_pin: u8, rx_pin: u8) -> Self {
        Self {
            channel,
            tx_pin,
            rx_pin,
            baud_rate: BAUD_RATE,
            data_bits: 8,
            parity: Parity::None,
            stop_bits: 1,
        }
    }

    /// Overrides the baud rate.
    pub const fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Returns true when the framing matches what the module speaks.
    pub fn is_supported(&self) -> bool {
        self.baud_rate == BAUD_RATE
            && self.data_bits == 8
            && self.parity == Parity::None
            && self.stop_bits == 1
    }
}

impl Default for UartConfig {
    /// UART1 on TX 7 / RX 6.
    fn default() -> Self {
        Self::new(1, 7, 6)
    }
}

/// Returned by a [`SerialOpener`] when the lines cannot be claimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelUnavailable;

/// Host hook that claims the UART described by a [`UartConfig`].
///
/// Implement this for your HAL. The returned port must support a
/// non-blocking read: `read_ready()` answers whether `read()` would return
/// data without blocking.
pub trait SerialOpener {
    /// The opened port.
    type Port: Read + Write + ReadReady;

    /// Claims the pins and configures the peripheral.
    fn open(&mut self, config: &UartConfig) -> Result<Self::Port, ChannelUnavailable>;
}
