pub mod ad4080;
pub mod range;

use serde::Deserialize;
use std::time::Duration;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Out-of-range handle, attribute id, watermark or register address.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    /// Sample buffer (re)allocation failed.
    #[error("out of memory allocating {requested} bytes")]
    OutOfMemory {
        /// Number of bytes that could not be reserved.
        requested: usize,
    },
    /// Register read, write or burst transfer failed.
    #[error("transport: {0}")]
    Transport(String),
    /// A GPIO line could not be read or driven.
    #[error("gpio: {0}")]
    Gpio(String),
    /// The FIFO full signal never asserted.
    #[error("FIFO full not signaled within {0:?}")]
    Timeout(Duration),
    /// The acquisition descriptor is in use by an acquisition in flight.
    #[error("busy")]
    Busy,
    /// The acquisition was cancelled while polling.
    #[error("cancelled")]
    Cancelled,
    /// The destination cannot take the whole sample block.
    #[error("sink overrun: {needed} bytes needed, {available} available")]
    SinkOverrun { needed: usize, available: usize },
    /// A register holds a value with no meaning for its field.
    #[error("invalid value {value:#04x} in register {addr:#06x}")]
    InvalidRegister { addr: u16, value: u8 },
    #[error("config: {0}")]
    Config(String),
}

/// Result type for operations that may return an `Error`.
pub type Result<T> = std::result::Result<T, Error>;

/// Logic level of a GPIO line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high { Level::High } else { Level::Low }
    }
}

impl From<Level> for bool {
    fn from(level: Level) -> Self {
        level == Level::High
    }
}

/// SPI instruction phase length.
///
/// `Long` is the 16-bit instruction (R/W bit + 15-bit address), `Short` the
/// 8-bit one (R/W bit + 7-bit address).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AddressMode {
    #[default]
    Long,
    Short,
}

impl AddressMode {
    pub const fn instruction_len(&self) -> usize {
        match self {
            AddressMode::Long => 2,
            AddressMode::Short => 1,
        }
    }

    pub const fn max_addr(&self) -> u16 {
        match self {
            AddressMode::Long => 0x7fff,
            AddressMode::Short => 0x7f,
        }
    }
}

/// What a store does with a string outside an attribute's whitelist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EnumStorePolicy {
    /// Accept the store as a no-op and report the input length.
    #[default]
    Ignore,
    /// Fail the store with `Error::InvalidArgument`.
    Reject,
}
