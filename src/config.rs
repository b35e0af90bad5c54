use crate::{Error, Result};
use ad4080_globals::ad4080::{AD4080_FIFO_DEPTH, GpioPin};
use ad4080_globals::{AddressMode, EnumStorePolicy};
use confique::Config;
use std::path::Path;
use std::time::Duration;

#[derive(Config, Debug, Clone)]
pub struct Conf {
    #[config(nested)]
    pub acquisition: AcquisitionConf,
    #[config(nested)]
    pub device: DeviceConf,
}

#[derive(Config, Debug, Clone)]
pub struct AcquisitionConf {
    /// Samples per acquisition until the host asks for another count.
    #[config(default = 1024, env = "AD4080_WATERMARK")]
    pub watermark: usize,
    #[config(default = 15000, env = "AD4080_POLL_TIMEOUT_MS")]
    pub poll_timeout_ms: u64,
    /// Pause between two reads of the FIFO-full line. 0 spins.
    #[config(default = 0, env = "AD4080_POLL_INTERVAL_US")]
    pub poll_interval_us: u64,
    #[config(default = "ignore", env = "AD4080_UNMATCHED_ENUM")]
    pub unmatched_enum: EnumStorePolicy,
}

#[derive(Config, Debug, Clone)]
pub struct DeviceConf {
    #[config(default = "long", env = "AD4080_ADDRESS_MODE")]
    pub address_mode: AddressMode,
    /// AD4080 GPIO routed to the host's FIFO-full input.
    #[config(default = 1, env = "AD4080_FIFO_FULL_GPIO")]
    pub fifo_full_gpio: u8,
}

impl Conf {
    /// Loads the configuration from environment overrides and `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Conf::builder()
            .env()
            .file(path.as_ref())
            .load()
            .map_err(|e| Error::Config(e.to_string()))
    }

    /// Configuration with every field at its default.
    pub fn defaults() -> Result<Self> {
        Conf::builder()
            .load()
            .map_err(|e| Error::Config(e.to_string()))
    }

    pub fn params(&self) -> Result<IioParams> {
        let acq = &self.acquisition;
        if acq.watermark == 0 || acq.watermark > AD4080_FIFO_DEPTH {
            return Err(Error::Config(format!(
                "watermark {} outside 1..={AD4080_FIFO_DEPTH}",
                acq.watermark
            )));
        }
        let fifo_full_gpio = GpioPin::from_bits(self.device.fifo_full_gpio).ok_or_else(|| {
            Error::Config(format!("no AD4080 gpio{}", self.device.fifo_full_gpio))
        })?;

        Ok(IioParams {
            watermark: acq.watermark,
            address_mode: self.device.address_mode,
            fifo_full_gpio,
            settings: AcquisitionSettings {
                poll_timeout: Duration::from_millis(acq.poll_timeout_ms),
                poll_interval: Duration::from_micros(acq.poll_interval_us),
                unmatched_enum: acq.unmatched_enum,
            },
        })
    }
}

/// Runtime knobs of the acquisition loop and attribute stores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcquisitionSettings {
    pub poll_timeout: Duration,
    pub poll_interval: Duration,
    pub unmatched_enum: EnumStorePolicy,
}

impl Default for AcquisitionSettings {
    fn default() -> Self {
        Self {
            poll_timeout: Duration::from_secs(15),
            poll_interval: Duration::ZERO,
            unmatched_enum: EnumStorePolicy::Ignore,
        }
    }
}

/// Everything `IioAd4080::init` needs besides the hardware handles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IioParams {
    pub watermark: usize,
    pub address_mode: AddressMode,
    pub fifo_full_gpio: GpioPin,
    pub settings: AcquisitionSettings,
}

impl Default for IioParams {
    fn default() -> Self {
        Self {
            watermark: 1024,
            address_mode: AddressMode::Long,
            fifo_full_gpio: GpioPin::Gpio1,
            settings: AcquisitionSettings::default(),
        }
    }
}
