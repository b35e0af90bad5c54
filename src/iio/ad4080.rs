//! IIO-style front end of the AD4080: FIFO-triggered acquisition and the
//! string-keyed attribute interface.
//!
//! [`IioAd4080`] owns the chip driver, the FIFO-full input and the sample
//! buffers sized from the current watermark. An acquisition arms the FIFO in
//! immediate trigger mode, waits for the FIFO-full line, drains the FIFO in
//! one burst and always disables the FIFO again before returning.

mod attr;
mod decode;
mod fifo;
mod sink;
mod submit;
mod trigger;

pub use attr::{
    AttrDescriptor, AttrId, AttrKind, CHANNEL_ATTRIBUTES, GLOBAL_ATTRIBUTES, MAX_ATTR_ID, TextBuf,
    find_attribute,
};
pub use decode::decode_samples;
pub use fifo::FifoBuffers;
pub use sink::{CircularBuffer, SampleSink};
pub use trigger::CancelToken;

use crate::config::{AcquisitionSettings, IioParams};
use crate::hardware::ad4080::AD4080;
use crate::transport::{GpioInput, GpioOutput, RegisterTransport};
use crate::{Error, Level, Result};
use ad4080_globals::ad4080::{AD4080_ADC_GRANULARITY, GpioDirection, GpioFunc, GpioPin};
use atomic_enum::atomic_enum;
use std::sync::atomic::Ordering;

/// Where the acquisition state machine currently is.
#[atomic_enum]
#[derive(PartialEq, Eq)]
pub enum AcquisitionState {
    Idle,
    /// FIFO mode write issued.
    Armed,
    /// Waiting for the FIFO-full line.
    Polling,
}

/// Layout of one sample in the buffers handed to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanType {
    pub sign: char,
    pub realbits: u8,
    pub storagebits: u8,
    pub shift: u8,
    pub is_big_endian: bool,
}

pub const AD4080_SCAN_TYPE: ScanType = ScanType {
    sign: 's',
    realbits: AD4080_ADC_GRANULARITY as u8,
    storagebits: 32,
    shift: 0,
    is_big_endian: false,
};

/// Identifies the channel an attribute request addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelInfo {
    pub ch_num: u32,
    pub ch_out: bool,
}

#[derive(Debug)]
pub struct IioChannel {
    pub name: &'static str,
    pub channel: u32,
    pub scan_index: u32,
    pub scan_type: ScanType,
    pub attributes: &'static [AttrDescriptor],
    pub ch_out: bool,
}

impl IioChannel {
    pub fn info(&self) -> ChannelInfo {
        ChannelInfo {
            ch_num: self.channel,
            ch_out: self.ch_out,
        }
    }
}

/// The single differential input of the converter.
pub const AD4080_CHANNEL: IioChannel = IioChannel {
    name: "voltage",
    channel: 0,
    scan_index: 0,
    scan_type: AD4080_SCAN_TYPE,
    attributes: CHANNEL_ATTRIBUTES,
    ch_out: false,
};

pub static AD4080_CHANNELS: [IioChannel; 1] = [AD4080_CHANNEL];

/// Acquisition descriptor of one AD4080.
pub struct IioAd4080<T, F> {
    pub(crate) dev: AD4080<T>,
    pub(crate) fifo: FifoBuffers,
    pub(crate) ff_full: F,
    pub(crate) ff_gpio: GpioPin,
    pub(crate) afe_ctrl: Option<Box<dyn GpioOutput + Send>>,
    pub(crate) settings: AcquisitionSettings,
    pub(crate) state: AtomicAcquisitionState,
    pub(crate) cancel: CancelToken,
    pub(crate) last_disarm_error: Option<Error>,
}

impl<T: RegisterTransport, F: GpioInput> IioAd4080<T, F> {
    /// Brings up the chip, routes `params.fifo_full_gpio` to the FIFO-full
    /// function, allocates buffers for the initial watermark and enables the
    /// analog front end if a control line is given.
    pub fn init(
        transport: T,
        ff_full: F,
        afe_ctrl: Option<Box<dyn GpioOutput + Send>>,
        params: IioParams,
    ) -> Result<Self> {
        let mut dev = AD4080::new(transport);
        dev.init(params.address_mode)?;

        let pin = params.fifo_full_gpio;
        dev.set_gpio_output_enable(pin, GpioDirection::Output)?;
        dev.set_gpio_output_func(pin, GpioFunc::FifoFull)?;

        let mut iio = Self {
            dev,
            fifo: FifoBuffers::default(),
            ff_full,
            ff_gpio: pin,
            afe_ctrl,
            settings: params.settings,
            state: AtomicAcquisitionState::new(AcquisitionState::Idle),
            cancel: CancelToken::new(),
            last_disarm_error: None,
        };
        iio.set_watermark(params.watermark)?;

        if let Some(afe) = iio.afe_ctrl.as_mut() {
            afe.set_level(Level::High)?;
        }

        log::debug!(
            "IIO AD4080 ready: {pin:?} signals FIFO full, watermark {}",
            iio.fifo.watermark()
        );
        Ok(iio)
    }

    /// Releases the sample buffers, leaving the FIFO disabled, and hands the
    /// chip driver and the FIFO-full input back.
    pub fn fini(mut self) -> Result<(AD4080<T>, F)> {
        self.release()?;
        Ok((self.dev, self.ff_full))
    }

    pub fn device(&mut self) -> &mut AD4080<T> {
        &mut self.dev
    }

    pub fn fifo_full_gpio(&self) -> GpioPin {
        self.ff_gpio
    }

    pub fn settings(&self) -> &AcquisitionSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: AcquisitionSettings) {
        self.settings = settings;
    }

    pub fn state(&self) -> AcquisitionState {
        self.state.load(Ordering::Acquire)
    }

    /// Token that aborts the poll of the acquisition in flight.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Disarm failure that was logged but not returned because another
    /// error was already being reported.
    pub fn take_disarm_error(&mut self) -> Option<Error> {
        self.last_disarm_error.take()
    }

    pub fn channels(&self) -> &'static [IioChannel] {
        &AD4080_CHANNELS
    }

    pub fn global_attributes(&self) -> &'static [AttrDescriptor] {
        GLOBAL_ATTRIBUTES
    }

    pub fn debug_reg_read(&mut self, addr: u16) -> Result<u8> {
        self.dev.debug_reg_read(addr)
    }

    pub fn debug_reg_write(&mut self, addr: u16, data: u8) -> Result<()> {
        self.dev.debug_reg_write(addr, data)
    }

    pub(crate) fn ensure_idle(&self) -> Result<()> {
        if self.state() != AcquisitionState::Idle {
            return Err(Error::Busy);
        }
        Ok(())
    }
}
