//! Hardware access seams.
//!
//! The chip driver talks to the converter only through [`RegisterTransport`]
//! and watches the FIFO-full line through [`GpioInput`]. The adapters at the
//! bottom of this module implement both on top of `embedded-hal` 1.0 so any
//! HAL providing an [`SpiDevice`] and digital pins can host the driver.

use crate::{Error, Level, Result};
use ad4080_spi::AddressMode;
use ad4080_spi::frame::SpiFrame;
use embedded_hal::digital::{InputPin, StatefulOutputPin};
use embedded_hal::spi::SpiDevice;

/// Byte-wide register access over the configuration interface.
pub trait RegisterTransport {
    fn read(&mut self, addr: u16) -> Result<u8>;

    fn write(&mut self, addr: u16, val: u8) -> Result<()>;

    /// Read-modify-write of the bits selected by `mask`.
    fn update_bits(&mut self, addr: u16, mask: u8, val: u8) -> Result<()> {
        let data = self.read(addr)?;
        self.write(addr, (data & !mask) | (val & mask))
    }

    /// Streaming read of `count` bytes starting at `first_addr`.
    fn burst_read(&mut self, first_addr: u16, count: usize) -> Result<Vec<u8>>;

    /// Switches the instruction phase length used for subsequent accesses.
    fn set_address_mode(&mut self, _mode: AddressMode) {}
}

/// A digital input, e.g. the FIFO-full completion signal.
pub trait GpioInput {
    fn read_level(&mut self) -> Result<Level>;
}

/// A digital output, e.g. the analog front end enable line.
pub trait GpioOutput {
    fn set_level(&mut self, level: Level) -> Result<()>;

    /// Level currently driven.
    fn level(&mut self) -> Result<Level>;
}

impl<T: RegisterTransport + ?Sized> RegisterTransport for Box<T> {
    fn read(&mut self, addr: u16) -> Result<u8> {
        (**self).read(addr)
    }

    fn write(&mut self, addr: u16, val: u8) -> Result<()> {
        (**self).write(addr, val)
    }

    fn update_bits(&mut self, addr: u16, mask: u8, val: u8) -> Result<()> {
        (**self).update_bits(addr, mask, val)
    }

    fn burst_read(&mut self, first_addr: u16, count: usize) -> Result<Vec<u8>> {
        (**self).burst_read(first_addr, count)
    }

    fn set_address_mode(&mut self, mode: AddressMode) {
        (**self).set_address_mode(mode)
    }
}

impl<G: GpioInput + ?Sized> GpioInput for Box<G> {
    fn read_level(&mut self) -> Result<Level> {
        (**self).read_level()
    }
}

impl<G: GpioOutput + ?Sized> GpioOutput for Box<G> {
    fn set_level(&mut self, level: Level) -> Result<()> {
        (**self).set_level(level)
    }

    fn level(&mut self) -> Result<Level> {
        (**self).level()
    }
}

/// Register transport over an `embedded-hal` SPI device.
///
/// Every access is one full-duplex transaction: chip select is held by the
/// [`SpiDevice`] for the whole frame.
pub struct SpiTransport<SPI> {
    spi: SPI,
    mode: AddressMode,
}

impl<SPI: SpiDevice> SpiTransport<SPI> {
    pub fn new(spi: SPI) -> Self {
        Self {
            spi,
            mode: AddressMode::default(),
        }
    }

    pub fn address_mode(&self) -> AddressMode {
        self.mode
    }

    pub fn release(self) -> SPI {
        self.spi
    }

    fn transfer(&mut self, frame: &mut SpiFrame) -> Result<()> {
        log::trace!("SPI out: {frame}");
        self.spi
            .transfer_in_place(frame.as_mut_slice())
            .map_err(|e| Error::Transport(format!("{e:?}")))?;
        Ok(())
    }
}

impl<SPI: SpiDevice> RegisterTransport for SpiTransport<SPI> {
    fn read(&mut self, addr: u16) -> Result<u8> {
        let mut frame = SpiFrame::new_read(self.mode, addr, 1)?;
        self.transfer(&mut frame)?;
        Ok(frame.payload()[0])
    }

    fn write(&mut self, addr: u16, val: u8) -> Result<()> {
        let mut frame = SpiFrame::new_write(self.mode, addr, &[val])?;
        self.transfer(&mut frame)
    }

    fn burst_read(&mut self, first_addr: u16, count: usize) -> Result<Vec<u8>> {
        let mut frame = SpiFrame::new_read(self.mode, first_addr, count)?;
        self.transfer(&mut frame)?;
        Ok(frame.into_payload())
    }

    fn set_address_mode(&mut self, mode: AddressMode) {
        log::debug!("SPI instruction mode: {mode:?}");
        self.mode = mode;
    }
}

/// [`GpioInput`] over an `embedded-hal` input pin.
pub struct HalInput<P>(pub P);

impl<P: InputPin> GpioInput for HalInput<P> {
    fn read_level(&mut self) -> Result<Level> {
        self.0
            .is_high()
            .map(Level::from)
            .map_err(|e| Error::Gpio(format!("{e:?}")))
    }
}

/// [`GpioOutput`] over an `embedded-hal` stateful output pin.
pub struct HalOutput<P>(pub P);

impl<P: StatefulOutputPin> GpioOutput for HalOutput<P> {
    fn set_level(&mut self, level: Level) -> Result<()> {
        let res = match level {
            Level::High => self.0.set_high(),
            Level::Low => self.0.set_low(),
        };
        res.map_err(|e| Error::Gpio(format!("{e:?}")))
    }

    fn level(&mut self) -> Result<Level> {
        self.0
            .is_set_high()
            .map(Level::from)
            .map_err(|e| Error::Gpio(format!("{e:?}")))
    }
}
