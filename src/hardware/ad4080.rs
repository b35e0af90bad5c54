use crate::transport::RegisterTransport;
use crate::{Error, Result};
use ad4080_globals::ad4080::*;
use ad4080_globals::AddressMode;

/// Configuration fields mirrored from the device registers.
#[derive(Debug, Clone, PartialEq)]
pub struct Ad4080Config {
    pub addr_mode: AddressMode,
    pub fifo_mode: FifoMode,
    pub fifo_watermark: u16,
    pub gpio_op_enable: [GpioDirection; 4],
    pub gpio_op_func_sel: [GpioFunc; 4],
}

impl Default for Ad4080Config {
    fn default() -> Self {
        Self {
            addr_mode: AddressMode::Long,
            fifo_mode: FifoMode::Disabled,
            fifo_watermark: 0,
            gpio_op_enable: [GpioDirection::Input; 4],
            gpio_op_func_sel: [GpioFunc::AdiNspiSdoData; 4],
        }
    }
}

/// Device status flags from DEVICE_STATUS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceStatus {
    pub fifo_full: bool,
    pub fifo_read_done: bool,
    pub event: ThresholdEvent,
}

impl From<u8> for DeviceStatus {
    fn from(reg: u8) -> Self {
        let event_bits = (reg & AD4080_EVENT_DETECTED_MSK) >> AD4080_EVENT_DETECTED_SHIFT;
        Self {
            fifo_full: reg & AD4080_FIFO_FULL_MSK != 0,
            fifo_read_done: reg & AD4080_FIFO_READ_DONE_MSK != 0,
            // Every 2-bit pattern has a variant.
            event: ThresholdEvent::from_bits(event_bits).unwrap_or(ThresholdEvent::None),
        }
    }
}

/// AD4080 register-level driver.
pub struct AD4080<T> {
    transport: T,
    config: Ad4080Config,
}

impl<T: RegisterTransport> AD4080<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            config: Ad4080Config::default(),
        }
    }

    /// Verifies the SPI link, selects the instruction mode, parks the FIFO
    /// and synchronises the cached configuration with the device.
    pub fn init(&mut self, addr_mode: AddressMode) -> Result<()> {
        self.write(AD4080_REG_SCRATCH_PAD, AD4080_SCRATCH_PAD_TEST)?;
        let scratch = self.read(AD4080_REG_SCRATCH_PAD)?;
        if scratch != AD4080_SCRATCH_PAD_TEST {
            log::error!("scratch pad readback {scratch:#04x}, expected {AD4080_SCRATCH_PAD_TEST:#04x}");
            return Err(Error::InvalidRegister {
                addr: AD4080_REG_SCRATCH_PAD,
                value: scratch,
            });
        }

        self.set_address_mode(addr_mode)?;
        self.set_fifo_mode(FifoMode::Disabled)?;
        self.config.fifo_watermark = self.read16(AD4080_REG_FIFO_WATERMARK)?;

        // the getters refresh the cache
        for pin in GpioPin::ALL {
            self.gpio_output_enable(*pin)?;
            self.gpio_output_func(*pin)?;
        }

        log::debug!("AD4080 initialised: {:?}", self.config);
        Ok(())
    }

    pub fn config(&self) -> &Ad4080Config {
        &self.config
    }

    pub fn read(&mut self, addr: u16) -> Result<u8> {
        let data = self.transport.read(addr)?;
        log::trace!("read  [{addr:#04x}] = {data:#04x}");
        Ok(data)
    }

    pub fn write(&mut self, addr: u16, data: u8) -> Result<()> {
        log::trace!("write [{addr:#04x}] = {data:#04x}");
        self.transport.write(addr, data)
    }

    pub fn update_bits(&mut self, addr: u16, mask: u8, data: u8) -> Result<()> {
        log::trace!("update [{addr:#04x}] mask {mask:#04x} = {data:#04x}");
        self.transport.update_bits(addr, mask, data)
    }

    /// Reads a two-register value, low byte at `addr`.
    pub fn read16(&mut self, addr: u16) -> Result<u16> {
        let lo = self.read(addr)?;
        let hi = self.read(addr + 1)?;
        Ok(u16::from_le_bytes([lo, hi]))
    }

    /// Writes a two-register value, low byte first.
    pub fn write16(&mut self, addr: u16, data: u16) -> Result<()> {
        let [lo, hi] = data.to_le_bytes();
        self.write(addr, lo)?;
        self.write(addr + 1, hi)
    }

    pub fn set_address_mode(&mut self, mode: AddressMode) -> Result<()> {
        let bits = match mode {
            AddressMode::Long => 0,
            AddressMode::Short => AD4080_SHORT_INST_MSK,
        };
        self.update_bits(AD4080_REG_INTERFACE_CONFIG_B, AD4080_SHORT_INST_MSK, bits)?;
        self.transport.set_address_mode(mode);
        self.config.addr_mode = mode;
        Ok(())
    }

    pub fn vendor_id(&mut self) -> Result<u16> {
        self.read16(AD4080_REG_VENDOR_L)
    }

    pub fn fifo_mode(&mut self) -> Result<FifoMode> {
        let reg = self.read(AD4080_REG_GENERAL_CONFIG)?;
        // 2-bit field, all encodings defined
        let mode = FifoMode::from_bits(reg & AD4080_FIFO_MODE_MSK).unwrap_or(FifoMode::Disabled);
        self.config.fifo_mode = mode;
        Ok(mode)
    }

    pub fn set_fifo_mode(&mut self, mode: FifoMode) -> Result<()> {
        self.update_bits(AD4080_REG_GENERAL_CONFIG, AD4080_FIFO_MODE_MSK, mode.bits())?;
        self.config.fifo_mode = mode;
        Ok(())
    }

    pub fn fifo_watermark(&mut self) -> Result<u16> {
        let wm = self.read16(AD4080_REG_FIFO_WATERMARK)?;
        self.config.fifo_watermark = wm;
        Ok(wm)
    }

    pub fn set_fifo_watermark(&mut self, watermark: u16) -> Result<()> {
        if watermark == 0 || watermark as usize > AD4080_FIFO_DEPTH {
            return Err(Error::InvalidArgument("FIFO watermark"));
        }
        self.write16(AD4080_REG_FIFO_WATERMARK, watermark)?;
        self.config.fifo_watermark = watermark;
        Ok(())
    }

    pub fn gpio_output_enable(&mut self, pin: GpioPin) -> Result<GpioDirection> {
        let reg = self.read(AD4080_REG_GPIO_CONFIG_A)?;
        let dir = if reg & pin.enable_mask() != 0 {
            GpioDirection::Output
        } else {
            GpioDirection::Input
        };
        self.config.gpio_op_enable[pin.bits() as usize] = dir;
        Ok(dir)
    }

    pub fn set_gpio_output_enable(&mut self, pin: GpioPin, dir: GpioDirection) -> Result<()> {
        let mask = pin.enable_mask();
        let bits = if dir == GpioDirection::Output { mask } else { 0 };
        self.update_bits(AD4080_REG_GPIO_CONFIG_A, mask, bits)?;
        self.config.gpio_op_enable[pin.bits() as usize] = dir;
        Ok(())
    }

    pub fn gpio_output_func(&mut self, pin: GpioPin) -> Result<GpioFunc> {
        let (addr, shift) = pin.func_location();
        let reg = self.read(addr)?;
        let bits = (reg >> shift) & 0x0f;
        let func = GpioFunc::from_bits(bits).ok_or(Error::InvalidRegister { addr, value: reg })?;
        self.config.gpio_op_func_sel[pin.bits() as usize] = func;
        Ok(func)
    }

    pub fn set_gpio_output_func(&mut self, pin: GpioPin, func: GpioFunc) -> Result<()> {
        let (addr, shift) = pin.func_location();
        self.update_bits(addr, 0x0f << shift, func.bits() << shift)?;
        self.config.gpio_op_func_sel[pin.bits() as usize] = func;
        Ok(())
    }

    pub fn filter_sel(&mut self) -> Result<FilterSel> {
        let reg = self.read(AD4080_REG_FILTER_CONFIG)?;
        Ok(FilterSel::from_bits(reg & AD4080_FILTER_SEL_MSK).unwrap_or(FilterSel::None))
    }

    pub fn sinc_dec_rate(&mut self) -> Result<SincDecimation> {
        let reg = self.read(AD4080_REG_FILTER_CONFIG)?;
        let bits = (reg & AD4080_SINC_DEC_RATE_MSK) >> AD4080_SINC_DEC_RATE_SHIFT;
        SincDecimation::from_bits(bits).ok_or(Error::InvalidRegister {
            addr: AD4080_REG_FILTER_CONFIG,
            value: reg,
        })
    }

    pub fn set_sinc_dec_rate(&mut self, rate: SincDecimation) -> Result<()> {
        self.update_bits(
            AD4080_REG_FILTER_CONFIG,
            AD4080_SINC_DEC_RATE_MSK,
            rate.bits() << AD4080_SINC_DEC_RATE_SHIFT,
        )
    }

    pub fn operating_mode(&mut self) -> Result<OperatingMode> {
        let reg = self.read(AD4080_REG_DEVICE_CONFIG)?;
        OperatingMode::from_bits(reg & AD4080_OP_MODE_MSK).ok_or(Error::InvalidRegister {
            addr: AD4080_REG_DEVICE_CONFIG,
            value: reg,
        })
    }

    pub fn set_operating_mode(&mut self, mode: OperatingMode) -> Result<()> {
        self.update_bits(AD4080_REG_DEVICE_CONFIG, AD4080_OP_MODE_MSK, mode.bits())
    }

    /// Offset correction code, 12-bit two's complement.
    pub fn offset(&mut self) -> Result<i16> {
        Ok(sign_extend_12(self.read16(AD4080_REG_OFFSET)?))
    }

    pub fn set_offset(&mut self, code: i16) -> Result<()> {
        self.write16(AD4080_REG_OFFSET, to_12bit(code))
    }

    /// Event hysteresis code, 10 bits.
    pub fn hysteresis(&mut self) -> Result<u16> {
        Ok(self.read16(AD4080_REG_EVENT_HYSTERESIS)? & AD4080_HYSTERESIS_MSK)
    }

    pub fn set_hysteresis(&mut self, code: u16) -> Result<()> {
        self.write16(AD4080_REG_EVENT_HYSTERESIS, code & AD4080_HYSTERESIS_MSK)
    }

    /// Event detection threshold code, 12-bit two's complement.
    pub fn event_detection(&mut self, hi: bool) -> Result<i16> {
        Ok(sign_extend_12(self.read16(Self::event_reg(hi))?))
    }

    pub fn set_event_detection(&mut self, hi: bool, code: i16) -> Result<()> {
        self.write16(Self::event_reg(hi), to_12bit(code))
    }

    fn event_reg(hi: bool) -> u16 {
        if hi {
            AD4080_REG_EVENT_DETECTION_HI
        } else {
            AD4080_REG_EVENT_DETECTION_LO
        }
    }

    pub fn device_status(&mut self) -> Result<DeviceStatus> {
        Ok(DeviceStatus::from(self.read(AD4080_REG_DEVICE_STATUS)?))
    }

    /// Drains `len` bytes of the FIFO in one streaming transfer.
    pub fn read_fifo(&mut self, len: usize) -> Result<Vec<u8>> {
        log::trace!("FIFO drain of {len} bytes");
        let data = self.transport.burst_read(AD4080_FIFO_DATA_ADDR, len)?;
        if data.len() != len {
            return Err(Error::Transport(format!(
                "FIFO drain returned {} bytes, expected {len}",
                data.len()
            )));
        }
        Ok(data)
    }

    pub fn debug_reg_read(&mut self, addr: u16) -> Result<u8> {
        Self::check_debug_addr(addr)?;
        self.read(addr)
    }

    pub fn debug_reg_write(&mut self, addr: u16, data: u8) -> Result<()> {
        Self::check_debug_addr(addr)?;
        self.write(addr, data)
    }

    fn check_debug_addr(addr: u16) -> Result<()> {
        if addr > AD4080_LAST_REG_ADDR {
            return Err(Error::InvalidArgument("register address"));
        }
        Ok(())
    }
}
