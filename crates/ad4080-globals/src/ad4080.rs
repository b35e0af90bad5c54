//! AD4080 register map, field masks and the enumerated register fields.
//!
//! Register layout follows the AD4080 datasheet (Rev. 0). Multi-byte
//! registers are little-endian: the low byte sits at the lower address.

/* Register addresses */
pub const AD4080_REG_INTERFACE_CONFIG_A: u16 = 0x00;
pub const AD4080_REG_INTERFACE_CONFIG_B: u16 = 0x01;
pub const AD4080_REG_DEVICE_CONFIG: u16 = 0x02;
pub const AD4080_REG_CHIP_TYPE: u16 = 0x03;
pub const AD4080_REG_PRODUCT_ID_L: u16 = 0x04;
pub const AD4080_REG_PRODUCT_ID_H: u16 = 0x05;
pub const AD4080_REG_CHIP_GRADE: u16 = 0x06;
pub const AD4080_REG_SCRATCH_PAD: u16 = 0x0A;
pub const AD4080_REG_SPI_REVISION: u16 = 0x0B;
pub const AD4080_REG_VENDOR_L: u16 = 0x0C;
pub const AD4080_REG_VENDOR_H: u16 = 0x0D;
pub const AD4080_REG_STREAM_MODE: u16 = 0x0E;
pub const AD4080_REG_TRANSFER_CONFIG: u16 = 0x0F;
pub const AD4080_REG_INTERFACE_CONFIG_C: u16 = 0x10;
pub const AD4080_REG_INTERFACE_STATUS_A: u16 = 0x11;
pub const AD4080_REG_DEVICE_STATUS: u16 = 0x14;
pub const AD4080_REG_ADC_DATA_INTF_CONFIG_A: u16 = 0x15;
pub const AD4080_REG_ADC_DATA_INTF_CONFIG_B: u16 = 0x16;
pub const AD4080_REG_ADC_DATA_INTF_CONFIG_C: u16 = 0x17;
pub const AD4080_REG_PWR_CTRL: u16 = 0x18;
pub const AD4080_REG_GPIO_CONFIG_A: u16 = 0x19;
pub const AD4080_REG_GPIO_CONFIG_B: u16 = 0x1A;
pub const AD4080_REG_GPIO_CONFIG_C: u16 = 0x1B;
pub const AD4080_REG_GENERAL_CONFIG: u16 = 0x1C;
pub const AD4080_REG_FIFO_WATERMARK: u16 = 0x1D; /* LSB, MSB at 0x1E */
pub const AD4080_REG_EVENT_HYSTERESIS: u16 = 0x1F; /* LSB, MSB at 0x20 */
pub const AD4080_REG_EVENT_DETECTION_HI: u16 = 0x21; /* LSB, MSB at 0x22 */
pub const AD4080_REG_EVENT_DETECTION_LO: u16 = 0x23; /* LSB, MSB at 0x24 */
pub const AD4080_REG_OFFSET: u16 = 0x25; /* LSB, MSB at 0x26 */
pub const AD4080_REG_GAIN: u16 = 0x27; /* LSB, MSB at 0x28 */
pub const AD4080_REG_FILTER_CONFIG: u16 = 0x29;

pub const AD4080_LAST_REG_ADDR: u16 = AD4080_REG_FILTER_CONFIG;

/// Streaming start address of the FIFO drain. The data lane clocks out the
/// sync byte followed by the packed samples and carries no register meaning.
pub const AD4080_FIFO_DATA_ADDR: u16 = 0x00;

/* AD4080_REG_INTERFACE_CONFIG_A */
pub const AD4080_SW_RESET_MSK: u8 = (1 << 7) | (1 << 0);
pub const AD4080_ADDR_ASC_MSK: u8 = 1 << 5;
pub const AD4080_SDO_ENABLE_MSK: u8 = 1 << 4;

/* AD4080_REG_INTERFACE_CONFIG_B */
pub const AD4080_SINGLE_INST_MSK: u8 = 1 << 7;
pub const AD4080_SHORT_INST_MSK: u8 = 1 << 3;

/* AD4080_REG_DEVICE_CONFIG */
pub const AD4080_OP_MODE_MSK: u8 = 0x03;

/* AD4080_REG_DEVICE_STATUS */
pub const AD4080_FIFO_FULL_MSK: u8 = 1 << 7;
pub const AD4080_FIFO_READ_DONE_MSK: u8 = 1 << 6;
pub const AD4080_EVENT_DETECTED_MSK: u8 = 0x30;
pub const AD4080_EVENT_DETECTED_SHIFT: u8 = 4;

/* AD4080_REG_GENERAL_CONFIG */
pub const AD4080_FIFO_MODE_MSK: u8 = 0x03;

/* AD4080_REG_FILTER_CONFIG */
pub const AD4080_FILTER_SEL_MSK: u8 = 0x03;
pub const AD4080_SINC_DEC_RATE_MSK: u8 = 0x78;
pub const AD4080_SINC_DEC_RATE_SHIFT: u8 = 3;

/* Field widths of the two-register values */
pub const AD4080_HYSTERESIS_MSK: u16 = 0x03FF;
pub const AD4080_12BIT_MSK: u16 = 0x0FFF;
pub const AD4080_12BIT_SIGN: u16 = 0x0800;

pub const AD4080_SCRATCH_PAD_TEST: u8 = 0xAD;
/// Analog Devices SPI vendor id.
pub const AD4080_VENDOR_ID: u16 = 0x0456;

/// Number of samples the on-chip FIFO holds.
pub const AD4080_FIFO_DEPTH: usize = 16384;
/// Resolution of one conversion result, in bits.
pub const AD4080_ADC_GRANULARITY: usize = 20;
/// Bytes one sample occupies in the FIFO drain.
pub const AD4080_SAMPLE_BYTES: usize = AD4080_ADC_GRANULARITY.div_ceil(8);
/// Bytes one decoded sample occupies in host storage.
pub const AD4080_STORAGE_BYTES: usize = size_of::<u32>();
/// Framing byte leading every FIFO drain.
pub const AD4080_FIFO_SYNC_BYTE: u8 = 0xAA;

/// mV per LSB of a conversion result (6 V differential span / 2^20).
pub const AD4080_DEFAULT_SCALE: f64 = 0.005722;
/// mV per LSB of the offset correction register.
pub const AD4080_OFFSET_LSB_MV: f64 = 0.00572;
/// mV per LSB of the event hysteresis and event detection registers.
pub const AD4080_EVENT_LSB_MV: f64 = 1.46484;

/// The only sampling frequency the converter clock supports, in Hz.
pub const AD4080_SAMPLING_FREQUENCIES: [u32; 1] = [40_000_000];

/// Declares a register field enum together with its attribute names.
macro_rules! field_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident = ($bits:expr, $text:expr)),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub const fn bits(&self) -> u8 {
                match self {
                    $($name::$variant => $bits),+
                }
            }

            pub const fn name(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            pub fn from_bits(bits: u8) -> Option<Self> {
                Self::ALL.iter().copied().find(|v| v.bits() == bits)
            }

            pub fn from_name(name: &str) -> Option<Self> {
                Self::ALL.iter().copied().find(|v| v.name() == name)
            }
        }
    };
}

field_enum! {
    /// FIFO operating mode, GENERAL_CONFIG[1:0].
    FifoMode {
        Disabled = (0, "disabled"),
        ImmediateTrigger = (1, "immediate_trigger_mode"),
        EventTriggerLastWatermark = (2, "read_latest_watermark_mode"),
        EventTrigger = (3, "read_all_FIFO_mode"),
    }
}

field_enum! {
    /// AD4080 general purpose pins.
    GpioPin {
        Gpio0 = (0, "gpio0"),
        Gpio1 = (1, "gpio1"),
        Gpio2 = (2, "gpio2"),
        Gpio3 = (3, "gpio3"),
    }
}

impl GpioPin {
    /// Register holding this pin's output function and the nibble shift.
    pub const fn func_location(&self) -> (u16, u8) {
        match self {
            GpioPin::Gpio0 => (AD4080_REG_GPIO_CONFIG_B, 0),
            GpioPin::Gpio1 => (AD4080_REG_GPIO_CONFIG_B, 4),
            GpioPin::Gpio2 => (AD4080_REG_GPIO_CONFIG_C, 0),
            GpioPin::Gpio3 => (AD4080_REG_GPIO_CONFIG_C, 4),
        }
    }

    /// Output enable bit in GPIO_CONFIG_A.
    pub const fn enable_mask(&self) -> u8 {
        1 << self.bits()
    }
}

field_enum! {
    GpioDirection {
        Input = (0, "input"),
        Output = (1, "output"),
    }
}

field_enum! {
    /// Output function of a GPIO pin configured as output.
    GpioFunc {
        AdiNspiSdoData = (0, "adi_nspi_sdo_data"),
        FifoFull = (1, "gpio_fifo_full"),
        FifoReadDone = (2, "gpio_fifo_read_done"),
        FilterResultReady = (3, "gpio_filter_result_ready"),
        HtDetect = (4, "gpio_ht_detect"),
        LtDetect = (5, "gpio_lt_detect"),
        StatusAlert = (6, "gpio_status_alert"),
        GpoData = (7, "gpio_gpo_data"),
        FilterSyncInput = (8, "gpio_filter_synch_input"),
        ExtEventTriggerFifo = (9, "gpio_ext_event_trigger_fifo"),
        CnvInhibitInput = (10, "gpio_cnv_inhibit_input"),
    }
}

field_enum! {
    /// Digital filter selection, FILTER_CONFIG[1:0].
    FilterSel {
        None = (0, "none"),
        Sinc1 = (1, "sinc1"),
        Sinc5 = (2, "sinc5"),
        Sinc5Pf1 = (3, "sinc5+pf1"),
    }
}

field_enum! {
    /// Sinc decimation ratio, FILTER_CONFIG[6:3].
    SincDecimation {
        Dec2 = (0, "2"),
        Dec4 = (1, "4"),
        Dec8 = (2, "8"),
        Dec16 = (3, "16"),
        Dec32 = (4, "32"),
        Dec64 = (5, "64"),
        Dec128 = (6, "128"),
        Dec256 = (7, "256"),
        Dec512 = (8, "512"),
        Dec1024 = (9, "1024"),
    }
}

impl SincDecimation {
    /// Largest ratio usable with a filter other than sinc1.
    pub const MAX_NON_SINC1: SincDecimation = SincDecimation::Dec256;

    /// Saturates the ratio to what `filter` supports.
    pub fn limit_for(self, filter: FilterSel) -> Self {
        if filter != FilterSel::Sinc1 && self.bits() > Self::MAX_NON_SINC1.bits() {
            Self::MAX_NON_SINC1
        } else {
            self
        }
    }
}

field_enum! {
    /// DEVICE_CONFIG[1:0]. Encoding 1 is reserved.
    OperatingMode {
        Normal = (0, "Normal"),
        Standby = (2, "Standby"),
        Sleep = (3, "Sleep"),
    }
}

field_enum! {
    /// DEVICE_STATUS[5:4].
    ThresholdEvent {
        None = (0, "None"),
        Lo = (1, "lo"),
        Hi = (2, "hi"),
        LoAndHi = (3, "lo_and_hi"),
    }
}

field_enum! {
    /// State of the optional analog front end enable line.
    AfeState {
        Disable = (0, "disable"),
        Enable = (1, "enable"),
    }
}

/// Sign-extends a 12-bit two's complement register value.
pub const fn sign_extend_12(raw: u16) -> i16 {
    let raw = raw & AD4080_12BIT_MSK;
    if raw & AD4080_12BIT_SIGN != 0 {
        (raw | !AD4080_12BIT_MSK) as i16
    } else {
        raw as i16
    }
}

/// Encodes a code in [-2048, 2047] as 12-bit two's complement.
pub const fn to_12bit(code: i16) -> u16 {
    (code as u16) & AD4080_12BIT_MSK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twelve_bit_codes() {
        assert_eq!(sign_extend_12(0x7FF), 2047);
        assert_eq!(sign_extend_12(0x800), -2048);
        assert_eq!(sign_extend_12(0xFFF), -1);
        assert_eq!(to_12bit(-1), 0xFFF);
        assert_eq!(to_12bit(-2048), 0x800);
    }

    #[test]
    fn decimation_saturates_without_sinc1() {
        assert_eq!(
            SincDecimation::Dec1024.limit_for(FilterSel::Sinc5),
            SincDecimation::Dec256
        );
        assert_eq!(
            SincDecimation::Dec1024.limit_for(FilterSel::Sinc1),
            SincDecimation::Dec1024
        );
        assert_eq!(
            SincDecimation::Dec16.limit_for(FilterSel::None),
            SincDecimation::Dec16
        );
    }

    #[test]
    fn reserved_operating_mode_has_no_variant() {
        assert_eq!(OperatingMode::from_bits(1), None);
        assert_eq!(OperatingMode::from_bits(2), Some(OperatingMode::Standby));
    }
}
