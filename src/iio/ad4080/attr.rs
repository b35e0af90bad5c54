use super::{AD4080_CHANNEL, ChannelInfo, IioAd4080};
use crate::transport::{GpioInput, GpioOutput, RegisterTransport};
use crate::{Error, Level, Result};
use ad4080_globals::EnumStorePolicy;
use ad4080_globals::ad4080::*;
use ad4080_globals::range::Range;
use std::fmt::{self, Write};

/// Number of attribute ids. Valid ids are `0..MAX_ATTR_ID`.
pub const MAX_ATTR_ID: usize = 24;

/// Dense attribute id space shared by channel and global attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrId {
    Raw,
    Scale,
    Offset,
    Gp0Io,
    Gp0Func,
    Gp1Io,
    Gp1Func,
    Gp2Io,
    Gp2Func,
    Gp3Io,
    Gp3Func,
    FifoMode,
    FifoFull,
    FifoReadDone,
    FifoWatermark,
    ThresholdEventDetected,
    Hysteresis,
    EvtHi,
    EvtLo,
    FilterSel,
    SincDecRate,
    DeviceMode,
    AfeCtrl,
    SamplingFreq,
}

impl AttrId {
    pub const ALL: [AttrId; MAX_ATTR_ID] = [
        AttrId::Raw,
        AttrId::Scale,
        AttrId::Offset,
        AttrId::Gp0Io,
        AttrId::Gp0Func,
        AttrId::Gp1Io,
        AttrId::Gp1Func,
        AttrId::Gp2Io,
        AttrId::Gp2Func,
        AttrId::Gp3Io,
        AttrId::Gp3Func,
        AttrId::FifoMode,
        AttrId::FifoFull,
        AttrId::FifoReadDone,
        AttrId::FifoWatermark,
        AttrId::ThresholdEventDetected,
        AttrId::Hysteresis,
        AttrId::EvtHi,
        AttrId::EvtLo,
        AttrId::FilterSel,
        AttrId::SincDecRate,
        AttrId::DeviceMode,
        AttrId::AfeCtrl,
        AttrId::SamplingFreq,
    ];

    pub const fn id(self) -> usize {
        self as usize
    }

    pub const fn is_channel(self) -> bool {
        matches!(self, AttrId::Raw | AttrId::Scale | AttrId::Offset)
    }
}

impl TryFrom<usize> for AttrId {
    type Error = Error;

    fn try_from(id: usize) -> Result<Self> {
        AttrId::ALL.get(id).copied().ok_or_else(|| {
            log::error!("attribute id {id} out of range 0..{MAX_ATTR_ID}");
            Error::InvalidArgument("attribute id")
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrKind {
    /// Shows and stores the value.
    Value,
    /// The read-only `*_available` companion.
    Available,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttrDescriptor {
    pub name: &'static str,
    pub id: AttrId,
    pub kind: AttrKind,
}

const fn value(name: &'static str, id: AttrId) -> AttrDescriptor {
    AttrDescriptor {
        name,
        id,
        kind: AttrKind::Value,
    }
}

const fn avail(name: &'static str, id: AttrId) -> AttrDescriptor {
    AttrDescriptor {
        name,
        id,
        kind: AttrKind::Available,
    }
}

pub const CHANNEL_ATTRIBUTES: &[AttrDescriptor] = &[
    value("raw", AttrId::Raw),
    value("scale", AttrId::Scale),
    value("offset", AttrId::Offset),
];

pub const GLOBAL_ATTRIBUTES: &[AttrDescriptor] = &[
    value("gpio0_output_enable", AttrId::Gp0Io),
    avail("gpio0_output_enable_available", AttrId::Gp0Io),
    value("gpio0_output_func_sel", AttrId::Gp0Func),
    avail("gpio0_output_func_sel_available", AttrId::Gp0Func),
    value("gpio1_output_enable", AttrId::Gp1Io),
    avail("gpio1_output_enable_available", AttrId::Gp1Io),
    value("gpio1_output_func_sel", AttrId::Gp1Func),
    avail("gpio1_output_func_sel_available", AttrId::Gp1Func),
    value("gpio2_output_enable", AttrId::Gp2Io),
    avail("gpio2_output_enable_available", AttrId::Gp2Io),
    value("gpio2_output_func_sel", AttrId::Gp2Func),
    avail("gpio2_output_func_sel_available", AttrId::Gp2Func),
    value("gpio3_output_enable", AttrId::Gp3Io),
    avail("gpio3_output_enable_available", AttrId::Gp3Io),
    value("gpio3_output_func_sel", AttrId::Gp3Func),
    avail("gpio3_output_func_sel_available", AttrId::Gp3Func),
    value("fifo_mode", AttrId::FifoMode),
    avail("fifo_mode_available", AttrId::FifoMode),
    value("fifo_full", AttrId::FifoFull),
    avail("fifo_full_available", AttrId::FifoFull),
    value("fifo_read_done", AttrId::FifoReadDone),
    avail("fifo_read_done_available", AttrId::FifoReadDone),
    value("fifo_watermark", AttrId::FifoWatermark),
    avail("fifo_watermark_available", AttrId::FifoWatermark),
    value("threshold_event_detected", AttrId::ThresholdEventDetected),
    avail(
        "threshold_event_detected_available",
        AttrId::ThresholdEventDetected,
    ),
    value("hysteresis_mv", AttrId::Hysteresis),
    avail("hysteresis_mv_available", AttrId::Hysteresis),
    value("hi_threshold_mv", AttrId::EvtHi),
    avail("hi_threshold_mv_available", AttrId::EvtHi),
    value("lo_threshold_mv", AttrId::EvtLo),
    avail("lo_threshold_mv_available", AttrId::EvtLo),
    value("filter_type", AttrId::FilterSel),
    avail("filter_type_available", AttrId::FilterSel),
    value("oversampling_ratio", AttrId::SincDecRate),
    avail("oversampling_ratio_available", AttrId::SincDecRate),
    value("operating_mode", AttrId::DeviceMode),
    avail("operating_mode_available", AttrId::DeviceMode),
    value("afe_ctrl", AttrId::AfeCtrl),
    avail("afe_ctrl_available", AttrId::AfeCtrl),
    value("sampling_frequency", AttrId::SamplingFreq),
    avail("sampling_frequency_available", AttrId::SamplingFreq),
];

/// Looks `name` up in the channel and global attribute tables.
pub fn find_attribute(name: &str) -> Option<&'static AttrDescriptor> {
    CHANNEL_ATTRIBUTES
        .iter()
        .chain(GLOBAL_ATTRIBUTES)
        .find(|attr| attr.name == name)
}

/// Bounded text sink over a caller buffer. Output past the end of the buffer
/// is dropped.
pub struct TextBuf<'a> {
    buf: &'a mut [u8],
    len: usize,
}

impl<'a> TextBuf<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, len: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

impl Write for TextBuf<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let n = s.len().min(self.buf.len() - self.len);
        self.buf[self.len..self.len + n].copy_from_slice(&s.as_bytes()[..n]);
        self.len += n;
        Ok(())
    }
}

fn emit(out: &mut dyn Write, args: fmt::Arguments<'_>) -> Result<()> {
    out.write_fmt(args)
        .map_err(|_| Error::InvalidArgument("attribute text buffer"))
}

fn join<E>(all: &[E], name: fn(&E) -> &'static str) -> String {
    all.iter().map(name).collect::<Vec<_>>().join(" ")
}

fn offset_range() -> Range {
    Range::step(-2048.0, 2047.0, 1.0, AD4080_OFFSET_LSB_MV)
}

fn hysteresis_range() -> Range {
    Range::step(0.0, AD4080_HYSTERESIS_MSK as f64, 1.0, AD4080_EVENT_LSB_MV)
}

fn threshold_range() -> Range {
    Range::step(-2048.0, 2047.0, 1.0, AD4080_EVENT_LSB_MV)
}

fn watermark_range() -> Range {
    Range::step(1.0, AD4080_FIFO_DEPTH as f64, 1.0, 1.0)
}

fn parse_mv(input: &str) -> Result<f64> {
    match input.trim().parse::<f64>() {
        Ok(v) if !v.is_nan() => Ok(v),
        _ => Err(Error::InvalidArgument("expected a millivolt value")),
    }
}

/// Saturates `mv` to `range` and converts it to a register code.
fn mv_to_code(mv: f64, range: &Range, lsb: f64) -> i16 {
    (range.clamp(mv) / lsb).round() as i16
}

/// Decimal, or hexadecimal with a `0x` prefix.
fn parse_count(input: &str) -> Result<usize> {
    let s = input.trim();
    let parsed = match s.strip_prefix("0x") {
        Some(hex) if !hex.is_empty() => usize::from_str_radix(hex, 16),
        _ => s.parse::<usize>(),
    };
    parsed.map_err(|_| Error::InvalidArgument("expected a decimal or 0x-prefixed count"))
}

fn check_channel(id: AttrId, ch: Option<&ChannelInfo>) -> Result<()> {
    match ch {
        Some(ch) if id.is_channel() && ch.ch_num != AD4080_CHANNEL.channel => {
            Err(Error::InvalidArgument("channel"))
        }
        _ => Ok(()),
    }
}

impl<T: RegisterTransport, F: GpioInput> IioAd4080<T, F> {
    /// Renders attribute `attr_id` into `buf` and returns the bytes written.
    pub fn dispatch_show(
        &mut self,
        attr_id: usize,
        buf: &mut [u8],
        ch: Option<&ChannelInfo>,
    ) -> Result<usize> {
        let id = AttrId::try_from(attr_id)?;
        let mut out = TextBuf::new(buf);
        self.show(id, &mut out, ch)?;
        Ok(out.len())
    }

    /// Parses `buf` and applies it to attribute `attr_id`. Returns the input
    /// length.
    pub fn dispatch_store(
        &mut self,
        attr_id: usize,
        buf: &[u8],
        ch: Option<&ChannelInfo>,
    ) -> Result<usize> {
        let id = AttrId::try_from(attr_id)?;
        let text = std::str::from_utf8(buf)
            .map_err(|_| Error::InvalidArgument("attribute value is not UTF-8"))?;
        self.store(id, text.trim_end_matches(['\n', '\0']), ch)?;
        Ok(buf.len())
    }

    /// Renders the permitted values of attribute `attr_id`. Never touches the
    /// device.
    pub fn dispatch_list_available(
        &self,
        attr_id: usize,
        buf: &mut [u8],
        _ch: Option<&ChannelInfo>,
    ) -> Result<usize> {
        let id = AttrId::try_from(attr_id)?;
        let mut out = TextBuf::new(buf);
        self.list_available(id, &mut out)?;
        Ok(out.len())
    }

    /// Shows an attribute by name, `*_available` companions included.
    pub fn show_attr(&mut self, name: &str) -> Result<String> {
        let attr = find_attribute(name).ok_or(Error::InvalidArgument("unknown attribute"))?;
        let mut out = String::new();
        match attr.kind {
            AttrKind::Value => {
                let ch = attr.id.is_channel().then(|| AD4080_CHANNEL.info());
                self.show(attr.id, &mut out, ch.as_ref())?
            }
            AttrKind::Available => self.list_available(attr.id, &mut out)?,
        }
        Ok(out)
    }

    /// Stores an attribute by name.
    pub fn store_attr(&mut self, name: &str, value: &str) -> Result<usize> {
        let attr = find_attribute(name).ok_or(Error::InvalidArgument("unknown attribute"))?;
        if attr.kind == AttrKind::Available {
            return Err(Error::InvalidArgument("read-only attribute"));
        }
        let ch = attr.id.is_channel().then(|| AD4080_CHANNEL.info());
        self.dispatch_store(attr.id.id(), value.as_bytes(), ch.as_ref())
    }

    fn show(&mut self, id: AttrId, out: &mut dyn Write, ch: Option<&ChannelInfo>) -> Result<()> {
        check_channel(id, ch)?;
        match id {
            AttrId::Raw => {
                self.immediate_trigger()?;
                let sample = self
                    .fifo
                    .formatted
                    .first()
                    .copied()
                    .ok_or(Error::InvalidArgument("no FIFO buffers allocated"))?;
                emit(out, format_args!("{sample}"))
            }
            AttrId::Scale => emit(out, format_args!("{AD4080_DEFAULT_SCALE:10.6}")),
            AttrId::Offset => {
                let mv = self.dev.offset()? as f64 * AD4080_OFFSET_LSB_MV;
                emit(out, format_args!("{mv:10.6}"))
            }
            AttrId::Gp0Io => self.show_gpio_io(GpioPin::Gpio0, out),
            AttrId::Gp1Io => self.show_gpio_io(GpioPin::Gpio1, out),
            AttrId::Gp2Io => self.show_gpio_io(GpioPin::Gpio2, out),
            AttrId::Gp3Io => self.show_gpio_io(GpioPin::Gpio3, out),
            AttrId::Gp0Func => self.show_gpio_func(GpioPin::Gpio0, out),
            AttrId::Gp1Func => self.show_gpio_func(GpioPin::Gpio1, out),
            AttrId::Gp2Func => self.show_gpio_func(GpioPin::Gpio2, out),
            AttrId::Gp3Func => self.show_gpio_func(GpioPin::Gpio3, out),
            AttrId::FifoMode => emit(out, format_args!("{}", self.dev.fifo_mode()?.name())),
            AttrId::FifoFull => {
                let full = self.dev.device_status()?.fifo_full;
                emit(out, format_args!("{full}"))
            }
            AttrId::FifoReadDone => {
                let done = self.dev.device_status()?.fifo_read_done;
                emit(out, format_args!("{done}"))
            }
            AttrId::FifoWatermark => emit(out, format_args!("{}", self.dev.fifo_watermark()?)),
            AttrId::ThresholdEventDetected => {
                let event = self.dev.device_status()?.event;
                emit(out, format_args!("{}", event.name()))
            }
            AttrId::Hysteresis => {
                let mv = self.dev.hysteresis()? as f64 * AD4080_EVENT_LSB_MV;
                emit(out, format_args!("{mv:10.6}"))
            }
            AttrId::EvtHi | AttrId::EvtLo => {
                let code = self.dev.event_detection(id == AttrId::EvtHi)?;
                let mv = code as f64 * AD4080_EVENT_LSB_MV;
                emit(out, format_args!("{mv:10.6}"))
            }
            AttrId::FilterSel => emit(out, format_args!("{}", self.dev.filter_sel()?.name())),
            AttrId::SincDecRate => {
                emit(out, format_args!("{}", self.dev.sinc_dec_rate()?.name()))
            }
            AttrId::DeviceMode => {
                emit(out, format_args!("{}", self.dev.operating_mode()?.name()))
            }
            AttrId::AfeCtrl => {
                let afe = self
                    .afe_ctrl
                    .as_mut()
                    .ok_or(Error::InvalidArgument("no AFE control line"))?;
                let state = match afe.level()? {
                    Level::High => AfeState::Enable,
                    Level::Low => AfeState::Disable,
                };
                emit(out, format_args!("{}", state.name()))
            }
            AttrId::SamplingFreq => emit(out, format_args!("{}", AD4080_SAMPLING_FREQUENCIES[0])),
        }
    }

    fn show_gpio_io(&mut self, pin: GpioPin, out: &mut dyn Write) -> Result<()> {
        let dir = self.dev.gpio_output_enable(pin)?;
        emit(out, format_args!("{}", dir.name()))
    }

    fn show_gpio_func(&mut self, pin: GpioPin, out: &mut dyn Write) -> Result<()> {
        let func = self.dev.gpio_output_func(pin)?;
        emit(out, format_args!("{}", func.name()))
    }

    fn store(&mut self, id: AttrId, value: &str, ch: Option<&ChannelInfo>) -> Result<()> {
        check_channel(id, ch)?;
        match id {
            AttrId::Raw
            | AttrId::Scale
            | AttrId::FifoFull
            | AttrId::FifoReadDone
            | AttrId::ThresholdEventDetected => {
                log::warn!("{id:?} is read-only");
                Err(Error::InvalidArgument("read-only attribute"))
            }
            AttrId::Offset => {
                let code = mv_to_code(parse_mv(value)?, &offset_range(), AD4080_OFFSET_LSB_MV);
                self.dev.set_offset(code)
            }
            AttrId::Gp0Io => self.store_gpio_io(GpioPin::Gpio0, id, value),
            AttrId::Gp1Io => self.store_gpio_io(GpioPin::Gpio1, id, value),
            AttrId::Gp2Io => self.store_gpio_io(GpioPin::Gpio2, id, value),
            AttrId::Gp3Io => self.store_gpio_io(GpioPin::Gpio3, id, value),
            AttrId::Gp0Func => self.store_gpio_func(GpioPin::Gpio0, id, value),
            AttrId::Gp1Func => self.store_gpio_func(GpioPin::Gpio1, id, value),
            AttrId::Gp2Func => self.store_gpio_func(GpioPin::Gpio2, id, value),
            AttrId::Gp3Func => self.store_gpio_func(GpioPin::Gpio3, id, value),
            AttrId::FifoMode => match self.match_enum(id, value, FifoMode::from_name)? {
                Some(mode) => self.dev.set_fifo_mode(mode),
                None => Ok(()),
            },
            AttrId::FifoWatermark => self.set_watermark(parse_count(value)?),
            AttrId::Hysteresis => {
                // range starts at 0
                let code = mv_to_code(parse_mv(value)?, &hysteresis_range(), AD4080_EVENT_LSB_MV);
                self.dev.set_hysteresis(code as u16)
            }
            AttrId::EvtHi | AttrId::EvtLo => {
                let code = mv_to_code(parse_mv(value)?, &threshold_range(), AD4080_EVENT_LSB_MV);
                self.dev.set_event_detection(id == AttrId::EvtHi, code)
            }
            AttrId::FilterSel => match self.match_enum(id, value, FilterSel::from_name)? {
                Some(filter) => self.store_filter(filter),
                None => Ok(()),
            },
            AttrId::SincDecRate => match self.match_enum(id, value, SincDecimation::from_name)? {
                Some(rate) => {
                    let filter = self.dev.filter_sel()?;
                    let limited = rate.limit_for(filter);
                    if limited != rate {
                        log::warn!("{filter:?} supports decimation up to 256, using {limited:?}");
                    }
                    self.dev.set_sinc_dec_rate(limited)
                }
                None => Ok(()),
            },
            AttrId::DeviceMode => match self.match_enum(id, value, OperatingMode::from_name)? {
                Some(mode) => self.dev.set_operating_mode(mode),
                None => Ok(()),
            },
            AttrId::AfeCtrl => {
                if self.afe_ctrl.is_none() {
                    return Err(Error::InvalidArgument("no AFE control line"));
                }
                let Some(state) = self.match_enum(id, value, AfeState::from_name)? else {
                    return Ok(());
                };
                let level = Level::from(state == AfeState::Enable);
                match self.afe_ctrl.as_mut() {
                    Some(afe) => afe.set_level(level),
                    None => Ok(()),
                }
            }
            AttrId::SamplingFreq => {
                log::debug!("sampling frequency is fixed, ignoring {value:?}");
                Ok(())
            }
        }
    }

    fn store_gpio_io(&mut self, pin: GpioPin, id: AttrId, value: &str) -> Result<()> {
        match self.match_enum(id, value, GpioDirection::from_name)? {
            Some(dir) => self.dev.set_gpio_output_enable(pin, dir),
            None => Ok(()),
        }
    }

    fn store_gpio_func(&mut self, pin: GpioPin, id: AttrId, value: &str) -> Result<()> {
        match self.match_enum(id, value, GpioFunc::from_name)? {
            Some(func) => self.dev.set_gpio_output_func(pin, func),
            None => Ok(()),
        }
    }

    /// Selects `filter` in one register write, saturating a decimation ratio
    /// the new filter cannot run.
    fn store_filter(&mut self, filter: FilterSel) -> Result<()> {
        let reg = self.dev.read(AD4080_REG_FILTER_CONFIG)?;
        let mut next = (reg & !AD4080_FILTER_SEL_MSK) | filter.bits();
        let dec_bits = (reg & AD4080_SINC_DEC_RATE_MSK) >> AD4080_SINC_DEC_RATE_SHIFT;
        if filter != FilterSel::Sinc1 && dec_bits > SincDecimation::MAX_NON_SINC1.bits() {
            log::warn!("{filter:?} supports decimation up to 256, saturating");
            next = (next & !AD4080_SINC_DEC_RATE_MSK)
                | (SincDecimation::MAX_NON_SINC1.bits() << AD4080_SINC_DEC_RATE_SHIFT);
        }
        self.dev.write(AD4080_REG_FILTER_CONFIG, next)
    }

    /// Whitelist lookup. An unknown string is `Ok(None)` or an error
    /// depending on the configured policy.
    fn match_enum<E>(
        &self,
        id: AttrId,
        value: &str,
        from_name: fn(&str) -> Option<E>,
    ) -> Result<Option<E>> {
        if let Some(v) = from_name(value) {
            return Ok(Some(v));
        }
        match self.settings.unmatched_enum {
            EnumStorePolicy::Ignore => {
                log::warn!("{id:?}: ignoring unknown value {value:?}");
                Ok(None)
            }
            EnumStorePolicy::Reject => {
                log::error!("{id:?}: unknown value {value:?}");
                Err(Error::InvalidArgument("value not in attribute whitelist"))
            }
        }
    }

    fn list_available(&self, id: AttrId, out: &mut dyn Write) -> Result<()> {
        let text = match id {
            AttrId::Raw | AttrId::Scale => {
                return Err(Error::InvalidArgument("attribute has no value list"));
            }
            AttrId::Offset => offset_range().describe(),
            AttrId::Gp0Io | AttrId::Gp1Io | AttrId::Gp2Io | AttrId::Gp3Io => {
                join(GpioDirection::ALL, GpioDirection::name)
            }
            AttrId::Gp0Func | AttrId::Gp1Func | AttrId::Gp2Func | AttrId::Gp3Func => {
                join(GpioFunc::ALL, GpioFunc::name)
            }
            AttrId::FifoMode => join(FifoMode::ALL, FifoMode::name),
            AttrId::FifoFull | AttrId::FifoReadDone => "false true".to_string(),
            AttrId::FifoWatermark => watermark_range().describe(),
            AttrId::ThresholdEventDetected => join(ThresholdEvent::ALL, ThresholdEvent::name),
            AttrId::Hysteresis => hysteresis_range().describe(),
            AttrId::EvtHi | AttrId::EvtLo => threshold_range().describe(),
            AttrId::FilterSel => join(FilterSel::ALL, FilterSel::name),
            AttrId::SincDecRate => join(SincDecimation::ALL, SincDecimation::name),
            AttrId::DeviceMode => join(OperatingMode::ALL, OperatingMode::name),
            AttrId::AfeCtrl => join(AfeState::ALL, AfeState::name),
            AttrId::SamplingFreq => AD4080_SAMPLING_FREQUENCIES
                .iter()
                .map(|f| f.to_string())
                .collect::<Vec<_>>()
                .join(" "),
        };
        emit(out, format_args!("{text}"))
    }
}
