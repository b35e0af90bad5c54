//! Software model of an AD4080 on its SPI and GPIO lines.
//!
//! All handles share one register file, so a test can keep a [`SimAd4080`]
//! around while the driver owns the transport and signal handles, and then
//! inspect registers, the write log and poll counts afterwards.

use crate::transport::{GpioInput, GpioOutput, RegisterTransport};
use crate::{Error, Level, Result};
use ad4080_globals::AddressMode;
use ad4080_globals::ad4080::*;
use std::sync::{Arc, Mutex, MutexGuard};

const REG_COUNT: usize = AD4080_LAST_REG_ADDR as usize + 1;

/// Deterministic 20-bit sample `i` returned by the FIFO model.
pub fn sample_pattern(i: usize) -> u32 {
    ((i as u32).wrapping_mul(0x9e37) ^ 0x5_a5a5) & 0xf_ffff
}

/// Raw FIFO image: sync byte followed by big-endian 24-bit words.
pub fn fifo_image(samples: &[u32]) -> Vec<u8> {
    let mut raw = Vec::with_capacity(1 + samples.len() * AD4080_SAMPLE_BYTES);
    raw.push(AD4080_FIFO_SYNC_BYTE);
    for s in samples {
        raw.extend_from_slice(&s.to_be_bytes()[1..]);
    }
    raw
}

#[derive(Debug)]
struct SimState {
    regs: [u8; REG_COUNT],
    writes: Vec<(u16, u8)>,
    addr_mode: AddressMode,
    armed: bool,
    polls_since_arm: usize,
    polls: usize,
    fifo_full_after: Option<usize>,
    samples: Option<Vec<u32>>,
    sync_byte: u8,
    fail_burst: bool,
    fail_write: Option<u16>,
    fail_gpio: bool,
    burst_reads: usize,
    afe: Level,
}

impl Default for SimState {
    fn default() -> Self {
        let mut regs = [0u8; REG_COUNT];
        regs[AD4080_REG_VENDOR_L as usize] = AD4080_VENDOR_ID.to_le_bytes()[0];
        regs[AD4080_REG_VENDOR_H as usize] = AD4080_VENDOR_ID.to_le_bytes()[1];
        let [wm_lo, wm_hi] = (AD4080_FIFO_DEPTH as u16).to_le_bytes();
        regs[AD4080_REG_FIFO_WATERMARK as usize] = wm_lo;
        regs[AD4080_REG_FIFO_WATERMARK as usize + 1] = wm_hi;
        Self {
            regs,
            writes: Vec::new(),
            addr_mode: AddressMode::Long,
            armed: false,
            polls_since_arm: 0,
            polls: 0,
            fifo_full_after: Some(0),
            samples: None,
            sync_byte: AD4080_FIFO_SYNC_BYTE,
            fail_burst: false,
            fail_write: None,
            fail_gpio: false,
            burst_reads: 0,
            afe: Level::Low,
        }
    }
}

impl SimState {
    fn reg(&self, addr: u16) -> Result<u8> {
        self.regs
            .get(addr as usize)
            .copied()
            .ok_or_else(|| Error::Transport(format!("no register at {addr:#06x}")))
    }

    fn store(&mut self, addr: u16, val: u8) -> Result<()> {
        if self.fail_write == Some(addr) {
            return Err(Error::Transport(format!("write to {addr:#06x} failed")));
        }
        let slot = self
            .regs
            .get_mut(addr as usize)
            .ok_or_else(|| Error::Transport(format!("no register at {addr:#06x}")))?;
        *slot = val;
        self.writes.push((addr, val));

        if addr == AD4080_REG_GENERAL_CONFIG {
            let armed = val & AD4080_FIFO_MODE_MSK != FifoMode::Disabled.bits();
            if armed && !self.armed {
                self.polls_since_arm = 0;
                self.regs[AD4080_REG_DEVICE_STATUS as usize] &=
                    !(AD4080_FIFO_FULL_MSK | AD4080_FIFO_READ_DONE_MSK);
            }
            self.armed = armed;
        }
        Ok(())
    }

    fn fifo_full(&mut self) -> bool {
        if !self.armed {
            return false;
        }
        let full = matches!(self.fifo_full_after, Some(n) if self.polls_since_arm >= n);
        self.polls_since_arm += 1;
        if full {
            self.regs[AD4080_REG_DEVICE_STATUS as usize] |= AD4080_FIFO_FULL_MSK;
        }
        full
    }

    fn drain(&mut self, count: usize) -> Vec<u8> {
        let words = count.saturating_sub(1).div_ceil(AD4080_SAMPLE_BYTES);
        let samples: Vec<u32> = match &self.samples {
            Some(s) if !s.is_empty() => (0..words).map(|i| s[i % s.len()]).collect(),
            _ => (0..words).map(sample_pattern).collect(),
        };
        let mut raw = fifo_image(&samples);
        raw[0] = self.sync_byte;
        raw.truncate(count);
        self.regs[AD4080_REG_DEVICE_STATUS as usize] |= AD4080_FIFO_READ_DONE_MSK;
        raw
    }
}

/// Shared handle on the simulated chip.
#[derive(Debug, Clone, Default)]
pub struct SimAd4080 {
    state: Arc<Mutex<SimState>>,
}

impl SimAd4080 {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn transport(&self) -> SimTransport {
        SimTransport(self.clone())
    }

    /// The host input wired to the AD4080 FIFO-full GPIO.
    pub fn fifo_full_signal(&self) -> SimSignal {
        SimSignal(self.clone())
    }

    pub fn afe_line(&self) -> SimAfe {
        SimAfe(self.clone())
    }

    pub fn reg(&self, addr: u16) -> u8 {
        self.state().regs.get(addr as usize).copied().unwrap_or(0)
    }

    /// Sets a register without logging a write.
    pub fn set_reg(&self, addr: u16, val: u8) {
        if let Some(slot) = self.state().regs.get_mut(addr as usize) {
            *slot = val;
        }
    }

    pub fn reg16(&self, addr: u16) -> u16 {
        u16::from_le_bytes([self.reg(addr), self.reg(addr + 1)])
    }

    pub fn fifo_mode(&self) -> FifoMode {
        FifoMode::from_bits(self.reg(AD4080_REG_GENERAL_CONFIG) & AD4080_FIFO_MODE_MSK)
            .unwrap_or(FifoMode::Disabled)
    }

    pub fn writes(&self) -> Vec<(u16, u8)> {
        self.state().writes.clone()
    }

    pub fn clear_writes(&self) {
        self.state().writes.clear();
    }

    pub fn address_mode(&self) -> AddressMode {
        self.state().addr_mode
    }

    /// The FIFO-full line reads low `polls` times after arming, then high.
    /// `None` keeps it low forever.
    pub fn fifo_full_after(&self, polls: Option<usize>) {
        self.state().fifo_full_after = polls;
    }

    /// Reads of the FIFO-full line since creation.
    pub fn polls(&self) -> usize {
        self.state().polls
    }

    pub fn burst_reads(&self) -> usize {
        self.state().burst_reads
    }

    /// Samples served by the FIFO drain, repeated as needed.
    pub fn set_samples(&self, samples: Vec<u32>) {
        self.state().samples = Some(samples);
    }

    pub fn set_sync_byte(&self, byte: u8) {
        self.state().sync_byte = byte;
    }

    pub fn fail_burst_read(&self, fail: bool) {
        self.state().fail_burst = fail;
    }

    pub fn fail_writes_to(&self, addr: Option<u16>) {
        self.state().fail_write = addr;
    }

    pub fn fail_gpio(&self, fail: bool) {
        self.state().fail_gpio = fail;
    }

    pub fn afe_level(&self) -> Level {
        self.state().afe
    }
}

pub struct SimTransport(SimAd4080);

impl RegisterTransport for SimTransport {
    fn read(&mut self, addr: u16) -> Result<u8> {
        self.0.state().reg(addr)
    }

    fn write(&mut self, addr: u16, val: u8) -> Result<()> {
        self.0.state().store(addr, val)
    }

    fn burst_read(&mut self, first_addr: u16, count: usize) -> Result<Vec<u8>> {
        let mut state = self.0.state();
        state.burst_reads += 1;
        if state.fail_burst {
            return Err(Error::Transport("burst read failed".into()));
        }
        if first_addr != AD4080_FIFO_DATA_ADDR {
            return (0..count)
                .map(|i| state.reg(first_addr + i as u16))
                .collect();
        }
        Ok(state.drain(count))
    }

    fn set_address_mode(&mut self, mode: AddressMode) {
        self.0.state().addr_mode = mode;
    }
}

pub struct SimSignal(SimAd4080);

impl GpioInput for SimSignal {
    fn read_level(&mut self) -> Result<Level> {
        let mut state = self.0.state();
        if state.fail_gpio {
            return Err(Error::Gpio("FIFO full line unreadable".into()));
        }
        state.polls += 1;
        Ok(Level::from(state.fifo_full()))
    }
}

pub struct SimAfe(SimAd4080);

impl GpioOutput for SimAfe {
    fn set_level(&mut self, level: Level) -> Result<()> {
        self.0.state().afe = level;
        Ok(())
    }

    fn level(&mut self) -> Result<Level> {
        Ok(self.0.state().afe)
    }
}
