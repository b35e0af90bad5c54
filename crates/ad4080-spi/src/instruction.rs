use crate::{AD4080_SPI_READ, AddressMode};
use ad4080_globals::{Error, Result};
use std::fmt::{Debug, Formatter};

/// Instruction phase of one SPI access.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    mode: AddressMode,
    read: bool,
    addr: u16,
}

impl Instruction {
    pub fn read(mode: AddressMode, addr: u16) -> Result<Self> {
        Self::new(mode, true, addr)
    }

    pub fn write(mode: AddressMode, addr: u16) -> Result<Self> {
        Self::new(mode, false, addr)
    }

    fn new(mode: AddressMode, read: bool, addr: u16) -> Result<Self> {
        if addr > mode.max_addr() {
            log::error!("address {addr:#06x} not reachable in {mode:?} instruction mode");
            return Err(Error::InvalidArgument("register address out of range"));
        }
        Ok(Self { mode, read, addr })
    }

    pub fn mode(&self) -> AddressMode {
        self.mode
    }

    pub fn is_read(&self) -> bool {
        self.read
    }

    pub fn addr(&self) -> u16 {
        self.addr
    }

    pub fn encoded_len(&self) -> usize {
        self.mode.instruction_len()
    }

    /// Writes the instruction bytes to the front of `buf`.
    pub fn encode_into(&self, buf: &mut [u8]) {
        let rw = if self.read { AD4080_SPI_READ } else { 0 };
        match self.mode {
            AddressMode::Long => {
                buf[0] = rw | ((self.addr >> 8) as u8 & !AD4080_SPI_READ);
                buf[1] = self.addr as u8;
            }
            AddressMode::Short => {
                buf[0] = rw | (self.addr as u8 & !AD4080_SPI_READ);
            }
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = vec![0u8; self.encoded_len()];
        self.encode_into(&mut buf);
        buf
    }

    pub fn decode(mode: AddressMode, buf: &[u8]) -> Result<Self> {
        if buf.len() < mode.instruction_len() {
            return Err(Error::InvalidArgument("instruction truncated"));
        }
        let read = buf[0] & AD4080_SPI_READ != 0;
        let addr = match mode {
            AddressMode::Long => u16::from_be_bytes([buf[0] & !AD4080_SPI_READ, buf[1]]),
            AddressMode::Short => (buf[0] & !AD4080_SPI_READ) as u16,
        };
        Ok(Self { mode, read, addr })
    }
}

impl Debug for Instruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instruction")
            .field("mode", &self.mode)
            .field("op", &if self.read { "READ" } else { "WRITE" })
            .field("addr", &format_args!("{:#06x}", self.addr))
            .finish()
    }
}
