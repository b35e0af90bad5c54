use crate::instruction::Instruction;
use crate::{AD4080_SPI_MAX_PAYLOAD, AddressMode};
use ad4080_globals::{Error, Result};
use std::fmt::{Debug, Display, Formatter};

/// A complete full-duplex SPI access: instruction phase followed by the data
/// phase. The same buffer is clocked out and overwritten by the bytes clocked
/// in, so after the transfer the data phase of a read frame holds the
/// register contents.
///
/// ```text
/// +-------------------+---------------------------------------------+
/// |  Byte offset      |  Description                                |
/// +-------------------+---------------------------------------------+
/// |  0                |  R/W bit [7], address [14:8] (long mode)    |
/// |                   |  R/W bit [7], address [6:0]  (short mode)   |
/// +-------------------+---------------------------------------------+
/// |  1 (long only)    |  address [7:0]                              |
/// +-------------------+---------------------------------------------+
/// |  2.. / 1..        |  data phase, one byte per register          |
/// +-------------------+---------------------------------------------+
/// ```
pub struct SpiFrame {
    buf: Vec<u8>,
    instruction: Instruction,
}

impl SpiFrame {
    /// A read of `len` consecutive bytes starting at `addr`.
    pub fn new_read(mode: AddressMode, addr: u16, len: usize) -> Result<Self> {
        Self::check_len(len)?;
        let instruction = Instruction::read(mode, addr)?;
        let mut buf = Vec::new();
        let total = instruction.encoded_len() + len;
        buf.try_reserve_exact(total)
            .map_err(|_| Error::OutOfMemory { requested: total })?;
        buf.resize(total, 0);
        instruction.encode_into(&mut buf);
        Ok(Self { buf, instruction })
    }

    /// A write of `data` to consecutive registers starting at `addr`.
    pub fn new_write(mode: AddressMode, addr: u16, data: &[u8]) -> Result<Self> {
        Self::check_len(data.len())?;
        let instruction = Instruction::write(mode, addr)?;
        let mut buf = instruction.encode();
        buf.extend_from_slice(data);
        Ok(Self { buf, instruction })
    }

    /// Rebuilds a frame from a buffer, e.g. one returned by a transfer.
    pub fn from_vec(mode: AddressMode, buf: Vec<u8>) -> Result<Self> {
        let instruction = Instruction::decode(mode, &buf)?;
        Ok(Self { buf, instruction })
    }

    fn check_len(len: usize) -> Result<()> {
        if len == 0 || len > AD4080_SPI_MAX_PAYLOAD {
            return Err(Error::InvalidArgument("SPI data phase length"));
        }
        Ok(())
    }

    pub fn instruction(&self) -> Instruction {
        self.instruction
    }

    pub fn addr(&self) -> u16 {
        self.instruction.addr()
    }

    pub fn is_read(&self) -> bool {
        self.instruction.is_read()
    }

    fn idx_data(&self) -> usize {
        self.instruction.encoded_len()
    }

    pub fn payload(&self) -> &[u8] {
        &self.buf[self.idx_data()..]
    }

    /// Whole frame as clocked on the bus.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        self.buf.as_mut_slice()
    }

    /// Consumes the frame and returns only the data phase.
    pub fn into_payload(mut self) -> Vec<u8> {
        let idx = self.idx_data();
        self.buf.drain(..idx);
        self.buf
    }

    pub fn buf_ptr(&self) -> *const u8 {
        self.buf.as_ptr()
    }
}

impl From<SpiFrame> for Vec<u8> {
    fn from(value: SpiFrame) -> Self {
        value.buf
    }
}

impl Debug for SpiFrame {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let payload = self.payload();
        f.debug_struct("SpiFrame")
            .field("instruction", &self.instruction)
            .field("len", &payload.len())
            .field("data", &format_args!("{:02x?}", &payload[..payload.len().min(8)]))
            .finish()
    }
}

impl Display for SpiFrame {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("[")?;
        for elem in self.buf.iter() {
            f.write_fmt(format_args!("{elem:02x} "))?;
        }
        f.write_str("]")?;
        Ok(())
    }
}
