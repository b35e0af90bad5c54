use super::IioAd4080;
use crate::transport::{GpioInput, RegisterTransport};
use crate::{Error, Result};
use ad4080_globals::ad4080::{AD4080_FIFO_DEPTH, AD4080_SAMPLE_BYTES, AD4080_STORAGE_BYTES, FifoMode};

/// Raw and formatted sample buffers of one acquisition descriptor.
///
/// Either both buffers hold exactly `watermark` samples (the raw one plus the
/// leading sync byte) or both are empty and the watermark is 0.
#[derive(Debug, Default)]
pub struct FifoBuffers {
    watermark: usize,
    pub(crate) raw: Vec<u8>,
    pub(crate) formatted: Vec<u32>,
}

impl FifoBuffers {
    /// Raw drain length for `watermark` samples: packed samples plus sync byte.
    pub const fn raw_len_for(watermark: usize) -> usize {
        AD4080_SAMPLE_BYTES * watermark + 1
    }

    /// Allocates both buffers, failing without side effects.
    fn allocate(watermark: usize) -> Result<Self> {
        let raw_len = Self::raw_len_for(watermark);
        let mut raw = Vec::new();
        raw.try_reserve_exact(raw_len)
            .map_err(|_| Error::OutOfMemory { requested: raw_len })?;
        raw.resize(raw_len, 0);

        // `raw` drops on failure
        let mut formatted = Vec::new();
        formatted
            .try_reserve_exact(watermark)
            .map_err(|_| Error::OutOfMemory {
                requested: watermark * AD4080_STORAGE_BYTES,
            })?;
        formatted.resize(watermark, 0);

        Ok(Self {
            watermark,
            raw,
            formatted,
        })
    }

    pub fn watermark(&self) -> usize {
        self.watermark
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn formatted(&self) -> &[u32] {
        &self.formatted
    }

    /// Size of the formatted buffer in bytes.
    pub fn formatted_bytes(&self) -> usize {
        self.formatted.len() * AD4080_STORAGE_BYTES
    }

    pub fn is_allocated(&self) -> bool {
        self.watermark != 0
    }
}

impl<T: RegisterTransport, F: GpioInput> IioAd4080<T, F> {
    pub fn fifo(&self) -> &FifoBuffers {
        &self.fifo
    }

    pub fn watermark(&self) -> usize {
        self.fifo.watermark
    }

    /// Resizes the sample buffers to `watermark` samples and programs the
    /// device watermark register.
    ///
    /// The FIFO is disabled first. Out of range values fail before anything
    /// is touched. Any later failure leaves the descriptor without buffers.
    /// After a transport error the watermark register may hold a partial
    /// value, e.g. a new low byte next to the old high byte.
    pub fn set_watermark(&mut self, watermark: usize) -> Result<()> {
        self.ensure_idle()?;
        if watermark == 0 || watermark > AD4080_FIFO_DEPTH {
            log::error!("watermark {watermark} outside 1..={AD4080_FIFO_DEPTH}");
            return Err(Error::InvalidArgument("FIFO watermark"));
        }

        self.dev.set_fifo_mode(FifoMode::Disabled)?;
        self.fifo = FifoBuffers::default();

        let buffers = FifoBuffers::allocate(watermark)?;
        // bounded by AD4080_FIFO_DEPTH above
        self.dev.set_fifo_watermark(watermark as u16)?;
        self.fifo = buffers;

        log::debug!(
            "watermark {watermark}: raw {} bytes, formatted {} bytes",
            self.fifo.raw.len(),
            self.fifo.formatted_bytes()
        );
        Ok(())
    }

    /// Disables the FIFO and frees both buffers. Calling it again is a no-op
    /// apart from the FIFO mode write.
    pub fn release(&mut self) -> Result<()> {
        self.ensure_idle()?;
        let disabled = self.dev.set_fifo_mode(FifoMode::Disabled);
        self.fifo = FifoBuffers::default();
        log::debug!("FIFO buffers released");
        disabled
    }
}
