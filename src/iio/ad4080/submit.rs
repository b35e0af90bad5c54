use super::{IioAd4080, SampleSink};
use crate::transport::{GpioInput, RegisterTransport};
use crate::{Error, Result};
use ad4080_globals::ad4080::AD4080_STORAGE_BYTES;

impl<T: RegisterTransport, F: GpioInput> IioAd4080<T, F> {
    /// Fills `sink` with `samples` freshly acquired samples.
    ///
    /// Resizes the buffers if `samples` differs from the current watermark,
    /// runs one acquisition and copies the samples as little-endian 32-bit
    /// words. Either all samples reach the sink or none do.
    pub fn submit<S: SampleSink + ?Sized>(&mut self, samples: usize, sink: &mut S) -> Result<()> {
        self.prepare(samples, sink)?;
        self.immediate_trigger()?;
        self.push_samples(sink)
    }

    /// Async form of [`submit`](Self::submit).
    pub async fn submit_async<S: SampleSink + ?Sized>(
        &mut self,
        samples: usize,
        sink: &mut S,
    ) -> Result<()> {
        self.prepare(samples, sink)?;
        self.immediate_trigger_async().await?;
        self.push_samples(sink)
    }

    fn prepare<S: SampleSink + ?Sized>(&mut self, samples: usize, sink: &S) -> Result<()> {
        if samples != self.fifo.watermark() {
            log::debug!("host requested {samples} samples, resizing");
            self.set_watermark(samples)?;
        }
        let needed = samples * AD4080_STORAGE_BYTES;
        let available = sink.free_len();
        if needed > available {
            return Err(Error::SinkOverrun { needed, available });
        }
        Ok(())
    }

    fn push_samples<S: SampleSink + ?Sized>(&self, sink: &mut S) -> Result<()> {
        let bytes: Vec<u8> = self
            .fifo
            .formatted
            .iter()
            .flat_map(|s| s.to_le_bytes())
            .collect();
        sink.write(&bytes)
    }
}
