use super::{AcquisitionState, AtomicAcquisitionState, IioAd4080, decode_samples};
use crate::config::AcquisitionSettings;
use crate::hardware::ad4080::AD4080;
use crate::transport::{GpioInput, RegisterTransport};
use crate::{Error, Level, Result};
use ad4080_globals::ad4080::FifoMode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Shared flag that stops an acquisition at its next poll.
///
/// A cancel only reaches the acquisition in flight. The flag is cleared each
/// time a new acquisition claims the descriptor.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Holds the FIFO armed. Dropping it unfinished disarms.
pub(crate) struct Armed<'a, T: RegisterTransport> {
    dev: &'a mut AD4080<T>,
    state: &'a AtomicAcquisitionState,
    disarmed: bool,
}

impl<'a, T: RegisterTransport> Armed<'a, T> {
    /// Claims the descriptor. Fails with `Busy` if an acquisition is already
    /// in flight.
    fn claim(dev: &'a mut AD4080<T>, state: &'a AtomicAcquisitionState) -> Result<Self> {
        state
            .compare_exchange(
                AcquisitionState::Idle,
                AcquisitionState::Armed,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map_err(|_| Error::Busy)?;
        Ok(Self {
            dev,
            state,
            disarmed: false,
        })
    }

    fn arm(&mut self) -> Result<()> {
        self.dev.set_fifo_mode(FifoMode::ImmediateTrigger)?;
        self.state.store(AcquisitionState::Polling, Ordering::Release);
        log::debug!("FIFO armed, immediate trigger");
        Ok(())
    }

    fn dev(&mut self) -> &mut AD4080<T> {
        self.dev
    }

    fn disarm(&mut self) -> Result<()> {
        self.disarmed = true;
        let res = self.dev.set_fifo_mode(FifoMode::Disabled);
        self.state.store(AcquisitionState::Idle, Ordering::Release);
        log::debug!("FIFO disarmed");
        res
    }

    /// Disarms and merges the disarm result into `outcome`. A disarm failure
    /// behind another error goes to `shadowed` instead of the return value.
    fn finish(mut self, outcome: Result<()>, shadowed: &mut Option<Error>) -> Result<()> {
        let disarm = self.disarm();
        match (outcome, disarm) {
            (Ok(()), disarm) => disarm,
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(d)) => {
                log::error!("disarm after failed acquisition: {d}");
                *shadowed = Some(d);
                Err(e)
            }
        }
    }
}

impl<T: RegisterTransport> Drop for Armed<'_, T> {
    fn drop(&mut self) {
        if !self.disarmed {
            log::warn!("acquisition abandoned while armed");
            if let Err(e) = self.disarm() {
                log::error!("disarm of abandoned acquisition: {e}");
            }
        }
    }
}

/// One look at the FIFO-full line. `Ok(true)` once it is high.
fn poll_once<F: GpioInput>(
    ff_full: &mut F,
    cancel: &CancelToken,
    deadline: Instant,
    timeout: Duration,
) -> Result<bool> {
    if cancel.is_cancelled() {
        log::debug!("acquisition cancelled");
        return Err(Error::Cancelled);
    }
    if ff_full.read_level()? == Level::High {
        return Ok(true);
    }
    if Instant::now() >= deadline {
        log::error!("FIFO full not signaled within {timeout:?}");
        return Err(Error::Timeout(timeout));
    }
    Ok(false)
}

fn wait_fifo_full<F: GpioInput>(
    ff_full: &mut F,
    cancel: &CancelToken,
    settings: &AcquisitionSettings,
) -> Result<()> {
    let deadline = Instant::now() + settings.poll_timeout;
    let mut polls = 0usize;
    while !poll_once(ff_full, cancel, deadline, settings.poll_timeout)? {
        polls += 1;
        if settings.poll_interval.is_zero() {
            std::hint::spin_loop();
        } else {
            std::thread::sleep(settings.poll_interval);
        }
    }
    log::trace!("FIFO full after {polls} polls");
    Ok(())
}

async fn wait_fifo_full_async<F: GpioInput>(
    ff_full: &mut F,
    cancel: &CancelToken,
    settings: &AcquisitionSettings,
) -> Result<()> {
    let deadline = Instant::now() + settings.poll_timeout;
    let mut polls = 0usize;
    while !poll_once(ff_full, cancel, deadline, settings.poll_timeout)? {
        polls += 1;
        if settings.poll_interval.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(settings.poll_interval).await;
        }
    }
    log::trace!("FIFO full after {polls} polls");
    Ok(())
}

fn drain<T: RegisterTransport>(armed: &mut Armed<'_, T>, raw: &mut [u8]) -> Result<()> {
    let data = armed.dev().read_fifo(raw.len())?;
    raw.copy_from_slice(&data);
    Ok(())
}

impl<T: RegisterTransport, F: GpioInput> IioAd4080<T, F> {
    /// Runs one acquisition of `watermark` samples into the formatted buffer.
    ///
    /// Arms the FIFO, waits for the FIFO-full line, drains the FIFO and
    /// disarms. The FIFO is disabled again on every exit path.
    pub fn immediate_trigger(&mut self) -> Result<()> {
        if !self.fifo.is_allocated() {
            return Err(Error::InvalidArgument("no FIFO buffers allocated"));
        }
        let mut armed = Armed::claim(&mut self.dev, &self.state)?;
        self.cancel.reset();
        let outcome = armed
            .arm()
            .and_then(|_| wait_fifo_full(&mut self.ff_full, &self.cancel, &self.settings))
            .and_then(|_| drain(&mut armed, &mut self.fifo.raw));
        let res = armed.finish(outcome, &mut self.last_disarm_error);
        self.complete(res)
    }

    /// [`immediate_trigger`](Self::immediate_trigger) yielding to the runtime
    /// between polls. Dropping the future mid-poll disarms the FIFO.
    pub async fn immediate_trigger_async(&mut self) -> Result<()> {
        if !self.fifo.is_allocated() {
            return Err(Error::InvalidArgument("no FIFO buffers allocated"));
        }
        let mut armed = Armed::claim(&mut self.dev, &self.state)?;
        self.cancel.reset();
        let mut outcome = armed.arm();
        if outcome.is_ok() {
            outcome = wait_fifo_full_async(&mut self.ff_full, &self.cancel, &self.settings).await;
        }
        let outcome = outcome.and_then(|_| drain(&mut armed, &mut self.fifo.raw));
        let res = armed.finish(outcome, &mut self.last_disarm_error);
        self.complete(res)
    }

    fn complete(&mut self, res: Result<()>) -> Result<()> {
        res?;
        let n = decode_samples(&self.fifo.raw, &mut self.fifo.formatted);
        log::debug!("acquired {n} samples");
        Ok(())
    }
}
