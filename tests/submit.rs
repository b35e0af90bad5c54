mod common;

use crate::common::*;

use ad4080_rs::ad4080::*;
use ad4080_rs::config::AcquisitionSettings;
use ad4080_rs::iio::ad4080::{AcquisitionState, CircularBuffer, SampleSink};
use ad4080_rs::sim::sample_pattern;
use ad4080_rs::{Error, Result};
use std::time::Duration;

#[test]
fn submit_fills_sink() -> Result<()> {
    logging_init("submit");

    let (sim, mut iio) = setup(100);
    sim.fifo_full_after(Some(3));
    let mut sink = CircularBuffer::new(400);

    iio.submit(100, &mut sink)?;

    assert_eq!(iio.fifo().raw().len(), 301);
    assert_eq!(sink.len(), 400);
    assert_eq!(sink.free_len(), 0);
    let expected: Vec<u32> = (0..100).map(sample_pattern).collect();
    assert_eq!(sink.read_samples(100), expected);
    assert_eq!(sim.fifo_mode(), FifoMode::Disabled);
    Ok(())
}

#[test]
fn submit_resizes_to_requested_count() -> Result<()> {
    logging_init("submit");

    let (sim, mut iio) = setup(100);
    let mut sink = CircularBuffer::new(4096);

    iio.submit(10, &mut sink)?;

    assert_eq!(iio.watermark(), 10);
    assert_eq!(sim.reg16(AD4080_REG_FIFO_WATERMARK), 10);
    assert_eq!(sink.len(), 40);

    // same count again keeps the buffers
    sim.clear_writes();
    iio.submit(10, &mut sink)?;
    assert!(
        !sim
            .writes()
            .iter()
            .any(|(addr, _)| *addr == AD4080_REG_FIFO_WATERMARK)
    );
    assert_eq!(sink.len(), 80);
    Ok(())
}

#[test]
fn small_sink_is_rejected_before_acquiring() {
    logging_init("submit");

    let (sim, mut iio) = setup(100);
    let mut sink = CircularBuffer::new(399);

    let err = iio.submit(100, &mut sink).unwrap_err();

    assert!(matches!(
        err,
        Error::SinkOverrun {
            needed: 400,
            available: 399
        }
    ));
    assert_eq!(sim.burst_reads(), 0);
    assert!(sink.is_empty());
}

#[test]
fn failed_submit_leaves_fifo_disabled_and_sink_empty() {
    logging_init("submit");

    let (sim, mut iio) = setup(100);
    iio.set_settings(AcquisitionSettings {
        poll_timeout: Duration::from_millis(10),
        ..AcquisitionSettings::default()
    });
    let mut sink = CircularBuffer::new(400);

    sim.fifo_full_after(None);
    let err = iio.submit(100, &mut sink).unwrap_err();
    assert!(matches!(err, Error::Timeout(_)));
    assert_eq!(sim.fifo_mode(), FifoMode::Disabled);

    sim.fifo_full_after(Some(0));
    sim.fail_burst_read(true);
    let err = iio.submit(100, &mut sink).unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
    assert_eq!(sim.fifo_mode(), FifoMode::Disabled);

    assert!(sink.is_empty());
}

#[test]
fn invalid_count_is_rejected() {
    logging_init("submit");

    let (_sim, mut iio) = setup(100);
    let mut sink = CircularBuffer::new(1 << 20);

    for count in [0, AD4080_FIFO_DEPTH + 1] {
        let err = iio.submit(count, &mut sink).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }
    assert_eq!(iio.watermark(), 100);
}

#[tokio::test]
async fn submit_async_fills_sink() -> Result<()> {
    logging_init("submit");

    let (sim, mut iio) = setup(64);
    sim.fifo_full_after(Some(5));
    iio.set_settings(AcquisitionSettings {
        poll_interval: Duration::from_micros(100),
        ..AcquisitionSettings::default()
    });
    let mut sink = CircularBuffer::new(256);

    iio.submit_async(64, &mut sink).await?;

    let expected: Vec<u32> = (0..64).map(sample_pattern).collect();
    assert_eq!(sink.read_samples(64), expected);
    assert_eq!(sim.fifo_mode(), FifoMode::Disabled);
    Ok(())
}

#[tokio::test]
async fn dropped_submit_disarms() -> Result<()> {
    logging_init("submit");

    let (sim, mut iio) = setup(100);
    sim.fifo_full_after(None);
    iio.set_settings(AcquisitionSettings {
        poll_timeout: Duration::from_secs(10),
        poll_interval: Duration::from_millis(1),
        ..AcquisitionSettings::default()
    });
    let mut sink = CircularBuffer::new(400);

    let res = tokio::time::timeout(
        Duration::from_millis(30),
        iio.submit_async(100, &mut sink),
    )
    .await;

    assert!(res.is_err());
    assert!(sim.polls() > 0);
    assert_eq!(sim.fifo_mode(), FifoMode::Disabled);
    assert_eq!(iio.state(), AcquisitionState::Idle);
    assert!(sink.is_empty());

    sim.fifo_full_after(Some(0));
    iio.submit_async(100, &mut sink).await?;
    assert_eq!(sink.len(), 400);
    Ok(())
}

#[tokio::test]
async fn leaked_acquisition_keeps_descriptor_busy() {
    logging_init("submit");

    let (sim, mut iio) = setup(100);
    sim.fifo_full_after(None);
    iio.set_settings(AcquisitionSettings {
        poll_timeout: Duration::from_secs(10),
        poll_interval: Duration::from_millis(1),
        ..AcquisitionSettings::default()
    });

    let mut acquisition = Box::pin(iio.immediate_trigger_async());
    let res = tokio::time::timeout(Duration::from_millis(10), &mut acquisition).await;
    assert!(res.is_err());
    std::mem::forget(acquisition);

    assert_eq!(iio.state(), AcquisitionState::Polling);
    assert!(matches!(iio.set_watermark(10), Err(Error::Busy)));
    assert!(matches!(iio.release(), Err(Error::Busy)));
    assert!(matches!(iio.immediate_trigger(), Err(Error::Busy)));
    assert_eq!(sim.fifo_mode(), FifoMode::ImmediateTrigger);
}
