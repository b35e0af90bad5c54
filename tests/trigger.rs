mod common;

use crate::common::*;

use ad4080_rs::ad4080::*;
use ad4080_rs::config::AcquisitionSettings;
use ad4080_rs::iio::ad4080::AcquisitionState;
use ad4080_rs::sim::sample_pattern;
use ad4080_rs::{Error, Result};
use std::time::Duration;

fn fifo_mode_writes(writes: &[(u16, u8)]) -> Vec<u8> {
    writes
        .iter()
        .filter(|(addr, _)| *addr == AD4080_REG_GENERAL_CONFIG)
        .map(|(_, val)| val & AD4080_FIFO_MODE_MSK)
        .collect()
}

#[test]
fn acquisition_waits_for_fifo_full() -> Result<()> {
    logging_init("trigger");

    let (sim, mut iio) = setup(100);
    sim.fifo_full_after(Some(3));
    sim.clear_writes();
    let polls = sim.polls();

    iio.immediate_trigger()?;

    assert_eq!(sim.polls() - polls, 4);
    assert_eq!(sim.burst_reads(), 1);
    assert_eq!(
        fifo_mode_writes(&sim.writes()),
        vec![
            FifoMode::ImmediateTrigger.bits(),
            FifoMode::Disabled.bits()
        ]
    );
    assert_eq!(sim.fifo_mode(), FifoMode::Disabled);
    assert_eq!(iio.state(), AcquisitionState::Idle);

    assert_eq!(iio.fifo().raw()[0], AD4080_FIFO_SYNC_BYTE);
    let expected: Vec<u32> = (0..100).map(sample_pattern).collect();
    assert_eq!(iio.fifo().formatted(), expected.as_slice());
    Ok(())
}

#[test]
fn samples_are_zero_extended() -> Result<()> {
    logging_init("trigger");

    let (sim, mut iio) = setup(3);
    sim.set_samples(vec![0xf_ffff, 0, 0x8_0000]);

    iio.immediate_trigger()?;

    assert_eq!(iio.fifo().formatted(), &[0xf_ffff, 0, 0x8_0000]);
    Ok(())
}

#[test]
fn bad_sync_byte_still_decodes() -> Result<()> {
    logging_init("trigger");

    let (sim, mut iio) = setup(2);
    sim.set_samples(vec![0x1_2345]);
    sim.set_sync_byte(0x55);

    iio.immediate_trigger()?;

    assert_eq!(iio.fifo().raw()[0], 0x55);
    assert_eq!(iio.fifo().formatted(), &[0x1_2345, 0x1_2345]);
    Ok(())
}

#[test]
fn timeout_disarms() {
    logging_init("trigger");

    let (sim, mut iio) = setup(100);
    sim.fifo_full_after(None);
    iio.set_settings(AcquisitionSettings {
        poll_timeout: Duration::from_millis(20),
        poll_interval: Duration::from_micros(100),
        ..AcquisitionSettings::default()
    });

    let err = iio.immediate_trigger().unwrap_err();

    assert!(matches!(err, Error::Timeout(t) if t == Duration::from_millis(20)));
    assert_eq!(sim.fifo_mode(), FifoMode::Disabled);
    assert_eq!(sim.burst_reads(), 0);
    assert_eq!(iio.state(), AcquisitionState::Idle);
    assert!(iio.take_disarm_error().is_none());
}

#[test]
fn transport_failure_disarms() {
    logging_init("trigger");

    let (sim, mut iio) = setup(100);
    sim.fail_burst_read(true);

    let err = iio.immediate_trigger().unwrap_err();

    assert!(matches!(err, Error::Transport(_)));
    assert_eq!(sim.burst_reads(), 1);
    assert_eq!(sim.fifo_mode(), FifoMode::Disabled);
    assert_eq!(iio.state(), AcquisitionState::Idle);

    sim.fail_burst_read(false);
    iio.immediate_trigger().unwrap();
}

#[test]
fn gpio_failure_disarms() {
    logging_init("trigger");

    let (sim, mut iio) = setup(100);
    sim.fail_gpio(true);

    let err = iio.immediate_trigger().unwrap_err();

    assert!(matches!(err, Error::Gpio(_)));
    assert_eq!(sim.fifo_mode(), FifoMode::Disabled);
    assert_eq!(sim.burst_reads(), 0);
}

#[test]
fn failed_disarm_is_kept_aside() {
    logging_init("trigger");

    let (sim, mut iio) = setup(100);
    sim.fail_writes_to(Some(AD4080_REG_GENERAL_CONFIG));

    // arming fails first, the disarm behind it fails too
    let err = iio.immediate_trigger().unwrap_err();

    assert!(matches!(err, Error::Transport(_)));
    assert!(matches!(iio.take_disarm_error(), Some(Error::Transport(_))));
    assert!(iio.take_disarm_error().is_none());
    assert_eq!(iio.state(), AcquisitionState::Idle);
    assert_eq!(sim.burst_reads(), 0);
}

#[test]
fn stale_cancel_does_not_abort_next_acquisition() -> Result<()> {
    logging_init("trigger");

    let (sim, mut iio) = setup(8);
    sim.fifo_full_after(Some(1));
    let token = iio.cancel_token();

    iio.immediate_trigger()?;
    token.cancel();
    let polls = sim.polls();

    iio.immediate_trigger()?;

    assert!(sim.polls() > polls);
    assert!(!token.is_cancelled());
    assert_eq!(sim.burst_reads(), 2);
    assert_eq!(sim.fifo_mode(), FifoMode::Disabled);
    Ok(())
}

#[test]
fn cancel_from_another_thread() {
    logging_init("trigger");

    let (sim, mut iio) = setup(100);
    sim.fifo_full_after(None);
    iio.set_settings(AcquisitionSettings {
        poll_timeout: Duration::from_secs(10),
        poll_interval: Duration::from_micros(200),
        ..AcquisitionSettings::default()
    });
    let token = iio.cancel_token();

    let canceller = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(20));
        token.cancel();
    });
    let err = iio.immediate_trigger().unwrap_err();
    canceller.join().unwrap();

    assert!(matches!(err, Error::Cancelled));
    assert!(sim.polls() > 0);
    assert_eq!(sim.fifo_mode(), FifoMode::Disabled);
    assert_eq!(iio.state(), AcquisitionState::Idle);
}

#[test]
fn repeated_acquisitions() -> Result<()> {
    logging_init("trigger");

    let (sim, mut iio) = setup(8);
    sim.fifo_full_after(Some(1));

    for _ in 0..5 {
        iio.immediate_trigger()?;
        assert_eq!(sim.fifo_mode(), FifoMode::Disabled);
    }
    assert_eq!(sim.burst_reads(), 5);
    Ok(())
}
