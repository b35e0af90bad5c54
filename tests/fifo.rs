mod common;

use crate::common::*;

use ad4080_rs::ad4080::*;
use ad4080_rs::{Error, Result};

#[test]
fn watermark_sizes_buffers() -> Result<()> {
    logging_init("fifo");

    let (sim, iio) = setup(100);

    assert_eq!(iio.watermark(), 100);
    assert_eq!(iio.fifo().raw().len(), 301);
    assert_eq!(iio.fifo().formatted().len(), 100);
    assert_eq!(iio.fifo().formatted_bytes(), 400);
    assert_eq!(sim.reg16(AD4080_REG_FIFO_WATERMARK), 100);
    assert_eq!(sim.fifo_mode(), FifoMode::Disabled);
    Ok(())
}

#[test]
fn set_watermark_disables_fifo_first() -> Result<()> {
    logging_init("fifo");

    let (sim, mut iio) = setup(100);
    iio.device().set_fifo_mode(FifoMode::ImmediateTrigger)?;
    sim.clear_writes();

    iio.set_watermark(AD4080_FIFO_DEPTH)?;

    let writes = sim.writes();
    assert_eq!(writes[0], (AD4080_REG_GENERAL_CONFIG, 0));
    assert_eq!(
        &writes[1..],
        &[
            (AD4080_REG_FIFO_WATERMARK, 0x00),
            (AD4080_REG_FIFO_WATERMARK + 1, 0x40)
        ]
    );
    assert_eq!(iio.fifo().raw().len(), 3 * AD4080_FIFO_DEPTH + 1);
    assert_eq!(iio.fifo().formatted().len(), AD4080_FIFO_DEPTH);
    assert_eq!(sim.fifo_mode(), FifoMode::Disabled);
    Ok(())
}

#[test]
fn out_of_range_watermark_touches_nothing() {
    logging_init("fifo");

    let (sim, mut iio) = setup(100);
    sim.clear_writes();

    for watermark in [0, AD4080_FIFO_DEPTH + 1] {
        let err = iio.set_watermark(watermark).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    assert!(sim.writes().is_empty());
    assert_eq!(iio.watermark(), 100);
    assert_eq!(iio.fifo().raw().len(), 301);
}

#[test]
fn failed_register_write_leaves_no_buffers() {
    logging_init("fifo");

    let (sim, mut iio) = setup(100);
    sim.fail_writes_to(Some(AD4080_REG_FIFO_WATERMARK));

    let err = iio.set_watermark(50).unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
    assert!(!iio.fifo().is_allocated());
    assert!(iio.fifo().raw().is_empty());
    assert!(iio.fifo().formatted().is_empty());

    let err = iio.immediate_trigger().unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));

    sim.fail_writes_to(None);
    iio.set_watermark(50).unwrap();
    assert_eq!(iio.fifo().raw().len(), 151);
}

#[test]
fn failed_high_byte_write_keeps_fifo_unusable() {
    logging_init("fifo");

    let (sim, mut iio) = setup(100);
    sim.fail_writes_to(Some(AD4080_REG_FIFO_WATERMARK + 1));

    let err = iio.set_watermark(300).unwrap_err();
    assert!(matches!(err, Error::Transport(_)));

    // new low byte, old high byte
    assert_eq!(sim.reg16(AD4080_REG_FIFO_WATERMARK), 0x2c);
    assert_eq!(iio.watermark(), 0);
    assert!(!iio.fifo().is_allocated());
    assert_eq!(sim.fifo_mode(), FifoMode::Disabled);
    assert!(matches!(
        iio.immediate_trigger(),
        Err(Error::InvalidArgument(_))
    ));
}

#[test]
fn release_is_repeatable() -> Result<()> {
    logging_init("fifo");

    let (sim, mut iio) = setup(100);

    iio.release()?;
    iio.release()?;
    assert_eq!(iio.watermark(), 0);
    assert!(!iio.fifo().is_allocated());
    assert_eq!(sim.fifo_mode(), FifoMode::Disabled);

    assert!(matches!(
        iio.immediate_trigger(),
        Err(Error::InvalidArgument(_))
    ));
    assert!(iio.show_attr("raw").is_err());

    iio.set_watermark(10)?;
    iio.immediate_trigger()?;
    assert_eq!(iio.fifo().formatted().len(), 10);
    Ok(())
}

#[test]
fn fini_hands_back_the_driver() -> Result<()> {
    logging_init("fifo");

    let (_sim, iio) = setup(16);
    let (mut dev, _ff_full) = iio.fini()?;

    assert_eq!(dev.fifo_mode()?, FifoMode::Disabled);
    assert_eq!(dev.fifo_watermark()?, 16);
    Ok(())
}
