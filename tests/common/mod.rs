/// This module has been created using mod.rs in a subfolder, instead of just creating a common.rs under tests
/// This is due to the test runner then not searching for runnable tests in mod.rs
/// https://doc.rust-lang.org/rust-by-example/testing/integration_testing.html
use ad4080_rs::config::{AcquisitionSettings, IioParams};
use ad4080_rs::iio::ad4080::IioAd4080;
use ad4080_rs::sim::{SimAd4080, SimSignal, SimTransport};
use std::time::Duration;

#[allow(dead_code)]
pub type SimIio = IioAd4080<SimTransport, SimSignal>;

pub fn logging_init(module: &str) {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Error)
        .filter_module(module, log::LevelFilter::Trace)
        .filter_module("ad4080_rs", log::LevelFilter::Debug)
        .try_init();
}

/// Parameters with a short poll timeout so failing acquisitions end quickly.
#[allow(dead_code)]
pub fn params(watermark: usize) -> IioParams {
    IioParams {
        watermark,
        settings: AcquisitionSettings {
            poll_timeout: Duration::from_millis(200),
            ..AcquisitionSettings::default()
        },
        ..IioParams::default()
    }
}

/// A simulated chip and an initialized descriptor without AFE control line.
#[allow(dead_code)]
pub fn setup(watermark: usize) -> (SimAd4080, SimIio) {
    let sim = SimAd4080::new();
    let iio = IioAd4080::init(
        sim.transport(),
        sim.fifo_full_signal(),
        None,
        params(watermark),
    )
    .unwrap();
    (sim, iio)
}

/// Like [`setup`], with the simulated AFE enable line attached.
#[allow(dead_code)]
pub fn setup_with_afe(watermark: usize) -> (SimAd4080, SimIio) {
    let sim = SimAd4080::new();
    let iio = IioAd4080::init(
        sim.transport(),
        sim.fifo_full_signal(),
        Some(Box::new(sim.afe_line())),
        params(watermark),
    )
    .unwrap();
    (sim, iio)
}
