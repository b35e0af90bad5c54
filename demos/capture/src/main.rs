use ad4080_rs::config::Conf;
use ad4080_rs::iio::ad4080::{CircularBuffer, IioAd4080};
use ad4080_rs::sim::SimAd4080;
use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .filter_module("ad4080_rs::hardware", log::LevelFilter::Info)
        .init();

    // optional TOML config as first argument
    let conf = match std::env::args().nth(1) {
        Some(path) => Conf::load(path)?,
        None => Conf::defaults()?,
    };
    let params = conf.params()?;
    log::debug!("Params: {params:?}");

    let sim = SimAd4080::new();
    sim.fifo_full_after(Some(16));
    let mut adc = IioAd4080::init(
        sim.transport(),
        sim.fifo_full_signal(),
        Some(Box::new(sim.afe_line())),
        params,
    )?;

    for ch in adc.channels() {
        log::debug!("Channel {} {}: {:?}", ch.name, ch.channel, ch.scan_type);
    }
    for attr in ["scale", "offset", "filter_type", "oversampling_ratio", "afe_ctrl"] {
        log::debug!("{attr}: {}", adc.show_attr(attr)?.trim());
    }

    adc.store_attr("filter_type", "sinc5")?;
    adc.store_attr("oversampling_ratio", "16")?;
    log::debug!(
        "Oversampling: {} of [{}]",
        adc.show_attr("oversampling_ratio")?,
        adc.show_attr("oversampling_ratio_available")?
    );

    log::debug!("Raw: {}", adc.show_attr("raw")?);

    let samples = adc.watermark();
    let mut sink = CircularBuffer::new(4 * samples);
    adc.submit_async(samples, &mut sink).await?;

    let block = sink.read_samples(samples);
    log::debug!("Captured {} samples, first {:x?}", block.len(), &block[..block.len().min(8)]);

    adc.fini()?;
    Ok(())
}
