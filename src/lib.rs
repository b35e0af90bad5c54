//! Driver and IIO-style acquisition core for the Analog Devices [AD4080], a 20-bit,
//! 40 MSPS differential SAR ADC with a 16k-sample on-chip FIFO.
//!
//! [AD4080]: https://www.analog.com/en/products/ad4080.html
//!
//! ## Usage overview
//!
//! The crate is split in two layers:
//!
//! - [`hardware::ad4080::AD4080`] is the register-level chip driver. It talks to the
//!   converter through any [`transport::RegisterTransport`], for example a
//!   [`transport::SpiTransport`] wrapping an `embedded-hal` [`SpiDevice`](embedded_hal::spi::SpiDevice).
//! - [`iio::ad4080::IioAd4080`] sits on top of the driver. It owns the sample buffers,
//!   runs FIFO-triggered acquisitions against a FIFO-full input line and serves the
//!   string-keyed attributes (`raw`, `scale`, `fifo_mode`, `oversampling_ratio`, ...)
//!   an IIO daemon exposes to its clients.
//!
//! ```no_run
//! use ad4080_rs::config::IioParams;
//! use ad4080_rs::iio::ad4080::{CircularBuffer, IioAd4080};
//! use ad4080_rs::sim::SimAd4080;
//!
//! # fn main() -> ad4080_rs::Result<()> {
//! let sim = SimAd4080::new();
//! let mut adc = IioAd4080::init(
//!     sim.transport(),
//!     sim.fifo_full_signal(),
//!     None,
//!     IioParams::default(),
//! )?;
//!
//! let mut sink = CircularBuffer::new(4 * 1024);
//! adc.submit(1024, &mut sink)?;
//! println!("filter: {}", adc.show_attr("filter_type")?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Acquisition
//!
//! One acquisition arms the FIFO in immediate trigger mode, polls the FIFO-full line until
//! it asserts, drains `3 * watermark + 1` bytes in a single burst read and disables the FIFO
//! again. The FIFO is disabled on every exit path, including timeouts, transport failures,
//! cancellation through [`iio::ad4080::CancelToken`] and a dropped async future.
//!
//! ## Logging
//!
//! All modules log through the [`log`] facade. Register traffic is logged at `trace`,
//! acquisition steps at `debug`.

pub mod config;
pub mod hardware;
pub mod iio;
pub mod sim;
pub mod transport;

pub use ad4080_globals::*;
pub use ad4080_spi as spi;
