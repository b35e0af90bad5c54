//! SPI framing for the AD4080 configuration interface.
//!
//! Every access starts with an instruction phase: the R/W bit followed by the
//! register address, 16 bits wide in long instruction mode and 8 bits wide in
//! short instruction mode. The data phase follows immediately. Streaming
//! accesses keep clocking data bytes after the first one while the device
//! walks the address.

pub mod frame;
pub mod instruction;

pub use ad4080_globals::AddressMode;
use ad4080_globals::ad4080::{AD4080_FIFO_DEPTH, AD4080_SAMPLE_BYTES};

/// R/W bit of the first instruction byte. Set for reads.
pub const AD4080_SPI_READ: u8 = 1 << 7;

/// Upper bound for one streaming transfer, FIFO drain included.
pub const AD4080_SPI_MAX_PAYLOAD: usize = AD4080_SAMPLE_BYTES * AD4080_FIFO_DEPTH + 1;
