use ad4080_globals::ad4080::{AD4080_FIFO_SYNC_BYTE, AD4080_SAMPLE_BYTES};

/// Unpacks a FIFO drain into 32-bit samples.
///
/// `raw` starts with the sync byte, followed by 24-bit big-endian words. Each
/// word is zero-extended into `out`. Decodes as many samples as both buffers
/// allow and returns that count.
pub fn decode_samples(raw: &[u8], out: &mut [u32]) -> usize {
    let Some((&sync, packed)) = raw.split_first() else {
        return 0;
    };
    if sync != AD4080_FIFO_SYNC_BYTE {
        log::warn!("FIFO sync byte {sync:#04x}, expected {AD4080_FIFO_SYNC_BYTE:#04x}");
    }

    let mut count = 0;
    for (dst, word) in out.iter_mut().zip(packed.chunks_exact(AD4080_SAMPLE_BYTES)) {
        *dst = u32::from_be_bytes([0, word[0], word[1], word[2]]);
        count += 1;
    }
    count
}
