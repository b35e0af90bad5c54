use crate::{Error, Result};

/// Capacity-bounded destination of acquired samples.
pub trait SampleSink {
    /// Bytes that can be written without overrunning unread data.
    fn free_len(&self) -> usize;

    /// Writes all of `data` or nothing.
    fn write(&mut self, data: &[u8]) -> Result<()>;
}

/// Fixed-size byte ring buffer.
#[derive(Debug)]
pub struct CircularBuffer {
    buf: Vec<u8>,
    read: usize,
    len: usize,
}

impl CircularBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: vec![0; capacity],
            read: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Unread bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Moves up to `out.len()` unread bytes into `out`.
    pub fn read(&mut self, out: &mut [u8]) -> usize {
        let n = out.len().min(self.len);
        let cap = self.capacity();
        for (i, dst) in out.iter_mut().take(n).enumerate() {
            *dst = self.buf[(self.read + i) % cap];
        }
        if n > 0 {
            self.read = (self.read + n) % cap;
            self.len -= n;
        }
        n
    }

    /// Reads whole little-endian 32-bit samples, at most `max`.
    pub fn read_samples(&mut self, max: usize) -> Vec<u32> {
        let count = max.min(self.len / 4);
        let mut bytes = vec![0u8; count * 4];
        self.read(&mut bytes);
        bytes
            .chunks_exact(4)
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect()
    }
}

impl SampleSink for CircularBuffer {
    fn free_len(&self) -> usize {
        self.capacity() - self.len
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        let available = self.free_len();
        if data.len() > available {
            return Err(Error::SinkOverrun {
                needed: data.len(),
                available,
            });
        }
        let cap = self.capacity();
        let start = (self.read + self.len) % cap.max(1);
        for (i, b) in data.iter().enumerate() {
            self.buf[(start + i) % cap] = *b;
        }
        self.len += data.len();
        Ok(())
    }
}
