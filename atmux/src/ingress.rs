//! Bounded byte FIFO between the interrupt producers and the dispatcher

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::pipe::Pipe;
use embassy_time::{Duration, Instant, with_deadline};

/// Byte ring: interrupt-safe producer, single consumer with bounded waits.
///
/// Bytes are consumed in the exact order they were produced. The producer
/// never blocks; on overflow the excess is dropped and the short count makes
/// the drop observable to the caller.
pub(crate) struct ByteRing<const N: usize> {
    pipe: Pipe<CriticalSectionRawMutex, N>,
}

impl<const N: usize> ByteRing<N> {
    pub const fn new() -> Self {
        Self { pipe: Pipe::new() }
    }

    /// Pushes bytes from interrupt context. Returns the number accepted.
    pub fn push_from_isr(&self, bytes: &[u8]) -> usize {
        self.pipe.try_write(bytes).unwrap_or(0)
    }

    /// Discards all buffered bytes.
    pub fn clear(&self) {
        self.pipe.clear();
    }

    /// Accumulates bytes into `out` until its tail equals `delim`, `out` is
    /// full, or the cumulative wait exceeds `timeout`.
    ///
    /// Returns the number of bytes accumulated; the delimiter, when found,
    /// is included. A timeout yields whatever arrived so far.
    pub async fn receive_until(&self, delim: &[u8], out: &mut [u8], timeout: Duration) -> usize {
        let deadline = Instant::now() + timeout;
        let mut total = 0;
        while total < out.len() {
            let mut byte = [0u8; 1];
            match with_deadline(deadline, self.pipe.read(&mut byte)).await {
                Ok(_) => {
                    out[total] = byte[0];
                    total += 1;
                }
                Err(_) => break,
            }
            if !delim.is_empty() && total >= delim.len() && &out[total - delim.len()..total] == delim
            {
                break;
            }
        }
        total
    }
}
