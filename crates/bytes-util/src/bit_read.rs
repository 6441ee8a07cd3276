use std::io;

/// A reader that yields individual bits, most significant bit first.
///
/// Bytes are pulled from the underlying reader one at a time, so the
/// cursor of the inner reader always sits on the next unread byte once
/// the current byte is exhausted.
pub struct BitReader<R> {
    inner: R,
    current: u8,
    /// Number of bits of `current` already consumed (0..=8).
    bit_pos: u8,
}

impl<R: io::Read> BitReader<R> {
    /// Creates a new bit reader over the given reader.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            current: 0,
            bit_pos: 8,
        }
    }

    /// Reads a single bit.
    pub fn read_bit(&mut self) -> io::Result<bool> {
        if self.bit_pos == 8 {
            let mut byte = [0u8; 1];
            self.inner.read_exact(&mut byte)?;
            self.current = byte[0];
            self.bit_pos = 0;
        }

        let bit = (self.current >> (7 - self.bit_pos)) & 1;
        self.bit_pos += 1;
        Ok(bit == 1)
    }

    /// Reads `count` bits (up to 64) into the low bits of a `u64`.
    pub fn read_bits(&mut self, count: u8) -> io::Result<u64> {
        debug_assert!(count <= 64, "cannot read more than 64 bits at once");
        let mut value = 0u64;
        for _ in 0..count {
            value = (value << 1) | u64::from(self.read_bit()?);
        }
        Ok(value)
    }

    /// Returns `true` if the reader sits on a byte boundary.
    pub fn is_aligned(&self) -> bool {
        self.bit_pos == 8 || self.bit_pos == 0
    }

    /// Returns the underlying reader, discarding any partially read byte.
    pub fn into_inner(self) -> R {
        self.inner
    }
}
