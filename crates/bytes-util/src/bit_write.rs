use std::io;

/// A writer that accepts individual bits, most significant bit first.
///
/// Bits are accumulated into a byte and flushed to the underlying writer
/// once eight have been written. [`finish`](BitWriter::finish) flushes any
/// trailing partial byte (zero padded) and hands the inner writer back.
pub struct BitWriter<W> {
    inner: W,
    current: u8,
    /// Number of bits of `current` already filled (0..8).
    bit_pos: u8,
}

impl<W: io::Write> BitWriter<W> {
    /// Creates a new bit writer over the given writer.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            current: 0,
            bit_pos: 0,
        }
    }

    /// Writes a single bit.
    pub fn write_bit(&mut self, bit: bool) -> io::Result<()> {
        if bit {
            self.current |= 1 << (7 - self.bit_pos);
        }
        self.bit_pos += 1;

        if self.bit_pos == 8 {
            self.inner.write_all(&[self.current])?;
            self.current = 0;
            self.bit_pos = 0;
        }

        Ok(())
    }

    /// Writes the low `count` bits of `value`, most significant first.
    pub fn write_bits(&mut self, value: u64, count: u8) -> io::Result<()> {
        debug_assert!(count <= 64, "cannot write more than 64 bits at once");
        for i in (0..count).rev() {
            self.write_bit((value >> i) & 1 == 1)?;
        }
        Ok(())
    }

    /// Flushes any partial byte (zero padded) and returns the inner writer.
    pub fn finish(mut self) -> io::Result<W> {
        if self.bit_pos != 0 {
            self.inner.write_all(&[self.current])?;
        }
        Ok(self.inner)
    }
}
