use std::io;

use bytes::Bytes;

/// Zero-copy extraction helpers for `Cursor<Bytes>`.
///
/// The returned [`Bytes`] share the cursor's backing allocation instead of
/// copying the requested range.
pub trait BytesCursorExt {
    /// Extracts `size` bytes starting at the cursor position and advances
    /// the cursor past them.
    ///
    /// Fails with [`io::ErrorKind::UnexpectedEof`] if fewer than `size`
    /// bytes remain; the cursor is left unchanged in that case.
    fn extract_bytes(&mut self, size: usize) -> io::Result<Bytes>;

    /// Extracts all bytes from the cursor position to the end.
    fn extract_remaining(&mut self) -> Bytes;
}

impl BytesCursorExt for io::Cursor<Bytes> {
    fn extract_bytes(&mut self, size: usize) -> io::Result<Bytes> {
        let position = self.position() as usize;
        let end = position
            .checked_add(size)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "size overflows cursor"))?;

        if end > self.get_ref().len() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "not enough bytes remaining",
            ));
        }

        let bytes = self.get_ref().slice(position..end);
        self.set_position(end as u64);
        Ok(bytes)
    }

    fn extract_remaining(&mut self) -> Bytes {
        let position = (self.position() as usize).min(self.get_ref().len());
        let bytes = self.get_ref().slice(position..);
        self.set_position(self.get_ref().len() as u64);
        bytes
    }
}
