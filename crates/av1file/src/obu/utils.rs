use std::io;

use bytes_util::BitReader;

use crate::error::{ContainerError, Result};

/// Reads a little-endian variable-length integer (AV1 spec 4.10.5).
///
/// Conforming bitstreams encode values `<= (1 << 32) - 1`; larger values
/// are rejected with [`ContainerError::Leb128Overflow`].
pub fn read_leb128<T: io::Read>(reader: &mut BitReader<T>) -> Result<u64> {
    let mut value = 0;
    for i in 0..8 {
        let byte = reader.read_bits(8)?;
        value |= (byte & 0x7f) << (i * 7);
        if byte & 0x80 == 0 {
            break;
        }
    }
    if value > u32::MAX as u64 {
        return Err(ContainerError::Leb128Overflow);
    }
    Ok(value)
}

/// Writes a little-endian variable-length integer (AV1 spec 4.10.5).
///
/// Returns the number of bytes written (1-8).
pub fn write_leb128<W: io::Write>(writer: &mut W, mut value: u64) -> io::Result<usize> {
    let mut bytes_written = 0;
    loop {
        let mut byte = (value & 0x7f) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        writer.write_all(&[byte])?;
        bytes_written += 1;
        if value == 0 {
            break;
        }
    }
    Ok(bytes_written)
}

/// Returns the number of bytes needed to encode `value` as LEB128.
pub fn leb128_size(mut value: u64) -> usize {
    let mut size = 1;
    while value >= 0x80 {
        value >>= 7;
        size += 1;
    }
    size
}

/// Reads a variable-length unsigned integer (AV1 spec 4.10.3).
pub fn read_uvlc<T: io::Read>(reader: &mut BitReader<T>) -> io::Result<u64> {
    let mut leading_zeros = 0;
    while !reader.read_bit()? {
        leading_zeros += 1;
    }

    if leading_zeros >= 32 {
        return Ok((1 << 32) - 1);
    }

    let value = reader.read_bits(leading_zeros)?;
    Ok(value + (1 << leading_zeros) - 1)
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_leb128_round_trip() {
        let values = [0, 1, 127, 128, 255, 16383, 16384, u32::MAX as u64];
        for value in values {
            let mut buf = Vec::new();
            let written = write_leb128(&mut buf, value).unwrap();
            assert_eq!(written, leb128_size(value), "size mismatch for {value}");

            let mut cursor = std::io::Cursor::new(buf);
            let mut reader = BitReader::new(&mut cursor);
            assert_eq!(read_leb128(&mut reader).unwrap(), value);
        }
    }

    #[test]
    fn test_leb128_rejects_values_above_u32_max() {
        // 5-byte encoding of u32::MAX + 1.
        let mut cursor = std::io::Cursor::new([0x80, 0x80, 0x80, 0x80, 0x10]);
        let mut reader = BitReader::new(&mut cursor);
        let err = read_leb128(&mut reader).unwrap_err();
        assert!(matches!(err, ContainerError::Leb128Overflow));
    }

    #[test]
    fn test_leb128_size() {
        assert_eq!(leb128_size(0), 1);
        assert_eq!(leb128_size(127), 1);
        assert_eq!(leb128_size(128), 2);
        assert_eq!(leb128_size(16383), 2);
        assert_eq!(leb128_size(16384), 3);
        assert_eq!(leb128_size(u32::MAX as u64), 5);
    }

    #[test]
    fn test_read_uvlc() {
        let mut cursor = std::io::Cursor::new([0x01, 0xff]);
        let mut reader = BitReader::new(&mut cursor);
        assert_eq!(read_uvlc(&mut reader).unwrap(), 0xfe);

        let mut cursor = std::io::Cursor::new([0x00, 0x00, 0x00, 0x00, 0x01]);
        let mut reader = BitReader::new(&mut cursor);
        assert_eq!(read_uvlc(&mut reader).unwrap(), (1 << 32) - 1);
    }
}
