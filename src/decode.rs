use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::cursor::Cursor;
use crate::error::DecodeError;

/// Widest integer read the instruction set accepts. Reads wider than 8
/// bytes only verify the continuation bytes; the value itself still has
/// to fit in 64 bits.
pub(crate) const MAX_INT_SIZE: usize = 16;

/// Decodes a `size`-byte integer at the cursor.
///
/// Signed reads narrower than 64 bits are sign-extended; unsigned
/// 8-byte reads wrap into two's-complement `i64`. For sizes in 9..=16
/// the low 8 bytes form the value and every higher-order byte must equal
/// the continuation pattern (0x00 for unsigned or non-negative, 0xFF for
/// negative signed), otherwise the value does not fit and the read fails
/// with `IntegerOverflow`.
pub(crate) fn unpack_int(
    cur: &mut Cursor<'_>,
    little: bool,
    size: usize,
    signed: bool,
    advance: bool,
) -> Result<i64, DecodeError> {
    debug_assert!((1..=MAX_INT_SIZE).contains(&size));
    let bytes = cur.peek(size)?;

    let value = if size <= 8 {
        match (signed, little) {
            (true, true) => LittleEndian::read_int(bytes, size),
            (true, false) => BigEndian::read_int(bytes, size),
            (false, true) => LittleEndian::read_uint(bytes, size) as i64,
            (false, false) => BigEndian::read_uint(bytes, size) as i64,
        }
    } else {
        // The 8 low-order bytes sit at the front in little-endian order
        // and at the back in big-endian order.
        let (low, high) = if little {
            (&bytes[..8], &bytes[8..])
        } else {
            (&bytes[size - 8..], &bytes[..size - 8])
        };
        let value = if little {
            LittleEndian::read_u64(low) as i64
        } else {
            BigEndian::read_u64(low) as i64
        };
        let fill = if signed && value < 0 { 0xFF } else { 0x00 };
        if high.iter().any(|&b| b != fill) {
            return Err(DecodeError::IntegerOverflow { size });
        }
        value
    };

    if advance {
        cur.move_by(size as i64)?;
    }
    Ok(value)
}

pub(crate) fn unpack_f32(
    cur: &mut Cursor<'_>,
    little: bool,
    advance: bool,
) -> Result<f64, DecodeError> {
    let bytes = cur.peek(4)?;
    let v = if little {
        LittleEndian::read_f32(bytes)
    } else {
        BigEndian::read_f32(bytes)
    };
    if advance {
        cur.move_by(4)?;
    }
    Ok(v as f64)
}

pub(crate) fn unpack_f64(
    cur: &mut Cursor<'_>,
    little: bool,
    advance: bool,
) -> Result<f64, DecodeError> {
    let bytes = cur.peek(8)?;
    let v = if little {
        LittleEndian::read_f64(bytes)
    } else {
        BigEndian::read_f64(bytes)
    };
    if advance {
        cur.move_by(8)?;
    }
    Ok(v)
}

/// Reads up to the next NUL byte; the terminator is consumed (when
/// advancing) but not part of the returned bytes.
pub(crate) fn read_zstring(cur: &mut Cursor<'_>, advance: bool) -> Result<Vec<u8>, DecodeError> {
    let n = cur.find_nul()?;
    let bytes = cur.peek(n)?.to_vec();
    if advance {
        cur.move_by(n as i64 + 1)?;
    }
    Ok(bytes)
}

/// Reads an unsigned length header of `header` bytes (1, 2 or 4), then
/// that many payload bytes.
pub(crate) fn read_lstring(
    cur: &mut Cursor<'_>,
    little: bool,
    header: usize,
    advance: bool,
) -> Result<Vec<u8>, DecodeError> {
    debug_assert!(matches!(header, 1 | 2 | 4));
    let hdr = cur.peek(header)?;
    let len = if little {
        LittleEndian::read_uint(hdr, header)
    } else {
        BigEndian::read_uint(hdr, header)
    } as usize;

    let all = cur.peek(header + len)?;
    let payload = all[header..].to_vec();
    if advance {
        cur.move_by((header + len) as i64)?;
    }
    Ok(payload)
}

/// Reads exactly `len` bytes.
pub(crate) fn read_fixed(
    cur: &mut Cursor<'_>,
    len: usize,
    advance: bool,
) -> Result<Vec<u8>, DecodeError> {
    let bytes = cur.peek(len)?.to_vec();
    if advance {
        cur.move_by(len as i64)?;
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn sign_extension() {
        let data = [0xFFu8, 0xFF];
        let mut cur = Cursor::new(&data);
        assert_eq!(unpack_int(&mut cur, true, 2, true, false).unwrap(), -1);
        assert_eq!(unpack_int(&mut cur, true, 2, false, false).unwrap(), 0xFFFF);
    }

    #[test]
    fn endianness() {
        let data = [0x01u8, 0x02, 0x03, 0x04];
        let mut cur = Cursor::new(&data);
        assert_eq!(
            unpack_int(&mut cur, true, 4, false, false).unwrap(),
            0x0403_0201
        );
        assert_eq!(
            unpack_int(&mut cur, false, 4, false, false).unwrap(),
            0x0102_0304
        );
    }

    #[test]
    fn advance_is_optional() {
        let data = [7u8, 0, 0, 0];
        let mut cur = Cursor::new(&data);
        assert_eq!(unpack_int(&mut cur, true, 4, false, false).unwrap(), 7);
        assert_eq!(cur.offset(), 0);
        assert_eq!(unpack_int(&mut cur, true, 4, false, true).unwrap(), 7);
        assert_eq!(cur.offset(), 4);
    }

    #[test]
    fn unsigned_full_width_wraps() {
        let data = [0xFFu8; 8];
        let mut cur = Cursor::new(&data);
        assert_eq!(unpack_int(&mut cur, true, 8, false, false).unwrap(), -1);
    }

    #[test]
    fn wide_read_checks_continuation_bytes() {
        // 16-byte little-endian: value 5 in the low bytes, zero padding.
        let mut data = [0u8; 16];
        data[0] = 5;
        let mut cur = Cursor::new(&data);
        assert_eq!(unpack_int(&mut cur, true, 16, false, false).unwrap(), 5);

        // Negative signed with 0xFF padding is still -2.
        let mut data = [0xFFu8; 16];
        data[0] = 0xFE;
        let mut cur = Cursor::new(&data);
        assert_eq!(unpack_int(&mut cur, true, 16, true, false).unwrap(), -2);

        // Same bytes read unsigned do not fit.
        let mut cur = Cursor::new(&data);
        assert!(matches!(
            unpack_int(&mut cur, true, 16, false, false),
            Err(DecodeError::IntegerOverflow { size: 16 })
        ));
    }

    #[test]
    fn wide_read_big_endian() {
        let mut data = [0u8; 12];
        data[11] = 9; // low-order byte at the back
        let mut cur = Cursor::new(&data);
        assert_eq!(unpack_int(&mut cur, false, 12, false, false).unwrap(), 9);

        data[0] = 1; // continuation byte mismatch
        let mut cur = Cursor::new(&data);
        assert!(matches!(
            unpack_int(&mut cur, false, 12, false, false),
            Err(DecodeError::IntegerOverflow { size: 12 })
        ));
    }

    #[test]
    fn floats_both_endiannesses() {
        let le = 1.5f32.to_le_bytes();
        let mut cur = Cursor::new(&le);
        assert_eq!(unpack_f32(&mut cur, true, true).unwrap(), 1.5);
        assert_eq!(cur.offset(), 4);

        let be = 2.25f64.to_be_bytes();
        let mut cur = Cursor::new(&be);
        assert_eq!(unpack_f64(&mut cur, false, false).unwrap(), 2.25);
    }

    #[test]
    fn zstring_excludes_terminator() {
        let data = b"hi\0rest";
        let mut cur = Cursor::new(data);
        assert_eq!(read_zstring(&mut cur, true).unwrap(), b"hi");
        assert_eq!(cur.offset(), 3); // past the NUL
    }

    #[test]
    fn lstring_reads_header_then_payload() {
        let data = b"\x05hello!";
        let mut cur = Cursor::new(data);
        assert_eq!(read_lstring(&mut cur, true, 1, true).unwrap(), b"hello");
        assert_eq!(cur.offset(), 6);
    }

    #[test]
    fn lstring_payload_out_of_buffer() {
        let data = [0x09u8, b'a', b'b'];
        let mut cur = Cursor::new(&data);
        assert!(matches!(
            read_lstring(&mut cur, true, 1, true),
            Err(DecodeError::OutOfBuffer { .. })
        ));
    }

    #[test]
    fn fixed_bytes() {
        let data = b"abcdef";
        let mut cur = Cursor::new(data);
        assert_eq!(read_fixed(&mut cur, 4, true).unwrap(), b"abcd");
        assert_eq!(cur.offset(), 4);
    }
}
