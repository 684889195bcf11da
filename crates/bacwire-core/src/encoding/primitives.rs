use crate::encoding::{reader::Reader, writer::Writer};
use crate::error::ResultExt;
use crate::types::ObjectId;
use crate::{DecodeError, EncodeError};

/// Octets needed to hold `value` as a minimal big-endian unsigned integer.
pub const fn unsigned_len(value: u64) -> usize {
    let mut len = 1;
    while len < 8 && (value >> (len * 8)) != 0 {
        len += 1;
    }
    len
}

/// Octets needed to hold `value` as a minimal two's complement integer.
pub const fn signed_len(value: i64) -> usize {
    let mut len = 1;
    while len < 8 {
        let bits = len * 8;
        let min = -(1i64 << (bits - 1));
        let max = (1i64 << (bits - 1)) - 1;
        if value >= min && value <= max {
            break;
        }
        len += 1;
    }
    len
}

pub fn unsigned_to_bytes(value: u64) -> Vec<u8> {
    value.to_be_bytes()[8 - unsigned_len(value)..].to_vec()
}

pub fn signed_to_bytes(value: i64) -> Vec<u8> {
    value.to_be_bytes()[8 - signed_len(value)..].to_vec()
}

/// Big-endian unsigned value of up to eight octets.
pub fn bytes_to_unsigned(bytes: &[u8]) -> Option<u64> {
    if bytes.len() > 8 {
        return None;
    }
    Some(bytes.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
}

/// Sign-extended big-endian value of one to eight octets.
pub fn bytes_to_signed(bytes: &[u8]) -> Option<i64> {
    let first = *bytes.first()?;
    if bytes.len() > 8 {
        return None;
    }
    let mut out = if first & 0x80 != 0 { [0xFF; 8] } else { [0; 8] };
    out[8 - bytes.len()..].copy_from_slice(bytes);
    Some(i64::from_be_bytes(out))
}

/// Reads a big-endian unsigned field of `len` octets, `1..=4`.
pub fn read_unsigned(
    r: &mut Reader<'_>,
    field: &'static str,
    len: usize,
) -> Result<u32, DecodeError> {
    if len == 0 || len > 4 {
        return Err(DecodeError::InvalidLength {
            field,
            length: len as u64,
        });
    }
    Ok(r.read_bits((len * 8) as u8).field(field)? as u32)
}

/// Writes `value` in as few octets as possible and returns the count.
pub fn write_unsigned(w: &mut Writer, value: u32) -> Result<usize, EncodeError> {
    let len = unsigned_len(u64::from(value));
    w.write_bits((len * 8) as u8, u64::from(value))?;
    Ok(len)
}

/// Reads a field laid out as a fixed 5-bit tag header, a 3-bit octet count
/// and that many octets of unsigned value.
///
/// This is the shape of a short application or context tag whose number and
/// class are fixed by the enclosing layout (for example `0x21` for a one
/// octet application unsigned).
pub fn read_sized_unsigned(
    r: &mut Reader<'_>,
    field: &'static str,
    header: u8,
) -> Result<u32, DecodeError> {
    r.read_const(field, 5, u64::from(header))?;
    let len = r.read_bits(3).field(field)? as usize;
    read_unsigned(r, field, len)
}

pub fn write_sized_unsigned(w: &mut Writer, header: u8, value: u32) -> Result<(), EncodeError> {
    w.write_bits(5, u64::from(header))?;
    w.write_bits(3, unsigned_len(u64::from(value)) as u64)?;
    write_unsigned(w, value)?;
    Ok(())
}

pub const fn sized_unsigned_bits(value: u32) -> u64 {
    8 + 8 * unsigned_len(value as u64) as u64
}

/// Reads a constant header octet followed by a 10-bit object type and a
/// 22-bit instance number.
pub fn read_object_id_field(
    r: &mut Reader<'_>,
    field: &'static str,
    header: u8,
) -> Result<ObjectId, DecodeError> {
    r.read_const(field, 8, u64::from(header))?;
    ObjectId::decode(r).field(field)
}

pub fn write_object_id_field(w: &mut Writer, header: u8, id: ObjectId) -> Result<(), EncodeError> {
    w.write_u8(header)?;
    id.encode(w)
}

/// Reads a constant header octet followed by a single octet value.
pub fn read_headed_u8(
    r: &mut Reader<'_>,
    field: &'static str,
    header: u8,
) -> Result<u8, DecodeError> {
    r.read_const(field, 8, u64::from(header))?;
    r.read_u8().field(field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn minimal_widths() {
        assert_eq!(unsigned_len(0), 1);
        assert_eq!(unsigned_len(0xFF), 1);
        assert_eq!(unsigned_len(0x100), 2);
        assert_eq!(unsigned_len(u64::MAX), 8);
        assert_eq!(signed_len(-128), 1);
        assert_eq!(signed_len(128), 2);
        assert_eq!(signed_len(-32769), 3);
        assert_eq!(signed_len(i64::MIN), 8);
        assert_eq!(signed_to_bytes(-1), vec![0xFF]);
        assert_eq!(unsigned_to_bytes(1476), vec![0x05, 0xC4]);
    }

    #[test]
    fn sized_unsigned_field_layout() {
        let mut w = Writer::new();
        write_sized_unsigned(&mut w, 0x04, 1476).unwrap();
        assert_eq!(w.as_written(), &[0x22, 0x05, 0xC4]);
        assert_eq!(sized_unsigned_bits(1476), 24);

        let mut r = Reader::new(w.as_written());
        assert_eq!(read_sized_unsigned(&mut r, "max_apdu", 0x04).unwrap(), 1476);
    }

    #[test]
    fn sized_unsigned_checks_header_and_length() {
        let mut r = Reader::new(&[0x31, 0x01]);
        assert!(matches!(
            read_sized_unsigned(&mut r, "vendor_id", 0x04),
            Err(DecodeError::ConstantMismatch {
                expected: 0x04,
                actual: 0x06,
                ..
            })
        ));

        let mut r = Reader::new(&[0x25, 0x01]);
        assert!(matches!(
            read_sized_unsigned(&mut r, "vendor_id", 0x04),
            Err(DecodeError::InvalidLength { length: 5, .. })
        ));
    }

    proptest! {
        #[test]
        fn signed_bytes_recover_value(v in any::<i64>()) {
            prop_assert_eq!(bytes_to_signed(&signed_to_bytes(v)), Some(v));
        }

        #[test]
        fn unsigned_bytes_recover_value(v in any::<u64>()) {
            let bytes = unsigned_to_bytes(v);
            prop_assert_eq!(bytes.len(), unsigned_len(v));
            prop_assert_eq!(bytes_to_unsigned(&bytes), Some(v));
        }
    }
}
