use crate::encoding::{
    primitives::{read_sized_unsigned, sized_unsigned_bits, write_sized_unsigned},
    reader::Reader,
    writer::Writer,
};
use crate::services::application_header;
use crate::types::{ErrorClass, ErrorCode};
use crate::{DecodeError, EncodeError};

const ENUMERATED: u8 = application_header(9);

/// Error class and code returned for a failed confirmed service.
///
/// Values outside the standard enumerations are kept as received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ErrorDetail {
    pub error_class: u32,
    pub error_code: u32,
}

impl ErrorDetail {
    pub fn new(class: ErrorClass, code: ErrorCode) -> Self {
        Self {
            error_class: class.to_u32(),
            error_code: code.to_u32(),
        }
    }

    pub fn class(&self) -> Option<ErrorClass> {
        ErrorClass::from_u32(self.error_class)
    }

    pub fn code(&self) -> Option<ErrorCode> {
        ErrorCode::from_u32(self.error_code)
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            error_class: read_sized_unsigned(r, "error_class", ENUMERATED)?,
            error_code: read_sized_unsigned(r, "error_code", ENUMERATED)?,
        })
    }

    pub fn encode(&self, w: &mut Writer) -> Result<(), EncodeError> {
        write_sized_unsigned(w, ENUMERATED, self.error_class)?;
        write_sized_unsigned(w, ENUMERATED, self.error_code)
    }

    pub fn bit_length(&self) -> u64 {
        sized_unsigned_bits(self.error_class) + sized_unsigned_bits(self.error_code)
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorDetail;
    use crate::encoding::{reader::Reader, writer::Writer};
    use crate::types::{ErrorClass, ErrorCode};
    use crate::DecodeError;

    #[test]
    fn unknown_property() {
        let detail = ErrorDetail::new(ErrorClass::Property, ErrorCode::UnknownProperty);
        let mut w = Writer::new();
        detail.encode(&mut w).unwrap();
        assert_eq!(w.as_written(), &[0x91, 0x02, 0x91, 0x20]);

        let decoded = ErrorDetail::decode(&mut Reader::new(w.as_written())).unwrap();
        assert_eq!(decoded.class(), Some(ErrorClass::Property));
        assert_eq!(decoded.code(), Some(ErrorCode::UnknownProperty));
    }

    #[test]
    fn vendor_codes_are_kept() {
        let decoded = ErrorDetail::decode(&mut Reader::new(&[0x91, 0x01, 0x92, 0x01, 0x2C])).unwrap();
        assert_eq!(decoded.error_code, 300);
        assert_eq!(decoded.code(), None);
        assert_eq!(decoded.bit_length(), 40);
    }

    #[test]
    fn class_must_be_enumerated() {
        let err = ErrorDetail::decode(&mut Reader::new(&[0x21, 0x02, 0x91, 0x20])).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::ConstantMismatch {
                field: "error_class",
                ..
            }
        ));
    }
}
