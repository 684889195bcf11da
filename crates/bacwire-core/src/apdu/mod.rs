/// Confirmed requests and every PDU that answers one.
pub mod confirmed;
/// APDU type discriminant.
pub mod pdu;
/// Unconfirmed requests.
pub mod unconfirmed;

pub use confirmed::{
    AbortPdu, ComplexAck, ConfirmedRequest, ErrorPdu, RejectPdu, SegmentAck, SegmentInfo,
    SimpleAck,
};
pub use pdu::ApduType;
pub use unconfirmed::UnconfirmedRequest;

use crate::encoding::{
    budget::LengthBudget,
    decode_buffer,
    dispatch::{Discriminated, DispatchEntry, DispatchTable},
    reader::{DecodeOptions, Reader},
    writer::Writer,
};
use crate::error::Decoded;
use crate::{DecodeError, EncodeError};

/// Application layer PDU.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Apdu {
    ConfirmedRequest(ConfirmedRequest),
    UnconfirmedRequest(UnconfirmedRequest),
    SimpleAck(SimpleAck),
    ComplexAck(ComplexAck),
    SegmentAck(SegmentAck),
    Error(ErrorPdu),
    Reject(RejectPdu),
    Abort(AbortPdu),
}

impl Discriminated for Apdu {
    fn discriminator(&self) -> u64 {
        u64::from(self.apdu_type().to_u8())
    }
}

impl Apdu {
    pub fn apdu_type(&self) -> ApduType {
        match self {
            Self::ConfirmedRequest(_) => ApduType::ConfirmedRequest,
            Self::UnconfirmedRequest(_) => ApduType::UnconfirmedRequest,
            Self::SimpleAck(_) => ApduType::SimpleAck,
            Self::ComplexAck(_) => ApduType::ComplexAck,
            Self::SegmentAck(_) => ApduType::SegmentAck,
            Self::Error(_) => ApduType::Error,
            Self::Reject(_) => ApduType::Reject,
            Self::Abort(_) => ApduType::Abort,
        }
    }

    /// Invoke id of every PDU type except unconfirmed requests.
    pub fn invoke_id(&self) -> Option<u8> {
        match self {
            Self::ConfirmedRequest(p) => Some(p.invoke_id),
            Self::UnconfirmedRequest(_) => None,
            Self::SimpleAck(p) => Some(p.invoke_id),
            Self::ComplexAck(p) => Some(p.invoke_id),
            Self::SegmentAck(p) => Some(p.invoke_id),
            Self::Error(p) => Some(p.invoke_id),
            Self::Reject(p) => Some(p.invoke_id),
            Self::Abort(p) => Some(p.invoke_id),
        }
    }

    /// Decodes an APDU occupying `budget` bytes from the reader's position.
    pub fn decode(r: &mut Reader<'_>, budget: LengthBudget) -> Result<Self, DecodeError> {
        APDU_TABLE.decode(r, budget)
    }

    /// Decodes a buffer holding exactly one APDU.
    pub fn from_bytes(buf: &[u8]) -> Result<Self, DecodeError> {
        Self::decode_with_diagnostics(buf, DecodeOptions::default()).map(|d| d.value)
    }

    pub fn decode_with_diagnostics(
        buf: &[u8],
        options: DecodeOptions,
    ) -> Result<Decoded<Self>, DecodeError> {
        decode_buffer(buf, options, Self::decode)
    }

    pub fn encode(&self, w: &mut Writer) -> Result<(), EncodeError> {
        APDU_TABLE.write_discriminator(w, self.discriminator())?;
        match self {
            Self::ConfirmedRequest(p) => p.encode(w),
            Self::UnconfirmedRequest(p) => p.encode(w),
            Self::SimpleAck(p) => p.encode(w),
            Self::ComplexAck(p) => p.encode(w),
            Self::SegmentAck(p) => p.encode(w),
            Self::Error(p) => p.encode(w),
            Self::Reject(p) => p.encode(w),
            Self::Abort(p) => p.encode(w),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, EncodeError> {
        let mut w = Writer::with_capacity((self.bit_length() / 8) as usize);
        self.encode(&mut w)?;
        Ok(w.into_bytes())
    }

    pub fn bit_length(&self) -> u64 {
        4 + match self {
            Self::ConfirmedRequest(p) => p.bit_length(),
            Self::UnconfirmedRequest(p) => p.bit_length(),
            Self::SimpleAck(p) => p.bit_length(),
            Self::ComplexAck(p) => p.bit_length(),
            Self::SegmentAck(p) => p.bit_length(),
            Self::Error(p) => p.bit_length(),
            Self::Reject(p) => p.bit_length(),
            Self::Abort(p) => p.bit_length(),
        }
    }
}

type ApduDecode = Result<Apdu, DecodeError>;

fn decode_confirmed(r: &mut Reader<'_>, _: u64, budget: LengthBudget) -> ApduDecode {
    ConfirmedRequest::decode(r, budget).map(Apdu::ConfirmedRequest)
}

fn decode_unconfirmed(r: &mut Reader<'_>, _: u64, budget: LengthBudget) -> ApduDecode {
    UnconfirmedRequest::decode(r, budget).map(Apdu::UnconfirmedRequest)
}

fn decode_simple_ack(r: &mut Reader<'_>, _: u64, budget: LengthBudget) -> ApduDecode {
    SimpleAck::decode(r, budget).map(Apdu::SimpleAck)
}

fn decode_complex_ack(r: &mut Reader<'_>, _: u64, budget: LengthBudget) -> ApduDecode {
    ComplexAck::decode(r, budget).map(Apdu::ComplexAck)
}

fn decode_segment_ack(r: &mut Reader<'_>, _: u64, budget: LengthBudget) -> ApduDecode {
    SegmentAck::decode(r, budget).map(Apdu::SegmentAck)
}

fn decode_error(r: &mut Reader<'_>, _: u64, budget: LengthBudget) -> ApduDecode {
    ErrorPdu::decode(r, budget).map(Apdu::Error)
}

fn decode_reject(r: &mut Reader<'_>, _: u64, budget: LengthBudget) -> ApduDecode {
    RejectPdu::decode(r, budget).map(Apdu::Reject)
}

fn decode_abort(r: &mut Reader<'_>, _: u64, budget: LengthBudget) -> ApduDecode {
    AbortPdu::decode(r, budget).map(Apdu::Abort)
}

const APDU_ENTRIES: &[DispatchEntry<Apdu, LengthBudget>] = &[
    DispatchEntry::exact(0, "ConfirmedRequest", decode_confirmed),
    DispatchEntry::exact(1, "UnconfirmedRequest", decode_unconfirmed),
    DispatchEntry::exact(2, "SimpleAck", decode_simple_ack),
    DispatchEntry::exact(3, "ComplexAck", decode_complex_ack),
    DispatchEntry::exact(4, "SegmentAck", decode_segment_ack),
    DispatchEntry::exact(5, "Error", decode_error),
    DispatchEntry::exact(6, "Reject", decode_reject),
    DispatchEntry::exact(7, "Abort", decode_abort),
];

/// APDU types, keyed by the high nibble of the first octet.
pub static APDU_TABLE: DispatchTable<Apdu, LengthBudget> =
    DispatchTable::new("apdu", 4, APDU_ENTRIES);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::tag::{Tag, TagValue};
    use crate::services::{
        ConfirmedServiceRequest, ErrorDetail, IAmRequest, ReadPropertyAck, ReadPropertyRequest,
        ServiceAck, ServiceError, UnconfirmedServiceRequest, WhoIsRequest, WritePropertyRequest,
    };
    use crate::types::{ErrorClass, ErrorCode, ObjectId, ObjectType, PropertyId, Segmentation};
    use proptest::prelude::*;

    fn round_trip(apdu: &Apdu) -> Vec<u8> {
        let bytes = apdu.to_bytes().unwrap();
        assert_eq!(apdu.bit_length(), 8 * bytes.len() as u64);
        assert_eq!(&Apdu::from_bytes(&bytes).unwrap(), apdu);
        bytes
    }

    fn read_property() -> ConfirmedServiceRequest {
        ConfirmedServiceRequest::ReadProperty(ReadPropertyRequest {
            object_id: ObjectId::new(ObjectType::Device, 123),
            property_id: PropertyId::ObjectName,
            array_index: None,
        })
    }

    #[test]
    fn confirmed_read_property() {
        let apdu = Apdu::ConfirmedRequest(ConfirmedRequest::new(1, read_property()));
        assert_eq!(
            round_trip(&apdu),
            vec![0x00, 0x05, 0x01, 0x0C, 0x0C, 0x02, 0x00, 0x00, 0x7B, 0x19, 0x4D]
        );
        assert_eq!(apdu.invoke_id(), Some(1));
    }

    #[test]
    fn segmented_confirmed_request_keeps_segment_fields() {
        let mut req = ConfirmedRequest::new(9, read_property());
        req.segment = Some(SegmentInfo {
            sequence_number: 2,
            proposed_window_size: 4,
        });
        req.more_follows = true;
        req.segmented_response_accepted = true;
        req.max_segments_accepted = 5;
        let bytes = round_trip(&Apdu::ConfirmedRequest(req));
        assert_eq!(&bytes[..6], &[0x0E, 0x55, 0x09, 0x02, 0x04, 0x0C]);
    }

    #[test]
    fn write_property_priority_detected_through_apdu_budget() {
        let bytes = [
            0x00, 0x05, 0x02, 0x0F, 0x0C, 0x00, 0x80, 0x00, 0x01, 0x19, 0x55, 0x3E, 0x44, 0x42,
            0x91, 0x00, 0x00, 0x3F, 0x49, 0x08,
        ];
        let Apdu::ConfirmedRequest(req) = Apdu::from_bytes(&bytes).unwrap() else {
            panic!("expected a confirmed request");
        };
        let ConfirmedServiceRequest::WriteProperty(WritePropertyRequest { priority, .. }) =
            req.service
        else {
            panic!("expected WriteProperty");
        };
        assert_eq!(priority, Some(Tag::context_unsigned(4, 8)));

        let short = &bytes[..19];
        let Apdu::ConfirmedRequest(req) = Apdu::from_bytes(short).unwrap() else {
            panic!("expected a confirmed request");
        };
        assert!(matches!(
            req.service,
            ConfirmedServiceRequest::WriteProperty(WritePropertyRequest { priority: None, .. })
        ));
    }

    #[test]
    fn unconfirmed_i_am() {
        let apdu = Apdu::UnconfirmedRequest(UnconfirmedRequest::new(
            UnconfirmedServiceRequest::IAm(IAmRequest {
                object_type: ObjectType::Device,
                object_instance_number: 1,
                max_apdu_accepted: 128,
                segmentation_supported: Segmentation::SegmentedBoth,
                vendor_id: 15,
            }),
        ));
        assert_eq!(
            round_trip(&apdu),
            vec![0x10, 0x00, 0xC4, 0x02, 0x00, 0x00, 0x01, 0x21, 0x80, 0x91, 0x00, 0x21, 0x0F]
        );
        assert_eq!(apdu.invoke_id(), None);
    }

    #[test]
    fn global_who_is() {
        let apdu = Apdu::UnconfirmedRequest(UnconfirmedRequest::new(
            UnconfirmedServiceRequest::WhoIs(WhoIsRequest::global()),
        ));
        assert_eq!(round_trip(&apdu), vec![0x10, 0x08]);
    }

    #[test]
    fn answers_to_confirmed_requests() {
        let acks = [
            Apdu::SimpleAck(SimpleAck {
                invoke_id: 3,
                service_choice: 0x0F,
            }),
            Apdu::SegmentAck(SegmentAck {
                negative_ack: true,
                sent_by_server: false,
                invoke_id: 3,
                sequence_number: 7,
                actual_window_size: 2,
            }),
            Apdu::Reject(RejectPdu {
                invoke_id: 3,
                reason: 9,
            }),
            Apdu::Abort(AbortPdu {
                server: true,
                invoke_id: 3,
                reason: 4,
            }),
            Apdu::Error(ErrorPdu {
                invoke_id: 3,
                error: ServiceError::WriteProperty(ErrorDetail::new(
                    ErrorClass::Property,
                    ErrorCode::WriteAccessDenied,
                )),
            }),
            Apdu::ComplexAck(ComplexAck::new(
                3,
                ServiceAck::ReadProperty(ReadPropertyAck {
                    object_id: ObjectId::new(ObjectType::Device, 1),
                    property_id: PropertyId::ObjectName,
                    array_index: None,
                    values: vec![Tag::application(TagValue::character_string("ahu-1")).unwrap()],
                }),
            )),
        ];
        let first: Vec<u8> = acks.iter().map(|a| round_trip(a)[0]).collect();
        assert_eq!(first, vec![0x20, 0x42, 0x60, 0x71, 0x50, 0x30]);
    }

    #[test]
    fn nonzero_reserved_bits_are_diagnosed_not_fatal() {
        let decoded =
            Apdu::decode_with_diagnostics(&[0x2C, 0x03, 0x0F], DecodeOptions::default()).unwrap();
        assert_eq!(
            decoded.value,
            Apdu::SimpleAck(SimpleAck {
                invoke_id: 3,
                service_choice: 0x0F
            })
        );
        assert_eq!(decoded.diagnostics.len(), 1);
        assert_eq!(decoded.diagnostics[0].position_bits, 4);

        let err = Apdu::decode_with_diagnostics(&[0x2C, 0x03, 0x0F], DecodeOptions::strict())
            .unwrap_err();
        assert_eq!(err.path(), vec!["SimpleAck"]);
        assert!(matches!(
            err.root(),
            DecodeError::ReservedFieldMismatch { actual: 0xC, .. }
        ));
    }

    #[test]
    fn unknown_apdu_type() {
        assert_eq!(
            Apdu::from_bytes(&[0x80, 0x00]).unwrap_err(),
            DecodeError::UnknownVariant {
                frame: "apdu",
                discriminator: 8
            }
        );
    }

    #[test]
    fn error_path_names_each_layer() {
        // ReadProperty with a truncated object identifier.
        let err = Apdu::from_bytes(&[0x00, 0x05, 0x01, 0x0C, 0x0C, 0x02]).unwrap_err();
        assert_eq!(
            err.path(),
            vec![
                "ConfirmedRequest",
                "service",
                "ReadProperty",
                "object_id",
                "object_type"
            ]
        );
        assert!(err.is_underflow());
    }

    proptest! {
        #[test]
        fn truncated_apdus_never_panic(cut in 0usize..11) {
            let apdu = Apdu::ConfirmedRequest(ConfirmedRequest::new(1, read_property()));
            let bytes = apdu.to_bytes().unwrap();
            let err = Apdu::from_bytes(&bytes[..cut]).unwrap_err();
            prop_assert!(err.is_underflow(), "{err}");
        }

        #[test]
        fn unregistered_types_are_unknown(nibble in 8u8..16, rest in proptest::collection::vec(any::<u8>(), 0..8)) {
            let mut bytes = vec![nibble << 4];
            bytes.extend(rest);
            let unknown = matches!(
                Apdu::from_bytes(&bytes),
                Err(DecodeError::UnknownVariant { frame: "apdu", .. })
            );
            prop_assert!(unknown);
        }
    }
}
