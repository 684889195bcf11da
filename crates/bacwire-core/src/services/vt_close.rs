use crate::encoding::{
    budget::LengthBudget,
    reader::Reader,
    tag::{AppTag, Tag, TagValue},
    writer::Writer,
};
use crate::error::ResultExt;
use crate::services::{tags_bit_length, write_tags};
use crate::{DecodeError, EncodeError};

pub const SERVICE_VT_CLOSE: u8 = 0x16;

/// VT-Close-Request: a list of application-tagged unsigned session
/// identifiers that runs to the end of the request.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VtCloseRequest {
    pub session_ids: Vec<Tag>,
}

impl VtCloseRequest {
    pub fn new(ids: &[u8]) -> Self {
        Self {
            session_ids: ids
                .iter()
                .map(|id| Tag {
                    tag_number: AppTag::UnsignedInt as u8,
                    is_context_specific: false,
                    length_value_type: 1,
                    ext_tag_number: None,
                    ext_length: None,
                    payload: TagValue::UnsignedInt(vec![*id]),
                })
                .collect(),
        }
    }

    /// Session identifiers as numbers.
    pub fn ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.session_ids.iter().filter_map(|t| t.payload.as_u64())
    }

    pub fn decode(r: &mut Reader<'_>, budget: LengthBudget) -> Result<Self, DecodeError> {
        let mut session_ids = Vec::new();
        while budget.has_more(r) {
            let tag = Tag::decode(r).field("session_ids")?;
            if !matches!(tag.payload, TagValue::UnsignedInt(_)) || tag.is_context_specific {
                return Err(DecodeError::SubMessageTypeMismatch {
                    expected: "UnsignedInt",
                    actual: payload_name(&tag.payload),
                }
                .in_field("session_ids"));
            }
            session_ids.push(tag);
        }
        budget.remaining(r)?;
        Ok(Self { session_ids })
    }

    pub fn encode(&self, w: &mut Writer) -> Result<(), EncodeError> {
        write_tags(w, &self.session_ids)
    }

    pub fn bit_length(&self) -> u64 {
        tags_bit_length(&self.session_ids)
    }
}

fn payload_name(value: &TagValue) -> &'static str {
    match value {
        TagValue::Null => "Null",
        TagValue::Boolean(_) => "Boolean",
        TagValue::UnsignedInt(_) => "UnsignedInt",
        TagValue::SignedInt(_) => "SignedInt",
        TagValue::Real(_) => "Real",
        TagValue::Double(_) => "Double",
        TagValue::OctetString(_) => "OctetString",
        TagValue::CharacterString { .. } => "CharacterString",
        TagValue::BitString { .. } => "BitString",
        TagValue::Enumerated(_) => "Enumerated",
        TagValue::Date(_) => "Date",
        TagValue::Time(_) => "Time",
        TagValue::ObjectIdentifier(_) => "ObjectIdentifier",
        TagValue::Context(_) => "Context",
        TagValue::Opening => "Opening",
        TagValue::Closing => "Closing",
    }
}

#[cfg(test)]
mod tests {
    use super::VtCloseRequest;
    use crate::encoding::{budget::LengthBudget, reader::Reader, writer::Writer};
    use crate::DecodeError;

    fn decode(bytes: &[u8]) -> Result<VtCloseRequest, DecodeError> {
        let mut r = Reader::new(bytes);
        let budget = LengthBudget::rest_of(&r);
        VtCloseRequest::decode(&mut r, budget)
    }

    #[test]
    fn session_list_runs_to_end_of_budget() {
        let req = decode(&[0x21, 0x05, 0x21, 0x06, 0x22, 0x01, 0x00]).unwrap();
        assert_eq!(req.ids().collect::<Vec<_>>(), vec![5, 6, 256]);
        assert_eq!(req.bit_length(), 56);
    }

    #[test]
    fn budget_bounds_the_list() {
        let bytes = [0x21, 0x05, 0x21, 0x06, 0xFF];
        let mut r = Reader::new(&bytes);
        let budget = LengthBudget::starting_at(&r, 4);
        let req = VtCloseRequest::decode(&mut r, budget).unwrap();
        assert_eq!(req, VtCloseRequest::new(&[5, 6]));
        assert_eq!(r.position_bytes(), 4);
    }

    #[test]
    fn empty_list() {
        assert!(decode(&[]).unwrap().session_ids.is_empty());
        let mut w = Writer::new();
        VtCloseRequest::new(&[]).encode(&mut w).unwrap();
        assert!(w.as_written().is_empty());
    }

    #[test]
    fn other_tag_types_are_refused() {
        let err = decode(&[0x21, 0x05, 0x91, 0x06]).unwrap_err();
        assert_eq!(err.path(), vec!["session_ids"]);
        assert_eq!(
            err.root(),
            &DecodeError::SubMessageTypeMismatch {
                expected: "UnsignedInt",
                actual: "Enumerated"
            }
        );
    }

    #[test]
    fn tag_overrunning_the_budget_is_invalid_length() {
        let bytes = [0x22, 0x01, 0x00];
        let mut r = Reader::new(&bytes);
        let budget = LengthBudget::starting_at(&r, 2);
        assert!(matches!(
            VtCloseRequest::decode(&mut r, budget).unwrap_err(),
            DecodeError::InvalidLength {
                field: "length budget",
                ..
            }
        ));
    }
}
