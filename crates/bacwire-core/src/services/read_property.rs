use crate::encoding::{
    budget::LengthBudget,
    primitives::{
        read_object_id_field, read_sized_unsigned, sized_unsigned_bits, write_object_id_field,
        write_sized_unsigned,
    },
    reader::Reader,
    tag::Tag,
    writer::Writer,
};
use crate::services::{
    context_header, peek_header, read_closing, read_opening, read_tags_until_closing,
    tags_bit_length, write_closing, write_opening, write_tags, CONTEXT_0_OBJECT_ID,
};
use crate::types::{ObjectId, PropertyId};
use crate::{DecodeError, EncodeError};

pub const SERVICE_READ_PROPERTY: u8 = 0x0C;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReadPropertyRequest {
    pub object_id: ObjectId,
    pub property_id: PropertyId,
    pub array_index: Option<u32>,
}

impl ReadPropertyRequest {
    pub fn decode(r: &mut Reader<'_>, budget: LengthBudget) -> Result<Self, DecodeError> {
        let object_id = read_object_id_field(r, "object_id", CONTEXT_0_OBJECT_ID)?;
        let property_id =
            PropertyId::from_u32(read_sized_unsigned(r, "property_id", context_header(1))?);
        let array_index = if budget.has_optional_field(r) {
            Some(read_sized_unsigned(r, "array_index", context_header(2))?)
        } else {
            None
        };
        Ok(Self {
            object_id,
            property_id,
            array_index,
        })
    }

    pub fn encode(&self, w: &mut Writer) -> Result<(), EncodeError> {
        write_object_id_field(w, CONTEXT_0_OBJECT_ID, self.object_id)?;
        write_sized_unsigned(w, context_header(1), self.property_id.to_u32())?;
        if let Some(index) = self.array_index {
            write_sized_unsigned(w, context_header(2), index)?;
        }
        Ok(())
    }

    pub fn bit_length(&self) -> u64 {
        40 + sized_unsigned_bits(self.property_id.to_u32())
            + self.array_index.map_or(0, sized_unsigned_bits)
    }
}

/// ReadProperty-ACK. `values` holds every tag between the opening and
/// closing tag 3, nested constructed values included.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReadPropertyAck {
    pub object_id: ObjectId,
    pub property_id: PropertyId,
    pub array_index: Option<u32>,
    pub values: Vec<Tag>,
}

impl ReadPropertyAck {
    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let object_id = read_object_id_field(r, "object_id", CONTEXT_0_OBJECT_ID)?;
        let property_id =
            PropertyId::from_u32(read_sized_unsigned(r, "property_id", context_header(1))?);
        let array_index = if peek_header(r) == Some(context_header(2)) {
            Some(read_sized_unsigned(r, "array_index", context_header(2))?)
        } else {
            None
        };
        read_opening(r, "property_value", 3)?;
        let values = read_tags_until_closing(r, "property_value", 3)?;
        read_closing(r, "property_value", 3)?;
        Ok(Self {
            object_id,
            property_id,
            array_index,
            values,
        })
    }

    pub fn encode(&self, w: &mut Writer) -> Result<(), EncodeError> {
        write_object_id_field(w, CONTEXT_0_OBJECT_ID, self.object_id)?;
        write_sized_unsigned(w, context_header(1), self.property_id.to_u32())?;
        if let Some(index) = self.array_index {
            write_sized_unsigned(w, context_header(2), index)?;
        }
        write_opening(w, 3)?;
        write_tags(w, &self.values)?;
        write_closing(w, 3)
    }

    pub fn bit_length(&self) -> u64 {
        40 + sized_unsigned_bits(self.property_id.to_u32())
            + self.array_index.map_or(0, sized_unsigned_bits)
            + 16
            + tags_bit_length(&self.values)
    }
}

#[cfg(test)]
mod tests {
    use super::{ReadPropertyAck, ReadPropertyRequest};
    use crate::encoding::{budget::LengthBudget, reader::Reader, tag::Tag, tag::TagValue, writer::Writer};
    use crate::types::{ObjectId, ObjectType, PropertyId};

    fn decode_request(bytes: &[u8]) -> ReadPropertyRequest {
        let mut r = Reader::new(bytes);
        let budget = LengthBudget::rest_of(&r);
        ReadPropertyRequest::decode(&mut r, budget).unwrap()
    }

    #[test]
    fn object_name_of_device() {
        let req = ReadPropertyRequest {
            object_id: ObjectId::new(ObjectType::Device, 123),
            property_id: PropertyId::ObjectName,
            array_index: None,
        };
        let mut w = Writer::new();
        req.encode(&mut w).unwrap();
        assert_eq!(w.as_written(), &[0x0C, 0x02, 0x00, 0x00, 0x7B, 0x19, 0x4D]);
        assert_eq!(decode_request(w.as_written()), req);
    }

    #[test]
    fn array_index_present_when_budget_allows() {
        let bytes = [0x0C, 0x02, 0x00, 0x00, 0x7B, 0x19, 0x4C, 0x29, 0x00];
        let req = decode_request(&bytes);
        assert_eq!(req.property_id, PropertyId::ObjectList);
        assert_eq!(req.array_index, Some(0));
        assert_eq!(req.bit_length(), 72);
    }

    #[test]
    fn ack_collects_values() {
        let ack = ReadPropertyAck {
            object_id: ObjectId::new(ObjectType::AnalogInput, 1),
            property_id: PropertyId::PresentValue,
            array_index: None,
            values: vec![Tag::application(TagValue::Real(21.5)).unwrap()],
        };
        let mut w = Writer::new();
        ack.encode(&mut w).unwrap();
        assert_eq!(
            w.as_written(),
            &[0x0C, 0x00, 0x00, 0x00, 0x01, 0x19, 0x55, 0x3E, 0x44, 0x41, 0xAC, 0x00, 0x00, 0x3F]
        );
        assert_eq!(ack.bit_length(), 8 * 14);
        assert_eq!(ReadPropertyAck::decode(&mut Reader::new(w.as_written())).unwrap(), ack);
    }

    #[test]
    fn ack_with_object_list() {
        let bytes = [
            0x0C, 0x02, 0x00, 0x00, 0x7B, 0x19, 0x4C, 0x3E, 0xC4, 0x02, 0x00, 0x00, 0x7B, 0xC4,
            0x00, 0x00, 0x00, 0x01, 0x3F,
        ];
        let ack = ReadPropertyAck::decode(&mut Reader::new(&bytes)).unwrap();
        assert_eq!(ack.values.len(), 2);
        assert_eq!(
            ack.values[1].payload,
            TagValue::ObjectIdentifier(ObjectId::new(ObjectType::AnalogInput, 1))
        );
    }

    #[test]
    fn truncated_ack_underflows() {
        let bytes = [0x0C, 0x02, 0x00, 0x00, 0x7B, 0x19, 0x4C, 0x3E, 0xC4, 0x02];
        let err = ReadPropertyAck::decode(&mut Reader::new(&bytes)).unwrap_err();
        assert!(err.is_underflow());
    }
}
