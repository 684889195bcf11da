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
use crate::error::ResultExt;
use crate::services::{
    context_header, peek_header, read_closing, read_opening, write_closing, write_opening,
    CONTEXT_0_OBJECT_ID,
};
use crate::types::{ObjectId, PropertyId};
use crate::{DecodeError, EncodeError};

pub const SERVICE_WRITE_PROPERTY: u8 = 0x0F;

/// WriteProperty-Request.
///
/// The priority has no presence flag: it is on the wire only when the
/// request has room for it after the closing tag of `value`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WritePropertyRequest {
    pub object_id: ObjectId,
    pub property_id: PropertyId,
    pub array_index: Option<u32>,
    pub value: Tag,
    pub priority: Option<Tag>,
}

impl WritePropertyRequest {
    pub fn decode(r: &mut Reader<'_>, budget: LengthBudget) -> Result<Self, DecodeError> {
        let object_id = read_object_id_field(r, "object_id", CONTEXT_0_OBJECT_ID)?;
        let property_id =
            PropertyId::from_u32(read_sized_unsigned(r, "property_id", context_header(1))?);
        let array_index = if peek_header(r) == Some(context_header(2)) {
            Some(read_sized_unsigned(r, "array_index", context_header(2))?)
        } else {
            None
        };
        read_opening(r, "value", 3)?;
        let value = Tag::decode(r).field("value")?;
        read_closing(r, "value", 3)?;
        let priority = if budget.has_optional_field(r) {
            Some(Tag::decode(r).field("priority")?)
        } else {
            None
        };
        Ok(Self {
            object_id,
            property_id,
            array_index,
            value,
            priority,
        })
    }

    pub fn encode(&self, w: &mut Writer) -> Result<(), EncodeError> {
        write_object_id_field(w, CONTEXT_0_OBJECT_ID, self.object_id)?;
        write_sized_unsigned(w, context_header(1), self.property_id.to_u32())?;
        if let Some(index) = self.array_index {
            write_sized_unsigned(w, context_header(2), index)?;
        }
        write_opening(w, 3)?;
        self.value.encode(w)?;
        write_closing(w, 3)?;
        if let Some(priority) = &self.priority {
            priority.encode(w)?;
        }
        Ok(())
    }

    pub fn bit_length(&self) -> u64 {
        40 + sized_unsigned_bits(self.property_id.to_u32())
            + self.array_index.map_or(0, sized_unsigned_bits)
            + 16
            + self.value.bit_length()
            + self.priority.as_ref().map_or(0, Tag::bit_length)
    }
}
