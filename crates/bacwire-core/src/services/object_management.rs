use crate::encoding::{
    primitives::{read_object_id_field, write_object_id_field},
    reader::Reader,
    writer::Writer,
};
use crate::services::APPLICATION_OBJECT_ID;
use crate::types::ObjectId;
use crate::{DecodeError, EncodeError};

pub const SERVICE_DELETE_OBJECT: u8 = 0x0B;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeleteObjectRequest {
    pub object_id: ObjectId,
}

impl DeleteObjectRequest {
    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            object_id: read_object_id_field(r, "object_id", APPLICATION_OBJECT_ID)?,
        })
    }

    pub fn encode(&self, w: &mut Writer) -> Result<(), EncodeError> {
        write_object_id_field(w, APPLICATION_OBJECT_ID, self.object_id)
    }

    pub const fn bit_length(&self) -> u64 {
        40
    }
}
