use crate::encoding::{
    primitives::{read_headed_u8, read_sized_unsigned, sized_unsigned_bits, write_sized_unsigned},
    reader::Reader,
    writer::Writer,
};
use crate::error::ResultExt;
use crate::services::{application_header, APPLICATION_OBJECT_ID};
use crate::types::{ObjectId, ObjectType, Segmentation};
use crate::{DecodeError, EncodeError};

pub const SERVICE_I_AM: u8 = 0x00;

const UNSIGNED: u8 = application_header(2);
/// Application enumerated with a one octet payload.
const SEGMENTATION_HEADER: u8 = 0x91;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IAmRequest {
    pub object_type: ObjectType,
    pub object_instance_number: u32,
    pub max_apdu_accepted: u32,
    pub segmentation_supported: Segmentation,
    pub vendor_id: u16,
}

impl IAmRequest {
    pub fn device_id(&self) -> ObjectId {
        ObjectId::new(self.object_type, self.object_instance_number)
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        r.read_const("object_identifier", 8, u64::from(APPLICATION_OBJECT_ID))?;
        let object_type = ObjectType::from_u16(r.read_bits(10).field("object_type")? as u16);
        let object_instance_number = r.read_bits(22).field("object_instance_number")? as u32;
        let max_apdu_accepted = read_sized_unsigned(r, "max_apdu_accepted", UNSIGNED)?;
        let raw = read_headed_u8(r, "segmentation_supported", SEGMENTATION_HEADER)?;
        let segmentation_supported =
            Segmentation::from_u32(u32::from(raw)).ok_or(DecodeError::InvalidValue {
                field: "segmentation_supported",
                value: u64::from(raw),
            })?;
        let vendor = read_sized_unsigned(r, "vendor_id", UNSIGNED)?;
        let vendor_id = u16::try_from(vendor).map_err(|_| DecodeError::InvalidValue {
            field: "vendor_id",
            value: u64::from(vendor),
        })?;
        Ok(Self {
            object_type,
            object_instance_number,
            max_apdu_accepted,
            segmentation_supported,
            vendor_id,
        })
    }

    pub fn encode(&self, w: &mut Writer) -> Result<(), EncodeError> {
        w.write_u8(APPLICATION_OBJECT_ID)?;
        w.write_bits(10, u64::from(self.object_type.to_u16()))?;
        w.write_bits(22, u64::from(self.object_instance_number))?;
        write_sized_unsigned(w, UNSIGNED, self.max_apdu_accepted)?;
        w.write_u8(SEGMENTATION_HEADER)?;
        w.write_u8(self.segmentation_supported as u8)?;
        write_sized_unsigned(w, UNSIGNED, u32::from(self.vendor_id))
    }

    pub fn bit_length(&self) -> u64 {
        40 + sized_unsigned_bits(self.max_apdu_accepted)
            + 16
            + sized_unsigned_bits(u32::from(self.vendor_id))
    }
}
