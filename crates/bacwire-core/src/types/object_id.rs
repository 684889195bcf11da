use crate::encoding::{reader::Reader, writer::Writer};
use crate::types::ObjectType;
use crate::{DecodeError, EncodeError, ResultExt};

const TYPE_BITS: u8 = 10;
const INSTANCE_BITS: u8 = 22;
const INSTANCE_MASK: u32 = (1 << INSTANCE_BITS) - 1;

/// Object identifier as it travels on the wire: 10 bits of type followed
/// by 22 bits of instance, packed big-endian into four octets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectId(u32);

impl ObjectId {
    /// Largest instance number the 22-bit field holds.
    pub const MAX_INSTANCE: u32 = INSTANCE_MASK;

    /// Bits beyond the field widths are dropped.
    pub const fn new(object_type: ObjectType, instance: u32) -> Self {
        let type_bits = (object_type.to_u16() as u32) & ((1 << TYPE_BITS) - 1);
        Self((type_bits << INSTANCE_BITS) | (instance & INSTANCE_MASK))
    }

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn object_type(self) -> ObjectType {
        ObjectType::from_u16((self.0 >> INSTANCE_BITS) as u16)
    }

    pub const fn instance(self) -> u32 {
        self.0 & INSTANCE_MASK
    }

    pub(crate) fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let type_bits = r.read_bits(TYPE_BITS).field("object_type")?;
        let instance = r.read_bits(INSTANCE_BITS).field("instance")?;
        Ok(Self(((type_bits as u32) << INSTANCE_BITS) | instance as u32))
    }

    pub(crate) fn encode(self, w: &mut Writer) -> Result<(), EncodeError> {
        w.write_bits(TYPE_BITS, u64::from(self.0 >> INSTANCE_BITS))?;
        w.write_bits(INSTANCE_BITS, u64::from(self.instance()))
    }
}
