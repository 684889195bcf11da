use crate::encoding::{
    budget::LengthBudget,
    primitives::{read_sized_unsigned, sized_unsigned_bits, write_sized_unsigned},
    reader::Reader,
    writer::Writer,
};
use crate::services::context_header;
use crate::{DecodeError, EncodeError};

pub const SERVICE_WHO_IS: u8 = 0x08;

/// Who-Is-Request. The device instance range limits are sent together or
/// not at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WhoIsRequest {
    pub low_limit: Option<u32>,
    pub high_limit: Option<u32>,
}

impl WhoIsRequest {
    pub const fn global() -> Self {
        Self {
            low_limit: None,
            high_limit: None,
        }
    }

    pub const fn range(low: u32, high: u32) -> Self {
        Self {
            low_limit: Some(low),
            high_limit: Some(high),
        }
    }

    /// Whether a device with instance `instance` should answer.
    pub fn matches(&self, instance: u32) -> bool {
        match (self.low_limit, self.high_limit) {
            (Some(low), Some(high)) => (low..=high).contains(&instance),
            _ => true,
        }
    }

    pub fn decode(r: &mut Reader<'_>, budget: LengthBudget) -> Result<Self, DecodeError> {
        if !budget.has_optional_field(r) {
            return Ok(Self::global());
        }
        let low = read_sized_unsigned(r, "low_limit", context_header(0))?;
        let high = read_sized_unsigned(r, "high_limit", context_header(1))?;
        Ok(Self::range(low, high))
    }

    pub fn encode(&self, w: &mut Writer) -> Result<(), EncodeError> {
        match (self.low_limit, self.high_limit) {
            (Some(low), Some(high)) => {
                write_sized_unsigned(w, context_header(0), low)?;
                write_sized_unsigned(w, context_header(1), high)
            }
            (None, None) => Ok(()),
            (Some(_), None) => Err(EncodeError::MissingField("low_limit", "high_limit")),
            (None, Some(_)) => Err(EncodeError::MissingField("high_limit", "low_limit")),
        }
    }

    pub fn bit_length(&self) -> u64 {
        self.low_limit.map_or(0, sized_unsigned_bits) + self.high_limit.map_or(0, sized_unsigned_bits)
    }
}
