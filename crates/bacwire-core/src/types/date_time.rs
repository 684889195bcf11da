use crate::encoding::{reader::Reader, writer::Writer};
use crate::{DecodeError, EncodeError};

/// Octet value meaning "unspecified" in any date or time field.
pub const UNSPECIFIED: u8 = 0xFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Date {
    pub year_since_1900: u8,
    pub month: u8,
    pub day: u8,
    pub weekday: u8,
}

impl Date {
    pub fn year(&self) -> Option<u16> {
        (self.year_since_1900 != UNSPECIFIED).then(|| 1900 + u16::from(self.year_since_1900))
    }

    pub(crate) fn encode(&self, w: &mut Writer) -> Result<(), EncodeError> {
        w.write_all(&[self.year_since_1900, self.month, self.day, self.weekday])
    }

    pub(crate) fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            year_since_1900: r.read_u8()?,
            month: r.read_u8()?,
            day: r.read_u8()?,
            weekday: r.read_u8()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Time {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub hundredths: u8,
}

impl Time {
    pub(crate) fn encode(&self, w: &mut Writer) -> Result<(), EncodeError> {
        w.write_all(&[self.hour, self.minute, self.second, self.hundredths])
    }

    pub(crate) fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            hour: r.read_u8()?,
            minute: r.read_u8()?,
            second: r.read_u8()?,
            hundredths: r.read_u8()?,
        })
    }
}
