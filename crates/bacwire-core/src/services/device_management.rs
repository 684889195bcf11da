use crate::encoding::{
    budget::LengthBudget,
    primitives::{read_sized_unsigned, sized_unsigned_bits, write_sized_unsigned},
    reader::Reader,
    tag::{Tag, TagValue, CHARSET_UTF8},
    writer::Writer,
};
use crate::error::ResultExt;
use crate::services::context_header;
use crate::{DecodeError, EncodeError};

pub const SERVICE_REINITIALIZE_DEVICE: u8 = 0x14;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u32)]
pub enum ReinitializeState {
    Coldstart = 0,
    Warmstart = 1,
    StartBackup = 2,
    EndBackup = 3,
    StartRestore = 4,
    EndRestore = 5,
    AbortRestore = 6,
    ActivateChanges = 7,
}

impl ReinitializeState {
    pub const fn to_u32(self) -> u32 {
        self as u32
    }

    pub const fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Coldstart),
            1 => Some(Self::Warmstart),
            2 => Some(Self::StartBackup),
            3 => Some(Self::EndBackup),
            4 => Some(Self::StartRestore),
            5 => Some(Self::EndRestore),
            6 => Some(Self::AbortRestore),
            7 => Some(Self::ActivateChanges),
            _ => None,
        }
    }
}

/// ReinitializeDevice-Request. The password, a context-tagged character
/// string, is present only if the request extends past the state field.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReinitializeDeviceRequest {
    pub state: ReinitializeState,
    pub password: Option<Tag>,
}

impl ReinitializeDeviceRequest {
    pub fn new(state: ReinitializeState, password: Option<&str>) -> Result<Self, EncodeError> {
        let password = match password {
            Some(p) => {
                let mut data = Vec::with_capacity(p.len() + 1);
                data.push(CHARSET_UTF8);
                data.extend_from_slice(p.as_bytes());
                Some(Tag::context(1, data)?)
            }
            None => None,
        };
        Ok(Self { state, password })
    }

    /// The password text, when it is a UTF-8 character string.
    pub fn password_str(&self) -> Option<&str> {
        match &self.password.as_ref()?.payload {
            TagValue::Context(data) => match data.split_first() {
                Some((&CHARSET_UTF8, text)) => core::str::from_utf8(text).ok(),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn decode(r: &mut Reader<'_>, budget: LengthBudget) -> Result<Self, DecodeError> {
        let raw = read_sized_unsigned(r, "state", context_header(0))?;
        let state = ReinitializeState::from_u32(raw).ok_or(DecodeError::InvalidValue {
            field: "state",
            value: u64::from(raw),
        })?;
        let password = if budget.has_optional_field(r) {
            Some(Tag::decode(r).field("password")?)
        } else {
            None
        };
        Ok(Self { state, password })
    }

    pub fn encode(&self, w: &mut Writer) -> Result<(), EncodeError> {
        write_sized_unsigned(w, context_header(0), self.state.to_u32())?;
        if let Some(password) = &self.password {
            password.encode(w)?;
        }
        Ok(())
    }

    pub fn bit_length(&self) -> u64 {
        sized_unsigned_bits(self.state.to_u32()) + self.password.as_ref().map_or(0, Tag::bit_length)
    }
}
