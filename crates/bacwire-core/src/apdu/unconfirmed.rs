use crate::encoding::{budget::LengthBudget, reader::Reader, writer::Writer};
use crate::error::ResultExt;
use crate::services::UnconfirmedServiceRequest;
use crate::{DecodeError, EncodeError};

/// BACnet-Unconfirmed-Request-PDU.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnconfirmedRequest {
    pub service: UnconfirmedServiceRequest,
}

impl UnconfirmedRequest {
    pub fn new(service: UnconfirmedServiceRequest) -> Self {
        Self { service }
    }

    pub(crate) fn decode(r: &mut Reader<'_>, budget: LengthBudget) -> Result<Self, DecodeError> {
        r.check_reserved("unconfirmed request reserved", 4, 0)?;
        let service = UnconfirmedServiceRequest::decode(r, budget.child(r)?).field("service")?;
        Ok(Self { service })
    }

    pub(crate) fn encode(&self, w: &mut Writer) -> Result<(), EncodeError> {
        w.write_bits(4, 0)?;
        self.service.encode(w)
    }

    pub(crate) fn bit_length(&self) -> u64 {
        4 + self.service.bit_length()
    }
}
