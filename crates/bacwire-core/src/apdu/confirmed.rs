use crate::encoding::{budget::LengthBudget, reader::Reader, writer::Writer};
use crate::error::ResultExt;
use crate::services::{ConfirmedServiceRequest, ServiceAck, ServiceError};
use crate::types::MaxApdu;
use crate::{DecodeError, EncodeError};

/// Sequence number and window carried by a segmented request or ack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SegmentInfo {
    pub sequence_number: u8,
    pub proposed_window_size: u8,
}

impl SegmentInfo {
    fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            sequence_number: r.read_u8().field("sequence_number")?,
            proposed_window_size: r.read_u8().field("proposed_window_size")?,
        })
    }

    fn encode(&self, w: &mut Writer) -> Result<(), EncodeError> {
        w.write_u8(self.sequence_number)?;
        w.write_u8(self.proposed_window_size)
    }
}

/// BACnet-Confirmed-Request-PDU. The segmented flag is implied by `segment`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConfirmedRequest {
    pub more_follows: bool,
    pub segmented_response_accepted: bool,
    /// Raw 3-bit max-segments-accepted code.
    pub max_segments_accepted: u8,
    /// Raw 4-bit max-APDU-length-accepted code.
    pub max_apdu_length_accepted: u8,
    pub invoke_id: u8,
    pub segment: Option<SegmentInfo>,
    pub service: ConfirmedServiceRequest,
}

impl ConfirmedRequest {
    /// An unsegmented request accepting 1476-octet responses.
    pub fn new(invoke_id: u8, service: ConfirmedServiceRequest) -> Self {
        Self {
            more_follows: false,
            segmented_response_accepted: false,
            max_segments_accepted: 0,
            max_apdu_length_accepted: MaxApdu::UpTo1476 as u8,
            invoke_id,
            segment: None,
            service,
        }
    }

    pub fn max_apdu(&self) -> Option<MaxApdu> {
        MaxApdu::from_u32(u32::from(self.max_apdu_length_accepted))
    }

    pub(crate) fn decode(r: &mut Reader<'_>, budget: LengthBudget) -> Result<Self, DecodeError> {
        let segmented = r.read_bit().field("segmented")?;
        let more_follows = r.read_bit().field("more_follows")?;
        let segmented_response_accepted = r.read_bit().field("segmented_response_accepted")?;
        r.check_reserved("confirmed request reserved", 2, 0)?;
        let max_segments_accepted = r.read_bits(3).field("max_segments_accepted")? as u8;
        let max_apdu_length_accepted = r.read_bits(4).field("max_apdu_length_accepted")? as u8;
        let invoke_id = r.read_u8().field("invoke_id")?;
        let segment = if segmented {
            Some(SegmentInfo::decode(r)?)
        } else {
            None
        };
        let service = ConfirmedServiceRequest::decode(r, budget.child(r)?).field("service")?;
        Ok(Self {
            more_follows,
            segmented_response_accepted,
            max_segments_accepted,
            max_apdu_length_accepted,
            invoke_id,
            segment,
            service,
        })
    }

    pub(crate) fn encode(&self, w: &mut Writer) -> Result<(), EncodeError> {
        w.write_bit(self.segment.is_some())?;
        w.write_bit(self.more_follows)?;
        w.write_bit(self.segmented_response_accepted)?;
        w.write_bits(2, 0)?;
        w.write_bits(3, u64::from(self.max_segments_accepted))?;
        w.write_bits(4, u64::from(self.max_apdu_length_accepted))?;
        w.write_u8(self.invoke_id)?;
        if let Some(segment) = &self.segment {
            segment.encode(w)?;
        }
        self.service.encode(w)
    }

    pub(crate) fn bit_length(&self) -> u64 {
        12 + 8 + self.segment.map_or(0, |_| 16) + self.service.bit_length()
    }
}

/// BACnet-ComplexACK-PDU.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ComplexAck {
    pub more_follows: bool,
    pub invoke_id: u8,
    pub segment: Option<SegmentInfo>,
    pub service: ServiceAck,
}

impl ComplexAck {
    pub fn new(invoke_id: u8, service: ServiceAck) -> Self {
        Self {
            more_follows: false,
            invoke_id,
            segment: None,
            service,
        }
    }

    pub(crate) fn decode(r: &mut Reader<'_>, budget: LengthBudget) -> Result<Self, DecodeError> {
        let segmented = r.read_bit().field("segmented")?;
        let more_follows = r.read_bit().field("more_follows")?;
        r.check_reserved("complex ack reserved", 2, 0)?;
        let invoke_id = r.read_u8().field("invoke_id")?;
        let segment = if segmented {
            Some(SegmentInfo::decode(r)?)
        } else {
            None
        };
        let service = ServiceAck::decode(r, budget.child(r)?).field("service")?;
        Ok(Self {
            more_follows,
            invoke_id,
            segment,
            service,
        })
    }

    pub(crate) fn encode(&self, w: &mut Writer) -> Result<(), EncodeError> {
        w.write_bit(self.segment.is_some())?;
        w.write_bit(self.more_follows)?;
        w.write_bits(2, 0)?;
        w.write_u8(self.invoke_id)?;
        if let Some(segment) = &self.segment {
            segment.encode(w)?;
        }
        self.service.encode(w)
    }

    pub(crate) fn bit_length(&self) -> u64 {
        4 + 8 + self.segment.map_or(0, |_| 16) + self.service.bit_length()
    }
}

/// BACnet-SimpleACK-PDU. The service choice is kept raw: a simple ack has
/// no payload to dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimpleAck {
    pub invoke_id: u8,
    pub service_choice: u8,
}

impl SimpleAck {
    pub(crate) fn decode(r: &mut Reader<'_>, _: LengthBudget) -> Result<Self, DecodeError> {
        r.check_reserved("simple ack reserved", 4, 0)?;
        Ok(Self {
            invoke_id: r.read_u8().field("invoke_id")?,
            service_choice: r.read_u8().field("service_choice")?,
        })
    }

    pub(crate) fn encode(&self, w: &mut Writer) -> Result<(), EncodeError> {
        w.write_bits(4, 0)?;
        w.write_u8(self.invoke_id)?;
        w.write_u8(self.service_choice)
    }

    pub(crate) const fn bit_length(&self) -> u64 {
        20
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SegmentAck {
    pub negative_ack: bool,
    pub sent_by_server: bool,
    pub invoke_id: u8,
    pub sequence_number: u8,
    pub actual_window_size: u8,
}

impl SegmentAck {
    pub(crate) fn decode(r: &mut Reader<'_>, _: LengthBudget) -> Result<Self, DecodeError> {
        r.check_reserved("segment ack reserved", 2, 0)?;
        Ok(Self {
            negative_ack: r.read_bit().field("negative_ack")?,
            sent_by_server: r.read_bit().field("sent_by_server")?,
            invoke_id: r.read_u8().field("invoke_id")?,
            sequence_number: r.read_u8().field("sequence_number")?,
            actual_window_size: r.read_u8().field("actual_window_size")?,
        })
    }

    pub(crate) fn encode(&self, w: &mut Writer) -> Result<(), EncodeError> {
        w.write_bits(2, 0)?;
        w.write_bit(self.negative_ack)?;
        w.write_bit(self.sent_by_server)?;
        w.write_u8(self.invoke_id)?;
        w.write_u8(self.sequence_number)?;
        w.write_u8(self.actual_window_size)
    }

    pub(crate) const fn bit_length(&self) -> u64 {
        28
    }
}

/// BACnet-Error-PDU.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ErrorPdu {
    pub invoke_id: u8,
    pub error: ServiceError,
}

impl ErrorPdu {
    pub(crate) fn decode(r: &mut Reader<'_>, budget: LengthBudget) -> Result<Self, DecodeError> {
        r.check_reserved("error reserved", 4, 0)?;
        let invoke_id = r.read_u8().field("invoke_id")?;
        let error = ServiceError::decode(r, budget.child(r)?).field("error")?;
        Ok(Self { invoke_id, error })
    }

    pub(crate) fn encode(&self, w: &mut Writer) -> Result<(), EncodeError> {
        w.write_bits(4, 0)?;
        w.write_u8(self.invoke_id)?;
        self.error.encode(w)
    }

    pub(crate) fn bit_length(&self) -> u64 {
        12 + self.error.bit_length()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RejectPdu {
    pub invoke_id: u8,
    pub reason: u8,
}

impl RejectPdu {
    pub(crate) fn decode(r: &mut Reader<'_>, _: LengthBudget) -> Result<Self, DecodeError> {
        r.check_reserved("reject reserved", 4, 0)?;
        Ok(Self {
            invoke_id: r.read_u8().field("invoke_id")?,
            reason: r.read_u8().field("reason")?,
        })
    }

    pub(crate) fn encode(&self, w: &mut Writer) -> Result<(), EncodeError> {
        w.write_bits(4, 0)?;
        w.write_u8(self.invoke_id)?;
        w.write_u8(self.reason)
    }

    pub(crate) const fn bit_length(&self) -> u64 {
        20
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AbortPdu {
    pub server: bool,
    pub invoke_id: u8,
    pub reason: u8,
}

impl AbortPdu {
    pub(crate) fn decode(r: &mut Reader<'_>, _: LengthBudget) -> Result<Self, DecodeError> {
        r.check_reserved("abort reserved", 3, 0)?;
        Ok(Self {
            server: r.read_bit().field("server")?,
            invoke_id: r.read_u8().field("invoke_id")?,
            reason: r.read_u8().field("reason")?,
        })
    }

    pub(crate) fn encode(&self, w: &mut Writer) -> Result<(), EncodeError> {
        w.write_bits(3, 0)?;
        w.write_bit(self.server)?;
        w.write_u8(self.invoke_id)?;
        w.write_u8(self.reason)
    }

    pub(crate) const fn bit_length(&self) -> u64 {
        20
    }
}
