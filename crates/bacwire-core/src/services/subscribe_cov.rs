use crate::encoding::{
    budget::LengthBudget,
    primitives::{
        read_object_id_field, read_sized_unsigned, sized_unsigned_bits, write_object_id_field,
        write_sized_unsigned,
    },
    reader::Reader,
    writer::Writer,
};
use crate::error::ResultExt;
use crate::services::{context_header, CONTEXT_1_OBJECT_ID};
use crate::types::ObjectId;
use crate::{DecodeError, EncodeError};

pub const SERVICE_SUBSCRIBE_COV: u8 = 0x05;

/// Context tag 2 with a one octet payload.
const ISSUE_CONFIRMED_HEADER: u8 = 0x29;

/// SubscribeCOV-Request. A request without the two trailing parameters
/// cancels the subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SubscribeCovRequest {
    pub subscriber_process_id: u32,
    pub monitored_object_id: ObjectId,
    pub issue_confirmed_notifications: Option<bool>,
    pub lifetime_seconds: Option<u32>,
}

impl SubscribeCovRequest {
    pub fn cancel(subscriber_process_id: u32, monitored_object_id: ObjectId) -> Self {
        Self {
            subscriber_process_id,
            monitored_object_id,
            issue_confirmed_notifications: None,
            lifetime_seconds: None,
        }
    }

    pub fn decode(r: &mut Reader<'_>, budget: LengthBudget) -> Result<Self, DecodeError> {
        let subscriber_process_id =
            read_sized_unsigned(r, "subscriber_process_id", context_header(0))?;
        let monitored_object_id =
            read_object_id_field(r, "monitored_object_id", CONTEXT_1_OBJECT_ID)?;
        let issue_confirmed_notifications = if budget.has_optional_field(r) {
            r.read_const("issue_confirmed_notifications", 8, u64::from(ISSUE_CONFIRMED_HEADER))?;
            r.check_reserved("issue_confirmed_notifications", 7, 0)?;
            Some(r.read_bit().field("issue_confirmed_notifications")?)
        } else {
            None
        };
        let lifetime_seconds = if budget.has_optional_field(r) {
            Some(read_sized_unsigned(r, "lifetime", context_header(3))?)
        } else {
            None
        };
        Ok(Self {
            subscriber_process_id,
            monitored_object_id,
            issue_confirmed_notifications,
            lifetime_seconds,
        })
    }

    pub fn encode(&self, w: &mut Writer) -> Result<(), EncodeError> {
        if self.lifetime_seconds.is_some() && self.issue_confirmed_notifications.is_none() {
            return Err(EncodeError::MissingField(
                "lifetime_seconds",
                "issue_confirmed_notifications",
            ));
        }
        write_sized_unsigned(w, context_header(0), self.subscriber_process_id)?;
        write_object_id_field(w, CONTEXT_1_OBJECT_ID, self.monitored_object_id)?;
        if let Some(issue) = self.issue_confirmed_notifications {
            w.write_u8(ISSUE_CONFIRMED_HEADER)?;
            w.write_u8(u8::from(issue))?;
        }
        if let Some(lifetime) = self.lifetime_seconds {
            write_sized_unsigned(w, context_header(3), lifetime)?;
        }
        Ok(())
    }

    pub fn bit_length(&self) -> u64 {
        sized_unsigned_bits(self.subscriber_process_id)
            + 40
            + self.issue_confirmed_notifications.map_or(0, |_| 16)
            + self.lifetime_seconds.map_or(0, sized_unsigned_bits)
    }
}
