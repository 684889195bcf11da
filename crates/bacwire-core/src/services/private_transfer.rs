use crate::encoding::{
    budget::LengthBudget,
    primitives::{read_sized_unsigned, sized_unsigned_bits, write_sized_unsigned},
    reader::Reader,
    tag::Tag,
    writer::Writer,
};
use crate::services::{
    context_header, read_closing, read_opening, read_tags_until_closing, tags_bit_length,
    write_closing, write_opening, write_tags,
};
use crate::{DecodeError, EncodeError};

pub const SERVICE_CONFIRMED_PRIVATE_TRANSFER: u8 = 0x12;

/// Fields shared by the ConfirmedPrivateTransfer request and its ack:
/// `[0]` vendor id, `[1]` service number, optional constructed `[2]` block.
struct Transfer {
    vendor_id: u32,
    service_number: u32,
    block: Option<Vec<Tag>>,
}

impl Transfer {
    fn decode(
        r: &mut Reader<'_>,
        budget: LengthBudget,
        block_field: &'static str,
    ) -> Result<Self, DecodeError> {
        let vendor_id = read_sized_unsigned(r, "vendor_id", context_header(0))?;
        let service_number = read_sized_unsigned(r, "service_number", context_header(1))?;
        let block = if budget.has_optional_field(r) {
            read_opening(r, block_field, 2)?;
            let tags = read_tags_until_closing(r, block_field, 2)?;
            read_closing(r, block_field, 2)?;
            Some(tags)
        } else {
            None
        };
        Ok(Self {
            vendor_id,
            service_number,
            block,
        })
    }
}

fn encode_transfer(
    w: &mut Writer,
    vendor_id: u32,
    service_number: u32,
    block: Option<&[Tag]>,
) -> Result<(), EncodeError> {
    write_sized_unsigned(w, context_header(0), vendor_id)?;
    write_sized_unsigned(w, context_header(1), service_number)?;
    if let Some(tags) = block {
        write_opening(w, 2)?;
        write_tags(w, tags)?;
        write_closing(w, 2)?;
    }
    Ok(())
}

fn transfer_bits(vendor_id: u32, service_number: u32, block: Option<&[Tag]>) -> u64 {
    sized_unsigned_bits(vendor_id)
        + sized_unsigned_bits(service_number)
        + block.map_or(0, |tags| 16 + tags_bit_length(tags))
}

/// ConfirmedPrivateTransfer-Request. Vendor parameters are kept as the tags
/// found between the opening and closing tag 2.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PrivateTransferRequest {
    pub vendor_id: u32,
    pub service_number: u32,
    pub service_parameters: Option<Vec<Tag>>,
}

impl PrivateTransferRequest {
    pub fn decode(r: &mut Reader<'_>, budget: LengthBudget) -> Result<Self, DecodeError> {
        let t = Transfer::decode(r, budget, "service_parameters")?;
        Ok(Self {
            vendor_id: t.vendor_id,
            service_number: t.service_number,
            service_parameters: t.block,
        })
    }

    pub fn encode(&self, w: &mut Writer) -> Result<(), EncodeError> {
        encode_transfer(
            w,
            self.vendor_id,
            self.service_number,
            self.service_parameters.as_deref(),
        )
    }

    pub fn bit_length(&self) -> u64 {
        transfer_bits(
            self.vendor_id,
            self.service_number,
            self.service_parameters.as_deref(),
        )
    }
}

/// ConfirmedPrivateTransfer-ACK.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PrivateTransferAck {
    pub vendor_id: u32,
    pub service_number: u32,
    pub result_block: Option<Vec<Tag>>,
}

impl PrivateTransferAck {
    pub fn decode(r: &mut Reader<'_>, budget: LengthBudget) -> Result<Self, DecodeError> {
        let t = Transfer::decode(r, budget, "result_block")?;
        Ok(Self {
            vendor_id: t.vendor_id,
            service_number: t.service_number,
            result_block: t.block,
        })
    }

    pub fn encode(&self, w: &mut Writer) -> Result<(), EncodeError> {
        encode_transfer(
            w,
            self.vendor_id,
            self.service_number,
            self.result_block.as_deref(),
        )
    }

    pub fn bit_length(&self) -> u64 {
        transfer_bits(
            self.vendor_id,
            self.service_number,
            self.result_block.as_deref(),
        )
    }
}
