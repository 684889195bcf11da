//! Service payloads carried by confirmed requests, unconfirmed requests,
//! complex acknowledgements and error PDUs.
//!
//! Each family is a closed enum keyed by the 8-bit service choice and decoded
//! through a static [`DispatchTable`]. The [`LengthBudget`] handed to a
//! family's `decode` starts at the service-choice octet and runs to the end of
//! the APDU; services use it to detect optional trailing parameters.

pub mod device_management;
pub mod error;
pub mod i_am;
pub mod object_management;
pub mod private_transfer;
pub mod read_property;
pub mod subscribe_cov;
pub mod vt_close;
pub mod who_is;
pub mod write_property;

pub use device_management::{ReinitializeDeviceRequest, ReinitializeState};
pub use error::ErrorDetail;
pub use i_am::IAmRequest;
pub use object_management::DeleteObjectRequest;
pub use private_transfer::{PrivateTransferAck, PrivateTransferRequest};
pub use read_property::{ReadPropertyAck, ReadPropertyRequest};
pub use subscribe_cov::SubscribeCovRequest;
pub use vt_close::VtCloseRequest;
pub use who_is::WhoIsRequest;
pub use write_property::WritePropertyRequest;

use crate::encoding::{
    budget::LengthBudget,
    dispatch::{Discriminated, DispatchEntry, DispatchTable},
    reader::Reader,
    tag::{Tag, TagValue},
    writer::Writer,
};
use crate::error::ResultExt;
use crate::{DecodeError, EncodeError};

/// Header octet of an object identifier in context tag 0.
pub(crate) const CONTEXT_0_OBJECT_ID: u8 = 0x0C;
/// Header octet of an object identifier in context tag 1.
pub(crate) const CONTEXT_1_OBJECT_ID: u8 = 0x1C;
/// Header octet of an application-tagged object identifier.
pub(crate) const APPLICATION_OBJECT_ID: u8 = 0xC4;

/// Upper five header bits (tag number and class) of context tag `n`.
pub(crate) const fn context_header(n: u8) -> u8 {
    (n << 1) | 1
}

/// Upper five header bits of application tag `n`.
pub(crate) const fn application_header(n: u8) -> u8 {
    n << 1
}

const fn opening_octet(n: u8) -> u8 {
    (n << 4) | 0x0E
}

const fn closing_octet(n: u8) -> u8 {
    (n << 4) | 0x0F
}

/// Tag number and class bits of the next tag, without consuming it.
pub(crate) fn peek_header(r: &Reader<'_>) -> Option<u8> {
    r.peek_bits(5).ok().map(|bits| bits as u8)
}

pub(crate) fn read_opening(r: &mut Reader<'_>, field: &'static str, n: u8) -> Result<(), DecodeError> {
    r.read_const(field, 8, u64::from(opening_octet(n)))?;
    Ok(())
}

pub(crate) fn read_closing(r: &mut Reader<'_>, field: &'static str, n: u8) -> Result<(), DecodeError> {
    r.read_const(field, 8, u64::from(closing_octet(n)))?;
    Ok(())
}

pub(crate) fn write_opening(w: &mut Writer, n: u8) -> Result<(), EncodeError> {
    w.write_u8(opening_octet(n))
}

pub(crate) fn write_closing(w: &mut Writer, n: u8) -> Result<(), EncodeError> {
    w.write_u8(closing_octet(n))
}

/// Reads tags up to, not including, the closing tag `n` at nesting depth zero.
pub(crate) fn read_tags_until_closing(
    r: &mut Reader<'_>,
    field: &'static str,
    n: u8,
) -> Result<Vec<Tag>, DecodeError> {
    let mut tags = Vec::new();
    let mut depth = 0usize;
    loop {
        if depth == 0 && r.peek_u8().field(field)? == closing_octet(n) {
            return Ok(tags);
        }
        let tag = Tag::decode(r).field(field)?;
        match tag.payload {
            TagValue::Opening => depth += 1,
            TagValue::Closing => {
                depth = depth.checked_sub(1).ok_or(DecodeError::ConstantMismatch {
                    field,
                    expected: u64::from(closing_octet(n)),
                    actual: u64::from(tag.number()) << 4 | 0x0F,
                })?;
            }
            _ => {}
        }
        tags.push(tag);
    }
}

pub(crate) fn write_tags(w: &mut Writer, tags: &[Tag]) -> Result<(), EncodeError> {
    tags.iter().try_for_each(|tag| tag.encode(w))
}

pub(crate) fn tags_bit_length(tags: &[Tag]) -> u64 {
    tags.iter().map(Tag::bit_length).sum()
}

/// Service parameters of a BACnet-Confirmed-Request-PDU.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConfirmedServiceRequest {
    SubscribeCov(SubscribeCovRequest),
    DeleteObject(DeleteObjectRequest),
    ReadProperty(ReadPropertyRequest),
    WriteProperty(WritePropertyRequest),
    ConfirmedPrivateTransfer(PrivateTransferRequest),
    ReinitializeDevice(ReinitializeDeviceRequest),
    VtClose(VtCloseRequest),
}

impl Discriminated for ConfirmedServiceRequest {
    fn discriminator(&self) -> u64 {
        u64::from(match self {
            Self::SubscribeCov(_) => subscribe_cov::SERVICE_SUBSCRIBE_COV,
            Self::DeleteObject(_) => object_management::SERVICE_DELETE_OBJECT,
            Self::ReadProperty(_) => read_property::SERVICE_READ_PROPERTY,
            Self::WriteProperty(_) => write_property::SERVICE_WRITE_PROPERTY,
            Self::ConfirmedPrivateTransfer(_) => {
                private_transfer::SERVICE_CONFIRMED_PRIVATE_TRANSFER
            }
            Self::ReinitializeDevice(_) => device_management::SERVICE_REINITIALIZE_DEVICE,
            Self::VtClose(_) => vt_close::SERVICE_VT_CLOSE,
        })
    }
}

impl ConfirmedServiceRequest {
    pub fn service_choice(&self) -> u8 {
        self.discriminator() as u8
    }

    pub fn decode(r: &mut Reader<'_>, budget: LengthBudget) -> Result<Self, DecodeError> {
        CONFIRMED_SERVICES.decode(r, budget)
    }

    pub fn encode(&self, w: &mut Writer) -> Result<(), EncodeError> {
        CONFIRMED_SERVICES.write_discriminator(w, self.discriminator())?;
        match self {
            Self::SubscribeCov(req) => req.encode(w),
            Self::DeleteObject(req) => req.encode(w),
            Self::ReadProperty(req) => req.encode(w),
            Self::WriteProperty(req) => req.encode(w),
            Self::ConfirmedPrivateTransfer(req) => req.encode(w),
            Self::ReinitializeDevice(req) => req.encode(w),
            Self::VtClose(req) => req.encode(w),
        }
    }

    pub fn bit_length(&self) -> u64 {
        8 + match self {
            Self::SubscribeCov(req) => req.bit_length(),
            Self::DeleteObject(req) => req.bit_length(),
            Self::ReadProperty(req) => req.bit_length(),
            Self::WriteProperty(req) => req.bit_length(),
            Self::ConfirmedPrivateTransfer(req) => req.bit_length(),
            Self::ReinitializeDevice(req) => req.bit_length(),
            Self::VtClose(req) => req.bit_length(),
        }
    }
}

type ConfirmedDecode = Result<ConfirmedServiceRequest, DecodeError>;

fn decode_subscribe_cov(r: &mut Reader<'_>, _: u64, budget: LengthBudget) -> ConfirmedDecode {
    SubscribeCovRequest::decode(r, budget).map(ConfirmedServiceRequest::SubscribeCov)
}

fn decode_delete_object(r: &mut Reader<'_>, _: u64, _: LengthBudget) -> ConfirmedDecode {
    DeleteObjectRequest::decode(r).map(ConfirmedServiceRequest::DeleteObject)
}

fn decode_read_property(r: &mut Reader<'_>, _: u64, budget: LengthBudget) -> ConfirmedDecode {
    ReadPropertyRequest::decode(r, budget).map(ConfirmedServiceRequest::ReadProperty)
}

fn decode_write_property(r: &mut Reader<'_>, _: u64, budget: LengthBudget) -> ConfirmedDecode {
    WritePropertyRequest::decode(r, budget).map(ConfirmedServiceRequest::WriteProperty)
}

fn decode_private_transfer(r: &mut Reader<'_>, _: u64, budget: LengthBudget) -> ConfirmedDecode {
    PrivateTransferRequest::decode(r, budget).map(ConfirmedServiceRequest::ConfirmedPrivateTransfer)
}

fn decode_reinitialize_device(
    r: &mut Reader<'_>,
    _: u64,
    budget: LengthBudget,
) -> ConfirmedDecode {
    ReinitializeDeviceRequest::decode(r, budget).map(ConfirmedServiceRequest::ReinitializeDevice)
}

fn decode_vt_close(r: &mut Reader<'_>, _: u64, budget: LengthBudget) -> ConfirmedDecode {
    VtCloseRequest::decode(r, budget).map(ConfirmedServiceRequest::VtClose)
}

const CONFIRMED_SERVICE_ENTRIES: &[DispatchEntry<ConfirmedServiceRequest, LengthBudget>] = &[
    DispatchEntry::exact(
        subscribe_cov::SERVICE_SUBSCRIBE_COV as u64,
        "SubscribeCOV",
        decode_subscribe_cov,
    ),
    DispatchEntry::exact(
        object_management::SERVICE_DELETE_OBJECT as u64,
        "DeleteObject",
        decode_delete_object,
    ),
    DispatchEntry::exact(
        read_property::SERVICE_READ_PROPERTY as u64,
        "ReadProperty",
        decode_read_property,
    ),
    DispatchEntry::exact(
        write_property::SERVICE_WRITE_PROPERTY as u64,
        "WriteProperty",
        decode_write_property,
    ),
    DispatchEntry::exact(
        private_transfer::SERVICE_CONFIRMED_PRIVATE_TRANSFER as u64,
        "ConfirmedPrivateTransfer",
        decode_private_transfer,
    ),
    DispatchEntry::exact(
        device_management::SERVICE_REINITIALIZE_DEVICE as u64,
        "ReinitializeDevice",
        decode_reinitialize_device,
    ),
    DispatchEntry::exact(vt_close::SERVICE_VT_CLOSE as u64, "VTClose", decode_vt_close),
];

/// Confirmed service choices.
pub static CONFIRMED_SERVICES: DispatchTable<ConfirmedServiceRequest, LengthBudget> =
    DispatchTable::new("confirmed service", 8, CONFIRMED_SERVICE_ENTRIES);

/// Service parameters of a BACnet-Unconfirmed-Request-PDU.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UnconfirmedServiceRequest {
    IAm(IAmRequest),
    WhoIs(WhoIsRequest),
}

impl Discriminated for UnconfirmedServiceRequest {
    fn discriminator(&self) -> u64 {
        u64::from(match self {
            Self::IAm(_) => i_am::SERVICE_I_AM,
            Self::WhoIs(_) => who_is::SERVICE_WHO_IS,
        })
    }
}

impl UnconfirmedServiceRequest {
    pub fn service_choice(&self) -> u8 {
        self.discriminator() as u8
    }

    pub fn decode(r: &mut Reader<'_>, budget: LengthBudget) -> Result<Self, DecodeError> {
        UNCONFIRMED_SERVICES.decode(r, budget)
    }

    pub fn encode(&self, w: &mut Writer) -> Result<(), EncodeError> {
        UNCONFIRMED_SERVICES.write_discriminator(w, self.discriminator())?;
        match self {
            Self::IAm(req) => req.encode(w),
            Self::WhoIs(req) => req.encode(w),
        }
    }

    pub fn bit_length(&self) -> u64 {
        8 + match self {
            Self::IAm(req) => req.bit_length(),
            Self::WhoIs(req) => req.bit_length(),
        }
    }
}

fn decode_i_am(
    r: &mut Reader<'_>,
    _: u64,
    _: LengthBudget,
) -> Result<UnconfirmedServiceRequest, DecodeError> {
    IAmRequest::decode(r).map(UnconfirmedServiceRequest::IAm)
}

fn decode_who_is(
    r: &mut Reader<'_>,
    _: u64,
    budget: LengthBudget,
) -> Result<UnconfirmedServiceRequest, DecodeError> {
    WhoIsRequest::decode(r, budget).map(UnconfirmedServiceRequest::WhoIs)
}

const UNCONFIRMED_SERVICE_ENTRIES: &[DispatchEntry<UnconfirmedServiceRequest, LengthBudget>] = &[
    DispatchEntry::exact(i_am::SERVICE_I_AM as u64, "I-Am", decode_i_am),
    DispatchEntry::exact(who_is::SERVICE_WHO_IS as u64, "Who-Is", decode_who_is),
];

/// Unconfirmed service choices.
pub static UNCONFIRMED_SERVICES: DispatchTable<UnconfirmedServiceRequest, LengthBudget> =
    DispatchTable::new("unconfirmed service", 8, UNCONFIRMED_SERVICE_ENTRIES);

/// Results carried by a BACnet-ComplexACK-PDU.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ServiceAck {
    ReadProperty(ReadPropertyAck),
    ConfirmedPrivateTransfer(PrivateTransferAck),
}

impl Discriminated for ServiceAck {
    fn discriminator(&self) -> u64 {
        u64::from(match self {
            Self::ReadProperty(_) => read_property::SERVICE_READ_PROPERTY,
            Self::ConfirmedPrivateTransfer(_) => {
                private_transfer::SERVICE_CONFIRMED_PRIVATE_TRANSFER
            }
        })
    }
}

impl ServiceAck {
    pub fn service_choice(&self) -> u8 {
        self.discriminator() as u8
    }

    pub fn decode(r: &mut Reader<'_>, budget: LengthBudget) -> Result<Self, DecodeError> {
        SERVICE_ACKS.decode(r, budget)
    }

    pub fn encode(&self, w: &mut Writer) -> Result<(), EncodeError> {
        SERVICE_ACKS.write_discriminator(w, self.discriminator())?;
        match self {
            Self::ReadProperty(ack) => ack.encode(w),
            Self::ConfirmedPrivateTransfer(ack) => ack.encode(w),
        }
    }

    pub fn bit_length(&self) -> u64 {
        8 + match self {
            Self::ReadProperty(ack) => ack.bit_length(),
            Self::ConfirmedPrivateTransfer(ack) => ack.bit_length(),
        }
    }
}

fn decode_read_property_ack(
    r: &mut Reader<'_>,
    _: u64,
    _: LengthBudget,
) -> Result<ServiceAck, DecodeError> {
    ReadPropertyAck::decode(r).map(ServiceAck::ReadProperty)
}

fn decode_private_transfer_ack(
    r: &mut Reader<'_>,
    _: u64,
    budget: LengthBudget,
) -> Result<ServiceAck, DecodeError> {
    PrivateTransferAck::decode(r, budget).map(ServiceAck::ConfirmedPrivateTransfer)
}

const SERVICE_ACK_ENTRIES: &[DispatchEntry<ServiceAck, LengthBudget>] = &[
    DispatchEntry::exact(
        read_property::SERVICE_READ_PROPERTY as u64,
        "ReadProperty-ACK",
        decode_read_property_ack,
    ),
    DispatchEntry::exact(
        private_transfer::SERVICE_CONFIRMED_PRIVATE_TRANSFER as u64,
        "ConfirmedPrivateTransfer-ACK",
        decode_private_transfer_ack,
    ),
];

/// Service choices with a complex acknowledgement.
pub static SERVICE_ACKS: DispatchTable<ServiceAck, LengthBudget> =
    DispatchTable::new("service ack", 8, SERVICE_ACK_ENTRIES);

/// Error payload of a BACnet-Error-PDU, keyed by the service that failed.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ServiceError {
    SubscribeCov(ErrorDetail),
    DeleteObject(ErrorDetail),
    ReadProperty(ErrorDetail),
    WriteProperty(ErrorDetail),
    ReinitializeDevice(ErrorDetail),
}

impl Discriminated for ServiceError {
    fn discriminator(&self) -> u64 {
        u64::from(match self {
            Self::SubscribeCov(_) => subscribe_cov::SERVICE_SUBSCRIBE_COV,
            Self::DeleteObject(_) => object_management::SERVICE_DELETE_OBJECT,
            Self::ReadProperty(_) => read_property::SERVICE_READ_PROPERTY,
            Self::WriteProperty(_) => write_property::SERVICE_WRITE_PROPERTY,
            Self::ReinitializeDevice(_) => device_management::SERVICE_REINITIALIZE_DEVICE,
        })
    }
}

impl ServiceError {
    pub fn service_choice(&self) -> u8 {
        self.discriminator() as u8
    }

    pub fn detail(&self) -> &ErrorDetail {
        match self {
            Self::SubscribeCov(d)
            | Self::DeleteObject(d)
            | Self::ReadProperty(d)
            | Self::WriteProperty(d)
            | Self::ReinitializeDevice(d) => d,
        }
    }

    pub fn decode(r: &mut Reader<'_>, budget: LengthBudget) -> Result<Self, DecodeError> {
        SERVICE_ERRORS.decode(r, budget)
    }

    pub fn encode(&self, w: &mut Writer) -> Result<(), EncodeError> {
        SERVICE_ERRORS.write_discriminator(w, self.discriminator())?;
        self.detail().encode(w)
    }

    pub fn bit_length(&self) -> u64 {
        8 + self.detail().bit_length()
    }
}

fn decode_subscribe_cov_error(
    r: &mut Reader<'_>,
    _: u64,
    _: LengthBudget,
) -> Result<ServiceError, DecodeError> {
    ErrorDetail::decode(r).map(ServiceError::SubscribeCov)
}

fn decode_delete_object_error(
    r: &mut Reader<'_>,
    _: u64,
    _: LengthBudget,
) -> Result<ServiceError, DecodeError> {
    ErrorDetail::decode(r).map(ServiceError::DeleteObject)
}

fn decode_read_property_error(
    r: &mut Reader<'_>,
    _: u64,
    _: LengthBudget,
) -> Result<ServiceError, DecodeError> {
    ErrorDetail::decode(r).map(ServiceError::ReadProperty)
}

fn decode_write_property_error(
    r: &mut Reader<'_>,
    _: u64,
    _: LengthBudget,
) -> Result<ServiceError, DecodeError> {
    ErrorDetail::decode(r).map(ServiceError::WriteProperty)
}

fn decode_reinitialize_error(
    r: &mut Reader<'_>,
    _: u64,
    _: LengthBudget,
) -> Result<ServiceError, DecodeError> {
    ErrorDetail::decode(r).map(ServiceError::ReinitializeDevice)
}

const SERVICE_ERROR_ENTRIES: &[DispatchEntry<ServiceError, LengthBudget>] = &[
    DispatchEntry::exact(
        subscribe_cov::SERVICE_SUBSCRIBE_COV as u64,
        "SubscribeCOV-Error",
        decode_subscribe_cov_error,
    ),
    DispatchEntry::exact(
        object_management::SERVICE_DELETE_OBJECT as u64,
        "DeleteObject-Error",
        decode_delete_object_error,
    ),
    DispatchEntry::exact(
        read_property::SERVICE_READ_PROPERTY as u64,
        "ReadProperty-Error",
        decode_read_property_error,
    ),
    DispatchEntry::exact(
        write_property::SERVICE_WRITE_PROPERTY as u64,
        "WriteProperty-Error",
        decode_write_property_error,
    ),
    DispatchEntry::exact(
        device_management::SERVICE_REINITIALIZE_DEVICE as u64,
        "ReinitializeDevice-Error",
        decode_reinitialize_error,
    ),
];

/// Service choices with a modeled error payload.
pub static SERVICE_ERRORS: DispatchTable<ServiceError, LengthBudget> =
    DispatchTable::new("service error", 8, SERVICE_ERROR_ENTRIES);
