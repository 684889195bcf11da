use crate::encoding::dispatch::{DispatchEntry, DispatchTable};
use crate::encoding::primitives::{
    bytes_to_signed, bytes_to_unsigned, signed_to_bytes, unsigned_to_bytes,
};
use crate::encoding::{reader::Reader, writer::Writer};
use crate::error::ResultExt;
use crate::types::{Date, ObjectId, Time};
use crate::{DecodeError, EncodeError};

/// Tag-number value announcing an extended tag number octet.
pub const EXTENDED_TAG_NUMBER: u8 = 15;
/// Length/value/type announcing an extended length.
pub const EXTENDED_LENGTH: u8 = 5;
/// Context length/value/type of an opening tag.
pub const OPENING_TAG: u8 = 6;
/// Context length/value/type of a closing tag.
pub const CLOSING_TAG: u8 = 7;
/// Character set octet for UTF-8.
pub const CHARSET_UTF8: u8 = 0;

const EXT_LENGTH_U16: u8 = 254;
const EXT_LENGTH_U32: u8 = 255;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AppTag {
    Null = 0,
    Boolean = 1,
    UnsignedInt = 2,
    SignedInt = 3,
    Real = 4,
    Double = 5,
    OctetString = 6,
    CharacterString = 7,
    BitString = 8,
    Enumerated = 9,
    Date = 10,
    Time = 11,
    ObjectId = 12,
}

/// Payload of a BACnet tag.
///
/// Integer payloads keep the exact octets seen on the wire, so a decoded tag
/// re-encodes to the same bytes even when the sender did not use the minimal
/// width.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TagValue {
    Null,
    Boolean(bool),
    UnsignedInt(Vec<u8>),
    SignedInt(Vec<u8>),
    Real(f32),
    Double(f64),
    OctetString(Vec<u8>),
    CharacterString { character_set: u8, bytes: Vec<u8> },
    BitString { unused_bits: u8, bytes: Vec<u8> },
    Enumerated(Vec<u8>),
    Date(Date),
    Time(Time),
    ObjectIdentifier(ObjectId),
    /// Context-specific data; its type is only known to the enclosing service.
    Context(Vec<u8>),
    Opening,
    Closing,
}

impl TagValue {
    pub fn unsigned(value: u64) -> Self {
        Self::UnsignedInt(unsigned_to_bytes(value))
    }

    pub fn signed(value: i64) -> Self {
        Self::SignedInt(signed_to_bytes(value))
    }

    pub fn enumerated(value: u64) -> Self {
        Self::Enumerated(unsigned_to_bytes(value))
    }

    pub fn character_string(value: &str) -> Self {
        Self::CharacterString {
            character_set: CHARSET_UTF8,
            bytes: value.as_bytes().to_vec(),
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::UnsignedInt(b) | Self::Enumerated(b) | Self::Context(b) => bytes_to_unsigned(b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::SignedInt(b) => bytes_to_signed(b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::CharacterString {
                character_set: CHARSET_UTF8,
                bytes,
            } => core::str::from_utf8(bytes).ok(),
            _ => None,
        }
    }

    pub const fn application_tag(&self) -> Option<AppTag> {
        Some(match self {
            Self::Null => AppTag::Null,
            Self::Boolean(_) => AppTag::Boolean,
            Self::UnsignedInt(_) => AppTag::UnsignedInt,
            Self::SignedInt(_) => AppTag::SignedInt,
            Self::Real(_) => AppTag::Real,
            Self::Double(_) => AppTag::Double,
            Self::OctetString(_) => AppTag::OctetString,
            Self::CharacterString { .. } => AppTag::CharacterString,
            Self::BitString { .. } => AppTag::BitString,
            Self::Enumerated(_) => AppTag::Enumerated,
            Self::Date(_) => AppTag::Date,
            Self::Time(_) => AppTag::Time,
            Self::ObjectIdentifier(_) => AppTag::ObjectId,
            Self::Context(_) | Self::Opening | Self::Closing => return None,
        })
    }

    /// Octets that follow the tag header on the wire.
    pub fn payload_len(&self) -> usize {
        match self {
            Self::Null | Self::Boolean(_) | Self::Opening | Self::Closing => 0,
            Self::UnsignedInt(b)
            | Self::SignedInt(b)
            | Self::OctetString(b)
            | Self::Enumerated(b)
            | Self::Context(b) => b.len(),
            Self::CharacterString { bytes, .. } | Self::BitString { bytes, .. } => 1 + bytes.len(),
            Self::Real(_) | Self::Date(_) | Self::Time(_) | Self::ObjectIdentifier(_) => 4,
            Self::Double(_) => 8,
        }
    }

    fn encode_payload(&self, w: &mut Writer) -> Result<(), EncodeError> {
        match self {
            Self::Null | Self::Boolean(_) | Self::Opening | Self::Closing => Ok(()),
            Self::UnsignedInt(b)
            | Self::SignedInt(b)
            | Self::OctetString(b)
            | Self::Enumerated(b)
            | Self::Context(b) => w.write_all(b),
            Self::CharacterString {
                character_set,
                bytes,
            } => {
                w.write_u8(*character_set)?;
                w.write_all(bytes)
            }
            Self::BitString { unused_bits, bytes } => {
                w.write_u8(*unused_bits)?;
                w.write_all(bytes)
            }
            Self::Real(v) => w.write_f32(*v),
            Self::Double(v) => w.write_f64(*v),
            Self::Date(d) => d.encode(w),
            Self::Time(t) => t.encode(w),
            Self::ObjectIdentifier(id) => id.encode(w),
        }
    }
}

/// Extended length octets as written on the wire. Senders may pick a wider
/// form than the value needs; keeping it makes re-encoding byte-exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExtendedLength {
    /// One octet, below 254.
    Octet(u8),
    /// Marker 254 followed by a big-endian u16.
    Word(u16),
    /// Marker 255 followed by a big-endian u32.
    Long(u32),
}

impl ExtendedLength {
    /// Shortest form holding `len`.
    pub const fn minimal(len: u32) -> Self {
        if len < EXT_LENGTH_U16 as u32 {
            Self::Octet(len as u8)
        } else if len <= u16::MAX as u32 {
            Self::Word(len as u16)
        } else {
            Self::Long(len)
        }
    }

    pub const fn value(self) -> u32 {
        match self {
            Self::Octet(v) => v as u32,
            Self::Word(v) => v as u32,
            Self::Long(v) => v,
        }
    }

    pub const fn is_minimal(self) -> bool {
        matches!(
            (self, Self::minimal(self.value())),
            (Self::Octet(_), Self::Octet(_))
                | (Self::Word(_), Self::Word(_))
                | (Self::Long(_), Self::Long(_))
        )
    }

    const fn bit_length(self) -> u64 {
        match self {
            Self::Octet(_) => 8,
            Self::Word(_) => 24,
            Self::Long(_) => 40,
        }
    }

    fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        Ok(match r.read_u8()? {
            EXT_LENGTH_U16 => Self::Word(r.read_be_u16()?),
            EXT_LENGTH_U32 => Self::Long(r.read_be_u32()?),
            short => Self::Octet(short),
        })
    }

    fn encode(self, w: &mut Writer) -> Result<(), EncodeError> {
        match self {
            Self::Octet(v) if v >= EXT_LENGTH_U16 => Err(EncodeError::TagMismatch(
                "one-octet extended length collides with a marker",
            )),
            Self::Octet(v) => w.write_u8(v),
            Self::Word(v) => {
                w.write_u8(EXT_LENGTH_U16)?;
                w.write_be_u16(v)
            }
            Self::Long(v) => {
                w.write_u8(EXT_LENGTH_U32)?;
                w.write_be_u32(v)
            }
        }
    }
}

/// A BACnet tag: header fields exactly as found on the wire plus payload.
///
/// `tag_number` and `length_value_type` are the raw 4-bit and 3-bit header
/// fields. `ext_tag_number` is present iff `tag_number` is 15 and
/// `ext_length` iff `length_value_type` is 5 (except for application
/// booleans, whose length/value/type field holds the value itself).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tag {
    pub tag_number: u8,
    pub is_context_specific: bool,
    pub length_value_type: u8,
    pub ext_tag_number: Option<u8>,
    pub ext_length: Option<ExtendedLength>,
    pub payload: TagValue,
}

fn split_number(number: u8) -> (u8, Option<u8>) {
    if number >= EXTENDED_TAG_NUMBER {
        (EXTENDED_TAG_NUMBER, Some(number))
    } else {
        (number, None)
    }
}

fn split_length(len: usize) -> Result<(u8, Option<ExtendedLength>), EncodeError> {
    if len < usize::from(EXTENDED_LENGTH) {
        return Ok((len as u8, None));
    }
    let len = u32::try_from(len).map_err(|_| EncodeError::InvalidLength {
        field: "tag payload",
        length: len as u64,
    })?;
    Ok((EXTENDED_LENGTH, Some(ExtendedLength::minimal(len))))
}

impl Tag {
    /// Builds an application tag with the canonical header for `payload`.
    pub fn application(payload: TagValue) -> Result<Self, EncodeError> {
        let number = payload
            .application_tag()
            .ok_or(EncodeError::TagMismatch("payload is not an application value"))?
            as u8;
        let (length_value_type, ext_length) = match payload {
            TagValue::Boolean(v) => (u8::from(v), None),
            ref other => split_length(other.payload_len())?,
        };
        Ok(Self {
            tag_number: number,
            is_context_specific: false,
            length_value_type,
            ext_tag_number: None,
            ext_length,
            payload,
        })
    }

    pub fn context(number: u8, data: Vec<u8>) -> Result<Self, EncodeError> {
        let (tag_number, ext_tag_number) = split_number(number);
        let (length_value_type, ext_length) = split_length(data.len())?;
        Ok(Self {
            tag_number,
            is_context_specific: true,
            length_value_type,
            ext_tag_number,
            ext_length,
            payload: TagValue::Context(data),
        })
    }

    pub fn context_unsigned(number: u8, value: u64) -> Self {
        let (tag_number, ext_tag_number) = split_number(number);
        let data = unsigned_to_bytes(value);
        Self {
            tag_number,
            is_context_specific: true,
            length_value_type: data.len() as u8,
            ext_tag_number,
            ext_length: None,
            payload: TagValue::Context(data),
        }
    }

    pub fn opening(number: u8) -> Self {
        Self::delimiter(number, OPENING_TAG, TagValue::Opening)
    }

    pub fn closing(number: u8) -> Self {
        Self::delimiter(number, CLOSING_TAG, TagValue::Closing)
    }

    fn delimiter(number: u8, length_value_type: u8, payload: TagValue) -> Self {
        let (tag_number, ext_tag_number) = split_number(number);
        Self {
            tag_number,
            is_context_specific: true,
            length_value_type,
            ext_tag_number,
            ext_length: None,
            payload,
        }
    }

    /// Effective tag number, after resolving the extended-tag escape.
    pub fn number(&self) -> u8 {
        self.ext_tag_number.unwrap_or(self.tag_number)
    }

    /// Effective payload length, after resolving the extended-length escape.
    pub fn length(&self) -> u32 {
        self.ext_length
            .map_or(u32::from(self.length_value_type), ExtendedLength::value)
    }

    pub fn is_opening(&self, number: u8) -> bool {
        matches!(self.payload, TagValue::Opening) && self.number() == number
    }

    pub fn is_closing(&self, number: u8) -> bool {
        matches!(self.payload, TagValue::Closing) && self.number() == number
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let tag_number = r.read_bits(4).field("tag_number")? as u8;
        let is_context_specific = r.read_bit().field("class")?;
        let length_value_type = r.read_bits(3).field("length_value_type")? as u8;
        let ext_tag_number = if tag_number == EXTENDED_TAG_NUMBER {
            Some(r.read_u8().field("ext_tag_number")?)
        } else {
            None
        };
        let number = ext_tag_number.unwrap_or(tag_number);

        if is_context_specific && length_value_type >= OPENING_TAG {
            let payload = if length_value_type == OPENING_TAG {
                TagValue::Opening
            } else {
                TagValue::Closing
            };
            return Ok(Self {
                tag_number,
                is_context_specific,
                length_value_type,
                ext_tag_number,
                ext_length: None,
                payload,
            });
        }

        let app_boolean = !is_context_specific && number == AppTag::Boolean as u8;
        let ext_length = if length_value_type == EXTENDED_LENGTH && !app_boolean {
            Some(ExtendedLength::decode(r).field("ext_length")?)
        } else {
            None
        };
        let header = TagHeader {
            length_value_type,
            length: ext_length.map_or(u32::from(length_value_type), ExtendedLength::value),
        };

        let payload = if is_context_specific {
            TagValue::Context(r.read_bytes(header.length as usize).field("context data")?)
        } else {
            APPLICATION_TAGS.dispatch(u64::from(number), r, header)?
        };

        Ok(Self {
            tag_number,
            is_context_specific,
            length_value_type,
            ext_tag_number,
            ext_length,
            payload,
        })
    }

    pub fn encode(&self, w: &mut Writer) -> Result<(), EncodeError> {
        self.check_header()?;
        w.write_bits(4, u64::from(self.tag_number))?;
        w.write_bit(self.is_context_specific)?;
        w.write_bits(3, u64::from(self.length_value_type))?;
        if let Some(ext) = self.ext_tag_number {
            w.write_u8(ext)?;
        }
        if let Some(len) = self.ext_length {
            len.encode(w)?;
        }
        self.payload.encode_payload(w)
    }

    pub fn bit_length(&self) -> u64 {
        let mut bits = 8;
        if self.ext_tag_number.is_some() {
            bits += 8;
        }
        if let Some(len) = self.ext_length {
            bits += len.bit_length();
        }
        bits + 8 * self.payload.payload_len() as u64
    }

    fn check_header(&self) -> Result<(), EncodeError> {
        if (self.tag_number == EXTENDED_TAG_NUMBER) != self.ext_tag_number.is_some() {
            return Err(EncodeError::TagMismatch("extended tag number"));
        }
        if self.length_value_type > CLOSING_TAG {
            return Err(EncodeError::TagMismatch("length/value/type wider than 3 bits"));
        }
        if self.is_context_specific != self.payload.application_tag().is_none() {
            return Err(EncodeError::TagMismatch("class"));
        }
        if let Some(app) = self.payload.application_tag() {
            if self.number() != app as u8 {
                return Err(EncodeError::TagMismatch("application tag number"));
            }
        }
        match &self.payload {
            TagValue::Opening if self.length_value_type != OPENING_TAG => {
                Err(EncodeError::TagMismatch("opening tag"))
            }
            TagValue::Closing if self.length_value_type != CLOSING_TAG => {
                Err(EncodeError::TagMismatch("closing tag"))
            }
            TagValue::Opening | TagValue::Closing => {
                if self.ext_length.is_some() {
                    return Err(EncodeError::TagMismatch("delimiter with length"));
                }
                Ok(())
            }
            TagValue::Boolean(v) => {
                if self.length_value_type != u8::from(*v) || self.ext_length.is_some() {
                    return Err(EncodeError::TagMismatch("boolean value"));
                }
                Ok(())
            }
            payload => {
                if self.length_value_type > EXTENDED_LENGTH
                    || (self.length_value_type == EXTENDED_LENGTH) != self.ext_length.is_some()
                {
                    return Err(EncodeError::TagMismatch("extended length"));
                }
                if self.length() as usize != payload.payload_len() {
                    return Err(EncodeError::TagMismatch("length"));
                }
                Ok(())
            }
        }
    }
}

/// Header facts the application-tag decoders need.
#[derive(Debug, Clone, Copy)]
pub struct TagHeader {
    pub length_value_type: u8,
    pub length: u32,
}

impl TagHeader {
    fn expect_length(self, field: &'static str, expected: u32) -> Result<(), DecodeError> {
        if self.length != expected {
            return Err(DecodeError::InvalidLength {
                field,
                length: u64::from(self.length),
            });
        }
        Ok(())
    }

    fn non_empty(self, field: &'static str) -> Result<usize, DecodeError> {
        if self.length == 0 {
            return Err(DecodeError::InvalidLength { field, length: 0 });
        }
        Ok(self.length as usize - 1)
    }

    fn plain_length(self) -> Result<usize, DecodeError> {
        if self.length_value_type > EXTENDED_LENGTH {
            return Err(DecodeError::InvalidLength {
                field: "length_value_type",
                length: u64::from(self.length_value_type),
            });
        }
        Ok(self.length as usize)
    }
}

type AppDecode = Result<TagValue, DecodeError>;

fn decode_null(_: &mut Reader<'_>, _: u64, h: TagHeader) -> AppDecode {
    h.plain_length()?;
    h.expect_length("null", 0)?;
    Ok(TagValue::Null)
}

fn decode_boolean(_: &mut Reader<'_>, _: u64, h: TagHeader) -> AppDecode {
    match h.length_value_type {
        0 => Ok(TagValue::Boolean(false)),
        1 => Ok(TagValue::Boolean(true)),
        other => Err(DecodeError::InvalidValue {
            field: "boolean",
            value: u64::from(other),
        }),
    }
}

fn decode_unsigned(r: &mut Reader<'_>, _: u64, h: TagHeader) -> AppDecode {
    Ok(TagValue::UnsignedInt(r.read_bytes(h.plain_length()?)?))
}

fn decode_signed(r: &mut Reader<'_>, _: u64, h: TagHeader) -> AppDecode {
    Ok(TagValue::SignedInt(r.read_bytes(h.plain_length()?)?))
}

fn decode_real(r: &mut Reader<'_>, _: u64, h: TagHeader) -> AppDecode {
    h.plain_length()?;
    h.expect_length("real", 4)?;
    Ok(TagValue::Real(r.read_f32()?))
}

fn decode_double(r: &mut Reader<'_>, _: u64, h: TagHeader) -> AppDecode {
    h.plain_length()?;
    h.expect_length("double", 8)?;
    Ok(TagValue::Double(r.read_f64()?))
}

fn decode_octet_string(r: &mut Reader<'_>, _: u64, h: TagHeader) -> AppDecode {
    Ok(TagValue::OctetString(r.read_bytes(h.plain_length()?)?))
}

fn decode_character_string(r: &mut Reader<'_>, _: u64, h: TagHeader) -> AppDecode {
    h.plain_length()?;
    let len = h.non_empty("character string")?;
    Ok(TagValue::CharacterString {
        character_set: r.read_u8()?,
        bytes: r.read_bytes(len)?,
    })
}

fn decode_bit_string(r: &mut Reader<'_>, _: u64, h: TagHeader) -> AppDecode {
    h.plain_length()?;
    let len = h.non_empty("bit string")?;
    Ok(TagValue::BitString {
        unused_bits: r.read_u8()?,
        bytes: r.read_bytes(len)?,
    })
}

fn decode_enumerated(r: &mut Reader<'_>, _: u64, h: TagHeader) -> AppDecode {
    Ok(TagValue::Enumerated(r.read_bytes(h.plain_length()?)?))
}

fn decode_date(r: &mut Reader<'_>, _: u64, h: TagHeader) -> AppDecode {
    h.plain_length()?;
    h.expect_length("date", 4)?;
    Ok(TagValue::Date(Date::decode(r)?))
}

fn decode_time(r: &mut Reader<'_>, _: u64, h: TagHeader) -> AppDecode {
    h.plain_length()?;
    h.expect_length("time", 4)?;
    Ok(TagValue::Time(Time::decode(r)?))
}

fn decode_object_id(r: &mut Reader<'_>, _: u64, h: TagHeader) -> AppDecode {
    h.plain_length()?;
    h.expect_length("object identifier", 4)?;
    Ok(TagValue::ObjectIdentifier(ObjectId::decode(r)?))
}

const APPLICATION_TAG_ENTRIES: &[DispatchEntry<TagValue, TagHeader>] = &[
    DispatchEntry::exact(AppTag::Null as u64, "Null", decode_null),
    DispatchEntry::exact(AppTag::Boolean as u64, "Boolean", decode_boolean),
    DispatchEntry::exact(AppTag::UnsignedInt as u64, "UnsignedInt", decode_unsigned),
    DispatchEntry::exact(AppTag::SignedInt as u64, "SignedInt", decode_signed),
    DispatchEntry::exact(AppTag::Real as u64, "Real", decode_real),
    DispatchEntry::exact(AppTag::Double as u64, "Double", decode_double),
    DispatchEntry::exact(AppTag::OctetString as u64, "OctetString", decode_octet_string),
    DispatchEntry::exact(
        AppTag::CharacterString as u64,
        "CharacterString",
        decode_character_string,
    ),
    DispatchEntry::exact(AppTag::BitString as u64, "BitString", decode_bit_string),
    DispatchEntry::exact(AppTag::Enumerated as u64, "Enumerated", decode_enumerated),
    DispatchEntry::exact(AppTag::Date as u64, "Date", decode_date),
    DispatchEntry::exact(AppTag::Time as u64, "Time", decode_time),
    DispatchEntry::exact(AppTag::ObjectId as u64, "ObjectIdentifier", decode_object_id),
];

/// Application tag numbers and their payload decoders.
pub static APPLICATION_TAGS: DispatchTable<TagValue, TagHeader> =
    DispatchTable::new("application tag", 8, APPLICATION_TAG_ENTRIES);

#[cfg(test)]
mod tests {
    use super::{ExtendedLength, Tag, TagValue, APPLICATION_TAGS};
    use crate::encoding::{reader::Reader, writer::Writer};
    use crate::types::{Date, ObjectId, ObjectType, Time};
    use crate::{DecodeError, EncodeError};
    use proptest::prelude::*;

    fn encode(tag: &Tag) -> Vec<u8> {
        let mut w = Writer::new();
        tag.encode(&mut w).unwrap();
        w.into_bytes()
    }

    fn decode(bytes: &[u8]) -> Result<Tag, DecodeError> {
        Tag::decode(&mut Reader::new(bytes))
    }

    #[test]
    fn enumerated_zero() {
        let tag = decode(&[0x91, 0x00]).unwrap();
        assert_eq!(tag.tag_number, 9);
        assert!(!tag.is_context_specific);
        assert_eq!(tag.length_value_type, 1);
        assert_eq!(tag.ext_tag_number, None);
        assert_eq!(tag.ext_length, None);
        assert_eq!(tag.payload, TagValue::Enumerated(vec![0x00]));
        assert_eq!(tag.payload.as_u64(), Some(0));
        assert_eq!(encode(&tag), vec![0x91, 0x00]);
    }

    #[test]
    fn boolean_value_lives_in_header() {
        let tag = decode(&[0x11]).unwrap();
        assert_eq!(tag.payload, TagValue::Boolean(true));
        assert_eq!(tag.bit_length(), 8);
        assert_eq!(
            decode(&[0x12]).unwrap_err().root(),
            &DecodeError::InvalidValue {
                field: "boolean",
                value: 2
            }
        );
        // lvt 5 on a boolean is a bad value, not an extended length.
        assert!(matches!(
            decode(&[0x15, 0x01]).unwrap_err().root(),
            DecodeError::InvalidValue { value: 5, .. }
        ));
    }

    #[test]
    fn extended_tag_number_and_length() {
        let tag = Tag::context(30, vec![0xAA; 300]).unwrap();
        assert_eq!(tag.tag_number, 15);
        assert_eq!(tag.ext_tag_number, Some(30));
        let bytes = encode(&tag);
        assert_eq!(&bytes[..5], &[0xFD, 30, 254, 0x01, 0x2C]);
        assert_eq!(bytes.len(), 305);
        assert_eq!(decode(&bytes).unwrap(), tag);
    }

    #[test]
    fn four_octet_extended_length() {
        let tag = Tag::application(TagValue::OctetString(vec![0; 70_000])).unwrap();
        let bytes = encode(&tag);
        assert_eq!(&bytes[..6], &[0x65, 255, 0x00, 0x01, 0x11, 0x70]);
        assert_eq!(tag.bit_length(), 8 * bytes.len() as u64);
        assert_eq!(decode(&bytes).unwrap(), tag);
    }

    #[test]
    fn one_octet_extended_length_below_five_is_kept() {
        let tag = decode(&[0x25, 0x02, 0x01, 0x00]).unwrap();
        assert_eq!(tag.ext_length, Some(ExtendedLength::Octet(2)));
        assert_eq!(tag.payload.as_u64(), Some(256));
        assert_eq!(encode(&tag), vec![0x25, 0x02, 0x01, 0x00]);
    }

    #[test]
    fn wide_length_form_is_kept() {
        let bytes = [0x65, 0xFE, 0x00, 0x03, 0x01, 0x02, 0x03];
        let tag = decode(&bytes).unwrap();
        assert_eq!(tag.ext_length, Some(ExtendedLength::Word(3)));
        assert_eq!(tag.length(), 3);
        assert_eq!(tag.payload, TagValue::OctetString(vec![1, 2, 3]));
        assert_eq!(tag.bit_length(), 8 * bytes.len() as u64);
        assert_eq!(encode(&tag), bytes);
    }

    #[test]
    fn extended_length_forms() {
        assert_eq!(ExtendedLength::minimal(253), ExtendedLength::Octet(253));
        assert_eq!(ExtendedLength::minimal(254), ExtendedLength::Word(254));
        assert_eq!(ExtendedLength::minimal(65_536), ExtendedLength::Long(65_536));
        assert!(ExtendedLength::Word(300).is_minimal());
        assert!(!ExtendedLength::Word(3).is_minimal());
        assert!(!ExtendedLength::Long(3).is_minimal());

        let mut tag = Tag::application(TagValue::OctetString(vec![0; 254])).unwrap();
        tag.ext_length = Some(ExtendedLength::Octet(254));
        assert_eq!(
            tag.encode(&mut Writer::new()).unwrap_err(),
            EncodeError::TagMismatch("one-octet extended length collides with a marker")
        );
    }

    #[test]
    fn opening_and_closing() {
        assert!(decode(&[0x3E]).unwrap().is_opening(3));
        assert!(decode(&[0x3F]).unwrap().is_closing(3));
        assert_eq!(encode(&Tag::opening(20)), vec![0xFE, 20]);
    }

    #[test]
    fn typed_payloads() {
        let date = Date {
            year_since_1900: 124,
            month: 2,
            day: 29,
            weekday: 4,
        };
        let tag = decode(&[0xA4, 124, 2, 29, 4]).unwrap();
        assert_eq!(tag.payload, TagValue::Date(date));

        let tag = decode(&[0xC4, 0x02, 0x00, 0x00, 0x7B]).unwrap();
        assert_eq!(
            tag.payload,
            TagValue::ObjectIdentifier(ObjectId::new(ObjectType::Device, 123))
        );

        let tag = decode(&[0x75, 0x06, 0x00, b'h', b'e', b'l', b'l', b'o']).unwrap();
        assert_eq!(tag.payload.as_str(), Some("hello"));

        let tag = decode(&[0x44, 0x42, 0x28, 0x00, 0x00]).unwrap();
        assert_eq!(tag.payload, TagValue::Real(42.0));

        let tag = decode(&[0x31, 0xFE]).unwrap();
        assert_eq!(tag.payload.as_i64(), Some(-2));
    }

    #[test]
    fn fixed_width_payloads_reject_other_lengths() {
        assert!(matches!(
            decode(&[0x43, 0, 0, 0]).unwrap_err().root(),
            DecodeError::InvalidLength { field: "real", length: 3 }
        ));
        assert!(matches!(
            decode(&[0x26]).unwrap_err().root(),
            DecodeError::InvalidLength { field: "length_value_type", length: 6 }
        ));
        assert!(matches!(
            decode(&[0x70]).unwrap_err().root(),
            DecodeError::InvalidLength { field: "character string", length: 0 }
        ));
    }

    #[test]
    fn reserved_application_numbers_are_unknown() {
        assert_eq!(
            decode(&[0xD0]).unwrap_err(),
            DecodeError::UnknownVariant {
                frame: "application tag",
                discriminator: 13
            }
        );
        assert!(matches!(
            decode(&[0xF0, 40]).unwrap_err(),
            DecodeError::UnknownVariant { discriminator: 40, .. }
        ));
        assert!(APPLICATION_TAGS.find_overlap().is_none());
    }

    #[test]
    fn inconsistent_headers_are_refused() {
        let mut tag = Tag::application(TagValue::unsigned(7)).unwrap();
        tag.length_value_type = 2;
        assert_eq!(
            tag.encode(&mut Writer::new()).unwrap_err(),
            EncodeError::TagMismatch("length")
        );
        assert!(Tag::application(TagValue::Context(vec![])).is_err());
    }

    fn app_value() -> impl Strategy<Value = TagValue> {
        prop_oneof![
            Just(TagValue::Null),
            any::<bool>().prop_map(TagValue::Boolean),
            any::<u64>().prop_map(TagValue::unsigned),
            any::<i64>().prop_map(TagValue::signed),
            any::<i32>().prop_map(|v| TagValue::Real(v as f32)),
            any::<i64>().prop_map(|v| TagValue::Double(v as f64)),
            proptest::collection::vec(any::<u8>(), 0..600).prop_map(TagValue::OctetString),
            ".{0,40}".prop_map(|s: String| TagValue::character_string(&s)),
            (0u8..8, proptest::collection::vec(any::<u8>(), 0..8))
                .prop_map(|(unused_bits, bytes)| TagValue::BitString { unused_bits, bytes }),
            any::<u32>().prop_map(|v| TagValue::enumerated(u64::from(v))),
            any::<[u8; 4]>().prop_map(|b| TagValue::Time(Time {
                hour: b[0],
                minute: b[1],
                second: b[2],
                hundredths: b[3],
            })),
            any::<u32>().prop_map(|raw| TagValue::ObjectIdentifier(ObjectId::from_raw(raw))),
        ]
    }

    proptest! {
        #[test]
        fn application_tags_round_trip(value in app_value()) {
            let tag = Tag::application(value).unwrap();
            let bytes = encode(&tag);
            prop_assert_eq!(tag.bit_length(), 8 * bytes.len() as u64);
            prop_assert_eq!(decode(&bytes).unwrap(), tag);
        }

        #[test]
        fn context_tags_round_trip(number in any::<u8>(), data in proptest::collection::vec(any::<u8>(), 0..300)) {
            let tag = Tag::context(number, data).unwrap();
            let bytes = encode(&tag);
            prop_assert_eq!(tag.bit_length(), 8 * bytes.len() as u64);
            prop_assert_eq!(decode(&bytes).unwrap(), tag);
        }

        #[test]
        fn wide_length_forms_round_trip(
            data in proptest::collection::vec(any::<u8>(), 0..40),
            long in any::<bool>(),
        ) {
            let mut bytes = vec![0x65];
            if long {
                bytes.push(0xFF);
                bytes.extend_from_slice(&(data.len() as u32).to_be_bytes());
            } else {
                bytes.push(0xFE);
                bytes.extend_from_slice(&(data.len() as u16).to_be_bytes());
            }
            bytes.extend_from_slice(&data);
            let tag = decode(&bytes).unwrap();
            prop_assert_eq!(tag.length() as usize, data.len());
            prop_assert_eq!(tag.bit_length(), 8 * bytes.len() as u64);
            prop_assert_eq!(encode(&tag), bytes);
        }

        #[test]
        fn truncated_tags_underflow(value in app_value(), cut in any::<prop::sample::Index>()) {
            let bytes = encode(&Tag::application(value).unwrap());
            let keep = cut.index(bytes.len());
            let err = decode(&bytes[..keep]).unwrap_err();
            prop_assert!(err.is_underflow(), "{err}");
        }
    }
}
