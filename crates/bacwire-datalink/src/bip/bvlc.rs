//! BACnet Virtual Link Control: the BACnet/IP frame wrapper.

use bacwire_core::encoding::{
    budget::LengthBudget,
    decode_buffer,
    dispatch::{Discriminated, DispatchEntry, DispatchTable},
    reader::{DecodeOptions, Reader},
    writer::Writer,
};
use bacwire_core::{DecodeError, Decoded, EncodeError, Npdu, ResultExt};
use std::net::{Ipv4Addr, SocketAddrV4};

pub const BVLC_TYPE_BIP: u8 = 0x81;
/// Type, function and length octets.
pub const BVLC_HEADER_LEN: u16 = 4;

pub const BVLC_RESULT: u8 = 0x00;
pub const BVLC_WRITE_BDT: u8 = 0x01;
pub const BVLC_READ_BDT: u8 = 0x02;
pub const BVLC_READ_BDT_ACK: u8 = 0x03;
pub const BVLC_FORWARDED_NPDU: u8 = 0x04;
pub const BVLC_REGISTER_FOREIGN_DEVICE: u8 = 0x05;
pub const BVLC_READ_FDT: u8 = 0x06;
pub const BVLC_READ_FDT_ACK: u8 = 0x07;
pub const BVLC_DELETE_FDT_ENTRY: u8 = 0x08;
pub const BVLC_DISTRIBUTE_BROADCAST_TO_NETWORK: u8 = 0x09;
pub const BVLC_ORIGINAL_UNICAST_NPDU: u8 = 0x0A;
pub const BVLC_ORIGINAL_BROADCAST_NPDU: u8 = 0x0B;
pub const BVLC_SECURE_BVLL: u8 = 0x0C;

/// Result codes carried by a BVLC-Result.
pub mod result_code {
    pub const SUCCESSFUL_COMPLETION: u16 = 0x0000;
    pub const WRITE_BDT_NAK: u16 = 0x0010;
    pub const READ_BDT_NAK: u16 = 0x0020;
    pub const REGISTER_FOREIGN_DEVICE_NAK: u16 = 0x0030;
    pub const READ_FDT_NAK: u16 = 0x0040;
    pub const DELETE_FDT_ENTRY_NAK: u16 = 0x0050;
    pub const DISTRIBUTE_BROADCAST_TO_NETWORK_NAK: u16 = 0x0060;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BroadcastDistributionEntry {
    pub address: SocketAddrV4,
    pub mask: Ipv4Addr,
}

impl BroadcastDistributionEntry {
    fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            address: read_bip_address(r).field("address")?,
            mask: read_ipv4(r).field("mask")?,
        })
    }

    fn encode(&self, w: &mut Writer) -> Result<(), EncodeError> {
        write_bip_address(w, self.address)?;
        w.write_all(&self.mask.octets())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ForeignDeviceTableEntry {
    pub address: SocketAddrV4,
    pub ttl_seconds: u16,
    pub remaining_seconds: u16,
}

impl ForeignDeviceTableEntry {
    fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            address: read_bip_address(r).field("address")?,
            ttl_seconds: r.read_be_u16().field("ttl_seconds")?,
            remaining_seconds: r.read_be_u16().field("remaining_seconds")?,
        })
    }

    fn encode(&self, w: &mut Writer) -> Result<(), EncodeError> {
        write_bip_address(w, self.address)?;
        w.write_be_u16(self.ttl_seconds)?;
        w.write_be_u16(self.remaining_seconds)
    }
}

/// Encoded size of one BDT or FDT entry.
const TABLE_ENTRY_BITS: u64 = 80;
/// Encoded size of a B/IP address: IPv4 address and UDP port.
const BIP_ADDRESS_BITS: u64 = 48;

/// A BVLC frame. The length field is not stored: it is computed from the
/// value on encode and used as the payload budget on decode.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Bvlc {
    Result(u16),
    WriteBroadcastDistributionTable(Vec<BroadcastDistributionEntry>),
    ReadBroadcastDistributionTable,
    ReadBroadcastDistributionTableAck(Vec<BroadcastDistributionEntry>),
    ForwardedNpdu { origin: SocketAddrV4, npdu: Npdu },
    RegisterForeignDevice { ttl_seconds: u16 },
    ReadForeignDeviceTable,
    ReadForeignDeviceTableAck(Vec<ForeignDeviceTableEntry>),
    DeleteForeignDeviceTableEntry(SocketAddrV4),
    DistributeBroadcastToNetwork(Npdu),
    OriginalUnicastNpdu(Npdu),
    OriginalBroadcastNpdu(Npdu),
    /// BACnet/IP secure frame, carried opaque.
    SecureBvll(Vec<u8>),
}

impl Discriminated for Bvlc {
    fn discriminator(&self) -> u64 {
        u64::from(self.function())
    }
}

impl Bvlc {
    pub fn function(&self) -> u8 {
        match self {
            Self::Result(_) => BVLC_RESULT,
            Self::WriteBroadcastDistributionTable(_) => BVLC_WRITE_BDT,
            Self::ReadBroadcastDistributionTable => BVLC_READ_BDT,
            Self::ReadBroadcastDistributionTableAck(_) => BVLC_READ_BDT_ACK,
            Self::ForwardedNpdu { .. } => BVLC_FORWARDED_NPDU,
            Self::RegisterForeignDevice { .. } => BVLC_REGISTER_FOREIGN_DEVICE,
            Self::ReadForeignDeviceTable => BVLC_READ_FDT,
            Self::ReadForeignDeviceTableAck(_) => BVLC_READ_FDT_ACK,
            Self::DeleteForeignDeviceTableEntry(_) => BVLC_DELETE_FDT_ENTRY,
            Self::DistributeBroadcastToNetwork(_) => BVLC_DISTRIBUTE_BROADCAST_TO_NETWORK,
            Self::OriginalUnicastNpdu(_) => BVLC_ORIGINAL_UNICAST_NPDU,
            Self::OriginalBroadcastNpdu(_) => BVLC_ORIGINAL_BROADCAST_NPDU,
            Self::SecureBvll(_) => BVLC_SECURE_BVLL,
        }
    }

    /// The NPDU carried by the four NPDU-bearing functions.
    pub fn npdu(&self) -> Option<&Npdu> {
        match self {
            Self::ForwardedNpdu { npdu, .. }
            | Self::DistributeBroadcastToNetwork(npdu)
            | Self::OriginalUnicastNpdu(npdu)
            | Self::OriginalBroadcastNpdu(npdu) => Some(npdu),
            _ => None,
        }
    }

    pub fn into_npdu(self) -> Option<Npdu> {
        match self {
            Self::ForwardedNpdu { npdu, .. }
            | Self::DistributeBroadcastToNetwork(npdu)
            | Self::OriginalUnicastNpdu(npdu)
            | Self::OriginalBroadcastNpdu(npdu) => Some(npdu),
            _ => None,
        }
    }

    /// Decodes one frame. `budget` bounds the bytes available to it; the
    /// frame's own length field must fit inside and be used up exactly.
    pub fn decode(r: &mut Reader<'_>, budget: LengthBudget) -> Result<Self, DecodeError> {
        r.read_const("bvlc_type", 8, u64::from(BVLC_TYPE_BIP))?;
        let function = BVLC_TABLE.read_discriminator(r)?;
        let length = r.read_be_u16().field("bvlc_length")?;
        if length < BVLC_HEADER_LEN {
            return Err(DecodeError::InvalidLength {
                field: "bvlc_length",
                length: u64::from(length),
            });
        }
        let payload_len = u64::from(length - BVLC_HEADER_LEN);
        if payload_len > r.remaining_bytes() {
            return Err(DecodeError::BufferUnderflow {
                requested: 8 * payload_len,
                available: r.remaining_bits(),
            }
            .in_field("bvlc_length"));
        }
        let payload = budget.child_of(r, payload_len).field("bvlc_length")?;
        let frame = BVLC_TABLE.dispatch(function, r, payload)?;
        if payload.remaining(r)? != 0 {
            return Err(DecodeError::InvalidLength {
                field: "bvlc_length",
                length: u64::from(length),
            });
        }
        Ok(frame)
    }

    /// Decodes a buffer holding exactly one frame.
    pub fn from_bytes(buf: &[u8]) -> Result<Self, DecodeError> {
        Self::decode_with_diagnostics(buf, DecodeOptions::default()).map(|d| d.value)
    }

    pub fn decode_with_diagnostics(
        buf: &[u8],
        options: DecodeOptions,
    ) -> Result<Decoded<Self>, DecodeError> {
        decode_buffer(buf, options, Self::decode)
    }

    pub fn encode(&self, w: &mut Writer) -> Result<(), EncodeError> {
        let length = u16::try_from(self.len()).map_err(|_| EncodeError::InvalidLength {
            field: "bvlc_length",
            length: self.len() as u64,
        })?;
        w.write_u8(BVLC_TYPE_BIP)?;
        BVLC_TABLE.write_discriminator(w, self.discriminator())?;
        w.write_be_u16(length)?;
        match self {
            Self::Result(code) => w.write_be_u16(*code),
            Self::WriteBroadcastDistributionTable(entries)
            | Self::ReadBroadcastDistributionTableAck(entries) => {
                entries.iter().try_for_each(|e| e.encode(w))
            }
            Self::ReadBroadcastDistributionTable | Self::ReadForeignDeviceTable => Ok(()),
            Self::ForwardedNpdu { origin, npdu } => {
                write_bip_address(w, *origin)?;
                npdu.encode(w)
            }
            Self::RegisterForeignDevice { ttl_seconds } => w.write_be_u16(*ttl_seconds),
            Self::ReadForeignDeviceTableAck(entries) => {
                entries.iter().try_for_each(|e| e.encode(w))
            }
            Self::DeleteForeignDeviceTableEntry(address) => write_bip_address(w, *address),
            Self::DistributeBroadcastToNetwork(npdu)
            | Self::OriginalUnicastNpdu(npdu)
            | Self::OriginalBroadcastNpdu(npdu) => npdu.encode(w),
            Self::SecureBvll(data) => w.write_all(data),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, EncodeError> {
        let mut w = Writer::with_capacity(self.len());
        self.encode(&mut w)?;
        Ok(w.into_bytes())
    }

    pub fn bit_length(&self) -> u64 {
        8 * u64::from(BVLC_HEADER_LEN)
            + match self {
                Self::Result(_) => 16,
                Self::WriteBroadcastDistributionTable(entries)
                | Self::ReadBroadcastDistributionTableAck(entries) => {
                    TABLE_ENTRY_BITS * entries.len() as u64
                }
                Self::ReadBroadcastDistributionTable | Self::ReadForeignDeviceTable => 0,
                Self::ForwardedNpdu { npdu, .. } => BIP_ADDRESS_BITS + npdu.bit_length(),
                Self::RegisterForeignDevice { .. } => 16,
                Self::ReadForeignDeviceTableAck(entries) => {
                    TABLE_ENTRY_BITS * entries.len() as u64
                }
                Self::DeleteForeignDeviceTableEntry(_) => BIP_ADDRESS_BITS,
                Self::DistributeBroadcastToNetwork(npdu)
                | Self::OriginalUnicastNpdu(npdu)
                | Self::OriginalBroadcastNpdu(npdu) => npdu.bit_length(),
                Self::SecureBvll(data) => 8 * data.len() as u64,
            }
    }

    /// Value of the length field: the whole frame in bytes.
    pub fn len(&self) -> usize {
        self.bit_length().div_ceil(8) as usize
    }
}

fn read_ipv4(r: &mut Reader<'_>) -> Result<Ipv4Addr, DecodeError> {
    Ok(Ipv4Addr::from(r.read_be_u32()?))
}

fn read_bip_address(r: &mut Reader<'_>) -> Result<SocketAddrV4, DecodeError> {
    let ip = read_ipv4(r).field("ip")?;
    let port = r.read_be_u16().field("port")?;
    Ok(SocketAddrV4::new(ip, port))
}

fn write_bip_address(w: &mut Writer, address: SocketAddrV4) -> Result<(), EncodeError> {
    w.write_all(&address.ip().octets())?;
    w.write_be_u16(address.port())
}

fn read_entries<T>(
    r: &mut Reader<'_>,
    budget: LengthBudget,
    decode: fn(&mut Reader<'_>) -> Result<T, DecodeError>,
) -> Result<Vec<T>, DecodeError> {
    let mut entries = Vec::new();
    while budget.has_more(r) {
        entries.push(decode(r).field("entry")?);
    }
    budget.remaining(r)?;
    Ok(entries)
}

type BvlcDecode = Result<Bvlc, DecodeError>;

fn decode_result(r: &mut Reader<'_>, _: u64, _: LengthBudget) -> BvlcDecode {
    Ok(Bvlc::Result(r.read_be_u16().field("result_code")?))
}

fn decode_write_bdt(r: &mut Reader<'_>, _: u64, budget: LengthBudget) -> BvlcDecode {
    read_entries(r, budget, BroadcastDistributionEntry::decode)
        .map(Bvlc::WriteBroadcastDistributionTable)
}

fn decode_read_bdt(_: &mut Reader<'_>, _: u64, _: LengthBudget) -> BvlcDecode {
    Ok(Bvlc::ReadBroadcastDistributionTable)
}

fn decode_read_bdt_ack(r: &mut Reader<'_>, _: u64, budget: LengthBudget) -> BvlcDecode {
    read_entries(r, budget, BroadcastDistributionEntry::decode)
        .map(Bvlc::ReadBroadcastDistributionTableAck)
}

fn decode_forwarded(r: &mut Reader<'_>, _: u64, budget: LengthBudget) -> BvlcDecode {
    let origin = read_bip_address(r).field("origin")?;
    let npdu = Npdu::decode(r, budget.child(r)?).field("npdu")?;
    Ok(Bvlc::ForwardedNpdu { origin, npdu })
}

fn decode_register_foreign_device(r: &mut Reader<'_>, _: u64, _: LengthBudget) -> BvlcDecode {
    Ok(Bvlc::RegisterForeignDevice {
        ttl_seconds: r.read_be_u16().field("ttl_seconds")?,
    })
}

fn decode_read_fdt(_: &mut Reader<'_>, _: u64, _: LengthBudget) -> BvlcDecode {
    Ok(Bvlc::ReadForeignDeviceTable)
}

fn decode_read_fdt_ack(r: &mut Reader<'_>, _: u64, budget: LengthBudget) -> BvlcDecode {
    read_entries(r, budget, ForeignDeviceTableEntry::decode).map(Bvlc::ReadForeignDeviceTableAck)
}

fn decode_delete_fdt_entry(r: &mut Reader<'_>, _: u64, _: LengthBudget) -> BvlcDecode {
    read_bip_address(r)
        .field("address")
        .map(Bvlc::DeleteForeignDeviceTableEntry)
}

fn decode_distribute_broadcast(r: &mut Reader<'_>, _: u64, budget: LengthBudget) -> BvlcDecode {
    Npdu::decode(r, budget)
        .field("npdu")
        .map(Bvlc::DistributeBroadcastToNetwork)
}

fn decode_original_unicast(r: &mut Reader<'_>, _: u64, budget: LengthBudget) -> BvlcDecode {
    Npdu::decode(r, budget)
        .field("npdu")
        .map(Bvlc::OriginalUnicastNpdu)
}

fn decode_original_broadcast(r: &mut Reader<'_>, _: u64, budget: LengthBudget) -> BvlcDecode {
    Npdu::decode(r, budget)
        .field("npdu")
        .map(Bvlc::OriginalBroadcastNpdu)
}

fn decode_secure_bvll(r: &mut Reader<'_>, _: u64, budget: LengthBudget) -> BvlcDecode {
    let len = budget.remaining(r)?;
    r.read_bytes(len as usize)
        .field("data")
        .map(Bvlc::SecureBvll)
}

const BVLC_ENTRIES: &[DispatchEntry<Bvlc, LengthBudget>] = &[
    DispatchEntry::exact(BVLC_RESULT as u64, "BVLC-Result", decode_result),
    DispatchEntry::exact(BVLC_WRITE_BDT as u64, "Write-BDT", decode_write_bdt),
    DispatchEntry::exact(BVLC_READ_BDT as u64, "Read-BDT", decode_read_bdt),
    DispatchEntry::exact(BVLC_READ_BDT_ACK as u64, "Read-BDT-Ack", decode_read_bdt_ack),
    DispatchEntry::exact(BVLC_FORWARDED_NPDU as u64, "Forwarded-NPDU", decode_forwarded),
    DispatchEntry::exact(
        BVLC_REGISTER_FOREIGN_DEVICE as u64,
        "Register-Foreign-Device",
        decode_register_foreign_device,
    ),
    DispatchEntry::exact(BVLC_READ_FDT as u64, "Read-FDT", decode_read_fdt),
    DispatchEntry::exact(BVLC_READ_FDT_ACK as u64, "Read-FDT-Ack", decode_read_fdt_ack),
    DispatchEntry::exact(
        BVLC_DELETE_FDT_ENTRY as u64,
        "Delete-FDT-Entry",
        decode_delete_fdt_entry,
    ),
    DispatchEntry::exact(
        BVLC_DISTRIBUTE_BROADCAST_TO_NETWORK as u64,
        "Distribute-Broadcast-To-Network",
        decode_distribute_broadcast,
    ),
    DispatchEntry::exact(
        BVLC_ORIGINAL_UNICAST_NPDU as u64,
        "Original-Unicast-NPDU",
        decode_original_unicast,
    ),
    DispatchEntry::exact(
        BVLC_ORIGINAL_BROADCAST_NPDU as u64,
        "Original-Broadcast-NPDU",
        decode_original_broadcast,
    ),
    DispatchEntry::exact(BVLC_SECURE_BVLL as u64, "Secure-BVLL", decode_secure_bvll),
];

/// BVLC function codes.
pub static BVLC_TABLE: DispatchTable<Bvlc, LengthBudget> =
    DispatchTable::new("bvlc", 8, BVLC_ENTRIES);

#[cfg(test)]
mod tests {
    use super::{
        result_code, BroadcastDistributionEntry, Bvlc, ForeignDeviceTableEntry, BVLC_TABLE,
    };
    use bacwire_core::apdu::{Apdu, UnconfirmedRequest};
    use bacwire_core::encoding::budget::LengthBudget;
    use bacwire_core::encoding::reader::Reader;
    use bacwire_core::npdu::NpduAddress;
    use bacwire_core::services::{UnconfirmedServiceRequest, WhoIsRequest};
    use bacwire_core::{DecodeError, DecodeOptions, Npdu};
    use proptest::prelude::*;
    use std::net::{Ipv4Addr, SocketAddrV4};

    fn who_is() -> Npdu {
        Npdu::application(Apdu::UnconfirmedRequest(UnconfirmedRequest::new(
            UnconfirmedServiceRequest::WhoIs(WhoIsRequest::global()),
        )))
    }

    fn check(frame: &Bvlc, expected: &[u8]) {
        let bytes = frame.to_bytes().unwrap();
        assert_eq!(bytes, expected);
        assert_eq!(frame.bit_length(), 8 * bytes.len() as u64);
        assert_eq!(&Bvlc::from_bytes(&bytes).unwrap(), frame);
    }

    #[test]
    fn original_unicast_who_is() {
        check(
            &Bvlc::OriginalUnicastNpdu(who_is()),
            &[0x81, 0x0A, 0x00, 0x08, 0x01, 0x00, 0x10, 0x08],
        );
    }

    #[test]
    fn original_broadcast_global_who_is() {
        let npdu = who_is().to_remote(NpduAddress::broadcast(0xFFFF));
        check(
            &Bvlc::OriginalBroadcastNpdu(npdu),
            &[
                0x81, 0x0B, 0x00, 0x0C, 0x01, 0x20, 0xFF, 0xFF, 0x00, 0xFF, 0x10, 0x08,
            ],
        );
    }

    #[test]
    fn forwarded_npdu_carries_origin() {
        let frame = Bvlc::ForwardedNpdu {
            origin: SocketAddrV4::new(Ipv4Addr::new(10, 1, 2, 3), 47808),
            npdu: who_is(),
        };
        check(
            &frame,
            &[
                0x81, 0x04, 0x00, 0x0E, 10, 1, 2, 3, 0xBA, 0xC0, 0x01, 0x00, 0x10, 0x08,
            ],
        );
        assert_eq!(frame.npdu(), Some(&who_is()));
    }

    #[test]
    fn management_functions() {
        check(
            &Bvlc::Result(result_code::REGISTER_FOREIGN_DEVICE_NAK),
            &[0x81, 0x00, 0x00, 0x06, 0x00, 0x30],
        );
        check(
            &Bvlc::RegisterForeignDevice { ttl_seconds: 60 },
            &[0x81, 0x05, 0x00, 0x06, 0x00, 0x3C],
        );
        check(&Bvlc::ReadBroadcastDistributionTable, &[0x81, 0x02, 0x00, 0x04]);
        check(&Bvlc::ReadForeignDeviceTable, &[0x81, 0x06, 0x00, 0x04]);
        check(
            &Bvlc::DeleteForeignDeviceTableEntry(SocketAddrV4::new(
                Ipv4Addr::new(192, 168, 1, 5),
                47808,
            )),
            &[0x81, 0x08, 0x00, 0x0A, 192, 168, 1, 5, 0xBA, 0xC0],
        );
        check(&Bvlc::SecureBvll(vec![1, 2, 3]), &[0x81, 0x0C, 0x00, 0x07, 1, 2, 3]);
    }

    #[test]
    fn table_acks_read_entries_until_length() {
        check(
            &Bvlc::ReadBroadcastDistributionTableAck(vec![
                BroadcastDistributionEntry {
                    address: SocketAddrV4::new(Ipv4Addr::new(192, 168, 1, 1), 47808),
                    mask: Ipv4Addr::BROADCAST,
                },
                BroadcastDistributionEntry {
                    address: SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 1), 47809),
                    mask: Ipv4Addr::new(255, 255, 255, 0),
                },
            ]),
            &[
                0x81, 0x03, 0x00, 0x18, 192, 168, 1, 1, 0xBA, 0xC0, 255, 255, 255, 255, 10, 0,
                0, 1, 0xBA, 0xC1, 255, 255, 255, 0,
            ],
        );
        check(
            &Bvlc::ReadForeignDeviceTableAck(vec![ForeignDeviceTableEntry {
                address: SocketAddrV4::new(Ipv4Addr::new(192, 168, 1, 5), 47808),
                ttl_seconds: 60,
                remaining_seconds: 30,
            }]),
            &[
                0x81, 0x07, 0x00, 0x0E, 192, 168, 1, 5, 0xBA, 0xC0, 0x00, 0x3C, 0x00, 0x1E,
            ],
        );
        check(&Bvlc::WriteBroadcastDistributionTable(vec![]), &[0x81, 0x01, 0x00, 0x04]);
    }

    #[test]
    fn length_field_bounds_the_npdu() {
        // Length says 8; the trailing octet is outside the frame.
        let bytes = [0x81, 0x0A, 0x00, 0x08, 0x01, 0x00, 0x10, 0x08, 0xAA];
        assert_eq!(
            Bvlc::from_bytes(&bytes).unwrap(),
            Bvlc::OriginalUnicastNpdu(who_is())
        );
    }

    #[test]
    fn length_beyond_buffer_underflows() {
        let err = Bvlc::from_bytes(&[0x81, 0x0A, 0x00, 0x20, 0x01, 0x00]).unwrap_err();
        assert_eq!(
            err.root(),
            &DecodeError::BufferUnderflow {
                requested: 8 * 28,
                available: 16
            }
        );
        assert_eq!(err.path(), vec!["bvlc_length"]);
    }

    #[test]
    fn length_beyond_enclosing_budget_is_invalid() {
        let bytes = [0x81, 0x0A, 0x00, 0x08, 0x01, 0x00, 0x10, 0x08];
        let mut r = Reader::new(&bytes);
        let budget = LengthBudget::starting_at(&r, 6);
        let err = Bvlc::decode(&mut r, budget).unwrap_err();
        assert!(matches!(err.root(), DecodeError::InvalidLength { .. }));
        assert!(!err.is_underflow());
    }

    #[test]
    fn unread_payload_octets_are_rejected() {
        assert_eq!(
            Bvlc::from_bytes(&[0x81, 0x00, 0x00, 0x08, 0x00, 0x00, 0xAA, 0xBB]).unwrap_err(),
            DecodeError::InvalidLength {
                field: "bvlc_length",
                length: 8
            }
        );
        assert_eq!(
            Bvlc::from_bytes(&[0x81, 0x02, 0x00, 0x05, 0x00]).unwrap_err(),
            DecodeError::InvalidLength {
                field: "bvlc_length",
                length: 5
            }
        );
    }

    #[test]
    fn short_length_is_rejected() {
        assert_eq!(
            Bvlc::from_bytes(&[0x81, 0x02, 0x00, 0x03]).unwrap_err(),
            DecodeError::InvalidLength {
                field: "bvlc_length",
                length: 3
            }
        );
    }

    #[test]
    fn wrong_type_octet() {
        assert_eq!(
            Bvlc::from_bytes(&[0x82, 0x0A, 0x00, 0x04]).unwrap_err(),
            DecodeError::ConstantMismatch {
                field: "bvlc_type",
                expected: 0x81,
                actual: 0x82
            }
        );
    }

    #[test]
    fn unknown_function_is_an_error() {
        assert_eq!(
            Bvlc::from_bytes(&[0x81, 0x99, 0x00, 0x04]).unwrap_err(),
            DecodeError::UnknownVariant {
                frame: "bvlc",
                discriminator: 0x99
            }
        );
    }

    #[test]
    fn ragged_table_underflows() {
        let err = Bvlc::from_bytes(&[0x81, 0x03, 0x00, 0x08, 192, 168, 1, 1]).unwrap_err();
        assert!(err.is_underflow());
        assert_eq!(err.path()[0], "Read-BDT-Ack");
    }

    #[test]
    fn npdu_diagnostics_reach_the_top() {
        let bytes = [0x81, 0x0A, 0x00, 0x08, 0x01, 0x40, 0x10, 0x08];
        let decoded = Bvlc::decode_with_diagnostics(&bytes, DecodeOptions::default()).unwrap();
        assert_eq!(decoded.value, Bvlc::OriginalUnicastNpdu(who_is()));
        assert_eq!(decoded.diagnostics.len(), 1);
        assert_eq!(decoded.diagnostics[0].position_bits, 41);

        let err = Bvlc::decode_with_diagnostics(&bytes, DecodeOptions::strict()).unwrap_err();
        assert_eq!(err.path(), vec!["Original-Unicast-NPDU", "npdu"]);
    }

    #[test]
    fn error_path_spans_all_layers() {
        let bytes = [0x81, 0x0A, 0x00, 0x08, 0x01, 0x00, 0x10, 0x3F];
        let err = Bvlc::from_bytes(&bytes).unwrap_err();
        assert_eq!(
            err.path(),
            vec![
                "Original-Unicast-NPDU",
                "npdu",
                "apdu",
                "UnconfirmedRequest",
                "service"
            ]
        );
    }

    #[test]
    fn table_is_consistent() {
        assert_eq!(BVLC_TABLE.find_overlap(), None);
        assert_eq!(BVLC_TABLE.out_of_width().count(), 0);
    }

    proptest! {
        #[test]
        fn truncated_frames_underflow(cut in 0usize..12) {
            let bytes = Bvlc::OriginalBroadcastNpdu(
                who_is().to_remote(NpduAddress::broadcast(0xFFFF)),
            )
            .to_bytes()
            .unwrap();
            prop_assert_eq!(bytes.len(), 12);
            let err = Bvlc::from_bytes(&bytes[..cut]).unwrap_err();
            prop_assert!(err.is_underflow(), "cut {} gave {}", cut, err);
        }

        #[test]
        fn arbitrary_input_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
            let _ = Bvlc::from_bytes(&bytes);
        }
    }
}
