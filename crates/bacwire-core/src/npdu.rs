use crate::apdu::Apdu;
use crate::encoding::{
    budget::LengthBudget,
    decode_buffer,
    dispatch::{Discriminated, DispatchEntry, DispatchTable},
    reader::{DecodeOptions, Reader},
    writer::Writer,
};
use crate::error::{Decoded, ResultExt};
use crate::nlm::NetworkLayerMessage;
use crate::{DecodeError, EncodeError};

/// BACnet network layer protocol version.
pub const NPDU_VERSION: u8 = 0x01;

/// Hop count given to messages originated on this network.
pub const DEFAULT_HOP_COUNT: u8 = 0xFF;

/// The 2-bit network priority carried in the control octet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum NetworkPriority {
    #[default]
    Normal = 0,
    Urgent = 1,
    CriticalEquipment = 2,
    LifeSafety = 3,
}

impl NetworkPriority {
    pub const fn from_bits(value: u8) -> Self {
        match value & 0x03 {
            0 => Self::Normal,
            1 => Self::Urgent,
            2 => Self::CriticalEquipment,
            _ => Self::LifeSafety,
        }
    }

    pub const fn to_u8(self) -> u8 {
        self as u8
    }
}

/// A network-layer address: network number plus a MAC of up to 255 octets.
/// An empty MAC in a destination means broadcast on that network.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NpduAddress {
    pub network: u16,
    pub mac: Vec<u8>,
}

impl NpduAddress {
    pub fn new(network: u16, mac: impl Into<Vec<u8>>) -> Self {
        Self {
            network,
            mac: mac.into(),
        }
    }

    /// Broadcast to every station on `network` (0xFFFF for global).
    pub fn broadcast(network: u16) -> Self {
        Self {
            network,
            mac: Vec::new(),
        }
    }

    fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let network = r.read_be_u16().field("network")?;
        let len = r.read_u8().field("mac_length")?;
        let mac = r.read_bytes(usize::from(len)).field("mac")?;
        Ok(Self { network, mac })
    }

    fn encode(&self, w: &mut Writer) -> Result<(), EncodeError> {
        let len = u8::try_from(self.mac.len()).map_err(|_| EncodeError::InvalidLength {
            field: "mac",
            length: self.mac.len() as u64,
        })?;
        w.write_be_u16(self.network)?;
        w.write_u8(len)?;
        w.write_all(&self.mac)
    }

    fn bit_length(&self) -> u64 {
        24 + 8 * self.mac.len() as u64
    }
}

/// A destination specifier together with the hop count that always
/// accompanies it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RemoteDestination {
    pub address: NpduAddress,
    pub hop_count: u8,
}

impl RemoteDestination {
    pub fn new(address: NpduAddress) -> Self {
        Self {
            address,
            hop_count: DEFAULT_HOP_COUNT,
        }
    }
}

/// What follows the NPDU header, selected by the message-type flag.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NpduPayload {
    Application(Apdu),
    Network(NetworkLayerMessage),
}

impl Discriminated for NpduPayload {
    fn discriminator(&self) -> u64 {
        match self {
            Self::Application(_) => 0,
            Self::Network(_) => 1,
        }
    }
}

impl NpduPayload {
    fn encode(&self, w: &mut Writer) -> Result<(), EncodeError> {
        match self {
            Self::Application(apdu) => apdu.encode(w),
            Self::Network(message) => message.encode(w),
        }
    }

    fn bit_length(&self) -> u64 {
        match self {
            Self::Application(apdu) => apdu.bit_length(),
            Self::Network(message) => message.bit_length(),
        }
    }
}

/// BACnet Network Protocol Data Unit.
///
/// Routing fields are present exactly when their control-octet flag is set;
/// the flags themselves are derived from the options here on encode. The
/// payload is sized by whatever the enclosing frame leaves after the header.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Npdu {
    pub protocol_version: u8,
    pub expecting_reply: bool,
    pub priority: NetworkPriority,
    pub destination: Option<RemoteDestination>,
    pub source: Option<NpduAddress>,
    pub payload: NpduPayload,
}

impl Npdu {
    /// A local, normal-priority NPDU carrying `apdu`.
    pub fn application(apdu: Apdu) -> Self {
        Self::with_payload(NpduPayload::Application(apdu))
    }

    /// A local, normal-priority NPDU carrying a network layer message.
    pub fn network(message: NetworkLayerMessage) -> Self {
        Self::with_payload(NpduPayload::Network(message))
    }

    fn with_payload(payload: NpduPayload) -> Self {
        Self {
            protocol_version: NPDU_VERSION,
            expecting_reply: false,
            priority: NetworkPriority::Normal,
            destination: None,
            source: None,
            payload,
        }
    }

    pub fn expecting_reply(mut self, expecting_reply: bool) -> Self {
        self.expecting_reply = expecting_reply;
        self
    }

    pub fn to_remote(mut self, address: NpduAddress) -> Self {
        self.destination = Some(RemoteDestination::new(address));
        self
    }

    pub fn apdu(&self) -> Option<&Apdu> {
        match &self.payload {
            NpduPayload::Application(apdu) => Some(apdu),
            NpduPayload::Network(_) => None,
        }
    }

    pub fn network_message(&self) -> Option<&NetworkLayerMessage> {
        match &self.payload {
            NpduPayload::Application(_) => None,
            NpduPayload::Network(message) => Some(message),
        }
    }

    /// Decodes an NPDU occupying `budget` bytes from the reader's position.
    pub fn decode(r: &mut Reader<'_>, budget: LengthBudget) -> Result<Self, DecodeError> {
        let protocol_version = r.read_u8().field("protocol_version")?;
        let network_message = r.read_bit().field("message_type_field_present")?;
        r.check_reserved("npdu reserved", 1, 0)?;
        let has_destination = r.read_bit().field("destination_specified")?;
        r.check_reserved("npdu reserved", 1, 0)?;
        let has_source = r.read_bit().field("source_specified")?;
        let expecting_reply = r.read_bit().field("expecting_reply")?;
        let priority = NetworkPriority::from_bits(r.read_bits(2).field("priority")? as u8);

        let destination = if has_destination {
            Some(NpduAddress::decode(r).field("destination")?)
        } else {
            None
        };
        let source = if has_source {
            Some(NpduAddress::decode(r).field("source")?)
        } else {
            None
        };
        let destination = match destination {
            Some(address) => Some(RemoteDestination {
                address,
                hop_count: r.read_u8().field("hop_count")?,
            }),
            None => None,
        };

        let payload =
            NPDU_PAYLOAD.dispatch(u64::from(network_message), r, budget.child(r)?)?;
        Ok(Self {
            protocol_version,
            expecting_reply,
            priority,
            destination,
            source,
            payload,
        })
    }

    /// Decodes a buffer holding exactly one NPDU.
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
        w.write_u8(self.protocol_version)?;
        NPDU_PAYLOAD.write_discriminator(w, self.payload.discriminator())?;
        w.write_bit(false)?;
        w.write_bit(self.destination.is_some())?;
        w.write_bit(false)?;
        w.write_bit(self.source.is_some())?;
        w.write_bit(self.expecting_reply)?;
        w.write_bits(2, u64::from(self.priority.to_u8()))?;

        if let Some(destination) = &self.destination {
            destination.address.encode(w)?;
        }
        if let Some(source) = &self.source {
            source.encode(w)?;
        }
        if let Some(destination) = &self.destination {
            w.write_u8(destination.hop_count)?;
        }
        self.payload.encode(w)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, EncodeError> {
        let mut w = Writer::with_capacity(self.len());
        self.encode(&mut w)?;
        Ok(w.into_bytes())
    }

    pub fn bit_length(&self) -> u64 {
        16 + self
            .destination
            .as_ref()
            .map_or(0, |d| d.address.bit_length() + 8)
            + self.source.as_ref().map_or(0, NpduAddress::bit_length)
            + self.payload.bit_length()
    }

    /// Encoded size in bytes.
    pub fn len(&self) -> usize {
        self.bit_length().div_ceil(8) as usize
    }
}

type PayloadDecode = Result<NpduPayload, DecodeError>;

fn decode_application(r: &mut Reader<'_>, _: u64, budget: LengthBudget) -> PayloadDecode {
    Apdu::decode(r, budget).map(NpduPayload::Application)
}

fn decode_network(r: &mut Reader<'_>, _: u64, budget: LengthBudget) -> PayloadDecode {
    NetworkLayerMessage::decode(r, budget).map(NpduPayload::Network)
}

const NPDU_PAYLOAD_ENTRIES: &[DispatchEntry<NpduPayload, LengthBudget>] = &[
    DispatchEntry::exact(0, "apdu", decode_application),
    DispatchEntry::exact(1, "nlm", decode_network),
];

/// Keyed by the control octet's message-type flag.
pub static NPDU_PAYLOAD: DispatchTable<NpduPayload, LengthBudget> =
    DispatchTable::new("npdu payload", 1, NPDU_PAYLOAD_ENTRIES);
