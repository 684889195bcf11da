//! Network layer messages: the NPDU payload used instead of an APDU when
//! the control octet's message-type flag is set.

use crate::encoding::{
    budget::LengthBudget,
    dispatch::{Discriminated, DispatchEntry, DispatchTable},
    reader::Reader,
    writer::Writer,
};
use crate::error::ResultExt;
use crate::{DecodeError, EncodeError};

pub const WHO_IS_ROUTER_TO_NETWORK: u8 = 0x00;
pub const I_AM_ROUTER_TO_NETWORK: u8 = 0x01;
pub const I_COULD_BE_ROUTER_TO_NETWORK: u8 = 0x02;
pub const REJECT_MESSAGE_TO_NETWORK: u8 = 0x03;
pub const ROUTER_BUSY_TO_NETWORK: u8 = 0x04;
pub const ROUTER_AVAILABLE_TO_NETWORK: u8 = 0x05;
pub const WHAT_IS_NETWORK_NUMBER: u8 = 0x12;
pub const NETWORK_NUMBER_IS: u8 = 0x13;
/// First message type reserved for vendor messages.
pub const FIRST_PROPRIETARY: u8 = 0x80;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NetworkLayerMessage {
    /// Asks for a router to `network`, or for every reachable network.
    WhoIsRouterToNetwork(Option<u16>),
    IAmRouterToNetwork(Vec<u16>),
    ICouldBeRouterToNetwork {
        network: u16,
        performance_index: u8,
    },
    RejectMessageToNetwork {
        reason: u8,
        network: u16,
    },
    RouterBusyToNetwork(Vec<u16>),
    RouterAvailableToNetwork(Vec<u16>),
    WhatIsNetworkNumber,
    NetworkNumberIs {
        network: u16,
        /// Configured locally rather than learned from another router.
        configured: bool,
    },
    Proprietary {
        message_type: u8,
        vendor_id: u16,
        data: Vec<u8>,
    },
}

impl Discriminated for NetworkLayerMessage {
    fn discriminator(&self) -> u64 {
        u64::from(self.message_type())
    }
}

impl NetworkLayerMessage {
    pub fn message_type(&self) -> u8 {
        match self {
            Self::WhoIsRouterToNetwork(_) => WHO_IS_ROUTER_TO_NETWORK,
            Self::IAmRouterToNetwork(_) => I_AM_ROUTER_TO_NETWORK,
            Self::ICouldBeRouterToNetwork { .. } => I_COULD_BE_ROUTER_TO_NETWORK,
            Self::RejectMessageToNetwork { .. } => REJECT_MESSAGE_TO_NETWORK,
            Self::RouterBusyToNetwork(_) => ROUTER_BUSY_TO_NETWORK,
            Self::RouterAvailableToNetwork(_) => ROUTER_AVAILABLE_TO_NETWORK,
            Self::WhatIsNetworkNumber => WHAT_IS_NETWORK_NUMBER,
            Self::NetworkNumberIs { .. } => NETWORK_NUMBER_IS,
            Self::Proprietary { message_type, .. } => *message_type,
        }
    }

    /// Decodes a message occupying `budget` bytes, message type included.
    pub fn decode(r: &mut Reader<'_>, budget: LengthBudget) -> Result<Self, DecodeError> {
        NLM_TABLE.decode(r, budget)
    }

    pub fn encode(&self, w: &mut Writer) -> Result<(), EncodeError> {
        if let Self::Proprietary { message_type, .. } = self {
            if *message_type < FIRST_PROPRIETARY {
                return Err(EncodeError::ValueOutOfRange {
                    field: "proprietary message type",
                    value: u64::from(*message_type),
                    bits: 8,
                });
            }
        }
        NLM_TABLE.write_discriminator(w, self.discriminator())?;
        match self {
            Self::WhoIsRouterToNetwork(network) => {
                if let Some(network) = network {
                    w.write_be_u16(*network)?;
                }
                Ok(())
            }
            Self::IAmRouterToNetwork(networks)
            | Self::RouterBusyToNetwork(networks)
            | Self::RouterAvailableToNetwork(networks) => {
                networks.iter().try_for_each(|n| w.write_be_u16(*n))
            }
            Self::ICouldBeRouterToNetwork {
                network,
                performance_index,
            } => {
                w.write_be_u16(*network)?;
                w.write_u8(*performance_index)
            }
            Self::RejectMessageToNetwork { reason, network } => {
                w.write_u8(*reason)?;
                w.write_be_u16(*network)
            }
            Self::WhatIsNetworkNumber => Ok(()),
            Self::NetworkNumberIs {
                network,
                configured,
            } => {
                w.write_be_u16(*network)?;
                w.write_bits(7, 0)?;
                w.write_bit(*configured)
            }
            Self::Proprietary {
                vendor_id, data, ..
            } => {
                w.write_be_u16(*vendor_id)?;
                w.write_all(data)
            }
        }
    }

    pub fn bit_length(&self) -> u64 {
        8 + match self {
            Self::WhoIsRouterToNetwork(network) => network.map_or(0, |_| 16),
            Self::IAmRouterToNetwork(networks)
            | Self::RouterBusyToNetwork(networks)
            | Self::RouterAvailableToNetwork(networks) => 16 * networks.len() as u64,
            Self::ICouldBeRouterToNetwork { .. } | Self::RejectMessageToNetwork { .. } => 24,
            Self::WhatIsNetworkNumber => 0,
            Self::NetworkNumberIs { .. } => 24,
            Self::Proprietary { data, .. } => 16 + 8 * data.len() as u64,
        }
    }
}

/// Reads network numbers until the message budget is used up.
fn read_networks(r: &mut Reader<'_>, budget: LengthBudget) -> Result<Vec<u16>, DecodeError> {
    let mut networks = Vec::new();
    while budget.has_more(r) {
        networks.push(r.read_be_u16().field("network")?);
    }
    budget.remaining(r)?;
    Ok(networks)
}

type NlmDecode = Result<NetworkLayerMessage, DecodeError>;

fn decode_who_is_router(r: &mut Reader<'_>, _: u64, budget: LengthBudget) -> NlmDecode {
    let network = if budget.has_more(r) {
        Some(r.read_be_u16().field("network")?)
    } else {
        None
    };
    Ok(NetworkLayerMessage::WhoIsRouterToNetwork(network))
}

fn decode_i_am_router(r: &mut Reader<'_>, _: u64, budget: LengthBudget) -> NlmDecode {
    read_networks(r, budget).map(NetworkLayerMessage::IAmRouterToNetwork)
}

fn decode_i_could_be_router(r: &mut Reader<'_>, _: u64, _: LengthBudget) -> NlmDecode {
    Ok(NetworkLayerMessage::ICouldBeRouterToNetwork {
        network: r.read_be_u16().field("network")?,
        performance_index: r.read_u8().field("performance_index")?,
    })
}

fn decode_reject(r: &mut Reader<'_>, _: u64, _: LengthBudget) -> NlmDecode {
    Ok(NetworkLayerMessage::RejectMessageToNetwork {
        reason: r.read_u8().field("reason")?,
        network: r.read_be_u16().field("network")?,
    })
}

fn decode_router_busy(r: &mut Reader<'_>, _: u64, budget: LengthBudget) -> NlmDecode {
    read_networks(r, budget).map(NetworkLayerMessage::RouterBusyToNetwork)
}

fn decode_router_available(r: &mut Reader<'_>, _: u64, budget: LengthBudget) -> NlmDecode {
    read_networks(r, budget).map(NetworkLayerMessage::RouterAvailableToNetwork)
}

fn decode_what_is_network_number(_: &mut Reader<'_>, _: u64, _: LengthBudget) -> NlmDecode {
    Ok(NetworkLayerMessage::WhatIsNetworkNumber)
}

fn decode_network_number_is(r: &mut Reader<'_>, _: u64, _: LengthBudget) -> NlmDecode {
    let network = r.read_be_u16().field("network")?;
    r.check_reserved("network number flag", 7, 0)?;
    let configured = r.read_bit().field("configured")?;
    Ok(NetworkLayerMessage::NetworkNumberIs {
        network,
        configured,
    })
}

fn decode_proprietary(r: &mut Reader<'_>, message_type: u64, budget: LengthBudget) -> NlmDecode {
    let vendor_id = r.read_be_u16().field("vendor_id")?;
    let len = budget.remaining(r)?;
    let data = r.read_bytes(len as usize).field("data")?;
    Ok(NetworkLayerMessage::Proprietary {
        message_type: message_type as u8,
        vendor_id,
        data,
    })
}

const NLM_ENTRIES: &[DispatchEntry<NetworkLayerMessage, LengthBudget>] = &[
    DispatchEntry::exact(
        WHO_IS_ROUTER_TO_NETWORK as u64,
        "Who-Is-Router-To-Network",
        decode_who_is_router,
    ),
    DispatchEntry::exact(
        I_AM_ROUTER_TO_NETWORK as u64,
        "I-Am-Router-To-Network",
        decode_i_am_router,
    ),
    DispatchEntry::exact(
        I_COULD_BE_ROUTER_TO_NETWORK as u64,
        "I-Could-Be-Router-To-Network",
        decode_i_could_be_router,
    ),
    DispatchEntry::exact(
        REJECT_MESSAGE_TO_NETWORK as u64,
        "Reject-Message-To-Network",
        decode_reject,
    ),
    DispatchEntry::exact(
        ROUTER_BUSY_TO_NETWORK as u64,
        "Router-Busy-To-Network",
        decode_router_busy,
    ),
    DispatchEntry::exact(
        ROUTER_AVAILABLE_TO_NETWORK as u64,
        "Router-Available-To-Network",
        decode_router_available,
    ),
    DispatchEntry::exact(
        WHAT_IS_NETWORK_NUMBER as u64,
        "What-Is-Network-Number",
        decode_what_is_network_number,
    ),
    DispatchEntry::exact(NETWORK_NUMBER_IS as u64, "Network-Number-Is", decode_network_number_is),
    DispatchEntry::range(FIRST_PROPRIETARY as u64, 0xFF, "Proprietary", decode_proprietary),
];

/// Network layer message types.
pub static NLM_TABLE: DispatchTable<NetworkLayerMessage, LengthBudget> =
    DispatchTable::new("network layer message", 8, NLM_ENTRIES);
