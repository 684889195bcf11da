//! BACnet/IP data link for bacwire: the BVLC frame layer and a UDP transport.

#![allow(async_fn_in_trait)]

pub mod address;
pub mod bip;
pub mod traits;

pub use address::DataLinkAddress;
pub use bip::bvlc::{BroadcastDistributionEntry, Bvlc, ForeignDeviceTableEntry};
pub use bip::transport::BacnetIpTransport;
pub use traits::{DataLink, DataLinkError};
