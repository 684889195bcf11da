//! BACnet/IP wire codec.
//!
//! `bacwire-core` translates between raw octets and typed BACnet messages:
//! the NPDU network layer, network layer messages, APDUs, a set of
//! confirmed and unconfirmed service codecs, and the application/context
//! tag encoding used inside them. The BVLC transport wrapper lives in
//! `bacwire-datalink`.
//!
//! Every frame is decoded through the same three pieces: a bit-addressable
//! [`Reader`](encoding::reader::Reader), static
//! [`DispatchTable`](encoding::dispatch::DispatchTable)s keyed by the
//! discriminator each layer reads first, and a
//! [`LengthBudget`](encoding::budget::LengthBudget) handed from parent to
//! child so trailing optional fields can be detected by length.
//!
//! # Feature flags
//!
//! - **`serde`**: derives `Serialize`/`Deserialize` on message and value types.

#[macro_use]
mod macros;

/// APDU (Application Protocol Data Unit) types for confirmed/unconfirmed requests and responses.
pub mod apdu;
/// Bit stream, length budget, dispatch tables and the tag codec.
pub mod encoding;
/// Error types for encoding and decoding operations.
pub mod error;
/// Network layer messages carried in place of an APDU.
pub mod nlm;
/// NPDU (Network Protocol Data Unit) encoding and decoding.
pub mod npdu;
/// BACnet service request and response codecs.
pub mod services;
/// Core BACnet data types: object identifiers, property identifiers and enumerations.
pub mod types;

pub use apdu::Apdu;
pub use encoding::reader::DecodeOptions;
pub use error::{DecodeError, Decoded, Diagnostic, EncodeError, ResultExt};
pub use nlm::NetworkLayerMessage;
pub use npdu::Npdu;
