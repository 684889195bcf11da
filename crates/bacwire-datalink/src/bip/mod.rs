/// BVLC frame codec.
pub mod bvlc;
/// UDP transport.
pub mod transport;
