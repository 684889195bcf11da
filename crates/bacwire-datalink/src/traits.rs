use crate::{Bvlc, DataLinkAddress};
use bacwire_core::{DecodeError, EncodeError};
use thiserror::Error;

/// Errors that can occur at the data-link layer.
#[derive(Debug, Error)]
pub enum DataLinkError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("frame too large")]
    FrameTooLarge,
    #[error("invalid frame: {0}")]
    Decode(#[from] DecodeError),
    #[error("cannot encode frame: {0}")]
    Encode(#[from] EncodeError),
}

/// Async trait for sending and receiving raw BACnet/IP frames.
///
/// Implementors move whole BVLC frames; the provided methods convert between
/// those bytes and [`Bvlc`] values.
pub trait DataLink: Send + Sync {
    /// Sends `frame` to the given data-link `address`.
    async fn send(&self, address: DataLinkAddress, frame: &[u8]) -> Result<(), DataLinkError>;

    /// Receives a frame into `buf`, returning `(bytes_read, source_address)`.
    async fn recv(&self, buf: &mut [u8]) -> Result<(usize, DataLinkAddress), DataLinkError>;

    /// Encodes `frame` and sends it.
    async fn send_bvlc(&self, address: DataLinkAddress, frame: &Bvlc) -> Result<(), DataLinkError> {
        let bytes = frame.to_bytes()?;
        self.send(address, &bytes).await
    }

    /// Receives one frame and decodes it. `buf` must hold the largest frame
    /// expected on the link.
    async fn recv_bvlc(&self, buf: &mut [u8]) -> Result<(Bvlc, DataLinkAddress), DataLinkError> {
        let (n, source) = self.recv(buf).await?;
        let frame = Bvlc::from_bytes(&buf[..n]).map_err(|e| {
            log::debug!("dropping undecodable frame from {source}: {e}");
            e
        })?;
        Ok((frame, source))
    }
}
