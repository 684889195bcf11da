use crate::{DataLink, DataLinkAddress, DataLinkError};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;

/// Largest frame accepted on send; matches the receive buffers callers use.
pub const MAX_BIP_FRAME_LEN: usize = 1600;

/// BACnet/IP over a UDP socket with broadcast enabled.
#[derive(Debug, Clone)]
pub struct BacnetIpTransport {
    socket: Arc<UdpSocket>,
}

impl BacnetIpTransport {
    pub async fn bind(bind_addr: SocketAddr) -> Result<Self, DataLinkError> {
        let socket = UdpSocket::bind(bind_addr).await?;
        socket.set_broadcast(true)?;
        log::debug!("bound BACnet/IP transport on {}", socket.local_addr()?);
        Ok(Self {
            socket: Arc::new(socket),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, DataLinkError> {
        self.socket.local_addr().map_err(DataLinkError::Io)
    }
}

impl DataLink for BacnetIpTransport {
    async fn send(&self, address: DataLinkAddress, frame: &[u8]) -> Result<(), DataLinkError> {
        if frame.len() > MAX_BIP_FRAME_LEN {
            return Err(DataLinkError::FrameTooLarge);
        }
        let target = address.as_socket_addr();
        self.socket.send_to(frame, target).await.map_err(|e| {
            log::debug!("send to {target} failed: {e}");
            DataLinkError::Io(e)
        })?;
        Ok(())
    }

    async fn recv(&self, buf: &mut [u8]) -> Result<(usize, DataLinkAddress), DataLinkError> {
        let (n, src) = self.socket.recv_from(buf).await.map_err(|e| {
            log::debug!("receive failed: {e}");
            DataLinkError::Io(e)
        })?;
        Ok((n, DataLinkAddress::Ip(src)))
    }
}
