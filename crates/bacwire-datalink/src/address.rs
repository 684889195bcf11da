use core::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, SocketAddrV4};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataLinkAddress {
    Ip(SocketAddr),
}

impl DataLinkAddress {
    pub const BACNET_IP_DEFAULT_PORT: u16 = 47808;

    pub fn local_broadcast(port: u16) -> Self {
        Self::Ip(SocketAddr::new(IpAddr::V4(Ipv4Addr::BROADCAST), port))
    }

    pub fn bacnet_default(addr: IpAddr) -> Self {
        Self::Ip(SocketAddr::new(addr, Self::BACNET_IP_DEFAULT_PORT))
    }

    pub fn as_socket_addr(self) -> SocketAddr {
        match self {
            Self::Ip(addr) => addr,
        }
    }

    pub fn is_broadcast(self) -> bool {
        matches!(self.as_socket_addr().ip(), IpAddr::V4(v4) if v4.is_broadcast())
    }

    /// The 6-octet B/IP MAC (address then port) used in NPDU routing fields.
    /// `None` for IPv6 endpoints.
    pub fn bip_mac(self) -> Option<[u8; 6]> {
        match self.as_socket_addr() {
            SocketAddr::V4(v4) => {
                let [a, b, c, d] = v4.ip().octets();
                let [hi, lo] = v4.port().to_be_bytes();
                Some([a, b, c, d, hi, lo])
            }
            SocketAddr::V6(_) => None,
        }
    }

    /// Parses a B/IP MAC taken from an NPDU source or destination.
    pub fn from_bip_mac(mac: &[u8]) -> Option<Self> {
        match *mac {
            [a, b, c, d, hi, lo] => Some(Self::Ip(SocketAddr::V4(SocketAddrV4::new(
                Ipv4Addr::new(a, b, c, d),
                u16::from_be_bytes([hi, lo]),
            )))),
            _ => None,
        }
    }
}

impl From<SocketAddrV4> for DataLinkAddress {
    fn from(addr: SocketAddrV4) -> Self {
        Self::Ip(SocketAddr::V4(addr))
    }
}

impl fmt::Display for DataLinkAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ip(addr) => write!(f, "{addr}"),
        }
    }
}
