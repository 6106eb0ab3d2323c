//! Multicast UDP transport for std hosts.

use std::io::ErrorKind;
use std::net::{Ipv4Addr, SocketAddrV4, UdpSocket};

use crate::error::{KnxError, Result};
use crate::net::transport::Transport;
use crate::protocol::constants::{KNXNETIP_DEFAULT_PORT, KNXNETIP_MULTICAST_ADDR};
use crate::settings::DeviceSettings;

/// Non-blocking socket joined to a KNXnet/IP routing group.
///
/// ```rust,no_run
/// use knx_ip_node::net::UdpTransport;
/// use knx_ip_node::settings::{DeviceSettings, DEFAULT_SETTINGS};
///
/// let settings = DeviceSettings::parse(DEFAULT_SETTINGS)?;
/// let transport = UdpTransport::from_settings(&settings)?;
/// # Ok::<(), knx_ip_node::KnxError>(())
/// ```
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    group: SocketAddrV4,
}

impl UdpTransport {
    /// Join the standard routing group `224.0.23.12:3671`.
    pub fn routing() -> Result<Self> {
        Self::bind(KNXNETIP_MULTICAST_ADDR, KNXNETIP_DEFAULT_PORT)
    }

    /// Join the group and port named by `settings`.
    pub fn from_settings(settings: &DeviceSettings) -> Result<Self> {
        let endpoint = settings.routing_endpoint();
        Self::bind(*endpoint.ip(), endpoint.port())
    }

    /// Bind `0.0.0.0:port` and join `group` on the default interface.
    pub fn bind(group: Ipv4Addr, port: u16) -> Result<Self> {
        let socket = UdpSocket::bind(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port)).map_err(|_io_error| {
            knx_log!(error, "cannot bind routing port {}", port);
            KnxError::socket_error()
        })?;
        socket
            .join_multicast_v4(&group, &Ipv4Addr::UNSPECIFIED)
            .map_err(|_io_error| {
                knx_log!(error, "cannot join routing multicast group on port {}", port);
                KnxError::socket_error()
            })?;
        socket.set_nonblocking(true).map_err(|_io_error| KnxError::socket_error())?;

        knx_log!(info, "routing socket ready on port {}", port);
        Ok(Self {
            socket,
            group: SocketAddrV4::new(group, port),
        })
    }

    /// Multicast destination of every sent frame.
    pub fn group(&self) -> SocketAddrV4 {
        self.group
    }
}

impl Transport for UdpTransport {
    fn try_recv(&mut self, buf: &mut [u8]) -> Result<Option<usize>> {
        match self.socket.recv_from(buf) {
            Ok((n, _from)) => Ok(Some(n)),
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(None),
            Err(_io_error) => Err(KnxError::receive_failed()),
        }
    }

    fn send(&mut self, data: &[u8]) -> Result<()> {
        let sent = self
            .socket
            .send_to(data, self.group)
            .map_err(|_io_error| KnxError::send_failed())?;
        if sent == data.len() {
            Ok(())
        } else {
            knx_log!(warn, "short multicast send: {} of {} bytes", sent, data.len());
            Err(KnxError::send_failed())
        }
    }
}
