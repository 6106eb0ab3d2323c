//! Transport abstraction used by [`KnxDevice`](crate::KnxDevice).
//!
//! The device loop polls; it never blocks waiting for a datagram. An
//! implementation returns `Ok(None)` when nothing is queued and `Ok(Some(n))`
//! after copying one complete datagram into the caller's buffer.
//!
//! ## Example
//!
//! ```rust
//! use knx_ip_node::net::{MockTransport, Transport};
//!
//! let mut mock = MockTransport::new();
//! mock.push_inbound([0x06, 0x10]);
//!
//! let mut buf = [0u8; 16];
//! assert_eq!(mock.try_recv(&mut buf).unwrap(), Some(2));
//! assert_eq!(mock.try_recv(&mut buf).unwrap(), None);
//! ```

use crate::error::Result;

/// Non-blocking datagram transport bound to the routing multicast group.
///
/// # Implementing for a custom transport
///
/// ```rust
/// use knx_ip_node::net::Transport;
/// use knx_ip_node::Result;
///
/// struct Loopback {
///     frame: Option<Vec<u8>>,
/// }
///
/// impl Transport for Loopback {
///     fn try_recv(&mut self, buf: &mut [u8]) -> Result<Option<usize>> {
///         Ok(self.frame.take().map(|frame| {
///             let n = frame.len().min(buf.len());
///             buf[..n].copy_from_slice(&frame[..n]);
///             n
///         }))
///     }
///
///     fn send(&mut self, data: &[u8]) -> Result<()> {
///         self.frame = Some(data.to_vec());
///         Ok(())
///     }
/// }
/// ```
pub trait Transport {
    /// Receive one pending datagram, if any.
    ///
    /// # Errors
    ///
    /// Returns a transport error when the underlying socket fails or the
    /// datagram does not fit `buf`.
    fn try_recv(&mut self, buf: &mut [u8]) -> Result<Option<usize>>;

    /// Send one frame to the multicast group.
    ///
    /// # Errors
    ///
    /// Returns a transport error when the frame cannot be handed to the network.
    fn send(&mut self, data: &[u8]) -> Result<()>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn try_recv(&mut self, buf: &mut [u8]) -> Result<Option<usize>> {
        (**self).try_recv(buf)
    }

    fn send(&mut self, data: &[u8]) -> Result<()> {
        (**self).send(data)
    }
}
