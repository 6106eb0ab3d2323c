//! Datagram transports for KNXnet/IP routing.
//!
//! A routing node only ever talks to one multicast group, so transports
//! carry their destination with them and the node just hands over
//! finished frames.
//!
//! - [`Transport`]: the non-blocking send/receive seam
//! - [`MockTransport`]: scripted inbound frames and a record of sends
//! - `UdpTransport` (feature `std`): a real multicast socket

pub mod mock_transport;
pub mod transport;
#[cfg(feature = "std")]
pub mod udp;

pub use mock_transport::MockTransport;
pub use transport::Transport;
#[cfg(feature = "std")]
pub use udp::UdpTransport;
