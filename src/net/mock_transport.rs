//! Mock transport for testing without a network.
//!
//! ## Usage
//!
//! ```rust
//! use knx_ip_node::net::{MockTransport, Transport};
//!
//! let mut mock = MockTransport::new();
//! mock.push_inbound([0x06, 0x10, 0x05, 0x30]);
//!
//! mock.send(&[0xAA, 0xBB]).unwrap();
//! assert_eq!(mock.last_sent(), Some(&[0xAA, 0xBB][..]));
//! ```

use alloc::collections::VecDeque;
use alloc::vec::Vec;

use crate::error::{KnxError, Result};
use crate::net::transport::Transport;

/// In-memory [`Transport`] with scripted inbound datagrams.
///
/// Inbound frames are returned in FIFO order; every sent frame is kept so
/// tests can inspect what the node put on the wire. Failures can be injected
/// for the next send or receive, and a closed mock fails every call.
#[derive(Debug, Default)]
pub struct MockTransport {
    inbound: VecDeque<Vec<u8>>,
    sent: Vec<Vec<u8>>,
    closed: bool,
    fail_next_send: bool,
    fail_next_recv: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a datagram for a later [`try_recv`](Transport::try_recv).
    pub fn push_inbound(&mut self, datagram: impl AsRef<[u8]>) {
        self.inbound.push_back(datagram.as_ref().to_vec());
    }

    /// Datagrams not yet received.
    pub fn pending(&self) -> usize {
        self.inbound.len()
    }

    /// Every frame sent so far, oldest first.
    pub fn sent_frames(&self) -> &[Vec<u8>] {
        &self.sent
    }

    pub fn last_sent(&self) -> Option<&[u8]> {
        self.sent.last().map(Vec::as_slice)
    }

    pub fn clear_sent(&mut self) {
        self.sent.clear();
    }

    /// Make the next `send` fail with a send error.
    pub fn fail_next_send(&mut self) {
        self.fail_next_send = true;
    }

    /// Make the next `try_recv` fail with a receive error.
    pub fn fail_next_recv(&mut self) {
        self.fail_next_recv = true;
    }

    /// Simulate a socket that went away. Pending inbound frames are dropped.
    pub fn close(&mut self) {
        self.closed = true;
        self.inbound.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Transport for MockTransport {
    fn try_recv(&mut self, buf: &mut [u8]) -> Result<Option<usize>> {
        if self.closed {
            return Err(KnxError::socket_error());
        }
        if core::mem::take(&mut self.fail_next_recv) {
            return Err(KnxError::receive_failed());
        }

        let Some(datagram) = self.inbound.pop_front() else {
            return Ok(None);
        };
        let Some(out) = buf.get_mut(..datagram.len()) else {
            knx_log!(warn, "mock datagram of {} bytes dropped", datagram.len());
            return Err(KnxError::buffer_too_small());
        };
        out.copy_from_slice(&datagram);
        Ok(Some(datagram.len()))
    }

    fn send(&mut self, data: &[u8]) -> Result<()> {
        if self.closed {
            return Err(KnxError::socket_error());
        }
        if core::mem::take(&mut self.fail_next_send) {
            return Err(KnxError::send_failed());
        }
        self.sent.push(data.to_vec());
        Ok(())
    }
}
