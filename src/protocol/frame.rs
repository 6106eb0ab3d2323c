//! KNXnet/IP frame header.
//!
//! ```text
//! ┌─────────────────────────────┐
//! │  Header (6 bytes)           │
//! │  - Header Length: 0x06      │
//! │  - Protocol Version: 0x10   │
//! │  - Service Type: 2 bytes    │
//! │  - Total Length: 2 bytes    │
//! ├─────────────────────────────┤
//! │  Body (variable)            │
//! └─────────────────────────────┘
//! ```

use crate::error::{KnxError, Result};
use crate::protocol::constants::{ServiceType, HEADER_SIZE_10, KNXNETIP_VERSION_10};

/// KNXnet/IP frame header (6 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KnxnetIpHeader {
    /// Service type identifier
    pub service_type: ServiceType,
    /// Total length of frame (header + body)
    pub total_length: u16,
}

impl KnxnetIpHeader {
    /// Size of the header in bytes
    pub const SIZE: usize = 6;

    /// Create a new header
    pub const fn new(service_type: ServiceType, body_length: u16) -> Self {
        Self {
            service_type,
            total_length: Self::SIZE as u16 + body_length,
        }
    }

    /// Parse a header from a byte slice
    ///
    /// # Errors
    ///
    /// Returns a protocol error if the buffer is shorter than a header, the
    /// header length or protocol version differ from 0x06/0x10, or the
    /// service type is not a known routing service.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let Some(&[header_length, protocol_version, st_hi, st_lo, len_hi, len_lo]) = data.get(..Self::SIZE)
        else {
            return Err(KnxError::invalid_frame());
        };

        if header_length != HEADER_SIZE_10 || protocol_version != KNXNETIP_VERSION_10 {
            return Err(KnxError::unsupported_version());
        }

        let service_type = ServiceType::from_u16(u16::from_be_bytes([st_hi, st_lo]))
            .ok_or_else(KnxError::unsupported_service_type)?;

        Ok(Self {
            service_type,
            total_length: u16::from_be_bytes([len_hi, len_lo]),
        })
    }

    /// Encode header into the start of `buf`, returning the bytes written.
    ///
    /// # Errors
    ///
    /// Returns a transport error if `buf` is shorter than [`Self::SIZE`].
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let out = buf
            .get_mut(..Self::SIZE)
            .ok_or_else(KnxError::buffer_too_small)?;

        let st = self.service_type.to_u16().to_be_bytes();
        let len = self.total_length.to_be_bytes();
        out.copy_from_slice(&[HEADER_SIZE_10, KNXNETIP_VERSION_10, st[0], st[1], len[0], len[1]]);

        Ok(Self::SIZE)
    }
}

/// A borrowed KNXnet/IP frame: validated header plus the raw body.
#[derive(Debug, Clone, Copy)]
pub struct KnxnetIpFrame<'a> {
    header: KnxnetIpHeader,
    body: &'a [u8],
}

impl<'a> KnxnetIpFrame<'a> {
    /// Split a datagram into header and body.
    ///
    /// The header's total length is informational; the body is everything
    /// after the header in the captured datagram.
    ///
    /// # Errors
    ///
    /// See [`KnxnetIpHeader::parse`].
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        let header = KnxnetIpHeader::parse(data)?;
        let body = data.get(KnxnetIpHeader::SIZE..).unwrap_or(&[]);
        Ok(Self { header, body })
    }

    /// Frame header
    #[inline]
    pub const fn header(&self) -> &KnxnetIpHeader {
        &self.header
    }

    /// Service type from the header
    #[inline]
    pub const fn service_type(&self) -> ServiceType {
        self.header.service_type
    }

    /// Bytes following the header
    #[inline]
    pub const fn body(&self) -> &'a [u8] {
        self.body
    }
}
