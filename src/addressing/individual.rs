//! KNX Individual (physical) Address implementation.
//!
//! Individual addresses identify a device on the bus. This node uses one as
//! the source of every telegram it sends, and decodes the source field of
//! received telegrams with this view.
//!
//! Format: Area.Line.Member (e.g., 1.1.160)
//! - Area: 0-15 (4 bits)
//! - Line: 0-15 (4 bits)
//! - Member: 0-255 (8 bits)

use crate::error::{KnxError, Result};
use core::fmt;

/// KNX Individual Address (Area.Line.Member)
///
/// # Examples
///
/// ```
/// use knx_ip_node::IndividualAddress;
///
/// let addr = IndividualAddress::new(1, 1, 160).unwrap();
/// assert_eq!(addr.to_string(), "1.1.160");
/// assert_eq!(u16::from(addr), 0x11A0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IndividualAddress {
    raw: u16,
}

impl IndividualAddress {
    /// Maximum area value (4 bits)
    pub const MAX_AREA: u8 = 15;
    /// Maximum line value (4 bits)
    pub const MAX_LINE: u8 = 15;

    /// Create a new Individual Address from components.
    ///
    /// # Errors
    ///
    /// Returns an addressing error if `area` or `line` exceeds 15.
    pub fn new(area: u8, line: u8, member: u8) -> Result<Self> {
        if area > Self::MAX_AREA || line > Self::MAX_LINE {
            return Err(KnxError::address_out_of_range());
        }
        Ok(Self::pack(area, line, member))
    }

    /// Pack components without validation; area and line are truncated to 4 bits.
    #[inline]
    pub const fn pack(area: u8, line: u8, member: u8) -> Self {
        let raw = (((area & 0x0F) as u16) << 12) | (((line & 0x0F) as u16) << 8) | member as u16;
        Self { raw }
    }

    /// Get the raw u16 representation of the address.
    #[inline(always)]
    pub const fn raw(self) -> u16 {
        self.raw
    }

    /// Get the area component (0-15).
    #[inline(always)]
    pub const fn area(self) -> u8 {
        ((self.raw >> 12) & 0x0F) as u8
    }

    /// Get the line component (0-15).
    #[inline(always)]
    pub const fn line(self) -> u8 {
        ((self.raw >> 8) & 0x0F) as u8
    }

    /// Get the member component (0-255).
    #[inline(always)]
    pub const fn member(self) -> u8 {
        (self.raw & 0xFF) as u8
    }

    /// Big-endian wire bytes `[high, low]`.
    #[inline]
    pub const fn to_bytes(self) -> [u8; 2] {
        self.raw.to_be_bytes()
    }

    /// Build from big-endian wire bytes `[high, low]`.
    #[inline]
    pub const fn from_bytes(bytes: [u8; 2]) -> Self {
        Self {
            raw: u16::from_be_bytes(bytes),
        }
    }
}

impl fmt::Display for IndividualAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.area(), self.line(), self.member())
    }
}

impl From<u16> for IndividualAddress {
    #[inline(always)]
    fn from(raw: u16) -> Self {
        Self { raw }
    }
}

impl From<IndividualAddress> for u16 {
    #[inline(always)]
    fn from(addr: IndividualAddress) -> u16 {
        addr.raw
    }
}

impl core::str::FromStr for IndividualAddress {
    type Err = KnxError;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.trim().split('.');
        let mut next = || {
            parts
                .next()
                .and_then(|p| p.parse::<u8>().ok())
                .ok_or_else(KnxError::invalid_individual_address)
        };

        let area = next()?;
        let line = next()?;
        let member = next()?;

        if parts.next().is_some() {
            return Err(KnxError::invalid_individual_address());
        }

        Self::new(area, line, member)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_valid() {
        let addr = IndividualAddress::new(1, 1, 160).unwrap();
        assert_eq!(addr.area(), 1);
        assert_eq!(addr.line(), 1);
        assert_eq!(addr.member(), 160);
        assert_eq!(addr.raw(), 0x11A0);
    }

    #[test]
    fn test_new_out_of_range() {
        assert!(IndividualAddress::new(16, 0, 0).is_err());
        assert!(IndividualAddress::new(0, 16, 0).is_err());
    }

    #[test]
    fn test_pack_truncates() {
        assert_eq!(IndividualAddress::pack(0x1F, 0x12, 3), IndividualAddress::pack(15, 2, 3));
    }

    #[test]
    fn test_display() {
        let addr = IndividualAddress::new(1, 2, 3).unwrap();
        assert_eq!(format!("{}", addr), "1.2.3");
    }

    #[test]
    fn test_from_str() {
        let addr: IndividualAddress = "15.15.255".parse().unwrap();
        assert_eq!(addr.raw(), 0xFFFF);
    }

    #[test]
    fn test_from_str_invalid() {
        assert!("1.2".parse::<IndividualAddress>().is_err());
        assert!("16.0.0".parse::<IndividualAddress>().is_err());
        assert!("1.2.3.4".parse::<IndividualAddress>().is_err());
        assert!("a.b.c".parse::<IndividualAddress>().is_err());
        assert!("".parse::<IndividualAddress>().is_err());
    }
}
