//! KNX Group Address implementation.
//!
//! Group addresses name a function on the bus ("living room temperature")
//! rather than a device. They appear in the destination field of every
//! telegram this node accepts.
//!
//! Layout of the 16-bit value (three-level notation):
//! - Area: 5 bits (0-31)
//! - Line: 3 bits (0-7)
//! - Member: 8 bits (0-255)

use crate::error::{KnxError, Result};
use core::fmt;

/// KNX Group Address (Area/Line/Member)
///
/// # Examples
///
/// ```
/// use knx_ip_node::GroupAddress;
///
/// let addr = GroupAddress::new(10, 6, 5).unwrap();
/// assert_eq!(addr.to_string(), "10/6/5");
/// assert_eq!(addr.raw(), 0x5605);
///
/// let parsed: GroupAddress = "10/6/5".parse().unwrap();
/// assert_eq!(parsed, addr);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupAddress {
    raw: u16,
}

impl GroupAddress {
    /// Maximum area value (5 bits)
    pub const MAX_AREA: u8 = 31;
    /// Maximum line value (3 bits)
    pub const MAX_LINE: u8 = 7;

    /// Create a new Group Address, rejecting components wider than their field.
    ///
    /// # Errors
    ///
    /// Returns an addressing error if `area > 31` or `line > 7`.
    pub fn new(area: u8, line: u8, member: u8) -> Result<Self> {
        if area > Self::MAX_AREA || line > Self::MAX_LINE {
            return Err(KnxError::address_out_of_range());
        }
        Ok(Self::pack(area, line, member))
    }

    /// Pack components without validation; each is truncated to its bit width.
    #[inline]
    pub const fn pack(area: u8, line: u8, member: u8) -> Self {
        let raw = (((area & 0x1F) as u16) << 11) | (((line & 0x07) as u16) << 8) | member as u16;
        Self { raw }
    }

    /// Get the raw u16 representation of the address.
    #[inline(always)]
    pub const fn raw(self) -> u16 {
        self.raw
    }

    /// Get the area component (0-31).
    #[inline(always)]
    pub const fn area(self) -> u8 {
        ((self.raw >> 11) & 0x1F) as u8
    }

    /// Get the line component (0-7).
    #[inline(always)]
    pub const fn line(self) -> u8 {
        ((self.raw >> 8) & 0x07) as u8
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

impl From<u16> for GroupAddress {
    #[inline(always)]
    fn from(raw: u16) -> Self {
        Self { raw }
    }
}

impl From<GroupAddress> for u16 {
    #[inline(always)]
    fn from(addr: GroupAddress) -> u16 {
        addr.raw
    }
}

impl fmt::Display for GroupAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.area(), self.line(), self.member())
    }
}

impl core::str::FromStr for GroupAddress {
    type Err = KnxError;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.trim().split('/');
        let mut next = || {
            parts
                .next()
                .and_then(|p| p.parse::<u8>().ok())
                .ok_or_else(KnxError::invalid_group_address)
        };

        let area = next()?;
        let line = next()?;
        let member = next()?;

        if parts.next().is_some() {
            return Err(KnxError::invalid_group_address());
        }

        Self::new(area, line, member)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_valid() {
        let addr = GroupAddress::new(10, 6, 5).unwrap();
        assert_eq!(addr.area(), 10);
        assert_eq!(addr.line(), 6);
        assert_eq!(addr.member(), 5);
        assert_eq!(addr.raw(), 0x5605);
    }

    #[test]
    fn test_new_out_of_range() {
        assert!(GroupAddress::new(32, 0, 0).is_err());
        assert!(GroupAddress::new(0, 8, 0).is_err());
    }

    #[test]
    fn test_pack_truncates() {
        // 33 -> 1, 9 -> 1
        let addr = GroupAddress::pack(33, 9, 7);
        assert_eq!(addr, GroupAddress::pack(1, 1, 7));
    }

    #[test]
    fn test_wire_bytes() {
        let addr = GroupAddress::new(31, 7, 255).unwrap();
        assert_eq!(addr.to_bytes(), [0xFF, 0xFF]);
        assert_eq!(GroupAddress::from_bytes([0x56, 0x05]), GroupAddress::pack(10, 6, 5));
    }

    #[test]
    fn test_display() {
        let addr = GroupAddress::new(1, 2, 3).unwrap();
        assert_eq!(format!("{}", addr), "1/2/3");
    }

    #[test]
    fn test_from_str() {
        let addr: GroupAddress = "10/6/5".parse().unwrap();
        assert_eq!(addr.raw(), 0x5605);
    }

    #[test]
    fn test_from_str_invalid() {
        assert!("1/2".parse::<GroupAddress>().is_err());
        assert!("32/0/0".parse::<GroupAddress>().is_err());
        assert!("1/2/3/4".parse::<GroupAddress>().is_err());
        assert!("a/b/c".parse::<GroupAddress>().is_err());
        assert!("".parse::<GroupAddress>().is_err());
    }
}
