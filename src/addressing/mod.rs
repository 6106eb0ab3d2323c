//! KNX addressing.
//!
//! A KNX address is a plain 16-bit value. Which view applies is decided by
//! the field it sits in: the source field of a telegram is an individual
//! (physical) address, the destination field a group address. No tag is
//! stored with the value.
//!
//! ```text
//! physical: AAAA LLLL MMMMMMMM   area.line.member
//! group:    AAAAA LLL MMMMMMMM   area/line/member
//! ```

pub mod group;
pub mod individual;

pub use group::GroupAddress;
pub use individual::IndividualAddress;

/// Reinterpret a raw value under the physical view.
#[inline]
pub const fn as_physical(raw: u16) -> IndividualAddress {
    IndividualAddress::from_bytes(raw.to_be_bytes())
}

/// Reinterpret a raw value under the group view.
#[inline]
pub const fn as_group(raw: u16) -> GroupAddress {
    GroupAddress::from_bytes(raw.to_be_bytes())
}

/// Pack a physical address; `area` and `line` are truncated to 4 bits.
#[inline]
pub const fn pack_physical(area: u8, line: u8, member: u8) -> u16 {
    IndividualAddress::pack(area, line, member).raw()
}

/// Pack a group address; `area` is truncated to 5 bits, `line` to 3.
#[inline]
pub const fn pack_group(area: u8, line: u8, member: u8) -> u16 {
    GroupAddress::pack(area, line, member).raw()
}
