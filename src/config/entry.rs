//! Configuration entry descriptors.

use alloc::string::String;
use bitflags::bitflags;
use core::fmt;

use crate::callbacks::EnableCondition;

bitflags! {
    /// Leading byte of every entry slot in the arena.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ConfigFlags: u8 {
        /// Value was written by a setter rather than taken from the default
        const VALUE_SET = 0b0000_0001;
    }
}

/// Value type held by an entry and its payload size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigKind {
    /// NUL-terminated text; `max_len` includes the terminator
    String { max_len: usize },
    /// Big-endian `i32`
    Int,
    /// One byte, 0 or 1
    Bool,
    /// One byte chosen from the entry's option list
    Options,
    /// Raw 16-bit group address, high byte first
    GroupAddress,
}

impl ConfigKind {
    /// Payload bytes after the flag byte.
    pub const fn payload_len(self) -> usize {
        match self {
            Self::String { max_len } => max_len,
            Self::Int => 4,
            Self::Bool | Self::Options => 1,
            Self::GroupAddress => 2,
        }
    }

    pub(crate) const fn same_type(self, other: Self) -> bool {
        matches!(
            (self, other),
            (Self::String { .. }, Self::String { .. })
                | (Self::Int, Self::Int)
                | (Self::Bool, Self::Bool)
                | (Self::Options, Self::Options)
                | (Self::GroupAddress, Self::GroupAddress)
        )
    }
}

/// One selectable value of an option-set entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OptionEntry {
    pub label: &'static str,
    pub value: u8,
}

impl OptionEntry {
    pub const fn new(label: &'static str, value: u8) -> Self {
        Self { label, value }
    }
}

/// Index of a registered configuration entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConfigId(u8);

impl ConfigId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub(crate) const fn new(index: usize) -> Self {
        Self(index as u8)
    }
}

impl From<u8> for ConfigId {
    fn from(raw: u8) -> Self {
        Self(raw)
    }
}

/// Descriptor of one slot in the arena.
pub struct ConfigEntry {
    pub(crate) name: String,
    pub(crate) kind: ConfigKind,
    pub(crate) offset: usize,
    pub(crate) condition: Option<EnableCondition>,
    pub(crate) options: &'static [OptionEntry],
}

impl ConfigEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn kind(&self) -> ConfigKind {
        self.kind
    }

    /// Position of the flag byte in the arena.
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Slot size: flag byte plus payload.
    pub const fn len(&self) -> usize {
        1 + self.kind.payload_len()
    }

    /// End of the slot (exclusive).
    pub const fn end(&self) -> usize {
        self.offset + self.len()
    }

    /// Option list; empty for other kinds.
    pub const fn options(&self) -> &'static [OptionEntry] {
        self.options
    }

    pub const fn has_condition(&self) -> bool {
        self.condition.is_some()
    }

    /// Entries without a condition are always enabled.
    pub fn is_enabled(&self) -> bool {
        self.condition.as_ref().is_none_or(|condition| condition())
    }
}

impl fmt::Debug for ConfigEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigEntry")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("offset", &self.offset)
            .field("conditional", &self.condition.is_some())
            .field("options", &self.options)
            .finish()
    }
}
