//! Fixed-size typed configuration store.
//!
//! Entries are appended back to back into a byte arena. Each slot starts
//! with a [`ConfigFlags`] byte followed by the payload:
//!
//! ```text
//! | flag | payload ............ | flag | payload | ...
//! ^ entry 0 offset = 0          ^ entry 1 offset = entry 0 end
//! ```
//!
//! A second arena of the same size keeps the factory defaults.

use alloc::string::String;
use heapless::Vec;

use crate::addressing::GroupAddress;
use crate::callbacks::EnableCondition;
use crate::config::entry::{ConfigEntry, ConfigFlags, ConfigId, ConfigKind, OptionEntry};
use crate::error::{KnxError, Result};

/// Maximum number of configuration entries
pub const MAX_CONFIG_ENTRIES: usize = 20;

/// Arena size in bytes
pub const CONFIG_SPACE: usize = 512;

/// Typed configuration arena with factory defaults.
#[derive(Debug)]
pub struct ConfigArena {
    data: [u8; CONFIG_SPACE],
    defaults: [u8; CONFIG_SPACE],
    entries: Vec<ConfigEntry, MAX_CONFIG_ENTRIES>,
}

impl Default for ConfigArena {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigArena {
    pub const fn new() -> Self {
        Self {
            data: [0; CONFIG_SPACE],
            defaults: [0; CONFIG_SPACE],
            entries: Vec::new(),
        }
    }

    // =========================================================================
    // Registration
    // =========================================================================

    fn ensure_entry_slot(&self) -> Result<()> {
        if self.entries.is_full() {
            return Err(KnxError::too_many_entries());
        }
        Ok(())
    }

    /// Append a slot and write `payload` as both live value and default.
    fn append(
        &mut self,
        name: &str,
        kind: ConfigKind,
        payload: &[u8],
        condition: Option<EnableCondition>,
        options: &'static [OptionEntry],
    ) -> Result<ConfigId> {
        let offset = self.used_bytes();
        let Some(end) = offset
            .checked_add(1)
            .and_then(|n| n.checked_add(kind.payload_len()))
            .filter(|&end| end <= CONFIG_SPACE)
        else {
            knx_log!(warn, "config entry {} does not fit ({} bytes free)", name, CONFIG_SPACE - offset);
            return Err(KnxError::out_of_space());
        };

        let id = ConfigId::new(self.entries.len());
        self.entries
            .push(ConfigEntry {
                name: String::from(name),
                kind,
                offset,
                condition,
                options,
            })
            .map_err(|_full| KnxError::too_many_entries())?;

        let slot = &mut self.data[offset..end];
        slot.fill(0);
        slot[1..=payload.len()].copy_from_slice(payload);
        self.defaults[offset..end].copy_from_slice(&self.data[offset..end]);

        knx_log!(debug, "config entry {} at offset {}", name, offset);
        Ok(id)
    }

    /// Register a string entry. `max_len` includes the NUL terminator.
    ///
    /// # Errors
    ///
    /// Returns a config error when the arena is full, when `default` does
    /// not fit `max_len` (or contains NUL), or when the slot does not fit.
    pub fn register_string(
        &mut self,
        name: &str,
        max_len: usize,
        default: &str,
        condition: Option<EnableCondition>,
    ) -> Result<ConfigId> {
        self.ensure_entry_slot()?;
        if default.len() >= max_len || default.as_bytes().contains(&0) {
            return Err(KnxError::invalid_default());
        }
        self.append(name, ConfigKind::String { max_len }, default.as_bytes(), condition, &[])
    }

    /// Register an `i32` entry.
    pub fn register_int(&mut self, name: &str, default: i32, condition: Option<EnableCondition>) -> Result<ConfigId> {
        self.ensure_entry_slot()?;
        self.append(name, ConfigKind::Int, &default.to_be_bytes(), condition, &[])
    }

    /// Register a boolean entry.
    pub fn register_bool(&mut self, name: &str, default: bool, condition: Option<EnableCondition>) -> Result<ConfigId> {
        self.ensure_entry_slot()?;
        self.append(name, ConfigKind::Bool, &[u8::from(default)], condition, &[])
    }

    /// Register an option-set entry. `default` is stored as given; only
    /// setters check membership.
    pub fn register_options(
        &mut self,
        name: &str,
        options: &'static [OptionEntry],
        default: u8,
        condition: Option<EnableCondition>,
    ) -> Result<ConfigId> {
        self.ensure_entry_slot()?;
        if options.is_empty() {
            return Err(KnxError::empty_options());
        }
        self.append(name, ConfigKind::Options, &[default], condition, options)
    }

    /// Register a group address entry, defaulting to 0/0/0.
    pub fn register_group_address(&mut self, name: &str, condition: Option<EnableCondition>) -> Result<ConfigId> {
        self.ensure_entry_slot()?;
        self.append(name, ConfigKind::GroupAddress, &[0, 0], condition, &[])
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    pub fn entry(&self, id: ConfigId) -> Option<&ConfigEntry> {
        self.entries.get(id.index())
    }

    pub fn entries(&self) -> &[ConfigEntry] {
        &self.entries
    }

    /// Look an entry up by name.
    pub fn find(&self, name: &str) -> Option<ConfigId> {
        self.entries
            .iter()
            .position(|entry| entry.name == name)
            .map(ConfigId::new)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bytes allocated so far.
    pub fn used_bytes(&self) -> usize {
        self.entries.last().map_or(0, ConfigEntry::end)
    }

    /// Whether a setter has written the entry since the last restore.
    pub fn is_set(&self, id: ConfigId) -> bool {
        self.entry(id)
            .is_some_and(|entry| ConfigFlags::from_bits_truncate(self.data[entry.offset]).contains(ConfigFlags::VALUE_SET))
    }

    /// Evaluate the entry's condition; unknown ids are not enabled.
    pub fn is_enabled(&self, id: ConfigId) -> bool {
        self.entry(id).is_some_and(ConfigEntry::is_enabled)
    }

    // =========================================================================
    // Getters (zero value on unknown id or type mismatch)
    // =========================================================================

    fn payload(&self, id: ConfigId, kind: ConfigKind) -> Option<&[u8]> {
        let entry = self.entry(id).filter(|entry| entry.kind.same_type(kind))?;
        self.data.get(entry.offset + 1..entry.end())
    }

    pub fn get_string(&self, id: ConfigId) -> &str {
        let Some(bytes) = self.payload(id, ConfigKind::String { max_len: 0 }) else {
            return "";
        };
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        core::str::from_utf8(&bytes[..end]).unwrap_or("")
    }

    pub fn get_int(&self, id: ConfigId) -> i32 {
        self.payload(id, ConfigKind::Int)
            .and_then(|bytes| bytes.try_into().ok())
            .map_or(0, i32::from_be_bytes)
    }

    pub fn get_bool(&self, id: ConfigId) -> bool {
        self.payload(id, ConfigKind::Bool).is_some_and(|bytes| bytes[0] != 0)
    }

    pub fn get_option(&self, id: ConfigId) -> u8 {
        self.payload(id, ConfigKind::Options).map_or(0, |bytes| bytes[0])
    }

    pub fn get_group_address(&self, id: ConfigId) -> GroupAddress {
        self.payload(id, ConfigKind::GroupAddress)
            .map_or(GroupAddress::default(), |bytes| GroupAddress::from_bytes([bytes[0], bytes[1]]))
    }

    // =========================================================================
    // Setters
    // =========================================================================

    /// Check the entry and return its slot range.
    fn slot_for(&self, id: ConfigId, kind: ConfigKind) -> Result<(usize, usize, &ConfigEntry)> {
        let entry = self.entry(id).ok_or_else(KnxError::unknown_entry)?;
        if !entry.kind.same_type(kind) {
            return Err(KnxError::type_mismatch());
        }
        Ok((entry.offset, entry.end(), entry))
    }

    fn write(&mut self, offset: usize, end: usize, payload: &[u8]) {
        let slot = &mut self.data[offset..end];
        let flags = ConfigFlags::from_bits_retain(slot[0]) | ConfigFlags::VALUE_SET;
        slot.fill(0);
        slot[0] = flags.bits();
        slot[1..=payload.len()].copy_from_slice(payload);
    }

    /// Store a string; it must be shorter than the entry's `max_len`.
    ///
    /// # Errors
    ///
    /// Config error for an unknown id, a non-string entry, an over-long
    /// value or a value containing NUL. The stored value is unchanged.
    pub fn set_string(&mut self, id: ConfigId, value: &str) -> Result<()> {
        let (offset, end, entry) = self.slot_for(id, ConfigKind::String { max_len: 0 })?;
        if value.len() >= entry.kind.payload_len() {
            return Err(KnxError::value_too_long());
        }
        if value.as_bytes().contains(&0) {
            return Err(KnxError::invalid_value());
        }
        self.write(offset, end, value.as_bytes());
        Ok(())
    }

    pub fn set_int(&mut self, id: ConfigId, value: i32) -> Result<()> {
        let (offset, end, _) = self.slot_for(id, ConfigKind::Int)?;
        self.write(offset, end, &value.to_be_bytes());
        Ok(())
    }

    pub fn set_bool(&mut self, id: ConfigId, value: bool) -> Result<()> {
        let (offset, end, _) = self.slot_for(id, ConfigKind::Bool)?;
        self.write(offset, end, &[u8::from(value)]);
        Ok(())
    }

    /// Store an option value; it must be one of the entry's options.
    pub fn set_option(&mut self, id: ConfigId, value: u8) -> Result<()> {
        let (offset, end, entry) = self.slot_for(id, ConfigKind::Options)?;
        if !entry.options.iter().any(|opt| opt.value == value) {
            return Err(KnxError::unknown_option());
        }
        self.write(offset, end, &[value]);
        Ok(())
    }

    pub fn set_group_address(&mut self, id: ConfigId, value: GroupAddress) -> Result<()> {
        let (offset, end, _) = self.slot_for(id, ConfigKind::GroupAddress)?;
        self.write(offset, end, &value.to_bytes());
        Ok(())
    }

    // =========================================================================
    // Defaults and raw access
    // =========================================================================

    /// Make the current live values the factory defaults.
    pub fn snapshot_defaults(&mut self) {
        self.defaults = self.data;
    }

    /// Reset every live value to its factory default.
    pub fn restore_defaults(&mut self) {
        self.data = self.defaults;
    }

    /// Live arena bytes.
    pub fn as_bytes(&self) -> &[u8; CONFIG_SPACE] {
        &self.data
    }

    /// Factory default bytes.
    pub fn default_bytes(&self) -> &[u8; CONFIG_SPACE] {
        &self.defaults
    }

    /// Overwrite the live arena (persistence restore).
    pub(crate) fn load_bytes(&mut self, bytes: &[u8; CONFIG_SPACE]) {
        self.data = *bytes;
    }
}
