//! Common External Message Interface (cEMI) fields used by routed `L_Data` frames.
//!
//! Only the pieces a routing node needs are modelled here: the two control
//! bytes and the 4-bit command type that the application layer splits across
//! the TPCI/APCI byte and the first payload byte.
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │ Message Code (1 byte)          0x29      │
//! ├──────────────────────────────────────────┤
//! │ Additional Info Length (1 byte)  n       │
//! ├──────────────────────────────────────────┤
//! │ Additional Info (n bytes, skipped)       │
//! ├──────────────────────────────────────────┤
//! │ Control Field 1 (1 byte)                 │
//! │ Control Field 2 (1 byte)                 │
//! │ Source Address (2 bytes)                 │
//! │ Destination Address (2 bytes)            │
//! │ Data Length (1 byte)                     │
//! │ TPCI/APCI (1 byte)                       │
//! │ Data (data length bytes)                 │
//! └──────────────────────────────────────────┘
//! ```

use crate::protocol::constants::Priority;

/// Control Field 1 of `L_Data` frame
///
/// ```text
/// Bit 7: Frame Type (0=extended, 1=standard)
/// Bit 6: Reserved
/// Bit 5: Repeat (0=repeat, 1=do not repeat)
/// Bit 4: System Broadcast (0=system, 1=broadcast)
/// Bit 3-2: Priority (00=system, 01=normal, 10=urgent, 11=low)
/// Bit 1: Acknowledge Request (0=no ack, 1=ack requested)
/// Bit 0: Confirm (0=no error, 1=error)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlField1 {
    raw: u8,
}

impl From<u8> for ControlField1 {
    #[inline(always)]
    fn from(raw: u8) -> Self {
        Self { raw }
    }
}

impl From<ControlField1> for u8 {
    #[inline(always)]
    fn from(ctrl: ControlField1) -> u8 {
        ctrl.raw
    }
}

impl ControlField1 {
    /// Control byte stamped on every outgoing group telegram (0xBC):
    /// standard frame, do not repeat, broadcast, low priority.
    pub const ROUTED_GROUP: Self = Self::new(true, true, true, Priority::Low, false, false);

    /// Get raw byte value
    #[inline(always)]
    pub const fn raw(self) -> u8 {
        self.raw
    }

    /// Check if frame is standard (true) or extended (false)
    #[inline(always)]
    pub const fn is_standard_frame(self) -> bool {
        (self.raw & 0x80) != 0
    }

    /// Check if repeat flag is set (do not repeat if true)
    #[inline(always)]
    pub const fn do_not_repeat(self) -> bool {
        (self.raw & 0x20) != 0
    }

    /// Check if this is a system broadcast
    #[inline(always)]
    pub const fn is_broadcast(self) -> bool {
        (self.raw & 0x10) != 0
    }

    /// Get priority
    #[inline(always)]
    pub const fn priority(self) -> Priority {
        Priority::from_u8((self.raw >> 2) & 0x03)
    }

    /// Check if acknowledge is requested
    #[inline(always)]
    pub const fn ack_requested(self) -> bool {
        (self.raw & 0x02) != 0
    }

    /// Check if confirm error flag is set
    #[inline(always)]
    pub const fn has_error(self) -> bool {
        (self.raw & 0x01) != 0
    }

    /// Create a new Control Field 1
    pub const fn new(
        standard_frame: bool,
        do_not_repeat: bool,
        broadcast: bool,
        priority: Priority,
        ack_requested: bool,
        has_error: bool,
    ) -> Self {
        let mut raw = 0u8;

        if standard_frame {
            raw |= 0x80;
        }
        if do_not_repeat {
            raw |= 0x20;
        }
        if broadcast {
            raw |= 0x10;
        }
        raw |= (priority.to_u8() & 0x03) << 2;
        if ack_requested {
            raw |= 0x02;
        }
        if has_error {
            raw |= 0x01;
        }

        Self { raw }
    }
}

impl Default for ControlField1 {
    #[inline]
    fn default() -> Self {
        Self::ROUTED_GROUP
    }
}

/// Control Field 2 of `L_Data` frame
///
/// ```text
/// Bit 7: Destination Address Type (0=individual, 1=group)
/// Bit 6-4: Hop Count (0-7)
/// Bit 3-0: Extended Frame Format (0000=standard)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlField2 {
    raw: u8,
}

impl From<u8> for ControlField2 {
    #[inline(always)]
    fn from(raw: u8) -> Self {
        Self { raw }
    }
}

impl From<ControlField2> for u8 {
    #[inline(always)]
    fn from(ctrl: ControlField2) -> u8 {
        ctrl.raw
    }
}

impl ControlField2 {
    /// Get raw byte value
    #[inline(always)]
    pub const fn raw(self) -> u8 {
        self.raw
    }

    /// Check if destination is group address (true) or individual (false)
    #[inline(always)]
    pub const fn is_group_address(self) -> bool {
        (self.raw & 0x80) != 0
    }

    /// Get hop count (0-7)
    #[inline(always)]
    pub const fn hop_count(self) -> u8 {
        (self.raw >> 4) & 0x07
    }

    /// Get extended frame format
    #[inline(always)]
    pub const fn extended_format(self) -> u8 {
        self.raw & 0x0F
    }

    /// Create a new Control Field 2
    pub const fn new(is_group: bool, hop_count: u8, extended_format: u8) -> Self {
        let mut raw = 0u8;

        if is_group {
            raw |= 0x80;
        }
        raw |= (hop_count & 0x07) << 4;
        raw |= extended_format & 0x0F;

        Self { raw }
    }
}

impl Default for ControlField2 {
    #[inline]
    fn default() -> Self {
        // group, hop count 6, standard format = 0xE0
        Self::new(true, crate::protocol::constants::DEFAULT_HOP_COUNT, 0)
    }
}

/// Application-layer command of a telegram.
///
/// The 4-bit value is split on the wire: bits 3-2 sit in the low two bits of
/// the TPCI/APCI byte, bits 1-0 in the top two bits of the first data byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum CommandType {
    /// `A_GroupValue_Read`
    Read = 0x00,
    /// `A_GroupValue_Response`
    Answer = 0x01,
    /// `A_GroupValue_Write`
    Write = 0x02,
    /// `A_IndividualAddress_Write`
    IndividualAddrWrite = 0x03,
    /// `A_IndividualAddress_Read`
    IndividualAddrRequest = 0x04,
    /// `A_IndividualAddress_Response`
    IndividualAddrResponse = 0x05,
    /// `A_ADC_Read`
    AdcRead = 0x06,
    /// `A_ADC_Response`
    AdcAnswer = 0x07,
    /// `A_Memory_Read`
    MemRead = 0x08,
    /// `A_Memory_Response`
    MemAnswer = 0x09,
    /// `A_Memory_Write`
    MemWrite = 0x0A,
    /// Unassigned code
    Unknown = 0x0B,
    /// `A_DeviceDescriptor_Read`
    MaskVersionRead = 0x0C,
    /// `A_DeviceDescriptor_Response`
    MaskVersionResponse = 0x0D,
    /// `A_Restart`
    Restart = 0x0E,
    /// Escape to extended APCI
    Escape = 0x0F,
}

impl CommandType {
    /// All command types in code order.
    pub const ALL: [Self; 16] = [
        Self::Read,
        Self::Answer,
        Self::Write,
        Self::IndividualAddrWrite,
        Self::IndividualAddrRequest,
        Self::IndividualAddrResponse,
        Self::AdcRead,
        Self::AdcAnswer,
        Self::MemRead,
        Self::MemAnswer,
        Self::MemWrite,
        Self::Unknown,
        Self::MaskVersionRead,
        Self::MaskVersionResponse,
        Self::Restart,
        Self::Escape,
    ];

    /// Build from the low four bits of `bits`; the upper nibble is ignored.
    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        Self::ALL[(bits & 0x0F) as usize]
    }

    /// 4-bit code
    #[inline(always)]
    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// Recombine the command from the TPCI/APCI byte and the first data byte.
    #[inline]
    pub const fn from_wire(apci_byte: u8, first_data_byte: u8) -> Self {
        Self::from_bits(((first_data_byte & 0xC0) >> 6) | ((apci_byte & 0x03) << 2))
    }

    /// Low bits of the TPCI/APCI byte carrying this command.
    #[inline]
    pub const fn apci_bits(self) -> u8 {
        (self.bits() & 0x0C) >> 2
    }

    /// Top bits of the first data byte carrying this command.
    #[inline]
    pub const fn data_bits(self) -> u8 {
        (self.bits() & 0x03) << 6
    }

    /// Group value read request
    #[inline]
    pub const fn is_read(self) -> bool {
        matches!(self, Self::Read)
    }

    /// Group value write
    #[inline]
    pub const fn is_write(self) -> bool {
        matches!(self, Self::Write)
    }

    /// Response to a group value read
    #[inline]
    pub const fn is_answer(self) -> bool {
        matches!(self, Self::Answer)
    }
}

impl From<CommandType> for u8 {
    fn from(ct: CommandType) -> u8 {
        ct.bits()
    }
}
