//! Error types for the KNX/IP node.
//!
//! Every fallible operation in the crate returns [`KnxError`]. Errors are
//! grouped by category; the precise reason lives in an internal kind enum and
//! is queried through the `is_*` helpers of each category struct.

use core::fmt;

#[cfg(feature = "std")]
use std::backtrace::Backtrace;

/// Result type alias for KNX operations.
pub type Result<T> = core::result::Result<T, KnxError>;

// =============================================================================
// Error Kind Enums (Internal)
// =============================================================================

/// Protocol error variants (internal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum ProtocolErrorKind {
    InvalidFrame,
    UnsupportedVersion,
    UnsupportedServiceType,
    InvalidMessageCode,
    IndividualDestination,
    PayloadTooLarge,
}

/// Transport error variants (internal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum TransportErrorKind {
    SendFailed,
    ReceiveFailed,
    BufferTooSmall,
    SocketError,
}

/// Addressing error variants (internal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum AddressingErrorKind {
    InvalidIndividualAddress,
    InvalidGroupAddress,
    OutOfRange,
}

/// DPT error variants (internal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum DptErrorKind {
    InvalidData,
    ValueOutOfRange,
}

/// Configuration arena error variants (internal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum ConfigErrorKind {
    TooManyEntries,
    OutOfSpace,
    InvalidDefault,
    EmptyOptions,
    UnknownEntry,
    TypeMismatch,
    ValueTooLong,
    InvalidValue,
    UnknownOption,
}

/// Callback registry error variants (internal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum RegistryErrorKind {
    TooManyCallbacks,
    TooManyBindings,
    UnknownCallback,
    UnknownBinding,
}

/// Storage backend error variants (internal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum StorageErrorKind {
    ReadFailed,
    WriteFailed,
}

// =============================================================================
// Main Error Type
// =============================================================================

/// KNX node error types.
///
/// This is the main error type returned by all fallible operations.
/// It contains a backtrace (when std feature is enabled) and detailed
/// error information through helper methods.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KnxError {
    /// Datagram rejected by the telegram parser
    Protocol(ProtocolError),
    /// Socket or mock transport failure
    Transport(TransportError),
    /// Invalid address format or component
    Addressing(AddressingError),
    /// Datapoint encoding or decoding failure
    Dpt(DptError),
    /// Configuration arena registration or set rejected
    Config(ConfigError),
    /// Callback or binding registration rejected
    Registry(RegistryError),
    /// Persistent storage backend failure
    Storage(StorageError),
}

// =============================================================================
// Structured Error Types
// =============================================================================

macro_rules! error_struct {
    ($(#[$meta:meta])* $name:ident, $kind:ty) => {
        $(#[$meta])*
        #[derive(Debug)]
        pub struct $name {
            kind: $kind,
            #[cfg(feature = "std")]
            backtrace: Backtrace,
        }

        impl $name {
            pub(crate) fn new(kind: $kind) -> Self {
                Self {
                    kind,
                    #[cfg(feature = "std")]
                    backtrace: Backtrace::capture(),
                }
            }

            /// Backtrace captured where the error was raised.
            #[cfg(feature = "std")]
            pub fn backtrace(&self) -> &Backtrace {
                &self.backtrace
            }
        }

        // The backtrace has no defmt representation; only the kind is logged.
        #[cfg(feature = "defmt")]
        impl defmt::Format for $name {
            fn format(&self, f: defmt::Formatter<'_>) {
                defmt::write!(f, "{}", self.kind);
            }
        }
    };
}

error_struct!(
    /// Protocol error with optional backtrace
    ProtocolError,
    ProtocolErrorKind
);

impl ProtocolError {
    /// Check if the frame was truncated or structurally invalid
    pub fn is_invalid_frame(&self) -> bool {
        matches!(self.kind, ProtocolErrorKind::InvalidFrame)
    }

    /// Check if the header length or protocol version was wrong
    pub fn is_unsupported_version(&self) -> bool {
        matches!(self.kind, ProtocolErrorKind::UnsupportedVersion)
    }

    /// Check if the service type was not a routing indication
    pub fn is_unsupported_service_type(&self) -> bool {
        matches!(self.kind, ProtocolErrorKind::UnsupportedServiceType)
    }

    /// Check if the cEMI message code was not `L_Data.ind`
    pub fn is_invalid_message_code(&self) -> bool {
        matches!(self.kind, ProtocolErrorKind::InvalidMessageCode)
    }

    /// Check if the telegram targeted an individual address
    pub fn is_individual_destination(&self) -> bool {
        matches!(self.kind, ProtocolErrorKind::IndividualDestination)
    }

    /// Check if the payload exceeded the maximum APDU size
    pub fn is_payload_too_large(&self) -> bool {
        matches!(self.kind, ProtocolErrorKind::PayloadTooLarge)
    }
}

error_struct!(
    /// Transport error with optional backtrace
    TransportError,
    TransportErrorKind
);

impl TransportError {
    /// Check if buffer is too small
    pub fn is_buffer_too_small(&self) -> bool {
        matches!(self.kind, TransportErrorKind::BufferTooSmall)
    }

    /// Check if this is a socket error
    pub fn is_socket_error(&self) -> bool {
        matches!(self.kind, TransportErrorKind::SocketError)
    }

    /// Check if sending a datagram failed
    pub fn is_send_failed(&self) -> bool {
        matches!(self.kind, TransportErrorKind::SendFailed)
    }

    /// Check if receiving a datagram failed
    pub fn is_receive_failed(&self) -> bool {
        matches!(self.kind, TransportErrorKind::ReceiveFailed)
    }
}

error_struct!(
    /// Addressing error with optional backtrace
    AddressingError,
    AddressingErrorKind
);

impl AddressingError {
    /// Check if address is out of range
    pub fn is_out_of_range(&self) -> bool {
        matches!(self.kind, AddressingErrorKind::OutOfRange)
    }

    /// Check if a group address could not be parsed or used
    pub fn is_invalid_group_address(&self) -> bool {
        matches!(self.kind, AddressingErrorKind::InvalidGroupAddress)
    }

    /// Check if an individual address could not be parsed
    pub fn is_invalid_individual_address(&self) -> bool {
        matches!(self.kind, AddressingErrorKind::InvalidIndividualAddress)
    }
}

error_struct!(
    /// DPT error with optional backtrace
    DptError,
    DptErrorKind
);

impl DptError {
    /// Check if value is out of range
    pub fn is_out_of_range(&self) -> bool {
        matches!(self.kind, DptErrorKind::ValueOutOfRange)
    }

    /// Check if the payload was too short or marked invalid
    pub fn is_invalid_data(&self) -> bool {
        matches!(self.kind, DptErrorKind::InvalidData)
    }
}

error_struct!(
    /// Configuration arena error with optional backtrace
    ConfigError,
    ConfigErrorKind
);

impl ConfigError {
    /// Check if the arena already holds the maximum number of entries
    pub fn is_too_many_entries(&self) -> bool {
        matches!(self.kind, ConfigErrorKind::TooManyEntries)
    }

    /// Check if the entry did not fit the remaining arena space
    pub fn is_out_of_space(&self) -> bool {
        matches!(self.kind, ConfigErrorKind::OutOfSpace)
    }

    /// Check if a registration default violated the entry constraints
    pub fn is_invalid_default(&self) -> bool {
        matches!(self.kind, ConfigErrorKind::InvalidDefault)
    }

    /// Check if an option set was registered without options
    pub fn is_empty_options(&self) -> bool {
        matches!(self.kind, ConfigErrorKind::EmptyOptions)
    }

    /// Check if the entry id is not registered
    pub fn is_unknown_entry(&self) -> bool {
        matches!(self.kind, ConfigErrorKind::UnknownEntry)
    }

    /// Check if the entry has another type than the operation expects
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self.kind, ConfigErrorKind::TypeMismatch)
    }

    /// Check if a string value does not fit the entry
    pub fn is_value_too_long(&self) -> bool {
        matches!(self.kind, ConfigErrorKind::ValueTooLong)
    }

    /// Check if a value cannot be stored (e.g. embedded NUL)
    pub fn is_invalid_value(&self) -> bool {
        matches!(self.kind, ConfigErrorKind::InvalidValue)
    }

    /// Check if an option value is not part of the entry's option list
    pub fn is_unknown_option(&self) -> bool {
        matches!(self.kind, ConfigErrorKind::UnknownOption)
    }
}

error_struct!(
    /// Callback registry error with optional backtrace
    RegistryError,
    RegistryErrorKind
);

impl RegistryError {
    /// Check if the callback table is full
    pub fn is_too_many_callbacks(&self) -> bool {
        matches!(self.kind, RegistryErrorKind::TooManyCallbacks)
    }

    /// Check if the binding table is full
    pub fn is_too_many_bindings(&self) -> bool {
        matches!(self.kind, RegistryErrorKind::TooManyBindings)
    }

    /// Check if a callback id was not registered
    pub fn is_unknown_callback(&self) -> bool {
        matches!(self.kind, RegistryErrorKind::UnknownCallback)
    }

    /// Check if a binding id does not exist
    pub fn is_unknown_binding(&self) -> bool {
        matches!(self.kind, RegistryErrorKind::UnknownBinding)
    }
}

error_struct!(
    /// Storage error with optional backtrace
    StorageError,
    StorageErrorKind
);

impl StorageError {
    /// Check if reading from the backend failed
    pub fn is_read_failed(&self) -> bool {
        matches!(self.kind, StorageErrorKind::ReadFailed)
    }

    /// Check if writing to the backend failed
    pub fn is_write_failed(&self) -> bool {
        matches!(self.kind, StorageErrorKind::WriteFailed)
    }
}

// =============================================================================
// Convenience Constructors for KnxError
// =============================================================================

impl KnxError {
    // Protocol errors
    pub(crate) fn invalid_frame() -> Self {
        Self::Protocol(ProtocolError::new(ProtocolErrorKind::InvalidFrame))
    }

    pub(crate) fn unsupported_version() -> Self {
        Self::Protocol(ProtocolError::new(ProtocolErrorKind::UnsupportedVersion))
    }

    pub(crate) fn unsupported_service_type() -> Self {
        Self::Protocol(ProtocolError::new(ProtocolErrorKind::UnsupportedServiceType))
    }

    pub(crate) fn invalid_message_code() -> Self {
        Self::Protocol(ProtocolError::new(ProtocolErrorKind::InvalidMessageCode))
    }

    pub(crate) fn individual_destination() -> Self {
        Self::Protocol(ProtocolError::new(ProtocolErrorKind::IndividualDestination))
    }

    pub(crate) fn payload_too_large() -> Self {
        Self::Protocol(ProtocolError::new(ProtocolErrorKind::PayloadTooLarge))
    }

    // Transport errors
    pub(crate) fn buffer_too_small() -> Self {
        Self::Transport(TransportError::new(TransportErrorKind::BufferTooSmall))
    }

    pub(crate) fn socket_error() -> Self {
        Self::Transport(TransportError::new(TransportErrorKind::SocketError))
    }

    pub(crate) fn send_failed() -> Self {
        Self::Transport(TransportError::new(TransportErrorKind::SendFailed))
    }

    pub(crate) fn receive_failed() -> Self {
        Self::Transport(TransportError::new(TransportErrorKind::ReceiveFailed))
    }

    // Addressing errors
    pub(crate) fn invalid_group_address() -> Self {
        Self::Addressing(AddressingError::new(AddressingErrorKind::InvalidGroupAddress))
    }

    pub(crate) fn invalid_individual_address() -> Self {
        Self::Addressing(AddressingError::new(AddressingErrorKind::InvalidIndividualAddress))
    }

    pub(crate) fn address_out_of_range() -> Self {
        Self::Addressing(AddressingError::new(AddressingErrorKind::OutOfRange))
    }

    // DPT errors
    pub(crate) fn invalid_dpt_data() -> Self {
        Self::Dpt(DptError::new(DptErrorKind::InvalidData))
    }

    pub(crate) fn dpt_value_out_of_range() -> Self {
        Self::Dpt(DptError::new(DptErrorKind::ValueOutOfRange))
    }

    // Configuration errors
    pub(crate) fn too_many_entries() -> Self {
        Self::Config(ConfigError::new(ConfigErrorKind::TooManyEntries))
    }

    pub(crate) fn out_of_space() -> Self {
        Self::Config(ConfigError::new(ConfigErrorKind::OutOfSpace))
    }

    pub(crate) fn invalid_default() -> Self {
        Self::Config(ConfigError::new(ConfigErrorKind::InvalidDefault))
    }

    pub(crate) fn empty_options() -> Self {
        Self::Config(ConfigError::new(ConfigErrorKind::EmptyOptions))
    }

    pub(crate) fn unknown_entry() -> Self {
        Self::Config(ConfigError::new(ConfigErrorKind::UnknownEntry))
    }

    pub(crate) fn type_mismatch() -> Self {
        Self::Config(ConfigError::new(ConfigErrorKind::TypeMismatch))
    }

    pub(crate) fn value_too_long() -> Self {
        Self::Config(ConfigError::new(ConfigErrorKind::ValueTooLong))
    }

    pub(crate) fn invalid_value() -> Self {
        Self::Config(ConfigError::new(ConfigErrorKind::InvalidValue))
    }

    pub(crate) fn unknown_option() -> Self {
        Self::Config(ConfigError::new(ConfigErrorKind::UnknownOption))
    }

    // Registry errors
    pub(crate) fn too_many_callbacks() -> Self {
        Self::Registry(RegistryError::new(RegistryErrorKind::TooManyCallbacks))
    }

    pub(crate) fn too_many_bindings() -> Self {
        Self::Registry(RegistryError::new(RegistryErrorKind::TooManyBindings))
    }

    pub(crate) fn unknown_callback() -> Self {
        Self::Registry(RegistryError::new(RegistryErrorKind::UnknownCallback))
    }

    pub(crate) fn unknown_binding() -> Self {
        Self::Registry(RegistryError::new(RegistryErrorKind::UnknownBinding))
    }

    // Storage errors
    pub(crate) fn storage_read_failed() -> Self {
        Self::Storage(StorageError::new(StorageErrorKind::ReadFailed))
    }

    pub(crate) fn storage_write_failed() -> Self {
        Self::Storage(StorageError::new(StorageErrorKind::WriteFailed))
    }
}

// =============================================================================
// Display Implementation
// =============================================================================

impl fmt::Display for KnxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KnxError::Protocol(e) => write!(f, "Protocol error: {:?}", e.kind),
            KnxError::Transport(e) => write!(f, "Transport error: {:?}", e.kind),
            KnxError::Addressing(e) => write!(f, "Addressing error: {:?}", e.kind),
            KnxError::Dpt(e) => write!(f, "DPT error: {:?}", e.kind),
            KnxError::Config(e) => write!(f, "Configuration error: {:?}", e.kind),
            KnxError::Registry(e) => write!(f, "Registry error: {:?}", e.kind),
            KnxError::Storage(e) => write!(f, "Storage error: {:?}", e.kind),
        }
    }
}

// Implement std::error::Error for std-based applications
#[cfg(feature = "std")]
impl std::error::Error for KnxError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_helpers() {
        let err = KnxError::unsupported_service_type();
        assert!(matches!(&err, KnxError::Protocol(e) if e.is_unsupported_service_type()));

        let err = KnxError::value_too_long();
        assert!(matches!(&err, KnxError::Config(e) if e.is_value_too_long()));

        let err = KnxError::too_many_bindings();
        assert!(matches!(&err, KnxError::Registry(e) if e.is_too_many_bindings()));
    }

    #[test]
    fn test_display() {
        let err = KnxError::invalid_message_code();
        assert_eq!(format!("{}", err), "Protocol error: InvalidMessageCode");

        let err = KnxError::unknown_option();
        assert_eq!(format!("{}", err), "Configuration error: UnknownOption");
    }
}
